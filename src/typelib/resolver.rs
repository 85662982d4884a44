//! Type identity resolution and caching.
//!
//! The [`TypeInfoResolver`] answers one question for the projector: which type library entry
//! does a managed type correspond to? It keeps two first-writer-wins maps, libraries by
//! [`TypeLibraryIdentity`] and entries by GUID, and fills them on demand.
//!
//! # Resolution order
//!
//! 1. Built-in bridge shapes map to fixed identities (`IEnumVARIANT`, `OLE_COLOR`,
//!    `stdole.GUID`, `IDispatch`).
//! 2. Classes map to the identity of their generated class interface.
//! 3. Everything else maps to the type's own identity.
//! 4. On a miss for a type from a foreign assembly whose library is not loaded yet, candidate
//!    library files are tried (those whose stem matches the assembly name first), then the
//!    [`LibraryLoader`] is asked for the assembly's library. Whatever loads is ingested and
//!    the lookup is retried once.
//!
//! Answers are memoized per type. Ingesting a library or entry forgets memoized misses, but
//! the loader is asked for each foreign assembly at most once per resolver.
//!
//! # Examples
//!
//! ```rust
//! use tlbscope::typelib::resolver::{NoLibraries, TypeInfoResolver};
//! use tlbscope::typelib::settings::ConverterSettings;
//! use tlbscope::typelib::types::{TypeInfo, TypeKind, TypeLibrary};
//! use tlbscope::metadata::identity::TypeLibraryIdentity;
//! use uguid::guid;
//!
//! let mut resolver = TypeInfoResolver::new(Box::new(NoLibraries), &ConverterSettings::default());
//!
//! let entry = guid!("5d1e2a77-0a4c-4cf6-9f0a-6a3f2b9e8c01");
//! let library = TypeLibrary::new(TypeLibraryIdentity::new("Lib", guid!("5d1e2a77-0a4c-4cf6-9f0a-6a3f2b9e8c00"), 1, 0))
//!     .with_type(TypeInfo::new(entry, "IWidget", TypeKind::Interface).into_rc())
//!     .into_rc();
//!
//! assert!(resolver.add_library(library.clone()));
//! assert!(!resolver.add_library(library));
//! assert_eq!(resolver.resolve_guid(entry).map(|info| info.name.clone()), Some("IWidget".to_string()));
//! ```

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use uguid::Guid;

use crate::{
    metadata::{
        identity::{IdentityHasher, Md5IdentityHasher, TypeLibraryIdentity, WELL_KNOWN},
        typesystem::{AssemblyInfo, ManagedType, TypeFlavor},
    },
    typelib::{
        settings::ConverterSettings,
        types::{ImplTypeFlags, TypeInfo, TypeInfoRc, TypeLibraryRc},
    },
    Error, Result,
};

/// Source of compiled type libraries.
///
/// Every method returns `None` for "not found"; a loader never fails a run.
pub trait LibraryLoader {
    /// Returns the library generated for a referenced assembly.
    fn load_for_assembly(&mut self, assembly: &AssemblyInfo) -> Option<TypeLibraryRc>;

    /// Returns the library stored in a file.
    fn load_path(&mut self, _path: &Path) -> Option<TypeLibraryRc> {
        None
    }

    /// Returns a library registered on the system.
    fn load_registered(
        &mut self,
        _guid: Guid,
        _major: u16,
        _minor: u16,
        _lcid: u32,
    ) -> Option<TypeLibraryRc> {
        None
    }
}

/// A loader that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLibraries;

impl LibraryLoader for NoLibraries {
    fn load_for_assembly(&mut self, _assembly: &AssemblyInfo) -> Option<TypeLibraryRc> {
        None
    }
}

/// Resolves managed types to type library entries.
pub struct TypeInfoResolver {
    libraries: HashMap<TypeLibraryIdentity, TypeLibraryRc>,
    types: HashMap<Guid, TypeInfoRc>,
    resolved: HashMap<String, Option<TypeInfoRc>>,
    candidates: Vec<PathBuf>,
    attempted: HashSet<PathBuf>,
    asked: HashSet<String>,
    loader: Box<dyn LibraryLoader>,
    hasher: Box<dyn IdentityHasher>,
    current_assembly: Option<String>,
}

impl TypeInfoResolver {
    /// Creates a resolver and registers the OLE automation library.
    ///
    /// Candidate reference libraries are taken from `settings`. If the loader cannot provide
    /// `stdole`, `System.Guid` stays unresolved.
    pub fn new(mut loader: Box<dyn LibraryLoader>, settings: &ConverterSettings) -> Self {
        let stdole = TypeLibraryIdentity::stdole();
        let bootstrap =
            loader.load_registered(stdole.guid, stdole.major, stdole.minor, stdole.lcid);

        let mut resolver = TypeInfoResolver {
            libraries: HashMap::new(),
            types: HashMap::new(),
            resolved: HashMap::new(),
            candidates: settings.candidate_libraries(),
            attempted: HashSet::new(),
            asked: HashSet::new(),
            loader,
            hasher: Box::new(Md5IdentityHasher),
            current_assembly: None,
        };

        if let Some(library) = bootstrap {
            resolver.add_library(library);
        }
        resolver
    }

    /// Replaces the identity hash function.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Box<dyn IdentityHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Names the assembly being exported; its types are never looked up in foreign libraries.
    #[must_use]
    pub fn with_current_assembly(mut self, assembly: &AssemblyInfo) -> Self {
        self.current_assembly = Some(assembly.name.clone());
        self
    }

    /// Returns the identity hash function.
    #[must_use]
    pub fn hasher(&self) -> &dyn IdentityHasher {
        self.hasher.as_ref()
    }

    /// Returns the number of cached libraries.
    #[must_use]
    pub fn library_count(&self) -> usize {
        self.libraries.len()
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Looks an entry up by GUID.
    #[must_use]
    pub fn resolve_guid(&self, guid: Guid) -> Option<TypeInfoRc> {
        self.types.get(&guid).cloned()
    }

    /// Looks a library up by its full identity.
    #[must_use]
    pub fn library(&self, identity: &TypeLibraryIdentity) -> Option<TypeLibraryRc> {
        self.libraries.get(identity).cloned()
    }

    /// Looks a library up by GUID, version and LCID, regardless of its name.
    #[must_use]
    pub fn find_library(&self, guid: Guid, major: u16, minor: u16, lcid: u32) -> Option<TypeLibraryRc> {
        self.libraries
            .iter()
            .find(|(identity, _)| identity.matches(guid, major, minor, lcid))
            .map(|(_, library)| library.clone())
    }

    /// Ingests a library and every entry it contains.
    ///
    /// Returns false, without changing anything, if a library with the same identity is
    /// already cached. Entries whose GUID is already known keep their first binding.
    pub fn add_library(&mut self, library: TypeLibraryRc) -> bool {
        if self.libraries.contains_key(&library.identity) {
            return false;
        }

        self.libraries
            .insert(library.identity.clone(), library.clone());
        for info in &library.types {
            self.types.entry(info.guid).or_insert_with(|| info.clone());
        }
        self.forget_misses();
        true
    }

    /// Ingests a library under an explicit identity.
    ///
    /// Registering the same library again is a no-op that returns `Ok(false)`.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConflictingLibrary`] if a different library is already bound
    /// to `identity`.
    pub fn register_library(
        &mut self,
        identity: TypeLibraryIdentity,
        library: TypeLibraryRc,
    ) -> Result<bool> {
        if let Some(existing) = self.libraries.get(&identity) {
            if Arc::ptr_eq(existing, &library) {
                return Ok(false);
            }
            return Err(Error::ConflictingLibrary {
                guid: identity.guid,
            });
        }

        self.libraries.insert(identity, library.clone());
        for info in &library.types {
            self.types.entry(info.guid).or_insert_with(|| info.clone());
        }
        self.forget_misses();
        Ok(true)
    }

    /// Ingests a single entry, typically one produced by the current export.
    ///
    /// Returns false if the GUID is already bound.
    pub fn add_type(&mut self, info: TypeInfoRc) -> bool {
        if self.types.contains_key(&info.guid) {
            return false;
        }

        self.types.insert(info.guid, info);
        self.forget_misses();
        true
    }

    fn forget_misses(&mut self) {
        self.resolved.retain(|_, answer| answer.is_some());
    }

    /// Returns the GUID a managed type is looked up under.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingIdentity`] if the type has no identity.
    pub fn lookup_guid(&self, ty: &ManagedType) -> Result<Guid> {
        match ty.flavor {
            TypeFlavor::Enumerator => Ok(WELL_KNOWN::IID_IENUMVARIANT),
            TypeFlavor::Color => Ok(WELL_KNOWN::TDID_OLECOLOR),
            TypeFlavor::ComIDispatch => Ok(WELL_KNOWN::IID_IDISPATCH),
            TypeFlavor::ComIUnknown => Ok(WELL_KNOWN::IID_IUNKNOWN),
            _ => {
                let own = ty.guid(self.hasher.as_ref())?;
                if ty.flavor == TypeFlavor::Class && own != WELL_KNOWN::IID_IDISPATCH {
                    Ok(self
                        .hasher
                        .class_interface_guid(&ty.namespace, &ty.name, own))
                } else {
                    Ok(own)
                }
            }
        }
    }

    /// Resolves a managed type to its library entry.
    ///
    /// Returns `Ok(None)` if the entry cannot be found; that is never fatal.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingIdentity`] if the type has no identity.
    pub fn resolve_type(&mut self, ty: &ManagedType) -> Result<Option<TypeInfoRc>> {
        let key = format!("{}!{}", ty.assembly.name, ty.full_name());
        if let Some(answer) = self.resolved.get(&key) {
            return Ok(answer.clone());
        }

        let answer = if ty.flavor == TypeFlavor::Guid {
            self.resolve_system_guid()
        } else {
            let guid = self.lookup_guid(ty)?;
            match self.types.get(&guid) {
                Some(info) => Some(info.clone()),
                None => self.resolve_foreign(ty, guid),
            }
        };

        self.resolved.insert(key, answer.clone());
        Ok(answer)
    }

    fn resolve_system_guid(&self) -> Option<TypeInfoRc> {
        let stdole = TypeLibraryIdentity::stdole();
        let library = self.find_library(stdole.guid, stdole.major, stdole.minor, stdole.lcid)?;
        library
            .type_by_name("GUID")
            .or_else(|| library.types.first())
            .cloned()
    }

    fn is_foreign(&self, ty: &ManagedType) -> bool {
        match &self.current_assembly {
            Some(current) => *current != ty.assembly.name,
            None => true,
        }
    }

    fn resolve_foreign(&mut self, ty: &ManagedType, guid: Guid) -> Option<TypeInfoRc> {
        if !self.is_foreign(ty) {
            return None;
        }

        let identity = TypeLibraryIdentity::for_assembly(&ty.assembly, self.hasher.as_ref());
        if self.libraries.contains_key(&identity) {
            return None;
        }

        let assembly_name = ty.assembly.name.to_lowercase();
        let (matching, remaining): (Vec<PathBuf>, Vec<PathBuf>) =
            self.candidates.iter().cloned().partition(|path| {
                path.file_stem()
                    .is_some_and(|stem| stem.to_string_lossy().to_lowercase() == assembly_name)
            });

        for path in matching.into_iter().chain(remaining) {
            if self.types.contains_key(&guid) {
                break;
            }
            if !self.attempted.insert(path.clone()) {
                continue;
            }
            if let Some(library) = self.loader.load_path(&path) {
                self.add_library(library);
            }
        }

        if !self.types.contains_key(&guid) && self.asked.insert(ty.assembly.name.clone()) {
            if let Some(library) = self.loader.load_for_assembly(&ty.assembly) {
                self.add_library(library);
            }
        }

        self.types.get(&guid).cloned()
    }

    /// Returns the first implemented interface of `class` flagged as default.
    #[must_use]
    pub fn resolve_default_interface(class: &TypeInfo) -> Option<TypeInfoRc> {
        class
            .implemented
            .iter()
            .find(|implemented| implemented.flags.contains(ImplTypeFlags::DEFAULT))
            .map(|implemented| implemented.target.clone())
    }

    /// Looks a managed class up by its own identity and returns its default interface.
    ///
    /// Returns `Ok(None)` for non-classes, unknown classes and classes without a default.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingIdentity`] if the class has no identity.
    pub fn resolve_default_coclass_interface(
        &mut self,
        ty: &ManagedType,
    ) -> Result<Option<TypeInfoRc>> {
        if ty.flavor != TypeFlavor::Class {
            return Ok(None);
        }

        let guid = ty.guid(self.hasher.as_ref())?;
        let class = match self.types.get(&guid) {
            Some(class) => Some(class.clone()),
            None => self.resolve_foreign(ty, guid),
        };
        Ok(class.and_then(|class| Self::resolve_default_interface(&class)))
    }
}
