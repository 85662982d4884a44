//! Synthetic type graphs, libraries and loaders.

use std::{
    cell::Cell,
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use uguid::Guid;

use crate::{
    metadata::{
        identity::{IdentityHasher, Md5IdentityHasher, TypeLibraryIdentity, WELL_KNOWN},
        typesystem::{AssemblyInfo, AssemblyInfoRc, ManagedTypeRc, TypeBuilder, TypeFlavor, Version},
    },
    typelib::{
        context::ExportContext,
        resolver::{LibraryLoader, TypeInfoResolver},
        settings::ConverterSettings,
        types::{TypeInfo, TypeInfoRc, TypeKind, TypeLibrary, TypeLibraryRc},
    },
};

/// The assembly being exported in tests: `Demo` 1.0.
pub fn assembly() -> AssemblyInfoRc {
    AssemblyInfo::new("Demo", Version::new(1, 0, 0, 0)).into_rc()
}

/// A well-known scalar type.
pub fn scalar(flavor: TypeFlavor) -> ManagedTypeRc {
    match TypeBuilder::well_known(flavor) {
        Some(builder) => builder.build(),
        None => panic!("{flavor} has no well-known name"),
    }
}

/// A type-info entry whose GUID is derived from its name.
pub fn type_info(name: &str, kind: TypeKind) -> TypeInfoRc {
    TypeInfo::new(Md5IdentityHasher.type_guid("Fixtures", name), name, kind).into_rc()
}

/// A library whose identity is derived from its name.
pub fn library(name: &str, types: Vec<TypeInfoRc>) -> TypeLibraryRc {
    let guid = Md5IdentityHasher.type_guid("Libraries", name);
    types
        .into_iter()
        .fold(
            TypeLibrary::new(TypeLibraryIdentity::new(name, guid, 1, 0)),
            TypeLibrary::with_type,
        )
        .into_rc()
}

/// `stdole` 2.0 with the entries the bridge shapes resolve to.
pub fn stdole_library() -> TypeLibraryRc {
    let entries = [
        (guid_of("GUID"), "GUID", TypeKind::Record),
        (WELL_KNOWN::TDID_OLECOLOR, "OLE_COLOR", TypeKind::Alias),
        (WELL_KNOWN::IID_IENUMVARIANT, "IEnumVARIANT", TypeKind::Interface),
        (WELL_KNOWN::IID_IDISPATCH, "IDispatch", TypeKind::Interface),
        (WELL_KNOWN::IID_IUNKNOWN, "IUnknown", TypeKind::Interface),
    ];

    entries
        .into_iter()
        .fold(TypeLibrary::new(TypeLibraryIdentity::stdole()), |library, (guid, name, kind)| {
            library.with_type(TypeInfo::new(guid, name, kind).into_rc())
        })
        .into_rc()
}

fn guid_of(name: &str) -> Guid {
    Md5IdentityHasher.type_guid("stdole", name)
}

/// A resolver for the `Demo` assembly without any libraries.
pub fn resolver() -> TypeInfoResolver {
    TypeInfoResolver::new(Box::new(MockLoader::default()), &ConverterSettings::default())
        .with_current_assembly(&assembly())
}

/// A resolver for the `Demo` assembly with `stdole` loaded.
pub fn resolver_with_stdole() -> TypeInfoResolver {
    let loader = MockLoader::default().with_registered(stdole_library());
    TypeInfoResolver::new(Box::new(loader), &ConverterSettings::default())
        .with_current_assembly(&assembly())
}

/// An export context for `types` of the `Demo` assembly, with `stdole` loaded.
pub fn context(types: Vec<ManagedTypeRc>) -> ExportContext {
    let loader = MockLoader::default().with_registered(stdole_library());
    ExportContext::new(ConverterSettings::default(), Box::new(loader), &assembly(), types).unwrap()
}

/// In-memory [`LibraryLoader`] counting assembly lookups.
#[derive(Default)]
pub struct MockLoader {
    registered: Vec<TypeLibraryRc>,
    assemblies: HashMap<String, TypeLibraryRc>,
    paths: HashMap<PathBuf, TypeLibraryRc>,
    calls: Rc<Cell<usize>>,
}

impl MockLoader {
    /// Serves `library` from `load_registered`.
    pub fn with_registered(mut self, library: TypeLibraryRc) -> Self {
        self.registered.push(library);
        self
    }

    /// Serves `library` for the assembly called `name`.
    pub fn with_assembly(mut self, name: &str, library: TypeLibraryRc) -> Self {
        self.assemblies.insert(name.to_string(), library);
        self
    }

    /// Serves `library` from `load_path`.
    pub fn with_path(mut self, path: impl Into<PathBuf>, library: TypeLibraryRc) -> Self {
        self.paths.insert(path.into(), library);
        self
    }

    /// Shared counter of `load_for_assembly` calls.
    pub fn calls(&self) -> Rc<Cell<usize>> {
        self.calls.clone()
    }
}

impl LibraryLoader for MockLoader {
    fn load_for_assembly(&mut self, assembly: &AssemblyInfo) -> Option<TypeLibraryRc> {
        self.calls.set(self.calls.get() + 1);
        self.assemblies.get(&assembly.name).cloned()
    }

    fn load_path(&mut self, path: &Path) -> Option<TypeLibraryRc> {
        self.paths.get(path).cloned()
    }

    fn load_registered(&mut self, guid: Guid, major: u16, minor: u16, lcid: u32) -> Option<TypeLibraryRc> {
        self.registered
            .iter()
            .find(|library| library.identity.matches(guid, major, minor, lcid))
            .cloned()
    }
}
