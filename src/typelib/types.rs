//! Compiled type library entries as seen by the resolver.
//!
//! A [`TypeLibrary`] is the handle the resolver caches: an identity plus the type infos it
//! contains. A [`TypeInfo`] is what a user-defined type descriptor points at. Libraries come
//! from a [`crate::typelib::resolver::LibraryLoader`] or are assembled from the layouts of
//! the current export.

use std::{path::PathBuf, sync::Arc};

use bitflags::bitflags;
use strum::{Display, EnumIter, IntoStaticStr};
use uguid::Guid;

use crate::metadata::identity::TypeLibraryIdentity;

/// Reference to a `TypeInfo`
pub type TypeInfoRc = Arc<TypeInfo>;
/// Reference to a `TypeLibrary`
pub type TypeLibraryRc = Arc<TypeLibrary>;

/// Kind of a type info (`TYPEKIND`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum TypeKind {
    /// Enumeration
    Enum,
    /// Structure
    Record,
    /// Module of static functions
    Module,
    /// Vtable interface
    Interface,
    /// Dispatch interface
    Dispatch,
    /// Component class
    CoClass,
    /// Type alias
    Alias,
    /// Union
    Union,
}

bitflags! {
    /// Flags of an implemented interface (`IMPLTYPEFLAGS`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ImplTypeFlags: u32 {
        /// The interface is the default for its role
        const DEFAULT = 0x1;
        /// The interface is an outgoing (event) interface
        const SOURCE = 0x2;
        /// The interface is not accessible to macro languages
        const RESTRICTED = 0x4;
    }
}

/// An interface implemented by a coclass.
#[derive(Debug, Clone)]
pub struct ImplementedType {
    /// The implemented interface
    pub target: TypeInfoRc,
    /// Role flags
    pub flags: ImplTypeFlags,
}

/// One entry of a type library.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// Identity of the entry
    pub guid: Guid,
    /// Name of the entry
    pub name: String,
    /// Kind of the entry
    pub kind: TypeKind,
    /// Implemented interfaces of a coclass, in order
    pub implemented: Vec<ImplementedType>,
}

impl TypeInfo {
    /// Creates a type info without implemented interfaces.
    pub fn new(guid: Guid, name: impl Into<String>, kind: TypeKind) -> Self {
        TypeInfo {
            guid,
            name: name.into(),
            kind,
            implemented: Vec::new(),
        }
    }

    /// Appends an implemented interface.
    #[must_use]
    pub fn implementing(mut self, target: &TypeInfoRc, flags: ImplTypeFlags) -> Self {
        self.implemented.push(ImplementedType {
            target: target.clone(),
            flags,
        });
        self
    }

    /// Wraps the entry for sharing.
    #[must_use]
    pub fn into_rc(self) -> TypeInfoRc {
        Arc::new(self)
    }
}

/// A compiled type library.
#[derive(Debug, Clone)]
pub struct TypeLibrary {
    /// Identity of the library
    pub identity: TypeLibraryIdentity,
    /// File the library was loaded from, if any
    pub path: Option<PathBuf>,
    /// Entries in library order
    pub types: Vec<TypeInfoRc>,
}

impl TypeLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new(identity: TypeLibraryIdentity) -> Self {
        TypeLibrary {
            identity,
            path: None,
            types: Vec::new(),
        }
    }

    /// Appends an entry.
    #[must_use]
    pub fn with_type(mut self, info: TypeInfoRc) -> Self {
        self.types.push(info);
        self
    }

    /// Records the file the library was loaded from.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Looks an entry up by name.
    #[must_use]
    pub fn type_by_name(&self, name: &str) -> Option<&TypeInfoRc> {
        self.types.iter().find(|info| info.name == name)
    }

    /// Wraps the library for sharing.
    #[must_use]
    pub fn into_rc(self) -> TypeLibraryRc {
        Arc::new(self)
    }
}
