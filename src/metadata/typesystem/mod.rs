//! Input model: a reflected managed type graph with declarative annotations.
//!
//! The engine never talks to a metadata reader directly. Instead it is fed a graph of
//! [`ManagedType`] nodes whose annotations (visibility, identity GUID, interface ABI,
//! marshalling hints, explicit dispatch IDs, default-interface markers) are plain immutable
//! records. Graphs can come from a metadata loader or be built synthetically with
//! [`TypeBuilder`].
//!
//! # Key Components
//!
//! - [`ManagedType`] - A type node with members, shared as [`ManagedTypeRc`]
//! - [`TypeFlavor`] - Closed category the projector matches on
//! - [`AssemblyInfo`] - Owning assembly, source of library identities
//! - [`TypeBuilder`] - Fluent construction of type nodes
//! - [`MethodDef`], [`PropertyDef`], [`FieldDef`], [`ParamDef`] - Member records
//!
//! # Examples
//!
//! ```rust
//! use tlbscope::metadata::typesystem::{AssemblyInfo, MethodDef, ParamDef, TypeBuilder, TypeFlavor, Version};
//!
//! let assembly = AssemblyInfo::new("Demo", Version::new(1, 0, 0, 0)).into_rc();
//! let int32 = TypeBuilder::well_known(TypeFlavor::I4).unwrap().build();
//!
//! let widget = TypeBuilder::interface(&assembly, "Demo", "IWidget").build();
//! widget.add_method(MethodDef::new("Spin", None).param(ParamDef::new("turns", &int32)));
//!
//! assert_eq!(widget.full_name(), "Demo.IWidget");
//! assert_eq!(widget.methods().count(), 1);
//! ```

mod base;
mod builder;
mod members;
mod primitives;

use std::{fmt, sync::Arc};

use uguid::Guid;

pub use base::{ClassInterfaceType, ComInterfaceType, TypeFlavor};
pub use builder::TypeBuilder;
pub use members::{
    FieldDef, MemberAnnotations, MemberDef, MethodDef, ParamDef, ParameterAnnotations,
    PropertyDef,
};
pub use primitives::{flavor_for_fullname, well_known_name};

use crate::{metadata::identity::IdentityHasher, Error, Result};

/// Reference to a `ManagedType`
pub type ManagedTypeRc = Arc<ManagedType>;
/// Reference to an `AssemblyInfo`
pub type AssemblyInfoRc = Arc<AssemblyInfo>;

/// Four part assembly version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Version {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Build number
    pub build: u16,
    /// Revision number
    pub revision: u16,
}

impl Version {
    /// Creates a version from its four parts.
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Version {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// The assembly a type is declared in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyInfo {
    /// Simple assembly name
    pub name: String,
    /// Assembly version
    pub version: Version,
    /// Declared library GUID
    pub guid: Option<Guid>,
    /// Public key of a strong-named assembly
    pub public_key: Option<Vec<u8>>,
    /// Assembly-wide default visibility
    pub com_visible: bool,
}

impl AssemblyInfo {
    /// Name of the assembly hosting the runtime's own types.
    pub const CORE_LIBRARY: &'static str = "System.Private.CoreLib";

    /// Creates a COM-visible assembly without declared identity.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        AssemblyInfo {
            name: name.into(),
            version,
            guid: None,
            public_key: None,
            com_visible: true,
        }
    }

    /// Returns the runtime's core library.
    #[must_use]
    pub fn core_library() -> Self {
        AssemblyInfo::new(Self::CORE_LIBRARY, Version::new(4, 0, 0, 0))
    }

    /// Sets the declared library GUID.
    #[must_use]
    pub fn with_guid(mut self, guid: Guid) -> Self {
        self.guid = Some(guid);
        self
    }

    /// Sets the assembly-wide default visibility.
    #[must_use]
    pub fn with_com_visible(mut self, visible: bool) -> Self {
        self.com_visible = visible;
        self
    }

    /// Wraps the assembly for sharing between type nodes.
    #[must_use]
    pub fn into_rc(self) -> AssemblyInfoRc {
        Arc::new(self)
    }
}

/// Annotations attached to a type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeAnnotations {
    /// Explicit visibility; `None` inherits the assembly default
    pub com_visible: Option<bool>,
    /// Declared identity
    pub guid: Option<Guid>,
    /// Interface ABI, interfaces only
    pub interface_kind: Option<ComInterfaceType>,
    /// Class interface to generate, classes only
    pub class_interface: Option<ClassInterfaceType>,
    /// Name of the interface a class nominates as default
    pub default_interface: Option<String>,
    /// Name of the member that carries dispatch ID 0
    pub default_member: Option<String>,
    /// Names of the event source interfaces of a class
    pub source_interfaces: Vec<String>,
    /// For event interfaces: name of the source interface they belong to
    pub event_source_interface: Option<String>,
    /// Name to use in the type library instead of the type name
    pub alias: Option<String>,
}

/// A node of the reflected type graph.
///
/// Members are stored in append-only vectors, so a node can be shared before all of its
/// members are known.
pub struct ManagedType {
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Simple name
    pub name: String,
    /// Category the projector matches on
    pub flavor: TypeFlavor,
    /// Declaring assembly
    pub assembly: AssemblyInfoRc,
    /// Element type of arrays and managed references
    pub element: Option<ManagedTypeRc>,
    /// Base class
    pub base_type: Option<ManagedTypeRc>,
    /// Generic type definition or instantiation
    pub is_generic: bool,
    /// Declarative annotations
    pub annotations: TypeAnnotations,
    /// Implemented interfaces, in declaration order
    pub interfaces: boxcar::Vec<ManagedTypeRc>,
    /// Methods and properties, in declaration order
    pub members: boxcar::Vec<MemberDef>,
    /// Fields, in declaration order
    pub fields: boxcar::Vec<FieldDef>,
}

impl ManagedType {
    /// Returns `namespace.name`, or just the name in the global namespace.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Returns true if this is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flavor.is_interface()
    }

    /// Returns true if this is a reference type other than an interface.
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.flavor.is_class()
    }

    /// Returns true if this is a value type.
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        self.flavor.is_value_type()
    }

    /// Returns true for arrays.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.flavor == TypeFlavor::Array
    }

    /// Returns true for managed references.
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        self.flavor == TypeFlavor::ByRef
    }

    /// Returns the referenced type of a managed reference, or this type itself.
    pub fn unref(self: &Arc<Self>) -> ManagedTypeRc {
        match (&self.flavor, &self.element) {
            (TypeFlavor::ByRef, Some(element)) => element.clone(),
            _ => self.clone(),
        }
    }

    /// Strips every array and reference wrapper.
    pub fn underlying(self: &Arc<Self>) -> ManagedTypeRc {
        let mut current = self.clone();
        while matches!(current.flavor, TypeFlavor::Array | TypeFlavor::ByRef) {
            match &current.element {
                Some(element) => current = element.clone(),
                None => break,
            }
        }
        current
    }

    /// Returns the interface ABI, [`ComInterfaceType::Dual`] unless declared.
    #[must_use]
    pub fn interface_kind(&self) -> ComInterfaceType {
        self.annotations.interface_kind.unwrap_or_default()
    }

    /// Returns the class interface kind, [`ClassInterfaceType::AutoDispatch`] unless declared.
    #[must_use]
    pub fn class_interface_kind(&self) -> ClassInterfaceType {
        self.annotations.class_interface.unwrap_or_default()
    }

    /// Returns true if any class up the inheritance chain is generic.
    #[must_use]
    pub fn has_generic_base(&self) -> bool {
        let mut current = self.base_type.as_ref();
        while let Some(base) = current {
            if base.is_generic {
                return true;
            }
            current = base.base_type.as_ref();
        }
        false
    }

    /// Resolves effective COM visibility from the type and assembly settings.
    ///
    /// An explicit type-level annotation wins over the assembly default.
    #[must_use]
    pub fn is_com_visible(&self) -> bool {
        match self.annotations.com_visible {
            Some(visible) => visible,
            None => self.assembly.com_visible,
        }
    }

    /// Returns the type's identity: the declared GUID, or one derived from its name.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingIdentity`] if no GUID is declared and the type does not
    /// belong to a named assembly.
    pub fn guid(&self, hasher: &dyn IdentityHasher) -> Result<Guid> {
        if let Some(guid) = self.annotations.guid {
            return Ok(guid);
        }

        if self.assembly.name.is_empty() {
            return Err(Error::MissingIdentity {
                name: self.full_name(),
            });
        }

        Ok(hasher.type_guid(&self.assembly.name, &self.full_name()))
    }

    /// Appends an implemented interface.
    pub fn add_interface(&self, interface: &ManagedTypeRc) {
        self.interfaces.push(interface.clone());
    }

    /// Appends a method.
    pub fn add_method(&self, method: MethodDef) {
        self.members.push(MemberDef::Method(method));
    }

    /// Appends a property.
    pub fn add_property(&self, property: PropertyDef) {
        self.members.push(MemberDef::Property(property));
    }

    /// Appends a field.
    pub fn add_field(&self, field: FieldDef) {
        self.fields.push(field);
    }

    /// Iterates over the plain methods, skipping properties.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.members.iter().filter_map(|(_, member)| match member {
            MemberDef::Method(method) => Some(method),
            MemberDef::Property(_) => None,
        })
    }

    /// Iterates over the properties.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyDef> {
        self.members.iter().filter_map(|(_, member)| match member {
            MemberDef::Property(property) => Some(property),
            MemberDef::Method(_) => None,
        })
    }
}

impl fmt::Debug for ManagedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedType")
            .field("name", &self.full_name())
            .field("flavor", &self.flavor)
            .field("assembly", &self.assembly.name)
            .field("element", &self.element.as_ref().map(|e| e.full_name()))
            .field("base_type", &self.base_type.as_ref().map(|b| b.full_name()))
            .field("is_generic", &self.is_generic)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::identity::Md5IdentityHasher;
    use crate::test::fixtures::{assembly, scalar};

    #[test]
    fn test_unref_and_underlying() {
        let int32 = scalar(TypeFlavor::I4);
        let array = TypeBuilder::array_of(&int32);
        let by_ref = TypeBuilder::by_ref(&array);

        assert_eq!(by_ref.unref().flavor, TypeFlavor::Array);
        assert_eq!(by_ref.underlying().flavor, TypeFlavor::I4);
        assert_eq!(int32.unref().flavor, TypeFlavor::I4);
        assert_eq!(array.full_name(), "System.Int32[]");
        assert_eq!(by_ref.full_name(), "System.Int32[]&");
    }

    #[test]
    fn test_visibility_resolution() {
        let visible = assembly();
        let hidden = AssemblyInfo::new("Hidden", Version::new(1, 0, 0, 0))
            .with_com_visible(false)
            .into_rc();

        assert!(TypeBuilder::class(&visible, "Demo", "A").build().is_com_visible());
        assert!(!TypeBuilder::class(&visible, "Demo", "B")
            .com_visible(false)
            .build()
            .is_com_visible());
        assert!(!TypeBuilder::class(&hidden, "Demo", "C").build().is_com_visible());
        assert!(TypeBuilder::class(&hidden, "Demo", "D")
            .com_visible(true)
            .build()
            .is_com_visible());
    }

    #[test]
    fn test_guid_declared_or_derived() {
        let declared = uguid::guid!("0f3c2a1e-5b6d-4c7e-8f90-a1b2c3d4e5f6");
        let asm = assembly();

        let explicit = TypeBuilder::interface(&asm, "Demo", "IWidget")
            .guid(declared)
            .build();
        assert_eq!(explicit.guid(&Md5IdentityHasher).unwrap(), declared);

        let derived = TypeBuilder::interface(&asm, "Demo", "IGadget").build();
        let first = derived.guid(&Md5IdentityHasher).unwrap();
        assert_eq!(first, derived.guid(&Md5IdentityHasher).unwrap());
        assert_ne!(first, declared);

        let anonymous = AssemblyInfo::new("", Version::default()).into_rc();
        let orphan = TypeBuilder::interface(&anonymous, "Demo", "IOrphan").build();
        assert!(matches!(
            orphan.guid(&Md5IdentityHasher),
            Err(Error::MissingIdentity { .. })
        ));
    }

    #[test]
    fn test_members_keep_declaration_order() {
        let int32 = scalar(TypeFlavor::I4);
        let widget = TypeBuilder::interface(&assembly(), "Demo", "IWidget").build();

        widget.add_method(MethodDef::new("First", None));
        widget.add_property(PropertyDef::new("Size", &int32, true, Vec::new()));
        widget.add_method(MethodDef::new("Last", Some(&int32)));

        let names: Vec<&str> = widget.members.iter().map(|(_, m)| m.name()).collect();
        assert_eq!(names, vec!["First", "Size", "Last"]);
        assert_eq!(widget.methods().count(), 2);

        let size = widget.properties().next().unwrap();
        assert_eq!(size.getter.as_ref().unwrap().name, "get_Size");
        let setter = size.setter.as_ref().unwrap();
        assert_eq!(setter.name, "set_Size");
        assert_eq!(setter.params.len(), 1);
        assert!(setter.returns.is_none());
    }
}
