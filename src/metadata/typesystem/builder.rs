//! Builder for managed type nodes.
//!
//! This module provides the [`TypeBuilder`] struct, a fluent API for constructing
//! [`ManagedType`] nodes with their annotations. It is how synthetic graphs are produced for
//! tests and benchmarks, and how a metadata loader would hand reflected types to the engine.
//!
//! # Example
//!
//! ```rust
//! use tlbscope::metadata::typesystem::{AssemblyInfo, ComInterfaceType, TypeBuilder, TypeFlavor, Version};
//! use uguid::guid;
//!
//! let assembly = AssemblyInfo::new("Demo", Version::new(1, 0, 0, 0)).into_rc();
//!
//! let events = TypeBuilder::interface(&assembly, "Demo", "IWidgetEvents")
//!     .interface_kind(ComInterfaceType::IDispatch)
//!     .guid(guid!("7a1c1f0e-3c55-4b7b-9f35-3e0f7a4a2b10"))
//!     .build();
//!
//! let widget = TypeBuilder::class(&assembly, "Demo", "Widget")
//!     .source_interface("Demo.IWidgetEvents")
//!     .build();
//!
//! assert_eq!(events.flavor, TypeFlavor::Interface);
//! assert_eq!(widget.annotations.source_interfaces.len(), 1);
//! ```

use std::sync::Arc;

use uguid::Guid;

use crate::metadata::typesystem::{
    primitives::well_known_name, AssemblyInfo, AssemblyInfoRc, ClassInterfaceType,
    ComInterfaceType, ManagedType, ManagedTypeRc, TypeAnnotations, TypeFlavor,
};

/// Provides a fluent API for building type nodes
pub struct TypeBuilder {
    assembly: AssemblyInfoRc,
    namespace: String,
    name: String,
    flavor: TypeFlavor,
    element: Option<ManagedTypeRc>,
    base_type: Option<ManagedTypeRc>,
    is_generic: bool,
    annotations: TypeAnnotations,
}

impl TypeBuilder {
    /// Create a new builder for a type of the given flavor
    ///
    /// ## Arguments
    /// * 'assembly' - The declaring assembly
    /// * 'namespace' - Namespace of the type
    /// * 'name' - Simple name of the type
    /// * 'flavor' - Category of the type
    pub fn new(
        assembly: &AssemblyInfoRc,
        namespace: impl Into<String>,
        name: impl Into<String>,
        flavor: TypeFlavor,
    ) -> Self {
        TypeBuilder {
            assembly: assembly.clone(),
            namespace: namespace.into(),
            name: name.into(),
            flavor,
            element: None,
            base_type: None,
            is_generic: false,
            annotations: TypeAnnotations::default(),
        }
    }

    /// Start building an interface
    pub fn interface(
        assembly: &AssemblyInfoRc,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(assembly, namespace, name, TypeFlavor::Interface)
    }

    /// Start building a class
    pub fn class(
        assembly: &AssemblyInfoRc,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(assembly, namespace, name, TypeFlavor::Class)
    }

    /// Start building a struct
    pub fn value_type(
        assembly: &AssemblyInfoRc,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(assembly, namespace, name, TypeFlavor::ValueType)
    }

    /// Start building an enumeration
    pub fn enumeration(
        assembly: &AssemblyInfoRc,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(assembly, namespace, name, TypeFlavor::Enum)
    }

    /// Start building a delegate
    pub fn delegate(
        assembly: &AssemblyInfoRc,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(assembly, namespace, name, TypeFlavor::Delegate)
    }

    /// Start building one of the runtime's well-known types, declared in the core library
    ///
    /// Returns `None` for structural flavors, which have no fixed name.
    #[must_use]
    pub fn well_known(flavor: TypeFlavor) -> Option<Self> {
        let (namespace, name) = well_known_name(flavor)?;
        let core = AssemblyInfo::core_library().into_rc();
        Some(Self::new(&core, namespace, name, flavor))
    }

    /// Build a single dimensional array of `element`
    pub fn array_of(element: &ManagedTypeRc) -> ManagedTypeRc {
        Self::wrap(element, TypeFlavor::Array, "[]")
    }

    /// Build a managed reference to `element`
    pub fn by_ref(element: &ManagedTypeRc) -> ManagedTypeRc {
        Self::wrap(element, TypeFlavor::ByRef, "&")
    }

    fn wrap(element: &ManagedTypeRc, flavor: TypeFlavor, suffix: &str) -> ManagedTypeRc {
        let mut builder = Self::new(
            &element.assembly,
            element.namespace.clone(),
            format!("{}{}", element.name, suffix),
            flavor,
        );
        builder.element = Some(element.clone());
        builder.build()
    }

    /// Set the declared identity
    #[must_use]
    pub fn guid(mut self, guid: Guid) -> Self {
        self.annotations.guid = Some(guid);
        self
    }

    /// Mark the type as a generic definition or instantiation
    #[must_use]
    pub fn generic(mut self) -> Self {
        self.is_generic = true;
        self
    }

    /// Set explicit visibility
    #[must_use]
    pub fn com_visible(mut self, visible: bool) -> Self {
        self.annotations.com_visible = Some(visible);
        self
    }

    /// Set the interface ABI
    #[must_use]
    pub fn interface_kind(mut self, kind: ComInterfaceType) -> Self {
        self.annotations.interface_kind = Some(kind);
        self
    }

    /// Set the base class
    #[must_use]
    pub fn extends(mut self, base: &ManagedTypeRc) -> Self {
        self.base_type = Some(base.clone());
        self
    }

    /// Set the class interface kind
    #[must_use]
    pub fn class_interface(mut self, kind: ClassInterfaceType) -> Self {
        self.annotations.class_interface = Some(kind);
        self
    }

    /// Nominate the default interface of a class, by full or simple name
    #[must_use]
    pub fn default_interface(mut self, name: impl Into<String>) -> Self {
        self.annotations.default_interface = Some(name.into());
        self
    }

    /// Name the member that receives dispatch ID 0
    #[must_use]
    pub fn default_member(mut self, name: impl Into<String>) -> Self {
        self.annotations.default_member = Some(name.into());
        self
    }

    /// Add an event source interface, by full name
    #[must_use]
    pub fn source_interface(mut self, name: impl Into<String>) -> Self {
        self.annotations.source_interfaces.push(name.into());
        self
    }

    /// Declare the source interface an event interface belongs to
    #[must_use]
    pub fn event_source(mut self, name: impl Into<String>) -> Self {
        self.annotations.event_source_interface = Some(name.into());
        self
    }

    /// Set the exported name
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.annotations.alias = Some(alias.into());
        self
    }

    /// Finish the type node
    #[must_use]
    pub fn build(self) -> ManagedTypeRc {
        Arc::new(ManagedType {
            namespace: self.namespace,
            name: self.name,
            flavor: self.flavor,
            assembly: self.assembly,
            element: self.element,
            base_type: self.base_type,
            is_generic: self.is_generic,
            annotations: self.annotations,
            interfaces: boxcar::Vec::new(),
            members: boxcar::Vec::new(),
            fields: boxcar::Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::fixtures::assembly;

    #[test]
    fn test_well_known() {
        let string = TypeBuilder::well_known(TypeFlavor::String).unwrap().build();
        assert_eq!(string.full_name(), "System.String");
        assert_eq!(string.assembly.name, AssemblyInfo::CORE_LIBRARY);

        assert!(TypeBuilder::well_known(TypeFlavor::Class).is_none());
        assert!(TypeBuilder::well_known(TypeFlavor::Array).is_none());
    }

    #[test]
    fn test_annotations() {
        let asm = assembly();
        let class = TypeBuilder::class(&asm, "Demo", "Widget")
            .default_interface("IWidget")
            .source_interface("Demo.IEvents")
            .source_interface("Demo.IMoreEvents")
            .alias("WidgetObject")
            .build();

        assert_eq!(class.annotations.default_interface.as_deref(), Some("IWidget"));
        assert_eq!(class.annotations.source_interfaces, vec!["Demo.IEvents", "Demo.IMoreEvents"]);
        assert_eq!(class.annotations.alias.as_deref(), Some("WidgetObject"));
        assert!(!class.is_generic);
    }

    #[test]
    fn test_interface_kind_default() {
        let asm = assembly();
        let plain = TypeBuilder::interface(&asm, "Demo", "IPlain").build();
        let unknown = TypeBuilder::interface(&asm, "Demo", "IRaw")
            .interface_kind(ComInterfaceType::IUnknown)
            .build();

        assert_eq!(plain.interface_kind(), ComInterfaceType::Dual);
        assert_eq!(unknown.interface_kind(), ComInterfaceType::IUnknown);
    }

    #[test]
    fn test_generic_base_anywhere_in_chain() {
        let asm = assembly();
        let list = TypeBuilder::class(&asm, "Demo", "List`1").generic().build();
        let middle = TypeBuilder::class(&asm, "Demo", "Middle").extends(&list).build();
        let leaf = TypeBuilder::class(&asm, "Demo", "Leaf")
            .extends(&middle)
            .class_interface(ClassInterfaceType::None)
            .build();

        assert!(leaf.has_generic_base());
        assert!(middle.has_generic_base());
        assert!(!list.has_generic_base());
        assert_eq!(leaf.class_interface_kind(), ClassInterfaceType::None);
        assert_eq!(middle.class_interface_kind(), ClassInterfaceType::AutoDispatch);
    }
}
