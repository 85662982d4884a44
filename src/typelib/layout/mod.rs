//! Per-type layouts consumed by the type library writer.
//!
//! A layout is everything the writer needs to author one type-info entry: names, type
//! descriptors, dispatch IDs, flags and ordering. The writer itself (the platform's native
//! type-library authoring service) is not part of this crate.
//!
//! # Key Components
//!
//! - [`InterfaceLayout`] - Functions of an interface with dispatch IDs and vtable offsets
//! - [`CoClassLayout`] - Ordered implemented interfaces of a class with default/source flags
//! - [`RecordLayout`] - Fields of a struct
//! - [`EnumLayout`] - Constants of an enumeration
//! - [`LibraryLayout`] - All of the above for one assembly
//!
//! # Export Order
//!
//! [`LibraryLayout::build`] first registers a type-info entry for every exported interface,
//! struct and enumeration, so references between types of the same assembly resolve. Classes
//! are laid out next: each class interface is registered before its class, which is then
//! registered with its implemented-interface list. Interfaces come last, since their
//! signatures may refer to classes through their class or default interfaces.

use bitflags::bitflags;
use strum::{Display, EnumIter, IntoStaticStr};

mod coclass;
mod enumeration;
mod interface;
mod record;

pub use coclass::CoClassLayout;
pub use enumeration::{EnumConstant, EnumLayout};
pub use interface::{FunctionLayout, InterfaceLayout, ParamLayout};
pub use record::{FieldLayout, RecordLayout};

use crate::{
    metadata::{
        diagnostics::DiagnosticCategory,
        identity::TypeLibraryIdentity,
        typesystem::{ComInterfaceType, TypeFlavor},
    },
    typelib::{
        context::ExportContext,
        types::{TypeInfo, TypeKind},
    },
    Result,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Parameter flags (`PARAMFLAG_*`)
    pub struct ParamFlags : u16 {
        /// Input parameter
        const IN = 0x0001;
        /// Output parameter
        const OUT = 0x0002;
        /// Locale identifier
        const LCID = 0x0004;
        /// Return value of a transformed signature
        const RETVAL = 0x0008;
        /// Optional parameter
        const OPT = 0x0010;
        /// Parameter has a default value
        const HASDEFAULT = 0x0020;
    }
}

/// Invocation kind of a function (`INVOKEKIND`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[repr(u32)]
pub enum InvokeKind {
    /// Plain method
    #[strum(serialize = "INVOKE_FUNC")]
    Func = 1,
    /// Property getter
    #[strum(serialize = "INVOKE_PROPERTYGET")]
    PropertyGet = 2,
    /// Property setter taking a value
    #[strum(serialize = "INVOKE_PROPERTYPUT")]
    PropertyPut = 4,
    /// Property setter taking a reference
    #[strum(serialize = "INVOKE_PROPERTYPUTREF")]
    PropertyPutRef = 8,
}

/// Type-info kind under which an exported type is registered.
#[must_use]
pub fn kind_for(flavor: TypeFlavor, interface_kind: ComInterfaceType) -> Option<TypeKind> {
    match flavor {
        TypeFlavor::Interface if interface_kind == ComInterfaceType::IDispatch => {
            Some(TypeKind::Dispatch)
        }
        TypeFlavor::Interface => Some(TypeKind::Interface),
        TypeFlavor::Class => Some(TypeKind::CoClass),
        TypeFlavor::ValueType => Some(TypeKind::Record),
        TypeFlavor::Enum => Some(TypeKind::Enum),
        _ => None,
    }
}

/// Layouts of every exported type of one assembly.
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    /// Identity of the produced library
    pub identity: TypeLibraryIdentity,
    /// Interfaces, in input order
    pub interfaces: Vec<InterfaceLayout>,
    /// Generated class interfaces, in class order
    pub class_interfaces: Vec<InterfaceLayout>,
    /// Classes, in input order
    pub coclasses: Vec<CoClassLayout>,
    /// Structs, in input order
    pub records: Vec<RecordLayout>,
    /// Enumerations, in input order
    pub enums: Vec<EnumLayout>,
}

impl LibraryLayout {
    /// Lays out every COM-visible type of the context.
    ///
    /// Interfaces with an unsupported ABI are skipped with a warning. Recoverable problems are
    /// reported on `context.diagnostics`.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingIdentity`] if an exported type has no identity and
    /// [`crate::Error::UnsupportedClassInterface`] if a class asks for a dual class interface.
    pub fn build(context: &mut ExportContext) -> Result<Self> {
        let types: Vec<_> = context
            .types()
            .iter()
            .filter(|ty| ty.is_com_visible() && !ty.is_generic)
            .cloned()
            .collect();

        for ty in &types {
            if ty.flavor == TypeFlavor::Class {
                continue;
            }
            let Some(kind) = kind_for(ty.flavor, ty.interface_kind()) else {
                continue;
            };
            let guid = ty.guid(context.resolver.hasher())?;
            let name = ty.annotations.alias.clone().unwrap_or_else(|| ty.name.clone());
            context
                .resolver
                .add_type(TypeInfo::new(guid, name, kind).into_rc());
        }

        let mut layout = LibraryLayout {
            identity: context.library_identity(),
            interfaces: Vec::new(),
            class_interfaces: Vec::new(),
            coclasses: Vec::new(),
            records: Vec::new(),
            enums: Vec::new(),
        };

        for ty in types.iter().filter(|ty| ty.flavor == TypeFlavor::Class) {
            let class_interface = InterfaceLayout::build_class_interface(ty, context)?.map(|interface| {
                let info = interface.to_type_info();
                context.resolver.add_type(info.clone());
                layout.class_interfaces.push(interface);
                info
            });
            let coclass = CoClassLayout::build(ty, class_interface, context)?;
            context.resolver.add_type(coclass.to_type_info());
            layout.coclasses.push(coclass);
        }

        for ty in &types {
            match ty.flavor {
                TypeFlavor::Interface => match InterfaceLayout::build(ty, context) {
                    Ok(interface) => layout.interfaces.push(interface),
                    Err(crate::Error::UnsupportedInterfaceKind(name)) => {
                        context.diagnostics.warning(
                            DiagnosticCategory::Export,
                            format!("Interface {name} uses an unsupported ABI and was skipped"),
                        );
                    }
                    Err(error) => return Err(error),
                },
                TypeFlavor::ValueType => layout.records.push(RecordLayout::build(ty, context)?),
                TypeFlavor::Enum => layout.enums.push(EnumLayout::build(ty, context)?),
                _ => {}
            }
        }

        Ok(layout)
    }
}
