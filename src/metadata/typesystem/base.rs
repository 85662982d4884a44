use strum::{Display, EnumIter, IntoStaticStr};

/// Closed set of type categories the projector distinguishes.
///
/// Every managed type handed to the engine is classified into exactly one flavor. Fixed
/// scalars and the built-in bridge shapes are matched by identity; everything else falls
/// into one of the structural kinds at the end of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum TypeFlavor {
    // Fixed scalars
    /// System.Void
    Void,
    /// System.Boolean
    Boolean,
    /// System.Char
    Char,
    /// System.SByte
    I1,
    /// System.Byte
    U1,
    /// System.Int16
    I2,
    /// System.UInt16
    U2,
    /// System.Int32
    I4,
    /// System.UInt32
    U4,
    /// System.Int64
    I8,
    /// System.UInt64
    U8,
    /// System.Single
    R4,
    /// System.Double
    R8,
    /// System.IntPtr
    IntPtr,
    /// System.UIntPtr
    UIntPtr,
    /// System.Decimal
    Decimal,
    /// System.DateTime
    DateTime,
    /// System.String
    String,
    /// System.Object
    Object,

    // Built-in bridge shapes
    /// System.Collections.IEnumerator
    Enumerator,
    /// System.Drawing.Color
    Color,
    /// System.Guid
    Guid,
    /// Managed declaration of the COM `IDispatch` interface
    ComIDispatch,
    /// Managed declaration of the COM `IUnknown` interface
    ComIUnknown,
    /// System.Delegate
    DelegateBase,

    // Structural kinds
    /// Interface type
    Interface,
    /// Reference type that is none of the above
    Class,
    /// Class deriving from System.MulticastDelegate
    Delegate,
    /// Non-primitive value type (struct)
    ValueType,
    /// Enumeration
    Enum,
    /// Single or multi dimensional array, see [`crate::metadata::typesystem::ManagedType::element`]
    Array,
    /// Managed reference (`ref`/`out` parameter type)
    ByRef,
}

impl TypeFlavor {
    /// Returns true for the fixed scalar flavors.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeFlavor::Void
                | TypeFlavor::Boolean
                | TypeFlavor::Char
                | TypeFlavor::I1
                | TypeFlavor::U1
                | TypeFlavor::I2
                | TypeFlavor::U2
                | TypeFlavor::I4
                | TypeFlavor::U4
                | TypeFlavor::I8
                | TypeFlavor::U8
                | TypeFlavor::R4
                | TypeFlavor::R8
                | TypeFlavor::IntPtr
                | TypeFlavor::UIntPtr
                | TypeFlavor::Decimal
                | TypeFlavor::DateTime
                | TypeFlavor::String
                | TypeFlavor::Object
        )
    }

    /// Returns true for flavors the exporter handles without resolving a type reference.
    ///
    /// Parameters of these types are always exportable as long as their projection is supported.
    #[must_use]
    pub fn is_special_handled(&self) -> bool {
        matches!(
            self,
            TypeFlavor::Object
                | TypeFlavor::String
                | TypeFlavor::Void
                | TypeFlavor::Color
                | TypeFlavor::DateTime
                | TypeFlavor::Decimal
                | TypeFlavor::Guid
        )
    }

    /// Returns true for value type flavors.
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        (self.is_scalar()
            && !matches!(self, TypeFlavor::Void | TypeFlavor::String | TypeFlavor::Object))
            || matches!(
                self,
                TypeFlavor::Color | TypeFlavor::Guid | TypeFlavor::ValueType | TypeFlavor::Enum
            )
    }

    /// Returns true for interface flavors.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(
            self,
            TypeFlavor::Interface
                | TypeFlavor::Enumerator
                | TypeFlavor::ComIDispatch
                | TypeFlavor::ComIUnknown
        )
    }

    /// Returns true for reference types that are neither interfaces nor wrappers.
    #[must_use]
    pub fn is_class(&self) -> bool {
        matches!(
            self,
            TypeFlavor::Class
                | TypeFlavor::Delegate
                | TypeFlavor::DelegateBase
                | TypeFlavor::String
                | TypeFlavor::Object
                | TypeFlavor::Array
        )
    }
}

/// ABI an interface is exposed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, IntoStaticStr)]
pub enum ComInterfaceType {
    /// Vtable derived from `IDispatch`, also callable through late binding
    #[default]
    Dual,
    /// Vtable derived from `IUnknown`
    IUnknown,
    /// Pure dispatch interface
    IDispatch,
    /// Windows Runtime interface, not representable in a type library
    IInspectable,
}

/// Kind of class interface generated for a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, IntoStaticStr)]
pub enum ClassInterfaceType {
    /// Empty dual interface, members reachable through late binding only
    #[default]
    AutoDispatch,
    /// No class interface
    None,
    /// Class interface listing every public member, rejected on export
    AutoDual,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_flavor_categories_are_disjoint() {
        for flavor in TypeFlavor::iter() {
            let categories = [flavor.is_interface(), flavor.is_class(), flavor.is_value_type()];
            let hits = categories.iter().filter(|c| **c).count();
            match flavor {
                TypeFlavor::Void | TypeFlavor::ByRef => assert_eq!(hits, 0, "{flavor}"),
                _ => assert_eq!(hits, 1, "{flavor}"),
            }
        }
    }

    #[test]
    fn test_special_handled() {
        assert!(TypeFlavor::Guid.is_special_handled());
        assert!(TypeFlavor::String.is_special_handled());
        assert!(!TypeFlavor::I4.is_special_handled());
        assert!(!TypeFlavor::Interface.is_special_handled());
    }

    #[test]
    fn test_default_interface_kind() {
        assert_eq!(ComInterfaceType::default(), ComInterfaceType::Dual);
        assert_eq!(ClassInterfaceType::default(), ClassInterfaceType::AutoDispatch);
    }
}
