//! Variant type tags and composite type descriptors.
//!
//! A COM type library describes every parameter, return value and field with a `TYPEDESC`:
//! a tree whose nodes carry a `VARTYPE` tag. Leaves are scalar tags or a reference to another
//! type info; inner nodes are pointer and safe-array wrappers. [`VariantTag`] is the closed
//! tag vocabulary and [`TypeDescriptor`] the tree.
//!
//! # Examples
//!
//! ```rust
//! use tlbscope::typelib::variant::{TypeDescriptor, VariantTag};
//!
//! let strings = TypeDescriptor::safe_array(TypeDescriptor::Scalar(VariantTag::BStr));
//! assert_eq!(strings.tag(), VariantTag::SafeArray);
//! assert_eq!(strings.to_string(), "VT_SAFEARRAY(VT_BSTR)");
//! assert!(strings.is_well_formed());
//! ```

use std::fmt;

use strum::{Display, EnumIter, FromRepr, IntoStaticStr};

use crate::typelib::types::TypeInfoRc;

/// Variant type tag (`VARTYPE`) as used in type descriptors.
///
/// There is deliberately no `VT_EMPTY` member: an absent tag is expressed as `None`,
/// which is how unsupported projections and "no safe-array sub-type" are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum VariantTag {
    #[strum(serialize = "VT_NULL")]
    Null = 1,
    #[strum(serialize = "VT_I2")]
    I2 = 2,
    #[strum(serialize = "VT_I4")]
    I4 = 3,
    #[strum(serialize = "VT_R4")]
    R4 = 4,
    #[strum(serialize = "VT_R8")]
    R8 = 5,
    #[strum(serialize = "VT_CY")]
    Cy = 6,
    #[strum(serialize = "VT_DATE")]
    Date = 7,
    #[strum(serialize = "VT_BSTR")]
    BStr = 8,
    #[strum(serialize = "VT_DISPATCH")]
    Dispatch = 9,
    #[strum(serialize = "VT_ERROR")]
    Error = 10,
    #[strum(serialize = "VT_BOOL")]
    Bool = 11,
    #[strum(serialize = "VT_VARIANT")]
    Variant = 12,
    #[strum(serialize = "VT_UNKNOWN")]
    Unknown = 13,
    #[strum(serialize = "VT_DECIMAL")]
    Decimal = 14,
    #[strum(serialize = "VT_I1")]
    I1 = 16,
    #[strum(serialize = "VT_UI1")]
    UI1 = 17,
    #[strum(serialize = "VT_UI2")]
    UI2 = 18,
    #[strum(serialize = "VT_UI4")]
    UI4 = 19,
    #[strum(serialize = "VT_I8")]
    I8 = 20,
    #[strum(serialize = "VT_UI8")]
    UI8 = 21,
    #[strum(serialize = "VT_INT")]
    Int = 22,
    #[strum(serialize = "VT_UINT")]
    UInt = 23,
    #[strum(serialize = "VT_VOID")]
    Void = 24,
    #[strum(serialize = "VT_HRESULT")]
    HResult = 25,
    #[strum(serialize = "VT_PTR")]
    Ptr = 26,
    #[strum(serialize = "VT_SAFEARRAY")]
    SafeArray = 27,
    #[strum(serialize = "VT_CARRAY")]
    CArray = 28,
    #[strum(serialize = "VT_USERDEFINED")]
    UserDefined = 29,
    #[strum(serialize = "VT_LPSTR")]
    LPStr = 30,
    #[strum(serialize = "VT_LPWSTR")]
    LPWStr = 31,
    #[strum(serialize = "VT_RECORD")]
    Record = 36,
    #[strum(serialize = "VT_INT_PTR")]
    IntPtr = 37,
    #[strum(serialize = "VT_UINT_PTR")]
    UIntPtr = 38,
    #[strum(serialize = "VT_FILETIME")]
    FileTime = 64,
    #[strum(serialize = "VT_BLOB")]
    Blob = 65,
    #[strum(serialize = "VT_STREAM")]
    Stream = 66,
    #[strum(serialize = "VT_STORAGE")]
    Storage = 67,
    #[strum(serialize = "VT_STREAMED_OBJECT")]
    StreamedObject = 68,
    #[strum(serialize = "VT_STORED_OBJECT")]
    StoredObject = 69,
    #[strum(serialize = "VT_BLOB_OBJECT")]
    BlobObject = 70,
    #[strum(serialize = "VT_CF")]
    Cf = 71,
    #[strum(serialize = "VT_CLSID")]
    Clsid = 72,
    #[strum(serialize = "VT_VECTOR")]
    Vector = 0x1000,
    #[strum(serialize = "VT_ARRAY")]
    Array = 0x2000,
    #[strum(serialize = "VT_BYREF")]
    ByRef = 0x4000,
}

impl VariantTag {
    /// Mask selecting the base type of a `VARTYPE`, without the vector/array/byref modifiers.
    pub const TYPEMASK: u16 = 0x0fff;

    /// Returns the raw `VARTYPE` value.
    #[must_use]
    pub fn value(self) -> u16 {
        self as u16
    }

    /// Returns true if this tag cannot be used as the declared element type of a safe array.
    ///
    /// Storage-style tags and structural tags (pointers, arrays, records) have no
    /// automation representation as a safe-array element.
    #[must_use]
    pub fn is_rejected_safe_array_element(self) -> bool {
        matches!(
            self,
            VariantTag::FileTime
                | VariantTag::Blob
                | VariantTag::Stream
                | VariantTag::Storage
                | VariantTag::StreamedObject
                | VariantTag::StoredObject
                | VariantTag::BlobObject
                | VariantTag::Cf
                | VariantTag::Clsid
                | VariantTag::Vector
                | VariantTag::Array
                | VariantTag::ByRef
                | VariantTag::Ptr
                | VariantTag::CArray
                | VariantTag::Record
                | VariantTag::SafeArray
        )
    }
}

/// A composite COM type descriptor.
///
/// Wrapper nodes own their single child; user-defined leaves carry the resolved type info.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    /// A scalar leaf such as `VT_I4` or `VT_BSTR`
    Scalar(VariantTag),
    /// `VT_PTR` to the child descriptor
    Pointer(Box<TypeDescriptor>),
    /// `VT_SAFEARRAY` of the child descriptor
    SafeArray(Box<TypeDescriptor>),
    /// `VT_USERDEFINED` reference to a resolved type info
    UserDefined(TypeInfoRc),
}

impl TypeDescriptor {
    /// Wraps `inner` in a `VT_PTR` node.
    #[must_use]
    pub fn pointer(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Pointer(Box::new(inner))
    }

    /// Wraps `inner` in a `VT_SAFEARRAY` node.
    #[must_use]
    pub fn safe_array(inner: TypeDescriptor) -> Self {
        TypeDescriptor::SafeArray(Box::new(inner))
    }

    /// Returns the tag of the root node.
    #[must_use]
    pub fn tag(&self) -> VariantTag {
        match self {
            TypeDescriptor::Scalar(tag) => *tag,
            TypeDescriptor::Pointer(_) => VariantTag::Ptr,
            TypeDescriptor::SafeArray(_) => VariantTag::SafeArray,
            TypeDescriptor::UserDefined(_) => VariantTag::UserDefined,
        }
    }

    /// Returns the child of a wrapper node.
    #[must_use]
    pub fn child(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Pointer(inner) | TypeDescriptor::SafeArray(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns the type info referenced by a user-defined leaf.
    #[must_use]
    pub fn reference(&self) -> Option<&TypeInfoRc> {
        match self {
            TypeDescriptor::UserDefined(info) => Some(info),
            _ => None,
        }
    }

    /// Returns the innermost leaf of the tree.
    #[must_use]
    pub fn leaf(&self) -> &TypeDescriptor {
        let mut current = self;
        while let Some(child) = current.child() {
            current = child;
        }
        current
    }

    /// Returns the number of wrapper nodes above the leaf.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(child) = current.child() {
            depth += 1;
            current = child;
        }
        depth
    }

    /// Checks the structural rules of a descriptor tree.
    ///
    /// Scalar leaves must not carry a structural tag (`VT_PTR`, `VT_SAFEARRAY`, `VT_CARRAY`,
    /// `VT_USERDEFINED`) or a modifier bit, and a safe array may not directly contain another
    /// safe array.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match self {
            TypeDescriptor::Scalar(tag) => !matches!(
                tag,
                VariantTag::Ptr
                    | VariantTag::SafeArray
                    | VariantTag::CArray
                    | VariantTag::UserDefined
                    | VariantTag::Vector
                    | VariantTag::Array
                    | VariantTag::ByRef
            ),
            TypeDescriptor::Pointer(inner) => inner.is_well_formed(),
            TypeDescriptor::SafeArray(inner) => {
                !matches!(**inner, TypeDescriptor::SafeArray(_)) && inner.is_well_formed()
            }
            TypeDescriptor::UserDefined(_) => true,
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeDescriptor::Scalar(a), TypeDescriptor::Scalar(b)) => a == b,
            (TypeDescriptor::Pointer(a), TypeDescriptor::Pointer(b))
            | (TypeDescriptor::SafeArray(a), TypeDescriptor::SafeArray(b)) => a == b,
            (TypeDescriptor::UserDefined(a), TypeDescriptor::UserDefined(b)) => a.guid == b.guid,
            _ => false,
        }
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(tag) => write!(f, "{tag}"),
            TypeDescriptor::Pointer(inner) => write!(f, "VT_PTR({inner})"),
            TypeDescriptor::SafeArray(inner) => write!(f, "VT_SAFEARRAY({inner})"),
            TypeDescriptor::UserDefined(info) => write!(f, "VT_USERDEFINED({})", info.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::fixtures::type_info;
    use crate::typelib::types::TypeKind;
    use strum::IntoEnumIterator;

    #[test]
    fn test_tag_values() {
        let cases = vec![
            (VariantTag::I2, 2),
            (VariantTag::I4, 3),
            (VariantTag::BStr, 8),
            (VariantTag::Bool, 11),
            (VariantTag::Variant, 12),
            (VariantTag::UI1, 17),
            (VariantTag::Void, 24),
            (VariantTag::HResult, 25),
            (VariantTag::Ptr, 26),
            (VariantTag::SafeArray, 27),
            (VariantTag::UserDefined, 29),
            (VariantTag::Clsid, 72),
            (VariantTag::ByRef, 0x4000),
        ];

        for (tag, value) in cases {
            assert_eq!(tag.value(), value);
            assert_eq!(VariantTag::from_repr(value), Some(tag));
        }

        assert_eq!(VariantTag::from_repr(0), None);
        assert_eq!(VariantTag::from_repr(15), None);
    }

    #[test]
    fn test_tag_display_is_unique() {
        let mut names: Vec<String> = VariantTag::iter().map(|t| t.to_string()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(names.iter().all(|n| n.starts_with("VT_")));
    }

    #[test]
    fn test_rejected_safe_array_elements() {
        assert!(VariantTag::FileTime.is_rejected_safe_array_element());
        assert!(VariantTag::SafeArray.is_rejected_safe_array_element());
        assert!(VariantTag::Record.is_rejected_safe_array_element());
        assert!(!VariantTag::BStr.is_rejected_safe_array_element());
        assert!(!VariantTag::Variant.is_rejected_safe_array_element());
        assert!(!VariantTag::UserDefined.is_rejected_safe_array_element());
    }

    #[test]
    fn test_descriptor_shape() {
        let info = type_info("IWidget", TypeKind::Interface);
        let desc = TypeDescriptor::pointer(TypeDescriptor::UserDefined(info.clone()));

        assert_eq!(desc.tag(), VariantTag::Ptr);
        assert_eq!(desc.depth(), 1);
        assert_eq!(desc.leaf().tag(), VariantTag::UserDefined);
        assert_eq!(desc.leaf().reference().map(|i| i.guid), Some(info.guid));
        assert_eq!(desc.to_string(), "VT_PTR(VT_USERDEFINED(IWidget))");
    }

    #[test]
    fn test_well_formed() {
        let good = TypeDescriptor::safe_array(TypeDescriptor::Scalar(VariantTag::Variant));
        assert!(good.is_well_formed());

        let nested = TypeDescriptor::safe_array(TypeDescriptor::safe_array(
            TypeDescriptor::Scalar(VariantTag::I4),
        ));
        assert!(!nested.is_well_formed());

        let bare_pointer_tag = TypeDescriptor::Scalar(VariantTag::Ptr);
        assert!(!bare_pointer_tag.is_well_formed());

        let pointer_to_array =
            TypeDescriptor::pointer(TypeDescriptor::safe_array(TypeDescriptor::Scalar(
                VariantTag::BStr,
            )));
        assert!(pointer_to_array.is_well_formed());
    }
}
