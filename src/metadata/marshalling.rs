//! Marshalling hints for COM interop.
//!
//! A marshalling hint asks for a specific native representation of a parameter, return
//! value or field, overriding the default projection of its managed type. Hints are encoded
//! in metadata as ECMA-335 II.23.4 `FieldMarshal` blobs; this module decodes the parts that
//! influence type library projection.
//!
//! # Key Components
//!
//! - [`UnmanagedType`] - The requested native type, values equal to the blob's lead byte
//! - [`MarshalHint`] - Decoded hint as consumed by the projector
//!
//! # Examples
//!
//! ```rust
//! use tlbscope::metadata::marshalling::{MarshalHint, UnmanagedType};
//! use tlbscope::typelib::variant::VariantTag;
//!
//! // SAFEARRAY of VT_BSTR
//! let hint = MarshalHint::from_descriptor(&[0x1D, 0x08])?;
//! assert_eq!(hint.native, UnmanagedType::SafeArray);
//! assert_eq!(hint.safe_array_sub_type, Some(VariantTag::BStr));
//!
//! let hint = MarshalHint::from_descriptor(&[0x13])?;
//! assert_eq!(hint, MarshalHint::new(UnmanagedType::BStr));
//! # Ok::<(), tlbscope::Error>(())
//! ```

use strum::{Display, EnumIter, FromRepr, IntoStaticStr};

use crate::{file::parser::Parser, typelib::variant::VariantTag, Result};

/// Native type requested by a marshalling hint.
///
/// Discriminants are the ECMA-335 `NATIVE_TYPE` byte values; [`UnmanagedType::Unspecified`]
/// stands for a hint that carries only a safe-array sub-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum UnmanagedType {
    /// No native type requested
    Unspecified = 0x00,
    /// 4-byte Win32 `BOOL`
    Bool = 0x02,
    /// Signed 1-byte integer
    I1 = 0x03,
    /// Unsigned 1-byte integer
    U1 = 0x04,
    /// Signed 2-byte integer
    I2 = 0x05,
    /// Unsigned 2-byte integer
    U2 = 0x06,
    /// Signed 4-byte integer
    I4 = 0x07,
    /// Unsigned 4-byte integer
    U4 = 0x08,
    /// Signed 8-byte integer
    I8 = 0x09,
    /// Unsigned 8-byte integer
    U8 = 0x0a,
    /// 4-byte float
    R4 = 0x0b,
    /// 8-byte float
    R8 = 0x0c,
    /// OLE `CURRENCY`
    Currency = 0x0f,
    /// Length-prefixed Unicode string
    BStr = 0x13,
    /// Null-terminated ANSI string
    LPStr = 0x14,
    /// Null-terminated Unicode string
    LPWStr = 0x15,
    /// Null-terminated platform string
    LPTStr = 0x16,
    /// Inline fixed-length string
    ByValTStr = 0x17,
    /// `IUnknown` pointer
    IUnknown = 0x19,
    /// `IDispatch` pointer
    IDispatch = 0x1a,
    /// `VARIANT` or by-value structure
    Struct = 0x1b,
    /// Interface pointer of the declared type
    Interface = 0x1c,
    /// `SAFEARRAY`
    SafeArray = 0x1d,
    /// Inline fixed-length array
    ByValArray = 0x1e,
    /// Pointer-sized signed integer
    SysInt = 0x1f,
    /// Pointer-sized unsigned integer
    SysUInt = 0x20,
    /// Visual Basic by-reference string
    VBByRefStr = 0x22,
    /// ANSI `BSTR`
    AnsiBStr = 0x23,
    /// Platform `BSTR`
    TBStr = 0x24,
    /// 2-byte `VARIANT_BOOL`
    VariantBool = 0x25,
    /// Function pointer
    FunctionPtr = 0x26,
    /// Type determined at run time
    AsAny = 0x28,
    /// C-style array
    LPArray = 0x2a,
    /// Pointer to a structure
    LPStruct = 0x2b,
    /// Custom marshaler
    CustomMarshaler = 0x2c,
    /// `HRESULT`
    Error = 0x2d,
    /// `IInspectable` pointer
    IInspectable = 0x2e,
    /// Windows Runtime string
    HString = 0x2f,
    /// Null-terminated UTF-8 string
    LPUTF8Str = 0x30,
}

/// Marshalling hint attached to a parameter, return value or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarshalHint {
    /// Requested native type
    pub native: UnmanagedType,
    /// Declared element type of a `SAFEARRAY`; `None` if unspecified
    pub safe_array_sub_type: Option<VariantTag>,
}

impl MarshalHint {
    /// Creates a hint requesting `native`, without safe-array sub-type.
    #[must_use]
    pub fn new(native: UnmanagedType) -> Self {
        MarshalHint {
            native,
            safe_array_sub_type: None,
        }
    }

    /// Creates a `SAFEARRAY` hint with the given element type.
    #[must_use]
    pub fn safe_array(sub_type: VariantTag) -> Self {
        MarshalHint {
            native: UnmanagedType::SafeArray,
            safe_array_sub_type: Some(sub_type),
        }
    }

    /// Sets the safe-array sub-type on an existing hint.
    #[must_use]
    pub fn with_safe_array_sub_type(mut self, sub_type: VariantTag) -> Self {
        self.safe_array_sub_type = Some(sub_type);
        self
    }

    /// Returns the requested native type, or `None` for [`UnmanagedType::Unspecified`].
    #[must_use]
    pub fn requested(&self) -> Option<UnmanagedType> {
        match self.native {
            UnmanagedType::Unspecified => None,
            native => Some(native),
        }
    }

    /// Decodes a `FieldMarshal` blob.
    ///
    /// Only the lead byte and, for `SAFEARRAY`, the element variant type are interpreted;
    /// size parameters and custom marshaler names are skipped.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for an empty blob, and [`crate::Error::Malformed`]
    /// for a lead byte that does not name a native type or an unknown element variant type.
    pub fn from_descriptor(data: &[u8]) -> Result<Self> {
        let mut parser = Parser::new(data);

        let head = parser.read_u8()?;
        let native = match UnmanagedType::from_repr(head) {
            Some(UnmanagedType::Unspecified) | None => {
                return Err(malformed_error!("Invalid native type - {:#04x}", head));
            }
            Some(native) => native,
        };

        let mut hint = MarshalHint::new(native);
        if native == UnmanagedType::SafeArray && parser.has_more_data() {
            let raw = parser.read_compressed_uint()?;
            let masked = u16::try_from(raw)
                .map_err(|_| malformed_error!("Invalid variant type - {:#x}", raw))?
                & VariantTag::TYPEMASK;

            if masked != 0 {
                let tag = VariantTag::from_repr(masked)
                    .ok_or_else(|| malformed_error!("Invalid variant type - {:#x}", masked))?;
                hint.safe_array_sub_type = Some(tag);
            }
        }

        Ok(hint)
    }
}

impl From<UnmanagedType> for MarshalHint {
    fn from(native: UnmanagedType) -> Self {
        MarshalHint::new(native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_parse_simple_types() {
        let test_cases = vec![
            (vec![0x02], UnmanagedType::Bool),
            (vec![0x07], UnmanagedType::I4),
            (vec![0x0f], UnmanagedType::Currency),
            (vec![0x13], UnmanagedType::BStr),
            (vec![0x19], UnmanagedType::IUnknown),
            (vec![0x25], UnmanagedType::VariantBool),
            (vec![0x28], UnmanagedType::AsAny),
            (vec![0x2d], UnmanagedType::Error),
        ];

        for (input, expected) in test_cases {
            let hint = MarshalHint::from_descriptor(&input).unwrap();
            assert_eq!(hint.native, expected);
            assert_eq!(hint.safe_array_sub_type, None);
        }
    }

    #[test]
    fn test_parse_trailing_parameters_ignored() {
        // LPARRAY of I4 with size parameter 3
        let hint = MarshalHint::from_descriptor(&[0x2a, 0x07, 0x03]).unwrap();
        assert_eq!(hint.native, UnmanagedType::LPArray);
        assert_eq!(hint.safe_array_sub_type, None);
    }

    #[test]
    fn test_parse_safe_array() {
        let test_cases = vec![
            (vec![0x1d], None),
            (vec![0x1d, 0x00], None),
            (vec![0x1d, 0x08], Some(VariantTag::BStr)),
            (vec![0x1d, 0x0c], Some(VariantTag::Variant)),
            (vec![0x1d, 0x1d], Some(VariantTag::UserDefined)),
            (vec![0x1d, 0x40], Some(VariantTag::FileTime)),
        ];

        for (input, expected) in test_cases {
            let hint = MarshalHint::from_descriptor(&input).unwrap();
            assert_eq!(hint.native, UnmanagedType::SafeArray);
            assert_eq!(hint.safe_array_sub_type, expected, "{:?}", input);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            MarshalHint::from_descriptor(&[]),
            Err(Error::OutOfBounds)
        ));
        assert!(matches!(
            MarshalHint::from_descriptor(&[0x01]),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            MarshalHint::from_descriptor(&[0x00]),
            Err(Error::Malformed { .. })
        ));
        // VT 0x0f is not a variant type
        assert!(matches!(
            MarshalHint::from_descriptor(&[0x1d, 0x0f]),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_requested() {
        assert_eq!(MarshalHint::new(UnmanagedType::Unspecified).requested(), None);
        assert_eq!(
            MarshalHint::new(UnmanagedType::LPStr).requested(),
            Some(UnmanagedType::LPStr)
        );
        assert_eq!(
            MarshalHint::from(UnmanagedType::I2),
            MarshalHint::new(UnmanagedType::I2)
        );
    }
}
