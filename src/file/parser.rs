//! Low-level byte stream parser for marshalling descriptors.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor over a byte slice
//! that understands the compressed integer encoding of ECMA-335 II.23.2. It is used to decode
//! `FieldMarshal` blobs into [`crate::metadata::marshalling::MarshalHint`] values.
//!
//! # Usage Examples
//!
//! ```rust
//! use tlbscope::Parser;
//!
//! // SAFEARRAY (0x1D) of VT_BSTR (8)
//! let data = [0x1D, 0x08];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_u8()?, 0x1D);
//! assert_eq!(parser.read_compressed_uint()?, 8);
//! assert!(!parser.has_more_data());
//! # Ok::<(), tlbscope::Error>(())
//! ```

use crate::{Error, Result};

/// A bounds-checked cursor over a descriptor blob.
///
/// Every read validates that enough data remains and reports [`crate::Error::OutOfBounds`]
/// instead of panicking on truncated input.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Check if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Read a single byte and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if at the end of data.
    pub fn read_u8(&mut self) -> Result<u8> {
        let value = *self.data.get(self.position).ok_or(Error::OutOfBounds)?;
        self.position += 1;
        Ok(value)
    }

    /// Read a compressed unsigned integer as defined in ECMA-335 II.23.2.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for an invalid lead byte.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tlbscope::Parser;
    ///
    /// let mut parser = Parser::new(&[0x80, 0x80]);
    /// assert_eq!(parser.read_compressed_uint()?, 0x80);
    /// # Ok::<(), tlbscope::Error>(())
    /// ```
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_u8()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_u8()?;
            let value = ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte);
            return Ok(value);
        }

        // 4-byte encoding: 11xxxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_u8()?);
            let b2 = u32::from(self.read_u8()?);
            let b3 = u32::from(self.read_u8()?);
            let value = ((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3;
            return Ok(value);
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }
}
