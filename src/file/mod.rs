//! Binary input helpers.
//!
//! Marshalling annotations arrive as ECMA-335 `NativeType` blobs. This module provides the
//! bounds-checked cursor used to decode them.
//!
//! # Key Components
//!
//! - [`crate::file::parser::Parser`] - Cursor-based reader with ECMA-335 compressed integer support

pub mod parser;
