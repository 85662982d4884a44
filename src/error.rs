use std::path::PathBuf;

use thiserror::Error;
use uguid::Guid;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which covers every fatal condition this library can return.
///
/// Only configuration problems and broken input descriptors are reported through this type.
/// Unsupported type/hint combinations, unresolved references and duplicate dispatch IDs are
/// recoverable: they are recorded in [`crate::metadata::diagnostics::Diagnostics`] and the
/// affected member is dropped or degraded instead.
///
/// # Error Categories
///
/// ## Configuration Errors
/// - [`Error::MissingIdentity`] - A type needs a GUID but none can be declared or derived
/// - [`Error::ConflictingLibrary`] - Two different libraries claim the same identity
/// - [`Error::UnsupportedInterfaceKind`] - The interface ABI cannot be expressed in a type library
/// - [`Error::UnsupportedClassInterface`] - A class requests a dual class interface
/// - [`Error::NamesFile`] - A name-casing file could not be read
///
/// ## Descriptor Errors
/// - [`Error::Malformed`] - A marshalling descriptor blob is invalid
/// - [`Error::OutOfBounds`] - A read went past the end of a descriptor blob
/// - [`Error::RecursionLimit`] - A type shape nests deeper than allowed
///
/// # Examples
///
/// ```rust
/// use tlbscope::{Error, metadata::marshalling::MarshalHint};
///
/// match MarshalHint::from_descriptor(&[]) {
///     Ok(hint) => println!("hint: {:?}", hint),
///     Err(Error::OutOfBounds) => eprintln!("descriptor is empty"),
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Configuration Errors
    /// A type requires an identity GUID for the requested operation, but it neither declares
    /// one nor belongs to an assembly from which one could be derived.
    #[error("Missing identity for type - {name}")]
    MissingIdentity {
        /// Full name of the type that lacks an identity
        name: String,
    },

    /// Two different libraries were registered under the same library identity.
    ///
    /// Registering the *same* library twice is a no-op; this error is only raised when the
    /// identity is already bound to a different library handle.
    #[error("A different type library is already registered for {guid}")]
    ConflictingLibrary {
        /// GUID of the contested library identity
        guid: Guid,
    },

    /// The interface declares an ABI that cannot be represented in a type library.
    #[error("Interface kind is not supported - {0}")]
    UnsupportedInterfaceKind(String),

    /// A class asks for a dual class interface, which exposes its layout to early-bound
    /// clients and is not exported.
    #[error("Dual class interfaces are not supported - {0}")]
    UnsupportedClassInterface(String),

    /// A names file listed in the converter settings could not be read.
    #[error("Failed to read names file {path:?} - {source}")]
    NamesFile {
        /// The path that failed to load
        path: PathBuf,
        /// The underlying I/O failure
        source: std::io::Error,
    },

    // Descriptor Errors
    /// A marshalling descriptor could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while reading a descriptor blob.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// A type shape nests deeper than the projector is willing to follow.
    ///
    /// The associated value shows the recursion limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
}
