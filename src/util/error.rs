//! Error types for the IVE library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for IVE operations.
///
/// Every variant except [`Error::FileNotFound`] on an external image is fatal
/// for the read or write that raised it.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The plugin was asked to handle a file it does not understand
    #[error("File not handled: {0}")]
    FileNotHandled(String),

    /// Endian marker matches neither native nor swapped sentinel
    #[error("Invalid IVE file: unrecognised endian marker 0x{0:08x}")]
    InvalidEndianMarker(u32),

    /// Stream was written by a newer version of the format
    #[error("Unsupported IVE version {found} (this reader supports up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Writer asked to emit something the target version cannot carry
    #[error("{feature} requires IVE version {required}, stream version is {version}")]
    UnsupportedInVersion {
        feature: &'static str,
        required: u32,
        version: u32,
    },

    /// Stream is truncated
    #[error("Unexpected end of stream at position {0}")]
    UnexpectedEof(u64),

    /// Tag matches no registered concrete type of the category
    #[error("Unknown {category} type tag 0x{tag:08x}")]
    UnknownTypeTag { category: &'static str, tag: i32 },

    /// A typed reader found another type's tag
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A new object id that does not follow traversal order
    #[error("Invalid {category} id {id} (next expected id is {expected})")]
    InvalidId {
        category: &'static str,
        id: i32,
        expected: i32,
    },

    /// Invalid data structure in stream
    #[error("Invalid stream structure: {0}")]
    InvalidStructure(String),

    /// Compressed payload could not be produced or inflated
    #[error("Compression error: {0}")]
    Compression(String),

    /// Image encode/decode failure
    #[error("Image codec error: {0}")]
    ImageCodec(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a type mismatch error from an expected type name and the tag found.
    pub fn mismatch(expected: impl Into<String>, found_tag: i32) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: format!("tag 0x{found_tag:08x}"),
        }
    }

    /// True for errors raised while reading the envelope.
    pub fn is_envelope(&self) -> bool {
        matches!(self, Self::InvalidEndianMarker(_) | Self::UnsupportedVersion { .. })
    }
}

/// Result type alias for IVE operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::InvalidEndianMarker(0xdeadbeef);
        assert!(e.to_string().contains("deadbeef"));

        let e = Error::UnsupportedVersion { found: 99, supported: 46 };
        assert!(e.to_string().contains("99"));
        assert!(e.to_string().contains("46"));
        assert!(e.is_envelope());

        let e = Error::mismatch("MatrixTransform", 3);
        assert!(e.to_string().contains("MatrixTransform"));
        assert!(e.to_string().contains("0x00000003"));
        assert!(!e.is_envelope());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
