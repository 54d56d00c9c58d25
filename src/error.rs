//! Error types for metadata reading.
//!
//! Every fallible operation in this crate returns [`crate::Result`], whose error side is the
//! [`Error`] enum defined here. The variants follow the failure classes a reader of managed
//! images runs into:
//!
//! - [`Error::BadImageFormat`] for structural violations of the PE/COFF or ECMA-335 layout
//! - [`Error::OutOfRange`] for handles, offsets or row ids outside of their table or heap
//! - [`Error::UnsupportedMetadataVersion`] for table streams declaring unknown tables
//! - [`Error::NotFound`] when a collaborator (e.g. a module resolver) cannot supply something
//!
//! Structural problems are detected while a [`crate::Module`] is constructed, so no partially
//! valid reader is ever handed out. Problems that are only visible when a particular row or
//! heap entry is decoded surface from the query that touches them.

use thiserror::Error;

/// Construct an [`Error::BadImageFormat`] carrying the source location of the check that failed.
macro_rules! bad_image_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::BadImageFormat {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::BadImageFormat {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Construct an [`Error::OutOfRange`].
macro_rules! out_of_range_error {
    () => {
        crate::Error::OutOfRange
    };
}

/// The generic Error type, which covers all failures this library can produce.
#[derive(Error, Debug)]
pub enum Error {
    /// The image violates the PE/COFF or ECMA-335 structure.
    ///
    /// Covers bad signatures, directory entries or streams pointing outside of the image,
    /// tables that are not allowed in a compressed table stream and heap references past the
    /// end of their heap.
    #[error("BadImageFormat - {file}:{line}: {message}")]
    BadImageFormat {
        /// Description of the violated constraint
        message: String,
        /// Source file that detected the violation
        file: &'static str,
        /// Source line that detected the violation
        line: u32,
    },

    /// A handle, row id or heap offset lies outside of its table or heap.
    #[error("Out of range access would have occurred!")]
    OutOfRange,

    /// The valid-tables mask is not a subset of the tables known for the stream version.
    #[error("Unsupported metadata version {major}.{minor} - valid tables 0x{valid:016x}")]
    UnsupportedMetadataVersion {
        /// Major version of the table stream
        major: u8,
        /// Minor version of the table stream
        minor: u8,
        /// The offending valid-tables mask
        valid: u64,
    },

    /// A required collaborator result or entity could not be found.
    #[error("Not found - {0}")]
    NotFound(String),

    /// The requested operation is not supported by this reader.
    #[error("Not supported - {0}")]
    NotSupported(String),

    /// The provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// Failure of the underlying memory-block provider.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_image_carries_location() {
        let error = bad_image_error!("Invalid signature - 0x{:x}", 0x1234);
        match error {
            Error::BadImageFormat {
                message,
                file,
                line,
            } => {
                assert_eq!(message, "Invalid signature - 0x1234");
                assert!(file.ends_with("error.rs"));
                assert!(line > 0);
            }
            _ => panic!("Expected BadImageFormat"),
        }
    }

    #[test]
    fn display() {
        let error = Error::UnsupportedMetadataVersion {
            major: 2,
            minor: 0,
            valid: 0x0100_0000_0000_0000,
        };
        assert_eq!(
            error.to_string(),
            "Unsupported metadata version 2.0 - valid tables 0x0100000000000000"
        );

        assert_eq!(
            out_of_range_error!().to_string(),
            "Out of range access would have occurred!"
        );
    }

    #[test]
    fn io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: Error = io.into();
        assert!(matches!(error, Error::FileError(_)));
    }
}
