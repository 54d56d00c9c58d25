//! Stream headers of the metadata root.
//!
//! # Reference
//! - ECMA-335 II.24.2.2

use crate::{file::parser::Parser, Result};

/// Longest stream name, including the terminating NUL
pub const MAX_STREAM_NAME: usize = 32;

/// A stream header provides the name, and the position and length of a particular table or heap.
/// The length of a stream header is not fixed: the NUL-terminated name is padded to a multiple
/// of four bytes.
///
/// # Examples
///
/// ```rust
/// use cilmeta::{metadata::streams::StreamHeader, Parser};
///
/// let data = [0x6C, 0, 0, 0, 0xA4, 0x45, 0, 0, b'#', b'~', 0, 0];
/// let header = StreamHeader::read(&mut Parser::new(&data))?;
/// assert_eq!(header.name, "#~");
/// assert_eq!(header.size, 0x45A4);
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream, relative to the metadata root
    pub offset: u32,
    /// Size of this stream in bytes
    pub size: u32,
    /// Name of the stream
    pub name: String,
}

impl StreamHeader {
    /// Read one header at the parser position and leave the parser at the next header.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the header is truncated, or the name is longer
    /// than 32 bytes or not ASCII
    pub fn read(parser: &mut Parser) -> Result<StreamHeader> {
        let offset = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;

        let remaining = &parser.data()[parser.pos()..];
        let window = &remaining[..remaining.len().min(MAX_STREAM_NAME)];
        let Some(length) = window.iter().position(|byte| *byte == 0) else {
            return Err(bad_image_error!("Stream name is not terminated within 32 bytes"));
        };

        let name = &window[..length];
        if !name.is_ascii() {
            return Err(bad_image_error!("Stream name is not ASCII"));
        }
        let name = String::from_utf8_lossy(name).into_owned();

        parser.advance_by(length + 1)?;
        parser.align(4)?;

        Ok(StreamHeader { offset, size, name })
    }

    /// Offset one past the last byte of the stream, relative to the metadata root
    #[must_use]
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }
}
