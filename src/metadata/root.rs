//! Metadata root header and stream directory.
//!
//! The metadata root is the entry point for reading metadata. It contains the version string and
//! the stream directory that locates the heaps and the table stream.
//!
//! | Offset  | Size | Field                                              |
//! |---------|------|----------------------------------------------------|
//! | 0       | 4    | Signature `0x424A5342` ("BSJB")                    |
//! | 4       | 2    | Major version                                      |
//! | 6       | 2    | Minor version                                      |
//! | 8       | 4    | Reserved                                           |
//! | 12      | 4    | Length of the version string, padded to 4          |
//! | 16      | n    | Version string, NUL padded                         |
//! | 16+n    | 2    | Flags                                              |
//! | 18+n    | 2    | Number of streams                                  |
//! | 20+n    | ...  | Stream headers                                     |
//!
//! # Example
//!
//! ```rust
//! use cilmeta::metadata::root::Root;
//!
//! #[rustfmt::skip]
//! let data = [
//!     0x42, 0x53, 0x4A, 0x42, 0x01, 0x00, 0x01, 0x00,
//!     0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
//!     b'v', b'4', 0x00, 0x00,
//!     0x00, 0x00, 0x01, 0x00,
//!     0x20, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
//!     b'#', b'~', 0x00, 0x00,
//!     0x00, 0x00, 0x00, 0x00,
//! ];
//! let root = Root::read(&data, false)?;
//! assert_eq!(root.version, "v4");
//! assert_eq!(root.stream_headers.len(), 1);
//! # Ok::<(), cilmeta::Error>(())
//! ```
//!
//! # References
//!
//! - ECMA-335 II.24.2.1

use crate::{
    file::parser::Parser,
    metadata::streams::{StreamHeader, StreamKind},
    Result,
};

/// Signature of the metadata root, "BSJB"
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// Smallest possible metadata root: the fixed fields, an empty version string, flags and count
const MIN_ROOT_SIZE: usize = 20;

const STREAM_KINDS: usize = 6;

/// The metadata root
#[derive(Debug, Clone)]
pub struct Root {
    /// Magic signature for physical metadata: 0x424A5342
    pub signature: u32,
    /// `MajorVersion`
    pub major_version: u16,
    /// `MinorVersion`
    pub minor_version: u16,
    /// Always 0
    pub reserved: u32,
    /// Number of bytes allocated to hold version string
    pub length: u32,
    /// Version string, without padding
    pub version: String,
    /// Reserved, always 0
    pub flags: u16,
    /// All stream headers in directory order, including unknown and duplicate ones
    pub stream_headers: Vec<StreamHeader>,
    known: [Option<usize>; STREAM_KINDS],
}

impl Root {
    /// Reads the metadata root and validates its stream directory.
    ///
    /// Unknown stream names are skipped with a warning unless `strict` is set. If a stream name
    /// appears more than once, the first entry is used.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the signature does not match, the directory is
    /// truncated, a stream lies outside of `data`, no table stream exists, or `strict` is set and
    /// an unknown stream is named
    pub fn read(data: &[u8], strict: bool) -> Result<Root> {
        if data.len() < MIN_ROOT_SIZE {
            return Err(bad_image_error!(
                "Metadata root of {} bytes is too short",
                data.len()
            ));
        }

        let mut parser = Parser::new(data);
        let signature = parser.read_le::<u32>()?;
        if signature != CIL_HEADER_MAGIC {
            return Err(bad_image_error!(
                "Metadata signature does not match - 0x{:08x}",
                signature
            ));
        }

        let major_version = parser.read_le::<u16>()?;
        let minor_version = parser.read_le::<u16>()?;
        let reserved = parser.read_le::<u32>()?;
        let length = parser.read_le::<u32>()?;

        let version_bytes = parser.read_bytes(length as usize).map_err(|_| {
            bad_image_error!("Version string of {} bytes exceeds the metadata", length)
        })?;
        let version_end = version_bytes
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(version_bytes.len());
        let version = String::from_utf8_lossy(&version_bytes[..version_end]).into_owned();

        let flags = parser
            .read_le::<u16>()
            .map_err(|_| bad_image_error!("Metadata root is truncated"))?;
        let stream_count = parser
            .read_le::<u16>()
            .map_err(|_| bad_image_error!("Metadata root is truncated"))?;

        let mut stream_headers = Vec::with_capacity(usize::from(stream_count));
        let mut known = [None; STREAM_KINDS];
        for _ in 0..stream_count {
            let header = StreamHeader::read(&mut parser)?;
            if header.end() > data.len() as u64 {
                return Err(bad_image_error!(
                    "Stream {} at offset {} of size {} exceeds the metadata of {} bytes",
                    header.name,
                    header.offset,
                    header.size,
                    data.len()
                ));
            }

            match StreamKind::from_name(&header.name) {
                Some(kind) => {
                    let slot = &mut known[kind as usize];
                    if slot.is_some() {
                        tracing::warn!(stream = %header.name, "ignoring duplicate metadata stream");
                    } else {
                        tracing::trace!(
                            stream = %header.name,
                            offset = header.offset,
                            size = header.size,
                            "found metadata stream"
                        );
                        *slot = Some(stream_headers.len());
                    }
                }
                None if strict => {
                    return Err(bad_image_error!("Unknown metadata stream - {}", header.name));
                }
                None => {
                    tracing::warn!(stream = %header.name, "skipping unknown metadata stream");
                }
            }

            stream_headers.push(header);
        }

        let root = Root {
            signature,
            major_version,
            minor_version,
            reserved,
            length,
            version,
            flags,
            stream_headers,
            known,
        };

        if root.table_stream().is_none() {
            return Err(bad_image_error!("Metadata has no table stream"));
        }

        tracing::debug!(
            version = %root.version,
            streams = root.stream_headers.len(),
            "parsed metadata root"
        );

        Ok(root)
    }

    /// The header of a known stream, `None` if the directory does not name it
    #[must_use]
    pub fn stream(&self, kind: StreamKind) -> Option<&StreamHeader> {
        self.known[kind as usize].map(|index| &self.stream_headers[index])
    }

    /// The table stream, preferring `#~` if both are present
    #[must_use]
    pub fn table_stream(&self) -> Option<(StreamKind, &StreamHeader)> {
        [StreamKind::CompressedTables, StreamKind::UncompressedTables]
            .into_iter()
            .find_map(|kind| self.stream(kind).map(|header| (kind, header)))
    }

    /// The bytes of a known stream within `data`, empty if the stream is absent
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn stream_data<'a>(&self, data: &'a [u8], kind: StreamKind) -> &'a [u8] {
        match self.stream(kind) {
            Some(header) => {
                let start = header.offset as usize;
                let end = header.end() as usize;
                data.get(start..end).unwrap_or(&[])
            }
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn root(streams: &[(&str, u32, u32)]) -> Vec<u8> {
        let mut data = vec![0x42, 0x53, 0x4A, 0x42, 0x01, 0x00, 0x01, 0x00, 0, 0, 0, 0];
        data.extend(12_u32.to_le_bytes());
        data.extend(b"v4.0.30319\0\0");
        data.extend([0, 0]);
        data.extend((streams.len() as u16).to_le_bytes());
        for (name, offset, size) in streams {
            data.extend(offset.to_le_bytes());
            data.extend(size.to_le_bytes());
            data.extend(name.as_bytes());
            data.push(0);
            while data.len() % 4 != 0 {
                data.push(0);
            }
        }
        data.resize(0x100, 0);
        data
    }

    #[test]
    fn crafted() {
        let data = root(&[
            ("#~", 0x80, 0x20),
            ("#Strings", 0xA0, 0x10),
            ("#US", 0xB0, 0x4),
            ("#GUID", 0xB4, 0x10),
            ("#Blob", 0xC4, 0x8),
        ]);

        let root = Root::read(&data, true).unwrap();
        assert_eq!(root.signature, CIL_HEADER_MAGIC);
        assert_eq!(root.major_version, 1);
        assert_eq!(root.version, "v4.0.30319");
        assert_eq!(root.length, 12);
        assert_eq!(root.stream_headers.len(), 5);

        let (kind, tables) = root.table_stream().unwrap();
        assert_eq!(kind, StreamKind::CompressedTables);
        assert_eq!(tables.offset, 0x80);
        assert_eq!(root.stream(StreamKind::Guid).unwrap().size, 0x10);
        assert_eq!(root.stream_data(&data, StreamKind::Blob).len(), 8);
        assert!(root.stream(StreamKind::UncompressedTables).is_none());
        assert!(root.stream_data(&data, StreamKind::UncompressedTables).is_empty());
    }

    #[test]
    fn bad_signature() {
        let mut data = root(&[("#~", 0x80, 0x20)]);
        data[0] = 0x43;
        assert!(matches!(
            Root::read(&data, false),
            Err(Error::BadImageFormat { .. })
        ));
    }

    #[test]
    fn no_table_stream() {
        let data = root(&[("#Strings", 0x80, 0x10), ("#Blob", 0x90, 0x10)]);
        assert!(matches!(
            Root::read(&data, false),
            Err(Error::BadImageFormat { .. })
        ));
    }

    #[test]
    fn stream_out_of_range() {
        let data = root(&[("#~", 0x80, 0x81)]);
        assert!(matches!(
            Root::read(&data, false),
            Err(Error::BadImageFormat { .. })
        ));

        let data = root(&[("#~", 0xFFFF_FFFF, 0x10)]);
        assert!(Root::read(&data, false).is_err());
    }

    #[test]
    fn unknown_and_duplicate_streams() {
        let data = root(&[
            ("#-", 0x80, 0x20),
            ("#Pdb", 0xA0, 0x10),
            ("#Strings", 0xB0, 0x8),
            ("#Strings", 0xB8, 0x8),
        ]);

        let root_lenient = Root::read(&data, false).unwrap();
        assert_eq!(root_lenient.stream_headers.len(), 4);
        assert_eq!(
            root_lenient.table_stream().unwrap().0,
            StreamKind::UncompressedTables
        );
        assert_eq!(root_lenient.stream(StreamKind::Strings).unwrap().offset, 0xB0);

        assert!(matches!(
            Root::read(&data, true),
            Err(Error::BadImageFormat { .. })
        ));
    }

    #[test]
    fn truncated() {
        assert!(Root::read(&[0x42, 0x53, 0x4A, 0x42], false).is_err());

        let mut data = root(&[("#~", 0x80, 0x20)]);
        // Version string length past the end
        data[12..16].copy_from_slice(&0x1000_u32.to_le_bytes());
        assert!(Root::read(&data, false).is_err());
    }
}
