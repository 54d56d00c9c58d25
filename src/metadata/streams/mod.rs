//! Metadata streams.
//!
//! The metadata root names up to six streams; each is parsed by one type of this module:
//!
//! ## String Heaps
//! - **`#Strings`** - UTF-8 identifier strings heap containing type names, member names, etc.
//!   The first entry is always empty. All entries are NUL-terminated.
//! - **`#US`** - UTF-16 user string heap containing string literals from IL code.
//!   Each entry includes a length prefix and terminal byte for special character handling.
//!
//! ## Binary Data
//! - **`#Blob`** - Binary heap containing signatures, custom attribute data, and other
//!   variable-length binary structures referenced by metadata tables.
//! - **`#GUID`** - Sequence of 128-bit GUIDs used for module identity.
//!
//! ## Metadata Tables
//! - **`#~`** - Compressed metadata tables
//! - **`#-`** - Uncompressed metadata tables, which may use pointer tables and carry
//!   edit-and-continue information
//!
//! # Reference
//! * ECMA-335 II.24.2

/// The header of a stream, indicates location + size + name
mod streamheader;
pub use streamheader::{StreamHeader, MAX_STREAM_NAME};

/// The '#Strings' heap implementation
mod strings;
pub use strings::Strings;

/// The '#US' heap implementation
mod userstrings;
pub use userstrings::UserStrings;

/// The '#GUID' heap implementation
mod guid;
pub use guid::{Guid, GUID_SIZE};

/// The '#Blob' heap implementation
mod blob;
pub use blob::{Blob, BlobIterator};

/// The '#~' and '#-' implementation
mod tablesheader;
pub use tablesheader::{TablesHeader, TABLES_HEADER_SIZE};

/// Kinds of streams the metadata root may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// `#Strings`
    Strings,
    /// `#US`
    UserStrings,
    /// `#GUID`
    Guid,
    /// `#Blob`
    Blob,
    /// `#~`
    CompressedTables,
    /// `#-`
    UncompressedTables,
}

impl StreamKind {
    /// Look up a stream by name. Names are case sensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<StreamKind> {
        match name {
            "#Strings" => Some(StreamKind::Strings),
            "#US" => Some(StreamKind::UserStrings),
            "#GUID" => Some(StreamKind::Guid),
            "#Blob" => Some(StreamKind::Blob),
            "#~" => Some(StreamKind::CompressedTables),
            "#-" => Some(StreamKind::UncompressedTables),
            _ => None,
        }
    }

    /// True for either table stream
    #[must_use]
    pub fn is_tables(&self) -> bool {
        matches!(
            self,
            StreamKind::CompressedTables | StreamKind::UncompressedTables
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(StreamKind::from_name("#~"), Some(StreamKind::CompressedTables));
        assert_eq!(StreamKind::from_name("#-"), Some(StreamKind::UncompressedTables));
        assert_eq!(StreamKind::from_name("#US"), Some(StreamKind::UserStrings));
        assert_eq!(StreamKind::from_name("#strings"), None);
        assert_eq!(StreamKind::from_name("#Pdb"), None);
        assert!(StreamKind::CompressedTables.is_tables());
        assert!(!StreamKind::Blob.is_tables());
    }
}
