//! Memory-mapped file backend.
//!
//! [`Physical`] maps an image read-only into the address space with `memmap2`, so opening a
//! large assembly costs no upfront copy and pages are faulted in as metadata is touched.

use super::Backend;
use crate::Result;

use memmap2::Mmap;
use std::{fs, path::Path};

/// A backend that memory-maps an image from disk.
#[derive(Debug)]
pub struct Physical {
    data: Mmap,
}

impl Physical {
    /// Create a new physical backend by memory-mapping the file at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path)?;
        Self::from_std_file(&file)
    }

    /// Create a new physical backend from an already opened file.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if mapping fails.
    pub fn from_std_file(file: &fs::File) -> Result<Physical> {
        // The mapping is read-only; concurrent truncation by another process is outside of
        // what this crate can guard against.
        let mmap = unsafe { Mmap::map(file) }?;

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_range_error!());
        };

        if offset_end > self.data.len() {
            return Err(out_of_range_error!());
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn temp_file(name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("cilmeta_{}_{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn physical() {
        let path = temp_file("physical.bin", &[0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00]);
        let physical = Physical::new(&path).unwrap();

        assert_eq!(physical.len(), 6);
        assert_eq!(physical.data()[0], 0x4D);
        assert_eq!(physical.data_slice(2, 3).unwrap(), &[0x90, 0x00, 0x03]);
        assert!(matches!(physical.data_slice(5, 2), Err(Error::OutOfRange)));
        assert!(physical.data_slice(usize::MAX, 1).is_err());

        drop(physical);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn invalid_path() {
        match Physical::new("/nonexistent/path/to/file.dll") {
            Err(Error::FileError(io_error)) => {
                assert_eq!(io_error.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected FileError"),
        }
    }
}
