//! Image access: memory-block providers, PE/COFF headers and binary readers.
//!
//! A [`File`] owns the bytes of one image through a [`Backend`] and, unless it was opened in
//! metadata-only mode, the parsed [`pe::PeHeaders`]. Everything above this layer addresses the
//! image through RVAs that [`File::rva_to_offset`] translates.
//!
//! # Data Sources
//!
//! - [`File::from_file`] memory-maps an image from disk
//! - [`File::from_mem`] takes ownership of an in-memory buffer
//! - [`File::metadata_only`] wraps a bare metadata root blob without any PE envelope
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilmeta::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("tests/samples/Sample.dll"))?;
//! let (clr_rva, clr_size) = file.clr()?;
//! let clr_offset = file.rva_to_offset(clr_rva)?;
//! let clr_data = file.data_slice(clr_offset, clr_size as usize)?;
//! println!("CLI header starts with: {:02x?}", &clr_data[0..8]);
//! # Ok::<(), cilmeta::Error>(())
//! ```

pub mod io;
pub mod parser;
pub mod pe;
pub mod section;

mod memory;
mod physical;

use std::path::Path;

use crate::{
    file::pe::{DataDirectoryType, PeHeaders},
    Error::Empty,
    Result,
};
pub use memory::Memory;
pub use physical::Physical;

/// Backend trait for image data sources.
///
/// Abstracts over where the bytes of an image live. Implementations must be thread-safe since
/// a reader built on top of them can be shared across threads.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// A loaded image.
pub struct File {
    data: Box<dyn Backend>,
    pe: Option<PeHeaders>,
}

impl File {
    /// Memory-map and parse the image at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, [`crate::Error::Empty`]
    /// for a zero length file and [`crate::Error::BadImageFormat`] if it is not a managed PE image.
    pub fn from_file(path: &Path) -> Result<File> {
        let input = Physical::new(path)?;

        Self::load(input)
    }

    /// Parse the image held in `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer and [`crate::Error::BadImageFormat`]
    /// if it is not a managed PE image.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    /// Wrap any backend holding a PE image.
    ///
    /// # Errors
    /// See [`File::from_mem`].
    pub fn from_backend<T: Backend + 'static>(backend: T) -> Result<File> {
        Self::load(backend)
    }

    /// Wrap a bare metadata root blob; no PE headers are parsed.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer.
    pub fn metadata_only(data: Vec<u8>) -> Result<File> {
        if data.is_empty() {
            return Err(Empty);
        }

        Ok(File {
            data: Box::new(Memory::new(data)),
            pe: None,
        })
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let pe = PeHeaders::parse(data.data())?;
        if pe.directory(DataDirectoryType::ClrRuntimeHeader).is_empty() {
            return Err(bad_image_error!(
                "File does not have a CLR runtime header directory"
            ));
        }

        Ok(File {
            data: Box::new(data),
            pe: Some(pe),
        })
    }

    /// Total size of the image in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the image has a length of zero
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw bytes of the image
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// A bounds-checked slice of the image.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the range exceeds the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// The PE headers, `None` for metadata-only files
    #[must_use]
    pub fn pe(&self) -> Option<&PeHeaders> {
        self.pe.as_ref()
    }

    /// True if this file wraps a bare metadata blob
    #[must_use]
    pub fn is_metadata_only(&self) -> bool {
        self.pe.is_none()
    }

    /// Preferred load address, 0 for metadata-only files
    #[must_use]
    pub fn imagebase(&self) -> u64 {
        self.pe
            .as_ref()
            .map_or(0, |pe| pe.optional_header.image_base)
    }

    /// COFF machine value, 0 for metadata-only files
    #[must_use]
    pub fn machine(&self) -> u16 {
        self.pe.as_ref().map_or(0, |pe| pe.coff_header.machine)
    }

    /// RVA and size of the CLI header.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] for metadata-only files.
    pub fn clr(&self) -> Result<(u32, u32)> {
        let pe = self.require_pe()?;
        let directory = pe.directory(DataDirectoryType::ClrRuntimeHeader);

        Ok((directory.virtual_address, directory.size))
    }

    /// RVA and size of a data directory, `None` if it is unused
    #[must_use]
    pub fn get_data_directory(&self, kind: DataDirectoryType) -> Option<(u32, u32)> {
        let directory = self.pe.as_ref()?.directory(kind);
        if directory.is_empty() {
            None
        } else {
            Some((directory.virtual_address, directory.size))
        }
    }

    /// Translate an RVA into a file offset.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if no section contains `rva`, and
    /// [`crate::Error::NotSupported`] for metadata-only files.
    pub fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        self.require_pe()?.rva_to_offset(rva)
    }

    /// The `len` bytes starting at `rva`.
    ///
    /// # Errors
    /// Fails if the RVA cannot be translated or the range exceeds the image.
    pub fn rva_slice(&self, rva: u32, len: usize) -> Result<&[u8]> {
        let offset = self.rva_to_offset(rva)?;
        self.data_slice(offset, len)
    }

    /// All bytes from `rva` to the end of the image.
    ///
    /// # Errors
    /// Fails if the RVA cannot be translated.
    pub fn rva_tail(&self, rva: u32) -> Result<&[u8]> {
        let offset = self.rva_to_offset(rva)?;
        let len = self
            .len()
            .checked_sub(offset)
            .ok_or(out_of_range_error!())?;
        self.data_slice(offset, len)
    }

    fn require_pe(&self) -> Result<&PeHeaders> {
        self.pe.as_ref().ok_or_else(|| {
            crate::Error::NotSupported("metadata-only files have no PE headers".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test::builder::PeBuilder, Error};

    #[test]
    fn from_mem() {
        let image = PeBuilder::new().build(&[0xAB_u8; 16]);
        let len = image.len();
        let file = File::from_mem(image).unwrap();

        assert_eq!(file.len(), len);
        assert!(!file.is_metadata_only());
        assert_eq!(file.imagebase(), 0x0040_0000);
        assert_eq!(file.machine(), 0x014C);
        assert_eq!(file.clr().unwrap(), (0x2000, 72));
        assert_eq!(file.rva_to_offset(0x2000).unwrap(), 0x200);
        assert_eq!(file.rva_slice(0x2000, 4).unwrap(), &72_u32.to_le_bytes());
        assert!(file.get_data_directory(DataDirectoryType::ImportTable).is_none());
        assert_eq!(
            file.get_data_directory(DataDirectoryType::ClrRuntimeHeader),
            Some((0x2000, 72))
        );
    }

    #[test]
    fn empty() {
        assert!(matches!(File::from_mem(Vec::new()), Err(Error::Empty)));
        assert!(matches!(File::metadata_only(Vec::new()), Err(Error::Empty)));
    }

    #[test]
    fn not_managed() {
        let image = PeBuilder::new().cli_directory(0, 0).build(&[0_u8; 16]);
        assert!(matches!(
            File::from_mem(image),
            Err(Error::BadImageFormat { .. })
        ));
    }

    #[test]
    fn metadata_only() {
        let file = File::metadata_only(vec![0x42, 0x53, 0x4A, 0x42]).unwrap();
        assert!(file.is_metadata_only());
        assert!(file.pe().is_none());
        assert_eq!(file.imagebase(), 0);
        assert!(matches!(file.clr(), Err(Error::NotSupported(_))));
        assert!(matches!(file.rva_to_offset(0x2000), Err(Error::NotSupported(_))));
    }

    #[test]
    fn from_file() {
        let image = PeBuilder::new().pe32_plus().build(&[0_u8; 16]);
        let path = std::env::temp_dir().join(format!("cilmeta_file_{}.dll", std::process::id()));
        std::fs::write(&path, &image).unwrap();

        let file = File::from_file(&path).unwrap();
        assert_eq!(file.len(), image.len());
        assert_eq!(file.machine(), 0x8664);

        drop(file);
        std::fs::remove_file(&path).unwrap();
    }
}
