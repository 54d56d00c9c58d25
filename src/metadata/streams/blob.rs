//! Blob Heap (`#Blob`)
//!
//! Provides access to the ECMA-335 `#Blob` heap, which stores binary data such as signatures,
//! constant values and custom attribute arguments.
//!
//! # Reference
//! - ECMA-335 II.24.2.4

use crate::{file::parser::Parser, Result};

/// '#Blob' points to streams of bytes. Each blob is addressed by byte offset and starts with its
/// size, encoded as a compressed unsigned integer:
///
/// * If the first one byte of the 'blob' is 0bbbbbbb, then the rest of the 'blob' contains the
///   bbbbbbb bytes of actual data.
/// * If the first two bytes of the 'blob' are 10bbbbbb and x, then the rest of the 'blob'
///   contains the (bbbbbb << 8 + x) bytes of actual data.
/// * If the first four bytes of the 'blob' are 110bbbbb, x, y, and z, then the rest of the
///   'blob' contains the (bbbbb << 24 + x << 16 + y << 8 + z) bytes of actual data.
///
/// # Examples
///
/// ```rust
/// use cilmeta::metadata::streams::Blob;
///
/// let data = &[0u8, 0x03, 0x41, 0x42, 0x43];
/// let blob = Blob::from(data)?;
/// assert_eq!(blob.get(1)?, &[0x41, 0x42, 0x43]);
/// assert!(blob.get(0)?.is_empty());
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Create a `Blob` object from a sequence of bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if a non-empty heap does not start with an empty blob
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if !data.is_empty() && data[0] != 0 {
            return Err(bad_image_error!("#Blob heap does not start with an empty blob"));
        }

        Ok(Blob { data })
    }

    /// Size of the heap in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the heap has no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The blob starting at `offset`, without its length prefix
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the offset lies outside of the heap and
    /// [`crate::Error::BadImageFormat`] if the encoded length exceeds the remaining heap bytes
    pub fn get(&self, offset: usize) -> Result<&'a [u8]> {
        if offset == 0 {
            return Ok(&[]);
        }
        if offset >= self.data.len() {
            return Err(out_of_range_error!());
        }

        let mut parser = Parser::new(&self.data[offset..]);
        let len = parser.read_compressed_uint().map_err(|_| {
            bad_image_error!("Invalid blob length prefix at offset - {}", offset)
        })? as usize;

        parser.read_bytes(len).map_err(|_| {
            bad_image_error!(
                "Blob at offset {} of length {} exceeds the heap of {} bytes",
                offset,
                len,
                self.data.len()
            )
        })
    }

    /// Returns an iterator over all blobs in the heap, as `(offset, data)`
    #[must_use]
    pub fn iter(&self) -> BlobIterator<'a> {
        BlobIterator {
            blob: *self,
            position: 1,
        }
    }
}

impl<'a> IntoIterator for &Blob<'a> {
    type Item = Result<(usize, &'a [u8])>;
    type IntoIter = BlobIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over entries in the `#Blob` heap
pub struct BlobIterator<'a> {
    blob: Blob<'a>,
    position: usize,
}

impl<'a> Iterator for BlobIterator<'a> {
    type Item = Result<(usize, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.blob.data.len() {
            return None;
        }

        let start = self.position;
        match self.blob.get(start) {
            Ok(data) => {
                let prefix = match data.len() {
                    0..=0x7F => 1,
                    0x80..=0x3FFF => 2,
                    _ => 4,
                };
                self.position += prefix + data.len();
                Some(Ok((start, data)))
            }
            Err(error) => {
                self.position = self.blob.data.len();
                Some(Err(error))
            }
        }
    }
}
