//! String Heap (`#Strings`)
//!
//! Provides access to the ECMA-335 `#Strings` heap, which stores identifier strings in UTF-8 encoding.
//!
//! # Reference
//! - ECMA-335 II.24.2.3

use std::{ffi::CStr, str};

use crate::Result;

/// '#Strings' holds the identifiers referenced from metadata tables: type, member and namespace
/// names, module and assembly names, cultures.
///
/// Entries are addressed by byte offset and terminated by a NUL byte. Offset 0 is the empty
/// string.
///
/// # Examples
///
/// ```rust
/// use cilmeta::metadata::streams::Strings;
///
/// let data = &[0u8, b'H', b'e', b'l', b'l', b'o', 0u8];
/// let strings = Strings::from(data)?;
/// assert_eq!(strings.get(1)?, "Hello");
/// assert_eq!(strings.get(3)?, "llo");
/// assert!(strings.eq(1, "Hello"));
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Create a `Strings` object from a sequence of bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if a non-empty heap does not start with a NUL byte
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if !data.is_empty() && data[0] != 0 {
            return Err(bad_image_error!("#Strings heap does not start with an empty string"));
        }

        Ok(Strings { data })
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

    /// The string starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the offset lies outside of the heap and
    /// [`crate::Error::BadImageFormat`] if the entry is unterminated or not valid UTF-8
    pub fn get(&self, offset: usize) -> Result<&'a str> {
        if offset == 0 {
            return Ok("");
        }

        let bytes = self.bytes(offset)?;
        str::from_utf8(bytes)
            .map_err(|_| bad_image_error!("Invalid UTF-8 string at offset - {}", offset))
    }

    /// Compare the entry at `offset` with `value` without decoding it.
    ///
    /// Offsets that cannot be read compare unequal.
    #[must_use]
    pub fn eq(&self, offset: usize, value: &str) -> bool {
        if offset == 0 {
            return value.is_empty();
        }

        self.bytes(offset)
            .is_ok_and(|bytes| bytes == value.as_bytes())
    }

    /// True if the entry at `offset` starts with `prefix`
    #[must_use]
    pub fn starts_with(&self, offset: usize, prefix: &str) -> bool {
        match self.bytes(offset) {
            Ok(bytes) => bytes.starts_with(prefix.as_bytes()),
            Err(_) => prefix.is_empty(),
        }
    }

    /// True if `offset` points into the heap. Offset 0 is always valid.
    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        offset == 0 || offset < self.data.len()
    }

    fn bytes(&self, offset: usize) -> Result<&'a [u8]> {
        if offset >= self.data.len() {
            return Err(out_of_range_error!());
        }

        CStr::from_bytes_until_nul(&self.data[offset..])
            .map(CStr::to_bytes)
            .map_err(|_| bad_image_error!("Unterminated string at offset - {}", offset))
    }
}
