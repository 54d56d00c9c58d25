//! User String Heap (`#US`)
//!
//! Provides access to the ECMA-335 `#US` heap, which stores the string literals loaded by `ldstr`
//! in UTF-16 encoding.
//!
//! # Reference
//! - ECMA-335 II.24.2.4

use widestring::U16String;

use crate::{file::parser::Parser, Result};

/// The `UserStrings` object provides helper methods to access the data within the '#US' heap.
///
/// Each entry is a compressed length followed by that many bytes: the UTF-16 code units and a
/// final byte that is 1 if any character needs special handling. An entry of length 0 is the
/// empty string.
///
/// # Examples
///
/// ```rust
/// use cilmeta::metadata::streams::UserStrings;
///
/// let data = &[0u8, 0x03, 0x41, 0x00, 0x00];
/// let us = UserStrings::from(data)?;
/// assert_eq!(us.get(1)?.to_string_lossy(), "A");
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct UserStrings<'a> {
    data: &'a [u8],
}

impl<'a> UserStrings<'a> {
    /// Create a `UserStrings` object from a sequence of bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if a non-empty heap does not start with a NUL byte
    pub fn from(data: &'a [u8]) -> Result<UserStrings<'a>> {
        if !data.is_empty() && data[0] != 0 {
            return Err(bad_image_error!("#US heap does not start with an empty entry"));
        }

        Ok(UserStrings { data })
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

    /// The string at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the offset lies outside of the heap and
    /// [`crate::Error::BadImageFormat`] if the entry is longer than the heap
    pub fn get(&self, offset: usize) -> Result<U16String> {
        let (units, _) = self.entry(offset)?;

        Ok(U16String::from_vec(
            units
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect::<Vec<_>>(),
        ))
    }

    /// The string at `offset`, converted to UTF-8. Unpaired surrogates are replaced.
    ///
    /// # Errors
    /// See [`UserStrings::get`]
    pub fn get_string(&self, offset: usize) -> Result<String> {
        Ok(self.get(offset)?.to_string_lossy())
    }

    /// The trailing flag of the entry at `offset`
    ///
    /// # Errors
    /// See [`UserStrings::get`]
    pub fn needs_special_handling(&self, offset: usize) -> Result<bool> {
        let (_, special) = self.entry(offset)?;
        Ok(special)
    }

    fn entry(&self, offset: usize) -> Result<(&'a [u8], bool)> {
        if offset == 0 && self.data.is_empty() {
            return Ok((&[], false));
        }
        if offset >= self.data.len() {
            return Err(out_of_range_error!());
        }

        let mut parser = Parser::new(&self.data[offset..]);
        let length = parser.read_compressed_uint()? as usize;
        if length == 0 {
            return Ok((&[], false));
        }

        let bytes = parser.read_bytes(length).map_err(|_| {
            bad_image_error!(
                "#US entry at offset {} of length {} exceeds the heap",
                offset,
                length
            )
        })?;

        let units = &bytes[..length & !1];
        let special = length % 2 == 1 && bytes[length - 1] != 0;
        Ok((units, special))
    }
}
