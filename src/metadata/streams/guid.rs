//! GUID Heap (`#GUID`)
//!
//! Provides access to the ECMA-335 `#GUID` heap, a 1-based array of 128-bit GUIDs.
//!
//! # Reference
//! - ECMA-335 II.24.2.5

use crate::Result;

/// Size of one heap entry
pub const GUID_SIZE: usize = 16;

/// '#GUID' is a heap, which contains a sequence of 128-bit GUIDs.
///
/// Indexes are 1-based; index 0 is the nil GUID.
///
/// # Examples
///
/// ```rust
/// use cilmeta::metadata::streams::Guid;
///
/// let data = [0xAA_u8; 32];
/// let guids = Guid::from(&data)?;
/// assert_eq!(guids.count(), 2);
/// assert_eq!(guids.get(0)?, uguid::Guid::ZERO);
/// assert_eq!(guids.get(2)?.to_bytes(), [0xAA; 16]);
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Guid<'a> {
    data: &'a [u8],
}

impl<'a> Guid<'a> {
    /// Create a `Guid` object from a sequence of bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the heap size is not a multiple of 16
    pub fn from(data: &'a [u8]) -> Result<Guid<'a>> {
        if data.len() % GUID_SIZE != 0 {
            return Err(bad_image_error!(
                "#GUID heap size {} is not a multiple of {}",
                data.len(),
                GUID_SIZE
            ));
        }

        Ok(Guid { data })
    }

    /// Number of GUIDs in the heap
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.len() / GUID_SIZE
    }

    /// Returns the GUID at the specified 1-based index, the nil GUID for index 0
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the index is past the last entry
    pub fn get(&self, index: usize) -> Result<uguid::Guid> {
        if index == 0 {
            return Ok(uguid::Guid::ZERO);
        }
        if index > self.count() {
            return Err(out_of_range_error!());
        }

        let start = (index - 1) * GUID_SIZE;
        let mut buffer = [0_u8; GUID_SIZE];
        buffer.copy_from_slice(&self.data[start..start + GUID_SIZE]);

        Ok(uguid::Guid::from_bytes(buffer))
    }
}
