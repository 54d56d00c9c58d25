//! Bounds-checked little-endian primitive reads.
//!
//! Everything in a PE image and in ECMA-335 metadata is stored little-endian, with the single
//! exception of a few signature encodings that are handled by [`crate::file::parser::Parser`].
//! The functions here never panic: a read that would run past the end of the buffer returns
//! [`crate::Error::OutOfRange`].
//!
//! # Examples
//!
//! ```rust,ignore
//! use cilmeta::file::io::{read_le, read_le_at, read_le_at_dyn};
//!
//! let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
//! let mut offset = 0;
//!
//! let first: u16 = read_le_at(&data, &mut offset)?;
//! let second = read_le_at_dyn(&data, &mut offset, false)?;
//! let third = read_le_at_dyn(&data, &mut offset, true)?;
//! assert_eq!((first, second, third), (1, 2, 3));
//! # Ok::<(), cilmeta::Error>(())
//! ```

use crate::Result;

/// Primitive types that can be decoded from a fixed number of little-endian bytes.
pub trait CilIO: Sized {
    /// The byte array representation of the type
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Decode from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_cil_io {
    ($($ty:ty),*) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_cil_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Read a `T` from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfRange`] if `data` is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Read a `T` at `offset` and advance `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfRange`] if the read would run past the end of `data`.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let end = offset
        .checked_add(type_len)
        .ok_or(out_of_range_error!())?;
    if end > data.len() {
        return Err(out_of_range_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_range_error!());
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Read a 2 or 4 byte unsigned value at `offset`, depending on `is_large`.
///
/// Table index, heap index and coded index columns all come in these two widths.
///
/// # Errors
/// Returns [`crate::Error::OutOfRange`] if the read would run past the end of `data`.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    let res = if is_large {
        read_le_at::<u32>(data, offset)?
    } else {
        u32::from(read_le_at::<u16>(data, offset)?)
    };

    Ok(res)
}
