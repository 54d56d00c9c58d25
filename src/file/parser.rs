//! Cursor-based binary parser for metadata blobs and signatures.
//!
//! [`Parser`] wraps a byte slice and a position. All reads are bounds-checked and advance the
//! cursor; a failed read leaves the position where it was before the primitive was read.
//! Besides the fixed-size primitives it understands the ECMA-335 compressed integer encodings
//! (II.23.2), `TypeDefOrRefOrSpecEncoded` tokens and the serialized strings used in custom
//! attribute value blobs (II.23.3).
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::Parser;
//!
//! let data = [0x03, 0x80, 0x80, 0xC0, 0x00, 0x40, 0x00];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_compressed_uint()?, 0x03);
//! assert_eq!(parser.read_compressed_uint()?, 0x80);
//! assert_eq!(parser.read_compressed_uint()?, 0x4000);
//! # Ok::<(), cilmeta::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CilIO},
    metadata::{tables::TableId, token::Token},
    Result,
};

/// A simple cursor over a byte slice.
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Total length of the underlying data
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the underlying data is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True while the cursor has not reached the end of the data
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the cursor to `pos`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if `pos` lies past the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_range_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the cursor forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if this would move past the end of the data.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        let end = self.calc_end_position(step)?;
        self.position = end;
        Ok(())
    }

    /// Current cursor position
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// The complete underlying data
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of bytes left after the cursor
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Read the byte under the cursor without advancing.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] at the end of the data.
    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(out_of_range_error!())
    }

    /// Align the cursor to the next multiple of `alignment`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the aligned position is past the end of the data.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Read a little-endian primitive.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if not enough data is left.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read an ECMA-335 compressed unsigned integer (II.23.2).
    ///
    /// The encoding uses 1 byte for values up to `0x7F`, 2 bytes (`10` prefix) up to `0x3FFF`
    /// and 4 bytes (`110` prefix) up to `0x1FFF_FFFF`.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] on an invalid prefix and
    /// [`crate::Error::OutOfRange`] if the value is truncated.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.peek_byte()?;

        if (first_byte & 0x80) == 0 {
            self.position += 1;
            return Ok(u32::from(first_byte));
        }

        if (first_byte & 0xC0) == 0x80 {
            let bytes = self.peek_bytes(2)?;
            self.position += 2;
            return Ok(((u32::from(bytes[0]) & 0x3F) << 8) | u32::from(bytes[1]));
        }

        if (first_byte & 0xE0) == 0xC0 {
            let bytes = self.peek_bytes(4)?;
            self.position += 4;
            return Ok(((u32::from(bytes[0]) & 0x1F) << 24)
                | (u32::from(bytes[1]) << 16)
                | (u32::from(bytes[2]) << 8)
                | u32::from(bytes[3]));
        }

        Err(bad_image_error!(
            "Invalid compressed integer prefix - 0x{:02x}",
            first_byte
        ))
    }

    /// Read an ECMA-335 compressed signed integer (II.23.2).
    ///
    /// # Errors
    /// See [`Parser::read_compressed_uint`].
    pub fn read_compressed_int(&mut self) -> Result<i32> {
        let first_byte = self.peek_byte()?;
        let raw = self.read_compressed_uint()?;

        // The sign bit is rotated into bit 0; the width of the encoding decides the sign extension.
        let (bits, value) = match first_byte {
            b if b & 0x80 == 0 => (7, raw),
            b if b & 0xC0 == 0x80 => (14, raw),
            _ => (29, raw),
        };

        let magnitude = value >> 1;
        #[allow(clippy::cast_possible_wrap)]
        let signed = if value & 1 == 0 {
            magnitude as i32
        } else {
            (magnitude as i32) - (1_i32 << (bits - 1))
        };

        Ok(signed)
    }

    /// Read a `TypeDefOrRefOrSpecEncoded` token (II.23.2.8).
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the tag selects no table.
    pub fn read_compressed_token(&mut self) -> Result<Token> {
        let compressed_token = self.read_compressed_uint()?;

        let table = match compressed_token & 0x3 {
            0x0 => TableId::TypeDef,
            0x1 => TableId::TypeRef,
            0x2 => TableId::TypeSpec,
            _ => {
                return Err(bad_image_error!(
                    "Invalid compressed token - 0x{:x}",
                    compressed_token
                ))
            }
        };

        Ok(Token::from_parts(table, compressed_token >> 2))
    }

    /// Read `length` raw bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if not enough data is left.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read a `SerString` as used in custom attribute blobs (II.23.3).
    ///
    /// The string is a compressed length followed by UTF-8 bytes; a single `0xFF` byte encodes
    /// the null string and yields `None`. Trailing NUL characters are trimmed.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] for invalid UTF-8 and
    /// [`crate::Error::OutOfRange`] if the string is truncated.
    pub fn read_ser_string(&mut self) -> Result<Option<&'a str>> {
        if self.peek_byte()? == 0xFF {
            self.position += 1;
            return Ok(None);
        }

        let length = self.read_compressed_uint()? as usize;
        let bytes = self.read_bytes(length)?;
        let value = std::str::from_utf8(bytes)
            .map_err(|e| bad_image_error!("Invalid UTF-8 in serialized string - {}", e))?;

        Ok(Some(value.trim_end_matches('\0')))
    }

    fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_range_error!())?;

        if end > self.data.len() {
            return Err(out_of_range_error!());
        }

        Ok(end)
    }

    fn peek_bytes(&self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        Ok(&self.data[self.position..end])
    }
}
