//! Element types and values of the `Constant` table.
//!
//! A `Constant` row stores an element type byte and a blob with the little-endian value. The
//! value of `ELEMENT_TYPE::CLASS` is the null reference, encoded as a 4 byte zero.
//!
//! # Reference
//! - ECMA-335 II.22.9 and II.23.1.16

use widestring::U16String;

use crate::file::parser::Parser;

#[allow(non_snake_case, dead_code, missing_docs)]
/// Element type bytes of signatures and constants
pub mod ELEMENT_TYPE {
    // Marks end of a list
    pub const END: u8 = 0x00;
    pub const VOID: u8 = 0x01;
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0a;
    pub const U8: u8 = 0x0b;
    pub const R4: u8 = 0x0c;
    pub const R8: u8 = 0x0d;
    pub const STRING: u8 = 0x0e;
    // Followed by type
    pub const PTR: u8 = 0x0f;
    // Followed by type
    pub const BYREF: u8 = 0x10;
    // Followed by TypeDef or TypeRef token
    pub const VALUETYPE: u8 = 0x11;
    // Followed by TypeDef or TypeRef token
    pub const CLASS: u8 = 0x12;
    pub const VAR: u8 = 0x13;
    pub const ARRAY: u8 = 0x14;
    pub const GENERICINST: u8 = 0x15;
    pub const TYPEDBYREF: u8 = 0x16;
    pub const I: u8 = 0x18;
    pub const U: u8 = 0x19;
    pub const FNPTR: u8 = 0x1b;
    pub const OBJECT: u8 = 0x1c;
    pub const SZARRAY: u8 = 0x1d;
    pub const MVAR: u8 = 0x1e;
    pub const CMOD_REQD: u8 = 0x1f;
    pub const CMOD_OPT: u8 = 0x20;
    // Implemented within the CLI, no defined meaning in metadata
    pub const INTERNAL: u8 = 0x21;
    // Or'd with following element types, no defined meaning in metadata
    pub const MODIFIER: u8 = 0x40;
    pub const SENTINEL: u8 = 0x41;
    pub const PINNED: u8 = 0x45;
}

/// A decoded constant
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// The blob could not be decoded for its element type
    Bad,
    /// The null reference
    Null,
    /// `bool`
    Boolean(bool),
    /// `char`, a UTF-16 code unit
    Char(u16),
    /// `sbyte`
    I1(i8),
    /// `byte`
    U1(u8),
    /// `short`
    I2(i16),
    /// `ushort`
    U2(u16),
    /// `int`
    I4(i32),
    /// `uint`
    U4(u32),
    /// `long`
    I8(i64),
    /// `ulong`
    U8(u64),
    /// `float`
    R4(f32),
    /// `double`
    R8(f64),
    /// `string`
    String(String),
}

impl ConstantValue {
    /// Decode the value blob of a `Constant` row.
    ///
    /// A blob that is too short for its type, a non-zero null reference or an unknown element
    /// type yield [`ConstantValue::Bad`].
    #[must_use]
    pub fn decode(element_type: u8, blob: &[u8]) -> ConstantValue {
        let mut parser = Parser::new(blob);

        let value = match element_type {
            ELEMENT_TYPE::BOOLEAN => parser.read_le::<u8>().map(|v| ConstantValue::Boolean(v != 0)),
            ELEMENT_TYPE::CHAR => parser.read_le::<u16>().map(ConstantValue::Char),
            ELEMENT_TYPE::I1 => parser.read_le::<i8>().map(ConstantValue::I1),
            ELEMENT_TYPE::U1 => parser.read_le::<u8>().map(ConstantValue::U1),
            ELEMENT_TYPE::I2 => parser.read_le::<i16>().map(ConstantValue::I2),
            ELEMENT_TYPE::U2 => parser.read_le::<u16>().map(ConstantValue::U2),
            ELEMENT_TYPE::I4 => parser.read_le::<i32>().map(ConstantValue::I4),
            ELEMENT_TYPE::U4 => parser.read_le::<u32>().map(ConstantValue::U4),
            ELEMENT_TYPE::I8 => parser.read_le::<i64>().map(ConstantValue::I8),
            ELEMENT_TYPE::U8 => parser.read_le::<u64>().map(ConstantValue::U8),
            ELEMENT_TYPE::R4 => parser.read_le::<f32>().map(ConstantValue::R4),
            ELEMENT_TYPE::R8 => parser.read_le::<f64>().map(ConstantValue::R8),
            ELEMENT_TYPE::STRING => {
                let units = blob
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect::<Vec<_>>();
                Ok(ConstantValue::String(
                    U16String::from_vec(units).to_string_lossy(),
                ))
            }
            ELEMENT_TYPE::CLASS => parser.read_le::<u32>().map(|v| {
                if v == 0 {
                    ConstantValue::Null
                } else {
                    ConstantValue::Bad
                }
            }),
            _ => Ok(ConstantValue::Bad),
        };

        value.unwrap_or(ConstantValue::Bad)
    }

    /// True for [`ConstantValue::Bad`]
    #[must_use]
    pub fn is_bad(&self) -> bool {
        matches!(self, ConstantValue::Bad)
    }
}
