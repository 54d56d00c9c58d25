//! Metadata tokens.
//!
//! A token packs a table selector into its high byte and a 1-based row id into the low
//! 24 bits. Row id 0 is the nil reference regardless of the table byte.

use std::fmt;

use crate::metadata::tables::TableId;

/// A metadata token representing a reference to a metadata table row.
///
/// # Examples
///
/// ```rust
/// use cilmeta::metadata::{tables::TableId, token::Token};
///
/// let token = Token::new(0x0200_0003);
/// assert_eq!(token.table_id(), Some(TableId::TypeDef));
/// assert_eq!(token.row(), 3);
/// assert!(!token.is_nil());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// The nil token
    pub const NIL: Token = Token(0);

    /// Create a token from its raw value
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Token(value)
    }

    /// Create a token from a table and a row id.
    ///
    /// Row ids wider than 24 bits are truncated.
    #[must_use]
    pub const fn from_parts(table: TableId, row: u32) -> Self {
        Token(((table as u32) << 24) | (row & 0x00FF_FFFF))
    }

    /// The raw value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// The table byte
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The table byte as a [`TableId`], if it names a known table
    #[must_use]
    pub fn table_id(&self) -> Option<TableId> {
        TableId::from_u8(self.table())
    }

    /// The 1-based row id
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// True if this token references no row
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        self.row() == 0
    }

    /// True if this token references a row of `table`
    #[must_use]
    pub fn is_table(&self, table: TableId) -> bool {
        self.table() == table as u8
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
