//! Coded indexes.
//!
//! A coded index column packs a table selector (the tag, in the low bits) and a row id (the
//! remaining high bits) into a single value, so that one column can reference rows of several
//! tables. Each of the 13 kinds defined by ECMA-335 II.24.2.6 fixes the ordered list of tables
//! it may reference; the tag width is the number of bits needed to number that list.
//!
//! A coded value of 0 always decodes to the nil token.
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::metadata::{
//!     tables::{CodedIndexType, TableId},
//!     token::Token,
//! };
//!
//! // TypeDefOrRef: tag 1 is TypeRef, two tag bits
//! let token = CodedIndexType::TypeDefOrRef.to_token((5 << 2) | 1)?;
//! assert_eq!(token, Token::from_parts(TableId::TypeRef, 5));
//! assert_eq!(CodedIndexType::TypeDefOrRef.to_tag(token), Some((5 << 2) | 1));
//! # Ok::<(), cilmeta::Error>(())
//! ```

use strum::{EnumCount, EnumIter};

use crate::{
    metadata::{tables::TableId, token::Token},
    Result,
};

/// All coded index kinds defined in ECMA-335.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
#[repr(usize)]
pub enum CodedIndexType {
    /// `TypeDef`, `TypeRef` or `TypeSpec`
    TypeDefOrRef,
    /// `Field`, `Param` or `Property`
    HasConstant,
    /// Any of the 22 tables that may own a custom attribute
    HasCustomAttribute,
    /// `Field` or `Param`
    HasFieldMarshal,
    /// `TypeDef`, `MethodDef` or `Assembly`
    HasDeclSecurity,
    /// `TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef` or `TypeSpec`
    MemberRefParent,
    /// `Event` or `Property`
    HasSemantics,
    /// `MethodDef` or `MemberRef`
    MethodDefOrRef,
    /// `Field` or `MethodDef`
    MemberForwarded,
    /// `File`, `AssemblyRef` or `ExportedType`
    Implementation,
    /// `MethodDef` or `MemberRef`, at tags 2 and 3; the other three tags are unused
    CustomAttributeType,
    /// `Module`, `ModuleRef`, `AssemblyRef` or `TypeRef`
    ResolutionScope,
    /// `TypeDef` or `MethodDef`
    TypeOrMethodDef,
}

impl CodedIndexType {
    /// The tables of this kind, indexed by tag. `None` marks a reserved tag.
    #[must_use]
    pub fn tables(&self) -> &'static [Option<TableId>] {
        match self {
            CodedIndexType::TypeDefOrRef => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasConstant => &[
                Some(TableId::Field),
                Some(TableId::Param),
                Some(TableId::Property),
            ],
            CodedIndexType::HasCustomAttribute => &[
                Some(TableId::MethodDef),
                Some(TableId::Field),
                Some(TableId::TypeRef),
                Some(TableId::TypeDef),
                Some(TableId::Param),
                Some(TableId::InterfaceImpl),
                Some(TableId::MemberRef),
                Some(TableId::Module),
                // Labeled 'Permission' in the standard
                Some(TableId::DeclSecurity),
                Some(TableId::Property),
                Some(TableId::Event),
                Some(TableId::StandAloneSig),
                Some(TableId::ModuleRef),
                Some(TableId::TypeSpec),
                Some(TableId::Assembly),
                Some(TableId::AssemblyRef),
                Some(TableId::File),
                Some(TableId::ExportedType),
                Some(TableId::ManifestResource),
                Some(TableId::GenericParam),
                Some(TableId::GenericParamConstraint),
                Some(TableId::MethodSpec),
            ],
            CodedIndexType::HasFieldMarshal => &[Some(TableId::Field), Some(TableId::Param)],
            CodedIndexType::HasDeclSecurity => &[
                Some(TableId::TypeDef),
                Some(TableId::MethodDef),
                Some(TableId::Assembly),
            ],
            CodedIndexType::MemberRefParent => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::ModuleRef),
                Some(TableId::MethodDef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasSemantics => &[Some(TableId::Event), Some(TableId::Property)],
            CodedIndexType::MethodDefOrRef => &[Some(TableId::MethodDef), Some(TableId::MemberRef)],
            CodedIndexType::MemberForwarded => &[Some(TableId::Field), Some(TableId::MethodDef)],
            CodedIndexType::Implementation => &[
                Some(TableId::File),
                Some(TableId::AssemblyRef),
                Some(TableId::ExportedType),
            ],
            CodedIndexType::CustomAttributeType => &[
                None,
                None,
                Some(TableId::MethodDef),
                Some(TableId::MemberRef),
                None,
            ],
            CodedIndexType::ResolutionScope => &[
                Some(TableId::Module),
                Some(TableId::ModuleRef),
                Some(TableId::AssemblyRef),
                Some(TableId::TypeRef),
            ],
            CodedIndexType::TypeOrMethodDef => &[Some(TableId::TypeDef), Some(TableId::MethodDef)],
        }
    }

    /// Iterate the tables this kind can reference
    pub fn participants(&self) -> impl Iterator<Item = TableId> {
        self.tables().iter().flatten().copied()
    }

    /// Number of low bits holding the tag
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn tag_bits(&self) -> u8 {
        let count = self.tables().len();
        // ceil(log2(count))
        (usize::BITS - (count - 1).leading_zeros()) as u8
    }

    /// Decode a coded value into a token.
    ///
    /// A value whose row id is 0 decodes to [`Token::NIL`].
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the tag is reserved or out of range.
    pub fn to_token(&self, value: u32) -> Result<Token> {
        let bits = self.tag_bits();
        let tag = (value & ((1_u32 << bits) - 1)) as usize;
        let row = value >> bits;

        if row == 0 {
            return Ok(Token::NIL);
        }

        match self.tables().get(tag) {
            Some(Some(table)) => Ok(Token::from_parts(*table, row)),
            _ => Err(bad_image_error!(
                "Invalid {:?} coded index tag {} in value 0x{:08x}",
                self,
                tag,
                value
            )),
        }
    }

    /// Encode a token as a coded value of this kind.
    ///
    /// The nil token encodes to 0. Returns `None` if the token's table does not take part in
    /// this kind.
    #[must_use]
    pub fn to_tag(&self, token: Token) -> Option<u32> {
        if token.is_nil() {
            return Some(0);
        }

        let table = token.table_id()?;
        let tag = self
            .tables()
            .iter()
            .position(|entry| *entry == Some(table))?;

        #[allow(clippy::cast_possible_truncation)]
        Some((token.row() << self.tag_bits()) | tag as u32)
    }

    /// True if `table` takes part in this kind
    #[must_use]
    pub fn references(&self, table: TableId) -> bool {
        self.tables().contains(&Some(table))
    }
}
