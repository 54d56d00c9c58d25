//! Typed handles.
//!
//! A handle names one row of one table, or one entry of one heap. Unlike a raw [`Token`] the
//! table is part of the type, so a `MethodDefHandle` can never be handed to a query expecting a
//! `TypeDefHandle`. Handles are plain values; bounds are checked by the reader query that
//! dereferences them, which fails with [`crate::Error::OutOfRange`] for rows past the end of
//! the table.
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::metadata::{handles::TypeDefHandle, token::Token};
//!
//! let handle = TypeDefHandle::new(2);
//! assert_eq!(handle.token(), Token::new(0x0200_0002));
//! assert_eq!(TypeDefHandle::try_from(Token::new(0x0200_0002))?, handle);
//! assert!(TypeDefHandle::try_from(Token::new(0x0600_0001)).is_err());
//! # Ok::<(), cilmeta::Error>(())
//! ```

use std::fmt;

use crate::{
    metadata::{tables::TableId, token::Token},
    Error,
};

macro_rules! row_handles {
    ($($(#[$meta:meta])* $name:ident => $table:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
            pub struct $name(u32);

            impl $name {
                /// The table this handle points into
                pub const TABLE: TableId = TableId::$table;

                /// The nil handle
                pub const NIL: $name = $name(0);

                /// Handle of the row `rid`; row ids wider than 24 bits are truncated
                #[must_use]
                pub const fn new(rid: u32) -> Self {
                    $name(rid & 0x00FF_FFFF)
                }

                /// The 1-based row id, 0 for nil
                #[must_use]
                pub const fn rid(&self) -> u32 {
                    self.0
                }

                /// True for the nil handle
                #[must_use]
                pub const fn is_nil(&self) -> bool {
                    self.0 == 0
                }

                /// The metadata token of this row
                #[must_use]
                pub const fn token(&self) -> Token {
                    Token::from_parts(TableId::$table, self.0)
                }
            }

            impl TryFrom<Token> for $name {
                type Error = Error;

                fn try_from(token: Token) -> Result<Self, Self::Error> {
                    if token.table() != TableId::$table as u8 {
                        return Err(bad_image_error!(
                            "Token {} does not reference the {:?} table",
                            token,
                            TableId::$table
                        ));
                    }

                    Ok($name(token.row()))
                }
            }

            impl From<$name> for Token {
                fn from(handle: $name) -> Token {
                    handle.token()
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}({})", stringify!($name), self.0)
                }
            }
        )+
    };
}

row_handles! {
    /// A row of the `Module` table
    ModuleHandle => Module;
    /// A row of the `TypeRef` table
    TypeRefHandle => TypeRef;
    /// A row of the `TypeDef` table
    TypeDefHandle => TypeDef;
    /// A row of the `Field` table
    FieldHandle => Field;
    /// A row of the `MethodDef` table
    MethodDefHandle => MethodDef;
    /// A row of the `Param` table
    ParamHandle => Param;
    /// A row of the `InterfaceImpl` table
    InterfaceImplHandle => InterfaceImpl;
    /// A row of the `MemberRef` table
    MemberRefHandle => MemberRef;
    /// A row of the `Constant` table
    ConstantHandle => Constant;
    /// A row of the `CustomAttribute` table
    CustomAttributeHandle => CustomAttribute;
    /// A row of the `DeclSecurity` table
    DeclSecurityHandle => DeclSecurity;
    /// A row of the `StandAloneSig` table
    StandAloneSigHandle => StandAloneSig;
    /// A row of the `Event` table
    EventHandle => Event;
    /// A row of the `Property` table
    PropertyHandle => Property;
    /// A row of the `MethodImpl` table
    MethodImplHandle => MethodImpl;
    /// A row of the `ModuleRef` table
    ModuleRefHandle => ModuleRef;
    /// A row of the `TypeSpec` table
    TypeSpecHandle => TypeSpec;
    /// A row of the `Assembly` table
    AssemblyHandle => Assembly;
    /// A row of the `AssemblyRef` table
    AssemblyRefHandle => AssemblyRef;
    /// A row of the `File` table
    AssemblyFileHandle => File;
    /// A row of the `ExportedType` table
    ExportedTypeHandle => ExportedType;
    /// A row of the `ManifestResource` table
    ManifestResourceHandle => ManifestResource;
    /// A row of the `GenericParam` table
    GenericParamHandle => GenericParam;
    /// A row of the `MethodSpec` table
    MethodSpecHandle => MethodSpec;
    /// A row of the `GenericParamConstraint` table
    GenericParamConstraintHandle => GenericParamConstraint;
}

macro_rules! heap_handles {
    ($($(#[$meta:meta])* $name:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
            pub struct $name(pub u32);

            impl $name {
                /// The raw offset or index into the heap
                #[must_use]
                pub const fn value(&self) -> u32 {
                    self.0
                }

                /// True for the nil entry at 0
                #[must_use]
                pub const fn is_nil(&self) -> bool {
                    self.0 == 0
                }
            }
        )+
    };
}

heap_handles! {
    /// Byte offset into `#Strings`
    StringHandle;
    /// Byte offset into `#Blob`
    BlobHandle;
    /// 1-based index into `#GUID`
    GuidHandle;
    /// Byte offset into `#US`
    UserStringHandle;
}

impl UserStringHandle {
    /// Handle of the user string an `ldstr` token refers to
    #[must_use]
    pub const fn from_token(token: Token) -> Self {
        UserStringHandle(token.row())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let handle = MethodDefHandle::new(0x42);
        assert_eq!(handle.rid(), 0x42);
        assert_eq!(handle.token().value(), 0x0600_0042);
        assert_eq!(Token::from(handle), Token::new(0x0600_0042));
        assert_eq!(
            MethodDefHandle::try_from(Token::new(0x0600_0042)).unwrap(),
            handle
        );
        assert_eq!(format!("{handle:?}"), "MethodDefHandle(66)");
    }

    #[test]
    fn nil() {
        assert!(TypeDefHandle::NIL.is_nil());
        assert!(TypeDefHandle::default().is_nil());
        assert_eq!(TypeDefHandle::NIL.token(), Token::new(0x0200_0000));
        assert!(TypeDefHandle::try_from(Token::new(0x0200_0000))
            .unwrap()
            .is_nil());
        assert!(StringHandle(0).is_nil());
        assert!(!BlobHandle(7).is_nil());
    }

    #[test]
    fn wrong_table() {
        assert!(FieldHandle::try_from(Token::new(0x0200_0001)).is_err());
        assert!(AssemblyFileHandle::try_from(Token::new(0x2600_0003)).is_ok());
        assert_eq!(AssemblyFileHandle::TABLE, TableId::File);
    }

    #[test]
    fn user_string_token() {
        let handle = UserStringHandle::from_token(Token::new(0x7000_0011));
        assert_eq!(handle.value(), 0x11);
    }
}
