use strum::{EnumCount, EnumIter};

/// Identifiers of the metadata tables defined by ECMA-335 Partition II, section 22.
///
/// The discriminant is the table number used in tokens, in the valid/sorted masks of the
/// table stream header and as the index of the row count array.
///
/// ## Table Categories
///
/// ### Core Type System
/// - **`Module`**, **`TypeRef`**, **`TypeDef`**, **`Field`**, **`MethodDef`**, **`Param`**
///
/// ### Indirection (only valid in uncompressed `#-` streams)
/// - **`FieldPtr`**, **`MethodPtr`**, **`ParamPtr`**, **`EventPtr`**, **`PropertyPtr`**
///
/// ### Edit-and-Continue (only valid in uncompressed `#-` streams)
/// - **`EncLog`**, **`EncMap`**
///
/// ### Assembly Manifest
/// - **`Assembly`**, **`AssemblyRef`**, **`File`**, **`ExportedType`**, **`ManifestResource`**
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, EnumIter, EnumCount)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum TableId {
    Module = 0x00,
    TypeRef = 0x01,
    TypeDef = 0x02,
    FieldPtr = 0x03,
    Field = 0x04,
    MethodPtr = 0x05,
    MethodDef = 0x06,
    ParamPtr = 0x07,
    Param = 0x08,
    InterfaceImpl = 0x09,
    MemberRef = 0x0A,
    Constant = 0x0B,
    CustomAttribute = 0x0C,
    FieldMarshal = 0x0D,
    DeclSecurity = 0x0E,
    ClassLayout = 0x0F,
    FieldLayout = 0x10,
    StandAloneSig = 0x11,
    EventMap = 0x12,
    EventPtr = 0x13,
    Event = 0x14,
    PropertyMap = 0x15,
    PropertyPtr = 0x16,
    Property = 0x17,
    MethodSemantics = 0x18,
    MethodImpl = 0x19,
    ModuleRef = 0x1A,
    TypeSpec = 0x1B,
    ImplMap = 0x1C,
    FieldRVA = 0x1D,
    EncLog = 0x1E,
    EncMap = 0x1F,
    Assembly = 0x20,
    AssemblyProcessor = 0x21,
    AssemblyOS = 0x22,
    AssemblyRef = 0x23,
    AssemblyRefProcessor = 0x24,
    AssemblyRefOS = 0x25,
    File = 0x26,
    ExportedType = 0x27,
    ManifestResource = 0x28,
    NestedClass = 0x29,
    GenericParam = 0x2A,
    MethodSpec = 0x2B,
    GenericParamConstraint = 0x2C,
}

/// Tables known to metadata version 1.0
pub const TABLES_V1_0: u64 = (1_u64 << (TableId::NestedClass as u8 + 1)) - 1;
/// Tables known to metadata version 1.1, which added generics
pub const TABLES_V1_1: u64 =
    TABLES_V1_0 | (1_u64 << TableId::GenericParam as u8) | (1_u64 << TableId::MethodSpec as u8);
/// Tables known to metadata version 2.0
pub const TABLES_V2_0: u64 = TABLES_V1_1 | (1_u64 << TableId::GenericParamConstraint as u8);

/// Indirection tables, which may only appear in uncompressed streams
pub const PTR_TABLES: u64 = (1_u64 << TableId::FieldPtr as u8)
    | (1_u64 << TableId::MethodPtr as u8)
    | (1_u64 << TableId::ParamPtr as u8)
    | (1_u64 << TableId::EventPtr as u8)
    | (1_u64 << TableId::PropertyPtr as u8);
/// Edit-and-Continue tables, which may only appear in uncompressed streams
pub const ENC_TABLES: u64 = (1_u64 << TableId::EncLog as u8) | (1_u64 << TableId::EncMap as u8);

impl TableId {
    /// Look up a table by its number
    #[must_use]
    pub fn from_u8(value: u8) -> Option<TableId> {
        use TableId::*;

        let id = match value {
            0x00 => Module,
            0x01 => TypeRef,
            0x02 => TypeDef,
            0x03 => FieldPtr,
            0x04 => Field,
            0x05 => MethodPtr,
            0x06 => MethodDef,
            0x07 => ParamPtr,
            0x08 => Param,
            0x09 => InterfaceImpl,
            0x0A => MemberRef,
            0x0B => Constant,
            0x0C => CustomAttribute,
            0x0D => FieldMarshal,
            0x0E => DeclSecurity,
            0x0F => ClassLayout,
            0x10 => FieldLayout,
            0x11 => StandAloneSig,
            0x12 => EventMap,
            0x13 => EventPtr,
            0x14 => Event,
            0x15 => PropertyMap,
            0x16 => PropertyPtr,
            0x17 => Property,
            0x18 => MethodSemantics,
            0x19 => MethodImpl,
            0x1A => ModuleRef,
            0x1B => TypeSpec,
            0x1C => ImplMap,
            0x1D => FieldRVA,
            0x1E => EncLog,
            0x1F => EncMap,
            0x20 => Assembly,
            0x21 => AssemblyProcessor,
            0x22 => AssemblyOS,
            0x23 => AssemblyRef,
            0x24 => AssemblyRefProcessor,
            0x25 => AssemblyRefOS,
            0x26 => File,
            0x27 => ExportedType,
            0x28 => ManifestResource,
            0x29 => NestedClass,
            0x2A => GenericParam,
            0x2B => MethodSpec,
            0x2C => GenericParamConstraint,
            _ => return None,
        };

        Some(id)
    }

    /// Bit of this table in the valid/sorted masks
    #[must_use]
    pub const fn mask(self) -> u64 {
        1_u64 << self as u8
    }

    /// The indirection table that list columns into this table go through, if any
    #[must_use]
    pub fn pointer_table(self) -> Option<TableId> {
        match self {
            TableId::Field => Some(TableId::FieldPtr),
            TableId::MethodDef => Some(TableId::MethodPtr),
            TableId::Param => Some(TableId::ParamPtr),
            TableId::Event => Some(TableId::EventPtr),
            TableId::Property => Some(TableId::PropertyPtr),
            _ => None,
        }
    }

    /// Mask of the tables a table stream of the given version may contain
    #[must_use]
    pub fn version_mask(major: u8, minor: u8) -> u64 {
        match (major, minor) {
            (1, 0) => TABLES_V1_0,
            (1, 1) => TABLES_V1_1,
            _ => TABLES_V2_0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn numbering() {
        assert_eq!(TableId::COUNT, 45);
        for (index, id) in TableId::iter().enumerate() {
            assert_eq!(id as usize, index);
            assert_eq!(TableId::from_u8(index as u8), Some(id));
        }
        assert_eq!(TableId::from_u8(0x2D), None);
        assert_eq!(TableId::from_u8(0xFF), None);
    }

    #[test]
    fn masks() {
        assert_eq!(TABLES_V1_0, 0x0000_03FF_FFFF_FFFF);
        assert_eq!(TABLES_V1_1, 0x0000_0FFF_FFFF_FFFF);
        assert_eq!(TABLES_V2_0, 0x0000_1FFF_FFFF_FFFF);
        assert_eq!(PTR_TABLES, 0x0000_0000_0048_00A8);
        assert_eq!(ENC_TABLES, 0x0000_0000_C000_0000);
        assert_eq!(TableId::version_mask(1, 0), TABLES_V1_0);
        assert_eq!(TableId::version_mask(3, 0), TABLES_V2_0);
        assert_eq!(TableId::TypeDef.mask(), 0x4);
    }

    #[test]
    fn pointer_tables() {
        let mut pointers = 0;
        for table in TableId::iter() {
            if let Some(pointer) = table.pointer_table() {
                assert_eq!(pointer as u8 + 1, table as u8);
                pointers |= pointer.mask();
            }
        }
        assert_eq!(pointers, PTR_TABLES);
    }
}
