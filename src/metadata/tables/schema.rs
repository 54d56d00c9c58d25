//! Row descriptors of every metadata table.
//!
//! Each table is described by its ordered list of [`ColumnType`]s, following ECMA-335 II.22.
//! The width of most columns is only known once the row counts and heap-size flags of a
//! concrete table stream are known; [`crate::metadata::tables::TableInfo`] resolves them.
//!
//! The same descriptors generate the per-table modules naming the column positions, so a decoded
//! [`crate::metadata::tables::Row`] can be read as `row.get(typedef::EXTENDS)`.

use crate::metadata::tables::{CodedIndexType, TableId};

/// The type of a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Fixed 2 byte value. One byte values with a padding byte are stored this way too.
    U16,
    /// Fixed 4 byte value
    U32,
    /// Offset into `#Strings`
    String,
    /// 1-based index into `#GUID`
    Guid,
    /// Offset into `#Blob`
    Blob,
    /// Row id of the given table
    Table(TableId),
    /// Start of a run of rows of the given table, indexing its pointer table when that is present
    List(TableId),
    /// Coded index of the given kind
    Coded(CodedIndexType),
}

/// Largest number of columns of any table
pub const MAX_COLUMNS: usize = 9;

macro_rules! schema {
    ($($table:ident($module:ident) => [$($column:ident : $ty:expr),* $(,)?];)*) => {
        /// The columns of `table`, in on-disk order
        #[must_use]
        pub fn columns(table: TableId) -> &'static [ColumnType] {
            use ColumnType::*;
            use CodedIndexType as C;

            match table {
                $(TableId::$table => &[$($ty),*],)*
            }
        }

        $(
            #[doc = concat!("Column positions of the `", stringify!($table), "` table")]
            #[allow(missing_docs)]
            pub mod $module {
                #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
                enum Column {
                    $($column),*
                }

                $(pub const $column: usize = Column::$column as usize;)*
            }
        )*
    };
}

schema! {
    Module(module) => [GENERATION: U16, NAME: String, MVID: Guid, ENC_ID: Guid, ENC_BASE_ID: Guid];
    TypeRef(typeref) => [
        RESOLUTION_SCOPE: Coded(C::ResolutionScope),
        NAME: String,
        NAMESPACE: String,
    ];
    TypeDef(typedef) => [
        FLAGS: U32,
        NAME: String,
        NAMESPACE: String,
        EXTENDS: Coded(C::TypeDefOrRef),
        FIELD_LIST: List(TableId::Field),
        METHOD_LIST: List(TableId::MethodDef),
    ];
    FieldPtr(fieldptr) => [TARGET: Table(TableId::Field)];
    Field(field) => [FLAGS: U16, NAME: String, SIGNATURE: Blob];
    MethodPtr(methodptr) => [TARGET: Table(TableId::MethodDef)];
    MethodDef(methoddef) => [
        RVA: U32,
        IMPL_FLAGS: U16,
        FLAGS: U16,
        NAME: String,
        SIGNATURE: Blob,
        PARAM_LIST: List(TableId::Param),
    ];
    ParamPtr(paramptr) => [TARGET: Table(TableId::Param)];
    Param(param) => [FLAGS: U16, SEQUENCE: U16, NAME: String];
    InterfaceImpl(interfaceimpl) => [CLASS: Table(TableId::TypeDef), INTERFACE: Coded(C::TypeDefOrRef)];
    MemberRef(memberref) => [CLASS: Coded(C::MemberRefParent), NAME: String, SIGNATURE: Blob];
    Constant(constant) => [TYPE: U16, PARENT: Coded(C::HasConstant), VALUE: Blob];
    CustomAttribute(customattribute) => [
        PARENT: Coded(C::HasCustomAttribute),
        TYPE: Coded(C::CustomAttributeType),
        VALUE: Blob,
    ];
    FieldMarshal(fieldmarshal) => [PARENT: Coded(C::HasFieldMarshal), NATIVE_TYPE: Blob];
    DeclSecurity(declsecurity) => [ACTION: U16, PARENT: Coded(C::HasDeclSecurity), PERMISSION_SET: Blob];
    ClassLayout(classlayout) => [PACKING_SIZE: U16, CLASS_SIZE: U32, PARENT: Table(TableId::TypeDef)];
    FieldLayout(fieldlayout) => [OFFSET: U32, FIELD: Table(TableId::Field)];
    StandAloneSig(standalonesig) => [SIGNATURE: Blob];
    EventMap(eventmap) => [PARENT: Table(TableId::TypeDef), EVENT_LIST: List(TableId::Event)];
    EventPtr(eventptr) => [TARGET: Table(TableId::Event)];
    Event(event) => [FLAGS: U16, NAME: String, EVENT_TYPE: Coded(C::TypeDefOrRef)];
    PropertyMap(propertymap) => [PARENT: Table(TableId::TypeDef), PROPERTY_LIST: List(TableId::Property)];
    PropertyPtr(propertyptr) => [TARGET: Table(TableId::Property)];
    Property(property) => [FLAGS: U16, NAME: String, TYPE: Blob];
    MethodSemantics(methodsemantics) => [
        SEMANTICS: U16,
        METHOD: Table(TableId::MethodDef),
        ASSOCIATION: Coded(C::HasSemantics),
    ];
    MethodImpl(methodimpl) => [
        CLASS: Table(TableId::TypeDef),
        METHOD_BODY: Coded(C::MethodDefOrRef),
        METHOD_DECLARATION: Coded(C::MethodDefOrRef),
    ];
    ModuleRef(moduleref) => [NAME: String];
    TypeSpec(typespec) => [SIGNATURE: Blob];
    ImplMap(implmap) => [
        MAPPING_FLAGS: U16,
        MEMBER_FORWARDED: Coded(C::MemberForwarded),
        IMPORT_NAME: String,
        IMPORT_SCOPE: Table(TableId::ModuleRef),
    ];
    FieldRVA(fieldrva) => [RVA: U32, FIELD: Table(TableId::Field)];
    EncLog(enclog) => [TOKEN: U32, FUNC_CODE: U32];
    EncMap(encmap) => [TOKEN: U32];
    Assembly(assembly) => [
        HASH_ALG_ID: U32,
        MAJOR_VERSION: U16,
        MINOR_VERSION: U16,
        BUILD_NUMBER: U16,
        REVISION_NUMBER: U16,
        FLAGS: U32,
        PUBLIC_KEY: Blob,
        NAME: String,
        CULTURE: String,
    ];
    AssemblyProcessor(assemblyprocessor) => [PROCESSOR: U32];
    AssemblyOS(assemblyos) => [OS_PLATFORM_ID: U32, OS_MAJOR_VERSION: U32, OS_MINOR_VERSION: U32];
    AssemblyRef(assemblyref) => [
        MAJOR_VERSION: U16,
        MINOR_VERSION: U16,
        BUILD_NUMBER: U16,
        REVISION_NUMBER: U16,
        FLAGS: U32,
        PUBLIC_KEY_OR_TOKEN: Blob,
        NAME: String,
        CULTURE: String,
        HASH_VALUE: Blob,
    ];
    AssemblyRefProcessor(assemblyrefprocessor) => [PROCESSOR: U32, ASSEMBLY_REF: Table(TableId::AssemblyRef)];
    AssemblyRefOS(assemblyrefos) => [
        OS_PLATFORM_ID: U32,
        OS_MAJOR_VERSION: U32,
        OS_MINOR_VERSION: U32,
        ASSEMBLY_REF: Table(TableId::AssemblyRef),
    ];
    File(file) => [FLAGS: U32, NAME: String, HASH_VALUE: Blob];
    ExportedType(exportedtype) => [
        FLAGS: U32,
        TYPE_DEF_ID: U32,
        NAME: String,
        NAMESPACE: String,
        IMPLEMENTATION: Coded(C::Implementation),
    ];
    ManifestResource(manifestresource) => [
        OFFSET: U32,
        FLAGS: U32,
        NAME: String,
        IMPLEMENTATION: Coded(C::Implementation),
    ];
    NestedClass(nestedclass) => [
        NESTED_CLASS: Table(TableId::TypeDef),
        ENCLOSING_CLASS: Table(TableId::TypeDef),
    ];
    GenericParam(genericparam) => [
        NUMBER: U16,
        FLAGS: U16,
        OWNER: Coded(C::TypeOrMethodDef),
        NAME: String,
    ];
    MethodSpec(methodspec) => [METHOD: Coded(C::MethodDefOrRef), INSTANTIATION: Blob];
    GenericParamConstraint(genericparamconstraint) => [
        OWNER: Table(TableId::GenericParam),
        CONSTRAINT: Coded(C::TypeDefOrRef),
    ];
}

/// Shared by all five indirection tables
pub mod ptr {
    /// Row id of the target row
    pub const TARGET: usize = super::fieldptr::TARGET;
}

/// The column a table is sorted by when its bit in the sorted mask is set, if it has a
/// primary key at all
#[must_use]
pub fn sort_key(table: TableId) -> Option<usize> {
    match table {
        TableId::InterfaceImpl => Some(interfaceimpl::CLASS),
        TableId::Constant => Some(constant::PARENT),
        TableId::CustomAttribute => Some(customattribute::PARENT),
        TableId::FieldMarshal => Some(fieldmarshal::PARENT),
        TableId::DeclSecurity => Some(declsecurity::PARENT),
        TableId::ClassLayout => Some(classlayout::PARENT),
        TableId::FieldLayout => Some(fieldlayout::FIELD),
        TableId::EventMap => Some(eventmap::PARENT),
        TableId::PropertyMap => Some(propertymap::PARENT),
        TableId::MethodSemantics => Some(methodsemantics::ASSOCIATION),
        TableId::MethodImpl => Some(methodimpl::CLASS),
        TableId::ImplMap => Some(implmap::MEMBER_FORWARDED),
        TableId::FieldRVA => Some(fieldrva::FIELD),
        TableId::NestedClass => Some(nestedclass::NESTED_CLASS),
        TableId::GenericParam => Some(genericparam::OWNER),
        TableId::GenericParamConstraint => Some(genericparamconstraint::OWNER),
        _ => None,
    }
}
