//! Token oriented queries over one metadata root.
//!
//! [`MetadataReader`] borrows the bytes of a metadata root and combines the stream directory,
//! the four heaps and the table stream into typed queries. Every query validates the row id of
//! the handle it receives against the row count of its table and fails with
//! [`crate::Error::OutOfRange`] otherwise; heap references and coded indexes are resolved
//! only when a query touches them.
//!
//! The queries are grouped by the entities they work on:
//!
//! - `types` - `TypeDef`, `TypeRef`, `TypeSpec`, nesting, interfaces, member lists, layout
//! - `members` - methods, fields, parameters, properties, events, member references, constants
//! - `generics` - generic parameters, constraints, method instantiations
//! - `attributes` - custom attributes and declarative security
//! - `assembly` - the assembly row, references, files, exported types and resources
//!
//! Tables that are physically sorted are searched with binary searches. If the sorted bit of such
//! a table is clear, range queries fall back to a linear scan and log a warning.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilmeta::metadata::reader::MetadataReader;
//!
//! # fn metadata() -> Vec<u8> { unimplemented!() }
//! let data = metadata();
//! let reader = MetadataReader::new(&data)?;
//! for handle in reader.type_defs() {
//!     let props = reader.type_def_props(handle)?;
//!     println!("{}.{}", props.namespace, props.name);
//! }
//! # Ok::<(), cilmeta::Error>(())
//! ```

mod assembly;
mod attributes;
mod generics;
mod members;
mod types;

pub use assembly::{
    AssemblyFileProps, AssemblyRefProps, ExportedTypeProps, ManifestResourceProps,
};
pub use attributes::{CustomAttributeProps, DeclSecurityProps};
pub use generics::{GenericParamConstraintProps, GenericParamProps, MethodSpecProps};
pub use members::{
    DllImportData, EventAccessors, EventProps, FieldDefProps, MemberRefProps, MethodDefProps,
    MethodImplProps, ParamProps, PropertyAccessors, PropertyProps,
};
pub use types::{InterfaceImplProps, TypeDefProps, TypeLayout, TypeRefProps};

use std::ops::Range;

use crate::{
    metadata::{
        handles::{BlobHandle, GuidHandle, StringHandle, UserStringHandle},
        root::Root,
        streams::{Blob, Guid, StreamKind, Strings, TablesHeader, UserStrings},
        tables::{
            schema::{module, ptr, typedef},
            CodedIndexType, MetadataTable, Row, RowIds, TableId,
        },
        token::Token,
    },
    Result,
};

/// Options controlling how strictly a metadata root is validated while it is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Fail on stream names that are not one of the six known names instead of skipping them
    pub strict_stream_names: bool,
    /// Check the `#Strings` offsets of the `Module` and `TypeDef` rows while opening
    pub validate_names: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            strict_stream_names: false,
            validate_names: true,
        }
    }
}

/// The flavor of metadata, derived from the version string of the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// Plain ECMA-335 metadata
    Ecma335,
    /// A Windows Runtime metadata file (`.winmd`)
    WindowsMetadata,
    /// A Windows Runtime metadata file produced from managed code
    ManagedWindowsMetadata,
}

impl MetadataKind {
    /// Classify a metadata version string
    #[must_use]
    pub fn from_version(version: &str) -> MetadataKind {
        if !version.contains("WindowsRuntime") {
            MetadataKind::Ecma335
        } else if version.contains("CLR") {
            MetadataKind::ManagedWindowsMetadata
        } else {
            MetadataKind::WindowsMetadata
        }
    }
}

/// Read access to one metadata root
pub struct MetadataReader<'a> {
    data: &'a [u8],
    root: Root,
    tables: TablesHeader<'a>,
    strings: Strings<'a>,
    user_strings: UserStrings<'a>,
    guids: Guid<'a>,
    blobs: Blob<'a>,
    kind: MetadataKind,
}

impl<'a> MetadataReader<'a> {
    /// Open the metadata root in `data` with the default [`ReaderOptions`].
    ///
    /// # Errors
    /// See [`MetadataReader::with_options`]
    pub fn new(data: &'a [u8]) -> Result<MetadataReader<'a>> {
        Self::with_options(data, &ReaderOptions::default())
    }

    /// Open the metadata root in `data`.
    ///
    /// # Errors
    /// - [`crate::Error::BadImageFormat`] if the root, a heap or the table stream is malformed,
    ///   or a validated name lies outside of `#Strings`
    /// - [`crate::Error::UnsupportedMetadataVersion`] if the table stream names unknown tables
    pub fn with_options(data: &'a [u8], options: &ReaderOptions) -> Result<MetadataReader<'a>> {
        let root = Root::read(data, options.strict_stream_names)?;

        let (table_kind, _) = root
            .table_stream()
            .ok_or_else(|| bad_image_error!("Metadata has no table stream"))?;
        let tables = TablesHeader::from(
            root.stream_data(data, table_kind),
            table_kind == StreamKind::CompressedTables,
        )?;

        let strings = Strings::from(root.stream_data(data, StreamKind::Strings))?;
        let user_strings = UserStrings::from(root.stream_data(data, StreamKind::UserStrings))?;
        let guids = Guid::from(root.stream_data(data, StreamKind::Guid))?;
        let blobs = Blob::from(root.stream_data(data, StreamKind::Blob))?;
        let kind = MetadataKind::from_version(&root.version);

        let reader = MetadataReader {
            data,
            root,
            tables,
            strings,
            user_strings,
            guids,
            blobs,
            kind,
        };

        if options.validate_names {
            reader.validate_names()?;
        }

        Ok(reader)
    }

    fn validate_names(&self) -> Result<()> {
        let checks = [
            (TableId::Module, module::NAME),
            (TableId::TypeDef, typedef::NAME),
            (TableId::TypeDef, typedef::NAMESPACE),
        ];

        for (table, column) in checks {
            for row in self.table(table).iter() {
                let offset = row.get(column);
                if !self.strings.contains(offset as usize) {
                    return Err(bad_image_error!(
                        "{} references #Strings offset {} past the heap of {} bytes",
                        row.token(),
                        offset,
                        self.strings.len()
                    ));
                }
            }
        }

        Ok(())
    }

    /// The raw metadata bytes
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The metadata root and its stream directory
    #[must_use]
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// The metadata version string, e.g. `v4.0.30319`
    #[must_use]
    pub fn metadata_version(&self) -> &str {
        &self.root.version
    }

    /// The flavor of this metadata
    #[must_use]
    pub fn metadata_kind(&self) -> MetadataKind {
        self.kind
    }

    /// True for Windows Runtime metadata
    #[must_use]
    pub fn is_winmd(&self) -> bool {
        self.kind != MetadataKind::Ecma335
    }

    /// Major and minor version of the table stream
    #[must_use]
    pub fn table_stream_version(&self) -> (u8, u8) {
        (self.tables.major_version, self.tables.minor_version)
    }

    /// The table stream
    #[must_use]
    pub fn tables(&self) -> &TablesHeader<'a> {
        &self.tables
    }

    /// One table; tables that are not present are empty
    #[must_use]
    pub fn table(&self, table: TableId) -> &MetadataTable<'a> {
        self.tables.table(table)
    }

    /// Number of rows of `table`
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.tables.row_count(table)
    }

    /// The `#Strings` heap
    #[must_use]
    pub fn strings(&self) -> &Strings<'a> {
        &self.strings
    }

    /// The `#US` heap
    #[must_use]
    pub fn user_strings(&self) -> &UserStrings<'a> {
        &self.user_strings
    }

    /// The `#GUID` heap
    #[must_use]
    pub fn guids(&self) -> &Guid<'a> {
        &self.guids
    }

    /// The `#Blob` heap
    #[must_use]
    pub fn blobs(&self) -> &Blob<'a> {
        &self.blobs
    }

    /// Resolve a `#Strings` handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] for offsets past the heap
    pub fn string(&self, handle: StringHandle) -> Result<&'a str> {
        self.strings.get(handle.value() as usize)
    }

    /// Resolve a `#Blob` handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] for offsets past the heap
    pub fn blob(&self, handle: BlobHandle) -> Result<&'a [u8]> {
        self.blobs.get(handle.value() as usize)
    }

    /// Resolve a `#GUID` handle; the nil handle yields the nil GUID.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] for indexes past the heap
    pub fn guid(&self, handle: GuidHandle) -> Result<uguid::Guid> {
        self.guids.get(handle.value() as usize)
    }

    /// Resolve a `#US` handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] for offsets past the heap
    pub fn user_string(&self, handle: UserStringHandle) -> Result<String> {
        self.user_strings.get_string(handle.value() as usize)
    }

    /// Name of the `Module` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if there is no `Module` row
    pub fn module_name(&self) -> Result<&'a str> {
        let row = self.row(TableId::Module, 1)?;
        self.string_column(&row, module::NAME)
    }

    /// The module version id.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if there is no `Module` row or the GUID index is past
    /// the heap
    pub fn module_version_id(&self) -> Result<uguid::Guid> {
        let row = self.row(TableId::Module, 1)?;
        self.guid(GuidHandle(row.get(module::MVID)))
    }

    /// The edit-and-continue generation of the module.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if there is no `Module` row
    pub fn module_generation(&self) -> Result<u16> {
        Ok(self.row(TableId::Module, 1)?.get_u16(module::GENERATION))
    }

    /// True if this module carries the `Assembly` row
    #[must_use]
    pub fn is_manifest_module(&self) -> bool {
        self.row_count(TableId::Assembly) > 0
    }

    // Helpers shared by the query modules

    pub(crate) fn row(&self, table: TableId, rid: u32) -> Result<Row<'a>> {
        self.table(table).row_required(rid)
    }

    pub(crate) fn string_column(&self, row: &Row<'a>, column: usize) -> Result<&'a str> {
        self.strings.get(row.get(column) as usize)
    }

    pub(crate) fn blob_column(&self, row: &Row<'a>, column: usize) -> Result<&'a [u8]> {
        self.blobs.get(row.get(column) as usize)
    }

    pub(crate) fn string_column_eq(&self, row: &Row<'a>, column: usize, value: &str) -> bool {
        self.strings.eq(row.get(column) as usize, value)
    }

    /// Rows of `table` whose coded index `column` of kind `kind` references `token`
    pub(crate) fn rows_referencing(
        &self,
        table: TableId,
        column: usize,
        kind: CodedIndexType,
        token: Token,
    ) -> RowIds {
        if token.is_nil() {
            return RowIds::empty();
        }

        match kind.to_tag(token) {
            Some(value) => self.table(table).equal_range(column, value),
            None => RowIds::empty(),
        }
    }

    /// The pointer table redirecting `child`, if the stream uses one for it
    fn pointer_table(&self, child: TableId) -> Option<TableId> {
        child
            .pointer_table()
            .filter(|pointer| self.row_count(*pointer) > 0)
    }

    /// Number of entries a list column of `child` can address
    pub(crate) fn list_length(&self, child: TableId) -> u32 {
        match self.pointer_table(child) {
            Some(pointer) => self.row_count(pointer),
            None => self.row_count(child),
        }
    }

    /// The list run of `rid` in `parent`, in list positions
    pub(crate) fn list_range(
        &self,
        parent: TableId,
        rid: u32,
        column: usize,
        child: TableId,
    ) -> Range<u32> {
        self.table(parent)
            .list_range(rid, column, self.list_length(child))
    }

    /// Map list positions to row ids of `child`, going through its pointer table if present
    pub(crate) fn list_rows(
        &self,
        positions: Range<u32>,
        child: TableId,
    ) -> impl Iterator<Item = u32> + '_ {
        let pointer = self.pointer_table(child);
        positions.map(move |position| match pointer {
            Some(pointer) => self.table(pointer).value(position, ptr::TARGET),
            None => position,
        })
    }

    /// The list position of row `rid` of `child`
    pub(crate) fn list_position(&self, child: TableId, rid: u32) -> Option<u32> {
        match self.pointer_table(child) {
            Some(pointer) => self
                .table(pointer)
                .iter()
                .find(|row| row.get(ptr::TARGET) == rid)
                .map(|row| row.rid()),
            None => (rid > 0 && rid <= self.row_count(child)).then_some(rid),
        }
    }

    /// The row of `parent` whose list run in `column` contains row `rid` of `child`
    pub(crate) fn list_owner(
        &self,
        parent: TableId,
        column: usize,
        child: TableId,
        rid: u32,
    ) -> Option<u32> {
        let position = self.list_position(child, rid)?;
        self.table(parent)
            .find_list_owner(column, position, self.list_length(child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::tables::schema::customattribute,
        test::builder::{table, Cell, MetadataBuilder, SampleAssembly},
        Error,
    };

    #[test]
    fn metadata_kind() {
        assert_eq!(MetadataKind::from_version("v4.0.30319"), MetadataKind::Ecma335);
        assert_eq!(
            MetadataKind::from_version("WindowsRuntime 1.4"),
            MetadataKind::WindowsMetadata
        );
        assert_eq!(
            MetadataKind::from_version("WindowsRuntime 1.4;CLR v4.0.30319"),
            MetadataKind::ManagedWindowsMetadata
        );
    }

    #[test]
    fn module_queries() {
        let sample = SampleAssembly::new();
        let data = sample.metadata.build();
        let reader = MetadataReader::new(&data).unwrap();

        assert_eq!(reader.metadata_version(), "v4.0.30319");
        assert_eq!(reader.metadata_kind(), MetadataKind::Ecma335);
        assert!(!reader.is_winmd());
        assert_eq!(reader.table_stream_version(), (2, 0));
        assert_eq!(reader.module_name().unwrap(), "Sample.dll");
        assert_eq!(reader.module_generation().unwrap(), 0);
        assert_eq!(
            reader.module_version_id().unwrap().to_bytes()[0..2],
            [0x4C, 0x65]
        );
        assert!(reader.is_manifest_module());
    }

    #[test]
    fn bad_name_offset() {
        let mut md = MetadataBuilder::new();
        md.row(
            table::MODULE,
            vec![Cell::U16(0), Cell::Str(0), Cell::Guid(0), Cell::Guid(0), Cell::Guid(0)],
        );
        md.row(
            table::TYPE_DEF,
            vec![
                Cell::U32(0),
                Cell::Str(0x0F00),
                Cell::Str(0),
                Cell::Idx(0),
                Cell::Idx(1),
                Cell::Idx(1),
            ],
        );
        let data = md.build();

        assert!(matches!(
            MetadataReader::new(&data),
            Err(Error::BadImageFormat { .. })
        ));

        let lenient = ReaderOptions {
            validate_names: false,
            ..ReaderOptions::default()
        };
        let reader = MetadataReader::with_options(&data, &lenient).unwrap();
        assert!(matches!(
            reader.string(StringHandle(0x0F00)),
            Err(Error::OutOfRange)
        ));
    }

    #[test]
    fn coded_range_query() {
        let sample = SampleAssembly::new();
        let data = sample.metadata.build();
        let reader = MetadataReader::new(&data).unwrap();

        let assembly = Token::from_parts(TableId::Assembly, 1);
        let rows: Vec<u32> = reader
            .rows_referencing(
                TableId::CustomAttribute,
                customattribute::PARENT,
                CodedIndexType::HasCustomAttribute,
                assembly,
            )
            .collect();
        assert_eq!(rows, vec![1, 2, 3]);

        let ifoo = Token::from_parts(TableId::TypeDef, 5);
        let rows: Vec<u32> = reader
            .rows_referencing(
                TableId::CustomAttribute,
                customattribute::PARENT,
                CodedIndexType::HasCustomAttribute,
                ifoo,
            )
            .collect();
        assert_eq!(rows, vec![4]);
        assert_eq!(
            reader
                .rows_referencing(
                    TableId::CustomAttribute,
                    customattribute::PARENT,
                    CodedIndexType::HasCustomAttribute,
                    Token::NIL,
                )
                .count(),
            0
        );
    }

    #[test]
    fn user_strings() {
        let mut md = MetadataBuilder::new();
        md.row(
            table::MODULE,
            vec![Cell::U16(0), Cell::Str(0), Cell::Guid(0), Cell::Guid(0), Cell::Guid(0)],
        );
        let hello = md.user_string("Hello");
        let data = md.build();
        let reader = MetadataReader::new(&data).unwrap();

        assert_eq!(reader.user_string(UserStringHandle(hello)).unwrap(), "Hello");
        assert_eq!(
            reader
                .user_string(UserStringHandle::from_token(Token::new(0x7000_0000 | hello)))
                .unwrap(),
            "Hello"
        );
    }
}
