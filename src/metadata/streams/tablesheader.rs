//! The table stream (`#~` or `#-`).
//!
//! The stream opens with a fixed 24 byte header followed by one row count per present table and
//! then the table rows themselves, back to back in table number order:
//!
//! | Offset | Size | Field                                             |
//! |--------|------|---------------------------------------------------|
//! | 0      | 4    | Reserved, 0                                       |
//! | 4      | 1    | Major version                                     |
//! | 5      | 1    | Minor version                                     |
//! | 6      | 1    | Heap-size flags                                   |
//! | 7      | 1    | Reserved, 1                                       |
//! | 8      | 8    | Valid: bit vector of present tables               |
//! | 16     | 8    | Sorted: bit vector of sorted tables               |
//! | 24     | 4*n  | Row counts, one per bit set in Valid              |
//!
//! If heap-size flag `0x40` is set, 4 bytes of extra data follow the row counts.
//!
//! ## Reference
//! * ECMA-335 II.24.2.6

use std::sync::Arc;
use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::parser::Parser,
    metadata::tables::{
        MetadataTable, TableId, TableInfo, TableInfoRef, ENC_TABLES, HEAP_EXTRA_DATA, PTR_TABLES,
    },
    Error, Result,
};

/// Size of the fixed part of the header
pub const TABLES_HEADER_SIZE: usize = 24;

/// The `TablesHeader` structure represents the header of the `#~` or `#-` stream and gives
/// row level access to every table in it.
///
/// ## Example
/// ```rust
/// use cilmeta::metadata::{streams::TablesHeader, tables::TableId};
///
/// #[rustfmt::skip]
/// let data = [
///     0, 0, 0, 0, 2, 0, 0, 1,
///     0x01, 0, 0, 0, 0, 0, 0, 0,   // valid: Module
///     0, 0, 0, 0, 0, 0, 0, 0,      // sorted
///     1, 0, 0, 0,                  // one Module row
///     0, 0, 1, 0, 0, 0, 0, 0, 0, 0,
/// ];
/// let tables = TablesHeader::from(&data, true)?;
/// assert_eq!(tables.row_count(TableId::Module), 1);
/// assert_eq!(tables.table(TableId::Module).row_size(), 10);
/// # Ok::<(), cilmeta::Error>(())
/// ```
pub struct TablesHeader<'a> {
    /// Major version of table schemata, shall be 2
    pub major_version: u8,
    /// Minor version of table schemata, shall be 0
    pub minor_version: u8,
    /// Heap-size flags
    pub heap_sizes: u8,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of sorted tables
    pub sorted: u64,
    /// Extra data following the row counts, if heap-size flag `0x40` is set
    pub extra_data: Option<u32>,
    /// Row counts and column widths of all tables
    pub info: TableInfoRef,
    /// True for a `#~` stream, false for `#-`
    compressed: bool,
    /// Offset of the first table row, relative to the stream
    tables_offset: usize,
    tables: Vec<MetadataTable<'a>>,
}

impl<'a> TablesHeader<'a> {
    /// Parse a table stream.
    ///
    /// # Arguments
    /// * `data` - The bytes of the stream
    /// * `compressed` - True if the stream is named `#~`, false for `#-`
    ///
    /// # Errors
    /// - [`crate::Error::UnsupportedMetadataVersion`] if the valid mask names tables unknown to
    ///   the stream version
    /// - [`crate::Error::BadImageFormat`] if the header is truncated, a compressed stream contains
    ///   pointer or edit-and-continue tables, or the rows do not fit in the stream
    pub fn from(data: &'a [u8], compressed: bool) -> Result<TablesHeader<'a>> {
        if data.len() < TABLES_HEADER_SIZE {
            return Err(bad_image_error!(
                "Table stream of {} bytes is shorter than its header",
                data.len()
            ));
        }

        let mut parser = Parser::new(data);
        parser.advance_by(4)?;
        let major_version = parser.read_le::<u8>()?;
        let minor_version = parser.read_le::<u8>()?;
        let heap_sizes = parser.read_le::<u8>()?;
        parser.advance_by(1)?;
        let valid = parser.read_le::<u64>()?;
        let sorted = parser.read_le::<u64>()?;

        let known = TableId::version_mask(major_version, minor_version);
        if valid & !known != 0 {
            return Err(Error::UnsupportedMetadataVersion {
                major: major_version,
                minor: minor_version,
                valid,
            });
        }

        if compressed && valid & (PTR_TABLES | ENC_TABLES) != 0 {
            return Err(bad_image_error!(
                "Compressed table stream contains pointer or edit-and-continue tables - 0x{:016x}",
                valid & (PTR_TABLES | ENC_TABLES)
            ));
        }

        let mut row_counts = vec![0_u32; TableId::COUNT];
        for table in TableId::iter() {
            if valid & table.mask() != 0 {
                row_counts[table as usize] = parser
                    .read_le::<u32>()
                    .map_err(|_| bad_image_error!("Table stream row counts are truncated"))?;
            }
        }

        let extra_data = if heap_sizes & HEAP_EXTRA_DATA != 0 {
            Some(
                parser
                    .read_le::<u32>()
                    .map_err(|_| bad_image_error!("Table stream extra data is truncated"))?,
            )
        } else {
            None
        };

        let info = Arc::new(TableInfo::new(&row_counts, heap_sizes));
        let tables_offset = parser.pos();

        let mut tables = Vec::with_capacity(TableId::COUNT);
        let mut offset = tables_offset as u64;
        for table in TableId::iter() {
            let rows = info.rows(table);
            let size = info.table_size(table);
            let layout = *info.layout(table);

            if rows == 0 {
                tables.push(MetadataTable::empty(table, layout));
                continue;
            }

            let end = offset + size;
            if end > data.len() as u64 {
                return Err(bad_image_error!(
                    "Table {:?} with {} rows of {} bytes exceeds the table stream of {} bytes",
                    table,
                    rows,
                    layout.row_size,
                    data.len()
                ));
            }

            #[allow(clippy::cast_possible_truncation)]
            let start = offset as usize;
            tables.push(MetadataTable::new(
                table,
                &data[start..],
                rows,
                layout,
                sorted & table.mask() != 0,
            )?);

            tracing::trace!(
                table = ?table,
                rows,
                row_size = layout.row_size,
                base = offset,
                "laid out metadata table"
            );
            offset = end;
        }

        tracing::debug!(
            major_version,
            minor_version,
            heap_sizes,
            valid = %format!("0x{valid:016x}"),
            tables = valid.count_ones(),
            "parsed table stream"
        );

        Ok(TablesHeader {
            major_version,
            minor_version,
            heap_sizes,
            valid,
            sorted,
            extra_data,
            info,
            compressed,
            tables_offset,
            tables,
        })
    }

    /// Number of tables present
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// True for a `#~` stream, false for `#-`
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Offset of the first table row, relative to the start of the stream
    #[must_use]
    pub fn tables_offset(&self) -> usize {
        self.tables_offset
    }

    /// Access a table. Tables that are not present are empty.
    #[must_use]
    pub fn table(&self, table_id: TableId) -> &MetadataTable<'a> {
        &self.tables[table_id as usize]
    }

    /// True if the valid mask marks the table as present
    #[must_use]
    pub fn has_table(&self, table_id: TableId) -> bool {
        self.valid & table_id.mask() != 0
    }

    /// True if the sorted mask marks the table as sorted
    #[must_use]
    pub fn is_sorted(&self, table_id: TableId) -> bool {
        self.sorted & table_id.mask() != 0
    }

    /// Iterate the present tables in table number order
    pub fn present_tables(&self) -> impl Iterator<Item = TableId> + '_ {
        TableId::iter().filter(|table| self.has_table(*table))
    }

    /// Number of rows of a table, 0 if it is not present
    #[must_use]
    pub fn row_count(&self, table_id: TableId) -> u32 {
        self.info.rows(table_id)
    }

    /// True if the stream uses pointer tables to reorder fields, methods, params, events or
    /// properties
    #[must_use]
    pub fn uses_pointer_tables(&self) -> bool {
        self.valid & PTR_TABLES != 0
    }
}
