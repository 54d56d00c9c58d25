use std::sync::Arc;
use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::tables::{
    schema::{columns, ColumnType, MAX_COLUMNS},
    CodedIndexType, TableId,
};

/// Heap-size flag: `#Strings` offsets are 4 bytes wide
pub const HEAP_LARGE_STRINGS: u8 = 0x01;
/// Heap-size flag: `#GUID` indexes are 4 bytes wide
pub const HEAP_LARGE_GUID: u8 = 0x02;
/// Heap-size flag: `#Blob` offsets are 4 bytes wide
pub const HEAP_LARGE_BLOB: u8 = 0x04;
/// Heap-size flag: the stream is an EnC delta with padding in its heaps
pub const HEAP_ENC_DELTA: u8 = 0x20;
/// Heap-size flag: an extra 4 byte value follows the row counts
pub const HEAP_EXTRA_DATA: u8 = 0x40;
/// Heap-size flag: the stream may contain deleted (`_Deleted` named) rows
pub const HEAP_DELETED_MARKS: u8 = 0x80;

/// Holds information about the size that reference index fields have
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// The count of rows in this table
    pub rows: u32,
    /// Number of bits required to represent any valid row index
    pub bits: u8,
    /// If the count is > `u16::max`, the indexes of other tables into this table will be 4 bytes instead of 2
    pub is_large: bool,
}

impl TableRowInfo {
    /// Creates a new `TableRowInfo` instance with the given row count.
    ///
    /// # Arguments
    /// * `rows` - The number of rows in the table
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            (32 - rows.leading_zeros()) as u8
        };

        Self {
            rows,
            bits,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// Byte layout of one row of a table.
///
/// Offsets are relative to the start of the row. Columns beyond `columns` are zero.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct TableLayout {
    /// Number of columns
    pub columns: u8,
    /// Offset of each column within the row
    pub offsets: [u8; MAX_COLUMNS],
    /// Width of each column, 2 or 4
    pub sizes: [u8; MAX_COLUMNS],
    /// Sum of all column widths
    pub row_size: u32,
}

/// `TableInfo` holds information regarding the row count and reference index field sizes
/// of all tables in this binary.
///
/// It is a pure function of the row counts and the heap-size flags; building it twice from the
/// same inputs yields identical widths and layouts.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    coded_indexes: Vec<u8>,
    layouts: Vec<TableLayout>,
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

/// Cheap-copy reference to a `TableInfo` structure
pub type TableInfoRef = Arc<TableInfo>;

impl TableInfo {
    /// Build a new `TableInfo`
    ///
    /// ## Arguments
    /// * `row_counts` - Row count per table, indexed by table number; missing entries are 0
    /// * `heap_sizes` - The heap-size flag byte of the table stream header
    #[must_use]
    pub fn new(row_counts: &[u32], heap_sizes: u8) -> Self {
        let mut rows = vec![TableRowInfo::default(); TableId::COUNT];
        for (info, count) in rows.iter_mut().zip(row_counts) {
            *info = TableRowInfo::new(*count);
        }

        let mut table_info = TableInfo {
            rows,
            coded_indexes: vec![0; CodedIndexType::COUNT],
            layouts: Vec::with_capacity(TableId::COUNT),
            is_large_index_str: heap_sizes & HEAP_LARGE_STRINGS != 0,
            is_large_index_guid: heap_sizes & HEAP_LARGE_GUID != 0,
            is_large_index_blob: heap_sizes & HEAP_LARGE_BLOB != 0,
        };

        table_info.calculate_coded_index_bits();
        table_info.calculate_layouts();
        table_info
    }

    /// Returns true, if a requested table is larger than 2^16 rows and hence requires 4 bytes instead of 2 bytes
    #[must_use]
    pub fn is_large(&self, id: TableId) -> bool {
        self.rows[id as usize].is_large
    }

    /// Indicates the size of indexes referring into the '#Strings' heap. True means 4 bytes, False is 2 bytes
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.is_large_index_str
    }

    /// Indicates the size of indexes referring into the '#GUID' heap. True means 4 bytes, False is 2 bytes
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.is_large_index_guid
    }

    /// Indicates the size of indexes referring into the '#Blob' heap. True means 4 bytes, False is 2 bytes
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.is_large_index_blob
    }

    /// Width of a '#Strings' offset
    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        if self.is_large_index_str {
            4
        } else {
            2
        }
    }

    /// Width of a '#GUID' index
    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        if self.is_large_index_guid {
            4
        } else {
            2
        }
    }

    /// Width of a '#Blob' offset
    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        if self.is_large_index_blob {
            4
        } else {
            2
        }
    }

    /// Returns the row information of a specific table
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRowInfo {
        &self.rows[table as usize]
    }

    /// Row count of a specific table
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize].rows
    }

    /// Returns the number of bits required to represent an index into a specific table.
    #[must_use]
    pub fn table_index_bits(&self, table_id: TableId) -> u8 {
        self.rows[table_id as usize].bits
    }

    /// Returns the number of bytes required to represent an index into a specific table.
    #[must_use]
    pub fn table_index_bytes(&self, table_id: TableId) -> u8 {
        if self.rows[table_id as usize].bits > 16 {
            4
        } else {
            2
        }
    }

    /// Width of a list column into `child`.
    ///
    /// Lists index the pointer table of `child` instead of `child` itself when that table has rows.
    #[must_use]
    pub fn list_index_bytes(&self, child: TableId) -> u8 {
        match child.pointer_table() {
            Some(pointer) if self.rows(pointer) > 0 => self.table_index_bytes(pointer),
            _ => self.table_index_bytes(child),
        }
    }

    /// Returns the cached bit size for a specific coded index type.
    #[must_use]
    pub fn coded_index_bits(&self, coded_index_type: CodedIndexType) -> u8 {
        self.coded_indexes[coded_index_type as usize]
    }

    /// Returns the cached byte size for a specific coded index reference.
    #[must_use]
    pub fn coded_index_bytes(&self, coded_index_type: CodedIndexType) -> u8 {
        if self.coded_indexes[coded_index_type as usize] > 16 {
            4
        } else {
            2
        }
    }

    /// Width of a column of the given type
    #[must_use]
    pub fn column_bytes(&self, column: ColumnType) -> u8 {
        match column {
            ColumnType::U16 => 2,
            ColumnType::U32 => 4,
            ColumnType::String => self.str_bytes(),
            ColumnType::Guid => self.guid_bytes(),
            ColumnType::Blob => self.blob_bytes(),
            ColumnType::Table(table) => self.table_index_bytes(table),
            ColumnType::List(table) => self.list_index_bytes(table),
            ColumnType::Coded(kind) => self.coded_index_bytes(kind),
        }
    }

    /// The row layout of a table
    #[must_use]
    pub fn layout(&self, table: TableId) -> &TableLayout {
        &self.layouts[table as usize]
    }

    /// Size of one row of a table in bytes
    #[must_use]
    pub fn row_size(&self, table: TableId) -> u32 {
        self.layouts[table as usize].row_size
    }

    /// Total byte size of a table, rows times row size
    #[must_use]
    pub fn table_size(&self, table: TableId) -> u64 {
        u64::from(self.rows(table)) * u64::from(self.row_size(table))
    }

    fn calculate_coded_index_size(&self, coded_index_type: CodedIndexType) -> u8 {
        let max_bits = coded_index_type
            .participants()
            .map(|table| self.table_index_bits(table))
            .max()
            .unwrap_or(1);

        max_bits + coded_index_type.tag_bits()
    }

    fn calculate_coded_index_bits(&mut self) {
        for coded_index in CodedIndexType::iter() {
            let size = self.calculate_coded_index_size(coded_index);
            self.coded_indexes[coded_index as usize] = size;
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn calculate_layouts(&mut self) {
        self.layouts.clear();
        for table in TableId::iter() {
            let mut layout = TableLayout::default();
            let mut offset = 0_u8;

            for (index, column) in columns(table).iter().enumerate() {
                let size = self.column_bytes(*column);
                layout.offsets[index] = offset;
                layout.sizes[index] = size;
                offset += size;
            }

            layout.columns = columns(table).len() as u8;
            layout.row_size = u32::from(offset);
            self.layouts.push(layout);
        }
    }
}
