//! Row access into a single metadata table.
//!
//! A [`MetadataTable`] is a view over the bytes of one table together with its row layout. Rows
//! are decoded on demand into [`Row`]s, which read their columns straight from the underlying
//! buffer. Nothing is copied.

use std::ops::Range;

use crate::{
    metadata::{
        tables::{
            schema::{columns, ColumnType},
            TableId, TableLayout,
        },
        token::Token,
    },
    Result,
};

/// A borrowed view over the rows of one table
#[derive(Clone, Copy, Debug)]
pub struct MetadataTable<'a> {
    id: TableId,
    data: &'a [u8],
    rows: u32,
    layout: TableLayout,
    sorted: bool,
}

impl<'a> MetadataTable<'a> {
    /// Wrap the bytes of a table.
    ///
    /// `data` must hold at least `rows * layout.row_size` bytes, which the table stream checks
    /// before creating any table.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if `data` is too short.
    pub fn new(
        id: TableId,
        data: &'a [u8],
        rows: u32,
        layout: TableLayout,
        sorted: bool,
    ) -> Result<MetadataTable<'a>> {
        let size = rows as usize * layout.row_size as usize;
        if data.len() < size {
            return Err(out_of_range_error!());
        }

        Ok(MetadataTable {
            id,
            data: &data[..size],
            rows,
            layout,
            sorted,
        })
    }

    /// An empty table
    #[must_use]
    pub fn empty(id: TableId, layout: TableLayout) -> MetadataTable<'a> {
        MetadataTable {
            id,
            data: &[],
            rows: 0,
            layout,
            sorted: false,
        }
    }

    /// Which table this is
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Number of rows
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.rows
    }

    /// True if the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Size of one row in bytes
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.layout.row_size
    }

    /// The row layout
    #[must_use]
    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// True if the header marks this table as sorted by its key column
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// The raw bytes of all rows
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Fetch a row by its 1-based id.
    ///
    /// Row 0 is the nil row and yields `Ok(None)`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if `rid` exceeds the row count.
    pub fn row(&self, rid: u32) -> Result<Option<Row<'a>>> {
        if rid == 0 {
            return Ok(None);
        }

        self.get(rid).map(Some).ok_or(out_of_range_error!())
    }

    /// Fetch a row that must exist.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if `rid` is 0 or exceeds the row count.
    pub fn row_required(&self, rid: u32) -> Result<Row<'a>> {
        self.get(rid).ok_or(out_of_range_error!())
    }

    /// Fetch a row by id, `None` if it does not exist
    #[must_use]
    pub fn get(&self, rid: u32) -> Option<Row<'a>> {
        if rid == 0 || rid > self.rows {
            return None;
        }

        let size = self.layout.row_size as usize;
        let start = (rid as usize - 1) * size;

        Some(Row {
            table: self.id,
            rid,
            data: &self.data[start..start + size],
            layout: self.layout,
        })
    }

    /// Iterate all rows in order
    pub fn iter(&self) -> impl Iterator<Item = Row<'a>> + '_ {
        (1..=self.rows).filter_map(|rid| self.get(rid))
    }

    /// Value of one column of one row, 0 for rows that do not exist
    #[must_use]
    pub fn value(&self, rid: u32, column: usize) -> u32 {
        self.get(rid).map_or(0, |row| row.get(column))
    }

    /// All rows whose `column` holds `value`.
    ///
    /// Sorted tables are searched with two binary searches and yield a contiguous range. If the
    /// table is not flagged as sorted the whole table is scanned instead.
    #[must_use]
    pub fn equal_range(&self, column: usize, value: u32) -> RowIds {
        if self.sorted {
            let start = self.lower_bound(column, value);
            let end = self.upper_bound(column, value);
            return RowIds::Range(start..end.max(start));
        }

        if self.rows > 0 {
            tracing::warn!(
                table = ?self.id,
                rows = self.rows,
                "table is not sorted, falling back to a linear scan"
            );
        }

        RowIds::List(
            self.iter()
                .filter(|row| row.get(column) == value)
                .map(|row| row.rid())
                .collect::<Vec<_>>()
                .into_iter(),
        )
    }

    /// First row id whose `column` is not less than `value`, `row_count + 1` if there is none.
    /// The table must be ordered by `column`.
    #[must_use]
    pub fn lower_bound(&self, column: usize, value: u32) -> u32 {
        self.partition_start(column, value, false)
    }

    /// First row id whose `column` is greater than `value`, `row_count + 1` if there is none.
    /// The table must be ordered by `column`.
    #[must_use]
    pub fn upper_bound(&self, column: usize, value: u32) -> u32 {
        self.partition_start(column, value, true)
    }

    /// The rows of a child table owned by `rid` through the list column `column`.
    ///
    /// The run starts at the row's list value and ends where the next row's run begins, or after
    /// the last child row. Values past the child table are clamped, so a malformed list yields a
    /// shorter range instead of failing.
    #[must_use]
    pub fn list_range(&self, rid: u32, column: usize, child_rows: u32) -> Range<u32> {
        let limit = child_rows + 1;
        let Some(row) = self.get(rid) else {
            return limit..limit;
        };

        let start = row.get(column).clamp(1, limit);
        let end = match self.get(rid + 1) {
            Some(next) => next.get(column).clamp(1, limit),
            None => limit,
        };

        start..end.max(start)
    }

    /// The row whose list column `column` run contains the child row `child`.
    ///
    /// List columns are ascending by construction, so this is a binary search for the last row
    /// whose run starts at or before `child`.
    #[must_use]
    pub fn find_list_owner(&self, column: usize, child: u32, child_rows: u32) -> Option<u32> {
        if child == 0 || child > child_rows {
            return None;
        }

        let owner = self.partition_start(column, child, true).checked_sub(1)?;
        if owner == 0 {
            return None;
        }

        // Skip empty runs that start at the same child
        let range = self.list_range(owner, column, child_rows);
        range.contains(&child).then_some(owner)
    }

    // First rid in [1, rows + 1] for which the predicate flips. With `inclusive` the predicate is
    // `column <= value`, otherwise `column < value`.
    fn partition_start(&self, column: usize, value: u32, inclusive: bool) -> u32 {
        let mut low = 1_u32;
        let mut high = self.rows + 1;

        while low < high {
            let mid = low + (high - low) / 2;
            let current = self.value(mid, column);
            let before = if inclusive {
                current <= value
            } else {
                current < value
            };

            if before {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        low
    }
}

/// One decoded row.
///
/// Column values are read on access; use the per-table column constants in
/// [`crate::metadata::tables::schema`] to address them.
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    table: TableId,
    rid: u32,
    data: &'a [u8],
    layout: TableLayout,
}

impl<'a> Row<'a> {
    /// The table this row belongs to
    #[must_use]
    pub fn table(&self) -> TableId {
        self.table
    }

    /// The 1-based row id
    #[must_use]
    pub fn rid(&self) -> u32 {
        self.rid
    }

    /// The token of this row
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(self.table, self.rid)
    }

    /// The raw bytes of this row
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Raw value of a column, widened to `u32`. Columns past the end of the row read as 0.
    #[must_use]
    pub fn get(&self, column: usize) -> u32 {
        if column >= usize::from(self.layout.columns) {
            return 0;
        }

        let offset = usize::from(self.layout.offsets[column]);
        let bytes = &self.data[offset..];
        match self.layout.sizes[column] {
            2 => u32::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            _ => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }

    /// Raw value of a 2 byte column
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_u16(&self, column: usize) -> u16 {
        self.get(column) as u16
    }

    /// A table index or coded index column as a token.
    ///
    /// A row id of 0 yields [`Token::NIL`].
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if a coded index carries an invalid tag.
    pub fn reference(&self, column: usize) -> Result<Token> {
        let value = self.get(column);
        match columns(self.table).get(column) {
            Some(ColumnType::Table(table) | ColumnType::List(table)) => {
                if value == 0 {
                    Ok(Token::NIL)
                } else {
                    Ok(Token::from_parts(*table, value))
                }
            }
            Some(ColumnType::Coded(kind)) => kind.to_token(value),
            _ => Ok(Token::new(value)),
        }
    }
}

/// Row ids produced by a range query
#[derive(Debug, Clone)]
pub enum RowIds {
    /// A contiguous run found by binary search
    Range(Range<u32>),
    /// Individual rows found by a linear scan
    List(std::vec::IntoIter<u32>),
}

impl RowIds {
    /// An empty result
    #[must_use]
    pub fn empty() -> RowIds {
        RowIds::Range(0..0)
    }
}

impl Iterator for RowIds {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        match self {
            RowIds::Range(range) => range.next(),
            RowIds::List(list) => list.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            RowIds::Range(range) => range.size_hint(),
            RowIds::List(list) => list.size_hint(),
        }
    }
}

impl ExactSizeIterator for RowIds {}
