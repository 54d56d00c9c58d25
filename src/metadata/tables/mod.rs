//! Metadata tables.
//!
//! The physical table stream stores up to 45 tables back to back. Which tables exist and how
//! many rows they have is declared in the stream header; the byte width of most columns
//! follows from those row counts. This module holds the pieces that turn the header into
//! addressable rows:
//!
//! - [`TableId`] names each table
//! - [`CodedIndexType`] decodes the 13 coded index kinds
//! - [`schema`] lists the columns of every table
//! - [`TableInfo`] computes column widths and row layouts
//! - [`MetadataTable`] and [`Row`] read rows and columns on demand
//!
//! # Reference
//! * ECMA-335 6th edition, Partition II, sections 22 and 24.2.6

mod codedindex;
pub mod schema;
mod table;
mod tableid;
mod tableinfo;

pub use codedindex::CodedIndexType;
pub use table::{MetadataTable, Row, RowIds};
pub use tableid::{TableId, ENC_TABLES, PTR_TABLES, TABLES_V1_0, TABLES_V1_1, TABLES_V2_0};
pub use tableinfo::{
    TableInfo, TableInfoRef, TableLayout, TableRowInfo, HEAP_DELETED_MARKS, HEAP_ENC_DELTA,
    HEAP_EXTRA_DATA, HEAP_LARGE_BLOB, HEAP_LARGE_GUID, HEAP_LARGE_STRINGS,
};
