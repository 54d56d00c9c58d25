//! ECMA-335 metadata of managed images.
//!
//! The layers build on each other:
//!
//! - [`cor20header`] and [`root`] locate the metadata inside an image and list its streams
//! - [`streams`] read the four heaps and the table stream header
//! - [`tables`] compute the row layout of every table and decode coded indexes
//! - [`reader`] combines them into [`reader::MetadataReader`], which answers queries by
//!   [`token::Token`] or typed [`handles`]
//! - [`module`] and [`peassembly`] own the image bytes and cache facts derived from them
//! - [`winmd`] projects Windows Runtime metadata into the view the CLR presents
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilmeta::Module;
//! use std::path::Path;
//!
//! let module = Module::from_file(Path::new("tests/samples/Sample.dll"))?;
//! let reader = module.reader();
//!
//! if let Some(identity) = reader.assembly_identity()? {
//!     println!("Assembly: {} {}", identity.name, identity.version);
//! }
//! for reference in reader.referenced_assemblies()? {
//!     println!("  -> {}", reference.name);
//! }
//! # Ok::<(), cilmeta::Error>(())
//! ```

/// Method bodies (tiny and fat headers, exception clauses)
pub mod body;
/// Element type and other signature constants
pub mod constants;
/// The CLI header
pub mod cor20header;
/// Custom attribute value blobs
pub mod customattributes;
/// Flag sets of the metadata tables
pub mod flags;
/// Typed row handles
pub mod handles;
/// Assembly names, versions and public keys
pub mod identity;
/// The owning single-module view
pub mod module;
/// Multi-module assemblies
pub mod peassembly;
/// Token and handle based queries over one metadata root
pub mod reader;
/// The metadata root and its stream directory
pub mod root;
/// Heaps and the table stream header
pub mod streams;
/// Table ids, coded indexes and row layout
pub mod tables;
/// Metadata tokens
pub mod token;
/// Windows Runtime projection
pub mod winmd;
