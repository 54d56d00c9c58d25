// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![warn(missing_docs)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # cilmeta
//!
//! A reader for the ECMA-335 metadata of managed PE images (.NET assemblies, netmodules and
//! Windows Runtime `.winmd` files). Images are memory-mapped or held in memory, and every
//! query decodes the rows and heap entries it touches straight from the image bytes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cilmeta::prelude::*;
//! use std::path::Path;
//!
//! let module = Module::from_file(Path::new("tests/samples/Sample.dll"))?;
//! let reader = module.reader();
//!
//! for handle in reader.type_defs() {
//!     let props = reader.type_def_props(handle)?;
//!     println!("{}.{} ({:?})", props.namespace, props.name, props.flags);
//! }
//! # Ok::<(), cilmeta::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`file`] - memory-block providers, the PE/COFF headers and RVA mapping
//! - [`metadata`] - the CLI header, metadata root, heaps, tables and the [`MetadataReader`]
//! - [`Module`] - an opened image with its reader and cached module facts
//! - [`PeAssembly`] - a manifest module together with its linked modules
//! - [`metadata::winmd`] - the Windows Runtime projection of `.winmd` metadata
//! - [`Error`] and [`Result`] - error handling
//!
//! Images are validated while a [`Module`] is constructed: the PE headers, CLI header,
//! metadata root, stream directory and table layout must all be consistent, so a module
//! that was handed out never fails on structure that was already checked. Rows and heap
//! entries are bounds checked when they are read.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events when images, metadata roots and table streams are
//! opened and when a query has to fall back to a linear scan. It installs no subscriber.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Memory-block providers and the PE/COFF image layer
pub mod file;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use cilmeta::prelude::*;
///
/// let module = Module::from_file("tests/samples/Sample.dll".as_ref())?;
/// println!("{} types", module.reader().row_count(TableId::TypeDef));
/// # Ok::<(), cilmeta::Error>(())
/// ```
pub mod prelude;

/// Definitions, parsing and querying of CIL metadata based on ECMA-335
pub mod metadata;

/// `cilmeta` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `cilmeta` Error type
///
/// # Examples
///
/// ```rust,no_run
/// use cilmeta::{Error, Module};
///
/// match Module::from_file(std::path::Path::new("tests/samples/broken.dll")) {
///     Ok(module) => println!("Loaded {}", module.reader().metadata_version()),
///     Err(Error::BadImageFormat { message, .. }) => println!("Malformed: {message}"),
///     Err(e) => println!("Error: {e}"),
/// }
/// ```
pub use error::Error;

pub use file::{parser::Parser, Backend, File, Memory, Physical};
pub use metadata::{
    module::Module,
    peassembly::{DirectoryResolver, ModuleResolver, PathResolver, PeAssembly},
    reader::{MetadataKind, MetadataReader, ReaderOptions},
    streams::{Blob, Guid, StreamHeader, Strings, TablesHeader, UserStrings},
    token::Token,
    winmd::WinMdReader,
};
