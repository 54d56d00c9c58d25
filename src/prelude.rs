//! # cilmeta Prelude
//!
//! The types most programs reading metadata need, for a single glob import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cilmeta operations
pub use crate::Error;

/// The result type used throughout cilmeta
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Opened images and assemblies
pub use crate::{DirectoryResolver, Module, ModuleResolver, PathResolver, PeAssembly};

/// Metadata queries and how a root is opened
pub use crate::metadata::reader::{MetadataKind, MetadataReader, ReaderOptions};

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Tokens and Handles
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Typed row and heap handles
pub use crate::metadata::handles::{
    AssemblyFileHandle, AssemblyHandle, AssemblyRefHandle, BlobHandle, ConstantHandle,
    CustomAttributeHandle, DeclSecurityHandle, EventHandle, ExportedTypeHandle, FieldHandle,
    GenericParamConstraintHandle, GenericParamHandle, GuidHandle, InterfaceImplHandle,
    ManifestResourceHandle, MemberRefHandle, MethodDefHandle, MethodImplHandle, MethodSpecHandle,
    ModuleHandle, ModuleRefHandle, ParamHandle, PropertyHandle, StandAloneSigHandle,
    StringHandle, TypeDefHandle, TypeRefHandle, TypeSpecHandle, UserStringHandle,
};

// ================================================================================================
// Row Properties
// ================================================================================================

/// Decoded rows returned by the reader
pub use crate::metadata::reader::{
    AssemblyFileProps, AssemblyRefProps, CustomAttributeProps, ExportedTypeProps, FieldDefProps,
    ManifestResourceProps, MemberRefProps, MethodDefProps, TypeDefProps, TypeRefProps,
};

/// Constant values and method bodies
pub use crate::metadata::{body::MethodBody, constants::ConstantValue};

// ================================================================================================
// Flags and Identity
// ================================================================================================

/// Flag sets of the metadata tables
pub use crate::metadata::flags::{
    AssemblyFlags, AssemblyHashAlgorithm, EventAttributes, FieldAttributes, FileAttributes,
    GenericParamAttributes, ManifestResourceAttributes, MethodAttributes, MethodImplAttributes,
    MethodSemanticsAttributes, ParamAttributes, PropertyAttributes, TypeAttributes,
};

/// Assembly names and keys
pub use crate::metadata::identity::{AssemblyIdentity, AssemblyVersion, PublicKeyOrToken};

// ================================================================================================
// Low-Level Structures
// ================================================================================================

/// Headers, heaps and tables
pub use crate::metadata::{
    cor20header::Cor20Header,
    root::Root,
    streams::{Blob, Guid, StreamHeader, Strings, TablesHeader, UserStrings},
    tables::{CodedIndexType, MetadataTable, TableId},
};

// ================================================================================================
// Windows Runtime
// ================================================================================================

/// Projection of `.winmd` metadata
pub use crate::metadata::winmd::{ImpliedAssembly, WinMdReader};
