//! CLI (COR20) header.
//!
//! The CLI header is found through the `ClrRuntimeHeader` data directory of a managed PE image.
//! It carries the runtime version the image was built for, the [`CorFlags`], the entry point
//! and six nested directories, the most important of which locates the metadata root.
//!
//! # Reference
//! - ECMA-335 II.25.3.3

use bitflags::bitflags;

use crate::{
    file::{parser::Parser, pe::DataDirectory},
    metadata::token::Token,
    Result,
};

/// Size of the CLI header in bytes
pub const COR20_HEADER_SIZE: usize = 72;

bitflags! {
    /// Runtime flags of the CLI header
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CorFlags: u32 {
        /// The image contains only IL
        const IL_ONLY = 0x0000_0001;
        /// The image can only be loaded into a 32-bit process
        const REQUIRES_32BIT = 0x0000_0002;
        /// The image is an IL library
        const IL_LIBRARY = 0x0000_0004;
        /// The image is strong-name signed
        const STRONG_NAME_SIGNED = 0x0000_0008;
        /// The entry point is a native RVA instead of a token
        const NATIVE_ENTRYPOINT = 0x0000_0010;
        /// Debug data is tracked
        const TRACK_DEBUG_DATA = 0x0001_0000;
        /// A 32-bit process is preferred
        const PREFERS_32BIT = 0x0002_0000;
    }
}

/// The CLI header of a managed image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cor20Header {
    /// Size of header in bytes
    pub cb: u32,
    /// The minimum version of runtime required to run this program
    pub major_runtime_version: u16,
    /// The minor portion of the version
    pub minor_runtime_version: u16,
    /// Location of the metadata root
    pub metadata: DataDirectory,
    /// Flags describing this runtime
    pub flags: CorFlags,
    /// Token of the `MethodDef` or `File` of the entry point, or its RVA if
    /// [`CorFlags::NATIVE_ENTRYPOINT`] is set
    pub entry_point: u32,
    /// Implementation specific resources
    pub resources: DataDirectory,
    /// Hash data used by the CLI loader for binding and versioning
    pub strong_name_signature: DataDirectory,
    /// Always 0
    pub code_manager_table: DataDirectory,
    /// Array of locations holding arrays of function pointers
    pub vtable_fixups: DataDirectory,
    /// Always 0
    pub export_address_table_jumps: DataDirectory,
    /// Always 0 for images that are not precompiled
    pub managed_native_header: DataDirectory,
}

impl Cor20Header {
    /// Read a CLI header from a sequence of bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the data is shorter than 72 bytes, the size
    /// field is too small, or the metadata directory is empty
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < COR20_HEADER_SIZE {
            return Err(bad_image_error!(
                "CLI header of {} bytes is shorter than {}",
                data.len(),
                COR20_HEADER_SIZE
            ));
        }

        let mut parser = Parser::new(data);

        let cb = parser.read_le::<u32>()?;
        if (cb as usize) < COR20_HEADER_SIZE {
            return Err(bad_image_error!("Invalid CLI header size - {}", cb));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;
        let metadata = DataDirectory::read(&mut parser)?;
        if metadata.is_empty() {
            return Err(bad_image_error!("CLI header has no metadata directory"));
        }

        let flags = CorFlags::from_bits_retain(parser.read_le::<u32>()?);
        let entry_point = parser.read_le::<u32>()?;

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            metadata,
            flags,
            entry_point,
            resources: DataDirectory::read(&mut parser)?,
            strong_name_signature: DataDirectory::read(&mut parser)?,
            code_manager_table: DataDirectory::read(&mut parser)?,
            vtable_fixups: DataDirectory::read(&mut parser)?,
            export_address_table_jumps: DataDirectory::read(&mut parser)?,
            managed_native_header: DataDirectory::read(&mut parser)?,
        })
    }

    /// The managed entry point, `None` if there is none or it is native
    #[must_use]
    pub fn entry_point_token(&self) -> Option<Token> {
        if self.flags.contains(CorFlags::NATIVE_ENTRYPOINT) || self.entry_point == 0 {
            None
        } else {
            Some(Token::new(self.entry_point))
        }
    }
}
