//! CIL method bodies.
//!
//! A method body starts with either a 1 byte tiny header or a 12 byte fat header, followed by the
//! IL code and, for fat headers, optional data sections holding exception clauses. The IL itself
//! is handed out as raw bytes; instruction decoding is not part of this crate.
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 25.4 - Method Header Format

use bitflags::bitflags;

use crate::{
    file::parser::Parser,
    metadata::{handles::StandAloneSigHandle, token::Token},
    Result,
};

bitflags! {
    /// Flags of the first byte (tiny) or the first word (fat) of a method header
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodBodyFlags: u16 {
        /// Tiny method header format
        const TINY_FORMAT = 0x2;
        /// Fat method header format
        const FAT_FORMAT = 0x3;
        /// More data sections follow the code
        const MORE_SECTS = 0x8;
        /// Locals are zero initialized
        const INIT_LOCALS = 0x10;
    }
}

bitflags! {
    /// Flags of an extra data section
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u8 {
        /// The section holds exception clauses
        const EHTABLE = 0x1;
        /// Reserved, shall be 0
        const OPT_ILTABLE = 0x2;
        /// The section uses the fat clause layout
        const FAT_FORMAT = 0x40;
        /// Another section follows
        const MORE_SECTS = 0x80;
    }
}

bitflags! {
    /// Kind of an exception clause
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExceptionHandlerFlags: u16 {
        /// A typed catch clause
        const EXCEPTION = 0x0000;
        /// A filter and its handler
        const FILTER = 0x0001;
        /// A finally clause
        const FINALLY = 0x0002;
        /// A fault clause
        const FAULT = 0x0004;
    }
}

/// One exception clause of a method body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Kind of the clause
    pub flags: ExceptionHandlerFlags,
    /// Offset in bytes of the try block from the start of the code
    pub try_offset: u32,
    /// Length in bytes of the try block
    pub try_length: u32,
    /// Offset of the handler from the start of the code
    pub handler_offset: u32,
    /// Length in bytes of the handler
    pub handler_length: u32,
    /// Catch type token for typed clauses, filter offset for filters
    pub class_token_or_filter_offset: u32,
}

impl ExceptionHandler {
    /// The caught type for typed catch clauses
    #[must_use]
    pub fn catch_type(&self) -> Option<Token> {
        if self.flags == ExceptionHandlerFlags::EXCEPTION && self.class_token_or_filter_offset != 0
        {
            Some(Token::new(self.class_token_or_filter_offset))
        } else {
            None
        }
    }

    /// The filter offset for filter clauses
    #[must_use]
    pub fn filter_offset(&self) -> Option<u32> {
        self.flags
            .contains(ExceptionHandlerFlags::FILTER)
            .then_some(self.class_token_or_filter_offset)
    }
}

/// A decoded method body
#[derive(Debug, Clone)]
pub struct MethodBody<'a> {
    /// Size of the header in bytes
    pub size_header: usize,
    /// Maximum number of items on the operand stack. Tiny headers imply 8.
    pub max_stack: u16,
    /// `StandAloneSig` describing the locals, nil if there are none
    pub local_signature: StandAloneSigHandle,
    /// True for a fat header
    pub is_fat: bool,
    /// True if locals are zero initialized
    pub is_init_local: bool,
    /// The IL code
    pub code: &'a [u8],
    /// All exception clauses, in section order
    pub exception_handlers: Vec<ExceptionHandler>,
}

impl<'a> MethodBody<'a> {
    /// Decode the method body at the start of `data`.
    ///
    /// `data` may extend past the end of the body.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the header is neither tiny nor fat, and
    /// [`crate::Error::OutOfRange`] if the code or a data section is truncated
    pub fn read(data: &'a [u8]) -> Result<MethodBody<'a>> {
        let mut parser = Parser::new(data);
        let first_byte = parser.peek_byte()?;

        match MethodBodyFlags::from_bits_truncate(u16::from(first_byte & 0b11)) {
            MethodBodyFlags::TINY_FORMAT => {
                parser.advance_by(1)?;
                let code = parser.read_bytes(usize::from(first_byte >> 2))?;

                Ok(MethodBody {
                    size_header: 1,
                    max_stack: 8,
                    local_signature: StandAloneSigHandle::NIL,
                    is_fat: false,
                    is_init_local: false,
                    code,
                    exception_handlers: Vec::new(),
                })
            }
            MethodBodyFlags::FAT_FORMAT => {
                let first_duo = parser.read_le::<u16>()?;
                let size_header = usize::from(first_duo >> 12) * 4;
                let flags = MethodBodyFlags::from_bits_truncate(first_duo & 0x0FFF);
                let max_stack = parser.read_le::<u16>()?;
                let size_code = parser.read_le::<u32>()? as usize;
                let local_signature = parser.read_le::<u32>()?;

                if size_header < 12 {
                    return Err(bad_image_error!(
                        "Fat method header of {} bytes is too small",
                        size_header
                    ));
                }

                parser.seek(size_header)?;
                let code = parser.read_bytes(size_code)?;

                let exception_handlers = if flags.contains(MethodBodyFlags::MORE_SECTS) {
                    parser.align(4)?;
                    Self::read_sections(&mut parser)?
                } else {
                    Vec::new()
                };

                Ok(MethodBody {
                    size_header,
                    max_stack,
                    local_signature: StandAloneSigHandle::new(local_signature),
                    is_fat: true,
                    is_init_local: flags.contains(MethodBodyFlags::INIT_LOCALS),
                    code,
                    exception_handlers,
                })
            }
            _ => Err(bad_image_error!(
                "Method header is neither fat nor tiny - 0x{:02x}",
                first_byte
            )),
        }
    }

    // II.25.4.5, the extra sections currently only carry exception clauses
    fn read_sections(parser: &mut Parser<'a>) -> Result<Vec<ExceptionHandler>> {
        let mut handlers = Vec::new();

        loop {
            let section = SectionFlags::from_bits_truncate(parser.read_le::<u8>()?);
            if !section.contains(SectionFlags::EHTABLE) {
                break;
            }

            if section.contains(SectionFlags::FAT_FORMAT) {
                let size_bytes = parser.read_bytes(3)?;
                let size = u32::from_le_bytes([size_bytes[0], size_bytes[1], size_bytes[2], 0]);

                for _ in 0..size.saturating_sub(4) / 24 {
                    #[allow(clippy::cast_possible_truncation)]
                    let flags = ExceptionHandlerFlags::from_bits_truncate(
                        parser.read_le::<u32>()? as u16,
                    );
                    handlers.push(ExceptionHandler {
                        flags,
                        try_offset: parser.read_le::<u32>()?,
                        try_length: parser.read_le::<u32>()?,
                        handler_offset: parser.read_le::<u32>()?,
                        handler_length: parser.read_le::<u32>()?,
                        class_token_or_filter_offset: parser.read_le::<u32>()?,
                    });
                }
            } else {
                let size = parser.read_le::<u8>()?;
                parser.advance_by(2)?;

                for _ in 0..u32::from(size).saturating_sub(4) / 12 {
                    handlers.push(ExceptionHandler {
                        flags: ExceptionHandlerFlags::from_bits_truncate(
                            parser.read_le::<u16>()?,
                        ),
                        try_offset: u32::from(parser.read_le::<u16>()?),
                        try_length: u32::from(parser.read_le::<u8>()?),
                        handler_offset: u32::from(parser.read_le::<u16>()?),
                        handler_length: u32::from(parser.read_le::<u8>()?),
                        class_token_or_filter_offset: parser.read_le::<u32>()?,
                    });
                }
            }

            if !section.contains(SectionFlags::MORE_SECTS) {
                break;
            }
            parser.align(4)?;
        }

        Ok(handlers)
    }

    /// Size of the code in bytes
    #[must_use]
    pub fn size_code(&self) -> usize {
        self.code.len()
    }

    /// Size of header and code, excluding extra sections
    #[must_use]
    pub fn size(&self) -> usize {
        self.size_header + self.code.len()
    }
}
