//! Section table and RVA translation.
//!
//! Every RVA stored in a PE image or in its CLI metadata has to be translated into a file
//! offset through the section table before it can be read. [`SectionTable::rva_to_offset`]
//! performs that translation; an RVA that no section covers is a structural error.

use crate::{file::parser::Parser, Result};

/// Size of a single section header on disk
pub const SECTION_HEADER_SIZE: usize = 40;

/// A single entry of the section table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    /// Section name, NUL padded
    pub name: [u8; 8],
    /// Size of the section when loaded
    pub virtual_size: u32,
    /// RVA of the first byte of the section
    pub virtual_address: u32,
    /// Size of the initialized data on disk
    pub size_of_raw_data: u32,
    /// File offset of the initialized data
    pub pointer_to_raw_data: u32,
    /// File offset of the relocation entries
    pub pointer_to_relocations: u32,
    /// File offset of the line-number entries
    pub pointer_to_linenumbers: u32,
    /// Number of relocation entries
    pub number_of_relocations: u16,
    /// Number of line-number entries
    pub number_of_linenumbers: u16,
    /// Section characteristics
    pub characteristics: u32,
}

impl SectionHeader {
    /// Read a section header at the current position of `parser`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if fewer than 40 bytes remain.
    pub fn read(parser: &mut Parser) -> Result<SectionHeader> {
        let mut name = [0_u8; 8];
        name.copy_from_slice(parser.read_bytes(8)?);

        Ok(SectionHeader {
            name,
            virtual_size: parser.read_le::<u32>()?,
            virtual_address: parser.read_le::<u32>()?,
            size_of_raw_data: parser.read_le::<u32>()?,
            pointer_to_raw_data: parser.read_le::<u32>()?,
            pointer_to_relocations: parser.read_le::<u32>()?,
            pointer_to_linenumbers: parser.read_le::<u32>()?,
            number_of_relocations: parser.read_le::<u16>()?,
            number_of_linenumbers: parser.read_le::<u16>()?,
            characteristics: parser.read_le::<u32>()?,
        })
    }

    /// The section name with trailing NULs removed, if it is valid UTF-8
    #[must_use]
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.name)
            .ok()
            .map(|name| name.trim_end_matches('\0'))
    }

    /// Extent of the section in the virtual address space.
    ///
    /// Some linkers leave `virtual_size` at zero, in which case the raw size is used.
    #[must_use]
    pub fn virtual_extent(&self) -> u32 {
        if self.virtual_size == 0 {
            self.size_of_raw_data
        } else {
            self.virtual_size
        }
    }

    /// True if `rva` falls inside this section
    #[must_use]
    pub fn contains(&self, rva: u32) -> bool {
        rva >= self.virtual_address
            && u64::from(rva) < u64::from(self.virtual_address) + u64::from(self.virtual_extent())
    }
}

/// The section table of a PE image.
#[derive(Debug, Clone, Default)]
pub struct SectionTable {
    headers: Vec<SectionHeader>,
}

impl SectionTable {
    /// Read `count` section headers starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the table runs past the end of `data`.
    pub fn read(data: &[u8], offset: usize, count: usize) -> Result<SectionTable> {
        let end = count
            .checked_mul(SECTION_HEADER_SIZE)
            .and_then(|size| size.checked_add(offset));
        match end {
            Some(end) if end <= data.len() => {}
            _ => {
                return Err(bad_image_error!(
                    "Section table with {} entries at 0x{:x} exceeds image size {}",
                    count,
                    offset,
                    data.len()
                ))
            }
        }

        let mut parser = Parser::new(data);
        parser.seek(offset)?;

        let mut headers = Vec::with_capacity(count);
        for _ in 0..count {
            headers.push(SectionHeader::read(&mut parser)?);
        }

        Ok(SectionTable { headers })
    }

    /// Number of sections
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// True if the image has no sections
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Iterate the section headers in file order
    pub fn iter(&self) -> std::slice::Iter<'_, SectionHeader> {
        self.headers.iter()
    }

    /// The section covering `rva`, if any
    #[must_use]
    pub fn find(&self, rva: u32) -> Option<&SectionHeader> {
        self.headers.iter().find(|section| section.contains(rva))
    }

    /// The section named `name`, if any
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.headers
            .iter()
            .find(|section| section.name_str() == Some(name))
    }

    /// Translate `rva` into a file offset.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if no section contains `rva`, or if the RVA
    /// points into the zero-filled tail of a section that has no backing file data.
    pub fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        let Some(section) = self.find(rva) else {
            return Err(bad_image_error!(
                "RVA 0x{:08x} is not contained in any section",
                rva
            ));
        };

        let delta = rva - section.virtual_address;
        if delta >= section.size_of_raw_data {
            return Err(bad_image_error!(
                "RVA 0x{:08x} has no file backing in section {:?}",
                rva,
                section.name_str().unwrap_or_default()
            ));
        }

        Ok(section.pointer_to_raw_data as usize + delta as usize)
    }
}

impl<'a> IntoIterator for &'a SectionTable {
    type Item = &'a SectionHeader;
    type IntoIter = std::slice::Iter<'a, SectionHeader>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[rustfmt::skip]
    const SECTIONS: [u8; 80] = [
        // .text: VA 0x2000, vsize 0x1000, raw 0x800 @ 0x200
        b'.', b't', b'e', b'x', b't', 0x00, 0x00, 0x00,
        0x00, 0x10, 0x00, 0x00,
        0x00, 0x20, 0x00, 0x00,
        0x00, 0x08, 0x00, 0x00,
        0x00, 0x02, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x00,
        0x00, 0x00,
        0x20, 0x00, 0x00, 0x60,
        // .rsrc: VA 0x4000, vsize 0 (raw size used), raw 0x200 @ 0xA00
        b'.', b'r', b's', b'r', b'c', 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x40, 0x00, 0x00,
        0x00, 0x02, 0x00, 0x00,
        0x00, 0x0A, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x00,
        0x00, 0x00,
        0x40, 0x00, 0x00, 0x40,
    ];

    #[test]
    fn crafted() {
        let table = SectionTable::read(&SECTIONS, 0, 2).unwrap();
        assert_eq!(table.len(), 2);

        let text = table.by_name(".text").unwrap();
        assert_eq!(text.virtual_address, 0x2000);
        assert_eq!(text.virtual_size, 0x1000);
        assert_eq!(text.characteristics, 0x6000_0020);

        assert_eq!(table.rva_to_offset(0x2000).unwrap(), 0x200);
        assert_eq!(table.rva_to_offset(0x2208).unwrap(), 0x408);
        assert_eq!(table.rva_to_offset(0x41FF).unwrap(), 0xBFF);
    }

    #[test]
    fn outside_sections() {
        let table = SectionTable::read(&SECTIONS, 0, 2).unwrap();

        assert!(matches!(
            table.rva_to_offset(0x1FFF),
            Err(Error::BadImageFormat { .. })
        ));
        assert!(matches!(
            table.rva_to_offset(0x3000),
            Err(Error::BadImageFormat { .. })
        ));
        assert!(matches!(
            table.rva_to_offset(0x4200),
            Err(Error::BadImageFormat { .. })
        ));
        // Inside the virtual extent of .text but past its raw data
        assert!(matches!(
            table.rva_to_offset(0x2900),
            Err(Error::BadImageFormat { .. })
        ));
    }

    #[test]
    fn truncated() {
        assert!(matches!(
            SectionTable::read(&SECTIONS, 0, 3),
            Err(Error::BadImageFormat { .. })
        ));
        assert!(matches!(
            SectionTable::read(&SECTIONS, 50, 1),
            Err(Error::BadImageFormat { .. })
        ));
    }
}
