//! PE/COFF header parsing.
//!
//! Reads the DOS header, the `PE\0\0` signature, the COFF file header, the optional header
//! (PE32 or PE32+) with its data directories, and the section table. Only the fields a
//! managed image reader needs are interpreted; the rest are kept verbatim.
//!
//! Any signature or size mismatch fails with [`crate::Error::BadImageFormat`].

use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::{
    file::{parser::Parser, section::SectionTable},
    Result,
};

/// `MZ`
pub const DOS_SIGNATURE: u16 = 0x5A4D;
/// `PE\0\0`
pub const PE_SIGNATURE: u32 = 0x0000_4550;
/// Optional header magic of 32-bit images
pub const PE32_MAGIC: u16 = 0x010B;
/// Optional header magic of 64-bit images
pub const PE32_PLUS_MAGIC: u16 = 0x020B;

const DOS_HEADER_SIZE: usize = 0x40;
const COFF_HEADER_SIZE: usize = 20;
const PE32_FIXED_SIZE: usize = 96;
const PE32_PLUS_FIXED_SIZE: usize = 112;

/// The data directories of the optional header, in on-disk order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
#[allow(missing_docs)]
pub enum DataDirectoryType {
    ExportTable = 0,
    ImportTable = 1,
    ResourceTable = 2,
    ExceptionTable = 3,
    CertificateTable = 4,
    BaseRelocationTable = 5,
    Debug = 6,
    Architecture = 7,
    GlobalPtr = 8,
    TlsTable = 9,
    LoadConfigTable = 10,
    BoundImport = 11,
    ImportAddressTable = 12,
    DelayImportDescriptor = 13,
    ClrRuntimeHeader = 14,
    Reserved = 15,
}

/// An (RVA, size) pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDirectory {
    /// RVA of the first byte
    pub virtual_address: u32,
    /// Size in bytes
    pub size: u32,
}

impl DataDirectory {
    /// Read a directory entry at the current position of `parser`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if fewer than 8 bytes remain.
    pub fn read(parser: &mut Parser) -> Result<DataDirectory> {
        Ok(DataDirectory {
            virtual_address: parser.read_le::<u32>()?,
            size: parser.read_le::<u32>()?,
        })
    }

    /// True if the entry is unused
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.virtual_address == 0 || self.size == 0
    }
}

/// The parts of the DOS header that matter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosHeader {
    /// `MZ`
    pub signature: u16,
    /// File offset of the PE signature (`e_lfanew`)
    pub pe_pointer: u32,
}

/// The COFF file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct CoffHeader {
    pub machine: u16,
    pub number_of_sections: u16,
    pub time_date_stamp: u32,
    pub pointer_to_symbol_table: u32,
    pub number_of_symbols: u32,
    pub size_of_optional_header: u16,
    pub characteristics: u16,
}

/// The optional header. PE32 and PE32+ share this representation; the 32-bit variant widens
/// its address-sized fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct OptionalHeader {
    pub magic: u16,
    pub major_linker_version: u8,
    pub minor_linker_version: u8,
    pub size_of_code: u32,
    pub size_of_initialized_data: u32,
    pub size_of_uninitialized_data: u32,
    pub address_of_entry_point: u32,
    pub base_of_code: u32,
    /// Only present in PE32 images
    pub base_of_data: Option<u32>,
    pub image_base: u64,
    pub section_alignment: u32,
    pub file_alignment: u32,
    pub major_operating_system_version: u16,
    pub minor_operating_system_version: u16,
    pub major_image_version: u16,
    pub minor_image_version: u16,
    pub major_subsystem_version: u16,
    pub minor_subsystem_version: u16,
    pub win32_version_value: u32,
    pub size_of_image: u32,
    pub size_of_headers: u32,
    pub check_sum: u32,
    pub subsystem: u16,
    pub dll_characteristics: u16,
    pub size_of_stack_reserve: u64,
    pub size_of_stack_commit: u64,
    pub size_of_heap_reserve: u64,
    pub size_of_heap_commit: u64,
    pub loader_flags: u32,
    pub number_of_rva_and_sizes: u32,
    /// All 16 directory entries; entries past `number_of_rva_and_sizes` are empty
    pub data_directories: [DataDirectory; DataDirectoryType::COUNT],
}

impl OptionalHeader {
    /// True for PE32+ images
    #[must_use]
    pub fn is_pe32_plus(&self) -> bool {
        self.magic == PE32_PLUS_MAGIC
    }

    /// The directory entry of `kind`
    #[must_use]
    pub fn directory(&self, kind: DataDirectoryType) -> DataDirectory {
        self.data_directories[kind as usize]
    }

    fn read(parser: &mut Parser, size: usize) -> Result<OptionalHeader> {
        let magic = parser.read_le::<u16>()?;
        let fixed_size = match magic {
            PE32_MAGIC => PE32_FIXED_SIZE,
            PE32_PLUS_MAGIC => PE32_PLUS_FIXED_SIZE,
            _ => return Err(bad_image_error!("Invalid optional header magic - 0x{:04x}", magic)),
        };
        if size < fixed_size {
            return Err(bad_image_error!(
                "Optional header size {} is smaller than the {} bytes required",
                size,
                fixed_size
            ));
        }
        let pe32_plus = magic == PE32_PLUS_MAGIC;

        let major_linker_version = parser.read_le::<u8>()?;
        let minor_linker_version = parser.read_le::<u8>()?;
        let size_of_code = parser.read_le::<u32>()?;
        let size_of_initialized_data = parser.read_le::<u32>()?;
        let size_of_uninitialized_data = parser.read_le::<u32>()?;
        let address_of_entry_point = parser.read_le::<u32>()?;
        let base_of_code = parser.read_le::<u32>()?;
        let base_of_data = if pe32_plus {
            None
        } else {
            Some(parser.read_le::<u32>()?)
        };
        let image_base = read_address(parser, pe32_plus)?;
        let section_alignment = parser.read_le::<u32>()?;
        let file_alignment = parser.read_le::<u32>()?;
        let major_operating_system_version = parser.read_le::<u16>()?;
        let minor_operating_system_version = parser.read_le::<u16>()?;
        let major_image_version = parser.read_le::<u16>()?;
        let minor_image_version = parser.read_le::<u16>()?;
        let major_subsystem_version = parser.read_le::<u16>()?;
        let minor_subsystem_version = parser.read_le::<u16>()?;
        let win32_version_value = parser.read_le::<u32>()?;
        let size_of_image = parser.read_le::<u32>()?;
        let size_of_headers = parser.read_le::<u32>()?;
        let check_sum = parser.read_le::<u32>()?;
        let subsystem = parser.read_le::<u16>()?;
        let dll_characteristics = parser.read_le::<u16>()?;
        let size_of_stack_reserve = read_address(parser, pe32_plus)?;
        let size_of_stack_commit = read_address(parser, pe32_plus)?;
        let size_of_heap_reserve = read_address(parser, pe32_plus)?;
        let size_of_heap_commit = read_address(parser, pe32_plus)?;
        let loader_flags = parser.read_le::<u32>()?;
        let number_of_rva_and_sizes = parser.read_le::<u32>()?;

        let present = (number_of_rva_and_sizes as usize).min(DataDirectoryType::COUNT);
        if size < fixed_size + present * 8 {
            return Err(bad_image_error!(
                "Optional header size {} cannot hold {} directory entries",
                size,
                present
            ));
        }

        let mut data_directories = [DataDirectory::default(); DataDirectoryType::COUNT];
        for entry in data_directories.iter_mut().take(present) {
            *entry = DataDirectory::read(parser)?;
        }

        Ok(OptionalHeader {
            magic,
            major_linker_version,
            minor_linker_version,
            size_of_code,
            size_of_initialized_data,
            size_of_uninitialized_data,
            address_of_entry_point,
            base_of_code,
            base_of_data,
            image_base,
            section_alignment,
            file_alignment,
            major_operating_system_version,
            minor_operating_system_version,
            major_image_version,
            minor_image_version,
            major_subsystem_version,
            minor_subsystem_version,
            win32_version_value,
            size_of_image,
            size_of_headers,
            check_sum,
            subsystem,
            dll_characteristics,
            size_of_stack_reserve,
            size_of_stack_commit,
            size_of_heap_reserve,
            size_of_heap_commit,
            loader_flags,
            number_of_rva_and_sizes,
            data_directories,
        })
    }
}

fn read_address(parser: &mut Parser, pe32_plus: bool) -> Result<u64> {
    if pe32_plus {
        parser.read_le::<u64>()
    } else {
        Ok(u64::from(parser.read_le::<u32>()?))
    }
}

/// All headers of a PE image
#[derive(Debug, Clone)]
pub struct PeHeaders {
    /// DOS header
    pub dos_header: DosHeader,
    /// COFF file header
    pub coff_header: CoffHeader,
    /// Optional header
    pub optional_header: OptionalHeader,
    /// Section table
    pub sections: SectionTable,
}

impl PeHeaders {
    /// Parse the headers of the image in `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] on any signature or size mismatch.
    pub fn parse(data: &[u8]) -> Result<PeHeaders> {
        if data.len() < DOS_HEADER_SIZE {
            return Err(bad_image_error!(
                "Image of {} bytes is too small for a DOS header",
                data.len()
            ));
        }

        let mut parser = Parser::new(data);
        let signature = parser.read_le::<u16>()?;
        if signature != DOS_SIGNATURE {
            return Err(bad_image_error!("Invalid DOS signature - 0x{:04x}", signature));
        }

        parser.seek(0x3C)?;
        let pe_pointer = parser.read_le::<u32>()?;
        let dos_header = DosHeader {
            signature,
            pe_pointer,
        };

        let pe_offset = pe_pointer as usize;
        if pe_offset
            .checked_add(4 + COFF_HEADER_SIZE)
            .map_or(true, |end| end > data.len())
        {
            return Err(bad_image_error!(
                "PE header offset 0x{:x} lies outside of the image",
                pe_offset
            ));
        }

        parser.seek(pe_offset)?;
        let pe_signature = parser.read_le::<u32>()?;
        if pe_signature != PE_SIGNATURE {
            return Err(bad_image_error!("Invalid PE signature - 0x{:08x}", pe_signature));
        }

        let coff_header = CoffHeader {
            machine: parser.read_le::<u16>()?,
            number_of_sections: parser.read_le::<u16>()?,
            time_date_stamp: parser.read_le::<u32>()?,
            pointer_to_symbol_table: parser.read_le::<u32>()?,
            number_of_symbols: parser.read_le::<u32>()?,
            size_of_optional_header: parser.read_le::<u16>()?,
            characteristics: parser.read_le::<u16>()?,
        };

        let optional_offset = parser.pos();
        let optional_size = usize::from(coff_header.size_of_optional_header);
        if optional_offset + optional_size > data.len() {
            return Err(bad_image_error!(
                "Optional header of {} bytes exceeds the image",
                optional_size
            ));
        }

        let mut optional_parser = Parser::new(&data[optional_offset..optional_offset + optional_size]);
        let optional_header = OptionalHeader::read(&mut optional_parser, optional_size)
            .map_err(|error| match error {
                crate::Error::OutOfRange => bad_image_error!("Truncated optional header"),
                other => other,
            })?;

        let sections = SectionTable::read(
            data,
            optional_offset + optional_size,
            usize::from(coff_header.number_of_sections),
        )?;

        tracing::debug!(
            machine = coff_header.machine,
            pe32_plus = optional_header.is_pe32_plus(),
            sections = sections.len(),
            "parsed PE headers"
        );

        Ok(PeHeaders {
            dos_header,
            coff_header,
            optional_header,
            sections,
        })
    }

    /// The directory entry of `kind`
    #[must_use]
    pub fn directory(&self, kind: DataDirectoryType) -> DataDirectory {
        self.optional_header.directory(kind)
    }

    /// Iterate all directory entries with their kind
    pub fn directories(&self) -> impl Iterator<Item = (DataDirectoryType, DataDirectory)> + '_ {
        DataDirectoryType::iter().map(|kind| (kind, self.directory(kind)))
    }

    /// Translate `rva` into a file offset.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if no section contains `rva`.
    pub fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        self.sections.rva_to_offset(rva)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test::builder::PeBuilder, Error};

    #[test]
    fn pe32() {
        let image = PeBuilder::new().build(&[0_u8; 16]);
        let headers = PeHeaders::parse(&image).unwrap();

        assert_eq!(headers.dos_header.pe_pointer, 0x80);
        assert_eq!(headers.coff_header.machine, 0x014C);
        assert_eq!(headers.coff_header.number_of_sections, 1);
        assert!(!headers.optional_header.is_pe32_plus());
        assert_eq!(headers.optional_header.base_of_data, Some(0));
        assert_eq!(headers.optional_header.image_base, 0x0040_0000);
        assert_eq!(headers.optional_header.size_of_stack_reserve, 0x10_0000);
        assert_eq!(headers.optional_header.number_of_rva_and_sizes, 16);

        let clr = headers.directory(DataDirectoryType::ClrRuntimeHeader);
        assert_eq!(clr.virtual_address, 0x2000);
        assert_eq!(clr.size, 72);
        assert!(headers.directory(DataDirectoryType::ImportTable).is_empty());
        assert_eq!(headers.directories().count(), 16);

        assert_eq!(headers.rva_to_offset(0x2000).unwrap(), 0x200);
    }

    #[test]
    fn pe32_plus() {
        let image = PeBuilder::new().pe32_plus().build(&[0_u8; 16]);
        let headers = PeHeaders::parse(&image).unwrap();

        assert_eq!(headers.coff_header.machine, 0x8664);
        assert!(headers.optional_header.is_pe32_plus());
        assert_eq!(headers.optional_header.base_of_data, None);
        assert_eq!(headers.optional_header.image_base, 0x1_8000_0000);
        assert_eq!(headers.optional_header.size_of_heap_commit, 0x1000);
        assert_eq!(
            headers
                .directory(DataDirectoryType::ClrRuntimeHeader)
                .virtual_address,
            0x2000
        );
    }

    #[test]
    fn bad_signatures() {
        let image = PeBuilder::new().build(&[0_u8; 16]);

        let mut bad_dos = image.clone();
        bad_dos[0] = b'X';
        assert!(matches!(
            PeHeaders::parse(&bad_dos),
            Err(Error::BadImageFormat { .. })
        ));

        let mut bad_pe = image.clone();
        bad_pe[0x81] = b'X';
        assert!(matches!(
            PeHeaders::parse(&bad_pe),
            Err(Error::BadImageFormat { .. })
        ));

        let mut bad_pointer = image.clone();
        bad_pointer[0x3C..0x40].copy_from_slice(&0xFFFF_FF00_u32.to_le_bytes());
        assert!(matches!(
            PeHeaders::parse(&bad_pointer),
            Err(Error::BadImageFormat { .. })
        ));

        let mut bad_magic = image;
        bad_magic[0x98] = 0x07;
        assert!(matches!(
            PeHeaders::parse(&bad_magic),
            Err(Error::BadImageFormat { .. })
        ));
    }

    #[test]
    fn truncated() {
        let image = PeBuilder::new().build(&[0_u8; 16]);

        assert!(matches!(
            PeHeaders::parse(&image[..0x20]),
            Err(Error::BadImageFormat { .. })
        ));
        assert!(matches!(
            PeHeaders::parse(&image[..0xA0]),
            Err(Error::BadImageFormat { .. })
        ));
        assert!(matches!(
            PeHeaders::parse(&image[..0x180]),
            Err(Error::BadImageFormat { .. })
        ));
    }

    #[test]
    fn short_optional_header() {
        let mut image = PeBuilder::new().build(&[0_u8; 16]);
        // size_of_optional_header lives at 0x80 + 4 + 16
        image[0x94..0x96].copy_from_slice(&100_u16.to_le_bytes());
        assert!(matches!(
            PeHeaders::parse(&image),
            Err(Error::BadImageFormat { .. })
        ));
    }
}
