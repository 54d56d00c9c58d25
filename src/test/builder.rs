//! Synthetic image construction for tests and benchmarks.
//!
//! Only depends on `std`, so the integration tests and the benchmark can include it with a
//! `#[path]` attribute. Tables are kept small, which lets every table and coded index column
//! be written with 2 bytes; heap columns follow the heap-size flags.

#![allow(dead_code)]

use std::collections::BTreeMap;

/// Table numbers used by the fixtures
pub mod table {
    pub const MODULE: u8 = 0x00;
    pub const TYPE_REF: u8 = 0x01;
    pub const TYPE_DEF: u8 = 0x02;
    pub const FIELD_PTR: u8 = 0x03;
    pub const FIELD: u8 = 0x04;
    pub const METHOD_PTR: u8 = 0x05;
    pub const METHOD_DEF: u8 = 0x06;
    pub const PARAM: u8 = 0x08;
    pub const INTERFACE_IMPL: u8 = 0x09;
    pub const MEMBER_REF: u8 = 0x0A;
    pub const CONSTANT: u8 = 0x0B;
    pub const CUSTOM_ATTRIBUTE: u8 = 0x0C;
    pub const FIELD_MARSHAL: u8 = 0x0D;
    pub const DECL_SECURITY: u8 = 0x0E;
    pub const CLASS_LAYOUT: u8 = 0x0F;
    pub const FIELD_LAYOUT: u8 = 0x10;
    pub const STANDALONE_SIG: u8 = 0x11;
    pub const EVENT_MAP: u8 = 0x12;
    pub const EVENT: u8 = 0x14;
    pub const PROPERTY_MAP: u8 = 0x15;
    pub const PROPERTY: u8 = 0x17;
    pub const METHOD_SEMANTICS: u8 = 0x18;
    pub const METHOD_IMPL: u8 = 0x19;
    pub const MODULE_REF: u8 = 0x1A;
    pub const TYPE_SPEC: u8 = 0x1B;
    pub const IMPL_MAP: u8 = 0x1C;
    pub const FIELD_RVA: u8 = 0x1D;
    pub const ENC_LOG: u8 = 0x1E;
    pub const ASSEMBLY: u8 = 0x20;
    pub const ASSEMBLY_REF: u8 = 0x23;
    pub const FILE: u8 = 0x26;
    pub const EXPORTED_TYPE: u8 = 0x27;
    pub const MANIFEST_RESOURCE: u8 = 0x28;
    pub const NESTED_CLASS: u8 = 0x29;
    pub const GENERIC_PARAM: u8 = 0x2A;
    pub const METHOD_SPEC: u8 = 0x2B;
    pub const GENERIC_PARAM_CONSTRAINT: u8 = 0x2C;
}

/// Sorted mask written by the C# compiler
pub const DEFAULT_SORTED: u64 = 0x0000_1600_3301_FA00;

/// A single column value of a synthetic row
#[derive(Debug, Clone, Copy)]
pub enum Cell {
    /// Fixed 2 byte value
    U16(u16),
    /// Fixed 4 byte value
    U32(u32),
    /// #Strings offset
    Str(u32),
    /// #GUID index
    Guid(u32),
    /// #Blob offset
    Blob(u32),
    /// Table or coded index (always 2 bytes in fixtures)
    Idx(u32),
}

/// Encode a coded index value
pub fn coded(row: u32, tag: u32, bits: u32) -> u32 {
    (row << bits) | tag
}

/// Builds a metadata root blob with the standard streams.
#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    version: String,
    table_stream: String,
    table_version: (u8, u8),
    heap_sizes: u8,
    sorted: Option<u64>,
    extra_valid: u64,
    strings: Vec<u8>,
    string_map: BTreeMap<String, u32>,
    user_strings: Vec<u8>,
    blobs: Vec<u8>,
    guids: Vec<u8>,
    tables: BTreeMap<u8, Vec<Vec<Cell>>>,
    extra_streams: Vec<(String, Vec<u8>)>,
    omit_streams: Vec<String>,
}

impl Default for MetadataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataBuilder {
    pub fn new() -> Self {
        MetadataBuilder {
            version: "v4.0.30319".to_string(),
            table_stream: "#~".to_string(),
            table_version: (2, 0),
            heap_sizes: 0,
            sorted: None,
            extra_valid: 0,
            strings: vec![0],
            string_map: BTreeMap::new(),
            user_strings: vec![0],
            blobs: vec![0],
            guids: Vec::new(),
            tables: BTreeMap::new(),
            extra_streams: Vec::new(),
            omit_streams: Vec::new(),
        }
    }

    /// Set the metadata version string
    pub fn version(&mut self, version: &str) -> &mut Self {
        self.version = version.to_string();
        self
    }

    /// Use `#-` instead of `#~`
    pub fn uncompressed(&mut self) -> &mut Self {
        self.table_stream = "#-".to_string();
        self
    }

    /// Set the table stream version
    pub fn table_version(&mut self, major: u8, minor: u8) -> &mut Self {
        self.table_version = (major, minor);
        self
    }

    /// Set the heap-size flag byte
    pub fn heap_sizes(&mut self, flags: u8) -> &mut Self {
        self.heap_sizes = flags;
        self
    }

    /// Override the sorted-tables mask
    pub fn sorted(&mut self, mask: u64) -> &mut Self {
        self.sorted = Some(mask);
        self
    }

    /// Mark tables present with zero rows
    pub fn valid_extra(&mut self, mask: u64) -> &mut Self {
        self.extra_valid |= mask;
        self
    }

    /// Append an additional raw stream
    pub fn stream(&mut self, name: &str, data: Vec<u8>) -> &mut Self {
        self.extra_streams.push((name.to_string(), data));
        self
    }

    /// Do not emit the named standard stream
    pub fn omit_stream(&mut self, name: &str) -> &mut Self {
        self.omit_streams.push(name.to_string());
        self
    }

    /// Intern a string, returning its #Strings offset
    pub fn string(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }
        if let Some(offset) = self.string_map.get(value) {
            return *offset;
        }

        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        self.string_map.insert(value.to_string(), offset);
        offset
    }

    /// Append a blob, returning its #Blob offset
    pub fn blob(&mut self, value: &[u8]) -> u32 {
        let offset = self.blobs.len() as u32;
        let mut encoded = compress_uint(value.len() as u32);
        encoded.extend_from_slice(value);
        self.blobs.extend_from_slice(&encoded);
        offset
    }

    /// Append a GUID, returning its 1-based #GUID index
    pub fn guid(&mut self, value: [u8; 16]) -> u32 {
        self.guids.extend_from_slice(&value);
        (self.guids.len() / 16) as u32
    }

    /// Append a user string, returning its #US offset
    pub fn user_string(&mut self, value: &str) -> u32 {
        let offset = self.user_strings.len() as u32;
        let units: Vec<u16> = value.encode_utf16().collect();
        let mut bytes = Vec::with_capacity(units.len() * 2 + 1);
        for unit in &units {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes.push(u8::from(units.iter().any(|unit| *unit >= 0x7F)));
        self.user_strings
            .extend_from_slice(&compress_uint(bytes.len() as u32));
        self.user_strings.extend_from_slice(&bytes);
        offset
    }

    /// Append a row to `table`, returning its 1-based row id
    pub fn row(&mut self, table: u8, cells: Vec<Cell>) -> u32 {
        let rows = self.tables.entry(table).or_default();
        rows.push(cells);
        rows.len() as u32
    }

    /// Number of rows currently in `table`
    pub fn rows(&self, table: u8) -> u32 {
        self.tables.get(&table).map_or(0, |rows| rows.len() as u32)
    }

    fn tables_stream(&self) -> Vec<u8> {
        let valid = self
            .tables
            .keys()
            .fold(self.extra_valid, |mask, table| mask | (1_u64 << table));
        let sorted = self.sorted.unwrap_or(DEFAULT_SORTED & valid);

        let mut out = Vec::new();
        out.extend_from_slice(&0_u32.to_le_bytes());
        out.push(self.table_version.0);
        out.push(self.table_version.1);
        out.push(self.heap_sizes);
        out.push(1);
        out.extend_from_slice(&valid.to_le_bytes());
        out.extend_from_slice(&sorted.to_le_bytes());
        for table in 0..64_u8 {
            if valid & (1_u64 << table) != 0 {
                out.extend_from_slice(&self.rows(table).to_le_bytes());
            }
        }
        if self.heap_sizes & 0x40 != 0 {
            out.extend_from_slice(&0_u32.to_le_bytes());
        }

        for rows in self.tables.values() {
            for row in rows {
                for cell in row {
                    match *cell {
                        Cell::U16(value) => out.extend_from_slice(&value.to_le_bytes()),
                        Cell::U32(value) => out.extend_from_slice(&value.to_le_bytes()),
                        Cell::Str(value) => self.heap_cell(&mut out, value, 0x01),
                        Cell::Guid(value) => self.heap_cell(&mut out, value, 0x02),
                        Cell::Blob(value) => self.heap_cell(&mut out, value, 0x04),
                        Cell::Idx(value) => out.extend_from_slice(&(value as u16).to_le_bytes()),
                    }
                }
            }
        }

        pad4(&mut out);
        out
    }

    fn heap_cell(&self, out: &mut Vec<u8>, value: u32, flag: u8) {
        if self.heap_sizes & flag != 0 {
            out.extend_from_slice(&value.to_le_bytes());
        } else {
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
    }

    /// Produce the metadata root blob
    pub fn build(&self) -> Vec<u8> {
        let mut streams: Vec<(String, Vec<u8>)> = Vec::new();
        streams.push((self.table_stream.clone(), self.tables_stream()));

        let mut strings = self.strings.clone();
        pad4(&mut strings);
        streams.push(("#Strings".to_string(), strings));

        let mut user_strings = self.user_strings.clone();
        pad4(&mut user_strings);
        streams.push(("#US".to_string(), user_strings));

        streams.push(("#GUID".to_string(), self.guids.clone()));

        let mut blobs = self.blobs.clone();
        pad4(&mut blobs);
        streams.push(("#Blob".to_string(), blobs));

        streams.retain(|(name, _)| !self.omit_streams.contains(name));
        streams.extend(self.extra_streams.iter().cloned());

        let mut version = self.version.as_bytes().to_vec();
        version.push(0);
        pad4(&mut version);

        let mut header_size = 16 + version.len() + 4;
        for (name, _) in &streams {
            header_size += 8 + padded_len(name.len() + 1);
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0x424A_5342_u32.to_le_bytes());
        out.extend_from_slice(&1_u16.to_le_bytes());
        out.extend_from_slice(&1_u16.to_le_bytes());
        out.extend_from_slice(&0_u32.to_le_bytes());
        out.extend_from_slice(&(version.len() as u32).to_le_bytes());
        out.extend_from_slice(&version);
        out.extend_from_slice(&0_u16.to_le_bytes());
        out.extend_from_slice(&(streams.len() as u16).to_le_bytes());

        let mut offset = header_size;
        for (name, data) in &streams {
            out.extend_from_slice(&(offset as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            let mut name = name.as_bytes().to_vec();
            name.push(0);
            pad4(&mut name);
            out.extend_from_slice(&name);
            offset += padded_len(data.len());
        }

        for (_, data) in &streams {
            out.extend_from_slice(data);
            pad4(&mut out);
        }

        out
    }
}

/// Builds a minimal PE32 or PE32+ image around a metadata blob.
///
/// Layout: headers in the first 0x200 bytes, one `.text` section at RVA 0x2000 holding the
/// CLI header, caller supplied data (method bodies, field data), the managed resources and
/// finally the metadata root.
#[derive(Debug, Clone)]
pub struct PeBuilder {
    pe32_plus: bool,
    machine: u16,
    flags: u32,
    entry_point: u32,
    data: Vec<u8>,
    resources: Vec<u8>,
    cli_directory_override: Option<(u32, u32)>,
}

impl Default for PeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// RVA of the `.text` section
pub const TEXT_RVA: u32 = 0x2000;
/// File offset of the `.text` section
pub const TEXT_OFFSET: u32 = 0x200;
/// RVA of the first caller supplied byte
pub const DATA_RVA: u32 = TEXT_RVA + 72;

impl PeBuilder {
    pub fn new() -> Self {
        PeBuilder {
            pe32_plus: false,
            machine: 0x014C,
            flags: 0x0000_0001,
            entry_point: 0,
            data: Vec::new(),
            resources: Vec::new(),
            cli_directory_override: None,
        }
    }

    /// Produce a PE32+ image for AMD64
    pub fn pe32_plus(&mut self) -> &mut Self {
        self.pe32_plus = true;
        self.machine = 0x8664;
        self
    }

    /// Set the CLI header flags
    pub fn flags(&mut self, flags: u32) -> &mut Self {
        self.flags = flags;
        self
    }

    /// Set the CLI entry point token
    pub fn entry_point(&mut self, token: u32) -> &mut Self {
        self.entry_point = token;
        self
    }

    /// Override the CLI header directory entry
    pub fn cli_directory(&mut self, rva: u32, size: u32) -> &mut Self {
        self.cli_directory_override = Some((rva, size));
        self
    }

    /// Append raw data to the section, 4-byte aligned, returning its RVA
    pub fn add_data(&mut self, bytes: &[u8]) -> u32 {
        pad4(&mut self.data);
        let rva = DATA_RVA + self.data.len() as u32;
        self.data.extend_from_slice(bytes);
        rva
    }

    /// Append a managed resource, returning its offset in the resource directory
    pub fn add_resource(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.resources.len() as u32;
        self.resources
            .extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.resources.extend_from_slice(bytes);
        pad4(&mut self.resources);
        offset
    }

    /// Produce the image
    pub fn build(&self, metadata: &[u8]) -> Vec<u8> {
        let mut data = self.data.clone();
        pad4(&mut data);
        let resources_rva = DATA_RVA + data.len() as u32;
        let metadata_rva = resources_rva + self.resources.len() as u32;

        let mut text = Vec::new();
        // CLI header
        text.extend_from_slice(&72_u32.to_le_bytes());
        text.extend_from_slice(&2_u16.to_le_bytes());
        text.extend_from_slice(&5_u16.to_le_bytes());
        text.extend_from_slice(&metadata_rva.to_le_bytes());
        text.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
        text.extend_from_slice(&self.flags.to_le_bytes());
        text.extend_from_slice(&self.entry_point.to_le_bytes());
        if self.resources.is_empty() {
            text.extend_from_slice(&[0; 8]);
        } else {
            text.extend_from_slice(&resources_rva.to_le_bytes());
            text.extend_from_slice(&(self.resources.len() as u32).to_le_bytes());
        }
        text.extend_from_slice(&[0; 40]);
        text.extend_from_slice(&data);
        text.extend_from_slice(&self.resources);
        text.extend_from_slice(metadata);
        let raw_size = padded_to(text.len(), 0x200);
        text.resize(raw_size, 0);

        let optional_size: u16 = if self.pe32_plus { 240 } else { 224 };
        let mut out = vec![0_u8; TEXT_OFFSET as usize];

        // DOS header
        out[0] = b'M';
        out[1] = b'Z';
        out[0x3C..0x40].copy_from_slice(&0x80_u32.to_le_bytes());

        let mut pe = Vec::new();
        pe.extend_from_slice(b"PE\0\0");
        // COFF header
        pe.extend_from_slice(&self.machine.to_le_bytes());
        pe.extend_from_slice(&1_u16.to_le_bytes());
        pe.extend_from_slice(&0_u32.to_le_bytes());
        pe.extend_from_slice(&0_u32.to_le_bytes());
        pe.extend_from_slice(&0_u32.to_le_bytes());
        pe.extend_from_slice(&optional_size.to_le_bytes());
        pe.extend_from_slice(&0x2102_u16.to_le_bytes());

        // Optional header, standard fields
        pe.extend_from_slice(&(if self.pe32_plus { 0x20B_u16 } else { 0x10B_u16 }).to_le_bytes());
        pe.push(8);
        pe.push(0);
        pe.extend_from_slice(&(raw_size as u32).to_le_bytes());
        pe.extend_from_slice(&0_u32.to_le_bytes());
        pe.extend_from_slice(&0_u32.to_le_bytes());
        pe.extend_from_slice(&0_u32.to_le_bytes());
        pe.extend_from_slice(&TEXT_RVA.to_le_bytes());
        if self.pe32_plus {
            pe.extend_from_slice(&0x1_8000_0000_u64.to_le_bytes());
        } else {
            pe.extend_from_slice(&0_u32.to_le_bytes());
            pe.extend_from_slice(&0x0040_0000_u32.to_le_bytes());
        }
        // Windows fields
        pe.extend_from_slice(&0x2000_u32.to_le_bytes());
        pe.extend_from_slice(&0x200_u32.to_le_bytes());
        pe.extend_from_slice(&4_u16.to_le_bytes());
        pe.extend_from_slice(&0_u16.to_le_bytes());
        pe.extend_from_slice(&0_u16.to_le_bytes());
        pe.extend_from_slice(&0_u16.to_le_bytes());
        pe.extend_from_slice(&4_u16.to_le_bytes());
        pe.extend_from_slice(&0_u16.to_le_bytes());
        pe.extend_from_slice(&0_u32.to_le_bytes());
        let image_size = TEXT_RVA + padded_to(raw_size, 0x2000) as u32;
        pe.extend_from_slice(&image_size.to_le_bytes());
        pe.extend_from_slice(&TEXT_OFFSET.to_le_bytes());
        pe.extend_from_slice(&0_u32.to_le_bytes());
        pe.extend_from_slice(&3_u16.to_le_bytes());
        pe.extend_from_slice(&0x8560_u16.to_le_bytes());
        for value in [0x10_0000_u64, 0x1000, 0x10_0000, 0x1000] {
            if self.pe32_plus {
                pe.extend_from_slice(&value.to_le_bytes());
            } else {
                pe.extend_from_slice(&(value as u32).to_le_bytes());
            }
        }
        pe.extend_from_slice(&0_u32.to_le_bytes());
        pe.extend_from_slice(&16_u32.to_le_bytes());

        // Data directories, the CLI header is entry 14
        let (cli_rva, cli_size) = self.cli_directory_override.unwrap_or((TEXT_RVA, 72));
        for index in 0..16 {
            if index == 14 {
                pe.extend_from_slice(&cli_rva.to_le_bytes());
                pe.extend_from_slice(&cli_size.to_le_bytes());
            } else {
                pe.extend_from_slice(&[0; 8]);
            }
        }

        // Section table
        pe.extend_from_slice(b".text\0\0\0");
        pe.extend_from_slice(&(text.len() as u32).to_le_bytes());
        pe.extend_from_slice(&TEXT_RVA.to_le_bytes());
        pe.extend_from_slice(&(raw_size as u32).to_le_bytes());
        pe.extend_from_slice(&TEXT_OFFSET.to_le_bytes());
        pe.extend_from_slice(&[0; 12]);
        pe.extend_from_slice(&0x6000_0020_u32.to_le_bytes());

        out[0x80..0x80 + pe.len()].copy_from_slice(&pe);
        out.extend_from_slice(&text);
        out
    }
}

/// ECMA-335 compressed unsigned integer
pub fn compress_uint(value: u32) -> Vec<u8> {
    if value < 0x80 {
        vec![value as u8]
    } else if value < 0x4000 {
        vec![0x80 | (value >> 8) as u8, value as u8]
    } else {
        vec![
            0xC0 | (value >> 24) as u8,
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ]
    }
}

/// Custom attribute blob with a single string fixed argument
pub fn string_attribute_blob(value: &str) -> Vec<u8> {
    let mut blob = vec![0x01, 0x00];
    blob.extend_from_slice(&compress_uint(value.len() as u32));
    blob.extend_from_slice(value.as_bytes());
    blob.extend_from_slice(&[0x00, 0x00]);
    blob
}

fn padded_len(len: usize) -> usize {
    padded_to(len, 4)
}

fn padded_to(len: usize, alignment: usize) -> usize {
    len.div_ceil(alignment) * alignment
}

fn pad4(data: &mut Vec<u8>) {
    let len = padded_len(data.len());
    data.resize(len, 0);
}

/// A small but complete assembly used across the test-suites.
///
/// Types (TypeDef rows):
/// 1. `<Module>`
/// 2. `N.C` : public class, extends `System.Object`, no members
/// 3. `N.Outer` : one field `count`, one method `Run(int32 value)` with a tiny body
/// 4. `Inner` : nested in `N.Outer`
/// 5. `N.IFoo` : interface implemented by `N.Outer`
///
/// Custom attributes: `InternalsVisibleTo("Friend")`,
/// `InternalsVisibleTo("Signed, PublicKey=0024...")`, an unparsable
/// `InternalsVisibleTo("")`, and `TypeIdentifier` on `N.IFoo`.
pub struct SampleAssembly {
    pub metadata: MetadataBuilder,
    pub pe: PeBuilder,
}

impl SampleAssembly {
    pub fn new() -> Self {
        let mut md = MetadataBuilder::new();
        let mut pe = PeBuilder::new();

        // Method body: ldarg.1; pop; ret
        let body_rva = pe.add_data(&[(3 << 2) | 0x02, 0x03, 0x26, 0x2A]);

        let module_name = md.string("Sample.dll");
        let mvid = md.guid([
            0x4C, 0x65, 0x7F, 0x1A, 0x33, 0x0E, 0x4B, 0x58, 0x9F, 0x7A, 0x10, 0x22, 0x3E, 0x05,
            0x90, 0xAB,
        ]);
        md.row(
            table::MODULE,
            vec![Cell::U16(0), Cell::Str(module_name), Cell::Guid(mvid), Cell::Guid(0), Cell::Guid(0)],
        );

        // AssemblyRef 1: System.Runtime
        let runtime_name = md.string("System.Runtime");
        let runtime_token = md.blob(&[0xB0, 0x3F, 0x5F, 0x7F, 0x11, 0xD5, 0x0A, 0x3A]);
        md.row(
            table::ASSEMBLY_REF,
            vec![
                Cell::U16(8),
                Cell::U16(0),
                Cell::U16(0),
                Cell::U16(0),
                Cell::U32(0),
                Cell::Blob(runtime_token),
                Cell::Str(runtime_name),
                Cell::Str(0),
                Cell::Blob(0),
            ],
        );

        // TypeRefs: ResolutionScope tag 2 = AssemblyRef
        let system = md.string("System");
        let object = md.string("Object");
        md.row(
            table::TYPE_REF,
            vec![Cell::Idx(coded(1, 2, 2)), Cell::Str(object), Cell::Str(system)],
        );
        let compiler_services = md.string("System.Runtime.CompilerServices");
        let ivt = md.string("InternalsVisibleToAttribute");
        md.row(
            table::TYPE_REF,
            vec![Cell::Idx(coded(1, 2, 2)), Cell::Str(ivt), Cell::Str(compiler_services)],
        );
        let interop = md.string("System.Runtime.InteropServices");
        let type_identifier = md.string("TypeIdentifierAttribute");
        md.row(
            table::TYPE_REF,
            vec![Cell::Idx(coded(1, 2, 2)), Cell::Str(type_identifier), Cell::Str(interop)],
        );

        // TypeDefs: Extends is TypeDefOrRef (tag 1 = TypeRef)
        let namespace = md.string("N");
        let module_type = md.string("<Module>");
        md.row(
            table::TYPE_DEF,
            vec![
                Cell::U32(0),
                Cell::Str(module_type),
                Cell::Str(0),
                Cell::Idx(0),
                Cell::Idx(1),
                Cell::Idx(1),
            ],
        );
        let class_c = md.string("C");
        md.row(
            table::TYPE_DEF,
            vec![
                Cell::U32(0x0010_0001),
                Cell::Str(class_c),
                Cell::Str(namespace),
                Cell::Idx(coded(1, 1, 2)),
                Cell::Idx(1),
                Cell::Idx(1),
            ],
        );
        let outer = md.string("Outer");
        md.row(
            table::TYPE_DEF,
            vec![
                Cell::U32(0x0010_0001),
                Cell::Str(outer),
                Cell::Str(namespace),
                Cell::Idx(coded(1, 1, 2)),
                Cell::Idx(1),
                Cell::Idx(1),
            ],
        );
        let inner = md.string("Inner");
        md.row(
            table::TYPE_DEF,
            vec![
                Cell::U32(0x0010_0002),
                Cell::Str(inner),
                Cell::Str(0),
                Cell::Idx(coded(1, 1, 2)),
                Cell::Idx(2),
                Cell::Idx(2),
            ],
        );
        let ifoo = md.string("IFoo");
        md.row(
            table::TYPE_DEF,
            vec![
                Cell::U32(0x0000_00A1),
                Cell::Str(ifoo),
                Cell::Str(namespace),
                Cell::Idx(0),
                Cell::Idx(2),
                Cell::Idx(2),
            ],
        );

        // Field 1: int32 count
        let count = md.string("count");
        let field_sig = md.blob(&[0x06, 0x08]);
        md.row(
            table::FIELD,
            vec![Cell::U16(0x0001), Cell::Str(count), Cell::Blob(field_sig)],
        );

        // MethodDef 1: void Run(int32 value)
        let run = md.string("Run");
        let method_sig = md.blob(&[0x20, 0x01, 0x01, 0x08]);
        md.row(
            table::METHOD_DEF,
            vec![
                Cell::U32(body_rva),
                Cell::U16(0),
                Cell::U16(0x0086),
                Cell::Str(run),
                Cell::Blob(method_sig),
                Cell::Idx(1),
            ],
        );

        let value = md.string("value");
        md.row(
            table::PARAM,
            vec![Cell::U16(0), Cell::U16(1), Cell::Str(value)],
        );

        // N.Outer implements N.IFoo
        md.row(
            table::INTERFACE_IMPL,
            vec![Cell::Idx(3), Cell::Idx(coded(5, 0, 2))],
        );

        // Constructors: MemberRef parent is MemberRefParent (tag 1 = TypeRef)
        let ctor = md.string(".ctor");
        let ctor_string_sig = md.blob(&[0x20, 0x01, 0x01, 0x0E]);
        let ctor_void_sig = md.blob(&[0x20, 0x00, 0x01]);
        md.row(
            table::MEMBER_REF,
            vec![Cell::Idx(coded(2, 1, 3)), Cell::Str(ctor), Cell::Blob(ctor_string_sig)],
        );
        md.row(
            table::MEMBER_REF,
            vec![Cell::Idx(coded(3, 1, 3)), Cell::Str(ctor), Cell::Blob(ctor_void_sig)],
        );

        // Assembly row
        let assembly_name = md.string("Sample");
        md.row(
            table::ASSEMBLY,
            vec![
                Cell::U32(0x8004),
                Cell::U16(1),
                Cell::U16(2),
                Cell::U16(3),
                Cell::U16(4),
                Cell::U32(0),
                Cell::Blob(0),
                Cell::Str(assembly_name),
                Cell::Str(0),
            ],
        );

        // Custom attributes, sorted by parent (HasCustomAttribute, 5 bits)
        let friend = md.blob(&string_attribute_blob("Friend"));
        let signed = md.blob(&string_attribute_blob(
            "Signed, PublicKey=0024000004800000940000000602000000240000525341310004000001000100",
        ));
        let broken = md.blob(&string_attribute_blob(""));
        let empty_args = md.blob(&[0x01, 0x00, 0x00, 0x00]);
        // Assembly 1 (tag 14)
        for blob in [friend, signed, broken] {
            md.row(
                table::CUSTOM_ATTRIBUTE,
                vec![Cell::Idx(coded(1, 14, 5)), Cell::Idx(coded(1, 3, 3)), Cell::Blob(blob)],
            );
        }
        // TypeDef 5 (tag 3)
        md.row(
            table::CUSTOM_ATTRIBUTE,
            vec![Cell::Idx(coded(5, 3, 5)), Cell::Idx(coded(2, 3, 3)), Cell::Blob(empty_args)],
        );

        // Inner is nested in Outer
        md.row(table::NESTED_CLASS, vec![Cell::Idx(4), Cell::Idx(3)]);

        SampleAssembly { metadata: md, pe }
    }

    /// Build the PE image
    pub fn image(&self) -> Vec<u8> {
        self.pe.build(&self.metadata.build())
    }
}

impl Default for SampleAssembly {
    fn default() -> Self {
        Self::new()
    }
}
