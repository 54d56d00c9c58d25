//! An opened module: the image bytes, the CLI header and a [`MetadataReader`] over them.
//!
//! [`Module`] owns the memory block of one image and lends it to the reader for as long as the
//! module lives. Facts derived from the whole module (NoPIA local types, whether it defines
//! `System.Object`, the internals-visible-to map and the forwarded types) are computed on first
//! use and cached. Concurrent first uses may compute the same value more than once; the first
//! value stored wins and the others are dropped.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilmeta::Module;
//! use std::path::Path;
//!
//! let module = Module::from_file(Path::new("tests/samples/Sample.dll"))?;
//! let reader = module.reader();
//! println!("{} ({})", reader.module_name()?, reader.metadata_version());
//!
//! for handle in reader.type_defs() {
//!     println!("  {}", reader.type_def_name(handle)?);
//! }
//! # Ok::<(), cilmeta::Error>(())
//! ```

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, OnceLock},
};

use ouroboros::self_referencing;

use crate::{
    file::File,
    metadata::{
        body::MethodBody,
        cor20header::{CorFlags, Cor20Header},
        flags::AssemblyHashAlgorithm,
        handles::{AssemblyRefHandle, FieldHandle, ManifestResourceHandle, MethodDefHandle},
        identity::compute_hash,
        reader::{MetadataReader, ReaderOptions},
        tables::TableId,
        token::Token,
        winmd::WinMdReader,
    },
    Result,
};

#[self_referencing]
struct ModuleData {
    file: Arc<File>,

    #[borrows(file)]
    #[covariant]
    reader: MetadataReader<'this>,
}

/// A loaded module of a managed image
pub struct Module {
    data: ModuleData,
    cor20header: Option<Cor20Header>,
    no_pia: OnceLock<bool>,
    declares_object: OnceLock<bool>,
    internals_visible_to: OnceLock<HashMap<String, Vec<Vec<u8>>>>,
    forwarded_types: OnceLock<HashMap<String, Vec<AssemblyRefHandle>>>,
}

impl Module {
    /// Load the image at `path`.
    ///
    /// # Errors
    /// Fails if the file cannot be mapped, or if the PE headers, CLI header or metadata are
    /// malformed
    pub fn from_file(path: &Path) -> Result<Module> {
        Self::from_file_with(path, &ReaderOptions::default())
    }

    /// Load the image at `path` with explicit [`ReaderOptions`].
    ///
    /// # Errors
    /// See [`Module::from_file`]
    pub fn from_file_with(path: &Path, options: &ReaderOptions) -> Result<Module> {
        let file = Arc::new(File::from_file(path)?);
        Self::load(file, options)
    }

    /// Load an image held in memory.
    ///
    /// # Errors
    /// Fails if the buffer is empty, or if the PE headers, CLI header or metadata are
    /// malformed
    pub fn from_mem(data: Vec<u8>) -> Result<Module> {
        Self::from_mem_with(data, &ReaderOptions::default())
    }

    /// Load an image held in memory with explicit [`ReaderOptions`].
    ///
    /// # Errors
    /// See [`Module::from_mem`]
    pub fn from_mem_with(data: Vec<u8>, options: &ReaderOptions) -> Result<Module> {
        let file = Arc::new(File::from_mem(data)?);
        Self::load(file, options)
    }

    /// Open a bare metadata root that is not wrapped in a PE image.
    ///
    /// Queries that need the image (method bodies, field data, resources) fail with
    /// [`crate::Error::NotSupported`] on such a module.
    ///
    /// # Errors
    /// Fails if the buffer is empty or the metadata is malformed
    pub fn from_metadata(data: Vec<u8>) -> Result<Module> {
        Self::from_metadata_with(data, &ReaderOptions::default())
    }

    /// Open a bare metadata root with explicit [`ReaderOptions`].
    ///
    /// # Errors
    /// See [`Module::from_metadata`]
    pub fn from_metadata_with(data: Vec<u8>, options: &ReaderOptions) -> Result<Module> {
        let file = Arc::new(File::metadata_only(data)?);
        Self::load(file, options)
    }

    fn load(file: Arc<File>, options: &ReaderOptions) -> Result<Module> {
        let (cor20header, metadata_offset, metadata_size) = if file.is_metadata_only() {
            (None, 0, file.len())
        } else {
            let (clr_rva, clr_size) = file.clr()?;
            let cor20header = Cor20Header::read(file.rva_slice(clr_rva, clr_size as usize)?)?;
            let metadata_offset = file.rva_to_offset(cor20header.metadata.virtual_address)?;
            let metadata_size = cor20header.metadata.size as usize;

            (Some(cor20header), metadata_offset, metadata_size)
        };

        let data = ModuleData::try_new(file, |file| {
            let metadata = file.data_slice(metadata_offset, metadata_size)?;
            MetadataReader::with_options(metadata, options)
        })?;

        let reader = data.borrow_reader();
        tracing::debug!(
            version = reader.metadata_version(),
            types = reader.row_count(TableId::TypeDef),
            manifest = reader.is_manifest_module(),
            "opened module"
        );

        Ok(Module {
            data,
            cor20header,
            no_pia: OnceLock::new(),
            declares_object: OnceLock::new(),
            internals_visible_to: OnceLock::new(),
            forwarded_types: OnceLock::new(),
        })
    }

    /// The metadata reader of this module
    #[must_use]
    pub fn reader(&self) -> &MetadataReader<'_> {
        self.data.borrow_reader()
    }

    /// The Windows Runtime projection of this module, `None` for plain ECMA-335 metadata
    #[must_use]
    pub fn winmd(&self) -> Option<WinMdReader<'_>> {
        let reader = self.reader();
        reader.is_winmd().then(|| WinMdReader::new(reader))
    }

    /// The underlying image
    #[must_use]
    pub fn file(&self) -> &Arc<File> {
        self.data.borrow_file()
    }

    /// The CLI header, `None` for metadata-only modules
    #[must_use]
    pub fn cor20header(&self) -> Option<&Cor20Header> {
        self.cor20header.as_ref()
    }

    /// CLI flags, empty for metadata-only modules
    #[must_use]
    pub fn cor_flags(&self) -> CorFlags {
        self.cor20header
            .as_ref()
            .map_or(CorFlags::empty(), |header| header.flags)
    }

    /// Token of the managed entry point, if there is one
    #[must_use]
    pub fn entry_point(&self) -> Option<Token> {
        self.cor20header
            .as_ref()
            .and_then(Cor20Header::entry_point_token)
    }

    /// COFF machine value, 0 for metadata-only modules
    #[must_use]
    pub fn machine(&self) -> u16 {
        self.file().machine()
    }

    /// Hash of the whole image.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] for algorithms other than MD5 and SHA-1
    pub fn hash(&self, algorithm: AssemblyHashAlgorithm) -> Result<Vec<u8>> {
        compute_hash(self.file().data(), algorithm)
    }

    /// Decoded body of a method, `None` for abstract, runtime or P/Invoke methods.
    ///
    /// # Errors
    /// Fails if the method row does not exist, its RVA cannot be mapped or the body is
    /// malformed; metadata-only modules fail with [`crate::Error::NotSupported`]
    pub fn method_body(&self, handle: MethodDefHandle) -> Result<Option<MethodBody<'_>>> {
        let rva = self.reader().method_def_props(handle)?.rva;
        if rva == 0 {
            return Ok(None);
        }

        Ok(Some(MethodBody::read(self.file().rva_tail(rva)?)?))
    }

    /// `size` bytes of initial data of a field with a `FieldRVA` row.
    ///
    /// # Errors
    /// Fails if the RVA cannot be mapped or the data is truncated; metadata-only modules
    /// fail with [`crate::Error::NotSupported`]
    pub fn field_data(&self, handle: FieldHandle, size: usize) -> Result<Option<&[u8]>> {
        match self.reader().field_rva(handle) {
            Some(rva) => Ok(Some(self.file().rva_slice(rva, size)?)),
            None => Ok(None),
        }
    }

    /// Content of a resource embedded in this image, `None` for linked resources.
    ///
    /// # Errors
    /// Fails if the row does not exist or the resource lies outside of the resource
    /// directory; metadata-only modules fail with [`crate::Error::NotSupported`]
    pub fn resource_data(&self, handle: ManifestResourceHandle) -> Result<Option<&[u8]>> {
        let props = self.reader().manifest_resource_props(handle)?;
        if !props.implementation.is_nil() {
            return Ok(None);
        }

        let Some(header) = self.cor20header.as_ref() else {
            return Err(crate::Error::NotSupported(
                "metadata-only modules have no resources".to_string(),
            ));
        };
        if props.offset.saturating_add(4) > header.resources.size {
            return Err(out_of_range_error!());
        }

        let rva = header
            .resources
            .virtual_address
            .checked_add(props.offset)
            .ok_or(out_of_range_error!())?;
        let length = u32::from_le_bytes(
            self.file()
                .rva_slice(rva, 4)?
                .try_into()
                .map_err(|_| out_of_range_error!())?,
        );
        if props.offset.saturating_add(4).saturating_add(length) > header.resources.size {
            return Err(out_of_range_error!());
        }

        let start = rva.checked_add(4).ok_or(out_of_range_error!())?;
        Ok(Some(self.file().rva_slice(start, length as usize)?))
    }

    /// True if any type of this module is a NoPIA local type.
    ///
    /// # Errors
    /// See [`MetadataReader::contains_no_pia_local_types`]
    pub fn contains_no_pia_local_types(&self) -> Result<bool> {
        cached(&self.no_pia, || self.reader().contains_no_pia_local_types()).copied()
    }

    /// True if this module defines `System.Object`.
    ///
    /// # Errors
    /// See [`MetadataReader::declares_object`]
    pub fn declares_object(&self) -> Result<bool> {
        cached(&self.declares_object, || self.reader().declares_object()).copied()
    }

    /// The internals-visible-to map of the assembly this module is the manifest of.
    ///
    /// # Errors
    /// See [`MetadataReader::internals_visible_to_map`]
    pub fn internals_visible_to(&self) -> Result<&HashMap<String, Vec<Vec<u8>>>> {
        cached(&self.internals_visible_to, || {
            self.reader().internals_visible_to_map()
        })
    }

    /// True if the assembly grants access to its internals to the assembly named
    /// `simple_name` signed with `public_key` (empty for unsigned friends).
    ///
    /// # Errors
    /// See [`MetadataReader::internals_visible_to_map`]
    pub fn grants_internals_to(&self, simple_name: &str, public_key: &[u8]) -> Result<bool> {
        Ok(self
            .internals_visible_to()?
            .get(&simple_name.to_lowercase())
            .is_some_and(|keys| keys.iter().any(|key| key.as_slice() == public_key)))
    }

    /// Types forwarded to other assemblies, keyed by full name.
    ///
    /// # Errors
    /// See [`MetadataReader::forwarded_types`]
    pub fn forwarded_types(&self) -> Result<&HashMap<String, Vec<AssemblyRefHandle>>> {
        cached(&self.forwarded_types, || self.reader().forwarded_types())
    }
}

/// Compute-once without holding a lock while computing; a racing result is discarded.
fn cached<T>(cell: &OnceLock<T>, compute: impl FnOnce() -> Result<T>) -> Result<&T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }

    let value = compute()?;
    Ok(cell.get_or_init(|| value))
}
