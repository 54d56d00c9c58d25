//! The assembly manifest: identity, references, files, exported types and resources.

use std::collections::HashMap;

use crate::{
    metadata::{
        flags::{
            AssemblyFlags, AssemblyHashAlgorithm, FileAttributes, ManifestResourceAttributes,
            TypeAttributes,
        },
        handles::{
            AssemblyFileHandle, AssemblyRefHandle, ExportedTypeHandle, ManifestResourceHandle,
            ModuleRefHandle,
        },
        identity::{AssemblyIdentity, AssemblyVersion, PublicKeyOrToken},
        reader::MetadataReader,
        tables::{
            schema::{assembly, assemblyref, exportedtype, file, manifestresource, moduleref, typeref},
            TableId,
        },
        token::Token,
    },
    Result,
};

/// Columns of an `AssemblyRef` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyRefProps<'a> {
    /// Version
    pub version: AssemblyVersion,
    /// Flags; `PUBLIC_KEY` says whether the blob holds a full key or a token
    pub flags: AssemblyFlags,
    /// Public key or token blob, empty for unsigned references
    pub public_key_or_token: &'a [u8],
    /// Simple name
    pub name: &'a str,
    /// Culture, empty for culture neutral references
    pub culture: &'a str,
    /// Hash of the referenced assembly, usually empty
    pub hash_value: &'a [u8],
}

/// Columns of a `File` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyFileProps<'a> {
    /// File attributes
    pub flags: FileAttributes,
    /// File name
    pub name: &'a str,
    /// Hash of the file
    pub hash_value: &'a [u8],
}

impl AssemblyFileProps<'_> {
    /// True if the file is a module with metadata
    #[must_use]
    pub fn contains_metadata(&self) -> bool {
        !self.flags.contains(FileAttributes::CONTAINS_NO_METADATA)
    }
}

/// Columns of an `ExportedType` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportedTypeProps<'a> {
    /// Type attributes
    pub flags: TypeAttributes,
    /// Hint for the `TypeDef` row in the target module
    pub type_def_id: u32,
    /// Simple name
    pub name: &'a str,
    /// Namespace
    pub namespace: &'a str,
    /// `File`, `AssemblyRef` or enclosing `ExportedType`
    pub implementation: Token,
}

impl ExportedTypeProps<'_> {
    /// True if the row forwards the type to another assembly
    #[must_use]
    pub fn is_forwarder(&self) -> bool {
        self.flags.contains(TypeAttributes::IS_TYPE_FORWARDER)
            && self.implementation.is_table(TableId::AssemblyRef)
    }
}

/// Columns of a `ManifestResource` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestResourceProps<'a> {
    /// Offset into the resource directory for embedded resources
    pub offset: u32,
    /// Visibility
    pub flags: ManifestResourceAttributes,
    /// Resource name
    pub name: &'a str,
    /// `File` or `AssemblyRef` holding the resource, nil for embedded resources
    pub implementation: Token,
}

impl<'a> MetadataReader<'a> {
    /// Identity of the assembly, `None` if this is not the manifest module.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the name, culture or key lies past its heap
    pub fn assembly_identity(&self) -> Result<Option<AssemblyIdentity>> {
        let Some(row) = self.table(TableId::Assembly).get(1) else {
            return Ok(None);
        };

        let flags = AssemblyFlags::from_bits_retain(row.get(assembly::FLAGS));
        let culture = self.string_column(&row, assembly::CULTURE)?;

        Ok(Some(AssemblyIdentity {
            name: self.string_column(&row, assembly::NAME)?.to_string(),
            version: AssemblyVersion::new(
                row.get_u16(assembly::MAJOR_VERSION),
                row.get_u16(assembly::MINOR_VERSION),
                row.get_u16(assembly::BUILD_NUMBER),
                row.get_u16(assembly::REVISION_NUMBER),
            ),
            culture: (!culture.is_empty()).then(|| culture.to_string()),
            public_key_or_token: PublicKeyOrToken::from_blob(
                self.blob_column(&row, assembly::PUBLIC_KEY)?,
                true,
            )?,
            flags: flags - AssemblyFlags::PUBLIC_KEY,
            processor_architecture: None,
        }))
    }

    /// Hash algorithm of the assembly, `None` if this is not the manifest module
    #[must_use]
    pub fn assembly_hash_algorithm(&self) -> Option<AssemblyHashAlgorithm> {
        self.table(TableId::Assembly)
            .get(1)
            .map(|row| AssemblyHashAlgorithm::from_u32(row.get(assembly::HASH_ALG_ID)))
    }

    /// All assembly references
    pub fn assembly_refs(&self) -> impl Iterator<Item = AssemblyRefHandle> {
        (1..=self.row_count(TableId::AssemblyRef)).map(AssemblyRefHandle::new)
    }

    /// Columns of an `AssemblyRef` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or a heap entry does not exist
    pub fn assembly_ref_props(&self, handle: AssemblyRefHandle) -> Result<AssemblyRefProps<'a>> {
        let row = self.row(TableId::AssemblyRef, handle.rid())?;

        Ok(AssemblyRefProps {
            version: AssemblyVersion::new(
                row.get_u16(assemblyref::MAJOR_VERSION),
                row.get_u16(assemblyref::MINOR_VERSION),
                row.get_u16(assemblyref::BUILD_NUMBER),
                row.get_u16(assemblyref::REVISION_NUMBER),
            ),
            flags: AssemblyFlags::from_bits_retain(row.get(assemblyref::FLAGS)),
            public_key_or_token: self.blob_column(&row, assemblyref::PUBLIC_KEY_OR_TOKEN)?,
            name: self.string_column(&row, assemblyref::NAME)?,
            culture: self.string_column(&row, assemblyref::CULTURE)?,
            hash_value: self.blob_column(&row, assemblyref::HASH_VALUE)?,
        })
    }

    /// Identity of a referenced assembly.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or a heap entry does not exist and
    /// [`crate::Error::BadImageFormat`] for a token blob that is not 8 bytes long
    pub fn assembly_ref_identity(&self, handle: AssemblyRefHandle) -> Result<AssemblyIdentity> {
        let props = self.assembly_ref_props(handle)?;

        Ok(AssemblyIdentity {
            name: props.name.to_string(),
            version: props.version,
            culture: (!props.culture.is_empty()).then(|| props.culture.to_string()),
            public_key_or_token: PublicKeyOrToken::from_blob(
                props.public_key_or_token,
                props.flags.contains(AssemblyFlags::PUBLIC_KEY),
            )?,
            flags: props.flags - AssemblyFlags::PUBLIC_KEY,
            processor_architecture: None,
        })
    }

    /// Identities of all referenced assemblies, in `AssemblyRef` order.
    ///
    /// # Errors
    /// See [`MetadataReader::assembly_ref_identity`]
    pub fn referenced_assemblies(&self) -> Result<Vec<AssemblyIdentity>> {
        self.assembly_refs()
            .map(|handle| self.assembly_ref_identity(handle))
            .collect()
    }

    /// The first assembly reference with simple name `name`
    #[must_use]
    pub fn find_assembly_ref(&self, name: &str) -> Option<AssemblyRefHandle> {
        self.table(TableId::AssemblyRef)
            .iter()
            .find(|row| self.string_column_eq(row, assemblyref::NAME, name))
            .map(|row| AssemblyRefHandle::new(row.rid()))
    }

    /// All module references
    pub fn module_refs(&self) -> impl Iterator<Item = ModuleRefHandle> {
        (1..=self.row_count(TableId::ModuleRef)).map(ModuleRefHandle::new)
    }

    /// Name of a module reference.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or its name does not exist
    pub fn module_ref_name(&self, handle: ModuleRefHandle) -> Result<&'a str> {
        let row = self.row(TableId::ModuleRef, handle.rid())?;
        self.string_column(&row, moduleref::NAME)
    }

    /// Names of the modules that type references resolve into, in order of first use.
    ///
    /// Native modules only referenced by P/Invoke are not included.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] or [`crate::Error::BadImageFormat`] for malformed
    /// `TypeRef` scopes
    pub fn referenced_managed_modules(&self) -> Result<Vec<&'a str>> {
        let mut seen = Vec::new();
        for row in self.table(TableId::TypeRef).iter() {
            let scope = row.reference(typeref::RESOLUTION_SCOPE)?;
            if scope.is_table(TableId::ModuleRef) && !seen.contains(&scope.row()) {
                seen.push(scope.row());
            }
        }

        seen.into_iter()
            .map(|rid| self.module_ref_name(ModuleRefHandle::new(rid)))
            .collect()
    }

    /// All rows of the `File` table
    pub fn assembly_files(&self) -> impl Iterator<Item = AssemblyFileHandle> {
        (1..=self.row_count(TableId::File)).map(AssemblyFileHandle::new)
    }

    /// Columns of a `File` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or a heap entry does not exist
    pub fn assembly_file_props(&self, handle: AssemblyFileHandle) -> Result<AssemblyFileProps<'a>> {
        let row = self.row(TableId::File, handle.rid())?;

        Ok(AssemblyFileProps {
            flags: FileAttributes::from_bits_retain(row.get(file::FLAGS)),
            name: self.string_column(&row, file::NAME)?,
            hash_value: self.blob_column(&row, file::HASH_VALUE)?,
        })
    }

    /// Names of the other modules of a multi-module assembly, in `File` order.
    ///
    /// # Errors
    /// See [`MetadataReader::assembly_file_props`]
    pub fn metadata_module_names(&self) -> Result<Vec<&'a str>> {
        let mut names = Vec::new();
        for handle in self.assembly_files() {
            let props = self.assembly_file_props(handle)?;
            if props.contains_metadata() {
                names.push(props.name);
            }
        }

        Ok(names)
    }

    /// All rows of the `ExportedType` table
    pub fn exported_types(&self) -> impl Iterator<Item = ExportedTypeHandle> {
        (1..=self.row_count(TableId::ExportedType)).map(ExportedTypeHandle::new)
    }

    /// Columns of an `ExportedType` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or a name does not exist and
    /// [`crate::Error::BadImageFormat`] for a malformed implementation
    pub fn exported_type_props(
        &self,
        handle: ExportedTypeHandle,
    ) -> Result<ExportedTypeProps<'a>> {
        let row = self.row(TableId::ExportedType, handle.rid())?;

        Ok(ExportedTypeProps {
            flags: TypeAttributes::from_bits_retain(row.get(exportedtype::FLAGS)),
            type_def_id: row.get(exportedtype::TYPE_DEF_ID),
            name: self.string_column(&row, exportedtype::NAME)?,
            namespace: self.string_column(&row, exportedtype::NAMESPACE)?,
            implementation: row.reference(exportedtype::IMPLEMENTATION)?,
        })
    }

    /// Types forwarded to other assemblies, keyed by full name.
    ///
    /// A name forwarded more than once maps to every distinct target, in row order.
    ///
    /// # Errors
    /// See [`MetadataReader::exported_type_props`]
    pub fn forwarded_types(&self) -> Result<HashMap<String, Vec<AssemblyRefHandle>>> {
        let mut forwarded: HashMap<String, Vec<AssemblyRefHandle>> = HashMap::new();

        for handle in self.exported_types() {
            let props = self.exported_type_props(handle)?;
            if !props.is_forwarder() {
                continue;
            }

            let name = if props.namespace.is_empty() {
                props.name.to_string()
            } else {
                format!("{}.{}", props.namespace, props.name)
            };
            let target = AssemblyRefHandle::new(props.implementation.row());

            let targets = forwarded.entry(name).or_default();
            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        Ok(forwarded)
    }

    /// All rows of the `ManifestResource` table
    pub fn manifest_resources(&self) -> impl Iterator<Item = ManifestResourceHandle> {
        (1..=self.row_count(TableId::ManifestResource)).map(ManifestResourceHandle::new)
    }

    /// Columns of a `ManifestResource` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or its name does not exist and
    /// [`crate::Error::BadImageFormat`] for a malformed implementation
    pub fn manifest_resource_props(
        &self,
        handle: ManifestResourceHandle,
    ) -> Result<ManifestResourceProps<'a>> {
        let row = self.row(TableId::ManifestResource, handle.rid())?;

        Ok(ManifestResourceProps {
            offset: row.get(manifestresource::OFFSET),
            flags: ManifestResourceAttributes::from_bits_retain(row.get(manifestresource::FLAGS)),
            name: self.string_column(&row, manifestresource::NAME)?,
            implementation: row.reference(manifestresource::IMPLEMENTATION)?,
        })
    }

    /// Resources stored in this image.
    ///
    /// # Errors
    /// See [`MetadataReader::manifest_resource_props`]
    pub fn embedded_resources(&self) -> Result<Vec<ManifestResourceHandle>> {
        let mut embedded = Vec::new();
        for handle in self.manifest_resources() {
            if self.manifest_resource_props(handle)?.implementation.is_nil() {
                embedded.push(handle);
            }
        }

        Ok(embedded)
    }

    /// The internals-visible-to map of the assembly.
    ///
    /// Keys are the lowercased simple names of the friend assemblies, values the public keys
    /// they are signed with; an unsigned friend contributes an empty key. Values that are not
    /// valid display names are dropped.
    ///
    /// # Errors
    /// See [`MetadataReader::attribute_type`]
    pub fn internals_visible_to_map(&self) -> Result<HashMap<String, Vec<Vec<u8>>>> {
        let mut map: HashMap<String, Vec<Vec<u8>>> = HashMap::new();

        for value in self.internals_visible_to_values()? {
            let Ok(identity) = AssemblyIdentity::parse(value) else {
                continue;
            };

            let keys = map.entry(identity.name.to_lowercase()).or_default();
            let key = identity.public_key().to_vec();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        Ok(map)
    }
}
