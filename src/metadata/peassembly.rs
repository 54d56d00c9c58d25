//! A multi-module assembly: the manifest module and the modules it links.
//!
//! The manifest module lists the other modules of the assembly in its `File` table. Every file
//! that contains metadata is loaded through a [`ModuleResolver`], so the caller decides where
//! linked modules come from (a directory next to the manifest, an in-memory cache, ...).
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilmeta::{Module, PeAssembly, metadata::peassembly::DirectoryResolver};
//! use std::path::Path;
//!
//! let path = Path::new("tests/samples/Sample.dll");
//! let manifest = Module::from_file(path)?;
//! let assembly = PeAssembly::new(manifest, &DirectoryResolver::beside(path))?;
//!
//! println!("{}", assembly.identity().name);
//! for reference in assembly.referenced_assemblies() {
//!     println!("  -> {} {}", reference.name, reference.version);
//! }
//! # Ok::<(), cilmeta::Error>(())
//! ```

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use crate::{
    metadata::{identity::AssemblyIdentity, module::Module},
    Error, Result,
};

/// Loads the modules linked by a manifest module
pub trait ModuleResolver {
    /// Load the module named `name` by a `File` row of the manifest, `None` if it cannot be
    /// found.
    ///
    /// # Errors
    /// Loading errors of a module that was found are passed through
    fn resolve(&self, name: &str) -> Result<Option<Module>>;
}

impl<F> ModuleResolver for F
where
    F: Fn(&str) -> Result<Option<Module>>,
{
    fn resolve(&self, name: &str) -> Result<Option<Module>> {
        self(name)
    }
}

/// Resolves linked modules as files in one directory
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    directory: PathBuf,
}

impl DirectoryResolver {
    /// Resolve modules inside `directory`
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        DirectoryResolver {
            directory: directory.into(),
        }
    }

    /// Resolve modules in the directory that contains `manifest`
    #[must_use]
    pub fn beside(manifest: &Path) -> Self {
        Self::new(manifest.parent().unwrap_or_else(|| Path::new(".")))
    }
}

impl ModuleResolver for DirectoryResolver {
    fn resolve(&self, name: &str) -> Result<Option<Module>> {
        let path = self.directory.join(name);
        if !path.is_file() {
            return Ok(None);
        }

        Module::from_file(&path).map(Some)
    }
}

/// Resolves linked modules through a callback that maps the manifest path and a module file
/// name to the path of that module
pub struct PathResolver<F> {
    manifest: PathBuf,
    locate: F,
}

impl<F> PathResolver<F>
where
    F: Fn(&Path, &str) -> Option<PathBuf>,
{
    /// Resolve the modules linked by the manifest at `manifest` with `locate`
    pub fn new(manifest: impl Into<PathBuf>, locate: F) -> Self {
        PathResolver {
            manifest: manifest.into(),
            locate,
        }
    }
}

impl<F> ModuleResolver for PathResolver<F>
where
    F: Fn(&Path, &str) -> Option<PathBuf>,
{
    fn resolve(&self, name: &str) -> Result<Option<Module>> {
        match (self.locate)(&self.manifest, name) {
            Some(path) => Module::from_file(&path).map(Some),
            None => Ok(None),
        }
    }
}

/// An assembly made of a manifest module and its linked modules
pub struct PeAssembly {
    identity: AssemblyIdentity,
    modules: Vec<Module>,
    referenced_assemblies: Vec<AssemblyIdentity>,
    module_reference_counts: Vec<usize>,
    no_pia: OnceLock<bool>,
    declares_object: OnceLock<bool>,
}

impl PeAssembly {
    /// Build the assembly from its manifest module, loading every linked module that contains
    /// metadata through `resolver`.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `manifest` has no `Assembly` row or a linked module
    /// cannot be resolved, and passes through errors of reading the manifest and of loading
    /// the linked modules
    pub fn new(manifest: Module, resolver: &dyn ModuleResolver) -> Result<PeAssembly> {
        let Some(identity) = manifest.reader().assembly_identity()? else {
            return Err(Error::NotFound(
                "the module is not an assembly manifest".to_string(),
            ));
        };

        let linked = manifest
            .reader()
            .metadata_module_names()?
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut modules = Vec::with_capacity(linked.len() + 1);
        modules.push(manifest);
        for name in linked {
            match resolver.resolve(&name)? {
                Some(module) => modules.push(module),
                None => return Err(Error::NotFound(format!("linked module {name}"))),
            }
        }

        let mut referenced_assemblies = Vec::new();
        let mut module_reference_counts = Vec::with_capacity(modules.len());
        for module in &modules {
            let references = module.reader().referenced_assemblies()?;
            module_reference_counts.push(references.len());
            referenced_assemblies.extend(references);
        }

        tracing::debug!(
            assembly = %identity.name,
            modules = modules.len(),
            references = referenced_assemblies.len(),
            "opened assembly"
        );

        Ok(PeAssembly {
            identity,
            modules,
            referenced_assemblies,
            module_reference_counts,
            no_pia: OnceLock::new(),
            declares_object: OnceLock::new(),
        })
    }

    /// Open the manifest at `path` and load its linked modules from the paths `locate` returns
    /// for them.
    ///
    /// # Errors
    /// See [`PeAssembly::new`]
    pub fn from_file<F>(path: &Path, locate: F) -> Result<PeAssembly>
    where
        F: Fn(&Path, &str) -> Option<PathBuf>,
    {
        let manifest = Module::from_file(path)?;
        Self::new(manifest, &PathResolver::new(path, locate))
    }

    /// Build an assembly that consists of the manifest module alone.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if the manifest links other modules; see also
    /// [`PeAssembly::new`]
    pub fn single(manifest: Module) -> Result<PeAssembly> {
        Self::new(manifest, &|_: &str| -> Result<Option<Module>> { Ok(None) })
    }

    /// Identity declared by the manifest module
    #[must_use]
    pub fn identity(&self) -> &AssemblyIdentity {
        &self.identity
    }

    /// The manifest module
    #[must_use]
    pub fn manifest_module(&self) -> &Module {
        &self.modules[0]
    }

    /// All modules, the manifest module first followed by the linked modules in `File` order
    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Assembly references of all modules, in module order.
    ///
    /// The references of module `i` are the next [`PeAssembly::module_reference_counts`]`[i]`
    /// entries.
    #[must_use]
    pub fn referenced_assemblies(&self) -> &[AssemblyIdentity] {
        &self.referenced_assemblies
    }

    /// Number of assembly references contributed by each module
    #[must_use]
    pub fn module_reference_counts(&self) -> &[usize] {
        &self.module_reference_counts
    }

    /// The assembly references of the module at `index`, `None` past the last module
    #[must_use]
    pub fn module_references(&self, index: usize) -> Option<&[AssemblyIdentity]> {
        let count = *self.module_reference_counts.get(index)?;
        let start: usize = self.module_reference_counts[..index].iter().sum();
        self.referenced_assemblies.get(start..start + count)
    }

    /// The internals-visible-to map declared by the manifest module.
    ///
    /// # Errors
    /// See [`Module::internals_visible_to`]
    pub fn internals_visible_to(&self) -> Result<&HashMap<String, Vec<Vec<u8>>>> {
        self.manifest_module().internals_visible_to()
    }

    /// True if the assembly grants access to its internals to the assembly named
    /// `simple_name` signed with `public_key` (empty for unsigned friends).
    ///
    /// # Errors
    /// See [`Module::internals_visible_to`]
    pub fn grants_internals_to(&self, simple_name: &str, public_key: &[u8]) -> Result<bool> {
        Ok(self
            .internals_visible_to()?
            .get(&simple_name.to_lowercase())
            .is_some_and(|keys| keys.iter().any(|key| key.as_slice() == public_key)))
    }

    /// True if any module contains NoPIA local types.
    ///
    /// # Errors
    /// See [`Module::contains_no_pia_local_types`]
    pub fn contains_no_pia_local_types(&self) -> Result<bool> {
        self.any_module(&self.no_pia, Module::contains_no_pia_local_types)
    }

    /// True if any module defines `System.Object`.
    ///
    /// # Errors
    /// See [`Module::declares_object`]
    pub fn declares_object(&self) -> Result<bool> {
        self.any_module(&self.declares_object, Module::declares_object)
    }

    fn any_module(&self, cell: &OnceLock<bool>, fact: fn(&Module) -> Result<bool>) -> Result<bool> {
        if let Some(value) = cell.get() {
            return Ok(*value);
        }

        let mut value = false;
        for module in &self.modules {
            if fact(module)? {
                value = true;
                break;
            }
        }

        Ok(*cell.get_or_init(|| value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::builder::{coded, table, Cell, MetadataBuilder, PeBuilder, SampleAssembly};

    // A manifest that links `Helper.netmodule` (with metadata) and `data.bin` (without)
    fn manifest_image() -> Vec<u8> {
        let mut md = MetadataBuilder::new();
        let name = md.string("Multi.dll");
        md.row(
            table::MODULE,
            vec![Cell::U16(0), Cell::Str(name), Cell::Guid(0), Cell::Guid(0), Cell::Guid(0)],
        );

        let runtime = md.string("System.Runtime");
        md.row(
            table::ASSEMBLY_REF,
            vec![
                Cell::U16(8),
                Cell::U16(0),
                Cell::U16(0),
                Cell::U16(0),
                Cell::U32(0),
                Cell::Blob(0),
                Cell::Str(runtime),
                Cell::Str(0),
                Cell::Blob(0),
            ],
        );

        let assembly = md.string("Multi");
        md.row(
            table::ASSEMBLY,
            vec![
                Cell::U32(0x8004),
                Cell::U16(1),
                Cell::U16(0),
                Cell::U16(0),
                Cell::U16(0),
                Cell::U32(0),
                Cell::Blob(0),
                Cell::Str(assembly),
                Cell::Str(0),
            ],
        );

        let helper = md.string("Helper.netmodule");
        let data = md.string("data.bin");
        md.row(table::FILE, vec![Cell::U32(0), Cell::Str(helper), Cell::Blob(0)]);
        md.row(table::FILE, vec![Cell::U32(1), Cell::Str(data), Cell::Blob(0)]);

        PeBuilder::new().build(&md.build())
    }

    // A linked module with two references and a public `System.Object`
    fn helper_image() -> Vec<u8> {
        let mut md = MetadataBuilder::new();
        let name = md.string("Helper.netmodule");
        md.row(
            table::MODULE,
            vec![Cell::U16(0), Cell::Str(name), Cell::Guid(0), Cell::Guid(0), Cell::Guid(0)],
        );

        for reference in ["System.Collections", "System.Linq"] {
            let reference = md.string(reference);
            md.row(
                table::ASSEMBLY_REF,
                vec![
                    Cell::U16(8),
                    Cell::U16(0),
                    Cell::U16(0),
                    Cell::U16(0),
                    Cell::U32(0),
                    Cell::Blob(0),
                    Cell::Str(reference),
                    Cell::Str(0),
                    Cell::Blob(0),
                ],
            );
        }

        let system = md.string("System");
        let object = md.string("Object");
        md.row(
            table::TYPE_DEF,
            vec![
                Cell::U32(0x0000_0001),
                Cell::Str(object),
                Cell::Str(system),
                Cell::Idx(coded(0, 0, 2)),
                Cell::Idx(1),
                Cell::Idx(1),
            ],
        );

        PeBuilder::new().build(&md.build())
    }

    fn resolve_helper(name: &str) -> Result<Option<Module>> {
        if name == "Helper.netmodule" {
            Module::from_mem(helper_image()).map(Some)
        } else {
            Ok(None)
        }
    }

    #[test]
    fn linked_modules() {
        let manifest = Module::from_mem(manifest_image()).unwrap();
        let assembly = PeAssembly::new(manifest, &resolve_helper).unwrap();

        assert_eq!(assembly.identity().name, "Multi");
        assert_eq!(assembly.modules().len(), 2);
        assert_eq!(
            assembly.modules()[1].reader().module_name().unwrap(),
            "Helper.netmodule"
        );

        let names = assembly
            .referenced_assemblies()
            .iter()
            .map(|identity| identity.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["System.Runtime", "System.Collections", "System.Linq"]);
        assert_eq!(assembly.module_reference_counts(), [1, 2]);
        assert_eq!(assembly.module_references(1).unwrap().len(), 2);
        assert_eq!(assembly.module_references(1).unwrap()[0].name, "System.Collections");
        assert!(assembly.module_references(2).is_none());

        assert!(assembly.declares_object().unwrap());
        assert!(!assembly.contains_no_pia_local_types().unwrap());
        assert!(assembly.internals_visible_to().unwrap().is_empty());
    }

    #[test]
    fn unresolved_module() {
        let manifest = Module::from_mem(manifest_image()).unwrap();
        let result = PeAssembly::single(manifest);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn not_a_manifest() {
        let module = Module::from_mem(helper_image()).unwrap();
        assert!(matches!(PeAssembly::single(module), Err(Error::NotFound(_))));
    }

    #[test]
    fn single_module_assembly() {
        let sample = SampleAssembly::new();
        let assembly = PeAssembly::single(Module::from_mem(sample.image()).unwrap()).unwrap();

        assert_eq!(assembly.identity().name, "Sample");
        assert_eq!(assembly.modules().len(), 1);
        assert_eq!(assembly.module_reference_counts(), [1]);
        assert!(assembly.grants_internals_to("Friend", &[]).unwrap());
        assert!(!assembly.grants_internals_to("Signed", &[]).unwrap());
        assert!(assembly.contains_no_pia_local_types().unwrap());
    }

    #[test]
    fn internals_visible_to_is_the_manifest_map() {
        let sample = SampleAssembly::new();
        let assembly = PeAssembly::single(Module::from_mem(sample.image()).unwrap()).unwrap();

        let from_assembly = assembly.internals_visible_to().unwrap();
        let from_manifest = assembly.manifest_module().internals_visible_to().unwrap();
        assert!(std::ptr::eq(from_assembly, from_manifest));
        assert!(from_assembly.contains_key("friend"));
    }

    #[test]
    fn path_resolver_without_path() {
        let locate = |manifest: &Path, name: &str| -> Option<PathBuf> {
            assert_eq!(manifest, Path::new("/images/Multi.dll"));
            assert_eq!(name, "Helper.netmodule");
            None
        };
        let resolver = PathResolver::new("/images/Multi.dll", locate);
        assert!(resolver.resolve("Helper.netmodule").unwrap().is_none());
    }

    #[test]
    fn directory_resolver_misses() {
        let resolver = DirectoryResolver::new(std::env::temp_dir().join("cilmeta-no-such-dir"));
        assert!(resolver.resolve("Helper.netmodule").unwrap().is_none());
    }
}
