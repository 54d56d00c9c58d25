//! Assemblies loaded from disk, including linked modules.

#[path = "../src/test/builder.rs"]
mod builder;

use std::{
    fs,
    path::{Path, PathBuf},
};

use builder::{coded, table, Cell, MetadataBuilder, PeBuilder, SampleAssembly};
use cilmeta::{
    metadata::{flags::AssemblyHashAlgorithm, handles::AssemblyRefHandle},
    DirectoryResolver, Error, Module, PeAssembly,
};

struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str) -> Scratch {
        let dir = std::env::temp_dir().join(format!("cilmeta-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        Scratch(dir)
    }

    fn write(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.0.join(name);
        fs::write(&path, data).unwrap();
        path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn assembly_ref(md: &mut MetadataBuilder, name: &str) {
    let name = md.string(name);
    md.row(
        table::ASSEMBLY_REF,
        vec![
            Cell::U16(4),
            Cell::U16(0),
            Cell::U16(0),
            Cell::U16(0),
            Cell::U32(0),
            Cell::Blob(0),
            Cell::Str(name),
            Cell::Str(0),
            Cell::Blob(0),
        ],
    );
}

fn module_row(md: &mut MetadataBuilder, name: &str) {
    let name = md.string(name);
    md.row(
        table::MODULE,
        vec![Cell::U16(0), Cell::Str(name), Cell::Guid(0), Cell::Guid(0), Cell::Guid(0)],
    );
}

// Manifest `Suite` linking `Part.netmodule`, forwarding `System.Uri` to `System.Private.Uri`
fn manifest() -> Vec<u8> {
    let mut md = MetadataBuilder::new();
    module_row(&mut md, "Suite.dll");
    assembly_ref(&mut md, "System.Runtime");
    assembly_ref(&mut md, "System.Private.Uri");

    let name = md.string("Suite");
    md.row(
        table::ASSEMBLY,
        vec![
            Cell::U32(0x8004),
            Cell::U16(2),
            Cell::U16(0),
            Cell::U16(0),
            Cell::U16(0),
            Cell::U32(0),
            Cell::Blob(0),
            Cell::Str(name),
            Cell::Str(0),
        ],
    );

    let part = md.string("Part.netmodule");
    md.row(table::FILE, vec![Cell::U32(0), Cell::Str(part), Cell::Blob(0)]);

    // ExportedType forwarder: Implementation tag 1 = AssemblyRef
    let system = md.string("System");
    let uri = md.string("Uri");
    md.row(
        table::EXPORTED_TYPE,
        vec![
            Cell::U32(0x0020_0000),
            Cell::U32(0),
            Cell::Str(uri),
            Cell::Str(system),
            Cell::Idx(coded(2, 1, 2)),
        ],
    );

    PeBuilder::new().build(&md.build())
}

fn part() -> Vec<u8> {
    let mut md = MetadataBuilder::new();
    module_row(&mut md, "Part.netmodule");
    assembly_ref(&mut md, "System.Collections");

    PeBuilder::new().pe32_plus().build(&md.build())
}

#[test]
fn mapped_module_matches_memory_module() {
    let scratch = Scratch::new("mapped");
    let image = SampleAssembly::new().image();
    let path = scratch.write("Sample.dll", &image);

    let mapped = Module::from_file(&path).unwrap();
    let owned = Module::from_mem(image.clone()).unwrap();

    assert_eq!(mapped.file().data(), &image[..]);
    assert_eq!(
        mapped.reader().module_version_id().unwrap(),
        owned.reader().module_version_id().unwrap()
    );
    assert_eq!(
        mapped.hash(AssemblyHashAlgorithm::Sha1).unwrap(),
        owned.hash(AssemblyHashAlgorithm::Sha1).unwrap()
    );
}

#[test]
fn missing_file() {
    let scratch = Scratch::new("missing");
    let result = Module::from_file(&scratch.0.join("absent.dll"));
    assert!(matches!(result, Err(Error::FileError(_))));
}

#[test]
fn linked_module_from_directory() {
    let scratch = Scratch::new("directory");
    let path = scratch.write("Suite.dll", &manifest());
    scratch.write("Part.netmodule", &part());

    let manifest = Module::from_file(&path).unwrap();
    let assembly = PeAssembly::new(manifest, &DirectoryResolver::beside(&path)).unwrap();

    assert_eq!(assembly.identity().name, "Suite");
    assert_eq!(assembly.modules().len(), 2);
    assert_eq!(assembly.modules()[1].machine(), 0x8664);
    assert_eq!(assembly.module_reference_counts(), [2, 1]);

    let names = assembly
        .referenced_assemblies()
        .iter()
        .map(|identity| identity.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["System.Runtime", "System.Private.Uri", "System.Collections"]);

    let forwarded = assembly.manifest_module().forwarded_types().unwrap();
    assert_eq!(forwarded["System.Uri"], [AssemblyRefHandle::new(2)]);
}

#[test]
fn linked_module_through_callback() {
    let scratch = Scratch::new("callback");
    let path = scratch.write("Suite.dll", &manifest());
    let part_path = scratch.write("renamed.bin", &part());

    let assembly = PeAssembly::from_file(&path, |manifest: &Path, name: &str| {
        assert_eq!(name, "Part.netmodule");
        Some(manifest.with_file_name("renamed.bin"))
    })
    .unwrap();
    assert_eq!(
        assembly.modules()[1].reader().module_name().unwrap(),
        "Part.netmodule"
    );
    assert!(part_path.is_file());
}

#[test]
fn unresolved_linked_module() {
    let scratch = Scratch::new("unresolved");
    let path = scratch.write("Suite.dll", &manifest());

    let result = PeAssembly::from_file(&path, |_: &Path, _: &str| None);
    assert!(matches!(result, Err(Error::NotFound(_))));
}
