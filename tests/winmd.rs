//! Windows Runtime projection over synthetic `.winmd` images.

#[path = "../src/test/builder.rs"]
mod builder;

use builder::{coded, table, Cell, MetadataBuilder, PeBuilder, SampleAssembly};
use cilmeta::{
    metadata::{
        handles::{AssemblyRefHandle, TypeRefHandle},
        winmd::{
            projections::{self, PROJECTIONS},
            ImpliedAssembly, TypeRefTreatment,
        },
    },
    MetadataKind, Module,
};

// One TypeRef per projection under its Windows Runtime namespace, followed by one TypeRef per
// projection under an unrelated namespace.
fn referencing_winmd() -> Vec<u8> {
    let mut md = MetadataBuilder::new();
    md.version("WindowsRuntime 1.4");

    let name = md.string("Contoso.winmd");
    md.row(
        table::MODULE,
        vec![Cell::U16(0), Cell::Str(name), Cell::Guid(0), Cell::Guid(0), Cell::Guid(0)],
    );
    let mscorlib = md.string("mscorlib");
    md.row(
        table::ASSEMBLY_REF,
        vec![
            Cell::U16(255),
            Cell::U16(255),
            Cell::U16(255),
            Cell::U16(255),
            Cell::U32(0),
            Cell::Blob(0),
            Cell::Str(mscorlib),
            Cell::Str(0),
            Cell::Blob(0),
        ],
    );

    let elsewhere = md.string("Contoso.Elsewhere");
    for pass in 0..2 {
        for projection in &PROJECTIONS {
            let name = md.string(projection.winrt_name);
            let namespace = if pass == 0 {
                md.string(projection.winrt_namespace)
            } else {
                elsewhere
            };
            md.row(
                table::TYPE_REF,
                vec![Cell::Idx(coded(1, 2, 2)), Cell::Str(name), Cell::Str(namespace)],
            );
        }
    }

    md.build()
}

#[test]
fn every_projection_resolves() {
    let module = Module::from_mem(PeBuilder::new().build(&referencing_winmd())).unwrap();
    assert_eq!(module.reader().metadata_kind(), MetadataKind::WindowsMetadata);
    let winmd = module.winmd().unwrap();

    for (index, projection) in PROJECTIONS.iter().enumerate() {
        let handle = TypeRefHandle::new(index as u32 + 1);
        let props = winmd.type_ref_props(handle).unwrap();

        assert_eq!(props.namespace, projection.clr_namespace, "{}", projection.winrt_name);
        assert_eq!(props.name, projection.clr_name, "{}", projection.winrt_name);
        assert_eq!(
            props.resolution_scope,
            AssemblyRefHandle::new(2 + projection.assembly.index()).token(),
            "{}",
            projection.winrt_name
        );
    }
}

#[test]
fn projected_type_names() {
    #[rustfmt::skip]
    let expected = [
        ("Windows.Foundation.Metadata", "AttributeTargets", "System", "AttributeTargets"),
        ("Windows.Foundation.Metadata", "AttributeUsageAttribute", "System", "AttributeUsageAttribute"),
        ("Windows.UI", "Color", "Windows.UI", "Color"),
        ("Windows.UI.Xaml", "CornerRadius", "Windows.UI.Xaml", "CornerRadius"),
        ("Windows.Foundation", "DateTime", "System", "DateTimeOffset"),
        ("Windows.UI.Xaml", "Duration", "Windows.UI.Xaml", "Duration"),
        ("Windows.UI.Xaml", "DurationType", "Windows.UI.Xaml", "DurationType"),
        ("Windows.Foundation", "EventHandler`1", "System", "EventHandler`1"),
        ("Windows.Foundation", "EventRegistrationToken", "System.Runtime.InteropServices.WindowsRuntime", "EventRegistrationToken"),
        ("Windows.UI.Xaml.Controls.Primitives", "GeneratorPosition", "Windows.UI.Xaml.Controls.Primitives", "GeneratorPosition"),
        ("Windows.UI.Xaml", "GridLength", "Windows.UI.Xaml", "GridLength"),
        ("Windows.UI.Xaml", "GridUnitType", "Windows.UI.Xaml", "GridUnitType"),
        ("Windows.Foundation", "HResult", "System", "Exception"),
        ("Windows.UI.Xaml.Interop", "IBindableIterable", "System.Collections", "IEnumerable"),
        ("Windows.UI.Xaml.Interop", "IBindableVector", "System.Collections", "IList"),
        ("Windows.Foundation", "IClosable", "System", "IDisposable"),
        ("Windows.UI.Xaml.Input", "ICommand", "System.Windows.Input", "ICommand"),
        ("Windows.Foundation.Collections", "IIterable`1", "System.Collections.Generic", "IEnumerable`1"),
        ("Windows.Foundation.Collections", "IIterator`1", "System.Collections.Generic", "IEnumerator`1"),
        ("Windows.Foundation.Collections", "IKeyValuePair`2", "System.Collections.Generic", "KeyValuePair`2"),
        ("Windows.Foundation.Collections", "IMapView`2", "System.Collections.Generic", "IReadOnlyDictionary`2"),
        ("Windows.Foundation.Collections", "IMap`2", "System.Collections.Generic", "IDictionary`2"),
        ("Windows.UI.Xaml.Interop", "INotifyCollectionChanged", "System.Collections.Specialized", "INotifyCollectionChanged"),
        ("Windows.UI.Xaml.Data", "INotifyPropertyChanged", "System.ComponentModel", "INotifyPropertyChanged"),
        ("Windows.Foundation", "IReference`1", "System", "Nullable`1"),
        ("Windows.Foundation.Collections", "IVectorView`1", "System.Collections.Generic", "IReadOnlyList`1"),
        ("Windows.Foundation.Collections", "IVector`1", "System.Collections.Generic", "IList`1"),
        ("Windows.UI.Xaml.Media.Animation", "KeyTime", "Windows.UI.Xaml.Media.Animation", "KeyTime"),
        ("Windows.UI.Xaml.Media", "Matrix", "Windows.UI.Xaml.Media", "Matrix"),
        ("Windows.UI.Xaml.Media.Media3D", "Matrix3D", "Windows.UI.Xaml.Media.Media3D", "Matrix3D"),
        ("Windows.UI.Xaml.Interop", "NotifyCollectionChangedAction", "System.Collections.Specialized", "NotifyCollectionChangedAction"),
        ("Windows.UI.Xaml.Interop", "NotifyCollectionChangedEventArgs", "System.Collections.Specialized", "NotifyCollectionChangedEventArgs"),
        ("Windows.UI.Xaml.Interop", "NotifyCollectionChangedEventHandler", "System.Collections.Specialized", "NotifyCollectionChangedEventHandler"),
        ("Windows.Foundation", "Point", "Windows.Foundation", "Point"),
        ("Windows.UI.Xaml.Data", "PropertyChangedEventArgs", "System.ComponentModel", "PropertyChangedEventArgs"),
        ("Windows.UI.Xaml.Data", "PropertyChangedEventHandler", "System.ComponentModel", "PropertyChangedEventHandler"),
        ("Windows.Foundation", "Rect", "Windows.Foundation", "Rect"),
        ("Windows.UI.Xaml.Media.Animation", "RepeatBehavior", "Windows.UI.Xaml.Media.Animation", "RepeatBehavior"),
        ("Windows.UI.Xaml.Media.Animation", "RepeatBehaviorType", "Windows.UI.Xaml.Media.Animation", "RepeatBehaviorType"),
        ("Windows.Foundation", "Size", "Windows.Foundation", "Size"),
        ("Windows.UI.Xaml", "Thickness", "Windows.UI.Xaml", "Thickness"),
        ("Windows.Foundation", "TimeSpan", "System", "TimeSpan"),
        ("Windows.UI.Xaml.Interop", "TypeName", "System", "Type"),
        ("Windows.Foundation", "Uri", "System", "Uri"),
    ];

    assert_eq!(PROJECTIONS.len(), expected.len());
    for (winrt_namespace, winrt_name, clr_namespace, clr_name) in expected {
        let projection = projections::find(winrt_namespace, winrt_name)
            .unwrap_or_else(|| panic!("no projection for {winrt_namespace}.{winrt_name}"));
        assert_eq!(
            (projection.clr_namespace, projection.clr_name),
            (clr_namespace, clr_name),
            "{winrt_name}"
        );
    }
}

#[test]
fn other_namespaces_are_untouched() {
    let module = Module::from_mem(PeBuilder::new().build(&referencing_winmd())).unwrap();
    let reader = module.reader();
    let winmd = module.winmd().unwrap();

    let first = PROJECTIONS.len() as u32 + 1;
    for rid in first..first + PROJECTIONS.len() as u32 {
        let handle = TypeRefHandle::new(rid);
        assert_eq!(winmd.type_ref_treatment(handle).unwrap(), TypeRefTreatment::None);
        assert_eq!(
            winmd.type_ref_props(handle).unwrap(),
            reader.type_ref_props(handle).unwrap()
        );
    }
}

#[test]
fn implied_references_follow_physical_rows() {
    let module = Module::from_mem(PeBuilder::new().build(&referencing_winmd())).unwrap();
    let winmd = module.winmd().unwrap();

    assert_eq!(module.reader().assembly_refs().count(), 1);
    assert_eq!(winmd.assembly_ref_count(), 6);

    let names = winmd
        .assembly_refs()
        .map(|handle| winmd.assembly_ref_identity(handle).unwrap().name)
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        [
            "mscorlib",
            "System.Runtime",
            "System.Runtime.InteropServices.WindowsRuntime",
            "System.ObjectModel",
            "System.Runtime.WindowsRuntime",
            "System.Runtime.WindowsRuntime.UI.Xaml",
        ]
    );

    for implied in ImpliedAssembly::ALL {
        let handle = winmd.implied_assembly_ref(implied);
        assert_eq!(winmd.implied_assembly(handle), Some(implied));
        let identity = winmd.assembly_ref_identity(handle).unwrap();
        assert_eq!(identity.version.to_string(), "4.0.0.0");
        assert_eq!(identity.public_key_token(), Some(implied.public_key_token()));
    }
}

#[test]
fn ecma_modules_have_no_projection() {
    let module = Module::from_mem(SampleAssembly::new().image()).unwrap();
    assert!(module.winmd().is_none());
    assert!(!module.reader().is_winmd());
}
