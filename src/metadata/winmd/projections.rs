//! The Windows Runtime types that the CLR presents as .NET types, and the assemblies they
//! live in.

use crate::metadata::identity::{AssemblyIdentity, AssemblyVersion, PublicKeyOrToken};

const MICROSOFT_PUBLIC_KEY_TOKEN: [u8; 8] = [0xB0, 0x3F, 0x5F, 0x7F, 0x11, 0xD5, 0x0A, 0x3A];
const ECMA_PUBLIC_KEY_TOKEN: [u8; 8] = [0xB7, 0x7A, 0x5C, 0x56, 0x19, 0x34, 0xE0, 0x89];

/// An assembly reference implied by Windows Runtime metadata without a physical
/// `AssemblyRef` row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpliedAssembly {
    /// `System.Runtime`
    SystemRuntime = 0,
    /// `System.Runtime.InteropServices.WindowsRuntime`
    SystemRuntimeInteropServicesWindowsRuntime = 1,
    /// `System.ObjectModel`
    SystemObjectModel = 2,
    /// `System.Runtime.WindowsRuntime`
    SystemRuntimeWindowsRuntime = 3,
    /// `System.Runtime.WindowsRuntime.UI.Xaml`
    SystemRuntimeWindowsRuntimeUiXaml = 4,
}

impl ImpliedAssembly {
    /// Number of implied references
    pub const COUNT: u32 = 5;

    /// All implied references, in index order
    pub const ALL: [ImpliedAssembly; 5] = [
        ImpliedAssembly::SystemRuntime,
        ImpliedAssembly::SystemRuntimeInteropServicesWindowsRuntime,
        ImpliedAssembly::SystemObjectModel,
        ImpliedAssembly::SystemRuntimeWindowsRuntime,
        ImpliedAssembly::SystemRuntimeWindowsRuntimeUiXaml,
    ];

    /// The implied reference at `index`
    #[must_use]
    pub fn from_index(index: u32) -> Option<ImpliedAssembly> {
        Self::ALL.get(index as usize).copied()
    }

    /// Zero based index among the implied references
    #[must_use]
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Simple name of the assembly
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ImpliedAssembly::SystemRuntime => "System.Runtime",
            ImpliedAssembly::SystemRuntimeInteropServicesWindowsRuntime => {
                "System.Runtime.InteropServices.WindowsRuntime"
            }
            ImpliedAssembly::SystemObjectModel => "System.ObjectModel",
            ImpliedAssembly::SystemRuntimeWindowsRuntime => "System.Runtime.WindowsRuntime",
            ImpliedAssembly::SystemRuntimeWindowsRuntimeUiXaml => {
                "System.Runtime.WindowsRuntime.UI.Xaml"
            }
        }
    }

    /// Public key token the assembly is signed with
    #[must_use]
    pub fn public_key_token(self) -> [u8; 8] {
        match self {
            ImpliedAssembly::SystemRuntime
            | ImpliedAssembly::SystemRuntimeInteropServicesWindowsRuntime
            | ImpliedAssembly::SystemObjectModel => MICROSOFT_PUBLIC_KEY_TOKEN,
            ImpliedAssembly::SystemRuntimeWindowsRuntime
            | ImpliedAssembly::SystemRuntimeWindowsRuntimeUiXaml => ECMA_PUBLIC_KEY_TOKEN,
        }
    }

    /// Identity of the assembly, version 4.0.0.0
    #[must_use]
    pub fn identity(self) -> AssemblyIdentity {
        let mut identity = AssemblyIdentity::new(self.name(), AssemblyVersion::new(4, 0, 0, 0));
        identity.public_key_or_token = Some(PublicKeyOrToken::Token(self.public_key_token()));
        identity
    }
}

/// How a projected type definition is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionKind {
    /// A type replaced by a CLR type
    RedirectedToClrType,
    /// An attribute replaced by a CLR attribute
    RedirectedToClrAttribute,
}

/// One Windows Runtime type and its CLR counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    /// Namespace in Windows Runtime metadata
    pub winrt_namespace: &'static str,
    /// Name in Windows Runtime metadata
    pub winrt_name: &'static str,
    /// Namespace of the CLR type
    pub clr_namespace: &'static str,
    /// Name of the CLR type
    pub clr_name: &'static str,
    /// Assembly defining the CLR type
    pub assembly: ImpliedAssembly,
    /// True if the CLR type is a value type
    pub is_value_type: bool,
    /// Treatment of a definition of the Windows Runtime type
    pub kind: ProjectionKind,
}

impl Projection {
    /// True for `Windows.Foundation.IClosable`, whose `Close` becomes `IDisposable.Dispose`
    #[must_use]
    pub fn is_idisposable(&self) -> bool {
        self.clr_namespace == "System" && self.clr_name == "IDisposable"
    }
}

const fn class(
    winrt_namespace: &'static str,
    winrt_name: &'static str,
    clr_namespace: &'static str,
    clr_name: &'static str,
    assembly: ImpliedAssembly,
) -> Projection {
    Projection {
        winrt_namespace,
        winrt_name,
        clr_namespace,
        clr_name,
        assembly,
        is_value_type: false,
        kind: ProjectionKind::RedirectedToClrType,
    }
}

const fn value(
    winrt_namespace: &'static str,
    winrt_name: &'static str,
    clr_namespace: &'static str,
    clr_name: &'static str,
    assembly: ImpliedAssembly,
) -> Projection {
    Projection {
        winrt_namespace,
        winrt_name,
        clr_namespace,
        clr_name,
        assembly,
        is_value_type: true,
        kind: ProjectionKind::RedirectedToClrType,
    }
}

const RUNTIME: ImpliedAssembly = ImpliedAssembly::SystemRuntime;
const INTEROP: ImpliedAssembly = ImpliedAssembly::SystemRuntimeInteropServicesWindowsRuntime;
const OBJECT_MODEL: ImpliedAssembly = ImpliedAssembly::SystemObjectModel;
const WINDOWS_RUNTIME: ImpliedAssembly = ImpliedAssembly::SystemRuntimeWindowsRuntime;
const XAML: ImpliedAssembly = ImpliedAssembly::SystemRuntimeWindowsRuntimeUiXaml;

const COLLECTIONS: &str = "Windows.Foundation.Collections";
const FOUNDATION: &str = "Windows.Foundation";
const GENERIC: &str = "System.Collections.Generic";
const XAML_INTEROP: &str = "Windows.UI.Xaml.Interop";
const XAML_ANIMATION: &str = "Windows.UI.Xaml.Media.Animation";

/// All projections, ordered by Windows Runtime name
pub static PROJECTIONS: [Projection; 44] = [
    value("Windows.Foundation.Metadata", "AttributeTargets", "System", "AttributeTargets", RUNTIME),
    Projection {
        winrt_namespace: "Windows.Foundation.Metadata",
        winrt_name: "AttributeUsageAttribute",
        clr_namespace: "System",
        clr_name: "AttributeUsageAttribute",
        assembly: RUNTIME,
        is_value_type: false,
        kind: ProjectionKind::RedirectedToClrAttribute,
    },
    value("Windows.UI", "Color", "Windows.UI", "Color", WINDOWS_RUNTIME),
    value("Windows.UI.Xaml", "CornerRadius", "Windows.UI.Xaml", "CornerRadius", XAML),
    value(FOUNDATION, "DateTime", "System", "DateTimeOffset", RUNTIME),
    value("Windows.UI.Xaml", "Duration", "Windows.UI.Xaml", "Duration", XAML),
    value("Windows.UI.Xaml", "DurationType", "Windows.UI.Xaml", "DurationType", XAML),
    class(FOUNDATION, "EventHandler`1", "System", "EventHandler`1", RUNTIME),
    value(
        FOUNDATION,
        "EventRegistrationToken",
        "System.Runtime.InteropServices.WindowsRuntime",
        "EventRegistrationToken",
        INTEROP,
    ),
    value(
        "Windows.UI.Xaml.Controls.Primitives",
        "GeneratorPosition",
        "Windows.UI.Xaml.Controls.Primitives",
        "GeneratorPosition",
        XAML,
    ),
    value("Windows.UI.Xaml", "GridLength", "Windows.UI.Xaml", "GridLength", XAML),
    value("Windows.UI.Xaml", "GridUnitType", "Windows.UI.Xaml", "GridUnitType", XAML),
    class(FOUNDATION, "HResult", "System", "Exception", RUNTIME),
    class(XAML_INTEROP, "IBindableIterable", "System.Collections", "IEnumerable", RUNTIME),
    class(XAML_INTEROP, "IBindableVector", "System.Collections", "IList", RUNTIME),
    class(FOUNDATION, "IClosable", "System", "IDisposable", RUNTIME),
    class("Windows.UI.Xaml.Input", "ICommand", "System.Windows.Input", "ICommand", OBJECT_MODEL),
    class(COLLECTIONS, "IIterable`1", GENERIC, "IEnumerable`1", RUNTIME),
    class(COLLECTIONS, "IIterator`1", GENERIC, "IEnumerator`1", RUNTIME),
    value(COLLECTIONS, "IKeyValuePair`2", GENERIC, "KeyValuePair`2", RUNTIME),
    class(COLLECTIONS, "IMapView`2", GENERIC, "IReadOnlyDictionary`2", RUNTIME),
    class(COLLECTIONS, "IMap`2", GENERIC, "IDictionary`2", RUNTIME),
    class(
        XAML_INTEROP,
        "INotifyCollectionChanged",
        "System.Collections.Specialized",
        "INotifyCollectionChanged",
        OBJECT_MODEL,
    ),
    class(
        "Windows.UI.Xaml.Data",
        "INotifyPropertyChanged",
        "System.ComponentModel",
        "INotifyPropertyChanged",
        OBJECT_MODEL,
    ),
    value(FOUNDATION, "IReference`1", "System", "Nullable`1", RUNTIME),
    class(COLLECTIONS, "IVectorView`1", GENERIC, "IReadOnlyList`1", RUNTIME),
    class(COLLECTIONS, "IVector`1", GENERIC, "IList`1", RUNTIME),
    value(XAML_ANIMATION, "KeyTime", XAML_ANIMATION, "KeyTime", XAML),
    value("Windows.UI.Xaml.Media", "Matrix", "Windows.UI.Xaml.Media", "Matrix", XAML),
    value(
        "Windows.UI.Xaml.Media.Media3D",
        "Matrix3D",
        "Windows.UI.Xaml.Media.Media3D",
        "Matrix3D",
        XAML,
    ),
    value(
        XAML_INTEROP,
        "NotifyCollectionChangedAction",
        "System.Collections.Specialized",
        "NotifyCollectionChangedAction",
        OBJECT_MODEL,
    ),
    class(
        XAML_INTEROP,
        "NotifyCollectionChangedEventArgs",
        "System.Collections.Specialized",
        "NotifyCollectionChangedEventArgs",
        OBJECT_MODEL,
    ),
    class(
        XAML_INTEROP,
        "NotifyCollectionChangedEventHandler",
        "System.Collections.Specialized",
        "NotifyCollectionChangedEventHandler",
        OBJECT_MODEL,
    ),
    value(FOUNDATION, "Point", FOUNDATION, "Point", WINDOWS_RUNTIME),
    class(
        "Windows.UI.Xaml.Data",
        "PropertyChangedEventArgs",
        "System.ComponentModel",
        "PropertyChangedEventArgs",
        OBJECT_MODEL,
    ),
    class(
        "Windows.UI.Xaml.Data",
        "PropertyChangedEventHandler",
        "System.ComponentModel",
        "PropertyChangedEventHandler",
        OBJECT_MODEL,
    ),
    value(FOUNDATION, "Rect", FOUNDATION, "Rect", WINDOWS_RUNTIME),
    value(XAML_ANIMATION, "RepeatBehavior", XAML_ANIMATION, "RepeatBehavior", XAML),
    value(XAML_ANIMATION, "RepeatBehaviorType", XAML_ANIMATION, "RepeatBehaviorType", XAML),
    value(FOUNDATION, "Size", FOUNDATION, "Size", WINDOWS_RUNTIME),
    value("Windows.UI.Xaml", "Thickness", "Windows.UI.Xaml", "Thickness", XAML),
    value(FOUNDATION, "TimeSpan", "System", "TimeSpan", RUNTIME),
    value(XAML_INTEROP, "TypeName", "System", "Type", RUNTIME),
    class(FOUNDATION, "Uri", "System", "Uri", RUNTIME),
];

/// The projection of the Windows Runtime type with simple name `name`, ignoring namespaces
#[must_use]
pub fn find_by_name(name: &str) -> Option<&'static Projection> {
    PROJECTIONS
        .binary_search_by(|projection| projection.winrt_name.cmp(name))
        .ok()
        .map(|index| &PROJECTIONS[index])
}

/// The projection of the Windows Runtime type `namespace.name`
#[must_use]
pub fn find(namespace: &str, name: &str) -> Option<&'static Projection> {
    find_by_name(name).filter(|projection| projection.winrt_namespace == namespace)
}
