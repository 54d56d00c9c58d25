//! Attribute flag sets of the metadata tables.
//!
//! Every flag column is exposed as a `bitflags` type. Unknown bits are retained, so a value read
//! from a table converts back to the exact column value. Multi-bit fields such as visibility or
//! layout are exposed through masks and small accessor enums.
//!
//! # Reference
//! - ECMA-335 II.23.1

use bitflags::bitflags;

bitflags! {
    /// Flags of a `TypeDef` row (ECMA-335 II.23.1.15)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeAttributes: u32 {
        /// Mask for the visibility bits
        const VISIBILITY_MASK = 0x0000_0007;
        /// Class has no public scope
        const NOT_PUBLIC = 0x0000_0000;
        /// Class has public scope
        const PUBLIC = 0x0000_0001;
        /// Class is nested with public visibility
        const NESTED_PUBLIC = 0x0000_0002;
        /// Class is nested with private visibility
        const NESTED_PRIVATE = 0x0000_0003;
        /// Class is nested with family visibility
        const NESTED_FAMILY = 0x0000_0004;
        /// Class is nested with assembly visibility
        const NESTED_ASSEMBLY = 0x0000_0005;
        /// Class is nested with family and assembly visibility
        const NESTED_FAM_AND_ASSEM = 0x0000_0006;
        /// Class is nested with family or assembly visibility
        const NESTED_FAM_OR_ASSEM = 0x0000_0007;

        /// Mask for the layout bits
        const LAYOUT_MASK = 0x0000_0018;
        /// Class fields are auto-laid out
        const AUTO_LAYOUT = 0x0000_0000;
        /// Class fields are laid out sequentially
        const SEQUENTIAL_LAYOUT = 0x0000_0008;
        /// Layout is supplied explicitly
        const EXPLICIT_LAYOUT = 0x0000_0010;

        /// Mask for the class semantics bit
        const CLASS_SEMANTICS_MASK = 0x0000_0020;
        /// Type is an interface
        const INTERFACE = 0x0000_0020;

        /// Class is abstract
        const ABSTRACT = 0x0000_0080;
        /// Class cannot be extended
        const SEALED = 0x0000_0100;
        /// Class name is special
        const SPECIAL_NAME = 0x0000_0400;
        /// Class or interface is imported
        const IMPORT = 0x0000_1000;
        /// Reserved, class is serializable
        const SERIALIZABLE = 0x0000_2000;
        /// Type is a Windows Runtime type
        const WINDOWS_RUNTIME = 0x0000_4000;

        /// Mask for the string format bits
        const STRING_FORMAT_MASK = 0x0003_0000;
        /// LPSTR is interpreted as ANSI
        const ANSI_CLASS = 0x0000_0000;
        /// LPSTR is interpreted as Unicode
        const UNICODE_CLASS = 0x0001_0000;
        /// LPSTR is interpreted automatically
        const AUTO_CLASS = 0x0002_0000;
        /// A non-standard encoding specified by `CUSTOM_STRING_FORMAT_MASK`
        const CUSTOM_FORMAT_CLASS = 0x0003_0000;
        /// Bits of the non-standard encoding
        const CUSTOM_STRING_FORMAT_MASK = 0x00C0_0000;

        /// Initialize the class before first static field access
        const BEFORE_FIELD_INIT = 0x0010_0000;
        /// The runtime should check the name encoding
        const RT_SPECIAL_NAME = 0x0000_0800;
        /// Class has security associated with it
        const HAS_SECURITY = 0x0004_0000;
        /// The type is an exported type forwarder (`ExportedType` rows only)
        const IS_TYPE_FORWARDER = 0x0020_0000;
    }
}

/// Layout kind of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// Fields are laid out by the runtime
    Auto,
    /// Fields are laid out in declaration order
    Sequential,
    /// Field offsets are given explicitly
    Explicit,
}

impl TypeAttributes {
    /// The visibility bits
    #[must_use]
    pub fn visibility(self) -> TypeAttributes {
        self & TypeAttributes::VISIBILITY_MASK
    }

    /// True if the visibility marks the type as nested
    #[must_use]
    pub fn is_nested(self) -> bool {
        self.visibility().bits() >= TypeAttributes::NESTED_PUBLIC.bits()
    }

    /// True for interfaces
    #[must_use]
    pub fn is_interface(self) -> bool {
        self.contains(TypeAttributes::INTERFACE)
    }

    /// True for types with `Public` or `NestedPublic` visibility
    #[must_use]
    pub fn is_public(self) -> bool {
        let visibility = self.visibility();
        visibility == TypeAttributes::PUBLIC || visibility == TypeAttributes::NESTED_PUBLIC
    }

    /// The layout kind, `None` for the reserved layout value
    #[must_use]
    pub fn layout(self) -> Option<LayoutKind> {
        match (self & TypeAttributes::LAYOUT_MASK).bits() {
            0x00 => Some(LayoutKind::Auto),
            0x08 => Some(LayoutKind::Sequential),
            0x10 => Some(LayoutKind::Explicit),
            _ => None,
        }
    }
}

bitflags! {
    /// Flags of a `Field` row (ECMA-335 II.23.1.5)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldAttributes: u16 {
        /// Mask for the accessibility bits
        const FIELD_ACCESS_MASK = 0x0007;
        /// Member not referenceable
        const COMPILER_CONTROLLED = 0x0000;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessible by anyone in the assembly
        const ASSEMBLY = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessible by sub-types anywhere, plus anyone in the assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessible by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Field can only be initialized, not written to after init
        const INIT_ONLY = 0x0020;
        /// Value is a compile time constant
        const LITERAL = 0x0040;
        /// Reserved, field does not have to be serialized
        const NOT_SERIALIZED = 0x0080;
        /// Field is special
        const SPECIAL_NAME = 0x0200;
        /// Implementation is forwarded through `PInvoke`
        const PINVOKE_IMPL = 0x2000;
        /// The runtime should check the name encoding
        const RT_SPECIAL_NAME = 0x0400;
        /// Field has marshalling information
        const HAS_FIELD_MARSHAL = 0x1000;
        /// Field has a default value
        const HAS_DEFAULT = 0x8000;
        /// Field has an RVA
        const HAS_FIELD_RVA = 0x0100;
    }
}

bitflags! {
    /// Flags of a `MethodDef` row (ECMA-335 II.23.1.10)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodAttributes: u16 {
        /// Mask for the accessibility bits
        const MEMBER_ACCESS_MASK = 0x0007;
        /// Member not referenceable
        const COMPILER_CONTROLLED = 0x0000;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessible by anyone in the assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessible by sub-types anywhere, plus anyone in the assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessible by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name and signature, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
        /// Method can only be overridden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// The runtime should check the name encoding
        const RT_SPECIAL_NAME = 0x1000;
        /// Implementation is forwarded through `PInvoke`
        const PINVOKE_IMPL = 0x2000;
        /// Method has security associated with it
        const HAS_SECURITY = 0x4000;
        /// Method calls another method containing security code
        const REQUIRE_SEC_OBJECT = 0x8000;
        /// Reserved, shall be zero for conforming implementations
        const UNMANAGED_EXPORT = 0x0008;
    }
}

impl MethodAttributes {
    /// Replace the accessibility bits with `access`
    #[must_use]
    pub fn with_access(self, access: MethodAttributes) -> MethodAttributes {
        (self - MethodAttributes::MEMBER_ACCESS_MASK) | (access & MethodAttributes::MEMBER_ACCESS_MASK)
    }
}

bitflags! {
    /// Implementation flags of a `MethodDef` row (ECMA-335 II.23.1.11)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodImplAttributes: u16 {
        /// Mask for the code type bits
        const CODE_TYPE_MASK = 0x0003;
        /// Method implementation is CIL
        const IL = 0x0000;
        /// Method implementation is native
        const NATIVE = 0x0001;
        /// Reserved, shall be zero in conforming implementations
        const OPTIL = 0x0002;
        /// Method implementation is provided by the runtime
        const RUNTIME = 0x0003;
        /// Method is unmanaged, otherwise managed
        const UNMANAGED = 0x0004;
        /// Method cannot be inlined
        const NO_INLINING = 0x0008;
        /// Indicates method is defined; used primarily in merge scenarios
        const FORWARD_REF = 0x0010;
        /// Method is single threaded through the body
        const SYNCHRONIZED = 0x0020;
        /// Method will not be optimized when generating native code
        const NO_OPTIMIZATION = 0x0040;
        /// Method signature is exported exactly as declared
        const PRESERVE_SIG = 0x0080;
        /// Method should be inlined if possible
        const AGGRESSIVE_INLINING = 0x0100;
        /// Method may contain hot code and should be aggressively optimized
        const AGGRESSIVE_OPTIMIZATION = 0x0200;
        /// Reserved for internal use
        const INTERNAL_CALL = 0x1000;
    }
}

bitflags! {
    /// Flags of a `Param` row (ECMA-335 II.23.1.13)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParamAttributes: u16 {
        /// Parameter is `[In]`
        const IN = 0x0001;
        /// Parameter is `[Out]`
        const OUT = 0x0002;
        /// Parameter is optional
        const OPTIONAL = 0x0010;
        /// Parameter has a default value
        const HAS_DEFAULT = 0x1000;
        /// Parameter has marshalling information
        const HAS_FIELD_MARSHAL = 0x2000;
    }
}

bitflags! {
    /// Flags of a `Property` row (ECMA-335 II.23.1.14)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyAttributes: u16 {
        /// Property is special
        const SPECIAL_NAME = 0x0200;
        /// The runtime should check the name encoding
        const RT_SPECIAL_NAME = 0x0400;
        /// Property has a default value
        const HAS_DEFAULT = 0x1000;
    }
}

bitflags! {
    /// Flags of an `Event` row (ECMA-335 II.23.1.4)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventAttributes: u16 {
        /// Event is special
        const SPECIAL_NAME = 0x0200;
        /// The runtime should check the name encoding
        const RT_SPECIAL_NAME = 0x0400;
    }
}

bitflags! {
    /// Semantics of a `MethodSemantics` row (ECMA-335 II.23.1.12)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodSemanticsAttributes: u16 {
        /// Property setter
        const SETTER = 0x0001;
        /// Property getter
        const GETTER = 0x0002;
        /// Other method of a property or event
        const OTHER = 0x0004;
        /// Event `add` accessor
        const ADD_ON = 0x0008;
        /// Event `remove` accessor
        const REMOVE_ON = 0x0010;
        /// Event `raise` accessor
        const FIRE = 0x0020;
    }
}

bitflags! {
    /// Flags of a `GenericParam` row (ECMA-335 II.23.1.7)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GenericParamAttributes: u16 {
        /// Mask for the variance bits
        const VARIANCE_MASK = 0x0003;
        /// The parameter is invariant
        const NONE = 0x0000;
        /// The parameter is covariant
        const COVARIANT = 0x0001;
        /// The parameter is contravariant
        const CONTRAVARIANT = 0x0002;
        /// Mask for the special constraint bits
        const SPECIAL_CONSTRAINT_MASK = 0x001C;
        /// The type argument must be a reference type
        const REFERENCE_TYPE_CONSTRAINT = 0x0004;
        /// The type argument must be a non-nullable value type
        const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT = 0x0008;
        /// The type argument must have a public default constructor
        const DEFAULT_CONSTRUCTOR_CONSTRAINT = 0x0010;
        /// The type argument may be a by-ref-like type
        const ALLOW_BY_REF_LIKE = 0x0020;
    }
}

bitflags! {
    /// Flags of an `ImplMap` row (ECMA-335 II.23.1.8)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PInvokeAttributes: u16 {
        /// `PInvoke` is to use the member name as specified
        const NO_MANGLE = 0x0001;
        /// Mask for the character set bits
        const CHAR_SET_MASK = 0x0006;
        /// Strings are marshalled as ANSI
        const CHAR_SET_ANSI = 0x0002;
        /// Strings are marshalled as Unicode
        const CHAR_SET_UNICODE = 0x0004;
        /// Character set is chosen by the platform
        const CHAR_SET_AUTO = 0x0006;
        /// Best fit mapping is enabled
        const BEST_FIT_ENABLED = 0x0010;
        /// Best fit mapping is disabled
        const BEST_FIT_DISABLED = 0x0020;
        /// The callee calls `SetLastError`
        const SUPPORTS_LAST_ERROR = 0x0040;
        /// Mask for the calling convention bits
        const CALL_CONV_MASK = 0x0700;
        /// Platform default calling convention
        const CALL_CONV_WINAPI = 0x0100;
        /// `cdecl`
        const CALL_CONV_CDECL = 0x0200;
        /// `stdcall`
        const CALL_CONV_STDCALL = 0x0300;
        /// `thiscall`
        const CALL_CONV_THISCALL = 0x0400;
        /// `fastcall`
        const CALL_CONV_FASTCALL = 0x0500;
        /// Throw on unmappable characters
        const THROW_ON_UNMAPPABLE_ENABLED = 0x1000;
        /// Do not throw on unmappable characters
        const THROW_ON_UNMAPPABLE_DISABLED = 0x2000;
    }
}

bitflags! {
    /// Flags of an `Assembly` or `AssemblyRef` row (ECMA-335 II.23.1.2)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AssemblyFlags: u32 {
        /// The assembly reference holds the full public key, not the token
        const PUBLIC_KEY = 0x0001;
        /// The implementation of this assembly may be retargeted at runtime
        const RETARGETABLE = 0x0100;
        /// Mask for the content type bits
        const CONTENT_TYPE_MASK = 0x0E00;
        /// The assembly contains Windows Runtime code
        const WINDOWS_RUNTIME = 0x0200;
        /// JIT tracking is disabled
        const DISABLE_JIT_COMPILE_OPTIMIZER = 0x4000;
        /// JIT tracking is enabled
        const ENABLE_JIT_COMPILE_TRACKING = 0x8000;
    }
}

bitflags! {
    /// Flags of a `ManifestResource` row (ECMA-335 II.23.1.9)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ManifestResourceAttributes: u32 {
        /// Mask for the visibility bits
        const VISIBILITY_MASK = 0x0007;
        /// The resource is exported from the assembly
        const PUBLIC = 0x0001;
        /// The resource is private to the assembly
        const PRIVATE = 0x0002;
    }
}

bitflags! {
    /// Flags of a `File` row (ECMA-335 II.23.1.6)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FileAttributes: u32 {
        /// The file does not contain metadata
        const CONTAINS_NO_METADATA = 0x0001;
    }
}

/// Hash algorithm of the `Assembly` row (ECMA-335 II.23.1.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssemblyHashAlgorithm {
    /// No hash
    None,
    /// MD5
    Md5,
    /// SHA-1
    Sha1,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// A value this crate does not know
    Unknown(u32),
}

impl AssemblyHashAlgorithm {
    /// Map the raw column value
    #[must_use]
    pub fn from_u32(value: u32) -> AssemblyHashAlgorithm {
        match value {
            0x0000 => AssemblyHashAlgorithm::None,
            0x8003 => AssemblyHashAlgorithm::Md5,
            0x8004 => AssemblyHashAlgorithm::Sha1,
            0x800C => AssemblyHashAlgorithm::Sha256,
            0x800D => AssemblyHashAlgorithm::Sha384,
            0x800E => AssemblyHashAlgorithm::Sha512,
            other => AssemblyHashAlgorithm::Unknown(other),
        }
    }

    /// The raw column value
    #[must_use]
    pub fn to_u32(self) -> u32 {
        match self {
            AssemblyHashAlgorithm::None => 0x0000,
            AssemblyHashAlgorithm::Md5 => 0x8003,
            AssemblyHashAlgorithm::Sha1 => 0x8004,
            AssemblyHashAlgorithm::Sha256 => 0x800C,
            AssemblyHashAlgorithm::Sha384 => 0x800D,
            AssemblyHashAlgorithm::Sha512 => 0x800E,
            AssemblyHashAlgorithm::Unknown(value) => value,
        }
    }
}
