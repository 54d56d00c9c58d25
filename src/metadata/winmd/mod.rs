//! Windows Runtime projection of `.winmd` metadata.
//!
//! Windows Runtime metadata describes types the way the Windows Runtime sees them. The CLR
//! presents them differently: a handful of well-known types are replaced by their .NET
//! equivalents, classes implemented in managed code are renamed, methods that only implement
//! redirected interfaces disappear and type references resolve into five assemblies that have
//! no `AssemblyRef` row.
//!
//! [`WinMdReader`] wraps a [`MetadataReader`] and returns the projected view of a row. The base
//! reader is never changed; every projection is recomputed from the raw row on each query.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilmeta::Module;
//! use std::path::Path;
//!
//! let module = Module::from_file(Path::new("Windows.Foundation.winmd"))?;
//! if let Some(winmd) = module.winmd() {
//!     for handle in module.reader().type_refs() {
//!         let projected = winmd.type_ref_props(handle)?;
//!         println!("{}.{}", projected.namespace, projected.name);
//!     }
//! }
//! # Ok::<(), cilmeta::Error>(())
//! ```
//!
//! # Reference
//! - ECMA-335 II.23.1.15 (`WindowsRuntime` type flag)

pub mod projections;

pub use projections::{ImpliedAssembly, Projection, ProjectionKind};

use std::borrow::Cow;

use crate::{
    file::parser::Parser,
    metadata::{
        constants::ELEMENT_TYPE,
        flags::{FieldAttributes, MethodAttributes, MethodImplAttributes, TypeAttributes},
        handles::{
            AssemblyRefHandle, FieldHandle, MemberRefHandle, MethodDefHandle, TypeDefHandle,
            TypeRefHandle, TypeSpecHandle,
        },
        identity::AssemblyIdentity,
        reader::{
            FieldDefProps, MemberRefProps, MetadataKind, MetadataReader, MethodDefProps,
            TypeRefProps,
        },
        tables::TableId,
        token::Token,
    },
    Result,
};

const CLR_PREFIX: &str = "<CLR>";
const WINRT_PREFIX: &str = "<WinRT>";
const XAML_NAMESPACE: &str = "Windows.UI.Xaml";

/// How a type definition is projected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDefTreatmentKind {
    /// Not projected
    None,
    /// A Windows Runtime type that is not an attribute
    NormalNonAttribute,
    /// A Windows Runtime attribute
    NormalAttribute,
    /// A managed implementation class whose `<CLR>` prefix is removed
    UnmangleWinRtName,
    /// A public managed Windows Runtime class that gets the `<WinRT>` prefix
    PrefixWinRtName,
    /// A well-known type replaced by a CLR type
    RedirectedToClrType,
    /// A well-known attribute replaced by a CLR attribute
    RedirectedToClrAttribute,
}

/// The projection applied to a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDefTreatment {
    /// The kind of projection
    pub kind: TypeDefTreatmentKind,
    /// The type is presented as abstract
    pub mark_abstract: bool,
    /// The type is presented as not public
    pub mark_internal: bool,
}

impl TypeDefTreatment {
    /// No projection
    pub const NONE: TypeDefTreatment = TypeDefTreatment::new(TypeDefTreatmentKind::None);

    const fn new(kind: TypeDefTreatmentKind) -> Self {
        TypeDefTreatment {
            kind,
            mark_abstract: false,
            mark_internal: false,
        }
    }

    /// True if the type is presented unchanged
    #[must_use]
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// The treatment as a kind in the low nibble and the `0x10` (abstract) and `0x20`
    /// (internal) modifier bits
    #[must_use]
    pub fn bits(&self) -> u8 {
        let kind = match self.kind {
            TypeDefTreatmentKind::None => 0,
            TypeDefTreatmentKind::NormalNonAttribute => 1,
            TypeDefTreatmentKind::NormalAttribute => 2,
            TypeDefTreatmentKind::UnmangleWinRtName => 3,
            TypeDefTreatmentKind::PrefixWinRtName => 4,
            TypeDefTreatmentKind::RedirectedToClrType => 5,
            TypeDefTreatmentKind::RedirectedToClrAttribute => 6,
        };

        kind | if self.mark_abstract { 0x10 } else { 0 } | if self.mark_internal { 0x20 } else { 0 }
    }
}

/// How a type reference is projected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRefTreatment {
    /// Not projected
    None,
    /// `System.MulticastDelegate`, resolved into `System.Runtime`
    SystemDelegate,
    /// `System.Attribute`, resolved into `System.Runtime`
    SystemAttribute,
    /// A well-known Windows Runtime type replaced by its CLR counterpart
    Projected(&'static Projection),
}

/// How a method definition is projected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodDefTreatmentKind {
    /// Not projected
    None,
    /// A method of a Windows Runtime class
    Other,
    /// A method of a Windows Runtime delegate
    DelegateMethod,
    /// A method of a Windows Runtime attribute
    AttributeMethod,
    /// A method of a Windows Runtime interface
    InterfaceMethod,
    /// A method of a managed implementation class
    Implementation,
    /// A method that only implements redirected interfaces and is hidden
    HiddenInterfaceImplementation,
    /// The implementation of `IClosable.Close`, presented as `Dispose`
    DisposeMethod,
}

/// The projection applied to a method definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodDefTreatment {
    /// The kind of projection
    pub kind: MethodDefTreatmentKind,
    /// The method is presented as abstract
    pub mark_abstract: bool,
    /// The method is presented as public
    pub mark_public: bool,
}

impl MethodDefTreatment {
    /// No projection
    pub const NONE: MethodDefTreatment = MethodDefTreatment::new(MethodDefTreatmentKind::None);

    const fn new(kind: MethodDefTreatmentKind) -> Self {
        MethodDefTreatment {
            kind,
            mark_abstract: false,
            mark_public: false,
        }
    }

    /// True if the method is presented unchanged
    #[must_use]
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// A projected `TypeDef` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedTypeDef<'a> {
    /// Projected type attributes
    pub flags: TypeAttributes,
    /// Projected name
    pub name: Cow<'a, str>,
    /// Namespace
    pub namespace: &'a str,
    /// Base type
    pub extends: Token,
    /// The treatment that produced this view
    pub treatment: TypeDefTreatment,
}

/// Projecting view over the metadata of a `.winmd` file
#[derive(Clone, Copy)]
pub struct WinMdReader<'a> {
    reader: &'a MetadataReader<'a>,
}

impl<'a> WinMdReader<'a> {
    /// Wrap `reader`. On plain ECMA-335 metadata every query returns the unprojected row.
    #[must_use]
    pub fn new(reader: &'a MetadataReader<'a>) -> Self {
        WinMdReader { reader }
    }

    /// The wrapped reader
    #[must_use]
    pub fn reader(&self) -> &'a MetadataReader<'a> {
        self.reader
    }

    /// The metadata flavor of the wrapped reader
    #[must_use]
    pub fn kind(&self) -> MetadataKind {
        self.reader.metadata_kind()
    }

    /// The projection of a type definition.
    ///
    /// # Errors
    /// Fails if the row, its base type or one of its attributes is malformed
    pub fn type_def_treatment(&self, handle: TypeDefHandle) -> Result<TypeDefTreatment> {
        let props = self.reader.type_def_props(handle)?;
        let flags = props.flags;
        let kind = self.kind();

        if flags.contains(TypeAttributes::WINDOWS_RUNTIME) {
            let base = match kind {
                MetadataKind::WindowsMetadata => {
                    if let Some(treatment) = well_known_treatment(props.namespace, props.name) {
                        return Ok(treatment);
                    }

                    if self.extends_system_type(props.extends, "Attribute")? {
                        TypeDefTreatmentKind::NormalAttribute
                    } else {
                        TypeDefTreatmentKind::NormalNonAttribute
                    }
                }
                MetadataKind::ManagedWindowsMetadata
                    if self.needs_winrt_prefix(flags, props.extends)? =>
                {
                    TypeDefTreatmentKind::PrefixWinRtName
                }
                _ => TypeDefTreatmentKind::None,
            };

            let mut treatment = TypeDefTreatment::new(base);
            if matches!(
                base,
                TypeDefTreatmentKind::PrefixWinRtName | TypeDefTreatmentKind::NormalNonAttribute
            ) && !flags.is_interface()
                && self.reader.has_attribute(
                    handle.token(),
                    XAML_NAMESPACE,
                    "TreatAsAbstractComposableClassAttribute",
                )?
            {
                treatment.mark_abstract = true;
            }

            Ok(treatment)
        } else if kind == MetadataKind::ManagedWindowsMetadata
            && is_clr_implementation_type(flags, props.name)
        {
            Ok(TypeDefTreatment::new(TypeDefTreatmentKind::UnmangleWinRtName))
        } else {
            Ok(TypeDefTreatment::NONE)
        }
    }

    /// The projected view of a type definition.
    ///
    /// # Errors
    /// See [`WinMdReader::type_def_treatment`]
    pub fn type_def_props(&self, handle: TypeDefHandle) -> Result<ProjectedTypeDef<'a>> {
        let props = self.reader.type_def_props(handle)?;
        let treatment = self.type_def_treatment(handle)?;

        let mut flags = props.flags;
        match treatment.kind {
            TypeDefTreatmentKind::None => {}
            TypeDefTreatmentKind::NormalNonAttribute => {
                flags |= TypeAttributes::WINDOWS_RUNTIME | TypeAttributes::IMPORT;
            }
            TypeDefTreatmentKind::NormalAttribute => {
                flags |= TypeAttributes::WINDOWS_RUNTIME | TypeAttributes::SEALED;
            }
            TypeDefTreatmentKind::UnmangleWinRtName => {
                flags = (flags - TypeAttributes::SPECIAL_NAME) | TypeAttributes::PUBLIC;
            }
            TypeDefTreatmentKind::PrefixWinRtName | TypeDefTreatmentKind::RedirectedToClrType => {
                flags = (flags - TypeAttributes::PUBLIC) | TypeAttributes::IMPORT;
            }
            TypeDefTreatmentKind::RedirectedToClrAttribute => {
                flags -= TypeAttributes::PUBLIC;
            }
        }
        if treatment.mark_abstract {
            flags |= TypeAttributes::ABSTRACT;
        }
        if treatment.mark_internal {
            flags -= TypeAttributes::PUBLIC;
        }

        let name = match treatment.kind {
            TypeDefTreatmentKind::UnmangleWinRtName => Cow::Borrowed(
                props
                    .name
                    .strip_prefix(CLR_PREFIX)
                    .unwrap_or(props.name),
            ),
            TypeDefTreatmentKind::PrefixWinRtName => {
                Cow::Owned(format!("{WINRT_PREFIX}{}", props.name))
            }
            _ => Cow::Borrowed(props.name),
        };

        Ok(ProjectedTypeDef {
            flags,
            name,
            namespace: props.namespace,
            extends: props.extends,
            treatment,
        })
    }

    /// The projection of a type reference.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or its names do not exist
    pub fn type_ref_treatment(&self, handle: TypeRefHandle) -> Result<TypeRefTreatment> {
        if self.kind() == MetadataKind::Ecma335 {
            return Ok(TypeRefTreatment::None);
        }

        let props = self.reader.type_ref_props(handle)?;
        if let Some(projection) = projections::find(props.namespace, props.name) {
            return Ok(TypeRefTreatment::Projected(projection));
        }

        Ok(special_type_ref_treatment(props.namespace, props.name))
    }

    /// The projected view of a type reference.
    ///
    /// Projected references resolve into one of the implied assembly references, see
    /// [`WinMdReader::implied_assembly_ref`].
    ///
    /// # Errors
    /// See [`WinMdReader::type_ref_treatment`]
    pub fn type_ref_props(&self, handle: TypeRefHandle) -> Result<TypeRefProps<'a>> {
        let props = self.reader.type_ref_props(handle)?;

        Ok(match self.type_ref_treatment(handle)? {
            TypeRefTreatment::None => props,
            TypeRefTreatment::SystemDelegate | TypeRefTreatment::SystemAttribute => TypeRefProps {
                resolution_scope: self
                    .implied_assembly_ref(ImpliedAssembly::SystemRuntime)
                    .token(),
                ..props
            },
            TypeRefTreatment::Projected(projection) => TypeRefProps {
                resolution_scope: self.implied_assembly_ref(projection.assembly).token(),
                name: projection.clr_name,
                namespace: projection.clr_namespace,
            },
        })
    }

    /// Number of assembly references, physical rows followed by the implied ones
    #[must_use]
    pub fn assembly_ref_count(&self) -> u32 {
        let physical = self.reader.row_count(TableId::AssemblyRef);
        if self.kind() == MetadataKind::Ecma335 {
            physical
        } else {
            physical + ImpliedAssembly::COUNT
        }
    }

    /// All assembly references including the implied ones
    pub fn assembly_refs(&self) -> impl Iterator<Item = AssemblyRefHandle> {
        (1..=self.assembly_ref_count()).map(AssemblyRefHandle::new)
    }

    /// Handle of an implied assembly reference; it follows the physical `AssemblyRef` rows
    #[must_use]
    pub fn implied_assembly_ref(&self, assembly: ImpliedAssembly) -> AssemblyRefHandle {
        AssemblyRefHandle::new(self.reader.row_count(TableId::AssemblyRef) + assembly.index() + 1)
    }

    /// The implied assembly behind `handle`, `None` for physical rows
    #[must_use]
    pub fn implied_assembly(&self, handle: AssemblyRefHandle) -> Option<ImpliedAssembly> {
        if self.kind() == MetadataKind::Ecma335 {
            return None;
        }

        handle
            .rid()
            .checked_sub(self.reader.row_count(TableId::AssemblyRef) + 1)
            .and_then(ImpliedAssembly::from_index)
    }

    /// Identity of a physical or implied assembly reference.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] for handles past the implied references, and
    /// see [`MetadataReader::assembly_ref_identity`] for physical rows
    pub fn assembly_ref_identity(&self, handle: AssemblyRefHandle) -> Result<AssemblyIdentity> {
        if let Some(implied) = self.implied_assembly(handle) {
            return Ok(implied.identity());
        }

        self.reader.assembly_ref_identity(handle)
    }

    /// The projection of a method definition.
    ///
    /// # Errors
    /// Fails if the method, its declaring type, its method implementations or its attributes
    /// are malformed
    pub fn method_def_treatment(&self, handle: MethodDefHandle) -> Result<MethodDefTreatment> {
        let kind = self.kind();
        if kind == MetadataKind::Ecma335 {
            return Ok(MethodDefTreatment::NONE);
        }

        let Some(parent) = self.reader.find_containing_type(handle) else {
            return Ok(MethodDefTreatment::NONE);
        };
        let parent_props = self.reader.type_def_props(parent)?;
        let flags = parent_props.flags;

        let mut treatment = if flags.contains(TypeAttributes::WINDOWS_RUNTIME) {
            if is_clr_implementation_type(flags, parent_props.name) || flags.is_nested() {
                MethodDefTreatment::new(MethodDefTreatmentKind::Implementation)
            } else if flags.is_interface() {
                MethodDefTreatment::new(MethodDefTreatmentKind::InterfaceMethod)
            } else if kind == MetadataKind::ManagedWindowsMetadata
                && !flags.contains(TypeAttributes::PUBLIC)
            {
                MethodDefTreatment::new(MethodDefTreatmentKind::Implementation)
            } else {
                match self.base_type_treatment(parent_props.extends)? {
                    TypeRefTreatment::SystemAttribute => {
                        MethodDefTreatment::new(MethodDefTreatmentKind::AttributeMethod)
                    }
                    TypeRefTreatment::SystemDelegate => MethodDefTreatment {
                        mark_public: true,
                        ..MethodDefTreatment::new(MethodDefTreatmentKind::DelegateMethod)
                    },
                    _ => MethodDefTreatment::new(MethodDefTreatmentKind::Other),
                }
            }
        } else if kind == MetadataKind::ManagedWindowsMetadata
            && is_clr_implementation_type(flags, parent_props.name)
        {
            MethodDefTreatment::new(MethodDefTreatmentKind::Implementation)
        } else {
            MethodDefTreatment::NONE
        };

        if treatment.kind == MethodDefTreatmentKind::Other {
            treatment.kind = self.interface_implementation_kind(parent, handle)?;
        }

        if treatment.kind == MethodDefTreatmentKind::Other {
            for attribute in self.reader.custom_attributes(handle.token()) {
                match self.reader.attribute_type_name(attribute)? {
                    Some((XAML_NAMESPACE, "TreatAsPublicMethodAttribute")) => {
                        treatment.mark_public = true;
                    }
                    Some((XAML_NAMESPACE, "TreatAsAbstractMethodAttribute")) => {
                        treatment.mark_abstract = true;
                    }
                    _ => {}
                }
            }
        }

        Ok(treatment)
    }

    /// The projected view of a method definition.
    ///
    /// Projected methods report an RVA of 0.
    ///
    /// # Errors
    /// See [`WinMdReader::method_def_treatment`]
    pub fn method_def_props(&self, handle: MethodDefHandle) -> Result<MethodDefProps<'a>> {
        let mut props = self.reader.method_def_props(handle)?;
        let treatment = self.method_def_treatment(handle)?;
        if treatment.is_none() {
            return Ok(props);
        }

        if treatment.kind == MethodDefTreatmentKind::HiddenInterfaceImplementation {
            props.flags = props.flags.with_access(MethodAttributes::PRIVATE);
        }
        if treatment.mark_abstract {
            props.flags |= MethodAttributes::ABSTRACT;
        }
        if treatment.mark_public {
            props.flags = props.flags.with_access(MethodAttributes::PUBLIC);
        }
        props.flags |= MethodAttributes::HIDE_BY_SIG;

        match treatment.kind {
            MethodDefTreatmentKind::DelegateMethod => {
                props.impl_flags |= MethodImplAttributes::RUNTIME;
            }
            MethodDefTreatmentKind::DisposeMethod
            | MethodDefTreatmentKind::AttributeMethod
            | MethodDefTreatmentKind::InterfaceMethod
            | MethodDefTreatmentKind::HiddenInterfaceImplementation
            | MethodDefTreatmentKind::Other => {
                props.impl_flags |= MethodImplAttributes::RUNTIME | MethodImplAttributes::INTERNAL_CALL;
            }
            MethodDefTreatmentKind::None | MethodDefTreatmentKind::Implementation => {}
        }

        if treatment.kind == MethodDefTreatmentKind::DisposeMethod {
            props.name = "Dispose";
        }
        props.rva = 0;

        Ok(props)
    }

    /// The projected view of a field definition; the `value__` field of a Windows Runtime
    /// enum is presented as public.
    ///
    /// # Errors
    /// Fails if the field or its declaring type is malformed
    pub fn field_def_props(&self, handle: FieldHandle) -> Result<FieldDefProps<'a>> {
        let mut props = self.reader.field_def_props(handle)?;
        if self.kind() == MetadataKind::Ecma335
            || !props.flags.contains(FieldAttributes::RT_SPECIAL_NAME)
            || props.name != "value__"
        {
            return Ok(props);
        }

        let Some(parent) = self.reader.find_field_containing_type(handle) else {
            return Ok(props);
        };
        let extends = self.reader.type_def_extends(parent)?;
        if self.extends_system_type(extends, "Enum")? {
            props.flags = (props.flags - FieldAttributes::FIELD_ACCESS_MASK) | FieldAttributes::PUBLIC;
        }

        Ok(props)
    }

    /// The projected view of a member reference; `IClosable.Close` is presented as `Dispose`.
    ///
    /// # Errors
    /// Fails if the row, its parent or a parent type specification is malformed
    pub fn member_ref_props(&self, handle: MemberRefHandle) -> Result<MemberRefProps<'a>> {
        let mut props = self.reader.member_ref_props(handle)?;
        if self.kind() == MetadataKind::Ecma335 || props.name != "Close" {
            return Ok(props);
        }

        if self
            .redirected_interface(props.class)?
            .is_some_and(Projection::is_idisposable)
        {
            props.name = "Dispose";
        }

        Ok(props)
    }

    fn interface_implementation_kind(
        &self,
        parent: TypeDefHandle,
        method: MethodDefHandle,
    ) -> Result<MethodDefTreatmentKind> {
        let mut seen_redirected = false;
        let mut seen_other = false;

        for implementation in self.reader.method_impls(parent) {
            let props = self.reader.method_impl_props(implementation)?;
            if props.body != method.token() {
                continue;
            }

            let redirected = if props.declaration.is_table(TableId::MemberRef) {
                let declaration = MemberRefHandle::new(props.declaration.row());
                self.redirected_interface(self.reader.member_ref_props(declaration)?.class)?
            } else {
                None
            };

            match redirected {
                Some(projection) if projection.is_idisposable() => {
                    return Ok(MethodDefTreatmentKind::DisposeMethod);
                }
                Some(_) => seen_redirected = true,
                None => seen_other = true,
            }
        }

        Ok(if seen_redirected && !seen_other {
            MethodDefTreatmentKind::HiddenInterfaceImplementation
        } else {
            MethodDefTreatmentKind::Other
        })
    }

    // The projection of the interface `parent` refers to. Redirected interfaces are always
    // referenced through a `TypeRef`, or a generic instantiation of one.
    fn redirected_interface(&self, parent: Token) -> Result<Option<&'static Projection>> {
        let type_ref = match parent.table_id() {
            Some(TableId::TypeRef) => parent,
            Some(TableId::TypeSpec) => {
                let signature = self
                    .reader
                    .type_spec_signature(TypeSpecHandle::new(parent.row()))?;
                if signature.len() < 2
                    || signature[0] != ELEMENT_TYPE::GENERICINST
                    || signature[1] != ELEMENT_TYPE::CLASS
                {
                    return Ok(None);
                }

                let mut parser = Parser::new(&signature[2..]);
                let token = parser.read_compressed_token()?;
                if !token.is_table(TableId::TypeRef) {
                    return Ok(None);
                }
                token
            }
            _ => return Ok(None),
        };

        let props = self
            .reader
            .type_ref_props(TypeRefHandle::new(type_ref.row()))?;
        Ok(projections::find(props.namespace, props.name))
    }

    fn base_type_treatment(&self, extends: Token) -> Result<TypeRefTreatment> {
        if !extends.is_table(TableId::TypeRef) {
            return Ok(TypeRefTreatment::None);
        }

        let props = self.reader.type_ref_props(TypeRefHandle::new(extends.row()))?;
        Ok(special_type_ref_treatment(props.namespace, props.name))
    }

    fn extends_system_type(&self, extends: Token, name: &str) -> Result<bool> {
        if !extends.is_table(TableId::TypeRef) {
            return Ok(false);
        }

        let props = self.reader.type_ref_props(TypeRefHandle::new(extends.row()))?;
        Ok(props.namespace == "System" && props.name == name)
    }

    fn needs_winrt_prefix(&self, flags: TypeAttributes, extends: Token) -> Result<bool> {
        if flags & (TypeAttributes::VISIBILITY_MASK | TypeAttributes::INTERFACE)
            != TypeAttributes::PUBLIC
        {
            return Ok(false);
        }
        if !extends.is_table(TableId::TypeRef) {
            return Ok(false);
        }

        for system_base in ["MulticastDelegate", "ValueType", "Attribute"] {
            if self.extends_system_type(extends, system_base)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

fn well_known_treatment(namespace: &str, name: &str) -> Option<TypeDefTreatment> {
    let projection = projections::find_by_name(name)?;
    let kind = match projection.kind {
        ProjectionKind::RedirectedToClrType => TypeDefTreatmentKind::RedirectedToClrType,
        ProjectionKind::RedirectedToClrAttribute => TypeDefTreatmentKind::RedirectedToClrAttribute,
    };

    if namespace == projection.clr_namespace {
        Some(TypeDefTreatment::new(kind))
    } else if namespace == projection.winrt_namespace {
        Some(TypeDefTreatment {
            mark_internal: true,
            ..TypeDefTreatment::new(kind)
        })
    } else {
        None
    }
}

fn special_type_ref_treatment(namespace: &str, name: &str) -> TypeRefTreatment {
    match (namespace, name) {
        ("System", "MulticastDelegate") => TypeRefTreatment::SystemDelegate,
        ("System", "Attribute") => TypeRefTreatment::SystemAttribute,
        _ => TypeRefTreatment::None,
    }
}

fn is_clr_implementation_type(flags: TypeAttributes, name: &str) -> bool {
    flags & (TypeAttributes::VISIBILITY_MASK | TypeAttributes::SPECIAL_NAME)
        == TypeAttributes::SPECIAL_NAME
        && name.starts_with(CLR_PREFIX)
}
