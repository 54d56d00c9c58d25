//! Type definitions, type references and type specifications.

use std::{borrow::Cow, collections::BTreeMap, ops::Range};

use crate::{
    metadata::{
        flags::{LayoutKind, TypeAttributes},
        handles::{
            FieldHandle, InterfaceImplHandle, MethodDefHandle, TypeDefHandle, TypeRefHandle,
            TypeSpecHandle,
        },
        reader::MetadataReader,
        tables::{
            schema::{classlayout, interfaceimpl, nestedclass, typedef, typeref, typespec},
            TableId,
        },
        token::Token,
    },
    Result,
};

/// Columns of a `TypeDef` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefProps<'a> {
    /// Type attributes
    pub flags: TypeAttributes,
    /// Simple name
    pub name: &'a str,
    /// Namespace, empty for the global namespace and usually for nested types
    pub namespace: &'a str,
    /// Base type (`TypeDef`, `TypeRef` or `TypeSpec`), nil for interfaces and `System.Object`
    pub extends: Token,
    /// Run of the field list, in list positions
    pub field_list: Range<u32>,
    /// Run of the method list, in list positions
    pub method_list: Range<u32>,
}

/// Columns of a `TypeRef` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRefProps<'a> {
    /// `Module`, `ModuleRef`, `AssemblyRef` or enclosing `TypeRef`; nil for exported types
    pub resolution_scope: Token,
    /// Simple name
    pub name: &'a str,
    /// Namespace
    pub namespace: &'a str,
}

/// Columns of an `InterfaceImpl` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceImplProps {
    /// The implementing type
    pub class: TypeDefHandle,
    /// The implemented interface (`TypeDef`, `TypeRef` or `TypeSpec`)
    pub interface: Token,
}

/// Explicit layout information of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLayout {
    /// Layout kind
    pub kind: LayoutKind,
    /// Class size in bytes, 0 if unspecified
    pub size: u32,
    /// Packing size, 0 if unspecified
    pub packing: u16,
}

impl Default for TypeLayout {
    fn default() -> Self {
        TypeLayout {
            kind: LayoutKind::Auto,
            size: 0,
            packing: 0,
        }
    }
}

impl<'a> MetadataReader<'a> {
    /// All type definitions, including `<Module>`
    pub fn type_defs(&self) -> impl Iterator<Item = TypeDefHandle> {
        (1..=self.row_count(TableId::TypeDef)).map(TypeDefHandle::new)
    }

    /// Type definitions that are not nested in another type
    pub fn top_level_types(&self) -> impl Iterator<Item = TypeDefHandle> + '_ {
        self.table(TableId::TypeDef)
            .iter()
            .filter(|row| !TypeAttributes::from_bits_retain(row.get(typedef::FLAGS)).is_nested())
            .map(|row| TypeDefHandle::new(row.rid()))
    }

    /// Columns of a `TypeDef` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] for rows that do not exist or names past `#Strings`,
    /// and [`crate::Error::BadImageFormat`] for a malformed `Extends` column
    pub fn type_def_props(&self, handle: TypeDefHandle) -> Result<TypeDefProps<'a>> {
        let row = self.row(TableId::TypeDef, handle.rid())?;

        Ok(TypeDefProps {
            flags: TypeAttributes::from_bits_retain(row.get(typedef::FLAGS)),
            name: self.string_column(&row, typedef::NAME)?,
            namespace: self.string_column(&row, typedef::NAMESPACE)?,
            extends: row.reference(typedef::EXTENDS)?,
            field_list: self.list_range(
                TableId::TypeDef,
                handle.rid(),
                typedef::FIELD_LIST,
                TableId::Field,
            ),
            method_list: self.list_range(
                TableId::TypeDef,
                handle.rid(),
                typedef::METHOD_LIST,
                TableId::MethodDef,
            ),
        })
    }

    /// Type attributes of a `TypeDef` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist
    pub fn type_def_flags(&self, handle: TypeDefHandle) -> Result<TypeAttributes> {
        let row = self.row(TableId::TypeDef, handle.rid())?;
        Ok(TypeAttributes::from_bits_retain(row.get(typedef::FLAGS)))
    }

    /// Name of a type definition.
    ///
    /// Nested types normally carry an empty namespace. Some compilers emit one anyway; for those
    /// the namespace is folded into the returned name.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist
    pub fn type_def_name(&self, handle: TypeDefHandle) -> Result<Cow<'a, str>> {
        let row = self.row(TableId::TypeDef, handle.rid())?;
        let flags = TypeAttributes::from_bits_retain(row.get(typedef::FLAGS));
        let name = self.string_column(&row, typedef::NAME)?;

        if flags.is_nested() {
            let namespace = self.string_column(&row, typedef::NAMESPACE)?;
            if !namespace.is_empty() {
                return Ok(Cow::Owned(format!("{namespace}.{name}")));
            }
        }

        Ok(Cow::Borrowed(name))
    }

    /// True if the type is nested in another type.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist
    pub fn is_nested(&self, handle: TypeDefHandle) -> Result<bool> {
        Ok(self.type_def_flags(handle)?.is_nested())
    }

    /// True if the type is an interface.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist
    pub fn is_interface(&self, handle: TypeDefHandle) -> Result<bool> {
        Ok(self.type_def_flags(handle)?.is_interface())
    }

    /// True if this module defines `System.Object`: a public class without base type.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] or [`crate::Error::BadImageFormat`] for a malformed
    /// `System.Object` row
    pub fn declares_object(&self) -> Result<bool> {
        let Some(handle) = self.find_type_def("System", "Object") else {
            return Ok(false);
        };

        let props = self.type_def_props(handle)?;
        Ok(props.flags.visibility() == TypeAttributes::PUBLIC
            && !props.flags.is_interface()
            && props.extends.is_nil())
    }

    /// Namespace of a type definition.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist
    pub fn type_def_namespace(&self, handle: TypeDefHandle) -> Result<&'a str> {
        let row = self.row(TableId::TypeDef, handle.rid())?;
        self.string_column(&row, typedef::NAMESPACE)
    }

    /// Base type of a type definition, nil if there is none.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist
    pub fn type_def_extends(&self, handle: TypeDefHandle) -> Result<Token> {
        self.row(TableId::TypeDef, handle.rid())?
            .reference(typedef::EXTENDS)
    }

    /// The fields of a type, in declaration order
    pub fn type_fields(&self, handle: TypeDefHandle) -> impl Iterator<Item = FieldHandle> + '_ {
        let positions = self.list_range(
            TableId::TypeDef,
            handle.rid(),
            typedef::FIELD_LIST,
            TableId::Field,
        );
        self.list_rows(positions, TableId::Field)
            .map(FieldHandle::new)
    }

    /// The methods of a type, in declaration order
    pub fn type_methods(
        &self,
        handle: TypeDefHandle,
    ) -> impl Iterator<Item = MethodDefHandle> + '_ {
        let positions = self.list_range(
            TableId::TypeDef,
            handle.rid(),
            typedef::METHOD_LIST,
            TableId::MethodDef,
        );
        self.list_rows(positions, TableId::MethodDef)
            .map(MethodDefHandle::new)
    }

    /// The type declaring `field`
    #[must_use]
    pub fn find_field_containing_type(&self, field: FieldHandle) -> Option<TypeDefHandle> {
        self.list_owner(
            TableId::TypeDef,
            typedef::FIELD_LIST,
            TableId::Field,
            field.rid(),
        )
        .map(TypeDefHandle::new)
    }

    /// The type declaring `method`
    #[must_use]
    pub fn find_containing_type(&self, method: MethodDefHandle) -> Option<TypeDefHandle> {
        self.list_owner(
            TableId::TypeDef,
            typedef::METHOD_LIST,
            TableId::MethodDef,
            method.rid(),
        )
        .map(TypeDefHandle::new)
    }

    /// The enclosing type of a nested type, `None` for top level types
    #[must_use]
    pub fn declaring_type(&self, handle: TypeDefHandle) -> Option<TypeDefHandle> {
        let nested = self.table(TableId::NestedClass);
        nested
            .equal_range(nestedclass::NESTED_CLASS, handle.rid())
            .next()
            .map(|rid| TypeDefHandle::new(nested.value(rid, nestedclass::ENCLOSING_CLASS)))
    }

    /// Types directly nested in `handle`, in `NestedClass` order
    pub fn nested_types(&self, handle: TypeDefHandle) -> Vec<TypeDefHandle> {
        self.table(TableId::NestedClass)
            .iter()
            .filter(|row| row.get(nestedclass::ENCLOSING_CLASS) == handle.rid())
            .map(|row| TypeDefHandle::new(row.get(nestedclass::NESTED_CLASS)))
            .collect()
    }

    /// Top level types grouped by namespace
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if a namespace lies past `#Strings`
    pub fn types_by_namespace(&self) -> Result<BTreeMap<&'a str, Vec<TypeDefHandle>>> {
        let mut namespaces: BTreeMap<&'a str, Vec<TypeDefHandle>> = BTreeMap::new();

        for handle in self.top_level_types() {
            let namespace = self.type_def_namespace(handle)?;
            namespaces.entry(namespace).or_default().push(handle);
        }

        Ok(namespaces)
    }

    /// Find a top level type by namespace and name
    #[must_use]
    pub fn find_type_def(&self, namespace: &str, name: &str) -> Option<TypeDefHandle> {
        self.table(TableId::TypeDef)
            .iter()
            .find(|row| {
                !TypeAttributes::from_bits_retain(row.get(typedef::FLAGS)).is_nested()
                    && self.string_column_eq(row, typedef::NAME, name)
                    && self.string_column_eq(row, typedef::NAMESPACE, namespace)
            })
            .map(|row| TypeDefHandle::new(row.rid()))
    }

    /// The interface implementations of a type
    pub fn interface_impls(&self, handle: TypeDefHandle) -> impl Iterator<Item = InterfaceImplHandle> {
        self.table(TableId::InterfaceImpl)
            .equal_range(interfaceimpl::CLASS, handle.rid())
            .map(InterfaceImplHandle::new)
    }

    /// Columns of an `InterfaceImpl` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist and
    /// [`crate::Error::BadImageFormat`] for a malformed interface column
    pub fn interface_impl_props(&self, handle: InterfaceImplHandle) -> Result<InterfaceImplProps> {
        let row = self.row(TableId::InterfaceImpl, handle.rid())?;
        Ok(InterfaceImplProps {
            class: TypeDefHandle::new(row.get(interfaceimpl::CLASS)),
            interface: row.reference(interfaceimpl::INTERFACE)?,
        })
    }

    /// Layout of a type.
    ///
    /// Auto layout and the reserved layout value yield [`TypeLayout::default`]. Sequential and
    /// explicit layouts without a `ClassLayout` row report a size and packing of 0.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist
    pub fn type_layout(&self, handle: TypeDefHandle) -> Result<TypeLayout> {
        let kind = match self.type_def_flags(handle)?.layout() {
            Some(LayoutKind::Auto) | None => return Ok(TypeLayout::default()),
            Some(kind) => kind,
        };

        let class_layout = self.table(TableId::ClassLayout);
        let layout = match class_layout
            .equal_range(classlayout::PARENT, handle.rid())
            .next()
            .and_then(|rid| class_layout.get(rid))
        {
            Some(row) => TypeLayout {
                kind,
                size: row.get(classlayout::CLASS_SIZE),
                packing: row.get_u16(classlayout::PACKING_SIZE),
            },
            None => TypeLayout {
                kind,
                size: 0,
                packing: 0,
            },
        };

        Ok(layout)
    }

    /// All type references
    pub fn type_refs(&self) -> impl Iterator<Item = TypeRefHandle> {
        (1..=self.row_count(TableId::TypeRef)).map(TypeRefHandle::new)
    }

    /// Columns of a `TypeRef` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist and
    /// [`crate::Error::BadImageFormat`] for a malformed resolution scope
    pub fn type_ref_props(&self, handle: TypeRefHandle) -> Result<TypeRefProps<'a>> {
        let row = self.row(TableId::TypeRef, handle.rid())?;
        Ok(TypeRefProps {
            resolution_scope: row.reference(typeref::RESOLUTION_SCOPE)?,
            name: self.string_column(&row, typeref::NAME)?,
            namespace: self.string_column(&row, typeref::NAMESPACE)?,
        })
    }

    /// Find a type reference by scope, namespace and name
    #[must_use]
    pub fn find_type_ref(&self, scope: Token, namespace: &str, name: &str) -> Option<TypeRefHandle> {
        self.table(TableId::TypeRef)
            .iter()
            .find(|row| {
                row.reference(typeref::RESOLUTION_SCOPE).ok() == Some(scope)
                    && self.string_column_eq(row, typeref::NAME, name)
                    && self.string_column_eq(row, typeref::NAMESPACE, namespace)
            })
            .map(|row| TypeRefHandle::new(row.rid()))
    }

    /// Signature blob of a `TypeSpec` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or the blob does not exist
    pub fn type_spec_signature(&self, handle: TypeSpecHandle) -> Result<&'a [u8]> {
        let row = self.row(TableId::TypeSpec, handle.rid())?;
        self.blob_column(&row, typespec::SIGNATURE)
    }

    /// Namespace and name of a `TypeDef` or `TypeRef`, `None` for other tokens.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist
    pub fn type_namespace_and_name(&self, token: Token) -> Result<Option<(&'a str, &'a str)>> {
        match token.table_id() {
            Some(TableId::TypeDef) => {
                let row = self.row(TableId::TypeDef, token.row())?;
                Ok(Some((
                    self.string_column(&row, typedef::NAMESPACE)?,
                    self.string_column(&row, typedef::NAME)?,
                )))
            }
            Some(TableId::TypeRef) => {
                let row = self.row(TableId::TypeRef, token.row())?;
                Ok(Some((
                    self.string_column(&row, typeref::NAMESPACE)?,
                    self.string_column(&row, typeref::NAME)?,
                )))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test::builder::{table, Cell, MetadataBuilder, SampleAssembly},
        Error,
    };

    fn module_row(md: &mut MetadataBuilder) {
        md.row(
            table::MODULE,
            vec![Cell::U16(0), Cell::Str(0), Cell::Guid(0), Cell::Guid(0), Cell::Guid(0)],
        );
    }

    fn type_row(md: &mut MetadataBuilder, flags: u32, namespace: &str, name: &str, list: u32) -> u32 {
        let name = md.string(name);
        let namespace = md.string(namespace);
        md.row(
            table::TYPE_DEF,
            vec![
                Cell::U32(flags),
                Cell::Str(name),
                Cell::Str(namespace),
                Cell::Idx(0),
                Cell::Idx(list),
                Cell::Idx(1),
            ],
        )
    }

    #[test]
    fn sample_types() {
        let sample = SampleAssembly::new();
        let data = sample.metadata.build();
        let reader = MetadataReader::new(&data).unwrap();

        assert_eq!(reader.type_defs().count(), 5);

        let c = reader.type_def_props(TypeDefHandle::new(2)).unwrap();
        assert_eq!(c.name, "C");
        assert_eq!(c.namespace, "N");
        assert_eq!(c.extends, Token::from_parts(TableId::TypeRef, 1));
        assert!(c.field_list.is_empty());
        assert!(c.method_list.is_empty());

        let outer = TypeDefHandle::new(3);
        assert_eq!(
            reader.type_fields(outer).collect::<Vec<_>>(),
            vec![FieldHandle::new(1)]
        );
        assert_eq!(
            reader.type_methods(outer).collect::<Vec<_>>(),
            vec![MethodDefHandle::new(1)]
        );
        assert_eq!(reader.type_fields(TypeDefHandle::new(5)).count(), 0);
        assert_eq!(reader.find_field_containing_type(FieldHandle::new(1)), Some(outer));
        assert_eq!(reader.find_containing_type(MethodDefHandle::new(1)), Some(outer));
        assert_eq!(reader.find_containing_type(MethodDefHandle::new(2)), None);

        let ifoo = reader.type_def_props(TypeDefHandle::new(5)).unwrap();
        assert!(ifoo.flags.is_interface());
        assert!(ifoo.extends.is_nil());

        assert!(matches!(
            reader.type_def_props(TypeDefHandle::new(6)),
            Err(Error::OutOfRange)
        ));
        assert!(matches!(
            reader.type_def_props(TypeDefHandle::NIL),
            Err(Error::OutOfRange)
        ));
    }

    #[test]
    fn nesting() {
        let sample = SampleAssembly::new();
        let data = sample.metadata.build();
        let reader = MetadataReader::new(&data).unwrap();

        let outer = TypeDefHandle::new(3);
        let inner = TypeDefHandle::new(4);
        assert_eq!(reader.declaring_type(inner), Some(outer));
        assert_eq!(reader.declaring_type(outer), None);
        assert_eq!(reader.nested_types(outer), vec![inner]);
        assert_eq!(reader.type_def_name(inner).unwrap(), "Inner");

        let namespaces = reader.types_by_namespace().unwrap();
        assert_eq!(namespaces[""], vec![TypeDefHandle::new(1)]);
        assert_eq!(
            namespaces["N"],
            vec![TypeDefHandle::new(2), outer, TypeDefHandle::new(5)]
        );

        assert_eq!(reader.find_type_def("N", "Outer"), Some(outer));
        assert!(reader.is_nested(inner).unwrap());
        assert!(!reader.is_nested(outer).unwrap());
        assert!(reader.is_interface(TypeDefHandle::new(5)).unwrap());
        assert!(!reader.declares_object().unwrap());
        assert_eq!(reader.find_type_def("", "Inner"), None);
    }

    #[test]
    fn interfaces_and_refs() {
        let sample = SampleAssembly::new();
        let data = sample.metadata.build();
        let reader = MetadataReader::new(&data).unwrap();

        let impls: Vec<_> = reader.interface_impls(TypeDefHandle::new(3)).collect();
        assert_eq!(impls, vec![InterfaceImplHandle::new(1)]);
        let props = reader.interface_impl_props(impls[0]).unwrap();
        assert_eq!(props.class, TypeDefHandle::new(3));
        assert_eq!(props.interface, Token::from_parts(TableId::TypeDef, 5));
        assert_eq!(reader.interface_impls(TypeDefHandle::new(2)).count(), 0);

        let object = reader.type_ref_props(TypeRefHandle::new(1)).unwrap();
        assert_eq!(object.namespace, "System");
        assert_eq!(object.name, "Object");
        assert_eq!(
            object.resolution_scope,
            Token::from_parts(TableId::AssemblyRef, 1)
        );

        let scope = Token::from_parts(TableId::AssemblyRef, 1);
        assert_eq!(
            reader.find_type_ref(scope, "System", "Object"),
            Some(TypeRefHandle::new(1))
        );
        assert_eq!(reader.find_type_ref(Token::NIL, "System", "Object"), None);
        assert_eq!(
            reader
                .type_namespace_and_name(Token::from_parts(TableId::TypeRef, 2))
                .unwrap(),
            Some(("System.Runtime.CompilerServices", "InternalsVisibleToAttribute"))
        );
        assert_eq!(
            reader
                .type_namespace_and_name(Token::from_parts(TableId::Field, 1))
                .unwrap(),
            None
        );
    }

    #[test]
    fn layouts() {
        let mut md = MetadataBuilder::new();
        module_row(&mut md);
        type_row(&mut md, 0, "", "<Module>", 1);
        let sequential = type_row(&mut md, 0x0000_0009, "N", "Seq", 1);
        let explicit = type_row(&mut md, 0x0000_0011, "N", "Exp", 1);
        let reserved = type_row(&mut md, 0x0000_0019, "N", "Bad", 1);
        let auto = type_row(&mut md, 0x0000_0001, "N", "Auto", 1);
        md.row(
            table::CLASS_LAYOUT,
            vec![Cell::U16(4), Cell::U32(16), Cell::Idx(sequential)],
        );
        md.row(
            table::CLASS_LAYOUT,
            vec![Cell::U16(8), Cell::U32(64), Cell::Idx(auto)],
        );
        let data = md.build();
        let reader = MetadataReader::new(&data).unwrap();

        assert_eq!(
            reader.type_layout(TypeDefHandle::new(sequential)).unwrap(),
            TypeLayout {
                kind: LayoutKind::Sequential,
                size: 16,
                packing: 4
            }
        );
        assert_eq!(
            reader.type_layout(TypeDefHandle::new(explicit)).unwrap(),
            TypeLayout {
                kind: LayoutKind::Explicit,
                size: 0,
                packing: 0
            }
        );
        assert_eq!(
            reader.type_layout(TypeDefHandle::new(reserved)).unwrap(),
            TypeLayout::default()
        );
        assert_eq!(
            reader.type_layout(TypeDefHandle::new(auto)).unwrap(),
            TypeLayout::default()
        );
    }

    #[test]
    fn system_object() {
        let mut md = MetadataBuilder::new();
        module_row(&mut md);
        type_row(&mut md, 0, "", "<Module>", 1);
        type_row(&mut md, 0x0010_2001, "System", "Object", 1);
        let data = md.build();
        let reader = MetadataReader::new(&data).unwrap();
        assert!(reader.declares_object().unwrap());

        let mut md = MetadataBuilder::new();
        module_row(&mut md);
        type_row(&mut md, 0, "", "<Module>", 1);
        type_row(&mut md, 0x0000_00A1, "System", "Object", 1);
        let data = md.build();
        let reader = MetadataReader::new(&data).unwrap();
        assert!(!reader.declares_object().unwrap());
    }

    #[test]
    fn pointer_tables_and_nested_namespace() {
        let mut md = MetadataBuilder::new();
        md.uncompressed();
        module_row(&mut md);
        type_row(&mut md, 0, "", "<Module>", 1);
        let holder = type_row(&mut md, 0x0000_0001, "N", "Holder", 1);
        let nested = type_row(&mut md, 0x0000_0002, "N", "Nested", 3);
        md.row(table::NESTED_CLASS, vec![Cell::Idx(nested), Cell::Idx(holder)]);

        let sig = md.blob(&[0x06, 0x08]);
        for name in ["x", "y"] {
            let name = md.string(name);
            md.row(
                table::FIELD,
                vec![Cell::U16(0x0001), Cell::Str(name), Cell::Blob(sig)],
            );
        }
        md.row(table::FIELD_PTR, vec![Cell::Idx(2)]);
        md.row(table::FIELD_PTR, vec![Cell::Idx(1)]);
        let data = md.build();
        let reader = MetadataReader::new(&data).unwrap();

        assert!(reader.tables().uses_pointer_tables());
        let holder = TypeDefHandle::new(holder);
        assert_eq!(
            reader.type_fields(holder).collect::<Vec<_>>(),
            vec![FieldHandle::new(2), FieldHandle::new(1)]
        );
        assert_eq!(reader.find_field_containing_type(FieldHandle::new(1)), Some(holder));
        assert_eq!(reader.type_fields(TypeDefHandle::new(nested)).count(), 0);

        assert_eq!(
            reader.type_def_name(TypeDefHandle::new(nested)).unwrap(),
            "N.Nested"
        );
        assert_eq!(reader.type_def_name(holder).unwrap(), "Holder");
    }
}
