//! Custom attributes and declarative security.
//!
//! Attributes are matched by the namespace and name of the type declaring their constructor.
//! Constructors referenced through a `TypeRef` nested in another `TypeRef`, or defined on a
//! nested `TypeDef`, are not matched; no well-known attribute type is nested.

use crate::{
    metadata::{
        customattributes::string_argument,
        flags::TypeAttributes,
        handles::{CustomAttributeHandle, DeclSecurityHandle, MethodDefHandle, TypeDefHandle},
        reader::MetadataReader,
        tables::{
            schema::{customattribute, declsecurity, memberref, typedef, typeref},
            CodedIndexType, TableId,
        },
        token::Token,
    },
    Result,
};

/// Namespace of `InternalsVisibleToAttribute`
pub(crate) const COMPILER_SERVICES: &str = "System.Runtime.CompilerServices";
/// Namespace of `TypeIdentifierAttribute`
pub(crate) const INTEROP_SERVICES: &str = "System.Runtime.InteropServices";

/// Columns of a `CustomAttribute` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomAttributeProps<'a> {
    /// The attributed entity
    pub parent: Token,
    /// The attribute constructor (`MethodDef` or `MemberRef`)
    pub constructor: Token,
    /// Value blob, empty if the attribute has no arguments
    pub value: &'a [u8],
}

/// Columns of a `DeclSecurity` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclSecurityProps<'a> {
    /// Security action
    pub action: u16,
    /// The protected `TypeDef`, `MethodDef` or `Assembly`
    pub parent: Token,
    /// Serialized permission set
    pub permission_set: &'a [u8],
}

impl<'a> MetadataReader<'a> {
    /// The custom attributes applied to `parent`
    pub fn custom_attributes(
        &self,
        parent: Token,
    ) -> impl Iterator<Item = CustomAttributeHandle> {
        self.rows_referencing(
            TableId::CustomAttribute,
            customattribute::PARENT,
            CodedIndexType::HasCustomAttribute,
            parent,
        )
        .map(CustomAttributeHandle::new)
    }

    /// Columns of a `CustomAttribute` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or its blob does not exist and
    /// [`crate::Error::BadImageFormat`] for malformed parent or constructor columns
    pub fn custom_attribute_props(
        &self,
        handle: CustomAttributeHandle,
    ) -> Result<CustomAttributeProps<'a>> {
        let row = self.row(TableId::CustomAttribute, handle.rid())?;

        Ok(CustomAttributeProps {
            parent: row.reference(customattribute::PARENT)?,
            constructor: row.reference(customattribute::TYPE)?,
            value: self.blob_column(&row, customattribute::VALUE)?,
        })
    }

    /// The type declaring the constructor of an attribute.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if a referenced row does not exist and
    /// [`crate::Error::BadImageFormat`] for malformed coded indexes
    pub fn attribute_type(&self, handle: CustomAttributeHandle) -> Result<Option<Token>> {
        let constructor = self
            .row(TableId::CustomAttribute, handle.rid())?
            .reference(customattribute::TYPE)?;

        match constructor.table_id() {
            Some(TableId::MemberRef) => Ok(Some(
                self.row(TableId::MemberRef, constructor.row())?
                    .reference(memberref::CLASS)?,
            )),
            Some(TableId::MethodDef) => Ok(self
                .find_containing_type(MethodDefHandle::new(constructor.row()))
                .map(|handle| handle.token())),
            _ => Ok(None),
        }
    }

    /// Namespace and name of an attribute's type, `None` if the type is not a plain top level
    /// `TypeDef` or `TypeRef`.
    ///
    /// # Errors
    /// See [`MetadataReader::attribute_type`]
    pub fn attribute_type_name(
        &self,
        handle: CustomAttributeHandle,
    ) -> Result<Option<(&'a str, &'a str)>> {
        let Some(attribute_type) = self.attribute_type(handle)? else {
            return Ok(None);
        };

        match attribute_type.table_id() {
            Some(TableId::TypeRef) => {
                let row = self.row(TableId::TypeRef, attribute_type.row())?;
                if row.reference(typeref::RESOLUTION_SCOPE)?.is_table(TableId::TypeRef) {
                    return Ok(None);
                }
                self.type_namespace_and_name(attribute_type)
            }
            Some(TableId::TypeDef) => {
                let row = self.row(TableId::TypeDef, attribute_type.row())?;
                if TypeAttributes::from_bits_retain(row.get(typedef::FLAGS)).is_nested() {
                    return Ok(None);
                }
                self.type_namespace_and_name(attribute_type)
            }
            _ => Ok(None),
        }
    }

    /// True if the attribute's type is `namespace.name`.
    ///
    /// # Errors
    /// See [`MetadataReader::attribute_type`]
    pub fn is_attribute_of_type(
        &self,
        handle: CustomAttributeHandle,
        namespace: &str,
        name: &str,
    ) -> Result<bool> {
        Ok(self.attribute_type_name(handle)? == Some((namespace, name)))
    }

    /// The attributes of type `namespace.name` applied to `parent`.
    ///
    /// # Errors
    /// See [`MetadataReader::attribute_type`]
    pub fn find_attributes(
        &self,
        parent: Token,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<CustomAttributeHandle>> {
        let mut found = Vec::new();
        for handle in self.custom_attributes(parent) {
            if self.is_attribute_of_type(handle, namespace, name)? {
                found.push(handle);
            }
        }

        Ok(found)
    }

    /// True if an attribute of type `namespace.name` is applied to `parent`.
    ///
    /// # Errors
    /// See [`MetadataReader::attribute_type`]
    pub fn has_attribute(&self, parent: Token, namespace: &str, name: &str) -> Result<bool> {
        for handle in self.custom_attributes(parent) {
            if self.is_attribute_of_type(handle, namespace, name)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// The string arguments of all `namespace.name` attributes on `parent`.
    ///
    /// Attributes whose value blob does not hold a single string are skipped.
    ///
    /// # Errors
    /// See [`MetadataReader::attribute_type`]
    pub fn attribute_string_values(
        &self,
        parent: Token,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<Option<&'a str>>> {
        let mut values = Vec::new();
        for handle in self.find_attributes(parent, namespace, name)? {
            let blob = self.custom_attribute_props(handle)?.value;
            match string_argument(blob) {
                Ok(value) => values.push(value),
                Err(error) => {
                    tracing::debug!(
                        attribute = ?handle,
                        %error,
                        "skipping attribute without a string argument"
                    );
                }
            }
        }

        Ok(values)
    }

    /// Values of the `InternalsVisibleToAttribute`s of the assembly, in table order.
    ///
    /// # Errors
    /// See [`MetadataReader::attribute_type`]
    pub fn internals_visible_to_values(&self) -> Result<Vec<&'a str>> {
        if !self.is_manifest_module() {
            return Ok(Vec::new());
        }

        Ok(self
            .attribute_string_values(
                Token::from_parts(TableId::Assembly, 1),
                COMPILER_SERVICES,
                "InternalsVisibleToAttribute",
            )?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Symbols of the `ConditionalAttribute`s applied to `parent`.
    ///
    /// # Errors
    /// See [`MetadataReader::attribute_type`]
    pub fn conditional_values(&self, parent: Token) -> Result<Vec<&'a str>> {
        Ok(self
            .attribute_string_values(parent, "System.Diagnostics", "ConditionalAttribute")?
            .into_iter()
            .flatten()
            .collect())
    }

    /// True if `handle` is a local type embedded from an interop assembly.
    ///
    /// # Errors
    /// See [`MetadataReader::attribute_type`]
    pub fn is_no_pia_local_type(&self, handle: TypeDefHandle) -> Result<bool> {
        self.has_attribute(handle.token(), INTEROP_SERVICES, "TypeIdentifierAttribute")
    }

    /// True if any type definition carries a `TypeIdentifierAttribute`.
    ///
    /// # Errors
    /// See [`MetadataReader::attribute_type`]
    pub fn contains_no_pia_local_types(&self) -> Result<bool> {
        for row in self.table(TableId::CustomAttribute).iter() {
            if !row
                .reference(customattribute::PARENT)?
                .is_table(TableId::TypeDef)
            {
                continue;
            }

            let handle = CustomAttributeHandle::new(row.rid());
            if self.is_attribute_of_type(handle, INTEROP_SERVICES, "TypeIdentifierAttribute")? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// The declarative security rows of a type, method or the assembly
    pub fn decl_security_attributes(
        &self,
        parent: Token,
    ) -> impl Iterator<Item = DeclSecurityHandle> {
        self.rows_referencing(
            TableId::DeclSecurity,
            declsecurity::PARENT,
            CodedIndexType::HasDeclSecurity,
            parent,
        )
        .map(DeclSecurityHandle::new)
    }

    /// Columns of a `DeclSecurity` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or its blob does not exist and
    /// [`crate::Error::BadImageFormat`] for a malformed parent
    pub fn decl_security_props(&self, handle: DeclSecurityHandle) -> Result<DeclSecurityProps<'a>> {
        let row = self.row(TableId::DeclSecurity, handle.rid())?;

        Ok(DeclSecurityProps {
            action: row.get_u16(declsecurity::ACTION),
            parent: row.reference(declsecurity::PARENT)?,
            permission_set: self.blob_column(&row, declsecurity::PERMISSION_SET)?,
        })
    }
}
