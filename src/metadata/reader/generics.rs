//! Generic parameters, their constraints and generic method instantiations.

use crate::{
    metadata::{
        flags::GenericParamAttributes,
        handles::{GenericParamConstraintHandle, GenericParamHandle, MethodSpecHandle},
        reader::MetadataReader,
        tables::{
            schema::{genericparam, genericparamconstraint, methodspec},
            CodedIndexType, TableId,
        },
        token::Token,
    },
    Result,
};

/// Columns of a `GenericParam` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericParamProps<'a> {
    /// Zero based position in the owner's parameter list
    pub number: u16,
    /// Variance and special constraints
    pub flags: GenericParamAttributes,
    /// The owning `TypeDef` or `MethodDef`
    pub owner: Token,
    /// Name
    pub name: &'a str,
}

/// Columns of a `GenericParamConstraint` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericParamConstraintProps {
    /// The constrained parameter
    pub owner: GenericParamHandle,
    /// The constraint type (`TypeDef`, `TypeRef` or `TypeSpec`)
    pub constraint: Token,
}

/// Columns of a `MethodSpec` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpecProps<'a> {
    /// The generic method (`MethodDef` or `MemberRef`)
    pub method: Token,
    /// Instantiation signature blob
    pub instantiation: &'a [u8],
}

impl<'a> MetadataReader<'a> {
    /// Generic parameters of a type or method, ordered by number
    pub fn generic_params(&self, owner: Token) -> impl Iterator<Item = GenericParamHandle> {
        self.rows_referencing(
            TableId::GenericParam,
            genericparam::OWNER,
            CodedIndexType::TypeOrMethodDef,
            owner,
        )
        .map(GenericParamHandle::new)
    }

    /// Columns of a `GenericParam` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or its name does not exist and
    /// [`crate::Error::BadImageFormat`] for a malformed owner
    pub fn generic_param_props(&self, handle: GenericParamHandle) -> Result<GenericParamProps<'a>> {
        let row = self.row(TableId::GenericParam, handle.rid())?;

        Ok(GenericParamProps {
            number: row.get_u16(genericparam::NUMBER),
            flags: GenericParamAttributes::from_bits_retain(row.get_u16(genericparam::FLAGS)),
            owner: row.reference(genericparam::OWNER)?,
            name: self.string_column(&row, genericparam::NAME)?,
        })
    }

    /// Constraints of a generic parameter
    pub fn generic_param_constraints(
        &self,
        handle: GenericParamHandle,
    ) -> impl Iterator<Item = GenericParamConstraintHandle> {
        self.table(TableId::GenericParamConstraint)
            .equal_range(genericparamconstraint::OWNER, handle.rid())
            .map(GenericParamConstraintHandle::new)
    }

    /// Columns of a `GenericParamConstraint` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist and
    /// [`crate::Error::BadImageFormat`] for a malformed constraint
    pub fn generic_param_constraint_props(
        &self,
        handle: GenericParamConstraintHandle,
    ) -> Result<GenericParamConstraintProps> {
        let row = self.row(TableId::GenericParamConstraint, handle.rid())?;

        Ok(GenericParamConstraintProps {
            owner: GenericParamHandle::new(row.get(genericparamconstraint::OWNER)),
            constraint: row.reference(genericparamconstraint::CONSTRAINT)?,
        })
    }

    /// Columns of a `MethodSpec` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or its blob does not exist and
    /// [`crate::Error::BadImageFormat`] for a malformed method column
    pub fn method_spec_props(&self, handle: MethodSpecHandle) -> Result<MethodSpecProps<'a>> {
        let row = self.row(TableId::MethodSpec, handle.rid())?;

        Ok(MethodSpecProps {
            method: row.reference(methodspec::METHOD)?,
            instantiation: self.blob_column(&row, methodspec::INSTANTIATION)?,
        })
    }
}
