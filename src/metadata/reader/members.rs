//! Methods, fields, parameters, properties, events and member references.

use std::ops::Range;

use crate::{
    metadata::{
        constants::ConstantValue,
        flags::{
            EventAttributes, FieldAttributes, MethodAttributes, MethodImplAttributes,
            MethodSemanticsAttributes, PInvokeAttributes, ParamAttributes, PropertyAttributes,
        },
        handles::{
            EventHandle, FieldHandle, MemberRefHandle, MethodDefHandle, MethodImplHandle,
            ParamHandle, PropertyHandle, StandAloneSigHandle, TypeDefHandle,
        },
        reader::MetadataReader,
        tables::{
            schema::{
                constant, event, eventmap, field, fieldlayout, fieldmarshal, fieldrva, implmap,
                memberref, methoddef, methodimpl, methodsemantics, moduleref, param, property,
                propertymap, standalonesig,
            },
            CodedIndexType, TableId,
        },
        token::Token,
    },
    Result,
};

/// Native types at or below this value are the simple marshalling kinds
const MAX_MARSHAL_NATIVE_TYPE: u8 = 0x50;

/// Columns of a `MethodDef` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDefProps<'a> {
    /// RVA of the method body, 0 for abstract, runtime or P/Invoke methods
    pub rva: u32,
    /// Implementation flags
    pub impl_flags: MethodImplAttributes,
    /// Method attributes
    pub flags: MethodAttributes,
    /// Name
    pub name: &'a str,
    /// Method signature blob
    pub signature: &'a [u8],
    /// Run of the parameter list, in list positions
    pub param_list: Range<u32>,
}

/// Columns of a `Field` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefProps<'a> {
    /// Field attributes
    pub flags: FieldAttributes,
    /// Name
    pub name: &'a str,
    /// Field signature blob
    pub signature: &'a [u8],
}

/// Columns of a `Param` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamProps<'a> {
    /// Parameter attributes
    pub flags: ParamAttributes,
    /// 0 for the return value, 1 for the first parameter
    pub sequence: u16,
    /// Name, may be empty
    pub name: &'a str,
}

/// Columns of a `Property` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyProps<'a> {
    /// Property attributes
    pub flags: PropertyAttributes,
    /// Name
    pub name: &'a str,
    /// Property signature blob
    pub signature: &'a [u8],
}

/// Columns of an `Event` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventProps<'a> {
    /// Event attributes
    pub flags: EventAttributes,
    /// Name
    pub name: &'a str,
    /// Delegate type (`TypeDef`, `TypeRef` or `TypeSpec`)
    pub event_type: Token,
}

/// Columns of a `MemberRef` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRefProps<'a> {
    /// Parent (`TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef` or `TypeSpec`)
    pub class: Token,
    /// Name
    pub name: &'a str,
    /// Method or field signature blob
    pub signature: &'a [u8],
}

/// Columns of a `MethodImpl` row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodImplProps {
    /// The type holding the override
    pub class: TypeDefHandle,
    /// The implementing method (`MethodDef` or `MemberRef`)
    pub body: Token,
    /// The implemented method (`MethodDef` or `MemberRef`)
    pub declaration: Token,
}

/// Platform invoke information of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DllImportData<'a> {
    /// Mapping flags
    pub flags: PInvokeAttributes,
    /// Name of the native entry point
    pub entry_point: &'a str,
    /// Name of the native module
    pub module_name: &'a str,
}

/// Accessor methods of a property
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyAccessors {
    /// The getter
    pub getter: Option<MethodDefHandle>,
    /// The setter
    pub setter: Option<MethodDefHandle>,
    /// Any other associated methods
    pub others: Vec<MethodDefHandle>,
}

/// Accessor methods of an event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventAccessors {
    /// The `add` accessor
    pub adder: Option<MethodDefHandle>,
    /// The `remove` accessor
    pub remover: Option<MethodDefHandle>,
    /// The `raise` accessor
    pub raiser: Option<MethodDefHandle>,
    /// Any other associated methods
    pub others: Vec<MethodDefHandle>,
}

impl<'a> MetadataReader<'a> {
    /// All method definitions
    pub fn method_defs(&self) -> impl Iterator<Item = MethodDefHandle> {
        (1..=self.row_count(TableId::MethodDef)).map(MethodDefHandle::new)
    }

    /// Columns of a `MethodDef` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row, its name or its signature does not exist
    pub fn method_def_props(&self, handle: MethodDefHandle) -> Result<MethodDefProps<'a>> {
        let row = self.row(TableId::MethodDef, handle.rid())?;

        Ok(MethodDefProps {
            rva: row.get(methoddef::RVA),
            impl_flags: MethodImplAttributes::from_bits_retain(row.get_u16(methoddef::IMPL_FLAGS)),
            flags: MethodAttributes::from_bits_retain(row.get_u16(methoddef::FLAGS)),
            name: self.string_column(&row, methoddef::NAME)?,
            signature: self.blob_column(&row, methoddef::SIGNATURE)?,
            param_list: self.list_range(
                TableId::MethodDef,
                handle.rid(),
                methoddef::PARAM_LIST,
                TableId::Param,
            ),
        })
    }

    /// Name of a method.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or its name does not exist
    pub fn method_def_name(&self, handle: MethodDefHandle) -> Result<&'a str> {
        let row = self.row(TableId::MethodDef, handle.rid())?;
        self.string_column(&row, methoddef::NAME)
    }

    /// The parameters of a method, including the return value row if present
    pub fn method_params(&self, handle: MethodDefHandle) -> impl Iterator<Item = ParamHandle> + '_ {
        let positions = self.list_range(
            TableId::MethodDef,
            handle.rid(),
            methoddef::PARAM_LIST,
            TableId::Param,
        );
        self.list_rows(positions, TableId::Param)
            .map(ParamHandle::new)
    }

    /// Platform invoke data of a method, `None` if it has no `ImplMap` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the entry point or module name does not exist
    pub fn dll_import_data(&self, handle: MethodDefHandle) -> Result<Option<DllImportData<'a>>> {
        let Some(rid) = self
            .rows_referencing(
                TableId::ImplMap,
                implmap::MEMBER_FORWARDED,
                CodedIndexType::MemberForwarded,
                handle.token(),
            )
            .next()
        else {
            return Ok(None);
        };

        let row = self.row(TableId::ImplMap, rid)?;
        let module_name = match self
            .table(TableId::ModuleRef)
            .get(row.get(implmap::IMPORT_SCOPE))
        {
            Some(module) => self.string_column(&module, moduleref::NAME)?,
            None => "",
        };

        Ok(Some(DllImportData {
            flags: PInvokeAttributes::from_bits_retain(row.get_u16(implmap::MAPPING_FLAGS)),
            entry_point: self.string_column(&row, implmap::IMPORT_NAME)?,
            module_name,
        }))
    }

    /// All field definitions
    pub fn field_defs(&self) -> impl Iterator<Item = FieldHandle> {
        (1..=self.row_count(TableId::Field)).map(FieldHandle::new)
    }

    /// Columns of a `Field` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row, its name or its signature does not exist
    pub fn field_def_props(&self, handle: FieldHandle) -> Result<FieldDefProps<'a>> {
        let row = self.row(TableId::Field, handle.rid())?;

        Ok(FieldDefProps {
            flags: FieldAttributes::from_bits_retain(row.get_u16(field::FLAGS)),
            name: self.string_column(&row, field::NAME)?,
            signature: self.blob_column(&row, field::SIGNATURE)?,
        })
    }

    /// Explicit offset of a field, `None` without a `FieldLayout` row
    #[must_use]
    pub fn field_offset(&self, handle: FieldHandle) -> Option<u32> {
        let layout = self.table(TableId::FieldLayout);
        layout
            .equal_range(fieldlayout::FIELD, handle.rid())
            .next()
            .map(|rid| layout.value(rid, fieldlayout::OFFSET))
    }

    /// RVA of the initial data of a field, `None` without a `FieldRVA` row
    #[must_use]
    pub fn field_rva(&self, handle: FieldHandle) -> Option<u32> {
        let rvas = self.table(TableId::FieldRVA);
        rvas.equal_range(fieldrva::FIELD, handle.rid())
            .next()
            .map(|rid| rvas.value(rid, fieldrva::RVA))
    }

    /// The value of the `Constant` row owned by a field, parameter or property.
    ///
    /// A parent without a constant, or a constant whose blob does not fit its type, yields
    /// [`ConstantValue::Bad`].
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the value blob lies past `#Blob`
    pub fn constant_value(&self, parent: Token) -> Result<ConstantValue> {
        let Some(rid) = self
            .rows_referencing(
                TableId::Constant,
                constant::PARENT,
                CodedIndexType::HasConstant,
                parent,
            )
            .next()
        else {
            return Ok(ConstantValue::Bad);
        };

        let row = self.row(TableId::Constant, rid)?;
        #[allow(clippy::cast_possible_truncation)]
        let element_type = row.get(constant::TYPE) as u8;
        let blob = self.blob_column(&row, constant::VALUE)?;

        Ok(ConstantValue::decode(element_type, blob))
    }

    /// The value of a constant field, [`ConstantValue::Bad`] if the field has none.
    ///
    /// # Errors
    /// See [`MetadataReader::constant_value`]
    pub fn constant_field_value(&self, handle: FieldHandle) -> Result<ConstantValue> {
        self.constant_value(handle.token())
    }

    /// The default value of an optional parameter, [`ConstantValue::Bad`] if it has none.
    ///
    /// # Errors
    /// See [`MetadataReader::constant_value`]
    pub fn param_default_value(&self, handle: ParamHandle) -> Result<ConstantValue> {
        self.constant_value(handle.token())
    }

    /// The marshalling descriptor of a field or parameter, `None` without a `FieldMarshal` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the descriptor lies past `#Blob`
    pub fn marshalling_descriptor(&self, parent: Token) -> Result<Option<&'a [u8]>> {
        match self
            .rows_referencing(
                TableId::FieldMarshal,
                fieldmarshal::PARENT,
                CodedIndexType::HasFieldMarshal,
                parent,
            )
            .next()
        {
            Some(rid) => {
                let row = self.row(TableId::FieldMarshal, rid)?;
                Ok(Some(self.blob_column(&row, fieldmarshal::NATIVE_TYPE)?))
            }
            None => Ok(None),
        }
    }

    /// The simple native type of a marshalling descriptor.
    ///
    /// Returns 0 if there is no descriptor or its first byte is not a simple native type.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the descriptor lies past `#Blob`
    pub fn marshalling_type(&self, parent: Token) -> Result<u8> {
        Ok(match self.marshalling_descriptor(parent)? {
            Some([native_type, ..]) if *native_type <= MAX_MARSHAL_NATIVE_TYPE => *native_type,
            _ => 0,
        })
    }

    /// Columns of a `Param` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or its name does not exist
    pub fn param_props(&self, handle: ParamHandle) -> Result<ParamProps<'a>> {
        let row = self.row(TableId::Param, handle.rid())?;

        Ok(ParamProps {
            flags: ParamAttributes::from_bits_retain(row.get_u16(param::FLAGS)),
            sequence: row.get_u16(param::SEQUENCE),
            name: self.string_column(&row, param::NAME)?,
        })
    }

    /// The method owning a parameter
    #[must_use]
    pub fn param_method(&self, handle: ParamHandle) -> Option<MethodDefHandle> {
        self.list_owner(
            TableId::MethodDef,
            methoddef::PARAM_LIST,
            TableId::Param,
            handle.rid(),
        )
        .map(MethodDefHandle::new)
    }

    /// The properties of a type
    pub fn type_properties(
        &self,
        handle: TypeDefHandle,
    ) -> impl Iterator<Item = PropertyHandle> + '_ {
        let positions = match self
            .table(TableId::PropertyMap)
            .iter()
            .find(|row| row.get(propertymap::PARENT) == handle.rid())
        {
            Some(map) => self.list_range(
                TableId::PropertyMap,
                map.rid(),
                propertymap::PROPERTY_LIST,
                TableId::Property,
            ),
            None => 0..0,
        };

        self.list_rows(positions, TableId::Property)
            .map(PropertyHandle::new)
    }

    /// Columns of a `Property` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row, its name or its signature does not exist
    pub fn property_props(&self, handle: PropertyHandle) -> Result<PropertyProps<'a>> {
        let row = self.row(TableId::Property, handle.rid())?;

        Ok(PropertyProps {
            flags: PropertyAttributes::from_bits_retain(row.get_u16(property::FLAGS)),
            name: self.string_column(&row, property::NAME)?,
            signature: self.blob_column(&row, property::TYPE)?,
        })
    }

    /// Getter, setter and other methods of a property
    #[must_use]
    pub fn property_accessors(&self, handle: PropertyHandle) -> PropertyAccessors {
        let mut accessors = PropertyAccessors::default();

        for (semantics, method) in self.semantics(handle.token()) {
            if semantics.contains(MethodSemanticsAttributes::GETTER) {
                accessors.getter = Some(method);
            } else if semantics.contains(MethodSemanticsAttributes::SETTER) {
                accessors.setter = Some(method);
            } else {
                accessors.others.push(method);
            }
        }

        accessors
    }

    /// The events of a type
    pub fn type_events(&self, handle: TypeDefHandle) -> impl Iterator<Item = EventHandle> + '_ {
        let positions = match self
            .table(TableId::EventMap)
            .iter()
            .find(|row| row.get(eventmap::PARENT) == handle.rid())
        {
            Some(map) => self.list_range(
                TableId::EventMap,
                map.rid(),
                eventmap::EVENT_LIST,
                TableId::Event,
            ),
            None => 0..0,
        };

        self.list_rows(positions, TableId::Event)
            .map(EventHandle::new)
    }

    /// Columns of an `Event` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or its name does not exist and
    /// [`crate::Error::BadImageFormat`] for a malformed event type
    pub fn event_props(&self, handle: EventHandle) -> Result<EventProps<'a>> {
        let row = self.row(TableId::Event, handle.rid())?;

        Ok(EventProps {
            flags: EventAttributes::from_bits_retain(row.get_u16(event::FLAGS)),
            name: self.string_column(&row, event::NAME)?,
            event_type: row.reference(event::EVENT_TYPE)?,
        })
    }

    /// Add, remove, raise and other methods of an event
    #[must_use]
    pub fn event_accessors(&self, handle: EventHandle) -> EventAccessors {
        let mut accessors = EventAccessors::default();

        for (semantics, method) in self.semantics(handle.token()) {
            if semantics.contains(MethodSemanticsAttributes::ADD_ON) {
                accessors.adder = Some(method);
            } else if semantics.contains(MethodSemanticsAttributes::REMOVE_ON) {
                accessors.remover = Some(method);
            } else if semantics.contains(MethodSemanticsAttributes::FIRE) {
                accessors.raiser = Some(method);
            } else {
                accessors.others.push(method);
            }
        }

        accessors
    }

    fn semantics(
        &self,
        association: Token,
    ) -> impl Iterator<Item = (MethodSemanticsAttributes, MethodDefHandle)> + '_ {
        let table = self.table(TableId::MethodSemantics);
        self.rows_referencing(
            TableId::MethodSemantics,
            methodsemantics::ASSOCIATION,
            CodedIndexType::HasSemantics,
            association,
        )
        .filter_map(move |rid| table.get(rid))
        .map(|row| {
            (
                MethodSemanticsAttributes::from_bits_retain(row.get_u16(methodsemantics::SEMANTICS)),
                MethodDefHandle::new(row.get(methodsemantics::METHOD)),
            )
        })
    }

    /// All member references
    pub fn member_refs(&self) -> impl Iterator<Item = MemberRefHandle> {
        (1..=self.row_count(TableId::MemberRef)).map(MemberRefHandle::new)
    }

    /// Columns of a `MemberRef` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row, its name or its signature does not exist
    /// and [`crate::Error::BadImageFormat`] for a malformed parent
    pub fn member_ref_props(&self, handle: MemberRefHandle) -> Result<MemberRefProps<'a>> {
        let row = self.row(TableId::MemberRef, handle.rid())?;

        Ok(MemberRefProps {
            class: row.reference(memberref::CLASS)?,
            name: self.string_column(&row, memberref::NAME)?,
            signature: self.blob_column(&row, memberref::SIGNATURE)?,
        })
    }

    /// The method implementations declared by a type
    pub fn method_impls(&self, handle: TypeDefHandle) -> impl Iterator<Item = MethodImplHandle> {
        self.table(TableId::MethodImpl)
            .equal_range(methodimpl::CLASS, handle.rid())
            .map(MethodImplHandle::new)
    }

    /// Columns of a `MethodImpl` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row does not exist and
    /// [`crate::Error::BadImageFormat`] for malformed method columns
    pub fn method_impl_props(&self, handle: MethodImplHandle) -> Result<MethodImplProps> {
        let row = self.row(TableId::MethodImpl, handle.rid())?;

        Ok(MethodImplProps {
            class: TypeDefHandle::new(row.get(methodimpl::CLASS)),
            body: row.reference(methodimpl::METHOD_BODY)?,
            declaration: row.reference(methodimpl::METHOD_DECLARATION)?,
        })
    }

    /// Signature blob of a `StandAloneSig` row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfRange`] if the row or the blob does not exist
    pub fn stand_alone_signature(&self, handle: StandAloneSigHandle) -> Result<&'a [u8]> {
        let row = self.row(TableId::StandAloneSig, handle.rid())?;
        self.blob_column(&row, standalonesig::SIGNATURE)
    }
}
