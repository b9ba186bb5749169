//! DWARF type enumeration.

use std::collections::HashMap;

use gimli::{
    constants, AttributeValue, DebugTypeSignature, DebuggingInformationEntry, DwAte, Reader, Unit, UnitOffset,
    UnitSectionOffset, UnitType,
};
use tracing::{debug, trace};

use super::{map_dwarf_error, OwnedDwarf, OwnedReader};
use crate::error::FormatResult;
use crate::types::{CompileUnit, Field, Language, ScalarKind, TypeClass, TypeDescriptor, TypeId, TypeTable};

const MAX_TYPE_REF_DEPTH: usize = 32;
const ANONYMOUS: &str = "<anonymous>";
const UNKNOWN: &str = "<unknown>";

type Entry<'abbrev, 'unit> = DebuggingInformationEntry<'abbrev, 'unit, OwnedReader>;

/// A `DW_TAG_member` before its type has been converted
struct Member
{
    name: Option<String>,
    ty: Option<AttributeValue<OwnedReader>>,
    offset: u64,
}

pub(crate) struct TypeEnumerator<'a>
{
    dwarf: &'a OwnedDwarf,
    units: Vec<Unit<OwnedReader>>,
    /// Per unit: aggregate DIE offset to its `::`-qualified name
    qualified: Vec<HashMap<usize, String>>,
}

impl<'a> TypeEnumerator<'a>
{
    pub(crate) fn new(dwarf: &'a OwnedDwarf) -> FormatResult<Self>
    {
        let mut units = Vec::new();
        let mut headers = dwarf.units();
        while let Some(header) = headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_info unit header", err))?
        {
            units.push(
                dwarf
                    .unit(header)
                    .map_err(|err| map_dwarf_error("parsing compilation unit", err))?,
            );
        }

        let mut type_headers = dwarf.type_units();
        while let Some(header) = type_headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_types unit header", err))?
        {
            units.push(dwarf.unit(header).map_err(|err| map_dwarf_error("parsing type unit", err))?);
        }

        let mut enumerator = Self {
            dwarf,
            units,
            qualified: Vec::new(),
        };
        enumerator.qualified = enumerator
            .units
            .iter()
            .map(|unit| enumerator.qualified_names(unit))
            .collect::<FormatResult<_>>()?;
        Ok(enumerator)
    }

    /// Rust debug info names aggregates by their last path segment and nests
    /// them in `DW_TAG_namespace` entries; rebuild `alloc::vec::Vec<u8>` style
    /// names from the enclosing namespaces
    fn qualified_names(&self, unit: &Unit<OwnedReader>) -> FormatResult<HashMap<usize, String>>
    {
        let mut names = HashMap::new();
        let mut scopes: Vec<Option<String>> = Vec::new();
        let mut depth: isize = 0;

        let mut cursor = unit.entries();
        while let Some((delta, entry)) = cursor.next_dfs().map_err(|err| map_dwarf_error("traversing DIE tree", err))? {
            depth += delta;
            scopes.truncate(usize::try_from(depth).unwrap_or(0));

            let name = match entry.tag() {
                constants::DW_TAG_namespace
                | constants::DW_TAG_structure_type
                | constants::DW_TAG_class_type
                | constants::DW_TAG_union_type
                | constants::DW_TAG_enumeration_type => self.entry_name(unit, entry)?,
                _ => None,
            };
            let is_namespace = entry.tag() == constants::DW_TAG_namespace;
            if let (Some(name), false) = (&name, is_namespace) {
                let mut qualified: String = scopes.iter().flatten().map(|scope| format!("{scope}::")).collect();
                qualified.push_str(name);
                names.insert(entry.offset().0, qualified);
            }
            // Only namespaces qualify; nested aggregates keep the module path
            scopes.push(name.filter(|_| is_namespace));
        }
        Ok(names)
    }

    fn qualified_name(&self, unit_index: usize, offset: UnitOffset<usize>) -> Option<&str>
    {
        self.qualified
            .get(unit_index)
            .and_then(|names| names.get(&offset.0))
            .map(String::as_str)
    }

    /// Convert every type entry, unit by unit
    pub(crate) fn enumerate(&self) -> FormatResult<(TypeTable, Vec<CompileUnit>)>
    {
        let mut builder = TableBuilder::default();
        let mut compile_units = Vec::with_capacity(self.units.len());

        for (index, unit) in self.units.iter().enumerate() {
            let (name, language) = self.unit_identity(unit)?;
            let mut types = Vec::new();

            let mut cursor = unit.entries();
            while let Some((_delta, entry)) = cursor.next_dfs().map_err(|err| map_dwarf_error("traversing DIE tree", err))? {
                if !is_named_type(entry) || is_declaration(entry)? {
                    continue;
                }
                types.push(builder.type_at(self, index, entry.offset(), 0)?);
            }

            debug!("Unit {name} ({language:?}): {} types", types.len());
            compile_units.push(CompileUnit::new(name, language, types));
        }

        Ok((builder.table, compile_units))
    }

    fn unit_identity(&self, unit: &Unit<OwnedReader>) -> FormatResult<(String, Language)>
    {
        let mut cursor = unit.entries();
        let Some((_delta, root)) = cursor.next_dfs().map_err(|err| map_dwarf_error("reading unit root", err))? else {
            return Ok((ANONYMOUS.to_string(), Language::Other));
        };

        let name = self.entry_name(unit, root)?.unwrap_or_else(|| ANONYMOUS.to_string());
        let language = match root
            .attr_value(constants::DW_AT_language)
            .map_err(|err| map_dwarf_error("reading DW_AT_language", err))?
        {
            Some(AttributeValue::Language(constants::DW_LANG_Rust)) => Language::Rust,
            _ => Language::Other,
        };
        Ok((name, language))
    }

    fn members(&self, unit: &Unit<OwnedReader>, offset: UnitOffset<usize>) -> FormatResult<Vec<Member>>
    {
        let mut members = Vec::new();
        let mut tree = unit
            .entries_tree(Some(offset))
            .map_err(|err| map_dwarf_error("building struct tree", err))?;
        let root = tree.root().map_err(|err| map_dwarf_error("navigating struct root", err))?;
        let mut children = root.children();
        while let Some(child) = children
            .next()
            .map_err(|err| map_dwarf_error("iterating struct children", err))?
        {
            let entry = child.entry();
            if entry.tag() != constants::DW_TAG_member {
                continue;
            }
            members.push(Member {
                name: self.entry_name(unit, entry)?,
                ty: type_reference(entry)?,
                offset: member_offset(entry)?,
            });
        }
        Ok(members)
    }

    /// Element count from the first `DW_TAG_subrange_type` child
    fn array_len(unit: &Unit<OwnedReader>, offset: UnitOffset<usize>) -> FormatResult<Option<u64>>
    {
        let mut tree = unit
            .entries_tree(Some(offset))
            .map_err(|err| map_dwarf_error("building array tree", err))?;
        let root = tree.root().map_err(|err| map_dwarf_error("navigating array root", err))?;
        let mut children = root.children();
        while let Some(child) = children
            .next()
            .map_err(|err| map_dwarf_error("iterating array subranges", err))?
        {
            let entry = child.entry();
            if entry.tag() != constants::DW_TAG_subrange_type {
                continue;
            }
            if let Some(attr) = entry
                .attr(constants::DW_AT_count)
                .map_err(|err| map_dwarf_error("reading DW_AT_count", err))?
            {
                return Ok(attr.udata_value());
            }
            if let Some(attr) = entry
                .attr(constants::DW_AT_upper_bound)
                .map_err(|err| map_dwarf_error("reading DW_AT_upper_bound", err))?
            {
                return Ok(attr.udata_value().map(|upper| upper.saturating_add(1)));
            }
            return Ok(None);
        }
        Ok(None)
    }

    fn entry_name(&self, unit: &Unit<OwnedReader>, entry: &Entry<'_, '_>) -> FormatResult<Option<String>>
    {
        let Some(attr) = entry
            .attr(constants::DW_AT_name)
            .map_err(|err| map_dwarf_error("reading DW_AT_name", err))?
        else {
            return Ok(None);
        };

        let reader = self
            .dwarf
            .attr_string(unit, attr.value())
            .map_err(|err| map_dwarf_error("resolving DWARF string", err))?;
        let owned = match reader.to_string() {
            Ok(cow) => cow.into_owned(),
            Err(_) => reader
                .to_string_lossy()
                .map_err(|err| map_dwarf_error("decoding DWARF string", err))?
                .into_owned(),
        };
        Ok(Some(owned))
    }

    fn find_unit_for_offset(&self, target: UnitSectionOffset<usize>) -> Option<(usize, UnitOffset<usize>)>
    {
        self.units
            .iter()
            .enumerate()
            .find_map(|(index, unit)| target.to_unit_offset(unit).map(|offset| (index, offset)))
    }

    fn find_type_unit(&self, signature: DebugTypeSignature) -> Option<(usize, UnitOffset<usize>)>
    {
        self.units
            .iter()
            .enumerate()
            .find_map(|(index, unit)| match unit.header.type_() {
                UnitType::Type {
                    type_signature,
                    type_offset,
                }
                | UnitType::SplitType {
                    type_signature,
                    type_offset,
                } if type_signature == signature => Some((index, type_offset)),
                _ => None,
            })
    }
}

/// Accumulates converted types; keyed by `(unit index, DIE offset)`
#[derive(Default)]
struct TableBuilder
{
    table: TypeTable,
    converted: HashMap<(usize, usize), TypeId>,
    unknown: Option<TypeId>,
}

impl TableBuilder
{
    fn type_at(
        &mut self,
        reader: &TypeEnumerator<'_>,
        unit_index: usize,
        offset: UnitOffset<usize>,
        depth: usize,
    ) -> FormatResult<TypeId>
    {
        let key = (unit_index, offset.0);
        if let Some(&id) = self.converted.get(&key) {
            return Ok(id);
        }
        if depth >= MAX_TYPE_REF_DEPTH {
            trace!("Type reference chain at {offset:?} exceeds {MAX_TYPE_REF_DEPTH} levels");
            return Ok(self.unknown());
        }

        let unit = &reader.units[unit_index];
        let entry = unit
            .entry(offset)
            .map_err(|err| map_dwarf_error("resolving type reference", err))?;
        let name = reader.entry_name(unit, &entry)?;
        let byte_size = byte_size(&entry)?;

        match entry.tag() {
            tag @ (constants::DW_TAG_structure_type | constants::DW_TAG_class_type | constants::DW_TAG_union_type) => {
                let is_union = tag == constants::DW_TAG_union_type;
                let name = reader
                    .qualified_name(unit_index, offset)
                    .map(str::to_string)
                    .or(name)
                    .unwrap_or_else(|| ANONYMOUS.to_string());
                let size = byte_size.unwrap_or(0);
                let class = if is_union { TypeClass::Union } else { TypeClass::Struct };
                let id = self.reserve(key, TypeDescriptor::bare(name.clone(), class, size));

                let mut fields = Vec::new();
                for member in reader.members(unit, offset)? {
                    let ty = self.resolve_or_unknown(reader, unit_index, member.ty, depth)?;
                    fields.push(Field {
                        name: member.name,
                        ty,
                        offset: member.offset,
                    });
                }

                let descriptor = if is_union {
                    TypeDescriptor::union(name, size, fields)
                } else {
                    TypeDescriptor::structure(name, size, fields)
                };
                self.table.replace(id, descriptor);
                Ok(id)
            }
            constants::DW_TAG_base_type => {
                let name = name.unwrap_or_else(|| UNKNOWN.to_string());
                let size = byte_size.unwrap_or(0);
                let encoding = entry
                    .attr_value(constants::DW_AT_encoding)
                    .map_err(|err| map_dwarf_error("reading DW_AT_encoding", err))?;
                let descriptor = match encoding {
                    Some(AttributeValue::Encoding(encoding)) => match scalar_kind(encoding) {
                        Some(kind) => TypeDescriptor::scalar(name, kind, size),
                        None => TypeDescriptor::bare(name, TypeClass::Other, size),
                    },
                    _ => TypeDescriptor::bare(name, TypeClass::Other, size),
                };
                Ok(self.reserve(key, descriptor))
            }
            constants::DW_TAG_pointer_type | constants::DW_TAG_reference_type | constants::DW_TAG_rvalue_reference_type => {
                let size = byte_size.unwrap_or_else(|| u64::from(unit.encoding().address_size));
                let placeholder = name.clone().unwrap_or_else(|| UNKNOWN.to_string());
                let id = self.reserve(key, TypeDescriptor::bare(placeholder, TypeClass::Pointer, size));

                let target = match type_reference(&entry)? {
                    Some(value) => Some(self.resolve(reader, unit_index, value, depth + 1)?),
                    None => None,
                };
                let name = name.unwrap_or_else(|| {
                    let pointee = target
                        .and_then(|target| self.table.get(target))
                        .map_or("()", |descriptor| descriptor.name.as_str());
                    format!("*const {pointee}")
                });
                self.table.replace(
                    id,
                    TypeDescriptor {
                        target,
                        ..TypeDescriptor::bare(name, TypeClass::Pointer, size)
                    },
                );
                Ok(id)
            }
            constants::DW_TAG_array_type => {
                let id = self.reserve(key, TypeDescriptor::bare(UNKNOWN, TypeClass::Array, byte_size.unwrap_or(0)));

                let element = self.resolve_or_unknown(reader, unit_index, type_reference(&entry)?, depth)?;
                let len = TypeEnumerator::array_len(unit, offset)?.unwrap_or(0);
                let (element_name, element_size) = self
                    .table
                    .get(element)
                    .map_or((UNKNOWN, 0), |descriptor| (descriptor.name.as_str(), descriptor.byte_size));
                let name = format!("{element_name}[{len}]");
                let size = byte_size.unwrap_or_else(|| element_size.saturating_mul(len));

                self.table.replace(id, TypeDescriptor::array(name, element, len, size));
                Ok(id)
            }
            constants::DW_TAG_typedef
            | constants::DW_TAG_const_type
            | constants::DW_TAG_volatile_type
            | constants::DW_TAG_restrict_type
            | constants::DW_TAG_atomic_type => {
                let id = self.resolve_or_unknown(reader, unit_index, type_reference(&entry)?, depth)?;
                self.converted.insert(key, id);
                Ok(id)
            }
            _ => {
                let name = name.unwrap_or_else(|| UNKNOWN.to_string());
                Ok(self.reserve(key, TypeDescriptor::bare(name, TypeClass::Other, byte_size.unwrap_or(0))))
            }
        }
    }

    fn resolve(
        &mut self,
        reader: &TypeEnumerator<'_>,
        unit_index: usize,
        value: AttributeValue<OwnedReader>,
        depth: usize,
    ) -> FormatResult<TypeId>
    {
        match value {
            AttributeValue::UnitRef(offset) => self.type_at(reader, unit_index, offset, depth),
            AttributeValue::DebugInfoRef(offset) => match reader.find_unit_for_offset(UnitSectionOffset::from(offset)) {
                Some((index, offset)) => self.type_at(reader, index, offset, depth),
                None => Ok(self.unknown()),
            },
            AttributeValue::DebugTypesRef(signature) => match reader.find_type_unit(signature) {
                Some((index, offset)) => self.type_at(reader, index, offset, depth),
                None => Ok(self.unknown()),
            },
            _ => Ok(self.unknown()),
        }
    }

    fn resolve_or_unknown(
        &mut self,
        reader: &TypeEnumerator<'_>,
        unit_index: usize,
        value: Option<AttributeValue<OwnedReader>>,
        depth: usize,
    ) -> FormatResult<TypeId>
    {
        match value {
            Some(value) => self.resolve(reader, unit_index, value, depth + 1),
            None => Ok(self.unknown()),
        }
    }

    fn reserve(&mut self, key: (usize, usize), descriptor: TypeDescriptor) -> TypeId
    {
        let id = self.table.insert(descriptor);
        self.converted.insert(key, id);
        id
    }

    /// Shared stand-in for unresolvable references
    fn unknown(&mut self) -> TypeId
    {
        if let Some(id) = self.unknown {
            return id;
        }
        let id = self.table.insert(TypeDescriptor::bare(UNKNOWN, TypeClass::Other, 0));
        self.unknown = Some(id);
        id
    }
}

fn is_named_type(entry: &Entry<'_, '_>) -> bool
{
    matches!(
        entry.tag(),
        constants::DW_TAG_structure_type
            | constants::DW_TAG_class_type
            | constants::DW_TAG_union_type
            | constants::DW_TAG_base_type
            | constants::DW_TAG_pointer_type
            | constants::DW_TAG_reference_type
            | constants::DW_TAG_array_type
    )
}

fn is_declaration(entry: &Entry<'_, '_>) -> FormatResult<bool>
{
    let value = entry
        .attr_value(constants::DW_AT_declaration)
        .map_err(|err| map_dwarf_error("reading DW_AT_declaration", err))?;
    Ok(matches!(value, Some(AttributeValue::Flag(true))))
}

fn type_reference(entry: &Entry<'_, '_>) -> FormatResult<Option<AttributeValue<OwnedReader>>>
{
    entry
        .attr_value(constants::DW_AT_type)
        .map_err(|err| map_dwarf_error("reading DW_AT_type", err))
}

fn byte_size(entry: &Entry<'_, '_>) -> FormatResult<Option<u64>>
{
    Ok(entry
        .attr(constants::DW_AT_byte_size)
        .map_err(|err| map_dwarf_error("reading DW_AT_byte_size", err))?
        .and_then(|attr| attr.udata_value()))
}

fn member_offset(entry: &Entry<'_, '_>) -> FormatResult<u64>
{
    if let Some(attr) = entry
        .attr(constants::DW_AT_data_member_location)
        .map_err(|err| map_dwarf_error("reading DW_AT_data_member_location", err))?
    {
        if let Some(bytes) = attr.udata_value() {
            return Ok(bytes);
        }
    }

    if let Some(attr) = entry
        .attr(constants::DW_AT_data_bit_offset)
        .map_err(|err| map_dwarf_error("reading DW_AT_data_bit_offset", err))?
    {
        if let Some(bits) = attr.udata_value() {
            return Ok(bits / 8);
        }
    }

    Ok(0)
}

fn scalar_kind(encoding: DwAte) -> Option<ScalarKind>
{
    match encoding {
        constants::DW_ATE_signed | constants::DW_ATE_signed_char => Some(ScalarKind::Signed),
        constants::DW_ATE_unsigned | constants::DW_ATE_unsigned_char => Some(ScalarKind::Unsigned),
        constants::DW_ATE_float => Some(ScalarKind::Float),
        constants::DW_ATE_boolean => Some(ScalarKind::Bool),
        constants::DW_ATE_UTF => Some(ScalarKind::Char),
        _ => None,
    }
}
