//! # Values
//!
//! A [`Value`] is a typed locator: a type id, an address in the target and an
//! optional display name. It owns no bytes. Children and scalar contents are
//! fetched through the [`crate::memory::MemoryAccessor`] only when asked for,
//! because values may be huge or hold pointers into unmapped memory.
//!
//! The methods here implement the host's *default* view of a value: struct and
//! union members at their offsets, array elements at `index * element_size`.
//! Synthetic providers build their child trees on top of this view.

use tracing::trace;

use crate::context::FormatContext;
use crate::error::{FormatError, FormatResult};
use crate::types::{Address, ScalarKind, TypeClass, TypeDescriptor, TypeId};

/// Prefix of the display name given to unnamed (positional) members
pub const POSITIONAL_PREFIX: &str = "__";

/// A typed location in the target process
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value
{
    name: Option<String>,
    ty: TypeId,
    address: Address,
}

impl Value
{
    /// An unnamed value of type `ty` at `address`
    pub fn new(ty: TypeId, address: Address) -> Self
    {
        Self { name: None, ty, address }
    }

    /// The same value under a display name
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self
    {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str>
    {
        self.name.as_deref()
    }

    pub fn ty(&self) -> TypeId
    {
        self.ty
    }

    pub fn address(&self) -> Address
    {
        self.address
    }

    /// Materialize a child of type `ty` at `offset` bytes past this value
    pub fn child_at_offset(&self, name: impl Into<String>, offset: u64, ty: TypeId) -> Value
    {
        Value::new(ty, self.address + offset).named(name)
    }

    /// Display name of this value's type
    pub fn type_name<'a>(&self, ctx: &FormatContext<'a>) -> FormatResult<&'a str>
    {
        ctx.type_of(self).map(|descriptor| descriptor.name.as_str())
    }

    /// Number of default children
    ///
    /// Unknown types have none.
    pub fn child_count(&self, ctx: &FormatContext<'_>) -> usize
    {
        match ctx.type_of(self) {
            Ok(descriptor) => default_child_count(descriptor),
            Err(_) => 0,
        }
    }

    /// Whether this value may have default children
    pub fn might_have_children(&self, ctx: &FormatContext<'_>) -> bool
    {
        self.child_count(ctx) > 0
    }

    /// The default child at `index`
    ///
    /// ## Errors
    ///
    /// `OutOfRange` if `index` is not below [`Value::child_count`].
    pub fn child_at(&self, ctx: &FormatContext<'_>, index: usize) -> FormatResult<Value>
    {
        let descriptor = ctx.type_of(self)?;
        let out_of_range = || FormatError::OutOfRange {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            count: default_child_count(descriptor),
        };

        match descriptor.class {
            TypeClass::Struct | TypeClass::Union => {
                let field = descriptor.fields.get(index).ok_or_else(out_of_range)?;
                let name = field
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("{POSITIONAL_PREFIX}{index}"));
                Ok(self.child_at_offset(name, field.offset, field.ty))
            }
            TypeClass::Array => {
                let len = descriptor.array_len.unwrap_or(0);
                let element = descriptor
                    .target
                    .ok_or_else(|| FormatError::IncompleteType(descriptor.name.clone()))?;
                if index as u64 >= len {
                    return Err(out_of_range());
                }
                let element_size = ctx.descriptor(element)?.byte_size;
                Ok(Value::new(element, self.address.element(index as u64, element_size)).named(format!("[{index}]")))
            }
            TypeClass::Pointer | TypeClass::Other => Err(out_of_range()),
        }
    }

    /// Index of the default child displayed as `name`
    ///
    /// ## Errors
    ///
    /// `NotFound` if no child has that name.
    pub fn child_index(&self, ctx: &FormatContext<'_>, name: &str) -> FormatResult<usize>
    {
        let descriptor = ctx.type_of(self)?;
        let not_found = || FormatError::NotFound(name.to_string());
        match descriptor.class {
            TypeClass::Struct | TypeClass::Union => descriptor
                .field_index(name)
                .or_else(|| positional_index(name).filter(|&index| index < descriptor.fields.len()))
                .ok_or_else(not_found),
            TypeClass::Array => parse_index_name(name)
                .ok()
                .filter(|&index| (index as u64) < descriptor.array_len.unwrap_or(0))
                .ok_or_else(not_found),
            TypeClass::Pointer | TypeClass::Other => Err(not_found()),
        }
    }

    /// The member called `name`
    ///
    /// ## Errors
    ///
    /// `MissingMember` if this value's type has no such member.
    pub fn member(&self, ctx: &FormatContext<'_>, name: &str) -> FormatResult<Value>
    {
        let descriptor = ctx.type_of(self)?;
        let missing = || FormatError::MissingMember {
            type_name: descriptor.name.clone(),
            member: name.to_string(),
        };
        if !descriptor.is_aggregate() {
            return Err(missing());
        }
        let index = descriptor.field_index(name).ok_or_else(missing)?;
        self.child_at(ctx, index)
    }

    /// Follow a chain of member names
    ///
    /// ```text
    /// vec.member_path(ctx, &["buf", "ptr", "pointer", "__0"])
    /// ```
    pub fn member_path(&self, ctx: &FormatContext<'_>, path: &[&str]) -> FormatResult<Value>
    {
        path.iter()
            .try_fold(self.clone(), |current, name| current.member(ctx, name))
    }

    /// Read this value as an unsigned integer of its own byte size
    ///
    /// Pointers read as their address.
    pub fn read_unsigned(&self, ctx: &FormatContext<'_>) -> FormatResult<u64>
    {
        let descriptor = ctx.type_of(self)?;
        let size = usize::try_from(descriptor.byte_size)
            .map_err(|_| FormatError::IncompleteType(descriptor.name.clone()))?;
        ctx.memory.read_unsigned(self.address, size)
    }

    /// Raw scalar value text, as a debugger's variable view shows it
    ///
    /// `None` for aggregates, for types without a scalar interpretation, and
    /// when the bytes cannot be read.
    pub fn scalar_text(&self, ctx: &FormatContext<'_>) -> Option<String>
    {
        let descriptor = ctx.type_of(self).ok()?;
        match render_scalar(self, descriptor, ctx) {
            Ok(text) => text,
            Err(err) => {
                trace!("No scalar text for {}: {err}", descriptor.name);
                None
            }
        }
    }
}

fn default_child_count(descriptor: &TypeDescriptor) -> usize
{
    match descriptor.class {
        TypeClass::Struct | TypeClass::Union => descriptor.fields.len(),
        TypeClass::Array => usize::try_from(descriptor.array_len.unwrap_or(0)).unwrap_or(usize::MAX),
        TypeClass::Pointer | TypeClass::Other => 0,
    }
}

fn positional_index(name: &str) -> Option<usize>
{
    name.strip_prefix(POSITIONAL_PREFIX)?.parse().ok()
}

/// Parse a `[index]` display name back into an index
///
/// ## Errors
///
/// `InvalidName` unless `name` is a decimal index, optionally bracketed.
pub fn parse_index_name(name: &str) -> FormatResult<usize>
{
    name.trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .map_err(|_| FormatError::InvalidName(name.to_string()))
}

fn render_scalar(value: &Value, descriptor: &TypeDescriptor, ctx: &FormatContext<'_>) -> FormatResult<Option<String>>
{
    if descriptor.class == TypeClass::Pointer {
        return Ok(Some(format!("{:#x}", value.read_unsigned(ctx)?)));
    }
    let Some(kind) = descriptor.scalar else {
        return Ok(None);
    };

    let raw = value.read_unsigned(ctx)?;
    let text = match (kind, descriptor.byte_size) {
        (ScalarKind::Unsigned, _) => raw.to_string(),
        (ScalarKind::Signed, size) => sign_extend(raw, size).to_string(),
        (ScalarKind::Bool, _) => (raw != 0).to_string(),
        (ScalarKind::Float, 4) => f32::from_bits(raw as u32).to_string(),
        (ScalarKind::Float, 8) => f64::from_bits(raw).to_string(),
        (ScalarKind::Char, _) => {
            let ch = u32::try_from(raw)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            format!("{ch:?}")
        }
        (ScalarKind::Float, _) => return Err(FormatError::IncompleteType(descriptor.name.clone())),
    };
    Ok(Some(text))
}

fn sign_extend(raw: u64, size: u64) -> i64
{
    match size {
        1 => i64::from(raw as u8 as i8),
        2 => i64::from(raw as u16 as i16),
        4 => i64::from(raw as u32 as i32),
        _ => raw as i64,
    }
}
