//! Providers for the two enum encodings that need memory to resolve.

use super::ChildProvider;
use crate::classify::NicheLayout;
use crate::context::FormatContext;
use crate::error::{FormatError, FormatResult};
use crate::summary::unqualified_type_name;
use crate::types::TypeClass;
use crate::value::Value;

/// Enum stored as a union of variant structs
///
/// Every variant struct starts with the discriminant, so field 0 of field 0
/// selects the active variant. Children are the variant's fields with the
/// discriminant hidden, so every index is shifted by one.
#[derive(Debug)]
pub struct RegularEnumProvider
{
    variant: Value,
}

impl RegularEnumProvider
{
    pub fn initialize(value: &Value, ctx: &FormatContext<'_>) -> FormatResult<Self>
    {
        let discriminant = value.child_at(ctx, 0)?.child_at(ctx, 0)?.read_unsigned(ctx)?;
        let variants = value.child_count(ctx);
        let index = usize::try_from(discriminant)
            .ok()
            .filter(|&index| index < variants)
            .ok_or(FormatError::InvalidDiscriminant {
                value: discriminant,
                variants,
            })?;

        Ok(Self {
            variant: value.child_at(ctx, index)?,
        })
    }

    /// The active variant's struct, discriminant included
    pub fn variant(&self) -> &Value
    {
        &self.variant
    }
}

impl ChildProvider for RegularEnumProvider
{
    fn child_count(&self, ctx: &FormatContext<'_>) -> usize
    {
        self.variant.child_count(ctx).saturating_sub(1)
    }

    fn child_at(&self, ctx: &FormatContext<'_>, index: usize) -> FormatResult<Value>
    {
        self.variant.child_at(ctx, index + 1)
    }

    fn child_index(&self, ctx: &FormatContext<'_>, name: &str) -> FormatResult<usize>
    {
        match self.variant.child_index(ctx, name)? {
            0 => Err(FormatError::NotFound(name.to_string())),
            index => Ok(index - 1),
        }
    }

    fn summary(&self, ctx: &FormatContext<'_>) -> FormatResult<Option<String>>
    {
        Ok(Some(ctx.object_summary(&self.variant)))
    }
}

/// Two-variant enum whose data variant holds a never-zero field
///
/// The union's sole field is the data variant. Following the niche path and
/// then first fields of nested wrapper structs reaches a scalar; zero there
/// means the value is the data-less variant.
#[derive(Debug)]
pub struct NicheEnumProvider
{
    /// `None` when the value is the null variant
    variant: Option<Value>,
    null_variant: String,
}

impl NicheEnumProvider
{
    pub fn initialize(value: &Value, layout: &NicheLayout, ctx: &FormatContext<'_>) -> FormatResult<Self>
    {
        let populated = value.child_at(ctx, 0)?;
        let mut discriminant = layout
            .field_path
            .iter()
            .try_fold(populated.clone(), |current, &index| current.child_at(ctx, index))?;

        let limit = ctx.config().niche_depth_limit;
        let mut depth = 0;
        while ctx.type_of(&discriminant)?.class == TypeClass::Struct {
            if depth == limit {
                return Err(FormatError::DepthExceeded { limit });
            }
            discriminant = discriminant.child_at(ctx, 0)?;
            depth += 1;
        }

        let is_null = discriminant.read_unsigned(ctx)? == 0;
        Ok(Self {
            variant: (!is_null).then_some(populated),
            null_variant: layout.null_variant.clone(),
        })
    }

    pub fn is_null_variant(&self) -> bool
    {
        self.variant.is_none()
    }
}

impl ChildProvider for NicheEnumProvider
{
    fn child_count(&self, ctx: &FormatContext<'_>) -> usize
    {
        self.variant.as_ref().map_or(0, |variant| variant.child_count(ctx))
    }

    fn has_children(&self, ctx: &FormatContext<'_>) -> bool
    {
        self.variant
            .as_ref()
            .is_some_and(|variant| variant.might_have_children(ctx))
    }

    fn child_at(&self, ctx: &FormatContext<'_>, index: usize) -> FormatResult<Value>
    {
        match &self.variant {
            Some(variant) => variant.child_at(ctx, index),
            None => Err(FormatError::OutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                count: 0,
            }),
        }
    }

    fn child_index(&self, ctx: &FormatContext<'_>, name: &str) -> FormatResult<usize>
    {
        match &self.variant {
            Some(variant) => variant.child_index(ctx, name),
            None => Err(FormatError::NotFound(name.to_string())),
        }
    }

    fn summary(&self, ctx: &FormatContext<'_>) -> FormatResult<Option<String>>
    {
        let Some(variant) = &self.variant else {
            return Ok(Some(self.null_variant.clone()));
        };
        let type_name = unqualified_type_name(variant.type_name(ctx)?);
        Ok(Some(format!("{type_name}{}", ctx.object_summary(variant))))
    }
}
