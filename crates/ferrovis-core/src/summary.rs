//! # Summary Formatters
//!
//! Functions from a value (plus its already computed classification) to a
//! short display string. Each one reads a bounded number of children: element
//! lists stop once the joined text passes the configured budget, because
//! summaries are rendered inline and must stay cheap even for huge containers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::FormatContext;
use crate::error::FormatResult;
use crate::value::{Value, POSITIONAL_PREFIX};

/// Marker appended to sequence summaries cut short by the budget
pub const SEQUENCE_TRUNCATION: &str = ", ...";

static UNQUALIFIED_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\w+::)*(\w+).*").expect("valid type name pattern"));

/// Summary formatters that are plain functions of the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryKind
{
    /// Fixed-size array: `(N) [a, b, ...]`
    Array,
    /// Single-variant enum: the summary of its only child
    SingletonEnum,
    /// Variant of a regular enum: `Name`, `Name(a, b)` or `Name{x:a, y:b}`
    EnumVariant,
    /// Tuple struct: `(a, b)`
    Tuple,
}

impl SummaryKind
{
    pub fn summarize(self, value: &Value, ctx: &FormatContext<'_>) -> FormatResult<String>
    {
        match self {
            SummaryKind::Array => array_summary(value, ctx),
            SummaryKind::SingletonEnum => singleton_enum_summary(value, ctx),
            SummaryKind::EnumVariant => enum_variant_summary(value, ctx),
            SummaryKind::Tuple => tuple_summary(value, ctx),
        }
    }

    pub fn label(self) -> &'static str
    {
        match self {
            SummaryKind::Array => "array",
            SummaryKind::SingletonEnum => "singleton-enum",
            SummaryKind::EnumVariant => "enum-variant",
            SummaryKind::Tuple => "tuple",
        }
    }
}

/// Strip the module path and generic arguments from a type name
///
/// Names of tuples, arrays, references and pointers are returned unchanged.
///
/// ```rust
/// use ferrovis_core::summary::unqualified_type_name;
///
/// assert_eq!(unqualified_type_name("core::option::Some"), "Some");
/// assert_eq!(unqualified_type_name("alloc::vec::Vec<u8>"), "Vec");
/// assert_eq!(unqualified_type_name("&str"), "&str");
/// ```
pub fn unqualified_type_name(type_name: &str) -> &str
{
    if type_name.starts_with(['(', '[', '&', '*']) {
        return type_name;
    }
    UNQUALIFIED_TYPE
        .captures(type_name)
        .and_then(|captures| captures.get(1))
        .map_or(type_name, |name| name.as_str())
}

/// Join element summaries with `, ` until the text exceeds the budget
///
/// Once the budget is exceeded, [`SEQUENCE_TRUNCATION`] is appended and the
/// remaining elements are never read.
pub fn sequence_summary(children: impl IntoIterator<Item = Value>, ctx: &FormatContext<'_>) -> String
{
    let budget = ctx.config().summary_budget;
    let mut text = String::new();
    let mut chars = 0usize;

    for child in children {
        if !text.is_empty() {
            text.push_str(", ");
            chars += 2;
        }
        let item = ctx.object_summary(&child);
        chars += item.chars().count();
        text.push_str(&item);
        if chars > budget {
            text.push_str(SEQUENCE_TRUNCATION);
            break;
        }
    }
    text
}

/// `(N) [a, b, ...]` over a value's default children
pub fn array_summary(value: &Value, ctx: &FormatContext<'_>) -> FormatResult<String>
{
    let count = value.child_count(ctx);
    let children = (0..count).map_while(|index| value.child_at(ctx, index).ok());
    Ok(format!("({count}) [{}]", sequence_summary(children, ctx)))
}

/// The summary of a single-variant enum's sole child
pub fn singleton_enum_summary(value: &Value, ctx: &FormatContext<'_>) -> FormatResult<String>
{
    let only = value.child_at(ctx, 0)?;
    Ok(ctx.object_summary(&only))
}

/// Render one variant of a regular enum
///
/// Field 0 is the discriminant and is never shown. A variant without other
/// fields renders as its bare name; positional fields (`__0`, `__1`, ...)
/// render as `Name(a, b)`; named fields as `Name{x:a, y:b}`.
pub fn enum_variant_summary(value: &Value, ctx: &FormatContext<'_>) -> FormatResult<String>
{
    let descriptor = ctx.type_of(value)?;
    let name = unqualified_type_name(&descriptor.name);
    if descriptor.fields.len() <= 1 {
        return Ok(name.to_string());
    }

    let is_tuple = descriptor.fields[1]
        .name
        .as_deref()
        .map_or(true, |field| field.starts_with(POSITIONAL_PREFIX));

    let mut parts = Vec::with_capacity(descriptor.fields.len() - 1);
    for index in 1..descriptor.fields.len() {
        let field = value.child_at(ctx, index)?;
        let summary = ctx.object_summary(&field);
        if is_tuple {
            parts.push(summary);
        } else {
            parts.push(format!("{}:{summary}", field.name().unwrap_or_default()));
        }
    }

    if is_tuple {
        Ok(format!("{name}({})", parts.join(", ")))
    } else {
        Ok(format!("{name}{{{}}}", parts.join(", ")))
    }
}

/// `(a, b, c)` over every field of a tuple struct
pub fn tuple_summary(value: &Value, ctx: &FormatContext<'_>) -> FormatResult<String>
{
    let fields = (0..value.child_count(ctx))
        .map(|index| value.child_at(ctx, index).map(|field| ctx.object_summary(&field)))
        .collect::<FormatResult<Vec<_>>>()?;
    Ok(format!("({})", fields.join(", ")))
}
