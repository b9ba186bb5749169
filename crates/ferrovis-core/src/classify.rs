//! # Layout Classifier
//!
//! Enums and tuples cannot be recognized by type name. This module decides,
//! from field names and counts alone, which encoding a struct or union uses:
//!
//! | Encoding | Shape |
//! |---|---|
//! | `Singleton` | union with one unnamed field |
//! | `NicheOptimized` | union with one field named `RUST$ENCODED$ENUM$<i>$...$<Null>` |
//! | `RegularEnum` | union with two or more fields, one struct per variant |
//! | `EnumVariantBody` | struct whose field 0 is `RUST$ENUM$DISR` |
//! | `TupleLike` | struct whose field 0 is `__0` |
//! | `Opaque` | anything else |
//!
//! Classification never touches target memory and never fails: unknown
//! shapes are `Opaque` and keep the host's default rendering.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::types::{TypeClass, TypeDescriptor};

/// Name of the discriminant field in an enum variant struct
pub const ENUM_DISCRIMINANT: &str = "RUST$ENUM$DISR";

/// Prefix of the single field of a niche-optimized enum union
pub const ENCODED_ENUM_PREFIX: &str = "RUST$ENCODED$ENUM$";

/// Name of the first positional field of tuple structs and tuple variants
pub const POSITIONAL_FIELD: &str = "__0";

/// Where a niche-optimized enum keeps its discriminant, and what to call the
/// variant it encodes as zero
///
/// Such enums have two variants: one without data, and one holding a field
/// (not necessarily at the top level) that can never be zero. That field
/// doubles as the discriminant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicheLayout
{
    /// Child indices leading from the populated variant to the discriminant
    pub field_path: SmallVec<[usize; 4]>,
    /// Display name of the data-less variant
    pub null_variant: String,
}

impl NicheLayout
{
    /// Parse a `RUST$ENCODED$ENUM$<i1>$<i2>$...$<NullName>` field name
    ///
    /// The last `$`-delimited segment is the null variant's name; every segment
    /// between the prefix and it must be a decimal index, and there must be at
    /// least one.
    ///
    /// ```rust
    /// use ferrovis_core::classify::NicheLayout;
    ///
    /// let layout = NicheLayout::parse("RUST$ENCODED$ENUM$0$1$None").unwrap();
    /// assert_eq!(layout.field_path.as_slice(), &[0, 1]);
    /// assert_eq!(layout.null_variant, "None");
    /// assert!(NicheLayout::parse("RUST$ENCODED$ENUM$None").is_none());
    /// ```
    pub fn parse(field_name: &str) -> Option<Self>
    {
        let encoded = field_name.strip_prefix(ENCODED_ENUM_PREFIX)?;
        let (indices, null_variant) = encoded.rsplit_once('$')?;
        if null_variant.is_empty() {
            return None;
        }
        let field_path = indices
            .split('$')
            .map(|segment| segment.parse::<usize>().ok())
            .collect::<Option<SmallVec<[usize; 4]>>>()?;

        Some(Self {
            field_path,
            null_variant: null_variant.to_string(),
        })
    }
}

/// The memory encoding a type uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding
{
    /// Single-variant enum; displays as its sole child
    Singleton,
    /// Two-variant enum whose discriminant lives in a niche of the data variant
    NicheOptimized(Arc<NicheLayout>),
    /// Union of variant structs, discriminant in field 0 of field 0
    RegularEnum,
    /// One variant of a regular enum
    EnumVariantBody,
    /// Tuple struct or tuple variant
    TupleLike,
    /// No special handling
    Opaque,
}

impl Encoding
{
    /// Short label used in logs and listings
    pub fn label(&self) -> &'static str
    {
        match self {
            Encoding::Singleton => "singleton",
            Encoding::NicheOptimized(_) => "niche-optimized",
            Encoding::RegularEnum => "regular-enum",
            Encoding::EnumVariantBody => "enum-variant",
            Encoding::TupleLike => "tuple",
            Encoding::Opaque => "opaque",
        }
    }
}

/// Determine the encoding of `descriptor`
///
/// Pure and total. A single-field union whose field is named, but not with
/// the encoded-enum prefix, is neither known representation and stays
/// `Opaque`.
pub fn classify(descriptor: &TypeDescriptor) -> Encoding
{
    let Some(first) = descriptor.fields.first() else {
        return Encoding::Opaque;
    };

    match descriptor.class {
        TypeClass::Union if descriptor.fields.len() == 1 => match first.name.as_deref() {
            None => Encoding::Singleton,
            Some(name) if name.starts_with(ENCODED_ENUM_PREFIX) => NicheLayout::parse(name)
                .map(|layout| Encoding::NicheOptimized(Arc::new(layout)))
                .unwrap_or(Encoding::Opaque),
            Some(_) => Encoding::Opaque,
        },
        TypeClass::Union => Encoding::RegularEnum,
        TypeClass::Struct => match first.name.as_deref() {
            Some(ENUM_DISCRIMINANT) => Encoding::EnumVariantBody,
            Some(POSITIONAL_FIELD) => Encoding::TupleLike,
            _ => Encoding::Opaque,
        },
        TypeClass::Array | TypeClass::Pointer | TypeClass::Other => Encoding::Opaque,
    }
}

/// Memo of classifications keyed by type name
///
/// Each distinct name is classified at most once; later lookups return the
/// stored result even if a differently shaped descriptor arrives under the
/// same name.
///
/// ## Thread Safety
///
/// Not thread-safe. Hosts that invoke formatters concurrently must wrap the
/// owning registry in a `RwLock`.
#[derive(Debug, Default)]
pub struct ClassificationCache
{
    entries: HashMap<String, Encoding>,
}

impl ClassificationCache
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Classify `descriptor`, or return the memoized result for its name
    pub fn classify(&mut self, descriptor: &TypeDescriptor) -> Encoding
    {
        if let Some(existing) = self.entries.get(&descriptor.name) {
            return existing.clone();
        }
        let encoding = classify(descriptor);
        self.entries.insert(descriptor.name.clone(), encoding.clone());
        encoding
    }

    /// Previously computed classification for `type_name`
    pub fn get(&self, type_name: &str) -> Option<&Encoding>
    {
        self.entries.get(type_name)
    }

    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }
}
