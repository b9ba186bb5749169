//! Type arena and compile-unit listing.

use std::collections::HashMap;

use super::descriptor::{ScalarKind, TypeDescriptor, TypeId};

/// Source language of a compile unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language
{
    Rust,
    Other,
}

/// A compile unit of the target and the aggregate types it defines
#[derive(Debug, Clone)]
pub struct CompileUnit
{
    /// Primary source file (or producer-supplied name) of the unit
    pub name: String,
    pub language: Language,
    /// Struct and union types defined in this unit
    pub types: Vec<TypeId>,
}

impl CompileUnit
{
    pub fn new(name: impl Into<String>, language: Language, types: Vec<TypeId>) -> Self
    {
        Self {
            name: name.into(),
            language,
            types,
        }
    }
}

/// Append-only arena of type descriptors
///
/// Every table is seeded with a `u8` primitive, which serves as the element
/// type of foreign byte slices whose debug info lacks one.
///
/// ## Thread Safety
///
/// The table is immutable once handed to a [`crate::context::FormatContext`];
/// build it on one thread, then share it by reference.
#[derive(Debug, Clone)]
pub struct TypeTable
{
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, TypeId>,
    byte: TypeId,
}

impl Default for TypeTable
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl TypeTable
{
    /// Create a table holding only the seeded `u8` primitive
    #[must_use]
    pub fn new() -> Self
    {
        let mut table = Self {
            types: Vec::new(),
            by_name: HashMap::new(),
            byte: TypeId(0),
        };
        table.byte = table.insert(TypeDescriptor::scalar("u8", ScalarKind::Unsigned, 1));
        table
    }

    /// Add a descriptor and return its id
    ///
    /// When several descriptors share a name (generic instantiations repeated
    /// across compile units), name lookup keeps resolving to the first.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> TypeId
    {
        let id = TypeId(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        self.by_name.entry(descriptor.name.clone()).or_insert(id);
        self.types.push(descriptor);
        id
    }

    /// Overwrite a descriptor previously returned by [`TypeTable::insert`]
    ///
    /// Loaders reserve an id with a placeholder before resolving members so
    /// self-referential types terminate. Returns `false` if `id` is unknown.
    pub fn replace(&mut self, id: TypeId, descriptor: TypeDescriptor) -> bool
    {
        let Some(slot) = self.types.get_mut(id.index()) else {
            return false;
        };
        if slot.name != descriptor.name {
            if self.by_name.get(&slot.name) == Some(&id) {
                self.by_name.remove(&slot.name);
            }
            self.by_name.entry(descriptor.name.clone()).or_insert(id);
        }
        *slot = descriptor;
        true
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeDescriptor>
    {
        self.types.get(id.index())
    }

    /// Find a type by its exact display name
    pub fn lookup(&self, name: &str) -> Option<TypeId>
    {
        self.by_name.get(name).copied()
    }

    /// The seeded `u8` primitive
    pub fn byte_type(&self) -> TypeId
    {
        self.byte
    }

    pub fn len(&self) -> usize
    {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeDescriptor)>
    {
        self.types
            .iter()
            .enumerate()
            .map(|(index, descriptor)| (TypeId(u32::try_from(index).unwrap_or(u32::MAX)), descriptor))
    }
}
