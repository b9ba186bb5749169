//! Static type metadata, as supplied by the debugger host.

use std::fmt;

/// Index of a [`TypeDescriptor`] inside a [`super::TypeTable`]
///
/// Type graphs are cyclic (`struct Node { next: *mut Node }`), so descriptors
/// refer to each other through ids instead of owning each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub(crate) u32);

impl TypeId
{
    /// Position of the descriptor in its table
    pub const fn index(self) -> usize
    {
        self.0 as usize
    }
}

impl fmt::Display for TypeId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "#{}", self.0)
    }
}

/// Coarse classification of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass
{
    Struct,
    Union,
    Array,
    Pointer,
    /// Scalars, unit types and anything else without structure
    Other,
}

/// How a scalar's bytes are interpreted when rendered as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind
{
    Signed,
    Unsigned,
    Float,
    Bool,
    Char,
}

/// One member of a struct or union
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field
{
    /// Member name; `None` marks a positional member
    pub name: Option<String>,
    pub ty: TypeId,
    /// Byte offset from the start of the parent
    pub offset: u64,
}

impl Field
{
    pub fn named(name: impl Into<String>, ty: TypeId, offset: u64) -> Self
    {
        Self {
            name: Some(name.into()),
            ty,
            offset,
        }
    }

    pub fn positional(ty: TypeId, offset: u64) -> Self
    {
        Self { name: None, ty, offset }
    }
}

/// Read-only view of a value's static type
///
/// Field order matches memory layout order; the layout classifier relies on
/// field 0 specifically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor
{
    /// Display name, possibly qualified with a module path
    pub name: String,
    pub class: TypeClass,
    pub byte_size: u64,
    pub fields: Vec<Field>,
    /// Pointee of a pointer, element of an array
    pub target: Option<TypeId>,
    /// Element count of a fixed-size array
    pub array_len: Option<u64>,
    /// Interpretation of a scalar's bytes
    pub scalar: Option<ScalarKind>,
}

impl TypeDescriptor
{
    pub fn scalar(name: impl Into<String>, kind: ScalarKind, byte_size: u64) -> Self
    {
        Self {
            scalar: Some(kind),
            ..Self::bare(name, TypeClass::Other, byte_size)
        }
    }

    pub fn structure(name: impl Into<String>, byte_size: u64, fields: Vec<Field>) -> Self
    {
        Self {
            fields,
            ..Self::bare(name, TypeClass::Struct, byte_size)
        }
    }

    pub fn union(name: impl Into<String>, byte_size: u64, fields: Vec<Field>) -> Self
    {
        Self {
            fields,
            ..Self::bare(name, TypeClass::Union, byte_size)
        }
    }

    pub fn pointer(name: impl Into<String>, pointee: TypeId, byte_size: u64) -> Self
    {
        Self {
            target: Some(pointee),
            ..Self::bare(name, TypeClass::Pointer, byte_size)
        }
    }

    /// Fixed-size array; `byte_size` is the size of the whole array
    pub fn array(name: impl Into<String>, element: TypeId, len: u64, byte_size: u64) -> Self
    {
        Self {
            target: Some(element),
            array_len: Some(len),
            ..Self::bare(name, TypeClass::Array, byte_size)
        }
    }

    /// A type with a name and size but no structure or scalar interpretation
    pub fn bare(name: impl Into<String>, class: TypeClass, byte_size: u64) -> Self
    {
        Self {
            name: name.into(),
            class,
            byte_size,
            fields: Vec::new(),
            target: None,
            array_len: None,
            scalar: None,
        }
    }

    /// Whether this type is a struct or union
    pub fn is_aggregate(&self) -> bool
    {
        matches!(self.class, TypeClass::Struct | TypeClass::Union)
    }

    /// Index of the field called `name`
    pub fn field_index(&self, name: &str) -> Option<usize>
    {
        self.fields.iter().position(|field| field.name.as_deref() == Some(name))
    }
}
