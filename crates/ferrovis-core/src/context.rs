//! # Format Context
//!
//! Everything a decoder needs besides the value itself, passed explicitly.

use crate::config::FormatterConfig;
use crate::error::{FormatError, FormatResult};
use crate::memory::MemoryAccessor;
use crate::registry::FormatterRegistry;
use crate::types::{TypeDescriptor, TypeId, TypeTable};
use crate::value::Value;

/// Type metadata, memory access and installed formatters for one inspection
///
/// Cheap to copy; it only holds references. Every summary formatter, container
/// decoder and synthetic provider receives one.
#[derive(Clone, Copy)]
pub struct FormatContext<'a>
{
    pub types: &'a TypeTable,
    pub memory: &'a dyn MemoryAccessor,
    pub registry: &'a FormatterRegistry,
}

impl<'a> FormatContext<'a>
{
    pub fn new(types: &'a TypeTable, memory: &'a dyn MemoryAccessor, registry: &'a FormatterRegistry) -> Self
    {
        Self {
            types,
            memory,
            registry,
        }
    }

    /// Look up a descriptor by id
    ///
    /// ## Errors
    ///
    /// `UnknownType` if `id` does not belong to this context's table.
    pub fn descriptor(&self, id: TypeId) -> FormatResult<&'a TypeDescriptor>
    {
        self.types.get(id).ok_or(FormatError::UnknownType(id))
    }

    /// Descriptor of `value`'s type
    pub fn type_of(&self, value: &Value) -> FormatResult<&'a TypeDescriptor>
    {
        self.descriptor(value.ty())
    }

    pub fn config(&self) -> &'a FormatterConfig
    {
        self.registry.config()
    }

    /// The summary the installed formatters produce for `value`, if any
    pub fn summary(&self, value: &Value) -> Option<String>
    {
        self.registry.summary(value, self)
    }

    /// Best available one-line text for `value`
    ///
    /// Falls back from the installed summary to the raw scalar text, and
    /// finally to the configured placeholder.
    pub fn object_summary(&self, value: &Value) -> String
    {
        self.summary(value)
            .or_else(|| value.scalar_text(self))
            .unwrap_or_else(|| self.config().unavailable_placeholder.clone())
    }
}
