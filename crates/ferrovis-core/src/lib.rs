//! # ferrovis-core
//!
//! Data formatters that make Rust values readable in a native debugger.
//!
//! Debuggers built for C see a Rust enum as a union of structs and a `Vec` as
//! a pointer, a capacity and a length. This crate recognizes those layouts and
//! presents them the way a Rust programmer thinks about them:
//! - Enums show only their active variant (`Some(42)`, `None`)
//! - `Vec`, slices and strings show their elements or text
//! - Tuples and tuple structs show `(a, b)` instead of `__0`, `__1`
//!
//! ## Host model
//!
//! The debugger side is abstracted as a [`types::TypeTable`] of type
//! descriptors and a [`memory::MemoryAccessor`] for target memory. Both are
//! passed explicitly through a [`context::FormatContext`]; nothing in this
//! crate holds a global debugger handle.
//!
//! ## Getting started
//!
//! 1. Load type information, e.g. with [`symbols::DebugImage`]
//! 2. Run [`registry::FormatterRegistry::classify_and_register_all`] once
//! 3. Ask the registry for summaries and synthetic providers per value

pub mod classify;
pub mod config;
pub mod context;
pub mod decode;
pub mod error;
pub mod memory;
pub mod prelude;
pub mod provider;
pub mod registry;
pub mod summary;
pub mod symbols;
pub mod types;
pub mod value;

pub use context::FormatContext;
// Re-export commonly used types
pub use error::{FormatError, FormatResult};
pub use registry::FormatterRegistry;
pub use value::Value;
