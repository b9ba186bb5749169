//! # Types
//!
//! The host-side model the formatters work against.
//!
//! Type metadata is owned by the debugger host and only read here: a
//! [`TypeTable`] arena of [`TypeDescriptor`]s, plus the [`CompileUnit`]s that
//! define them. Values themselves live in [`crate::value`].

pub mod address;
pub mod descriptor;
pub mod table;

// Re-export all public types
pub use address::Address;
pub use descriptor::{Field, ScalarKind, TypeClass, TypeDescriptor, TypeId};
pub use table::{CompileUnit, Language, TypeTable};
