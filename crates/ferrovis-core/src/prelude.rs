//! Common module for library exports

pub use crate::classify::{classify, Encoding, NicheLayout};
pub use crate::config::FormatterConfig;
pub use crate::context::FormatContext;
pub use crate::error::{FormatError, FormatResult};
pub use crate::memory::{MemoryAccessor, MemorySnapshot};
pub use crate::provider::{ProviderKind, Synthetic};
pub use crate::registry::{FormatterRegistry, RegistrationReport, TypeNameSpecifier};
pub use crate::symbols::DebugImage;
pub use crate::types::{Address, CompileUnit, Field, Language, ScalarKind, TypeClass, TypeDescriptor, TypeId, TypeTable};
pub use crate::value::Value;
