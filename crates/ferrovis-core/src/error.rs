//! # Error Types
//!
//! General error handling for the formatter engine.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! None of these errors are meant to reach the debugger host. The functions the
//! host calls ([`crate::registry::FormatterRegistry::summary`], the
//! [`crate::provider::Synthetic`] methods, registration) convert them into
//! absent summaries, empty child lists, or "no such child" answers.

use thiserror::Error;

use crate::types::{Address, TypeId};

/// Main error type for formatting operations
///
/// ## Error Categories
///
/// 1. **Lookup errors**: NotFound, InvalidName, OutOfRange
/// 2. **Layout errors**: MissingMember, IncompleteType, UnknownType
/// 3. **Decoding errors**: MemoryRead, DepthExceeded, InvalidDiscriminant
/// 4. **Loader errors**: InvalidArgument, Io
#[derive(Error, Debug)]
pub enum FormatError
{
    /// No child with the given name exists
    ///
    /// The host treats this as "no such child".
    #[error("No child named `{0}`")]
    NotFound(String),

    /// A child display name could not be parsed back into an index
    ///
    /// Array-like providers name their children `[i]`; anything else is
    /// rejected with this error.
    #[error("Invalid child name: `{0}`")]
    InvalidName(String),

    /// A child index was outside `[0, count)`
    #[error("Child index {index} out of range (count {count})")]
    OutOfRange
    {
        /// The requested index, as the host passed it
        index: i64,
        /// The number of children the provider reports
        count: usize,
    },

    /// A fixed container member path did not resolve
    ///
    /// Container layouts are walked through hard-coded member names. Hitting
    /// this error means the path table does not match the layout the compiler
    /// emitted for `type_name`.
    #[error("Type `{type_name}` has no member `{member}`")]
    MissingMember
    {
        /// Display name of the type that was searched
        type_name: String,
        /// The member that was expected
        member: String,
    },

    /// Type metadata lacks information needed for decoding
    ///
    /// Examples:
    /// - A pointer with no pointee type
    /// - A scalar whose byte size is not 1, 2, 4 or 8
    #[error("Incomplete type information for `{0}`")]
    IncompleteType(String),

    /// A `TypeId` does not belong to the type table in use
    #[error("Unknown type id {0}")]
    UnknownType(TypeId),

    /// Reading target memory failed
    ///
    /// Expected during normal debugging: uninitialized locals and moved-from
    /// values routinely hold pointers into unmapped memory.
    #[error("Failed to read {size} bytes at {address}: {reason}")]
    MemoryRead
    {
        /// Start of the attempted read
        address: Address,
        /// Number of bytes requested
        size: usize,
        /// Reason reported by the memory accessor
        reason: String,
    },

    /// Walking nested wrappers to a niche discriminant exceeded the depth bound
    #[error("Discriminant lookup exceeded {limit} nested structs")]
    DepthExceeded
    {
        /// The configured bound
        limit: usize,
    },

    /// A regular enum discriminant selects no variant
    #[error("Discriminant {value} does not select one of {variants} variants")]
    InvalidDiscriminant
    {
        /// The discriminant read from memory
        value: u64,
        /// Number of variants declared by the union
        variants: usize,
    },

    /// Invalid argument passed to a loader function
    ///
    /// Used for malformed binaries and DWARF parse failures.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error (for reading binaries from disk)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, FormatError>`
///
/// ```rust
/// use ferrovis_core::error::FormatResult;
/// fn foo() -> FormatResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type FormatResult<T> = std::result::Result<T, FormatError>;
