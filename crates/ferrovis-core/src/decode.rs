//! # Container Decoders
//!
//! Locate the `(data pointer, element count, element type)` triple of the
//! standard containers, and turn byte ranges into display text.
//!
//! Each container kind is a fixed member-path walk over the layout the
//! compiler emits:
//!
//! | Kind | Data pointer | Length |
//! |---|---|---|
//! | `Vec<T>` | `buf.ptr.pointer.__0` | `len` |
//! | `&[T]`, `&str` | `data_ptr` | `length` |
//! | `String` | `vec` → as `Vec<u8>` | |
//! | `CString` | `inner.data_ptr` | `inner.length - 1` |
//! | `OsString` | `inner.inner[.bytes]` → as `Vec<u8>` | |
//! | `PathBuf` | `inner` → as `OsString` | |
//! | `CStr`, `OsStr`, `Path` | word 0 of the value | word 1 (minus the NUL for `CStr`) |
//!
//! A path segment that does not resolve is a bug in this table, not a runtime
//! condition, and surfaces as [`FormatError::MissingMember`].

use tracing::error;

use crate::context::FormatContext;
use crate::error::{FormatError, FormatResult};
use crate::memory::MemoryAccessor;
use crate::types::{Address, TypeId};
use crate::value::Value;

/// Member path from a `Vec` to its raw data pointer
pub const VEC_DATA_PATH: &[&str] = &["buf", "ptr", "pointer", "__0"];

/// Marker appended to string summaries cut at the byte limit
pub const STRING_TRUNCATION: &str = "...";

/// The standard container layouts with dedicated decoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind
{
    /// Owned growable vector
    Vec,
    /// Borrowed slice `&[T]` / `&mut [T]`
    Slice,
    /// Borrowed string slice `&str`
    StrSlice,
    /// Owned string, a vector of bytes
    String,
    /// Owned C string, a boxed NUL-terminated byte slice
    CString,
    /// Borrowed C string, an unsized foreign slice
    CStr,
    /// Owned OS string
    OsString,
    /// Borrowed OS string, an unsized foreign slice
    OsStr,
    /// Owned path, wrapping an OS string
    PathBuf,
    /// Borrowed path, an unsized foreign slice
    Path,
}

impl ContainerKind
{
    /// Whether the summary is the decoded text rather than an element list
    pub fn is_string(self) -> bool
    {
        !matches!(self, ContainerKind::Vec | ContainerKind::Slice)
    }

    pub fn label(self) -> &'static str
    {
        match self {
            ContainerKind::Vec => "vec",
            ContainerKind::Slice => "slice",
            ContainerKind::StrSlice => "str",
            ContainerKind::String => "string",
            ContainerKind::CString => "cstring",
            ContainerKind::CStr => "cstr",
            ContainerKind::OsString => "os-string",
            ContainerKind::OsStr => "os-str",
            ContainerKind::PathBuf => "path-buf",
            ContainerKind::Path => "path",
        }
    }

    /// Find the data pointer and element count of `value`
    ///
    /// ## Errors
    ///
    /// - `MissingMember` if the layout does not match this kind's path table
    /// - `IncompleteType` if the data pointer has no pointee type
    /// - `MemoryRead` if the pointer or length cannot be read
    pub fn locate(self, value: &Value, ctx: &FormatContext<'_>) -> FormatResult<ContainerView>
    {
        match self {
            ContainerKind::Vec => vec_view(value, ctx),
            ContainerKind::Slice | ContainerKind::StrSlice => slice_view(value, ctx),
            ContainerKind::String => vec_view(&value.member(ctx, "vec")?, ctx),
            ContainerKind::CString => {
                let view = slice_view(&value.member(ctx, "inner")?, ctx)?;
                Ok(view.without_terminator())
            }
            ContainerKind::OsString => os_string_view(value, ctx),
            ContainerKind::PathBuf => os_string_view(&value.member(ctx, "inner")?, ctx),
            ContainerKind::CStr => Ok(foreign_slice_view(value, ctx)?.without_terminator()),
            ContainerKind::OsStr | ContainerKind::Path => foreign_slice_view(value, ctx),
        }
    }
}

/// A decoded `(data pointer, count, element type)` triple
///
/// `len` comes straight from target memory and is not validated against the
/// allocation; consumers cap what they read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerView
{
    pub data: Address,
    pub len: u64,
    pub element: TypeId,
    pub element_size: u64,
}

impl ContainerView
{
    /// Address of element `index`
    pub fn element_address(&self, index: u64) -> Address
    {
        self.data.element(index, self.element_size)
    }

    /// Element `index` as a value named `[index]`
    pub fn element(&self, index: u64) -> Value
    {
        Value::new(self.element, self.element_address(index)).named(format!("[{index}]"))
    }

    fn without_terminator(self) -> Self
    {
        Self {
            len: self.len.saturating_sub(1),
            ..self
        }
    }
}

fn vec_view(vec: &Value, ctx: &FormatContext<'_>) -> FormatResult<ContainerView>
{
    let pointer = vec.member_path(ctx, VEC_DATA_PATH)?;
    let len = vec.member(ctx, "len")?.read_unsigned(ctx)?;
    pointer_view(&pointer, len, ctx)
}

fn slice_view(slice: &Value, ctx: &FormatContext<'_>) -> FormatResult<ContainerView>
{
    let pointer = slice.member(ctx, "data_ptr")?;
    let len = slice.member(ctx, "length")?.read_unsigned(ctx)?;
    pointer_view(&pointer, len, ctx)
}

fn os_string_view(os_string: &Value, ctx: &FormatContext<'_>) -> FormatResult<ContainerView>
{
    let inner = os_string.member_path(ctx, &["inner", "inner"])?;
    // Windows wraps the byte vector in one more layer.
    let vec = inner.member(ctx, "bytes").unwrap_or(inner);
    vec_view(&vec, ctx)
}

/// Unsized slice objects have incomplete debug info, so assume the standard
/// fat-reference layout: `[data pointer, byte length]`
fn foreign_slice_view(value: &Value, ctx: &FormatContext<'_>) -> FormatResult<ContainerView>
{
    let word = u64::from(ctx.memory.pointer_size());
    let data = ctx.memory.read_pointer(value.address())?;
    let len = ctx.memory.read_pointer(value.address() + word)?.value();
    Ok(ContainerView {
        data,
        len,
        element: ctx.types.byte_type(),
        element_size: 1,
    })
}

fn pointer_view(pointer: &Value, len: u64, ctx: &FormatContext<'_>) -> FormatResult<ContainerView>
{
    let descriptor = ctx.type_of(pointer)?;
    let element = descriptor
        .target
        .ok_or_else(|| FormatError::IncompleteType(descriptor.name.clone()))?;
    let element_size = ctx.descriptor(element)?.byte_size;
    Ok(ContainerView {
        data: Address::from(pointer.read_unsigned(ctx)?),
        len,
        element,
        element_size,
    })
}

/// Read `len` bytes at `data` and decode them as UTF-8
///
/// Invalid sequences become U+FFFD.
pub fn read_text(memory: &dyn MemoryAccessor, data: Address, len: usize) -> FormatResult<String>
{
    if len == 0 {
        return Ok(String::new());
    }
    let bytes = memory.read_memory(data, len)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Quoted text of a string-like container
///
/// At most `string_byte_limit` bytes are read, since uninitialized values
/// often carry garbage lengths; longer strings end with
/// [`STRING_TRUNCATION`]. A failed read yields `None`.
pub fn string_summary(view: &ContainerView, ctx: &FormatContext<'_>) -> Option<String>
{
    let limit = ctx.config().string_byte_limit;
    let shown = usize::try_from(view.len).unwrap_or(usize::MAX).min(limit);
    match read_text(ctx.memory, view.data, shown) {
        Ok(mut text) => {
            if view.len > limit as u64 {
                text.push_str(STRING_TRUNCATION);
            }
            Some(format!("\"{text}\""))
        }
        Err(err) => {
            error!("Failed to read string contents: {err}");
            None
        }
    }
}
