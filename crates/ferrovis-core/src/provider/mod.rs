//! # Synthetic Providers
//!
//! Lazy child trees for values whose default field-by-field display hides
//! what they mean: enums show only the active variant's fields, containers
//! show their elements.
//!
//! ## Lifecycle
//!
//! A [`Synthetic`] wraps exactly one [`Value`] and moves through three states:
//!
//! ```text
//! Uninitialized --initialize ok--> Ready(provider)
//!       |                            |  update() re-initializes
//!       +------initialize err------> Broken (zero children, no summary)
//! ```
//!
//! The host is expected to call [`Synthetic::update`] first. If it calls any
//! other method instead, the provider initializes on the spot. Initialization
//! errors are logged and never propagate: a single malformed value must not
//! abort the inspection session.

mod array;
mod enums;

use std::fmt;
use std::sync::Arc;

use tracing::{error, warn};

pub use self::array::ArrayLikeProvider;
pub use self::enums::{NicheEnumProvider, RegularEnumProvider};
use crate::classify::NicheLayout;
use crate::context::FormatContext;
use crate::decode::ContainerKind;
use crate::error::{FormatError, FormatResult};
use crate::value::Value;

/// An initialized child tree
///
/// Implementations may assume `index < self.child_count(ctx)` in
/// [`ChildProvider::child_at`]; [`Synthetic`] checks the range before
/// delegating.
pub trait ChildProvider: fmt::Debug
{
    fn child_count(&self, ctx: &FormatContext<'_>) -> usize;

    fn has_children(&self, ctx: &FormatContext<'_>) -> bool
    {
        self.child_count(ctx) > 0
    }

    fn child_at(&self, ctx: &FormatContext<'_>, index: usize) -> FormatResult<Value>;

    /// Index of the child displayed as `name`
    fn child_index(&self, ctx: &FormatContext<'_>, name: &str) -> FormatResult<usize>;

    fn summary(&self, ctx: &FormatContext<'_>) -> FormatResult<Option<String>>;
}

/// Which provider to build for a value
///
/// One generic provider per shape, parameterized by the data the classifier
/// decoded; nothing is generated per type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind
{
    RegularEnum,
    NicheEnum(Arc<NicheLayout>),
    Container(ContainerKind),
}

impl ProviderKind
{
    /// Decode `value`'s layout and build the matching provider
    pub fn initialize(&self, value: &Value, ctx: &FormatContext<'_>) -> FormatResult<Box<dyn ChildProvider>>
    {
        Ok(match self {
            ProviderKind::RegularEnum => Box::new(RegularEnumProvider::initialize(value, ctx)?),
            ProviderKind::NicheEnum(layout) => Box::new(NicheEnumProvider::initialize(value, layout, ctx)?),
            ProviderKind::Container(kind) => Box::new(ArrayLikeProvider::initialize(value, *kind, ctx)?),
        })
    }

    pub fn label(&self) -> &'static str
    {
        match self {
            ProviderKind::RegularEnum => "regular-enum",
            ProviderKind::NicheEnum(_) => "niche-enum",
            ProviderKind::Container(kind) => kind.label(),
        }
    }
}

#[derive(Debug)]
enum ProviderState
{
    Uninitialized,
    Ready(Box<dyn ChildProvider>),
    Broken,
}

/// A synthetic child provider bound to one value
#[derive(Debug)]
pub struct Synthetic
{
    value: Value,
    kind: ProviderKind,
    state: ProviderState,
}

impl Synthetic
{
    pub fn new(value: Value, kind: ProviderKind) -> Self
    {
        Self {
            value,
            kind,
            state: ProviderState::Uninitialized,
        }
    }

    pub fn value(&self) -> &Value
    {
        &self.value
    }

    pub fn kind(&self) -> &ProviderKind
    {
        &self.kind
    }

    /// Whether initialization has failed for this value
    pub fn is_broken(&self) -> bool
    {
        matches!(self.state, ProviderState::Broken)
    }

    /// Whether the provider has been initialized successfully
    pub fn is_ready(&self) -> bool
    {
        matches!(self.state, ProviderState::Ready(_))
    }

    /// (Re)decode the value's current memory
    ///
    /// Returns whether the provider's data is valid. A broken provider stays
    /// broken and answers `false`.
    pub fn update(&mut self, ctx: &FormatContext<'_>) -> bool
    {
        if self.is_broken() {
            return false;
        }
        self.initialize(ctx);
        self.is_ready()
    }

    pub fn child_count(&mut self, ctx: &FormatContext<'_>) -> usize
    {
        self.ready(ctx).map_or(0, |provider| provider.child_count(ctx))
    }

    pub fn has_children(&mut self, ctx: &FormatContext<'_>) -> bool
    {
        self.ready(ctx).is_some_and(|provider| provider.has_children(ctx))
    }

    /// Child at `index`
    ///
    /// ## Errors
    ///
    /// `OutOfRange` unless `0 <= index < child_count`. Broken providers have
    /// no children.
    pub fn child_at(&mut self, ctx: &FormatContext<'_>, index: i64) -> FormatResult<Value>
    {
        let provider = self.ready(ctx);
        let count = provider.map_or(0, |provider| provider.child_count(ctx));
        let in_range = usize::try_from(index).ok().filter(|&index| index < count);
        match (provider, in_range) {
            (Some(provider), Some(index)) => provider.child_at(ctx, index),
            _ => Err(FormatError::OutOfRange { index, count }),
        }
    }

    /// Index of the child displayed as `name`
    ///
    /// ## Errors
    ///
    /// `NotFound` if no child has that name, `InvalidName` if an array-like
    /// provider cannot parse it.
    pub fn child_index(&mut self, ctx: &FormatContext<'_>, name: &str) -> FormatResult<usize>
    {
        match self.ready(ctx) {
            Some(provider) => provider.child_index(ctx, name),
            None => Err(FormatError::NotFound(name.to_string())),
        }
    }

    /// One-line summary, or `None` if the value cannot be decoded
    pub fn summary(&mut self, ctx: &FormatContext<'_>) -> Option<String>
    {
        let provider = self.ready(ctx)?;
        match provider.summary(ctx) {
            Ok(summary) => summary,
            Err(err) => {
                error!("Failed to summarize {} value: {err}", self.kind.label());
                None
            }
        }
    }

    fn ready(&mut self, ctx: &FormatContext<'_>) -> Option<&dyn ChildProvider>
    {
        if matches!(self.state, ProviderState::Uninitialized) {
            warn!("Synthetic provider method has been called before update()");
            self.initialize(ctx);
        }
        match &self.state {
            ProviderState::Ready(provider) => Some(provider.as_ref()),
            ProviderState::Uninitialized | ProviderState::Broken => None,
        }
    }

    fn initialize(&mut self, ctx: &FormatContext<'_>)
    {
        self.state = match self.kind.initialize(&self.value, ctx) {
            Ok(provider) => ProviderState::Ready(provider),
            Err(err) => {
                let type_name = self.value.type_name(ctx).unwrap_or("<unknown>");
                error!("Error during {} provider initialization for `{type_name}`: {err}", self.kind.label());
                ProviderState::Broken
            }
        };
    }
}
