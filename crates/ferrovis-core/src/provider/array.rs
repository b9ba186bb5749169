//! Provider shared by every array-like container.

use super::ChildProvider;
use crate::context::FormatContext;
use crate::decode::{string_summary, ContainerKind, ContainerView};
use crate::error::{FormatError, FormatResult};
use crate::summary::sequence_summary;
use crate::value::{parse_index_name, Value};

/// Elements `[0]..[len)` laid out contiguously behind a data pointer
#[derive(Debug)]
pub struct ArrayLikeProvider
{
    kind: ContainerKind,
    view: ContainerView,
}

impl ArrayLikeProvider
{
    pub fn initialize(value: &Value, kind: ContainerKind, ctx: &FormatContext<'_>) -> FormatResult<Self>
    {
        Ok(Self {
            kind,
            view: kind.locate(value, ctx)?,
        })
    }

    pub fn view(&self) -> &ContainerView
    {
        &self.view
    }

    fn elements(&self) -> impl Iterator<Item = Value> + '_
    {
        (0..self.view.len).map(|index| self.view.element(index))
    }
}

impl ChildProvider for ArrayLikeProvider
{
    fn child_count(&self, _ctx: &FormatContext<'_>) -> usize
    {
        usize::try_from(self.view.len).unwrap_or(usize::MAX)
    }

    fn has_children(&self, _ctx: &FormatContext<'_>) -> bool
    {
        true
    }

    fn child_at(&self, _ctx: &FormatContext<'_>, index: usize) -> FormatResult<Value>
    {
        Ok(self.view.element(index as u64))
    }

    fn child_index(&self, _ctx: &FormatContext<'_>, name: &str) -> FormatResult<usize>
    {
        let index = parse_index_name(name)?;
        if u64::try_from(index).is_ok_and(|index| index < self.view.len) {
            Ok(index)
        } else {
            Err(FormatError::NotFound(name.to_string()))
        }
    }

    fn summary(&self, ctx: &FormatContext<'_>) -> FormatResult<Option<String>>
    {
        let len = self.view.len;
        Ok(match self.kind {
            ContainerKind::Vec => Some(format!("({len}) vec![{}]", sequence_summary(self.elements(), ctx))),
            ContainerKind::Slice => Some(format!("({len}) &[{}]", sequence_summary(self.elements(), ctx))),
            _ => string_summary(&self.view, ctx),
        })
    }
}
