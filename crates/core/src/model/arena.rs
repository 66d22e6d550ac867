use serde::{Deserialize, Serialize};
use traceviz_protocol::FrameId;

use super::span::Span;

/// Flat storage for every span in a profile, addressed by [`FrameId`].
///
/// `FrameId` n refers to slot n−1, so ids are dense, stable, and zero stays
/// reserved for "none". Tree edges are ids into the same arena; there are
/// no reference cycles to manage and lookups never allocate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanArena {
    spans: Vec<Span>,
}

impl SpanArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Id the next pushed span will receive.
    pub fn next_id(&self) -> FrameId {
        FrameId::from_index(self.spans.len())
    }

    /// Append a span. The span's `id` must be the arena's `next_id`.
    pub fn push(&mut self, span: Span) -> FrameId {
        debug_assert_eq!(span.id, self.next_id(), "span pushed out of order");
        let id = span.id;
        self.spans.push(span);
        id
    }

    #[inline]
    pub fn get(&self, id: FrameId) -> Option<&Span> {
        self.spans.get(id.index())
    }

    #[inline]
    pub fn get_mut(&mut self, id: FrameId) -> Option<&mut Span> {
        self.spans.get_mut(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Span> {
        self.spans.iter_mut()
    }

    // Link navigation. Dangling ids (which would indicate a construction
    // bug) resolve to None rather than panicking.

    pub fn parent(&self, id: FrameId) -> Option<FrameId> {
        self.get(id)?.parent
    }

    pub fn first_child(&self, id: FrameId) -> Option<FrameId> {
        self.get(id)?.first_child
    }

    pub fn next_sibling(&self, id: FrameId) -> Option<FrameId> {
        self.get(id)?.next_sibling
    }

    pub fn prev_sibling(&self, id: FrameId) -> Option<FrameId> {
        self.get(id)?.prev_sibling
    }

    /// Iterate the direct children of `id` in start order.
    pub fn children(&self, id: FrameId) -> ChildIter<'_> {
        ChildIter {
            arena: self,
            next: self.first_child(id),
        }
    }
}

pub struct ChildIter<'a> {
    arena: &'a SpanArena,
    next: Option<FrameId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = &'a Span;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let span = self.arena.get(id)?;
        self.next = span.next_sibling;
        Some(span)
    }
}
