use serde::{Deserialize, Serialize};
use traceviz_protocol::{FrameId, Label};

/// Property bits on a span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanFlags(u8);

impl SpanFlags {
    pub const NONE: SpanFlags = SpanFlags(0);
    /// Interval reconstructed from sampled stacks; duration is approximate.
    pub const SAMPLED: SpanFlags = SpanFlags(1 << 0);
    /// Span mirrors an async operation rather than on-thread work.
    pub const ASYNC: SpanFlags = SpanFlags(1 << 1);
    /// Span represents per-frame cost (render/commit work).
    pub const FRAME_COST: SpanFlags = SpanFlags(1 << 2);
    /// Zero-duration point event promoted into the span tree.
    pub const MARKER: SpanFlags = SpanFlags(1 << 3);

    #[inline]
    pub const fn contains(self, other: SpanFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn with(self, other: SpanFlags) -> SpanFlags {
        SpanFlags(self.0 | other.0)
    }
}

/// One timed unit of work on a thread.
///
/// Spans live in their profile's [`super::SpanArena`]; the tree is encoded
/// as intra-arena links (never references), so navigation in any direction
/// is an array lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub id: FrameId,
    pub name: Label,
    pub category: Option<Label>,
    /// Owning thread id within the profile.
    pub thread: u32,
    /// 0 = top level. Children are always exactly one deeper than their parent.
    pub depth: u16,
    pub start_us: i64,
    pub end_us: i64,
    /// Duration minus the summed duration of direct children.
    pub self_us: i64,
    pub parent: Option<FrameId>,
    pub first_child: Option<FrameId>,
    pub prev_sibling: Option<FrameId>,
    pub next_sibling: Option<FrameId>,
    pub flags: SpanFlags,
}

impl Span {
    #[inline]
    pub fn duration_us(&self) -> i64 {
        self.end_us - self.start_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_composition() {
        let f = SpanFlags::SAMPLED.with(SpanFlags::ASYNC);
        assert!(f.contains(SpanFlags::SAMPLED));
        assert!(f.contains(SpanFlags::ASYNC));
        assert!(!f.contains(SpanFlags::MARKER));
        assert!(SpanFlags::NONE.contains(SpanFlags::NONE));
    }
}
