//! Hit testing against cached layouts.
//!
//! No re-layout on pointer move: the viewer keeps the rect list each lane
//! produced on its last render and scans it here, last-drawn-first so the
//! topmost span wins on overlap.

use traceviz_protocol::{FrameId, Rect, RenderCommand};

#[derive(Debug, Clone, Default)]
pub struct HitMap {
    rects: Vec<(Rect, FrameId)>,
}

impl HitMap {
    /// Collect the hit-testable rects from one lane's command list.
    pub fn from_commands(commands: &[RenderCommand]) -> Self {
        Self {
            rects: commands.iter().filter_map(RenderCommand::hit_target).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Lane-local hit test.
    pub fn hit(&self, x: f32, y: f32) -> Option<FrameId> {
        self.rects
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(x, y))
            .map(|(_, id)| *id)
    }
}
