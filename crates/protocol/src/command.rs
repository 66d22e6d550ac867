use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::id::FrameId;
use crate::label::Label;
use crate::token::ThemeToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One stateless drawing instruction.
///
/// View transforms emit these; renderers replay them in order. There is no
/// ambient pen state — a command that needs a color names its token. Clip
/// and transform commands form LIFO stacks; `BeginGroup`/`EndGroup` are
/// semantic only (export renderers map them to structure, rasterizers may
/// ignore them).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Filled rectangle. `frame_id` links the rect back to a model span for
    /// hit testing; `label` is the text a renderer may inline when the rect
    /// is wide enough.
    DrawRect {
        rect: Rect,
        fill: ThemeToken,
        border: Option<ThemeToken>,
        label: Option<Label>,
        frame_id: Option<FrameId>,
    },

    DrawText {
        pos: Point,
        text: Label,
        token: ThemeToken,
        font_size: f32,
        align: TextAlign,
    },

    DrawLine {
        from: Point,
        to: Point,
        token: ThemeToken,
        width: f32,
    },

    /// Push a scissor rect; drawing is restricted to it until the matching
    /// `ClearClip`.
    SetClip { rect: Rect },

    /// Pop the innermost scissor rect.
    ClearClip,

    /// Push a translate-then-scale transform (per-axis scale).
    PushTransform { translate: Point, scale: Point },

    PopTransform,

    /// Open a semantic group (a lane, a track). Export renderers emit real
    /// structure for these; rasterizing renderers treat them as no-ops.
    BeginGroup { id: Label, label: Option<Label> },

    EndGroup,
}

impl RenderCommand {
    /// The rect and span id of a hit-testable command, if it is one.
    pub fn hit_target(&self) -> Option<(Rect, FrameId)> {
        match self {
            Self::DrawRect {
                rect,
                frame_id: Some(id),
                ..
            } => Some((*rect, *id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_target_requires_frame_id() {
        let with_id = RenderCommand::DrawRect {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            fill: ThemeToken::FlameHot,
            border: None,
            label: None,
            frame_id: Some(FrameId::from_index(0)),
        };
        let without = RenderCommand::DrawRect {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            fill: ThemeToken::FlameHot,
            border: None,
            label: None,
            frame_id: None,
        };
        assert!(with_id.hit_target().is_some());
        assert!(without.hit_target().is_none());
    }

    #[test]
    fn serde_round_trip() {
        let cmd = RenderCommand::DrawText {
            pos: Point::new(4.0, 12.0),
            text: Label::from("main"),
            token: ThemeToken::TextPrimary,
            font_size: 11.0,
            align: TextAlign::Left,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: RenderCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}
