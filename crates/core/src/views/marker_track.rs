//! Marker track: point events as vertical lines with clipped labels.

use traceviz_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken};

use super::TimeWindow;
use crate::model::Marker;

const FONT_SIZE: f32 = 10.0;
const LABEL_Y: f32 = 12.0;
/// Labels closer together than this collapse to just the line.
const LABEL_SPACING: f32 = 60.0;

pub fn render(
    markers: &[Marker],
    align_us: i64,
    window: TimeWindow,
    width: f32,
    height: f32,
) -> Vec<RenderCommand> {
    if window.is_empty() || markers.is_empty() {
        return Vec::new();
    }
    let ppu = window.ppu(width);

    let mut commands = Vec::with_capacity(markers.len() * 2 + 4);
    commands.push(RenderCommand::BeginGroup {
        id: "markers".into(),
        label: None,
    });
    // Labels must not bleed into neighbouring lanes.
    commands.push(RenderCommand::SetClip {
        rect: Rect::new(0.0, 0.0, width, height),
    });

    let mut last_label_x = f32::NEG_INFINITY;
    for marker in markers {
        let aligned = (marker.ts_us + align_us) as f64;
        if aligned < window.t0_us || aligned > window.t1_us {
            continue;
        }
        let x = ((aligned - window.t0_us) * ppu) as f32;

        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, 0.0),
            to: Point::new(x, height),
            token: ThemeToken::MarkerLine,
            width: 1.0,
        });

        if x - last_label_x > LABEL_SPACING {
            commands.push(RenderCommand::DrawText {
                pos: Point::new(x + 2.0, LABEL_Y),
                text: marker.name.clone(),
                token: ThemeToken::MarkerText,
                font_size: FONT_SIZE,
                align: TextAlign::Left,
            });
            last_label_x = x;
        }
    }

    commands.push(RenderCommand::ClearClip);
    commands.push(RenderCommand::EndGroup);
    commands
}
