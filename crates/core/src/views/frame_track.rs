//! Frame track: one fixed-height bar per display frame, colored by its
//! budget classification.

use traceviz_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken};

use super::{format_duration_us, TimeWindow};
use crate::model::{FrameClass, FrameInterval};

const BAR_GAP: f32 = 1.0;
const FONT_SIZE: f32 = 9.0;

pub fn render(
    frames: &[FrameInterval],
    align_us: i64,
    window: TimeWindow,
    width: f32,
    height: f32,
) -> Vec<RenderCommand> {
    if window.is_empty() || frames.is_empty() {
        return Vec::new();
    }
    let ppu = window.ppu(width);

    let mut commands = Vec::with_capacity(frames.len() + 4);
    commands.push(RenderCommand::BeginGroup {
        id: "frames".into(),
        label: None,
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, width, height),
        fill: ThemeToken::LaneBackground,
        border: Some(ThemeToken::LaneBorder),
        label: None,
        frame_id: None,
    });

    for frame in frames {
        let start = (frame.start_us + align_us) as f64;
        let end = (frame.end_us + align_us) as f64;
        if end < window.t0_us || start > window.t1_us {
            continue;
        }
        let x = ((start - window.t0_us) * ppu) as f32;
        let w = (((end - start) * ppu) as f32 - BAR_GAP).max(1.0);

        let fill = match frame.class {
            FrameClass::Good => ThemeToken::FrameGood,
            FrameClass::Warning => ThemeToken::FrameWarning,
            FrameClass::Dropped => ThemeToken::FrameDropped,
        };
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x, 2.0, w, height - 4.0),
            fill,
            border: None,
            label: None,
            frame_id: None,
        });

        if w > 40.0 {
            commands.push(RenderCommand::DrawText {
                pos: Point::new(x + w / 2.0, height / 2.0 + 3.0),
                text: format_duration_us(frame.end_us - frame.start_us).into(),
                token: ThemeToken::TextPrimary,
                font_size: FONT_SIZE,
                align: TextAlign::Center,
            });
        }
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u32, start: i64, end: i64) -> FrameInterval {
        FrameInterval {
            index,
            start_us: start,
            end_us: end,
            budget_us: 16_667,
            class: FrameClass::classify(end - start, 16_667),
        }
    }

    #[test]
    fn bars_are_tokenized_by_classification() {
        let frames = vec![
            frame(0, 0, 16_000),
            frame(1, 16_000, 50_000),
            frame(2, 50_000, 70_000),
        ];
        let window = TimeWindow {
            t0_us: 0.0,
            t1_us: 70_000.0,
        };
        let commands = render(&frames, 0, window, 800.0, 30.0);

        let fills: Vec<ThemeToken> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    fill,
                    frame_id: None,
                    ..
                } if *fill != ThemeToken::LaneBackground => Some(*fill),
                _ => None,
            })
            .collect();
        assert_eq!(
            fills,
            vec![
                ThemeToken::FrameGood,
                ThemeToken::FrameDropped,
                ThemeToken::FrameWarning
            ]
        );
    }

    #[test]
    fn offscreen_frames_cull() {
        let frames = vec![frame(0, 100_000, 120_000)];
        let window = TimeWindow {
            t0_us: 0.0,
            t1_us: 50_000.0,
        };
        let commands = render(&frames, 0, window, 800.0, 30.0);
        let bars = commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    RenderCommand::DrawRect {
                        fill: ThemeToken::FrameGood
                            | ThemeToken::FrameWarning
                            | ThemeToken::FrameDropped,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(bars, 0);
    }

    #[test]
    fn empty_frames_render_nothing() {
        let window = TimeWindow {
            t0_us: 0.0,
            t1_us: 100.0,
        };
        assert!(render(&[], 0, window, 800.0, 30.0).is_empty());
    }
}
