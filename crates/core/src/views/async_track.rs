//! Async span track: cross-thread operations packed into rows.

use traceviz_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken};

use super::TimeWindow;
use crate::model::AsyncSpan;

const ROW_HEIGHT: f32 = 18.0;
const ROW_GAP: f32 = 2.0;
const FONT_SIZE: f32 = 10.0;
const MIN_LABEL_WIDTH: f32 = 30.0;

pub fn render(
    spans: &[AsyncSpan],
    align_us: i64,
    window: TimeWindow,
    width: f32,
    height: f32,
) -> Vec<RenderCommand> {
    if window.is_empty() || spans.is_empty() {
        return Vec::new();
    }
    let ppu = window.ppu(width);

    let mut visible: Vec<&AsyncSpan> = spans
        .iter()
        .filter(|s| {
            let start = (s.start_us + align_us) as f64;
            let end = (s.end_us + align_us) as f64;
            end >= window.t0_us && start <= window.t1_us
        })
        .collect();
    if visible.is_empty() {
        return Vec::new();
    }
    visible.sort_by_key(|s| s.start_us);

    // Greedy packing: lowest row whose previous span has ended.
    let mut row_ends: Vec<i64> = Vec::new();
    let mut placed: Vec<(usize, &AsyncSpan)> = Vec::with_capacity(visible.len());
    for span in visible {
        let row = row_ends
            .iter()
            .position(|&end| span.start_us >= end)
            .unwrap_or(row_ends.len());
        if row == row_ends.len() {
            row_ends.push(span.end_us);
        } else {
            row_ends[row] = span.end_us;
        }
        placed.push((row, span));
    }

    let mut commands = Vec::with_capacity(placed.len() * 2 + 4);
    commands.push(RenderCommand::BeginGroup {
        id: "async-track".into(),
        label: None,
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, width, height),
        fill: ThemeToken::LaneBackground,
        border: Some(ThemeToken::LaneBorder),
        label: None,
        frame_id: None,
    });

    for (row, span) in placed {
        let y = 2.0 + row as f32 * (ROW_HEIGHT + ROW_GAP);
        if y + ROW_HEIGHT > height {
            continue;
        }
        let x0 = (((span.start_us + align_us) as f64 - window.t0_us) * ppu) as f32;
        let x1 = (((span.end_us + align_us) as f64 - window.t0_us) * ppu) as f32;
        let clamped_x = x0.max(0.0);
        let clamped_w = x1.min(width) - clamped_x;
        if clamped_w < 0.5 {
            continue;
        }

        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(clamped_x, y, clamped_w, ROW_HEIGHT),
            fill: ThemeToken::AsyncSpanFill,
            border: Some(ThemeToken::AsyncSpanBorder),
            label: Some(span.name.clone()),
            frame_id: None,
        });
        if clamped_w > MIN_LABEL_WIDTH {
            commands.push(RenderCommand::DrawText {
                pos: Point::new(clamped_x + 3.0, y + ROW_HEIGHT / 2.0 + 4.0),
                text: span.name.clone(),
                token: ThemeToken::TextPrimary,
                font_size: FONT_SIZE,
                align: TextAlign::Left,
            });
        }
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use traceviz_protocol::Label;

    fn span(id: &str, start: i64, end: i64) -> AsyncSpan {
        AsyncSpan {
            id: Label::from(id),
            name: Label::from("op"),
            start_us: start,
            end_us: end,
            origin_thread: None,
            target_thread: None,
        }
    }

    fn window() -> TimeWindow {
        TimeWindow {
            t0_us: 0.0,
            t1_us: 100.0,
        }
    }

    #[test]
    fn overlapping_spans_stack_into_rows() {
        let spans = vec![span("1", 10, 50), span("2", 30, 80), span("3", 55, 90)];
        let commands = render(&spans, 0, window(), 800.0, 100.0);
        let ys: Vec<f32> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    rect,
                    fill: ThemeToken::AsyncSpanFill,
                    ..
                } => Some(rect.y),
                _ => None,
            })
            .collect();
        assert_eq!(ys.len(), 3);
        // 1 and 2 overlap → different rows; 3 starts after 1 ends → reuses row 0.
        assert_eq!(ys[0], ys[2]);
        assert_ne!(ys[0], ys[1]);
    }

    #[test]
    fn spans_outside_window_are_dropped() {
        let spans = vec![span("1", 200, 300)];
        assert!(render(&spans, 0, window(), 800.0, 100.0).is_empty());
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(render(&[], 0, window(), 800.0, 100.0).is_empty());
    }
}
