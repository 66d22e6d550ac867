//! Flow arrows: cross-thread causality edges drawn as cubic Bézier
//! polylines with a two-line arrowhead.

use std::collections::HashMap;

use traceviz_protocol::{Point, RenderCommand, ThemeToken};

use super::TimeWindow;
use crate::model::FlowEdge;

const SEGMENTS: usize = 16;
const ARROWHEAD: f32 = 6.0;

/// `thread_y` maps a thread id to the vertical center of its visible lane;
/// edges touching a hidden thread are skipped.
pub fn render(
    edges: &[FlowEdge],
    align_us: i64,
    window: TimeWindow,
    width: f32,
    thread_y: &HashMap<u32, f32>,
) -> Vec<RenderCommand> {
    if window.is_empty() || edges.is_empty() {
        return Vec::new();
    }
    let ppu = window.ppu(width);

    let mut commands = Vec::new();
    commands.push(RenderCommand::BeginGroup {
        id: "flow-arrows".into(),
        label: None,
    });

    for edge in edges {
        let (Some(&y0), Some(&y1)) = (
            thread_y.get(&edge.from_thread),
            thread_y.get(&edge.to_thread),
        ) else {
            continue;
        };
        let from = (edge.from_ts_us + align_us) as f64;
        let to = (edge.to_ts_us + align_us) as f64;
        // Both endpoints must be visible.
        if from < window.t0_us || from > window.t1_us || to < window.t0_us || to > window.t1_us {
            continue;
        }

        let x0 = ((from - window.t0_us) * ppu) as f32;
        let x1 = ((to - window.t0_us) * ppu) as f32;

        // Horizontal control points give the usual S-curve.
        let lead = ((x1 - x0).abs() * 0.4).max(12.0);
        let p0 = Point::new(x0, y0);
        let p1 = Point::new(x0 + lead, y0);
        let p2 = Point::new(x1 - lead, y1);
        let p3 = Point::new(x1, y1);

        let mut prev = p0;
        for i in 1..=SEGMENTS {
            let t = i as f32 / SEGMENTS as f32;
            let next = cubic_at(p0, p1, p2, p3, t);
            commands.push(RenderCommand::DrawLine {
                from: prev,
                to: next,
                token: ThemeToken::FlowArrow,
                width: 1.0,
            });
            prev = next;
        }

        // Arrowhead oriented along the final segment.
        let tip = p3;
        let tail = cubic_at(p0, p1, p2, p3, 1.0 - 1.0 / SEGMENTS as f32);
        let (dx, dy) = (tip.x - tail.x, tip.y - tail.y);
        let len = (dx * dx + dy * dy).sqrt().max(f32::MIN_POSITIVE);
        let (ux, uy) = (dx / len, dy / len);
        for side in [-1.0f32, 1.0] {
            // Rotate the reversed direction ±30°.
            let (sin, cos) = (side * 0.5, 0.866_f32);
            let wx = -ux * cos - -uy * sin;
            let wy = -ux * sin + -uy * cos;
            commands.push(RenderCommand::DrawLine {
                from: tip,
                to: Point::new(tip.x + wx * ARROWHEAD, tip.y + wy * ARROWHEAD),
                token: ThemeToken::FlowArrow,
                width: 1.0,
            });
        }
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

fn cubic_at(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let u = 1.0 - t;
    let x = u * u * u * p0.x + 3.0 * u * u * t * p1.x + 3.0 * u * t * t * p2.x + t * t * t * p3.x;
    let y = u * u * u * p0.y + 3.0 * u * u * t * p1.y + 3.0 * u * t * t * p2.y + t * t * t * p3.y;
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use traceviz_protocol::Label;

    fn edge(from_thread: u32, to_thread: u32) -> FlowEdge {
        FlowEdge {
            name: Label::from("post-task"),
            from_ts_us: 100,
            from_thread,
            to_ts_us: 400,
            to_thread,
        }
    }

    fn window() -> TimeWindow {
        TimeWindow {
            t0_us: 0.0,
            t1_us: 1000.0,
        }
    }

    #[test]
    fn draws_curve_plus_arrowhead() {
        let lanes = HashMap::from([(0, 50.0f32), (1, 150.0f32)]);
        let commands = render(&[edge(0, 1)], 0, window(), 800.0, &lanes);
        let lines = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawLine { .. }))
            .count();
        assert_eq!(lines, SEGMENTS + 2);
    }

    #[test]
    fn hidden_thread_skips_edge() {
        let lanes = HashMap::from([(0, 50.0f32)]);
        let commands = render(&[edge(0, 1)], 0, window(), 800.0, &lanes);
        assert!(!commands
            .iter()
            .any(|c| matches!(c, RenderCommand::DrawLine { .. })));
    }

    #[test]
    fn offscreen_endpoint_skips_edge() {
        let lanes = HashMap::from([(0, 50.0f32), (1, 150.0f32)]);
        let mut e = edge(0, 1);
        e.to_ts_us = 5_000;
        let commands = render(&[e], 0, window(), 800.0, &lanes);
        assert!(!commands
            .iter()
            .any(|c| matches!(c, RenderCommand::DrawLine { .. })));
    }
}
