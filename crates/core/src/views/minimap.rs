//! Minimap: the entire session compressed into a fixed-height strip, with
//! a per-pixel span-density histogram and the current viewport overlaid.
//!
//! The command protocol is token-colored with no per-command opacity, so
//! density maps to bar height on a log scale instead of alpha.

use traceviz_protocol::{Rect, RenderCommand, ThemeToken};

use crate::model::Profile;

pub const MINIMAP_HEIGHT: f32 = 40.0;
/// Grab radius of the viewport indicator's edges, in px.
pub const HANDLE_WIDTH: f32 = 4.0;

/// Where a pointer position falls on the minimap, for drag interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimapZone {
    LeftHandle,
    Body,
    RightHandle,
    Outside,
}

/// Classify an x position against the viewport indicator.
pub fn hit_zone(x: f32, width: f32, view_start: f64, view_end: f64) -> MinimapZone {
    let left = (view_start as f32) * width;
    let right = (view_end as f32) * width;
    if x < 0.0 || x > width {
        MinimapZone::Outside
    } else if (x - left).abs() <= HANDLE_WIDTH {
        MinimapZone::LeftHandle
    } else if (x - right).abs() <= HANDLE_WIDTH {
        MinimapZone::RightHandle
    } else if x > left && x < right {
        MinimapZone::Body
    } else {
        MinimapZone::Outside
    }
}

/// Render the minimap for one profile aligned onto the session range.
///
/// `session_start_us`/`session_end_us` bound the whole strip; `view_start`
/// and `view_end` are the viewport fractions to indicate.
#[allow(clippy::too_many_arguments)]
pub fn render(
    profile: &Profile,
    align_us: i64,
    session_start_us: i64,
    session_end_us: i64,
    width: f32,
    height: f32,
    view_start: f64,
    view_end: f64,
) -> Vec<RenderCommand> {
    let session_len = (session_end_us - session_start_us) as f64;
    if session_len <= 0.0 || width < 1.0 {
        return Vec::new();
    }

    let mut commands = Vec::new();
    commands.push(RenderCommand::BeginGroup {
        id: "minimap".into(),
        label: None,
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, width, height),
        fill: ThemeToken::MinimapBackground,
        border: Some(ThemeToken::Border),
        label: None,
        frame_id: None,
    });

    // Span count per pixel column.
    let columns = width as usize;
    let mut density = vec![0u32; columns];
    let px_per_us = f64::from(width) / session_len;
    for span in profile.spans() {
        let start = ((span.start_us + align_us - session_start_us) as f64 * px_per_us) as isize;
        let end = ((span.end_us + align_us - session_start_us) as f64 * px_per_us) as isize;
        let lo = start.clamp(0, columns as isize - 1) as usize;
        let hi = end.clamp(0, columns as isize - 1) as usize;
        for cell in &mut density[lo..=hi] {
            *cell += 1;
        }
    }

    let max_density = density.iter().copied().max().unwrap_or(0);
    if max_density > 0 {
        let log_max = f64::from(max_density + 1).log2();
        for (col, &count) in density.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let fraction = (f64::from(count + 1).log2() / log_max) as f32;
            let bar = fraction * (height - 2.0);
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(col as f32, height - 1.0 - bar, 1.0, bar),
                fill: ThemeToken::BarFill,
                border: None,
                label: None,
                frame_id: None,
            });
        }
    }

    // Viewport indicator with edge handles.
    let vp_x = (view_start as f32) * width;
    let vp_w = ((view_end - view_start) as f32) * width;
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(vp_x, 0.0, vp_w, height),
        fill: ThemeToken::MinimapViewport,
        border: Some(ThemeToken::SelectionHighlight),
        label: None,
        frame_id: None,
    });
    for edge_x in [vp_x, vp_x + vp_w] {
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(edge_x - 1.0, 0.0, 2.0, height),
            fill: ThemeToken::SelectionHighlight,
            border: None,
            label: None,
            frame_id: None,
        });
    }

    commands.push(RenderCommand::EndGroup);
    commands
}
