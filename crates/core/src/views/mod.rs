//! View transforms: pure functions from model + viewport to render
//! commands.
//!
//! Every transform follows the same preamble — compute the visible time
//! window in session-aligned microseconds, derive pixels-per-µs, cull
//! anything outside the window — and emits a `BeginGroup`-wrapped command
//! list. Nothing here mutates state or talks to a renderer.

pub mod async_track;
pub mod counter_track;
pub mod flow;
pub mod frame_track;
pub mod left_heavy;
pub mod marker_track;
pub mod minimap;
pub mod ranked;
pub mod sandwich;
pub mod time_axis;
pub mod time_order;

use thiserror::Error;
use traceviz_protocol::FrameId;

use crate::color::ColorMode;
use crate::model::Profile;

/// Row height of one stack level in the span views.
pub const ROW_HEIGHT: f32 = 20.0;
/// Spans narrower than this never reach the command list.
pub const MIN_SPAN_WIDTH: f32 = 0.5;
/// Labels are attached only to rects at least this wide.
pub const MIN_LABEL_WIDTH: f32 = 20.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("sandwich view requires a selected span")]
    SandwichRequiresSelection,
}

/// Visible window on the session timeline, in aligned microseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub t0_us: f64,
    pub t1_us: f64,
}

impl TimeWindow {
    pub fn duration_us(&self) -> f64 {
        self.t1_us - self.t0_us
    }

    /// Pixels per microsecond at the given canvas width.
    pub fn ppu(&self, width: f32) -> f64 {
        f64::from(width) / self.duration_us()
    }

    pub fn is_empty(&self) -> bool {
        self.duration_us() <= 0.0
    }
}

/// Case-insensitive substring filter over span names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    lowered: String,
}

impl SearchFilter {
    pub fn new(query: &str) -> Self {
        Self {
            lowered: query.to_lowercase(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.lowered.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        !self.lowered.is_empty() && name.to_lowercase().contains(&self.lowered)
    }
}

/// Everything a span view needs for one lane render.
pub struct SpanViewCtx<'a> {
    pub profile: &'a Profile,
    /// Add to a profile-local timestamp to get session-aligned time
    /// (`offset − profile.start`).
    pub align_us: i64,
    pub window: TimeWindow,
    pub width: f32,
    pub height: f32,
    /// Vertical scroll inside the lane.
    pub scroll_y: f32,
    pub color_mode: ColorMode,
    pub selected: Option<FrameId>,
    pub search: Option<&'a SearchFilter>,
}

impl SpanViewCtx<'_> {
    /// Lane-local x of a profile-local timestamp.
    pub fn x_of(&self, local_us: i64) -> f32 {
        (((local_us + self.align_us) as f64 - self.window.t0_us) * self.window.ppu(self.width))
            as f32
    }
}

/// Human duration formatting shared by the axis, ranked table, and
/// snapshots.
pub fn format_duration_us(us: i64) -> String {
    let abs = us.abs();
    if abs >= 1_000_000 {
        format!("{:.2}s", us as f64 / 1_000_000.0)
    } else if abs >= 1_000 {
        format!("{:.1}ms", us as f64 / 1_000.0)
    } else {
        format!("{us}µs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration_us(500), "500µs");
        assert_eq!(format_duration_us(1_500), "1.5ms");
        assert_eq!(format_duration_us(2_500_000), "2.50s");
    }

    #[test]
    fn search_filter_is_case_insensitive() {
        let f = SearchFilter::new("Render");
        assert!(f.matches("renderFrame"));
        assert!(f.matches("RENDER"));
        assert!(!f.matches("paint"));
        assert!(!SearchFilter::new("").matches("anything"));
    }

    #[test]
    fn window_ppu() {
        let w = TimeWindow {
            t0_us: 0.0,
            t1_us: 1000.0,
        };
        assert!((w.ppu(1000.0) - 1.0).abs() < 1e-9);
    }
}
