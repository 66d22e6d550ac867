//! The shared fractional time window.
//!
//! `start`/`end` live in `[0, 1]` over the session duration. Zoom keeps
//! the point under the cursor stationary; animations are pending values
//! advanced by host-supplied ticks, never callbacks.

use serde::{Deserialize, Serialize};

/// Hard zoom ceiling: the window never shrinks below this fraction.
pub const MIN_SPAN: f64 = 0.0001;
/// Back/forward stacks are bounded to this many entries.
pub const HISTORY_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Animation {
    from: (f64, f64),
    to: (f64, f64),
    elapsed_ms: f64,
    duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    start: f64,
    end: f64,
    pub scroll_y: f32,
    back: Vec<(f64, f64)>,
    forward: Vec<(f64, f64)>,
    #[serde(skip)]
    anim: Option<Animation>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
            scroll_y: 0.0,
            back: Vec::new(),
            forward: Vec::new(),
            anim: None,
        }
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// Set the window directly (cancels any animation, clamps into range).
    pub fn set(&mut self, start: f64, end: f64) {
        self.anim = None;
        let span = (end - start).clamp(MIN_SPAN, 1.0);
        let start = start.clamp(0.0, 1.0 - span);
        self.start = start;
        self.end = start + span;
    }

    /// Pan by a pixel delta at the given canvas width.
    pub fn scroll_by(&mut self, dx_px: f32, canvas_width: f32) {
        if canvas_width <= 0.0 {
            return;
        }
        let delta = f64::from(dx_px) / f64::from(canvas_width) * self.span();
        let span = self.span();
        self.anim = None;
        self.start = (self.start + delta).clamp(0.0, 1.0 - span);
        self.end = self.start + span;
    }

    /// Zoom by `factor` (>1 zooms in) keeping the time under `focal_px`
    /// stationary.
    pub fn zoom_at(&mut self, factor: f64, focal_px: f32, canvas_width: f32) {
        if canvas_width <= 0.0 || factor <= 0.0 {
            return;
        }
        self.anim = None;
        let focal_frac = f64::from(focal_px) / f64::from(canvas_width);
        let focal_time = self.start + focal_frac * self.span();
        let new_span = (self.span() / factor).clamp(MIN_SPAN, 1.0);
        self.start = (focal_time - focal_frac * new_span).clamp(0.0, 1.0 - new_span);
        self.end = self.start + new_span;
    }

    /// Begin a cubic-ease-out transition; any prior animation is replaced.
    pub fn animate_to(&mut self, start: f64, end: f64, duration_ms: f64) {
        let span = (end - start).clamp(MIN_SPAN, 1.0);
        let start = start.clamp(0.0, 1.0 - span);
        if duration_ms <= 0.0 {
            self.set(start, start + span);
            return;
        }
        self.anim = Some(Animation {
            from: (self.start, self.end),
            to: (start, start + span),
            elapsed_ms: 0.0,
            duration_ms,
        });
    }

    pub fn is_animating(&self) -> bool {
        self.anim.is_some()
    }

    /// Advance the pending animation by `dt_ms`. Returns true while the
    /// window is still changing.
    pub fn tick(&mut self, dt_ms: f64) -> bool {
        let Some(mut anim) = self.anim.take() else {
            return false;
        };
        anim.elapsed_ms += dt_ms.max(0.0);
        let t = (anim.elapsed_ms / anim.duration_ms).clamp(0.0, 1.0);
        let ease = 1.0 - (1.0 - t).powi(3);
        self.start = anim.from.0 + (anim.to.0 - anim.from.0) * ease;
        self.end = anim.from.1 + (anim.to.1 - anim.from.1) * ease;
        if t < 1.0 {
            self.anim = Some(anim);
            true
        } else {
            self.start = anim.to.0;
            self.end = anim.to.1;
            false
        }
    }

    /// Record the current window. A push after going back discards the
    /// forward stack.
    pub fn push_history(&mut self) {
        self.forward.clear();
        if self.back.last() == Some(&(self.start, self.end)) {
            return;
        }
        self.back.push((self.start, self.end));
        if self.back.len() > HISTORY_LIMIT {
            self.back.remove(0);
        }
    }

    /// Return to the previous window, if any.
    pub fn back(&mut self) -> bool {
        let Some(target) = self.back.pop() else {
            return false;
        };
        self.forward.push((self.start, self.end));
        self.set(target.0, target.1);
        true
    }

    /// Undo a `back`.
    pub fn forward(&mut self) -> bool {
        let Some(target) = self.forward.pop() else {
            return false;
        };
        self.back.push((self.start, self.end));
        self.set(target.0, target.1);
        true
    }

    pub fn back_depth(&self) -> usize {
        self.back.len()
    }
}
