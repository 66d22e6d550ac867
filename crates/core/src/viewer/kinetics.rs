//! Spring-smoothed keyboard pan/zoom (the WASD layer).
//!
//! Held keys feed acceleration; velocity decays exponentially and snaps
//! to zero below a threshold. This sits on top of the viewport contracts —
//! it only ever calls `set`/`zoom_at`-equivalent math, so clamping rules
//! are identical to direct manipulation. Constants are empirical and kept
//! configurable.

use serde::{Deserialize, Serialize};

use super::viewport::{Viewport, MIN_SPAN};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    /// Pan acceleration, in viewport-spans per second².
    pub pan_accel: f64,
    /// Zoom acceleration, in log-span units per second².
    pub zoom_accel: f64,
    /// Exponential velocity decay rate, per second.
    pub friction: f64,
    /// Velocities below this snap to zero.
    pub snap_eps: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            pan_accel: 3.0,
            zoom_accel: 4.0,
            friction: 8.0,
            snap_eps: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PanSpring {
    /// Horizontal velocity in viewport-spans per second.
    v_pan: f64,
    /// Zoom velocity in log-span units per second (positive zooms in).
    v_zoom: f64,
}

impl PanSpring {
    /// Feed one frame of key state: directions in {-1, 0, 1}.
    pub fn accelerate(&mut self, pan_dir: f64, zoom_dir: f64, dt_s: f64, config: &SpringConfig) {
        self.v_pan += pan_dir.clamp(-1.0, 1.0) * config.pan_accel * dt_s;
        self.v_zoom += zoom_dir.clamp(-1.0, 1.0) * config.zoom_accel * dt_s;
    }

    /// Integrate one frame; zoom is anchored at `focal_frac` (the cursor's
    /// fraction across the canvas). Returns true while still moving.
    pub fn tick(
        &mut self,
        viewport: &mut Viewport,
        focal_frac: f64,
        dt_s: f64,
        config: &SpringConfig,
    ) -> bool {
        let decay = (-config.friction * dt_s).exp();

        if self.v_pan != 0.0 {
            let span = viewport.span();
            let delta = self.v_pan * span * dt_s;
            let start = viewport.start() + delta;
            viewport.set(start, start + span);
            self.v_pan *= decay;
            if self.v_pan.abs() < config.snap_eps {
                self.v_pan = 0.0;
            }
        }

        if self.v_zoom != 0.0 {
            let focal_frac = focal_frac.clamp(0.0, 1.0);
            let span = viewport.span();
            let focal_time = viewport.start() + focal_frac * span;
            let new_span = (span * (-self.v_zoom * dt_s).exp()).clamp(MIN_SPAN, 1.0);
            let start = focal_time - focal_frac * new_span;
            viewport.set(start, start + new_span);
            self.v_zoom *= decay;
            if self.v_zoom.abs() < config.snap_eps {
                self.v_zoom = 0.0;
            }
        }

        self.is_moving()
    }

    pub fn is_moving(&self) -> bool {
        self.v_pan != 0.0 || self.v_zoom != 0.0
    }

    pub fn stop(&mut self) {
        self.v_pan = 0.0;
        self.v_zoom = 0.0;
    }
}
