use serde::{Deserialize, Serialize};
use traceviz_protocol::{FrameId, Label};

use super::session::ProfileHandle;

pub const MIN_LANE_HEIGHT: f32 = 16.0;
pub const MAX_LANE_HEIGHT: f32 = 600.0;

/// Which visualization a span lane is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewType {
    TimeOrder,
    LeftHeavy,
    Icicle,
    Sandwich,
    Ranked,
}

/// What data source a lane is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneKind {
    Thread(u32),
    Counter(Label),
    Marker,
    Async,
    Frame,
}

/// One horizontal display track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lane {
    pub id: String,
    /// Header text.
    pub label: String,
    pub profile: ProfileHandle,
    pub kind: LaneKind,
    pub height_px: f32,
    pub scroll_y: f32,
    pub visible: bool,
    pub view_type: ViewType,
    /// Sandwich focus; also highlights in other views.
    pub selected_frame: Option<FrameId>,
}

impl Lane {
    pub fn new(profile: ProfileHandle, kind: LaneKind, label: impl Into<String>, height_px: f32) -> Self {
        let id = match &kind {
            LaneKind::Thread(tid) => format!("p{}-thread-{tid}", profile.0),
            LaneKind::Counter(name) => format!("p{}-counter-{name}", profile.0),
            LaneKind::Marker => format!("p{}-markers", profile.0),
            LaneKind::Async => format!("p{}-async", profile.0),
            LaneKind::Frame => format!("p{}-frames", profile.0),
        };
        Self {
            id,
            label: label.into(),
            profile,
            kind,
            height_px: height_px.clamp(MIN_LANE_HEIGHT, MAX_LANE_HEIGHT),
            scroll_y: 0.0,
            visible: true,
            view_type: ViewType::TimeOrder,
            selected_frame: None,
        }
    }

    pub fn set_height(&mut self, height_px: f32) {
        self.height_px = height_px.clamp(MIN_LANE_HEIGHT, MAX_LANE_HEIGHT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_is_clamped() {
        let mut lane = Lane::new(ProfileHandle(0), LaneKind::Marker, "Markers", 4.0);
        assert_eq!(lane.height_px, MIN_LANE_HEIGHT);
        lane.set_height(10_000.0);
        assert_eq!(lane.height_px, MAX_LANE_HEIGHT);
    }

    #[test]
    fn ids_are_stable_per_source() {
        let a = Lane::new(ProfileHandle(1), LaneKind::Thread(3), "Main", 100.0);
        assert_eq!(a.id, "p1-thread-3");
        let c = Lane::new(
            ProfileHandle(0),
            LaneKind::Counter(Label::from("JS Heap")),
            "JS Heap",
            80.0,
        );
        assert_eq!(c.id, "p0-counter-JS Heap");
    }
}
