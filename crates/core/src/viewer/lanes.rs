//! Lane ordering and vertical layout.

use traceviz_protocol::{Label, Point, Rect, RenderCommand, TextAlign, ThemeToken};

use crate::model::{Lane, LaneKind, Profile, ProfileHandle};
use crate::views::ROW_HEIGHT;

pub const HEADER_HEIGHT: f32 = 28.0;
/// Grab radius around a lane's bottom edge for resize handles.
const HANDLE_RADIUS: f32 = 3.0;
/// Threads at or above this span count sort before the auxiliary tracks.
const DENSE_THREAD_SPANS: u32 = 100;

/// What `lane_at_y` resolved a pointer position to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneHit {
    /// Index into the full (not just visible) lane list.
    pub index: usize,
    /// Y within the lane's content area; negative while in the header.
    pub content_y: f32,
    pub in_header: bool,
}

/// Owns the ordered lane list and the global vertical scroll.
#[derive(Debug, Default)]
pub struct LaneManager {
    lanes: Vec<Lane>,
    pub scroll_y: f32,
}

impl LaneManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn get(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Lane> {
        self.lanes.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn clear(&mut self) {
        self.lanes.clear();
        self.scroll_y = 0.0;
    }

    pub fn push(&mut self, lane: Lane) {
        self.lanes.push(lane);
    }

    /// Visible lanes in display order, with their full-list indices.
    pub fn visible_lanes(&self) -> impl Iterator<Item = (usize, &Lane)> {
        self.lanes.iter().enumerate().filter(|(_, l)| l.visible)
    }

    /// Top edge (header included) of the ith *visible* lane, before global
    /// scroll.
    pub fn lane_top(&self, visible_index: usize) -> f32 {
        self.visible_lanes()
            .take(visible_index)
            .map(|(_, l)| HEADER_HEIGHT + l.height_px)
            .sum()
    }

    /// Content offset of the ith visible lane: everything above it plus
    /// its own header.
    pub fn lane_y(&self, visible_index: usize) -> f32 {
        self.lane_top(visible_index) + HEADER_HEIGHT
    }

    /// Header + content height over all visible lanes.
    pub fn total_height(&self) -> f32 {
        self.visible_lanes()
            .map(|(_, l)| HEADER_HEIGHT + l.height_px)
            .sum()
    }

    /// Resolve a viewport-relative y to a lane, honoring the global scroll.
    pub fn lane_at_y(&self, y: f32) -> Option<LaneHit> {
        let mut top = -self.scroll_y;
        for (index, lane) in self.visible_lanes() {
            let content_top = top + HEADER_HEIGHT;
            let bottom = content_top + lane.height_px;
            if y >= top && y < bottom {
                return Some(LaneHit {
                    index,
                    content_y: y - content_top,
                    in_header: y < content_top,
                });
            }
            top = bottom;
        }
        None
    }

    /// The lane whose resize handle (bottom edge) is under `y`.
    pub fn drag_handle_at_y(&self, y: f32) -> Option<usize> {
        let mut top = -self.scroll_y;
        for (index, lane) in self.visible_lanes() {
            let bottom = top + HEADER_HEIGHT + lane.height_px;
            if (y - bottom).abs() <= HANDLE_RADIUS {
                return Some(index);
            }
            top = bottom;
        }
        None
    }

    /// Swap two positions in the full lane list; out-of-range is a no-op.
    pub fn move_lane(&mut self, from: usize, to: usize) {
        if from < self.lanes.len() && to < self.lanes.len() && from != to {
            self.lanes.swap(from, to);
        }
    }

    /// Scroll the lane stack, clamped so the bottom never detaches.
    pub fn scroll_global(&mut self, dy: f32, viewport_height: f32) {
        let max = (self.total_height() - viewport_height).max(0.0);
        self.scroll_y = (self.scroll_y + dy).clamp(0.0, max);
    }

    /// Drop every lane bound to a profile.
    pub fn remove_profile(&mut self, handle: ProfileHandle) {
        self.lanes.retain(|l| l.profile != handle);
    }

    /// Header strips for all visible lanes.
    pub fn render_headers(&self, width: f32, y_offset: f32) -> Vec<RenderCommand> {
        let mut commands = Vec::new();
        let mut top = y_offset - self.scroll_y;
        for (_, lane) in self.visible_lanes() {
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(0.0, top, width, HEADER_HEIGHT - 1.0),
                fill: ThemeToken::LaneHeaderBackground,
                border: Some(ThemeToken::LaneBorder),
                label: None,
                frame_id: None,
            });
            commands.push(RenderCommand::DrawText {
                pos: Point::new(6.0, top + HEADER_HEIGHT / 2.0 + 4.0),
                text: Label::from(lane.label.as_str()),
                token: ThemeToken::LaneHeaderText,
                font_size: 11.0,
                align: TextAlign::Left,
            });
            top += HEADER_HEIGHT + lane.height_px;
        }
        commands
    }

    /// Create the default lane stack for a newly loaded profile: dense
    /// threads, then the auxiliary tracks, then sparse threads.
    pub fn populate(&mut self, handle: ProfileHandle, profile: &Profile) {
        let thread_height = |max_depth: u16| -> f32 {
            (f32::from(max_depth + 1) * ROW_HEIGHT + 4.0).clamp(ROW_HEIGHT, 250.0)
        };

        let mut threads: Vec<_> = profile.threads.iter().collect();
        threads.sort_by_key(|t| t.sort_key);

        for thread in threads.iter().filter(|t| t.span_count >= DENSE_THREAD_SPANS) {
            self.push(Lane::new(
                handle,
                LaneKind::Thread(thread.id),
                format!("{} ({} spans)", thread.name, thread.span_count),
                thread_height(thread.max_depth),
            ));
        }

        if !profile.async_spans.is_empty() {
            self.push(Lane::new(
                handle,
                LaneKind::Async,
                format!("Async ({})", profile.async_spans.len()),
                60.0,
            ));
        }
        for counter in &profile.counters {
            self.push(Lane::new(
                handle,
                LaneKind::Counter(counter.name.clone()),
                counter.name.to_string(),
                80.0,
            ));
        }
        if !profile.markers.is_empty() {
            self.push(Lane::new(
                handle,
                LaneKind::Marker,
                format!("Markers ({})", profile.markers.len()),
                30.0,
            ));
        }
        if !profile.frames.is_empty() {
            self.push(Lane::new(
                handle,
                LaneKind::Frame,
                format!("Frames ({})", profile.frames.len()),
                40.0,
            ));
        }

        for thread in threads.iter().filter(|t| t.span_count < DENSE_THREAD_SPANS) {
            self.push(Lane::new(
                handle,
                LaneKind::Thread(thread.id),
                format!("{} ({} spans)", thread.name, thread.span_count),
                thread_height(thread.max_depth),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane(h: f32) -> Lane {
        Lane::new(ProfileHandle(0), LaneKind::Marker, "m", h)
    }

    fn manager_with(heights: &[f32]) -> LaneManager {
        let mut mgr = LaneManager::new();
        for (i, &h) in heights.iter().enumerate() {
            let mut l = lane(h);
            l.id = format!("lane-{i}");
            mgr.push(l);
        }
        mgr
    }

    #[test]
    fn layout_accumulates_headers_and_heights() {
        let mgr = manager_with(&[100.0, 50.0, 80.0]);
        assert_eq!(mgr.lane_top(0), 0.0);
        assert_eq!(mgr.lane_y(0), HEADER_HEIGHT);
        assert_eq!(mgr.lane_top(1), HEADER_HEIGHT + 100.0);
        assert_eq!(mgr.lane_y(2), 2.0 * (HEADER_HEIGHT) + 150.0 + HEADER_HEIGHT);
        assert_eq!(mgr.total_height(), 3.0 * HEADER_HEIGHT + 230.0);
    }

    #[test]
    fn hidden_lanes_are_skipped_but_keep_their_index() {
        let mut mgr = manager_with(&[100.0, 50.0, 80.0]);
        mgr.get_mut(1).unwrap().visible = false;
        let visible: Vec<usize> = mgr.visible_lanes().map(|(i, _)| i).collect();
        assert_eq!(visible, vec![0, 2]);
        // Second visible lane is full-list index 2, right under lane 0.
        assert_eq!(mgr.lane_top(1), HEADER_HEIGHT + 100.0);
    }

    #[test]
    fn lane_at_y_resolves_content_and_header() {
        let mgr = manager_with(&[100.0, 50.0]);
        let in_header = mgr.lane_at_y(10.0).unwrap();
        assert_eq!(in_header.index, 0);
        assert!(in_header.in_header);

        let in_content = mgr.lane_at_y(HEADER_HEIGHT + 40.0).unwrap();
        assert_eq!(in_content.index, 0);
        assert!(!in_content.in_header);
        assert_eq!(in_content.content_y, 40.0);

        let second = mgr.lane_at_y(HEADER_HEIGHT + 100.0 + HEADER_HEIGHT + 5.0).unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.content_y, 5.0);

        assert!(mgr.lane_at_y(1_000.0).is_none());
    }

    #[test]
    fn lane_at_y_honors_global_scroll() {
        let mut mgr = manager_with(&[100.0, 50.0]);
        mgr.scroll_global(HEADER_HEIGHT + 100.0, 10.0);
        let hit = mgr.lane_at_y(0.0).unwrap();
        assert_eq!(hit.index, 1);
        assert!(hit.in_header);
    }

    #[test]
    fn drag_handle_finds_bottom_edges() {
        let mgr = manager_with(&[100.0, 50.0]);
        let first_bottom = HEADER_HEIGHT + 100.0;
        assert_eq!(mgr.drag_handle_at_y(first_bottom - 2.0), Some(0));
        assert_eq!(mgr.drag_handle_at_y(first_bottom + 2.0), Some(0));
        assert_eq!(mgr.drag_handle_at_y(first_bottom + 20.0), None);
    }

    #[test]
    fn move_lane_swaps_and_ignores_bad_indices() {
        let mut mgr = manager_with(&[100.0, 50.0, 80.0]);
        mgr.move_lane(0, 2);
        assert_eq!(mgr.get(0).unwrap().id, "lane-2");
        assert_eq!(mgr.get(1).unwrap().id, "lane-1");
        assert_eq!(mgr.get(2).unwrap().id, "lane-0");
        mgr.move_lane(0, 99);
        assert_eq!(mgr.get(0).unwrap().id, "lane-2");
    }

    #[test]
    fn global_scroll_clamps() {
        let mut mgr = manager_with(&[100.0, 50.0]);
        let total = mgr.total_height();
        mgr.scroll_global(10_000.0, 100.0);
        assert_eq!(mgr.scroll_y, total - 100.0);
        mgr.scroll_global(-10_000.0, 100.0);
        assert_eq!(mgr.scroll_y, 0.0);
        // Viewport taller than content: no scrolling at all.
        mgr.scroll_global(50.0, 10_000.0);
        assert_eq!(mgr.scroll_y, 0.0);
    }

    #[test]
    fn headers_render_one_strip_per_visible_lane() {
        let mut mgr = manager_with(&[100.0, 50.0, 80.0]);
        mgr.get_mut(2).unwrap().visible = false;
        let commands = mgr.render_headers(800.0, 0.0);
        let rects = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawRect { .. }))
            .count();
        assert_eq!(rects, 2);
    }
}
