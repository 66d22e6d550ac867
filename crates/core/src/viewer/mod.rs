//! The interactive viewer: commands in, state snapshots out.
//!
//! All mutable state — session, lanes, viewport, selection, search,
//! history, time selection — lives here and changes only through
//! [`Viewer::apply`] (or the load/export entry points, which are the only
//! fallible operations). Each command completes fully, then subscribers
//! are notified once; there is no partially-committed state visible to
//! readers.

pub mod hittest;
pub mod keys;
pub mod kinetics;
pub mod lanes;
pub mod search;
pub mod selection;
pub mod viewport;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use traceviz_protocol::{
    FrameId, Point, Rect, RenderCommand, TextAlign, Theme, ThemeToken, ThemeVariant,
};

use crate::color::ColorMode;
use crate::export::{self, ExportError};
use crate::model::{Lane, LaneKind, ProfileHandle, Session, ViewType};
use crate::parsers::{self, ParseError};
use crate::views::{
    self, async_track, counter_track, flow, frame_track, left_heavy, marker_track, minimap,
    ranked, sandwich, time_axis, time_order, SpanViewCtx, TimeWindow,
};

use hittest::HitMap;
use keys::{Key, KeyAction, Mods};
use kinetics::{PanSpring, SpringConfig};
use lanes::{LaneManager, HEADER_HEIGHT};
use search::SearchState;
use selection::{navigate, NavDirection, SelectedSpan};
use viewport::Viewport;

const SEARCH_FOCUS_ANIM_MS: f64 = 250.0;
const ZOOM_TO_SELECTION_PAD: f64 = 0.10;
const FIT_PAD: f64 = 0.15;

/// Everything a host can ask the viewer to do, besides loading and
/// exporting (which can fail and are separate methods). Commands never
/// fail: out-of-range inputs clamp or no-op.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ClearSession,
    SetProfileOffset { handle: ProfileHandle, offset_us: i64 },
    SetTheme(ThemeVariant),
    ToggleTheme,
    SetColorMode(ColorMode),
    SetViewType { lane: usize, view: ViewType },
    SetAllViewTypes(ViewType),
    SetSearch(String),
    NextSearchResult,
    PrevSearchResult,
    SelectSpan { lane: usize, frame_id: FrameId },
    ClearSelection,
    Navigate(NavDirection),
    SetLaneVisibility { lane: usize, visible: bool },
    SetLaneHeight { lane: usize, height: f32 },
    ReorderLanes { from: usize, to: usize },
    SetViewport { start: f64, end: f64 },
    ResetZoom,
    Fit,
    ZoomToSelection,
    NavigateBack,
    NavigateForward,
    SetTimeSelection { start: f64, end: f64 },
    ClearTimeSelection,
    /// Pan by a fraction of the current span (keyboard).
    Pan { fraction: f64 },
    ScrollVertical { dy: f32 },
    /// Zoom about the viewport center (keyboard).
    ZoomCentered { factor: f64 },
    /// Zoom about a cursor position (wheel / pinch).
    ZoomAt { factor: f64, focal_px: f32 },
    /// Drag-pan by pixels.
    ScrollBy { dx_px: f32 },
    /// Minimap body drag: move the window, keep its span.
    DragMinimapTo { start: f64 },
    /// Minimap edge drag.
    DragMinimapEdge { left: bool, frac: f64 },
}

/// Flat, serializable mirror of the viewer state for hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub generation: u64,
    pub profile_count: usize,
    pub session_start_us: i64,
    pub session_end_us: i64,
    pub viewport_start: f64,
    pub viewport_end: f64,
    pub scroll_y: f32,
    pub theme: ThemeVariant,
    pub color_mode: ColorMode,
    pub lanes: Vec<LaneSnapshot>,
    pub selection: Option<SelectedSpan>,
    pub search_query: String,
    pub search_match_count: usize,
    pub search_total_count: usize,
    pub search_active_index: usize,
    pub time_selection: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneSnapshot {
    pub id: String,
    pub label: String,
    pub visible: bool,
    pub height_px: f32,
    pub view_type: ViewType,
}

type Observer = Box<dyn FnMut(&StateSnapshot)>;

pub struct Viewer {
    session: Session,
    lanes: LaneManager,
    viewport: Viewport,
    spring: PanSpring,
    spring_config: SpringConfig,
    search: SearchState,
    selection: Option<SelectedSpan>,
    time_selection: Option<(f64, f64)>,
    theme: ThemeVariant,
    color_mode: ColorMode,
    width: f32,
    height: f32,
    hit_maps: HashMap<usize, HitMap>,
    generation: u64,
    observers: Vec<Observer>,
    last_frame_ms: Option<f64>,
}

impl Viewer {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            session: Session::new(),
            lanes: LaneManager::new(),
            viewport: Viewport::new(),
            spring: PanSpring::default(),
            spring_config: SpringConfig::default(),
            search: SearchState::default(),
            selection: None,
            time_selection: None,
            theme: ThemeVariant::Dark,
            color_mode: ColorMode::ByName,
            width,
            height,
            hit_maps: HashMap::new(),
            generation: 0,
            observers: Vec::new(),
            last_frame_ms: None,
        }
    }

    // --- accessors ----------------------------------------------------

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn lanes(&self) -> &LaneManager {
        &self.lanes
    }

    pub fn selection(&self) -> Option<&SelectedSpan> {
        self.selection.as_ref()
    }

    pub fn theme(&self) -> Theme {
        Theme::variant(self.theme)
    }

    pub fn set_canvas_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn set_spring_config(&mut self, config: SpringConfig) {
        self.spring_config = config;
    }

    // --- loading ------------------------------------------------------

    /// Sniff, parse, and add a capture. On success the new profile gets
    /// its default lane stack and the viewport fits the densest region.
    pub fn load_profile(&mut self, data: &[u8], label: &str) -> Result<ProfileHandle, ParseError> {
        let profile = parsers::parse_bytes(data)?;
        if let Err(violation) = profile.validate() {
            debug_assert!(false, "parser produced invalid model: {violation}");
            tracing::warn!(%violation, "parsed profile failed validation");
        }
        let handle = self.session.add(profile, label);
        if let Some(profile) = self.session.profile(handle) {
            self.lanes.populate(handle, profile);
        }
        self.apply(Command::Fit);
        Ok(handle)
    }

    // --- subscriptions ------------------------------------------------

    /// Register a change observer; it fires after every mutating command.
    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn notify(&mut self) {
        self.generation += 1;
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        let mut observers = std::mem::take(&mut self.observers);
        for observer in &mut observers {
            observer(&snapshot);
        }
        self.observers = observers;
    }

    // --- commands -----------------------------------------------------

    pub fn apply(&mut self, command: Command) {
        self.apply_inner(command);
        self.notify();
    }

    fn apply_inner(&mut self, command: Command) {
        match command {
            Command::ClearSession => {
                self.session.clear();
                self.lanes.clear();
                self.selection = None;
                self.time_selection = None;
                self.hit_maps.clear();
                self.viewport = Viewport::new();
                let visible = HashSet::new();
                self.search.set_query("", &self.session, &visible);
            }
            Command::SetProfileOffset { handle, offset_us } => {
                // Unknown handles are a host error; the command no-ops.
                if self.session.set_offset(handle, offset_us).is_err() {
                    tracing::warn!(?handle, "setProfileOffset on unknown handle");
                }
            }
            Command::SetTheme(theme) => self.theme = theme,
            Command::ToggleTheme => self.theme = self.theme.toggled(),
            Command::SetColorMode(mode) => self.color_mode = mode,
            Command::SetViewType { lane, view } => {
                if let Some(lane) = self.lanes.get_mut(lane) {
                    lane.view_type = view;
                }
            }
            Command::SetAllViewTypes(view) => {
                for i in 0..self.lanes.len() {
                    if let Some(lane) = self.lanes.get_mut(i)
                        && matches!(lane.kind, LaneKind::Thread(_))
                    {
                        lane.view_type = view;
                    }
                }
            }
            Command::SetSearch(query) => {
                let visible = self.visible_profiles();
                self.search.set_query(&query, &self.session, &visible);
            }
            Command::NextSearchResult => {
                if let Some(target) = self.search.next() {
                    self.center_on_match(target);
                }
            }
            Command::PrevSearchResult => {
                if let Some(target) = self.search.prev() {
                    self.center_on_match(target);
                }
            }
            Command::SelectSpan { lane, frame_id } => {
                let Some(lane_ref) = self.lanes.get(lane) else {
                    return;
                };
                let handle = lane_ref.profile;
                let Some(profile) = self.session.profile(handle) else {
                    tracing::warn!(?handle, "lane references a missing profile");
                    return;
                };
                match SelectedSpan::resolve(profile, handle, frame_id, lane) {
                    Some(selection) => {
                        self.selection = Some(selection);
                        if let Some(lane) = self.lanes.get_mut(lane) {
                            lane.selected_frame = Some(frame_id);
                        }
                    }
                    None => {
                        debug_assert!(false, "selection of unknown frame id {frame_id}");
                        tracing::warn!(%frame_id, "selection of unknown frame id");
                    }
                }
            }
            Command::ClearSelection => {
                self.selection = None;
                for i in 0..self.lanes.len() {
                    if let Some(lane) = self.lanes.get_mut(i) {
                        lane.selected_frame = None;
                    }
                }
            }
            Command::Navigate(direction) => self.navigate_selection(direction),
            Command::SetLaneVisibility { lane, visible } => {
                if let Some(lane) = self.lanes.get_mut(lane) {
                    lane.visible = visible;
                }
                let visible_profiles = self.visible_profiles();
                let query = self.search.query().to_string();
                self.search
                    .set_query(&query, &self.session, &visible_profiles);
            }
            Command::SetLaneHeight { lane, height } => {
                if let Some(lane) = self.lanes.get_mut(lane) {
                    lane.set_height(height);
                }
            }
            Command::ReorderLanes { from, to } => self.lanes.move_lane(from, to),
            Command::SetViewport { start, end } => self.viewport.set(start, end),
            Command::ResetZoom => {
                self.viewport.push_history();
                self.viewport.set(0.0, 1.0);
                self.lanes.scroll_y = 0.0;
            }
            Command::Fit => {
                if let Some((start, end)) = self.fit_window() {
                    self.viewport.set(start, end);
                }
            }
            Command::ZoomToSelection => {
                if let Some(target) = self.selection_window() {
                    self.viewport.push_history();
                    self.viewport
                        .animate_to(target.0, target.1, SEARCH_FOCUS_ANIM_MS);
                }
            }
            Command::NavigateBack => {
                self.viewport.back();
            }
            Command::NavigateForward => {
                self.viewport.forward();
            }
            Command::SetTimeSelection { start, end } => {
                let lo = start.clamp(0.0, 1.0);
                let hi = end.clamp(0.0, 1.0);
                if hi > lo {
                    self.time_selection = Some((lo, hi));
                }
            }
            Command::ClearTimeSelection => self.time_selection = None,
            Command::Pan { fraction } => {
                let span = self.viewport.span();
                let start = self.viewport.start() + fraction * span;
                self.viewport.set(start, start + span);
            }
            Command::ScrollVertical { dy } => {
                let lane_area = self.lane_area_height();
                self.lanes.scroll_global(dy, lane_area);
            }
            Command::ZoomCentered { factor } => {
                self.viewport.zoom_at(factor, self.width / 2.0, self.width);
            }
            Command::ZoomAt { factor, focal_px } => {
                self.viewport.zoom_at(factor, focal_px, self.width);
            }
            Command::ScrollBy { dx_px } => {
                self.viewport.scroll_by(dx_px, self.width);
            }
            Command::DragMinimapTo { start } => {
                let span = self.viewport.span();
                self.viewport.set(start, start + span);
            }
            Command::DragMinimapEdge { left, frac } => {
                let (start, end) = (self.viewport.start(), self.viewport.end());
                if left {
                    self.viewport.set(frac.min(end - viewport::MIN_SPAN), end);
                } else {
                    self.viewport
                        .set(start, frac.max(start + viewport::MIN_SPAN));
                }
            }
        }
    }

    fn navigate_selection(&mut self, direction: NavDirection) {
        let Some(current) = self.selection.clone() else {
            return;
        };
        let Some(profile) = self.session.profile(current.profile) else {
            return;
        };
        if let Some(next) = navigate(profile, current.frame_id, direction)
            && let Some(selection) =
                SelectedSpan::resolve(profile, current.profile, next, current.lane_index)
        {
            let lane_index = current.lane_index;
            self.selection = Some(selection);
            if let Some(lane) = self.lanes.get_mut(lane_index) {
                lane.selected_frame = Some(next);
            }
        }
    }

    fn visible_profiles(&self) -> HashSet<ProfileHandle> {
        self.lanes
            .visible_lanes()
            .map(|(_, lane)| lane.profile)
            .collect()
    }

    /// Session fraction of an aligned microsecond timestamp.
    fn fraction_of(&self, aligned_us: i64) -> f64 {
        let duration = self.session.duration_us();
        if duration <= 0 {
            return 0.0;
        }
        (aligned_us - self.session.start_us()) as f64 / duration as f64
    }

    fn center_on_match(&mut self, (handle, frame_id): (ProfileHandle, FrameId)) {
        let Some(entry) = self.session.entry(handle) else {
            return;
        };
        let Some(span) = entry.profile.span(frame_id) else {
            return;
        };
        let center = self
            .fraction_of(entry.to_session_time((span.start_us + span.end_us) / 2));
        let span_frac = self.viewport.span();
        let start = (center - span_frac / 2.0).clamp(0.0, 1.0 - span_frac);
        self.viewport
            .animate_to(start, start + span_frac, SEARCH_FOCUS_ANIM_MS);
    }

    fn selection_window(&self) -> Option<(f64, f64)> {
        let selection = self.selection.as_ref()?;
        let entry = self.session.entry(selection.profile)?;
        let lo = self.fraction_of(entry.to_session_time(selection.start_us));
        let hi = self.fraction_of(entry.to_session_time(selection.end_us));
        let pad = ((hi - lo) * ZOOM_TO_SELECTION_PAD).max(viewport::MIN_SPAN * 0.5);
        Some(((lo - pad).max(0.0), (hi + pad).min(1.0)))
    }

    /// Densest half of the busiest thread, padded — the initial framing
    /// for a freshly loaded capture.
    fn fit_window(&self) -> Option<(f64, f64)> {
        let mut best: Option<(u32, &crate::model::SessionEntry)> = None;
        for entry in self.session.entries() {
            for thread in &entry.profile.threads {
                if best.is_none() || thread.span_count > best.as_ref().map(|(c, _)| *c).unwrap_or(0)
                {
                    best = Some((thread.span_count, entry));
                }
            }
        }
        let (_, entry) = best?;
        let thread = entry
            .profile
            .threads
            .iter()
            .max_by_key(|t| t.span_count)?;

        let mut starts: Vec<i64> = entry
            .profile
            .thread_spans(thread.id)
            .map(|s| s.start_us)
            .collect();
        if starts.is_empty() {
            return None;
        }
        starts.sort_unstable();

        let (lo, hi) = if starts.len() < 10 {
            let lo = *starts.first().expect("non-empty");
            let hi = entry
                .profile
                .thread_spans(thread.id)
                .map(|s| s.end_us)
                .max()
                .expect("non-empty");
            (lo, hi)
        } else {
            // Smallest window containing half the spans.
            let half = starts.len() / 2;
            let mut best = (starts[0], *starts.last().expect("non-empty"));
            let mut best_range = best.1 - best.0;
            for i in 0..starts.len() - half {
                let range = starts[i + half] - starts[i];
                if range < best_range {
                    best_range = range;
                    best = (starts[i], starts[i + half]);
                }
            }
            best
        };

        let pad = ((hi - lo) as f64 * FIT_PAD) as i64;
        let lo_frac = self.fraction_of(entry.to_session_time(lo - pad));
        let hi_frac = self.fraction_of(entry.to_session_time(hi + pad));
        Some((lo_frac.clamp(0.0, 1.0), hi_frac.clamp(0.0, 1.0)))
    }

    // --- keyboard -----------------------------------------------------

    /// Feed a key press; returns the intent the host must handle itself,
    /// if any.
    pub fn handle_key(&mut self, key: Key, mods: Mods) -> Option<KeyAction> {
        match keys::action_for_key(key, mods)? {
            KeyAction::Command(command) => {
                self.apply(command);
                None
            }
            other => Some(other),
        }
    }

    /// Feed held-key pan/zoom state for the spring layer; directions in
    /// {-1, 0, 1}.
    pub fn feed_spring(&mut self, pan_dir: f64, zoom_dir: f64, dt_s: f64) {
        let config = self.spring_config;
        self.spring.accelerate(pan_dir, zoom_dir, dt_s, &config);
    }

    // --- rendering ----------------------------------------------------

    fn lane_area_height(&self) -> f32 {
        (self.height - time_axis::AXIS_HEIGHT - minimap::MINIMAP_HEIGHT).max(0.0)
    }

    fn window(&self) -> TimeWindow {
        let start = self.session.start_us() as f64;
        let duration = self.session.duration_us() as f64;
        TimeWindow {
            t0_us: start + self.viewport.start() * duration,
            t1_us: start + self.viewport.end() * duration,
        }
    }

    /// Build the full frame: time axis, lane headers and contents, flow
    /// arrows, minimap. Also advances animations and refreshes the cached
    /// hit maps.
    pub fn render_frame(&mut self, now_ms: f64) -> Vec<RenderCommand> {
        let dt_ms = self
            .last_frame_ms
            .map(|last| (now_ms - last).max(0.0))
            .unwrap_or(0.0);
        self.last_frame_ms = Some(now_ms);
        self.viewport.tick(dt_ms);
        let config = self.spring_config;
        self.spring
            .tick(&mut self.viewport, 0.5, dt_ms / 1_000.0, &config);

        let mut commands = Vec::new();
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(0.0, 0.0, self.width, self.height),
            fill: ThemeToken::Background,
            border: None,
            label: None,
            frame_id: None,
        });
        if self.session.is_empty() {
            return commands;
        }

        let window = self.window();
        let lane_area = self.lane_area_height();

        commands.extend(time_axis::render(
            window,
            self.session.start_us(),
            self.width,
            lane_area,
        ));

        commands.extend(
            self.lanes
                .render_headers(self.width, time_axis::AXIS_HEIGHT),
        );

        self.hit_maps.clear();
        let lane_list: Vec<(usize, usize)> = self
            .lanes
            .visible_lanes()
            .map(|(index, _)| index)
            .enumerate()
            .map(|(visible_index, index)| (visible_index, index))
            .collect();

        // Vertical center of each visible thread lane, for flow arrows.
        let mut thread_centers: HashMap<ProfileHandle, HashMap<u32, f32>> = HashMap::new();

        for (visible_index, index) in lane_list {
            let lane = self.lanes.get(index).expect("visible lane exists").clone();
            let content_top =
                time_axis::AXIS_HEIGHT + self.lanes.lane_y(visible_index) - self.lanes.scroll_y;
            let lane_bottom = content_top + lane.height_px;

            let area_top = time_axis::AXIS_HEIGHT;
            let area_bottom = time_axis::AXIS_HEIGHT + lane_area;
            if lane_bottom < area_top || content_top - HEADER_HEIGHT > area_bottom {
                continue;
            }

            if let LaneKind::Thread(tid) = lane.kind {
                thread_centers
                    .entry(lane.profile)
                    .or_default()
                    .insert(tid, content_top + lane.height_px / 2.0);
            }

            let lane_commands = self.render_lane(&lane, window);
            self.hit_maps
                .insert(index, HitMap::from_commands(&lane_commands));

            commands.push(RenderCommand::SetClip {
                rect: Rect::new(
                    0.0,
                    content_top.max(area_top),
                    self.width,
                    (lane_bottom.min(area_bottom) - content_top.max(area_top)).max(0.0),
                ),
            });
            commands.push(RenderCommand::PushTransform {
                translate: Point::new(0.0, content_top),
                scale: Point::new(1.0, 1.0),
            });
            commands.extend(lane_commands);
            commands.push(RenderCommand::PopTransform);
            commands.push(RenderCommand::ClearClip);
        }

        // Flow arrows overlay the lane area in absolute coordinates.
        for entry in self.session.entries() {
            if entry.profile.flows.is_empty() {
                continue;
            }
            if let Some(centers) = thread_centers.get(&entry.handle) {
                let align = entry.offset_us - entry.profile.start_us;
                commands.extend(flow::render(
                    &entry.profile.flows,
                    align,
                    window,
                    self.width,
                    centers,
                ));
            }
        }

        // Time-range selection overlay.
        if let Some((lo, hi)) = self.time_selection {
            let x0 = (lo as f32 - self.viewport.start() as f32)
                / self.viewport.span() as f32
                * self.width;
            let x1 = (hi as f32 - self.viewport.start() as f32)
                / self.viewport.span() as f32
                * self.width;
            if x1 > 0.0 && x0 < self.width {
                commands.push(RenderCommand::DrawRect {
                    rect: Rect::new(
                        x0.max(0.0),
                        time_axis::AXIS_HEIGHT,
                        (x1.min(self.width) - x0.max(0.0)).max(0.0),
                        lane_area,
                    ),
                    fill: ThemeToken::HoverHighlight,
                    border: Some(ThemeToken::SelectionHighlight),
                    label: None,
                    frame_id: None,
                });
            }
        }

        // Minimap pinned to the bottom, showing the primary profile.
        if let Some(entry) = self.session.entries().first() {
            commands.push(RenderCommand::PushTransform {
                translate: Point::new(0.0, self.height - minimap::MINIMAP_HEIGHT),
                scale: Point::new(1.0, 1.0),
            });
            commands.extend(minimap::render(
                &entry.profile,
                entry.offset_us - entry.profile.start_us,
                self.session.start_us(),
                self.session.end_us(),
                self.width,
                minimap::MINIMAP_HEIGHT,
                self.viewport.start(),
                self.viewport.end(),
            ));
            commands.push(RenderCommand::PopTransform);
        }

        commands
    }

    /// Lane-local command list for one lane.
    fn render_lane(&self, lane: &Lane, window: TimeWindow) -> Vec<RenderCommand> {
        let Some(entry) = self.session.entry(lane.profile) else {
            return Vec::new();
        };
        let align = entry.offset_us - entry.profile.start_us;
        let search = self.search.filter();

        match &lane.kind {
            LaneKind::Thread(tid) => {
                let ctx = SpanViewCtx {
                    profile: &entry.profile,
                    align_us: align,
                    window,
                    width: self.width,
                    height: lane.height_px,
                    scroll_y: lane.scroll_y,
                    color_mode: self.color_mode,
                    selected: lane.selected_frame,
                    search,
                };
                match lane.view_type {
                    ViewType::TimeOrder => time_order::render(&ctx, *tid),
                    ViewType::Icicle => time_order::render_icicle(&ctx, *tid),
                    ViewType::LeftHeavy => left_heavy::render(&ctx, *tid),
                    ViewType::Ranked => ranked::render(
                        &ctx,
                        ranked::RankedMetric::SelfTime,
                        ranked::SortDirection::Descending,
                    ),
                    ViewType::Sandwich => match sandwich::render(&ctx) {
                        Ok(commands) => commands,
                        // Surfaced inline rather than as a failure.
                        Err(views::ViewError::SandwichRequiresSelection) => vec![
                            RenderCommand::DrawText {
                                pos: Point::new(self.width / 2.0, lane.height_px / 2.0),
                                text: "Select a span to build its sandwich".into(),
                                token: ThemeToken::TextMuted,
                                font_size: 12.0,
                                align: TextAlign::Center,
                            },
                        ],
                    },
                }
            }
            LaneKind::Counter(name) => entry
                .profile
                .counters
                .iter()
                .find(|c| &c.name == name)
                .map(|counter| {
                    counter_track::render(counter, align, window, self.width, lane.height_px)
                })
                .unwrap_or_default(),
            LaneKind::Marker => marker_track::render(
                &entry.profile.markers,
                align,
                window,
                self.width,
                lane.height_px,
            ),
            LaneKind::Async => async_track::render(
                &entry.profile.async_spans,
                align,
                window,
                self.width,
                lane.height_px,
            ),
            LaneKind::Frame => frame_track::render(
                &entry.profile.frames,
                align,
                window,
                self.width,
                lane.height_px,
            ),
        }
    }

    // --- hit testing --------------------------------------------------

    /// Resolve a canvas position against the last rendered frame.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<(usize, FrameId)> {
        if y < time_axis::AXIS_HEIGHT || y > self.height - minimap::MINIMAP_HEIGHT {
            return None;
        }
        let hit = self.lanes.lane_at_y(y - time_axis::AXIS_HEIGHT)?;
        if hit.in_header {
            return None;
        }
        let map = self.hit_maps.get(&hit.index)?;
        map.hit(x, hit.content_y).map(|id| (hit.index, id))
    }

    /// Pointer position over the minimap, mapped to a drag zone.
    pub fn minimap_zone(&self, x: f32, y: f32) -> Option<minimap::MinimapZone> {
        if y < self.height - minimap::MINIMAP_HEIGHT || y > self.height {
            return None;
        }
        Some(minimap::hit_zone(
            x,
            self.width,
            self.viewport.start(),
            self.viewport.end(),
        ))
    }

    // --- export -------------------------------------------------------

    /// Serialize the whole session (or the single profile) to the stable
    /// JSON schema.
    pub fn export_json(&self) -> Result<String, ExportError> {
        if self.session.is_empty() {
            return Err(ExportError::NoProfileLoaded);
        }
        export::json::export_session(&self.session)
    }

    /// Render the current frame and serialize it as a standalone SVG.
    pub fn export_svg(&mut self) -> Result<String, ExportError> {
        if self.session.is_empty() {
            return Err(ExportError::NoProfileLoaded);
        }
        let now = self.last_frame_ms.unwrap_or(0.0);
        let commands = self.render_frame(now);
        Ok(export::svg::render_document(
            &commands,
            self.width,
            self.height,
            &self.theme(),
        ))
    }

    // --- snapshot -----------------------------------------------------

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            generation: self.generation,
            profile_count: self.session.len(),
            session_start_us: self.session.start_us(),
            session_end_us: self.session.end_us(),
            viewport_start: self.viewport.start(),
            viewport_end: self.viewport.end(),
            scroll_y: self.lanes.scroll_y,
            theme: self.theme,
            color_mode: self.color_mode,
            lanes: self
                .lanes
                .lanes()
                .iter()
                .map(|lane| LaneSnapshot {
                    id: lane.id.clone(),
                    label: lane.label.clone(),
                    visible: lane.visible,
                    height_px: lane.height_px,
                    view_type: lane.view_type,
                })
                .collect(),
            selection: self.selection.clone(),
            search_query: self.search.query().to_string(),
            search_match_count: self.search.match_count(),
            search_total_count: self.search.total_count(),
            search_active_index: self.search.active_index(),
            time_selection: self.time_selection,
        }
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("profiles", &self.session.len())
            .field("lanes", &self.lanes.len())
            .field("viewport", &self.viewport)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

// Re-exported for hosts.
pub use crate::model::lane::{MAX_LANE_HEIGHT, MIN_LANE_HEIGHT};
