//! End-to-end viewer scenarios: load a real trace through the façade,
//! drive it with commands, and assert on the produced command lists and
//! snapshots.

use traceviz_core::model::{LaneKind, ViewType};
use traceviz_core::viewer::{Command, Viewer};
use traceviz_core::views::ROW_HEIGHT;
use traceviz_protocol::{Rect, RenderCommand, ThemeToken};

/// A(0..1000) with children B(100..400) and C(500..900).
const THREE_SPAN_TRACE: &str = r#"{"traceEvents":[
    {"name":"A","ph":"X","ts":0,"dur":1000,"pid":1,"tid":1},
    {"name":"B","ph":"X","ts":100,"dur":300,"pid":1,"tid":1},
    {"name":"C","ph":"X","ts":500,"dur":400,"pid":1,"tid":1}
]}"#;

fn viewer_with_trace() -> Viewer {
    let mut viewer = Viewer::new(1000.0, 600.0);
    viewer
        .load_profile(THREE_SPAN_TRACE.as_bytes(), "three-span.json")
        .expect("trace parses");
    // Loading auto-fits; scenarios start from the full window.
    viewer.apply(Command::SetViewport {
        start: 0.0,
        end: 1.0,
    });
    viewer
}

fn labelled_rects(commands: &[RenderCommand]) -> Vec<(String, Rect)> {
    commands
        .iter()
        .filter_map(|c| match c {
            RenderCommand::DrawRect {
                rect,
                label: Some(label),
                frame_id: Some(_),
                ..
            } => Some((label.to_string(), *rect)),
            _ => None,
        })
        .collect()
}

#[test]
fn scenario_three_span_time_order_geometry() {
    let mut viewer = viewer_with_trace();
    let commands = viewer.render_frame(0.0);
    let rects = labelled_rects(&commands);

    // Lane-local coordinates: ppu = 1000px / 1000µs.
    let a = &rects.iter().find(|(n, _)| n == "A").unwrap().1;
    let b = &rects.iter().find(|(n, _)| n == "B").unwrap().1;
    let c = &rects.iter().find(|(n, _)| n == "C").unwrap().1;
    assert_eq!((a.x, a.y, a.w, a.h), (0.0, 0.0, 1000.0, ROW_HEIGHT - 1.0));
    assert_eq!((b.x, b.y, b.w, b.h), (100.0, 20.0, 300.0, ROW_HEIGHT - 1.0));
    assert_eq!((c.x, c.y, c.w, c.h), (500.0, 20.0, 400.0, ROW_HEIGHT - 1.0));
}

#[test]
fn scenario_zoom_at_focal_point() {
    let mut viewer = viewer_with_trace();
    viewer.apply(Command::ZoomAt {
        factor: 2.0,
        focal_px: 500.0,
    });
    let snapshot = viewer.snapshot();
    assert!((snapshot.viewport_start - 0.25).abs() < 1e-12);
    assert!((snapshot.viewport_end - 0.75).abs() < 1e-12);
}

#[test]
fn scenario_self_time_arithmetic() {
    let viewer = viewer_with_trace();
    let profile = &viewer.session().entries()[0].profile;
    let self_of = |name: &str| {
        profile
            .spans()
            .find(|s| s.name == name)
            .map(|s| s.self_us)
            .unwrap()
    };
    assert_eq!(self_of("A"), 1000 - 300 - 400);
    assert_eq!(self_of("B"), 300);
    assert_eq!(self_of("C"), 400);

    // Σ self == top-level duration.
    let total_self: i64 = profile.spans().map(|s| s.self_us).sum();
    assert_eq!(total_self, 1000);
}

#[test]
fn scenario_search_dims_non_matches() {
    let mut viewer = viewer_with_trace();
    viewer.apply(Command::SetSearch("B".into()));

    let snapshot = viewer.snapshot();
    assert_eq!(snapshot.search_match_count, 1);
    assert_eq!(snapshot.search_total_count, 3);

    let commands = viewer.render_frame(0.0);
    let mut overlay = 0;
    let mut dimmed = 0;
    for cmd in &commands {
        if let RenderCommand::DrawRect {
            fill,
            border,
            frame_id,
            ..
        } = cmd
        {
            if *fill == ThemeToken::SearchHighlight && frame_id.is_none() {
                overlay += 1;
            }
            if *fill == ThemeToken::FlameNeutral && border.is_none() && frame_id.is_some() {
                dimmed += 1;
            }
        }
    }
    assert_eq!(overlay, 1, "B carries the highlight overlay");
    assert_eq!(dimmed, 2, "A and C dim and lose borders");
}

#[test]
fn scenario_search_restores_output_when_cleared() {
    let mut viewer = viewer_with_trace();
    let before = viewer.render_frame(0.0);
    viewer.apply(Command::SetSearch("B".into()));
    let during = viewer.render_frame(0.0);
    viewer.apply(Command::SetSearch(String::new()));
    let after = viewer.render_frame(0.0);

    assert_ne!(before, during);
    assert_eq!(before, after, "clearing the query restores output exactly");
}

#[test]
fn scenario_sandwich_of_b() {
    let mut viewer = viewer_with_trace();
    let profile = &viewer.session().entries()[0].profile;
    let b = profile.spans().find(|s| s.name == "B").unwrap().id;

    viewer.apply(Command::SelectSpan { lane: 0, frame_id: b });
    viewer.apply(Command::SetViewType {
        lane: 0,
        view: ViewType::Sandwich,
    });
    let commands = viewer.render_frame(0.0);
    let rects = labelled_rects_all(&commands);

    // Focus bar and the single caller A; no callee rects below.
    let focus = rects.iter().find(|(n, _)| n == "B").expect("focus bar");
    let caller = rects.iter().find(|(n, _)| n == "A").expect("caller A");
    assert!(caller.1.y < focus.1.y, "caller flame sits above the focus");
    assert!(
        (caller.1.w - 1000.0).abs() < 0.01,
        "A carries 100% of B's 300µs"
    );
    assert!(
        !rects.iter().any(|(n, r)| n != "B" && n != "A" && r.y > focus.1.y),
        "B has no callees"
    );
}

fn labelled_rects_all(commands: &[RenderCommand]) -> Vec<(String, Rect)> {
    commands
        .iter()
        .filter_map(|c| match c {
            RenderCommand::DrawRect {
                rect,
                label: Some(label),
                ..
            } => Some((label.to_string(), *rect)),
            _ => None,
        })
        .collect()
}

#[test]
fn scenario_minimap_drag_and_history() {
    let mut viewer = viewer_with_trace();
    viewer.apply(Command::SetViewport {
        start: 0.0,
        end: 0.2,
    });

    // Body drag moves the indicator; span is preserved exactly.
    viewer.apply(Command::DragMinimapTo { start: 0.6 });
    let snapshot = viewer.snapshot();
    assert!((snapshot.viewport_start - 0.6).abs() < 1e-12);
    assert!((snapshot.viewport_end - 0.8).abs() < 1e-12);

    // resetZoom restores [0,1] and records [0.6,0.8] for back().
    viewer.apply(Command::ResetZoom);
    let snapshot = viewer.snapshot();
    assert_eq!(snapshot.viewport_start, 0.0);
    assert_eq!(snapshot.viewport_end, 1.0);

    viewer.apply(Command::NavigateBack);
    let snapshot = viewer.snapshot();
    assert!((snapshot.viewport_start - 0.6).abs() < 1e-12);
    assert!((snapshot.viewport_end - 0.8).abs() < 1e-12);

    viewer.apply(Command::NavigateForward);
    let snapshot = viewer.snapshot();
    assert_eq!(snapshot.viewport_start, 0.0);
}

#[test]
fn selection_navigates_the_hierarchy() {
    let mut viewer = viewer_with_trace();
    let profile = &viewer.session().entries()[0].profile;
    let a = profile.spans().find(|s| s.name == "A").unwrap().id;

    viewer.apply(Command::SelectSpan { lane: 0, frame_id: a });
    viewer.apply(Command::Navigate(
        traceviz_core::viewer::selection::NavDirection::FirstChild,
    ));
    assert_eq!(viewer.snapshot().selection.unwrap().name, "B");

    viewer.apply(Command::Navigate(
        traceviz_core::viewer::selection::NavDirection::NextSibling,
    ));
    assert_eq!(viewer.snapshot().selection.unwrap().name, "C");

    viewer.apply(Command::Navigate(
        traceviz_core::viewer::selection::NavDirection::Parent,
    ));
    assert_eq!(viewer.snapshot().selection.unwrap().name, "A");

    // No parent above the root: selection stays put.
    viewer.apply(Command::Navigate(
        traceviz_core::viewer::selection::NavDirection::Parent,
    ));
    assert_eq!(viewer.snapshot().selection.unwrap().name, "A");
}

#[test]
fn hit_test_uses_cached_layout() {
    let mut viewer = viewer_with_trace();
    let commands = viewer.render_frame(0.0);

    // Find B's on-canvas position: lane content starts below the time
    // axis and the first lane header.
    let b_rect = labelled_rects(&commands)
        .into_iter()
        .find(|(n, _)| n == "B")
        .unwrap()
        .1;
    // Content transform: axis (24) + header (28).
    let hit = viewer.hit_test(b_rect.x + 5.0, 24.0 + 28.0 + b_rect.y + 5.0);
    let (lane, id) = hit.expect("B under the cursor");
    assert_eq!(lane, 0);
    let profile = &viewer.session().entries()[0].profile;
    assert_eq!(profile.span(id).unwrap().name, "B");

    // Above the axis and over the minimap nothing hits.
    assert!(viewer.hit_test(5.0, 5.0).is_none());
    assert!(viewer.hit_test(5.0, 599.0).is_none());
}

#[test]
fn observers_fire_on_every_command() {
    use std::cell::RefCell;
    use std::rc::Rc;

    // Single-threaded observer: count notifications.
    let count = Rc::new(RefCell::new(0usize));
    let mut viewer = viewer_with_trace();
    let count_in = count.clone();
    viewer.subscribe(Box::new(move |_| {
        *count_in.borrow_mut() += 1;
    }));

    viewer.apply(Command::ToggleTheme);
    viewer.apply(Command::SetColorMode(traceviz_core::color::ColorMode::ByDepth));
    viewer.apply(Command::ResetZoom);
    assert_eq!(*count.borrow(), 3);
}

#[test]
fn clear_session_empties_everything() {
    let mut viewer = viewer_with_trace();
    viewer.apply(Command::ClearSession);
    let snapshot = viewer.snapshot();
    assert_eq!(snapshot.profile_count, 0);
    assert!(snapshot.lanes.is_empty());
    assert!(snapshot.selection.is_none());
    assert!(viewer.export_json().is_err());

    let commands = viewer.render_frame(0.0);
    // Just the background clear.
    assert_eq!(commands.len(), 1);
}

#[test]
fn export_json_round_trips_through_the_sniffer() {
    let mut viewer = viewer_with_trace();
    // Single-profile sessions re-import as the profile itself.
    let json = viewer.export_json().unwrap();
    let mut second = Viewer::new(1000.0, 600.0);
    let handle = second.load_profile(json.as_bytes(), "reimport").unwrap();

    let original = &viewer.session().entries()[0].profile;
    let reloaded = second.session().profile(handle).unwrap();
    assert_eq!(original.span_count(), reloaded.span_count());
    assert_eq!(original.start_us, reloaded.start_us);
    assert_eq!(original.end_us, reloaded.end_us);
    reloaded.validate().unwrap();

    viewer.apply(Command::SetViewport {
        start: 0.0,
        end: 1.0,
    });
    second.apply(Command::SetViewport {
        start: 0.0,
        end: 1.0,
    });
    assert_eq!(
        labelled_rects(&viewer.render_frame(0.0)),
        labelled_rects(&second.render_frame(0.0)),
        "re-imported profile renders identically"
    );
}

#[test]
fn export_svg_is_a_complete_document() {
    let mut viewer = viewer_with_trace();
    let svg = viewer.export_svg().unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.ends_with("</svg>"));
    assert!(svg.contains("<title>A</title>"));
    assert!(svg.contains("clip-path"), "lanes are clipped in the export");
}

#[test]
fn lane_commands_affect_snapshot_lanes() {
    let mut viewer = viewer_with_trace();
    viewer.apply(Command::SetLaneHeight {
        lane: 0,
        height: 123.0,
    });
    viewer.apply(Command::SetLaneVisibility {
        lane: 0,
        visible: false,
    });
    let snapshot = viewer.snapshot();
    assert_eq!(snapshot.lanes[0].height_px, 123.0);
    assert!(!snapshot.lanes[0].visible);

    // Out-of-range lane indices are no-ops, not failures.
    viewer.apply(Command::SetLaneHeight {
        lane: 99,
        height: 50.0,
    });
}

#[test]
fn keyboard_surface_maps_to_commands() {
    use traceviz_core::viewer::keys::{Key, Mods};

    let mut viewer = viewer_with_trace();
    viewer.apply(Command::SetViewport {
        start: 0.4,
        end: 0.6,
    });
    viewer.handle_key(Key::Char('d'), Mods::default());
    let snapshot = viewer.snapshot();
    assert!(snapshot.viewport_start > 0.4, "D pans right");

    viewer.handle_key(Key::Char('0'), Mods::default());
    let snapshot = viewer.snapshot();
    assert_eq!(
        (snapshot.viewport_start, snapshot.viewport_end),
        (0.0, 1.0)
    );

    let intent = viewer.handle_key(Key::Char('/'), Mods::default());
    assert!(intent.is_some(), "search focus is a host intent");
}

#[test]
fn lanes_populate_with_aux_tracks() {
    let trace = r#"{"traceEvents":[
        {"name":"work","ph":"X","ts":0,"dur":100,"pid":1,"tid":1},
        {"name":"UpdateCounters","ph":"I","ts":50,"pid":1,"tid":1,
         "args":{"data":{"jsHeapSizeUsed":1024}}},
        {"name":"op","ph":"b","ts":10,"pid":1,"tid":1,"cat":"io","id":"1"},
        {"name":"op","ph":"e","ts":60,"pid":1,"tid":1,"cat":"io","id":"1"}
    ]}"#;
    let mut viewer = Viewer::new(800.0, 600.0);
    viewer.load_profile(trace.as_bytes(), "aux").unwrap();

    let kinds: Vec<LaneKind> = viewer
        .lanes()
        .lanes()
        .iter()
        .map(|l| l.kind.clone())
        .collect();
    assert!(kinds.iter().any(|k| matches!(k, LaneKind::Thread(_))));
    assert!(kinds.iter().any(|k| matches!(k, LaneKind::Counter(_))));
    assert!(kinds.iter().any(|k| matches!(k, LaneKind::Async)));
    assert!(kinds.iter().any(|k| matches!(k, LaneKind::Marker)));
}
