//! React DevTools profiler exports (format version 5).
//!
//! The export is a commit log per root: each commit records, per fiber,
//! the actual and self render durations, while `snapshots` carries the
//! component tree and display names. Each root becomes a thread; rendered
//! fibers become spans laid out inside their commit's window, and the
//! commits themselves double as frame intervals so the frame track lights
//! up for React captures. Timestamps are milliseconds.

use std::collections::HashMap;

use serde::Deserialize;

use super::assemble::{finalize_time_range, ProfileAssembler};
use super::ParseError;
use crate::model::{FrameClass, FrameInterval, Profile, SourceFormat, SpanFlags};

const MS_TO_US: f64 = 1_000.0;
const FRAME_BUDGET_US: i64 = 16_667;

#[derive(Debug, Deserialize)]
struct ReactExport {
    #[serde(default)]
    version: Option<u32>,
    #[serde(rename = "dataForRoots")]
    data_for_roots: Vec<ReactRoot>,
}

#[derive(Debug, Deserialize)]
struct ReactRoot {
    #[serde(rename = "commitData")]
    commit_data: Vec<ReactCommit>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(rename = "rootID", default)]
    root_id: u64,
    /// Component tree as `(fiberID, node)` pairs.
    #[serde(default)]
    snapshots: Vec<(u64, SnapshotNode)>,
}

#[derive(Debug, Clone, Deserialize)]
struct SnapshotNode {
    #[serde(default)]
    children: Vec<u64>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReactCommit {
    #[serde(rename = "fiberActualDurations")]
    fiber_actual_durations: Vec<(u64, f64)>,
    timestamp: f64,
    duration: f64,
}

pub fn parse(data: &[u8]) -> Result<Profile, ParseError> {
    let export: ReactExport = serde_json::from_slice(data).map_err(ParseError::from_json)?;
    if let Some(version) = export.version
        && version > 5
    {
        return Err(ParseError::UnsupportedVersion {
            format: SourceFormat::ReactDevtools,
            detail: format!("profiler data version {version}"),
        });
    }
    if export.data_for_roots.is_empty() {
        return Err(ParseError::InvalidFormat(
            "react export has no profiled roots".into(),
        ));
    }

    let mut asm = ProfileAssembler::new();
    let mut frames: Vec<FrameInterval> = Vec::new();

    for (i, root) in export.data_for_roots.iter().enumerate() {
        let tree: HashMap<u64, &SnapshotNode> =
            root.snapshots.iter().map(|(id, node)| (*id, node)).collect();
        let display = root
            .display_name
            .clone()
            .unwrap_or_else(|| format!("Root {}", root.root_id));
        let t = asm.thread((i as u64, 0), &display);

        for commit in &root.commit_data {
            if commit.duration < 0.0 {
                return Err(ParseError::InconsistentTimestamps {
                    format: SourceFormat::ReactDevtools,
                    detail: "commit with negative duration".into(),
                });
            }
            let actual: HashMap<u64, f64> =
                commit.fiber_actual_durations.iter().copied().collect();
            let commit_start = (commit.timestamp * MS_TO_US).round() as i64;

            // The root fiber is the first entry of the commit's duration
            // list when present in the snapshot tree, else the root id.
            let entry_fiber = commit
                .fiber_actual_durations
                .first()
                .map(|(id, _)| *id)
                .unwrap_or(root.root_id);

            let commit_end = commit_start + (commit.duration * MS_TO_US).round() as i64;
            emit_fiber(
                entry_fiber,
                commit_start,
                i64::MAX,
                &tree,
                &actual,
                t,
                &mut asm,
            );
            frames.push(FrameInterval {
                index: frames.len() as u32,
                start_us: commit_start,
                end_us: commit_end,
                budget_us: FRAME_BUDGET_US,
                class: FrameClass::classify(commit_end - commit_start, FRAME_BUDGET_US),
            });
        }
    }

    let mut profile = asm.finish(SourceFormat::ReactDevtools, None);
    profile.frames = frames;
    finalize_time_range(&mut profile);
    Ok(profile)
}

/// Lay a rendered fiber at `offset` (clamped to `limit_us`), then its
/// rendered children sequentially inside it. Returns the fiber's end time.
fn emit_fiber(
    fiber: u64,
    offset_us: i64,
    limit_us: i64,
    tree: &HashMap<u64, &SnapshotNode>,
    actual: &HashMap<u64, f64>,
    t: usize,
    asm: &mut ProfileAssembler,
) -> i64 {
    let Some(duration_ms) = actual.get(&fiber).copied() else {
        return offset_us;
    };
    if duration_ms <= 0.0 {
        return offset_us;
    }
    let end_us = (offset_us + (duration_ms * MS_TO_US).round() as i64).min(limit_us);

    let name = tree
        .get(&fiber)
        .and_then(|n| n.display_name.clone())
        .unwrap_or_else(|| format!("fiber-{fiber}"));
    asm.complete(
        t,
        offset_us,
        end_us,
        &name,
        Some("react"),
        SpanFlags::FRAME_COST,
    );

    let mut cursor = offset_us;
    if let Some(node) = tree.get(&fiber) {
        for &child in &node.children {
            // Children that did not render keep the cursor in place.
            cursor = emit_fiber(child, cursor, end_us, tree, actual, t, asm);
        }
    }
    end_us
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "version": 5,
        "dataForRoots": [{
            "displayName": "App",
            "rootID": 1,
            "snapshots": [
                [1, {"children": [2, 3], "displayName": "App"}],
                [2, {"children": [], "displayName": "Header"}],
                [3, {"children": [4], "displayName": "Body"}],
                [4, {"children": [], "displayName": "List"}]
            ],
            "commitData": [{
                "fiberActualDurations": [[1, 10.0], [2, 3.0], [3, 6.0], [4, 4.0]],
                "fiberSelfDurations": [[1, 1.0], [2, 3.0], [3, 2.0], [4, 4.0]],
                "timestamp": 100.0,
                "duration": 10.0
            }]
        }]
    }"#;

    #[test]
    fn commit_tree_becomes_spans() {
        let profile = parse(EXPORT.as_bytes()).unwrap();
        assert_eq!(profile.format, SourceFormat::ReactDevtools);
        assert_eq!(profile.span_count(), 4);

        let app = profile.spans().find(|s| s.name == "App").unwrap();
        assert_eq!(app.depth, 0);
        assert_eq!(app.start_us, 100_000);
        assert_eq!(app.duration_us(), 10_000);

        let header = profile.spans().find(|s| s.name == "Header").unwrap();
        let body = profile.spans().find(|s| s.name == "Body").unwrap();
        assert_eq!(header.parent, Some(app.id));
        assert_eq!(body.parent, Some(app.id));
        assert_eq!(body.start_us, header.end_us);

        let list = profile.spans().find(|s| s.name == "List").unwrap();
        assert_eq!(list.parent, Some(body.id));
        profile.validate().unwrap();
    }

    #[test]
    fn commits_become_frames() {
        let profile = parse(EXPORT.as_bytes()).unwrap();
        assert_eq!(profile.frames.len(), 1);
        assert_eq!(profile.frames[0].class, FrameClass::Good);
        assert_eq!(profile.frames[0].start_us, 100_000);
    }

    #[test]
    fn future_versions_are_unsupported() {
        let json = r#"{"version": 9, "dataForRoots": []}"#;
        assert!(matches!(
            parse(json.as_bytes()),
            Err(ParseError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn empty_roots_is_invalid() {
        let json = r#"{"version": 5, "dataForRoots": []}"#;
        assert!(matches!(
            parse(json.as_bytes()),
            Err(ParseError::InvalidFormat(_))
        ));
    }
}
