//! Tracy profiler JSON zone exports (`tracy-export -j` / "save as JSON").
//!
//! Only the zone-tree subset is handled — Tracy's native capture files are
//! a dense binary protocol and are rejected up front (the sniffer never
//! routes them here; a JSON export without zones reports the limitation).

use serde::Deserialize;

use super::assemble::{finalize_time_range, ProfileAssembler};
use super::ParseError;
use crate::model::{Profile, SourceFormat, SpanFlags};

#[derive(Debug, Deserialize)]
struct TracyExport {
    #[serde(default)]
    threads: Vec<TracyThread>,
    #[serde(default)]
    info: Option<TracyInfo>,
}

#[derive(Debug, Deserialize)]
struct TracyInfo {
    #[serde(default, rename = "appName")]
    app_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TracyThread {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    zones: Vec<TracyZone>,
}

#[derive(Debug, Deserialize)]
struct TracyZone {
    name: String,
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    #[serde(default)]
    children: Vec<TracyZone>,
}

pub fn parse(data: &[u8]) -> Result<Profile, ParseError> {
    let export: TracyExport = serde_json::from_slice(data).map_err(ParseError::from_json)?;

    let mut asm = ProfileAssembler::new();
    let mut total_zones = 0usize;

    for (i, thread) in export.threads.iter().enumerate() {
        let t = asm.thread((i as u64, 0), thread.name.as_deref().unwrap_or(""));
        for zone in &thread.zones {
            emit_zone(zone, t, &mut asm, &mut total_zones)?;
        }
    }

    if total_zones == 0 {
        return Err(ParseError::UnsupportedVersion {
            format: SourceFormat::Tracy,
            detail: "no zones present; only JSON zone exports are supported".into(),
        });
    }

    let mut profile = asm.finish(
        SourceFormat::Tracy,
        export.info.and_then(|i| i.app_name),
    );
    finalize_time_range(&mut profile);
    Ok(profile)
}

fn emit_zone(
    zone: &TracyZone,
    t: usize,
    asm: &mut ProfileAssembler,
    total: &mut usize,
) -> Result<(), ParseError> {
    let start = zone.start.round() as i64;
    let end = zone.end.round() as i64;
    if end < start {
        return Err(ParseError::InconsistentTimestamps {
            format: SourceFormat::Tracy,
            detail: format!("zone {:?} ends before it starts", zone.name),
        });
    }
    asm.complete(t, start, end, &zone.name, None, SpanFlags::NONE);
    *total += 1;
    for child in &zone.children {
        emit_zone(child, t, asm, total)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_zones() {
        let json = r#"{
            "info": {"appName": "MyGame"},
            "threads": [{
                "name": "Main",
                "zones": [{
                    "name": "Update", "start": 0, "end": 1000,
                    "children": [
                        {"name": "Physics", "start": 100, "end": 400, "children": []},
                        {"name": "Render", "start": 500, "end": 900, "children": [
                            {"name": "Draw", "start": 600, "end": 800, "children": []}
                        ]}
                    ]
                }]
            }]
        }"#;
        let profile = parse(json.as_bytes()).unwrap();
        assert_eq!(profile.format, SourceFormat::Tracy);
        assert_eq!(profile.name.as_deref(), Some("MyGame"));
        assert_eq!(profile.span_count(), 4);

        let update = profile.spans().find(|s| s.name == "Update").unwrap();
        assert_eq!(update.depth, 0);
        assert_eq!(update.self_us, 1000 - 300 - 400);
        let draw = profile.spans().find(|s| s.name == "Draw").unwrap();
        assert_eq!(draw.depth, 2);
        profile.validate().unwrap();
    }

    #[test]
    fn zoneless_export_reports_unsupported() {
        let json = r#"{"threads":[{"name":"t","zones":[]}]}"#;
        assert!(matches!(
            parse(json.as_bytes()),
            Err(ParseError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn inverted_zone_is_inconsistent() {
        let json = r#"{"threads":[{"name":"t","zones":[{"name":"z","start":100,"end":50}]}]}"#;
        assert!(matches!(
            parse(json.as_bytes()),
            Err(ParseError::InconsistentTimestamps { .. })
        ));
    }
}
