//! Speedscope files (<https://www.speedscope.app/file-format-spec.json>).
//!
//! Both sub-schemas are handled: `evented` profiles are streams of open/
//! close events, `sampled` profiles are stacks with weights. Each profile
//! entry becomes one thread. All values normalize to microseconds via the
//! per-profile `unit`.

use serde::Deserialize;

use super::assemble::{finalize_time_range, ProfileAssembler, StackFrame};
use super::ParseError;
use crate::model::{Profile, SourceFormat, SpanFlags};

#[derive(Debug, Deserialize)]
struct SpeedscopeFile {
    #[serde(default)]
    shared: Option<SharedData>,
    profiles: Vec<SpeedscopeProfile>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SharedData {
    frames: Vec<SharedFrame>,
}

#[derive(Debug, Deserialize)]
struct SharedFrame {
    name: String,
    #[serde(default)]
    file: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum SpeedscopeProfile {
    #[serde(rename = "evented")]
    Evented {
        #[serde(default)]
        name: Option<String>,
        unit: String,
        events: Vec<SpeedscopeEvent>,
    },
    #[serde(rename = "sampled")]
    Sampled {
        #[serde(default)]
        name: Option<String>,
        unit: String,
        #[serde(rename = "startValue")]
        start_value: f64,
        samples: Vec<Vec<usize>>,
        weights: Vec<f64>,
    },
}

#[derive(Debug, Deserialize)]
struct SpeedscopeEvent {
    #[serde(rename = "type")]
    event_type: String, // "O" or "C"
    frame: usize,
    at: f64,
}

/// Microseconds per unit of the profile's value axis. Unit-less profiles
/// count samples; one sample maps to 1µs.
fn unit_factor(unit: &str) -> f64 {
    match unit {
        "nanoseconds" => 0.001,
        "microseconds" => 1.0,
        "milliseconds" => 1_000.0,
        "seconds" => 1_000_000.0,
        _ => 1.0,
    }
}

pub fn parse(data: &[u8]) -> Result<Profile, ParseError> {
    let file: SpeedscopeFile = serde_json::from_slice(data).map_err(ParseError::from_json)?;
    if file.profiles.is_empty() {
        return Err(ParseError::InvalidFormat(
            "speedscope file has no profiles".into(),
        ));
    }

    let shared = file.shared.as_ref().map(|s| &s.frames[..]).unwrap_or(&[]);
    let frame_name = |idx: usize| shared.get(idx).map(|f| f.name.as_str()).unwrap_or("");
    let frame_file = |idx: usize| shared.get(idx).and_then(|f| f.file.as_deref());

    let mut asm = ProfileAssembler::new();

    for (i, entry) in file.profiles.iter().enumerate() {
        match entry {
            SpeedscopeProfile::Evented { name, unit, events } => {
                let factor = unit_factor(unit);
                let display = name.clone().unwrap_or_else(|| format!("Profile {i}"));
                let t = asm.thread((i as u64, 0), &display);

                let mut last_at = f64::NEG_INFINITY;
                for event in events {
                    if event.at < last_at {
                        return Err(ParseError::InconsistentTimestamps {
                            format: SourceFormat::Speedscope,
                            detail: "event stream is not monotonic".into(),
                        });
                    }
                    last_at = event.at;
                    let ts = (event.at * factor).round() as i64;
                    match event.event_type.as_str() {
                        "O" => asm.begin(
                            t,
                            ts,
                            frame_name(event.frame),
                            frame_file(event.frame),
                            SpanFlags::NONE,
                        ),
                        "C" => asm.end(t, ts),
                        other => {
                            return Err(ParseError::InvalidFormat(format!(
                                "unknown speedscope event type {other:?}"
                            )));
                        }
                    }
                }
            }
            SpeedscopeProfile::Sampled {
                name,
                unit,
                start_value,
                samples,
                weights,
            } => {
                let factor = unit_factor(unit);
                let display = name.clone().unwrap_or_else(|| format!("Profile {i}"));
                let t = asm.thread((i as u64, 0), &display);

                let mut offset = start_value * factor;
                for (j, sample) in samples.iter().enumerate() {
                    let weight = weights.get(j).copied().unwrap_or(1.0) * factor;
                    let frames: Vec<StackFrame<'_>> = sample
                        .iter()
                        .map(|&idx| StackFrame {
                            key: idx as u64,
                            name: frame_name(idx),
                            category: frame_file(idx),
                        })
                        .collect();
                    asm.sample(
                        t,
                        &frames,
                        offset.round() as i64,
                        (offset + weight).round() as i64,
                        SpanFlags::NONE,
                    );
                    offset += weight;
                }
            }
        }
    }

    let mut profile = asm.finish(SourceFormat::Speedscope, file.name);
    finalize_time_range(&mut profile);
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evented_profile() {
        let json = r#"{
            "$schema": "https://www.speedscope.app/file-format-spec.json",
            "shared": {"frames": [{"name": "main"}, {"name": "foo", "file": "foo.js"}]},
            "profiles": [{
                "type": "evented",
                "name": "thread 0",
                "unit": "microseconds",
                "startValue": 0,
                "endValue": 100,
                "events": [
                    {"type": "O", "frame": 0, "at": 0},
                    {"type": "O", "frame": 1, "at": 10},
                    {"type": "C", "frame": 1, "at": 50},
                    {"type": "C", "frame": 0, "at": 100}
                ]
            }],
            "name": "capture"
        }"#;
        let profile = parse(json.as_bytes()).unwrap();
        assert_eq!(profile.format, SourceFormat::Speedscope);
        assert_eq!(profile.name.as_deref(), Some("capture"));
        assert_eq!(profile.span_count(), 2);

        let main = profile.spans().find(|s| s.name == "main").unwrap();
        assert_eq!(main.duration_us(), 100);
        assert_eq!(main.self_us, 60);
        let foo = profile.spans().find(|s| s.name == "foo").unwrap();
        assert_eq!(foo.category.as_ref().map(|c| c.as_str()), Some("foo.js"));
        profile.validate().unwrap();
    }

    #[test]
    fn sampled_profile_merges_prefix() {
        let json = r#"{
            "shared": {"frames": [{"name": "main"}, {"name": "work"}]},
            "profiles": [{
                "type": "sampled",
                "name": "samples",
                "unit": "milliseconds",
                "startValue": 0,
                "endValue": 30,
                "samples": [[0, 1], [0, 1], [0]],
                "weights": [10, 10, 10]
            }]
        }"#;
        let profile = parse(json.as_bytes()).unwrap();
        // main and work merge across the shared prefix: 2 spans, ms→µs.
        assert_eq!(profile.span_count(), 2);
        let main = profile.spans().find(|s| s.name == "main").unwrap();
        assert_eq!(main.duration_us(), 30_000);
        profile.validate().unwrap();
    }

    #[test]
    fn each_profile_is_a_thread() {
        let json = r#"{
            "shared": {"frames": [{"name": "a"}]},
            "profiles": [
                {"type": "sampled", "name": "cpu 0", "unit": "microseconds",
                 "startValue": 0, "endValue": 1, "samples": [[0]], "weights": [1]},
                {"type": "sampled", "name": "cpu 1", "unit": "microseconds",
                 "startValue": 0, "endValue": 1, "samples": [[0]], "weights": [1]}
            ]
        }"#;
        let profile = parse(json.as_bytes()).unwrap();
        assert_eq!(profile.threads.len(), 2);
    }

    #[test]
    fn empty_profiles_is_invalid() {
        assert!(matches!(
            parse(br#"{"shared":{"frames":[]},"profiles":[]}"#),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn non_monotonic_events_are_inconsistent() {
        let json = r#"{
            "shared": {"frames": [{"name": "a"}]},
            "profiles": [{
                "type": "evented", "unit": "microseconds",
                "events": [
                    {"type": "O", "frame": 0, "at": 100},
                    {"type": "C", "frame": 0, "at": 50}
                ]
            }]
        }"#;
        assert!(matches!(
            parse(json.as_bytes()),
            Err(ParseError::InconsistentTimestamps { .. })
        ));
    }
}
