//! pprof profiles.
//!
//! The wire form is a gzipped `perftools.profiles.Profile` protobuf
//! message; the message structs below are hand-written prost derives for
//! the subset the visual model consumes. `go tool pprof -json` exports are
//! accepted too (the sniffer routes on `samples`+`locations`+`functions`).
//!
//! Stacks are leaf-first. When the profile carries a nanosecond-valued
//! sample type the timeline uses real durations; otherwise one sample
//! weight unit maps to 1µs.

use std::collections::HashMap;
use std::io::Read;

use prost::Message;
use serde::Deserialize;

use super::assemble::{finalize_time_range, ProfileAssembler, StackFrame};
use super::ParseError;
use crate::model::{Profile, SourceFormat, SpanFlags};

#[derive(Clone, PartialEq, Message)]
struct WireProfile {
    #[prost(message, repeated, tag = "1")]
    sample_type: Vec<WireValueType>,
    #[prost(message, repeated, tag = "2")]
    sample: Vec<WireSample>,
    #[prost(message, repeated, tag = "4")]
    location: Vec<WireLocation>,
    #[prost(message, repeated, tag = "5")]
    function: Vec<WireFunction>,
    #[prost(string, repeated, tag = "6")]
    string_table: Vec<String>,
    #[prost(int64, tag = "9")]
    time_nanos: i64,
    #[prost(int64, tag = "10")]
    duration_nanos: i64,
}

#[derive(Clone, Copy, PartialEq, Message)]
struct WireValueType {
    #[prost(int64, tag = "1")]
    r#type: i64,
    #[prost(int64, tag = "2")]
    unit: i64,
}

#[derive(Clone, PartialEq, Message)]
struct WireSample {
    #[prost(uint64, repeated, tag = "1")]
    location_id: Vec<u64>,
    #[prost(int64, repeated, tag = "2")]
    value: Vec<i64>,
}

#[derive(Clone, PartialEq, Message)]
struct WireLocation {
    #[prost(uint64, tag = "1")]
    id: u64,
    #[prost(message, repeated, tag = "4")]
    line: Vec<WireLine>,
}

#[derive(Clone, Copy, PartialEq, Message)]
struct WireLine {
    #[prost(uint64, tag = "1")]
    function_id: u64,
}

#[derive(Clone, PartialEq, Message)]
struct WireFunction {
    #[prost(uint64, tag = "1")]
    id: u64,
    #[prost(int64, tag = "2")]
    name: i64,
    #[prost(int64, tag = "4")]
    filename: i64,
}

/// Parse the gzipped protobuf wire form.
pub fn parse_gzipped(data: &[u8]) -> Result<Profile, ParseError> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| ParseError::Truncated(format!("gzip stream: {e}")))?;

    let wire = WireProfile::decode(raw.as_slice())
        .map_err(|e| ParseError::InvalidFormat(format!("pprof protobuf: {e}")))?;
    if wire.sample.is_empty() {
        return Err(ParseError::InvalidFormat("pprof profile has no samples".into()));
    }

    let strings = &wire.string_table;
    let str_at = |idx: i64| {
        strings
            .get(usize::try_from(idx).unwrap_or(usize::MAX))
            .map(String::as_str)
            .unwrap_or("")
    };

    // Prefer a nanosecond-valued sample type (cpu time); fall back to the
    // first value (sample counts).
    let (value_index, ns_valued) = wire
        .sample_type
        .iter()
        .enumerate()
        .find(|(_, vt)| str_at(vt.unit) == "nanoseconds")
        .map(|(i, _)| (i, true))
        .unwrap_or((0, false));

    let functions: HashMap<u64, &WireFunction> = wire.function.iter().map(|f| (f.id, f)).collect();
    let locations: HashMap<u64, &WireLocation> = wire.location.iter().map(|l| (l.id, l)).collect();

    let resolved: HashMap<u64, (String, Option<String>)> = wire
        .location
        .iter()
        .map(|loc| {
            let entry = loc
                .line
                .first()
                .and_then(|line| functions.get(&line.function_id))
                .map(|func| {
                    let name = str_at(func.name);
                    let name = if name.is_empty() {
                        format!("loc-{}", loc.id)
                    } else {
                        name.to_string()
                    };
                    let file = str_at(func.filename);
                    let file = (!file.is_empty()).then(|| file.to_string());
                    (name, file)
                })
                .unwrap_or_else(|| (format!("loc-{}", loc.id), None));
            (loc.id, entry)
        })
        .collect();

    let mut asm = ProfileAssembler::new();
    let t = asm.thread((0, 0), "Samples");
    let mut offset: i64 = 0;

    for sample in &wire.sample {
        let raw_value = sample
            .value
            .get(value_index)
            .copied()
            .unwrap_or(1)
            .max(1);
        // ns → µs when the value is a real duration.
        let width = if ns_valued {
            (raw_value / 1_000).max(1)
        } else {
            raw_value
        };

        let frames: Vec<StackFrame<'_>> = sample
            .location_id
            .iter()
            .rev() // leaf-first on the wire
            .filter(|id| locations.contains_key(*id))
            .map(|id| {
                let (name, file) = &resolved[id];
                StackFrame {
                    key: *id,
                    name: name.as_str(),
                    category: file.as_deref(),
                }
            })
            .collect();
        asm.sample(t, &frames, offset, offset + width, SpanFlags::NONE);
        offset += width;
    }

    let mut profile = asm.finish(SourceFormat::Pprof, None);
    // A real capture duration overrides the synthetic sample timeline only
    // for display bounds; spans keep their cumulative layout.
    if wire.duration_nanos > 0 {
        profile.end_us = profile.end_us.max(wire.duration_nanos / 1_000);
    }
    finalize_time_range(&mut profile);
    Ok(profile)
}

// --- JSON export form -------------------------------------------------

#[derive(Debug, Deserialize)]
struct PprofJson {
    #[serde(default)]
    samples: Vec<JsonSample>,
    #[serde(default)]
    locations: Vec<JsonLocation>,
    #[serde(default)]
    functions: Vec<JsonFunction>,
    #[serde(default, rename = "stringTable")]
    string_table: Vec<String>,
    #[serde(default, rename = "durationNanos")]
    duration_nanos: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct JsonSample {
    #[serde(default, rename = "locationId")]
    location_id: Vec<u64>,
    #[serde(default)]
    value: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct JsonLocation {
    id: u64,
    #[serde(default)]
    line: Vec<JsonLine>,
}

#[derive(Debug, Deserialize)]
struct JsonLine {
    #[serde(default, rename = "functionId")]
    function_id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonFunction {
    id: u64,
    #[serde(default)]
    name: i64,
    #[serde(default)]
    filename: Option<i64>,
}

/// Parse the `go tool pprof -json` export shape.
pub fn parse_json(data: &[u8]) -> Result<Profile, ParseError> {
    let json: PprofJson = serde_json::from_slice(data).map_err(ParseError::from_json)?;
    if json.samples.is_empty() {
        return Err(ParseError::InvalidFormat("pprof profile has no samples".into()));
    }

    let functions: HashMap<u64, &JsonFunction> = json.functions.iter().map(|f| (f.id, f)).collect();
    let locations: HashMap<u64, &JsonLocation> = json.locations.iter().map(|l| (l.id, l)).collect();
    let str_at = |idx: i64| {
        json.string_table
            .get(usize::try_from(idx).unwrap_or(usize::MAX))
            .map(String::as_str)
            .unwrap_or("")
    };

    let resolved: HashMap<u64, (String, Option<String>)> = json
        .locations
        .iter()
        .map(|loc| {
            let entry = loc
                .line
                .first()
                .and_then(|line| functions.get(&line.function_id))
                .map(|func| {
                    let name = str_at(func.name);
                    let name = if name.is_empty() {
                        format!("loc-{}", loc.id)
                    } else {
                        name.to_string()
                    };
                    let file = func
                        .filename
                        .map(str_at)
                        .filter(|f| !f.is_empty())
                        .map(str::to_string);
                    (name, file)
                })
                .unwrap_or_else(|| (format!("loc-{}", loc.id), None));
            (loc.id, entry)
        })
        .collect();

    let mut asm = ProfileAssembler::new();
    let t = asm.thread((0, 0), "Samples");
    let mut offset: i64 = 0;

    for sample in &json.samples {
        let width = sample.value.first().copied().unwrap_or(1).max(1);
        let frames: Vec<StackFrame<'_>> = sample
            .location_id
            .iter()
            .rev()
            .filter(|id| locations.contains_key(*id))
            .map(|id| {
                let (name, file) = &resolved[id];
                StackFrame {
                    key: *id,
                    name: name.as_str(),
                    category: file.as_deref(),
                }
            })
            .collect();
        asm.sample(t, &frames, offset, offset + width, SpanFlags::NONE);
        offset += width;
    }

    let mut profile = asm.finish(SourceFormat::Pprof, None);
    if let Some(ns) = json.duration_nanos
        && ns > 0
    {
        profile.end_us = profile.end_us.max(ns / 1_000);
    }
    finalize_time_range(&mut profile);
    Ok(profile)
}
