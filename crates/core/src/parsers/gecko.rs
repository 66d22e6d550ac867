//! Firefox Gecko profiler JSON (`profiler.firefox.com` captures).
//!
//! Each thread carries table-encoded stacks: `samples.stack[i]` indexes
//! `stackTable`, whose `prefix` chain unwinds to the root; frames resolve
//! through `frameTable` → `funcTable` → `stringTable`. Sample times are
//! milliseconds.

use serde::Deserialize;

use super::assemble::{finalize_time_range, ProfileAssembler, StackFrame};
use super::ParseError;
use crate::model::{Marker, Profile, SourceFormat, SpanFlags};

#[derive(Debug, Deserialize)]
struct GeckoProfile {
    #[serde(default)]
    threads: Vec<GeckoThread>,
    #[serde(default)]
    meta: Option<GeckoMeta>,
}

#[derive(Debug, Deserialize)]
struct GeckoMeta {
    #[serde(default)]
    interval: Option<f64>,
    #[serde(default, rename = "startTime")]
    start_time: Option<f64>,
    #[serde(default)]
    product: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeckoThread {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "stackTable")]
    stack_table: Option<GeckoStackTable>,
    #[serde(rename = "frameTable")]
    frame_table: Option<GeckoFrameTable>,
    #[serde(rename = "stringTable")]
    string_table: Option<Vec<String>>,
    samples: Option<GeckoSamples>,
    #[serde(rename = "funcTable")]
    func_table: Option<GeckoFuncTable>,
    #[serde(default)]
    markers: Option<GeckoMarkers>,
}

#[derive(Debug, Deserialize)]
struct GeckoStackTable {
    frame: Vec<usize>,
    prefix: Vec<Option<usize>>,
}

#[derive(Debug, Deserialize)]
struct GeckoFrameTable {
    func: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct GeckoFuncTable {
    name: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct GeckoSamples {
    stack: Vec<Option<usize>>,
    time: Vec<f64>,
}

/// Parallel-array marker table (simplified Gecko marker schema).
#[derive(Debug, Deserialize)]
struct GeckoMarkers {
    #[serde(default)]
    name: Vec<usize>,
    #[serde(default)]
    time: Vec<f64>,
}

const MS_TO_US: f64 = 1_000.0;

pub fn parse(data: &[u8]) -> Result<Profile, ParseError> {
    let gecko: GeckoProfile = serde_json::from_slice(data).map_err(ParseError::from_json)?;

    if gecko.threads.is_empty() {
        return Err(ParseError::InvalidFormat(
            "gecko profile has no threads".into(),
        ));
    }

    let meta = gecko.meta.as_ref();
    let profile_start_ms = meta.and_then(|m| m.start_time).unwrap_or(0.0);
    let interval_ms = meta.and_then(|m| m.interval).unwrap_or(1.0);
    let product = meta.and_then(|m| m.product.clone());

    let mut asm = ProfileAssembler::new();
    let mut markers: Vec<Marker> = Vec::new();

    for (thread_index, thread) in gecko.threads.iter().enumerate() {
        let (Some(stack_table), Some(frame_table), Some(string_table), Some(samples)) = (
            &thread.stack_table,
            &thread.frame_table,
            &thread.string_table,
            &thread.samples,
        ) else {
            continue;
        };

        if stack_table.frame.len() != stack_table.prefix.len() {
            return Err(ParseError::TreeConstructionFailed {
                format: SourceFormat::FirefoxGecko,
                detail: "stackTable frame/prefix length mismatch".into(),
            });
        }

        let thread_name = thread.name.as_deref().unwrap_or("");
        let t = asm.thread((thread_index as u64, 0), thread_name);

        let resolve_name = |frame_idx: usize| {
            let func_idx = frame_table.func.get(frame_idx).copied().unwrap_or(0);
            let name_idx = match &thread.func_table {
                Some(funcs) => funcs.name.get(func_idx).copied().unwrap_or(0),
                None => func_idx,
            };
            string_table.get(name_idx).map(String::as_str).unwrap_or("")
        };

        // Unwind one stackTable row to a root-first frame list.
        let unwind = |stack_idx: usize| -> Vec<usize> {
            let mut chain = Vec::new();
            let mut idx = Some(stack_idx);
            while let Some(i) = idx {
                if i >= stack_table.frame.len() {
                    break;
                }
                chain.push(stack_table.frame[i]);
                idx = stack_table.prefix[i];
            }
            chain.reverse();
            chain
        };

        for (i, stack_opt) in samples.stack.iter().enumerate() {
            let time_ms = samples.time.get(i).copied().unwrap_or(0.0) + profile_start_ms;
            let next_ms = samples
                .time
                .get(i + 1)
                .map(|t| t + profile_start_ms)
                .unwrap_or(time_ms + interval_ms);
            if next_ms < time_ms {
                return Err(ParseError::InconsistentTimestamps {
                    format: SourceFormat::FirefoxGecko,
                    detail: format!("sample {i} goes backwards"),
                });
            }
            let ts = (time_ms * MS_TO_US).round() as i64;
            let next_ts = (next_ms * MS_TO_US).round() as i64;

            let chain = match stack_opt {
                Some(idx) => unwind(*idx),
                None => Vec::new(),
            };
            let frames: Vec<StackFrame<'_>> = chain
                .iter()
                .map(|&frame_idx| StackFrame {
                    key: frame_idx as u64,
                    name: resolve_name(frame_idx),
                    category: None,
                })
                .collect();
            asm.sample(t, &frames, ts, next_ts, SpanFlags::NONE);
        }

        if let Some(table) = &thread.markers {
            for (j, &name_idx) in table.name.iter().enumerate() {
                let Some(time_ms) = table.time.get(j) else {
                    continue;
                };
                let name = string_table.get(name_idx).map(String::as_str).unwrap_or("");
                if name.is_empty() {
                    continue;
                }
                let name = asm.intern(name);
                markers.push(Marker {
                    ts_us: ((time_ms + profile_start_ms) * MS_TO_US).round() as i64,
                    name,
                    category: None,
                });
            }
        }
    }

    let mut profile = asm.finish(SourceFormat::FirefoxGecko, product);
    if profile.span_count() == 0 && markers.is_empty() {
        return Err(ParseError::InvalidFormat(
            "gecko profile has no samples".into(),
        ));
    }
    profile.markers = markers;
    finalize_time_range(&mut profile);
    Ok(profile)
}
