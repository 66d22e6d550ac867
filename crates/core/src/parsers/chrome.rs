//! Chrome DevTools / `chrome://tracing` JSON traces.
//!
//! Handles both the object form (`{"traceEvents": [...]}`) and the bare
//! array form. Duration events (`B`/`E`/`X`) feed the span assembler;
//! instant (`I`/`i`), mark (`R`), counter (`C`), async (`b`/`e`/`n`) and
//! flow (`s`/`t`/`f`) phases populate the auxiliary tracks. React 19.2
//! performance-track measures are recognized and routed onto synthetic
//! "React …" threads.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use super::assemble::{finalize_time_range, ProfileAssembler};
use super::ParseError;
use crate::model::{
    AsyncSpan, Counter, CounterSample, FlowEdge, FrameClass, FrameInterval, Marker, Profile,
    SourceFormat, SpanFlags,
};

const FRAME_BUDGET_US: i64 = 16_667;

/// Accept event ids that are either strings or numbers.
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdValue {
        Str(String),
        Num(u64),
    }
    Option::<IdValue>::deserialize(deserializer).map(|opt| {
        opt.map(|v| match v {
            IdValue::Str(s) => s,
            IdValue::Num(n) => n.to_string(),
        })
    })
}

#[derive(Debug, Clone, Deserialize)]
struct TraceEvent {
    #[serde(default)]
    name: String,
    #[serde(default)]
    cat: String,
    ph: String,
    #[serde(default)]
    ts: f64,
    #[serde(default)]
    dur: Option<f64>,
    #[serde(default)]
    pid: u64,
    #[serde(default)]
    tid: u64,
    #[serde(default)]
    args: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<String>,
    /// Alternative id carrier: `{"local": "0x.."}` or `{"global": "0x.."}`.
    #[serde(default)]
    id2: Option<serde_json::Value>,
}

impl TraceEvent {
    fn effective_id(&self) -> Option<String> {
        if let Some(id) = &self.id {
            return Some(id.clone());
        }
        let id2 = self.id2.as_ref()?;
        id2.get("local")
            .or_else(|| id2.get("global"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn devtools_track(&self) -> Option<&str> {
        self.args
            .as_ref()?
            .get("detail")?
            .get("devtools")?
            .get("track")?
            .as_str()
    }

    fn devtools_color(&self) -> Option<&str> {
        self.args
            .as_ref()?
            .get("detail")?
            .get("devtools")?
            .get("color")?
            .as_str()
    }

    /// React component measure: `args.detail.devtools.track` holds the
    /// "Components ⚛" track name.
    fn is_react_component(&self) -> bool {
        self.devtools_track().is_some_and(|t| t.contains("Components"))
    }

    /// React scheduler lane measure (Blocking/Transition/Suspense/Idle).
    fn is_react_scheduler(&self) -> bool {
        self.devtools_track().is_some_and(|t| {
            t == "Blocking" || t == "Transition" || t == "Suspense" || t == "Idle"
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TraceFile {
    Object {
        #[serde(rename = "traceEvents")]
        trace_events: Vec<TraceEvent>,
    },
    Array(Vec<TraceEvent>),
}

fn guess_counter_unit(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    if lower.contains("heap") || lower.contains("memory") || lower.contains("bytes") {
        Some("bytes")
    } else if lower.contains("percent") || lower.contains('%') {
        Some("percent")
    } else {
        None
    }
}

fn marker_category(name: &str) -> Option<&'static str> {
    match name {
        "firstPaint" | "firstContentfulPaint" | "firstMeaningfulPaint" | "LCP"
        | "InteractiveTime" | "LayoutShift" => Some("web-vital"),
        "navigationStart" | "fetchStart" | "responseEnd" | "domLoading" | "domInteractive"
        | "domContentLoadedEventStart" | "domContentLoadedEventEnd" | "domComplete"
        | "loadEventStart" | "loadEventEnd" => Some("navigation"),
        _ => None,
    }
}

struct PendingAsync {
    start_us: i64,
    name: String,
    thread: u32,
}

struct PendingFlow {
    ts_us: i64,
    thread: u32,
    name: String,
}

pub fn parse(data: &[u8]) -> Result<Profile, ParseError> {
    let file: TraceFile = serde_json::from_slice(data).map_err(ParseError::from_json)?;
    let events = match file {
        TraceFile::Object { trace_events } => trace_events,
        TraceFile::Array(events) => events,
    };

    // Metadata pass: thread names.
    let mut thread_names: HashMap<(u64, u64), String> = HashMap::new();
    for event in &events {
        if event.ph == "M"
            && event.name == "thread_name"
            && let Some(name) = event
                .args
                .as_ref()
                .and_then(|a| a.get("name"))
                .and_then(|n| n.as_str())
        {
            thread_names.insert((event.pid, event.tid), name.to_string());
        }
    }

    // Stack reconstruction needs time order.
    let mut sorted: Vec<&TraceEvent> = events.iter().filter(|e| e.ph != "M").collect();
    sorted.sort_by(|a, b| a.ts.total_cmp(&b.ts));

    let mut asm = ProfileAssembler::new();
    // Synthetic threads for React measures live outside the pid/tid space.
    let mut synth_threads: HashMap<String, (u64, u64)> = HashMap::new();
    let mut next_synth: u64 = 0;

    let mut counters: BTreeMap<String, Vec<CounterSample>> = BTreeMap::new();
    let mut markers: Vec<Marker> = Vec::new();
    let mut async_begins: HashMap<(String, String), PendingAsync> = HashMap::new();
    let mut async_spans: Vec<(String, String, i64, i64, u32, u32)> = Vec::new();
    let mut flow_starts: HashMap<String, PendingFlow> = HashMap::new();
    let mut flows: Vec<(String, i64, u32, i64, u32)> = Vec::new();
    let mut frame_marks: Vec<i64> = Vec::new();

    for event in &sorted {
        let ts = event.ts.round() as i64;
        let mut resolve_thread = |asm: &mut ProfileAssembler, event: &TraceEvent| -> usize {
            if event.is_react_component() {
                let key = *synth_threads
                    .entry("React Components".to_string())
                    .or_insert_with(|| {
                        next_synth += 1;
                        (u64::MAX, next_synth)
                    });
                asm.thread(key, "React Components")
            } else if event.is_react_scheduler() {
                let track = event.devtools_track().unwrap_or("Scheduler");
                let name = format!("React Scheduler: {track}");
                let key = *synth_threads.entry(name.clone()).or_insert_with(|| {
                    next_synth += 1;
                    (u64::MAX, next_synth)
                });
                asm.thread(key, &name)
            } else {
                let name = thread_names
                    .get(&(event.pid, event.tid))
                    .map(String::as_str)
                    .unwrap_or("");
                asm.thread((event.pid, event.tid), name)
            }
        };

        match event.ph.as_str() {
            "X" | "B" | "E" => {
                let t = resolve_thread(&mut asm, event);
                // React measures carry the severity color as a category.
                let category: Option<String> = if event.is_react_component() {
                    let color = event.devtools_color().unwrap_or("primary");
                    Some(format!("react.component.{color}"))
                } else if event.is_react_scheduler() {
                    let track = event.devtools_track().unwrap_or("unknown");
                    Some(format!("react.scheduler.{}", track.to_lowercase()))
                } else if event.cat.is_empty() {
                    None
                } else {
                    Some(event.cat.clone())
                };
                // React prefixes measure names with a zero-width space.
                let name = event.name.trim_start_matches('\u{200b}');

                match event.ph.as_str() {
                    "X" => {
                        let dur = event.dur.unwrap_or(0.0).round() as i64;
                        if dur < 0 {
                            return Err(ParseError::InconsistentTimestamps {
                                format: SourceFormat::ChromeTrace,
                                detail: format!("negative duration on {name:?}"),
                            });
                        }
                        asm.complete(t, ts, ts + dur, name, category.as_deref(), SpanFlags::NONE);
                    }
                    "B" => {
                        asm.close_completed(t, ts);
                        asm.begin(t, ts, name, category.as_deref(), SpanFlags::NONE);
                    }
                    "E" => {
                        asm.close_completed(t, ts);
                        asm.end(t, ts);
                    }
                    _ => unreachable!(),
                }
            }

            "I" | "i" => {
                if event.name == "UpdateCounters"
                    && let Some(data) = event.args.as_ref().and_then(|a| a.get("data"))
                {
                    for (key, display) in [
                        ("jsHeapSizeUsed", "JS Heap Size"),
                        ("documents", "Documents"),
                        ("nodes", "DOM Nodes"),
                        ("jsEventListeners", "JS Event Listeners"),
                    ] {
                        if let Some(v) = data.get(key).and_then(serde_json::Value::as_f64) {
                            counters
                                .entry(display.to_string())
                                .or_default()
                                .push(CounterSample { ts_us: ts, value: v });
                        }
                    }
                }
                if event.name == "DrawFrame" || event.name == "BeginFrame" {
                    frame_marks.push(ts);
                }
                let category = if event.cat.is_empty() {
                    None
                } else {
                    Some(asm.intern(&event.cat))
                };
                let name = asm.intern(&event.name);
                markers.push(Marker {
                    ts_us: ts,
                    name,
                    category,
                });
            }

            "R" => {
                let name = if event.name == "largestContentfulPaint::Candidate" {
                    "LCP"
                } else {
                    event.name.as_str()
                };
                let category = marker_category(name).map(|c| asm.intern(c));
                let name = asm.intern(name);
                markers.push(Marker {
                    ts_us: ts,
                    name,
                    category,
                });
            }

            "C" => {
                if let Some(obj) = event.args.as_ref().and_then(|a| a.as_object()) {
                    for (counter_name, value) in obj {
                        if let Some(v) = value.as_f64() {
                            let full = if event.name.is_empty() {
                                counter_name.clone()
                            } else {
                                format!("{} — {}", event.name, counter_name)
                            };
                            counters
                                .entry(full)
                                .or_default()
                                .push(CounterSample { ts_us: ts, value: v });
                        }
                    }
                }
            }

            "b" => {
                if let Some(id) = event.effective_id() {
                    let t = resolve_thread(&mut asm, event);
                    async_begins.insert(
                        (event.cat.clone(), id),
                        PendingAsync {
                            start_us: ts,
                            name: event.name.clone(),
                            thread: asm.thread_id(t),
                        },
                    );
                }
            }
            "e" => {
                if let Some(id) = event.effective_id()
                    && let Some(pending) = async_begins.remove(&(event.cat.clone(), id.clone()))
                {
                    let t = resolve_thread(&mut asm, event);
                    async_spans.push((
                        id,
                        pending.name,
                        pending.start_us,
                        ts,
                        pending.thread,
                        asm.thread_id(t),
                    ));
                }
            }
            "n" => {
                // Async instant: zero-duration async span.
                if let Some(id) = event.effective_id() {
                    let t = resolve_thread(&mut asm, event);
                    let tid = asm.thread_id(t);
                    async_spans.push((id, event.name.clone(), ts, ts, tid, tid));
                }
            }

            "s" => {
                if let Some(id) = event.effective_id() {
                    let t = resolve_thread(&mut asm, event);
                    flow_starts.insert(
                        id,
                        PendingFlow {
                            ts_us: ts,
                            thread: asm.thread_id(t),
                            name: event.name.clone(),
                        },
                    );
                }
            }
            "f" => {
                if let Some(id) = event.effective_id()
                    && let Some(pending) = flow_starts.remove(&id)
                {
                    let t = resolve_thread(&mut asm, event);
                    flows.push((
                        pending.name,
                        pending.ts_us,
                        pending.thread,
                        ts,
                        asm.thread_id(t),
                    ));
                }
            }
            "t" => {
                // Flow step: terminate the incoming edge, start the next leg.
                if let Some(id) = event.effective_id() {
                    let t = resolve_thread(&mut asm, event);
                    let tid = asm.thread_id(t);
                    if let Some(pending) = flow_starts.remove(&id) {
                        flows.push((pending.name, pending.ts_us, pending.thread, ts, tid));
                    }
                    flow_starts.insert(
                        id,
                        PendingFlow {
                            ts_us: ts,
                            thread: tid,
                            name: event.name.clone(),
                        },
                    );
                }
            }

            _ => {}
        }
    }

    let mut profile = asm.finish(SourceFormat::ChromeTrace, None);

    let mut intern = crate::intern::Interner::new();
    profile.counters = counters
        .into_iter()
        .map(|(name, mut samples)| {
            samples.sort_by_key(|s| s.ts_us);
            let unit = guess_counter_unit(&name).map(|u| intern.intern(u));
            Counter {
                name: intern.intern(&name),
                unit,
                samples,
            }
        })
        .collect();
    profile.markers = markers;
    profile.async_spans = async_spans
        .into_iter()
        .map(|(id, name, start_us, end_us, origin, target)| AsyncSpan {
            id: intern.intern(&id),
            name: intern.intern(&name),
            start_us,
            end_us,
            origin_thread: Some(origin),
            target_thread: Some(target),
        })
        .collect();
    profile.flows = flows
        .into_iter()
        .map(|(name, from_ts_us, from_thread, to_ts_us, to_thread)| FlowEdge {
            name: intern.intern(&name),
            from_ts_us,
            from_thread,
            to_ts_us,
            to_thread,
        })
        .collect();

    frame_marks.sort_unstable();
    frame_marks.dedup();
    profile.frames = frame_marks
        .windows(2)
        .enumerate()
        .map(|(i, w)| FrameInterval {
            index: i as u32,
            start_us: w[0],
            end_us: w[1],
            budget_us: FRAME_BUDGET_US,
            class: FrameClass::classify(w[1] - w[0], FRAME_BUDGET_US),
        })
        .collect();

    finalize_time_range(&mut profile);
    Ok(profile)
}
