use serde::{Deserialize, Serialize};
use thiserror::Error;
use traceviz_protocol::{FrameId, Label};

use super::arena::SpanArena;
use super::span::Span;

/// The profiler tool that produced a capture. Informational: nothing
/// downstream branches on it except display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    ChromeTrace,
    FirefoxGecko,
    Speedscope,
    V8CpuProfile,
    Pprof,
    Pix,
    Tracy,
    PerfScript,
    CollapsedStacks,
    ReactDevtools,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ChromeTrace => "Chrome Trace",
            Self::FirefoxGecko => "Firefox Gecko",
            Self::Speedscope => "Speedscope",
            Self::V8CpuProfile => "V8 CPU Profile",
            Self::Pprof => "pprof",
            Self::Pix => "PIX",
            Self::Tracy => "Tracy",
            Self::PerfScript => "perf script",
            Self::CollapsedStacks => "Collapsed Stacks",
            Self::ReactDevtools => "React DevTools",
        };
        f.write_str(s)
    }
}

/// A logical execution stream owning a forest of spans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: u32,
    pub name: Label,
    /// Display order: lower keys render higher. Unique per profile.
    pub sort_key: i64,
    /// Top-level spans in start order.
    pub roots: Vec<FrameId>,
    pub span_count: u32,
    pub max_depth: u16,
}

/// Priority classes for thread ordering: main/renderer threads first,
/// compositors next, workers and IO after, everything else last. The
/// profile builder disambiguates equal classes by name then id so keys end
/// up unique.
pub fn thread_rank(name: &str) -> i64 {
    match name {
        "CrRendererMain" => 0,
        "Main" | "Main Thread" | "GeckoMain" => 1,
        n if n.contains("Main") => 2,
        "Compositor" => 10,
        n if n.contains("Worker") => 20,
        n if n.contains("IO") => 30,
        _ => 50,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterSample {
    pub ts_us: i64,
    pub value: f64,
}

/// A sampled numeric time series (heap size, DOM nodes, …).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    pub name: Label,
    pub unit: Option<Label>,
    /// Sorted by timestamp.
    pub samples: Vec<CounterSample>,
}

/// A point event with no duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    pub ts_us: i64,
    pub name: Label,
    pub category: Option<Label>,
}

/// An operation that may span threads (Chrome `b`/`e` pairs and the like).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncSpan {
    pub id: Label,
    pub name: Label,
    pub start_us: i64,
    pub end_us: i64,
    pub origin_thread: Option<u32>,
    pub target_thread: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameClass {
    Good,
    Warning,
    Dropped,
}

impl FrameClass {
    /// Good within budget, Warning within twice the budget, Dropped beyond.
    pub fn classify(duration_us: i64, budget_us: i64) -> Self {
        if duration_us <= budget_us {
            Self::Good
        } else if duration_us <= budget_us * 2 {
            Self::Warning
        } else {
            Self::Dropped
        }
    }
}

/// One display/render frame interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameInterval {
    pub index: u32,
    pub start_us: i64,
    pub end_us: i64,
    pub budget_us: i64,
    pub class: FrameClass,
}

/// Directed cross-thread causality edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEdge {
    pub name: Label,
    pub from_ts_us: i64,
    pub from_thread: u32,
    pub to_ts_us: i64,
    pub to_thread: u32,
}

/// One normalized capture. Built by a parser, owned by the session,
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
    pub format: SourceFormat,
    pub start_us: i64,
    pub end_us: i64,
    /// Sorted by `sort_key`.
    pub threads: Vec<Thread>,
    pub counters: Vec<Counter>,
    pub markers: Vec<Marker>,
    pub async_spans: Vec<AsyncSpan>,
    pub frames: Vec<FrameInterval>,
    pub flows: Vec<FlowEdge>,
    pub arena: SpanArena,
}

impl Profile {
    pub fn duration_us(&self) -> i64 {
        self.end_us - self.start_us
    }

    #[inline]
    pub fn span(&self, id: FrameId) -> Option<&Span> {
        self.arena.get(id)
    }

    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.arena.iter()
    }

    pub fn span_count(&self) -> usize {
        self.arena.len()
    }

    pub fn thread(&self, id: u32) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == id)
    }

    pub fn thread_spans(&self, thread_id: u32) -> impl Iterator<Item = &Span> {
        self.arena.iter().filter(move |s| s.thread == thread_id)
    }

    /// Check every model invariant. Parsers call this in debug builds; the
    /// exporter round-trip tests call it unconditionally.
    pub fn validate(&self) -> Result<(), ModelViolation> {
        if self.start_us > self.end_us {
            return Err(ModelViolation::ProfileRange {
                start_us: self.start_us,
                end_us: self.end_us,
            });
        }

        for span in self.arena.iter() {
            if span.start_us > span.end_us {
                return Err(ModelViolation::SpanRange { id: span.id });
            }
            if span.start_us < self.start_us || span.end_us > self.end_us {
                return Err(ModelViolation::SpanOutsideProfile { id: span.id });
            }
            if span.self_us < 0 || span.self_us > span.duration_us() {
                return Err(ModelViolation::SelfTime { id: span.id });
            }
            if let Some(parent_id) = span.parent {
                let parent = self
                    .arena
                    .get(parent_id)
                    .ok_or(ModelViolation::DanglingLink { id: span.id })?;
                if span.depth != parent.depth + 1 {
                    return Err(ModelViolation::DepthStep { id: span.id });
                }
                if span.start_us < parent.start_us || span.end_us > parent.end_us {
                    return Err(ModelViolation::ChildOutsideParent { id: span.id });
                }
            } else if span.depth != 0 {
                return Err(ModelViolation::DepthStep { id: span.id });
            }

            // Siblings are sorted by start and must not overlap.
            if let Some(next_id) = span.next_sibling {
                let next = self
                    .arena
                    .get(next_id)
                    .ok_or(ModelViolation::DanglingLink { id: span.id })?;
                if next.start_us < span.end_us {
                    return Err(ModelViolation::SiblingOverlap {
                        a: span.id,
                        b: next_id,
                    });
                }
                if next.prev_sibling != Some(span.id) {
                    return Err(ModelViolation::DanglingLink { id: next_id });
                }
            }
        }

        let mut keys: Vec<i64> = self.threads.iter().map(|t| t.sort_key).collect();
        keys.sort_unstable();
        keys.dedup();
        if keys.len() != self.threads.len() {
            return Err(ModelViolation::DuplicateThreadKey);
        }

        for counter in &self.counters {
            if counter
                .samples
                .windows(2)
                .any(|w| w[0].ts_us > w[1].ts_us)
            {
                return Err(ModelViolation::UnsortedCounter {
                    name: counter.name.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelViolation {
    #[error("profile start {start_us} after end {end_us}")]
    ProfileRange { start_us: i64, end_us: i64 },
    #[error("span {id} ends before it starts")]
    SpanRange { id: FrameId },
    #[error("span {id} lies outside the profile range")]
    SpanOutsideProfile { id: FrameId },
    #[error("span {id} self time out of range")]
    SelfTime { id: FrameId },
    #[error("span {id} depth is not parent depth + 1")]
    DepthStep { id: FrameId },
    #[error("span {id} exceeds its parent's interval")]
    ChildOutsideParent { id: FrameId },
    #[error("spans {a} and {b} are overlapping siblings")]
    SiblingOverlap { a: FrameId, b: FrameId },
    #[error("span {id} has a dangling arena link")]
    DanglingLink { id: FrameId },
    #[error("thread sort keys are not unique")]
    DuplicateThreadKey,
    #[error("counter {name} samples are not sorted")]
    UnsortedCounter { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_classification_knees() {
        assert_eq!(FrameClass::classify(16_000, 16_667), FrameClass::Good);
        assert_eq!(FrameClass::classify(16_667, 16_667), FrameClass::Good);
        assert_eq!(FrameClass::classify(20_000, 16_667), FrameClass::Warning);
        assert_eq!(FrameClass::classify(40_000, 16_667), FrameClass::Dropped);
    }

    #[test]
    fn thread_rank_orders_main_first() {
        assert!(thread_rank("CrRendererMain") < thread_rank("Main"));
        assert!(thread_rank("Main") < thread_rank("Compositor"));
        assert!(thread_rank("Compositor") < thread_rank("DedicatedWorker"));
        assert!(thread_rank("DedicatedWorker") < thread_rank("Decoder"));
    }
}
