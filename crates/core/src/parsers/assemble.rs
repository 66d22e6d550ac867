//! The shared span-tree assembler.
//!
//! Every format reduces to one of three event shapes:
//!
//! - begin/end pairs (Chrome `B`/`E`, speedscope `O`/`C`)
//! - complete intervals with a known end (Chrome `X`, Tracy zones, PIX)
//! - sampled stacks (V8, Gecko, perf, pprof, collapsed)
//!
//! Parsers translate their input into those calls; the assembler owns the
//! arena, the string interner, per-thread open-span stacks, sibling links,
//! self-time accounting, and final thread ordering. Sampled stacks use
//! prefix merging: consecutive samples sharing a prefix extend the spans at
//! those depths, the first differing frame closes everything above it.

use std::collections::HashMap;

use traceviz_protocol::{FrameId, Label};

use crate::intern::Interner;
use crate::model::{profile, Profile, SourceFormat, Span, SpanArena, SpanFlags, Thread};

/// One frame of a sampled stack, root first. `key` identifies the frame
/// across samples (node id, stack-table index, or an interned-name handle).
#[derive(Debug, Clone, Copy)]
pub struct StackFrame<'a> {
    pub key: u64,
    pub name: &'a str,
    pub category: Option<&'a str>,
}

struct OpenSpan {
    id: FrameId,
    /// End known at open time (`X`-style); sampled spans keep this at the
    /// projected end of the current sample.
    planned_end: Option<i64>,
    sample_key: Option<u64>,
    child_total_us: i64,
    last_child: Option<FrameId>,
}

struct ThreadState {
    id: u32,
    name: String,
    stack: Vec<OpenSpan>,
    roots: Vec<FrameId>,
    last_root: Option<FrameId>,
    /// Latest timestamp seen; used to close dangling opens.
    max_ts: i64,
    has_events: bool,
}

/// Builds one [`Profile`] from per-thread event streams.
pub struct ProfileAssembler {
    arena: SpanArena,
    interner: Interner,
    threads: Vec<ThreadState>,
    by_key: HashMap<(u64, u64), usize>,
}

impl Default for ProfileAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileAssembler {
    pub fn new() -> Self {
        Self {
            arena: SpanArena::new(),
            interner: Interner::new(),
            threads: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn intern(&mut self, s: &str) -> Label {
        self.interner.intern(s)
    }

    /// Get or create the thread for an external key. The name sticks on
    /// first non-empty use.
    pub fn thread(&mut self, key: (u64, u64), name: &str) -> usize {
        if let Some(&idx) = self.by_key.get(&key) {
            if !name.is_empty() && self.threads[idx].name.is_empty() {
                self.threads[idx].name = name.to_string();
            }
            return idx;
        }
        let idx = self.threads.len();
        self.threads.push(ThreadState {
            id: idx as u32,
            name: name.to_string(),
            stack: Vec::new(),
            roots: Vec::new(),
            last_root: None,
            max_ts: i64::MIN,
            has_events: false,
        });
        self.by_key.insert(key, idx);
        idx
    }

    pub fn rename_thread(&mut self, t: usize, name: &str) {
        if let Some(state) = self.threads.get_mut(t) {
            state.name = name.to_string();
        }
    }

    /// Model thread id for an assembler thread index.
    pub fn thread_id(&self, t: usize) -> u32 {
        self.threads[t].id
    }

    /// Current open-stack depth for a thread.
    pub fn depth(&self, t: usize) -> usize {
        self.threads[t].stack.len()
    }

    /// Open a span with an unknown end (begin event).
    pub fn begin(&mut self, t: usize, ts: i64, name: &str, category: Option<&str>, flags: SpanFlags) {
        self.open_inner(t, ts, ts, None, None, name, category, flags);
    }

    /// Close the innermost open span (end event). Unmatched ends are ignored.
    pub fn end(&mut self, t: usize, ts: i64) {
        let Self { arena, threads, .. } = self;
        let state = &mut threads[t];
        state.max_ts = state.max_ts.max(ts);
        if let Some(open) = state.stack.pop() {
            seal(arena, state, open, ts);
        }
    }

    /// Open a span whose end is already known (complete event). Spans that
    /// finished before `start` pop off first, so nesting follows time.
    pub fn complete(
        &mut self,
        t: usize,
        start: i64,
        end: i64,
        name: &str,
        category: Option<&str>,
        flags: SpanFlags,
    ) {
        self.close_completed(t, start);
        self.open_inner(t, start, end, Some(end), None, name, category, flags);
    }

    /// Pop complete spans whose planned end is at or before `ts`.
    pub fn close_completed(&mut self, t: usize, ts: i64) {
        let Self { arena, threads, .. } = self;
        let state = &mut threads[t];
        while let Some(top) = state.stack.last() {
            match top.planned_end {
                Some(end) if end <= ts => {
                    let open = state.stack.pop().expect("stack non-empty");
                    seal(arena, state, open, end);
                }
                _ => break,
            }
        }
    }

    /// Feed one sampled stack (root first) covering `[ts, next_ts)`.
    pub fn sample(
        &mut self,
        t: usize,
        stack: &[StackFrame<'_>],
        ts: i64,
        next_ts: i64,
        flags: SpanFlags,
    ) {
        {
            let Self { arena, threads, .. } = self;
            let state = &mut threads[t];

            // Longest prefix still on the stack keeps running.
            let mut common = 0;
            while common < state.stack.len()
                && common < stack.len()
                && state.stack[common].sample_key == Some(stack[common].key)
            {
                common += 1;
            }

            // Everything above the prefix ended at this sample.
            while state.stack.len() > common {
                let open = state.stack.pop().expect("stack non-empty");
                seal(arena, state, open, ts);
            }
            state.max_ts = state.max_ts.max(ts);

            // Survivors run at least to the end of this sample.
            for open in &mut state.stack {
                open.planned_end = Some(next_ts);
            }
        }

        let already_open = self.threads[t].stack.len();
        for frame in stack.iter().skip(already_open) {
            self.open_inner(
                t,
                ts,
                next_ts,
                Some(next_ts),
                Some(frame.key),
                frame.name,
                frame.category,
                flags.with(SpanFlags::SAMPLED),
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn open_inner(
        &mut self,
        t: usize,
        start: i64,
        end: i64,
        planned_end: Option<i64>,
        sample_key: Option<u64>,
        name: &str,
        category: Option<&str>,
        flags: SpanFlags,
    ) {
        let name = if name.is_empty() { "(anonymous)" } else { name };
        let name = self.interner.intern(name);
        let category = category.map(|c| self.interner.intern(c));

        let Self { arena, threads, .. } = self;
        let state = &mut threads[t];
        state.has_events = true;
        state.max_ts = state.max_ts.max(end);

        let id = arena.next_id();
        let depth = state.stack.len() as u16;
        let parent = state.stack.last().map(|o| o.id);

        // Sibling links: previous child of the same parent (or previous
        // root) points forward to this span.
        let prev_sibling = match state.stack.last_mut() {
            Some(parent_open) => parent_open.last_child.replace(id),
            None => {
                state.roots.push(id);
                state.last_root.replace(id)
            }
        };
        if let Some(prev) = prev_sibling
            && let Some(prev_span) = arena.get_mut(prev)
        {
            prev_span.next_sibling = Some(id);
        }
        if let Some(parent_id) = parent
            && let Some(parent_span) = arena.get_mut(parent_id)
            && parent_span.first_child.is_none()
        {
            parent_span.first_child = Some(id);
        }

        arena.push(Span {
            id,
            name,
            category,
            thread: state.id,
            depth,
            start_us: start,
            end_us: end,
            self_us: 0,
            parent,
            first_child: None,
            prev_sibling,
            next_sibling: None,
            flags,
        });

        state.stack.push(OpenSpan {
            id,
            planned_end,
            sample_key,
            child_total_us: 0,
            last_child: None,
        });
    }

    /// Close remaining opens and produce the profile (no extras attached;
    /// parsers add counters/markers/… and then call
    /// [`finalize_time_range`]).
    pub fn finish(self, format: SourceFormat, name: Option<String>) -> Profile {
        let Self {
            mut arena,
            interner: _,
            threads,
            by_key: _,
        } = self;

        let mut states = threads;
        for state in &mut states {
            let fallback = if state.max_ts == i64::MIN { 0 } else { state.max_ts };
            while let Some(open) = state.stack.pop() {
                let end = open.planned_end.unwrap_or(fallback);
                seal(&mut arena, state, open, end);
            }
        }

        // Per-thread stats from the arena.
        let mut counts = vec![0u32; states.len()];
        let mut depths = vec![0u16; states.len()];
        for span in arena.iter() {
            let t = span.thread as usize;
            counts[t] += 1;
            depths[t] = depths[t].max(span.depth);
        }

        let mut threads: Vec<Thread> = states
            .into_iter()
            .filter(|s| s.has_events)
            .map(|s| {
                let display = if s.name.is_empty() {
                    format!("Thread {}", s.id)
                } else {
                    s.name
                };
                Thread {
                    id: s.id,
                    name: Label::from(display),
                    sort_key: 0,
                    roots: s.roots,
                    span_count: counts[s.id as usize],
                    max_depth: depths[s.id as usize],
                }
            })
            .collect();

        // Stable display order: rank class, then name, then id; the final
        // position becomes the unique sort key.
        threads.sort_by(|a, b| {
            profile::thread_rank(&a.name)
                .cmp(&profile::thread_rank(&b.name))
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        for (i, thread) in threads.iter_mut().enumerate() {
            thread.sort_key = i as i64;
        }

        let mut start = i64::MAX;
        let mut end = i64::MIN;
        for span in arena.iter() {
            start = start.min(span.start_us);
            end = end.max(span.end_us);
        }
        let (start_us, end_us) = if start <= end { (start, end) } else { (0, 0) };

        Profile {
            name,
            format,
            start_us,
            end_us,
            threads,
            counters: Vec::new(),
            markers: Vec::new(),
            async_spans: Vec::new(),
            frames: Vec::new(),
            flows: Vec::new(),
            arena,
        }
    }
}

/// Finalize a popped span: set its end, settle self time, charge its
/// duration to the parent still on the stack.
fn seal(arena: &mut SpanArena, state: &mut ThreadState, open: OpenSpan, end: i64) {
    let duration = {
        let span = arena.get_mut(open.id).expect("open span in arena");
        span.end_us = span.end_us.max(end).max(span.start_us);
        span.self_us = (span.duration_us() - open.child_total_us).max(0);
        span.duration_us()
    };
    if let Some(parent) = state.stack.last_mut() {
        parent.child_total_us += duration;
    }
    state.max_ts = state.max_ts.max(end);
}

/// Grow the profile's time range to cover counters, markers, async spans,
/// frames, and flow edges attached after assembly.
pub fn finalize_time_range(profile: &mut Profile) {
    let mut start = profile.start_us;
    let mut end = profile.end_us;
    let mut saw_any = profile.span_count() > 0;

    let mut extend = |lo: i64, hi: i64, saw: &mut bool| {
        if !*saw {
            start = lo;
            end = hi;
            *saw = true;
        } else {
            start = start.min(lo);
            end = end.max(hi);
        }
    };

    for c in &profile.counters {
        if let (Some(first), Some(last)) = (c.samples.first(), c.samples.last()) {
            extend(first.ts_us, last.ts_us, &mut saw_any);
        }
    }
    for m in &profile.markers {
        extend(m.ts_us, m.ts_us, &mut saw_any);
    }
    for a in &profile.async_spans {
        extend(a.start_us, a.end_us, &mut saw_any);
    }
    for f in &profile.frames {
        extend(f.start_us, f.end_us, &mut saw_any);
    }
    for f in &profile.flows {
        extend(f.from_ts_us, f.to_ts_us, &mut saw_any);
    }

    profile.start_us = start;
    profile.end_us = end;
}
