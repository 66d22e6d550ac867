//! Brendan Gregg's collapsed ("folded") stack format: one stack per line,
//! frames joined by `;`, trailing sample count. Produced by the
//! stackcollapse-* scripts and most flame-graph tooling.
//!
//! Counts have no wall-clock meaning, so one sample occupies 1µs on the
//! model timeline and the spans carry the `SAMPLED` flag.

use std::collections::HashMap;

use super::assemble::{finalize_time_range, ProfileAssembler, StackFrame};
use super::ParseError;
use crate::model::{Profile, SourceFormat, SpanFlags};

/// Split a folded line into (stack, count).
fn split_line(line: &str) -> Option<(&str, f64)> {
    let pos = line.rfind(' ')?;
    let count: f64 = line[pos + 1..].trim().parse().ok()?;
    let stack = line[..pos].trim();
    if stack.is_empty() || count < 0.0 {
        return None;
    }
    Some((stack, count))
}

/// Cheap shape check used by format sniffing: at least one folded line
/// with a frame separator and a trailing count.
pub fn looks_like(text: &str) -> bool {
    text.lines()
        .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .take(50)
        .any(|l| l.contains(';') && split_line(l.trim()).is_some())
}

pub fn parse(data: &[u8]) -> Result<Profile, ParseError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| ParseError::InvalidFormat(format!("not UTF-8: {e}")))?;

    let mut asm = ProfileAssembler::new();
    let t = asm.thread((0, 0), "Main");
    let mut frame_keys: HashMap<String, u64> = HashMap::new();
    let mut offset: i64 = 0;
    let mut saw_stack = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((stack_str, count)) = split_line(line) else {
            continue;
        };
        saw_stack = true;

        let names: Vec<&str> = stack_str
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if names.is_empty() {
            continue;
        }

        let frames: Vec<StackFrame<'_>> = names
            .iter()
            .map(|&name| {
                let next = frame_keys.len() as u64;
                let key = *frame_keys.entry(name.to_string()).or_insert(next);
                StackFrame {
                    key,
                    name,
                    category: None,
                }
            })
            .collect();

        let width = count.round().max(1.0) as i64;
        asm.sample(t, &frames, offset, offset + width, SpanFlags::NONE);
        offset += width;
    }

    if !saw_stack {
        return Err(ParseError::InvalidFormat(
            "no folded stack lines found".into(),
        ));
    }

    let mut profile = asm.finish(SourceFormat::CollapsedStacks, None);
    finalize_time_range(&mut profile);
    Ok(profile)
}
