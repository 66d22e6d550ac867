//! `perf script` and bpftrace/bcc stack dumps.
//!
//! Two shapes are auto-detected:
//!
//! ```text
//! @[
//!     leaf_func
//!     mid_func
//!     root_func
//! ]: 42
//! ```
//!
//! and
//!
//! ```text
//! process 1234 1234.567890: 1 cycles:
//!     ffffffff810a func_a+0x10 (/lib/mod)
//!     ffffffff810b func_b+0x20 (/lib/mod)
//! ```
//!
//! Both are leaf-first; stacks are reversed and fed through the sampled
//! path, so identical consecutive stacks merge. One sample maps to 1µs.

use std::collections::HashMap;

use super::assemble::{finalize_time_range, ProfileAssembler, StackFrame};
use super::ParseError;
use crate::model::{Profile, SourceFormat, SpanFlags};

pub fn looks_like(text: &str) -> bool {
    if text.contains("@[") {
        return true;
    }
    // perf script: header lines followed by indented frames.
    let mut saw_header = false;
    for line in text.lines().take(100) {
        let indented = line.starts_with('\t') || line.starts_with("    ");
        if indented && saw_header && parse_script_frame(line.trim()).is_some() {
            return true;
        }
        if !indented && !line.trim().is_empty() {
            saw_header = true;
        }
    }
    false
}

pub fn parse(data: &[u8]) -> Result<Profile, ParseError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| ParseError::InvalidFormat(format!("not UTF-8: {e}")))?;

    let mut builder = SampleBuilder::new();
    if text.contains("@[") {
        parse_bpftrace(text, &mut builder)?;
    } else {
        parse_script(text, &mut builder);
    }

    if !builder.saw_stack {
        return Err(ParseError::InvalidFormat(
            "no stack samples found in perf output".into(),
        ));
    }

    let mut profile = builder.asm.finish(SourceFormat::PerfScript, None);
    finalize_time_range(&mut profile);
    Ok(profile)
}

struct SampleBuilder {
    asm: ProfileAssembler,
    thread: usize,
    frame_keys: HashMap<String, u64>,
    offset: i64,
    saw_stack: bool,
}

impl SampleBuilder {
    fn new() -> Self {
        let mut asm = ProfileAssembler::new();
        let thread = asm.thread((0, 0), "Samples");
        Self {
            asm,
            thread,
            frame_keys: HashMap::new(),
            offset: 0,
            saw_stack: false,
        }
    }

    /// `stack` is root-first; `count` samples wide.
    fn push(&mut self, stack: &[String], count: i64) {
        if stack.is_empty() || count <= 0 {
            return;
        }
        self.saw_stack = true;
        let frames: Vec<StackFrame<'_>> = stack
            .iter()
            .map(|name| {
                let next = self.frame_keys.len() as u64;
                let key = *self.frame_keys.entry(name.clone()).or_insert(next);
                StackFrame {
                    key,
                    name: name.as_str(),
                    category: None,
                }
            })
            .collect();
        self.asm.sample(
            self.thread,
            &frames,
            self.offset,
            self.offset + count,
            SpanFlags::NONE,
        );
        self.offset += count;
    }
}

fn parse_bpftrace(text: &str, builder: &mut SampleBuilder) -> Result<(), ParseError> {
    let mut rest = text;
    while let Some(open) = rest.find("@[") {
        let body = &rest[open + 2..];
        let Some(close) = body.find("]:") else {
            return Err(ParseError::Truncated("unterminated bpftrace block".into()));
        };

        let mut stack: Vec<String> = body[..close]
            .lines()
            .map(|l| strip_address(l.trim()))
            .filter(|l| !l.is_empty())
            .collect();
        // bpftrace prints leaf-first.
        stack.reverse();

        let after = &body[close + 2..];
        let count_str: String = after
            .chars()
            .skip_while(|c| c.is_whitespace())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let count: i64 = count_str.parse().unwrap_or(1);

        builder.push(&stack, count);
        rest = after;
    }
    Ok(())
}

fn parse_script(text: &str, builder: &mut SampleBuilder) {
    let mut current: Vec<String> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush(&mut current, builder);
            continue;
        }
        if line.starts_with('\t') || line.starts_with("    ") {
            if let Some(name) = parse_script_frame(trimmed) {
                current.push(name);
            }
        }
        // Non-indented lines are event headers; nothing to keep.
    }
    flush(&mut current, builder);
}

fn flush(current: &mut Vec<String>, builder: &mut SampleBuilder) {
    if current.is_empty() {
        return;
    }
    // perf prints leaf-first.
    current.reverse();
    let stack = std::mem::take(current);
    builder.push(&stack, 1);
}

/// `ffffffff810a func_name+0x10 (/path/module)` → `func_name`.
fn parse_script_frame(line: &str) -> Option<String> {
    let without_addr = strip_address(line);
    if without_addr.is_empty() {
        return None;
    }
    let without_module = match without_addr.rfind('(') {
        Some(pos) => without_addr[..pos].trim(),
        None => without_addr.as_str(),
    };
    let name = match without_module.rfind('+') {
        Some(pos) => &without_module[..pos],
        None => without_module,
    };
    let name = name.trim();
    if name.is_empty() || name == "[unknown]" {
        None
    } else {
        Some(name.to_string())
    }
}

/// Drop a leading hex address token if present.
fn strip_address(s: &str) -> String {
    let trimmed = s.trim();
    if let Some(pos) = trimmed.find(' ') {
        let prefix = &trimmed[..pos];
        if prefix.len() >= 4 && prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return trimmed[pos + 1..].trim().to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bpftrace_blocks() {
        let input = b"@[\n    leaf_func\n    mid_func\n    root_func\n]: 42\n@[\n    other\n]: 7\n";
        let profile = parse(input).unwrap();
        assert_eq!(profile.format, SourceFormat::PerfScript);

        let root = profile.spans().find(|s| s.name == "root_func").unwrap();
        assert_eq!(root.depth, 0);
        assert_eq!(root.duration_us(), 42);
        let leaf = profile.spans().find(|s| s.name == "leaf_func").unwrap();
        assert_eq!(leaf.depth, 2);
        let other = profile.spans().find(|s| s.name == "other").unwrap();
        assert_eq!(other.start_us, 42);
        assert_eq!(other.duration_us(), 7);
        profile.validate().unwrap();
    }

    #[test]
    fn perf_script_stacks() {
        let input = b"process 1234 12345.678: 1 cycles:\n\tffffffff810a func_a+0x10 (/lib/mod)\n\tffffffff810b func_b+0x20 (/lib/mod)\n\n";
        let profile = parse(input).unwrap();
        assert_eq!(profile.span_count(), 2);
        // Leaf-first input: func_b is the caller after reversal.
        let b = profile.spans().find(|s| s.name == "func_b").unwrap();
        assert_eq!(b.depth, 0);
        let a = profile.spans().find(|s| s.name == "func_a").unwrap();
        assert_eq!(a.depth, 1);
        profile.validate().unwrap();
    }

    #[test]
    fn identical_consecutive_script_stacks_merge() {
        let input = b"p 1 1.0: cycles:\n\taaaa outer+0x1 (m)\n\n p 1 1.1: cycles:\n\taaaa outer+0x2 (m)\n\n";
        let profile = parse(input).unwrap();
        assert_eq!(profile.span_count(), 1);
        assert_eq!(profile.spans().next().unwrap().duration_us(), 2);
    }

    #[test]
    fn unterminated_block_is_truncated() {
        assert!(matches!(
            parse(b"@[\n    func\n"),
            Err(ParseError::Truncated(_))
        ));
    }

    #[test]
    fn strip_address_only_strips_hex() {
        assert_eq!(strip_address("ffffffff810a func_name"), "func_name");
        assert_eq!(strip_address("regular_name"), "regular_name");
    }

    #[test]
    fn empty_input_errors() {
        assert!(matches!(parse(b""), Err(ParseError::InvalidFormat(_))));
    }
}
