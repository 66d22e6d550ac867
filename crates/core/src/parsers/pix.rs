//! PIX timing-capture JSON exports (GPU/CPU event trees).
//!
//! Covers the common export subset: an `events` array of nested regions
//! with `start` plus either `end` or `duration`, optionally tagged with a
//! category or thread name. Native `.wpix` captures are out of scope.

use serde::Deserialize;

use super::assemble::{finalize_time_range, ProfileAssembler};
use super::ParseError;
use crate::model::{Profile, SourceFormat, SpanFlags};

#[derive(Debug, Deserialize)]
struct PixExport {
    #[serde(default)]
    events: Vec<PixEvent>,
    #[serde(default)]
    info: Option<PixInfo>,
}

#[derive(Debug, Deserialize)]
struct PixInfo {
    #[serde(default, rename = "captureTitle")]
    capture_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PixEvent {
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thread: Option<String>,
    #[serde(default)]
    children: Vec<PixEvent>,
}

pub fn parse(data: &[u8]) -> Result<Profile, ParseError> {
    let export: PixExport = serde_json::from_slice(data).map_err(ParseError::from_json)?;
    if export.events.is_empty() {
        return Err(ParseError::InvalidFormat("PIX export has no events".into()));
    }

    let mut asm = ProfileAssembler::new();
    for event in &export.events {
        let thread_name = event.thread.as_deref().unwrap_or("GPU");
        let key = fxhash(thread_name);
        let t = asm.thread((key, 0), thread_name);
        emit(event, t, &mut asm)?;
    }

    let mut profile = asm.finish(
        SourceFormat::Pix,
        export.info.and_then(|i| i.capture_title),
    );
    finalize_time_range(&mut profile);
    Ok(profile)
}

fn emit(event: &PixEvent, t: usize, asm: &mut ProfileAssembler) -> Result<(), ParseError> {
    let start = event.start.round() as i64;
    let end = event
        .end
        .or_else(|| event.duration.map(|d| event.start + d))
        .unwrap_or(event.start)
        .round() as i64;
    if end < start {
        return Err(ParseError::InconsistentTimestamps {
            format: SourceFormat::Pix,
            detail: format!("event {:?} ends before it starts", event.name),
        });
    }
    asm.complete(
        t,
        start,
        end,
        &event.name,
        event.category.as_deref(),
        SpanFlags::NONE,
    );
    for child in &event.children {
        emit(child, t, asm)?;
    }
    Ok(())
}

/// FNV-1a, used only to key threads by name.
fn fxhash(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
