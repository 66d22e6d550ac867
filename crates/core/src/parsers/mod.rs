//! Format detection and parsing.
//!
//! Every parser produces a fully built [`Profile`] or an error — there are
//! no partial results. Detection is content sniffing only: magic bytes for
//! binary containers, top-level shape for the JSON formats, line heuristics
//! for the text formats.

pub mod assemble;
pub mod chrome;
pub mod collapsed;
pub mod gecko;
pub mod perf;
pub mod pix;
pub mod pprof;
pub mod react;
pub mod speedscope;
pub mod tracy;
pub mod v8;

use thiserror::Error;

use crate::model::{Profile, SourceFormat};

#[derive(Debug, Error)]
pub enum ParseError {
    /// Sniffing rejected the input, or a recognized format was malformed.
    #[error("invalid profile data: {0}")]
    InvalidFormat(String),
    /// Input stopped mid-structure.
    #[error("truncated profile data: {0}")]
    Truncated(String),
    #[error("{format}: unsupported capture variant: {detail}")]
    UnsupportedVersion { format: SourceFormat, detail: String },
    #[error("{format}: inconsistent timestamps: {detail}")]
    InconsistentTimestamps { format: SourceFormat, detail: String },
    #[error("{format}: span tree construction failed: {detail}")]
    TreeConstructionFailed { format: SourceFormat, detail: String },
}

impl ParseError {
    /// Map a serde_json failure onto the protocol-level error kinds.
    pub(crate) fn from_json(err: serde_json::Error) -> Self {
        if err.is_eof() {
            Self::Truncated(err.to_string())
        } else {
            Self::InvalidFormat(err.to_string())
        }
    }
}

/// What a format can contribute to the model. PIX and Tracy cover the
/// common subset of their tools' exports, not the full protocol matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatCaps {
    pub spans: bool,
    pub counters: bool,
    pub markers: bool,
    pub async_spans: bool,
    pub frames: bool,
    pub flows: bool,
    /// False when only a documented subset of the tool's output is handled.
    pub complete: bool,
}

pub fn format_caps(format: SourceFormat) -> FormatCaps {
    let spans_only = FormatCaps {
        spans: true,
        counters: false,
        markers: false,
        async_spans: false,
        frames: false,
        flows: false,
        complete: true,
    };
    match format {
        SourceFormat::ChromeTrace => FormatCaps {
            counters: true,
            markers: true,
            async_spans: true,
            frames: true,
            flows: true,
            ..spans_only
        },
        SourceFormat::FirefoxGecko => FormatCaps {
            markers: true,
            ..spans_only
        },
        SourceFormat::ReactDevtools => FormatCaps {
            frames: true,
            ..spans_only
        },
        SourceFormat::Pix | SourceFormat::Tracy => FormatCaps {
            complete: false,
            ..spans_only
        },
        SourceFormat::Speedscope
        | SourceFormat::V8CpuProfile
        | SourceFormat::Pprof
        | SourceFormat::PerfScript
        | SourceFormat::CollapsedStacks => spans_only,
    }
}

/// Sniff the format and parse.
pub fn parse_bytes(data: &[u8]) -> Result<Profile, ParseError> {
    // Binary containers first: gzip magic means a pprof wire profile.
    if data.starts_with(&[0x1f, 0x8b]) {
        return pprof::parse_gzipped(data);
    }

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        if let Some(obj) = value.as_object() {
            // Our own export schema round-trips through the normal path.
            if obj.contains_key("traceviz") {
                return crate::export::json::import(data);
            }

            if obj
                .get("$schema")
                .and_then(|v| v.as_str())
                .is_some_and(|s| s.contains("speedscope"))
                || (obj.contains_key("shared") && obj.contains_key("profiles"))
            {
                return speedscope::parse(data);
            }

            if obj.contains_key("dataForRoots") {
                return react::parse(data);
            }

            if let Some(threads) = obj.get("threads").and_then(|v| v.as_array()) {
                if threads.iter().any(|t| t.get("zones").is_some()) {
                    return tracy::parse(data);
                }
                if threads
                    .iter()
                    .any(|t| t.get("stackTable").is_some() || t.get("frameTable").is_some())
                {
                    return gecko::parse(data);
                }
            }

            if let Some(events) = obj.get("events").and_then(|v| v.as_array())
                && events.iter().any(|e| e.get("start").is_some())
            {
                return pix::parse(data);
            }

            if obj.contains_key("samples")
                && obj.contains_key("locations")
                && obj.contains_key("functions")
            {
                return pprof::parse_json(data);
            }

            if obj.contains_key("nodes")
                && (obj.contains_key("samples") || obj.contains_key("startTime"))
            {
                return v8::parse(data);
            }

            if obj.contains_key("traceEvents") {
                return chrome::parse(data);
            }
        }

        if let Some(arr) = value.as_array()
            && arr.iter().any(|v| v.get("ph").is_some())
        {
            return chrome::parse(data);
        }

        return Err(ParseError::InvalidFormat(
            "JSON input does not match any known profile shape".into(),
        ));
    }

    // Text formats.
    if let Ok(text) = std::str::from_utf8(data) {
        if perf::looks_like(text) {
            return perf::parse(data);
        }
        if collapsed::looks_like(text) {
            return collapsed::parse(data);
        }
    }

    Err(ParseError::InvalidFormat(
        "unable to detect profile format".into(),
    ))
}
