//! Stable JSON export of the normalized model.
//!
//! Schema: a top-level object tagged `"traceviz": <version>`, carrying
//! either `"profile"` or `"session"`. The body mirrors the model types
//! field-for-field, so load → export → load is lossless. The sniffer
//! recognizes the tag and routes exported files back through [`import`].

use serde::{Deserialize, Serialize};

use super::ExportError;
use crate::model::{Profile, Session};
use crate::parsers::ParseError;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct ExportDoc<'a> {
    traceviz: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<&'a Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a Session>,
}

#[derive(Deserialize)]
struct ImportDoc {
    traceviz: u32,
    #[serde(default)]
    profile: Option<Profile>,
    #[serde(default)]
    session: Option<Session>,
}

pub fn export_profile(profile: &Profile) -> Result<String, ExportError> {
    serde_json::to_string(&ExportDoc {
        traceviz: SCHEMA_VERSION,
        profile: Some(profile),
        session: None,
    })
    .map_err(|e| ExportError::SerializationFailed(e.to_string()))
}

pub fn export_session(session: &Session) -> Result<String, ExportError> {
    serde_json::to_string(&ExportDoc {
        traceviz: SCHEMA_VERSION,
        profile: None,
        session: Some(session),
    })
    .map_err(|e| ExportError::SerializationFailed(e.to_string()))
}

/// Load a single profile back from an export. Session documents resolve
/// only when they hold exactly one profile; use [`import_session`]
/// otherwise.
pub fn import(data: &[u8]) -> Result<Profile, ParseError> {
    let doc: ImportDoc = serde_json::from_slice(data).map_err(ParseError::from_json)?;
    if doc.traceviz > SCHEMA_VERSION {
        return Err(ParseError::InvalidFormat(format!(
            "traceviz export schema v{} is newer than supported v{SCHEMA_VERSION}",
            doc.traceviz
        )));
    }
    if let Some(profile) = doc.profile {
        profile
            .validate()
            .map_err(|v| ParseError::InvalidFormat(format!("export violates model: {v}")))?;
        return Ok(profile);
    }
    if let Some(session) = doc.session {
        let mut profiles: Vec<Profile> =
            session.entries().iter().map(|e| e.profile.clone()).collect();
        if profiles.len() == 1 {
            return Ok(profiles.remove(0));
        }
        return Err(ParseError::InvalidFormat(format!(
            "session export holds {} profiles; import it as a session",
            profiles.len()
        )));
    }
    Err(ParseError::InvalidFormat(
        "traceviz document has neither profile nor session".into(),
    ))
}

/// Load a full session export.
pub fn import_session(data: &[u8]) -> Result<Session, ParseError> {
    let doc: ImportDoc = serde_json::from_slice(data).map_err(ParseError::from_json)?;
    match doc.session {
        Some(session) => Ok(session),
        None => Err(ParseError::InvalidFormat(
            "traceviz document has no session".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceFormat, SpanFlags};
    use crate::parsers::assemble::ProfileAssembler;

    fn profile() -> Profile {
        let mut asm = ProfileAssembler::new();
        let t = asm.thread((1, 1), "Main");
        asm.complete(t, 0, 1000, "A", Some("js"), SpanFlags::NONE);
        asm.complete(t, 100, 400, "B", None, SpanFlags::NONE);
        asm.finish(SourceFormat::ChromeTrace, Some("cap".into()))
    }

    #[test]
    fn profile_round_trip_is_lossless() {
        let original = profile();
        let json = export_profile(&original).unwrap();
        let reloaded = import(json.as_bytes()).unwrap();

        assert_eq!(reloaded.format, original.format);
        assert_eq!(reloaded.name, original.name);
        assert_eq!(reloaded.span_count(), original.span_count());
        assert_eq!(reloaded.start_us, original.start_us);
        assert_eq!(reloaded.end_us, original.end_us);
        for (a, b) in original.spans().zip(reloaded.spans()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.name, b.name);
            assert_eq!(a.start_us, b.start_us);
            assert_eq!(a.end_us, b.end_us);
            assert_eq!(a.self_us, b.self_us);
            assert_eq!(a.parent, b.parent);
            assert_eq!(a.first_child, b.first_child);
            assert_eq!(a.next_sibling, b.next_sibling);
            assert_eq!(a.depth, b.depth);
        }
        reloaded.validate().unwrap();
    }

    #[test]
    fn export_carries_schema_tag() {
        let json = export_profile(&profile()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["traceviz"], SCHEMA_VERSION);
        assert!(value["profile"].is_object());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let json = r#"{"traceviz": 999, "profile": null}"#;
        assert!(matches!(
            import(json.as_bytes()),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn session_round_trip() {
        let mut session = Session::new();
        session.add(profile(), "one");
        session.add(profile(), "two");
        let json = export_session(&session).unwrap();
        let reloaded = import_session(json.as_bytes()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.entries()[0].label, "one");

        // Single-profile imports refuse ambiguous multi-profile documents.
        assert!(import(json.as_bytes()).is_err());
    }
}
