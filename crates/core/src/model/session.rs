use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::profile::Profile;

/// Stable handle to a profile loaded into a [`Session`]. Handles are never
/// reused within a session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileHandle(pub u32);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown profile handle {0:?}")]
    UnknownProfileHandle(ProfileHandle),
    #[error("operation requires at least one loaded profile")]
    EmptySession,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub handle: ProfileHandle,
    pub label: String,
    /// Shift applied when mapping this profile onto the shared timeline.
    pub offset_us: i64,
    pub profile: Profile,
}

impl SessionEntry {
    /// Map a local timestamp onto the session timeline:
    /// `t − profile.start + offset`.
    #[inline]
    pub fn to_session_time(&self, local_us: i64) -> i64 {
        local_us - self.profile.start_us + self.offset_us
    }

    pub fn session_start_us(&self) -> i64 {
        self.offset_us
    }

    pub fn session_end_us(&self) -> i64 {
        self.offset_us + self.profile.duration_us()
    }
}

/// The ordered set of loaded profiles shown on one shared timeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    entries: Vec<SessionEntry>,
    next_handle: u32,
}

/// Flat summary handed to hosts (profile chooser UIs, status bars).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub profile_count: usize,
    pub start_us: i64,
    pub end_us: i64,
    pub profiles: Vec<SessionProfileInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProfileInfo {
    pub handle: ProfileHandle,
    pub label: String,
    pub offset_us: i64,
    pub span_count: usize,
    pub format: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-parsed profile at offset 0.
    pub fn add(&mut self, profile: Profile, label: impl Into<String>) -> ProfileHandle {
        let handle = ProfileHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(SessionEntry {
            handle,
            label: label.into(),
            offset_us: 0,
            profile,
        });
        handle
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn entry(&self, handle: ProfileHandle) -> Option<&SessionEntry> {
        self.entries.iter().find(|e| e.handle == handle)
    }

    pub fn profile(&self, handle: ProfileHandle) -> Option<&Profile> {
        self.entry(handle).map(|e| &e.profile)
    }

    pub fn set_offset(&mut self, handle: ProfileHandle, offset_us: i64) -> Result<(), SessionError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.handle == handle)
            .ok_or(SessionError::UnknownProfileHandle(handle))?;
        entry.offset_us = offset_us;
        Ok(())
    }

    /// Earliest aligned time across all profiles (0 for an empty session).
    pub fn start_us(&self) -> i64 {
        self.entries
            .iter()
            .map(SessionEntry::session_start_us)
            .min()
            .unwrap_or(0)
    }

    /// Latest aligned time across all profiles (0 for an empty session).
    pub fn end_us(&self) -> i64 {
        self.entries
            .iter()
            .map(SessionEntry::session_end_us)
            .max()
            .unwrap_or(0)
    }

    pub fn duration_us(&self) -> i64 {
        self.end_us() - self.start_us()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            profile_count: self.entries.len(),
            start_us: self.start_us(),
            end_us: self.end_us(),
            profiles: self
                .entries
                .iter()
                .map(|e| SessionProfileInfo {
                    handle: e.handle,
                    label: e.label.clone(),
                    offset_us: e.offset_us,
                    span_count: e.profile.span_count(),
                    format: e.profile.format.to_string(),
                })
                .collect(),
        }
    }
}
