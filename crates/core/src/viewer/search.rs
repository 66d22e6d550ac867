//! Search state: ordered matches over the visible lanes' spans.

use std::collections::HashSet;

use traceviz_protocol::FrameId;

use crate::model::{ProfileHandle, Session};
use crate::views::SearchFilter;

#[derive(Debug, Default)]
pub struct SearchState {
    query: String,
    filter: SearchFilter,
    /// (profile, span) in span-start order, grouped by profile.
    matches: Vec<(ProfileHandle, FrameId)>,
    active: usize,
    total_count: usize,
}

impl SearchState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// The filter views use to dim/highlight, `None` when not searching.
    pub fn filter(&self) -> Option<&SearchFilter> {
        self.is_active().then_some(&self.filter)
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Spans considered by the last query.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_match(&self) -> Option<(ProfileHandle, FrameId)> {
        self.matches.get(self.active).copied()
    }

    /// Recompute the match list. `visible_profiles` are the handles with at
    /// least one visible lane; an empty query clears everything.
    pub fn set_query(
        &mut self,
        query: &str,
        session: &Session,
        visible_profiles: &HashSet<ProfileHandle>,
    ) {
        self.query = query.to_string();
        self.filter = SearchFilter::new(query);
        self.matches.clear();
        self.active = 0;
        self.total_count = 0;

        if query.is_empty() {
            return;
        }

        for entry in session.entries() {
            if !visible_profiles.contains(&entry.handle) {
                continue;
            }
            self.total_count += entry.profile.span_count();
            let mut hits: Vec<FrameId> = entry
                .profile
                .spans()
                .filter(|s| self.filter.matches(&s.name))
                .map(|s| s.id)
                .collect();
            hits.sort_by_key(|id| entry.profile.span(*id).map(|s| s.start_us).unwrap_or(0));
            self.matches
                .extend(hits.into_iter().map(|id| (entry.handle, id)));
        }
    }

    /// Advance to the next match (wrapping). Returns the new active match.
    pub fn next(&mut self) -> Option<(ProfileHandle, FrameId)> {
        if self.matches.is_empty() {
            return None;
        }
        self.active = (self.active + 1) % self.matches.len();
        self.active_match()
    }

    /// Step back to the previous match (wrapping).
    pub fn prev(&mut self) -> Option<(ProfileHandle, FrameId)> {
        if self.matches.is_empty() {
            return None;
        }
        self.active = (self.active + self.matches.len() - 1) % self.matches.len();
        self.active_match()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceFormat, SpanFlags};
    use crate::parsers::assemble::ProfileAssembler;

    fn session() -> (Session, ProfileHandle) {
        let mut asm = ProfileAssembler::new();
        let t = asm.thread((0, 0), "Main");
        asm.complete(t, 0, 1000, "alpha", None, SpanFlags::NONE);
        asm.complete(t, 100, 400, "beta", None, SpanFlags::NONE);
        asm.complete(t, 500, 900, "alphabet", None, SpanFlags::NONE);
        let profile = asm.finish(SourceFormat::ChromeTrace, None);
        let mut session = Session::new();
        let handle = session.add(profile, "p");
        (session, handle)
    }

    #[test]
    fn substring_match_counts() {
        let (session, handle) = session();
        let visible = HashSet::from([handle]);
        let mut search = SearchState::default();
        search.set_query("alpha", &session, &visible);
        assert_eq!(search.match_count(), 2);
        assert_eq!(search.total_count(), 3);
        assert_eq!(search.active_index(), 0);
    }

    #[test]
    fn empty_query_clears() {
        let (session, handle) = session();
        let visible = HashSet::from([handle]);
        let mut search = SearchState::default();
        search.set_query("alpha", &session, &visible);
        search.set_query("", &session, &visible);
        assert_eq!(search.match_count(), 0);
        assert!(search.filter().is_none());
        assert!(!search.is_active());
    }

    #[test]
    fn next_and_prev_wrap() {
        let (session, handle) = session();
        let visible = HashSet::from([handle]);
        let mut search = SearchState::default();
        search.set_query("alpha", &session, &visible);

        let first = search.active_match().unwrap();
        let second = search.next().unwrap();
        assert_ne!(first.1, second.1);
        let wrapped = search.next().unwrap();
        assert_eq!(wrapped.1, first.1);
        let back = search.prev().unwrap();
        assert_eq!(back.1, second.1);
    }

    #[test]
    fn hidden_profiles_do_not_match() {
        let (session, _) = session();
        let visible = HashSet::new();
        let mut search = SearchState::default();
        search.set_query("alpha", &session, &visible);
        assert_eq!(search.match_count(), 0);
        assert_eq!(search.total_count(), 0);
    }
}
