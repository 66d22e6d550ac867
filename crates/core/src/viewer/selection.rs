//! Span selection and hierarchy navigation.

use serde::{Deserialize, Serialize};
use traceviz_protocol::{FrameId, Label};

use crate::model::{Profile, ProfileHandle};

/// The currently selected span plus cached display data, so hosts can
/// show details without another model lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedSpan {
    pub profile: ProfileHandle,
    pub frame_id: FrameId,
    pub lane_index: usize,
    pub name: Label,
    pub start_us: i64,
    pub end_us: i64,
}

impl SelectedSpan {
    pub fn resolve(
        profile: &Profile,
        handle: ProfileHandle,
        frame_id: FrameId,
        lane_index: usize,
    ) -> Option<Self> {
        let span = profile.span(frame_id)?;
        Some(Self {
            profile: handle,
            frame_id,
            lane_index,
            name: span.name.clone(),
            start_us: span.start_us,
            end_us: span.end_us,
        })
    }
}

/// Direction of a hierarchy step from the selected span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavDirection {
    Parent,
    FirstChild,
    NextSibling,
    PrevSibling,
}

/// Follow one arena link; `None` when there is nothing in that direction.
pub fn navigate(profile: &Profile, from: FrameId, direction: NavDirection) -> Option<FrameId> {
    match direction {
        NavDirection::Parent => profile.arena.parent(from),
        NavDirection::FirstChild => profile.arena.first_child(from),
        NavDirection::NextSibling => profile.arena.next_sibling(from),
        NavDirection::PrevSibling => profile.arena.prev_sibling(from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceFormat, SpanFlags};
    use crate::parsers::assemble::ProfileAssembler;

    fn profile() -> Profile {
        let mut asm = ProfileAssembler::new();
        let t = asm.thread((0, 0), "Main");
        asm.complete(t, 0, 1000, "root", None, SpanFlags::NONE);
        asm.complete(t, 0, 400, "left", None, SpanFlags::NONE);
        asm.complete(t, 500, 900, "right", None, SpanFlags::NONE);
        asm.finish(SourceFormat::ChromeTrace, None)
    }

    #[test]
    fn navigation_follows_links_in_all_directions() {
        let p = profile();
        let root = p.spans().find(|s| s.name == "root").unwrap().id;
        let left = p.spans().find(|s| s.name == "left").unwrap().id;
        let right = p.spans().find(|s| s.name == "right").unwrap().id;

        assert_eq!(navigate(&p, root, NavDirection::FirstChild), Some(left));
        assert_eq!(navigate(&p, left, NavDirection::NextSibling), Some(right));
        assert_eq!(navigate(&p, right, NavDirection::PrevSibling), Some(left));
        assert_eq!(navigate(&p, left, NavDirection::Parent), Some(root));

        assert_eq!(navigate(&p, root, NavDirection::Parent), None);
        assert_eq!(navigate(&p, left, NavDirection::PrevSibling), None);
        assert_eq!(navigate(&p, right, NavDirection::NextSibling), None);
        assert_eq!(navigate(&p, left, NavDirection::FirstChild), None);
    }

    #[test]
    fn resolve_caches_display_fields() {
        let p = profile();
        let left = p.spans().find(|s| s.name == "left").unwrap().id;
        let sel = SelectedSpan::resolve(&p, ProfileHandle(3), left, 1).unwrap();
        assert_eq!(sel.name, "left");
        assert_eq!(sel.start_us, 0);
        assert_eq!(sel.end_us, 400);
        assert_eq!(sel.profile, ProfileHandle(3));
        assert_eq!(sel.lane_index, 1);
    }
}
