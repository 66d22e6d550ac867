use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// Stable identifier of a span within one profile.
///
/// Zero is reserved to mean "no span" on wire formats, so the inner value
/// is non-zero and `Option<FrameId>` costs nothing over a bare u64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(NonZeroU64);

impl FrameId {
    /// Id for the span stored at `index` in its profile's arena.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        // index + 1 never wraps to zero for any realistic arena size
        Self(NonZeroU64::new(index as u64 + 1).expect("index overflow"))
    }

    /// Arena slot this id refers to.
    #[inline]
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Decode a wire value where zero means none.
    #[inline]
    pub fn from_wire(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip() {
        let id = FrameId::from_index(41);
        assert_eq!(id.get(), 42);
        assert_eq!(id.index(), 41);
    }

    #[test]
    fn zero_wire_value_is_none() {
        assert!(FrameId::from_wire(0).is_none());
        assert_eq!(FrameId::from_wire(7), Some(FrameId::from_index(6)));
    }

    #[test]
    fn option_is_free() {
        assert_eq!(
            std::mem::size_of::<Option<FrameId>>(),
            std::mem::size_of::<u64>()
        );
    }
}
