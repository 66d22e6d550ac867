//! Span → theme-token selection.

use serde::{Deserialize, Serialize};
use traceviz_protocol::ThemeToken;

use crate::model::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    /// Hash the span name onto a fixed ramp, so a symbol keeps its hue
    /// across frames, views, and zoom levels.
    #[default]
    ByName,
    /// Cycle the ramp by stack depth.
    ByDepth,
}

/// Hue ramp for `ByName`; six tokens that resolve to distinct hues in both
/// built-in themes.
pub const NAME_RAMP: [ThemeToken; 6] = [
    ThemeToken::FlameHot,
    ThemeToken::FlameWarm,
    ThemeToken::FlameCold,
    ThemeToken::FlameNeutral,
    ThemeToken::CounterFill,
    ThemeToken::AsyncSpanFill,
];

const DEPTH_RAMP: [ThemeToken; 4] = [
    ThemeToken::FlameHot,
    ThemeToken::FlameWarm,
    ThemeToken::FlameCold,
    ThemeToken::FlameNeutral,
];

pub fn span_token(span: &Span, mode: ColorMode) -> ThemeToken {
    token_for(
        &span.name,
        span.depth,
        span.category.as_ref().map(|c| c.as_str()),
        mode,
    )
}

pub fn token_for(name: &str, depth: u16, category: Option<&str>, mode: ColorMode) -> ThemeToken {
    if let Some(token) = category.and_then(category_token) {
        return token;
    }
    match mode {
        ColorMode::ByName => NAME_RAMP[(fnv1a(name) % NAME_RAMP.len() as u64) as usize],
        ColorMode::ByDepth => DEPTH_RAMP[(depth as usize) % DEPTH_RAMP.len()],
    }
}

/// Well-known categories pin their hue regardless of mode.
fn category_token(category: &str) -> Option<ThemeToken> {
    let lower = category.to_ascii_lowercase();
    if lower.contains("gc") {
        Some(ThemeToken::FlameHot)
    } else if lower.contains("layout") || lower.contains("paint") {
        Some(ThemeToken::FlameWarm)
    } else if lower.contains("gpu") {
        Some(ThemeToken::FlameCold)
    } else if lower.starts_with("react") {
        Some(ThemeToken::FlameNeutral)
    } else {
        None
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_name_is_stable() {
        let a = token_for("renderFrame", 0, None, ColorMode::ByName);
        let b = token_for("renderFrame", 7, None, ColorMode::ByName);
        assert_eq!(a, b, "depth must not affect ByName");
    }

    #[test]
    fn by_depth_cycles() {
        let d0 = token_for("x", 0, None, ColorMode::ByDepth);
        let d4 = token_for("y", 4, None, ColorMode::ByDepth);
        assert_eq!(d0, d4);
        assert_ne!(
            token_for("x", 0, None, ColorMode::ByDepth),
            token_for("x", 1, None, ColorMode::ByDepth)
        );
    }

    #[test]
    fn category_overrides_both_modes() {
        assert_eq!(
            token_for("minor_gc", 3, Some("v8.gc"), ColorMode::ByName),
            ThemeToken::FlameHot
        );
        assert_eq!(
            token_for("minor_gc", 3, Some("v8.gc"), ColorMode::ByDepth),
            ThemeToken::FlameHot
        );
        assert_eq!(
            token_for("App", 0, Some("react.component.primary"), ColorMode::ByName),
            ThemeToken::FlameNeutral
        );
    }
}
