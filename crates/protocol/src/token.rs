use serde::{Deserialize, Serialize};

/// Semantic color names. Every color in the system is one of these; the
/// active [`crate::Theme`] resolves them to [`crate::Rgba`] at the renderer
/// boundary, so switching themes never touches a command list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ThemeToken {
    Background,
    Surface,
    Border,

    TextPrimary,
    TextSecondary,
    TextMuted,

    LaneBackground,
    LaneBorder,
    LaneHeaderBackground,
    LaneHeaderText,

    FlameHot,
    FlameWarm,
    FlameCold,
    FlameNeutral,

    SelectionHighlight,
    HoverHighlight,
    SearchHighlight,

    ToolbarBackground,
    ToolbarText,
    ToolbarTabActive,
    ToolbarTabHover,

    MinimapBackground,
    MinimapViewport,

    TableRowEven,
    TableRowOdd,
    TableHeaderBackground,
    TableBorder,
    BarFill,

    CounterFill,
    CounterLine,
    CounterText,

    MarkerLine,
    MarkerText,

    AsyncSpanFill,
    AsyncSpanBorder,

    FrameGood,
    FrameWarning,
    FrameDropped,

    FlowArrow,

    NetworkBar,
    NetworkTtfb,
}

impl ThemeToken {
    pub const COUNT: usize = 41;

    /// All tokens in declaration order; indexes match [`Self::index`].
    pub const ALL: [ThemeToken; Self::COUNT] = [
        Self::Background,
        Self::Surface,
        Self::Border,
        Self::TextPrimary,
        Self::TextSecondary,
        Self::TextMuted,
        Self::LaneBackground,
        Self::LaneBorder,
        Self::LaneHeaderBackground,
        Self::LaneHeaderText,
        Self::FlameHot,
        Self::FlameWarm,
        Self::FlameCold,
        Self::FlameNeutral,
        Self::SelectionHighlight,
        Self::HoverHighlight,
        Self::SearchHighlight,
        Self::ToolbarBackground,
        Self::ToolbarText,
        Self::ToolbarTabActive,
        Self::ToolbarTabHover,
        Self::MinimapBackground,
        Self::MinimapViewport,
        Self::TableRowEven,
        Self::TableRowOdd,
        Self::TableHeaderBackground,
        Self::TableBorder,
        Self::BarFill,
        Self::CounterFill,
        Self::CounterLine,
        Self::CounterText,
        Self::MarkerLine,
        Self::MarkerText,
        Self::AsyncSpanFill,
        Self::AsyncSpanBorder,
        Self::FrameGood,
        Self::FrameWarning,
        Self::FrameDropped,
        Self::FlowArrow,
        Self::NetworkBar,
        Self::NetworkTtfb,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_covers_every_token_in_order() {
        assert_eq!(ThemeToken::ALL.len(), ThemeToken::COUNT);
        for (i, token) in ThemeToken::ALL.iter().enumerate() {
            assert_eq!(token.index(), i);
        }
    }
}
