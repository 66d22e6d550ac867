use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::token::ThemeToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// A total mapping token → color. Themes are plain data: one lookup table,
/// no branching on token names anywhere else in the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    table: [Rgba; ThemeToken::COUNT],
}

impl Theme {
    #[inline]
    pub fn color(&self, token: ThemeToken) -> Rgba {
        self.table[token.index()]
    }

    pub fn variant(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Dark => Self::dark(),
            ThemeVariant::Light => Self::light(),
        }
    }

    /// Dark palette (Catppuccin Mocha).
    pub fn dark() -> Self {
        use ThemeToken as T;
        let mut table = [Rgba::opaque(255, 0, 255); ThemeToken::COUNT];
        let mut set = |t: T, c: Rgba| table[t.index()] = c;

        set(T::Background, Rgba::opaque(17, 17, 27));
        set(T::Surface, Rgba::opaque(24, 24, 37));
        set(T::Border, Rgba::opaque(49, 50, 68));
        set(T::TextPrimary, Rgba::opaque(205, 214, 244));
        set(T::TextSecondary, Rgba::opaque(186, 194, 222));
        set(T::TextMuted, Rgba::opaque(166, 173, 200));
        set(T::LaneBackground, Rgba::opaque(30, 30, 46));
        set(T::LaneBorder, Rgba::opaque(49, 50, 68));
        set(T::LaneHeaderBackground, Rgba::opaque(24, 24, 37));
        set(T::LaneHeaderText, Rgba::opaque(205, 214, 244));
        set(T::FlameHot, Rgba::opaque(243, 139, 168));
        set(T::FlameWarm, Rgba::opaque(250, 179, 135));
        set(T::FlameCold, Rgba::opaque(137, 180, 250));
        set(T::FlameNeutral, Rgba::opaque(203, 166, 247));
        set(T::SelectionHighlight, Rgba::opaque(137, 180, 250));
        set(T::HoverHighlight, Rgba::opaque(205, 214, 244));
        set(T::SearchHighlight, Rgba::new(249, 226, 175, 110));
        set(T::ToolbarBackground, Rgba::opaque(24, 24, 37));
        set(T::ToolbarText, Rgba::opaque(205, 214, 244));
        set(T::ToolbarTabActive, Rgba::opaque(137, 180, 250));
        set(T::ToolbarTabHover, Rgba::opaque(205, 214, 244));
        set(T::MinimapBackground, Rgba::opaque(17, 17, 27));
        set(T::MinimapViewport, Rgba::new(137, 180, 250, 96));
        set(T::TableRowEven, Rgba::opaque(30, 30, 46));
        set(T::TableRowOdd, Rgba::opaque(24, 24, 37));
        set(T::TableHeaderBackground, Rgba::opaque(49, 50, 68));
        set(T::TableBorder, Rgba::opaque(69, 71, 90));
        set(T::BarFill, Rgba::opaque(137, 180, 250));
        set(T::CounterFill, Rgba::opaque(116, 199, 236));
        set(T::CounterLine, Rgba::opaque(116, 199, 236));
        set(T::CounterText, Rgba::opaque(186, 194, 222));
        set(T::MarkerLine, Rgba::opaque(249, 226, 175));
        set(T::MarkerText, Rgba::opaque(249, 226, 175));
        set(T::AsyncSpanFill, Rgba::opaque(148, 226, 213));
        set(T::AsyncSpanBorder, Rgba::opaque(116, 199, 236));
        set(T::FrameGood, Rgba::opaque(166, 227, 161));
        set(T::FrameWarning, Rgba::opaque(249, 226, 175));
        set(T::FrameDropped, Rgba::opaque(243, 139, 168));
        set(T::FlowArrow, Rgba::opaque(108, 112, 134));
        set(T::NetworkBar, Rgba::opaque(137, 220, 235));
        set(T::NetworkTtfb, Rgba::opaque(180, 190, 254));

        Self { table }
    }

    /// Light palette.
    pub fn light() -> Self {
        use ThemeToken as T;
        let mut table = [Rgba::opaque(255, 0, 255); ThemeToken::COUNT];
        let mut set = |t: T, c: Rgba| table[t.index()] = c;

        set(T::Background, Rgba::opaque(255, 255, 255));
        set(T::Surface, Rgba::opaque(245, 245, 248));
        set(T::Border, Rgba::opaque(210, 210, 220));
        set(T::TextPrimary, Rgba::opaque(20, 20, 30));
        set(T::TextSecondary, Rgba::opaque(80, 80, 100));
        set(T::TextMuted, Rgba::opaque(100, 100, 110));
        set(T::LaneBackground, Rgba::opaque(250, 250, 252));
        set(T::LaneBorder, Rgba::opaque(210, 210, 220));
        set(T::LaneHeaderBackground, Rgba::opaque(240, 240, 245));
        set(T::LaneHeaderText, Rgba::opaque(40, 40, 50));
        set(T::FlameHot, Rgba::opaque(220, 60, 20));
        set(T::FlameWarm, Rgba::opaque(230, 150, 20));
        set(T::FlameCold, Rgba::opaque(40, 120, 200));
        set(T::FlameNeutral, Rgba::opaque(120, 140, 170));
        set(T::SelectionHighlight, Rgba::opaque(66, 135, 245));
        set(T::HoverHighlight, Rgba::opaque(0, 0, 0));
        set(T::SearchHighlight, Rgba::new(255, 200, 50, 110));
        set(T::ToolbarBackground, Rgba::opaque(248, 248, 250));
        set(T::ToolbarText, Rgba::opaque(40, 40, 50));
        set(T::ToolbarTabActive, Rgba::opaque(50, 110, 220));
        set(T::ToolbarTabHover, Rgba::opaque(0, 0, 0));
        set(T::MinimapBackground, Rgba::opaque(240, 240, 245));
        set(T::MinimapViewport, Rgba::new(50, 110, 220, 96));
        set(T::TableRowEven, Rgba::opaque(255, 255, 255));
        set(T::TableRowOdd, Rgba::opaque(245, 245, 248));
        set(T::TableHeaderBackground, Rgba::opaque(235, 235, 240));
        set(T::TableBorder, Rgba::opaque(210, 210, 220));
        set(T::BarFill, Rgba::opaque(50, 110, 220));
        set(T::CounterFill, Rgba::opaque(50, 110, 220));
        set(T::CounterLine, Rgba::opaque(50, 110, 220));
        set(T::CounterText, Rgba::opaque(80, 80, 100));
        set(T::MarkerLine, Rgba::opaque(200, 150, 20));
        set(T::MarkerText, Rgba::opaque(150, 100, 10));
        set(T::AsyncSpanFill, Rgba::opaque(80, 140, 200));
        set(T::AsyncSpanBorder, Rgba::opaque(50, 110, 180));
        set(T::FrameGood, Rgba::opaque(56, 142, 60));
        set(T::FrameWarning, Rgba::opaque(230, 170, 0));
        set(T::FrameDropped, Rgba::opaque(211, 47, 47));
        set(T::FlowArrow, Rgba::opaque(50, 120, 220));
        set(T::NetworkBar, Rgba::opaque(20, 140, 160));
        set(T::NetworkTtfb, Rgba::opaque(90, 90, 200));

        Self { table }
    }
}
