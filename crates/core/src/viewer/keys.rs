//! Keyboard surface: a pure key → command map. Hosts translate their
//! event types into [`Key`] and feed the result back through
//! [`super::Viewer::apply`].

use crate::model::ViewType;
use crate::viewer::selection::NavDirection;
use crate::viewer::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Left,
    Right,
    Up,
    Down,
    Home,
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mods {
    pub shift: bool,
}

/// What a key press should do. Actions the core cannot perform (focusing
/// a text box, toggling host chrome) are surfaced as intents.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Command(Command),
    FocusSearch,
    ToggleLaneSidebar,
}

const PAN_STEP: f64 = 0.1;
const SCROLL_STEP: f32 = 50.0;
const ZOOM_STEP: f64 = 1.5;

pub fn action_for_key(key: Key, mods: Mods) -> Option<KeyAction> {
    use Command as C;
    let command = match key {
        Key::Left => C::Pan {
            fraction: -PAN_STEP,
        },
        Key::Right => C::Pan { fraction: PAN_STEP },
        Key::Up => C::ScrollVertical { dy: -SCROLL_STEP },
        Key::Down => C::ScrollVertical { dy: SCROLL_STEP },
        Key::Home => C::ResetZoom,
        Key::Enter if mods.shift => C::PrevSearchResult,
        Key::Enter => C::NextSearchResult,
        Key::Escape => C::ClearSelection,
        Key::Char(c) => match (c, mods.shift) {
            ('a', _) => C::Pan {
                fraction: -PAN_STEP,
            },
            ('d', _) => C::Pan { fraction: PAN_STEP },
            ('w', _) => C::ScrollVertical { dy: -SCROLL_STEP },
            ('s', _) => C::ScrollVertical { dy: SCROLL_STEP },
            ('+' | '=', _) => C::ZoomCentered { factor: ZOOM_STEP },
            ('-', _) => C::ZoomCentered {
                factor: 1.0 / ZOOM_STEP,
            },
            ('0', _) => C::ResetZoom,
            ('f', _) => C::Fit,
            ('z', _) => C::ZoomToSelection,
            ('t', _) => C::ToggleTheme,
            ('/', _) => return Some(KeyAction::FocusSearch),
            ('l', _) => return Some(KeyAction::ToggleLaneSidebar),
            ('[', true) => C::Navigate(NavDirection::PrevSibling),
            ('[', false) => C::Navigate(NavDirection::Parent),
            (']', true) => C::Navigate(NavDirection::NextSibling),
            (']', false) => C::Navigate(NavDirection::FirstChild),
            ('1', _) => C::SetAllViewTypes(ViewType::TimeOrder),
            ('2', _) => C::SetAllViewTypes(ViewType::LeftHeavy),
            ('3', _) => C::SetAllViewTypes(ViewType::Icicle),
            ('4', _) => C::SetAllViewTypes(ViewType::Sandwich),
            ('5', _) => C::SetAllViewTypes(ViewType::Ranked),
            _ => return None,
        },
    };
    Some(KeyAction::Command(command))
}
