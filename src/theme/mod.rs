use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

/// Live view of the platform color-scheme preference. Never cache its answer.
pub trait ThemeSource {
    fn prefers_dark(&self) -> bool;
}

/// Shared color-scheme cell; every clone observes `set_scheme` immediately.
#[derive(Debug, Clone, Default)]
pub struct SystemTheme {
    dark: Rc<Cell<bool>>,
}

impl SystemTheme {
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            dark: Rc::new(Cell::new(scheme == ColorScheme::Dark)),
        }
    }

    pub fn scheme(&self) -> ColorScheme {
        if self.dark.get() {
            ColorScheme::Dark
        } else {
            ColorScheme::Light
        }
    }

    /// Returns true when the scheme actually changed.
    pub fn set_scheme(&self, scheme: ColorScheme) -> bool {
        let dark = scheme == ColorScheme::Dark;
        self.dark.replace(dark) != dark
    }
}

impl ThemeSource for SystemTheme {
    fn prefers_dark(&self) -> bool {
        self.dark.get()
    }
}

/// Colors used by the popup surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupPalette {
    pub scheme: ColorScheme,
    pub background: &'static str,
    pub foreground: &'static str,
    pub secondary_foreground: &'static str,
    pub secondary_background: &'static str,
    pub border: &'static str,
    pub key_border: &'static str,
    pub modifier_background: &'static str,
}

const LIGHT_PALETTE: PopupPalette = PopupPalette {
    scheme: ColorScheme::Light,
    background: "#ffffff",
    foreground: "#1a1a1a",
    secondary_foreground: "#1a1a1a",
    secondary_background: "#e8e8e8",
    border: "#00000020",
    key_border: "#cccccc",
    modifier_background: "#e0e0e0",
};

const DARK_PALETTE: PopupPalette = PopupPalette {
    scheme: ColorScheme::Dark,
    background: "#000000",
    foreground: "#f0f0f0",
    secondary_foreground: "#f0f0f0",
    secondary_background: "#282828",
    border: "#ffffff30",
    key_border: "#cccccc",
    modifier_background: "#333333",
};

/// The popup only goes dark when the filter is globally on and the system is dark.
pub fn popup_palette(global_enabled: bool, system_dark: bool) -> PopupPalette {
    if global_enabled && system_dark {
        DARK_PALETTE
    } else {
        LIGHT_PALETTE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_theme_clones_share_live_state() {
        let theme = SystemTheme::new(ColorScheme::Light);
        let observer = theme.clone();
        assert!(!observer.prefers_dark());

        assert!(theme.set_scheme(ColorScheme::Dark));
        assert!(observer.prefers_dark());
        assert_eq!(observer.scheme(), ColorScheme::Dark);
        assert!(!theme.set_scheme(ColorScheme::Dark));
    }

    #[test]
    fn popup_palette_requires_global_enabled_and_dark_system() {
        assert_eq!(popup_palette(true, true).scheme, ColorScheme::Dark);
        assert_eq!(popup_palette(false, true).scheme, ColorScheme::Light);
        assert_eq!(popup_palette(true, false).scheme, ColorScheme::Light);
        assert_eq!(popup_palette(true, true).background, "#000000");
        assert_eq!(popup_palette(false, false).key_border, "#cccccc");
    }
}
