// TUI widget modules for each dashboard zone.

pub mod card;
pub mod content;
pub mod grid;
pub mod help_bar;
pub mod status_bar;

use ratatui::style::Color;

use hwdash_core::theme::{Rgba, ThemeStore};

/// Terminal color for a theme color. Alpha is dropped; terminals have no
/// blending.
pub fn to_color(rgba: Rgba) -> Color {
    Color::Rgb(rgba.r, rgba.g, rgba.b)
}

/// Shorthand for looking a key up in the current theme.
pub fn theme_color(themes: &ThemeStore, key: &str) -> Color {
    to_color(themes.color_for(key))
}
