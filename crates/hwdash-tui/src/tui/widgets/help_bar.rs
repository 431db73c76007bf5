// Help bar widget: keyboard shortcuts for the current mode.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use hwdash_core::theme::ThemeStore;

use super::theme_color;

const VIEW_KEYS: &[(&str, &str)] = &[
    ("e", "edit"),
    ("t", "theme"),
    ("s", "save"),
    ("q", "quit"),
];

const EDIT_KEYS: &[(&str, &str)] = &[
    ("e", "done"),
    ("n", "add"),
    ("k", "kind"),
    ("m", "metric"),
    ("c/a", "colors"),
    ("+/-", "width"),
    ("[/]", "height"),
    ("Esc", "cancel"),
    ("s", "save"),
    ("q", "quit"),
];

/// Shortcut list for the mode.
pub fn shortcuts(edit_mode: bool) -> &'static [(&'static str, &'static str)] {
    if edit_mode {
        EDIT_KEYS
    } else {
        VIEW_KEYS
    }
}

pub fn render(frame: &mut Frame, area: Rect, themes: &ThemeStore, edit_mode: bool) {
    let key_style = Style::default()
        .fg(theme_color(themes, "add_button"))
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(theme_color(themes, "text_small"));

    let mut spans = vec![Span::raw(" ")];
    for (key, label) in shortcuts(edit_mode) {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(format!(" {label}  "), label_style));
    }
    if edit_mode {
        spans.push(Span::styled(
            "drag body to move, border to resize",
            label_style,
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(theme_color(themes, "card_background")));
    frame.render_widget(paragraph, area);
}
