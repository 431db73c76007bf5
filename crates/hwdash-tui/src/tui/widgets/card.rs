// Card chrome: border, title, remove button and gesture highlight around the
// card's content.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders};
use ratatui::Frame;

use hwdash_core::card::{Card, ContentKind};
use hwdash_core::metrics::MetricReading;
use hwdash_core::theme::ThemeStore;

use super::content::{self, CardContent, CardPalette};
use super::theme_color;
use crate::tui::layout::remove_button_x;

/// Label drawn in the remove button. Its two columns line up with the
/// remove hit zone.
pub const REMOVE_LABEL: &str = " x";

/// How the card frame is decorated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardChrome {
    pub edit_mode: bool,
    /// The card is being dragged or resized.
    pub active: bool,
}

/// Render one card into `area`.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    card: &Card,
    reading: Option<MetricReading<'_>>,
    themes: &ThemeStore,
    chrome: CardChrome,
) {
    if area.is_empty() {
        return;
    }
    let content = CardContent::for_card(card);
    // Separators are invisible outside edit mode.
    if content == CardContent::Spacer && !chrome.edit_mode {
        return;
    }

    let palette = CardPalette::resolve(themes, card);
    let block = card_block(card, area, &palette, themes, chrome);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    content::render(frame, inner, content, reading, &palette);
}

fn card_block<'a>(
    card: &Card,
    area: Rect,
    palette: &CardPalette,
    themes: &ThemeStore,
    chrome: CardChrome,
) -> Block<'a> {
    let border_color = if chrome.active {
        theme_color(themes, "preview")
    } else if chrome.edit_mode {
        theme_color(themes, "edit_mode_button")
    } else {
        palette.legend
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(palette.background));
    if chrome.active {
        block = block.border_type(BorderType::Thick);
    }

    let title = match card.kind {
        ContentKind::Separator => "separator",
        _ => card.title(),
    };
    if !title.is_empty() {
        block = block.title(Line::from(Span::styled(
            format!(" {title} "),
            Style::default().fg(palette.text_small),
        )));
    }

    if chrome.edit_mode && remove_button_x(area).is_some() {
        block = block.title(
            Line::from(Span::styled(
                REMOVE_LABEL,
                Style::default()
                    .fg(theme_color(themes, "edit_mode_button"))
                    .add_modifier(Modifier::BOLD),
            ))
            .right_aligned(),
        );
    }
    block
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
