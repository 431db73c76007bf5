// Status bar widget: theme, mode, grid size, new-card template, last message.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use hwdash_core::card::CardSpec;

use super::theme_color;
use crate::app::App;

/// Render the status bar into the given area.
///
/// Layout: [name] [mode] | theme | grid | template | message
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let themes = &app.themes;
    let text = theme_color(themes, "text_big");
    let dim = theme_color(themes, "text_small");
    let accent = theme_color(themes, "edit_mode_button");

    let mut spans = vec![Span::styled(
        " hwdash ",
        Style::default().fg(text).add_modifier(Modifier::BOLD),
    )];

    if app.board.edit_mode() {
        spans.push(Span::styled(
            "[EDIT] ",
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ));
    }

    let separator = || Span::styled(" | ", Style::default().fg(dim));
    spans.push(Span::styled(
        format!("theme {}", themes.current_name()),
        Style::default().fg(text),
    ));
    spans.push(separator());
    spans.push(Span::styled(
        format!("grid {}", app.board.grid().size()),
        Style::default().fg(text),
    ));
    spans.push(separator());
    spans.push(Span::styled(
        format!("new: {}", template_summary(&app.template)),
        Style::default().fg(text),
    ));

    if let Some(status) = &app.status {
        spans.push(separator());
        spans.push(Span::styled(status.clone(), Style::default().fg(accent)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(theme_color(themes, "card_background")));
    frame.render_widget(paragraph, area);
}

/// One-line description of the card the add action creates.
/// E.g. "circle cpu 1x2 A/B"
pub fn template_summary(template: &CardSpec) -> String {
    let metric = template.metric.map(|m| m.key()).unwrap_or("-");
    format!(
        "{} {} {}x{} {}/{}",
        template.kind.key(),
        metric,
        template.rect.row_span,
        template.rect.col_span,
        template.color_scheme.letter(),
        template.accent_scheme.letter(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
