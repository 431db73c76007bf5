// Card grid widget: cards, "+" affordances and the gesture preview.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;

use hwdash_core::geometry::GridGeometry;
use hwdash_core::grid::GridRect;
use hwdash_core::theme::ThemeStore;

use super::card::{self, CardChrome};
use super::theme_color;
use crate::app::App;
use crate::tui::layout::cell_rect;

/// Hint shown when there is nothing to draw.
pub const EMPTY_HINT: &str = "No cards. Press e to edit, n to add one.";

/// Render the board into `area` using the geometry of this frame.
pub fn render(frame: &mut Frame, area: Rect, app: &App, geometry: &GridGeometry) {
    let themes = &app.themes;
    let board = &app.board;
    let background = theme_color(themes, "background");
    frame.render_widget(Block::default().style(Style::default().bg(background)), area);

    if board.cards().is_empty() && !board.edit_mode() {
        let hint = Paragraph::new(Line::from(Span::styled(
            EMPTY_HINT,
            Style::default().fg(theme_color(themes, "text_small")),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(hint, area);
        return;
    }

    for coord in board.affordance_cells() {
        let rect = cell_rect(geometry, &GridRect::unit(coord.row, coord.col), area);
        render_affordance(frame, rect, themes);
    }

    let active = board.interaction().active_card();
    for card in board.cards() {
        let rect = cell_rect(geometry, &card.rect, area);
        let reading = card.metric.and_then(|metric| app.feed.reading(metric));
        let chrome = CardChrome {
            edit_mode: board.edit_mode(),
            active: active == Some(card.id),
        };
        card::render(frame, rect, card, reading, themes, chrome);
    }

    if let Some(preview) = board.interaction().preview() {
        let rect = cell_rect(geometry, &preview, area);
        let outline = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(theme_color(themes, "preview")));
        frame.render_widget(outline, rect);
    }
}

fn render_affordance(frame: &mut Frame, area: Rect, themes: &ThemeStore) {
    if area.is_empty() {
        return;
    }
    let color = theme_color(themes, "add_button");
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(theme_color(themes, "chart_legend")));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::default(); usize::from(inner.height.saturating_sub(1) / 2)];
    lines.push(Line::from(Span::styled(
        "+",
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )));
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwdash_core::board::Board;
    use hwdash_core::card::{CardSpec, ContentKind};
    use hwdash_core::metrics::{MetricKind, MetricsFeed};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::tui::layout::{display_size, grid_geometry};

    fn app_with_card() -> App {
        let mut feed = MetricsFeed::detached(8);
        let mut board = Board::new(false);
        board.add_card(
            CardSpec::new(ContentKind::Text, MetricKind::Cpu, GridRect::unit(0, 0)),
            &mut feed,
        );
        App::new(
            board,
            feed,
            ThemeStore::builtin(),
            std::env::temp_dir().join("hwdash_grid_widget.txt"),
        )
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(40, 20)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                let geometry = grid_geometry(area, display_size(&app.board), 1);
                render(frame, area, app, &geometry);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn empty_board_shows_hint() {
        let app = App::new(
            Board::new(true),
            MetricsFeed::detached(8),
            ThemeStore::builtin(),
            std::env::temp_dir().join("hwdash_grid_widget.txt"),
        );
        assert!(draw(&app).contains("No cards"));
    }

    #[test]
    fn edit_mode_draws_affordances() {
        let mut app = app_with_card();
        assert!(!draw(&app).contains('+'));
        app.board.set_edit_mode(true);
        let text = draw(&app);
        assert!(text.contains('+'));
        assert!(text.contains("CPU"));
    }

    #[test]
    fn preview_outline_is_drawn_during_drag() {
        let mut app = app_with_card();
        app.board.set_edit_mode(true);
        let id = app.board.cards()[0].id;
        app.board.begin_drag(id);
        let size = display_size(&app.board);
        let geometry = grid_geometry(Rect::new(0, 0, 40, 20), size, 1);
        app.board.drag_to(&geometry, 30.0, 5.0);
        assert!(app.board.interaction().preview().is_some());
        assert!(draw(&app).contains('═'));
    }
}
