// Integration tests for an interactive editing session.
//
// Drives the app the way the event loop does: key and mouse events go through
// the input layer, commands are applied to the app, and frames are drawn to a
// `TestBackend` so pointer positions resolve against real geometry.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

use hwdash::app::App;
use hwdash::tui::{input, render_frame, ViewState};
use hwdash_core::board::Board;
use hwdash_core::card::ContentKind;
use hwdash_core::grid::{GridCoord, GridRect, GridSize};
use hwdash_core::layout;
use hwdash_core::metrics::{MetricKind, MetricsFeed};
use hwdash_core::theme::ThemeStore;

// ===========================================================================
// Test helpers
// ===========================================================================

struct Session {
    app: App,
    view_state: ViewState,
    terminal: Terminal<TestBackend>,
}

impl Session {
    /// 60x22 terminal: the grid gets (0, 1, 60, 20).
    fn new(layout_name: &str) -> Self {
        let app = App::new(
            Board::new(true),
            MetricsFeed::detached(8),
            ThemeStore::builtin(),
            std::env::temp_dir().join(layout_name).join("layout.txt"),
        );
        let mut session = Session {
            app,
            view_state: ViewState::new(1),
            terminal: Terminal::new(TestBackend::new(60, 22)).unwrap(),
        };
        session.render();
        session
    }

    fn render(&mut self) -> String {
        let Session {
            app,
            view_state,
            terminal,
        } = self;
        terminal
            .draw(|frame| render_frame(frame, app, view_state))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn key(&mut self, c: char) {
        let event = KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        };
        if let Some(cmd) = input::handle_key(event, &mut self.view_state) {
            self.app.handle_command(cmd, &self.view_state.geometry);
        }
        self.render();
    }

    fn mouse(&mut self, kind: MouseEventKind, column: u16, row: u16) {
        let event = MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        if let Some(cmd) = input::handle_mouse(event, &mut self.view_state, &self.app.board) {
            self.app.handle_command(cmd, &self.view_state.geometry);
        }
        self.render();
    }

    fn drag(&mut self, from: (u16, u16), to: (u16, u16)) {
        self.mouse(MouseEventKind::Down(MouseButton::Left), from.0, from.1);
        self.mouse(MouseEventKind::Drag(MouseButton::Left), to.0, to.1);
        self.mouse(MouseEventKind::Up(MouseButton::Left), to.0, to.1);
    }

    fn rect_at(&self, coord: GridCoord) -> Option<GridRect> {
        self.app.board.card_at(coord).map(|card| card.rect)
    }

    /// Three cards in a 2x2 grid: (0,0), (0,1) and (1,0). Edit mode on.
    fn with_three_cards(layout_name: &str) -> Self {
        let mut session = Session::new(layout_name);
        session.key('n');
        session.key('e');
        // Display grid is 2x2; (0,1) is the "+" right of the first card.
        session.mouse(MouseEventKind::Down(MouseButton::Left), 45, 5);
        session.key('n');
        assert_eq!(session.app.board.grid().size(), GridSize::new(2, 2));
        session
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn affordance_click_and_keyboard_add_fill_the_grid() {
    let session = Session::with_three_cards("hwdash_it_session_add");
    assert_eq!(session.app.board.cards().len(), 3);
    assert_eq!(session.rect_at(GridCoord::new(0, 1)), Some(GridRect::unit(0, 1)));
    assert_eq!(session.rect_at(GridCoord::new(1, 0)), Some(GridRect::unit(1, 0)));
    assert!(session.app.board.is_consistent());
}

#[test]
fn dragging_a_card_body_moves_it_and_saves() {
    let mut session = Session::with_three_cards("hwdash_it_session_drag");

    // Display grid 3x3 in (0,1,60,20) with spacing 1: card (1,0) is drawn at
    // columns 0..19, rows 8..14. Grab its middle and move one column right.
    session.drag((9, 11), (29, 11));
    assert_eq!(session.rect_at(GridCoord::new(1, 1)), Some(GridRect::unit(1, 1)));
    assert_eq!(session.rect_at(GridCoord::new(1, 0)), None);
    assert!(session.app.board.interaction().is_idle());

    session.key('s');
    let saved = layout::load_or_default(&session.app.layout_path);
    assert!(saved
        .placements
        .iter()
        .any(|p| p.rect == GridRect::unit(1, 1) && p.kind == ContentKind::Circle));

    let _ = std::fs::remove_dir_all(session.app.layout_path.parent().unwrap());
}

#[test]
fn resizing_into_a_neighbour_is_rejected() {
    let mut session = Session::with_three_cards("hwdash_it_session_resize");

    // Right border of card (0,0) is column 18; one column width to the right
    // collides with card (0,1).
    session.drag((18, 3), (38, 3));
    assert_eq!(session.rect_at(GridCoord::new(0, 0)), Some(GridRect::unit(0, 0)));
    assert_eq!(session.rect_at(GridCoord::new(0, 1)), Some(GridRect::unit(0, 1)));
    assert!(session.app.board.is_consistent());
}

#[test]
fn remove_button_deletes_card_and_compacts() {
    let mut session = Session::with_three_cards("hwdash_it_session_remove");
    let feed_metric = session.app.board.card_at(GridCoord::new(1, 0)).unwrap().metric;
    assert_eq!(feed_metric, Some(MetricKind::Cpu));

    // Card (1,0) spans columns 0..19; its remove button sits at 16..18 on row 8.
    session.mouse(MouseEventKind::Down(MouseButton::Left), 16, 8);
    assert_eq!(session.app.board.cards().len(), 2);
    assert_eq!(session.app.board.grid().size(), GridSize::new(1, 2));
}

#[test]
fn leaving_edit_mode_ignores_the_mouse() {
    let mut session = Session::with_three_cards("hwdash_it_session_view");
    session.key('e');
    assert!(!session.app.board.edit_mode());

    session.drag((9, 11), (29, 11));
    assert_eq!(session.rect_at(GridCoord::new(1, 0)), Some(GridRect::unit(1, 0)));
    let text = session.render();
    assert!(!text.contains('+'));
}
