// Keyboard and mouse input handling.
//
// Translates crossterm events into `UserCommand`s. Pointer gestures keep a
// little local state in `ViewState` (grab offset, start point) so drag and
// resize commands carry grid-ready coordinates.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use hwdash_core::board::Board;

use super::layout::{hit_test, CardZone, HitTarget};
use super::ViewState;
use crate::protocol::UserCommand;

/// Pointer gesture in progress, as seen by the input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerGesture {
    /// Offset from the card center to where it was grabbed.
    Drag { grab_dx: f64, grab_dy: f64 },
    /// Where the resize started.
    Resize { start_x: f64, start_y: f64 },
}

/// Handle a keyboard event.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Windows reports both press and release; only act on press.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return match key_event.code {
            KeyCode::Char('c') => Some(UserCommand::Quit),
            _ => None,
        };
    }

    match key_event.code {
        KeyCode::Char('q') => Some(UserCommand::Quit),
        KeyCode::Char('e') => Some(UserCommand::ToggleEditMode),
        KeyCode::Char('t') => Some(UserCommand::ToggleTheme),
        KeyCode::Char('s') => Some(UserCommand::SaveLayout),

        KeyCode::Char('k') => Some(UserCommand::CycleKind),
        KeyCode::Char('m') => Some(UserCommand::CycleMetric),
        KeyCode::Char('c') => Some(UserCommand::CycleColor),
        KeyCode::Char('a') => Some(UserCommand::CycleAccent),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(UserCommand::ResizeTemplateWidth(1)),
        KeyCode::Char('-') => Some(UserCommand::ResizeTemplateWidth(-1)),
        KeyCode::Char(']') => Some(UserCommand::ResizeTemplateHeight(1)),
        KeyCode::Char('[') => Some(UserCommand::ResizeTemplateHeight(-1)),
        KeyCode::Char('n') => Some(UserCommand::AddCard { at: None }),

        KeyCode::Esc => {
            view_state.pointer = None;
            Some(UserCommand::CancelGesture)
        }
        _ => None,
    }
}

/// Handle a mouse event against the board as drawn in the last frame.
pub fn handle_mouse(mouse: MouseEvent, view_state: &mut ViewState, board: &Board) -> Option<UserCommand> {
    // Terminal cells are addressed by their top-left corner; use the center.
    let x = f64::from(mouse.column) + 0.5;
    let y = f64::from(mouse.row) + 0.5;

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if !board.edit_mode() || view_state.pointer.is_some() {
                return None;
            }
            let target = hit_test(
                board,
                &view_state.geometry,
                view_state.grid_area,
                mouse.column,
                mouse.row,
            );
            match target {
                HitTarget::Card {
                    card,
                    zone: CardZone::Remove,
                } => Some(UserCommand::RemoveCard(card)),
                HitTarget::Card {
                    card,
                    zone: CardZone::Body,
                } => {
                    let rect = board.card(card)?.rect;
                    let (cx, cy) = view_state.geometry.bounds_of(&rect).center();
                    view_state.pointer = Some(PointerGesture::Drag {
                        grab_dx: x - cx,
                        grab_dy: y - cy,
                    });
                    Some(UserCommand::BeginDrag(card))
                }
                HitTarget::Card {
                    card,
                    zone: CardZone::Edge(edge),
                } => {
                    view_state.pointer = Some(PointerGesture::Resize {
                        start_x: x,
                        start_y: y,
                    });
                    Some(UserCommand::BeginResize { card, edge })
                }
                HitTarget::Affordance(coord) => Some(UserCommand::AddCard { at: Some(coord) }),
                HitTarget::Nothing => None,
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => match view_state.pointer? {
            PointerGesture::Drag { grab_dx, grab_dy } => Some(UserCommand::DragTo {
                x: x - grab_dx,
                y: y - grab_dy,
            }),
            PointerGesture::Resize { start_x, start_y } => Some(UserCommand::ResizeTo {
                dx: x - start_x,
                dy: y - start_y,
            }),
        },
        MouseEventKind::Up(MouseButton::Left) => match view_state.pointer.take()? {
            PointerGesture::Drag { .. } => Some(UserCommand::Drop),
            PointerGesture::Resize { .. } => Some(UserCommand::EndResize),
        },
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use hwdash_core::card::{CardSpec, ContentKind};
    use hwdash_core::grid::{GridCoord, GridRect};
    use hwdash_core::interaction::Edge;
    use hwdash_core::metrics::{MetricKind, MetricsFeed};
    use ratatui::layout::Rect;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// One 20x10 card at the top-left of a 40x20 grid area, edit mode on.
    fn setup() -> (Board, ViewState) {
        let mut feed = MetricsFeed::detached(4);
        let mut board = Board::new(false);
        board.add_card(
            CardSpec::new(ContentKind::Circle, MetricKind::Cpu, GridRect::unit(0, 0)),
            &mut feed,
        );
        board.set_edit_mode(true);
        let mut view = ViewState::new(0);
        view.update_geometry(Rect::new(0, 0, 40, 20), &board);
        (board, view)
    }

    #[test]
    fn keys_map_to_commands() {
        let mut view = ViewState::new(1);
        assert_eq!(handle_key(key(KeyCode::Char('e')), &mut view), Some(UserCommand::ToggleEditMode));
        assert_eq!(handle_key(key(KeyCode::Char('n')), &mut view), Some(UserCommand::AddCard { at: None }));
        assert_eq!(handle_key(key(KeyCode::Char('+')), &mut view), Some(UserCommand::ResizeTemplateWidth(1)));
        assert_eq!(handle_key(key(KeyCode::Char('[')), &mut view), Some(UserCommand::ResizeTemplateHeight(-1)));
        assert_eq!(handle_key(key(KeyCode::Char('z')), &mut view), None);
    }

    #[test]
    fn ctrl_c_quits_and_release_is_ignored() {
        let mut view = ViewState::new(1);
        let mut ctrl_c = key(KeyCode::Char('c'));
        ctrl_c.modifiers = KeyModifiers::CONTROL;
        assert_eq!(handle_key(ctrl_c, &mut view), Some(UserCommand::Quit));

        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        assert_eq!(handle_key(release, &mut view), None);
    }

    #[test]
    fn escape_clears_pointer_gesture() {
        let mut view = ViewState::new(1);
        view.pointer = Some(PointerGesture::Resize {
            start_x: 0.0,
            start_y: 0.0,
        });
        assert_eq!(handle_key(key(KeyCode::Esc), &mut view), Some(UserCommand::CancelGesture));
        assert!(view.pointer.is_none());
    }

    #[test]
    fn body_press_drag_release_is_a_drag() {
        let (board, mut view) = setup();
        let id = board.cards()[0].id;

        let down = handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 9, 4), &mut view, &board);
        assert_eq!(down, Some(UserCommand::BeginDrag(id)));

        // Grabbed 0.5 left/up of center (10, 5); moving 20 right keeps that offset.
        let moved = handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 29, 4), &mut view, &board);
        assert_eq!(moved, Some(UserCommand::DragTo { x: 30.0, y: 5.0 }));

        let up = handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 29, 4), &mut view, &board);
        assert_eq!(up, Some(UserCommand::Drop));
        assert!(view.pointer.is_none());
    }

    #[test]
    fn border_press_is_a_resize_with_relative_deltas() {
        let (board, mut view) = setup();
        let id = board.cards()[0].id;

        let down = handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 19, 5), &mut view, &board);
        assert_eq!(
            down,
            Some(UserCommand::BeginResize {
                card: id,
                edge: Edge::Right
            })
        );
        let moved = handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 33, 5), &mut view, &board);
        assert_eq!(moved, Some(UserCommand::ResizeTo { dx: 14.0, dy: 0.0 }));
        let up = handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 33, 5), &mut view, &board);
        assert_eq!(up, Some(UserCommand::EndResize));
    }

    #[test]
    fn remove_button_and_affordance_clicks() {
        let (board, mut view) = setup();
        let id = board.cards()[0].id;
        assert_eq!(
            handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 17, 0), &mut view, &board),
            Some(UserCommand::RemoveCard(id))
        );
        assert_eq!(
            handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 30, 5), &mut view, &board),
            Some(UserCommand::AddCard {
                at: Some(GridCoord::new(0, 1))
            })
        );
        assert!(view.pointer.is_none());
    }

    #[test]
    fn mouse_does_nothing_outside_edit_mode() {
        let (mut board, mut view) = setup();
        board.set_edit_mode(false);
        view.update_geometry(Rect::new(0, 0, 40, 20), &board);
        assert_eq!(
            handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 5), &mut view, &board),
            None
        );
        assert_eq!(
            handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 6, 6), &mut view, &board),
            None
        );
    }
}
