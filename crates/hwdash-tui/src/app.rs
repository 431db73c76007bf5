// Application state and command handling.
//
// `App` owns the board and its collaborators. The TUI loop decodes input
// into `UserCommand`s and hands them to `App::handle_command`; rendering only
// reads from `App`.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use hwdash_core::board::{Board, GestureOutcome};
use hwdash_core::card::CardSpec;
use hwdash_core::geometry::GridGeometry;
use hwdash_core::grid::{GridCoord, GridRect};
use hwdash_core::layout;
use hwdash_core::metrics::MetricsFeed;
use hwdash_core::theme::ThemeStore;

use crate::protocol::UserCommand;
use crate::sampler::SampleBatch;

/// Largest span the template can be given from the keyboard.
const MAX_TEMPLATE_SPAN: usize = 8;

pub struct App {
    pub board: Board,
    pub feed: MetricsFeed,
    pub themes: ThemeStore,
    /// Card created by the add action.
    pub template: CardSpec,
    pub layout_path: PathBuf,
    /// One-line message for the status bar.
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(board: Board, feed: MetricsFeed, themes: ThemeStore, layout_path: PathBuf) -> Self {
        App {
            board,
            feed,
            themes,
            template: CardSpec::default_card(),
            layout_path,
            status: None,
            should_quit: false,
        }
    }

    /// Fold a background sample into the feed.
    pub fn record_sample(&mut self, batch: SampleBatch) {
        let started = Instant::now();
        self.feed.record(&batch.requested, batch.sample);
        debug!(
            "metrics tick {} recorded in {:?}",
            self.feed.ticks(),
            started.elapsed()
        );
    }

    /// Apply one command. `geometry` is the grid geometry of the last frame,
    /// used to map pointer positions during gestures.
    pub fn handle_command(&mut self, cmd: UserCommand, geometry: &GridGeometry) {
        match cmd {
            UserCommand::ToggleEditMode => {
                let on = self.board.toggle_edit_mode();
                self.status = Some(if on { "Edit mode" } else { "Edit mode off" }.to_string());
            }
            UserCommand::ToggleTheme => {
                let name = self.themes.toggle().to_string();
                self.board.set_theme(&name);
                self.status = Some(format!("Theme: {name}"));
            }
            UserCommand::SaveLayout => self.save_layout(),

            UserCommand::CycleKind => self.template.cycle_kind(),
            UserCommand::CycleMetric => self.template.cycle_metric(),
            UserCommand::CycleColor => {
                self.template.color_scheme = self.template.color_scheme.next();
            }
            UserCommand::CycleAccent => {
                self.template.accent_scheme = self.template.accent_scheme.next();
            }
            UserCommand::ResizeTemplateWidth(delta) => {
                self.template.rect.col_span = step_span(self.template.rect.col_span, delta);
            }
            UserCommand::ResizeTemplateHeight(delta) => {
                self.template.rect.row_span = step_span(self.template.rect.row_span, delta);
            }

            UserCommand::AddCard { at } => self.add_card(at),
            UserCommand::RemoveCard(id) => {
                if self.board.remove_card(id, &mut self.feed).is_some() {
                    self.status = Some(format!("Removed card {id}"));
                }
            }

            UserCommand::BeginDrag(id) => {
                self.board.begin_drag(id);
            }
            UserCommand::DragTo { x, y } => {
                self.board.drag_to(geometry, x, y);
            }
            UserCommand::Drop => {
                let outcome = self.board.drop_card();
                self.report(outcome);
            }
            UserCommand::BeginResize { card, edge } => {
                self.board.begin_resize(card, edge);
            }
            UserCommand::ResizeTo { dx, dy } => {
                self.board.resize_to(geometry, dx, dy);
            }
            UserCommand::EndResize => {
                let outcome = self.board.end_resize();
                self.report(outcome);
            }
            UserCommand::CancelGesture => self.board.cancel_gesture(),

            UserCommand::Quit => self.should_quit = true,
        }
    }

    fn add_card(&mut self, at: Option<GridCoord>) {
        let origin = at.unwrap_or_default();
        let spec = CardSpec {
            rect: GridRect {
                row: origin.row,
                col: origin.col,
                ..self.template.rect
            },
            ..self.template
        };
        let id = self.board.add_card(spec, &mut self.feed);
        if let Some(card) = self.board.card(id) {
            info!("added {} card {id} at {}", card.kind.key(), card.rect);
            self.status = Some(format!("Added {} at {}", card.kind.key(), card.rect));
        }
    }

    fn report(&mut self, outcome: GestureOutcome) {
        if let GestureOutcome::Committed { card, to, .. } = outcome {
            self.status = Some(format!("Card {card} -> {to}"));
        }
    }

    /// Write the board to the layout file.
    pub fn save_layout(&mut self) {
        match layout::save(&self.layout_path, &self.board.to_descriptor()) {
            Ok(()) => {
                self.status = Some(format!("Saved {}", self.layout_path.display()));
            }
            Err(e) => {
                warn!("failed to save layout {}: {e}", self.layout_path.display());
                self.status = Some(format!("Save failed: {e}"));
            }
        }
    }
}

fn step_span(span: usize, delta: i8) -> usize {
    (span as i64 + i64::from(delta)).clamp(1, MAX_TEMPLATE_SPAN as i64) as usize
}
