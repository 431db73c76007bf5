// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns the `App`. Terminal events become `UserCommand`s applied to
// the app, metric samples arrive from the sampler task over an mpsc channel,
// and the frame is redrawn on a fixed render tick.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::BTreeSet;
use std::io::stdout;
use std::time::Duration;

use anyhow::Context;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream};
use crossterm::execute;
use futures_util::StreamExt;
use ratatui::layout::Rect;
use ratatui::Frame;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use hwdash_core::board::Board;
use hwdash_core::config::UiConfig;
use hwdash_core::geometry::{GridGeometry, ScreenRect};
use hwdash_core::grid::GridSize;
use hwdash_core::metrics::MetricKind;

use crate::app::App;
use crate::protocol::UserCommand;
use crate::sampler::SampleBatch;

use input::PointerGesture;
use layout::{build_layout, display_size, grid_geometry};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// Presentation state that is not part of the board: the pointer gesture as
/// the input layer sees it, and where the grid was last drawn.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub pointer: Option<PointerGesture>,
    /// Geometry of the last drawn grid. Pointer positions map through it.
    pub geometry: GridGeometry,
    pub grid_area: Rect,
    /// Gap between cards in terminal cells.
    pub spacing: u16,
}

impl ViewState {
    pub fn new(spacing: u16) -> Self {
        ViewState {
            pointer: None,
            geometry: GridGeometry::new(ScreenRect::default(), GridSize::default(), f64::from(spacing)),
            grid_area: Rect::default(),
            spacing,
        }
    }

    /// Recompute the grid geometry for `grid_area` and the board's current
    /// display size.
    pub fn update_geometry(&mut self, grid_area: Rect, board: &Board) {
        self.grid_area = grid_area;
        self.geometry = grid_geometry(grid_area, display_size(board), self.spacing);
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
pub fn render_frame(frame: &mut Frame, app: &App, view_state: &mut ViewState) {
    let layout = build_layout(frame.area());
    view_state.update_geometry(layout.grid, &app.board);

    widgets::status_bar::render(frame, layout.status_bar, app);
    widgets::grid::render(frame, layout.grid, app, &view_state.geometry);
    widgets::help_bar::render(frame, layout.help_bar, &app.themes, app.board.edit_mode());
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Apply a command and tell the sampler if the set of bound metrics changed.
fn apply_command(
    app: &mut App,
    cmd: UserCommand,
    geometry: &GridGeometry,
    enabled_tx: &watch::Sender<BTreeSet<MetricKind>>,
) {
    app.handle_command(cmd, geometry);
    enabled_tx.send_if_modified(|published| {
        if *published == *app.feed.enabled() {
            return false;
        }
        *published = app.feed.enabled().clone();
        true
    });
}

/// Run the TUI until the user quits or the terminal input ends.
pub async fn run(
    mut app: App,
    ui: &UiConfig,
    mut sample_rx: mpsc::Receiver<SampleBatch>,
    enabled_tx: watch::Sender<BTreeSet<MetricKind>>,
) -> anyhow::Result<()> {
    // 1. Initialize terminal and mouse capture
    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture).context("failed to enable mouse capture")?;

    // 2. Restore the terminal before the default panic output.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::new(ui.cell_spacing);
    let mut event_stream = EventStream::new();
    let mut render_tick = tokio::time::interval(Duration::from_millis(ui.render_ms));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // Metrics bound by the loaded layout.
    enabled_tx.send_replace(app.feed.enabled().clone());

    // 3. Main loop
    loop {
        tokio::select! {
            maybe_event = event_stream.next() => {
                let cmd = match maybe_event {
                    Some(Ok(Event::Key(key_event))) => input::handle_key(key_event, &mut view_state),
                    Some(Ok(Event::Mouse(mouse_event))) => {
                        input::handle_mouse(mouse_event, &mut view_state, &app.board)
                    }
                    // Resize and focus events: the next frame picks up the new size.
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        warn!("terminal input error: {e}");
                        break;
                    }
                    None => break,
                };
                if let Some(cmd) = cmd {
                    let geometry = view_state.geometry;
                    apply_command(&mut app, cmd, &geometry, &enabled_tx);
                }
            }

            Some(batch) = sample_rx.recv() => {
                app.record_sample(batch);
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &app, &mut view_state))?;
            }
        }

        if app.should_quit {
            info!("quit requested");
            break;
        }
    }

    // 4. Restore terminal
    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
