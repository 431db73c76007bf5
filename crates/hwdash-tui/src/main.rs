// Hardware dashboard entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config (copies defaults on first run)
// 3. Build the theme store (built-ins, optional themes file, configured default)
// 4. Load the layout file, falling back to the default card
// 5. Build the metrics feed and the board
// 6. Spawn the metrics sampler task
// 7. Run the TUI until the user quits
// 8. Stop the sampler

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use hwdash::app::App;
use hwdash::sampler;
use hwdash::tui;
use hwdash_core::board::Board;
use hwdash_core::config;
use hwdash_core::layout;
use hwdash_core::metrics::{MetricsFeed, SystemSource};
use hwdash_core::theme::ThemeStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("hwdash starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: tick {}ms, history {}, layout {}",
        config.metrics.tick_ms, config.metrics.history_len, config.layout.path
    );

    // 3. Themes
    let mut themes = ThemeStore::builtin();
    if let Some(path) = &config.theme.themes_path {
        match themes.load_file(Path::new(path)) {
            Ok(names) => info!("Loaded themes {names:?} from {path}"),
            Err(e) => warn!("ignoring themes file: {e}"),
        }
    }
    themes.set_theme(&config.theme.default);

    // 4. Layout
    let layout_path = PathBuf::from(&config.layout.path);
    let descriptor = layout::load_or_default(&layout_path);
    themes.set_theme(&descriptor.theme);

    // 5. Feed and board. The feed here only keeps history; the sampler task
    //    owns the hardware source.
    let mut feed = MetricsFeed::detached(config.metrics.history_len);
    let mut board = Board::from_descriptor(&descriptor, &mut feed, config.layout.auto_compact);
    board.set_theme(themes.current_name());
    info!(
        "Board ready: {} cards on a {} grid, theme {}",
        board.cards().len(),
        board.grid().size(),
        themes.current_name()
    );

    // 6. Sampler
    let (sample_tx, sample_rx) = mpsc::channel(16);
    let (enabled_tx, enabled_rx) = watch::channel(BTreeSet::new());
    let source = Box::new(SystemSource::new(&config.metrics));
    let sampler_handle = tokio::spawn(sampler::run(
        source,
        Duration::from_millis(config.metrics.tick_ms),
        enabled_rx,
        sample_tx,
    ));

    // 7. TUI (blocks until quit)
    let app = App::new(board, feed, themes, layout_path);
    if let Err(e) = tui::run(app, &config.ui, sample_rx, enabled_tx).await {
        warn!("TUI error: {e:#}");
    }

    // 8. Cleanup. The sampler may be inside a blocking poll; don't wait on it.
    sampler_handle.abort();

    info!("hwdash shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("hwdash.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hwdash=info,hwdash_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
