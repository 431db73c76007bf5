// Library root: re-exports the TUI modules so integration tests can drive the
// app without a terminal.

pub mod app;
pub mod protocol;
pub mod sampler;
pub mod tui;
