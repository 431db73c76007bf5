// Library root for the dashboard core: the grid layout engine, the layout
// file format, and the collaborators (metrics feed, theme store, config) the
// terminal front end wires together.

pub mod board;
pub mod card;
pub mod config;
pub mod geometry;
pub mod grid;
pub mod interaction;
pub mod layout;
pub mod metrics;
pub mod placement;
pub mod theme;
