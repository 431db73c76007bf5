// Board: the set of cards, their occupancy grid, edit mode, and the active
// gesture. Every user-facing grid operation goes through here so the cards'
// rects and the grid's cell map never disagree.

use tracing::{debug, info, warn};

use crate::card::{Card, CardSpec};
use crate::geometry::GridGeometry;
use crate::grid::{CardId, GridCoord, GridRect, OccupancyGrid};
use crate::interaction::{Edge, InteractionState, Release};
use crate::layout::{LayoutDescriptor, WidgetPlacement};
use crate::metrics::MetricsFeed;
use crate::placement::find_position;

/// What happened when a gesture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// The card moved or resized.
    Committed {
        card: CardId,
        from: GridRect,
        to: GridRect,
    },
    /// The target was invalid or equal to the start rect; nothing changed.
    Unchanged,
    /// There was no matching gesture to end.
    NoGesture,
}

#[derive(Debug, Clone)]
pub struct Board {
    cards: Vec<Card>,
    grid: OccupancyGrid,
    interaction: InteractionState,
    edit_mode: bool,
    auto_compact: bool,
    next_id: u64,
    theme: String,
}

impl Board {
    pub fn new(auto_compact: bool) -> Self {
        Board {
            cards: Vec::new(),
            grid: OccupancyGrid::default(),
            interaction: InteractionState::Idle,
            edit_mode: false,
            auto_compact,
            next_id: 1,
            theme: crate::layout::DEFAULT_THEME.to_string(),
        }
    }

    /// Build a board from a parsed layout. Placements go through the
    /// placement engine in file order, so overlapping entries are moved
    /// rather than rejected. Placements naming an unknown metric are skipped.
    pub fn from_descriptor(descriptor: &LayoutDescriptor, feed: &mut MetricsFeed, auto_compact: bool) -> Self {
        let mut board = Board::new(auto_compact);
        board.theme = descriptor.theme.clone();
        board.grid.ensure_size(descriptor.grid_size);

        for placement in &descriptor.placements {
            match placement.to_spec() {
                Ok(spec) => {
                    board.insert(spec, feed);
                }
                Err(metric) => warn!(
                    "skipping {} widget at {}: unknown metric `{metric}`",
                    placement.kind.key(),
                    placement.rect
                ),
            }
        }

        info!(
            "board loaded: {} cards, grid {}",
            board.cards.len(),
            board.grid.size()
        );
        board
    }

    /// Snapshot the board as a layout descriptor, cards in row-major order.
    pub fn to_descriptor(&self) -> LayoutDescriptor {
        let mut cards: Vec<&Card> = self.cards.iter().collect();
        cards.sort_by_key(|card| card.rect.origin());
        LayoutDescriptor {
            theme: self.theme.clone(),
            grid_size: self.grid.size(),
            placements: cards
                .into_iter()
                .map(|card| WidgetPlacement {
                    kind: card.kind,
                    metric_key: card.metric.map(|m| m.key().to_string()).unwrap_or_default(),
                    rect: card.rect,
                    color_scheme: card.color_scheme,
                    accent_scheme: card.accent_scheme,
                })
                .collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// The card covering `coord`, if any.
    pub fn card_at(&self, coord: GridCoord) -> Option<&Card> {
        self.grid.owner_at(coord).and_then(|id| self.card(id))
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Record the theme name saved with the layout.
    pub fn set_theme(&mut self, name: &str) {
        self.theme = name.to_string();
    }

    // -----------------------------------------------------------------------
    // Add / remove
    // -----------------------------------------------------------------------

    /// Add a card near `spec.rect`. Always succeeds: the placement engine
    /// finds a free rect, growing the grid if needed.
    pub fn add_card(&mut self, spec: CardSpec, feed: &mut MetricsFeed) -> CardId {
        let id = self.insert(spec, feed);
        if self.auto_compact {
            self.grid.compact();
        }
        id
    }

    /// Remove a card and clear its cells in one step. Any gesture on the
    /// card is cancelled, and its metric stops being sampled once no other
    /// card shows it.
    pub fn remove_card(&mut self, id: CardId, feed: &mut MetricsFeed) -> Option<Card> {
        let idx = self.cards.iter().position(|card| card.id == id)?;
        if self.interaction.active_card() == Some(id) {
            self.interaction.cancel();
        }
        let cleared = self.grid.remove(id);
        let card = self.cards.remove(idx);
        if self.auto_compact {
            self.grid.compact();
        }
        if let Some(metric) = card.metric {
            if !self.cards.iter().any(|other| other.metric == Some(metric)) {
                feed.disable(metric);
            }
        }
        info!("removed card {id} ({cleared} cells)");
        Some(card)
    }

    fn insert(&mut self, spec: CardSpec, feed: &mut MetricsFeed) -> CardId {
        let id = CardId(self.next_id);
        self.next_id += 1;

        let candidate = find_position(&self.grid, spec.rect);
        let rect = match self.grid.place(id, candidate) {
            Ok(()) => candidate,
            Err(e) => {
                warn!("placement of card {id} at {candidate} rejected: {e}; appending below");
                self.grid.place_below(id, candidate.row_span, candidate.col_span)
            }
        };
        if let Some(metric) = spec.metric {
            feed.enable(metric);
        }
        debug!("card {id} ({}) placed at {rect}", spec.kind.key());
        self.cards.push(Card::new(id, rect, &spec));
        id
    }

    /// Shrink the grid to the occupied bounding box.
    pub fn compact(&mut self) {
        self.grid.compact();
    }

    // -----------------------------------------------------------------------
    // Edit mode
    // -----------------------------------------------------------------------

    /// Flip edit mode. Leaving it cancels any active gesture.
    pub fn toggle_edit_mode(&mut self) -> bool {
        self.set_edit_mode(!self.edit_mode);
        self.edit_mode
    }

    pub fn set_edit_mode(&mut self, on: bool) {
        if !on {
            self.interaction.cancel();
        }
        self.edit_mode = on;
    }

    /// Cells offering the "+" add affordance: empty cells inside the grid,
    /// then the row below and the column right of it. Empty outside edit mode.
    pub fn affordance_cells(&self) -> Vec<GridCoord> {
        if !self.edit_mode {
            return Vec::new();
        }
        let size = self.grid.size();
        let mut cells = self.grid.empty_cells();
        cells.extend((0..size.cols.max(1)).map(|col| GridCoord::new(size.rows, col)));
        cells.extend((0..size.rows).map(|row| GridCoord::new(row, size.cols)));
        cells
    }

    // -----------------------------------------------------------------------
    // Gestures
    // -----------------------------------------------------------------------

    pub fn begin_drag(&mut self, id: CardId) -> bool {
        let Some(rect) = self.editable_rect(id) else {
            return false;
        };
        self.interaction.begin_drag(id, rect)
    }

    /// Move the drag preview for a dragged-card center at `(x, y)`.
    pub fn drag_to(&mut self, geometry: &GridGeometry, x: f64, y: f64) -> Option<GridRect> {
        self.interaction.drag_to(&self.grid, geometry, x, y)
    }

    pub fn drop_card(&mut self) -> GestureOutcome {
        match self.interaction.finish_drag() {
            Some(release) => self.commit(release),
            None => GestureOutcome::NoGesture,
        }
    }

    pub fn begin_resize(&mut self, id: CardId, edge: Edge) -> bool {
        let Some(rect) = self.editable_rect(id) else {
            return false;
        };
        self.interaction.begin_resize(id, edge, rect)
    }

    /// Update the resize preview for a pointer moved `(dx, dy)` from the
    /// gesture start, using the geometry's cell pitch.
    pub fn resize_to(&mut self, geometry: &GridGeometry, dx: f64, dy: f64) -> Option<GridRect> {
        self.interaction
            .resize_by(&self.grid, dx, dy, geometry.col_pitch(), geometry.row_pitch())
    }

    pub fn end_resize(&mut self) -> GestureOutcome {
        match self.interaction.finish_resize() {
            Some(release) => self.commit(release),
            None => GestureOutcome::NoGesture,
        }
    }

    pub fn cancel_gesture(&mut self) {
        self.interaction.cancel();
    }

    fn editable_rect(&self, id: CardId) -> Option<GridRect> {
        if !self.edit_mode {
            return None;
        }
        self.card(id).map(|card| card.rect)
    }

    /// Re-validate a released gesture's target and apply it.
    fn commit(&mut self, release: Release) -> GestureOutcome {
        let Release {
            card,
            start_rect,
            target,
        } = release;
        let Some(to) = target.filter(|rect| *rect != start_rect) else {
            return GestureOutcome::Unchanged;
        };
        if !self.grid.is_free(&to, Some(card)) {
            debug!("card {card}: target {to} no longer free");
            return GestureOutcome::Unchanged;
        }
        let Some(entry) = self.cards.iter_mut().find(|c| c.id == card) else {
            return GestureOutcome::Unchanged;
        };
        match self.grid.move_card(card, to) {
            Ok(()) => {
                entry.rect = to;
                info!("card {card} moved {start_rect} -> {to}");
                GestureOutcome::Committed {
                    card,
                    from: start_rect,
                    to,
                }
            }
            Err(e) => {
                debug!("card {card}: move to {to} rejected: {e}");
                GestureOutcome::Unchanged
            }
        }
    }

    // -----------------------------------------------------------------------
    // Consistency
    // -----------------------------------------------------------------------

    /// Whether every card's rect matches exactly the cells the grid assigns
    /// to it and the grid holds no cells for unknown cards.
    pub fn is_consistent(&self) -> bool {
        let cells_match = self.cards.iter().all(|card| {
            self.grid.cells_of(card.id) == card.rect.cells().collect::<Vec<_>>()
        });
        let total: usize = self.cards.iter().map(|card| card.rect.area()).sum();
        cells_match && total == self.grid.occupied_count()
    }
}
