// Commands produced by the input layer and applied by the app.

use hwdash_core::grid::{CardId, GridCoord};
use hwdash_core::interaction::Edge;

/// Something the user asked for, decoded from a key or mouse event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserCommand {
    ToggleEditMode,
    ToggleTheme,
    SaveLayout,

    // New-card template
    CycleKind,
    CycleMetric,
    CycleColor,
    CycleAccent,
    /// Change the template's column span by the given amount (min 1).
    ResizeTemplateWidth(i8),
    /// Change the template's row span by the given amount (min 1).
    ResizeTemplateHeight(i8),

    /// Add a card from the template, at a specific cell or wherever the
    /// placement engine finds room.
    AddCard { at: Option<GridCoord> },
    RemoveCard(CardId),

    BeginDrag(CardId),
    /// Dragged-card center in screen coordinates.
    DragTo { x: f64, y: f64 },
    Drop,
    BeginResize { card: CardId, edge: Edge },
    /// Pointer offset from where the resize started.
    ResizeTo { dx: f64, dy: f64 },
    EndResize,
    CancelGesture,

    Quit,
}
