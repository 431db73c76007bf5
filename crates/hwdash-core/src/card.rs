// Card: one dashboard item placed on the grid, and the template used to
// create new cards.

use crate::grid::{CardId, GridRect};
use crate::metrics::MetricKind;

// ---------------------------------------------------------------------------
// Content kind and color schemes
// ---------------------------------------------------------------------------

/// What a card draws in its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Radial gauge of the smoothed current value.
    Circle,
    /// Line graph of the value history.
    Graph,
    /// The current value as large text.
    Text,
    /// An empty spacer. Has no metric binding.
    Separator,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Circle,
        ContentKind::Graph,
        ContentKind::Text,
        ContentKind::Separator,
    ];

    /// Keyword used in layout files.
    pub fn key(self) -> &'static str {
        match self {
            ContentKind::Circle => "circle",
            ContentKind::Graph => "graph",
            ContentKind::Text => "text",
            ContentKind::Separator => "separator",
        }
    }

    /// Parse a layout keyword, case-insensitively.
    pub fn from_key(s: &str) -> Option<Self> {
        let s = s.trim();
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(s))
    }

    /// Whether the kind displays a metric.
    pub fn binds_metric(self) -> bool {
        self != ContentKind::Separator
    }

    /// Next kind in cycle order.
    pub fn next(self) -> Self {
        let idx = ContentKind::ALL.iter().position(|k| *k == self).unwrap_or(0);
        ContentKind::ALL[(idx + 1) % ContentKind::ALL.len()]
    }
}

/// Card background variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorScheme {
    #[default]
    A,
    B,
}

impl ColorScheme {
    pub fn letter(self) -> char {
        match self {
            ColorScheme::A => 'A',
            ColorScheme::B => 'B',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(ColorScheme::A),
            'B' => Some(ColorScheme::B),
            _ => None,
        }
    }

    /// Theme key for the card background.
    pub fn background_key(self) -> &'static str {
        match self {
            ColorScheme::A => "card_background",
            ColorScheme::B => "card_background_2",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ColorScheme::A => ColorScheme::B,
            ColorScheme::B => ColorScheme::A,
        }
    }
}

/// Chart accent variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccentScheme {
    #[default]
    A,
    B,
    C,
}

impl AccentScheme {
    pub fn letter(self) -> char {
        match self {
            AccentScheme::A => 'A',
            AccentScheme::B => 'B',
            AccentScheme::C => 'C',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(AccentScheme::A),
            'B' => Some(AccentScheme::B),
            'C' => Some(AccentScheme::C),
            _ => None,
        }
    }

    /// Theme key for the chart accent color.
    pub fn chart_key(self) -> &'static str {
        match self {
            AccentScheme::A => "chart",
            AccentScheme::B => "chart_2",
            AccentScheme::C => "chart_3",
        }
    }

    pub fn next(self) -> Self {
        match self {
            AccentScheme::A => AccentScheme::B,
            AccentScheme::B => AccentScheme::C,
            AccentScheme::C => AccentScheme::A,
        }
    }
}

// ---------------------------------------------------------------------------
// CardSpec (template) and Card
// ---------------------------------------------------------------------------

/// Everything needed to create a card except its id and final position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSpec {
    pub kind: ContentKind,
    pub metric: Option<MetricKind>,
    /// Requested rect. The placement engine may move it.
    pub rect: GridRect,
    pub color_scheme: ColorScheme,
    pub accent_scheme: AccentScheme,
}

impl CardSpec {
    /// A metric-bound card at `rect` with default schemes.
    pub fn new(kind: ContentKind, metric: MetricKind, rect: GridRect) -> Self {
        CardSpec {
            kind,
            metric: kind.binds_metric().then_some(metric),
            rect,
            color_scheme: ColorScheme::default(),
            accent_scheme: AccentScheme::default(),
        }
    }

    /// A spacer card at `rect`.
    pub fn separator(rect: GridRect) -> Self {
        CardSpec {
            kind: ContentKind::Separator,
            metric: None,
            rect,
            color_scheme: ColorScheme::default(),
            accent_scheme: AccentScheme::default(),
        }
    }

    /// The card created when a layout cannot be loaded: a CPU gauge at the
    /// top-left cell.
    pub fn default_card() -> Self {
        CardSpec::new(ContentKind::Circle, MetricKind::Cpu, GridRect::unit(0, 0))
    }

    pub fn with_schemes(mut self, color: ColorScheme, accent: AccentScheme) -> Self {
        self.color_scheme = color;
        self.accent_scheme = accent;
        self
    }

    /// Switch to the next kind. A metric is restored (CPU) when leaving
    /// separator and dropped when entering it.
    pub fn cycle_kind(&mut self) {
        self.kind = self.kind.next();
        self.metric = match (self.kind.binds_metric(), self.metric) {
            (false, _) => None,
            (true, Some(m)) => Some(m),
            (true, None) => Some(MetricKind::Cpu),
        };
    }

    pub fn cycle_metric(&mut self) {
        if let Some(m) = self.metric {
            self.metric = Some(m.next());
        }
    }
}

impl Default for CardSpec {
    fn default() -> Self {
        CardSpec::default_card()
    }
}

/// A placed card. `rect` always matches the cells the grid assigns to `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub rect: GridRect,
    pub kind: ContentKind,
    pub metric: Option<MetricKind>,
    pub color_scheme: ColorScheme,
    pub accent_scheme: AccentScheme,
}

impl Card {
    pub fn new(id: CardId, rect: GridRect, spec: &CardSpec) -> Self {
        Card {
            id,
            rect,
            kind: spec.kind,
            metric: if spec.kind.binds_metric() { spec.metric } else { None },
            color_scheme: spec.color_scheme,
            accent_scheme: spec.accent_scheme,
        }
    }

    /// Header text shown above the card body.
    pub fn title(&self) -> &'static str {
        match self.metric {
            Some(metric) => metric.title(),
            None => "",
        }
    }
}
