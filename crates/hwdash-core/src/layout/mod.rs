// Layout files: parsing the two on-disk grammars into a `LayoutDescriptor`
// and writing descriptors back out.
//
// Row-grid grammar (one line per grid row):
//
//     theme:dark
//     [circle cpu 1x1] [graph memory 1x2colorB]
//     [] [text ping 1x1accentC]
//
// Key-value grammar (one record per placement):
//
//     theme:light
//     size:3x2
//     type=circle,metric=cpu,start_x=0,end_x=0,start_y=0,end_y=0
//
// The first line that is not blank, a comment, or a directive decides which
// grammar the file uses.

mod records;
mod rows;

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::card::{AccentScheme, CardSpec, ColorScheme, ContentKind};
use crate::grid::{GridRect, GridSize, MAX_GRID_EXTENT};
use crate::metrics::MetricKind;

pub const DEFAULT_THEME: &str = "light";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: unbalanced brackets")]
    UnbalancedBrackets { line: usize },

    #[error("line {line}: unexpected text `{text}` outside brackets")]
    StrayText { line: usize, text: String },

    #[error("line {line}: unknown widget type `{token}`")]
    UnknownWidgetType { line: usize, token: String },

    #[error("line {line}: `{token}` is not a valid span")]
    InvalidSpan { line: usize, token: String },

    #[error("line {line}: `{token}` is not a valid color or accent scheme")]
    InvalidScheme { line: usize, token: String },

    #[error("line {line}: missing {what}")]
    Missing { line: usize, what: String },

    #[error("line {line}: invalid `{key}` value `{value}`")]
    InvalidNumber {
        line: usize,
        key: String,
        value: String,
    },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("line {line}: neither a row of [widgets] nor key=value record")]
    UnrecognisedLine { line: usize },
}

// ---------------------------------------------------------------------------
// Descriptor types
// ---------------------------------------------------------------------------

/// One widget as written in a layout file. The metric stays a raw string so
/// an unknown metric can be skipped when the board loads instead of failing
/// the whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetPlacement {
    pub kind: ContentKind,
    /// Empty for separators.
    pub metric_key: String,
    pub rect: GridRect,
    pub color_scheme: ColorScheme,
    pub accent_scheme: AccentScheme,
}

impl WidgetPlacement {
    /// Resolve into a card template. Errors with the metric key when it does
    /// not name a known metric.
    pub fn to_spec(&self) -> Result<CardSpec, String> {
        let spec = if self.kind.binds_metric() {
            let metric =
                MetricKind::from_key(&self.metric_key).ok_or_else(|| self.metric_key.clone())?;
            CardSpec::new(self.kind, metric, self.rect)
        } else {
            CardSpec::separator(self.rect)
        };
        Ok(spec.with_schemes(self.color_scheme, self.accent_scheme))
    }

    pub fn from_spec(spec: &CardSpec) -> Self {
        WidgetPlacement {
            kind: spec.kind,
            metric_key: spec.metric.map(|m| m.key().to_string()).unwrap_or_default(),
            rect: spec.rect,
            color_scheme: spec.color_scheme,
            accent_scheme: spec.accent_scheme,
        }
    }
}

/// Parsed contents of a layout file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDescriptor {
    pub theme: String,
    /// Covers every placement.
    pub grid_size: GridSize,
    pub placements: Vec<WidgetPlacement>,
}

impl Default for LayoutDescriptor {
    fn default() -> Self {
        LayoutDescriptor {
            theme: DEFAULT_THEME.to_string(),
            grid_size: GridSize::default(),
            placements: Vec::new(),
        }
    }
}

impl LayoutDescriptor {
    /// The layout used when a file cannot be read or parsed: a single CPU
    /// gauge in a 1x1 grid.
    pub fn fallback() -> Self {
        LayoutDescriptor {
            theme: DEFAULT_THEME.to_string(),
            grid_size: GridSize::new(1, 1),
            placements: vec![WidgetPlacement::from_spec(&CardSpec::default_card())],
        }
    }

    /// Serialize in the key-value grammar.
    pub fn to_layout_string(&self) -> String {
        records::write(self)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A body line with its 1-based line number.
type Line<'a> = (usize, &'a str);

/// Parse layout text in either grammar.
pub fn parse(text: &str) -> Result<LayoutDescriptor, ParseError> {
    let mut theme = None;
    let mut size = None;
    let mut body: Vec<Line<'_>> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let line = raw.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix("theme:") {
            theme = Some(name.trim().to_string());
            continue;
        }
        if let Some(dims) = line.strip_prefix("size:") {
            size = Some(parse_size(dims, number)?);
            continue;
        }
        body.push((number, line));
    }

    // Blank lines at either end are padding; interior blanks are empty rows
    // in the row-grid grammar.
    let start = body.iter().position(|(_, l)| !l.is_empty()).unwrap_or(body.len());
    let end = body.iter().rposition(|(_, l)| !l.is_empty()).map_or(start, |i| i + 1);
    let body = &body[start..end];

    let (placements, row_count) = match body.first() {
        None => (Vec::new(), 0),
        Some((_, line)) if line.starts_with('[') => rows::parse(body)?,
        Some((_, line)) if line.contains('=') => (records::parse(body)?, 0),
        Some((number, _)) => return Err(ParseError::UnrecognisedLine { line: *number }),
    };

    let grid_size = placements
        .iter()
        .fold(size.unwrap_or_default(), |acc, p| acc.covering(&p.rect))
        .union(GridSize::new(row_count, 0));

    Ok(LayoutDescriptor {
        theme: theme
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_THEME.to_string()),
        grid_size,
        placements,
    })
}

/// `WxH`: W columns by H rows, each at most [`MAX_GRID_EXTENT`].
fn parse_size(dims: &str, line: usize) -> Result<GridSize, ParseError> {
    let invalid = || ParseError::InvalidSpan {
        line,
        token: dims.trim().to_string(),
    };
    let (w, h) = dims.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let cols: usize = w.trim().parse().map_err(|_| invalid())?;
    let rows: usize = h.trim().parse().map_err(|_| invalid())?;
    if cols > MAX_GRID_EXTENT || rows > MAX_GRID_EXTENT {
        return Err(invalid());
    }
    Ok(GridSize::new(rows, cols))
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Read and parse a layout file. Any read or parse failure is logged and the
/// fallback layout is returned; no partial layout is ever applied.
pub fn load_or_default(path: &Path) -> LayoutDescriptor {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("cannot read layout {}: {e}; using default layout", path.display());
            return LayoutDescriptor::fallback();
        }
    };
    match parse(&text) {
        Ok(descriptor) => {
            info!(
                "loaded layout {} ({} widgets, grid {})",
                path.display(),
                descriptor.placements.len(),
                descriptor.grid_size
            );
            descriptor
        }
        Err(e) => {
            warn!("invalid layout {}: {e}; using default layout", path.display());
            LayoutDescriptor::fallback()
        }
    }
}

/// Write `descriptor` to `path` in the key-value grammar.
pub fn save(path: &Path, descriptor: &LayoutDescriptor) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, descriptor.to_layout_string())?;
    info!("saved layout to {}", path.display());
    Ok(())
}
