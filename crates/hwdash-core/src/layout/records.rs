// Key-value grammar: one `key=value,...` record per placement.
//
// Coordinates are inclusive cell indices: `x` is the column, `y` the row.

use std::fmt::Write as _;

use tracing::warn;

use super::{LayoutDescriptor, Line, ParseError, WidgetPlacement};
use crate::card::{AccentScheme, ColorScheme, ContentKind};
use crate::grid::{GridRect, MAX_GRID_EXTENT};

pub(super) fn parse(lines: &[Line<'_>]) -> Result<Vec<WidgetPlacement>, ParseError> {
    lines
        .iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(number, text)| parse_record(text, *number))
        .collect()
}

#[derive(Default)]
struct Fields<'a> {
    kind: Option<&'a str>,
    metric: Option<&'a str>,
    start_x: Option<&'a str>,
    end_x: Option<&'a str>,
    start_y: Option<&'a str>,
    end_y: Option<&'a str>,
    color: Option<&'a str>,
    accent: Option<&'a str>,
}

fn parse_record(text: &str, line: usize) -> Result<WidgetPlacement, ParseError> {
    let mut fields = Fields::default();
    for pair in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').ok_or_else(|| ParseError::Malformed {
            line,
            message: format!("expected key=value, found `{pair}`"),
        })?;
        let value = value.trim();
        match key.trim() {
            "type" => fields.kind = Some(value),
            "metric" => fields.metric = Some(value),
            "start_x" => fields.start_x = Some(value),
            "end_x" => fields.end_x = Some(value),
            "start_y" => fields.start_y = Some(value),
            "end_y" => fields.end_y = Some(value),
            "color" => fields.color = Some(value),
            "accent" => fields.accent = Some(value),
            other => warn!("layout line {line}: ignoring unknown key `{other}`"),
        }
    }

    let kind_word = required(fields.kind, "type", line)?;
    let kind = ContentKind::from_key(kind_word).ok_or_else(|| ParseError::UnknownWidgetType {
        line,
        token: kind_word.to_string(),
    })?;
    let metric_key = if kind.binds_metric() {
        required(fields.metric, "metric", line)?.to_string()
    } else {
        String::new()
    };

    let start_x = index(fields.start_x, "start_x", line)?;
    let start_y = index(fields.start_y, "start_y", line)?;
    let end_x = optional_index(fields.end_x, "end_x", line)?.unwrap_or(start_x);
    let end_y = optional_index(fields.end_y, "end_y", line)?.unwrap_or(start_y);
    if end_x < start_x || end_y < start_y {
        return Err(ParseError::Malformed {
            line,
            message: format!("end ({end_x}, {end_y}) is before start ({start_x}, {start_y})"),
        });
    }

    let color_scheme = match fields.color {
        None => ColorScheme::default(),
        Some(v) => scheme_letter(v)
            .and_then(ColorScheme::from_letter)
            .ok_or_else(|| invalid_scheme(v, line))?,
    };
    let accent_scheme = match fields.accent {
        None => AccentScheme::default(),
        Some(v) => scheme_letter(v)
            .and_then(AccentScheme::from_letter)
            .ok_or_else(|| invalid_scheme(v, line))?,
    };

    Ok(WidgetPlacement {
        kind,
        metric_key,
        rect: GridRect::new(start_y, start_x, end_y - start_y + 1, end_x - start_x + 1),
        color_scheme,
        accent_scheme,
    })
}

fn required<'a>(value: Option<&'a str>, key: &str, line: usize) -> Result<&'a str, ParseError> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| ParseError::Missing {
        line,
        what: format!("`{key}`"),
    })
}

/// A cell index below [`MAX_GRID_EXTENT`].
fn index(value: Option<&str>, key: &str, line: usize) -> Result<usize, ParseError> {
    let text = required(value, key, line)?;
    text.parse()
        .ok()
        .filter(|n| *n < MAX_GRID_EXTENT)
        .ok_or_else(|| ParseError::InvalidNumber {
            line,
            key: key.to_string(),
            value: text.to_string(),
        })
}

fn optional_index(value: Option<&str>, key: &str, line: usize) -> Result<Option<usize>, ParseError> {
    value.map(|_| index(value, key, line)).transpose()
}

/// A scheme value is a single letter; the legacy `colorB` spelling is
/// accepted too.
fn scheme_letter(value: &str) -> Option<char> {
    let mut chars = value.chars();
    let last = chars.next_back()?;
    let prefix = chars.as_str();
    (prefix.is_empty() || prefix.eq_ignore_ascii_case("color") || prefix.eq_ignore_ascii_case("accent"))
        .then_some(last)
}

fn invalid_scheme(value: &str, line: usize) -> ParseError {
    ParseError::InvalidScheme {
        line,
        token: value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

pub(super) fn write(descriptor: &LayoutDescriptor) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "theme:{}", descriptor.theme);
    let _ = writeln!(
        out,
        "size:{}x{}",
        descriptor.grid_size.cols, descriptor.grid_size.rows
    );
    for p in &descriptor.placements {
        let _ = write!(out, "type={}", p.kind.key());
        if p.kind.binds_metric() {
            let _ = write!(out, ",metric={}", p.metric_key);
        }
        let _ = writeln!(
            out,
            ",start_x={},end_x={},start_y={},end_y={},color={},accent={}",
            p.rect.col,
            p.rect.end_col() - 1,
            p.rect.row,
            p.rect.end_row() - 1,
            p.color_scheme.letter(),
            p.accent_scheme.letter(),
        );
    }
    out
}
