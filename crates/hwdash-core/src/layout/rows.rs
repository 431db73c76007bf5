// Row-grid grammar: each line is a grid row of `[kind metric RxC...]` tokens.
//
// Tokens fill the row left to right. `[]` leaves one column empty. A widget
// token skips columns already covered by a taller widget from a row above.

use std::collections::BTreeSet;

use super::{Line, ParseError, WidgetPlacement};
use crate::card::{AccentScheme, ColorScheme, ContentKind};
use crate::grid::{GridCoord, GridRect, MAX_GRID_EXTENT};

/// Parse body lines. Returns the placements and the number of rows the body
/// declares (blank interior lines count as empty rows).
pub(super) fn parse(lines: &[Line<'_>]) -> Result<(Vec<WidgetPlacement>, usize), ParseError> {
    if let Some((number, _)) = lines.get(MAX_GRID_EXTENT) {
        return Err(ParseError::Malformed {
            line: *number,
            message: format!("more than {MAX_GRID_EXTENT} rows"),
        });
    }

    let mut covered: BTreeSet<GridCoord> = BTreeSet::new();
    let mut placements = Vec::new();

    for (row, (number, text)) in lines.iter().enumerate() {
        let mut col = 0;
        for token in split_tokens(text, *number)? {
            if token.is_empty() {
                col += 1;
                continue;
            }
            while covered.contains(&GridCoord::new(row, col)) {
                col += 1;
            }
            let placement = parse_token(token, row, col, *number)?;
            if !within_limit(&placement.rect) {
                return Err(ParseError::Malformed {
                    line: *number,
                    message: format!(
                        "`{token}` at {} extends past {MAX_GRID_EXTENT} cells",
                        placement.rect.origin()
                    ),
                });
            }
            covered.extend(placement.rect.cells());
            col += placement.rect.col_span;
            placements.push(placement);
        }
    }

    Ok((placements, lines.len()))
}

fn within_limit(rect: &GridRect) -> bool {
    let end_row = rect.row.checked_add(rect.row_span);
    let end_col = rect.col.checked_add(rect.col_span);
    matches!((end_row, end_col), (Some(r), Some(c)) if r <= MAX_GRID_EXTENT && c <= MAX_GRID_EXTENT)
}

/// Split a row line into the trimmed contents of its bracket tokens.
fn split_tokens(text: &str, line: usize) -> Result<Vec<&str>, ParseError> {
    let mut tokens = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        let Some(after_open) = rest.strip_prefix('[') else {
            if rest.starts_with(']') {
                return Err(ParseError::UnbalancedBrackets { line });
            }
            let stray = rest.split('[').next().unwrap_or(rest).trim();
            return Err(ParseError::StrayText {
                line,
                text: stray.to_string(),
            });
        };
        let close = after_open
            .find(']')
            .ok_or(ParseError::UnbalancedBrackets { line })?;
        let inner = &after_open[..close];
        if inner.contains('[') {
            return Err(ParseError::UnbalancedBrackets { line });
        }
        tokens.push(inner.trim());
        rest = after_open[close + 1..].trim_start();
    }
    Ok(tokens)
}

/// `kind metric RxC[colorX][accentY]`, or `separator RxC` for spacers.
fn parse_token(token: &str, row: usize, col: usize, line: usize) -> Result<WidgetPlacement, ParseError> {
    let mut words = token.split_whitespace();
    let kind_word = words.next().unwrap_or_default();
    let kind = ContentKind::from_key(kind_word).ok_or_else(|| ParseError::UnknownWidgetType {
        line,
        token: kind_word.to_string(),
    })?;

    let metric_key = if kind.binds_metric() {
        words
            .next()
            .ok_or_else(|| ParseError::Missing {
                line,
                what: format!("metric for `{kind_word}`"),
            })?
            .to_string()
    } else {
        String::new()
    };

    let span_word = words.next().ok_or_else(|| ParseError::Missing {
        line,
        what: format!("span for `{kind_word}`"),
    })?;
    let (row_span, col_span, suffix) = parse_span(span_word, line)?;

    // Schemes may be glued to the span or follow as separate words.
    let schemes: String = std::iter::once(suffix).chain(words).collect();
    let (color_scheme, accent_scheme) = parse_schemes(&schemes, line)?;

    Ok(WidgetPlacement {
        kind,
        metric_key,
        rect: GridRect::new(row, col, row_span, col_span),
        color_scheme,
        accent_scheme,
    })
}

/// `RxC` followed by an optional scheme suffix. Spans are `1..=MAX_GRID_EXTENT`.
fn parse_span(word: &str, line: usize) -> Result<(usize, usize, &str), ParseError> {
    let invalid = || ParseError::InvalidSpan {
        line,
        token: word.to_string(),
    };
    let (rows, rest) = word.split_once(['x', 'X']).ok_or_else(invalid)?;
    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (cols, suffix) = rest.split_at(digits);

    let row_span: usize = rows.parse().map_err(|_| invalid())?;
    let col_span: usize = cols.parse().map_err(|_| invalid())?;
    if !(1..=MAX_GRID_EXTENT).contains(&row_span) || !(1..=MAX_GRID_EXTENT).contains(&col_span) {
        return Err(invalid());
    }
    Ok((row_span, col_span, suffix))
}

/// Any order of `color<A|B>` and `accent<A|B|C>`, case-insensitive letters.
/// Absent schemes default to `A`.
fn parse_schemes(text: &str, line: usize) -> Result<(ColorScheme, AccentScheme), ParseError> {
    let invalid = || ParseError::InvalidScheme {
        line,
        token: text.to_string(),
    };
    let mut color = ColorScheme::default();
    let mut accent = AccentScheme::default();
    let mut rest = text;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("color") {
            let letter = after.chars().next().ok_or_else(invalid)?;
            color = ColorScheme::from_letter(letter).ok_or_else(invalid)?;
            rest = &after[letter.len_utf8()..];
        } else if let Some(after) = rest.strip_prefix("accent") {
            let letter = after.chars().next().ok_or_else(invalid)?;
            accent = AccentScheme::from_letter(letter).ok_or_else(invalid)?;
            rest = &after[letter.len_utf8()..];
        } else {
            return Err(invalid());
        }
    }
    Ok((color, accent))
}
