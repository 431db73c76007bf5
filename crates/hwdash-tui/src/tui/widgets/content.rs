// Card content renderers: circular gauge, history graph, big number, spacer.
//
// Each renderer draws into the card's inner area and reads one metric. A
// metric with no current value renders as "N/A".

use std::f64::consts::{FRAC_PI_2, TAU};

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Gauge, Paragraph, Sparkline};
use ratatui::Frame;

use hwdash_core::card::{Card, ContentKind};
use hwdash_core::metrics::{MetricKind, MetricReading};
use hwdash_core::theme::ThemeStore;

use super::to_color;

/// Placeholder for a metric that currently has no value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Points per radius used to draw the gauge ring.
const RING_STEPS: usize = 96;

/// Radii of the two concentric circles that make up the ring.
const RING_RADII: [f64; 2] = [0.78, 0.9];

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Colors a card draws with, resolved from the current theme and the card's
/// schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardPalette {
    pub background: Color,
    pub text_big: Color,
    pub text_small: Color,
    pub accent: Color,
    pub legend: Color,
}

impl CardPalette {
    pub fn resolve(themes: &ThemeStore, card: &Card) -> Self {
        CardPalette {
            background: to_color(themes.color_for(card.color_scheme.background_key())),
            text_big: to_color(themes.color_for("text_big")),
            text_small: to_color(themes.color_for("text_small")),
            accent: to_color(themes.color_for(card.accent_scheme.chart_key())),
            legend: to_color(themes.color_for("chart_legend")),
        }
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// What a card shows, with the metric it is bound to. Swapping the metric
/// keeps the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardContent {
    Gauge(Option<MetricKind>),
    Graph(Option<MetricKind>),
    BigNumber(Option<MetricKind>),
    Spacer,
}

impl CardContent {
    pub fn for_card(card: &Card) -> Self {
        let mut content = match card.kind {
            ContentKind::Circle => CardContent::Gauge(None),
            ContentKind::Graph => CardContent::Graph(None),
            ContentKind::Text => CardContent::BigNumber(None),
            ContentKind::Separator => CardContent::Spacer,
        };
        if let Some(metric) = card.metric {
            content.bind(metric);
        }
        content
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            CardContent::Gauge(_) => ContentKind::Circle,
            CardContent::Graph(_) => ContentKind::Graph,
            CardContent::BigNumber(_) => ContentKind::Text,
            CardContent::Spacer => ContentKind::Separator,
        }
    }

    pub fn metric(&self) -> Option<MetricKind> {
        match *self {
            CardContent::Gauge(m) | CardContent::Graph(m) | CardContent::BigNumber(m) => m,
            CardContent::Spacer => None,
        }
    }

    /// Point the renderer at another metric. Spacers ignore this.
    pub fn bind(&mut self, metric: MetricKind) {
        match self {
            CardContent::Gauge(m) | CardContent::Graph(m) | CardContent::BigNumber(m) => {
                *m = Some(metric);
            }
            CardContent::Spacer => {}
        }
    }
}

/// Draw `content` into `area`. `reading` is the bound metric's state.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    content: CardContent,
    reading: Option<MetricReading<'_>>,
    palette: &CardPalette,
) {
    if area.is_empty() || content == CardContent::Spacer {
        return;
    }
    let Some(reading) = reading.filter(|r| Some(r.kind) == content.metric()) else {
        render_centered(frame, area, NOT_AVAILABLE, palette.text_small, palette.background);
        return;
    };
    match content {
        CardContent::Gauge(_) => render_gauge(frame, area, &reading, palette),
        CardContent::Graph(_) => render_graph(frame, area, &reading, palette),
        CardContent::BigNumber(_) => render_big_number(frame, area, &reading, palette),
        CardContent::Spacer => {}
    }
}

/// Formatted value for display, "N/A" when missing.
pub fn value_label(kind: MetricKind, value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => kind.format_value(v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Gauge fill in `[0, 1]`; zero when the value is missing or not finite.
pub fn fill_ratio(reading: &MetricReading<'_>, value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => reading.ratio(v),
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Gauge
// ---------------------------------------------------------------------------

fn render_gauge(frame: &mut Frame, area: Rect, reading: &MetricReading<'_>, palette: &CardPalette) {
    let fill = fill_ratio(reading, reading.smoothed);
    let label = value_label(reading.kind, reading.smoothed);

    // Too small for a ring: a horizontal bar still shows the fill.
    if area.width < 7 || area.height < 3 {
        let bar = Gauge::default()
            .gauge_style(Style::default().fg(palette.accent).bg(palette.background))
            .ratio(fill)
            .label(Span::styled(label, Style::default().fg(palette.text_big)));
        frame.render_widget(bar, area);
        return;
    }

    let (x_bounds, y_bounds) = ring_bounds(area);
    let (filled, track) = ring_points(fill);
    let column_width = (x_bounds[1] - x_bounds[0]) / f64::from(area.width);
    let label_x = -(label.chars().count() as f64) * column_width / 2.0;
    let label_style = Style::default()
        .fg(palette.text_big)
        .add_modifier(Modifier::BOLD);
    let (accent, legend) = (palette.accent, palette.legend);

    let canvas = Canvas::default()
        .background_color(palette.background)
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            ctx.draw(&Points {
                coords: &track,
                color: legend,
            });
            ctx.draw(&Points {
                coords: &filled,
                color: accent,
            });
            ctx.print(label_x, 0.0, Span::styled(label.clone(), label_style));
        });
    frame.render_widget(canvas, area);
}

/// Canvas bounds that keep the ring round. Terminal cells are about twice
/// as tall as they are wide.
pub fn ring_bounds(area: Rect) -> ([f64; 2], [f64; 2]) {
    let width = f64::from(area.width.max(1));
    let height = f64::from(area.height.max(1)) * 2.0;
    let (x, y) = if width >= height {
        (width / height, 1.0)
    } else {
        (1.0, height / width)
    };
    ([-x, x], [-y, y])
}

/// Ring points split into the filled arc and the remaining track. The arc
/// starts at twelve o'clock and runs clockwise.
pub fn ring_points(fill: f64) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let mut filled = Vec::new();
    let mut track = Vec::new();
    for step in 0..RING_STEPS {
        let t = step as f64 / RING_STEPS as f64;
        let angle = FRAC_PI_2 - t * TAU;
        for radius in RING_RADII {
            let point = (radius * angle.cos(), radius * angle.sin());
            if t < fill {
                filled.push(point);
            } else {
                track.push(point);
            }
        }
    }
    (filled, track)
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

fn render_graph(frame: &mut Frame, area: Rect, reading: &MetricReading<'_>, palette: &CardPalette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let label = value_label(reading.kind, reading.current);
    let header = Paragraph::new(Line::from(Span::styled(
        label,
        Style::default()
            .fg(palette.text_big)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Right)
    .style(Style::default().bg(palette.background));
    frame.render_widget(header, rows[0]);

    if rows[1].is_empty() {
        return;
    }
    let data = sparkline_data(reading, usize::from(rows[1].width));
    let sparkline = Sparkline::default()
        .data(data)
        .max(100)
        .style(Style::default().fg(palette.accent).bg(palette.background));
    frame.render_widget(sparkline, rows[1]);
}

/// The newest `width` history samples scaled to percent of the metric max.
pub fn sparkline_data(reading: &MetricReading<'_>, width: usize) -> Vec<u64> {
    let skip = reading.history.len().saturating_sub(width);
    reading
        .history
        .iter()
        .skip(skip)
        .map(|&v| (fill_ratio(reading, Some(v)) * 100.0).round() as u64)
        .collect()
}

// ---------------------------------------------------------------------------
// Big number
// ---------------------------------------------------------------------------

fn render_big_number(frame: &mut Frame, area: Rect, reading: &MetricReading<'_>, palette: &CardPalette) {
    let label = value_label(reading.kind, reading.current);
    render_centered(frame, area, &label, palette.text_big, palette.background);
}

fn render_centered(frame: &mut Frame, area: Rect, text: &str, fg: Color, bg: Color) {
    let mut lines = vec![Line::default(); usize::from(area.height.saturating_sub(1) / 2)];
    lines.push(Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(fg).add_modifier(Modifier::BOLD),
    )));
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
