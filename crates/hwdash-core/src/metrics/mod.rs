// Metrics feed: named hardware metrics, a pluggable sample source, and the
// bounded per-metric history the cards render from.

pub mod system;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, trace};

pub use system::SystemSource;

/// Number of most recent samples averaged for the gauge display.
pub const SMOOTHING_WINDOW: usize = 8;

// ---------------------------------------------------------------------------
// MetricKind
// ---------------------------------------------------------------------------

/// A hardware metric a card can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricKind {
    Cpu,
    Memory,
    Gpu,
    GpuTemp,
    GpuMemory,
    Ping,
    FanSpeed,
}

/// Display unit of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Percent,
    Gigabytes,
    Celsius,
    Millis,
}

/// Static description of a metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub unit: Unit,
    /// Scale maximum until the source reports a real one.
    pub default_max: f64,
}

const METRIC_SPECS: [MetricSpec; 7] = [
    MetricSpec { key: "cpu", title: "CPU", unit: Unit::Percent, default_max: 100.0 },
    MetricSpec { key: "memory", title: "Memory", unit: Unit::Gigabytes, default_max: 16.0 },
    MetricSpec { key: "gpu", title: "GPU", unit: Unit::Percent, default_max: 100.0 },
    MetricSpec { key: "gpu_temp", title: "GPU Temp", unit: Unit::Celsius, default_max: 100.0 },
    MetricSpec { key: "gpu_memory", title: "GPU Memory", unit: Unit::Gigabytes, default_max: 8.0 },
    MetricSpec { key: "ping", title: "Ping", unit: Unit::Millis, default_max: 200.0 },
    MetricSpec { key: "fan_speed", title: "Fan", unit: Unit::Percent, default_max: 100.0 },
];

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        MetricKind::Cpu,
        MetricKind::Memory,
        MetricKind::Gpu,
        MetricKind::GpuTemp,
        MetricKind::GpuMemory,
        MetricKind::Ping,
        MetricKind::FanSpeed,
    ];

    pub fn spec(self) -> &'static MetricSpec {
        &METRIC_SPECS[self as usize]
    }

    /// Identifier used in layout files.
    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn title(self) -> &'static str {
        self.spec().title
    }

    /// Whether the value comes from the GPU query.
    pub fn is_gpu(self) -> bool {
        matches!(
            self,
            MetricKind::Gpu | MetricKind::GpuTemp | MetricKind::GpuMemory | MetricKind::FanSpeed
        )
    }

    /// Resolve a layout identifier. Case-insensitive; the legacy `_usage`
    /// and `_history` suffixes and the `ram` alias are accepted.
    pub fn from_key(s: &str) -> Option<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        let base = lowered
            .strip_suffix("_history")
            .or_else(|| lowered.strip_suffix("_usage"))
            .unwrap_or(&lowered);
        match base {
            "ram" => Some(MetricKind::Memory),
            "fan" => Some(MetricKind::FanSpeed),
            other => MetricKind::ALL.into_iter().find(|kind| kind.key() == other),
        }
    }

    pub fn next(self) -> Self {
        MetricKind::ALL[(self as usize + 1) % MetricKind::ALL.len()]
    }

    /// Human display of a raw value in this metric's unit.
    pub fn format_value(self, value: f64) -> String {
        match self.spec().unit {
            Unit::Percent => format!("{value:.0}%"),
            Unit::Gigabytes => format!("{value:.1}GB"),
            Unit::Celsius => format!("{value:.0}°C"),
            Unit::Millis => format!("{value:.0}ms"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// One poll worth of readings. A metric missing from `values` was
/// unavailable on this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    pub values: BTreeMap<MetricKind, f64>,
    /// Scale maxima discovered by the source (total memory and the like).
    pub maxima: BTreeMap<MetricKind, f64>,
}

/// Something that can be polled for metric values.
pub trait MetricSource {
    /// Read the enabled metrics. Must not fail: unavailable metrics are
    /// simply left out of the sample.
    fn poll(&mut self, enabled: &BTreeSet<MetricKind>) -> Sample;
}

/// A source that never reports anything. Used when no hardware is wanted.
#[derive(Debug, Default)]
pub struct NullSource;

impl MetricSource for NullSource {
    fn poll(&mut self, _enabled: &BTreeSet<MetricKind>) -> Sample {
        Sample::default()
    }
}

// ---------------------------------------------------------------------------
// MetricsFeed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Series {
    current: Option<f64>,
    history: VecDeque<f64>,
    max: f64,
}

/// Read-only view of one metric for rendering.
#[derive(Debug, Clone, Copy)]
pub struct MetricReading<'a> {
    pub kind: MetricKind,
    pub current: Option<f64>,
    pub smoothed: Option<f64>,
    pub max: f64,
    pub history: &'a VecDeque<f64>,
}

impl MetricReading<'_> {
    /// `value / max` clamped to `[0, 1]`.
    pub fn ratio(&self, value: f64) -> f64 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (value / self.max).clamp(0.0, 1.0)
    }
}

/// Polls a [`MetricSource`] for the metrics cards are bound to and keeps a
/// bounded history per metric, newest last.
pub struct MetricsFeed {
    source: Box<dyn MetricSource>,
    enabled: BTreeSet<MetricKind>,
    series: BTreeMap<MetricKind, Series>,
    history_len: usize,
    ticks: u64,
}

impl MetricsFeed {
    pub fn new(source: Box<dyn MetricSource>, history_len: usize) -> Self {
        let series = MetricKind::ALL
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    Series {
                        current: None,
                        history: VecDeque::with_capacity(history_len),
                        max: kind.spec().default_max,
                    },
                )
            })
            .collect();
        MetricsFeed {
            source,
            enabled: BTreeSet::new(),
            series,
            history_len: history_len.max(1),
            ticks: 0,
        }
    }

    /// A feed with no hardware behind it.
    pub fn detached(history_len: usize) -> Self {
        MetricsFeed::new(Box::new(NullSource), history_len)
    }

    /// Start sampling `kind` from the next tick on. Idempotent.
    pub fn enable(&mut self, kind: MetricKind) {
        if self.enabled.insert(kind) {
            debug!("metric {} enabled", kind.key());
        }
    }

    /// Stop sampling `kind` and drop its history. Idempotent.
    pub fn disable(&mut self, kind: MetricKind) {
        if !self.enabled.remove(&kind) {
            return;
        }
        if let Some(series) = self.series.get_mut(&kind) {
            series.current = None;
            series.history.clear();
        }
        debug!("metric {} disabled", kind.key());
    }

    pub fn is_enabled(&self, kind: MetricKind) -> bool {
        self.enabled.contains(&kind)
    }

    pub fn enabled(&self) -> &BTreeSet<MetricKind> {
        &self.enabled
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Poll the source once and append to every enabled metric's history.
    pub fn tick(&mut self) {
        if self.enabled.is_empty() {
            self.ticks += 1;
            return;
        }
        let requested = self.enabled.clone();
        let sample = self.source.poll(&requested);
        self.record(&requested, sample);
    }

    /// Apply a sample taken elsewhere for the metrics in `requested`.
    /// Metrics enabled after the sample was requested keep their state.
    pub fn record(&mut self, requested: &BTreeSet<MetricKind>, sample: Sample) {
        self.ticks += 1;
        trace!(tick = self.ticks, values = sample.values.len(), "metrics sample");

        for (kind, max) in &sample.maxima {
            if let Some(series) = self.series.get_mut(kind) {
                if *max > 0.0 {
                    series.max = *max;
                }
            }
        }
        for kind in self.enabled.intersection(requested) {
            let Some(series) = self.series.get_mut(kind) else {
                continue;
            };
            match sample.values.get(kind) {
                Some(value) => {
                    series.current = Some(*value);
                    series.history.push_back(*value);
                    while series.history.len() > self.history_len {
                        series.history.pop_front();
                    }
                }
                None => series.current = None,
            }
        }
    }

    /// Latest value, `None` when the metric was unavailable on the last tick.
    pub fn current(&self, kind: MetricKind) -> Option<f64> {
        self.series.get(&kind).and_then(|s| s.current)
    }

    pub fn history(&self, kind: MetricKind) -> Vec<f64> {
        self.series
            .get(&kind)
            .map(|s| s.history.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn max_value(&self, kind: MetricKind) -> f64 {
        self.series
            .get(&kind)
            .map(|s| s.max)
            .unwrap_or_else(|| kind.spec().default_max)
    }

    /// Current value over the scale maximum, clamped to `[0, 1]`.
    pub fn normalized(&self, kind: MetricKind) -> Option<f64> {
        let current = self.current(kind)?;
        let max = self.max_value(kind);
        if max <= 0.0 {
            return Some(0.0);
        }
        Some((current / max).clamp(0.0, 1.0))
    }

    /// Mean of the last [`SMOOTHING_WINDOW`] samples, `None` when the
    /// metric is currently unavailable.
    pub fn smoothed(&self, kind: MetricKind) -> Option<f64> {
        let series = self.series.get(&kind)?;
        series.current?;
        smoothed_mean(&series.history)
    }

    /// Everything a renderer needs for `kind`.
    pub fn reading(&self, kind: MetricKind) -> Option<MetricReading<'_>> {
        let series = self.series.get(&kind)?;
        Some(MetricReading {
            kind,
            current: series.current,
            smoothed: series.current.and_then(|_| smoothed_mean(&series.history)),
            max: series.max,
            history: &series.history,
        })
    }
}

fn smoothed_mean(history: &VecDeque<f64>) -> Option<f64> {
    let window = history.len().min(SMOOTHING_WINDOW);
    if window == 0 {
        return None;
    }
    let sum: f64 = history.iter().rev().take(window).sum();
    Some(sum / window as f64)
}
