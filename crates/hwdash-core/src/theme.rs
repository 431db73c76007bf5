// Theme store: named palettes of colors keyed by role.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("failed to read themes file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid themes JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid color `{value}`")]
    Color { value: String },
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or `rgba(r, g, b, a)` where
    /// `a` is a fraction in `[0, 1]`.
    pub fn parse(value: &str) -> Result<Self, ThemeError> {
        let s = value.trim();
        let invalid = || ThemeError::Color {
            value: value.to_string(),
        };
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }
        if let Some(args) = s.strip_prefix("rgba(").and_then(|rest| rest.strip_suffix(')')) {
            return parse_rgba_args(args).ok_or_else(invalid);
        }
        Err(invalid())
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|n| n * 17);
            Some(Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
        }
        6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: byte(6)?,
        }),
        _ => None,
    }
}

fn parse_rgba_args(args: &str) -> Option<Rgba> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let [r, g, b, a] = parts.as_slice() else {
        return None;
    };
    let alpha: f64 = a.parse().ok()?;
    if !(0.0..=1.0).contains(&alpha) {
        return None;
    }
    Some(Rgba {
        r: r.parse().ok()?,
        g: g.parse().ok()?,
        b: b.parse().ok()?,
        a: (alpha * 255.0).round() as u8,
    })
}

// ---------------------------------------------------------------------------
// ThemeStore
// ---------------------------------------------------------------------------

pub type Palette = BTreeMap<String, Rgba>;

const LIGHT: &[(&str, Rgba)] = &[
    ("background", Rgba::rgb(0xf0, 0xf0, 0xf0)),
    ("card_background", Rgba::rgb(0xff, 0xff, 0xff)),
    ("card_background_2", Rgba::rgb(0xe4, 0xe8, 0xee)),
    ("text_big", Rgba::rgb(0x20, 0x20, 0x20)),
    ("text_small", Rgba::rgb(0x55, 0x55, 0x55)),
    ("chart", Rgba::rgb(0xf5, 0x91, 0x21)),
    ("chart_2", Rgba::rgb(0x9d, 0x20, 0x62)),
    ("chart_3", Rgba::rgb(0x39, 0xb8, 0xe3)),
    ("chart_legend", Rgba::rgb(0xaa, 0xaa, 0xaa)),
    ("add_button", Rgba::rgb(0x39, 0xb8, 0xe3)),
    ("edit_mode_button", Rgba::rgb(0x9d, 0x20, 0x62)),
    ("preview", Rgba::rgb(0x39, 0xb8, 0xe3)),
];

const DARK: &[(&str, Rgba)] = &[
    ("background", Rgba::rgb(0x20, 0x20, 0x20)),
    ("card_background", Rgba::rgb(0x19, 0x19, 0x19)),
    ("card_background_2", Rgba::rgb(0x2a, 0x2d, 0x33)),
    ("text_big", Rgba::rgb(0xff, 0xff, 0xff)),
    ("text_small", Rgba::rgb(0xd1, 0xd1, 0xd1)),
    ("chart", Rgba::rgb(0xf5, 0x91, 0x21)),
    ("chart_2", Rgba::rgb(0x9d, 0x20, 0x62)),
    ("chart_3", Rgba::rgb(0x39, 0xb8, 0xe3)),
    ("chart_legend", Rgba::rgb(0x55, 0x55, 0x55)),
    ("add_button", Rgba::rgb(0xf5, 0x91, 0x21)),
    ("edit_mode_button", Rgba::rgb(0x39, 0xb8, 0xe3)),
    ("preview", Rgba::rgb(0xf5, 0x91, 0x21)),
];

fn palette(entries: &[(&str, Rgba)]) -> Palette {
    entries
        .iter()
        .map(|(key, color)| (key.to_string(), *color))
        .collect()
}

/// Named palettes plus the currently selected one.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    themes: BTreeMap<String, Palette>,
    current: String,
}

impl Default for ThemeStore {
    fn default() -> Self {
        ThemeStore::builtin()
    }
}

impl ThemeStore {
    /// Built-in `light` and `dark` palettes, `light` selected.
    pub fn builtin() -> Self {
        let mut themes = BTreeMap::new();
        themes.insert("light".to_string(), palette(LIGHT));
        themes.insert("dark".to_string(), palette(DARK));
        ThemeStore {
            themes,
            current: "light".to_string(),
        }
    }

    /// Merge themes from a JSON object of `{ "name": { "key": "color" } }`.
    ///
    /// Keys merge into an existing theme of the same name. Non-string values
    /// (font sizes and the like) are ignored. Returns the merged theme names.
    pub fn merge_json(&mut self, text: &str, path: &Path) -> Result<Vec<String>, ThemeError> {
        let raw: BTreeMap<String, BTreeMap<String, serde_json::Value>> =
            serde_json::from_str(text).map_err(|e| ThemeError::Json {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut merged = Vec::new();
        for (name, entries) in raw {
            let palette = self.themes.entry(name.clone()).or_default();
            for (key, value) in entries {
                let Some(text) = value.as_str() else {
                    debug!("theme {name}: skipping non-color key {key}");
                    continue;
                };
                palette.insert(key, Rgba::parse(text)?);
            }
            merged.push(name);
        }
        Ok(merged)
    }

    /// Read and merge a themes file.
    pub fn load_file(&mut self, path: &Path) -> Result<Vec<String>, ThemeError> {
        let text = std::fs::read_to_string(path).map_err(|e| ThemeError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let merged = self.merge_json(&text, path)?;
        info!("loaded {} theme(s) from {}", merged.len(), path.display());
        Ok(merged)
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    /// Select `name`. An unknown name logs a warning and keeps the current
    /// theme.
    pub fn set_theme(&mut self, name: &str) -> bool {
        if self.themes.contains_key(name) {
            self.current = name.to_string();
            true
        } else {
            warn!("theme `{name}` not found; keeping `{}`", self.current);
            false
        }
    }

    /// Flip between `light` and `dark`. Any other theme switches to `light`.
    pub fn toggle(&mut self) -> &str {
        let next = if self.current == "light" { "dark" } else { "light" };
        self.set_theme(next);
        &self.current
    }

    /// Color for `key` in the current theme, black when undefined.
    pub fn color_for(&self, key: &str) -> Rgba {
        self.themes
            .get(&self.current)
            .and_then(|palette| palette.get(key))
            .copied()
            .unwrap_or(Rgba::BLACK)
    }
}
