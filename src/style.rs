//! In-page extraction scripts and the filtering rules applied to their output.
//!
//! The scripts are self-contained expressions: they touch nothing but the
//! rendered document and hand back a JSON string. All filtering happens here,
//! on the Rust side.

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Collects the distinct computed `font-family` values of every body element,
/// in document order.
pub const FONT_SCRIPT: &str = r#"(function() {
    const seen = new Set();
    document.querySelectorAll('body *:not(script):not(style)').forEach(function(el) {
        const family = window.getComputedStyle(el).getPropertyValue('font-family');
        if (family) seen.add(family);
    });
    return JSON.stringify(Array.from(seen));
})()"#;

/// Collects one distinct style sample per body element, in document order.
pub const COLOR_SCRIPT: &str = r#"(function() {
    const seen = new Set();
    const samples = [];
    document.querySelectorAll('body *:not(script):not(style)').forEach(function(el) {
        const style = window.getComputedStyle(el);
        const sample = {
            color: style.getPropertyValue('color'),
            background: style.getPropertyValue('background-color'),
            opacity: style.getPropertyValue('opacity'),
            display: style.display,
            visibility: style.visibility,
            className: el.getAttribute('class') || ''
        };
        const key = JSON.stringify(sample);
        if (!seen.has(key)) {
            seen.add(key);
            samples.push(sample);
        }
    });
    return JSON.stringify(samples);
})()"#;

/// Maximum number of colors reported per page.
pub const MAX_COLORS: usize = 4;

const GENERIC_FAMILIES: [&str; 5] = ["serif", "sans-serif", "monospace", "cursive", "fantasy"];
const IGNORED_FAMILIES: [&str; 3] = ["inherit", "-apple-system", "none"];
// Icon fonts and chat widgets
const ICON_FONT_MARKERS: [&str; 4] = ["font awesome", "eicons", "qlwapp", "whatsapp"];

fn rgb_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"rgb\((\d+),\s*(\d+),\s*(\d+)\)").expect("valid rgb regex"))
}

fn icon_class_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)icon|whatsapp|social|svg|eicon").expect("valid icon regex"))
}

/// A font reported for the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontEntry {
    /// Primary family name as rendered
    pub name: String,
    /// CSS value with a `sans-serif` fallback appended
    pub family: String,
}

impl FontEntry {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let family = format!("{}, sans-serif", name);
        Self { name, family }
    }
}

/// The response body of a successful analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// URL as requested by the caller
    pub url: String,
    pub fonts: Vec<FontEntry>,
    /// `#rrggbb` strings, at most `MAX_COLORS`
    pub colors: Vec<String>,
    /// ISO-8601 UTC time the result was assembled
    pub timestamp: String,
}

impl AnalysisResult {
    pub fn new(url: impl Into<String>, fonts: Vec<String>, colors: Vec<String>) -> Self {
        Self {
            url: url.into(),
            fonts: fonts.into_iter().map(FontEntry::new).collect(),
            colors: colors.into_iter().filter(|c| c.starts_with('#')).collect(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// Computed style of one element, as reported by `COLOR_SCRIPT`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleSample {
    pub color: String,
    pub background: String,
    pub opacity: String,
    pub display: String,
    pub visibility: String,
    pub class_name: String,
}

impl StyleSample {
    /// Opacity as a number; unparsable values count as fully opaque.
    pub fn opacity(&self) -> f64 {
        self.opacity
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(1.0)
    }

    pub fn is_visible(&self) -> bool {
        self.opacity() >= 0.1 && self.display != "none" && self.visibility != "hidden"
    }

    pub fn is_icon(&self) -> bool {
        icon_class_pattern().is_match(&self.class_name)
    }
}

/// Reduce a computed `font-family` value to its primary family, or `None`
/// when that family is generic, a keyword, or an icon font.
pub fn primary_font(font_family: &str) -> Option<String> {
    let first = font_family.split(',').next().unwrap_or("");
    let name = first
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    if name.is_empty() {
        return None;
    }

    let lower = name.to_lowercase();
    if GENERIC_FAMILIES.contains(&lower.as_str()) || IGNORED_FAMILIES.contains(&lower.as_str()) {
        return None;
    }
    if ICON_FONT_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return None;
    }
    Some(name.to_string())
}

/// Primary font names in first-seen order, without duplicates.
pub fn collect_fonts<I, S>(font_families: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    font_families
        .into_iter()
        .filter_map(|raw| primary_font(raw.as_ref()))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Convert an opaque `rgb(R, G, B)` value to `#rrggbb`.
///
/// Values with an alpha channel (`rgba(...)`) do not match and yield `None`.
pub fn rgb_to_hex(value: &str) -> Option<String> {
    let caps = rgb_pattern().captures(value)?;
    let component = |i: usize| caps.get(i)?.as_str().parse::<u64>().ok();
    let (r, g, b) = (component(1)?, component(2)?, component(3)?);

    let packed = (1u64 << 24)
        .checked_add(r.checked_mul(1 << 16)?)?
        .checked_add(g.checked_mul(1 << 8)?)?
        .checked_add(b)?;
    let hex = format!("{:x}", packed);
    Some(format!("#{}", &hex[hex.len() - 6..]))
}

/// Foreground and background colors of visible, non-icon elements, in
/// first-seen order, without black or duplicates, capped at `MAX_COLORS`.
pub fn collect_colors(samples: &[StyleSample]) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    for sample in samples.iter().filter(|s| s.is_visible() && !s.is_icon()) {
        for value in [&sample.color, &sample.background] {
            if !value.contains("rgb") {
                continue;
            }
            if let Some(hex) = rgb_to_hex(value) {
                if hex != "#000000" && !colors.contains(&hex) {
                    colors.push(hex);
                }
            }
        }
    }
    colors.truncate(MAX_COLORS);
    colors
}

/// Decode the JSON string returned by `FONT_SCRIPT`.
pub fn parse_font_payload(payload: &str) -> Result<Vec<String>> {
    serde_json::from_str(payload)
        .map_err(|e| Error::ScriptError(format!("Unexpected font payload: {}", e)))
}

/// Decode the JSON string returned by `COLOR_SCRIPT`.
pub fn parse_color_payload(payload: &str) -> Result<Vec<StyleSample>> {
    serde_json::from_str(payload)
        .map_err(|e| Error::ScriptError(format!("Unexpected color payload: {}", e)))
}
