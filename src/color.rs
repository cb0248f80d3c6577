//! Metric-to-color mapping for the farm map.
//!
//! Each selectable metric maps to a dataset column, a domain policy and a
//! fixed color ramp. A [`ColorScale`] stretches the ramp linearly across the
//! domain; values outside it take the nearest end color and missing values
//! take the color at the domain minimum.

use crate::error::DashboardError;
use crate::types::{NumericColumn, PlotRecord};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const RED: Color = Color::rgb(0xff, 0x00, 0x00);
    pub const YELLOW: Color = Color::rgb(0xff, 0xff, 0x00);
    pub const GREEN: Color = Color::rgb(0x00, 0x80, 0x00);
    pub const BLUE: Color = Color::rgb(0x00, 0x00, 0xff);
    pub const LIGHT_BLUE: Color = Color::rgb(0xad, 0xd8, 0xe6);
    pub const ORANGE: Color = Color::rgb(0xff, 0xa5, 0x00);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const DARK_BLUE: Color = Color::rgb(0x00, 0x00, 0x8b);

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channel-wise linear blend, `t` in `[0, 1]`.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color::rgb(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Metrics the map can be colored by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    ProfitMargin,
    Temperature,
    Rainfall,
    Humidity,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::ProfitMargin,
        Metric::Temperature,
        Metric::Rainfall,
        Metric::Humidity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::ProfitMargin => "Profit Margin",
            Metric::Temperature => "Temperature",
            Metric::Rainfall => "Rainfall",
            Metric::Humidity => "Humidity",
        }
    }

    fn spec(self) -> &'static MetricSpec {
        match self {
            Metric::ProfitMargin => &METRIC_SPECS[0],
            Metric::Temperature => &METRIC_SPECS[1],
            Metric::Rainfall => &METRIC_SPECS[2],
            Metric::Humidity => &METRIC_SPECS[3],
        }
    }

    pub fn column(self) -> NumericColumn {
        self.spec().column
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = DashboardError;

    /// Accepts the display name (`"Profit Margin"`) or a snake/kebab form
    /// (`profit_margin`, `profit-margin`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        Metric::ALL
            .into_iter()
            .find(|m| m.name().replace(' ', "").to_lowercase() == wanted)
            .ok_or_else(|| DashboardError::UnknownMetric(s.to_string()))
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Column, domain policy and ramp for one metric.
struct MetricSpec {
    column: NumericColumn,
    domain: fn(&[f64]) -> (f64, f64),
    ramp: &'static [Color],
    caption: &'static str,
}

const PROFIT_RAMP: [Color; 3] = [Color::RED, Color::YELLOW, Color::GREEN];
const TEMPERATURE_RAMP: [Color; 4] = [Color::BLUE, Color::LIGHT_BLUE, Color::ORANGE, Color::RED];
const RAINFALL_RAMP: [Color; 4] = [
    Color::WHITE,
    Color::LIGHT_BLUE,
    Color::BLUE,
    Color::DARK_BLUE,
];
const HUMIDITY_RAMP: [Color; 3] = [
    Color::rgb(0xf7, 0xfb, 0xff),
    Color::rgb(0x6b, 0xae, 0xd6),
    Color::rgb(0x08, 0x30, 0x6b),
];

/// Indexed by [`Metric::spec`]; keep the order of [`Metric::ALL`].
static METRIC_SPECS: [MetricSpec; 4] = [
    MetricSpec {
        column: NumericColumn::ProfitMargin,
        domain: profit_margin_domain,
        ramp: &PROFIT_RAMP,
        caption: "Profit Margin (%)",
    },
    MetricSpec {
        column: NumericColumn::RtTemperature,
        domain: temperature_domain,
        ramp: &TEMPERATURE_RAMP,
        caption: "Temperature (°C)",
    },
    MetricSpec {
        column: NumericColumn::RtRainfall,
        domain: rainfall_domain,
        ramp: &RAINFALL_RAMP,
        caption: "Rainfall (mm)",
    },
    MetricSpec {
        column: NumericColumn::RtHumidity,
        domain: humidity_domain,
        ramp: &HUMIDITY_RAMP,
        caption: "Humidity (%)",
    },
];

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn widen_if_flat((lo, hi): (f64, f64)) -> (f64, f64) {
    if lo == hi {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo, hi)
    }
}

fn profit_margin_domain(_: &[f64]) -> (f64, f64) {
    (-50.0, 100.0)
}

fn temperature_domain(values: &[f64]) -> (f64, f64) {
    widen_if_flat(min_max(values).unwrap_or((0.0, 40.0)))
}

fn rainfall_domain(values: &[f64]) -> (f64, f64) {
    let hi = min_max(values).map(|(_, hi)| hi).unwrap_or(10.0);
    if hi == 0.0 {
        (0.0, 1.0)
    } else {
        (0.0, hi)
    }
}

fn humidity_domain(values: &[f64]) -> (f64, f64) {
    widen_if_flat(min_max(values).unwrap_or((0.0, 100.0)))
}

/// A ramp stretched over a numeric domain. `domain_min != domain_max`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub metric: Metric,
    pub column: &'static str,
    pub domain_min: f64,
    pub domain_max: f64,
    pub ramp: Vec<Color>,
    pub caption: &'static str,
}

/// Derive the scale for `metric` from the values present in `data`.
///
/// Cells that do not coerce to a number are left out of the domain.
pub fn build_scale(data: &[PlotRecord], metric: Metric) -> ColorScale {
    let spec = metric.spec();
    let values: Vec<f64> = data.iter().filter_map(|r| r.numeric(spec.column)).collect();
    let (domain_min, domain_max) = (spec.domain)(&values);
    debug!(
        metric = metric.name(),
        values = values.len(),
        domain_min,
        domain_max,
        "color scale built"
    );
    ColorScale {
        metric,
        column: spec.column.name(),
        domain_min,
        domain_max,
        ramp: spec.ramp.to_vec(),
        caption: spec.caption,
    }
}

impl ColorScale {
    /// Color for `value`; `None` (or NaN) is drawn as `domain_min`.
    pub fn color_for(&self, value: Option<f64>) -> Color {
        let v = value.filter(|v| !v.is_nan()).unwrap_or(self.domain_min);
        let t = (v - self.domain_min) / (self.domain_max - self.domain_min);
        // An overflowing domain width turns `t` into NaN.
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self.ramp.as_slice() {
            [] => Color::WHITE,
            [only] => *only,
            ramp => {
                let segments = (ramp.len() - 1) as f64;
                let pos = t * segments;
                let i = (pos.floor() as usize).min(ramp.len() - 2);
                ramp[i].lerp(ramp[i + 1], pos - i as f64)
            }
        }
    }

    /// Color for the scale's column of `record`.
    pub fn color_for_record(&self, record: &PlotRecord) -> Color {
        color_for(self, record.numeric(self.metric.column()))
    }

    /// Ramp stops paired with the domain value they sit at, for legends.
    pub fn stops(&self) -> Vec<(f64, Color)> {
        let n = self.ramp.len();
        if n < 2 {
            return self.ramp.iter().map(|c| (self.domain_min, *c)).collect();
        }
        let step = (self.domain_max - self.domain_min) / (n - 1) as f64;
        self.ramp
            .iter()
            .enumerate()
            .map(|(i, c)| (self.domain_min + step * i as f64, *c))
            .collect()
    }
}

/// Free-function form of [`ColorScale::color_for`].
pub fn color_for(scale: &ColorScale, value: Option<f64>) -> Color {
    scale.color_for(value)
}
