//! Map layer assembly.
//!
//! Turns plot rows into colored map features and renders them as GeoJSON for
//! whatever map frontend draws them. Alerted plots are outlined in red.

use crate::alerts::{AlertIndex, Issue};
use crate::color::{Color, ColorScale};
use crate::types::{NumericColumn, PlotRecord};
use serde_json::{json, Value};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point { lat: f64, lon: f64 },
    /// Ring of `[lat, lon]` vertices.
    Polygon(Vec<[f64; 2]>),
}

/// Parse a stored plot geometry.
///
/// A JSON array of `[lat, lon]` pairs is a polygon; otherwise a WKT point
/// `POINT (lon lat)` is expected.
pub fn parse_geometry(text: &str) -> Option<Geometry> {
    let text = text.trim();
    if text.starts_with('[') {
        let ring: Vec<[f64; 2]> = serde_json::from_str(text).ok()?;
        return (!ring.is_empty()).then_some(Geometry::Polygon(ring));
    }
    parse_wkt_point(text)
}

fn parse_wkt_point(text: &str) -> Option<Geometry> {
    let (tag, rest) = text.split_once('(')?;
    if !tag.trim().eq_ignore_ascii_case("POINT") {
        return None;
    }
    let inner = rest.trim_end().strip_suffix(')')?;
    let mut coords = inner.split_whitespace().map(|c| c.parse::<f64>().ok());
    let lon = coords.next()??;
    let lat = coords.next()??;
    if coords.next().is_some() || !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    Some(Geometry::Point { lat, lon })
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapFeature {
    pub plot_id: String,
    pub owner: String,
    pub crop: String,
    pub geometry: Geometry,
    pub fill_color: Color,
    pub border_color: Color,
    pub weight: u8,
    pub fill_opacity: f64,
    pub issues: Vec<Issue>,
    /// Popup figures, `None` where the cell is missing or unreadable.
    pub details: Vec<(&'static str, Option<f64>)>,
}

#[derive(Debug, Clone)]
pub struct MapLayer {
    pub scale: ColorScale,
    pub features: Vec<MapFeature>,
    /// Rows left off the map because their geometry could not be read.
    pub skipped: usize,
}

pub const POINT_RADIUS: u8 = 6;

const POPUP_COLUMNS: [NumericColumn; 10] = [
    NumericColumn::SizeHa,
    NumericColumn::ExpectedYield,
    NumericColumn::ActualYield,
    NumericColumn::TotalRevenue,
    NumericColumn::TotalExpense,
    NumericColumn::Profit,
    NumericColumn::ProfitMargin,
    NumericColumn::RtTemperature,
    NumericColumn::RtHumidity,
    NumericColumn::RtRainfall,
];

/// Build one feature per row with a readable geometry.
pub fn build_features(data: &[PlotRecord], alerts: &AlertIndex, scale: &ColorScale) -> MapLayer {
    let mut features = Vec::with_capacity(data.len());
    let mut skipped = 0usize;

    for r in data {
        let raw = r.location_geometry.as_deref().unwrap_or("");
        let Some(geometry) = parse_geometry(raw) else {
            warn!(plot_id = %r.plot_id, owner = r.owner(), "unreadable plot geometry");
            skipped += 1;
            continue;
        };
        let fill_color = scale.color_for_record(r);
        let issues = alerts.get(&r.plot_id).cloned().unwrap_or_default();
        let alerted = alerts.contains_key(&r.plot_id);
        let fill_opacity = match geometry {
            Geometry::Polygon(_) => 0.6,
            Geometry::Point { .. } => 0.7,
        };
        features.push(MapFeature {
            plot_id: r.plot_id.clone(),
            owner: r.owner().to_string(),
            crop: r.crop().to_string(),
            geometry,
            fill_color,
            border_color: if alerted { Color::RED } else { fill_color },
            weight: if alerted { 3 } else { 1 },
            fill_opacity,
            issues,
            details: POPUP_COLUMNS
                .iter()
                .map(|&col| (col.name(), r.numeric(col)))
                .collect(),
        });
    }

    MapLayer {
        scale: scale.clone(),
        features,
        skipped,
    }
}

impl MapLayer {
    /// GeoJSON FeatureCollection with a `legend` foreign member.
    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self
            .features
            .iter()
            .map(|f| {
                let (geometry, radius) = match &f.geometry {
                    Geometry::Point { lat, lon } => (
                        json!({ "type": "Point", "coordinates": [lon, lat] }),
                        Some(POINT_RADIUS),
                    ),
                    Geometry::Polygon(ring) => {
                        let mut coords: Vec<[f64; 2]> =
                            ring.iter().map(|[lat, lon]| [*lon, *lat]).collect();
                        if coords.first() != coords.last() {
                            coords.push(coords[0]);
                        }
                        (json!({ "type": "Polygon", "coordinates": [coords] }), None)
                    }
                };
                let details: serde_json::Map<String, Value> = f
                    .details
                    .iter()
                    .map(|(name, value)| (name.to_string(), json!(value)))
                    .collect();
                json!({
                    "type": "Feature",
                    "geometry": geometry,
                    "properties": {
                        "plot_id": f.plot_id,
                        "owner": f.owner,
                        "crop": f.crop,
                        "fill": f.fill_color,
                        "fill-opacity": f.fill_opacity,
                        "stroke": f.border_color,
                        "stroke-width": f.weight,
                        "radius": radius,
                        "alerts": f.issues,
                        "details": details,
                    }
                })
            })
            .collect();

        let stops: Vec<Value> = self
            .scale
            .stops()
            .into_iter()
            .map(|(value, color)| json!({ "value": value, "color": color }))
            .collect();

        json!({
            "type": "FeatureCollection",
            "features": features,
            "legend": {
                "caption": self.scale.caption,
                "metric": self.scale.metric,
                "min": self.scale.domain_min,
                "max": self.scale.domain_max,
                "stops": stops,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::detect_risks_map;
    use crate::color::{build_scale, Metric};

    fn plot(id: &str, geometry: &str, margin: &str) -> PlotRecord {
        PlotRecord {
            location_geometry: Some(geometry.to_string()),
            ..PlotRecord::new(id)
        }
        .with(NumericColumn::ProfitMargin, margin)
    }

    #[test]
    fn test_parse_wkt_point() {
        assert_eq!(
            parse_geometry("POINT (-0.2 5.55)"),
            Some(Geometry::Point { lat: 5.55, lon: -0.2 })
        );
        assert_eq!(
            parse_geometry("point(-1.6 6.7)"),
            Some(Geometry::Point { lat: 6.7, lon: -1.6 })
        );
        assert_eq!(parse_geometry("POINT (1)"), None);
        assert_eq!(parse_geometry("LINESTRING (0 0, 1 1)"), None);
        assert_eq!(parse_geometry(""), None);
        assert_eq!(parse_geometry("None"), None);
    }

    #[test]
    fn test_parse_polygon() {
        let g = parse_geometry("[[5.5, -0.2], [5.6, -0.2], [5.6, -0.1]]");
        assert_eq!(
            g,
            Some(Geometry::Polygon(vec![[5.5, -0.2], [5.6, -0.2], [5.6, -0.1]]))
        );
        assert_eq!(parse_geometry("[]"), None);
        assert_eq!(parse_geometry("[[1, 2], oops]"), None);
    }

    #[test]
    fn test_build_features_styles_alerts() {
        let data = vec![
            plot("P1", "POINT (-0.2 5.55)", "-10"),
            plot("P2", "[[5.5, -0.2], [5.6, -0.2], [5.6, -0.1]]", "100"),
            plot("P3", "garbage", "-40"),
        ];
        let alerts = detect_risks_map(&data);
        let scale = build_scale(&data, Metric::ProfitMargin);
        let layer = build_features(&data, &alerts, &scale);

        assert_eq!(layer.features.len(), 2);
        assert_eq!(layer.skipped, 1);

        let p1 = &layer.features[0];
        assert_eq!(p1.border_color, Color::RED);
        assert_eq!(p1.weight, 3);
        assert_eq!(p1.fill_opacity, 0.7);
        assert_eq!(p1.issues, vec![Issue::NegativeProfit]);

        let p2 = &layer.features[1];
        assert_eq!(p2.fill_color, Color::GREEN);
        assert_eq!(p2.border_color, Color::GREEN);
        assert_eq!(p2.weight, 1);
        assert_eq!(p2.fill_opacity, 0.6);
        assert!(p2.issues.is_empty());
    }

    #[test]
    fn test_geojson_output() {
        let data = vec![
            plot("P1", "POINT (-0.2 5.55)", "-10"),
            plot("P2", "[[5.5, -0.2], [5.6, -0.2], [5.6, -0.1]]", "100"),
        ];
        let alerts = detect_risks_map(&data);
        let scale = build_scale(&data, Metric::ProfitMargin);
        let geojson = build_features(&data, &alerts, &scale).to_geojson();

        assert_eq!(geojson["type"], "FeatureCollection");
        let point = &geojson["features"][0];
        assert_eq!(point["geometry"]["coordinates"], json!([-0.2, 5.55]));
        assert_eq!(point["properties"]["stroke"], "#ff0000");
        assert_eq!(point["properties"]["alerts"], json!(["Negative profit"]));
        assert_eq!(point["properties"]["radius"], 6);
        assert_eq!(point["properties"]["details"]["profit_margin"], -10.0);
        assert!(point["properties"]["details"]["rt_rainfall"].is_null());

        let ring = &geojson["features"][1]["geometry"]["coordinates"][0];
        assert_eq!(ring.as_array().map(|r| r.len()), Some(4));
        assert_eq!(ring[0], ring[3]);
        assert_eq!(ring[0], json!([-0.2, 5.5]));

        assert_eq!(geojson["legend"]["caption"], "Profit Margin (%)");
        assert_eq!(geojson["legend"]["min"], -50.0);
        assert_eq!(geojson["legend"]["stops"][1]["color"], "#ffff00");
    }
}
