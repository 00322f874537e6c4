use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Number, Value as JsonValue};
use crate::{error::Result, types::AnalysisResult};

/// Closed contours with enough positions for a linear ring become polygons.
/// A single-pixel region becomes a point, a two-pixel one a line.
fn contour_geometry(boundary: &[[u32; 2]]) -> Value {
    let positions: Vec<Vec<f64>> = boundary
        .iter()
        .map(|&[x, y]| vec![x as f64, y as f64])
        .collect();

    if positions.len() >= 4 {
        return Value::Polygon(vec![positions]);
    }
    match positions.first() {
        Some(first) if positions.iter().all(|p| p == first) => Value::Point(first.clone()),
        _ => Value::LineString(positions.into_iter().take(2).collect()),
    }
}

impl AnalysisResult {
    /// Export region contours as GeoJSON features in pixel coordinates.
    ///
    /// The classification and frame size travel as foreign members of the
    /// collection.
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .regions
            .iter()
            .map(|region| {
                let geometry = Geometry::new(contour_geometry(&region.boundary));
                let bbox = region
                    .bounding_box()
                    .map(|([x0, y0], [x1, y1])| vec![x0 as f64, y0 as f64, x1 as f64, y1 as f64]);

                let mut properties = Map::new();
                properties.insert("id".to_string(), JsonValue::Number(Number::from(region.id)));
                properties.insert("pixel_count".to_string(), JsonValue::Number(Number::from(region.pixel_count)));
                properties.insert(
                    "perimeter".to_string(),
                    JsonValue::Number(Number::from_f64(region.perimeter()).unwrap_or(Number::from(0))),
                );

                Feature {
                    bbox,
                    geometry: Some(geometry),
                    id: Some(geojson::feature::Id::Number(Number::from(region.id))),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let mut foreign_members = Map::new();
        foreign_members.insert("image_width".to_string(), JsonValue::Number(Number::from(self.image_width)));
        foreign_members.insert("image_height".to_string(), JsonValue::Number(Number::from(self.image_height)));
        foreign_members.insert("object_count".to_string(), JsonValue::Number(Number::from(self.object_count)));
        foreign_members.insert("threshold".to_string(), JsonValue::Number(Number::from(self.threshold)));
        foreign_members.insert("potable".to_string(), JsonValue::Bool(self.potable));
        foreign_members.insert("risk_level".to_string(), JsonValue::String(self.risk_level.to_string()));
        foreign_members.insert(
            "purification_method".to_string(),
            JsonValue::String(self.purification_method.to_string()),
        );

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        }
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_geojson())?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }
}
