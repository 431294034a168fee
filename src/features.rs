// features.rs

use std::fs;
use std::io;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{GeoJson, JsonObject, JsonValue, Value};
use tracing::debug;

use crate::error::{MapError, Result};
use crate::schema::{NAME_KEY, REGION_KEY};

/// One gewog: its outline plus the raw properties the attributes are read from.
#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub region: Option<String>,
    pub name: Option<String>,
    pub geometry: Option<MultiPolygon<f64>>,
    pub properties: JsonObject,
}

impl Feature {
    /// Builds a feature from GeoJSON parts, pulling out the region and name keys.
    pub fn new(geometry: Option<MultiPolygon<f64>>, properties: JsonObject) -> Self {
        Feature {
            region: properties.get(REGION_KEY).and_then(property_text),
            name: properties.get(NAME_KEY).and_then(property_text),
            geometry,
            properties,
        }
    }

    /// Numeric value of `key`, or `None` when absent or not a JSON number.
    pub fn attribute(&self, key: &str) -> Option<f64> {
        self.properties
            .get(key)
            .and_then(JsonValue::as_f64)
            .filter(|v| v.is_finite())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Text form of a property used as a key. Null, empty strings, zero,
/// `false`, arrays and objects have none.
fn property_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        JsonValue::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

pub fn read_geojson(path: &Path) -> Result<GeoJson> {
    let file = fs::File::open(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = io::BufReader::new(file);
    GeoJson::from_reader(reader).map_err(|source| MapError::GeoJson {
        path: path.to_path_buf(),
        source: geojson::Error::MalformedJson(source),
    })
}

/// Loads every feature of a GeoJSON document.
///
/// A bare `Feature` or `Geometry` root is treated as a one-feature collection.
pub fn load_features(path: &Path) -> Result<Vec<Feature>> {
    let features = features_from_geojson(read_geojson(path)?);
    debug!(path = %path.display(), count = features.len(), "loaded features");
    Ok(features)
}

pub fn features_from_geojson(geojson: GeoJson) -> Vec<Feature> {
    match geojson {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .map(convert_feature)
            .collect(),
        GeoJson::Feature(feature) => vec![convert_feature(feature)],
        GeoJson::Geometry(geometry) => {
            vec![Feature::new(to_multi_polygon(&geometry.value), JsonObject::new())]
        }
    }
}

fn convert_feature(feature: geojson::Feature) -> Feature {
    let geometry = feature
        .geometry
        .as_ref()
        .and_then(|g| to_multi_polygon(&g.value));
    Feature::new(geometry, feature.properties.unwrap_or_default())
}

/// Polygonal part of a GeoJSON geometry. Points and lines carry no area and
/// are dropped.
pub fn to_multi_polygon(value: &Value) -> Option<MultiPolygon<f64>> {
    let mut polygons = Vec::new();
    collect_polygons(value, &mut polygons);
    if polygons.is_empty() {
        None
    } else {
        Some(MultiPolygon(polygons))
    }
}

fn collect_polygons(value: &Value, out: &mut Vec<Polygon<f64>>) {
    match value {
        Value::Polygon(rings) => out.extend(to_polygon(rings)),
        Value::MultiPolygon(multi_polygon) => {
            out.extend(multi_polygon.iter().filter_map(|rings| to_polygon(rings)));
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_polygons(&geometry.value, out);
            }
        }
        _ => {}
    }
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| to_ring(ring));
    let exterior = rings.next()?;
    if exterior.0.len() < 3 {
        return None;
    }
    Some(Polygon::new(exterior, rings.collect()))
}

fn to_ring(positions: &[Vec<f64>]) -> LineString<f64> {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(doc: serde_json::Value) -> Vec<Feature> {
        let geojson: GeoJson = doc.to_string().parse().unwrap();
        features_from_geojson(geojson)
    }

    #[test]
    fn reads_properties_and_geometry() {
        let features = parse(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]},
                "properties": {"_Dzongkhag": "Paro", "LAA": "Doga", "_PGA M": 0.31, "_PGA S": "n/a"}
            }]
        }));
        assert_eq!(features.len(), 1);
        let f = &features[0];
        assert_eq!(f.region.as_deref(), Some("Paro"));
        assert_eq!(f.display_name(), "Doga");
        assert_eq!(f.attribute("_PGA M"), Some(0.31));
        assert_eq!(f.attribute("_PGA S"), None);
        assert_eq!(f.attribute("_E Loss M (in BTN million)"), None);
        assert_eq!(f.geometry.as_ref().map(|g| g.0.len()), Some(1));
    }

    #[test]
    fn empty_or_null_region_is_absent() {
        let features = parse(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": null, "properties": {"_Dzongkhag": ""}},
                {"type": "Feature", "geometry": null, "properties": {"_Dzongkhag": null}},
                {"type": "Feature", "geometry": null, "properties": null},
                {"type": "Feature", "geometry": null, "properties": {"_Dzongkhag": 12}},
                {"type": "Feature", "geometry": null, "properties": {"_Dzongkhag": 0}},
                {"type": "Feature", "geometry": null, "properties": {"_Dzongkhag": false}},
                {"type": "Feature", "geometry": null, "properties": {"_Dzongkhag": true}}
            ]
        }));
        assert_eq!(features[0].region, None);
        assert_eq!(features[1].region, None);
        assert_eq!(features[2].region, None);
        assert_eq!(features[3].region.as_deref(), Some("12"));
        assert_eq!(features[4].region, None);
        assert_eq!(features[5].region, None);
        assert_eq!(features[6].region.as_deref(), Some("true"));
    }

    #[test]
    fn non_polygonal_geometry_is_dropped() {
        let features = parse(json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [1, 2]},
            "properties": {}
        }));
        assert_eq!(features.len(), 1);
        assert!(features[0].geometry.is_none());
    }
}
