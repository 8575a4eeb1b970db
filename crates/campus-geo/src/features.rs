//! # Feature Collection Decoding
//!
//! Parses GeoJSON feature-collection documents into typed `MapFeature`s
//! carrying geographic rings and the handful of properties this pipeline
//! reads (`fill`, `estimated_height`). MultiPolygon geometry is flattened
//! into one feature per polygon so every downstream solid maps 1:1 to a
//! feature.
//!
//! ## Table of Contents
//! 1. MapFeature / FeatureGeometry — Typed features
//! 2. Property readers
//! 3. Parsing
//! 4. ImportError

use geojson::{GeoJson, Value};
use serde_json::Map;
use std::path::Path;

// ============================================================================
// 1. MapFeature / FeatureGeometry — Typed features
// ============================================================================

/// A decoded geospatial feature, immutable once loaded
#[derive(Debug, Clone)]
pub struct MapFeature {
    /// Geometry in geographic [lon, lat] coordinates
    pub geometry: FeatureGeometry,
    /// Raw GeoJSON properties
    pub properties: Option<Map<String, serde_json::Value>>,
}

/// Geometry kinds consumed by the pipeline. `Point` is part of the schema
/// but unused by the current spawn logic.
#[derive(Debug, Clone)]
pub enum FeatureGeometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
    /// Rings: index 0 is the outer ring, the rest are holes
    Polygon(Vec<Vec<[f64; 2]>>),
}

// ============================================================================
// 2. Property readers
// ============================================================================

impl MapFeature {
    /// The `fill` property, if present. The walkway dataset uses the value
    /// `#ff0000` as a hole-ring discriminator, not as a rendering color.
    pub fn fill(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.get("fill"))
            .and_then(|v| v.as_str())
    }

    /// The `estimated_height` property coerced to a number. Accepts JSON
    /// numbers and numeric strings; anything else reads as absent.
    pub fn estimated_height(&self) -> Option<f64> {
        let value = self.properties.as_ref()?.get("estimated_height")?;
        match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

// ============================================================================
// 3. Parsing
// ============================================================================

/// Parse a GeoJSON feature-collection document into typed features.
/// Unsupported geometry kinds are skipped.
pub fn parse_feature_collection(text: &str) -> Result<Vec<MapFeature>, ImportError> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e| ImportError::Parse(format!("{}", e)))?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(ImportError::Parse(
                "expected a FeatureCollection, got bare geometry".to_string(),
            ))
        }
    };

    let mut out = Vec::with_capacity(features.len());
    for feature in features {
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let properties = feature.properties;
        match geometry.value {
            Value::Point(coord) => out.push(MapFeature {
                geometry: FeatureGeometry::Point(lonlat(&coord)?),
                properties,
            }),
            Value::LineString(coords) => out.push(MapFeature {
                geometry: FeatureGeometry::LineString(ring(&coords)?),
                properties,
            }),
            Value::Polygon(rings) => out.push(MapFeature {
                geometry: FeatureGeometry::Polygon(
                    rings.iter().map(|r| ring(r)).collect::<Result<_, _>>()?,
                ),
                properties,
            }),
            // One feature per member polygon; each clone keeps the shared
            // properties so height resolution sees the same attributes.
            Value::MultiPolygon(polys) => {
                for rings in &polys {
                    out.push(MapFeature {
                        geometry: FeatureGeometry::Polygon(
                            rings.iter().map(|r| ring(r)).collect::<Result<_, _>>()?,
                        ),
                        properties: properties.clone(),
                    });
                }
            }
            _ => {
                tracing::debug!("Skipping unsupported geometry kind");
            }
        }
    }
    Ok(out)
}

/// Read and parse a feature-collection file
pub fn import_feature_collection(path: &Path) -> Result<Vec<MapFeature>, ImportError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ImportError::Io(path.to_path_buf(), e))?;
    let features = parse_feature_collection(&content)
        .map_err(|e| e.with_path(path))?;
    tracing::info!("Imported {} features from {}", features.len(), path.display());
    Ok(features)
}

/// GeoJSON positions may legally carry extra components, but fewer than 2
/// is malformed. A short position fails the whole document so the source
/// is skipped, never a panic inside a loader task.
fn lonlat(coord: &[f64]) -> Result<[f64; 2], ImportError> {
    if coord.len() < 2 {
        return Err(ImportError::Parse(format!(
            "position has {} component(s), expected at least 2",
            coord.len()
        )));
    }
    Ok([coord[0], coord[1]])
}

fn ring(coords: &[Vec<f64>]) -> Result<Vec<[f64; 2]>, ImportError> {
    coords.iter().map(|c| lonlat(c)).collect()
}

// ============================================================================
// 4. ImportError
// ============================================================================

/// Errors from decoding a feature collection
#[derive(Debug)]
pub enum ImportError {
    /// File I/O error
    Io(std::path::PathBuf, std::io::Error),
    /// GeoJSON parse error
    Parse(String),
}

impl ImportError {
    fn with_path(self, path: &Path) -> Self {
        match self {
            ImportError::Parse(msg) => {
                ImportError::Parse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        }
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(path, e) => write!(f, "Failed to read {}: {}", path.display(), e),
            ImportError::Parse(e) => write!(f, "Failed to parse feature collection: {}", e),
        }
    }
}

impl std::error::Error for ImportError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(features_json: &str) -> Vec<MapFeature> {
        let doc = format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features_json
        );
        parse_feature_collection(&doc).unwrap()
    }

    fn polygon_feature(properties: &str) -> String {
        format!(
            r#"{{"type":"Feature","properties":{},"geometry":{{"type":"Polygon",
                "coordinates":[[[20.96,41.985],[20.961,41.985],[20.961,41.986],[20.96,41.985]]]}}}}"#,
            properties
        )
    }

    #[test]
    fn test_parses_polygon_rings() {
        let features = collection(&polygon_feature("{}"));
        assert_eq!(features.len(), 1);
        let FeatureGeometry::Polygon(rings) = &features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 4);
        assert_eq!(rings[0][1], [20.961, 41.985]);
    }

    #[test]
    fn test_multipolygon_flattens_with_shared_properties() {
        let features = collection(
            r#"{"type":"Feature","properties":{"estimated_height":7},"geometry":{
                "type":"MultiPolygon","coordinates":[
                  [[[0.0,0.0],[1.0,0.0],[1.0,1.0]]],
                  [[[2.0,2.0],[3.0,2.0],[3.0,3.0]]]
                ]}}"#,
        );
        assert_eq!(features.len(), 2);
        for f in &features {
            assert_eq!(f.estimated_height(), Some(7.0));
            assert!(matches!(f.geometry, FeatureGeometry::Polygon(_)));
        }
    }

    #[test]
    fn test_estimated_height_coercion() {
        let number = collection(&polygon_feature(r#"{"estimated_height":12.5}"#));
        assert_eq!(number[0].estimated_height(), Some(12.5));

        let string = collection(&polygon_feature(r#"{"estimated_height":"5"}"#));
        assert_eq!(string[0].estimated_height(), Some(5.0));

        let junk = collection(&polygon_feature(r#"{"estimated_height":"abc"}"#));
        assert_eq!(junk[0].estimated_height(), None);

        let absent = collection(&polygon_feature("{}"));
        assert_eq!(absent[0].estimated_height(), None);
    }

    #[test]
    fn test_fill_reader() {
        let features = collection(&polygon_feature(r##"{"fill":"#ff0000"}"##));
        assert_eq!(features[0].fill(), Some("#ff0000"));
    }

    #[test]
    fn test_malformed_document_is_a_parse_error() {
        let err = parse_feature_collection("{not json").unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }

    #[test]
    fn test_truncated_position_is_a_parse_error_not_a_panic() {
        // geojson accepts an empty position, so the guard has to be ours
        let doc = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"LineString",
             "coordinates":[[],[20.96,41.985]]}}]}"#;
        let err = parse_feature_collection(doc).unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));

        let doc = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Polygon",
             "coordinates":[[[20.96,41.985],[20.961],[20.96,41.986]]]}}]}"#;
        let err = parse_feature_collection(doc).unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }

    #[test]
    fn test_line_and_point_kinds() {
        let features = collection(
            r#"{"type":"Feature","properties":{},"geometry":{"type":"LineString",
                "coordinates":[[20.96,41.985],[20.962,41.986]]}},
               {"type":"Feature","properties":{},"geometry":{"type":"Point",
                "coordinates":[20.96,41.985]}}"#,
        );
        assert_eq!(features.len(), 2);
        assert!(matches!(features[0].geometry, FeatureGeometry::LineString(_)));
        assert!(matches!(features[1].geometry, FeatureGeometry::Point(_)));
    }
}
