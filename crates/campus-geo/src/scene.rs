//! # Solid Assembly
//!
//! Turns parsed feature collections into spawnable solids: projected,
//! bounds-filtered, assembled into outlines, and extruded. Everything here
//! is pure data-in / data-out so the pipeline is testable without a render
//! loop; the ingestion drain system owns the actual entity spawning.
//!
//! ## Table of Contents
//! 1. SolidSpec — one spawnable solid
//! 2. Walkway assembly (hole pooling)
//! 3. Road/parking assembly (bounds-filtered)
//! 4. Building assembly (attribute-driven depth)

use bevy::prelude::*;

use crate::config::CampusConfig;
use crate::coords::{GeoBounds, MapOrigin};
use crate::extrude::{extrude_prism, sweep_ribbon};
use crate::features::{FeatureGeometry, MapFeature};
use crate::layers::{BuildingTag, LayerKind, SolidBounds};
use crate::outline::{attach_holes, Outline};

// ============================================================================
// 1. SolidSpec
// ============================================================================

/// One assembled solid, ready to spawn: its mesh, world transform, layer
/// identity, optional building tag, and hit-test bounds.
pub struct SolidSpec {
    pub mesh: Mesh,
    pub transform: Transform,
    pub layer: LayerKind,
    pub tag: Option<BuildingTag>,
    pub bounds: SolidBounds,
}

// ============================================================================
// 2. Walkway assembly
// ============================================================================

/// Assemble walkway solids. Features whose `fill` matches the configured
/// hole sentinel contribute hole rings; everything else contributes a
/// surface outline. The hole pool spans the whole dataset and is attached
/// to every surface (optionally containment-scoped).
pub fn build_walkway_solids(
    features: &[MapFeature],
    origin: &MapOrigin,
    config: &CampusConfig,
) -> Vec<SolidSpec> {
    let walkways = &config.walkways;
    let mut hole_pool: Vec<Vec<Vec2>> = Vec::new();
    let mut surfaces: Vec<Outline> = Vec::new();

    for feature in features {
        let FeatureGeometry::Polygon(rings) = &feature.geometry else {
            continue;
        };
        let Some(outer) = rings.first() else {
            continue;
        };
        let projected = origin.project_ring(outer);
        if feature.fill() == Some(walkways.hole_fill.as_str()) {
            hole_pool.push(projected);
        } else {
            surfaces.push(Outline::new(projected));
        }
    }

    let count = surfaces.len();
    let solids: Vec<SolidSpec> =
        attach_holes(surfaces, &hole_pool, walkways.scope_holes_by_containment)
            .iter()
            .filter_map(|outline| {
                let mesh = extrude_prism(outline, walkways.depth)?;
                Some(SolidSpec {
                    mesh,
                    transform: Transform::IDENTITY,
                    layer: LayerKind::Walkway,
                    tag: None,
                    bounds: SolidBounds::from_footprint(&outline.outer, walkways.depth),
                })
            })
            .collect();
    if solids.len() < count {
        tracing::warn!(
            "Dropped {} degenerate walkway outline(s)",
            count - solids.len()
        );
    }
    solids
}

// ============================================================================
// 3. Road/parking assembly
// ============================================================================

/// Assemble the roads/areas dataset. LineStrings sweep into road ribbons,
/// polygons extrude into flat parking slabs. Features with ANY vertex
/// outside the campus bounds are discarded before projection.
pub fn build_road_solids(
    features: &[MapFeature],
    origin: &MapOrigin,
    bounds: &GeoBounds,
    config: &CampusConfig,
) -> Vec<SolidSpec> {
    let mut solids = Vec::new();
    for feature in features {
        match &feature.geometry {
            FeatureGeometry::LineString(line) => {
                if line.is_empty() || !bounds.contains_ring(line) {
                    continue;
                }
                let path = origin.project_line_to_world(line, 0.0);
                let Some(mesh) = sweep_ribbon(&path, config.roads.width, config.roads.steps)
                else {
                    continue;
                };
                let half_w = config.roads.width * 0.5;
                let mut hit = SolidBounds::from_points(path.iter().copied());
                hit.min -= Vec3::new(half_w, 0.0, half_w);
                hit.max += Vec3::new(half_w, config.roads.lift, half_w);
                solids.push(SolidSpec {
                    mesh,
                    transform: Transform::from_xyz(0.0, config.roads.lift, 0.0),
                    layer: LayerKind::Road,
                    tag: None,
                    bounds: hit,
                });
            }
            FeatureGeometry::Polygon(rings) => {
                let Some(outer) = rings.first() else { continue };
                if outer.is_empty() || !bounds.contains_ring(outer) {
                    continue;
                }
                let holes = rings[1..]
                    .iter()
                    .map(|ring| origin.project_ring(ring))
                    .collect();
                let outline = Outline::with_holes(origin.project_ring(outer), holes);
                let Some(mesh) = extrude_prism(&outline, config.areas.depth) else {
                    continue;
                };
                let mut hit = SolidBounds::from_footprint(&outline.outer, config.areas.depth);
                hit.min.y += config.areas.lift;
                hit.max.y += config.areas.lift;
                solids.push(SolidSpec {
                    mesh,
                    transform: Transform::from_xyz(0.0, config.areas.lift, 0.0),
                    layer: LayerKind::Parking,
                    tag: None,
                    bounds: hit,
                });
            }
            FeatureGeometry::Point(_) => {}
        }
    }
    solids
}

// ============================================================================
// 4. Building assembly
// ============================================================================

/// Resolve a building's extrusion depth. Absent, non-finite, or
/// non-positive heights fall back to the configured default before the
/// multiplier is applied.
pub fn resolve_building_depth(estimated_height: Option<f64>, config: &CampusConfig) -> f32 {
    let height = estimated_height
        .filter(|h| h.is_finite() && *h > 0.0)
        .unwrap_or(config.buildings.default_height);
    (height * config.buildings.height_multiplier) as f32
}

/// Assemble one building file's polygons into tagged solids. All polygons
/// in the file share the building id; interior rings become voids in the
/// owning polygon only.
pub fn build_building_solids(
    features: &[MapFeature],
    origin: &MapOrigin,
    config: &CampusConfig,
    id: &str,
) -> Vec<SolidSpec> {
    let mut solids = Vec::new();
    for feature in features {
        let FeatureGeometry::Polygon(rings) = &feature.geometry else {
            continue;
        };
        let Some(outer) = rings.first() else { continue };
        let depth = resolve_building_depth(feature.estimated_height(), config);
        let holes = rings[1..]
            .iter()
            .map(|ring| origin.project_ring(ring))
            .collect();
        let outline = Outline::with_holes(origin.project_ring(outer), holes);
        let Some(mesh) = extrude_prism(&outline, depth) else {
            tracing::warn!("Skipping degenerate footprint in building {}", id);
            continue;
        };
        solids.push(SolidSpec {
            mesh,
            transform: Transform::IDENTITY,
            layer: LayerKind::Building,
            tag: Some(BuildingTag::new(id)),
            bounds: SolidBounds::from_footprint(&outline.outer, depth),
        });
    }
    solids
}

/// Building id from a source file name: `building_12.geojson` → `12`.
pub fn building_id_from_file(file_name: &str) -> String {
    file_name
        .trim_end_matches(".geojson")
        .trim_start_matches("building_")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::{json, Map};

    fn origin() -> MapOrigin {
        MapOrigin::new(20.96, 41.985, 100_000.0)
    }

    fn polygon(rings: Vec<Vec<[f64; 2]>>, props: serde_json::Value) -> MapFeature {
        let properties = match props {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            _ => Some(Map::new()),
        };
        MapFeature {
            geometry: FeatureGeometry::Polygon(rings),
            properties,
        }
    }

    fn square_ring(lon0: f64, lat0: f64, size: f64) -> Vec<[f64; 2]> {
        vec![
            [lon0, lat0],
            [lon0 + size, lat0],
            [lon0 + size, lat0 + size],
            [lon0, lat0 + size],
        ]
    }

    #[test]
    fn test_walkway_holes_pool_across_surfaces() {
        let surface_a = polygon(vec![square_ring(20.96, 41.985, 0.001)], json!({}));
        let surface_b = polygon(vec![square_ring(20.962, 41.985, 0.001)], json!({}));
        let hole = polygon(
            vec![square_ring(20.9604, 41.9854, 0.0002)],
            json!({"fill": "#ff0000"}),
        );
        let config = CampusConfig::default();
        let solids =
            build_walkway_solids(&[surface_a, surface_b, hole], &origin(), &config);
        // The hole feature spawns no surface; the pooled hole ring reaches
        // BOTH surfaces, so each solid carries 8 combined cap vertices and
        // 8 wall quads
        assert_eq!(solids.len(), 2);
        for solid in &solids {
            assert_eq!(solid.layer, LayerKind::Walkway);
            let verts = solid
                .mesh
                .attribute(Mesh::ATTRIBUTE_POSITION)
                .unwrap()
                .len();
            assert_eq!(verts, 2 * 8 + 8 * 4);
        }
        // The first surface geometrically contains the hole, so its caps
        // triangulate to n + 2h - 2 = 8 triangles each
        assert_eq!(solids[0].mesh.indices().unwrap().len(), 2 * 8 * 3 + 8 * 6);
    }

    #[test]
    fn test_road_outside_bounds_is_discarded() {
        let inside = MapFeature {
            geometry: FeatureGeometry::LineString(vec![
                [20.960, 41.985],
                [20.961, 41.986],
                [20.962, 41.987],
            ]),
            properties: None,
        };
        let straddling = MapFeature {
            geometry: FeatureGeometry::LineString(vec![[20.960, 41.985], [21.5, 41.985]]),
            properties: None,
        };
        let config = CampusConfig::default();
        let bounds = GeoBounds::from(&config);
        let solids = build_road_solids(&[inside, straddling], &origin(), &bounds, &config);
        assert_eq!(solids.len(), 1);
        assert_eq!(solids[0].layer, LayerKind::Road);
        assert_relative_eq!(solids[0].transform.translation.y, config.roads.lift);
    }

    #[test]
    fn test_parking_polygon_extrudes_flat() {
        let lot = polygon(vec![square_ring(20.960, 41.985, 0.0005)], json!({}));
        let config = CampusConfig::default();
        let bounds = GeoBounds::from(&config);
        let solids = build_road_solids(&[lot], &origin(), &bounds, &config);
        assert_eq!(solids.len(), 1);
        assert_eq!(solids[0].layer, LayerKind::Parking);
        assert_relative_eq!(solids[0].bounds.max.y - solids[0].bounds.min.y, 0.05);
    }

    #[test]
    fn test_building_depth_semantics() {
        let config = CampusConfig::default();
        assert_relative_eq!(resolve_building_depth(None, &config), 30.0);
        assert_relative_eq!(resolve_building_depth(Some(5.0), &config), 15.0);
        assert_relative_eq!(resolve_building_depth(Some(12.5), &config), 37.5);
        assert_relative_eq!(resolve_building_depth(Some(0.0), &config), 30.0);
        assert_relative_eq!(resolve_building_depth(Some(f64::NAN), &config), 30.0);
    }

    #[test]
    fn test_building_solids_are_tagged() {
        let feature = polygon(
            vec![square_ring(20.960, 41.985, 0.0005)],
            json!({"estimated_height": "5"}),
        );
        let config = CampusConfig::default();
        let solids = build_building_solids(&[feature], &origin(), &config, "7");
        assert_eq!(solids.len(), 1);
        assert_eq!(solids[0].tag, Some(BuildingTag::new("7")));
        assert_relative_eq!(solids[0].bounds.max.y, 15.0);
    }

    #[test]
    fn test_building_id_from_file() {
        assert_eq!(building_id_from_file("building_12.geojson"), "12");
        assert_eq!(building_id_from_file("building_1.geojson"), "1");
    }
}
