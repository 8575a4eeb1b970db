//! # Coordinate Projection and Bounds Filtering
//!
//! Maps geographic (lon, lat) pairs into a flat local planar frame and from
//! there into Bevy world space. The projection is a fixed local-tangent
//! approximation, not a real map projection: planar units are simply scaled
//! degree offsets from a session-constant origin.
//!
//! ## Pipeline
//! ```text
//! Geographic (lon, lat)  →  Planar (x east, y north)  →  Bevy (X east, Y up, Z south)
//! ```
//!
//! ## Table of Contents
//! 1. MapOrigin — Projection origin and scale
//! 2. GeoBounds — Inclusive region-of-interest predicate

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::config::CampusConfig;

// ============================================================================
// 1. MapOrigin — Projection origin and scale
// ============================================================================

/// The geographic origin and scale of the planar frame.
/// Fixed for the whole session; projecting the origin yields (0, 0).
#[derive(Debug, Clone, Copy, Resource)]
pub struct MapOrigin {
    /// Origin longitude (WGS84 degrees)
    pub lon: f64,
    /// Origin latitude (WGS84 degrees)
    pub lat: f64,
    /// Degrees → planar units multiplier
    pub scale: f64,
}

impl MapOrigin {
    pub fn new(lon: f64, lat: f64, scale: f64) -> Self {
        Self { lon, lat, scale }
    }

    /// Project a geographic pair into the planar frame.
    ///
    /// Pure arithmetic: `((lon - origin.lon) * scale, (lat - origin.lat) * scale)`.
    /// NaN input propagates as NaN; callers guard upstream.
    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        DVec2::new((lon - self.lon) * self.scale, (lat - self.lat) * self.scale)
    }

    /// Project a geographic pair straight into Bevy world space.
    ///
    /// Axis mapping: planar X (east) → Bevy +X, planar Y (north) → Bevy −Z,
    /// `elevation` → Bevy +Y.
    pub fn to_world(&self, lon: f64, lat: f64, elevation: f32) -> Vec3 {
        let p = self.project(lon, lat);
        Vec3::new(p.x as f32, elevation, -(p.y as f32))
    }

    /// Project a ring of [lon, lat] pairs into planar Vec2 points,
    /// preserving input order.
    pub fn project_ring(&self, ring: &[[f64; 2]]) -> Vec<Vec2> {
        ring.iter()
            .map(|c| {
                let p = self.project(c[0], c[1]);
                Vec2::new(p.x as f32, p.y as f32)
            })
            .collect()
    }

    /// Project a line of [lon, lat] pairs into Bevy world points at a fixed
    /// elevation, preserving input order.
    pub fn project_line_to_world(&self, line: &[[f64; 2]], elevation: f32) -> Vec<Vec3> {
        line.iter()
            .map(|c| self.to_world(c[0], c[1], elevation))
            .collect()
    }
}

impl From<&CampusConfig> for MapOrigin {
    fn from(config: &CampusConfig) -> Self {
        Self::new(
            config.project.origin_lon,
            config.project.origin_lat,
            config.project.scale,
        )
    }
}

// ============================================================================
// 2. GeoBounds — Inclusive region-of-interest predicate
// ============================================================================

/// Fixed geographic rectangle; constant for the process lifetime.
#[derive(Debug, Clone, Copy, Resource)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    /// True iff the pair lies inside the rectangle, inclusive on all edges
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// True iff every pair of the ring is in bounds. Vacuously true for an
    /// empty ring; callers reject empty rings before filtering.
    pub fn contains_ring(&self, ring: &[[f64; 2]]) -> bool {
        ring.iter().all(|c| self.contains(c[0], c[1]))
    }
}

impl From<&CampusConfig> for GeoBounds {
    fn from(config: &CampusConfig) -> Self {
        Self {
            min_lon: config.bounds.min_lon,
            max_lon: config.bounds.max_lon,
            min_lat: config.bounds.min_lat,
            max_lat: config.bounds.max_lat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn campus_origin() -> MapOrigin {
        MapOrigin::new(20.96, 41.985, 100_000.0)
    }

    fn campus_bounds() -> GeoBounds {
        GeoBounds::from(&CampusConfig::default())
    }

    #[test]
    fn test_projection_formula() {
        let origin = campus_origin();
        let p = origin.project(20.97, 41.99);
        assert_relative_eq!(p.x, (20.97 - 20.96) * 100_000.0, max_relative = 1e-12);
        assert_relative_eq!(p.y, (41.99 - 41.985) * 100_000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_origin_projects_to_zero() {
        let origin = campus_origin();
        let p = origin.project(20.96, 41.985);
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_projection_is_deterministic() {
        let origin = campus_origin();
        assert_eq!(origin.project(20.963, 41.9871), origin.project(20.963, 41.9871));
    }

    #[test]
    fn test_nan_propagates() {
        let origin = campus_origin();
        let p = origin.project(f64::NAN, 41.99);
        assert!(p.x.is_nan());
        assert!(!p.y.is_nan());
    }

    #[test]
    fn test_world_axis_mapping() {
        let origin = campus_origin();
        // North of the origin lands at negative Z
        let w = origin.to_world(20.96, 41.99, 5.0);
        assert_relative_eq!(w.x, 0.0);
        assert_relative_eq!(w.y, 5.0);
        assert!(w.z < 0.0);
    }

    #[test]
    fn test_bounds_corners_are_inclusive() {
        let b = campus_bounds();
        let corners = [
            [b.min_lon, b.min_lat],
            [b.min_lon, b.max_lat],
            [b.max_lon, b.min_lat],
            [b.max_lon, b.max_lat],
        ];
        assert!(b.contains_ring(&corners));
    }

    #[test]
    fn test_bounds_rejects_single_outlier() {
        let b = campus_bounds();
        let mut ring = vec![
            [b.min_lon, b.min_lat],
            [b.max_lon, b.max_lat],
        ];
        assert!(b.contains_ring(&ring));
        // One point one degree past any edge poisons the whole ring
        ring.push([b.max_lon + 1.0, b.min_lat]);
        assert!(!b.contains_ring(&ring));
    }

    #[test]
    fn test_empty_ring_is_vacuously_in_bounds() {
        let b = campus_bounds();
        assert!(b.contains_ring(&[]));
    }
}
