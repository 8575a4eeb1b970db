//! # Layer Components
//!
//! Identity components attached to every spawned campus solid: which layer
//! a solid belongs to, the building id for picking, and a world-space AABB
//! used by the hit-test controller.

use bevy::prelude::*;

/// Which dataset a solid came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Walkway,
    Road,
    Parking,
    Building,
}

/// Attached to every spawned campus solid.
#[derive(Component, Debug, Clone, Copy)]
pub struct CampusLayer {
    pub kind: LayerKind,
}

impl CampusLayer {
    pub fn new(kind: LayerKind) -> Self {
        Self { kind }
    }
}

/// Identity tag present only on building solids. The id is the source file
/// stem with the `building_` prefix stripped.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct BuildingTag {
    pub id: String,
}

impl BuildingTag {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// World-space axis-aligned bounds of a spawned solid, queried by the
/// hit-test controller instead of per-triangle raycasts.
#[derive(Component, Debug, Clone, Copy)]
pub struct SolidBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl SolidBounds {
    /// Bounding box of a set of world-space points. Returns a degenerate
    /// empty box for an empty slice.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut any = false;
        for p in points {
            min = min.min(p);
            max = max.max(p);
            any = true;
        }
        if !any {
            return Self {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            };
        }
        Self { min, max }
    }

    /// Bounds of a planar footprint extruded from y = 0 up to `depth`.
    /// Planar (x east, y north) maps to world (X, −Z).
    pub fn from_footprint(footprint: &[Vec2], depth: f32) -> Self {
        let mut bounds = Self::from_points(
            footprint.iter().map(|v| Vec3::new(v.x, 0.0, -v.y)),
        );
        bounds.max.y = bounds.max.y.max(depth);
        bounds.min.y = bounds.min.y.min(depth.min(0.0));
        bounds
    }
}
