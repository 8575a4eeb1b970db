//! # Outline Assembly
//!
//! Builds closed 2D outlines in the planar frame: an outer boundary plus
//! zero or more hole boundaries, consumed by the extrusion step. Vertices
//! are connected by straight edges in input order; the ring is closed
//! implicitly by extrusion, so a trailing vertex identical to the first is
//! dropped here.
//!
//! ## Table of Contents
//! 1. Outline — Outer ring and hole pool
//! 2. Hole attachment policies

use bevy::prelude::*;

// ============================================================================
// 1. Outline — Outer ring and hole pool
// ============================================================================

/// A closed 2D boundary with optional interior holes, in planar coordinates.
/// Hole containment is a caller contract, not enforced here.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    /// Outer boundary vertices in input order
    pub outer: Vec<Vec2>,
    /// Hole boundaries, each an independent closed ring
    pub holes: Vec<Vec<Vec2>>,
}

impl Outline {
    /// Assemble an outline from a projected outer ring, dropping a closing
    /// duplicate vertex if the source ring was explicitly closed.
    pub fn new(outer: Vec<Vec2>) -> Self {
        let mut outer = outer;
        drop_closing_duplicate(&mut outer);
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Assemble with hole rings; each hole is normalized the same way.
    pub fn with_holes(outer: Vec<Vec2>, holes: Vec<Vec<Vec2>>) -> Self {
        let mut outline = Self::new(outer);
        outline.holes = holes
            .into_iter()
            .map(|mut h| {
                drop_closing_duplicate(&mut h);
                h
            })
            .collect();
        outline
    }

    /// Fewer than 3 outer vertices cannot bound an area; extrusion skips
    /// degenerate outlines instead of producing a zero-area solid.
    pub fn is_degenerate(&self) -> bool {
        self.outer.len() < 3
    }

    /// Even-odd point-in-polygon test against the outer boundary only.
    /// Used by the containment-scoped hole policy.
    pub fn contains_point(&self, p: Vec2) -> bool {
        let n = self.outer.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.outer[i];
            let b = self.outer[j];
            if ((a.y > p.y) != (b.y > p.y))
                && (p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x)
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

fn drop_closing_duplicate(points: &mut Vec<Vec2>) {
    if points.len() >= 2 {
        let first = points[0];
        let last = *points.last().unwrap_or(&first);
        if (first.x - last.x).abs() < 1e-6 && (first.y - last.y).abs() < 1e-6 {
            points.pop();
        }
    }
}

// ============================================================================
// 2. Hole attachment policies
// ============================================================================

/// Attach holes from a dataset-wide pool to each outer outline.
///
/// The historical behavior attaches the FULL pool to EVERY outline, so an
/// outline may receive holes that are not geometrically inside it. With
/// `by_containment` set, a hole is attached only to outlines containing its
/// first vertex.
pub fn attach_holes(
    outlines: Vec<Outline>,
    hole_pool: &[Vec<Vec2>],
    by_containment: bool,
) -> Vec<Outline> {
    outlines
        .into_iter()
        .map(|mut outline| {
            outline.holes = hole_pool
                .iter()
                .filter(|hole| {
                    if !by_containment {
                        return true;
                    }
                    hole.first()
                        .map(|p| outline.contains_point(*p))
                        .unwrap_or(false)
                })
                .cloned()
                .collect();
            outline
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(origin: Vec2, size: f32) -> Vec<Vec2> {
        vec![
            origin,
            origin + Vec2::new(size, 0.0),
            origin + Vec2::new(size, size),
            origin + Vec2::new(0.0, size),
        ]
    }

    #[test]
    fn test_outline_preserves_vertex_order_and_count() {
        let ring = square(Vec2::ZERO, 10.0);
        let outline = Outline::new(ring.clone());
        assert_eq!(outline.outer, ring);
    }

    #[test]
    fn test_closing_duplicate_is_dropped() {
        let mut ring = square(Vec2::ZERO, 10.0);
        ring.push(ring[0]);
        let outline = Outline::new(ring);
        assert_eq!(outline.outer.len(), 4);
    }

    #[test]
    fn test_degenerate_rings() {
        assert!(Outline::new(vec![]).is_degenerate());
        assert!(Outline::new(vec![Vec2::ZERO]).is_degenerate());
        assert!(Outline::new(vec![Vec2::ZERO, Vec2::X]).is_degenerate());
        // A closed 3-ring collapses to 2 distinct vertices
        assert!(Outline::new(vec![Vec2::ZERO, Vec2::X, Vec2::ZERO]).is_degenerate());
        assert!(!Outline::new(square(Vec2::ZERO, 1.0)).is_degenerate());
    }

    #[test]
    fn test_contains_point() {
        let outline = Outline::new(square(Vec2::ZERO, 10.0));
        assert!(outline.contains_point(Vec2::new(5.0, 5.0)));
        assert!(!outline.contains_point(Vec2::new(15.0, 5.0)));
        assert!(!outline.contains_point(Vec2::new(-1.0, -1.0)));
    }

    #[test]
    fn test_pooled_holes_attach_to_every_outline() {
        let outlines = vec![
            Outline::new(square(Vec2::ZERO, 10.0)),
            Outline::new(square(Vec2::new(100.0, 0.0), 10.0)),
        ];
        let pool = vec![square(Vec2::new(2.0, 2.0), 2.0)];
        let attached = attach_holes(outlines, &pool, false);
        // Both outlines get the pool, even the one that cannot contain it
        assert_eq!(attached[0].holes.len(), 1);
        assert_eq!(attached[1].holes.len(), 1);
    }

    #[test]
    fn test_containment_scoped_holes() {
        let outlines = vec![
            Outline::new(square(Vec2::ZERO, 10.0)),
            Outline::new(square(Vec2::new(100.0, 0.0), 10.0)),
        ];
        let pool = vec![square(Vec2::new(2.0, 2.0), 2.0)];
        let attached = attach_holes(outlines, &pool, true);
        assert_eq!(attached[0].holes.len(), 1);
        assert_eq!(attached[1].holes.len(), 0);
    }
}
