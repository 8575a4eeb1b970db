//! # Solid Extrusion
//!
//! Converts assembled outlines and projected polylines into Bevy meshes.
//! - Outline → straight vertical prism (earcut-triangulated caps, quad walls)
//! - LineString → Catmull-Rom interpolated path swept with a flat ribbon
//!   cross-section (roads)
//!
//! All meshes are emitted in Bevy world space: planar (x, y) maps to
//! (X, −Z) and extrusion depth runs along +Y. No bevels anywhere.
//!
//! ## Table of Contents
//! 1. Prism extrusion (Outline → solid with interior voids)
//! 2. Catmull-Rom path resampling
//! 3. Ribbon sweep (road polyline → flat strip)

use bevy::asset::RenderAssetUsages;
use bevy::math::cubic_splines::{CubicCardinalSpline, CubicGenerator};
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::outline::Outline;

// ============================================================================
// 1. Prism extrusion
// ============================================================================

/// Extrude an outline along the vertical axis into a closed prism.
///
/// The bottom cap sits at y = 0 and the top cap at y = `depth`; hole rings
/// become interior voids through both caps, with walls along every ring.
/// Returns `None` for degenerate outlines and failed triangulations — the
/// caller treats that as a recoverable skip.
pub fn extrude_prism(outline: &Outline, depth: f32) -> Option<Mesh> {
    if outline.is_degenerate() {
        tracing::warn!(
            "Skipping degenerate outline with {} outer vertices",
            outline.outer.len()
        );
        return None;
    }

    // Combined vertex list: outer ring first, then each hole ring
    let mut combined: Vec<Vec2> = outline.outer.clone();
    let mut hole_indices: Vec<usize> = Vec::with_capacity(outline.holes.len());
    for hole in &outline.holes {
        hole_indices.push(combined.len());
        combined.extend_from_slice(hole);
    }

    let flat: Vec<f64> = combined
        .iter()
        .flat_map(|v| [v.x as f64, v.y as f64])
        .collect();
    let cap_triangles = match earcutr::earcut(&flat, &hole_indices, 2) {
        Ok(ix) if !ix.is_empty() => ix,
        _ => {
            tracing::warn!("Cap triangulation failed for outline, skipping solid");
            return None;
        }
    };

    let n = combined.len();
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(2 * n);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(2 * n);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(2 * n);
    let mut indices: Vec<u32> = Vec::with_capacity(cap_triangles.len() * 2);

    // UV: planar bounding box mapped to 0..1 (caps)
    let (min_p, max_p) = planar_bounds(&combined);
    let range = (max_p - min_p).max(Vec2::splat(0.001));

    // Bottom cap vertices [0, n), top cap vertices [n, 2n)
    for (y, normal_y) in [(0.0, -1.0), (depth, 1.0)] {
        for v in &combined {
            positions.push(to_world(*v, y).to_array());
            normals.push([0.0, normal_y, 0.0]);
            uvs.push([(v.x - min_p.x) / range.x, (v.y - min_p.y) / range.y]);
        }
    }

    // Bottom cap faces down: reverse the triangulation winding
    for tri in cap_triangles.chunks_exact(3) {
        indices.extend_from_slice(&[tri[2] as u32, tri[1] as u32, tri[0] as u32]);
    }
    for tri in cap_triangles.chunks_exact(3) {
        indices.extend_from_slice(&[
            (tri[0] + n) as u32,
            (tri[1] + n) as u32,
            (tri[2] + n) as u32,
        ]);
    }

    // Walls along the outer ring and every hole ring, duplicated vertices
    // per quad for flat shading
    let mut ring_start = 0usize;
    let mut ring_ends: Vec<usize> = hole_indices.clone();
    ring_ends.push(n);
    for ring_end in ring_ends {
        let ring = &combined[ring_start..ring_end];
        add_walls(ring, depth, &mut positions, &mut normals, &mut uvs, &mut indices);
        ring_start = ring_end;
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    Some(mesh)
}

fn add_walls(
    ring: &[Vec2],
    depth: f32,
    positions: &mut Vec<[f32; 3]>,
    normals: &mut Vec<[f32; 3]>,
    uvs: &mut Vec<[f32; 2]>,
    indices: &mut Vec<u32>,
) {
    let len = ring.len();
    for i in 0..len {
        let a = ring[i];
        let b = ring[(i + 1) % len];
        let edge = b - a;
        let planar_normal = Vec2::new(edge.y, -edge.x).normalize_or_zero();
        let normal = [planar_normal.x, 0.0, -planar_normal.y];

        let base = positions.len() as u32;
        positions.push(to_world(a, 0.0).to_array());
        positions.push(to_world(b, 0.0).to_array());
        positions.push(to_world(b, depth).to_array());
        positions.push(to_world(a, depth).to_array());
        for _ in 0..4 {
            normals.push(normal);
        }
        uvs.extend_from_slice(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);

        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Planar (x east, y north) → Bevy world (X east, Y up, Z south)
fn to_world(v: Vec2, y: f32) -> Vec3 {
    Vec3::new(v.x, y, -v.y)
}

fn planar_bounds(points: &[Vec2]) -> (Vec2, Vec2) {
    let mut min = Vec2::splat(f32::MAX);
    let mut max = Vec2::splat(f32::MIN);
    for p in points {
        min = min.min(*p);
        max = max.max(*p);
    }
    (min, max)
}

// ============================================================================
// 2. Catmull-Rom path resampling
// ============================================================================

/// Fit a Catmull-Rom spline through all control points and sample it at
/// `steps` uniform parameter steps (`steps + 1` cross sections). Falls back
/// to linear resampling when the spline cannot be built.
pub fn resample_catmull_rom(points: &[Vec3], steps: usize) -> Vec<Vec3> {
    if points.len() < 2 || steps == 0 {
        return points.to_vec();
    }

    match CubicCardinalSpline::new(0.5, points.to_vec()).to_curve() {
        Ok(curve) => {
            let segments = curve.segments().len() as f32;
            (0..=steps)
                .map(|i| curve.position(i as f32 / steps as f32 * segments))
                .collect()
        }
        Err(_) => resample_linear(points, steps),
    }
}

/// Uniform arc-length resampling along the raw polyline
fn resample_linear(points: &[Vec3], steps: usize) -> Vec<Vec3> {
    let mut lengths = vec![0.0f32; points.len()];
    for i in 1..points.len() {
        lengths[i] = lengths[i - 1] + points[i].distance(points[i - 1]);
    }
    let total = lengths.last().copied().unwrap_or(0.0).max(1e-6);

    (0..=steps)
        .map(|i| {
            let target = i as f32 / steps as f32 * total;
            let seg = lengths.partition_point(|&l| l < target).max(1).min(points.len() - 1);
            let span = (lengths[seg] - lengths[seg - 1]).max(1e-6);
            let t = (target - lengths[seg - 1]) / span;
            points[seg - 1].lerp(points[seg], t.clamp(0.0, 1.0))
        })
        .collect()
}

// ============================================================================
// 3. Ribbon sweep
// ============================================================================

/// Sweep a flat rectangular cross-section of `width` along a Catmull-Rom
/// curve through the projected road points.
///
/// The strip lies in the XZ plane facing up; the caller lifts it slightly
/// above the ground to avoid z-fighting. Returns `None` for paths with
/// fewer than 2 points.
pub fn sweep_ribbon(points: &[Vec3], width: f32, steps: usize) -> Option<Mesh> {
    if points.len() < 2 {
        tracing::warn!("Ribbon sweep requires at least 2 path vertices, got {}", points.len());
        return None;
    }

    let path = resample_catmull_rom(points, steps.max(1));
    let num_path = path.len();
    let half_w = width * 0.5;

    let mut positions = Vec::with_capacity(num_path * 2);
    let mut normals = Vec::with_capacity(num_path * 2);
    let mut uvs = Vec::with_capacity(num_path * 2);
    let mut indices = Vec::with_capacity((num_path - 1) * 6);

    // Accumulated length for UV
    let mut accumulated = vec![0.0f32; num_path];
    for i in 1..num_path {
        accumulated[i] = accumulated[i - 1] + path[i].distance(path[i - 1]);
    }
    let total = accumulated.last().copied().unwrap_or(1.0).max(0.001);

    for (i, &center) in path.iter().enumerate() {
        let tangent = if i == 0 {
            (path[1] - path[0]).normalize_or_zero()
        } else if i == num_path - 1 {
            (path[i] - path[i - 1]).normalize_or_zero()
        } else {
            ((path[i + 1] - path[i]).normalize_or_zero()
                + (path[i] - path[i - 1]).normalize_or_zero())
            .normalize_or_zero()
        };

        // Perpendicular in the XZ plane; the cross-section is centered on
        // the path
        let right = Vec3::new(-tangent.z, 0.0, tangent.x).normalize_or_zero() * half_w;
        let v = accumulated[i] / total;

        positions.push((center - right).to_array());
        normals.push([0.0, 1.0, 0.0]);
        uvs.push([0.0, v]);

        positions.push((center + right).to_array());
        normals.push([0.0, 1.0, 0.0]);
        uvs.push([1.0, v]);
    }

    for i in 0..(num_path - 1) as u32 {
        let bl = i * 2;
        let br = i * 2 + 1;
        let tl = (i + 1) * 2;
        let tr = (i + 1) * 2 + 1;

        indices.extend_from_slice(&[bl, tl, br, br, tl, tr]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    Some(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(origin: Vec2, size: f32) -> Vec<Vec2> {
        vec![
            origin,
            origin + Vec2::new(size, 0.0),
            origin + Vec2::new(size, size),
            origin + Vec2::new(0.0, size),
        ]
    }

    fn vertex_count(mesh: &Mesh) -> usize {
        mesh.attribute(Mesh::ATTRIBUTE_POSITION).unwrap().len()
    }

    fn index_count(mesh: &Mesh) -> usize {
        mesh.indices().unwrap().len()
    }

    #[test]
    fn test_simple_prism_counts() {
        let outline = Outline::new(square(Vec2::ZERO, 10.0));
        let mesh = extrude_prism(&outline, 5.0).unwrap();
        // 2 caps of 4 vertices + 4 wall quads of 4
        assert_eq!(vertex_count(&mesh), 2 * 4 + 4 * 4);
        // Earcut of an n-gon with h holes yields n + 2h - 2 triangles per cap
        let cap_triangles = 4 - 2;
        assert_eq!(index_count(&mesh), 2 * cap_triangles * 3 + 4 * 6);
    }

    #[test]
    fn test_prism_with_hole_has_interior_void() {
        let outline = Outline::with_holes(
            square(Vec2::ZERO, 10.0),
            vec![square(Vec2::new(4.0, 4.0), 2.0)],
        );
        let mesh = extrude_prism(&outline, 3.0).unwrap();
        // 8 combined cap vertices, top and bottom, plus 8 wall quads
        assert_eq!(vertex_count(&mesh), 2 * 8 + 8 * 4);
        // n + 2h - 2 = 8 triangles per cap: the void is triangulated around
        let cap_triangles = 8 + 2 * 1 - 2;
        assert_eq!(index_count(&mesh), 2 * cap_triangles * 3 + 8 * 6);
    }

    #[test]
    fn test_prism_spans_depth() {
        let outline = Outline::new(square(Vec2::ZERO, 10.0));
        let mesh = extrude_prism(&outline, 30.0).unwrap();
        let positions = match mesh.attribute(Mesh::ATTRIBUTE_POSITION).unwrap() {
            bevy::mesh::VertexAttributeValues::Float32x3(v) => v.clone(),
            _ => panic!("unexpected attribute layout"),
        };
        let min_y = positions.iter().map(|p| p[1]).fold(f32::MAX, f32::min);
        let max_y = positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
        assert_relative_eq!(min_y, 0.0);
        assert_relative_eq!(max_y, 30.0);
    }

    #[test]
    fn test_degenerate_outline_yields_no_solid() {
        let outline = Outline::new(vec![Vec2::ZERO, Vec2::X]);
        assert!(extrude_prism(&outline, 5.0).is_none());
    }

    #[test]
    fn test_resample_hits_endpoints() {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(20.0, 0.0, 5.0),
        ];
        let path = resample_catmull_rom(&points, 20);
        assert_eq!(path.len(), 21);
        assert_relative_eq!(path[0].x, points[0].x, epsilon = 1e-3);
        assert_relative_eq!(path[20].x, points[2].x, epsilon = 1e-3);
        assert_relative_eq!(path[20].z, points[2].z, epsilon = 1e-3);
    }

    #[test]
    fn test_ribbon_counts_and_flatness() {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(50.0, 0.0, 0.0),
            Vec3::new(100.0, 0.0, 0.0),
        ];
        let mesh = sweep_ribbon(&points, 2.5, 10).unwrap();
        // steps + 1 cross sections, two vertices each
        assert_eq!(vertex_count(&mesh), 11 * 2);
        assert_eq!(index_count(&mesh), 10 * 6);

        let positions = match mesh.attribute(Mesh::ATTRIBUTE_POSITION).unwrap() {
            bevy::mesh::VertexAttributeValues::Float32x3(v) => v.clone(),
            _ => panic!("unexpected attribute layout"),
        };
        // A collinear path stays flat and the strip spans the full width
        for p in &positions {
            assert_relative_eq!(p[1], 0.0, epsilon = 1e-4);
        }
        let min_z = positions.iter().map(|p| p[2]).fold(f32::MAX, f32::min);
        let max_z = positions.iter().map(|p| p[2]).fold(f32::MIN, f32::max);
        assert_relative_eq!(max_z - min_z, 2.5, epsilon = 1e-3);
    }

    #[test]
    fn test_single_point_path_yields_no_ribbon() {
        assert!(sweep_ribbon(&[Vec3::ZERO], 2.5, 100).is_none());
    }
}
