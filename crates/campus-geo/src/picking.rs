//! # Hit-Test / Highlight Controller
//!
//! Left-click picking over the campus solids. The cursor position becomes a
//! world-space ray, the ray is tested against every solid's AABB with the
//! slab method, and the nearest hit wins. A hit on a building applies the
//! emissive highlight; a hit on any untagged solid, or empty ground, clears
//! it. At most one building is highlighted at any time.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::layers::{BuildingTag, SolidBounds};
use crate::palette::BuildingPalette;

/// The currently highlighted building entity, if any.
#[derive(Resource, Debug, Default)]
pub struct HighlightState {
    pub current: Option<Entity>,
}

/// Slab-method ray vs axis-aligned box. Returns the entry distance along
/// the ray, clamped to zero when the origin is inside the box.
pub fn ray_aabb_intersection(
    ray_origin: Vec3,
    ray_direction: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<f32> {
    let inv_dir = Vec3::new(
        1.0 / ray_direction.x,
        1.0 / ray_direction.y,
        1.0 / ray_direction.z,
    );

    let t1 = (aabb_min.x - ray_origin.x) * inv_dir.x;
    let t2 = (aabb_max.x - ray_origin.x) * inv_dir.x;
    let t3 = (aabb_min.y - ray_origin.y) * inv_dir.y;
    let t4 = (aabb_max.y - ray_origin.y) * inv_dir.y;
    let t5 = (aabb_min.z - ray_origin.z) * inv_dir.z;
    let t6 = (aabb_max.z - ray_origin.z) * inv_dir.z;

    let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
    let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

    if tmax < 0.0 || tmin > tmax {
        None
    } else {
        Some(tmin.max(0.0))
    }
}

/// System: left-click picking and highlight transitions.
pub fn pointer_pick_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
    solids: Query<(Entity, &SolidBounds, Option<&BuildingTag>)>,
    material_query: Query<&MeshMaterial3d<StandardMaterial>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut highlight: ResMut<HighlightState>,
    palette: Res<BuildingPalette>,
) {
    if !mouse_button.just_pressed(MouseButton::Left) {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor_position) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor_position) else {
        return;
    };

    // Nearest AABB hit across every spawned solid
    let mut closest: Option<(Entity, f32, bool)> = None;
    for (entity, bounds, tag) in solids.iter() {
        if let Some(distance) =
            ray_aabb_intersection(ray.origin, *ray.direction, bounds.min, bounds.max)
        {
            if closest.map(|(_, best, _)| distance < best).unwrap_or(true) {
                closest = Some((entity, distance, tag.is_some()));
            }
        }
    }

    let target = match closest {
        Some((entity, _, true)) => Some(entity),
        // Untagged solid or empty ground both clear the highlight
        _ => None,
    };
    apply_highlight(
        target,
        &mut highlight,
        &material_query,
        &mut materials,
        &palette,
    );
}

/// Apply a highlight transition: reset the previous building's emissive,
/// then set the new one. Re-selecting the same building is idempotent.
fn apply_highlight(
    target: Option<Entity>,
    highlight: &mut HighlightState,
    material_query: &Query<&MeshMaterial3d<StandardMaterial>>,
    materials: &mut Assets<StandardMaterial>,
    palette: &BuildingPalette,
) {
    if let Some(previous) = highlight.current {
        if Some(previous) != target {
            set_emissive(previous, LinearRgba::BLACK, material_query, materials);
        }
    }
    if let Some(entity) = target {
        set_emissive(entity, palette.highlight, material_query, materials);
    }
    highlight.current = target;
}

fn set_emissive(
    entity: Entity,
    emissive: LinearRgba,
    material_query: &Query<&MeshMaterial3d<StandardMaterial>>,
    materials: &mut Assets<StandardMaterial>,
) {
    if let Ok(handle) = material_query.get(entity) {
        if let Some(material) = materials.get_mut(&handle.0) {
            material.emissive = emissive;
        }
    }
}
