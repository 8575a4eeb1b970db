//! # Campus Viewer
//!
//! Interactive 3D campus map: window, camera, lighting, and ground plane
//! around the `CampusMapPlugin` pipeline. Left click highlights a building,
//! right-drag orbits, middle-drag pans, scroll zooms.

mod camera_controller;

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::{GlobalAmbientLight, NotShadowCaster};
use bevy::prelude::*;
use std::path::Path;

use campus_geo::CampusMapPlugin;
use camera_controller::{OrbitCamera, OrbitCameraPlugin};

/// Original vantage over the campus core
const CAMERA_START: Vec3 = Vec3::new(80.85, 339.77, -197.06);
const GROUND_SIZE: f32 = 3000.0;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Campus Map".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }))
        // Sky blue
        .insert_resource(ClearColor(Color::srgb_u8(0x87, 0xce, 0xeb)))
        .add_plugins(CampusMapPlugin::default())
        .add_plugins(OrbitCameraPlugin)
        .add_systems(Startup, setup_scene)
        .run();
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    asset_server: Res<AssetServer>,
) {
    // ========================================================================
    // CAMERA - near-top-down over the campus core, focus directly below
    // the vantage point
    // ========================================================================
    let orbit = OrbitCamera {
        focus_point: Vec3::new(CAMERA_START.x, 0.0, CAMERA_START.z),
        zoom_distance: CAMERA_START.y,
        pitch: -core::f32::consts::FRAC_PI_2 + 0.01,
        initialized: true,
        ..Default::default()
    };
    // Seed the transform from the orbit state so the first frame already
    // renders from the vantage
    let rotation = Quat::from_euler(EulerRot::YXZ, orbit.yaw, orbit.pitch, 0.0);
    let translation = orbit.focus_point + rotation * Vec3::new(0.0, 0.0, orbit.zoom_distance);
    commands.spawn((
        Camera3d::default(),
        Tonemapping::Reinhard,
        Transform::from_translation(translation).with_rotation(rotation),
        Projection::Perspective(PerspectiveProjection {
            fov: 60.0_f32.to_radians(),
            near: 0.1,
            far: 10000.0,
            ..Default::default()
        }),
        orbit,
        Name::new("Camera"),
    ));

    // ========================================================================
    // LIGHTING - ambient skylight plus one shadow-casting sun
    // ========================================================================
    commands.insert_resource(GlobalAmbientLight {
        color: Color::srgb(0.9, 0.95, 1.0),
        brightness: 300.0,
        affects_lightmapped_meshes: true,
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..Default::default()
        },
        Transform::from_xyz(200.0, 400.0, 100.0).looking_at(Vec3::ZERO, Vec3::Y),
        Name::new("Sun"),
    ));

    // ========================================================================
    // GROUND - receives shadows, sits just below the extruded layers
    // ========================================================================
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb_u8(0x4c, 0x7d, 0x32),
            perceptual_roughness: 1.0,
            ..Default::default()
        })),
        Transform::from_xyz(0.0, -0.05, 0.0),
        NotShadowCaster,
        Name::new("Ground"),
    ));

    // ========================================================================
    // DECORATION - optional tree model; a missing asset is not an error
    // ========================================================================
    // The asset server resolves relative to the asset root, the existence
    // check runs against the working directory
    if Path::new("assets/models/tree.glb").exists() {
        let tree_scene = asset_server.load("models/tree.glb#Scene0");
        commands.spawn((
            SceneRoot(tree_scene),
            Transform::from_xyz(40.0, 0.0, -120.0),
            Name::new("Tree"),
        ));
    } else {
        warn!("Decorative model assets/models/tree.glb not found, continuing without it");
    }
}
