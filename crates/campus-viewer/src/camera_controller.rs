//! Orbit camera controller for the campus viewer.
//!
//! Right-drag orbits around the focus point, middle-drag pans it across the
//! ground plane, and the scroll wheel zooms. The left button stays free for
//! building picking.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::input::ButtonInput;
use bevy::prelude::*;
use core::f32::consts::*;

/// Radians of orbit per mouse dot
pub const RADIANS_PER_DOT: f32 = 1.0 / 180.0;

pub struct OrbitCameraPlugin;

impl Plugin for OrbitCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, run_orbit_camera);
    }
}

/// Orbit camera state. Attach alongside `Camera3d`; the transform is
/// recomputed from this every frame.
#[derive(Component, Reflect)]
pub struct OrbitCamera {
    /// Enables this controller when `true`.
    pub enabled: bool,
    /// Indicates if this controller has been initialized from the camera
    /// transform.
    pub initialized: bool,
    /// Point the camera orbits around
    pub focus_point: Vec3,
    /// Distance from the focus point
    pub zoom_distance: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Ground-plane pan speed, scaled by zoom distance
    pub pan_speed: f32,
    pub rotate_sensitivity: f32,
    pub zoom_speed: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Mouse button for orbiting
    pub rotate_button: MouseButton,
    /// Mouse button for panning
    pub pan_button: MouseButton,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            enabled: true,
            initialized: false,
            focus_point: Vec3::ZERO,
            zoom_distance: 100.0,
            min_zoom: 5.0,
            max_zoom: 1500.0,
            pan_speed: 1.0,
            rotate_sensitivity: 1.0,
            zoom_speed: 0.1,
            yaw: 0.0,
            pitch: -FRAC_PI_4,
            rotate_button: MouseButton::Right,
            pan_button: MouseButton::Middle,
        }
    }
}

fn run_orbit_camera(
    mut mouse_motion_events: MessageReader<MouseMotion>,
    mut mouse_wheel_events: MessageReader<MouseWheel>,
    mouse_button_input: Res<ButtonInput<MouseButton>>,
    mut query: Query<(&mut Transform, &mut OrbitCamera), With<Camera>>,
) {
    let Ok((mut transform, mut controller)) = query.single_mut() else {
        return;
    };

    if !controller.initialized {
        // Derive orbit state from wherever the camera was spawned
        let offset = transform.translation - controller.focus_point;
        controller.zoom_distance = offset.length().max(controller.min_zoom);
        let (yaw, pitch, _roll) = transform.rotation.to_euler(EulerRot::YXZ);
        controller.yaw = yaw;
        controller.pitch = pitch;
        controller.initialized = true;
    }
    if !controller.enabled {
        return;
    }

    let mut scroll = 0.0;
    for event in mouse_wheel_events.read() {
        let amount = match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / 16.0,
        };
        scroll += amount;
    }
    if scroll != 0.0 {
        controller.zoom_distance = (controller.zoom_distance
            * (1.0 - scroll * controller.zoom_speed))
            .clamp(controller.min_zoom, controller.max_zoom);
    }

    let mut mouse_delta = Vec2::ZERO;
    for event in mouse_motion_events.read() {
        mouse_delta += event.delta;
    }

    if mouse_delta != Vec2::ZERO {
        if mouse_button_input.pressed(controller.rotate_button) {
            controller.yaw -=
                mouse_delta.x * RADIANS_PER_DOT * controller.rotate_sensitivity;
            controller.pitch = (controller.pitch
                - mouse_delta.y * RADIANS_PER_DOT * controller.rotate_sensitivity)
                .clamp(-FRAC_PI_2 + 0.01, -0.01);
        }
        if mouse_button_input.pressed(controller.pan_button) {
            let rotation = Quat::from_euler(EulerRot::YXZ, controller.yaw, 0.0, 0.0);
            let right = rotation * Vec3::X;
            let forward = rotation * -Vec3::Z;
            let scale = controller.pan_speed * controller.zoom_distance * RADIANS_PER_DOT;
            controller.focus_point +=
                (-right * mouse_delta.x + forward * mouse_delta.y) * scale;
        }
    }

    let rotation = Quat::from_euler(EulerRot::YXZ, controller.yaw, controller.pitch, 0.0);
    transform.rotation = rotation;
    transform.translation =
        controller.focus_point + rotation * Vec3::new(0.0, 0.0, controller.zoom_distance);
}
