#![deny(unsafe_code)]

//! Auto-framing camera: follows the average root anchor of every bot in the
//! scene and zooms the orthographic projection so all of them stay on
//! screen. A read-only consumer of chain positions; it never feeds anything
//! back into the controller or the chain.

use bevy::camera::ScalingMode;
use bevy::prelude::*;
use bevy::window::Window;

use limbot_common::rig::LimbChain;

/// Auto-framing camera plugin: attach a [`FramingCamera`] to an orthographic
/// camera and every bot stays in view.
#[derive(Default)]
pub struct FramingCameraPlugin;

impl Plugin for FramingCameraPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<FramingCamera>()
            .add_systems(Update, frame_bots);
    }
}

/// Framing behaviour knobs plus the smoothing state.
#[derive(Component, Reflect)]
pub struct FramingCamera {
    /// Smallest half-height the projection will zoom in to
    pub min_zoom: f32,
    /// Extra world units kept around the outermost bot
    pub padding: f32,
    /// Smooth-damp time constant, seconds
    pub smooth_time: f32,
    /// Current horizontal follow velocity
    pub move_velocity: f32,
    /// Current zoom velocity
    pub zoom_velocity: f32,
}

impl Default for FramingCamera {
    fn default() -> Self {
        Self {
            min_zoom: 5.0,
            padding: 3.0,
            smooth_time: 0.2,
            move_velocity: 0.0,
            zoom_velocity: 0.0,
        }
    }
}

fn frame_bots(
    time: Res<Time>,
    windows: Query<&Window>,
    bots: Query<&LimbChain>,
    mut cameras: Query<(&mut Transform, &mut Projection, &mut FramingCamera)>,
) {
    let dt = time.delta_secs();
    let Ok(window) = windows.single() else {
        return;
    };
    let aspect = window.width() / window.height();

    let anchors: Vec<f32> = bots.iter().map(|chain| chain.root().position.x).collect();
    if anchors.is_empty() {
        return;
    }
    let target_x = anchors.iter().sum::<f32>() / anchors.len() as f32;

    let Ok((mut transform, mut projection, mut framing)) = cameras.single_mut() else {
        return;
    };

    // Follow
    let smooth_time = framing.smooth_time;
    let (x, vel) = smooth_damp(
        transform.translation.x,
        target_x,
        framing.move_velocity,
        smooth_time,
        dt,
    );
    transform.translation.x = x;
    framing.move_velocity = vel;

    // Zoom to fit: widest horizontal offset from the follow target, scaled
    // back through the aspect ratio into a half-height
    let mut size = anchors
        .iter()
        .map(|ax| (ax - target_x).abs() / aspect)
        .fold(0.0, f32::max);
    size += framing.padding;
    size = size.max(framing.min_zoom);

    if let Projection::Orthographic(ortho) = &mut *projection {
        if let ScalingMode::FixedVertical { viewport_height } = &mut ortho.scaling_mode {
            let (height, vel) =
                smooth_damp(*viewport_height * 0.5, size, framing.zoom_velocity, smooth_time, dt);
            *viewport_height = height * 2.0;
            framing.zoom_velocity = vel;
        }
    }
}

/// Critically damped spring toward `target`. Returns the new value and
/// velocity; feed the velocity back in on the next frame.
pub fn smooth_damp(current: f32, target: f32, velocity: f32, smooth_time: f32, dt: f32) -> (f32, f32) {
    let omega = 2.0 / smooth_time.max(1e-4);
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (velocity + omega * change) * dt;
    let new_velocity = (velocity - omega * temp) * exp;
    let mut new_value = target + (change + temp) * exp;

    // Never overshoot the target
    if (target - current > 0.0) == (new_value > target) {
        new_value = target;
        return (new_value, (new_value - target) / dt.max(1e-6));
    }
    (new_value, new_velocity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_damp_converges() {
        let mut value = 0.0;
        let mut velocity = 0.0;
        for _ in 0..240 {
            let (v, vel) = smooth_damp(value, 10.0, velocity, 0.2, 1.0 / 60.0);
            value = v;
            velocity = vel;
        }
        assert!((value - 10.0).abs() < 1e-2, "settled at {value}");
    }

    #[test]
    fn test_smooth_damp_does_not_overshoot() {
        let mut value = 0.0;
        let mut velocity = 0.0;
        for _ in 0..600 {
            let (v, vel) = smooth_damp(value, 1.0, velocity, 0.05, 1.0 / 30.0);
            assert!(v <= 1.0 + 1e-4, "overshot to {v}");
            value = v;
            velocity = vel;
        }
    }
}
