//! Scene assembly and render sync.
//!
//! The runtime owns limb poses in world space inside `LimbChain`; rendering
//! is one quad mesh entity per limb plus a sync system that copies the pose
//! into each quad's `Transform` every frame. Nothing here writes back into
//! the chain.

use bevy::asset::RenderAssetUsages;
use bevy::camera::ScalingMode;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use bevy_framing_camera::FramingCamera;
use limbot_common::prelude::*;
use limbot_common::rig::{default_rig, Limb, RigSpec};
use limbot_runtime::prelude::*;
use std::path::Path;
use tracing::{error, info};

// ============================================================================
// Components
// ============================================================================

/// Binds a quad entity to one limb of one bot.
#[derive(Component)]
pub struct LimbRef {
    pub bot: Entity,
    pub index: usize,
}

// ============================================================================
// Spawning
// ============================================================================

/// Read a rig description from a RON file, falling back to the built-in rig
/// when no path is given or the file does not parse.
pub fn load_rig(path: Option<&Path>) -> RigSpec {
    let Some(path) = path else {
        return default_rig();
    };
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            error!("Failed to read rig file {:?}: {err}", path);
            return default_rig();
        }
    };
    match RigSpec::from_ron(&text) {
        Ok(spec) => {
            info!("Loaded rig from {:?} ({} limbs)", path, spec.limbs.len());
            spec
        }
        Err(err) => {
            error!("Failed to parse rig file {:?}: {err}", path);
            default_rig()
        }
    }
}

/// Spawn one bot: the chain + controller entity and a quad entity per limb.
pub fn spawn_bot(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    spec: RigSpec,
) {
    let chain = match spec.build() {
        Ok(chain) => chain,
        Err(err) => {
            error!("Rig rejected: {err}");
            return;
        }
    };

    let tuning = BotTuning::default().sanitize();

    // Sway the tip limb a little while idle
    let mut wobble = LimbWobble::default();
    if let Some(head) = chain.find("head") {
        wobble.drivers.push(WobbleDriver {
            limb: head,
            amplitude: 6.0,
            speed: 2.0,
            enabled: true,
        });
    }

    let quads: Vec<(Mesh, [f32; 4])> = chain
        .limbs()
        .iter()
        .map(|limb| (limb_quad(limb), limb.color))
        .collect();

    let bot = commands
        .spawn((
            Name::new("Bot"),
            chain,
            BotController::default(),
            tuning,
            wobble,
        ))
        .id();
    info!("Spawned bot {bot:?} with {} limbs", quads.len());

    for (index, (mesh, color)) in quads.into_iter().enumerate() {
        commands.spawn((
            Name::new(format!("Limb {index}")),
            LimbRef { bot, index },
            Mesh2d(meshes.add(mesh)),
            MeshMaterial2d(materials.add(ColorMaterial::from_color(Color::srgba(
                color[0], color[1], color[2], color[3],
            )))),
            Transform::default(),
        ));
    }
}

/// Build the unit quad for one limb, anchored on its parent joint.
fn limb_quad(limb: &Limb) -> Mesh {
    let corners = limb.local_corners();
    let positions: Vec<[f32; 3]> = corners.iter().map(|c| [c.x, c.y, 0.0]).collect();
    let uvs: Vec<[f32; 2]> = [[0.0, 1.0], [0.0, 0.0], [1.0, 0.0], [1.0, 1.0]].to_vec();

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(vec![0, 1, 2, 0, 2, 3]));
    mesh
}

/// Spawn the orthographic camera with auto framing.
pub fn spawn_camera(commands: &mut Commands) {
    commands.spawn((
        Name::new("Framing Camera"),
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scaling_mode: ScalingMode::FixedVertical {
                viewport_height: 10.0,
            },
            ..OrthographicProjection::default_2d()
        }),
        Transform::from_xyz(0.0, 2.0, 10.0),
        FramingCamera::default(),
    ));
}

// ============================================================================
// Systems
// ============================================================================

/// Copy each limb's pose out of its chain into the quad's `Transform`.
///
/// Mirrored limbs render with a negated x scale; the chain already stores
/// the mirrored rotation, so the stored angle is applied as-is.
pub fn sync_limb_transforms(
    bots: Query<&LimbChain>,
    mut quads: Query<(&LimbRef, &mut Transform)>,
) {
    for (limb_ref, mut transform) in quads.iter_mut() {
        let Ok(chain) = bots.get(limb_ref.bot) else {
            continue;
        };
        if limb_ref.index >= chain.len() {
            continue;
        }
        let limb = chain.limb(limb_ref.index);
        transform.translation = limb.position;
        transform.rotation = Quat::from_rotation_z(limb.rotation.to_radians());
        transform.scale.x = if limb.mirrored { -1.0 } else { 1.0 };
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limb_quad_covers_dimensions() {
        let chain = default_rig().build().unwrap();
        let mesh = limb_quad(chain.limb(0));
        let positions = mesh
            .attribute(Mesh::ATTRIBUTE_POSITION)
            .and_then(|v| v.as_float3())
            .unwrap();
        assert_eq!(positions.len(), 4);

        let xs: Vec<f32> = positions.iter().map(|p| p[0]).collect();
        let ys: Vec<f32> = positions.iter().map(|p| p[1]).collect();
        let width = xs.iter().fold(f32::MIN, |a, &b| a.max(b))
            - xs.iter().fold(f32::MAX, |a, &b| a.min(b));
        let height = ys.iter().fold(f32::MIN, |a, &b| a.max(b))
            - ys.iter().fold(f32::MAX, |a, &b| a.min(b));
        assert!((width - 0.8).abs() < 1e-6);
        assert!((height - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_load_rig_falls_back_without_path() {
        let spec = load_rig(None);
        assert_eq!(spec.limbs.len(), 3);
    }

    #[test]
    fn test_load_rig_falls_back_on_missing_file() {
        let spec = load_rig(Some(Path::new("/nonexistent/rig.ron")));
        assert_eq!(spec.limbs.len(), 3);
    }
}
