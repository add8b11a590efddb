//! # Limb Rig
//!
//! The kinematic chain: a linear sequence of rigid rectangular limbs joined
//! at pivot joints. Limbs live in a flat arena (`Vec<Limb>`, root at index 0,
//! parents before children) and link downward through `child` indices.
//!
//! Two invariants hold after every pose operation:
//!
//! - **Joint coherence**: a child's anchor always sits exactly on its
//!   parent's attachment point (parent anchor + rotated child-joint vector).
//! - **Rigid cascade**: rotating a limb applies the same angular delta to
//!   every descendant, repositioning each onto its parent's attachment point
//!   rather than re-solving joints independently.
//!
//! Joint offsets are folded into local geometry at assembly time: every quad
//! corner is shifted by `-self_joint` so the anchor point *is* the pivot, and
//! `child_joint` is stored relative to that zeroed anchor. Skipping this
//! normalization would silently break joint coherence.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::choreography::FoldPhase;

// ============================================================================
// Errors
// ============================================================================

/// Rig assembly / wiring errors.
///
/// Geometry itself is always valid and tuning values are clamped rather than
/// rejected, so this only covers the assembly surface.
#[derive(Error, Debug)]
pub enum RigError {
    #[error("rig describes no limbs")]
    EmptyChain,

    #[error("no limb named '{0}' in the chain")]
    UnknownLimb(String),

    #[error("rig parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

// ============================================================================
// Rig Description
// ============================================================================

/// Creation-time description of one limb. Immutable after assembly.
#[derive(Clone, Debug, Reflect, Serialize, Deserialize)]
pub struct LimbSpec {
    /// Limb name, used once at wiring time to resolve indices
    pub name: String,
    /// Quad width
    pub width: f32,
    /// Quad height
    pub height: f32,
    /// Where this limb attaches to its parent, in unscaled local quad space
    pub self_joint: Vec2,
    /// Where this limb's child attaches, in the same local space
    pub child_joint: Vec2,
    /// Initial bend (degrees) applied once at assembly
    pub rest_bend: f32,
    /// World angle the limb folds to when collapsed
    pub collapse_angle: f32,
}

impl Default for LimbSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            width: 1.0,
            height: 1.0,
            self_joint: Vec2::ZERO,
            child_joint: Vec2::new(0.5, 1.0), // top edge midpoint for a 1x1 quad at origin
            rest_bend: 0.0,
            collapse_angle: 90.0,
        }
    }
}

impl LimbSpec {
    pub fn new(name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            child_joint: Vec2::new(width * 0.5, height),
            ..default()
        }
    }

    pub fn with_joints(mut self, self_joint: Vec2, child_joint: Vec2) -> Self {
        self.self_joint = self_joint;
        self.child_joint = child_joint;
        self
    }

    pub fn with_rest_bend(mut self, degrees: f32) -> Self {
        self.rest_bend = degrees;
        self
    }

    pub fn with_collapse_angle(mut self, degrees: f32) -> Self {
        self.collapse_angle = degrees;
        self
    }
}

/// A whole character rig: ordered root-to-tip limb descriptions plus the
/// shared display color and render layer depth.
#[derive(Clone, Debug, Reflect, Serialize, Deserialize)]
pub struct RigSpec {
    /// Limbs in root-to-tip order
    pub limbs: Vec<LimbSpec>,
    /// Fill color shared by every limb quad (RGBA)
    pub color: [f32; 4],
    /// Constant depth/layer for the whole chain
    pub layer: f32,
}

impl Default for RigSpec {
    fn default() -> Self {
        Self {
            limbs: Vec::new(),
            color: [1.0, 1.0, 1.0, 1.0],
            layer: 0.0,
        }
    }
}

impl RigSpec {
    /// Parse a rig description from RON text.
    pub fn from_ron(text: &str) -> Result<Self, RigError> {
        Ok(ron::from_str(text)?)
    }

    /// Assemble the runtime chain from this description.
    ///
    /// Every limb starts at the origin, then each limb in root-to-tip order
    /// is rotated by its rest bend; the rotate cascade re-anchors each child
    /// onto its parent's attachment point, so the chain comes out coherent
    /// whatever the bends are. Rest rotations are recorded afterwards as the
    /// "risen" reference pose.
    pub fn build(&self) -> Result<LimbChain, RigError> {
        if self.limbs.is_empty() {
            return Err(RigError::EmptyChain);
        }

        let count = self.limbs.len();
        let limbs = self
            .limbs
            .iter()
            .enumerate()
            .map(|(i, spec)| Limb {
                name: spec.name.clone(),
                width: spec.width,
                height: spec.height,
                // Normalization: the anchor becomes the local origin
                quad_offset: -spec.self_joint,
                child_joint: spec.child_joint - spec.self_joint,
                color: self.color,
                position: Vec3::new(0.0, 0.0, self.layer),
                rotation: 0.0,
                rest_rotation: 0.0,
                collapse_target: spec.collapse_angle,
                collapsed: false,
                mirrored: false,
                phase: FoldPhase::Risen,
                fold_speed: 0.0,
                child: (i + 1 < count).then(|| i + 1),
            })
            .collect();

        let mut chain = LimbChain { limbs };

        // Apply initial bends. Rotate re-anchors children even for a zero
        // delta, so one pass leaves every joint coherent.
        for (i, spec) in self.limbs.iter().enumerate() {
            chain.rotate(i, spec.rest_bend);
        }
        for limb in &mut chain.limbs {
            limb.rest_rotation = limb.rotation;
        }

        debug!("assembled chain of {} limbs", chain.len());
        Ok(chain)
    }
}

// ============================================================================
// Runtime Limb
// ============================================================================

/// One rigid limb in the chain.
///
/// `position` is the limb's own joint anchor in world space, *not* its
/// geometric center; `rotation` is degrees about +Z. Geometry and joints are
/// fixed at assembly; position, rotation, and the fold state mutate
/// continuously during play.
#[derive(Clone, Debug, Reflect)]
pub struct Limb {
    pub name: String,
    pub width: f32,
    pub height: f32,
    /// Offset applied to local quad corners so the anchor sits at the origin
    pub quad_offset: Vec2,
    /// Child attachment point relative to the zeroed anchor
    pub child_joint: Vec2,
    /// Fill color (RGBA), bound once at assembly
    pub color: [f32; 4],

    /// World anchor; z is the constant layer depth
    pub position: Vec3,
    /// World angle in degrees about +Z
    pub rotation: f32,
    /// World angle recorded after assembly as the risen reference
    pub rest_rotation: f32,
    /// World angle the limb rotates to when folded
    pub collapse_target: f32,
    /// True once this limb *and everything below it* has folded
    pub collapsed: bool,
    /// Whether the limb currently renders mirrored about the vertical axis
    pub mirrored: bool,

    /// Fold choreography phase (resumable, advanced once per tick)
    pub phase: FoldPhase,
    /// Current fold speed, compounded down the chain during collapse
    pub fold_speed: f32,

    /// Arena index of the next limb, `None` for the terminal tip
    pub child: Option<usize>,
}

impl Limb {
    /// Local quad corners with the joint normalization applied, in the order
    /// bottom-left, top-left, top-right, bottom-right. The renderer offsets
    /// these so the joint sits at the local origin.
    pub fn local_corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(0.0, 0.0) + self.quad_offset,
            Vec2::new(0.0, self.height) + self.quad_offset,
            Vec2::new(self.width, self.height) + self.quad_offset,
            Vec2::new(self.width, 0.0) + self.quad_offset,
        ]
    }
}

// ============================================================================
// Chain
// ============================================================================

/// The assembled chain: a flat arena of limbs, root at index 0.
///
/// The chain does not arbitrate concurrent drivers; the controller's state
/// gates are responsible for issuing one root-level operation at a time.
#[derive(Component, Clone, Debug, Reflect)]
#[reflect(Component)]
pub struct LimbChain {
    pub(crate) limbs: Vec<Limb>,
}

impl LimbChain {
    pub fn len(&self) -> usize {
        self.limbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limbs.is_empty()
    }

    pub fn limb(&self, idx: usize) -> &Limb {
        &self.limbs[idx]
    }

    pub fn limbs(&self) -> &[Limb] {
        &self.limbs
    }

    pub fn root(&self) -> &Limb {
        &self.limbs[0]
    }

    /// Resolve a limb name to its arena index. Used once at wiring time;
    /// everything at runtime holds indices.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.limbs.iter().position(|l| l.name == name)
    }

    /// Like [`find`](Self::find), but a miss is an error. For wiring code
    /// where a missing limb should fail loudly.
    pub fn index_of(&self, name: &str) -> Result<usize, RigError> {
        self.find(name)
            .ok_or_else(|| RigError::UnknownLimb(name.to_string()))
    }

    /// Move a limb and its whole sub-chain by `offset`. Pure rigid
    /// repositioning; the shape is untouched.
    pub fn translate(&mut self, idx: usize, offset: Vec3) {
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            self.limbs[i].position += offset;
            cursor = self.limbs[i].child;
        }
    }

    /// Rotate a limb by `delta` degrees about its own anchor, then cascade:
    /// the child is translated onto the freshly rotated attachment point and
    /// rotated by the same delta, all the way down. Forward kinematics with a
    /// rigid cascade — bending the chain's shape takes different deltas at
    /// different limbs over time, not one call.
    pub fn rotate(&mut self, idx: usize, delta: f32) {
        self.limbs[idx].rotation += delta;

        if let Some(child) = self.limbs[idx].child {
            let attach = self.attachment_point(idx);
            let correction = attach - self.limbs[child].position;
            self.translate(child, correction);
            self.rotate(child, delta);
        }
    }

    /// World-space point where `idx`'s child attaches, given the limb's
    /// current rotation and mirroring.
    pub fn attachment_point(&self, idx: usize) -> Vec3 {
        let limb = &self.limbs[idx];
        let joint = if limb.mirrored {
            Vec2::new(-limb.child_joint.x, limb.child_joint.y)
        } else {
            limb.child_joint
        };
        let rotated = Vec2::from_angle(limb.rotation.to_radians()).rotate(joint);
        limb.position + rotated.extend(0.0)
    }

    /// Mirror the whole chain horizontally about the root anchor's X.
    ///
    /// Equivalent to a 180° turn about the vertical axis through that
    /// reference X: positions reflect, angles negate, and the mirrored flag
    /// flips so attachment math and rendering stay in the mirrored frame.
    /// Defined on the root only — mirroring a sub-chain about its own anchor
    /// would shear the pose. Applying it twice restores every limb exactly.
    pub fn flip(&mut self) {
        let ref_x = self.limbs[0].position.x;
        for limb in &mut self.limbs {
            limb.position.x = 2.0 * ref_x - limb.position.x;
            limb.rotation = -limb.rotation;
            limb.rest_rotation = -limb.rest_rotation;
            limb.collapse_target = -limb.collapse_target;
            limb.mirrored = !limb.mirrored;
        }
    }
}

// ============================================================================
// Angle Helpers
// ============================================================================

/// Shortest signed angular difference `to - from`, in degrees, wrapped to
/// `[-180, 180)`.
pub fn delta_angle(from: f32, to: f32) -> f32 {
    ((to - from) % 360.0 + 540.0) % 360.0 - 180.0
}

// ============================================================================
// Default Rig
// ============================================================================

/// The stock three-limb bot used by the client when no rig file is given:
/// a squat base, a leaning torso, and a small head.
pub fn default_rig() -> RigSpec {
    RigSpec {
        limbs: vec![
            LimbSpec::new("base", 0.8, 0.5).with_joints(Vec2::new(0.4, 0.0), Vec2::new(0.4, 0.5)),
            LimbSpec::new("torso", 0.5, 1.2)
                .with_joints(Vec2::new(0.25, 0.0), Vec2::new(0.25, 1.2))
                .with_rest_bend(-8.0),
            LimbSpec::new("head", 0.6, 0.6)
                .with_joints(Vec2::new(0.3, 0.0), Vec2::new(0.3, 0.6))
                .with_rest_bend(16.0),
        ],
        color: [0.18, 0.55, 0.92, 1.0],
        layer: 0.0,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn three_limb_rig() -> RigSpec {
        RigSpec {
            limbs: vec![
                LimbSpec::new("root", 0.5, 1.0).with_joints(Vec2::ZERO, Vec2::new(0.0, 1.0)),
                LimbSpec::new("mid", 0.5, 1.0)
                    .with_joints(Vec2::ZERO, Vec2::new(0.0, 1.0))
                    .with_rest_bend(20.0),
                LimbSpec::new("tip", 0.5, 1.0)
                    .with_joints(Vec2::ZERO, Vec2::new(0.0, 1.0))
                    .with_rest_bend(-35.0),
            ],
            ..default()
        }
    }

    fn assert_coherent(chain: &LimbChain) {
        for i in 0..chain.len() {
            if let Some(c) = chain.limb(i).child {
                let attach = chain.attachment_point(i);
                let anchor = chain.limb(c).position;
                assert!(
                    attach.distance(anchor) < EPS,
                    "joint {} -> {} drifted: {:?} vs {:?}",
                    i,
                    c,
                    attach,
                    anchor
                );
            }
        }
    }

    #[test]
    fn test_empty_rig_rejected() {
        assert!(matches!(
            RigSpec::default().build(),
            Err(RigError::EmptyChain)
        ));
    }

    #[test]
    fn test_assembly_is_coherent() {
        let chain = three_limb_rig().build().unwrap();
        assert_coherent(&chain);

        // Rest pose recorded after the bends were applied
        assert!((chain.limb(0).rest_rotation - 0.0).abs() < EPS);
        assert!((chain.limb(1).rest_rotation - 20.0).abs() < EPS);
        assert!((chain.limb(2).rest_rotation - (20.0 - 35.0)).abs() < EPS);
    }

    #[test]
    fn test_joint_normalization() {
        let spec = LimbSpec::new("l", 2.0, 4.0).with_joints(Vec2::new(1.0, 0.5), Vec2::new(1.0, 4.0));
        let chain = RigSpec {
            limbs: vec![spec],
            ..default()
        }
        .build()
        .unwrap();

        let corners = chain.limb(0).local_corners();
        assert_eq!(corners[0], Vec2::new(-1.0, -0.5));
        assert_eq!(corners[2], Vec2::new(1.0, 3.5));
        // Child joint re-expressed relative to the zeroed anchor
        assert_eq!(chain.limb(0).child_joint, Vec2::new(0.0, 3.5));
    }

    #[test]
    fn test_translate_moves_subchain_rigidly() {
        let mut chain = three_limb_rig().build().unwrap();
        let before: Vec<Vec3> = chain.limbs().iter().map(|l| l.position).collect();

        chain.translate(0, Vec3::new(3.0, -1.5, 0.0));
        for (limb, old) in chain.limbs().iter().zip(&before) {
            assert!(limb.position.distance(*old + Vec3::new(3.0, -1.5, 0.0)) < EPS);
        }
        assert_coherent(&chain);

        // Sub-chain translate only affects the tail
        chain.translate(1, Vec3::X);
        assert!((chain.limb(0).position.x - 3.0).abs() < EPS);
        assert!((chain.limb(1).position.x - (before[1].x + 4.0)).abs() < EPS);
    }

    #[test]
    fn test_rotate_preserves_coherence() {
        let mut chain = three_limb_rig().build().unwrap();
        for delta in [13.0, -90.0, 47.5, 181.0] {
            chain.rotate(0, delta);
            assert_coherent(&chain);
        }
        chain.rotate(1, 30.0);
        assert_coherent(&chain);
    }

    #[test]
    fn test_rigid_cascade() {
        let mut chain = three_limb_rig().build().unwrap();
        let before: Vec<f32> = chain.limbs().iter().map(|l| l.rotation).collect();

        chain.rotate(0, 42.0);
        for (limb, old) in chain.limbs().iter().zip(&before) {
            assert!((limb.rotation - old - 42.0).abs() < EPS);
        }
        // Relative bends between neighbours unchanged
        assert!(((chain.limb(1).rotation - chain.limb(0).rotation) - (before[1] - before[0])).abs() < EPS);
        assert!(((chain.limb(2).rotation - chain.limb(1).rotation) - (before[2] - before[1])).abs() < EPS);
    }

    #[test]
    fn test_flip_is_involutive() {
        let mut chain = three_limb_rig().build().unwrap();
        chain.translate(0, Vec3::new(2.0, 0.0, 0.0));
        chain.rotate(0, 15.0);

        let before: Vec<(Vec3, f32)> = chain.limbs().iter().map(|l| (l.position, l.rotation)).collect();

        chain.flip();
        assert_coherent(&chain);
        assert!(chain.root().mirrored);
        // Root anchor is the reference: it stays put
        assert!(chain.root().position.distance(before[0].0) < EPS);

        chain.flip();
        assert_coherent(&chain);
        for (limb, (pos, rot)) in chain.limbs().iter().zip(&before) {
            assert!(limb.position.distance(*pos) < EPS);
            assert!((limb.rotation - rot).abs() < EPS);
            assert!(!limb.mirrored);
        }
    }

    #[test]
    fn test_flip_mirrors_positions() {
        let mut chain = three_limb_rig().build().unwrap();
        chain.rotate(0, 30.0); // give the tail some horizontal extent
        let root_x = chain.root().position.x;
        let mid_x = chain.limb(1).position.x;

        chain.flip();
        assert!((chain.limb(1).position.x - (2.0 * root_x - mid_x)).abs() < EPS);
    }

    #[test]
    fn test_find_resolves_names() {
        let chain = three_limb_rig().build().unwrap();
        assert_eq!(chain.find("mid"), Some(1));
        assert_eq!(chain.find("missing"), None);
        assert!(matches!(
            chain.index_of("missing"),
            Err(RigError::UnknownLimb(_))
        ));
    }

    #[test]
    fn test_delta_angle_wraps() {
        assert!((delta_angle(0.0, 90.0) - 90.0).abs() < EPS);
        assert!((delta_angle(350.0, 10.0) - 20.0).abs() < EPS);
        assert!((delta_angle(10.0, 350.0) + 20.0).abs() < EPS);
        assert!((delta_angle(720.0, 0.0) - 0.0).abs() < EPS);
    }

    #[test]
    fn test_rig_round_trips_through_ron() {
        let rig = default_rig();
        let text = ron::to_string(&rig).unwrap();
        let parsed = RigSpec::from_ron(&text).unwrap();
        assert_eq!(parsed.limbs.len(), rig.limbs.len());
        assert_eq!(parsed.limbs[1].name, "torso");
    }
}
