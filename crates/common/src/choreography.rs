//! # Choreography
//!
//! Multi-frame animation sequences, expressed as explicit resumable state
//! objects advanced once per tick instead of blocking loops: the per-limb
//! collapse/rise fold wave and the per-bot jump arc.
//!
//! ## Fold wave
//!
//! Collapsing runs root-to-tip visually but completes tip-to-root logically:
//! each limb rotates itself onto its fold target, then starts its child with
//! its own (accelerated) speed, then waits for the child's `collapsed` flag
//! before raising its own. The terminal limb completes right after its own
//! rotation. Rising is the mirror image at constant speed.
//!
//! All in-flight limb choreographies are advanced by one arena pass per tick;
//! only the parent-waits-for-child dependency is ordered, nothing else.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::classes::BotTuning;
use crate::rig::{delta_angle, LimbChain};

/// A limb counts as on-target once within this many degrees.
pub const ANGLE_EPSILON: f32 = 0.05;

/// Absolute closeness to the jump's target X that counts as arrival.
/// Tolerates slight overshoot in either direction.
pub const DISTANCE_EPSILON: f32 = 0.05;

// ============================================================================
// Fold Wave
// ============================================================================

/// Per-limb fold state machine.
///
/// `Risen -> Collapsing -> AwaitChildCollapse -> Collapsed -> Rising ->
/// AwaitChildRise -> Risen`. A limb only leaves `Risen` through
/// [`LimbChain::start_collapse`] and only leaves `Collapsed` through
/// [`LimbChain::start_rise`], which is the guard that makes a Rise issued
/// while a collapse wave is still in flight a no-op instead of a second
/// concurrent driver of the same limb.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum FoldPhase {
    /// At the rest pose, eligible to collapse
    #[default]
    Risen,
    /// Rotating toward the collapse target
    Collapsing,
    /// Own rotation done, waiting for the child's `collapsed` flag
    AwaitChildCollapse,
    /// Fully folded (self and everything below), eligible to rise
    Collapsed,
    /// Rotating back toward the rest rotation
    Rising,
    /// Own rotation done, waiting for the child to report risen
    AwaitChildRise,
}

impl FoldPhase {
    /// Whether a choreography is currently driving this limb.
    pub fn in_flight(self) -> bool {
        !matches!(self, FoldPhase::Risen | FoldPhase::Collapsed)
    }
}

impl LimbChain {
    /// Arm the root's collapse choreography at `speed` (degrees/sec).
    /// No-op unless the root is fully risen; returns whether it armed.
    pub fn start_collapse(&mut self, speed: f32) -> bool {
        self.arm_collapse(0, speed)
    }

    /// Arm the root's rise choreography at `speed`. No-op unless the root is
    /// fully collapsed; returns whether it armed.
    pub fn start_rise(&mut self, speed: f32) -> bool {
        self.arm_rise(0, speed)
    }

    fn arm_collapse(&mut self, idx: usize, speed: f32) -> bool {
        let limb = &mut self.limbs[idx];
        if limb.phase != FoldPhase::Risen {
            return false;
        }
        limb.phase = FoldPhase::Collapsing;
        limb.fold_speed = speed;
        true
    }

    fn arm_rise(&mut self, idx: usize, speed: f32) -> bool {
        let limb = &mut self.limbs[idx];
        if limb.phase != FoldPhase::Collapsed {
            return false;
        }
        limb.phase = FoldPhase::Rising;
        limb.fold_speed = speed;
        true
    }

    /// Advance every in-flight fold choreography by one tick.
    ///
    /// One pass in arena (root-to-tip) order: a parent that finishes its
    /// rotation this tick starts its child within the same tick, matching the
    /// cooperative-coroutine semantics; a child's completion flag is only
    /// observed by its parent on a later tick, so completion propagates
    /// strictly tip-to-root. `acceleration` is the per-frame speed increment
    /// applied while collapsing; rising runs at constant speed.
    pub fn step_fold(&mut self, dt: f32, acceleration: f32) {
        for i in 0..self.limbs.len() {
            match self.limbs[i].phase {
                FoldPhase::Collapsing => {
                    let limb = &self.limbs[i];
                    let remaining = delta_angle(limb.rotation, limb.collapse_target);
                    if remaining.abs() > ANGLE_EPSILON {
                        let max_step = limb.fold_speed * dt;
                        self.rotate(i, remaining.clamp(-max_step, max_step));
                        self.limbs[i].fold_speed += acceleration;
                    } else {
                        let speed = self.limbs[i].fold_speed;
                        match self.limbs[i].child {
                            Some(c) => {
                                // Acceleration compounds down the chain
                                self.arm_collapse(c, speed);
                                self.limbs[i].phase = FoldPhase::AwaitChildCollapse;
                            }
                            None => {
                                self.limbs[i].collapsed = true;
                                self.limbs[i].phase = FoldPhase::Collapsed;
                            }
                        }
                    }
                }
                FoldPhase::AwaitChildCollapse => {
                    if let Some(child) = self.limbs[i].child {
                        if self.limbs[child].collapsed {
                            self.limbs[i].collapsed = true;
                            self.limbs[i].phase = FoldPhase::Collapsed;
                        }
                    }
                }
                FoldPhase::Rising => {
                    let limb = &self.limbs[i];
                    let remaining = delta_angle(limb.rotation, limb.rest_rotation);
                    if remaining.abs() > ANGLE_EPSILON {
                        let max_step = limb.fold_speed * dt;
                        self.rotate(i, remaining.clamp(-max_step, max_step));
                    } else {
                        let speed = self.limbs[i].fold_speed;
                        match self.limbs[i].child {
                            Some(c) => {
                                self.arm_rise(c, speed);
                                self.limbs[i].phase = FoldPhase::AwaitChildRise;
                            }
                            None => {
                                self.limbs[i].collapsed = false;
                                self.limbs[i].phase = FoldPhase::Risen;
                            }
                        }
                    }
                }
                FoldPhase::AwaitChildRise => {
                    if let Some(child) = self.limbs[i].child {
                        if !self.limbs[child].collapsed {
                            self.limbs[i].collapsed = false;
                            self.limbs[i].phase = FoldPhase::Risen;
                        }
                    }
                }
                FoldPhase::Risen | FoldPhase::Collapsed => {}
            }
        }
    }

    /// Whether any limb still has an in-flight fold choreography.
    pub fn fold_in_flight(&self) -> bool {
        self.limbs.iter().any(|l| l.phase.in_flight())
    }
}

// ============================================================================
// Jump Arc
// ============================================================================

/// Which jump to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum JumpKind {
    /// Straight up and back down
    InPlace,
    /// Up and toward the facing direction
    Forward,
}

/// Resumable jump state, advanced once per tick.
///
/// Ascends (and drifts forward, for [`JumpKind::Forward`]) until both the
/// height and distance thresholds are met, then descends until the root
/// anchor touches the ground, which is clamped to exactly y = 0.
#[derive(Clone, Debug, Reflect)]
pub struct JumpArc {
    target_height: f32,
    target_x: f32,
    drift_sign: f32,
    height_reached: bool,
    distance_reached: bool,
    descending: bool,
}

impl JumpArc {
    /// Plan a jump from the chain's current root anchor. `facing_sign` is
    /// -1 for left, +1 for right.
    pub fn new(kind: JumpKind, chain: &LimbChain, tuning: &BotTuning, facing_sign: f32) -> Self {
        let root = chain.root().position;
        Self {
            target_height: root.y + tuning.jump_height,
            target_x: root.x + tuning.jump_distance * facing_sign,
            drift_sign: facing_sign,
            height_reached: false,
            // In-place jumps start with the distance condition pre-satisfied
            distance_reached: kind == JumpKind::InPlace,
            descending: false,
        }
    }

    /// Advance one tick. Returns `true` once the bot has landed.
    pub fn advance(&mut self, chain: &mut LimbChain, tuning: &BotTuning, dt: f32) -> bool {
        if !self.descending {
            if !self.height_reached {
                chain.translate(0, Vec3::Y * tuning.ascend_speed * dt);
            }
            if !self.distance_reached {
                chain.translate(0, Vec3::X * tuning.air_speed * self.drift_sign * dt);
            }

            let root = chain.root().position;
            self.height_reached = self.height_reached || root.y >= self.target_height;
            self.distance_reached =
                self.distance_reached || (root.x - self.target_x).abs() <= DISTANCE_EPSILON;

            if self.height_reached && self.distance_reached {
                self.descending = true;
            }
            return false;
        }

        chain.translate(0, Vec3::NEG_Y * tuning.descend_speed * dt);
        let y = chain.root().position.y;
        if y <= 0.0 {
            // Land on exactly y = 0, not merely at-or-below it
            chain.translate(0, Vec3::new(0.0, -y, 0.0));
            return true;
        }
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
