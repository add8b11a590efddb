//! # Bot Classes
//!
//! Property-driven tuning for a bot, in the spirit of a humanoid description
//! component: the controller reads everything from here, no hardcoded speeds.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// Continuous Jump Mode
// ============================================================================

/// Automatic re-jump behaviour: re-arm a jump every frame the previous one
/// has landed, without waiting for input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum ContinuousJump {
    #[default]
    None,
    InPlace,
    Forward,
}

// ============================================================================
// BotTuning Component
// ============================================================================

/// Movement, jump, and fold tuning for one bot. Supplied at construction;
/// not runtime-mutable by the controller.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct BotTuning {
    // === Movement (units/sec) ===
    /// Ground movement speed
    pub move_speed: f32,
    /// Move forward every frame instead of per input edge
    pub continuous_move: bool,

    // === Jumping ===
    /// Apex height above the launch point
    pub jump_height: f32,
    /// Horizontal reach of a forward jump
    pub jump_distance: f32,
    /// Vertical speed while ascending
    pub ascend_speed: f32,
    /// Vertical speed while descending
    pub descend_speed: f32,
    /// Horizontal speed while airborne
    pub air_speed: f32,
    /// Automatic re-jump mode
    pub continuous_jump: ContinuousJump,

    // === Collapse / Rise (degrees/sec) ===
    /// Starting fold speed for the root limb
    pub collapse_speed: f32,
    /// Constant rise speed
    pub rise_speed: f32,
    /// Per-frame fold speed increment while collapsing
    pub collapse_acceleration: f32,
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            continuous_move: false,
            jump_height: 1.0,
            jump_distance: 1.5,
            ascend_speed: 5.0,
            descend_speed: 3.0,
            air_speed: 3.0,
            continuous_jump: ContinuousJump::None,
            collapse_speed: 50.0,
            rise_speed: 35.0,
            collapse_acceleration: 2.0,
        }
    }
}

impl BotTuning {
    /// Coerce physically nonsensical values upward. Jump speeds below 1 are
    /// floored at 1; nothing is ever rejected.
    pub fn sanitize(mut self) -> Self {
        self.ascend_speed = self.ascend_speed.max(1.0);
        self.descend_speed = self.descend_speed.max(1.0);
        self.air_speed = self.air_speed.max(1.0);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_floors_jump_speeds() {
        let tuning = BotTuning {
            ascend_speed: 0.2,
            descend_speed: -4.0,
            air_speed: 0.999,
            ..Default::default()
        }
        .sanitize();

        assert_eq!(tuning.ascend_speed, 1.0);
        assert_eq!(tuning.descend_speed, 1.0);
        assert_eq!(tuning.air_speed, 1.0);
    }

    #[test]
    fn test_sanitize_keeps_sane_values() {
        let tuning = BotTuning::default().sanitize();
        assert_eq!(tuning.ascend_speed, 5.0);
        assert_eq!(tuning.descend_speed, 3.0);
        assert_eq!(tuning.air_speed, 3.0);
    }
}
