//! # Limb Wobble
//!
//! Idle sway: selected limbs oscillate around their rest rotation on a sine
//! wave. Purely cosmetic, and switched off whenever the bot is folding,
//! folded, or rising so it cannot fight the fold wave.

use bevy::prelude::*;

use limbot_common::prelude::*;

use crate::controller::BotController;

// ============================================================================
// Components
// ============================================================================

/// One oscillating limb.
#[derive(Clone, Debug, Reflect)]
pub struct WobbleDriver {
    /// Arena index of the limb to sway
    pub limb: usize,
    /// Peak-to-peak sway in degrees
    pub amplitude: f32,
    /// Oscillation speed in radians/sec
    pub speed: f32,
    /// Individually switch this driver off without removing it
    pub enabled: bool,
}

/// All wobble drivers for one bot.
#[derive(Component, Clone, Debug, Default, Reflect)]
#[reflect(Component)]
pub struct LimbWobble {
    pub drivers: Vec<WobbleDriver>,
}

// ============================================================================
// Plugin
// ============================================================================

pub struct WobblePlugin;

impl Plugin for WobblePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<LimbWobble>()
            .add_systems(Update, update_wobble);
    }
}

fn update_wobble(
    time: Res<Time>,
    mut bots: Query<(&mut LimbChain, &LimbWobble, &BotController)>,
) {
    let t = time.elapsed_secs();
    for (mut chain, wobble, bot) in bots.iter_mut() {
        if bot.transitioning || bot.collapsed {
            continue;
        }
        apply_wobble(&mut chain, &wobble.drivers, t);
    }
}

/// Rotate each driven limb onto its sway angle for time `t`.
pub fn apply_wobble(chain: &mut LimbChain, drivers: &[WobbleDriver], t: f32) {
    for driver in drivers {
        if !driver.enabled || driver.limb >= chain.len() {
            continue;
        }
        let limb = chain.limb(driver.limb);
        let target = limb.rest_rotation + (driver.speed * t).sin() * driver.amplitude * 0.5;
        let delta = delta_angle(limb.rotation, target);
        chain.rotate(driver.limb, delta);
    }
}

// ============================================================================
// Tests
// ============================================================================
