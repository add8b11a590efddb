//! # Bot Controller
//!
//! Turns discrete control intents (move, jump, collapse/rise, facing) into
//! chain operations while preventing illegal concurrent states. The
//! controller is the chain's only driver; its gates are what give the chain
//! mutual exclusion.
//!
//! ## Design
//!
//! - **Property-driven**: all speeds and distances come from `BotTuning`
//! - **Gated**: movement and jump are dead while jumping, transitioning, or
//!   collapsed; collapse only arms from idle/moving; rise only from
//!   collapsed, and only on a movement-class input
//! - **Tick-driven**: in-flight jumps and fold waves are resumable state
//!   advanced once per frame, never blocking the loop

use bevy::prelude::*;
use tracing::info;

use limbot_common::prelude::*;

// ============================================================================
// Controller State
// ============================================================================

/// Which way the bot is facing. Doubles as the sign of every horizontal
/// translation the controller issues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum Facing {
    #[default]
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Runtime state for one bot.
///
/// The intent fields (`move_axis`, `jump_request`, `collapse_request`,
/// `movement_input`) are rewritten from the input map every frame before the
/// drive system consumes them.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct BotController {
    /// Current facing direction
    pub facing: Facing,
    /// A jump arc is in flight
    pub jumping: bool,
    /// A collapse or rise wave is in flight
    pub transitioning: bool,
    /// The chain is fully folded
    pub collapsed: bool,
    /// The `collapsed` value the in-flight transition will settle on
    pub transition_target: bool,
    /// In-flight jump state
    pub jump: Option<JumpArc>,

    // === Per-frame intents ===
    /// -1 left, 0 none, +1 right
    pub move_axis: f32,
    /// Any movement-class action held (movement keys or either jump)
    pub movement_input: bool,
    /// Requested jump, if any
    pub jump_request: Option<JumpKind>,
    /// Collapse toggle held
    pub collapse_request: bool,
}

/// Fired when a bot finishes a collapse or rise wave.
#[derive(Message, Clone, Debug)]
pub struct FoldCompleted {
    pub entity: Entity,
    pub collapsed: bool,
}

// ============================================================================
// Controller Plugin
// ============================================================================

/// Plugin for bot control: input refresh, intent gathering, gating, and the
/// per-tick choreography advances, in that order.
pub struct BotControllerPlugin;

impl Plugin for BotControllerPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(default_bot_actions())
            .register_type::<BotController>()
            .register_type::<BotTuning>()
            .register_type::<LimbChain>()
            .register_type::<InputActionMap>()
            .add_message::<FoldCompleted>()
            .add_systems(
                Update,
                (
                    refresh_input_map,
                    gather_bot_intents,
                    drive_bots,
                    advance_jump_arcs,
                    advance_fold_waves,
                )
                    .chain(),
            );
    }
}

// ============================================================================
// Systems
// ============================================================================

/// Refresh the logical action map from the raw keyboard.
fn refresh_input_map(keys: Res<ButtonInput<KeyCode>>, mut map: ResMut<InputActionMap>) {
    map.refresh(&keys);
}

/// Rewrite every bot's intent fields from the action map.
fn gather_bot_intents(map: Res<InputActionMap>, mut bots: Query<&mut BotController>) {
    let left = map.is_pressed("MoveLeft");
    let right = map.is_pressed("MoveRight");
    let jump_in_place = map.is_pressed("JumpInPlace");
    let jump_forward = map.is_pressed("JumpForward");

    for mut bot in bots.iter_mut() {
        bot.move_axis = (right as i32 - left as i32) as f32;
        bot.movement_input = left || right || jump_in_place || jump_forward;
        bot.jump_request = if jump_in_place {
            Some(JumpKind::InPlace)
        } else if jump_forward {
            Some(JumpKind::Forward)
        } else {
            None
        };
        bot.collapse_request = map.is_pressed("CollapseToggle");
    }
}

/// Apply gating and issue chain operations for every bot.
fn drive_bots(
    time: Res<Time>,
    mut bots: Query<(&mut BotController, &mut LimbChain, &BotTuning)>,
) {
    let dt = time.delta_secs();
    for (mut bot, mut chain, tuning) in bots.iter_mut() {
        drive_bot(&mut bot, &mut chain, tuning, dt);
    }
}

/// Advance in-flight jump arcs by one tick.
fn advance_jump_arcs(
    time: Res<Time>,
    mut bots: Query<(&mut BotController, &mut LimbChain, &BotTuning)>,
) {
    let dt = time.delta_secs();
    for (mut bot, mut chain, tuning) in bots.iter_mut() {
        advance_jump(&mut bot, &mut chain, tuning, dt);
    }
}

/// Advance in-flight fold waves and settle finished transitions.
fn advance_fold_waves(
    time: Res<Time>,
    mut bots: Query<(Entity, &mut BotController, &mut LimbChain, &BotTuning)>,
    mut completed: MessageWriter<FoldCompleted>,
) {
    let dt = time.delta_secs();
    for (entity, mut bot, mut chain, tuning) in bots.iter_mut() {
        if let Some(collapsed) = advance_fold(&mut bot, &mut chain, tuning, dt) {
            info!(
                "bot {:?} finished {}",
                entity,
                if collapsed { "collapsing" } else { "rising" }
            );
            completed.write(FoldCompleted { entity, collapsed });
        }
    }
}

// ============================================================================
// Core Logic
// ============================================================================

/// One gated control tick for a single bot. Split out from the system so it
/// can be driven directly in tests.
pub fn drive_bot(bot: &mut BotController, chain: &mut LimbChain, tuning: &BotTuning, dt: f32) {
    // Rise after collapse, on a movement-class input only
    if bot.collapsed && !bot.transitioning && bot.movement_input {
        if chain.start_rise(tuning.rise_speed) {
            bot.transitioning = true;
            bot.transition_target = false;
        }
    }

    if bot.transitioning || bot.collapsed {
        return;
    }

    // Facing + discrete movement, dead while airborne
    if !bot.jumping && bot.move_axis != 0.0 {
        let dir = if bot.move_axis < 0.0 { Facing::Left } else { Facing::Right };
        set_facing(bot, chain, dir);
        if !tuning.continuous_move {
            move_forward(bot, chain, tuning, dt);
        }
    }
    if tuning.continuous_move && !bot.jumping {
        move_forward(bot, chain, tuning, dt);
    }

    // Jumping
    if !bot.jumping {
        let requested = match tuning.continuous_jump {
            ContinuousJump::InPlace => Some(JumpKind::InPlace),
            ContinuousJump::Forward => Some(JumpKind::Forward),
            ContinuousJump::None => bot.jump_request,
        };
        if let Some(kind) = requested {
            bot.jump = Some(JumpArc::new(kind, chain, tuning, bot.facing.sign()));
            bot.jumping = true;
        }
    }

    // Collapse, only from idle/moving
    if bot.collapse_request && !bot.jumping && chain.start_collapse(tuning.collapse_speed) {
        bot.transitioning = true;
        bot.transition_target = true;
    }
}

/// Flip the chain when, and only when, the direction actually changes.
pub fn set_facing(bot: &mut BotController, chain: &mut LimbChain, dir: Facing) {
    if dir != bot.facing {
        chain.flip();
        bot.facing = dir;
    }
}

/// Translate the whole chain one step in the facing direction.
pub fn move_forward(bot: &BotController, chain: &mut LimbChain, tuning: &BotTuning, dt: f32) {
    chain.translate(0, Vec3::X * tuning.move_speed * bot.facing.sign() * dt);
}

/// Advance an in-flight jump, clearing the flag on landing.
pub fn advance_jump(bot: &mut BotController, chain: &mut LimbChain, tuning: &BotTuning, dt: f32) {
    if let Some(arc) = bot.jump.as_mut() {
        if arc.advance(chain, tuning, dt) {
            bot.jump = None;
            bot.jumping = false;
        }
    }
}

/// Advance the chain's fold wave one tick; when the root reports the
/// transition target, settle the controller flags and return the new state.
pub fn advance_fold(
    bot: &mut BotController,
    chain: &mut LimbChain,
    tuning: &BotTuning,
    dt: f32,
) -> Option<bool> {
    chain.step_fold(dt, tuning.collapse_acceleration);

    if bot.transitioning && chain.root().collapsed == bot.transition_target {
        bot.transitioning = false;
        bot.collapsed = bot.transition_target;
        return Some(bot.collapsed);
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use limbot_common::rig::{LimbSpec, RigSpec};

    const DT: f32 = 1.0 / 60.0;

    fn setup() -> (BotController, LimbChain, BotTuning) {
        let chain = RigSpec {
            limbs: vec![
                LimbSpec::new("root", 0.5, 1.0).with_joints(Vec2::ZERO, Vec2::new(0.0, 1.0)),
                LimbSpec::new("mid", 0.5, 1.0)
                    .with_joints(Vec2::ZERO, Vec2::new(0.0, 1.0))
                    .with_rest_bend(15.0),
                LimbSpec::new("tip", 0.5, 1.0).with_joints(Vec2::ZERO, Vec2::new(0.0, 1.0)),
            ],
            ..Default::default()
        }
        .build()
        .unwrap();
        (BotController::default(), chain, BotTuning::default().sanitize())
    }

    fn tick(bot: &mut BotController, chain: &mut LimbChain, tuning: &BotTuning) {
        drive_bot(bot, chain, tuning, DT);
        advance_jump(bot, chain, tuning, DT);
        advance_fold(bot, chain, tuning, DT);
    }

    fn clear_intents(bot: &mut BotController) {
        bot.move_axis = 0.0;
        bot.movement_input = false;
        bot.jump_request = None;
        bot.collapse_request = false;
    }

    #[test]
    fn test_discrete_move_translates_once_per_tick() {
        let (mut bot, mut chain, tuning) = setup();
        bot.facing = Facing::Right;
        bot.move_axis = 1.0;
        bot.movement_input = true;

        let x0 = chain.root().position.x;
        tick(&mut bot, &mut chain, &tuning);
        assert!((chain.root().position.x - (x0 + tuning.move_speed * DT)).abs() < 1e-5);
    }

    #[test]
    fn test_facing_flips_exactly_once() {
        let (mut bot, mut chain, tuning) = setup();
        assert_eq!(bot.facing, Facing::Left);

        bot.move_axis = 1.0;
        bot.movement_input = true;
        tick(&mut bot, &mut chain, &tuning);
        assert_eq!(bot.facing, Facing::Right);
        assert!(chain.root().mirrored);

        // Same direction again: no redundant mirror
        tick(&mut bot, &mut chain, &tuning);
        assert_eq!(bot.facing, Facing::Right);
        assert!(chain.root().mirrored);
    }

    #[test]
    fn test_jump_lifecycle() {
        let (mut bot, mut chain, tuning) = setup();
        bot.jump_request = Some(JumpKind::InPlace);
        tick(&mut bot, &mut chain, &tuning);
        assert!(bot.jumping);

        clear_intents(&mut bot);
        for _ in 0..10_000 {
            tick(&mut bot, &mut chain, &tuning);
            if !bot.jumping {
                break;
            }
        }
        assert!(!bot.jumping);
        assert_eq!(chain.root().position.y, 0.0);
    }

    #[test]
    fn test_gating_while_jumping() {
        let (mut bot, mut chain, tuning) = setup();
        bot.jump_request = Some(JumpKind::InPlace);
        tick(&mut bot, &mut chain, &tuning);
        assert!(bot.jumping);

        // While airborne: movement, a second jump, and collapse are all dead
        bot.move_axis = 1.0;
        bot.movement_input = true;
        bot.jump_request = Some(JumpKind::Forward);
        bot.collapse_request = true;

        let x = chain.root().position.x;
        tick(&mut bot, &mut chain, &tuning);

        assert_eq!(chain.root().position.x, x, "moved while jumping");
        assert_eq!(bot.facing, Facing::Left, "turned while jumping");
        assert!(!bot.transitioning, "collapsed while jumping");
        assert!(bot.jumping);
    }

    #[test]
    fn test_collapse_rise_request_lifecycle() {
        let (mut bot, mut chain, tuning) = setup();
        let rest: Vec<f32> = chain.limbs().iter().map(|l| l.rotation).collect();

        bot.collapse_request = true;
        tick(&mut bot, &mut chain, &tuning);
        assert!(bot.transitioning);
        clear_intents(&mut bot);

        // Movement has no effect mid-transition
        bot.move_axis = 1.0;
        bot.movement_input = true;
        let x = chain.root().position.x;
        tick(&mut bot, &mut chain, &tuning);
        assert_eq!(chain.root().position.x, x);
        clear_intents(&mut bot);

        for _ in 0..10_000 {
            tick(&mut bot, &mut chain, &tuning);
            if !bot.transitioning {
                break;
            }
        }
        assert!(bot.collapsed);
        assert!(chain.root().collapsed);

        // Holding the collapse key while collapsed does nothing
        bot.collapse_request = true;
        tick(&mut bot, &mut chain, &tuning);
        assert!(!bot.transitioning);
        clear_intents(&mut bot);

        // A movement-class input starts the rise
        bot.movement_input = true;
        tick(&mut bot, &mut chain, &tuning);
        assert!(bot.transitioning);
        clear_intents(&mut bot);

        for _ in 0..10_000 {
            tick(&mut bot, &mut chain, &tuning);
            if !bot.transitioning {
                break;
            }
        }
        assert!(!bot.collapsed);
        for (limb, rest) in chain.limbs().iter().zip(&rest) {
            assert!(delta_angle(limb.rotation, *rest).abs() < 0.1);
        }
    }

    #[test]
    fn test_continuous_move_runs_without_input() {
        let (mut bot, mut chain, mut tuning) = setup();
        tuning.continuous_move = true;

        let x0 = chain.root().position.x;
        tick(&mut bot, &mut chain, &tuning);
        tick(&mut bot, &mut chain, &tuning);
        // Facing defaults left
        assert!((chain.root().position.x - (x0 - 2.0 * tuning.move_speed * DT)).abs() < 1e-5);
    }

    #[test]
    fn test_continuous_jump_rearms_after_landing() {
        let (mut bot, mut chain, mut tuning) = setup();
        tuning.continuous_jump = ContinuousJump::InPlace;

        tick(&mut bot, &mut chain, &tuning);
        assert!(bot.jumping);

        for _ in 0..10_000 {
            tick(&mut bot, &mut chain, &tuning);
            if !bot.jumping {
                break;
            }
        }
        // The very next tick launches again
        tick(&mut bot, &mut chain, &tuning);
        assert!(bot.jumping);
    }
}
