//! # Limbot Runtime
//!
//! Control systems for Limbot characters: the gated controller state machine
//! plus the per-tick choreography advances. The client adds this on top of
//! its rendering setup; everything here drives `limbot_common` chains and
//! never touches meshes or windows.
//!
//! ## Modules
//!
//! - [`controller`]: `BotController` component, input gathering, gating, and
//!   jump/fold advancement
//! - [`wobble`]: cosmetic idle sway, disabled during fold transitions
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Limbot Runtime                       │
//! ├──────────────────────────────────────────────────────────┤
//! │  Bot Controller (per tick, in order)                     │
//! │  ├── refresh InputActionMap from the keyboard            │
//! │  ├── gather intents into BotController                   │
//! │  ├── drive: gate + translate/flip/arm choreographies     │
//! │  ├── advance in-flight jump arcs                         │
//! │  └── advance fold waves, settle finished transitions     │
//! ├──────────────────────────────────────────────────────────┤
//! │  Limb Wobble                                             │
//! │  └── sine sway around rest rotations while idle          │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod controller;
pub mod wobble;

use bevy::prelude::*;
use tracing::info;

// ============================================================================
// Runtime Plugin
// ============================================================================

/// Main runtime plugin - add alongside whatever renders the chain.
///
/// # Example
/// ```rust,ignore
/// use bevy::prelude::*;
/// use limbot_runtime::LimbotRuntimePlugin;
///
/// fn main() {
///     App::new()
///         .add_plugins(DefaultPlugins)
///         .add_plugins(LimbotRuntimePlugin)
///         .run();
/// }
/// ```
pub struct LimbotRuntimePlugin;

impl Plugin for LimbotRuntimePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(controller::BotControllerPlugin);
        app.add_plugins(wobble::WobblePlugin);

        info!("Limbot runtime initialized");
    }
}

// ============================================================================
// Prelude
// ============================================================================

/// Convenient re-exports for common runtime types.
pub mod prelude {
    pub use super::controller::{BotController, BotControllerPlugin, Facing, FoldCompleted};
    pub use super::wobble::{LimbWobble, WobbleDriver, WobblePlugin};
    pub use super::LimbotRuntimePlugin;
}
