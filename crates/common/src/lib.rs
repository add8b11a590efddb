//! # Limbot Common
//!
//! Shared types and the kinematic chain engine for Limbot.
//! Used by both the runtime (controller systems) and the client (renderer),
//! so everything in here is pure data + algorithms: no windowing, no input
//! polling, no rendering.
//!
//! ## Modules
//!
//! - [`rig`]: Limb geometry, the chain arena, and the pose operations
//!   (translate / rotate / flip) that keep joints attached
//! - [`choreography`]: Multi-frame animation state machines (collapse/rise
//!   fold wave, jump arc), advanced once per tick
//! - [`classes`]: Property-driven tuning (`BotTuning`) read by the controller
//! - [`services`]: Input action mapping
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       Limbot Common                        │
//! ├────────────────────────────────────────────────────────────┤
//! │  Chain Engine (rig)                                        │
//! │  ├── LimbChain: arena of limbs, root at index 0            │
//! │  ├── translate / rotate: rigid cascade, joint coherence    │
//! │  └── flip: mirror about the root anchor                    │
//! ├────────────────────────────────────────────────────────────┤
//! │  Choreography                                              │
//! │  ├── FoldPhase per limb: collapse/rise wave state machine  │
//! │  └── JumpArc per bot: ascend / drift / descend / land      │
//! ├────────────────────────────────────────────────────────────┤
//! │  Tuning & Input                                            │
//! │  ├── BotTuning: speeds and distances, floor-clamped        │
//! │  └── InputActionMap: five logical bot actions              │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod classes;
pub mod choreography;
pub mod rig;
pub mod services;

// ============================================================================
// Prelude
// ============================================================================

/// Convenient re-exports for the types most callers need.
pub mod prelude {
    pub use super::classes::{BotTuning, ContinuousJump};
    pub use super::choreography::{FoldPhase, JumpArc, JumpKind, ANGLE_EPSILON};
    pub use super::rig::{delta_angle, Limb, LimbChain, LimbSpec, RigError, RigSpec};
    pub use super::services::input::{default_bot_actions, InputAction, InputActionMap};
}
