//! # Input Service
//!
//! Logical input actions for a bot, decoupled from physical keys. The
//! controller only asks "is this action pressed"; the client refreshes the
//! map from the keyboard once per frame.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// Input Actions
// ============================================================================

/// A named input action with up to two key bindings.
#[derive(Clone, Debug, Reflect, Serialize, Deserialize)]
pub struct InputAction {
    /// Action name
    pub name: String,
    /// Primary binding
    pub primary: Option<KeyCode>,
    /// Secondary binding
    pub secondary: Option<KeyCode>,
    /// Is the action currently held
    #[serde(skip)]
    pub pressed: bool,
    /// Was the action pressed this frame
    #[serde(skip)]
    pub just_pressed: bool,
}

impl InputAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: None,
            secondary: None,
            pressed: false,
            just_pressed: false,
        }
    }

    pub fn with_key(mut self, key: KeyCode) -> Self {
        self.primary = Some(key);
        self
    }

    pub fn with_secondary(mut self, key: KeyCode) -> Self {
        self.secondary = Some(key);
        self
    }
}

// ============================================================================
// Input Action Map Resource
// ============================================================================

/// Collection of input actions, polled by the controller each frame.
#[derive(Resource, Reflect, Clone, Debug, Default)]
#[reflect(Resource)]
pub struct InputActionMap {
    /// All registered actions
    pub actions: Vec<InputAction>,
}

impl InputActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, action: InputAction) -> &mut Self {
        self.actions.push(action);
        self
    }

    pub fn get(&self, name: &str) -> Option<&InputAction> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn is_pressed(&self, name: &str) -> bool {
        self.get(name).map(|a| a.pressed).unwrap_or(false)
    }

    pub fn just_pressed(&self, name: &str) -> bool {
        self.get(name).map(|a| a.just_pressed).unwrap_or(false)
    }

    /// Refresh every action's state from the raw keyboard input.
    pub fn refresh(&mut self, keys: &ButtonInput<KeyCode>) {
        for action in &mut self.actions {
            let bindings = action.primary.iter().chain(action.secondary.iter());
            let mut pressed = false;
            let mut just_pressed = false;
            for key in bindings {
                pressed |= keys.pressed(*key);
                just_pressed |= keys.just_pressed(*key);
            }
            action.pressed = pressed;
            action.just_pressed = just_pressed;
        }
    }
}

// ============================================================================
// Default Actions
// ============================================================================

/// The five bot actions with their default bindings.
pub fn default_bot_actions() -> InputActionMap {
    let mut map = InputActionMap::new();

    map.add(InputAction::new("MoveLeft").with_key(KeyCode::ArrowLeft).with_secondary(KeyCode::KeyA));
    map.add(InputAction::new("MoveRight").with_key(KeyCode::ArrowRight).with_secondary(KeyCode::KeyD));
    map.add(InputAction::new("JumpInPlace").with_key(KeyCode::Space));
    map.add(InputAction::new("JumpForward").with_key(KeyCode::KeyF));
    map.add(InputAction::new("CollapseToggle").with_key(KeyCode::KeyC));

    map
}

// ============================================================================
// Tests
// ============================================================================
