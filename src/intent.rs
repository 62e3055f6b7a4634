//! Control intent component.
//!
//! Intents represent what the player (or an AI) wants to do this frame. The
//! host fills them from whatever input source it uses; the controller reads
//! them during its frame and physics ticks.

use bevy::prelude::*;

/// Input state for a tethered controller.
///
/// Continuous inputs (`movement`, `look_delta`, `look_rate`, `modifier_held`)
/// are plain fields. Discrete buttons go through [`set_push_pressed`] and
/// [`set_boots_toggle_pressed`], which turn a rising edge into a pending
/// request that survives until a physics tick consumes it.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use tether_controller::prelude::*;
///
/// let mut intent = ControlIntent::new();
/// intent.set_movement(Vec2::new(0.0, 1.0));
///
/// // Holding the button only requests one push.
/// intent.set_push_pressed(true);
/// intent.set_push_pressed(true);
/// assert!(intent.take_push_request());
/// assert!(!intent.take_push_request());
/// ```
///
/// [`set_push_pressed`]: ControlIntent::set_push_pressed
/// [`set_boots_toggle_pressed`]: ControlIntent::set_boots_toggle_pressed
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct ControlIntent {
    /// Planar movement input: x = right, y = forward. Clamped to the unit disc.
    pub movement: Vec2,
    /// Pointer look delta accumulated since the last frame tick.
    pub look_delta: Vec2,
    /// Stick-style look rate, scaled by frame time.
    pub look_rate: Vec2,
    /// Whether the boost modifier is held.
    pub modifier_held: bool,
    push_pressed: bool,
    push_requested: bool,
    boots_toggle_pressed: bool,
    boots_toggle_requested: bool,
}

impl ControlIntent {
    /// Create an empty intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the movement input. Vectors longer than one are normalized.
    pub fn set_movement(&mut self, movement: Vec2) {
        self.movement = if movement.length_squared() > 1.0 {
            movement.normalize_or_zero()
        } else {
            movement
        };
    }

    /// Accumulate pointer look input.
    pub fn add_look_delta(&mut self, delta: Vec2) {
        self.look_delta += delta;
    }

    /// Set the stick look rate.
    pub fn set_look_rate(&mut self, rate: Vec2) {
        self.look_rate = rate;
    }

    /// Set whether the boost modifier is held.
    pub fn set_modifier_held(&mut self, held: bool) {
        self.modifier_held = held;
    }

    /// Check if there is meaningful movement input.
    pub fn is_moving(&self) -> bool {
        self.movement.length_squared() > 1e-6
    }

    /// Report the push button state. A false → true change queues a push.
    pub fn set_push_pressed(&mut self, pressed: bool) {
        if pressed && !self.push_pressed {
            self.push_requested = true;
        }
        self.push_pressed = pressed;
    }

    /// Queue a push directly, bypassing edge detection.
    pub fn request_push(&mut self) {
        self.push_requested = true;
    }

    /// Check if a push is queued.
    pub fn has_push_request(&self) -> bool {
        self.push_requested
    }

    /// Consume the queued push, if any.
    pub fn take_push_request(&mut self) -> bool {
        std::mem::take(&mut self.push_requested)
    }

    /// Report the magnet boots toggle button state.
    pub fn set_boots_toggle_pressed(&mut self, pressed: bool) {
        if pressed && !self.boots_toggle_pressed {
            self.boots_toggle_requested = true;
        }
        self.boots_toggle_pressed = pressed;
    }

    /// Consume the queued boots toggle, if any.
    pub fn take_boots_toggle(&mut self) -> bool {
        std::mem::take(&mut self.boots_toggle_requested)
    }

    /// Take the accumulated pointer look delta, leaving zero behind.
    pub fn take_look_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }

    /// Clear continuous inputs. Queued requests are kept.
    pub fn clear(&mut self) {
        self.movement = Vec2::ZERO;
        self.look_delta = Vec2::ZERO;
        self.look_rate = Vec2::ZERO;
        self.modifier_held = false;
    }
}
