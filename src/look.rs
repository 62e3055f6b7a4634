//! First-person camera look.
//!
//! Look runs in the frame phase at display rate. Pointer input is already a
//! per-frame delta and is applied as-is; stick input is a rate and is scaled
//! by frame time.

use bevy::prelude::*;

use crate::config::LookConfig;

/// Camera yaw and pitch relative to the body, in degrees.
///
/// Positive yaw turns left (counter-clockwise about body up), positive pitch
/// looks up.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub struct LookState {
    yaw_degrees: f32,
    pitch_degrees: f32,
}

impl LookState {
    /// Create a look state with the given angles.
    pub fn new(yaw_degrees: f32, pitch_degrees: f32) -> Self {
        Self {
            yaw_degrees,
            pitch_degrees,
        }
    }

    /// Yaw in degrees.
    #[inline]
    pub fn yaw_degrees(&self) -> f32 {
        self.yaw_degrees
    }

    /// Pitch in degrees.
    #[inline]
    pub fn pitch_degrees(&self) -> f32 {
        self.pitch_degrees
    }

    /// Apply look input for one frame.
    ///
    /// Input x turns right, input y looks up. Non-finite input is ignored.
    pub fn apply(&mut self, delta: Vec2, rate: Vec2, dt: f32, config: &LookConfig) {
        let mut input = Vec2::ZERO;
        if delta.is_finite() {
            input += delta;
        }
        if rate.is_finite() && dt.is_finite() && dt > 0.0 {
            input += rate * dt;
        }

        self.yaw_degrees -= input.x * config.sensitivity;
        self.pitch_degrees = (self.pitch_degrees + input.y * config.sensitivity)
            .clamp(-config.pitch_limit, config.pitch_limit);
    }

    /// Move both angles toward zero by fraction `t` (clamped to `[0, 1]`).
    pub fn recenter(&mut self, t: f32) {
        let t = t.clamp(0.0, 1.0);
        self.yaw_degrees *= 1.0 - t;
        self.pitch_degrees *= 1.0 - t;
    }

    /// Camera rotation relative to the body.
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw_degrees.to_radians())
            * Quat::from_rotation_x(self.pitch_degrees.to_radians())
    }
}
