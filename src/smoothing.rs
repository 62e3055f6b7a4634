//! Ground normal low-pass filter.
//!
//! Raw per-tick normals flicker at edges and corners where different probes
//! win on consecutive ticks. Orienting the body straight from them jitters,
//! so the controller follows a spherically interpolated copy instead.

use bevy::prelude::*;

use crate::sensor::GroundContact;

/// Spherical interpolation between two unit vectors.
///
/// `t` is clamped to `[0, 1]`. Opposite vectors rotate through an arbitrary
/// perpendicular axis.
pub fn slerp_unit(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let t = t.clamp(0.0, 1.0);
    let arc = Quat::from_rotation_arc(from, to);
    (Quat::IDENTITY.slerp(arc, t) * from).normalize_or(to)
}

/// Exponentially smoothed ground normal.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct NormalSmoother {
    smoothed: Vec3,
}

impl Default for NormalSmoother {
    fn default() -> Self {
        Self { smoothed: Vec3::Y }
    }
}

impl NormalSmoother {
    /// Create a smoother resting at world up.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current smoothed normal (always unit length).
    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.smoothed
    }

    /// Snap back to world up.
    pub fn reset(&mut self) {
        self.smoothed = Vec3::Y;
    }

    /// Advance one physics tick.
    ///
    /// Ungrounded contacts reset to world up immediately; grounded contacts
    /// pull the smoothed normal toward the raw one by `dt * rate`.
    pub fn update(&mut self, contact: &GroundContact, dt: f32, rate: f32) -> Vec3 {
        if !contact.grounded {
            self.reset();
            return self.smoothed;
        }

        let target = contact.normal.normalize_or(Vec3::Y);
        self.smoothed = slerp_unit(self.smoothed, target, dt * rate).normalize_or(Vec3::Y);
        self.smoothed
    }
}
