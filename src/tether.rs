//! Tether constraint for free flight.
//!
//! While floating, the body may never drift further from its anchor than the
//! tether allows. Two policies exist and one must be chosen explicitly in
//! [`TetherConfig`](crate::config::TetherConfig):
//!
//! - [`TetherPolicy::HardClamp`]: the body stops dead on the tether sphere.
//! - [`TetherPolicy::SoftPull`]: outward speed bleeds off inside a zone
//!   before the limit; the body is clamped only past a small overshoot margin.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the tether limit is enforced.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TetherPolicy {
    /// Clamp to the tether sphere and zero the velocity.
    HardClamp,
    /// Decelerate outward motion inside `zone` units of the limit, then clamp
    /// at `length + overshoot_margin`.
    SoftPull {
        /// Width of the deceleration band, measured inward from the limit.
        zone: f32,
        /// Deceleration rate (1/s) at the limit; scaled by depth into the zone.
        strength: f32,
        /// Distance past the limit at which the hard stop applies.
        overshoot_margin: f32,
    },
}

impl Default for TetherPolicy {
    fn default() -> Self {
        Self::HardClamp
    }
}

impl TetherPolicy {
    /// Soft pull with the given zone and strength and a 0.5 unit overshoot margin.
    pub fn soft(zone: f32, strength: f32) -> Self {
        Self::SoftPull {
            zone,
            strength,
            overshoot_margin: 0.5,
        }
    }

    /// Maximum distance from the anchor this policy ever allows.
    pub fn max_distance(&self, length: f32) -> f32 {
        match *self {
            Self::HardClamp => length,
            Self::SoftPull {
                overshoot_margin, ..
            } => length + overshoot_margin,
        }
    }
}

/// Result of applying the tether to one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TetherOutcome {
    /// Constrained position.
    pub position: Vec3,
    /// Constrained velocity.
    pub velocity: Vec3,
    /// Whether the hard stop was hit this step.
    pub clamped: bool,
}

/// Constrain a freshly integrated position and velocity to the tether.
///
/// `dt` scales the soft pull deceleration; the hard clamp ignores it.
pub fn constrain(
    anchor: Vec3,
    position: Vec3,
    velocity: Vec3,
    length: f32,
    policy: TetherPolicy,
    dt: f32,
) -> TetherOutcome {
    let offset = position - anchor;
    let distance = offset.length();
    let limit = policy.max_distance(length);

    if distance > limit {
        // Past the limit offset is never zero-length, so the direction is defined.
        let direction = offset / distance;
        debug!(distance, limit, "tether_clamped");
        return TetherOutcome {
            position: anchor + direction * limit,
            velocity: Vec3::ZERO,
            clamped: true,
        };
    }

    let velocity = match policy {
        TetherPolicy::HardClamp => velocity,
        TetherPolicy::SoftPull { zone, strength, .. } => {
            soft_pull(offset, distance, velocity, length, zone, strength, dt)
        }
    };

    TetherOutcome {
        position,
        velocity,
        clamped: false,
    }
}

/// Remove part of the outward radial velocity when inside the pull zone.
fn soft_pull(
    offset: Vec3,
    distance: f32,
    velocity: Vec3,
    length: f32,
    zone: f32,
    strength: f32,
    dt: f32,
) -> Vec3 {
    if zone <= 0.0 || distance <= f32::EPSILON {
        return velocity;
    }
    let zone_start = (length - zone).max(0.0);
    if distance <= zone_start {
        return velocity;
    }

    let radial = offset / distance;
    let outward_speed = velocity.dot(radial);
    if outward_speed <= 0.0 {
        return velocity;
    }

    let depth = ((distance - zone_start) / zone).clamp(0.0, 1.0);
    let bleed = (strength * depth * dt).clamp(0.0, 1.0);
    velocity - radial * outward_speed * bleed
}
