//! Tether anchors and platform motion.

use bevy::prelude::*;

/// Pose of the point a body is tethered to.
///
/// The controller only ever reads this; whoever owns the platform moves it.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct AnchorFrame {
    /// World position.
    pub position: Vec3,
    /// World rotation.
    pub rotation: Quat,
}

impl Default for AnchorFrame {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

impl AnchorFrame {
    /// Anchor at `position` with no rotation.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Builder: set rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Anchor "up" direction.
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Convert an anchor-space point to world space.
    #[inline]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

impl From<&Transform> for AnchorFrame {
    fn from(transform: &Transform) -> Self {
        Self {
            position: transform.translation,
            rotation: transform.rotation,
        }
    }
}

/// Marker component for entities bodies can be tethered to.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct TetherAnchor;

/// Constant-velocity kinematic motion for a platform.
///
/// Moves the entity's `Transform` every fixed tick, before the controllers
/// that are tethered to it run.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct PlatformMotion {
    /// World-space velocity (units/second).
    pub velocity: Vec3,
}

impl Default for PlatformMotion {
    fn default() -> Self {
        Self {
            velocity: Vec3::NEG_Z * 20.0,
        }
    }
}

impl PlatformMotion {
    /// Motion with the given velocity.
    pub fn new(velocity: Vec3) -> Self {
        Self { velocity }
    }

    /// Position after moving for `dt` seconds.
    pub fn advance(&self, position: Vec3, dt: f32) -> Vec3 {
        position + self.velocity * dt
    }
}
