//! Body pose and surface alignment.
//!
//! The aligner turns the body so its "up" follows the smoothed ground normal,
//! decides whether walking input may move the body this tick, and notices
//! when the body has rounded onto a new surface.

use bevy::prelude::*;

use crate::config::AlignmentConfig;
use crate::look::LookState;

/// Position and rotation of a controlled body.
///
/// Local axes follow Bevy: up is `+Y`, forward is `-Z`, right is `+X`.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    /// World position.
    pub position: Vec3,
    /// World rotation.
    pub rotation: Quat,
}

impl Default for BodyPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl BodyPose {
    /// Create a pose. The rotation is normalized.
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation: rotation.normalize(),
        }
    }

    /// Get the "up" direction.
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Get the "forward" direction.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the "right" direction.
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Convert to a Bevy transform.
    pub fn to_transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.rotation)
    }
}

impl From<&Transform> for BodyPose {
    fn from(transform: &Transform) -> Self {
        Self::new(transform.translation, transform.rotation)
    }
}

/// What the aligner did during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentStep {
    /// `up · normal` after rotating.
    pub alignment: f32,
    /// Whether walking input may move the body this tick.
    pub movement_permitted: bool,
    /// Whether a new surface was detected this tick.
    pub surface_changed: bool,
    /// Angle (radians) the body rotated this tick.
    pub rotated_by: f32,
}

/// Rotates the body toward the ground and tracks surface changes.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct OrientationAligner {
    last_stable_normal: Vec3,
}

impl Default for OrientationAligner {
    fn default() -> Self {
        Self {
            last_stable_normal: Vec3::Y,
        }
    }
}

impl OrientationAligner {
    /// Create an aligner whose last stable surface faces world up.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normal of the last surface the body settled on.
    pub fn last_stable_normal(&self) -> Vec3 {
        self.last_stable_normal
    }

    /// Run one tick.
    ///
    /// When `active` is false (boots off or ungrounded) the pose and look are
    /// left alone; alignment quality is still reported.
    pub fn align(
        &mut self,
        pose: &mut BodyPose,
        look: &mut LookState,
        normal: Vec3,
        dt: f32,
        config: &AlignmentConfig,
        active: bool,
    ) -> AlignmentStep {
        let mut surface_changed = false;
        let mut rotated_by = 0.0;

        if active {
            if self.last_stable_normal.dot(normal) < config.surface_change_threshold {
                look.recenter(dt * config.look_recenter_speed);
                self.last_stable_normal = normal;
                surface_changed = true;
            }

            let target = Quat::from_rotation_arc(pose.up(), normal) * pose.rotation;
            let (rotation, swept) = bounded_slerp(
                pose.rotation,
                target,
                dt * config.alignment_speed,
                config.max_angular_speed * dt,
            );
            pose.rotation = rotation;
            rotated_by = swept;
        }

        let alignment = pose.up().dot(normal);
        AlignmentStep {
            alignment,
            movement_permitted: alignment > config.movement_alignment_threshold,
            surface_changed,
            rotated_by,
        }
    }
}

/// Slerp `from` toward `to` by `t`, sweeping at most `max_angle` radians.
///
/// Returns the new rotation and the angle actually swept.
pub fn bounded_slerp(from: Quat, to: Quat, t: f32, max_angle: f32) -> (Quat, f32) {
    let angle = from.angle_between(to);
    if angle <= 1e-6 {
        return (to.normalize(), angle);
    }

    let mut t = t.clamp(0.0, 1.0);
    if angle * t > max_angle {
        t = (max_angle / angle).max(0.0);
    }
    (from.slerp(to, t).normalize(), angle * t)
}
