//! Controller configuration.
//!
//! This module defines the tuning for a tethered controller: ground probe
//! reach, normal smoothing and orientation alignment rates, look sensitivity,
//! walking and push speeds, and the tether itself.
//!
//! Every config type is plain data with `Default`, named presets and `with_*`
//! builders, and can be loaded from JSON through serde.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collision::SurfaceLayers;
use crate::tether::TetherPolicy;

/// Configuration rejected by [`ControllerConfig::validate`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("{field} must not be a zero vector")]
    ZeroVector { field: &'static str },
    #[error("failed to parse controller config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ground sensor settings.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Maximum reach of each ground probe.
    pub probe_distance: f32,
    /// Surface layers the sensor attaches to.
    pub layers: SurfaceLayers,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            probe_distance: 5.0,
            layers: SurfaceLayers::GROUND,
        }
    }
}

/// Normal smoothing and orientation alignment settings.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Rate (1/s) at which the smoothed ground normal follows the raw one.
    pub normal_smoothing_rate: f32,

    /// Rate (1/s) at which the body rotates toward the smoothed normal.
    pub alignment_speed: f32,

    /// Hard cap on body rotation speed (radians per second).
    pub max_angular_speed: f32,

    /// Minimum `up · normal` for walking input to move the body.
    pub movement_alignment_threshold: f32,

    /// `last · current` normal dot below which the body is on a new surface.
    pub surface_change_threshold: f32,

    /// Rate (1/s) at which the look offset returns to neutral after a surface change.
    pub look_recenter_speed: f32,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            normal_smoothing_rate: 40.0,
            alignment_speed: 30.0,
            max_angular_speed: 12.0,
            movement_alignment_threshold: 0.5,
            surface_change_threshold: 0.85,
            look_recenter_speed: 5.0,
        }
    }
}

/// Camera look settings.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookConfig {
    /// Degrees of rotation per unit of look input.
    pub sensitivity: f32,
    /// Maximum pitch above or below the horizon, in degrees.
    pub pitch_limit: f32,
    /// Walk relative to where the camera looks (true) or to the body (false).
    pub camera_relative: bool,
}

impl Default for LookConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.2,
            pitch_limit: 90.0,
            camera_relative: true,
        }
    }
}

/// Surface walking settings.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Walking speed (units/second) at full input.
    pub walk_speed: f32,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self { walk_speed: 8.0 }
    }
}

/// Push-off settings.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Launch speed (units/second) of a push-off.
    pub push_force: f32,
    /// Multiplier applied while the modifier input is held.
    pub boost_multiplier: f32,
    /// Body-space direction used when there is no movement input.
    pub default_direction: Vec3,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            push_force: 6.0,
            boost_multiplier: 2.0,
            default_direction: Vec3::NEG_Z,
        }
    }
}

/// Tether and docking settings.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    /// Maximum distance from the anchor during free flight.
    pub length: f32,
    /// How the limit is enforced.
    pub policy: TetherPolicy,
    /// Minimum anchor distance at which a push while floating starts retraction.
    pub retract_min_distance: f32,
    /// Retraction speed (units/second).
    pub retract_speed: f32,
    /// Distance from the dock at which retraction snaps and completes.
    pub dock_epsilon: f32,
    /// Docked position in anchor space.
    pub docked_offset: Vec3,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            length: 25.0,
            policy: TetherPolicy::HardClamp,
            retract_min_distance: 1.5,
            retract_speed: 6.0,
            dock_epsilon: 0.05,
            docked_offset: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

/// Configuration parameters for the tethered controller.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct ControllerConfig {
    /// Ground probe settings.
    pub sensor: SensorConfig,
    /// Normal smoothing and orientation alignment.
    pub alignment: AlignmentConfig,
    /// Camera look.
    pub look: LookConfig,
    /// Surface walking.
    pub walk: WalkConfig,
    /// Push-off.
    pub push: PushConfig,
    /// Tether and docking.
    pub tether: TetherConfig,
    /// Whether magnet boots start switched on.
    pub magnet_boots: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sensor: SensorConfig::default(),
            alignment: AlignmentConfig::default(),
            look: LookConfig::default(),
            walk: WalkConfig::default(),
            push: PushConfig::default(),
            tether: TetherConfig::default(),
            magnet_boots: true,
        }
    }
}

impl ControllerConfig {
    /// Config tuned for a suited astronaut on a slow-moving platform.
    pub fn astronaut() -> Self {
        Self {
            push: PushConfig {
                push_force: 8.0,
                ..default()
            },
            tether: TetherConfig {
                length: 30.0,
                retract_speed: 8.0,
                ..default()
            },
            ..default()
        }
    }

    /// Config with a short tether and soft pull, for cramped tutorial spaces.
    pub fn tutorial() -> Self {
        Self {
            tether: TetherConfig {
                length: 12.0,
                policy: TetherPolicy::soft(3.0, 4.0),
                ..default()
            },
            ..default()
        }
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder: set probe distance.
    pub fn with_probe_distance(mut self, distance: f32) -> Self {
        self.sensor.probe_distance = distance;
        self
    }

    /// Builder: set normal smoothing rate.
    pub fn with_normal_smoothing(mut self, rate: f32) -> Self {
        self.alignment.normal_smoothing_rate = rate;
        self
    }

    /// Builder: set alignment speed and angular speed cap.
    pub fn with_alignment(mut self, speed: f32, max_angular_speed: f32) -> Self {
        self.alignment.alignment_speed = speed;
        self.alignment.max_angular_speed = max_angular_speed;
        self
    }

    /// Builder: set look sensitivity.
    pub fn with_look_sensitivity(mut self, sensitivity: f32) -> Self {
        self.look.sensitivity = sensitivity;
        self
    }

    /// Builder: walk relative to the body instead of the camera.
    pub fn with_body_relative_movement(mut self) -> Self {
        self.look.camera_relative = false;
        self
    }

    /// Builder: set walk speed.
    pub fn with_walk_speed(mut self, speed: f32) -> Self {
        self.walk.walk_speed = speed;
        self
    }

    /// Builder: set push force and boost multiplier.
    pub fn with_push(mut self, force: f32, boost_multiplier: f32) -> Self {
        self.push.push_force = force;
        self.push.boost_multiplier = boost_multiplier;
        self
    }

    /// Builder: set tether length.
    pub fn with_tether_length(mut self, length: f32) -> Self {
        self.tether.length = length;
        self
    }

    /// Builder: set tether policy.
    pub fn with_tether_policy(mut self, policy: TetherPolicy) -> Self {
        self.tether.policy = policy;
        self
    }

    /// Builder: set retraction speed.
    pub fn with_retract_speed(mut self, speed: f32) -> Self {
        self.tether.retract_speed = speed;
        self
    }

    /// Builder: set docked offset (anchor space).
    pub fn with_docked_offset(mut self, offset: Vec3) -> Self {
        self.tether.docked_offset = offset;
        self
    }

    /// Builder: set the initial magnet boots state.
    pub fn with_magnet_boots(mut self, enabled: bool) -> Self {
        self.magnet_boots = enabled;
        self
    }

    /// Check every parameter for a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("sensor.probe_distance", self.sensor.probe_distance)?;

        let a = &self.alignment;
        positive("alignment.normal_smoothing_rate", a.normal_smoothing_rate)?;
        positive("alignment.alignment_speed", a.alignment_speed)?;
        positive("alignment.max_angular_speed", a.max_angular_speed)?;
        within(
            "alignment.movement_alignment_threshold",
            a.movement_alignment_threshold,
            -1.0,
            1.0,
        )?;
        within(
            "alignment.surface_change_threshold",
            a.surface_change_threshold,
            -1.0,
            1.0,
        )?;
        non_negative("alignment.look_recenter_speed", a.look_recenter_speed)?;

        non_negative("look.sensitivity", self.look.sensitivity)?;
        within("look.pitch_limit", self.look.pitch_limit, 0.0, 90.0)?;

        non_negative("walk.walk_speed", self.walk.walk_speed)?;

        non_negative("push.push_force", self.push.push_force)?;
        non_negative("push.boost_multiplier", self.push.boost_multiplier)?;
        if self.push.default_direction.length_squared() <= f32::EPSILON {
            return Err(ConfigError::ZeroVector {
                field: "push.default_direction",
            });
        }

        let t = &self.tether;
        positive("tether.length", t.length)?;
        non_negative("tether.retract_min_distance", t.retract_min_distance)?;
        positive("tether.retract_speed", t.retract_speed)?;
        positive("tether.dock_epsilon", t.dock_epsilon)?;
        if let TetherPolicy::SoftPull {
            zone,
            strength,
            overshoot_margin,
        } = t.policy
        {
            within("tether.policy.zone", zone, 0.0, t.length)?;
            positive("tether.policy.strength", strength)?;
            non_negative("tether.policy.overshoot_margin", overshoot_margin)?;
        }
        Ok(())
    }
}

pub(crate) fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

pub(crate) fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    within(field, value, 0.0, f32::MAX)
}

pub(crate) fn within(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
