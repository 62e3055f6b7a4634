//! Multi-probe ground sensor.
//!
//! The sensor casts a fixed fan of rays from the body: straight down, the
//! four horizontal directions and the four downward diagonals. The closest
//! ground hit across all probes wins. Probing sideways lets the body find a
//! wall it is walking into, or the far side of an edge it is rounding, before
//! the surface under its feet disappears.

use bevy::prelude::*;

use crate::backend::{GroundQuery, RaycastRequest};
use crate::collision::{CollisionData, QueryFilter};
use crate::config::SensorConfig;
use crate::orientation::BodyPose;

/// Number of probes cast per tick.
pub const PROBE_COUNT: usize = 9;

/// Probe directions in body space, in scan order.
///
/// Ties between equal hit distances go to the earlier entry.
pub fn probe_directions() -> [Vec3; PROBE_COUNT] {
    let down = Vec3::NEG_Y;
    let forward = Vec3::NEG_Z;
    let right = Vec3::X;
    [
        down,
        forward,
        -forward,
        right,
        -right,
        (forward + down).normalize(),
        (-forward + down).normalize(),
        (right + down).normalize(),
        (-right + down).normalize(),
    ]
}

/// Result of one sensor pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    /// Whether any probe hit ground.
    pub grounded: bool,
    /// Closest hit normal, or world up when ungrounded.
    pub normal: Vec3,
    /// Closest hit distance, or `f32::MAX` when ungrounded.
    pub distance: f32,
    /// Index into [`probe_directions`] of the winning probe.
    pub probe: Option<usize>,
    /// Full hit data for the winning probe.
    pub hit: Option<CollisionData>,
}

impl Default for GroundContact {
    fn default() -> Self {
        Self::ungrounded()
    }
}

impl GroundContact {
    /// A pass where nothing was hit.
    pub fn ungrounded() -> Self {
        Self {
            grounded: false,
            normal: Vec3::Y,
            distance: f32::MAX,
            probe: None,
            hit: None,
        }
    }

    /// A pass that found `hit` with probe number `probe`.
    pub fn from_hit(probe: usize, hit: CollisionData) -> Self {
        Self {
            grounded: true,
            normal: hit.normal.normalize_or(Vec3::Y),
            distance: hit.distance,
            probe: Some(probe),
            hit: Some(hit),
        }
    }

    /// Ground entity, if the backend reported one.
    pub fn ground_entity(&self) -> Option<Entity> {
        self.hit.and_then(|hit| hit.entity)
    }
}

/// Casts the probe fan and picks the closest ground hit.
#[derive(Debug, Clone, Copy)]
pub struct GroundSensor {
    config: SensorConfig,
    exclude: Option<Entity>,
}

impl GroundSensor {
    /// Create a sensor with the given settings.
    pub fn new(config: SensorConfig) -> Self {
        Self {
            config,
            exclude: None,
        }
    }

    /// Builder: never report hits on `entity` (usually the body itself).
    pub fn excluding(mut self, entity: Entity) -> Self {
        self.exclude = Some(entity);
        self
    }

    /// Sensor settings.
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Cast every probe from `pose` and return the closest ground contact.
    pub fn sense(&self, query: &impl GroundQuery, pose: &BodyPose) -> GroundContact {
        let mut filter = QueryFilter::layers(self.config.layers);
        filter.exclude = self.exclude;

        let mut best = GroundContact::ungrounded();
        for (index, local) in probe_directions().into_iter().enumerate() {
            let request =
                RaycastRequest::new(pose.position, pose.rotation * local, self.config.probe_distance)
                    .with_filter(filter);
            let Some(hit) = request.run(query) else {
                continue;
            };
            // Strict comparison keeps the first probe on ties.
            if hit.distance < best.distance {
                best = GroundContact::from_hit(index, hit);
            }
        }
        best
    }
}
