//! Query result and filter structures.
//!
//! These structures hold the results of physics queries (ray casts and
//! sphere overlaps) used for ground sensing and debris collection.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Information about a ray cast hit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at the hit point (unit length, facing the ray origin).
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if the backend tracks entities).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

/// Bit set of surface categories a collider belongs to.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceLayers(pub u32);

impl SurfaceLayers {
    /// No layers.
    pub const NONE: Self = Self(0);
    /// Walkable surfaces the ground sensor attaches to.
    pub const GROUND: Self = Self(1 << 0);
    /// Collectible floating debris.
    pub const DEBRIS: Self = Self(1 << 1);
    /// Every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// Check if every bit of `other` is set in `self`.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if `self` and `other` share at least one bit.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Union of two layer sets.
    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for SurfaceLayers {
    fn default() -> Self {
        Self::GROUND
    }
}

/// Filter applied to every ray cast or overlap query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFilter {
    /// Only colliders sharing a bit with these layers are considered.
    pub layers: SurfaceLayers,
    /// Entity to skip (usually the querying body itself).
    pub exclude: Option<Entity>,
}

impl QueryFilter {
    /// Filter matching the ground layer only.
    pub fn ground() -> Self {
        Self {
            layers: SurfaceLayers::GROUND,
            exclude: None,
        }
    }

    /// Filter matching the debris layer only.
    pub fn debris() -> Self {
        Self {
            layers: SurfaceLayers::DEBRIS,
            exclude: None,
        }
    }

    /// Filter matching the given layers.
    pub fn layers(layers: SurfaceLayers) -> Self {
        Self {
            layers,
            exclude: None,
        }
    }

    /// Builder: exclude an entity from results.
    pub fn excluding(mut self, entity: Entity) -> Self {
        self.exclude = Some(entity);
        self
    }

    /// Check whether a collider with the given layers and entity passes the filter.
    pub fn accepts(&self, layers: SurfaceLayers, entity: Option<Entity>) -> bool {
        if !self.layers.intersects(layers) {
            return false;
        }
        match (self.exclude, entity) {
            (Some(excluded), Some(entity)) => excluded != entity,
            _ => true,
        }
    }
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self::ground()
    }
}
