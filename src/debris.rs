//! Floating debris and its collection.
//!
//! Bodies with a [`DebrisCollector`] pick up at most one piece of debris per
//! frame when it comes within range. Collection is reported through a
//! [`DebrisCollected`] event; what the oxygen is spent on is up to the host.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::backend::GroundQuery;
use crate::collision::{QueryFilter, SurfaceLayers};

/// Size class of an ice chunk.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IceSize {
    /// 10 seconds of oxygen.
    Small,
    /// 30 seconds of oxygen.
    #[default]
    Medium,
    /// 60 seconds of oxygen.
    Large,
}

impl IceSize {
    /// All sizes, smallest first.
    pub const ALL: [Self; 3] = [Self::Small, Self::Medium, Self::Large];

    /// Seconds of oxygen the chunk is worth.
    pub fn oxygen_seconds(self) -> f32 {
        match self {
            Self::Small => 10.0,
            Self::Medium => 30.0,
            Self::Large => 60.0,
        }
    }

    /// Lowercase size name.
    pub fn size_name(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// What a piece of debris is made of.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebrisKind {
    /// Ice, convertible to oxygen.
    Ice(IceSize),
    /// Scrap metal.
    Metal,
}

impl DebrisKind {
    /// Seconds of oxygen gained by collecting this debris.
    pub fn oxygen_seconds(self) -> f32 {
        match self {
            Self::Ice(size) => size.oxygen_seconds(),
            Self::Metal => 0.0,
        }
    }
}

/// Marks an entity as collectable debris.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct Debris {
    /// Material.
    pub kind: DebrisKind,
}

impl Debris {
    /// Ice debris of the given size.
    pub fn ice(size: IceSize) -> Self {
        Self {
            kind: DebrisKind::Ice(size),
        }
    }

    /// Metal debris.
    pub fn metal() -> Self {
        Self {
            kind: DebrisKind::Metal,
        }
    }
}

/// Lets a body pick up nearby debris.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct DebrisCollector {
    /// Pickup radius.
    pub range: f32,
    /// Layers searched for debris.
    pub layers: SurfaceLayers,
}

impl Default for DebrisCollector {
    fn default() -> Self {
        Self {
            range: 2.0,
            layers: SurfaceLayers::DEBRIS,
        }
    }
}

impl DebrisCollector {
    /// Collector with the given pickup radius.
    pub fn with_range(range: f32) -> Self {
        Self {
            range,
            ..default()
        }
    }

    /// Find the first debris entity within range of `center`.
    ///
    /// `kind_of` identifies debris; overlapping entities it rejects are
    /// skipped. At most one entity is returned.
    pub fn collect_one(
        &self,
        query: &impl GroundQuery,
        center: Vec3,
        exclude: Option<Entity>,
        kind_of: impl Fn(Entity) -> Option<DebrisKind>,
    ) -> Option<(Entity, DebrisKind)> {
        let mut filter = QueryFilter::layers(self.layers);
        filter.exclude = exclude;
        query
            .overlap_sphere(center, self.range, filter)
            .into_iter()
            .find_map(|entity| kind_of(entity).map(|kind| (entity, kind)))
    }
}

/// Sent when a collector picks up debris.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DebrisCollected {
    /// The collecting body.
    pub collector: Entity,
    /// What was collected.
    pub kind: DebrisKind,
    /// Seconds of oxygen gained.
    pub oxygen: f32,
}
