//! Debris spawning ahead of the platform.
//!
//! The spawner is a timed event source polled by the owning loop: each call
//! to [`DebrisSpawner::tick`] returns the pieces that came due since the last
//! call. Randomness comes from a seeded generator so runs are reproducible.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::anchor::AnchorFrame;
use crate::config::{non_negative, positive, within, ConfigError};
use crate::debris::{DebrisKind, IceSize};

/// Debris spawner settings.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Delay before the first spawn (seconds).
    pub first_delay: f32,
    /// Time between spawns (seconds).
    pub interval: f32,
    /// Distance ahead of the anchor, along world forward.
    pub spawn_distance: f32,
    /// Sideways jitter, each way.
    pub horizontal_range: f32,
    /// Vertical jitter, each way.
    pub vertical_range: f32,
    /// Jitter along the spawn axis, each way.
    pub depth_range: f32,
    /// Smallest uniform scale (inclusive).
    pub min_scale: f32,
    /// Largest uniform scale (exclusive).
    pub max_scale: f32,
    /// Chance of ice while in tutorial mode.
    pub tutorial_ice_chance: f32,
    /// Chance of ice afterwards.
    pub ice_chance: f32,
    /// Most spawns a single tick may return; older due spawns are dropped.
    pub max_per_tick: u32,
    /// Debris further than this behind the anchor is despawned.
    pub despawn_distance: f32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            first_delay: 1.0,
            interval: 2.0,
            spawn_distance: 50.0,
            horizontal_range: 15.0,
            vertical_range: 10.0,
            depth_range: 5.0,
            min_scale: 0.5,
            max_scale: 1.5,
            tutorial_ice_chance: 0.8,
            ice_chance: 0.5,
            max_per_tick: 8,
            despawn_distance: 100.0,
        }
    }
}

impl SpawnerConfig {
    /// Check every parameter for a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("spawner.first_delay", self.first_delay)?;
        positive("spawner.interval", self.interval)?;
        non_negative("spawner.spawn_distance", self.spawn_distance)?;
        non_negative("spawner.horizontal_range", self.horizontal_range)?;
        non_negative("spawner.vertical_range", self.vertical_range)?;
        non_negative("spawner.depth_range", self.depth_range)?;
        positive("spawner.min_scale", self.min_scale)?;
        within("spawner.max_scale", self.max_scale, self.min_scale, f32::MAX)?;
        within("spawner.tutorial_ice_chance", self.tutorial_ice_chance, 0.0, 1.0)?;
        within("spawner.ice_chance", self.ice_chance, 0.0, 1.0)?;
        within("spawner.max_per_tick", self.max_per_tick as f32, 1.0, f32::MAX)?;
        positive("spawner.despawn_distance", self.despawn_distance)?;
        Ok(())
    }
}

/// One piece of debris to place in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebrisSpawn {
    /// Material.
    pub kind: DebrisKind,
    /// World position.
    pub position: Vec3,
    /// World rotation.
    pub rotation: Quat,
    /// Uniform scale.
    pub scale: f32,
}

impl DebrisSpawn {
    /// Transform for the spawned entity.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position)
            .with_rotation(self.rotation)
            .with_scale(Vec3::splat(self.scale))
    }
}

/// Spawns debris on a fixed interval ahead of the anchor.
#[derive(Resource, Debug, Clone)]
pub struct DebrisSpawner {
    config: SpawnerConfig,
    rng: StdRng,
    until_next: f32,
    tutorial_mode: bool,
    anchor: Option<Entity>,
}

impl DebrisSpawner {
    /// Create a spawner in tutorial mode.
    pub fn new(config: SpawnerConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            until_next: config.first_delay,
            config,
            rng: StdRng::seed_from_u64(seed),
            tutorial_mode: true,
            anchor: None,
        })
    }

    /// Builder: spawn around this anchor entity instead of the only one.
    pub fn with_anchor(mut self, anchor: Entity) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Anchor entity the spawner follows, if pinned.
    pub fn anchor(&self) -> Option<Entity> {
        self.anchor
    }

    /// Settings.
    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Check if tutorial odds are in effect.
    pub fn tutorial_mode(&self) -> bool {
        self.tutorial_mode
    }

    /// Switch to the regular ice/metal odds.
    pub fn end_tutorial_mode(&mut self) {
        self.tutorial_mode = false;
    }

    /// Seconds until the next spawn.
    pub fn until_next(&self) -> f32 {
        self.until_next
    }

    /// Advance the timer and return the spawns that came due, at most
    /// `max_per_tick` of them.
    pub fn tick(&mut self, dt: f32, anchor: &AnchorFrame) -> Vec<DebrisSpawn> {
        if !dt.is_finite() || dt <= 0.0 {
            return Vec::new();
        }

        self.until_next -= dt;
        if self.until_next > 0.0 {
            return Vec::new();
        }

        let interval = self.config.interval;
        let overdue = -self.until_next;
        let due = (overdue / interval).floor() + 1.0;
        let count = due.min(self.config.max_per_tick as f32) as usize;
        self.until_next = interval - overdue.rem_euclid(interval);
        if due > count as f32 {
            debug!(due, count, "debris_spawns_dropped");
        }

        (0..count)
            .map(|_| {
                let spawn = self.roll(anchor);
                debug!(kind = ?spawn.kind, position = ?spawn.position, scale = spawn.scale, "debris_spawned");
                spawn
            })
            .collect()
    }

    /// Check if `position` has fallen behind `anchor` far enough to despawn.
    ///
    /// Spawns go ahead along world -Z, so "behind" is along +Z.
    pub fn is_left_behind(&self, anchor: &AnchorFrame, position: Vec3) -> bool {
        (position - anchor.position).z > self.config.despawn_distance
    }

    fn roll(&mut self, anchor: &AnchorFrame) -> DebrisSpawn {
        let c = &self.config;
        let jitter = Vec3::new(
            symmetric(&mut self.rng, c.horizontal_range),
            symmetric(&mut self.rng, c.vertical_range),
            symmetric(&mut self.rng, c.depth_range),
        );
        let position = anchor.position + Vec3::NEG_Z * c.spawn_distance + jitter;

        let ice_chance = if self.tutorial_mode {
            c.tutorial_ice_chance
        } else {
            c.ice_chance
        };
        let kind = if self.rng.gen::<f32>() < ice_chance {
            DebrisKind::Ice(IceSize::ALL[self.rng.gen_range(0..IceSize::ALL.len())])
        } else {
            DebrisKind::Metal
        };

        let scale = if c.max_scale > c.min_scale {
            self.rng.gen_range(c.min_scale..c.max_scale)
        } else {
            c.min_scale
        };

        DebrisSpawn {
            kind,
            position,
            rotation: random_rotation(&mut self.rng),
            scale,
        }
    }
}

fn symmetric(rng: &mut impl Rng, range: f32) -> f32 {
    if range > 0.0 {
        rng.gen_range(-range..range)
    } else {
        0.0
    }
}

/// Uniformly distributed rotation (Shoemake).
fn random_rotation(rng: &mut impl Rng) -> Quat {
    let u1: f32 = rng.gen();
    let u2: f32 = rng.gen::<f32>() * TAU;
    let u3: f32 = rng.gen::<f32>() * TAU;
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    Quat::from_xyzw(a * u2.sin(), a * u2.cos(), b * u3.sin(), b * u3.cos()).normalize()
}
