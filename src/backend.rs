//! Physics query abstraction.
//!
//! The controller never talks to a physics engine directly. It consumes two
//! capabilities, a bounded ray cast and a sphere overlap, through the
//! [`GroundQuery`] trait. This allows the built-in [`SurfaceScene`] to be
//! swapped for any engine that can answer those two questions.
//!
//! [`SurfaceScene`]: crate::scene::SurfaceScene

use bevy::prelude::*;

use crate::collision::{CollisionData, QueryFilter};

/// Ray cast and overlap queries against the collision world.
///
/// Implementations must be deterministic for a given world state: the
/// ground sensor relies on probe order for tie breaking.
pub trait GroundQuery {
    /// Cast a ray and return the closest hit accepted by `filter`.
    ///
    /// # Arguments
    /// * `origin` - Ray origin in world space
    /// * `direction` - Cast direction (should be normalized)
    /// * `max_distance` - Maximum cast distance
    /// * `filter` - Layer filter and excluded entity
    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<CollisionData>;

    /// Return every entity whose collider intersects the given sphere.
    ///
    /// Colliders without an entity are never reported.
    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: QueryFilter) -> Vec<Entity>;
}

impl<T: GroundQuery + ?Sized> GroundQuery for &T {
    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<CollisionData> {
        (**self).cast(origin, direction, max_distance, filter)
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: QueryFilter) -> Vec<Entity> {
        (**self).overlap_sphere(center, radius, filter)
    }
}

/// A query backend with nothing in it.
///
/// Every cast misses and every overlap is empty, so a controller driven with
/// it is permanently ungrounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyQuery;

impl GroundQuery for EmptyQuery {
    fn cast(&self, _: Vec3, _: Vec3, _: f32, _: QueryFilter) -> Option<CollisionData> {
        None
    }

    fn overlap_sphere(&self, _: Vec3, _: f32, _: QueryFilter) -> Vec<Entity> {
        Vec::new()
    }
}

/// Trait for physics backends usable by [`TetherControllerPlugin`].
///
/// The backend lives in the world as a resource and is handed to the
/// controller systems as their [`GroundQuery`]. Its plugin is responsible
/// for keeping the resource in sync with the ECS world, and must schedule
/// that work in [`TetherControllerSet::Sensors`] for fixed steps and in
/// [`TetherFrameSet::Sensors`] for frames.
///
/// [`TetherControllerPlugin`]: crate::TetherControllerPlugin
/// [`TetherControllerSet::Sensors`]: crate::TetherControllerSet::Sensors
/// [`TetherFrameSet::Sensors`]: crate::TetherFrameSet::Sensors
pub trait PhysicsBackend: GroundQuery + Resource {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;
}

/// Helper struct for building ray casts.
#[derive(Debug, Clone, Copy)]
pub struct RaycastRequest {
    /// Origin point of the ray.
    pub origin: Vec3,
    /// Direction of the ray (normalized on construction).
    pub direction: Vec3,
    /// Maximum distance to cast.
    pub max_distance: f32,
    /// Layer filter.
    pub filter: QueryFilter,
}

impl RaycastRequest {
    /// Create a new ray cast request against the ground layer.
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            max_distance,
            filter: QueryFilter::ground(),
        }
    }

    /// Builder: replace the filter.
    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Run the request against a query backend.
    ///
    /// A zero direction never hits anything.
    pub fn run(&self, query: &impl GroundQuery) -> Option<CollisionData> {
        if self.direction == Vec3::ZERO {
            return None;
        }
        query.cast(self.origin, self.direction, self.max_distance, self.filter)
    }
}
