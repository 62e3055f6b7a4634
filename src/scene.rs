//! Built-in collision scene backend.
//!
//! A small analytic collision world: planes, spheres and oriented boxes.
//! It answers [`GroundQuery`] casts and overlaps exactly, which is all the
//! controller needs, and keeps tests and headless simulations free of a
//! full physics engine.

use bevy::prelude::*;

use crate::backend::{GroundQuery, PhysicsBackend};
use crate::collision::{CollisionData, QueryFilter, SurfaceLayers};
use crate::{TetherControllerSet, TetherFrameSet};

/// Below this, a ray is treated as parallel to a surface.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Collider geometry in local space.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// Infinite two-sided plane through the local origin.
    Plane {
        /// Plane normal.
        normal: Vec3,
    },
    /// Sphere centered on the local origin.
    Sphere {
        /// Radius before scaling.
        radius: f32,
    },
    /// Box centered on the local origin.
    Cuboid {
        /// Half size on each axis before scaling.
        half_extents: Vec3,
    },
}

impl ColliderShape {
    /// Horizontal ground plane.
    pub fn ground_plane() -> Self {
        Self::Plane { normal: Vec3::Y }
    }

    /// Box with the given full size.
    pub fn cuboid(size: Vec3) -> Self {
        Self::Cuboid {
            half_extents: size * 0.5,
        }
    }
}

/// Collider component picked up by [`SurfaceScenePlugin`].
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct SceneCollider {
    /// Geometry.
    pub shape: ColliderShape,
    /// Layers the collider belongs to.
    pub layers: SurfaceLayers,
}

impl SceneCollider {
    /// Collider on the ground layer.
    pub fn ground(shape: ColliderShape) -> Self {
        Self {
            shape,
            layers: SurfaceLayers::GROUND,
        }
    }

    /// Collider on the debris layer.
    pub fn debris(shape: ColliderShape) -> Self {
        Self {
            shape,
            layers: SurfaceLayers::DEBRIS,
        }
    }
}

/// A collider placed in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedCollider {
    /// Collider geometry and layers.
    pub collider: SceneCollider,
    /// World placement.
    pub transform: Transform,
    /// Owning entity, if any.
    pub entity: Option<Entity>,
}

impl PlacedCollider {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<(f32, Vec3)> {
        let center = self.transform.translation;
        let rotation = self.transform.rotation;
        let scale = self.transform.scale;

        let (distance, normal) = match self.collider.shape {
            ColliderShape::Plane { normal } => {
                let normal = (rotation * normal).try_normalize()?;
                let side = (origin - center).dot(normal);
                let approach = direction.dot(normal);
                if approach.abs() < PARALLEL_EPSILON {
                    return None;
                }
                let distance = -side / approach;
                let facing = if side >= 0.0 { normal } else { -normal };
                (distance, facing)
            }
            ColliderShape::Sphere { radius } => {
                let radius = radius * scale.abs().max_element();
                ray_sphere(origin, direction, center, radius)?
            }
            ColliderShape::Cuboid { half_extents } => {
                let inverse = rotation.inverse();
                let half = half_extents * scale.abs();
                let (distance, local_normal) =
                    ray_box(inverse * (origin - center), inverse * direction, half)?;
                (distance, rotation * local_normal)
            }
        };

        (distance >= 0.0 && distance <= max_distance).then_some((distance, normal))
    }

    fn overlaps_sphere(&self, point: Vec3, radius: f32) -> bool {
        let center = self.transform.translation;
        let rotation = self.transform.rotation;
        let scale = self.transform.scale;

        match self.collider.shape {
            ColliderShape::Plane { normal } => match (rotation * normal).try_normalize() {
                Some(normal) => (point - center).dot(normal).abs() <= radius,
                None => false,
            },
            ColliderShape::Sphere { radius: own } => {
                point.distance(center) <= own * scale.abs().max_element() + radius
            }
            ColliderShape::Cuboid { half_extents } => {
                let half = half_extents * scale.abs();
                let local = rotation.inverse() * (point - center);
                local.distance(local.clamp(-half, half)) <= radius
            }
        }
    }
}

/// Ray against a sphere. Origins inside the sphere hit at distance zero.
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let offset = origin - center;
    if offset.length_squared() <= radius * radius {
        return Some((0.0, offset.try_normalize().unwrap_or(-direction)));
    }

    let b = offset.dot(direction);
    let c = offset.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let distance = -b - discriminant.sqrt();
    let normal = (origin + direction * distance - center) / radius;
    Some((distance, normal))
}

/// Ray against an axis-aligned box centered on the origin (slab test).
/// Origins inside the box hit at distance zero on the nearest face.
fn ray_box(origin: Vec3, direction: Vec3, half: Vec3) -> Option<(f32, Vec3)> {
    if origin.abs().cmple(half).all() {
        let depth = half - origin.abs();
        let axis = if depth.x <= depth.y && depth.x <= depth.z {
            Vec3::X
        } else if depth.y <= depth.z {
            Vec3::Y
        } else {
            Vec3::Z
        };
        let sign = if origin.dot(axis) >= 0.0 { 1.0 } else { -1.0 };
        return Some((0.0, axis * sign));
    }

    let mut near = f32::NEG_INFINITY;
    let mut far = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let h = half[axis];
        if d.abs() < PARALLEL_EPSILON {
            if o.abs() > h {
                return None;
            }
            continue;
        }
        let (mut t0, mut t1) = ((-h - o) / d, (h - o) / d);
        let mut face = -1.0;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            face = 1.0;
        }
        if t0 > near {
            near = t0;
            normal = Vec3::ZERO;
            normal[axis] = face;
        }
        far = far.min(t1);
        if near > far {
            return None;
        }
    }

    Some((near, normal))
}

/// Collision world answering ground queries.
#[derive(Resource, Debug, Clone, Default)]
pub struct SurfaceScene {
    colliders: Vec<PlacedCollider>,
}

impl SurfaceScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a collider without an owning entity.
    pub fn with(mut self, collider: SceneCollider, transform: Transform) -> Self {
        self.insert(collider, transform, None);
        self
    }

    /// Add a collider.
    pub fn insert(&mut self, collider: SceneCollider, transform: Transform, entity: Option<Entity>) {
        self.colliders.push(PlacedCollider {
            collider,
            transform,
            entity,
        });
    }

    /// Remove every collider.
    pub fn clear(&mut self) {
        self.colliders.clear();
    }

    /// Number of colliders.
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Check if the scene has no colliders.
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Placed colliders, in insertion order.
    pub fn colliders(&self) -> &[PlacedCollider] {
        &self.colliders
    }
}

impl GroundQuery for SurfaceScene {
    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<CollisionData> {
        let direction = direction.try_normalize()?;
        let mut best: Option<CollisionData> = None;

        for placed in &self.colliders {
            if !filter.accepts(placed.collider.layers, placed.entity) {
                continue;
            }
            let Some((distance, normal)) = placed.cast(origin, direction, max_distance) else {
                continue;
            };
            if best.is_none_or(|best| distance < best.distance) {
                best = Some(CollisionData::new(
                    distance,
                    normal,
                    origin + direction * distance,
                    placed.entity,
                ));
            }
        }
        best
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: QueryFilter) -> Vec<Entity> {
        self.colliders
            .iter()
            .filter(|placed| filter.accepts(placed.collider.layers, placed.entity))
            .filter(|placed| placed.overlaps_sphere(center, radius))
            .filter_map(|placed| placed.entity)
            .collect()
    }
}

impl PhysicsBackend for SurfaceScene {
    fn plugin() -> impl Plugin {
        SurfaceScenePlugin
    }
}

/// Keeps [`SurfaceScene`] in sync with [`SceneCollider`] entities.
pub struct SurfaceScenePlugin;

impl Plugin for SurfaceScenePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<SceneCollider>()
            .init_resource::<SurfaceScene>()
            .add_systems(
                FixedUpdate,
                rebuild_surface_scene.in_set(TetherControllerSet::Sensors),
            )
            .add_systems(Update, rebuild_surface_scene.in_set(TetherFrameSet::Sensors));
    }
}

/// Rebuild the scene from every collider entity.
pub fn rebuild_surface_scene(
    mut scene: ResMut<SurfaceScene>,
    colliders: Query<(Entity, &SceneCollider, &Transform)>,
) {
    scene.clear();
    for (entity, collider, transform) in &colliders {
        scene.insert(*collider, *transform, Some(entity));
    }
}
