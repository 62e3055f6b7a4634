//! Core controller systems.
//!
//! These systems drive [`TetherController`]s from the ECS. They are generic
//! over the physics backend so any [`PhysicsBackend`] resource can answer
//! the ground queries.

use bevy::prelude::*;
use tracing::{debug, trace};

use crate::anchor::{AnchorFrame, PlatformMotion, TetherAnchor};
use crate::backend::PhysicsBackend;
use crate::controller::TetherController;
use crate::debris::{Debris, DebrisCollected, DebrisCollector};
use crate::intent::ControlIntent;
use crate::locomotion::LocomotionState;
use crate::scene::{ColliderShape, SceneCollider};
use crate::spawner::DebrisSpawner;
use crate::state::{Docked, Floating, Grounded, LocomotionChanged, Retracting, TetherCamera, Tethered};

/// Radius of the collider given to spawned debris, before scaling.
const SPAWNED_DEBRIS_RADIUS: f32 = 0.5;

/// Move kinematic platforms by their velocity.
pub fn advance_platforms(time: Res<Time<Fixed>>, mut q_platforms: Query<(&PlatformMotion, &mut Transform)>) {
    let dt = time.timestep().as_secs_f32();
    for (motion, mut transform) in &mut q_platforms {
        transform.translation = motion.advance(transform.translation, dt);
    }
}

/// Run one physics tick for every controller.
///
/// The anchor is read from the [`Tethered`] entity's transform; bodies
/// without one are tethered to the world origin. Bodies whose anchor entity
/// no longer exists are skipped.
pub fn fixed_tick_controllers<B: PhysicsBackend>(
    time: Res<Time<Fixed>>,
    backend: Res<B>,
    q_anchors: Query<&Transform, Without<TetherController>>,
    mut q_controllers: Query<(Entity, &mut TetherController, &mut ControlIntent, Option<&Tethered>)>,
    mut changed: EventWriter<LocomotionChanged>,
) {
    let dt = time.timestep().as_secs_f32();
    let query = backend.into_inner();

    for (entity, mut controller, mut intent, tethered) in &mut q_controllers {
        let anchor = match tethered {
            Some(tethered) => match q_anchors.get(tethered.anchor) {
                Ok(transform) => AnchorFrame::from(transform),
                Err(_) => {
                    trace!(?entity, anchor = ?tethered.anchor, "anchor_missing");
                    continue;
                }
            },
            None => AnchorFrame::default(),
        };

        let report = controller.fixed_tick(dt, &mut intent, &anchor, query);
        for transition in report.transitions {
            changed.write(LocomotionChanged {
                entity,
                from: transition.from,
                to: transition.to,
            });
        }
    }
}

/// Copy each controller's pose into its `Transform`.
pub fn sync_controller_transforms(mut q_controllers: Query<(&TetherController, &mut Transform)>) {
    for (controller, mut transform) in &mut q_controllers {
        transform.translation = controller.position();
        transform.rotation = controller.rotation();
    }
}

/// Add and remove state markers to match each controller.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &TetherController,
        Has<Grounded>,
        Has<Docked>,
        Has<Floating>,
        Has<Retracting>,
    )>,
) {
    for (entity, controller, has_grounded, has_docked, has_floating, has_retracting) in &q_controllers {
        let mut entity_commands = commands.entity(entity);

        match (controller.is_grounded(), has_grounded) {
            (true, false) => {
                entity_commands.insert(Grounded);
            }
            (false, true) => {
                entity_commands.remove::<Grounded>();
            }
            _ => {}
        }

        let state = controller.state();
        let docked = state == LocomotionState::OnAnchorWalking;
        let floating = state.is_tethered_flight();
        let retracting = state == LocomotionState::Retracting;

        if docked != has_docked {
            if docked {
                entity_commands.insert(Docked);
            } else {
                entity_commands.remove::<Docked>();
            }
        }
        if floating != has_floating {
            if floating {
                entity_commands.insert(Floating);
            } else {
                entity_commands.remove::<Floating>();
            }
        }
        if retracting != has_retracting {
            if retracting {
                entity_commands.insert(Retracting);
            } else {
                entity_commands.remove::<Retracting>();
            }
        }
    }
}

/// Frame phase: integrate look input at display rate.
pub fn update_look(time: Res<Time>, mut q_controllers: Query<(&mut TetherController, &mut ControlIntent)>) {
    let dt = time.delta_secs();
    for (mut controller, mut intent) in &mut q_controllers {
        controller.tick(dt, &mut intent);
    }
}

/// Place follow cameras at their body with its look rotation.
///
/// Cameras whose body has no controller are left alone.
pub fn sync_camera_rotation(
    q_controllers: Query<&TetherController>,
    mut q_cameras: Query<(&TetherCamera, &mut Transform)>,
) {
    for (camera, mut transform) in &mut q_cameras {
        let Ok(controller) = q_controllers.get(camera.body) else {
            continue;
        };
        transform.translation = controller.position();
        transform.rotation = controller.camera_rotation();
    }
}

/// Pick up at most one piece of debris per collector per frame.
pub fn collect_debris<B: PhysicsBackend>(
    mut commands: Commands,
    backend: Res<B>,
    q_collectors: Query<(Entity, &DebrisCollector, &Transform)>,
    q_debris: Query<&Debris>,
    mut collected: EventWriter<DebrisCollected>,
) {
    let query = backend.into_inner();
    let mut taken: Vec<Entity> = Vec::new();

    for (collector_entity, collector, transform) in &q_collectors {
        let hit = collector.collect_one(query, transform.translation, Some(collector_entity), |entity| {
            if taken.contains(&entity) {
                return None;
            }
            q_debris.get(entity).ok().map(|debris| debris.kind)
        });
        let Some((debris_entity, kind)) = hit else {
            continue;
        };

        taken.push(debris_entity);
        commands.entity(debris_entity).despawn();
        let oxygen = kind.oxygen_seconds();
        debug!(collector = ?collector_entity, ?kind, oxygen, "debris_collected");
        collected.write(DebrisCollected {
            collector: collector_entity,
            kind,
            oxygen,
        });
    }
}

/// Anchor the spawner follows: its pinned entity, or the only anchor.
fn spawner_anchor(
    spawner: &DebrisSpawner,
    q_anchors: &Query<&Transform, With<TetherAnchor>>,
) -> Option<AnchorFrame> {
    let transform = match spawner.anchor() {
        Some(entity) => q_anchors.get(entity).ok(),
        None => q_anchors.single().ok(),
    };
    transform.map(AnchorFrame::from)
}

/// Spawn debris ahead of the spawner's anchor.
///
/// Does nothing unless a [`DebrisSpawner`] resource exists. An unpinned
/// spawner needs exactly one [`TetherAnchor`]; with several, pin one with
/// [`DebrisSpawner::with_anchor`].
pub fn spawn_debris(
    mut commands: Commands,
    time: Res<Time>,
    spawner: Option<ResMut<DebrisSpawner>>,
    q_anchors: Query<&Transform, With<TetherAnchor>>,
) {
    let Some(mut spawner) = spawner else {
        return;
    };
    let Some(anchor) = spawner_anchor(&spawner, &q_anchors) else {
        trace!(pinned = ?spawner.anchor(), "spawner_anchor_unresolved");
        return;
    };

    for spawn in spawner.tick(time.delta_secs(), &anchor) {
        commands.spawn((
            Debris { kind: spawn.kind },
            SceneCollider::debris(ColliderShape::Sphere {
                radius: SPAWNED_DEBRIS_RADIUS,
            }),
            spawn.transform(),
        ));
    }
}

/// Despawn debris the platform has left far behind.
pub fn despawn_passed_debris(
    mut commands: Commands,
    spawner: Option<Res<DebrisSpawner>>,
    q_anchors: Query<&Transform, With<TetherAnchor>>,
    q_debris: Query<(Entity, &Transform), With<Debris>>,
) {
    let Some(spawner) = spawner else {
        return;
    };
    let Some(anchor) = spawner_anchor(&spawner, &q_anchors) else {
        return;
    };

    for (entity, transform) in &q_debris {
        if spawner.is_left_behind(&anchor, transform.translation) {
            trace!(?entity, "debris_left_behind");
            commands.entity(entity).try_despawn();
        }
    }
}
