//! Integration tests for the tethered controller plugin.
//!
//! These tests run the full plugin inside a Bevy `App` with the built-in
//! `SurfaceScene` backend, stepping the schedules explicitly.

use std::time::Duration;

use bevy::ecs::event::Events;
use bevy::prelude::*;
use tether_controller::prelude::*;

/// Create a minimal test app with the controller plugin.
fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(TetherControllerPlugin::<SurfaceScene>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));

    app.finish();
    app.cleanup();
    app
}

/// Spawn a 4x1x4 deck anchor at `position`, top face 0.5 above it.
fn spawn_anchor(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            TetherAnchor,
            Transform::from_translation(position),
            SceneCollider::ground(ColliderShape::cuboid(Vec3::new(4.0, 1.0, 4.0))),
        ))
        .id()
}

/// Spawn a body docked on `anchor` with default config.
fn spawn_body(app: &mut App, anchor: Entity) -> Entity {
    spawn_body_with_config(app, anchor, ControllerConfig::default())
}

/// Spawn a body docked on `anchor` with custom config.
fn spawn_body_with_config(app: &mut App, anchor: Entity, config: ControllerConfig) -> Entity {
    let frame = AnchorFrame::from(app.world().get::<Transform>(anchor).expect("anchor transform"));
    let controller = TetherController::new(config, &frame).expect("valid config");
    let transform = Transform::from_translation(controller.position());
    app.world_mut()
        .spawn((controller, ControlIntent::new(), Tethered::to(anchor), transform))
        .id()
}

/// Run one physics step.
fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

/// Run the app for N physics steps.
fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        tick(app);
    }
}

/// Run one display frame of `dt` seconds.
fn frame(app: &mut App, dt: f32) {
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(dt));
    app.world_mut().run_schedule(Update);
}

fn intent_mut(app: &mut App, entity: Entity) -> Mut<'_, ControlIntent> {
    app.world_mut()
        .get_mut::<ControlIntent>(entity)
        .expect("body has an intent")
}

fn controller(app: &App, entity: Entity) -> &TetherController {
    app.world()
        .get::<TetherController>(entity)
        .expect("body has a controller")
}

fn drain_events<E: Event + Clone>(app: &App) -> Vec<E> {
    let events = app.world().resource::<Events<E>>();
    events.get_cursor().read(events).cloned().collect()
}

// ==================== Docking Tests ====================

mod docking {
    use super::*;

    #[test]
    fn body_starts_docked_and_grounded() {
        let mut app = create_test_app();
        let anchor = spawn_anchor(&mut app, Vec3::ZERO);
        let body = spawn_body(&mut app, anchor);

        tick(&mut app);

        let world = app.world();
        assert!(world.get::<Docked>(body).is_some());
        assert!(world.get::<Grounded>(body).is_some());
        assert!(world.get::<Floating>(body).is_none());

        let transform = world.get::<Transform>(body).expect("transform");
        assert_eq!(transform.translation, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn body_rides_moving_platform() {
        let mut app = create_test_app();
        let anchor = spawn_anchor(&mut app, Vec3::ZERO);
        app.world_mut()
            .entity_mut(anchor)
            .insert(PlatformMotion::new(Vec3::new(0.0, 0.0, -6.0)));
        let body = spawn_body(&mut app, anchor);

        run_frames(&mut app, 60);

        let transform = app.world().get::<Transform>(body).expect("transform");
        println!("PROOF: body translation after 1s = {:?}", transform.translation);
        assert!((transform.translation - Vec3::new(0.0, 1.0, -6.0)).length() < 1e-3);
        assert!(app.world().get::<Grounded>(body).is_some());
        assert!(controller(&app, body).is_docked());
    }

    #[test]
    fn missing_anchor_freezes_body() {
        let mut app = create_test_app();
        let anchor = spawn_anchor(&mut app, Vec3::ZERO);
        let body = spawn_body(&mut app, anchor);
        app.world_mut().despawn(anchor);

        intent_mut(&mut app, body).set_movement(Vec2::new(0.0, 1.0));
        run_frames(&mut app, 10);

        assert_eq!(controller(&app, body).position(), Vec3::new(0.0, 1.0, 0.0));
    }
}

// ==================== Push and Retract Tests ====================

mod push_and_retract {
    use super::*;

    #[test]
    fn push_emits_state_changes() {
        let mut app = create_test_app();
        let anchor = spawn_anchor(&mut app, Vec3::ZERO);
        let body = spawn_body(&mut app, anchor);

        intent_mut(&mut app, body).set_push_pressed(true);
        tick(&mut app);

        let changes = drain_events::<LocomotionChanged>(&app);
        let states: Vec<_> = changes.iter().map(|c| (c.from, c.to)).collect();
        assert_eq!(
            states,
            vec![
                (LocomotionState::OnAnchorWalking, LocomotionState::Jumping),
                (LocomotionState::Jumping, LocomotionState::Floating),
            ]
        );
        assert!(changes.iter().all(|c| c.entity == body));

        let world = app.world();
        assert!(world.get::<Floating>(body).is_some());
        assert!(world.get::<Docked>(body).is_none());
    }

    #[test]
    fn push_retract_and_dock() {
        let mut app = create_test_app();
        let anchor = spawn_anchor(&mut app, Vec3::ZERO);
        let config = ControllerConfig::default()
            .with_push(10.0, 1.0)
            .with_retract_speed(10.0);
        let body = spawn_body_with_config(&mut app, anchor, config);

        intent_mut(&mut app, body).request_push();
        run_frames(&mut app, 60);

        let floating = controller(&app, body);
        println!("PROOF: floated to {:?}", floating.position());
        assert_eq!(floating.state(), LocomotionState::Floating);
        assert!(floating.position().length() > 5.0);

        intent_mut(&mut app, body).request_push();
        tick(&mut app);
        assert!(app.world().get::<Retracting>(body).is_some());

        run_frames(&mut app, 120);

        assert!(app.world().get::<Docked>(body).is_some());
        assert!(app.world().get::<Retracting>(body).is_none());
        let transform = app.world().get::<Transform>(body).expect("transform");
        assert_eq!(transform.translation, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn tether_holds_in_free_flight() {
        let mut app = create_test_app();
        let anchor = spawn_anchor(&mut app, Vec3::ZERO);
        let config = ControllerConfig::default()
            .with_tether_length(8.0)
            .with_push(30.0, 1.0);
        let body = spawn_body_with_config(&mut app, anchor, config);

        intent_mut(&mut app, body).request_push();
        for _ in 0..120 {
            tick(&mut app);
            let distance = controller(&app, body).position().length();
            assert!(distance <= 8.0 + 1e-4, "distance {distance}");
        }
        assert_eq!(controller(&app, body).velocity(), Vec3::ZERO);
    }

    #[test]
    fn push_retract_dock_on_moving_platform() {
        let mut app = create_test_app();
        let anchor = spawn_anchor(&mut app, Vec3::ZERO);
        app.world_mut()
            .entity_mut(anchor)
            .insert(PlatformMotion::default());
        let body = spawn_body(&mut app, anchor);
        let length = ControllerConfig::default().tether.length;

        let tick_within_tether = |app: &mut App| {
            tick(app);
            let anchor_at = app.world().get::<Transform>(anchor).expect("anchor").translation;
            let distance = controller(app, body).position().distance(anchor_at);
            assert!(distance <= length + 1e-3, "distance {distance}");
        };

        intent_mut(&mut app, body).request_push();
        for _ in 0..60 {
            tick_within_tether(&mut app);
        }
        assert!(app.world().get::<Floating>(body).is_some());

        intent_mut(&mut app, body).request_push();
        tick_within_tether(&mut app);
        assert!(app.world().get::<Retracting>(body).is_some());

        let mut ticks = 0;
        while app.world().get::<Docked>(body).is_none() {
            tick_within_tether(&mut app);
            ticks += 1;
            assert!(ticks < 1200, "never docked");
        }

        let anchor_at = app.world().get::<Transform>(anchor).expect("anchor").translation;
        let transform = app.world().get::<Transform>(body).expect("transform");
        println!("PROOF: docked after {ticks} ticks at {:?}", transform.translation);
        assert!((transform.translation - (anchor_at + Vec3::Y)).length() < 1e-4);
    }
}

// ==================== Camera Tests ====================

mod camera {
    use super::*;

    #[test]
    fn camera_follows_body_look() {
        let mut app = create_test_app();
        let anchor = spawn_anchor(&mut app, Vec3::ZERO);
        let body = spawn_body(&mut app, anchor);
        let camera = app
            .world_mut()
            .spawn((TetherCamera { body }, Transform::default()))
            .id();

        intent_mut(&mut app, body).add_look_delta(Vec2::new(50.0, 25.0));
        frame(&mut app, 1.0 / 60.0);

        let expected = controller(&app, body).camera_rotation();
        let transform = app.world().get::<Transform>(camera).expect("transform");
        assert!(transform.rotation.angle_between(expected) < 1e-5);
        assert_eq!(transform.translation, Vec3::new(0.0, 1.0, 0.0));
        assert!(controller(&app, body).look().yaw_degrees() < 0.0);
    }
}

// ==================== Debris Tests ====================

mod debris {
    use super::*;

    fn spawn_debris(app: &mut App, debris: Debris, position: Vec3) -> Entity {
        app.world_mut()
            .spawn((
                debris,
                SceneCollider::debris(ColliderShape::Sphere { radius: 0.5 }),
                Transform::from_translation(position),
            ))
            .id()
    }

    #[test]
    fn collector_picks_up_one_per_frame() {
        let mut app = create_test_app();
        let anchor = spawn_anchor(&mut app, Vec3::ZERO);
        let body = spawn_body(&mut app, anchor);
        app.world_mut()
            .entity_mut(body)
            .insert(DebrisCollector::default());

        let large = spawn_debris(&mut app, Debris::ice(IceSize::Large), Vec3::new(1.0, 1.0, 0.0));
        let metal = spawn_debris(&mut app, Debris::metal(), Vec3::new(-1.0, 1.0, 0.0));

        tick(&mut app);
        frame(&mut app, 1.0 / 60.0);

        let collected = drain_events::<DebrisCollected>(&app);
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].collector, body);

        let remaining = [large, metal]
            .into_iter()
            .filter(|&entity| app.world().get_entity(entity).is_ok())
            .count();
        assert_eq!(remaining, 1);

        tick(&mut app);
        frame(&mut app, 1.0 / 60.0);

        let collected = drain_events::<DebrisCollected>(&app);
        let oxygen: f32 = collected.iter().map(|event| event.oxygen).sum();
        assert_eq!(collected.len(), 2);
        assert_eq!(oxygen, 60.0);
    }

    #[test]
    fn debris_placed_this_frame_is_collectable() {
        let mut app = create_test_app();
        let anchor = spawn_anchor(&mut app, Vec3::ZERO);
        let body = spawn_body(&mut app, anchor);
        app.world_mut()
            .entity_mut(body)
            .insert(DebrisCollector::default());
        spawn_debris(&mut app, Debris::metal(), Vec3::new(1.0, 1.0, 0.0));

        frame(&mut app, 1.0 / 60.0);

        assert_eq!(drain_events::<DebrisCollected>(&app).len(), 1);
    }

    #[test]
    fn distant_debris_is_not_collected() {
        let mut app = create_test_app();
        let anchor = spawn_anchor(&mut app, Vec3::ZERO);
        let body = spawn_body(&mut app, anchor);
        app.world_mut()
            .entity_mut(body)
            .insert(DebrisCollector::default());
        let far = spawn_debris(&mut app, Debris::metal(), Vec3::new(0.0, 1.0, -20.0));

        tick(&mut app);
        frame(&mut app, 1.0 / 60.0);

        assert!(app.world().get_entity(far).is_ok());
        assert!(drain_events::<DebrisCollected>(&app).is_empty());
    }

    #[test]
    fn spawner_places_debris_ahead_of_anchor() {
        let mut app = create_test_app();
        spawn_anchor(&mut app, Vec3::new(0.0, 0.0, -100.0));
        let spawner =
            DebrisSpawner::new(SpawnerConfig::default(), 9).expect("default config is valid");
        app.insert_resource(spawner);

        frame(&mut app, 0.5);
        frame(&mut app, 0.5);

        let mut query = app.world_mut().query::<(&Debris, &Transform)>();
        let spawned: Vec<_> = query.iter(app.world()).map(|(_, t)| t.translation).collect();
        assert_eq!(spawned.len(), 1);
        assert!(spawned[0].z < -100.0 - 40.0);
    }

    #[test]
    fn spawner_follows_pinned_anchor() {
        let mut app = create_test_app();
        spawn_anchor(&mut app, Vec3::ZERO);
        let far = spawn_anchor(&mut app, Vec3::new(0.0, 0.0, -1000.0));
        let spawner = DebrisSpawner::new(SpawnerConfig::default(), 3)
            .expect("default config is valid")
            .with_anchor(far);
        app.insert_resource(spawner);

        frame(&mut app, 0.5);
        frame(&mut app, 0.5);

        let mut query = app.world_mut().query_filtered::<&Transform, With<Debris>>();
        let spawned: Vec<_> = query.iter(app.world()).map(|t| t.translation).collect();
        assert_eq!(spawned.len(), 1);
        assert!(spawned[0].z < -1000.0 - 40.0);
    }

    #[test]
    fn unpinned_spawner_waits_for_single_anchor() {
        let mut app = create_test_app();
        spawn_anchor(&mut app, Vec3::ZERO);
        spawn_anchor(&mut app, Vec3::new(0.0, 0.0, -1000.0));
        let spawner = DebrisSpawner::new(SpawnerConfig::default(), 3).expect("default config is valid");
        app.insert_resource(spawner);

        frame(&mut app, 5.0);

        let mut query = app.world_mut().query::<&Debris>();
        assert_eq!(query.iter(app.world()).count(), 0);
    }

    #[test]
    fn left_behind_debris_is_despawned() {
        let mut app = create_test_app();
        spawn_anchor(&mut app, Vec3::new(0.0, 0.0, -500.0));
        let spawner = DebrisSpawner::new(SpawnerConfig::default(), 4).expect("default config is valid");
        app.insert_resource(spawner);
        let passed = spawn_debris(&mut app, Debris::metal(), Vec3::new(0.0, 0.0, -300.0));
        let nearby = spawn_debris(&mut app, Debris::ice(IceSize::Small), Vec3::new(0.0, 0.0, -450.0));

        frame(&mut app, 0.1);

        assert!(app.world().get_entity(passed).is_err());
        assert!(app.world().get_entity(nearby).is_ok());
    }

    #[test]
    fn no_spawner_no_debris() {
        let mut app = create_test_app();
        spawn_anchor(&mut app, Vec3::ZERO);

        frame(&mut app, 5.0);

        let mut query = app.world_mut().query::<&Debris>();
        assert_eq!(query.iter(app.world()).count(), 0);
    }
}
