//! # `tether_controller`
//!
//! A surface-relative first-person movement controller for a body tethered
//! to a moving platform in zero gravity.
//!
//! This crate provides a controller that:
//! - Senses nearby surfaces with a fan of ground probes
//! - Smooths the sensed normal and turns the body's "up" toward it, so the
//!   body can walk across floors, walls and ceilings alike
//! - Pushes off into free flight and keeps the body within tether range
//! - Reels the body back to its dock on request
//! - Abstracts ground queries behind a backend trait (an analytic
//!   [`SurfaceScene`](scene::SurfaceScene) is included)
//!
//! ## Architecture
//!
//! [`TetherController`](controller::TetherController) is a plain value that
//! the owning loop drives in two phases:
//! 1. `tick` once per display frame integrates camera look
//! 2. `fixed_tick` once per physics step senses, smooths, aligns and moves
//!
//! [`TetherControllerPlugin`] drives both phases from Bevy's `Update` and
//! `FixedUpdate` schedules.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use tether_controller::prelude::*;
//!
//! let scene = SurfaceScene::new().with(
//!     SceneCollider::ground(ColliderShape::ground_plane()),
//!     Transform::IDENTITY,
//! );
//! let anchor = AnchorFrame::at(Vec3::ZERO);
//! let mut controller = TetherController::new(ControllerConfig::astronaut(), &anchor)?;
//! let mut intent = ControlIntent::new();
//!
//! intent.set_movement(Vec2::new(0.0, 1.0));
//! controller.fixed_tick(1.0 / 60.0, &mut intent, &anchor, &scene);
//! assert!(controller.is_docked());
//! # Ok::<(), ConfigError>(())
//! ```

use bevy::prelude::*;

pub mod anchor;
pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod debris;
pub mod intent;
pub mod locomotion;
pub mod look;
pub mod orientation;
pub mod scene;
pub mod sensor;
pub mod smoothing;
pub mod spawner;
pub mod state;
pub mod systems;
pub mod tether;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::anchor::{AnchorFrame, PlatformMotion, TetherAnchor};
    pub use crate::backend::{GroundQuery, PhysicsBackend};
    pub use crate::collision::{CollisionData, QueryFilter, SurfaceLayers};
    pub use crate::config::{ConfigError, ControllerConfig};
    pub use crate::controller::{TetherController, TickReport};
    pub use crate::debris::{Debris, DebrisCollected, DebrisCollector, DebrisKind, IceSize};
    pub use crate::intent::ControlIntent;
    pub use crate::locomotion::LocomotionState;
    pub use crate::scene::{ColliderShape, SceneCollider, SurfaceScene};
    pub use crate::spawner::{DebrisSpawner, SpawnerConfig};
    pub use crate::state::{
        Docked, Floating, Grounded, LocomotionChanged, Retracting, TetherCamera, Tethered,
    };
    pub use crate::tether::TetherPolicy;
    pub use crate::{TetherControllerPlugin, TetherControllerSet, TetherFrameSet};
}

/// System sets for the fixed-step controller pipeline, run in order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetherControllerSet {
    /// Move platforms.
    Preparation,
    /// Refresh the physics backend.
    Sensors,
    /// Run controller physics ticks.
    Integration,
    /// Write controller state back to the ECS.
    Sync,
}

/// System sets for the per-frame pipeline in `Update`, run in order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetherFrameSet {
    /// Refresh the physics backend.
    Sensors,
    /// Collect, clean up and spawn debris.
    Debris,
}

/// Main plugin for the tethered controller.
///
/// This plugin is generic over a physics backend `B` which answers the
/// controller's ground queries.
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., [`SurfaceScene`](scene::SurfaceScene))
///
/// # Examples
///
/// ```rust,no_run
/// use bevy::prelude::*;
/// use tether_controller::prelude::*;
///
/// App::new()
///     .add_plugins(MinimalPlugins)
///     .add_plugins(TetherControllerPlugin::<SurfaceScene>::default())
///     .run();
/// ```
pub struct TetherControllerPlugin<B: backend::PhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::PhysicsBackend> Default for TetherControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::PhysicsBackend> Plugin for TetherControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::ControllerConfig>();
        app.register_type::<intent::ControlIntent>();
        app.register_type::<anchor::TetherAnchor>();
        app.register_type::<anchor::PlatformMotion>();
        app.register_type::<debris::Debris>();
        app.register_type::<debris::DebrisCollector>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Docked>();
        app.register_type::<state::Floating>();
        app.register_type::<state::Retracting>();
        app.register_type::<state::Tethered>();
        app.register_type::<state::TetherCamera>();

        app.add_event::<state::LocomotionChanged>();
        app.add_event::<debris::DebrisCollected>();

        app.configure_sets(
            FixedUpdate,
            (
                TetherControllerSet::Preparation,
                TetherControllerSet::Sensors,
                TetherControllerSet::Integration,
                TetherControllerSet::Sync,
            )
                .chain(),
        );

        app.configure_sets(Update, (TetherFrameSet::Sensors, TetherFrameSet::Debris).chain());

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::advance_platforms.in_set(TetherControllerSet::Preparation),
                systems::fixed_tick_controllers::<B>.in_set(TetherControllerSet::Integration),
                (systems::sync_controller_transforms, systems::sync_state_markers)
                    .in_set(TetherControllerSet::Sync),
            ),
        );

        app.add_systems(
            Update,
            (
                (systems::update_look, systems::sync_camera_rotation).chain(),
                (
                    systems::collect_debris::<B>,
                    systems::despawn_passed_debris,
                    systems::spawn_debris,
                )
                    .chain()
                    .in_set(TetherFrameSet::Debris),
            ),
        );
    }
}
