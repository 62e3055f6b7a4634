//! State marker components.
//!
//! These components mirror the state of each [`TetherController`] so other
//! systems can filter on it in queries. They are added and removed by the
//! plugin after every physics tick.
//!
//! [`TetherController`]: crate::controller::TetherController

use bevy::prelude::*;

use crate::locomotion::LocomotionState;

/// Marker component indicating the body's ground sensor found a surface.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use tether_controller::prelude::*;
///
/// // Grounded is a marker component - just use it in queries
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the body is walking on its anchor.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Docked;

/// Marker component indicating the body is in free flight on its tether.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Floating;

/// Marker component indicating the body is being reeled in.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Retracting;

/// Links a controlled body to the entity it is tethered to.
///
/// The anchor entity's `Transform` is read as the tether anchor every tick.
/// It is usually a [`TetherAnchor`](crate::anchor::TetherAnchor).
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct Tethered {
    /// Anchor entity.
    pub anchor: Entity,
}

impl Tethered {
    /// Tether to `anchor`.
    pub fn to(anchor: Entity) -> Self {
        Self { anchor }
    }
}

/// Marks a camera that follows a body's position and look.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct TetherCamera {
    /// Body whose view this camera shows.
    pub body: Entity,
}

/// Sent whenever a controller changes locomotion state.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocomotionChanged {
    /// The controlled body.
    pub entity: Entity,
    /// Previous state.
    pub from: LocomotionState,
    /// New state.
    pub to: LocomotionState,
}
