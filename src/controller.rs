//! The tethered controller.
//!
//! [`TetherController`] owns one body and runs the whole movement pipeline.
//! It is a plain value: the owning loop calls [`TetherController::tick`] once
//! per display frame and [`TetherController::fixed_tick`] once per physics
//! step, passing in the anchor pose and a ground query backend.

use bevy::prelude::*;
use tracing::{debug, trace};

use crate::anchor::AnchorFrame;
use crate::backend::GroundQuery;
use crate::config::{ConfigError, ControllerConfig};
use crate::intent::ControlIntent;
use crate::locomotion::{Locomotion, LocomotionInput, LocomotionState, MoveBasis, Transition};
use crate::look::LookState;
use crate::orientation::{BodyPose, OrientationAligner};
use crate::sensor::{GroundContact, GroundSensor};
use crate::smoothing::NormalSmoother;

/// What happened during one physics tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Locomotion state changes, in order.
    pub transitions: Vec<Transition>,
    /// Whether any probe hit ground.
    pub grounded: bool,
    /// Whether the body rounded onto a new surface.
    pub surface_changed: bool,
    /// Whether walking input was allowed to move the body.
    pub movement_permitted: bool,
    /// Whether the tether hard stop was hit.
    pub tether_clamped: bool,
    /// Whether the magnet boots were toggled.
    pub boots_toggled: bool,
}

impl TickReport {
    /// Check if the tick changed the locomotion state.
    pub fn changed_state(&self) -> bool {
        !self.transitions.is_empty()
    }
}

/// A tethered body and everything needed to move it.
#[derive(Component, Debug, Clone)]
pub struct TetherController {
    config: ControllerConfig,
    pose: BodyPose,
    sensor: GroundSensor,
    contact: GroundContact,
    smoother: NormalSmoother,
    aligner: OrientationAligner,
    look: LookState,
    locomotion: Locomotion,
    boots_enabled: bool,
}

impl TetherController {
    /// Create a controller docked on `anchor`.
    ///
    /// The body starts at the anchor's docked offset with the anchor's rotation.
    pub fn new(config: ControllerConfig, anchor: &AnchorFrame) -> Result<Self, ConfigError> {
        let pose = BodyPose::new(anchor.to_world(config.tether.docked_offset), anchor.rotation);
        let mut controller = Self::with_pose(config, pose, LocomotionState::OnAnchorWalking)?;
        controller.locomotion.track_anchor(anchor.position);
        Ok(controller)
    }

    /// Create a controller at an explicit pose and state.
    pub fn with_pose(
        config: ControllerConfig,
        pose: BodyPose,
        state: LocomotionState,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sensor: GroundSensor::new(config.sensor),
            contact: GroundContact::ungrounded(),
            smoother: NormalSmoother::new(),
            aligner: OrientationAligner::new(),
            look: LookState::default(),
            locomotion: Locomotion::in_state(state),
            boots_enabled: config.magnet_boots,
            config,
            pose,
        })
    }

    /// Builder: the ground sensor ignores `entity` (usually the body itself).
    pub fn excluding(mut self, entity: Entity) -> Self {
        self.sensor = self.sensor.excluding(entity);
        self
    }

    /// Frame phase: integrate look input.
    ///
    /// Consumes the accumulated pointer delta; the stick rate is scaled by `dt`.
    pub fn tick(&mut self, dt: f32, intent: &mut ControlIntent) {
        let delta = intent.take_look_delta();
        self.look.apply(delta, intent.look_rate, dt, &self.config.look);
    }

    /// Physics phase: sense, smooth, align, then move.
    ///
    /// A non-positive or non-finite `dt` leaves everything untouched,
    /// including pending button edges.
    pub fn fixed_tick(
        &mut self,
        dt: f32,
        intent: &mut ControlIntent,
        anchor: &AnchorFrame,
        query: &impl GroundQuery,
    ) -> TickReport {
        let mut report = TickReport::default();
        if !dt.is_finite() || dt <= 0.0 {
            return report;
        }

        if intent.take_boots_toggle() {
            self.boots_enabled = !self.boots_enabled;
            report.boots_toggled = true;
            debug!(enabled = self.boots_enabled, "magnet_boots_toggled");
        }

        self.contact = self.sensor.sense(query, &self.pose);
        let normal = self
            .smoother
            .update(&self.contact, dt, self.config.alignment.normal_smoothing_rate);

        let alignment = self.aligner.align(
            &mut self.pose,
            &mut self.look,
            normal,
            dt,
            &self.config.alignment,
            self.boots_enabled && self.contact.grounded,
        );
        if alignment.surface_changed {
            debug!(normal = ?normal, "surface_changed");
        }
        trace!(
            grounded = self.contact.grounded,
            alignment = alignment.alignment,
            rotated_by = alignment.rotated_by,
            "aligned"
        );

        let input = LocomotionInput {
            movement: intent.movement,
            push: intent.take_push_request(),
            modifier_held: intent.modifier_held,
            basis: MoveBasis::new(self.movement_view(), &self.pose),
            movement_permitted: alignment.movement_permitted,
        };
        let step = self
            .locomotion
            .step(&mut self.pose, anchor, &input, &self.config, dt);

        report.transitions = step.transitions;
        report.grounded = self.contact.grounded;
        report.surface_changed = alignment.surface_changed;
        report.movement_permitted = alignment.movement_permitted;
        report.tether_clamped = step.tether_clamped;
        report
    }

    fn movement_view(&self) -> Quat {
        if self.config.look.camera_relative {
            self.camera_rotation()
        } else {
            self.pose.rotation
        }
    }

    /// World position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    /// World rotation.
    #[inline]
    pub fn rotation(&self) -> Quat {
        self.pose.rotation
    }

    /// Full body pose.
    #[inline]
    pub fn pose(&self) -> &BodyPose {
        &self.pose
    }

    /// Check if the body is docked on its anchor.
    #[inline]
    pub fn is_docked(&self) -> bool {
        self.locomotion.state().is_docked()
    }

    /// Speed the body moved at during the last tick.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.locomotion.speed()
    }

    /// Current locomotion state.
    #[inline]
    pub fn state(&self) -> LocomotionState {
        self.locomotion.state()
    }

    /// Free-flight momentum.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.locomotion.velocity()
    }

    /// Check if the last sensor pass found ground.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.contact.grounded
    }

    /// Last sensor result.
    #[inline]
    pub fn contact(&self) -> &GroundContact {
        &self.contact
    }

    /// Smoothed ground normal.
    #[inline]
    pub fn smoothed_normal(&self) -> Vec3 {
        self.smoother.normal()
    }

    /// Camera look relative to the body.
    #[inline]
    pub fn look(&self) -> &LookState {
        &self.look
    }

    /// Check if the magnet boots are on.
    #[inline]
    pub fn boots_enabled(&self) -> bool {
        self.boots_enabled
    }

    /// World rotation of the first-person camera.
    pub fn camera_rotation(&self) -> Quat {
        (self.pose.rotation * self.look.rotation()).normalize()
    }

    /// Controller settings.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}
