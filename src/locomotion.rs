//! Tethered locomotion state machine.
//!
//! ```text
//!                push                    (immediate)
//! OnAnchorWalking ────► Jumping ─────────────────────► Floating
//!       ▲                                                  │
//!       │ within dock epsilon                 push, far    │
//!       └──────────────────── Retracting ◄────────────────┘
//! ```
//!
//! Every state moves in the anchor's frame: the anchor's displacement since
//! the last tick is added first. Walking moves the body across the anchor's
//! surfaces. Floating integrates momentum with no damping and is held in by
//! the tether. Retracting reels the body back to its dock and stays within
//! the tether too.

use bevy::prelude::*;
use tracing::debug;

use crate::anchor::AnchorFrame;
use crate::config::ControllerConfig;
use crate::orientation::BodyPose;
use crate::tether;

/// Movement inputs smaller than this are treated as no input.
const INPUT_DEADZONE: f32 = 1e-3;

/// Squared length below which a flattened view axis is unusable.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Locomotion state of a tethered body.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocomotionState {
    /// On the anchor, walking on its surfaces.
    #[default]
    OnAnchorWalking,
    /// Launching; folds into `Floating` within the same tick.
    Jumping,
    /// Free flight on the tether.
    Floating,
    /// Being reeled back to the dock.
    Retracting,
}

impl LocomotionState {
    /// Check if the body is docked on its anchor.
    pub fn is_docked(self) -> bool {
        matches!(self, Self::OnAnchorWalking)
    }

    /// Check if the tether limit applies in this state.
    pub fn is_tethered_flight(self) -> bool {
        matches!(self, Self::Jumping | Self::Floating)
    }
}

/// A state change that happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the change.
    pub from: LocomotionState,
    /// State after the change.
    pub to: LocomotionState,
}

/// Planar basis for turning 2D movement input into a world direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveBasis {
    /// Unit forward direction in the walking plane.
    pub forward: Vec3,
    /// Unit right direction in the walking plane.
    pub right: Vec3,
}

impl MoveBasis {
    /// Build a basis from a view rotation, flattened onto the plane
    /// perpendicular to the body's up.
    ///
    /// When the view looks straight along `up`, the body's own axes are used.
    pub fn new(view: Quat, pose: &BodyPose) -> Self {
        let up = pose.up();
        Self {
            forward: flatten(view * Vec3::NEG_Z, up).unwrap_or_else(|| pose.forward()),
            right: flatten(view * Vec3::X, up).unwrap_or_else(|| pose.right()),
        }
    }

    /// World direction for `movement` (x = right, y = forward).
    pub fn direction(&self, movement: Vec2) -> Vec3 {
        self.right * movement.x + self.forward * movement.y
    }
}

/// Remove the component of `vector` along the unit `normal`.
pub fn project_on_plane(vector: Vec3, normal: Vec3) -> Vec3 {
    vector - normal * vector.dot(normal)
}

/// Unit projection of `vector` onto the plane of `normal`, or `None` when
/// `vector` is (nearly) parallel to `normal`.
fn flatten(vector: Vec3, normal: Vec3) -> Option<Vec3> {
    let flat = project_on_plane(vector, normal);
    (flat.length_squared() > PARALLEL_EPSILON).then(|| flat.normalize())
}

/// Inputs to one locomotion step.
#[derive(Debug, Clone, Copy)]
pub struct LocomotionInput {
    /// Planar movement input.
    pub movement: Vec2,
    /// Whether a push edge was consumed this tick.
    pub push: bool,
    /// Whether the boost modifier is held.
    pub modifier_held: bool,
    /// Walking basis for this tick.
    pub basis: MoveBasis,
    /// Whether the aligner permits walking movement.
    pub movement_permitted: bool,
}

/// Outcome of one locomotion step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocomotionStep {
    /// State changes, in order.
    pub transitions: Vec<Transition>,
    /// Whether the tether hard stop was hit.
    pub tether_clamped: bool,
}

/// Locomotion state plus the momentum it carries.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub struct Locomotion {
    state: LocomotionState,
    velocity: Vec3,
    effective_velocity: Vec3,
    last_anchor_position: Option<Vec3>,
}

impl Locomotion {
    /// Start docked and at rest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start in a given state.
    pub fn in_state(state: LocomotionState) -> Self {
        Self {
            state,
            ..default()
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> LocomotionState {
        self.state
    }

    /// Free-flight momentum.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Speed at which the body actually moved last tick, excluding anchor carry.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.effective_velocity.length()
    }

    /// Record where the anchor is, so the next step carries the body only by
    /// the anchor's movement from here.
    pub fn track_anchor(&mut self, position: Vec3) {
        self.last_anchor_position = Some(position);
    }

    /// Overwrite the free-flight momentum.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    /// Advance one physics tick.
    pub fn step(
        &mut self,
        pose: &mut BodyPose,
        anchor: &AnchorFrame,
        input: &LocomotionInput,
        config: &ControllerConfig,
        dt: f32,
    ) -> LocomotionStep {
        let mut step = LocomotionStep::default();
        let carried = self
            .last_anchor_position
            .map(|last| anchor.position - last)
            .unwrap_or(Vec3::ZERO);
        self.last_anchor_position = Some(anchor.position);
        // Every state moves in the anchor's frame of reference.
        pose.position += carried;

        match self.state {
            LocomotionState::OnAnchorWalking => {
                if input.push {
                    self.jump(pose, input, config, &mut step);
                } else {
                    self.walk(pose, input, config, dt);
                }
            }
            LocomotionState::Jumping | LocomotionState::Floating => {
                if self.state == LocomotionState::Jumping {
                    self.transition(LocomotionState::Floating, &mut step);
                }
                let distance = pose.position.distance(anchor.position);
                if input.push && distance > config.tether.retract_min_distance {
                    self.velocity = Vec3::ZERO;
                    self.effective_velocity = Vec3::ZERO;
                    self.transition(LocomotionState::Retracting, &mut step);
                } else {
                    self.float(pose, anchor, config, dt, &mut step);
                }
            }
            LocomotionState::Retracting => {
                self.retract(pose, anchor, config, dt, &mut step);
            }
        }

        step
    }

    fn transition(&mut self, to: LocomotionState, step: &mut LocomotionStep) {
        let from = self.state;
        debug!(?from, ?to, "locomotion_transition");
        step.transitions.push(Transition { from, to });
        self.state = to;
    }

    fn jump(
        &mut self,
        pose: &BodyPose,
        input: &LocomotionInput,
        config: &ControllerConfig,
        step: &mut LocomotionStep,
    ) {
        let direction = push_direction(pose, input, config);
        let mut speed = config.push.push_force;
        if input.modifier_held {
            speed *= config.push.boost_multiplier;
        }

        self.transition(LocomotionState::Jumping, step);
        self.velocity = direction * speed;
        self.effective_velocity = self.velocity;
        debug!(velocity = ?self.velocity, boosted = input.modifier_held, "pushed_off");
        self.transition(LocomotionState::Floating, step);
    }

    fn walk(
        &mut self,
        pose: &mut BodyPose,
        input: &LocomotionInput,
        config: &ControllerConfig,
        dt: f32,
    ) {
        if !input.movement_permitted || input.movement.length() < INPUT_DEADZONE {
            self.effective_velocity = Vec3::ZERO;
            return;
        }
        let walk_velocity = input.basis.direction(input.movement) * config.walk.walk_speed;
        pose.position += walk_velocity * dt;
        self.effective_velocity = walk_velocity;
    }

    fn float(
        &mut self,
        pose: &mut BodyPose,
        anchor: &AnchorFrame,
        config: &ControllerConfig,
        dt: f32,
        step: &mut LocomotionStep,
    ) {
        let integrated = pose.position + self.velocity * dt;
        let outcome = tether::constrain(
            anchor.position,
            integrated,
            self.velocity,
            config.tether.length,
            config.tether.policy,
            dt,
        );
        self.effective_velocity = (outcome.position - pose.position) / dt;
        pose.position = outcome.position;
        self.velocity = outcome.velocity;
        step.tether_clamped = outcome.clamped;
    }

    fn retract(
        &mut self,
        pose: &mut BodyPose,
        anchor: &AnchorFrame,
        config: &ControllerConfig,
        dt: f32,
        step: &mut LocomotionStep,
    ) {
        let dock = anchor.to_world(config.tether.docked_offset);
        let epsilon = config.tether.dock_epsilon;

        let remaining = dock - pose.position;
        let distance = remaining.length();
        if distance > epsilon {
            let travel = (config.tether.retract_speed * dt).min(distance);
            pose.position += remaining / distance * travel;
            self.effective_velocity = remaining / distance * (travel / dt);
        }

        let outcome = tether::constrain(
            anchor.position,
            pose.position,
            Vec3::ZERO,
            config.tether.length,
            config.tether.policy,
            dt,
        );
        pose.position = outcome.position;
        step.tether_clamped = outcome.clamped;

        if pose.position.distance(dock) <= epsilon {
            pose.position = dock;
            self.velocity = Vec3::ZERO;
            self.effective_velocity = Vec3::ZERO;
            self.transition(LocomotionState::OnAnchorWalking, step);
            debug!(dock = ?dock, "docked");
        }
    }
}

/// Launch direction for a push: the movement input in the walking basis, or
/// the configured body-space default when there is no input.
pub fn push_direction(pose: &BodyPose, input: &LocomotionInput, config: &ControllerConfig) -> Vec3 {
    if input.movement.length() >= INPUT_DEADZONE {
        if let Some(direction) = input.basis.direction(input.movement).try_normalize() {
            return direction;
        }
    }
    (pose.rotation * config.push.default_direction)
        .try_normalize()
        .unwrap_or_else(|| pose.forward())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tether::TetherPolicy;

    const DT: f32 = 1.0 / 60.0;

    fn input(pose: &BodyPose) -> LocomotionInput {
        LocomotionInput {
            movement: Vec2::ZERO,
            push: false,
            modifier_held: false,
            basis: MoveBasis::new(pose.rotation, pose),
            movement_permitted: true,
        }
    }

    fn states(step: &LocomotionStep) -> Vec<(LocomotionState, LocomotionState)> {
        step.transitions.iter().map(|t| (t.from, t.to)).collect()
    }

    // ==================== Walking ====================

    #[test]
    fn walking_moves_along_input() {
        let config = ControllerConfig::default();
        let mut pose = BodyPose::default();
        let mut locomotion = Locomotion::new();
        let mut input = input(&pose);
        input.movement = Vec2::new(0.0, 1.0);

        locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);

        let expected = Vec3::NEG_Z * config.walk.walk_speed * DT;
        assert!((pose.position - expected).length() < 1e-6);
        assert!((locomotion.speed() - config.walk.walk_speed).abs() < 1e-4);
    }

    #[test]
    fn walking_suppressed_when_misaligned() {
        let config = ControllerConfig::default();
        let mut pose = BodyPose::default();
        let mut locomotion = Locomotion::new();
        let mut input = input(&pose);
        input.movement = Vec2::new(1.0, 0.0);
        input.movement_permitted = false;

        locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);

        assert_eq!(pose.position, Vec3::ZERO);
        assert_eq!(locomotion.speed(), 0.0);
    }

    #[test]
    fn walking_rides_with_anchor() {
        let config = ControllerConfig::default();
        let mut pose = BodyPose::default();
        let mut locomotion = Locomotion::new();
        let input = input(&pose);

        locomotion.step(&mut pose, &AnchorFrame::at(Vec3::ZERO), &input, &config, DT);
        locomotion.step(&mut pose, &AnchorFrame::at(Vec3::new(0.0, 0.0, -2.0)), &input, &config, DT);

        assert_eq!(pose.position, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(locomotion.speed(), 0.0);
    }

    #[test]
    fn walking_stays_in_body_plane() {
        let config = ControllerConfig::default();
        // Body up along +X.
        let mut pose = BodyPose::new(Vec3::ZERO, Quat::from_rotation_z(-std::f32::consts::FRAC_PI_2));
        let mut locomotion = Locomotion::new();
        let mut input = input(&pose);
        // Camera pitched up 45 degrees relative to the body.
        input.basis = MoveBasis::new(pose.rotation * Quat::from_rotation_x(0.8), &pose);
        input.movement = Vec2::new(0.0, 1.0);

        locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);

        assert!(pose.position.dot(pose.up()).abs() < 1e-5);
        assert!(pose.position.length() > 0.0);
    }

    // ==================== Jumping ====================

    #[test]
    fn push_without_input_uses_default_forward() {
        let config = ControllerConfig::default().with_push(6.0, 2.0);
        let mut pose = BodyPose::default();
        let mut locomotion = Locomotion::new();
        let mut input = input(&pose);
        input.push = true;

        let step = locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);

        assert_eq!(
            states(&step),
            vec![
                (LocomotionState::OnAnchorWalking, LocomotionState::Jumping),
                (LocomotionState::Jumping, LocomotionState::Floating),
            ]
        );
        assert_eq!(locomotion.state(), LocomotionState::Floating);
        assert!((locomotion.velocity() - Vec3::NEG_Z * 6.0).length() < 1e-6);
    }

    #[test]
    fn push_follows_movement_input() {
        let config = ControllerConfig::default().with_push(5.0, 2.0);
        let mut pose = BodyPose::default();
        let mut locomotion = Locomotion::new();
        let mut input = input(&pose);
        input.push = true;
        input.movement = Vec2::new(0.5, 0.0);

        locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);

        assert!((locomotion.velocity() - Vec3::X * 5.0).length() < 1e-5);
    }

    #[test]
    fn boosted_push_is_stronger() {
        let config = ControllerConfig::default().with_push(5.0, 3.0);
        let mut pose = BodyPose::default();
        let mut locomotion = Locomotion::new();
        let mut input = input(&pose);
        input.push = true;
        input.modifier_held = true;

        locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);

        assert!((locomotion.velocity().length() - 15.0).abs() < 1e-4);
    }

    #[test]
    fn push_ignores_alignment_gate() {
        let config = ControllerConfig::default();
        let mut pose = BodyPose::default();
        let mut locomotion = Locomotion::new();
        let mut input = input(&pose);
        input.push = true;
        input.movement_permitted = false;

        locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);
        assert_eq!(locomotion.state(), LocomotionState::Floating);
    }

    // ==================== Floating ====================

    #[test]
    fn floating_integrates_without_damping() {
        let config = ControllerConfig::default().with_tether_length(100.0);
        let mut pose = BodyPose::default();
        let mut locomotion = Locomotion::in_state(LocomotionState::Floating);
        locomotion.set_velocity(Vec3::new(1.0, 2.0, 0.0));
        let input = input(&pose);

        for _ in 0..60 {
            locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);
        }

        assert!((pose.position - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-4);
        assert_eq!(locomotion.velocity(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn floating_hard_clamp_scenario() {
        let config = ControllerConfig::default()
            .with_tether_length(10.0)
            .with_tether_policy(TetherPolicy::HardClamp);
        let mut pose = BodyPose::default();
        let mut locomotion = Locomotion::in_state(LocomotionState::Floating);
        locomotion.set_velocity(Vec3::new(12.0, 0.0, 0.0));
        let input = input(&pose);

        let step = locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, 1.0);

        assert!(step.tether_clamped);
        assert!((pose.position - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(locomotion.velocity(), Vec3::ZERO);
    }

    #[test]
    fn push_far_from_anchor_retracts() {
        let config = ControllerConfig::default();
        let mut pose = BodyPose::new(Vec3::new(5.0, 0.0, 0.0), Quat::IDENTITY);
        let mut locomotion = Locomotion::in_state(LocomotionState::Floating);
        locomotion.set_velocity(Vec3::X);
        let mut input = input(&pose);
        input.push = true;

        let step = locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);

        assert_eq!(
            states(&step),
            vec![(LocomotionState::Floating, LocomotionState::Retracting)]
        );
        assert_eq!(locomotion.velocity(), Vec3::ZERO);
        assert_eq!(pose.position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn push_near_anchor_keeps_floating() {
        let config = ControllerConfig::default();
        let mut pose = BodyPose::new(Vec3::new(0.5, 0.0, 0.0), Quat::IDENTITY);
        let mut locomotion = Locomotion::in_state(LocomotionState::Floating);
        let mut input = input(&pose);
        input.push = true;

        let step = locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);

        assert!(step.transitions.is_empty());
        assert_eq!(locomotion.state(), LocomotionState::Floating);
    }

    // ==================== Retracting ====================

    #[test]
    fn retracting_moves_at_retract_speed() {
        let config = ControllerConfig::default()
            .with_retract_speed(6.0)
            .with_docked_offset(Vec3::ZERO);
        let mut pose = BodyPose::new(Vec3::new(10.0, 0.0, 0.0), Quat::IDENTITY);
        let mut locomotion = Locomotion::in_state(LocomotionState::Retracting);
        let input = input(&pose);

        locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, 0.5);

        assert!((pose.position - Vec3::new(7.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(locomotion.state(), LocomotionState::Retracting);
        assert!((locomotion.speed() - 6.0).abs() < 1e-4);
    }

    #[test]
    fn retracting_within_epsilon_docks_exactly() {
        let offset = Vec3::new(0.0, 1.0, 0.0);
        let config = ControllerConfig::default().with_docked_offset(offset);
        let mut pose = BodyPose::new(offset + Vec3::new(0.01, 0.0, 0.0), Quat::IDENTITY);
        let mut locomotion = Locomotion::in_state(LocomotionState::Retracting);
        let input = input(&pose);

        let step = locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);

        assert_eq!(
            states(&step),
            vec![(LocomotionState::Retracting, LocomotionState::OnAnchorWalking)]
        );
        assert_eq!(pose.position, offset);
        assert_eq!(locomotion.velocity(), Vec3::ZERO);
    }

    #[test]
    fn retracting_dock_follows_anchor_rotation() {
        let config = ControllerConfig::default().with_docked_offset(Vec3::Y);
        let anchor = AnchorFrame::at(Vec3::new(3.0, 0.0, 0.0))
            .with_rotation(Quat::from_rotation_z(std::f32::consts::PI));
        let mut pose = BodyPose::new(Vec3::new(3.0, -5.0, 0.0), Quat::IDENTITY);
        let mut locomotion = Locomotion::in_state(LocomotionState::Retracting);
        let input = input(&pose);

        for _ in 0..600 {
            locomotion.step(&mut pose, &anchor, &input, &config, DT);
            if locomotion.state().is_docked() {
                break;
            }
        }

        assert!(locomotion.state().is_docked());
        assert_eq!(pose.position, anchor.to_world(Vec3::Y));
    }

    #[test]
    fn floating_rides_with_anchor() {
        let config = ControllerConfig::default().with_tether_length(100.0);
        let mut pose = BodyPose::default();
        let mut locomotion = Locomotion::in_state(LocomotionState::Floating);
        locomotion.track_anchor(Vec3::ZERO);
        locomotion.set_velocity(Vec3::X);
        let input = input(&pose);

        let anchor = AnchorFrame::at(Vec3::new(0.0, 0.0, -20.0));
        let step = locomotion.step(&mut pose, &anchor, &input, &config, 1.0);

        assert!(!step.tether_clamped);
        assert!((pose.position - Vec3::new(1.0, 0.0, -20.0)).length() < 1e-5);
        assert_eq!(locomotion.velocity(), Vec3::X);
        assert!((locomotion.speed() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn retracting_docks_on_fast_anchor() {
        let config = ControllerConfig::default()
            .with_retract_speed(6.0)
            .with_docked_offset(Vec3::ZERO);
        let mut pose = BodyPose::new(Vec3::new(5.0, 0.0, 0.0), Quat::IDENTITY);
        let mut locomotion = Locomotion::in_state(LocomotionState::Retracting);
        locomotion.track_anchor(Vec3::ZERO);
        let input = input(&pose);

        let mut anchor = AnchorFrame::default();
        for _ in 0..120 {
            anchor.position.z -= 20.0 * DT;
            locomotion.step(&mut pose, &anchor, &input, &config, DT);
            assert!(pose.position.distance(anchor.position) <= 5.0 + 1e-4);
            if locomotion.state().is_docked() {
                break;
            }
        }

        assert!(locomotion.state().is_docked());
        assert_eq!(pose.position, anchor.position);
    }

    #[test]
    fn retracting_is_held_inside_tether() {
        let config = ControllerConfig::default()
            .with_tether_length(10.0)
            .with_docked_offset(Vec3::ZERO);
        let mut pose = BodyPose::new(Vec3::new(30.0, 0.0, 0.0), Quat::IDENTITY);
        let mut locomotion = Locomotion::in_state(LocomotionState::Retracting);
        let input = input(&pose);

        let step = locomotion.step(&mut pose, &AnchorFrame::default(), &input, &config, DT);

        assert!(step.tether_clamped);
        assert!((pose.position - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(locomotion.state(), LocomotionState::Retracting);
    }

    // ==================== Helpers ====================

    #[test]
    fn move_basis_falls_back_when_looking_straight_up() {
        let pose = BodyPose::default();
        let view = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let basis = MoveBasis::new(view, &pose);
        assert!((basis.forward - pose.forward()).length() < 1e-5);
        assert!((basis.right - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn project_on_plane_removes_normal_component() {
        let projected = project_on_plane(Vec3::new(1.0, 2.0, 3.0), Vec3::Y);
        assert_eq!(projected, Vec3::new(1.0, 0.0, 3.0));
    }
}
