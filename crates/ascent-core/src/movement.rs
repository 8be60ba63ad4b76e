//! Player movement state machine.
//!
//! The controller steers a dynamic rigid body through [`RigidBodyPort`]. It
//! has two entry points with different rates:
//!
//! - [`MovementController::physics_step`] runs once per fixed physics step,
//!   after the engine has integrated gravity and resolved contacts. It owns the
//!   grounding probe and every velocity write.
//! - [`MovementController::frame_diagnostics`] runs once per rendered frame.
//!   It only reads the body; corrections it decides on are queued and applied
//!   by the next physics step.
//!
//! After horizontal control and jumping, the physics step clamps the fall
//! speed and nudges a body frozen in mid-air. While grounded it zeroes small
//! vertical velocities so repeated contact resolution cannot make the body hop.

use glam::Vec3;

use crate::body::RigidBodyPort;
use crate::config::{DiagnosticsConfig, MovementConfig};
use crate::input::InputFrame;

/// Grounding state derived from the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundState {
    Airborne,
    Grounded,
}

/// Everything the game tracks about the player between steps.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub position: Vec3,
    /// Mirror of the body's velocity as of the last step or frame.
    pub velocity: Vec3,
    pub grounded: bool,
    /// Consecutive physics steps the probe has hit ground.
    pub grounded_frame_count: u32,
    /// Consecutive physics steps the probe has missed.
    pub airborne_step_count: u32,
    pub invincible: bool,
    pub invincibility_remaining: f32,
    pub lives: u32,
    pub stuck_timer: f32,
    pub last_position: Vec3,
    pub freeze_check_timer: f32,
}

impl PlayerState {
    pub fn new(spawn: Vec3, lives: u32) -> Self {
        Self {
            position: spawn,
            velocity: Vec3::ZERO,
            grounded: false,
            grounded_frame_count: 0,
            airborne_step_count: 0,
            invincible: false,
            invincibility_remaining: 0.0,
            lives,
            stuck_timer: 0.0,
            last_position: spawn,
            freeze_check_timer: 0.0,
        }
    }

    pub fn ground_state(&self) -> GroundState {
        if self.grounded {
            GroundState::Grounded
        } else {
            GroundState::Airborne
        }
    }

    /// Start or restart an invincibility window. The latest call wins;
    /// windows never stack.
    pub fn grant_invincibility(&mut self, duration: f32) {
        self.invincible = true;
        self.invincibility_remaining = duration;
    }

    /// Count down the invincibility window. Returns true when it expired
    /// during this tick.
    pub fn tick_invincibility(&mut self, dt: f32) -> bool {
        if !self.invincible {
            return false;
        }
        self.invincibility_remaining -= dt;
        if self.invincibility_remaining <= 0.0 {
            self.invincible = false;
            self.invincibility_remaining = 0.0;
            return true;
        }
        false
    }
}

/// Velocity correction decided by a frame diagnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Upward pop plus a push along the held input.
    Unstuck { horizontal: f32 },
    /// Wake and drive downward.
    FreezeKick,
}

/// What a physics step did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    pub jumped: bool,
    pub landed: bool,
    pub fall_clamped: bool,
    pub freeze_nudged: bool,
    pub stabilized: bool,
    pub corrections_applied: u32,
}

/// What a frame diagnostic pass found.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub unstuck: bool,
    pub freeze_kick: bool,
    pub fell_out: bool,
}

pub struct MovementController {
    movement: MovementConfig,
    diagnostics: DiagnosticsConfig,
    player: PlayerState,
    horizontal: f32,
    jump_requested: bool,
    pending: Vec<Correction>,
}

impl MovementController {
    pub fn new(
        movement: MovementConfig,
        diagnostics: DiagnosticsConfig,
        spawn: Vec3,
        lives: u32,
    ) -> Self {
        Self {
            movement,
            diagnostics,
            player: PlayerState::new(spawn, lives),
            horizontal: 0.0,
            jump_requested: false,
            pending: Vec::new(),
        }
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    pub fn jump_requested(&self) -> bool {
        self.jump_requested
    }

    pub fn pending_corrections(&self) -> &[Correction] {
        &self.pending
    }

    /// Record this frame's input. The jump edge stays latched until the next
    /// physics step consumes it, fired or not.
    pub fn sample_input(&mut self, input: &InputFrame) {
        self.horizontal = input.axis();
        if input.jump {
            self.jump_requested = true;
        }
    }

    /// One fixed physics step. Call after the engine integrated the step.
    pub fn physics_step<B: RigidBodyPort>(&mut self, body: &mut B) -> StepReport {
        let mut report = StepReport::default();
        let jump_requested = std::mem::take(&mut self.jump_requested);

        // Grounding probe
        let origin = body.position();
        let hit = body.cast_ground_probe(origin, Vec3::NEG_Y, self.movement.probe_length());
        let was_grounded = self.player.grounded;
        if hit.is_some() {
            self.player.grounded = true;
            self.player.grounded_frame_count = self.player.grounded_frame_count.saturating_add(1);
            self.player.airborne_step_count = 0;
            report.landed = !was_grounded;
        } else {
            self.player.grounded = false;
            self.player.grounded_frame_count = 0;
            self.player.airborne_step_count = self.player.airborne_step_count.saturating_add(1);
        }

        let mut velocity = body.velocity();

        // 1. Horizontal control: instant target velocity
        let speed = if self.player.grounded {
            self.movement.move_speed
        } else {
            self.movement.move_speed * self.movement.air_control
        };
        velocity.x = self.horizontal * speed;
        if self.horizontal.abs() > 0.01 {
            body.wake();
        }

        // 2. Jump
        if jump_requested
            && self.player.grounded
            && self.player.grounded_frame_count > self.movement.jump_grounded_steps
        {
            velocity.y = self.movement.jump_impulse;
            body.wake();
            self.player.grounded = false;
            self.player.grounded_frame_count = 0;
            report.jumped = true;
        }

        // Corrections queued by the last frame
        for correction in std::mem::take(&mut self.pending) {
            match correction {
                Correction::Unstuck { horizontal } => {
                    velocity.y = self.diagnostics.unstuck_vertical_speed;
                    velocity.x = horizontal * self.diagnostics.unstuck_horizontal_speed;
                    body.wake();
                    report.corrections_applied += 1;
                }
                Correction::FreezeKick => {
                    // Landed since it was queued: nothing left to fix
                    if self.player.grounded {
                        continue;
                    }
                    body.wake();
                    velocity.y = self.diagnostics.freeze_kick_speed;
                    report.corrections_applied += 1;
                }
            }
        }

        // 3. Fall-speed clamp
        if velocity.y < self.movement.terminal_fall_speed {
            velocity.y = self.movement.terminal_fall_speed;
            report.fall_clamped = true;
        }

        // 4. Anti-freeze
        if body.is_sleeping() {
            body.wake();
        }
        if velocity.length_squared() < self.diagnostics.freeze_epsilon
            && !self.player.grounded
            && self.player.airborne_step_count > self.diagnostics.step_freeze_grace_steps
        {
            velocity.y -= self.diagnostics.freeze_nudge;
            report.freeze_nudged = true;
        }

        // 5. Ground stabilization
        if self.player.grounded
            && self.player.grounded_frame_count > self.movement.stabilize_grounded_steps
            && velocity.y < self.movement.stabilize_max_rise
            && velocity.y != 0.0
        {
            velocity.y = 0.0;
            report.stabilized = true;
        }

        body.set_velocity(velocity);
        self.player.velocity = velocity;
        self.player.position = body.position();

        if report.jumped {
            tracing::debug!("jump at {:?}", self.player.position);
        }
        report
    }

    /// Per-frame diagnostics: anti-stuck, periodic anti-freeze and the
    /// fall-through-world check. Never writes to the body.
    pub fn frame_diagnostics<B: RigidBodyPort>(&mut self, body: &B, dt: f32) -> FrameReport {
        let mut report = FrameReport::default();
        let position = body.position();
        let velocity = body.velocity();
        self.player.position = position;
        self.player.velocity = velocity;

        // Anti-stuck. The stall distance scales with the held input so slow
        // analog walking is not mistaken for a stall.
        let displacement = position.distance(self.player.last_position);
        let stall_distance = self.diagnostics.stuck_distance_threshold * self.horizontal.abs();
        if self.horizontal.abs() > self.diagnostics.stuck_input_threshold
            && displacement < stall_distance
            && self.player.grounded_frame_count > self.diagnostics.stuck_grounded_steps
        {
            self.player.stuck_timer += dt;
            if self.player.stuck_timer > self.diagnostics.stuck_time_limit {
                self.pending.push(Correction::Unstuck {
                    horizontal: self.horizontal,
                });
                self.player.stuck_timer = 0.0;
                report.unstuck = true;
                tracing::debug!("unstuck impulse queued at {:?}", position);
            }
        } else {
            self.player.stuck_timer = 0.0;
        }
        self.player.last_position = position;

        // Periodic anti-freeze
        self.player.freeze_check_timer += dt;
        if self.player.freeze_check_timer >= self.diagnostics.freeze_check_interval {
            if velocity.length_squared() < self.diagnostics.freeze_epsilon
                && !self.player.grounded
                && self.player.airborne_step_count > self.diagnostics.frame_freeze_grace_steps
                && position.y > self.diagnostics.freeze_min_height
                && !self.pending.contains(&Correction::FreezeKick)
            {
                self.pending.push(Correction::FreezeKick);
                report.freeze_kick = true;
                tracing::debug!("freeze kick queued at {:?}", position);
            }
            self.player.freeze_check_timer = 0.0;
        }

        report.fell_out = position.y < self.diagnostics.fall_death_height;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::testing::FakeBody;

    const DT_STEP: f32 = 0.02;
    const DT_FRAME: f32 = 1.0 / 60.0;

    fn controller() -> MovementController {
        MovementController::new(
            MovementConfig::default(),
            DiagnosticsConfig::default(),
            Vec3::new(0.0, 2.0, 0.0),
            3,
        )
    }

    #[test]
    fn test_jump_blocked_until_third_grounded_step() {
        let mut mc = controller();
        let mut body = FakeBody::grounded_at(Vec3::new(0.0, 0.45, 0.0));

        for expected_count in 1..=2 {
            mc.sample_input(&InputFrame::idle().with_jump());
            let report = mc.physics_step(&mut body);
            assert!(!report.jumped);
            assert_eq!(mc.player().grounded_frame_count, expected_count);
            assert!(body.velocity.y.abs() < 1e-6);
        }

        mc.sample_input(&InputFrame::idle().with_jump());
        let report = mc.physics_step(&mut body);
        assert!(report.jumped);
        assert_eq!(body.velocity.y, 20.4);
        assert_eq!(mc.player().ground_state(), GroundState::Airborne);
        assert_eq!(mc.player().grounded_frame_count, 0);
    }

    #[test]
    fn test_jump_edge_consumed_even_when_blocked() {
        let mut mc = controller();
        let mut body = FakeBody::grounded_at(Vec3::ZERO);
        mc.sample_input(&InputFrame::idle().with_jump());
        mc.physics_step(&mut body);
        assert!(!mc.jump_requested());

        // Grounded long enough now, but no new edge
        for _ in 0..5 {
            mc.sample_input(&InputFrame::idle());
            assert!(!mc.physics_step(&mut body).jumped);
        }
    }

    #[test]
    fn test_no_double_jump_in_one_step() {
        let mut mc = controller();
        let mut body = FakeBody::grounded_at(Vec3::ZERO);
        for _ in 0..3 {
            mc.physics_step(&mut body);
        }
        mc.sample_input(&InputFrame::idle().with_jump());
        assert!(mc.physics_step(&mut body).jumped);

        // The probe still reports ground on the next step, but the hysteresis
        // gate restarted from zero.
        mc.sample_input(&InputFrame::idle().with_jump());
        assert!(!mc.physics_step(&mut body).jumped);
        assert_eq!(mc.player().grounded_frame_count, 1);
    }

    #[test]
    fn test_fall_speed_never_below_terminal() {
        let mut mc = controller();
        let mut body = FakeBody::airborne_at(Vec3::new(0.0, 500.0, 0.0));
        for _ in 0..500 {
            body.integrate(-40.0, DT_STEP);
            mc.physics_step(&mut body);
            assert!(body.velocity.y >= -15.0);
        }
        assert_eq!(body.velocity.y, -15.0);
    }

    #[test]
    fn test_air_control_reduces_horizontal_speed() {
        let mut mc = controller();
        let mut body = FakeBody::airborne_at(Vec3::new(0.0, 5.0, 0.0));
        mc.sample_input(&InputFrame::moving(1.0));
        mc.physics_step(&mut body);
        assert!((body.velocity.x - 3.0).abs() < 1e-6);

        body.ground = FakeBody::grounded_at(Vec3::ZERO).ground;
        mc.physics_step(&mut body);
        assert!((body.velocity.x - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_stabilization_keeps_rising_velocity() {
        let mut mc = controller();
        let mut body = FakeBody::grounded_at(Vec3::ZERO);
        for _ in 0..5 {
            mc.physics_step(&mut body);
        }

        body.velocity.y = 0.5;
        let report = mc.physics_step(&mut body);
        assert!(!report.stabilized);
        assert_eq!(body.velocity.y, 0.5);

        body.velocity.y = 0.3;
        assert!(mc.physics_step(&mut body).stabilized);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_stabilization_waits_for_hysteresis() {
        let mut mc = controller();
        let mut body = FakeBody::grounded_at(Vec3::ZERO);
        body.velocity.y = 0.2;
        mc.physics_step(&mut body);
        mc.physics_step(&mut body);
        assert_eq!(body.velocity.y, 0.2);
        mc.physics_step(&mut body);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_rest_is_stable() {
        let mut mc = controller();
        let start = Vec3::new(4.0, 0.45, 0.0);
        let mut body = FakeBody::grounded_at(start);
        for _ in 0..10 {
            body.integrate(-9.81, DT_STEP);
            let report = mc.physics_step(&mut body);
            assert!(!report.freeze_nudged);
            assert!(!report.jumped);
            let frame = mc.frame_diagnostics(&body, DT_FRAME);
            assert!(!frame.unstuck);
            assert!(!frame.freeze_kick);
        }
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(body.position, start);
        assert_eq!(body.wake_calls, 0);
        assert_eq!(mc.player().grounded_frame_count, 10);
    }

    #[test]
    fn test_step_freeze_nudge_after_grace() {
        let mut mc = controller();
        let mut body = FakeBody::airborne_at(Vec3::new(0.0, 5.0, 0.0));
        body.sleeping = true;

        for step in 1..=5 {
            body.velocity = Vec3::ZERO;
            let report = mc.physics_step(&mut body);
            assert!(!report.freeze_nudged, "nudged on step {}", step);
            assert!(!body.sleeping);
        }

        body.velocity = Vec3::ZERO;
        assert!(mc.physics_step(&mut body).freeze_nudged);
        assert!((body.velocity.y + 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_frame_freeze_kick_within_one_cycle() {
        let diagnostics = DiagnosticsConfig {
            // Keep the per-step nudge out of the way
            step_freeze_grace_steps: u32::MAX,
            ..DiagnosticsConfig::default()
        };
        let mut mc = MovementController::new(MovementConfig::default(), diagnostics, Vec3::ZERO, 3);
        let mut body = FakeBody::airborne_at(Vec3::new(0.0, 3.0, 0.0));

        // Glitch: solver keeps zeroing velocity
        for _ in 0..11 {
            body.velocity = Vec3::ZERO;
            mc.physics_step(&mut body);
        }
        assert_eq!(body.velocity, Vec3::ZERO);

        let mut elapsed = 0.0;
        let mut kicked = false;
        for _ in 0..31 {
            body.velocity = Vec3::ZERO;
            mc.physics_step(&mut body);
            elapsed += DT_FRAME;
            if mc.frame_diagnostics(&body, DT_FRAME).freeze_kick {
                kicked = true;
                break;
            }
        }
        assert!(kicked);
        assert!(elapsed <= 0.5 + DT_FRAME * 1.5);

        // The queued kick lands on the next step
        body.velocity = Vec3::ZERO;
        mc.physics_step(&mut body);
        assert_eq!(body.velocity.y, -1.0);
    }

    #[test]
    fn test_frame_freeze_kick_needs_height() {
        let diagnostics = DiagnosticsConfig {
            step_freeze_grace_steps: u32::MAX,
            ..DiagnosticsConfig::default()
        };
        let mut mc = MovementController::new(MovementConfig::default(), diagnostics, Vec3::ZERO, 3);
        let mut body = FakeBody::airborne_at(Vec3::new(0.0, 0.2, 0.0));
        for _ in 0..60 {
            body.velocity = Vec3::ZERO;
            mc.physics_step(&mut body);
            assert!(!mc.frame_diagnostics(&body, DT_FRAME).freeze_kick);
        }
    }

    #[test]
    fn test_unstuck_fires_once_and_resets_timer() {
        let mut mc = controller();
        let wall_pinned = Vec3::new(10.0, 0.45, 0.0);
        let mut body = FakeBody::grounded_at(wall_pinned);
        let mut fired = 0;

        // 0.5 s of pushing into a wall: the body never moves
        for _ in 0..30 {
            mc.sample_input(&InputFrame::moving(1.0));
            let step = mc.physics_step(&mut body);
            if step.corrections_applied > 0 {
                assert_eq!(body.velocity.y, 4.0);
                assert_eq!(body.velocity.x, 2.0);
            }
            body.velocity = Vec3::ZERO;
            body.position = wall_pinned;

            let frame = mc.frame_diagnostics(&body, DT_FRAME);
            if frame.unstuck {
                fired += 1;
                assert_eq!(mc.player().stuck_timer, 0.0);
                assert_eq!(mc.pending_corrections().len(), 1);
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_slow_analog_walk_is_not_stuck() {
        let mut mc = controller();
        let mut body = FakeBody::grounded_at(Vec3::new(0.0, 0.45, 0.0));
        let mut accumulator = 0.0;

        // 3 s at 60 fps with 50 Hz steps: some frames see no step at all
        for _ in 0..180 {
            mc.sample_input(&InputFrame::moving(0.3));
            accumulator += DT_FRAME;
            while accumulator >= DT_STEP {
                accumulator -= DT_STEP;
                body.integrate(-40.0, DT_STEP);
                let step = mc.physics_step(&mut body);
                assert_eq!(step.corrections_applied, 0);
            }
            assert!(!mc.frame_diagnostics(&body, DT_FRAME).unstuck);
        }
        assert!(body.position.x > 4.0, "x = {}", body.position.x);
    }

    #[test]
    fn test_standing_still_is_not_stuck() {
        let mut mc = controller();
        let mut body = FakeBody::grounded_at(Vec3::ZERO);
        for _ in 0..60 {
            mc.sample_input(&InputFrame::moving(0.05));
            mc.physics_step(&mut body);
            body.velocity = Vec3::ZERO;
            assert!(!mc.frame_diagnostics(&body, DT_FRAME).unstuck);
            assert_eq!(mc.player().stuck_timer, 0.0);
        }
    }

    #[test]
    fn test_fell_out_below_world() {
        let mut mc = controller();
        let body = FakeBody::airborne_at(Vec3::new(0.0, -10.5, 0.0));
        assert!(mc.frame_diagnostics(&body, DT_FRAME).fell_out);
        let body = FakeBody::airborne_at(Vec3::new(0.0, -9.5, 0.0));
        assert!(!mc.frame_diagnostics(&body, DT_FRAME).fell_out);
    }

    #[test]
    fn test_invincibility_retrigger_overwrites_deadline() {
        let mut player = PlayerState::new(Vec3::ZERO, 3);
        player.grant_invincibility(3.0);
        assert!(!player.tick_invincibility(0.5));
        player.grant_invincibility(3.0);
        assert!(!player.tick_invincibility(2.9));
        assert!(player.invincible);
        assert!(player.tick_invincibility(0.2));
        assert!(!player.invincible);
    }
}
