//! Headless runner for automated play-testing.
//!
//! Drives a [`Game`] against a Rapier world with a fixed-timestep
//! accumulator. Each frame: physics steps owed by the accumulator run first
//! with the input sampled on the previous frame, then the frame callback
//! samples this frame's input and consumes the contacts those steps reported.

use ascent_core::camera::CameraFollowPolicy;
use ascent_core::events::GameEvent;
use ascent_core::input::InputFrame;
use ascent_core::level::LevelLayout;
use ascent_core::{FrameOutcome, Game, GameConfig, RigidBodyPort};
use glam::Vec3;
use serde::Serialize;

use crate::hud::TracingHud;
use crate::input::InputTimeline;
use crate::physics::PhysicsWorld;
use crate::world::build_physics_world;

/// End-of-run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub physics_steps: u64,
    pub game_time: f32,
    pub elapsed_time: f32,
    pub lives: u32,
    pub position: [f32; 3],
    pub game_over: bool,
    pub level_complete: bool,
    pub enemies_left: usize,
    pub events: usize,
    /// Every scripted input has been played (true without a script).
    pub input_finished: bool,
    /// Column-major view matrix of the follow camera.
    pub camera_view: Option<[f32; 16]>,
}

pub struct HeadlessRunner {
    pub game: Game,
    pub physics: PhysicsWorld,
    pub input: Option<InputTimeline>,
    pub frame_dt: f32,
    pub fixed_dt: f32,
    accumulator: f32,
    pub total_time: f32,
    pub frame_count: u64,
    pub physics_steps: u64,
    pub restarts: u32,
}

impl HeadlessRunner {
    pub fn new(config: GameConfig, level: LevelLayout) -> Self {
        let frame_dt = config.physics.frame_timestep;
        let fixed_dt = config.physics.fixed_timestep;
        let camera = CameraFollowPolicy::new(&config.camera);
        let mut game = Game::new(config, level)
            .with_hud(Box::new(TracingHud::new()))
            .with_camera(camera);
        let physics = build_physics_world(&mut game);
        Self {
            game,
            physics,
            input: None,
            frame_dt,
            fixed_dt,
            accumulator: 0.0,
            total_time: 0.0,
            frame_count: 0,
            physics_steps: 0,
            restarts: 0,
        }
    }

    /// Replace the input source. Script times are absolute runner time.
    pub fn set_input(&mut self, timeline: InputTimeline) {
        self.input = Some(timeline);
    }

    /// Advance the simulation by one frame.
    pub fn step_frame(&mut self) -> FrameOutcome {
        let input = match self.input.as_mut() {
            Some(timeline) => timeline.sample(self.total_time),
            None => InputFrame::idle(),
        };

        self.accumulator += self.frame_dt;
        while self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            if self.game.is_terminal() {
                continue;
            }
            self.physics.step(self.fixed_dt);
            if let Some(mut body) = self.physics.player_body() {
                self.game.physics_step(&mut body);
            }
            self.physics_steps += 1;
        }

        let contacts = self.physics.drain_contacts();
        let outcome = match self.physics.player_body() {
            Some(body) => self.game.frame(&body, &input, self.frame_dt, &contacts),
            None => FrameOutcome::Running,
        };

        match outcome {
            FrameOutcome::Restarted => {
                self.physics = build_physics_world(&mut self.game);
                self.accumulator = 0.0;
                self.restarts += 1;
            }
            _ => {
                let changes = self.game.drain_entity_changes();
                self.physics.apply_changes(&changes);
            }
        }

        self.total_time += self.frame_dt;
        self.frame_count += 1;
        outcome
    }

    /// Advance multiple frames.
    pub fn step_frames(&mut self, count: u64) {
        for _ in 0..count {
            self.step_frame();
        }
    }

    /// Advance by a given number of seconds (at the frame timestep).
    pub fn step_seconds(&mut self, seconds: f32) {
        let frames = (seconds / self.frame_dt).ceil() as u64;
        self.step_frames(frames);
    }

    /// Run until the session ends or `max_seconds` pass. Returns whether it
    /// ended.
    pub fn run_until_terminal(&mut self, max_seconds: f32) -> bool {
        let frames = (max_seconds / self.frame_dt).ceil() as u64;
        for _ in 0..frames {
            if self.step_frame() == FrameOutcome::Terminal {
                return true;
            }
        }
        self.game.is_terminal()
    }

    pub fn player_position(&mut self) -> Option<Vec3> {
        self.physics.player_body().map(|b| b.position())
    }

    /// Check if a matching event was recorded.
    pub fn event_occurred(&self, matches: impl Fn(&GameEvent) -> bool) -> bool {
        self.game.events().count(matches) > 0
    }

    pub fn summary(&mut self) -> RunSummary {
        let position = self.player_position().unwrap_or(self.game.player().position);
        RunSummary {
            frames: self.frame_count,
            physics_steps: self.physics_steps,
            game_time: self.total_time,
            elapsed_time: self.game.session().elapsed_time,
            lives: self.game.player().lives,
            position: position.to_array(),
            game_over: self.game.session().game_over(),
            level_complete: self.game.session().level_complete(),
            enemies_left: self.game.entities().active_enemy_count(),
            events: self.game.events().get_log().len(),
            input_finished: self
                .input
                .as_ref()
                .map_or(true, |timeline| timeline.is_finished(self.total_time)),
            camera_view: self.game.camera().map(|c| c.view_matrix().to_cols_array()),
        }
    }
}
