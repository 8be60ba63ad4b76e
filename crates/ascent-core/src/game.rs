//! Frame and physics entry points for one play session.
//!
//! The host drives two callbacks: [`Game::physics_step`] at the fixed physics
//! rate, after the engine integrated, and [`Game::frame`] once per rendered
//! frame with the sampled input and the trigger contacts the engine reported
//! since the last frame.

use glam::Vec3;

use crate::body::RigidBodyPort;
use crate::broadphase::BroadPhaseRegistry;
use crate::camera::CameraFollowPolicy;
use crate::config::GameConfig;
use crate::entities::{
    ContactOutcome, DeathCause, EntityChange, EntityLifecycleManager, PickupKind,
};
use crate::events::{EventLog, GameEvent};
use crate::hud::{self, HudSink};
use crate::input::InputFrame;
use crate::level::LevelLayout;
use crate::movement::{MovementController, PlayerState, StepReport};
use crate::session::{SessionState, Terminal};

const EVENT_LOG_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Running,
    /// Game over or level complete; waiting for restart.
    Terminal,
    /// State was rebuilt. The host must rebuild its physics world from
    /// [`Game::drain_entity_changes`] and respawn the player body.
    Restarted,
}

pub struct Game {
    config: GameConfig,
    level: LevelLayout,
    movement: MovementController,
    entities: EntityLifecycleManager,
    session: SessionState,
    registry: BroadPhaseRegistry,
    events: EventLog,
    hud: Option<Box<dyn HudSink>>,
    camera: Option<CameraFollowPolicy>,
}

impl Game {
    pub fn new(config: GameConfig, level: LevelLayout) -> Self {
        let mut registry = BroadPhaseRegistry::new();
        let mut entities = EntityLifecycleManager::new(config.combat.clone());
        entities.populate(&level, &mut registry);
        let movement = MovementController::new(
            config.movement.clone(),
            config.diagnostics.clone(),
            level.player_spawn,
            config.session.initial_lives,
        );
        Self {
            config,
            level,
            movement,
            entities,
            session: SessionState::new(),
            registry,
            events: EventLog::new(EVENT_LOG_CAPACITY),
            hud: None,
            camera: None,
        }
    }

    pub fn with_hud(mut self, hud: Box<dyn HudSink>) -> Self {
        self.hud = Some(hud);
        self.refresh_hud();
        self
    }

    pub fn with_camera(mut self, camera: CameraFollowPolicy) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn level(&self) -> &LevelLayout {
        &self.level
    }

    pub fn player(&self) -> &PlayerState {
        self.movement.player()
    }

    pub fn movement(&self) -> &MovementController {
        &self.movement
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn entities(&self) -> &EntityLifecycleManager {
        &self.entities
    }

    pub fn registry(&self) -> &BroadPhaseRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    pub fn camera(&self) -> Option<&CameraFollowPolicy> {
        self.camera.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.session.is_terminal()
    }

    pub fn drain_entity_changes(&mut self) -> Vec<EntityChange> {
        self.entities.drain_changes()
    }

    /// One fixed physics step. Does nothing once the session is over.
    pub fn physics_step<B: RigidBodyPort>(&mut self, body: &mut B) -> StepReport {
        if self.session.is_terminal() {
            return StepReport::default();
        }
        let report = self.movement.physics_step(body);
        if report.jumped {
            self.events.emit(GameEvent::jumped(self.movement.player().position));
        }
        report
    }

    /// One rendered frame. `contacts` are the entities the player's body
    /// began touching, in the order the engine reported them.
    pub fn frame<B: RigidBodyPort>(
        &mut self,
        body: &B,
        input: &InputFrame,
        dt: f32,
        contacts: &[hecs::Entity],
    ) -> FrameOutcome {
        if self.session.is_terminal() {
            if input.restart {
                self.restart();
                return FrameOutcome::Restarted;
            }
            return FrameOutcome::Terminal;
        }

        self.session.advance_clock(dt);
        self.events.tick(dt as f64);
        let timer = hud::timer_text(self.session.elapsed_time);
        self.with_sink(|sink| sink.set_timer(&timer));

        self.movement.sample_input(input);
        let diagnostics = self.movement.frame_diagnostics(body, dt);
        let position = self.movement.player().position;
        if input.ranged_attack {
            self.fire_projectile(position);
        }
        if diagnostics.unstuck {
            self.show_status("Unstuck!");
            self.events.emit(GameEvent::unstuck(position));
        }
        if diagnostics.freeze_kick {
            self.events.emit(GameEvent::freeze_corrected(position));
        }

        let update = self.entities.update(dt, &mut self.registry);
        for _ in &update.enemies_destroyed {
            self.events.emit(GameEvent::EnemyDestroyed);
        }

        for &contact in contacts {
            if self.session.is_terminal() {
                break;
            }
            let outcome = self.entities.resolve_contact(
                contact,
                self.movement.player_mut(),
                &mut self.registry,
            );
            self.apply_contact(outcome);
        }

        if !self.session.is_terminal() {
            if self.movement.player_mut().tick_invincibility(dt) {
                tracing::debug!("invincibility expired");
            }
            if self.session.tick_status(dt) {
                self.with_sink(|sink| sink.set_status(""));
            }
        }

        if let Some(camera) = self.camera.as_mut() {
            camera.push_target(position);
            camera.update(dt);
        }

        if diagnostics.fell_out && !self.session.is_terminal() {
            self.kill(DeathCause::FellOutOfWorld);
        }

        self.events.flush();
        if self.session.is_terminal() {
            FrameOutcome::Terminal
        } else {
            FrameOutcome::Running
        }
    }

    /// Rebuild player, entities and session from the initial layout.
    pub fn restart(&mut self) {
        let mut registry = BroadPhaseRegistry::new();
        let mut entities = EntityLifecycleManager::new(self.config.combat.clone());
        entities.populate(&self.level, &mut registry);
        self.registry = registry;
        self.entities = entities;
        self.movement = MovementController::new(
            self.config.movement.clone(),
            self.config.diagnostics.clone(),
            self.level.player_spawn,
            self.config.session.initial_lives,
        );
        self.session = SessionState::new();
        if let Some(camera) = self.camera.as_mut() {
            camera.reset();
        }
        self.refresh_hud();
        self.events.emit(GameEvent::Restarted);
        self.events.flush();
        tracing::info!("Restarted level '{}'", self.level.name);
    }

    fn apply_contact(&mut self, outcome: ContactOutcome) {
        match outcome {
            ContactOutcome::Ignored | ContactOutcome::Shielded => {}
            ContactOutcome::PickupCollected(kind) => {
                self.events.emit(GameEvent::PickupCollected { kind });
                self.show_status(kind.status_text());
                match kind {
                    PickupKind::ExtraLife => self.refresh_health(),
                    PickupKind::RangedAttack => {
                        let position = self.movement.player().position;
                        self.events.emit(GameEvent::projectile_spawned(position));
                    }
                    PickupKind::Invincibility => {}
                }
            }
            ContactOutcome::Hit { lives_left } => {
                self.events.emit(GameEvent::PlayerHit { lives_left });
                self.refresh_health();
                self.show_status("Hit!");
            }
            ContactOutcome::Killed(cause) => self.kill(cause),
            ContactOutcome::ReachedFinish => {
                if self.session.finish(Terminal::LevelComplete) {
                    let time = self.session.elapsed_time;
                    let banner = hud::level_complete_banner(time);
                    self.with_sink(|sink| sink.set_status(&banner));
                    self.events.emit(GameEvent::LevelComplete { time });
                    tracing::info!("Level complete in {:.2}s", time);
                }
            }
        }
    }

    fn kill(&mut self, cause: DeathCause) {
        self.movement.player_mut().lives = 0;
        if self.session.finish(Terminal::GameOver) {
            self.refresh_health();
            let banner = hud::game_over_banner();
            self.with_sink(|sink| sink.set_status(&banner));
            self.events.emit(GameEvent::PlayerKilled { cause });
            tracing::info!("Game over ({:?}) at {:.2}s", cause, self.session.elapsed_time);
        }
    }

    fn fire_projectile(&mut self, origin: Vec3) {
        self.entities.spawn_projectile(origin, &mut self.registry);
        self.events.emit(GameEvent::projectile_spawned(origin));
    }

    fn show_status(&mut self, text: &str) {
        self.session.show_status(text, self.config.session.status_duration);
        self.with_sink(|sink| sink.set_status(text));
    }

    fn refresh_health(&mut self) {
        let text = hud::health_text(self.movement.player().lives, self.config.session.initial_lives);
        self.with_sink(|sink| sink.set_health(&text));
    }

    fn refresh_hud(&mut self) {
        self.refresh_health();
        let timer = hud::timer_text(self.session.elapsed_time);
        self.with_sink(|sink| {
            sink.set_timer(&timer);
            sink.set_status("");
        });
    }

    fn with_sink(&mut self, f: impl FnOnce(&mut dyn HudSink)) {
        if let Some(sink) = self.hud.as_mut() {
            f(sink.as_mut());
        }
    }
}
