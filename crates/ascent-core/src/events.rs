use std::collections::VecDeque;
use std::path::PathBuf;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::entities::{DeathCause, PickupKind};

/// Gameplay events worth recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    Jumped { position: [f32; 3] },
    PickupCollected { kind: PickupKind },
    PlayerHit { lives_left: u32 },
    PlayerKilled { cause: DeathCause },
    ProjectileSpawned { position: [f32; 3] },
    EnemyDestroyed,
    Unstuck { position: [f32; 3] },
    FreezeCorrected { position: [f32; 3] },
    LevelComplete { time: f32 },
    Restarted,
}

impl GameEvent {
    pub fn jumped(position: Vec3) -> Self {
        GameEvent::Jumped {
            position: position.to_array(),
        }
    }

    pub fn projectile_spawned(position: Vec3) -> Self {
        GameEvent::ProjectileSpawned {
            position: position.to_array(),
        }
    }

    pub fn unstuck(position: Vec3) -> Self {
        GameEvent::Unstuck {
            position: position.to_array(),
        }
    }

    pub fn freeze_corrected(position: Vec3) -> Self {
        GameEvent::FreezeCorrected {
            position: position.to_array(),
        }
    }
}

/// An event stamped with session time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub timestamp: f64,
    #[serde(flatten)]
    pub event: GameEvent,
}

/// Ring buffer of recent events with an optional JSON-lines file mirror.
pub struct EventLog {
    log: VecDeque<LoggedEvent>,
    log_capacity: usize,
    log_file: Option<PathBuf>,
    total_time: f64,
    pending: Vec<LoggedEvent>,
}

impl EventLog {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            log: VecDeque::with_capacity(log_capacity),
            log_capacity,
            log_file: None,
            total_time: 0.0,
            pending: Vec::new(),
        }
    }

    /// Append every flushed event to `path`, one JSON object per line.
    pub fn enable_file_logging(&mut self, path: PathBuf) {
        self.log_file = Some(path);
    }

    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Queue an event; it is recorded on the next flush.
    pub fn emit(&mut self, event: GameEvent) {
        self.pending.push(LoggedEvent {
            timestamp: self.total_time,
            event,
        });
    }

    /// Move pending events into the ring buffer and file. Returns them.
    pub fn flush(&mut self) -> Vec<LoggedEvent> {
        let events: Vec<LoggedEvent> = self.pending.drain(..).collect();

        for event in &events {
            if self.log.len() >= self.log_capacity {
                self.log.pop_front();
            }
            self.log.push_back(event.clone());

            // Write failures are dropped
            if let Some(log_path) = &self.log_file {
                if let Ok(json) = serde_json::to_string(event) {
                    let _ = std::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(log_path)
                        .and_then(|mut f| {
                            use std::io::Write;
                            writeln!(f, "{}", json)
                        });
                }
            }
        }

        events
    }

    pub fn tick(&mut self, dt: f64) {
        self.total_time += dt;
    }

    pub fn get_log(&self) -> &VecDeque<LoggedEvent> {
        &self.log
    }

    /// Number of recorded events matching a predicate.
    pub fn count(&self, matches: impl Fn(&GameEvent) -> bool) -> usize {
        self.log.iter().filter(|e| matches(&e.event)).count()
    }
}
