//! Ascent gameplay core: player movement over a rigid-body port, world
//! entities, session state and the HUD/camera sinks. No physics engine
//! dependency; hosts implement [`body::RigidBodyPort`].

pub mod body;
pub mod broadphase;
pub mod camera;
pub mod config;
pub mod entities;
pub mod events;
pub mod game;
pub mod hud;
pub mod input;
pub mod level;
pub mod movement;
pub mod session;

pub use body::{GroundHit, RigidBodyPort};
pub use config::GameConfig;
pub use entities::{EntityChange, EntityKind};
pub use game::{FrameOutcome, Game};
pub use input::InputFrame;
pub use level::LevelLayout;
