pub mod cli;
pub mod hud;
pub mod input;
pub mod physics;
pub mod runner;
pub mod world;
