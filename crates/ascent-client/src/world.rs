use ascent_core::level::LevelLayout;
use ascent_core::Game;
use glam::Vec3;
use serde::Serialize;

use crate::physics::PhysicsWorld;

/// Build a fresh physics world mirroring the game's current entities and
/// spawn the player body at the level's spawn point.
pub fn build_physics_world(game: &mut Game) -> PhysicsWorld {
    let mut physics = PhysicsWorld::new(&game.config().physics);
    let changes = game.drain_entity_changes();
    physics.apply_changes(&changes);
    let size = Vec3::from_array(game.config().movement.player_size);
    physics.spawn_player(game.level().player_spawn, size);
    tracing::info!(
        "Physics world built for '{}': {} bodies, player at {:?}",
        game.level().name,
        physics.entity_count(),
        game.level().player_spawn
    );
    physics
}

/// Overview of a level layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSummary {
    pub name: String,
    pub player_spawn: [f32; 3],
    pub platforms: usize,
    pub hazards: usize,
    pub enemies: usize,
    pub pickups: usize,
    pub finish_line: Option<[f32; 3]>,
    /// Horizontal span covered by solid geometry.
    pub extent_x: [f32; 2],
}

pub fn summarize_level(level: &LevelLayout) -> LevelSummary {
    let (min_x, max_x) = level
        .platforms()
        .map(|p| (p.position.x - p.size.x * 0.5, p.position.x + p.size.x * 0.5))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), (a, b)| (lo.min(a), hi.max(b)));
    let extent_x = if min_x.is_finite() { [min_x, max_x] } else { [0.0, 0.0] };

    LevelSummary {
        name: level.name.clone(),
        player_spawn: level.player_spawn.to_array(),
        platforms: level.platforms().count(),
        hazards: level.hazards().count(),
        enemies: level.enemies.len(),
        pickups: level.pickups.len(),
        finish_line: level.finish_line.map(|f| f.position.to_array()),
        extent_x,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascent_core::entities::EntityKind;
    use ascent_core::GameConfig;

    #[test]
    fn test_build_mirrors_every_entity() {
        let mut game = Game::new(GameConfig::default(), LevelLayout::course());
        let entities = game.entities().len();
        let physics = build_physics_world(&mut game);
        assert_eq!(physics.entity_count(), entities);
        assert!(physics.player_handles().is_some());
        assert!(game.drain_entity_changes().is_empty());
        assert_eq!(game.entities().entities_of(|k| k == EntityKind::Enemy).len(), 6);
    }

    #[test]
    fn test_course_summary() {
        let summary = summarize_level(&LevelLayout::course());
        assert_eq!(summary.platforms, 110);
        assert_eq!(summary.hazards, 6);
        assert_eq!(summary.finish_line, Some([190.0, 14.0, 0.0]));
        assert_eq!(summary.extent_x, [-16.5, 238.5]);
    }
}
