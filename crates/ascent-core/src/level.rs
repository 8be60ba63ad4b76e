//! Compiled-in level layout.
//!
//! The course is data: a ground strip, floating platforms, lethal spikes,
//! patrolling enemies, pickups and a finish line. Builders on
//! [`LevelLayout`] exist so tests can assemble small arenas.

use glam::Vec3;

use crate::entities::PickupKind;

pub const ENEMY_SIZE: Vec3 = Vec3::ONE;
pub const PICKUP_SIZE: Vec3 = Vec3::splat(0.6);

/// A static box: a solid platform or a lethal trigger volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticSpec {
    pub position: Vec3,
    pub size: Vec3,
    pub lethal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupSpec {
    pub position: Vec3,
    pub kind: PickupKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishSpec {
    pub position: Vec3,
    pub size: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelLayout {
    pub name: String,
    pub player_spawn: Vec3,
    pub statics: Vec<StaticSpec>,
    pub enemies: Vec<Vec3>,
    pub pickups: Vec<PickupSpec>,
    pub finish_line: Option<FinishSpec>,
}

impl LevelLayout {
    /// An empty arena with only a spawn point.
    pub fn empty(player_spawn: Vec3) -> Self {
        Self {
            name: "arena".to_string(),
            player_spawn,
            statics: Vec::new(),
            enemies: Vec::new(),
            pickups: Vec::new(),
            finish_line: None,
        }
    }

    pub fn with_platform(mut self, position: Vec3, size: Vec3) -> Self {
        self.statics.push(StaticSpec {
            position,
            size,
            lethal: false,
        });
        self
    }

    pub fn with_hazard(mut self, position: Vec3, size: Vec3) -> Self {
        self.statics.push(StaticSpec {
            position,
            size,
            lethal: true,
        });
        self
    }

    pub fn with_enemy(mut self, position: Vec3) -> Self {
        self.enemies.push(position);
        self
    }

    pub fn with_pickup(mut self, position: Vec3, kind: PickupKind) -> Self {
        self.pickups.push(PickupSpec { position, kind });
        self
    }

    pub fn with_finish_line(mut self, position: Vec3, size: Vec3) -> Self {
        self.finish_line = Some(FinishSpec { position, size });
        self
    }

    pub fn platforms(&self) -> impl Iterator<Item = &StaticSpec> {
        self.statics.iter().filter(|s| !s.lethal)
    }

    pub fn hazards(&self) -> impl Iterator<Item = &StaticSpec> {
        self.statics.iter().filter(|s| s.lethal)
    }

    /// The full course.
    pub fn course() -> Self {
        let z = 0.0;
        let mut level = Self::empty(Vec3::new(0.0, 2.0, z));
        level.name = "course".to_string();

        // Ground strip
        for i in -5..80 {
            level = level.with_platform(Vec3::new(i as f32 * 3.0, -1.0, z), Vec3::new(3.0, 1.0, 1.0));
        }

        let platforms: [(f32, f32, f32); 25] = [
            // Early, easy jumps
            (5.0, 2.0, 4.0),
            (12.0, 4.0, 4.0),
            (18.0, 6.0, 5.0),
            (25.0, 8.0, 4.0),
            // Mid section
            (32.0, 6.0, 5.0),
            (38.0, 10.0, 4.0),
            (45.0, 7.0, 6.0),
            (52.0, 12.0, 5.0),
            (58.0, 9.0, 4.0),
            // Challenge section
            (65.0, 14.0, 5.0),
            (72.0, 11.0, 6.0),
            (80.0, 15.0, 5.0),
            (88.0, 10.0, 7.0),
            // Stepping stones
            (95.0, 8.0, 3.0),
            (100.0, 11.0, 3.0),
            (105.0, 13.0, 3.0),
            (110.0, 10.0, 4.0),
            // Bridge
            (118.0, 8.0, 8.0),
            (130.0, 12.0, 6.0),
            (140.0, 10.0, 7.0),
            // Final ascent
            (150.0, 13.0, 5.0),
            (158.0, 16.0, 5.0),
            (165.0, 18.0, 6.0),
            (173.0, 15.0, 5.0),
            (180.0, 12.0, 8.0),
        ];
        for (x, y, width) in platforms {
            level = level.with_platform(Vec3::new(x, y, z), Vec3::new(width, 1.0, 1.0));
        }

        let spikes: [(f32, f32); 6] = [
            (30.0, 3.0),
            (55.0, 2.0),
            (75.0, 4.0),
            (98.0, 3.0),
            (125.0, 2.0),
            (160.0, 4.0),
        ];
        for (x, height) in spikes {
            level = level.with_hazard(Vec3::new(x, 0.5, z), Vec3::new(1.0, height, 1.0));
        }

        for x in [20.0, 40.0, 68.0, 92.0, 122.0, 155.0] {
            level = level.with_enemy(Vec3::new(x, 1.0, z));
        }

        let pickups = [
            (15.0, 5.0, PickupKind::Invincibility),
            (35.0, 9.0, PickupKind::RangedAttack),
            (60.0, 11.0, PickupKind::ExtraLife),
            (85.0, 13.0, PickupKind::Invincibility),
            (115.0, 10.0, PickupKind::RangedAttack),
            (145.0, 11.0, PickupKind::ExtraLife),
            (170.0, 17.0, PickupKind::Invincibility),
        ];
        for (x, y, kind) in pickups {
            level = level.with_pickup(Vec3::new(x, y, z), kind);
        }

        level.with_finish_line(Vec3::new(190.0, 14.0, z), Vec3::new(2.0, 5.0, 1.0))
    }
}

impl Default for LevelLayout {
    fn default() -> Self {
        Self::course()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_contents() {
        let level = LevelLayout::course();
        assert_eq!(level.platforms().count(), 85 + 25);
        assert_eq!(level.hazards().count(), 6);
        assert_eq!(level.enemies.len(), 6);
        assert_eq!(level.pickups.len(), 7);
        assert_eq!(level.finish_line.unwrap().position, Vec3::new(190.0, 14.0, 0.0));
        assert_eq!(level.player_spawn, Vec3::new(0.0, 2.0, 0.0));
        let last = level.platforms().last().unwrap();
        assert_eq!(last.position, Vec3::new(180.0, 12.0, 0.0));
        assert_eq!(last.size.x, 8.0);
    }

    #[test]
    fn test_spawn_is_above_ground() {
        let level = LevelLayout::course();
        let spawn = level.player_spawn;
        let under = level
            .platforms()
            .find(|p| (spawn.x - p.position.x).abs() <= p.size.x * 0.5 && p.position.y < spawn.y);
        assert!(under.is_some());
    }

    #[test]
    fn test_builders() {
        let level = LevelLayout::empty(Vec3::ZERO)
            .with_platform(Vec3::ZERO, Vec3::ONE)
            .with_hazard(Vec3::X, Vec3::ONE)
            .with_pickup(Vec3::Y, PickupKind::ExtraLife);
        assert_eq!(level.statics.len(), 2);
        assert_eq!(level.hazards().count(), 1);
        assert!(level.finish_line.is_none());
    }
}
