//! Transient world entities and their effects on the player.
//!
//! Entities live in a `hecs` world. Each one carries an [`EntityKind`]
//! resolved at spawn time; contact handling matches on it. Changes the
//! physics host has to mirror (spawns, patrol moves, despawns) are queued as
//! [`EntityChange`]s and drained once per frame.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::broadphase::{BoundsHandle, BroadPhaseRegistry, ColliderFlags};
use crate::config::CombatConfig;
use crate::level::{LevelLayout, ENEMY_SIZE, PICKUP_SIZE};
use crate::movement::PlayerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    Invincibility,
    RangedAttack,
    ExtraLife,
}

impl PickupKind {
    pub fn status_text(&self) -> &'static str {
        match self {
            PickupKind::Invincibility => "Invincible!",
            PickupKind::RangedAttack => "Fireball!",
            PickupKind::ExtraLife => "Extra Life!",
        }
    }
}

/// Typed entity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Platform,
    Hazard,
    Enemy,
    Pickup(PickupKind),
    FinishLine,
    Projectile,
}

impl EntityKind {
    /// Trigger volumes report overlap but exert no physical response.
    pub fn is_trigger(&self) -> bool {
        !matches!(self, EntityKind::Platform)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size(pub Vec3);

/// Monotonic spawn counter; iteration that must be deterministic sorts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpawnOrder(pub u64);

/// Link into the broad-phase registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds(pub BoundsHandle);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enemy {
    pub start_position: Vec3,
    pub patrol_speed: f32,
    pub patrol_radius: f32,
    /// Either -1 or +1.
    pub direction: i8,
    pub active: bool,
}

impl Enemy {
    pub fn new(start_position: Vec3, patrol_speed: f32, patrol_radius: f32) -> Self {
        Self {
            start_position,
            patrol_speed,
            patrol_radius,
            direction: 1,
            active: true,
        }
    }

    /// Advance one patrol tick from `position`, clamping to the patrol range
    /// and flipping direction on the boundary.
    pub fn patrol(&mut self, position: Vec3, dt: f32) -> Vec3 {
        let mut next = position;
        next.x += self.direction as f32 * self.patrol_speed * dt;
        let offset = next.x - self.start_position.x;
        if offset.abs() >= self.patrol_radius {
            next.x = self.start_position.x + offset.signum() * self.patrol_radius;
            self.direction = if offset > 0.0 { -1 } else { 1 };
        }
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub velocity: Vec3,
    pub remaining_lifetime: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub kind: PickupKind,
    pub active: bool,
}

/// Something the physics host has to mirror.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityChange {
    Spawned {
        entity: hecs::Entity,
        kind: EntityKind,
        position: Vec3,
        size: Vec3,
    },
    Moved {
        entity: hecs::Entity,
        position: Vec3,
    },
    Despawned {
        entity: hecs::Entity,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Hazard,
    Enemy,
    FellOutOfWorld,
}

/// Result of the player touching an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactOutcome {
    /// Not a gameplay contact, or the entity is already gone.
    Ignored,
    /// A harmful contact absorbed by invincibility.
    Shielded,
    PickupCollected(PickupKind),
    Hit { lives_left: u32 },
    Killed(DeathCause),
    ReachedFinish,
}

/// Per-frame update summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub enemies_destroyed: Vec<hecs::Entity>,
    pub projectiles_expired: usize,
}

pub struct EntityLifecycleManager {
    world: hecs::World,
    combat: CombatConfig,
    next_order: u64,
    bounds_to_entity: HashMap<BoundsHandle, hecs::Entity>,
    changes: Vec<EntityChange>,
}

impl EntityLifecycleManager {
    pub fn new(combat: CombatConfig) -> Self {
        Self {
            world: hecs::World::new(),
            combat,
            next_order: 0,
            bounds_to_entity: HashMap::new(),
            changes: Vec::new(),
        }
    }

    /// Spawn every entity of a layout.
    pub fn populate(&mut self, level: &LevelLayout, registry: &mut BroadPhaseRegistry) {
        for spec in &level.statics {
            let kind = if spec.lethal {
                EntityKind::Hazard
            } else {
                EntityKind::Platform
            };
            self.spawn_basic(kind, spec.position, spec.size);
        }
        for &start in &level.enemies {
            self.spawn_enemy(start, registry);
        }
        for spec in &level.pickups {
            let entity = self.spawn_basic(EntityKind::Pickup(spec.kind), spec.position, PICKUP_SIZE);
            let _ = self.world.insert_one(
                entity,
                Pickup {
                    kind: spec.kind,
                    active: true,
                },
            );
        }
        if let Some(finish) = &level.finish_line {
            self.spawn_basic(EntityKind::FinishLine, finish.position, finish.size);
        }
        tracing::info!(
            "Populated level '{}': {} entities ({} enemies, {} pickups)",
            level.name,
            self.world.len(),
            level.enemies.len(),
            level.pickups.len()
        );
    }

    fn spawn_basic(&mut self, kind: EntityKind, position: Vec3, size: Vec3) -> hecs::Entity {
        let order = SpawnOrder(self.next_order);
        self.next_order += 1;
        let entity = self.world.spawn((kind, Position(position), Size(size), order));
        self.changes.push(EntityChange::Spawned {
            entity,
            kind,
            position,
            size,
        });
        entity
    }

    pub fn spawn_enemy(&mut self, start: Vec3, registry: &mut BroadPhaseRegistry) -> hecs::Entity {
        let entity = self.spawn_basic(EntityKind::Enemy, start, ENEMY_SIZE);
        let handle = registry.register(start, ENEMY_SIZE, ColliderFlags::enemy());
        let enemy = Enemy::new(start, self.combat.enemy_speed, self.combat.enemy_patrol_radius);
        let _ = self.world.insert(entity, (enemy, Bounds(handle)));
        self.bounds_to_entity.insert(handle, entity);
        entity
    }

    /// Launch a projectile along +x from `origin` plus the forward offset.
    pub fn spawn_projectile(&mut self, origin: Vec3, registry: &mut BroadPhaseRegistry) -> hecs::Entity {
        let start = origin + Vec3::X * self.combat.projectile_spawn_offset;
        let size = Vec3::splat(self.combat.projectile_hit_radius * 2.0);
        let entity = self.spawn_basic(EntityKind::Projectile, start, size);
        let handle = registry.register(start, size, ColliderFlags::projectile());
        let projectile = Projectile {
            velocity: Vec3::X * self.combat.projectile_speed,
            remaining_lifetime: self.combat.projectile_lifetime,
        };
        let _ = self.world.insert(entity, (projectile, Bounds(handle)));
        self.bounds_to_entity.insert(handle, entity);
        entity
    }

    fn despawn(&mut self, entity: hecs::Entity, registry: &mut BroadPhaseRegistry) {
        if let Ok(bounds) = self.world.get::<&Bounds>(entity).map(|b| *b) {
            registry.remove(bounds.0);
            self.bounds_to_entity.remove(&bounds.0);
        }
        if self.world.despawn(entity).is_ok() {
            self.changes.push(EntityChange::Despawned { entity });
        }
    }

    /// Per-frame patrol and projectile update.
    pub fn update(&mut self, dt: f32, registry: &mut BroadPhaseRegistry) -> UpdateReport {
        let mut report = UpdateReport::default();

        for (entity, (position, enemy, bounds)) in
            self.world.query_mut::<(&mut Position, &mut Enemy, &Bounds)>()
        {
            if !enemy.active {
                continue;
            }
            position.0 = enemy.patrol(position.0, dt);
            registry.update(bounds.0, position.0, ENEMY_SIZE);
            self.changes.push(EntityChange::Moved {
                entity,
                position: position.0,
            });
        }

        let mut projectiles: Vec<(SpawnOrder, hecs::Entity)> = self
            .world
            .query::<(&Projectile, &SpawnOrder)>()
            .iter()
            .map(|(e, (_, order))| (*order, e))
            .collect();
        projectiles.sort();

        for (_, entity) in projectiles {
            let (position, bounds) = {
                let mut query = match self
                    .world
                    .query_one::<(&mut Position, &mut Projectile, &Bounds)>(entity)
                {
                    Ok(q) => q,
                    Err(_) => continue,
                };
                let (position, projectile, bounds) = match query.get() {
                    Some(c) => c,
                    None => continue,
                };
                position.0 += projectile.velocity * dt;
                projectile.remaining_lifetime -= dt;
                if projectile.remaining_lifetime <= 0.0
                    || position.0.x.abs() > self.combat.projectile_max_abs_x
                {
                    (None, *bounds)
                } else {
                    (Some(position.0), *bounds)
                }
            };

            let position = match position {
                Some(p) => p,
                None => {
                    self.despawn(entity, registry);
                    report.projectiles_expired += 1;
                    continue;
                }
            };

            let size = Vec3::splat(self.combat.projectile_hit_radius * 2.0);
            registry.update(bounds.0, position, size);
            self.changes.push(EntityChange::Moved { entity, position });

            let target = registry
                .query_intersections(bounds.0, position)
                .into_iter()
                .filter(|&h| registry.flags(h).is_some_and(|f| f.enemy))
                .filter_map(|h| self.bounds_to_entity.get(&h).copied())
                .find(|&e| {
                    self.world
                        .get::<&Enemy>(e)
                        .map(|enemy| enemy.active)
                        .unwrap_or(false)
                });

            if let Some(enemy) = target {
                if let Ok(mut e) = self.world.get::<&mut Enemy>(enemy) {
                    e.active = false;
                }
                self.despawn(enemy, registry);
                self.despawn(entity, registry);
                report.enemies_destroyed.push(enemy);
                tracing::debug!("projectile {:?} destroyed enemy {:?}", entity, enemy);
            }
        }

        report
    }

    /// Apply the effect of the player touching `other`.
    pub fn resolve_contact(
        &mut self,
        other: hecs::Entity,
        player: &mut PlayerState,
        registry: &mut BroadPhaseRegistry,
    ) -> ContactOutcome {
        let kind = match self.world.get::<&EntityKind>(other) {
            Ok(kind) => *kind,
            Err(_) => return ContactOutcome::Ignored,
        };

        match kind {
            EntityKind::Pickup(pickup_kind) => {
                let was_active = match self.world.get::<&mut Pickup>(other) {
                    Ok(mut pickup) => std::mem::replace(&mut pickup.active, false),
                    Err(_) => false,
                };
                if !was_active {
                    return ContactOutcome::Ignored;
                }
                self.despawn(other, registry);
                match pickup_kind {
                    PickupKind::Invincibility => {
                        player.grant_invincibility(self.combat.pickup_invincibility);
                    }
                    PickupKind::RangedAttack => {
                        self.spawn_projectile(player.position, registry);
                    }
                    PickupKind::ExtraLife => {
                        player.lives += 1;
                    }
                }
                ContactOutcome::PickupCollected(pickup_kind)
            }
            EntityKind::Hazard => {
                if player.invincible {
                    return ContactOutcome::Shielded;
                }
                player.lives = 0;
                ContactOutcome::Killed(DeathCause::Hazard)
            }
            EntityKind::Enemy => {
                let active = self
                    .world
                    .get::<&Enemy>(other)
                    .map(|e| e.active)
                    .unwrap_or(false);
                if !active {
                    return ContactOutcome::Ignored;
                }
                if player.invincible {
                    return ContactOutcome::Shielded;
                }
                player.lives = player.lives.saturating_sub(1);
                if player.lives == 0 {
                    ContactOutcome::Killed(DeathCause::Enemy)
                } else {
                    player.grant_invincibility(self.combat.hit_invincibility);
                    ContactOutcome::Hit {
                        lives_left: player.lives,
                    }
                }
            }
            EntityKind::FinishLine => ContactOutcome::ReachedFinish,
            EntityKind::Platform | EntityKind::Projectile => ContactOutcome::Ignored,
        }
    }

    /// Take the queued changes for the physics host.
    pub fn drain_changes(&mut self) -> Vec<EntityChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn kind(&self, entity: hecs::Entity) -> Option<EntityKind> {
        self.world.get::<&EntityKind>(entity).ok().map(|k| *k)
    }

    pub fn position(&self, entity: hecs::Entity) -> Option<Vec3> {
        self.world.get::<&Position>(entity).ok().map(|p| p.0)
    }

    pub fn contains(&self, entity: hecs::Entity) -> bool {
        self.world.contains(entity)
    }

    pub fn enemy(&self, entity: hecs::Entity) -> Option<Enemy> {
        self.world.get::<&Enemy>(entity).ok().map(|e| *e)
    }

    /// Entities of a kind, in spawn order.
    pub fn entities_of(&self, matches: impl Fn(EntityKind) -> bool) -> Vec<hecs::Entity> {
        let mut found: Vec<(SpawnOrder, hecs::Entity)> = self
            .world
            .query::<(&EntityKind, &SpawnOrder)>()
            .iter()
            .filter(|(_, (kind, _))| matches(**kind))
            .map(|(e, (_, order))| (*order, e))
            .collect();
        found.sort();
        found.into_iter().map(|(_, e)| e).collect()
    }

    pub fn active_enemy_count(&self) -> usize {
        self.world
            .query::<&Enemy>()
            .iter()
            .filter(|(_, e)| e.active)
            .count()
    }

    pub fn projectile_count(&self) -> usize {
        self.world.query::<&Projectile>().iter().count()
    }

    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }
}
