use std::collections::{HashMap, HashSet};

use ascent_core::body::{GroundHit, RigidBodyPort};
use ascent_core::config::PhysicsConfig;
use ascent_core::entities::{EntityChange, EntityKind};
use glam::Vec3;
use rapier3d::prelude::*;

/// Rapier handles of the player's body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerHandles {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

/// Rapier handles mirrored for one gameplay entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityBody {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    pub kind: EntityKind,
}

/// Central physics world state.
pub struct PhysicsWorld {
    pub gravity: Vec3,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_params: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    settings: PhysicsConfig,
    player: Option<PlayerHandles>,

    // Mapping between Rapier handles and ECS entities
    entity_bodies: HashMap<hecs::Entity, EntityBody>,
    collider_to_entity: HashMap<ColliderHandle, hecs::Entity>,

    // Trigger colliders overlapping the player after the last step
    active_triggers: HashSet<ColliderHandle>,
    // Newly started player contacts, in report order, until drained
    contacts: Vec<hecs::Entity>,
}

impl PhysicsWorld {
    pub fn new(settings: &PhysicsConfig) -> Self {
        let mut integration_params = IntegrationParameters::default();
        integration_params.dt = settings.fixed_timestep;
        Self {
            gravity: Vec3::from_array(settings.gravity),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_params,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            settings: settings.clone(),
            player: None,
            entity_bodies: HashMap::new(),
            collider_to_entity: HashMap::new(),
            active_triggers: HashSet::new(),
            contacts: Vec::new(),
        }
    }

    /// Spawn the player's dynamic box: rotation locked, confined to the
    /// z = const plane, continuous collision on, never sleeping.
    pub fn spawn_player(&mut self, position: Vec3, size: Vec3) -> PlayerHandles {
        if let Some(previous) = self.player.take() {
            self.remove_body(previous.body);
        }
        let half = size * 0.5;
        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y, position.z])
            .lock_rotations()
            .enabled_translations(true, true, false)
            .ccd_enabled(true)
            .linear_damping(self.settings.player_linear_damping)
            .can_sleep(false)
            .build();
        let body = self.rigid_body_set.insert(rb);

        let collider = ColliderBuilder::cuboid(half.x, half.y, half.z)
            .mass(self.settings.player_mass)
            .friction(self.settings.player_friction)
            .restitution(self.settings.restitution)
            .build();
        let collider =
            self.collider_set
                .insert_with_parent(collider, body, &mut self.rigid_body_set);

        let handles = PlayerHandles { body, collider };
        self.player = Some(handles);
        handles
    }

    pub fn player_handles(&self) -> Option<PlayerHandles> {
        self.player
    }

    /// Borrow the player's body through the core's port. `None` before
    /// [`PhysicsWorld::spawn_player`].
    pub fn player_body(&mut self) -> Option<PlayerBody<'_>> {
        let handles = self.player?;
        Some(PlayerBody {
            world: self,
            handles,
        })
    }

    /// Mirror one gameplay change into the simulation.
    pub fn apply_change(&mut self, change: &EntityChange) {
        match *change {
            EntityChange::Spawned {
                entity,
                kind,
                position,
                size,
            } => self.add_entity_body(entity, kind, position, size),
            EntityChange::Moved { entity, position } => {
                if let Some(mirror) = self.entity_bodies.get(&entity) {
                    if let Some(body) = self.rigid_body_set.get_mut(mirror.body) {
                        if body.is_kinematic() {
                            body.set_next_kinematic_translation(vector![
                                position.x, position.y, position.z
                            ]);
                        }
                    }
                }
            }
            EntityChange::Despawned { entity } => {
                if let Some(mirror) = self.entity_bodies.remove(&entity) {
                    self.collider_to_entity.remove(&mirror.collider);
                    self.active_triggers.remove(&mirror.collider);
                    self.contacts.retain(|e| *e != entity);
                    self.remove_body(mirror.body);
                }
            }
        }
    }

    pub fn apply_changes(&mut self, changes: &[EntityChange]) {
        for change in changes {
            self.apply_change(change);
        }
    }

    fn add_entity_body(&mut self, entity: hecs::Entity, kind: EntityKind, position: Vec3, size: Vec3) {
        let builder = match kind {
            // Projectiles are resolved by the core's broad phase
            EntityKind::Projectile => return,
            EntityKind::Enemy => RigidBodyBuilder::kinematic_position_based(),
            _ => RigidBodyBuilder::fixed(),
        };
        let rb = builder
            .translation(vector![position.x, position.y, position.z])
            .build();
        let body = self.rigid_body_set.insert(rb);

        let half = size * 0.5;
        let collider = ColliderBuilder::cuboid(half.x, half.y, half.z)
            .friction(self.settings.platform_friction)
            .restitution(self.settings.restitution)
            .sensor(kind.is_trigger())
            .build();
        let collider =
            self.collider_set
                .insert_with_parent(collider, body, &mut self.rigid_body_set);

        self.entity_bodies.insert(
            entity,
            EntityBody {
                body,
                collider,
                kind,
            },
        );
        self.collider_to_entity.insert(collider, entity);
    }

    pub fn entity_body(&self, entity: hecs::Entity) -> Option<EntityBody> {
        self.entity_bodies.get(&entity).copied()
    }

    pub fn entity_count(&self) -> usize {
        self.entity_bodies.len()
    }

    /// Step the physics simulation and record trigger volumes the player
    /// started overlapping.
    pub fn step(&mut self, dt: f32) {
        self.integration_params.dt = dt;
        let gravity = vector![self.gravity.x, self.gravity.y, self.gravity.z];

        self.physics_pipeline.step(
            &gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        let Some(player) = self.player else {
            return;
        };

        let mut current = HashSet::new();
        for (c1, c2, intersecting) in self.narrow_phase.intersection_pairs() {
            if !intersecting {
                continue;
            }
            let other = if c1 == player.collider {
                c2
            } else if c2 == player.collider {
                c1
            } else {
                continue;
            };
            current.insert(other);

            // Only report pairs that were not overlapping last step
            if !self.active_triggers.contains(&other) {
                if let Some(&entity) = self.collider_to_entity.get(&other) {
                    self.contacts.push(entity);
                }
            }
        }
        self.active_triggers = current;
    }

    /// Take the contacts started since the last call.
    pub fn drain_contacts(&mut self) -> Vec<hecs::Entity> {
        std::mem::take(&mut self.contacts)
    }

    /// Cast a ray that ignores sensors and, optionally, one body.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude: Option<RigidBodyHandle>,
    ) -> Option<GroundHit> {
        let dir = direction.normalize_or_zero();
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![dir.x, dir.y, dir.z],
        );
        let mut filter = QueryFilter::default().exclude_sensors();
        if let Some(body) = exclude {
            filter = filter.exclude_rigid_body(body);
        }

        let (_, intersection) = self.query_pipeline.cast_ray_and_get_normal(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            filter,
        )?;
        Some(GroundHit {
            distance: intersection.time_of_impact,
            normal: Vec3::new(
                intersection.normal.x,
                intersection.normal.y,
                intersection.normal.z,
            ),
        })
    }

    /// Remove a body and its colliders.
    pub fn remove_body(&mut self, rb_handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            rb_handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}

/// The player's rigid body seen through [`RigidBodyPort`].
pub struct PlayerBody<'a> {
    world: &'a mut PhysicsWorld,
    handles: PlayerHandles,
}

impl PlayerBody<'_> {
    fn body(&self) -> Option<&RigidBody> {
        self.world.rigid_body_set.get(self.handles.body)
    }

    fn body_mut(&mut self) -> Option<&mut RigidBody> {
        self.world.rigid_body_set.get_mut(self.handles.body)
    }
}

impl RigidBodyPort for PlayerBody<'_> {
    fn position(&self) -> Vec3 {
        self.body()
            .map(|b| {
                let t = b.translation();
                Vec3::new(t.x, t.y, t.z)
            })
            .unwrap_or_default()
    }

    fn velocity(&self) -> Vec3 {
        self.body()
            .map(|b| {
                let v = b.linvel();
                Vec3::new(v.x, v.y, v.z)
            })
            .unwrap_or_default()
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        if let Some(body) = self.body_mut() {
            body.set_linvel(vector![velocity.x, velocity.y, velocity.z], false);
        }
    }

    fn is_sleeping(&self) -> bool {
        self.body().map(|b| b.is_sleeping()).unwrap_or(false)
    }

    fn wake(&mut self) {
        if let Some(body) = self.body_mut() {
            body.wake_up(true);
        }
    }

    fn cast_ground_probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<GroundHit> {
        self.world
            .raycast(origin, direction, max_distance, Some(self.handles.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascent_core::config::{DiagnosticsConfig, MovementConfig};
    use ascent_core::movement::MovementController;

    fn floor(world: &mut PhysicsWorld, ecs: &mut hecs::World) -> hecs::Entity {
        let entity = ecs.spawn(());
        world.apply_change(&EntityChange::Spawned {
            entity,
            kind: EntityKind::Platform,
            position: Vec3::new(0.0, -0.5, 0.0),
            size: Vec3::new(20.0, 1.0, 1.0),
        });
        entity
    }

    #[test]
    fn test_physics_world_creation() {
        let pw = PhysicsWorld::new(&PhysicsConfig::default());
        assert_eq!(pw.rigid_body_set.len(), 0);
        assert_eq!(pw.collider_set.len(), 0);
        assert!(pw.player_handles().is_none());
    }

    #[test]
    fn test_player_settles_on_platform() {
        let mut ecs = hecs::World::new();
        let mut pw = PhysicsWorld::new(&PhysicsConfig::default());
        floor(&mut pw, &mut ecs);
        pw.spawn_player(Vec3::new(0.0, 2.0, 0.0), Vec3::splat(0.9));

        let mut controller = MovementController::new(
            MovementConfig::default(),
            DiagnosticsConfig::default(),
            Vec3::new(0.0, 2.0, 0.0),
            3,
        );
        for _ in 0..200 {
            pw.step(0.02);
            let mut body = pw.player_body().unwrap();
            controller.physics_step(&mut body);
            assert!(body.velocity().y >= -15.0);
        }

        let player = controller.player();
        assert!(player.grounded);
        assert!((player.position.y - 0.45).abs() < 0.05, "y = {}", player.position.y);
        assert!(player.velocity.y.abs() < 1e-3);
        assert_eq!(player.position.z, 0.0);
    }

    #[test]
    fn test_probe_ignores_sensors() {
        let mut ecs = hecs::World::new();
        let mut pw = PhysicsWorld::new(&PhysicsConfig::default());
        let spike = ecs.spawn(());
        pw.apply_change(&EntityChange::Spawned {
            entity: spike,
            kind: EntityKind::Hazard,
            position: Vec3::new(0.0, -0.5, 0.0),
            size: Vec3::new(4.0, 1.0, 1.0),
        });
        pw.spawn_player(Vec3::new(0.0, 0.45, 0.0), Vec3::splat(0.9));
        pw.step(0.02);
        let body = pw.player_body().unwrap();
        assert!(body.cast_ground_probe(body.position(), Vec3::NEG_Y, 0.55).is_none());
    }

    #[test]
    fn test_trigger_contact_reported_once() {
        let mut ecs = hecs::World::new();
        let mut pw = PhysicsWorld::new(&PhysicsConfig::default());
        floor(&mut pw, &mut ecs);
        let pickup = ecs.spawn(());
        pw.apply_change(&EntityChange::Spawned {
            entity: pickup,
            kind: EntityKind::Pickup(ascent_core::entities::PickupKind::ExtraLife),
            position: Vec3::new(0.0, 0.5, 0.0),
            size: Vec3::splat(0.6),
        });
        pw.spawn_player(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.9));

        let mut seen = Vec::new();
        for _ in 0..10 {
            pw.step(0.02);
            seen.extend(pw.drain_contacts());
        }
        assert_eq!(seen, vec![pickup]);
    }

    #[test]
    fn test_despawn_removes_collider() {
        let mut ecs = hecs::World::new();
        let mut pw = PhysicsWorld::new(&PhysicsConfig::default());
        let entity = floor(&mut pw, &mut ecs);
        assert_eq!(pw.collider_set.len(), 1);
        pw.apply_change(&EntityChange::Despawned { entity });
        assert_eq!(pw.collider_set.len(), 0);
        assert_eq!(pw.entity_count(), 0);
        assert!(pw.entity_body(entity).is_none());
    }

    #[test]
    fn test_enemy_moves_kinematically() {
        let mut ecs = hecs::World::new();
        let mut pw = PhysicsWorld::new(&PhysicsConfig::default());
        let enemy = ecs.spawn(());
        pw.apply_change(&EntityChange::Spawned {
            entity: enemy,
            kind: EntityKind::Enemy,
            position: Vec3::new(20.0, 1.0, 0.0),
            size: Vec3::ONE,
        });
        pw.apply_change(&EntityChange::Moved {
            entity: enemy,
            position: Vec3::new(21.0, 1.0, 0.0),
        });
        pw.step(0.02);
        let handle = pw.entity_body(enemy).unwrap().body;
        let t = pw.rigid_body_set[handle].translation();
        assert!((t.x - 21.0).abs() < 1e-4);
        // No gravity on kinematic bodies
        assert!((t.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_projectiles_are_not_mirrored() {
        let mut ecs = hecs::World::new();
        let mut pw = PhysicsWorld::new(&PhysicsConfig::default());
        pw.apply_change(&EntityChange::Spawned {
            entity: ecs.spawn(()),
            kind: EntityKind::Projectile,
            position: Vec3::ZERO,
            size: Vec3::ONE,
        });
        assert_eq!(pw.entity_count(), 0);
    }
}
