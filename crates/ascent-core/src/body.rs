//! Physics backend abstraction for the player body.
//!
//! The movement controller never talks to a physics engine directly. It reads
//! and writes the player's rigid body through [`RigidBodyPort`]; the client
//! crate implements it on top of Rapier, tests implement it with scripted
//! doubles.

use glam::Vec3;

/// Result of a grounding probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    /// Distance from the probe origin to the hit point.
    pub distance: f32,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

/// What the core needs from the rigid body it steers.
///
/// Reads reflect the most recently completed integration; writes take effect
/// before the next one.
pub trait RigidBodyPort {
    /// Current center of mass of the body.
    fn position(&self) -> Vec3;

    fn velocity(&self) -> Vec3;

    fn set_velocity(&mut self, velocity: Vec3);

    fn is_sleeping(&self) -> bool;

    fn wake(&mut self);

    /// Cast a ray against collidable, non-trigger geometry, ignoring the body
    /// itself. `direction` is expected to be normalized.
    fn cast_ground_probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<GroundHit>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Scripted body: the probe result is whatever the test last set, and
    /// velocity writes are stored verbatim.
    #[derive(Debug, Clone)]
    pub struct FakeBody {
        pub position: Vec3,
        pub velocity: Vec3,
        pub sleeping: bool,
        pub ground: Option<GroundHit>,
        pub wake_calls: u32,
    }

    impl FakeBody {
        pub fn grounded_at(position: Vec3) -> Self {
            Self {
                position,
                velocity: Vec3::ZERO,
                sleeping: false,
                ground: Some(GroundHit {
                    distance: 0.45,
                    normal: Vec3::Y,
                }),
                wake_calls: 0,
            }
        }

        pub fn airborne_at(position: Vec3) -> Self {
            Self {
                ground: None,
                ..Self::grounded_at(position)
            }
        }

        /// Crude explicit-Euler integration standing in for the engine.
        pub fn integrate(&mut self, gravity: f32, dt: f32) {
            if self.ground.is_none() {
                self.velocity.y += gravity * dt;
            } else if self.velocity.y < 0.0 {
                self.velocity.y = 0.0;
            }
            self.position += self.velocity * dt;
        }
    }

    impl RigidBodyPort for FakeBody {
        fn position(&self) -> Vec3 {
            self.position
        }

        fn velocity(&self) -> Vec3 {
            self.velocity
        }

        fn set_velocity(&mut self, velocity: Vec3) {
            self.velocity = velocity;
        }

        fn is_sleeping(&self) -> bool {
            self.sleeping
        }

        fn wake(&mut self) {
            self.sleeping = false;
            self.wake_calls += 1;
        }

        fn cast_ground_probe(&self, _origin: Vec3, _direction: Vec3, max_distance: f32) -> Option<GroundHit> {
            self.ground.filter(|hit| hit.distance <= max_distance)
        }
    }
}
