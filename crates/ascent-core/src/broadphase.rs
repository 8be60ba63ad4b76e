//! Axis-aligned bounding volume registry.
//!
//! A brute-force broad phase kept outside the physics engine. It answers
//! "what would this volume overlap if it moved here" queries for custom
//! gameplay checks (projectile hits). Not used by the movement path.

use std::collections::BTreeMap;

use glam::Vec3;

/// Opaque handle into the registry. Handles are issued in increasing order
/// and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundsHandle(pub u32);

/// Classification bits stored alongside a volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColliderFlags {
    pub player: bool,
    pub lethal: bool,
    pub enemy: bool,
    pub projectile: bool,
}

impl ColliderFlags {
    pub const NONE: Self = Self {
        player: false,
        lethal: false,
        enemy: false,
        projectile: false,
    };

    pub fn enemy() -> Self {
        Self {
            enemy: true,
            ..Self::NONE
        }
    }

    pub fn projectile() -> Self {
        Self {
            projectile: true,
            ..Self::NONE
        }
    }
}

/// Axis-aligned box stored as center + full size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec3,
    pub size: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    pub fn extents(&self) -> Vec3 {
        self.size * 0.5
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents()
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents()
    }

    /// Touching faces count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        !(a_max.x < b_min.x
            || a_min.x > b_max.x
            || a_max.y < b_min.y
            || a_min.y > b_max.y
            || a_max.z < b_min.z
            || a_min.z > b_max.z)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    bounds: Aabb,
    flags: ColliderFlags,
}

/// Owned registry of bounding volumes. Construct one per level and pass it
/// by reference to whoever needs it.
#[derive(Debug, Default)]
pub struct BroadPhaseRegistry {
    entries: BTreeMap<BoundsHandle, Entry>,
    next_id: u32,
}

impl BroadPhaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, center: Vec3, size: Vec3, flags: ColliderFlags) -> BoundsHandle {
        let handle = BoundsHandle(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            handle,
            Entry {
                bounds: Aabb::new(center, size),
                flags,
            },
        );
        handle
    }

    /// Unknown handles are ignored.
    pub fn update(&mut self, handle: BoundsHandle, center: Vec3, size: Vec3) {
        if let Some(entry) = self.entries.get_mut(&handle) {
            entry.bounds = Aabb::new(center, size);
        }
    }

    pub fn remove(&mut self, handle: BoundsHandle) {
        self.entries.remove(&handle);
    }

    pub fn bounds(&self, handle: BoundsHandle) -> Option<Aabb> {
        self.entries.get(&handle).map(|e| e.bounds)
    }

    pub fn flags(&self, handle: BoundsHandle) -> Option<ColliderFlags> {
        self.entries.get(&handle).map(|e| e.flags)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every other volume that `handle` would overlap if its center moved to
    /// `new_center`, keeping its size. Results come back in registration
    /// order. An unknown handle yields nothing.
    pub fn query_intersections(&self, handle: BoundsHandle, new_center: Vec3) -> Vec<BoundsHandle> {
        let current = match self.entries.get(&handle) {
            Some(entry) => entry,
            None => return Vec::new(),
        };
        let probe = Aabb::new(new_center, current.bounds.size);

        self.entries
            .iter()
            .filter(|(other, entry)| **other != handle && probe.intersects(&entry.bounds))
            .map(|(other, _)| *other)
            .collect()
    }
}
