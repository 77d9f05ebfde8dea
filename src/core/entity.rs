//! Transient game objects and the two per-tick passes every game runs over
//! them: movement (integrate, expire, cull off-field) and box collision.

use super::geom::{Aabb, Field, Size, Vec2};

/// Session-unique handle; also the key the presentation sink renders under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EntityId(pub u32);

#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn next_id(&mut self) -> EntityId {
        self.next += 1;
        EntityId(self.next)
    }
}

/// Kinematic body. The bounding box is part of the body, so every entity
/// carries explicit dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub pos: Vec2, // top-left corner
    pub vel: Vec2, // pixels per tick
    pub size: Size,
}

impl Body {
    pub fn new(pos: Vec2, vel: Vec2, size: Size) -> Self {
        Self { pos, vel, size }
    }

    pub fn integrate(&mut self) {
        self.pos += self.vel;
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_origin(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.size.w / 2.0, self.pos.y + self.size.h / 2.0)
    }
}

#[derive(Clone, Debug)]
pub struct Entity<K> {
    pub id: EntityId,
    pub kind: K,
    pub body: Body,
    /// Remaining lifetime in ticks; `None` lives until culled or consumed.
    pub ttl: Option<u32>,
    pub rotation: f64, // degrees
    pub spin: f64,     // degrees per tick
}

impl<K> Entity<K> {
    pub fn new(id: EntityId, kind: K, body: Body) -> Self {
        Self { id, kind, body, ttl: None, rotation: 0.0, spin: 0.0 }
    }

    pub fn with_ttl(mut self, ticks: u32) -> Self {
        self.ttl = Some(ticks);
        self
    }

    pub fn with_spin(mut self, rotation: f64, spin: f64) -> Self {
        self.rotation = rotation;
        self.spin = spin;
        self
    }

    /// One fixed time step: integrate velocity, advance rotation, age.
    pub fn step(&mut self) {
        self.body.integrate();
        self.rotation += self.spin;
        if let Some(t) = self.ttl.as_mut() {
            *t = t.saturating_sub(1);
        }
    }

    pub fn expired(&self) -> bool {
        self.ttl == Some(0)
    }
}

/// Step every entity once, then pull out the ones that expired or left the
/// field by more than `margin`. The removed entities are returned in their
/// original order so the caller can despawn their visuals; culling here never
/// carries gameplay side effects.
pub fn advance_entities<K>(list: &mut Vec<Entity<K>>, field: Field, margin: f64) -> Vec<Entity<K>> {
    for e in list.iter_mut() {
        e.step();
    }
    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(list.len());
    for e in list.drain(..) {
        if e.expired() || field.is_outside(e.body.pos, margin) {
            removed.push(e);
        } else {
            kept.push(e);
        }
    }
    *list = kept;
    removed
}

/// Index of the first entity whose box overlaps `area`.
pub fn first_overlap<K>(area: &Aabb, list: &[Entity<K>]) -> Option<usize> {
    list.iter().position(|e| area.overlaps(&e.body.aabb()))
}
