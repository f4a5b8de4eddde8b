use crate::{collision::Collider, physics::Body, transform::TransformKey};

use thunderdome as td;

/// Key type to look up an entity stored in an [`EntitySet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityKey(pub(crate) td::Index);

impl EntityKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    /// Useful for creating your own mappings from entities to other things.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Key type to look up a body stored in an [`EntitySet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyKey(pub(crate) td::Index);

impl BodyKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Key type to look up a collider stored in an [`EntitySet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColliderKey(pub(crate) td::Index);

impl ColliderKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// A named game object. Everything it's made of is referred to by key.
#[derive(Clone, Debug)]
pub struct Entity {
    pub name: String,
    pub tags: Vec<String>,
    pub transform: TransformKey,
    pub(crate) body: Option<BodyKey>,
    pub(crate) colliders: Vec<ColliderKey>,
}

impl Entity {
    #[inline]
    pub fn body(&self) -> Option<BodyKey> {
        self.body
    }

    #[inline]
    pub fn colliders(&self) -> &[ColliderKey] {
        &self.colliders
    }

    /// Tags are compared case-insensitively.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Storage for entities and the bodies and colliders attached to them.
///
/// Bodies and colliders are only reachable through their owning entity's keys
/// and die with it; the collision and physics passes only ever see these lists.
#[derive(Default)]
pub struct EntitySet {
    pub(crate) entities: td::Arena<Entity>,
    pub(crate) bodies: td::Arena<Body>,
    pub(crate) colliders: td::Arena<Collider>,
}

impl EntitySet {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Access an [`Entity`] if it still exists.
    #[inline]
    pub fn get(&self, entity: EntityKey) -> Option<&Entity> {
        self.entities.get(entity.0)
    }

    #[inline]
    pub fn get_mut(&mut self, entity: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(entity.0)
    }

    /// Access a [`Body`] if it still exists.
    #[inline]
    pub fn get_body(&self, body: BodyKey) -> Option<&Body> {
        self.bodies.get(body.0)
    }

    #[inline]
    pub fn get_body_mut(&mut self, body: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(body.0)
    }

    /// Access a [`Collider`] if it still exists.
    #[inline]
    pub fn get_collider(&self, coll: ColliderKey) -> Option<&Collider> {
        self.colliders.get(coll.0)
    }

    #[inline]
    pub fn get_collider_mut(&mut self, coll: ColliderKey) -> Option<&mut Collider> {
        self.colliders.get_mut(coll.0)
    }

    /// The body of the entity owning the given collider, if it has one.
    #[inline]
    pub fn collider_body(&self, coll: ColliderKey) -> Option<BodyKey> {
        let owner = self.colliders.get(coll.0)?.entity;
        self.entities.get(owner.0)?.body
    }

    /// The transform of the entity owning the given collider.
    #[inline]
    pub fn collider_transform(&self, coll: ColliderKey) -> Option<TransformKey> {
        let owner = self.colliders.get(coll.0)?.entity;
        Some(self.entities.get(owner.0)?.transform)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn iter(&self) -> impl '_ + Iterator<Item = (EntityKey, &Entity)> {
        self.entities.iter().map(|(k, e)| (EntityKey(k), e))
    }

    pub fn bodies(&self) -> impl '_ + Iterator<Item = (BodyKey, &Body)> {
        self.bodies.iter().map(|(k, b)| (BodyKey(k), b))
    }

    pub fn colliders(&self) -> impl '_ + Iterator<Item = (ColliderKey, &Collider)> {
        self.colliders.iter().map(|(k, c)| (ColliderKey(k), c))
    }

    pub(crate) fn insert(&mut self, entity: Entity) -> EntityKey {
        EntityKey(self.entities.insert(entity))
    }

    /// Attach a body to an entity. A body it had before is dropped.
    pub(crate) fn attach_body(&mut self, entity: EntityKey, body: Body) -> Option<BodyKey> {
        if !self.entities.contains(entity.0) {
            return None;
        }
        let key = BodyKey(self.bodies.insert(body));
        if let Some(old) = self.entities[entity.0].body.replace(key) {
            self.bodies.remove(old.0);
        }
        Some(key)
    }

    pub(crate) fn attach_collider(
        &mut self,
        entity: EntityKey,
        shape: crate::collision::ColliderShape,
    ) -> Option<ColliderKey> {
        if !self.entities.contains(entity.0) {
            return None;
        }
        let key = ColliderKey(self.colliders.insert(Collider { shape, entity }));
        self.entities[entity.0].colliders.push(key);
        Some(key)
    }

    /// Remove an entity together with its body and colliders.
    pub(crate) fn remove(&mut self, entity: EntityKey) -> Option<Entity> {
        let removed = self.entities.remove(entity.0)?;
        if let Some(body) = removed.body {
            self.bodies.remove(body.0);
        }
        for coll in &removed.colliders {
            self.colliders.remove(coll.0);
        }
        Some(removed)
    }

    /// Detach a collider from its entity and drop it.
    pub(crate) fn remove_collider(&mut self, coll: ColliderKey) -> Option<Collider> {
        let removed = self.colliders.remove(coll.0)?;
        if let Some(owner) = self.entities.get_mut(removed.entity.0) {
            owner.colliders.retain(|c| *c != coll);
        }
        Some(removed)
    }
}
