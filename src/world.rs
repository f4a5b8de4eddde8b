//! The simulation context that owns everything in a scene.

use crate::{
    collision::{Collider, ColliderShape, CollisionResolver, Resolution, ResolverParams, Shape},
    entity_set::{BodyKey, ColliderKey, Entity, EntityKey, EntitySet},
    math::{self as m, Angle, Mat3, Space, Vec2},
    physics::{self, Body, BodyError, Gravity},
    transform::{Transform, TransformError, TransformKey, TransformTree},
};

/// Errors from operations on a [`World`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    #[error("An entity named {0:?} already exists")]
    DuplicateName(String),
    #[error("The entity does not exist (it may have been destroyed)")]
    MissingEntity,
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Body(#[from] BodyError),
}

/// Parameters of a [`World`] that can be tweaked or loaded from a config file.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct WorldParams {
    /// Constant acceleration applied to every active body.
    pub gravity: Vec2,
    pub resolver: ResolverParams,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            gravity: Gravity::default().0,
            resolver: ResolverParams::default(),
        }
    }
}

impl WorldParams {
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_resolver(mut self, resolver: ResolverParams) -> Self {
        self.resolver = resolver;
        self
    }
}

/// Entities with their transforms, bodies and colliders,
/// and the systems that step them forward in time.
///
/// A driver calls [`update`][Self::update] once per frame
/// and reads positions back from the world afterwards.
pub struct World {
    params: WorldParams,
    transforms: TransformTree,
    entities: EntitySet,
    resolver: CollisionResolver,
    camera: Option<EntityKey>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldParams::default())
    }
}

impl World {
    pub fn new(params: WorldParams) -> Self {
        Self {
            params,
            transforms: TransformTree::new(),
            entities: EntitySet::new(),
            resolver: CollisionResolver::new(params.resolver),
            camera: None,
        }
    }

    #[inline]
    pub fn params(&self) -> &WorldParams {
        &self.params
    }

    pub fn set_params(&mut self, params: WorldParams) {
        self.resolver.set_params(params.resolver);
        self.params = params;
    }

    //
    // entities
    //

    /// Create an entity at the origin.
    pub fn spawn(&mut self, name: impl Into<String>) -> Result<EntityKey, WorldError> {
        self.spawn_with(name, Transform::new())
    }

    /// Create an entity with the given transform as a root node.
    pub fn spawn_with(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<EntityKey, WorldError> {
        let name = name.into();
        if self.find_by_name(&name).is_some() {
            return Err(WorldError::DuplicateName(name));
        }
        let transform = self.transforms.insert(transform);
        Ok(self.entities.insert(Entity {
            name,
            tags: Vec::new(),
            transform,
            body: None,
            colliders: Vec::new(),
        }))
    }

    pub fn add_tag(
        &mut self,
        entity: EntityKey,
        tag: impl Into<String>,
    ) -> Result<(), WorldError> {
        let entity = self
            .entities
            .get_mut(entity)
            .ok_or(WorldError::MissingEntity)?;
        let tag = tag.into();
        if !entity.has_tag(&tag) {
            entity.tags.push(tag);
        }
        Ok(())
    }

    #[inline]
    pub fn entity(&self, entity: EntityKey) -> Option<&Entity> {
        self.entities.get(entity)
    }

    #[inline]
    pub fn entities(&self) -> &EntitySet {
        &self.entities
    }

    pub fn find_by_name(&self, name: &str) -> Option<EntityKey> {
        self.entities
            .iter()
            .find(|(_, e)| e.name == name)
            .map(|(k, _)| k)
    }

    pub fn find_by_tag<'a>(&'a self, tag: &'a str) -> impl 'a + Iterator<Item = EntityKey> {
        self.entities
            .iter()
            .filter(move |(_, e)| e.has_tag(tag))
            .map(|(k, _)| k)
    }

    /// Remove an entity along with its transform, body and colliders.
    /// Transforms parented to it become root nodes.
    pub fn destroy(&mut self, entity: EntityKey) -> Result<(), WorldError> {
        let removed = self
            .entities
            .remove(entity)
            .ok_or(WorldError::MissingEntity)?;
        self.transforms.remove(removed.transform);
        if self.camera == Some(entity) {
            self.camera = None;
        }
        Ok(())
    }

    //
    // components
    //

    /// Give an entity a body, replacing any it had before.
    pub fn attach_body(&mut self, entity: EntityKey, body: Body) -> Result<BodyKey, WorldError> {
        self.entities
            .attach_body(entity, body)
            .ok_or(WorldError::MissingEntity)
    }

    /// Attach a circle collider positioned in the entity's local space.
    pub fn attach_circle_collider(
        &mut self,
        entity: EntityKey,
        local_center: Vec2,
        radius: f32,
    ) -> Result<ColliderKey, WorldError> {
        self.attach_collider(
            entity,
            ColliderShape::Circle {
                local_center,
                radius,
            },
        )
    }

    /// Attach a rectangle collider with its top-left corner in the entity's local space.
    pub fn attach_rect_collider(
        &mut self,
        entity: EntityKey,
        local_position: Vec2,
        size: Vec2,
    ) -> Result<ColliderKey, WorldError> {
        self.attach_collider(
            entity,
            ColliderShape::Rect {
                local_position,
                size,
            },
        )
    }

    pub fn attach_collider(
        &mut self,
        entity: EntityKey,
        shape: ColliderShape,
    ) -> Result<ColliderKey, WorldError> {
        self.entities
            .attach_collider(entity, shape)
            .ok_or(WorldError::MissingEntity)
    }

    pub fn remove_collider(&mut self, collider: ColliderKey) -> Option<Collider> {
        self.entities.remove_collider(collider)
    }

    #[inline]
    pub fn body(&self, entity: EntityKey) -> Option<&Body> {
        let key = self.entities.get(entity)?.body?;
        self.entities.get_body(key)
    }

    #[inline]
    pub fn body_mut(&mut self, entity: EntityKey) -> Option<&mut Body> {
        let key = self.entities.get(entity)?.body?;
        self.entities.get_body_mut(key)
    }

    /// Change the drag of an entity's body.
    pub fn set_drag(&mut self, entity: EntityKey, drag: f32) -> Result<(), WorldError> {
        let body = self.body_mut(entity).ok_or(WorldError::MissingEntity)?;
        body.set_drag(drag)?;
        Ok(())
    }

    /// All bodies together with the entity that owns them.
    pub fn bodies(&self) -> impl '_ + Iterator<Item = (EntityKey, &Body)> {
        self.entities.iter().filter_map(move |(key, e)| {
            let body = self.entities.get_body(e.body?)?;
            Some((key, body))
        })
    }

    /// All colliders along with their current shape in world space.
    pub fn colliders(&self) -> impl '_ + Iterator<Item = (ColliderKey, &Collider, Shape)> {
        self.entities.colliders().filter_map(move |(key, coll)| {
            let transform = self.entities.get(coll.entity)?.transform;
            let matrix = self.transforms.local_to_world(transform)?;
            Some((key, coll, coll.shape.world_shape(&matrix)))
        })
    }

    //
    // transforms
    //

    #[inline]
    pub fn transforms(&self) -> &TransformTree {
        &self.transforms
    }

    #[inline]
    pub fn transform(&self, entity: EntityKey) -> Option<&Transform> {
        self.transforms.get(self.entities.get(entity)?.transform)
    }

    #[inline]
    pub fn transform_mut(&mut self, entity: EntityKey) -> Option<&mut Transform> {
        let key = self.entities.get(entity)?.transform;
        self.transforms.get_mut(key)
    }

    /// Make one entity's transform a child of another's, or a root with `None`.
    pub fn set_parent(
        &mut self,
        child: EntityKey,
        parent: Option<EntityKey>,
    ) -> Result<(), WorldError> {
        let child = self.transform_key(child)?;
        let parent = parent.map(|p| self.transform_key(p)).transpose()?;
        self.transforms.set_parent(child, parent)?;
        Ok(())
    }

    /// The position of an entity's pivot, expressed in the given space.
    pub fn position(&self, entity: EntityKey, space: Space) -> Result<Vec2, WorldError> {
        let key = self.transform_key(entity)?;
        let world = self
            .transforms
            .position(key)
            .ok_or(TransformError::MissingNode)?;
        self.from_world(world, space)
    }

    /// Move an entity so that its pivot is at a position given in some space.
    pub fn set_position(
        &mut self,
        entity: EntityKey,
        position: Vec2,
        space: Space,
    ) -> Result<(), WorldError> {
        let key = self.transform_key(entity)?;
        let world = self.to_world(position, space)?;
        self.transforms.set_position(key, world)?;
        Ok(())
    }

    /// The world rotation of an entity.
    pub fn rotation(&self, entity: EntityKey) -> Option<Angle> {
        self.transforms.rotation(self.entities.get(entity)?.transform)
    }

    fn transform_key(&self, entity: EntityKey) -> Result<TransformKey, WorldError> {
        self.entities
            .get(entity)
            .map(|e| e.transform)
            .ok_or(WorldError::MissingEntity)
    }

    //
    // spaces
    //

    /// Use an entity's transform as the camera that defines [`Space::Screen`].
    pub fn set_camera(&mut self, camera: Option<EntityKey>) -> Result<(), WorldError> {
        if let Some(cam) = camera {
            self.transform_key(cam)?;
        }
        self.camera = camera;
        Ok(())
    }

    #[inline]
    pub fn camera(&self) -> Option<EntityKey> {
        self.camera
    }

    fn space_to_world(&self, space: Space) -> Result<Mat3, WorldError> {
        let key = match space {
            Space::World => return Ok(Mat3::identity()),
            Space::Screen => match self.camera {
                Some(cam) => self.transform_key(cam)?,
                None => return Ok(Mat3::identity()),
            },
            Space::Local(key) => key,
        };
        Ok(self
            .transforms
            .local_to_world(key)
            .ok_or(TransformError::MissingNode)?)
    }

    fn world_to_space(&self, space: Space) -> Result<Mat3, WorldError> {
        let key = match space {
            Space::World => return Ok(Mat3::identity()),
            Space::Screen => match self.camera {
                Some(cam) => self.transform_key(cam)?,
                None => return Ok(Mat3::identity()),
            },
            Space::Local(key) => key,
        };
        Ok(self
            .transforms
            .world_to_local(key)
            .ok_or(TransformError::MissingNode)?)
    }

    /// Convert a point in the given space into world space.
    pub fn to_world(&self, point: Vec2, space: Space) -> Result<Vec2, WorldError> {
        Ok(m::transform_point(&self.space_to_world(space)?, point))
    }

    /// Convert a world-space point into the given space.
    pub fn from_world(&self, point: Vec2, space: Space) -> Result<Vec2, WorldError> {
        Ok(m::transform_point(&self.world_to_space(space)?, point))
    }

    /// Convert a point between any two spaces.
    pub fn transform_point(&self, point: Vec2, from: Space, to: Space) -> Result<Vec2, WorldError> {
        self.from_world(self.to_world(point, from)?, to)
    }

    /// Entities that have a collider containing the given point.
    pub fn point_cast(&self, point: Vec2, space: Space) -> Result<Vec<EntityKey>, WorldError> {
        let point = self.to_world(point, space)?;
        let mut hits: Vec<EntityKey> = Vec::new();
        for (_, coll, shape) in self.colliders() {
            if shape.contains(point) && !hits.contains(&coll.entity) {
                hits.push(coll.entity);
            }
        }
        Ok(hits)
    }

    //
    // simulation
    //

    /// Run one simulation step: resolve collisions until nothing overlaps,
    /// then integrate bodies forward by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Resolution {
        let resolution = self
            .resolver
            .resolve(&mut self.entities, &mut self.transforms, dt);
        physics::integrate(
            &mut self.entities,
            &mut self.transforms,
            &Gravity(self.params.gravity),
            dt,
        );
        resolution
    }
}
