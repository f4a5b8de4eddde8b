//! A small 2D game simulation core: a transform hierarchy, circle and rectangle colliders,
//! iterative collision resolution and semi-implicit Euler integration.

pub mod clock;
pub use clock::Clock;

pub mod collision;
pub use collision::{
    Circle, Collider, ColliderShape, ColliderType, CollisionData, CollisionResolver, Contact,
    Rect, Resolution, ResolverParams, Shape,
};

pub mod entity_set;
pub use entity_set::{BodyKey, ColliderKey, Entity, EntityKey, EntitySet};

pub mod math;
pub use math::{uv, Angle, Space, Vec2};

pub mod physics;
pub use physics::{forcefield, Body, BodyError, ForceField, Gravity};

pub mod transform;
pub use transform::{Transform, TransformError, TransformKey, TransformTree};

pub mod world;
pub use world::{World, WorldError, WorldParams};
