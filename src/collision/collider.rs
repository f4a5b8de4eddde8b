use super::shape::{Circle, Rect, Shape};
use crate::{
    entity_set::EntityKey,
    math::{Mat3, Vec2},
};

/// A component that allows a game object to collide with others.
///
/// The shape is defined in the local space of the owning entity's transform
/// and projected into world space on demand.
#[derive(Clone, Copy, Debug)]
pub struct Collider {
    pub shape: ColliderShape,
    pub(crate) entity: EntityKey,
}

/// The physical shape of a collider in its owner's local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColliderShape {
    Circle { local_center: Vec2, radius: f32 },
    /// `local_position` is the top-left corner of the rectangle.
    Rect { local_position: Vec2, size: Vec2 },
}

/// Which variant of [`ColliderShape`] a collider has.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColliderType {
    Circle,
    Rect,
}

impl ColliderShape {
    #[inline]
    pub fn ty(&self) -> ColliderType {
        match self {
            ColliderShape::Circle { .. } => ColliderType::Circle,
            ColliderShape::Rect { .. } => ColliderType::Rect,
        }
    }

    /// Project the shape into world space with the owner's local-to-world matrix.
    pub fn world_shape(&self, local_to_world: &Mat3) -> Shape {
        match *self {
            ColliderShape::Circle {
                local_center,
                radius,
            } => Shape::Circle(Circle::new(local_center, radius).transformed(local_to_world)),
            ColliderShape::Rect {
                local_position,
                size,
            } => Shape::Rect(Rect::new(local_position, size).transformed(local_to_world)),
        }
    }
}

impl Collider {
    /// The entity this collider belongs to.
    #[inline]
    pub fn entity(&self) -> EntityKey {
        self.entity
    }

    #[inline]
    pub fn ty(&self) -> ColliderType {
        self.shape.ty()
    }
}
