//! Collision detection and positional resolution.

pub mod broadphase;
pub mod collider;
pub mod narrowphase;
pub mod resolver;
pub mod shape;

pub use broadphase::{BroadPhase, BruteForce};
pub use collider::{Collider, ColliderShape, ColliderType};
pub use narrowphase::{detect, CollisionData, Contact};
pub use resolver::{CollisionResolver, Resolution, ResolverParams};
pub use shape::{Circle, Rect, Shape};
