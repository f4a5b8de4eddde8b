//! Integration of body motion.

use crate::{entity_set::EntitySet, transform::TransformTree};

pub mod body;
pub use body::{Body, BodyError};

pub mod forcefield;
pub use forcefield::{ForceField, Gravity, NoneField};

/// Move every active body by one semi-implicit Euler step:
/// drag, then the force field's acceleration, then position.
///
/// Bodies flagged as resting are skipped entirely.
pub fn integrate(
    entities: &mut EntitySet,
    transforms: &mut TransformTree,
    forcefield: &impl ForceField,
    dt: f32,
) {
    let EntitySet {
        entities, bodies, ..
    } = entities;
    for (_, entity) in entities.iter() {
        let Some(body) = entity.body.and_then(|b| bodies.get_mut(b.0)) else {
            continue;
        };
        if body.resting {
            continue;
        }
        let Some(position) = transforms.position(entity.transform) else {
            log::warn!("Entity {:?} has a body but no transform", entity.name);
            continue;
        };
        let displacement = body.step(forcefield.value_at(position), dt);
        if transforms.translate(entity.transform, displacement).is_err() {
            log::warn!("Entity {:?} lost its transform during integration", entity.name);
        }
    }
}
