use crate::math::Vec2;

/// A (possibly) position-dependent acceleration that the integrator
/// applies to every active body each step.
pub trait ForceField {
    fn value_at(&self, position: Vec2) -> Vec2;
}

/// A field with no effect.
pub struct NoneField;
impl ForceField for NoneField {
    fn value_at(&self, _: Vec2) -> Vec2 {
        Vec2::zero()
    }
}

/// Constant gravity over all of space.
#[derive(Clone, Copy, Debug)]
pub struct Gravity(pub Vec2);
impl ForceField for Gravity {
    fn value_at(&self, _pos: Vec2) -> Vec2 {
        self.0
    }
}

impl Default for Gravity {
    /// Downward in screen coordinates, 500 units per second squared.
    fn default() -> Self {
        Gravity(Vec2::new(0.0, 500.0))
    }
}
