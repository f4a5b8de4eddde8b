use crate::math::{self as m, Vec2};

/// Speeds below this are considered at rest for the purposes of drag.
const DRAG_SPEED_THRESHOLD: f32 = 0.001;

/// Error when configuring a [`Body`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum BodyError {
    #[error("Drag must be between 0 and 1, got {0}")]
    DragOutOfRange(f32),
}

/// A body is something that moves.
/// Entities without a body are immovable obstacles to the ones that have one.
#[derive(Clone, Copy, Debug)]
pub struct Body {
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Resting bodies are skipped by integration. They can still be pushed by collisions.
    pub resting: bool,
    /// Restitution factor. Not used by the resolver yet, which always conserves speed.
    pub bounciness: f32,
    drag: f32,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            velocity: Vec2::zero(),
            resting: false,
            bounciness: 1.0,
            drag: 0.0,
        }
    }
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the velocity of the body in a builder-like chain.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the drag of the body in a builder-like chain.
    pub fn with_drag(mut self, drag: f32) -> Result<Self, BodyError> {
        self.set_drag(drag)?;
        Ok(self)
    }

    pub fn with_bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = bounciness;
        self
    }

    pub fn resting(mut self) -> Self {
        self.resting = true;
        self
    }

    #[inline]
    pub fn drag(&self) -> f32 {
        self.drag
    }

    /// Set the drag coefficient, which must lie in [0, 1].
    pub fn set_drag(&mut self, drag: f32) -> Result<(), BodyError> {
        if !(0.0..=1.0).contains(&drag) {
            return Err(BodyError::DragOutOfRange(drag));
        }
        self.drag = drag;
        Ok(())
    }

    /// Advance the velocity by one semi-implicit Euler step:
    /// drag first, then the given acceleration.
    /// Returns the displacement to apply to the body's position.
    pub fn step(&mut self, acceleration: Vec2, dt: f32) -> Vec2 {
        let speed = self.velocity.mag();
        if speed > DRAG_SPEED_THRESHOLD && self.drag != 0.0 {
            // drag only ever slows down, it doesn't turn the body around
            let slowdown = (self.drag * dt).min(speed);
            self.velocity -= self.velocity / speed * slowdown;
        }
        self.velocity += acceleration * dt;
        self.velocity * dt
    }

    /// Replace the heading of the velocity while keeping its speed.
    /// A direction that isn't a number stops the body instead.
    pub(crate) fn redirect(&mut self, direction: Vec2) {
        let new_velocity = direction * self.velocity.mag();
        self.velocity = if m::is_nan(new_velocity) {
            Vec2::zero()
        } else {
            new_velocity
        };
    }
}
