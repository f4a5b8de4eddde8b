//! World-space geometric shapes that collision tests operate on.

use crate::math::{self as m, Mat3, Vec2};

/// A circle in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    #[inline]
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether the point lies strictly inside the circle.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        m::distance(self.center, point) < self.radius
    }

    /// Map the circle through an affine matrix. Only the center moves, the radius is kept.
    #[inline]
    pub fn transformed(&self, matrix: &Mat3) -> Self {
        Self::new(m::transform_point(matrix, self.center), self.radius)
    }
}

/// An axis-aligned rectangle in world space,
/// stored as its top-left corner (smallest coordinates) and its size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.position + self.size
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        self.size / 2.0
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.position + self.half_extents()
    }

    /// Whether the point lies inside the rectangle or on its boundary.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// The point in the rectangle closest to the given point.
    #[inline]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        let (min, max) = (self.min(), self.max());
        Vec2::new(point.x.clamp(min.x, max.x), point.y.clamp(min.y, max.y))
    }

    /// Corners in drawing order, starting from the top left and going clockwise.
    pub fn corners(&self) -> [Vec2; 4] {
        let (min, max) = (self.min(), self.max());
        [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)]
    }

    /// Map the rectangle through an affine matrix.
    /// Only the corner moves, the size is kept and the result stays axis-aligned.
    #[inline]
    pub fn transformed(&self, matrix: &Mat3) -> Self {
        Self::new(m::transform_point(matrix, self.position), self.size)
    }
}

/// A shape in world space, one of the supported collider geometries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Rect(Rect),
}

impl Shape {
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        match self {
            Shape::Circle(c) => c.contains(point),
            Shape::Rect(r) => r.contains(point),
        }
    }

    /// The point the shape is positioned around.
    #[inline]
    pub fn center(&self) -> Vec2 {
        match self {
            Shape::Circle(c) => c.center,
            Shape::Rect(r) => r.center(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tests::assert_vec_eq;

    #[test]
    fn rect_queries() {
        let r = Rect::new(Vec2::new(-50.0, 50.0), Vec2::new(100.0, 10.0));
        assert_vec_eq(r.center(), Vec2::new(0.0, 55.0));
        assert_vec_eq(r.half_extents(), Vec2::new(50.0, 5.0));
        assert!(r.contains(Vec2::new(50.0, 60.0)));
        assert!(!r.contains(Vec2::new(50.1, 60.0)));
        assert_vec_eq(r.clamp(Vec2::new(0.0, 0.0)), Vec2::new(0.0, 50.0));
        assert_vec_eq(r.clamp(Vec2::new(-80.0, 99.0)), Vec2::new(-50.0, 60.0));
        itertools::assert_equal(
            r.corners().iter(),
            [
                Vec2::new(-50.0, 50.0),
                Vec2::new(50.0, 50.0),
                Vec2::new(50.0, 60.0),
                Vec2::new(-50.0, 60.0),
            ]
            .iter(),
        );
    }

    #[test]
    fn circle_boundary_is_outside() {
        let c = Circle::new(Vec2::new(1.0, 1.0), 2.0);
        assert!(c.contains(Vec2::new(2.9, 1.0)));
        assert!(!c.contains(Vec2::new(3.0, 1.0)));
        let s = Shape::Circle(c);
        assert_vec_eq(s.center(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn transforms_move_but_do_not_scale() {
        let matrix = m::translation(Vec2::new(5.0, -5.0)) * m::scale(Vec2::new(2.0, 2.0));
        let c = Circle::new(Vec2::new(1.0, 1.0), 3.0).transformed(&matrix);
        assert_vec_eq(c.center, Vec2::new(7.0, -3.0));
        assert_eq!(c.radius, 3.0);
        let r = Rect::new(Vec2::zero(), Vec2::new(4.0, 2.0)).transformed(&matrix);
        assert_vec_eq(r.position, Vec2::new(5.0, -5.0));
        assert_vec_eq(r.size, Vec2::new(4.0, 2.0));
    }
}
