//! Types, aliases and helper operations for doing math with `ultraviolet`.
//!
//! Points use the screen convention of the engine: x grows to the right and y grows downward.
use std::f32::consts::PI;
pub use ultraviolet as uv;

use crate::transform::TransformKey;

pub type Vec2 = uv::Vec2;
pub type Vec3 = uv::Vec3;
/// 3x3 affine matrix. Points are treated as homogeneous column vectors with w = 1.
pub type Mat3 = uv::Mat3;

/// An angle in either degrees or radians.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Angle {
    Rad(f32),
    Deg(f32),
}
impl Angle {
    /// Get the angle as degrees.
    #[inline]
    pub fn deg(&self) -> f32 {
        match self {
            Angle::Rad(rad) => rad * 180.0 / PI,
            Angle::Deg(deg) => *deg,
        }
    }

    /// Get the angle as radians.
    #[inline]
    pub fn rad(&self) -> f32 {
        match self {
            Angle::Rad(rad) => *rad,
            Angle::Deg(deg) => deg * PI / 180.0,
        }
    }
}
impl Default for Angle {
    fn default() -> Self {
        Angle::Rad(0.0)
    }
}

/// The coordinate space a point is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Space {
    /// Relative to the global origin.
    World,
    /// Relative to the active camera, i.e. the camera transform's local space.
    /// Treated as world space when no camera is set.
    Screen,
    /// Relative to the local frame of a specific transform.
    Local(TransformKey),
}

// Mat3 constructors

/// Build a matrix from its elements in row-major order (`_11, _12, _13, _21, ...`).
#[allow(clippy::too_many_arguments)]
#[inline]
pub fn from_rows(
    m11: f32,
    m12: f32,
    m13: f32,
    m21: f32,
    m22: f32,
    m23: f32,
    m31: f32,
    m32: f32,
    m33: f32,
) -> Mat3 {
    // ultraviolet stores columns
    Mat3::new(
        Vec3::new(m11, m21, m31),
        Vec3::new(m12, m22, m32),
        Vec3::new(m13, m23, m33),
    )
}

#[inline]
pub fn translation(offset: Vec2) -> Mat3 {
    from_rows(
        1.0, 0.0, offset.x, //
        0.0, 1.0, offset.y, //
        0.0, 0.0, 1.0,
    )
}

#[inline]
pub fn rotation(radians: f32) -> Mat3 {
    let (sin, cos) = radians.sin_cos();
    from_rows(
        cos, -sin, 0.0, //
        sin, cos, 0.0, //
        0.0, 0.0, 1.0,
    )
}

#[inline]
pub fn scale(factors: Vec2) -> Mat3 {
    from_rows(
        factors.x, 0.0, 0.0, //
        0.0, factors.y, 0.0, //
        0.0, 0.0, 1.0,
    )
}

/// Inverse of [`scale`]. An axis with zero scale maps to a zero coefficient
/// instead of dividing by zero.
#[inline]
pub fn inverse_scale(factors: Vec2) -> Mat3 {
    let recip = |s: f32| if s == 0.0 { 0.0 } else { 1.0 / s };
    scale(Vec2::new(recip(factors.x), recip(factors.y)))
}

/// Transform a point (w = 1) by an affine matrix.
#[inline]
pub fn transform_point(m: &Mat3, p: Vec2) -> Vec2 {
    let h = *m * Vec3::new(p.x, p.y, 1.0);
    Vec2::new(h.x, h.y)
}

/// Transform a direction (w = 0) by an affine matrix, ignoring translation.
#[inline]
pub fn transform_vector(m: &Mat3, v: Vec2) -> Vec2 {
    let h = *m * Vec3::new(v.x, v.y, 0.0);
    Vec2::new(h.x, h.y)
}

// Vec2 utils

#[inline]
pub fn distance(from: Vec2, to: Vec2) -> f32 {
    (to - from).mag()
}

/// Normalized direction from one point to another.
/// Produces NaN components when the points coincide; see [`try_direction_to`].
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalized()
}

#[inline]
pub fn try_direction_to(from: Vec2, to: Vec2) -> Option<Vec2> {
    try_normalized(to - from)
}

/// Normalize a vector, or `None` if it's too short to have a meaningful direction.
#[inline]
pub fn try_normalized(v: Vec2) -> Option<Vec2> {
    let mag = v.mag();
    if mag > f32::EPSILON && mag.is_finite() {
        Some(v / mag)
    } else {
        None
    }
}

/// Reflect `v` about a surface with the given unit normal.
#[inline]
pub fn reflect(v: Vec2, normal: Vec2) -> Vec2 {
    v - normal * (2.0 * v.dot(normal))
}

/// Arithmetic mean of the given vectors, zero if there are none.
pub fn average(vectors: impl IntoIterator<Item = Vec2>) -> Vec2 {
    let (sum, count) = vectors
        .into_iter()
        .fold((Vec2::zero(), 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        sum
    } else {
        sum / count as f32
    }
}

#[inline]
pub fn is_nan(v: Vec2) -> bool {
    v.x.is_nan() || v.y.is_nan()
}

/// `1.0` for zero and positive values, `-1.0` otherwise.
#[inline]
pub(crate) fn sign(x: f32) -> f32 {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn assert_vec_eq(actual: Vec2, expected: Vec2) {
        assert!(
            (actual - expected).mag() < 1e-4,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    pub(crate) fn assert_mat_eq(actual: Mat3, expected: Mat3) {
        for (a, e) in actual.cols.iter().zip(expected.cols.iter()) {
            assert!(
                (a.x - e.x).abs() < 1e-3 && (a.y - e.y).abs() < 1e-3 && (a.z - e.z).abs() < 1e-3,
                "expected {:?}, got {:?}",
                expected,
                actual
            );
        }
    }

    #[test]
    fn angle_conversions() {
        assert!((Angle::Deg(180.0).rad() - PI).abs() < 1e-6);
        assert!((Angle::Rad(PI / 2.0).deg() - 90.0).abs() < 1e-4);
        assert_eq!(Angle::default().rad(), 0.0);
    }

    #[test]
    fn row_major_layout() {
        let m = translation(Vec2::new(3.0, -2.0));
        assert_eq!(m.cols[2], Vec3::new(3.0, -2.0, 1.0));
        assert_vec_eq(transform_point(&m, Vec2::new(1.0, 1.0)), Vec2::new(4.0, -1.0));
        // directions ignore translation
        assert_vec_eq(transform_vector(&m, Vec2::new(1.0, 1.0)), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn composition_order() {
        // translate after rotating: the rightmost factor is applied first
        let m = translation(Vec2::new(10.0, 0.0)) * rotation(PI / 2.0);
        assert_vec_eq(transform_point(&m, Vec2::new(1.0, 0.0)), Vec2::new(10.0, 1.0));
        assert_mat_eq(Mat3::identity() * m, m);
    }

    #[test]
    fn zero_scale_inverse_collapses() {
        let inv = inverse_scale(Vec2::new(0.0, 4.0));
        assert_vec_eq(transform_point(&inv, Vec2::new(5.0, 8.0)), Vec2::new(0.0, 2.0));
    }

    #[test]
    fn reflect_and_directions() {
        assert_vec_eq(
            reflect(Vec2::new(3.0, 4.0), Vec2::new(0.0, -1.0)),
            Vec2::new(3.0, -4.0),
        );
        assert_vec_eq(
            direction_to(Vec2::new(1.0, 1.0), Vec2::new(1.0, 5.0)),
            Vec2::new(0.0, 1.0),
        );
        assert!((distance(Vec2::zero(), Vec2::new(3.0, 4.0)) - 5.0).abs() < 1e-6);
        assert!(is_nan(direction_to(Vec2::zero(), Vec2::zero())));
        assert!(try_direction_to(Vec2::zero(), Vec2::zero()).is_none());
    }

    #[test]
    fn average_of_opposites_is_zero() {
        assert_eq!(average(std::iter::empty()), Vec2::zero());
        let avg = average([Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0)]);
        assert_eq!(avg, Vec2::zero());
        assert!(is_nan(avg.normalized()));
    }
}
