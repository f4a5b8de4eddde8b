//! Pairwise intersection tests between world-space shapes.

use super::shape::{Circle, Rect, Shape};
use crate::math::{self as m, Vec2};

/// Circles closer to touching than this are not considered overlapping,
/// which avoids jitter between nearly tangent circles.
pub const CIRCLE_OVERLAP_EPSILON: f32 = 0.001;

/// Information about an overlap between two shapes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CollisionData {
    /// Point of contact in world space.
    pub center: Vec2,
    /// Unit normal pointing from the second shape towards the first.
    /// Zero for circle pairs, where the direction to the contact point is used instead.
    pub normal: Vec2,
    /// Displacement that separates the first shape from the second along the axis
    /// of least penetration. Zero for circle pairs.
    pub delta: Vec2,
}

/// A detected overlap between two shapes, in the order they were given to [`detect`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Contact {
    CircleCircle {
        data: CollisionData,
        /// How deep the circles overlap along the line between their centers.
        overlap: f32,
        /// Unit direction from the first circle's center to the second's.
        axis: Vec2,
    },
    RectRect(CollisionData),
    /// A rectangle-circle pair. `data` is always expressed with the rectangle first;
    /// `rect_first` tells whether that matches the order of the checked pair.
    RectCircle {
        data: CollisionData,
        rect_first: bool,
    },
}

impl Contact {
    #[inline]
    pub fn data(&self) -> &CollisionData {
        match self {
            Contact::CircleCircle { data, .. } => data,
            Contact::RectRect(data) => data,
            Contact::RectCircle { data, .. } => data,
        }
    }

    /// The full displacement that would move the first shape of the checked pair
    /// out of the second one. The second shape would move by the negation.
    pub fn separation(&self) -> Vec2 {
        match *self {
            Contact::CircleCircle { overlap, axis, .. } => -axis * overlap,
            Contact::RectRect(data) => data.delta,
            Contact::RectCircle { data, rect_first } => {
                if rect_first {
                    data.delta
                } else {
                    -data.delta
                }
            }
        }
    }

    /// The direction velocities are reflected about.
    ///
    /// For circle pairs this is the direction from a center to the contact point,
    /// which is the same line for both circles.
    pub fn bounce_normal(&self) -> Vec2 {
        match *self {
            Contact::CircleCircle { axis, .. } => axis,
            Contact::RectRect(data) | Contact::RectCircle { data, .. } => data.normal,
        }
    }
}

/// Checks two world-space shapes for intersection.
pub fn detect(a: &Shape, b: &Shape) -> Option<Contact> {
    match (a, b) {
        (Shape::Circle(a), Shape::Circle(b)) => circle_circle(a, b).map(|(data, overlap)| {
            Contact::CircleCircle {
                data,
                overlap,
                axis: circle_axis(a, b),
            }
        }),
        (Shape::Rect(a), Shape::Rect(b)) => rect_rect(a, b).map(Contact::RectRect),
        (Shape::Rect(rect), Shape::Circle(circle)) => {
            rect_circle(rect, circle).map(|data| Contact::RectCircle {
                data,
                rect_first: true,
            })
        }
        (Shape::Circle(circle), Shape::Rect(rect)) => {
            rect_circle(rect, circle).map(|data| Contact::RectCircle {
                data,
                rect_first: false,
            })
        }
    }
}

fn circle_axis(a: &Circle, b: &Circle) -> Vec2 {
    // same position, consider the overlap to be on the x axis
    m::try_direction_to(a.center, b.center).unwrap_or_else(Vec2::unit_x)
}

/// Circle-circle test. Returns the contact and the overlap depth.
///
/// The contact point lies on the line between the centers,
/// `r_a - overlap / 2` away from the first circle's center.
pub fn circle_circle(a: &Circle, b: &Circle) -> Option<(CollisionData, f32)> {
    let overlap = a.radius + b.radius - m::distance(a.center, b.center);
    if overlap <= CIRCLE_OVERLAP_EPSILON {
        return None;
    }
    let center = a.center + circle_axis(a, b) * (a.radius - overlap / 2.0);
    Some((
        CollisionData {
            center,
            ..Default::default()
        },
        overlap,
    ))
}

/// Axis-aligned rectangle test using the minimum translation vector.
///
/// Separation happens along the axis with less penetration (y when they're equal),
/// pushing the first rectangle away from the second.
pub fn rect_rect(a: &Rect, b: &Rect) -> Option<CollisionData> {
    let (ca, cb) = (a.center(), b.center());
    let (ha, hb) = (a.half_extents(), b.half_extents());

    let dx = ca.x - cb.x;
    let px = ha.x + hb.x - dx.abs();
    if px <= 0.0 {
        return None;
    }
    let dy = ca.y - cb.y;
    let py = ha.y + hb.y - dy.abs();
    if py <= 0.0 {
        return None;
    }

    Some(if px < py {
        let sx = m::sign(dx);
        CollisionData {
            center: Vec2::new(cb.x + hb.x * sx, ca.y),
            normal: Vec2::new(sx, 0.0),
            delta: Vec2::new(px * sx, 0.0),
        }
    } else {
        let sy = m::sign(dy);
        CollisionData {
            center: Vec2::new(ca.x, cb.y + hb.y * sy),
            normal: Vec2::new(0.0, sy),
            delta: Vec2::new(0.0, py * sy),
        }
    })
}

/// Rectangle-circle test based on the point of the rectangle closest to the circle's center.
///
/// The result is expressed with the rectangle first: `delta` moves the rectangle away
/// from the circle and `normal` points from the circle towards the rectangle.
pub fn rect_circle(rect: &Rect, circle: &Circle) -> Option<CollisionData> {
    let closest = rect.clamp(circle.center);
    let offset = circle.center - closest;

    // direction the circle has to move in to get out, and how far
    let (out, push, contact) = if offset == Vec2::zero() {
        // the center is inside the rectangle, leave through the nearest edge
        let (min, max) = (rect.min(), rect.max());
        let c = circle.center;
        let exits = [
            (c.x - min.x, Vec2::new(-1.0, 0.0), Vec2::new(min.x, c.y)),
            (max.x - c.x, Vec2::new(1.0, 0.0), Vec2::new(max.x, c.y)),
            (c.y - min.y, Vec2::new(0.0, -1.0), Vec2::new(c.x, min.y)),
            (max.y - c.y, Vec2::new(0.0, 1.0), Vec2::new(c.x, max.y)),
        ];
        let (depth, out, contact) = exits
            .into_iter()
            .fold(exits[0], |best, e| if e.0 < best.0 { e } else { best });
        (out, depth + circle.radius, contact)
    } else {
        if offset.mag() >= circle.radius {
            return None;
        }
        let clamped_x = offset.x != 0.0;
        let clamped_y = offset.y != 0.0;
        // on a corner, the edge the circle is further out from needs the shorter push
        if clamped_x && (!clamped_y || offset.x.abs() >= offset.y.abs()) {
            let sx = m::sign(offset.x);
            (Vec2::new(sx, 0.0), circle.radius - offset.x.abs(), closest)
        } else {
            let sy = m::sign(offset.y);
            (Vec2::new(0.0, sy), circle.radius - offset.y.abs(), closest)
        }
    };

    Some(CollisionData {
        center: contact,
        normal: -out,
        delta: -out * push,
    })
}
