use crate::foundation::error::{AccordionError, AccordionResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// A point in fold space: `x` along the fold axis, `y` down the hinge, `z` into the screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point3 {
    /// Horizontal position in pixels.
    pub x: f64,
    /// Vertical position in pixels.
    pub y: f64,
    /// Depth behind the screen plane in pixels (negative is toward the viewer).
    pub z: f64,
}

impl Point3 {
    /// Build a point from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Drop the depth component.
    pub fn xy(self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Screen-space quadrilateral.
///
/// Corner order is top-left, top-right, bottom-right, bottom-left of the source rectangle it was
/// projected from.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quad {
    /// The four projected corners.
    pub corners: [Point; 4],
}

impl Quad {
    /// Build a quad from corners in top-left, top-right, bottom-right, bottom-left order.
    pub fn new(tl: Point, tr: Point, br: Point, bl: Point) -> Self {
        Self {
            corners: [tl, tr, br, bl],
        }
    }

    /// Axis-aligned bounding box of the corners.
    pub fn bounds(&self) -> Rect {
        let [a, b, c, d] = self.corners;
        Rect::from_points(a, b).union_pt(c).union_pt(d)
    }

    /// Shoelace area (absolute value).
    pub fn area(&self) -> f64 {
        let c = &self.corners;
        let mut acc = 0.0;
        for i in 0..4 {
            let p = c[i];
            let q = c[(i + 1) % 4];
            acc += p.x * q.y - q.x * p.y;
        }
        (acc * 0.5).abs()
    }

    /// Whether every corner is finite.
    pub fn is_finite(&self) -> bool {
        self.corners.iter().all(|p| p.is_finite())
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self::default()
    }

    /// Premultiply a straight-alpha color.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Channel array in RGBA order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Reject sizes with a non-positive or non-finite dimension.
pub(crate) fn ensure_positive_size(size: Size, what: &str) -> AccordionResult<()> {
    if !(size.width.is_finite() && size.height.is_finite()) {
        return Err(AccordionError::invalid_parameter(format!(
            "{what} must be finite, got {}x{}",
            size.width, size.height
        )));
    }
    if size.width <= 0.0 || size.height <= 0.0 {
        return Err(AccordionError::invalid_parameter(format!(
            "{what} must be positive, got {}x{}",
            size.width, size.height
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
