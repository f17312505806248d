//! Unit-square to quadrilateral mappings.
//!
//! A [`Warp`] maps source-rectangle coordinates normalized to `[0, 1]²` onto a destination
//! [`Quad`]. Rasterization walks destination pixels and uses [`Warp::unmap`] to find where to
//! sample, so every warp carries its inverse.

use crate::foundation::core::{Affine, Point, Quad};
use crate::foundation::error::{AccordionError, AccordionResult};

const SINGULAR_EPS: f64 = 1e-12;

/// Which family of mapping a warp uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WarpKind {
    /// Parallelogram mapping; the bottom-right corner is implied by the other three.
    Affine,
    /// Projective homography through all four corners.
    Perspective,
}

/// Projective 3×3 transform, row-major, acting on `(x, y, 1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    m: [[f64; 3]; 3],
}

impl Homography {
    /// Identity mapping.
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Map the unit square onto `quad` (corner `i` of the quad receives unit corner `i` in
    /// top-left, top-right, bottom-right, bottom-left order).
    pub fn square_to_quad(quad: &Quad) -> AccordionResult<Self> {
        let [p0, p1, p2, p3] = quad.corners;
        // Unit corners: p0=(0,0) p1=(1,0) p2=(1,1) p3=(0,1).
        let sx = p0.x - p1.x + p2.x - p3.x;
        let sy = p0.y - p1.y + p2.y - p3.y;

        let (g, h) = if sx.abs() < SINGULAR_EPS && sy.abs() < SINGULAR_EPS {
            (0.0, 0.0)
        } else {
            let dx1 = p1.x - p2.x;
            let dx2 = p3.x - p2.x;
            let dy1 = p1.y - p2.y;
            let dy2 = p3.y - p2.y;
            let den = dx1 * dy2 - dx2 * dy1;
            if den.abs() < SINGULAR_EPS {
                return Err(AccordionError::degenerate(
                    "quad corners are collinear; no homography exists",
                ));
            }
            ((sx * dy2 - dx2 * sy) / den, (dx1 * sy - sx * dy1) / den)
        };

        let m = [
            [p1.x - p0.x + g * p1.x, p3.x - p0.x + h * p3.x, p0.x],
            [p1.y - p0.y + g * p1.y, p3.y - p0.y + h * p3.y, p0.y],
            [g, h, 1.0],
        ];
        let out = Self { m };
        if out.determinant().abs() < SINGULAR_EPS {
            return Err(AccordionError::degenerate("quad has zero area"));
        }
        Ok(out)
    }

    fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse transform via the adjugate.
    pub fn inverse(&self) -> AccordionResult<Self> {
        let det = self.determinant();
        if det.abs() < SINGULAR_EPS {
            return Err(AccordionError::degenerate("homography is singular"));
        }
        let m = &self.m;
        let inv = 1.0 / det;
        let mut out = [[0.0_f64; 3]; 3];
        out[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv;
        out[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv;
        out[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv;
        out[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv;
        out[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv;
        out[1][2] = (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv;
        out[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv;
        out[2][1] = (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv;
        out[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv;
        Ok(Self { m: out })
    }

    /// Apply to a point. `None` when the point maps to infinity.
    pub fn apply(&self, p: Point) -> Option<Point> {
        let m = &self.m;
        let w = m[2][0] * p.x + m[2][1] * p.y + m[2][2];
        if w.abs() < SINGULAR_EPS {
            return None;
        }
        Some(Point::new(
            (m[0][0] * p.x + m[0][1] * p.y + m[0][2]) / w,
            (m[1][0] * p.x + m[1][1] * p.y + m[1][2]) / w,
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Mapping {
    Affine(Affine),
    Projective(Homography),
}

impl Mapping {
    fn apply(&self, p: Point) -> Option<Point> {
        match self {
            Self::Affine(a) => Some(*a * p),
            Self::Projective(h) => h.apply(p),
        }
    }
}

/// Forward and inverse unit-square mapping onto a destination quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Warp {
    kind: WarpKind,
    forward: Mapping,
    inverse: Mapping,
}

impl Warp {
    /// Build a warp of the requested kind.
    pub fn for_quad(quad: &Quad, kind: WarpKind) -> AccordionResult<Self> {
        match kind {
            WarpKind::Affine => Self::affine(quad),
            WarpKind::Perspective => Self::perspective(quad),
        }
    }

    /// Parallelogram warp spanned by the top-left, top-right and bottom-left corners.
    pub fn affine(quad: &Quad) -> AccordionResult<Self> {
        let [tl, tr, _, bl] = quad.corners;
        let ex = tr - tl;
        let ey = bl - tl;
        let forward = Affine::new([ex.x, ex.y, ey.x, ey.y, tl.x, tl.y]);
        if forward.determinant().abs() < SINGULAR_EPS {
            return Err(AccordionError::degenerate("quad has zero area"));
        }
        Ok(Self {
            kind: WarpKind::Affine,
            forward: Mapping::Affine(forward),
            inverse: Mapping::Affine(forward.inverse()),
        })
    }

    /// Full projective warp through all four corners.
    pub fn perspective(quad: &Quad) -> AccordionResult<Self> {
        let h = Homography::square_to_quad(quad)?;
        Ok(Self {
            kind: WarpKind::Perspective,
            forward: Mapping::Projective(h),
            inverse: Mapping::Projective(h.inverse()?),
        })
    }

    /// Mapping family.
    pub fn kind(&self) -> WarpKind {
        self.kind
    }

    /// Map normalized source coordinates to destination space.
    pub fn map_unit(&self, uv: Point) -> Option<Point> {
        self.forward.apply(uv)
    }

    /// Map a destination point back to normalized source coordinates.
    pub fn unmap(&self, p: Point) -> Option<Point> {
        self.inverse.apply(p)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/projection/warp.rs"]
mod tests;
