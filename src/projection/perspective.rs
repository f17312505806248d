//! Viewer-distance perspective projection.
//!
//! The viewer sits `distance` pixels in front of the screen plane (z = 0), looking through the
//! vanishing point. Points behind the screen (positive z) shrink toward the vanishing point by
//! `distance / (distance + z)`; a distance of zero selects an orthographic projection.

use crate::foundation::core::{Point, Point3};
use crate::foundation::error::{AccordionError, AccordionResult};

/// Project `point` about the origin with the given viewer distance.
///
/// A distance of zero is orthographic and ignores z exactly. Negative or NaN distances are rejected.
pub fn project(point: Point3, distance: f64) -> AccordionResult<Point> {
    Projector::new(distance)?.project(point)
}

/// Perspective projector with a configurable vanishing point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projector {
    distance: f64,
    vanishing_point: Point,
}

impl Projector {
    /// Build a projector centred on the origin.
    pub fn new(distance: f64) -> AccordionResult<Self> {
        validate_distance(distance)?;
        Ok(Self {
            distance,
            vanishing_point: Point::ORIGIN,
        })
    }

    /// Orthographic projector (distance zero).
    pub fn orthographic() -> Self {
        Self {
            distance: 0.0,
            vanishing_point: Point::ORIGIN,
        }
    }

    /// Move the vanishing point. Points on the screen plane are unaffected by this choice.
    pub fn with_vanishing_point(mut self, vanishing_point: Point) -> Self {
        self.vanishing_point = vanishing_point;
        self
    }

    /// Viewer distance in pixels.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Point that perspective foreshortening converges toward.
    pub fn vanishing_point(&self) -> Point {
        self.vanishing_point
    }

    /// True when depth has no effect on the projected position.
    pub fn is_orthographic(&self) -> bool {
        self.distance <= 0.0 || self.distance.is_infinite()
    }

    /// Perspective scale factor for depth `z`.
    ///
    /// Written as `1 / (1 + z / d)` so that it tends to exactly `1.0` as `d` grows without bound.
    pub fn scale_at(&self, z: f64) -> AccordionResult<f64> {
        if self.is_orthographic() {
            return Ok(1.0);
        }
        let denom = 1.0 + z / self.distance;
        if denom.is_nan() || denom <= 0.0 {
            return Err(AccordionError::degenerate(format!(
                "point at depth {z} is at or behind a viewer {} px from the screen",
                self.distance
            )));
        }
        Ok(1.0 / denom)
    }

    /// Project a single point.
    pub fn project(&self, point: Point3) -> AccordionResult<Point> {
        if self.is_orthographic() {
            return Ok(point.xy());
        }
        let s = self.scale_at(point.z)?;
        let vp = self.vanishing_point;
        Ok(Point::new(
            vp.x + (point.x - vp.x) * s,
            vp.y + (point.y - vp.y) * s,
        ))
    }

    /// Project a fixed-size batch of points.
    pub fn project_all<const N: usize>(&self, points: [Point3; N]) -> AccordionResult<[Point; N]> {
        let mut out = [Point::ORIGIN; N];
        for (dst, p) in out.iter_mut().zip(points) {
            *dst = self.project(p)?;
        }
        Ok(out)
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::orthographic()
    }
}

/// Reject negative and NaN viewer distances. Zero and `+inf` are accepted.
pub fn validate_distance(distance: f64) -> AccordionResult<()> {
    if distance.is_nan() {
        return Err(AccordionError::invalid_parameter(
            "distance from screen must not be NaN",
        ));
    }
    if distance < 0.0 {
        return Err(AccordionError::invalid_parameter(format!(
            "distance from screen must be >= 0, got {distance}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/projection/perspective.rs"]
mod tests;
