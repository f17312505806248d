//! Accordion fold geometry.
//!
//! A sheet of `natural` size is split into `2 × fold_count` equal vertical panels. Folding to a
//! narrower width rotates each panel about its vertical hinges by `θ = arccos(r)` where `r` is the
//! folded/natural width ratio, alternating the sign of the rotation so the sheet forms a fan.
//! The outer edges and every other hinge stay in the screen plane (z = 0); the remaining hinges
//! recede to depth `flat_width · sin θ`.

use smallvec::SmallVec;

use crate::foundation::core::{Point, Point3, Quad, Rect, Size, ensure_positive_size};
use crate::foundation::error::{AccordionError, AccordionResult};
use crate::projection::perspective::Projector;

/// Smallest folded/natural width ratio used for geometry.
///
/// Keeps panels from collapsing to zero projected width, where the hinge angle reaches π/2.
pub const DEFAULT_MIN_FOLD_RATIO: f64 = 0.02;

/// Flat panel widths below this many pixels round to nothing.
const MIN_PANEL_PX: f64 = 0.5;

/// Which way a panel turns relative to the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Facing {
    /// Rotated by `+θ`: the right hinge recedes.
    Forward,
    /// Rotated by `−θ`: the right hinge comes back to the screen plane.
    Backward,
}

/// 3D placement of one panel.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PanelPose {
    /// Signed hinge angle in radians; zero when flat.
    pub angle_rad: f64,
    /// Position of the left hinge along the fold axis.
    pub x_offset: f64,
    /// Depth of the left hinge.
    pub z_left: f64,
    /// Depth of the right hinge.
    pub z_right: f64,
}

/// One fold segment.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Panel {
    /// Left-to-right position, starting at zero.
    pub index: usize,
    /// Rotation direction.
    pub facing: Facing,
    /// Region of the unfolded content shown by this panel, in natural-size units.
    pub flat_span: Rect,
    /// Pose in fold space.
    pub pose: PanelPose,
}

impl Panel {
    /// Width of the panel after rotation, before perspective.
    pub fn projected_width(&self) -> f64 {
        self.flat_span.width() * self.pose.angle_rad.cos()
    }

    /// Fold-space corners in top-left, top-right, bottom-right, bottom-left order.
    pub fn corners_3d(&self) -> [Point3; 4] {
        let x0 = self.pose.x_offset;
        let x1 = x0 + self.projected_width();
        let h = self.flat_span.height();
        [
            Point3::new(x0, 0.0, self.pose.z_left),
            Point3::new(x1, 0.0, self.pose.z_right),
            Point3::new(x1, h, self.pose.z_right),
            Point3::new(x0, h, self.pose.z_left),
        ]
    }

    /// Depth at normalized position `u` across the panel (0 at the left hinge, 1 at the right).
    pub fn depth_at(&self, u: f64) -> f64 {
        self.pose.z_left + u * (self.pose.z_right - self.pose.z_left)
    }

    /// Project the panel's corners into a screen quad.
    pub fn project(&self, projector: &Projector) -> AccordionResult<Quad> {
        let [tl, tr, br, bl] = projector.project_all(self.corners_3d())?;
        Ok(Quad::new(tl, tr, br, bl))
    }
}

/// Derived fold geometry for one (natural size, fold count, frame) configuration.
///
/// Immutable once built; a parameter change produces a new value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FoldState {
    natural: Size,
    frame: Size,
    fold_count: u32,
    ratio: f64,
    hinge_angle_rad: f64,
    height: f64,
    panels: SmallVec<[Panel; 8]>,
}

impl FoldState {
    /// Panels in left-to-right order.
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Number of central peaks.
    pub fn fold_count(&self) -> u32 {
        self.fold_count
    }

    /// Natural (unfolded) content size.
    pub fn natural_size(&self) -> Size {
        self.natural
    }

    /// Requested frame, with the height clamped to the natural height.
    pub fn frame(&self) -> Size {
        self.frame
    }

    /// Clamped folded/natural width ratio.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Unsigned hinge angle `θ` in radians.
    pub fn hinge_angle(&self) -> f64 {
        self.hinge_angle_rad
    }

    /// Width of each panel when flat.
    pub fn flat_width(&self) -> f64 {
        self.natural.width / (2.0 * f64::from(self.fold_count))
    }

    /// Visible height (frame height clamped to the natural height).
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Sum of the panels' projected widths before perspective.
    pub fn folded_width(&self) -> f64 {
        self.panels.iter().map(Panel::projected_width).sum()
    }

    /// Depth of the receding hinges.
    pub fn crease_depth(&self) -> f64 {
        self.flat_width() * self.hinge_angle_rad.sin()
    }

    /// Centre of the folded frame; perspective converges here.
    pub fn vanishing_point(&self) -> Point {
        Point::new(0.5 * self.folded_width(), 0.5 * self.height)
    }

    /// Projector for this fold at the given viewer distance.
    pub fn projector(&self, distance: f64) -> AccordionResult<Projector> {
        Ok(Projector::new(distance)?.with_vanishing_point(self.vanishing_point()))
    }

    /// Project every panel into a screen quad, in panel order.
    pub fn project(&self, distance: f64) -> AccordionResult<SmallVec<[Quad; 8]>> {
        let projector = self.projector(distance)?;
        self.panels.iter().map(|p| p.project(&projector)).collect()
    }

    /// Bounding box of the projected silhouette.
    pub fn bounds(&self, distance: f64) -> AccordionResult<Rect> {
        let quads = self.project(distance)?;
        let mut it = quads.iter().map(Quad::bounds);
        let first = it
            .next()
            .ok_or_else(|| AccordionError::degenerate("fold state has no panels"))?;
        Ok(it.fold(first, |acc, r| acc.union(r)))
    }
}

/// Build fold geometry for a full-height frame of `current_width`.
pub fn build_folds(
    natural: Size,
    fold_count: u32,
    current_width: f64,
) -> AccordionResult<FoldState> {
    build_folds_for_frame(
        natural,
        fold_count,
        Size::new(current_width, natural.height),
        DEFAULT_MIN_FOLD_RATIO,
    )
}

/// Build fold geometry for an arbitrary frame with an explicit ratio floor.
#[tracing::instrument(level = "debug")]
pub fn build_folds_for_frame(
    natural: Size,
    fold_count: u32,
    frame: Size,
    min_fold_ratio: f64,
) -> AccordionResult<FoldState> {
    ensure_positive_size(natural, "natural size")?;
    if fold_count < 1 {
        return Err(AccordionError::invalid_parameter("fold count must be >= 1"));
    }
    if !frame.width.is_finite() || frame.width < 0.0 {
        return Err(AccordionError::invalid_parameter(format!(
            "frame width must be finite and >= 0, got {}",
            frame.width
        )));
    }
    if !frame.height.is_finite() || frame.height <= 0.0 {
        return Err(AccordionError::invalid_parameter(format!(
            "frame height must be finite and > 0, got {}",
            frame.height
        )));
    }
    if min_fold_ratio.is_nan() || min_fold_ratio <= 0.0 || min_fold_ratio > 1.0 {
        return Err(AccordionError::invalid_parameter(format!(
            "min fold ratio must be in (0, 1], got {min_fold_ratio}"
        )));
    }

    let panel_count = 2 * fold_count as usize;
    let flat_width = natural.width / panel_count as f64;
    if flat_width < MIN_PANEL_PX {
        return Err(AccordionError::degenerate(format!(
            "{panel_count} panels over width {} leaves {flat_width:.3} px per panel",
            natural.width
        )));
    }
    let height = frame.height.min(natural.height);
    if height < MIN_PANEL_PX {
        return Err(AccordionError::degenerate(format!(
            "visible height {height:.3} px rounds to zero"
        )));
    }

    let ratio = (frame.width / natural.width).clamp(min_fold_ratio, 1.0);
    let theta = ratio.acos();

    let mut panels = SmallVec::with_capacity(panel_count);
    let mut x_offset = 0.0;
    let mut z_left = 0.0;
    for index in 0..panel_count {
        let (facing, angle_rad) = if index % 2 == 0 {
            (Facing::Forward, theta)
        } else {
            (Facing::Backward, -theta)
        };
        // Exact zero at the hinges that return to the screen plane.
        let z_right = match facing {
            Facing::Forward => flat_width * theta.sin(),
            Facing::Backward => 0.0,
        };
        let x0 = flat_width * index as f64;
        let panel = Panel {
            index,
            facing,
            flat_span: Rect::new(x0, 0.0, x0 + flat_width, height),
            pose: PanelPose {
                angle_rad,
                x_offset,
                z_left,
                z_right,
            },
        };
        x_offset += panel.projected_width();
        z_left = z_right;
        panels.push(panel);
    }

    tracing::debug!(ratio, theta, panel_count, "built fold state");

    Ok(FoldState {
        natural,
        frame: Size::new(frame.width, height),
        fold_count,
        ratio,
        hinge_angle_rad: theta,
        height,
        panels,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/fold/geometry.rs"]
mod tests;
