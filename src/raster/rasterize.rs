//! Panel rasterizer.
//!
//! Each panel's slice of the content is inverse-mapped onto its projected quad: for every
//! destination pixel centre inside the quad's bounds, the warp's inverse gives normalized source
//! coordinates, which are sampled from the panel's flat span. Visibility is resolved per pixel
//! with a depth buffer: the sample's depth is interpolated across the panel from the same
//! coordinates, and a pixel only accepts samples at or in front of what it already holds.

use crate::fold::geometry::{Facing, FoldState, Panel};
use crate::foundation::core::{Point, Quad, Rect, Rgba8Premul};
use crate::foundation::error::{AccordionError, AccordionResult};
use crate::projection::warp::{Warp, WarpKind};
use crate::raster::composite::{PixelSource, SampleRegion, fill, over_at, shade_px};
use crate::raster::image::CompositeImage;
use crate::raster::surface::ContentSurface;

/// Slack for snapping canvas edges and accepting pixel centres that land on a seam.
const EDGE_EPS: f64 = 1e-6;
/// Normalized source coordinates accepted for a destination pixel.
const UNIT_SPAN: std::ops::Range<f64> = -EDGE_EPS..1.0 + EDGE_EPS;
/// Quads with less area than this are edge-on and contribute nothing.
const MIN_QUAD_AREA: f64 = 1e-6;
/// Depth slack so hinges shared by neighbouring panels do not flicker.
const DEPTH_EPS: f64 = 1e-9;
/// Upper bound on either canvas dimension.
const MAX_CANVAS_PX: f64 = 16_384.0;

/// Source sampling filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFilter {
    /// Take the source pixel containing the sample point.
    Nearest,
    /// Blend the four nearest source pixels.
    #[default]
    Bilinear,
}

/// How the output canvas is sized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasMode {
    /// Tight bounding box of all projected panels.
    #[default]
    BoundingBox,
    /// The fold state's requested frame, anchored at the frame origin.
    Frame,
}

/// Rasterizer configuration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RasterOpts {
    /// Sampling filter.
    pub filter: SampleFilter,
    /// Darkening applied to backward-facing panels at a right-angle fold, in `[0, 1]`.
    ///
    /// Scaled by `1 − cos θ`, so flat content is never shaded.
    pub shading: f32,
    /// Canvas sizing.
    pub canvas_mode: CanvasMode,
    /// Background the canvas is cleared to before panels are drawn.
    pub clear: Rgba8Premul,
}

impl Default for RasterOpts {
    fn default() -> Self {
        Self {
            filter: SampleFilter::Bilinear,
            shading: 0.2,
            canvas_mode: CanvasMode::BoundingBox,
            clear: Rgba8Premul::transparent(),
        }
    }
}

impl RasterOpts {
    /// Reject out-of-range values.
    pub fn validate(&self) -> AccordionResult<()> {
        if !(0.0..=1.0).contains(&self.shading) {
            return Err(AccordionError::invalid_parameter(format!(
                "shading must be in [0, 1], got {}",
                self.shading
            )));
        }
        Ok(())
    }
}

/// Render `surface` folded according to `fold` and viewed from `distance` pixels.
///
/// Pure with respect to its inputs: the surface is only read, and identical inputs produce
/// byte-identical images.
#[tracing::instrument(
    level = "debug",
    skip(surface, fold, opts),
    fields(panels = fold.panels().len(), ratio = fold.ratio())
)]
pub fn rasterize(
    surface: &dyn ContentSurface,
    fold: &FoldState,
    distance: f64,
    opts: &RasterOpts,
) -> AccordionResult<CompositeImage> {
    opts.validate()?;
    let projector = fold.projector(distance)?;
    let kind = if projector.is_orthographic() {
        WarpKind::Affine
    } else {
        WarpKind::Perspective
    };

    let pixels = surface.read_rgba8_premul()?;
    let src = PixelSource::new(pixels, surface.width(), surface.height())?;

    let panels = fold.panels();
    let mut quads = Vec::with_capacity(panels.len());
    for panel in panels {
        quads.push(panel.project(&projector)?);
    }

    let (origin, width, height) = canvas_for(fold, &quads, opts.canvas_mode)?;
    let pixel_count = (width as usize) * (height as usize);
    let mut data = vec![0u8; pixel_count * 4];
    fill(&mut data, opts.clear.to_array());
    let mut depth = vec![f64::INFINITY; pixel_count];

    let natural = fold.natural_size();
    let scale_x = f64::from(src.width) / natural.width;
    let scale_y = f64::from(src.height) / natural.height;
    let shade = panel_shade(fold, opts.shading);

    let mut target = Target {
        data: &mut data,
        depth: &mut depth,
        width,
        height,
        origin,
    };
    for (panel, quad) in panels.iter().zip(&quads) {
        if quad.area() < MIN_QUAD_AREA {
            continue;
        }
        let span = Rect::new(
            panel.flat_span.x0 * scale_x,
            panel.flat_span.y0 * scale_y,
            panel.flat_span.x1 * scale_x,
            panel.flat_span.y1 * scale_y,
        );
        let warp = Warp::for_quad(quad, kind)?;
        let amount = match panel.facing {
            Facing::Forward => 0.0,
            Facing::Backward => shade,
        };
        draw_panel(&mut target, &src, panel, quad, &warp, span, amount, opts.filter);
    }

    tracing::debug!(width, height, "rasterized composite");

    Ok(CompositeImage {
        width,
        height,
        origin,
        data,
        premultiplied: true,
    })
}

struct Target<'a> {
    data: &'a mut [u8],
    depth: &'a mut [f64],
    width: u32,
    height: u32,
    origin: Point,
}

fn panel_shade(fold: &FoldState, shading: f32) -> f32 {
    let fold_amount = (1.0 - fold.hinge_angle().cos()).clamp(0.0, 1.0) as f32;
    shading * fold_amount
}

fn canvas_for(
    fold: &FoldState,
    quads: &[Quad],
    mode: CanvasMode,
) -> AccordionResult<(Point, u32, u32)> {
    let rect = match mode {
        CanvasMode::BoundingBox => {
            let mut it = quads.iter().map(Quad::bounds);
            let first = it
                .next()
                .ok_or_else(|| AccordionError::degenerate("fold state has no panels"))?;
            let b = it.fold(first, |acc, r| acc.union(r));
            Rect::new(
                snap_floor(b.x0),
                snap_floor(b.y0),
                snap_ceil(b.x1),
                snap_ceil(b.y1),
            )
        }
        CanvasMode::Frame => {
            let f = fold.frame();
            Rect::new(0.0, 0.0, snap_ceil(f.width), snap_ceil(f.height))
        }
    };
    if !(rect.width().is_finite() && rect.height().is_finite()) {
        return Err(AccordionError::degenerate("projected canvas is not finite"));
    }
    if rect.width() > MAX_CANVAS_PX || rect.height() > MAX_CANVAS_PX {
        return Err(AccordionError::degenerate(format!(
            "projected canvas {}x{} exceeds {MAX_CANVAS_PX} px",
            rect.width(),
            rect.height()
        )));
    }
    let width = rect.width().max(1.0) as u32;
    let height = rect.height().max(1.0) as u32;
    Ok((rect.origin(), width, height))
}

fn snap_floor(v: f64) -> f64 {
    (v + EDGE_EPS).floor()
}

fn snap_ceil(v: f64) -> f64 {
    (v - EDGE_EPS).ceil()
}

#[allow(clippy::too_many_arguments)]
fn draw_panel(
    target: &mut Target<'_>,
    src: &PixelSource<'_>,
    panel: &Panel,
    quad: &Quad,
    warp: &Warp,
    span: Rect,
    shade: f32,
    filter: SampleFilter,
) {
    let full = SampleRegion::full(src.width, src.height);
    let region = SampleRegion {
        x0: (span.x0.floor() as i32).clamp(full.x0, full.x1),
        y0: (span.y0.floor() as i32).clamp(full.y0, full.y1),
        x1: (span.x1.ceil() as i32 - 1).clamp(full.x0, full.x1),
        y1: (span.y1.ceil() as i32 - 1).clamp(full.y0, full.y1),
    };

    let b = quad.bounds();
    let px0 = ((b.x0 - target.origin.x).floor().max(0.0)) as u32;
    let py0 = ((b.y0 - target.origin.y).floor().max(0.0)) as u32;
    let px1 = ((b.x1 - target.origin.x).ceil().max(0.0) as u32).min(target.width);
    let py1 = ((b.y1 - target.origin.y).ceil().max(0.0) as u32).min(target.height);

    for y in py0..py1 {
        for x in px0..px1 {
            let p = Point::new(
                target.origin.x + f64::from(x) + 0.5,
                target.origin.y + f64::from(y) + 0.5,
            );
            let Some(uv) = warp.unmap(p) else {
                continue;
            };
            if !(UNIT_SPAN.contains(&uv.x) && UNIT_SPAN.contains(&uv.y)) {
                continue;
            }
            let z = panel.depth_at(uv.x.clamp(0.0, 1.0));
            let slot = (y as usize) * (target.width as usize) + (x as usize);
            if z > target.depth[slot] + DEPTH_EPS {
                continue;
            }
            target.depth[slot] = z.min(target.depth[slot]);
            let sx = span.x0 + uv.x.clamp(0.0, 1.0) * span.width();
            let sy = span.y0 + uv.y.clamp(0.0, 1.0) * span.height();
            let px = match filter {
                SampleFilter::Nearest => src.sample_nearest(region, sx, sy),
                SampleFilter::Bilinear => src.sample_bilinear(region, sx, sy),
            };
            over_at(target.data, target.width, x, y, shade_px(px, shade));
        }
    }
    tracing::trace!(panel = panel.index, "drew panel");
}

#[cfg(test)]
#[path = "../../tests/unit/raster/rasterize.rs"]
mod tests;
