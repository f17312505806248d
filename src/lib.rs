//! Accordion is a fold geometry, perspective projection and compositing engine.
//!
//! A rectangular content surface is folded into `2 × folds` equal vertical panels that zig-zag
//! into the screen and is viewed from an assumed distance. The public API is layered:
//!
//! - [`build_folds`] turns a natural size, fold count and frame width into a [`FoldState`]
//! - [`rasterize`] renders a [`ContentSurface`] under that fold into a [`CompositeImage`]
//! - [`AccordionController`] owns the parameters and serves composites through a
//!   [`CompositeCache`], reporting to an [`AccordionHost`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cache;
mod controller;
mod fold;
mod foundation;
mod projection;
mod raster;

pub use crate::foundation::core::{Affine, Point, Point3, Quad, Rect, Rgba8Premul, Size, Vec2};
pub use crate::foundation::error::{AccordionError, AccordionResult};

pub use crate::cache::composite_cache::{
    CachePolicy, CacheRead, CacheState, CompositeCache, CompositeTag, RenderJob,
};
pub use crate::controller::accordion::{AccordionController, AccordionHost, Composite};
pub use crate::controller::opts::AccordionOpts;
pub use crate::fold::geometry::{
    DEFAULT_MIN_FOLD_RATIO, Facing, FoldState, Panel, PanelPose, build_folds,
    build_folds_for_frame,
};
pub use crate::projection::perspective::{Projector, project, validate_distance};
pub use crate::projection::warp::{Homography, Warp, WarpKind};
pub use crate::raster::image::{CompositeImage, ImageFingerprint};
pub use crate::raster::rasterize::{CanvasMode, RasterOpts, SampleFilter, rasterize};
pub use crate::raster::surface::{ContentSurface, ImageSurface};
