//! The accordion controller.
//!
//! Owns the fold parameters, rebuilds geometry when they change, and serves composites through a
//! [`CompositeCache`]. Mutators validate first and leave all state untouched on error.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::cache::composite_cache::{
    CacheRead, CacheState, CompositeCache, CompositeTag, RenderJob,
};
use crate::controller::opts::AccordionOpts;
use crate::fold::geometry::{FoldState, build_folds_for_frame};
use crate::foundation::core::{Quad, Size, ensure_positive_size};
use crate::foundation::error::{AccordionError, AccordionResult};
use crate::projection::perspective::validate_distance;
use crate::raster::image::CompositeImage;
use crate::raster::surface::ContentSurface;

/// Host-side collaborator: the layer that displays composites and drives animation.
///
/// All methods have no-op defaults.
pub trait AccordionHost {
    /// Interpolate the frame from `from` to `to`, feeding intermediate values back through
    /// [`AccordionController::animation_tick`].
    fn animate_frame(&mut self, from: Size, to: Size) {
        let _ = (from, to);
    }

    /// A composite matching the current parameters is ready.
    fn composite_ready(&mut self, image: Arc<CompositeImage>, fold: &FoldState) {
        let _ = (image, fold);
    }

    /// Geometry or rendering failed; the previous composite stays on screen.
    fn render_failed(&mut self, error: &AccordionError) {
        let _ = error;
    }
}

/// Composite for display.
#[derive(Clone, Debug)]
pub struct Composite {
    /// Latest available image; `None` before the first successful render or without content.
    pub image: Option<Arc<CompositeImage>>,
    /// `true` when `image` does not reflect the current parameters.
    pub dirty: bool,
}

/// Owns the accordion parameters and the composite cache.
pub struct AccordionController {
    opts: AccordionOpts,
    natural: Size,
    fold_count: u32,
    frame: Size,
    distance: f64,
    content: Option<Arc<dyn ContentSurface>>,
    content_version: u64,
    fold: FoldState,
    cache: CompositeCache,
    host: Option<Box<dyn AccordionHost>>,
    published: Option<CompositeTag>,
}

impl AccordionController {
    /// Controller whose natural size equals `frame`, initially unfolded and orthographic.
    pub fn new(frame: Size, fold_count: u32) -> AccordionResult<Self> {
        Self::with_opts(frame, fold_count, AccordionOpts::default())
    }

    /// Like [`AccordionController::new`] with explicit options.
    pub fn with_opts(frame: Size, fold_count: u32, opts: AccordionOpts) -> AccordionResult<Self> {
        opts.validate()?;
        ensure_positive_size(frame, "frame")?;
        let fold = build_folds_for_frame(frame, fold_count, frame, opts.min_fold_ratio)?;
        Ok(Self {
            cache: CompositeCache::new(opts.cache_policy),
            opts,
            natural: frame,
            fold_count,
            frame,
            distance: 0.0,
            content: None,
            content_version: 0,
            fold,
            host: None,
            published: None,
        })
    }

    /// Install the host collaborator.
    pub fn set_host(&mut self, host: Box<dyn AccordionHost>) {
        self.host = Some(host);
    }

    /// Remove and return the host collaborator.
    pub fn take_host(&mut self) -> Option<Box<dyn AccordionHost>> {
        self.host.take()
    }

    /// Set the unfolded size and fold count together.
    pub fn configure(&mut self, natural: Size, fold_count: u32) -> AccordionResult<()> {
        if fold_count < 1 {
            return Err(AccordionError::invalid_parameter(format!(
                "fold count must be >= 1, got {fold_count}"
            )));
        }
        ensure_positive_size(natural, "natural size")?;
        let fold = self
            .rebuild(natural, fold_count, self.frame)
            .map_err(|err| self.reject(err))?;
        self.natural = natural;
        self.fold_count = fold_count;
        self.commit(fold);
        Ok(())
    }

    /// Change the unfolded size, keeping the fold count.
    pub fn set_natural_size(&mut self, natural: Size) -> AccordionResult<()> {
        self.configure(natural, self.fold_count)
    }

    /// Request a new frame.
    ///
    /// With `animated` and a host installed, the host is asked to interpolate and the frame only
    /// changes as ticks arrive. Otherwise it is applied immediately.
    pub fn set_frame(&mut self, frame: Size, animated: bool) -> AccordionResult<()> {
        validate_frame(frame)?;
        if animated && let Some(host) = self.host.as_mut() {
            tracing::debug!(from = ?self.frame, to = ?frame, "frame animation requested");
            host.animate_frame(self.frame, frame);
            return Ok(());
        }
        self.apply_frame(frame)
    }

    /// Apply one intermediate frame supplied by the host's animation.
    pub fn animation_tick(&mut self, frame: Size) -> AccordionResult<()> {
        validate_frame(frame)?;
        self.apply_frame(frame)
    }

    /// Set the viewer distance in pixels; `0` disables perspective.
    pub fn set_distance(&mut self, distance: f64) -> AccordionResult<()> {
        validate_distance(distance)?;
        self.distance = distance;
        Ok(())
    }

    /// Attach the content to fold, replacing any previous surface.
    pub fn attach_content(&mut self, surface: Arc<dyn ContentSurface>) {
        self.content = Some(surface);
        self.bump_content_version();
    }

    /// The host redrew the content out of band.
    pub fn content_changed(&mut self) {
        self.bump_content_version();
        self.cache.invalidate();
    }

    /// Replace the options. Rebuilds geometry and re-renders on the next read.
    pub fn set_opts(&mut self, opts: AccordionOpts) -> AccordionResult<()> {
        opts.validate()?;
        let fold = build_folds_for_frame(
            self.natural,
            self.fold_count,
            self.frame,
            opts.min_fold_ratio,
        )
        .map_err(|err| self.reject(err))?;
        self.cache.set_policy(opts.cache_policy);
        self.opts = opts;
        self.commit(fold);
        self.cache.invalidate();
        self.published = None;
        Ok(())
    }

    /// Number of folds (central peaks).
    pub fn number_of_folds(&self) -> u32 {
        self.fold_count
    }

    /// Current options.
    pub fn opts(&self) -> &AccordionOpts {
        &self.opts
    }

    /// Unfolded content size.
    pub fn natural_size(&self) -> Size {
        self.natural
    }

    /// Current frame.
    pub fn frame(&self) -> Size {
        self.frame
    }

    /// Viewer distance.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Counter bumped on every content attach or change.
    pub fn content_version(&self) -> u64 {
        self.content_version
    }

    /// Geometry for the current parameters.
    pub fn fold_state(&self) -> &FoldState {
        &self.fold
    }

    /// Projected panel quads, left to right, for hosts that draw panels themselves.
    pub fn panel_quads(&self) -> AccordionResult<SmallVec<[Quad; 8]>> {
        self.fold.project(self.distance)
    }

    /// Tag identifying the current parameters.
    pub fn tag(&self) -> CompositeTag {
        CompositeTag {
            frame: self.frame,
            distance: self.distance,
            content_version: self.content_version,
            natural: self.natural,
            fold_count: self.fold_count,
        }
    }

    /// Composite for the current parameters, rendering according to the cache policy.
    #[tracing::instrument(level = "debug", skip(self), fields(version = self.content_version))]
    pub fn composite(&mut self) -> Composite {
        let Some(surface) = self.content.clone() else {
            return Composite {
                image: None,
                dirty: true,
            };
        };
        let job = RenderJob {
            tag: self.tag(),
            surface,
            fold: self.fold.clone(),
            opts: self.opts.raster_opts(),
        };
        let read = self.cache.get(job);
        self.notify(&read);
        Composite {
            image: read.image,
            dirty: read.dirty,
        }
    }

    /// Publish any finished background render to the host.
    pub fn poll(&mut self) -> bool {
        let published = self.cache.poll();
        self.notify_current();
        published
    }

    /// Wait for an outstanding background render and publish it.
    pub fn flush(&mut self) -> bool {
        let published = self.cache.flush();
        self.notify_current();
        published
    }

    fn rebuild(&self, natural: Size, fold_count: u32, frame: Size) -> AccordionResult<FoldState> {
        build_folds_for_frame(natural, fold_count, frame, self.opts.min_fold_ratio)
    }

    fn apply_frame(&mut self, frame: Size) -> AccordionResult<()> {
        let fold = self
            .rebuild(self.natural, self.fold_count, frame)
            .map_err(|err| self.reject(err))?;
        self.frame = frame;
        self.commit(fold);
        Ok(())
    }

    /// Degenerate geometry is reported to the host; the previous fold stays.
    fn reject(&mut self, err: AccordionError) -> AccordionError {
        if matches!(err, AccordionError::DegenerateGeometry(_)) {
            tracing::warn!(%err, "rejected geometry; keeping previous fold");
            if let Some(host) = self.host.as_mut() {
                host.render_failed(&err);
            }
        }
        err
    }

    fn commit(&mut self, fold: FoldState) {
        tracing::debug!(
            folds = fold.fold_count(),
            ratio = fold.ratio(),
            "fold state rebuilt"
        );
        self.fold = fold;
    }

    fn bump_content_version(&mut self) {
        self.content_version = self.content_version.wrapping_add(1);
    }

    fn notify_current(&mut self) {
        let read = CacheRead {
            image: self.cache.image(),
            dirty: self.cache.state() != CacheState::Valid(self.tag()),
        };
        self.notify(&read);
    }

    fn notify(&mut self, read: &CacheRead) {
        let failure = self.cache.take_failure();
        let tag = self.tag();
        let Some(host) = self.host.as_mut() else {
            return;
        };
        if let Some(err) = failure {
            host.render_failed(&err);
        }
        if read.dirty {
            return;
        }
        if self.published == Some(tag) {
            return;
        }
        if let Some(image) = read.image.clone() {
            self.published = Some(tag);
            host.composite_ready(image, &self.fold);
        }
    }
}

impl std::fmt::Debug for AccordionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccordionController")
            .field("natural", &self.natural)
            .field("fold_count", &self.fold_count)
            .field("frame", &self.frame)
            .field("distance", &self.distance)
            .field("content_version", &self.content_version)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn validate_frame(frame: Size) -> AccordionResult<()> {
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
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/controller/accordion.rs"]
mod tests;
