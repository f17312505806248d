//! Tagged composite cache.
//!
//! Holds the last successfully rendered [`CompositeImage`] together with the parameter tuple it
//! was built from. Reads that carry a different tag render synchronously ([`CachePolicy::Eager`])
//! or hand the work to a rayon worker and serve the previous image marked dirty
//! ([`CachePolicy::Lazy`]). Background results are published on the reading thread with a single
//! `Arc` swap; results for superseded requests are dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;

use crate::fold::geometry::FoldState;
use crate::foundation::core::Size;
use crate::foundation::error::{AccordionError, AccordionResult};
use crate::raster::image::CompositeImage;
use crate::raster::rasterize::{RasterOpts, rasterize};
use crate::raster::surface::ContentSurface;

/// When stale composites are re-rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Render before returning from the read.
    #[default]
    Eager,
    /// Return the previous image marked dirty and render on a background worker.
    Lazy,
}

/// Parameters a composite was rendered from.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompositeTag {
    /// Requested frame.
    pub frame: Size,
    /// Viewer distance in pixels.
    pub distance: f64,
    /// Content version at render time.
    pub content_version: u64,
    /// Unfolded content size.
    pub natural: Size,
    /// Number of folds.
    pub fold_count: u32,
}

/// Cache state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CacheState {
    /// Nothing has rendered successfully yet.
    Empty,
    /// The held image matches this tag.
    Valid(CompositeTag),
    /// The held image (if any) no longer matches the current parameters.
    Stale,
}

/// Result of a cache read.
#[derive(Clone, Debug)]
pub struct CacheRead {
    /// Most recent successfully rendered image, if any.
    pub image: Option<Arc<CompositeImage>>,
    /// `true` when `image` was not rendered from the requested parameters.
    pub dirty: bool,
}

/// Everything needed to render one composite, owned so it can move to a worker.
#[derive(Clone)]
pub struct RenderJob {
    /// Tag the result will be stored under.
    pub tag: CompositeTag,
    /// Content to fold.
    pub surface: Arc<dyn ContentSurface>,
    /// Fold geometry.
    pub fold: FoldState,
    /// Rasterizer settings.
    pub opts: RasterOpts,
}

impl RenderJob {
    /// Rasterize this job.
    pub fn run(&self) -> AccordionResult<CompositeImage> {
        rasterize(
            self.surface.as_ref(),
            &self.fold,
            self.tag.distance,
            &self.opts,
        )
    }
}

impl std::fmt::Debug for RenderJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderJob")
            .field("tag", &self.tag)
            .field("surface", &(self.surface.width(), self.surface.height()))
            .finish_non_exhaustive()
    }
}

struct RenderOutcome {
    generation: u64,
    tag: CompositeTag,
    result: AccordionResult<CompositeImage>,
}

struct Failure {
    tag: CompositeTag,
    error: AccordionError,
    reported: bool,
}

/// Tagged composite cache with eager and lazy refresh.
pub struct CompositeCache {
    policy: CachePolicy,
    state: CacheState,
    image: Option<Arc<CompositeImage>>,
    generation: u64,
    latest: Arc<AtomicU64>,
    in_flight: Option<(u64, CompositeTag)>,
    failure: Option<Failure>,
    tx: mpsc::Sender<RenderOutcome>,
    rx: mpsc::Receiver<RenderOutcome>,
}

impl CompositeCache {
    /// Create an empty cache.
    pub fn new(policy: CachePolicy) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            policy,
            state: CacheState::Empty,
            image: None,
            generation: 0,
            latest: Arc::new(AtomicU64::new(0)),
            in_flight: None,
            failure: None,
            tx,
            rx,
        }
    }

    /// Current refresh policy.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Change the refresh policy. An in-flight background render still lands.
    pub fn set_policy(&mut self, policy: CachePolicy) {
        self.policy = policy;
    }

    /// Current state.
    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Last published image without triggering a render.
    pub fn image(&self) -> Option<Arc<CompositeImage>> {
        self.image.clone()
    }

    /// Whether a background render for the latest request is outstanding.
    pub fn is_rendering(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Force the next read to re-render, whatever its tag.
    ///
    /// Any background render already in flight is superseded and its result dropped.
    pub fn invalidate(&mut self) {
        if !matches!(self.state, CacheState::Empty) {
            self.state = CacheState::Stale;
        }
        self.supersede();
        self.failure = None;
        tracing::debug!("composite cache invalidated");
    }

    /// Serve the composite for `job.tag`, rendering according to the policy.
    pub fn get(&mut self, job: RenderJob) -> CacheRead {
        self.poll();
        let tag = job.tag;

        if self.state == CacheState::Valid(tag) {
            return self.read(false);
        }
        if let CacheState::Valid(old) = self.state {
            tracing::debug!(?old, new = ?tag, "composite cache stale");
            self.state = CacheState::Stale;
        }
        if self.failed_for(&tag) {
            return self.read(true);
        }

        match self.policy {
            CachePolicy::Eager => {
                self.supersede();
                let result = job.run();
                self.store(tag, result);
                self.read(self.state != CacheState::Valid(tag))
            }
            CachePolicy::Lazy => {
                if self.in_flight.map(|(_, t)| t) != Some(tag) {
                    self.spawn(job);
                }
                self.read(true)
            }
        }
    }

    /// Publish any finished background render. Returns `true` if the held image changed.
    pub fn poll(&mut self) -> bool {
        let mut published = false;
        while let Ok(outcome) = self.rx.try_recv() {
            published |= self.accept(outcome);
        }
        published
    }

    /// Block until the latest background render (if any) has landed.
    pub fn flush(&mut self) -> bool {
        let mut published = self.poll();
        while self.in_flight.is_some() {
            match self.rx.recv() {
                Ok(outcome) => published |= self.accept(outcome),
                Err(_) => break,
            }
        }
        published
    }

    /// Take the most recent render failure, once per tag.
    pub fn take_failure(&mut self) -> Option<AccordionError> {
        let failure = self.failure.as_mut()?;
        if failure.reported {
            return None;
        }
        failure.reported = true;
        Some(failure.error.to_report())
    }

    fn read(&self, dirty: bool) -> CacheRead {
        CacheRead {
            image: self.image.clone(),
            dirty,
        }
    }

    fn failed_for(&self, tag: &CompositeTag) -> bool {
        self.failure.as_ref().is_some_and(|f| f.tag == *tag)
    }

    fn supersede(&mut self) -> u64 {
        self.generation += 1;
        self.latest.store(self.generation, Ordering::Release);
        self.in_flight = None;
        self.generation
    }

    fn spawn(&mut self, job: RenderJob) {
        let generation = self.supersede();
        self.in_flight = Some((generation, job.tag));
        let latest = Arc::clone(&self.latest);
        let tx = self.tx.clone();
        tracing::debug!(generation, "scheduling background composite");
        rayon::spawn(move || {
            if latest.load(Ordering::Acquire) != generation {
                tracing::debug!(generation, "skipping superseded composite");
                return;
            }
            let result = job.run();
            let _ = tx.send(RenderOutcome {
                generation,
                tag: job.tag,
                result,
            });
        });
    }

    fn accept(&mut self, outcome: RenderOutcome) -> bool {
        match self.in_flight {
            Some((generation, _)) if generation == outcome.generation => {
                self.in_flight = None;
                self.store(outcome.tag, outcome.result)
            }
            _ => {
                tracing::debug!(
                    generation = outcome.generation,
                    "discarding superseded composite"
                );
                false
            }
        }
    }

    fn store(&mut self, tag: CompositeTag, result: AccordionResult<CompositeImage>) -> bool {
        match result {
            Ok(image) => {
                self.image = Some(Arc::new(image));
                self.state = CacheState::Valid(tag);
                self.failure = None;
                true
            }
            Err(error) => {
                tracing::warn!(%error, "composite render failed; keeping previous image");
                self.failure = Some(Failure {
                    tag,
                    error,
                    reported: false,
                });
                false
            }
        }
    }
}

impl Default for CompositeCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl std::fmt::Debug for CompositeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeCache")
            .field("policy", &self.policy)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/composite_cache.rs"]
mod tests;
