use std::sync::atomic::AtomicBool;

use super::*;
use crate::fold::geometry::build_folds;
use crate::foundation::core::Rgba8Premul;
use crate::raster::surface::ImageSurface;

struct Flaky {
    inner: ImageSurface,
    broken: AtomicBool,
    reads: AtomicU64,
}

impl Flaky {
    fn new() -> Arc<Self> {
        let color = Rgba8Premul::from_straight_rgba(40, 80, 120, 255);
        Arc::new(Self {
            inner: ImageSurface::solid(300, 100, color).unwrap(),
            broken: AtomicBool::new(false),
            reads: AtomicU64::new(0),
        })
    }

    fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ContentSurface for Flaky {
    fn width(&self) -> u32 {
        self.inner.width()
    }

    fn height(&self) -> u32 {
        self.inner.height()
    }

    fn read_rgba8_premul(&self) -> AccordionResult<&[u8]> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.broken.load(Ordering::SeqCst) {
            return Err(AccordionError::rasterization("surface unavailable"));
        }
        self.inner.read_rgba8_premul()
    }
}

fn job(surface: &Arc<Flaky>, width: f64, version: u64) -> RenderJob {
    let natural = Size::new(300.0, 100.0);
    RenderJob {
        tag: CompositeTag {
            frame: Size::new(width, 100.0),
            distance: 0.0,
            content_version: version,
            natural,
            fold_count: 3,
        },
        surface: surface.clone(),
        fold: build_folds(natural, 3, width).unwrap(),
        opts: RasterOpts::default(),
    }
}

#[test]
fn eager_renders_once_per_tag() {
    let surface = Flaky::new();
    let mut cache = CompositeCache::new(CachePolicy::Eager);
    assert_eq!(cache.state(), CacheState::Empty);

    let first = cache.get(job(&surface, 150.0, 1));
    assert!(!first.dirty);
    assert_eq!(first.image.as_ref().unwrap().width, 150);
    assert_eq!(cache.state(), CacheState::Valid(job(&surface, 150.0, 1).tag));

    let again = cache.get(job(&surface, 150.0, 1));
    assert!(!again.dirty);
    assert_eq!(surface.reads(), 1);
    assert!(Arc::ptr_eq(
        first.image.as_ref().unwrap(),
        again.image.as_ref().unwrap()
    ));
}

#[test]
fn eager_never_serves_previous_tag_clean() {
    let surface = Flaky::new();
    let mut cache = CompositeCache::new(CachePolicy::Eager);
    cache.get(job(&surface, 150.0, 1));
    let next = cache.get(job(&surface, 200.0, 1));
    assert!(!next.dirty);
    assert_eq!(next.image.unwrap().width, 200);
    assert_eq!(surface.reads(), 2);
}

#[test]
fn invalidate_forces_rerender() {
    let surface = Flaky::new();
    let mut cache = CompositeCache::new(CachePolicy::Eager);
    cache.invalidate();
    assert_eq!(cache.state(), CacheState::Empty);

    cache.get(job(&surface, 150.0, 1));
    cache.invalidate();
    assert_eq!(cache.state(), CacheState::Stale);
    assert!(!cache.get(job(&surface, 150.0, 1)).dirty);
    assert_eq!(surface.reads(), 2);
}

#[test]
fn failure_keeps_image_and_reports_once() {
    let surface = Flaky::new();
    let mut cache = CompositeCache::new(CachePolicy::Eager);
    cache.get(job(&surface, 150.0, 1));

    surface.broken.store(true, Ordering::SeqCst);
    let read = cache.get(job(&surface, 120.0, 1));
    assert!(read.dirty);
    assert_eq!(read.image.unwrap().width, 150);
    assert_eq!(cache.state(), CacheState::Stale);
    assert!(matches!(
        cache.take_failure(),
        Some(AccordionError::Rasterization(_))
    ));
    assert!(cache.take_failure().is_none());

    // Same tag: not retried.
    cache.get(job(&surface, 120.0, 1));
    assert_eq!(surface.reads(), 2);

    // A parameter change retries.
    surface.broken.store(false, Ordering::SeqCst);
    let read = cache.get(job(&surface, 100.0, 1));
    assert!(!read.dirty);
    assert_eq!(read.image.unwrap().width, 100);
    assert!(cache.take_failure().is_none());
}

#[test]
fn lazy_serves_stale_then_publishes() {
    let surface = Flaky::new();
    let mut cache = CompositeCache::new(CachePolicy::Lazy);

    let first = cache.get(job(&surface, 150.0, 1));
    assert!(first.dirty);
    assert!(first.image.is_none());
    assert!(cache.flush());
    assert!(!cache.is_rendering());

    let ready = cache.get(job(&surface, 150.0, 1));
    assert!(!ready.dirty);
    assert_eq!(ready.image.as_ref().unwrap().width, 150);

    let pending = cache.get(job(&surface, 90.0, 1));
    assert!(pending.dirty);
    assert_eq!(pending.image.unwrap().width, 150);
    cache.flush();
    assert_eq!(cache.get(job(&surface, 90.0, 1)).image.unwrap().width, 90);
}

#[test]
fn lazy_latest_request_wins() {
    let surface = Flaky::new();
    let mut cache = CompositeCache::new(CachePolicy::Lazy);
    for width in [280.0, 240.0, 200.0, 160.0] {
        cache.get(job(&surface, width, 1));
    }
    cache.flush();
    assert_eq!(cache.state(), CacheState::Valid(job(&surface, 160.0, 1).tag));
    assert_eq!(cache.image().unwrap().width, 160);
}

#[test]
fn lazy_does_not_respawn_for_in_flight_tag() {
    let surface = Flaky::new();
    let mut cache = CompositeCache::new(CachePolicy::Lazy);
    cache.get(job(&surface, 150.0, 1));
    cache.get(job(&surface, 150.0, 1));
    cache.flush();
    assert_eq!(surface.reads(), 1);
}

#[test]
fn invalidate_drops_in_flight_render_for_same_tag() {
    let surface = Flaky::new();
    let mut cache = CompositeCache::new(CachePolicy::Lazy);
    let mut old = job(&surface, 150.0, 1);
    old.opts.shading = 0.0;
    let mut new = job(&surface, 150.0, 1);
    new.opts.shading = 1.0;
    assert_eq!(old.tag, new.tag);

    cache.get(old);
    cache.invalidate();
    assert!(!cache.is_rendering());

    let read = cache.get(new.clone());
    assert!(read.dirty);
    cache.flush();
    assert_eq!(cache.state(), CacheState::Valid(new.tag));
    assert_eq!(
        cache.image().unwrap().fingerprint(),
        new.run().unwrap().fingerprint()
    );
}
