use std::sync::Mutex;

use super::*;
use crate::cache::composite_cache::CachePolicy;
use crate::foundation::core::Rgba8Premul;
use crate::raster::surface::ImageSurface;

#[derive(Debug, PartialEq)]
enum Event {
    Animate(Size, Size),
    Ready(u32),
    Failed,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Event>>>);

impl Recorder {
    fn events(&self) -> Vec<Event> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl AccordionHost for Recorder {
    fn animate_frame(&mut self, from: Size, to: Size) {
        self.0.lock().unwrap().push(Event::Animate(from, to));
    }

    fn composite_ready(&mut self, image: Arc<CompositeImage>, _fold: &FoldState) {
        self.0.lock().unwrap().push(Event::Ready(image.width));
    }

    fn render_failed(&mut self, _error: &AccordionError) {
        self.0.lock().unwrap().push(Event::Failed);
    }
}

fn content() -> Arc<dyn ContentSurface> {
    let color = Rgba8Premul::from_straight_rgba(10, 200, 30, 255);
    Arc::new(ImageSurface::solid(300, 100, color).unwrap())
}

fn controller() -> (AccordionController, Recorder) {
    let mut c = AccordionController::new(Size::new(300.0, 100.0), 3).unwrap();
    let rec = Recorder::default();
    c.set_host(Box::new(rec.clone()));
    c.attach_content(content());
    (c, rec)
}

#[test]
fn new_starts_unfolded() {
    let c = AccordionController::new(Size::new(300.0, 100.0), 3).unwrap();
    assert_eq!(c.number_of_folds(), 3);
    assert_eq!(c.natural_size(), Size::new(300.0, 100.0));
    assert_eq!(c.fold_state().ratio(), 1.0);
    assert_eq!(c.panel_quads().unwrap().len(), 6);
}

#[test]
fn configure_rejects_bad_input_and_keeps_state() {
    let (mut c, _) = controller();
    let before = c.fold_state().clone();
    assert!(matches!(
        c.configure(Size::new(300.0, 100.0), 0),
        Err(AccordionError::InvalidParameter(_))
    ));
    assert!(matches!(
        c.configure(Size::new(0.0, 100.0), 2),
        Err(AccordionError::InvalidParameter(_))
    ));
    assert_eq!(c.fold_state(), &before);
    assert_eq!(c.number_of_folds(), 3);
}

#[test]
fn degenerate_fold_count_is_reported_to_host() {
    let (mut c, rec) = controller();
    assert!(matches!(
        c.configure(Size::new(300.0, 100.0), 1000),
        Err(AccordionError::DegenerateGeometry(_))
    ));
    assert_eq!(rec.events(), vec![Event::Failed]);
    assert_eq!(c.number_of_folds(), 3);
}

#[test]
fn set_frame_rebuilds_and_composite_follows() {
    let (mut c, rec) = controller();
    assert_eq!(c.composite().image.unwrap().width, 300);
    c.set_frame(Size::new(150.0, 100.0), false).unwrap();
    assert!((c.fold_state().hinge_angle().to_degrees() - 60.0).abs() < 1e-9);
    let comp = c.composite();
    assert!(!comp.dirty);
    assert_eq!(comp.image.unwrap().width, 150);
    assert_eq!(rec.events(), vec![Event::Ready(300), Event::Ready(150)]);
}

#[test]
fn repeated_reads_publish_once() {
    let (mut c, rec) = controller();
    c.composite();
    c.composite();
    assert_eq!(rec.events(), vec![Event::Ready(300)]);
}

#[test]
fn animated_frame_goes_through_host_ticks() {
    let (mut c, rec) = controller();
    c.set_frame(Size::new(100.0, 100.0), true).unwrap();
    assert_eq!(c.frame(), Size::new(300.0, 100.0));
    assert_eq!(
        rec.events(),
        vec![Event::Animate(
            Size::new(300.0, 100.0),
            Size::new(100.0, 100.0)
        )]
    );
    for w in [250.0, 175.0, 100.0] {
        c.animation_tick(Size::new(w, 100.0)).unwrap();
        assert_eq!(c.composite().image.unwrap().width, w as u32);
    }
}

#[test]
fn animated_without_host_applies_immediately() {
    let mut c = AccordionController::new(Size::new(300.0, 100.0), 3).unwrap();
    c.set_frame(Size::new(120.0, 100.0), true).unwrap();
    assert_eq!(c.frame(), Size::new(120.0, 100.0));
}

#[test]
fn distance_is_validated() {
    let (mut c, _) = controller();
    assert!(c.set_distance(-1.0).is_err());
    assert_eq!(c.distance(), 0.0);
    c.set_distance(500.0).unwrap();
    assert_eq!(c.tag().distance, 500.0);
}

#[test]
fn content_changes_bump_the_tag() {
    let (mut c, rec) = controller();
    c.composite();
    let before = c.tag();
    c.content_changed();
    assert_ne!(c.tag(), before);
    assert!(!c.composite().dirty);
    assert_eq!(rec.events(), vec![Event::Ready(300), Event::Ready(300)]);
}

#[test]
fn no_content_means_no_image() {
    let mut c = AccordionController::new(Size::new(300.0, 100.0), 3).unwrap();
    let comp = c.composite();
    assert!(comp.image.is_none());
    assert!(comp.dirty);
}

#[test]
fn lazy_policy_publishes_on_flush() {
    let opts = AccordionOpts {
        cache_policy: CachePolicy::Lazy,
        ..AccordionOpts::default()
    };
    let mut c = AccordionController::with_opts(Size::new(300.0, 100.0), 3, opts).unwrap();
    let rec = Recorder::default();
    c.set_host(Box::new(rec.clone()));
    c.attach_content(content());

    assert!(c.composite().dirty);
    c.flush();
    assert_eq!(rec.events(), vec![Event::Ready(300)]);
    assert!(!c.composite().dirty);
}

#[test]
fn set_opts_rerenders() {
    let (mut c, rec) = controller();
    c.composite();
    let opts = AccordionOpts {
        canvas_mode: crate::raster::rasterize::CanvasMode::Frame,
        ..AccordionOpts::default()
    };
    c.set_opts(opts).unwrap();
    assert!(!c.composite().dirty);
    assert_eq!(rec.events(), vec![Event::Ready(300), Event::Ready(300)]);
}

#[test]
fn lazy_set_opts_never_serves_old_options_clean() {
    let lazy = AccordionOpts {
        cache_policy: CachePolicy::Lazy,
        ..AccordionOpts::default()
    };
    let mut c =
        AccordionController::with_opts(Size::new(300.0, 100.0), 3, lazy.clone()).unwrap();
    c.attach_content(content());
    c.set_frame(Size::new(150.0, 100.0), false).unwrap();
    c.composite();

    let shaded = AccordionOpts {
        shading: 1.0,
        ..lazy
    };
    c.set_opts(shaded.clone()).unwrap();
    c.composite();
    c.flush();
    let comp = c.composite();
    assert!(!comp.dirty);

    let mut eager = AccordionController::with_opts(
        Size::new(300.0, 100.0),
        3,
        AccordionOpts {
            cache_policy: CachePolicy::Eager,
            ..shaded
        },
    )
    .unwrap();
    eager.attach_content(content());
    eager.set_frame(Size::new(150.0, 100.0), false).unwrap();
    assert_eq!(
        comp.image.unwrap().fingerprint(),
        eager.composite().image.unwrap().fingerprint()
    );
}

#[test]
fn content_changed_supersedes_lazy_render() {
    let lazy = AccordionOpts {
        cache_policy: CachePolicy::Lazy,
        ..AccordionOpts::default()
    };
    let mut c = AccordionController::with_opts(Size::new(300.0, 100.0), 3, lazy).unwrap();
    c.attach_content(content());
    c.composite();
    c.content_changed();
    c.composite();
    c.flush();
    let comp = c.composite();
    assert!(!comp.dirty);
    assert_eq!(comp.image.unwrap().width, 300);
}
