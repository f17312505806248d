use super::*;

#[test]
fn orthographic_ignores_depth_exactly() {
    for z in [-1000.0, -1.0, 0.0, 0.5, 1e9] {
        let p = project(Point3::new(12.25, -7.5, z), 0.0).unwrap();
        assert_eq!(p, Point::new(12.25, -7.5));
    }
}

#[test]
fn perspective_scales_by_distance_ratio() {
    let p = project(Point3::new(100.0, 50.0, 100.0), 100.0).unwrap();
    assert!((p.x - 50.0).abs() < 1e-12);
    assert!((p.y - 25.0).abs() < 1e-12);

    // Points in the screen plane never move.
    let q = project(Point3::new(3.0, 4.0, 0.0), 42.0).unwrap();
    assert_eq!(q, Point::new(3.0, 4.0));
}

#[test]
fn negative_and_nan_distance_are_invalid() {
    assert!(matches!(
        project(Point3::default(), -1.0),
        Err(AccordionError::InvalidParameter(_))
    ));
    assert!(matches!(
        Projector::new(f64::NAN),
        Err(AccordionError::InvalidParameter(_))
    ));
}

#[test]
fn converges_to_orthographic_for_large_distance() {
    let pt = Point3::new(200.0, 80.0, 40.0);
    let ortho = project(pt, 0.0).unwrap();
    let mut prev = f64::INFINITY;
    for d in [1e2, 1e3, 1e4, 1e6, 1e9] {
        let p = project(pt, d).unwrap();
        let err = (p - ortho).hypot();
        assert!(err < prev, "error must shrink as distance grows");
        prev = err;
    }
    assert!(prev < 1e-4);
    assert_eq!(project(pt, f64::INFINITY).unwrap(), ortho);
}

#[test]
fn vanishing_point_is_fixed_under_projection() {
    let vp = Point::new(150.0, 50.0);
    let proj = Projector::new(300.0).unwrap().with_vanishing_point(vp);
    let p = proj.project(Point3::new(150.0, 50.0, 120.0)).unwrap();
    assert!((p - vp).hypot() < 1e-12);

    let q = proj.project(Point3::new(250.0, 50.0, 300.0)).unwrap();
    assert!((q.x - 200.0).abs() < 1e-12);
}

#[test]
fn point_behind_viewer_is_degenerate() {
    let proj = Projector::new(10.0).unwrap();
    assert!(matches!(
        proj.project(Point3::new(0.0, 0.0, -10.0)),
        Err(AccordionError::DegenerateGeometry(_))
    ));
    assert!(proj.scale_at(-9.0).unwrap() > 1.0);
}

#[test]
fn project_all_preserves_order() {
    let proj = Projector::orthographic();
    let out = proj
        .project_all([Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0)])
        .unwrap();
    assert_eq!(out, [Point::new(1.0, 2.0), Point::new(4.0, 5.0)]);
}
