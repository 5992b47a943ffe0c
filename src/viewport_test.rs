#![allow(clippy::float_cmp)]

use super::*;

const TOLERANCE: f32 = 0.011;

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= TOLERANCE && (a.y - b.y).abs() <= TOLERANCE
}

fn viewport(surface_w: f32, surface_h: f32) -> Viewport {
    let mut vp = Viewport::new(2125.0, 2750.0);
    vp.set_surface_size(surface_w, surface_h);
    vp
}

// --- Point ---

#[test]
fn point_distance() {
    assert_eq!(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0);
}

#[test]
fn point_default_is_origin() {
    assert_eq!(Point::default(), Point::new(0.0, 0.0));
}

// --- view rect ---

#[test]
fn view_rect_follows_transform_and_surface() {
    let mut vp = viewport(1000.0, 800.0);
    vp.set_transform(2.0, -100.0, -50.0);
    let view = vp.view_rect();
    assert_eq!(view.x, 100.0);
    assert_eq!(view.y, 50.0);
    assert_eq!(view.width, 500.0);
    assert_eq!(view.height, 400.0);
}

#[test]
fn surface_resize_recomputes_view() {
    let mut vp = viewport(100.0, 100.0);
    vp.set_surface_size(400.0, 200.0);
    assert_eq!(vp.view_rect().width, 400.0);
    assert_eq!(vp.view_rect().height, 200.0);
    assert_eq!(vp.surface_size(), (400.0, 200.0));
}

// --- screen_to_model ---

#[test]
fn screen_to_model_identity() {
    let vp = viewport(1000.0, 800.0);
    assert_eq!(vp.screen_to_model(Point::new(50.0, 75.0)), Point::new(50.0, 75.0));
}

#[test]
fn screen_to_model_applies_scale_and_translation() {
    let mut vp = viewport(1000.0, 800.0);
    vp.set_transform(4.0, -10.0, -20.0);
    let model = vp.screen_to_model(Point::new(40.0, 80.0));
    assert_eq!(model, Point::new(20.0, 40.0));
}

#[test]
fn screen_to_model_clamps_to_page() {
    let mut vp = viewport(1000.0, 800.0);
    vp.set_transform(1.0, 50.0, 50.0);
    assert_eq!(vp.screen_to_model(Point::new(10.0, 10.0)), Point::new(0.0, 0.0));

    vp.set_transform(0.5, 0.0, 0.0);
    assert_eq!(vp.screen_to_model(Point::new(5000.0, 5000.0)), Point::new(2125.0, 2750.0));
}

#[test]
fn screen_to_model_rounds_to_two_decimals() {
    let mut vp = viewport(1000.0, 800.0);
    vp.set_transform(3.0, 0.0, 0.0);
    let model = vp.screen_to_model(Point::new(10.0, 20.0));
    assert!((model.x - 3.33).abs() < 1e-4);
    assert!((model.y - 6.67).abs() < 1e-4);
}

#[test]
fn model_to_screen_inverts_screen_to_model() {
    let mut vp = viewport(1000.0, 800.0);
    vp.set_transform(2.0, -30.0, -40.0);
    let screen = vp.model_to_screen(Point::new(80.0, 90.0));
    assert_eq!(screen, Point::new(100.0, 100.0));
    assert!(close(vp.screen_to_model(screen), Point::new(80.0, 90.0)));
}

// --- zoom ---

#[test]
fn zoom_keeps_focus_anchored() {
    let mut vp = viewport(1000.0, 800.0);
    let focus = Point::new(300.0, 200.0);
    let before = vp.screen_to_model(focus);

    assert!(vp.apply_zoom(focus, 2.0));
    assert_eq!(vp.scale(), 2.0);
    assert!(close(vp.screen_to_model(focus), before));
}

#[test]
fn zoom_anchoring_holds_across_focus_points_and_factors() {
    let foci = [Point::new(0.0, 0.0), Point::new(123.4, 567.8), Point::new(999.0, 799.0), Point::new(512.0, 1.5)];
    let factors = [0.5, 0.9, 1.0, 1.37, 2.5, 4.0];
    for focus in foci {
        for factor in factors {
            let mut vp = viewport(1000.0, 800.0);
            vp.set_transform(1.25, -200.0, -300.0);
            let before = vp.screen_to_model(focus);
            assert!(vp.apply_zoom(focus, factor));
            let after = vp.screen_to_model(focus);
            assert!(close(after, before), "focus {focus:?} factor {factor}: {before:?} -> {after:?}");
        }
    }
}

#[test]
fn incremental_zoom_multiplies_scale() {
    let mut vp = viewport(1000.0, 800.0);
    let focus = Point::new(500.0, 400.0);
    vp.begin_zoom(focus);
    assert!(vp.update_zoom(focus, 2.0));
    assert!(vp.update_zoom(focus, 1.5));
    vp.end_zoom();
    assert_eq!(vp.scale(), 3.0);
}

#[test]
fn drifting_focus_keeps_model_point_under_fingers() {
    let mut vp = viewport(1000.0, 800.0);
    let start = Point::new(400.0, 300.0);
    let anchored = vp.screen_to_model(start);

    vp.begin_zoom(start);
    let moved = Point::new(450.0, 320.0);
    assert!(vp.update_zoom(moved, 1.2));
    assert!(close(vp.screen_to_model(moved), anchored));
}

#[test]
fn unit_factor_with_moved_focus_pans() {
    let mut vp = viewport(1000.0, 800.0);
    vp.begin_zoom(Point::new(100.0, 100.0));
    assert!(vp.update_zoom(Point::new(130.0, 90.0), 1.0));
    assert_eq!(vp.scale(), 1.0);
    assert_eq!(vp.translation(), (30.0, -10.0));
}

#[test]
fn zoom_translation_is_negated_view_origin() {
    let mut vp = viewport(1000.0, 800.0);
    vp.apply_zoom(Point::new(250.0, 250.0), 2.0);
    let view = vp.view_rect();
    assert_eq!(vp.translation(), (-view.x, -view.y));
    assert_eq!(view.width, 500.0);
}

#[test]
fn update_without_begin_is_ignored() {
    let mut vp = viewport(1000.0, 800.0);
    assert!(!vp.update_zoom(Point::new(10.0, 10.0), 2.0));
    assert_eq!(vp.scale(), 1.0);
}

#[test]
fn non_positive_or_non_finite_factor_is_ignored() {
    let mut vp = viewport(1000.0, 800.0);
    vp.begin_zoom(Point::new(10.0, 10.0));
    assert!(!vp.update_zoom(Point::new(10.0, 10.0), 0.0));
    assert!(!vp.update_zoom(Point::new(10.0, 10.0), -1.0));
    assert!(!vp.update_zoom(Point::new(10.0, 10.0), f32::NAN));
    assert!(!vp.update_zoom(Point::new(10.0, 10.0), f32::INFINITY));
    assert_eq!(vp.scale(), 1.0);
    assert!(vp.is_zooming());
}

#[test]
fn zoom_out_is_not_clamped() {
    let mut vp = viewport(1000.0, 800.0);
    let focus = Point::new(0.0, 0.0);
    for _ in 0..10 {
        vp.apply_zoom(focus, 0.5);
    }
    assert!(vp.scale() < 0.001);
    assert!(vp.scale() > 0.0);
}

#[test]
fn set_transform_cancels_gesture() {
    let mut vp = viewport(1000.0, 800.0);
    vp.begin_zoom(Point::new(1.0, 1.0));
    vp.set_transform(1.0, 0.0, 0.0);
    assert!(!vp.is_zooming());
}
