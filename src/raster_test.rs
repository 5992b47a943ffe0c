use super::*;
use crate::config::{DEFAULT_BACKDROP, DEFAULT_BACKGROUND};
use crate::drawing::{ColorAlias, Stroke};
use crate::viewport::Point;

fn scene() -> Scene {
    Scene::new(100, 100, DEFAULT_BACKGROUND, DEFAULT_BACKDROP).unwrap()
}

fn segment(from: (f32, f32), to: (f32, f32), girth: f32) -> Segment {
    Segment {
        from: Point::new(from.0, from.1),
        to: Point::new(to.0, to.1),
        girth,
        color: ColorAlias::Black,
        alpha: 255,
    }
}

fn alpha_at(pixmap: &Pixmap, x: u32, y: u32) -> u8 {
    pixmap.pixel(x, y).unwrap().alpha()
}

fn red_at(pixmap: &Pixmap, x: u32, y: u32) -> u8 {
    pixmap.pixel(x, y).unwrap().red()
}

#[test]
fn zero_sized_scene_is_an_error() {
    let err = Scene::new(0, 100, DEFAULT_BACKGROUND, DEFAULT_BACKDROP).err().unwrap();
    assert!(matches!(err, RasterError::Allocation { width: 0, height: 100 }));
}

#[test]
fn new_scene_is_transparent() {
    let s = scene();
    assert_eq!(alpha_at(s.bitmap(), 50, 50), 0);
    assert_eq!(s.transform(), (1.0, 0.0, 0.0));
}

#[test]
fn draw_segment_paints_line() {
    let mut s = scene();
    s.draw_segment(&segment((10.0, 50.0), (90.0, 50.0), 10.0), Rgb::new(0, 0, 0));
    assert_eq!(alpha_at(s.bitmap(), 50, 50), 255);
    assert_eq!(alpha_at(s.bitmap(), 50, 10), 0);
}

#[test]
fn draw_segment_paints_dot_for_first_sample() {
    let mut s = scene();
    s.draw_segment(&segment((20.0, 20.0), (20.0, 20.0), 10.0), Rgb::new(0, 0, 0));
    assert_eq!(alpha_at(s.bitmap(), 20, 20), 255);
    assert_eq!(alpha_at(s.bitmap(), 40, 40), 0);
}

#[test]
fn zero_girth_dot_still_marks() {
    let mut s = scene();
    s.draw_segment(&segment((30.5, 30.5), (30.5, 30.5), 0.0), Rgb::new(0, 0, 0));
    assert!(alpha_at(s.bitmap(), 30, 30) > 0);
}

#[test]
fn unpaintable_girths_are_skipped() {
    let mut s = scene();
    for girth in [f32::NAN, f32::INFINITY, -4.0] {
        s.draw_segment(&segment((10.0, 50.0), (90.0, 50.0), girth), Rgb::new(0, 0, 0));
    }
    s.draw_segment(&segment((20.0, 20.0), (20.0, 20.0), f32::NAN), Rgb::new(0, 0, 0));
    assert_eq!(alpha_at(s.bitmap(), 50, 50), 0);
    assert_eq!(alpha_at(s.bitmap(), 20, 20), 0);
}

#[test]
fn repaint_clears_and_redraws() {
    let mut s = scene();
    s.draw_segment(&segment((10.0, 10.0), (90.0, 10.0), 6.0), Rgb::new(0, 0, 0));

    let mut stroke = Stroke::new(Point::new(10.0, 80.0), 6.0, ColorAlias::Red, 255);
    stroke.push(Point::new(90.0, 80.0), 6.0);
    let drawing = Drawing { strokes: vec![stroke], ..Drawing::default() };
    s.repaint(&drawing);

    assert_eq!(alpha_at(s.bitmap(), 50, 10), 0);
    assert_eq!(alpha_at(s.bitmap(), 50, 80), 255);
    assert_eq!(red_at(s.bitmap(), 50, 80), ColorAlias::Red.default_rgb().r);
}

#[test]
fn repaint_of_empty_drawing_is_blank() {
    let mut s = scene();
    s.draw_segment(&segment((10.0, 10.0), (90.0, 90.0), 6.0), Rgb::new(0, 0, 0));
    s.repaint(&Drawing::new());
    assert!(s.bitmap().pixels().iter().all(|p| p.alpha() == 0));
}

#[test]
fn repaint_draws_single_point_strokes_as_dots() {
    let mut s = scene();
    let drawing = Drawing {
        strokes: vec![Stroke::new(Point::new(60.0, 60.0), 8.0, ColorAlias::Black, 255)],
        ..Drawing::default()
    };
    s.repaint(&drawing);
    assert_eq!(alpha_at(s.bitmap(), 60, 60), 255);
}

#[test]
fn paint_frame_shows_backdrop_outside_page() {
    let s = scene();
    let mut target = Pixmap::new(200, 200).unwrap();
    s.paint_frame(&mut target);

    assert_eq!(red_at(&target, 50, 50), DEFAULT_BACKGROUND.r);
    assert_eq!(red_at(&target, 150, 150), DEFAULT_BACKDROP.r);
}

#[test]
fn paint_frame_applies_scale() {
    let mut s = scene();
    s.draw_segment(&segment((40.0, 40.0), (40.0, 40.0), 10.0), Rgb::new(0, 0, 0));
    s.set_transform(2.0, 0.0, 0.0);
    let mut target = Pixmap::new(200, 200).unwrap();
    s.paint_frame(&mut target);

    // Dot at model (40, 40) lands at screen (80, 80); the page now fills the target.
    assert_eq!(red_at(&target, 80, 80), 0);
    assert_eq!(red_at(&target, 150, 150), DEFAULT_BACKGROUND.r);
}

#[test]
fn paint_frame_applies_translation() {
    let mut s = scene();
    s.set_transform(1.0, 50.0, 50.0);
    let mut target = Pixmap::new(200, 200).unwrap();
    s.paint_frame(&mut target);

    assert_eq!(red_at(&target, 10, 10), DEFAULT_BACKDROP.r);
    assert_eq!(red_at(&target, 100, 100), DEFAULT_BACKGROUND.r);
}

#[test]
fn every_change_bumps_version() {
    let mut s = scene();
    let v0 = s.version();
    s.set_transform(2.0, 1.0, 1.0);
    let v1 = s.version();
    s.draw_segment(&segment((1.0, 1.0), (2.0, 2.0), 1.0), Rgb::new(0, 0, 0));
    let v2 = s.version();
    s.repaint(&Drawing::new());
    let v3 = s.version();
    s.reallocate().unwrap();
    let v4 = s.version();
    assert!(v0 < v1 && v1 < v2 && v2 < v3 && v3 < v4);
}
