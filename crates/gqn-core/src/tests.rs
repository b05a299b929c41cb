use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;

use crate::camera::PerspectiveCamera;
use crate::frame::{PixelLayout, make_uint8, to_rgb_image};
use crate::layout::FigureLayout;
use crate::orbit::{OrbitPath, pitch, query_viewpoint, yaw};

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-5,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_make_uint8_range() {
    assert_eq!(make_uint8(-1.0), 0);
    assert_eq!(make_uint8(1.0), 255);
    assert_eq!(make_uint8(0.0), 128);
    assert_eq!(make_uint8(-5.0), 0);
    assert_eq!(make_uint8(7.5), 255);

    for step in 0..=200 {
        let x = -1.0 + step as f32 * 0.01;
        let expected = ((x + 1.0) * 0.5 * 255.0).clamp(0.0, 255.0).round() as u8;
        assert_eq!(make_uint8(x), expected);
    }
}

#[test]
fn test_rgb_image_from_chw() {
    // 1x2 image: red pixel then blue pixel
    let values = [1.0, -1.0, -1.0, -1.0, -1.0, 1.0];
    let image = to_rgb_image(&values, PixelLayout::Chw, 1, 2).unwrap();

    assert_eq!(image.dimensions(), (2, 1));
    assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0]);
    assert_eq!(image.get_pixel(1, 0).0, [0, 0, 255]);
}

#[test]
fn test_rgb_image_from_hwc() {
    let values = [1.0, -1.0, -1.0, -1.0, -1.0, 1.0];
    let image = to_rgb_image(&values, PixelLayout::Hwc, 1, 2).unwrap();

    assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0]);
    assert_eq!(image.get_pixel(1, 0).0, [0, 0, 255]);
}

#[test]
fn test_rgb_image_wrong_size() {
    let result = to_rgb_image(&[0.0; 5], PixelLayout::Hwc, 1, 2);
    assert!(result.is_err());
}

#[test]
fn test_orbit_eye_positions() {
    let orbit = OrbitPath::default();
    assert_eq!(orbit.total_frames, 100);

    for tick in 0..orbit.total_frames {
        let azimuth = TAU * tick as f32 / 100.0;
        let eye = orbit.eye(tick);
        assert_eq!(orbit.azimuth(tick), azimuth);
        assert_eq!(eye, Vec3::new(3.0 * azimuth.cos(), 1.0, 3.0 * azimuth.sin()));
    }
}

#[test]
fn test_orbit_frames_cover_full_circle() {
    let orbit = OrbitPath::default();
    let frames: Vec<_> = orbit.frames().collect();

    assert_eq!(frames.len(), 100);
    assert_eq!(frames[0].tick, 0);
    assert_eq!(frames[0].azimuth, 0.0);
    assert!(frames[99].azimuth < TAU);
}

#[test]
fn test_yaw_and_pitch() {
    let center = Vec3::ZERO;

    // Looking along +Z
    assert_close(yaw(Vec3::new(0.0, 0.0, -2.0), center), 0.0);
    // Looking along -X
    assert_close(yaw(Vec3::new(2.0, 0.0, 0.0), center), 3.0 * FRAC_PI_2);
    // Looking along -Z
    assert_close(yaw(Vec3::new(0.0, 0.0, 2.0), center), PI);

    assert_close(pitch(Vec3::new(0.0, 1.0, 1.0), center), -PI / 4.0);
    assert_close(pitch(Vec3::new(1.0, 0.0, 0.0), center), 0.0);
}

#[test]
fn test_query_duplicates_orientation_terms() {
    let eye = Vec3::new(3.0, 1.0, 0.0);
    let center = Vec3::new(0.0, 0.5, 0.0);
    let query = query_viewpoint(eye, center);

    assert_eq!(&query[0..3], &[3.0, 1.0, 0.0]);
    assert_eq!(query[3], query[4]);
    assert_eq!(query[5], query[6]);
    assert_close(query[3], 0.0);
    assert_close(query[5], -1.0 / 37.0f32.sqrt());
}

#[test]
fn test_camera_look_at() {
    let mut camera = PerspectiveCamera::default();
    assert_eq!(camera.eye, Vec3::new(3.0, 1.0, 0.0));

    camera.look_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);
    assert_eq!(camera.forward(), Vec3::new(0.0, 0.0, -1.0));

    // The target projects to the middle of the screen
    let clip = camera.projection_matrix() * camera.view_matrix() * Vec3::ZERO.extend(1.0);
    assert_close(clip.x / clip.w, 0.0);
    assert_close(clip.y / clip.w, 0.0);
}

#[test]
fn test_layout_square_batch() {
    let layout = FigureLayout::new(16);
    assert_eq!(layout.pairs_per_row, 4);
    assert_eq!(layout.rows, 4);
    assert_eq!(layout.columns(), 8);
    assert_eq!(layout.axis_count(), 32);

    let rect = layout.rect(FigureLayout::generated_axis(5));
    assert_eq!(layout.cell(11), (1, 3));
    assert_close(rect.x, 0.375);
    assert_close(rect.y, 0.25);
    assert_close(rect.width, 0.125);
    assert_close(rect.height, 0.25);
}

#[test]
fn test_layout_non_square_batch() {
    let layout = FigureLayout::new(5);
    assert_eq!(layout.pairs_per_row, 2);
    assert_eq!(layout.rows, 3);

    let last = FigureLayout::generated_axis(4);
    let (row, _) = layout.cell(last);
    assert!(row < layout.rows);
}
