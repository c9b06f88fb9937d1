//! Pure image transformations.
//!
//! Every function takes the source buffer by reference and returns a new
//! buffer; nothing here mutates its input. Only 8-bit layouts are accepted
//! (`L8`, `La8`, `Rgb8`, `Rgba8`) and alpha is carried through untouched.

use image::{DynamicImage, GenericImageView, GrayImage, imageops::FilterType};
use imageproc::edges::canny;
use super::error::{EditorError, EditorResult};

pub const MAX_DIMENSION: u32 = 10_000;
pub const MAX_BLUR_RADIUS: f32 = 100.0;
/// Radii below this leave every pixel as it was and are treated as 0.
pub const MIN_BLUR_RADIUS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation { Cw90, Cw180, Cw270 }

impl Rotation {
    pub fn from_degrees(degrees: i32) -> EditorResult<Self> {
        match degrees.rem_euclid(360) {
            90 => Ok(Rotation::Cw90),
            180 => Ok(Rotation::Cw180),
            270 => Ok(Rotation::Cw270),
            _ => Err(EditorError::invalid(format!("rotation must be 90, 180 or 270 degrees, got {degrees}"))),
        }
    }

    pub fn degrees(&self) -> u32 {
        match self { Rotation::Cw90 => 90, Rotation::Cw180 => 180, Rotation::Cw270 => 270 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis { Horizontal, Vertical }

/// A user-selectable edit together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Blur { radius: f32 },
    Brightness { offset: f32 },
    Contrast { scale: f32 },
    Grayscale,
    Edges { low: f32, high: f32 },
    Rotate(Rotation),
    Flip(FlipAxis),
    Resize { width: u32, height: u32 },
}

impl Operation {
    pub fn apply(&self, img: &DynamicImage) -> EditorResult<DynamicImage> {
        match *self {
            Operation::Blur { radius } => blur(img, radius),
            Operation::Brightness { offset } => brightness(img, offset),
            Operation::Contrast { scale } => contrast(img, scale),
            Operation::Grayscale => grayscale(img),
            Operation::Edges { low, high } => edges(img, low, high),
            Operation::Rotate(rotation) => rotate(img, rotation),
            Operation::Flip(axis) => flip(img, axis),
            Operation::Resize { width, height } => resize(img, width, height),
        }
    }

    /// Short description shown in history menus and the status bar.
    pub fn label(&self) -> String {
        match self {
            Operation::Blur { radius } => format!("Blur (radius {radius:.1})"),
            Operation::Brightness { offset } => format!("Brightness ({offset:+.0})"),
            Operation::Contrast { scale } => format!("Contrast (x{scale:.2})"),
            Operation::Grayscale => "Grayscale".to_string(),
            Operation::Edges { low, high } => format!("Edge Detect ({low:.0}/{high:.0})"),
            Operation::Rotate(r) => format!("Rotate {}°", r.degrees()),
            Operation::Flip(FlipAxis::Horizontal) => "Flip Horizontal".to_string(),
            Operation::Flip(FlipAxis::Vertical) => "Flip Vertical".to_string(),
            Operation::Resize { width, height } => format!("Resize to {width}x{height}"),
        }
    }
}

fn ensure_supported(img: &DynamicImage) -> EditorResult<()> {
    match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Ok(()),
        other => Err(EditorError::unsupported(format!("{:?} pixel layout is not supported", other.color()))),
    }
}

fn has_alpha(img: &DynamicImage) -> bool { img.color().has_alpha() }

// Runs every colour channel through a 256-entry table, alpha excluded.
fn map_color_channels(img: &DynamicImage, f: impl Fn(u8) -> u8) -> EditorResult<DynamicImage> {
    let lut: [u8; 256] = std::array::from_fn(|v| f(v as u8));
    let mut out: DynamicImage = img.clone();
    let (bytes, stride, color): (&mut [u8], usize, usize) = match &mut out {
        DynamicImage::ImageLuma8(buf) => (&mut **buf, 1, 1),
        DynamicImage::ImageLumaA8(buf) => (&mut **buf, 2, 1),
        DynamicImage::ImageRgb8(buf) => (&mut **buf, 3, 3),
        DynamicImage::ImageRgba8(buf) => (&mut **buf, 4, 3),
        other => return Err(EditorError::unsupported(format!("{:?} pixel layout is not supported", other.color()))),
    };
    for px in bytes.chunks_exact_mut(stride) {
        for c in &mut px[..color] { *c = lut[*c as usize]; }
    }
    Ok(out)
}

fn clamp_channel(v: f32) -> u8 { v.round().clamp(0.0, 255.0) as u8 }

pub fn blur(img: &DynamicImage, radius: f32) -> EditorResult<DynamicImage> {
    ensure_supported(img)?;
    if !radius.is_finite() || !(0.0..=MAX_BLUR_RADIUS).contains(&radius) {
        return Err(EditorError::invalid(format!("blur radius must be between 0 and {MAX_BLUR_RADIUS}, got {radius}")));
    }
    if radius < MIN_BLUR_RADIUS { return Ok(img.clone()); }
    Ok(img.blur(radius))
}

pub fn brightness(img: &DynamicImage, offset: f32) -> EditorResult<DynamicImage> {
    ensure_supported(img)?;
    if !offset.is_finite() {
        return Err(EditorError::invalid(format!("brightness offset must be a finite number, got {offset}")));
    }
    map_color_channels(img, |v| clamp_channel(v as f32 + offset))
}

pub fn contrast(img: &DynamicImage, scale: f32) -> EditorResult<DynamicImage> {
    ensure_supported(img)?;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(EditorError::invalid(format!("contrast scale must be positive, got {scale}")));
    }
    map_color_channels(img, |v| clamp_channel((v as f32 - 128.0) * scale + 128.0))
}

pub fn grayscale(img: &DynamicImage) -> EditorResult<DynamicImage> {
    ensure_supported(img)?;
    let gray: DynamicImage = img.grayscale();
    Ok(if has_alpha(img) { DynamicImage::ImageRgba8(gray.to_rgba8()) } else { DynamicImage::ImageRgb8(gray.to_rgb8()) })
}

/// Canny edge map, white edges on black.
///
/// Thresholds apply to the Sobel gradient magnitude of the smoothed grey
/// image. `high` is raised to `low + 1` when it does not exceed `low`.
pub fn edges(img: &DynamicImage, low: f32, high: f32) -> EditorResult<DynamicImage> {
    ensure_supported(img)?;
    if !low.is_finite() || !high.is_finite() || low < 0.0 || high < 0.0 {
        return Err(EditorError::invalid(format!("edge thresholds must be zero or positive, got {low} and {high}")));
    }
    let high: f32 = high.max(low + 1.0);
    let gray: GrayImage = img.to_luma8();
    let map: GrayImage = if gray.width() == 0 || gray.height() == 0 { gray } else { canny(&gray, low, high) };

    if has_alpha(img) {
        let mut rgba = DynamicImage::ImageLuma8(map).to_rgba8();
        let src = img.to_rgba8();
        for (dst, s) in rgba.pixels_mut().zip(src.pixels()) { dst.0[3] = s.0[3]; }
        Ok(DynamicImage::ImageRgba8(rgba))
    } else {
        Ok(DynamicImage::ImageRgb8(DynamicImage::ImageLuma8(map).to_rgb8()))
    }
}

pub fn rotate(img: &DynamicImage, rotation: Rotation) -> EditorResult<DynamicImage> {
    ensure_supported(img)?;
    Ok(match rotation {
        Rotation::Cw90 => img.rotate90(),
        Rotation::Cw180 => img.rotate180(),
        Rotation::Cw270 => img.rotate270(),
    })
}

pub fn flip(img: &DynamicImage, axis: FlipAxis) -> EditorResult<DynamicImage> {
    ensure_supported(img)?;
    Ok(match axis {
        FlipAxis::Horizontal => img.fliph(),
        FlipAxis::Vertical => img.flipv(),
    })
}

pub fn resize(img: &DynamicImage, width: u32, height: u32) -> EditorResult<DynamicImage> {
    ensure_supported(img)?;
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(EditorError::invalid(format!(
            "size must be between 1 and {MAX_DIMENSION} pixels per side, got {width}x{height}"
        )));
    }
    if (width, height) == img.dimensions() { return Ok(img.clone()); }
    Ok(img.resize_exact(width, height, FilterType::Lanczos3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba, RgbImage};
    use proptest::prelude::*;

    fn gradient(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x * 255 / w.max(1)) as u8, (y * 255 / h.max(1)) as u8, ((x + y) % 256) as u8])
        }))
    }

    fn split(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, _| if x < w / 2 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }))
    }

    #[test]
    fn blur_radius_zero_is_identity() {
        let img = gradient(32, 24);
        let out = blur(&img, 0.0).unwrap();
        assert_eq!(out.as_bytes(), img.as_bytes());
        assert_eq!(out.dimensions(), img.dimensions());
    }

    #[test]
    fn blur_smooths_hard_edges() {
        let img = split(20, 4);
        let out = blur(&img, 2.0).unwrap().to_rgb8();
        let mid = out.get_pixel(10, 2).0[0];
        assert!(mid > 0 && mid < 255, "got {mid}");
    }

    #[test]
    fn blur_rejects_negative_and_nan() {
        let img = gradient(4, 4);
        assert!(matches!(blur(&img, -1.0), Err(EditorError::InvalidParameter(_))));
        assert!(matches!(blur(&img, f32::NAN), Err(EditorError::InvalidParameter(_))));
    }

    #[test]
    fn blur_rejects_radius_above_limit() {
        let img = gradient(16, 16);
        assert!(matches!(blur(&img, MAX_BLUR_RADIUS + 1.0), Err(EditorError::InvalidParameter(_))));
        assert!(matches!(blur(&img, 1.0e9), Err(EditorError::InvalidParameter(_))));
        assert!(matches!(blur(&img, f32::MAX), Err(EditorError::InvalidParameter(_))));
        let widest = blur(&img, MAX_BLUR_RADIUS).unwrap();
        assert_eq!(widest.dimensions(), img.dimensions());
    }

    #[test]
    fn tiny_blur_radius_is_identity() {
        let img = gradient(16, 16);
        for radius in [1.0e-30, 1.0e-3, 0.05, 0.1, MIN_BLUR_RADIUS - 0.01] {
            assert_eq!(blur(&img, radius).unwrap().as_bytes(), img.as_bytes(), "radius {radius}");
        }
    }

    #[test]
    fn brightness_adds_and_clamps() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([10, 128, 250])));
        let up = brightness(&img, 50.0).unwrap().to_rgb8();
        assert_eq!(up.get_pixel(0, 0).0, [60, 178, 255]);
        let down = brightness(&img, -100.0).unwrap().to_rgb8();
        assert_eq!(down.get_pixel(1, 1).0, [0, 28, 150]);
    }

    #[test]
    fn brightness_extremes_stay_in_range() {
        let img = gradient(16, 16);
        let white = brightness(&img, f32::MAX).unwrap();
        assert!(white.as_bytes().iter().all(|&b| b == 255));
        let black = brightness(&img, -1.0e9).unwrap();
        assert!(black.as_bytes().iter().all(|&b| b == 0));
        assert!(matches!(brightness(&img, f32::INFINITY), Err(EditorError::InvalidParameter(_))));
    }

    #[test]
    fn contrast_scales_around_midpoint() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([128, 100, 200])));
        let out = contrast(&img, 2.0).unwrap().to_rgb8();
        assert_eq!(out.get_pixel(0, 0).0, [128, 72, 255]);
        let flat = contrast(&img, 0.5).unwrap().to_rgb8();
        assert_eq!(flat.get_pixel(0, 0).0, [128, 114, 164]);
    }

    #[test]
    fn contrast_extremes_stay_in_range() {
        let img = gradient(16, 16);
        let out = contrast(&img, 1.0e30).unwrap();
        assert!(out.as_bytes().iter().all(|&b| b == 0 || b == 128 || b == 255));
        let tiny = contrast(&img, f32::MIN_POSITIVE).unwrap();
        assert!(tiny.as_bytes().iter().all(|&b| b == 128));
    }

    #[test]
    fn contrast_rejects_non_positive_scale() {
        let img = gradient(4, 4);
        assert!(matches!(contrast(&img, 0.0), Err(EditorError::InvalidParameter(_))));
        assert!(matches!(contrast(&img, -2.0), Err(EditorError::InvalidParameter(_))));
    }

    #[test]
    fn alpha_is_preserved() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(3, 3, Rgba([100, 100, 100, 77])));
        let out = brightness(&img, 80.0).unwrap().to_rgba8();
        assert_eq!(out.get_pixel(1, 1).0, [180, 180, 180, 77]);
        let out = contrast(&img, 3.0).unwrap().to_rgba8();
        assert_eq!(out.get_pixel(0, 0).0[3], 77);
    }

    #[test]
    fn sixteen_bit_buffers_are_unsupported() {
        let img = DynamicImage::ImageRgb16(ImageBuffer::new(2, 2));
        assert!(matches!(blur(&img, 0.0), Err(EditorError::UnsupportedFormat(_))));
        assert!(matches!(brightness(&img, 1.0), Err(EditorError::UnsupportedFormat(_))));
        assert!(matches!(contrast(&img, 1.0), Err(EditorError::UnsupportedFormat(_))));
    }

    #[test]
    fn input_is_left_untouched() {
        let img = gradient(8, 8);
        let copy = img.clone();
        let _ = brightness(&img, 90.0).unwrap();
        let _ = contrast(&img, 2.5).unwrap();
        assert_eq!(img.as_bytes(), copy.as_bytes());
    }

    #[test]
    fn grayscale_equalizes_channels_and_keeps_layout() {
        let out = grayscale(&gradient(8, 8)).unwrap();
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
        for p in out.to_rgb8().pixels() { assert!(p.0[0] == p.0[1] && p.0[1] == p.0[2]); }
    }

    #[test]
    fn edges_find_the_boundary() {
        let out = edges(&split(16, 8), 50.0, 150.0).unwrap().to_rgb8();
        let row: Vec<u8> = (0..16).map(|x| out.get_pixel(x, 4).0[0]).collect();
        assert!(row[7] == 255 || row[8] == 255, "row {row:?}");
        assert_eq!(out.get_pixel(2, 4).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(14, 4).0, [0, 0, 0]);
    }

    #[test]
    fn edges_keep_alpha() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_fn(12, 6, |x, _| {
            if x < 6 { Rgba([0, 0, 0, 90]) } else { Rgba([255, 255, 255, 90]) }
        }));
        let out = edges(&img, 50.0, 150.0).unwrap();
        assert!(matches!(out, DynamicImage::ImageRgba8(_)));
        assert!(out.to_rgba8().pixels().all(|p| p.0[3] == 90));
    }

    #[test]
    fn edges_on_flat_image_are_empty() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([90, 90, 90])));
        let out = edges(&img, 0.0, 1.0).unwrap();
        assert!(out.as_bytes().iter().all(|&b| b == 0));
        assert!(matches!(edges(&img, -1.0, 10.0), Err(EditorError::InvalidParameter(_))));
    }

    #[test]
    fn rotate_and_flip_reshape() {
        let img = gradient(6, 3);
        assert_eq!(rotate(&img, Rotation::Cw90).unwrap().dimensions(), (3, 6));
        assert_eq!(rotate(&img, Rotation::Cw180).unwrap().dimensions(), (6, 3));
        let flipped = flip(&img, FlipAxis::Horizontal).unwrap().to_rgb8();
        assert_eq!(flipped.get_pixel(0, 0), img.to_rgb8().get_pixel(5, 0));
        assert_eq!(Rotation::from_degrees(-90).unwrap(), Rotation::Cw270);
        assert!(Rotation::from_degrees(45).is_err());
    }

    #[test]
    fn resize_validates_dimensions() {
        let img = gradient(10, 10);
        assert_eq!(resize(&img, 4, 7).unwrap().dimensions(), (4, 7));
        assert!(matches!(resize(&img, 0, 7), Err(EditorError::InvalidParameter(_))));
        assert!(matches!(resize(&img, 5, MAX_DIMENSION + 1), Err(EditorError::InvalidParameter(_))));
    }

    proptest! {
        #[test]
        fn brightness_never_leaves_channel_range(offset in -1.0e30f32..1.0e30f32, v in any::<u8>()) {
            let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(2, 2, Rgba([v, 255 - v, v / 2, 33])));
            let out = brightness(&img, offset).unwrap().to_rgba8();
            let expected = (v as f32 + offset).round().clamp(0.0, 255.0) as u8;
            prop_assert_eq!(out.get_pixel(0, 0).0[0], expected);
            prop_assert_eq!(out.get_pixel(1, 1).0[3], 33);
        }

        #[test]
        fn contrast_never_leaves_channel_range(scale in 1.0e-30f32..1.0e30f32, v in any::<u8>()) {
            let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([v, 128, 255 - v])));
            let out = contrast(&img, scale).unwrap().to_rgb8();
            let expected = ((v as f32 - 128.0) * scale + 128.0).round().clamp(0.0, 255.0) as u8;
            prop_assert_eq!(out.get_pixel(0, 0).0[0], expected);
            prop_assert_eq!(out.get_pixel(1, 0).0[1], 128);
        }
    }

    #[test]
    fn operation_dispatch_and_labels() {
        let img = gradient(4, 4);
        let op = Operation::Brightness { offset: 20.0 };
        assert_eq!(op.apply(&img).unwrap().as_bytes(), brightness(&img, 20.0).unwrap().as_bytes());
        assert_eq!(op.label(), "Brightness (+20)");
        assert_eq!(Operation::Blur { radius: 3.0 }.label(), "Blur (radius 3.0)");
        assert_eq!(Operation::Rotate(Rotation::Cw90).label(), "Rotate 90°");
    }
}
