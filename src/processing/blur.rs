//! Gaussian blur for shadow bitmaps.
//!
//! The shadow canvas is mostly transparent margin, so blurring happens on
//! premultiplied colour: a translucent edge pixel keeps the hue of the
//! image it came from instead of fading toward the margin's black.

use image::{Rgba, Rgba32FImage, RgbaImage, imageops};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlurBackend {
    /// `image::imageops::blur` over the premultiplied buffer.
    #[default]
    Cpu,
    /// Two one-dimensional passes with an explicit 3-sigma kernel.
    Separable,
}

/// Gaussian blur with standard deviation `sigma`. The output has the same
/// extent as the input; samples past the edge clamp to the border pixel.
pub fn apply_blur(image: &RgbaImage, sigma: f32, backend: BlurBackend) -> RgbaImage {
    if !sigma.is_finite() || sigma <= 0.0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let premultiplied = premultiply(image);
    let blurred = match backend {
        BlurBackend::Cpu => imageops::blur(&premultiplied, sigma),
        BlurBackend::Separable => separable_blur(&premultiplied, sigma),
    };
    unpremultiply(&blurred)
}

/// Normalized weights for offsets `-radius..=radius`, radius = ceil(3 sigma).
fn gaussian_kernel(sigma: f32) -> (Vec<f32>, usize) {
    let radius = (sigma.max(0.01) * 3.0).ceil() as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let d = i as f32 - radius as f32;
            (-d * d / two_sigma_sq).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    if total > 0.0 {
        weights.iter_mut().for_each(|w| *w /= total);
    }
    (weights, radius)
}

fn premultiply(image: &RgbaImage) -> Rgba32FImage {
    Rgba32FImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0.map(|c| f32::from(c) / 255.0);
        Rgba([r * a, g * a, b * a, a])
    })
}

fn unpremultiply(image: &Rgba32FImage) -> RgbaImage {
    let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = to_u8(a);
        if alpha == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        Rgba([to_u8(r / a), to_u8(g / a), to_u8(b / a), alpha])
    })
}

fn separable_blur(image: &Rgba32FImage, sigma: f32) -> Rgba32FImage {
    let (weights, radius) = gaussian_kernel(sigma);
    let rows = convolve(image, &weights, radius, Axis::Horizontal);
    convolve(&rows, &weights, radius, Axis::Vertical)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn convolve(src: &Rgba32FImage, weights: &[f32], radius: usize, axis: Axis) -> Rgba32FImage {
    let (width, height) = src.dimensions();
    let clamp = |v: i64, len: u32| v.clamp(0, i64::from(len) - 1) as u32;
    Rgba32FImage::from_fn(width, height, |x, y| {
        let mut acc = [0.0f32; 4];
        for (i, &weight) in weights.iter().enumerate() {
            let offset = i as i64 - radius as i64;
            let (sx, sy) = match axis {
                Axis::Horizontal => (clamp(i64::from(x) + offset, width), y),
                Axis::Vertical => (x, clamp(i64::from(y) + offset, height)),
            };
            let sample = src.get_pixel(sx, sy).0;
            for (slot, channel) in acc.iter_mut().zip(sample) {
                *slot += channel * weight;
            }
        }
        Rgba(acc)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKENDS: [BlurBackend; 2] = [BlurBackend::Cpu, BlurBackend::Separable];

    #[test]
    fn kernel_is_normalized() {
        let (weights, radius) = gaussian_kernel(2.0);
        assert_eq!(radius, 6);
        assert_eq!(weights.len(), 13);
        let sum: f32 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(weights[6] > weights[5]);
        assert_eq!(weights[0], weights[12]);
    }

    #[test]
    fn zero_sigma_is_identity() {
        let img = RgbaImage::from_fn(4, 4, |x, y| Rgba([(x * 50) as u8, (y * 50) as u8, 0, 255]));
        let out = apply_blur(&img, 0.0, BlurBackend::Cpu);
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn uniform_image_is_unchanged() {
        let img = RgbaImage::from_pixel(9, 5, Rgba([120, 60, 30, 255]));
        for backend in BACKENDS {
            let out = apply_blur(&img, 1.5, backend);
            assert_eq!(out.dimensions(), (9, 5));
            for p in out.pixels() {
                for (got, want) in p.0.iter().zip([120u8, 60, 30, 255]) {
                    assert!(got.abs_diff(want) <= 1, "{backend:?} {:?}", p.0);
                }
            }
        }
    }

    #[test]
    fn blur_spreads_a_point() {
        let mut img = RgbaImage::from_pixel(11, 11, Rgba([0, 0, 0, 0]));
        img.put_pixel(5, 5, Rgba([255, 255, 255, 255]));
        for backend in BACKENDS {
            let out = apply_blur(&img, 1.0, backend);
            assert_eq!(out.dimensions(), (11, 11));
            assert!(out.get_pixel(5, 5)[3] < 255, "{backend:?}");
            assert!(out.get_pixel(6, 5)[3] > 0, "{backend:?}");
        }
    }

    #[test]
    fn transparent_margin_does_not_darken_edges() {
        let img = RgbaImage::from_fn(20, 20, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        for backend in BACKENDS {
            let out = apply_blur(&img, 2.0, backend);
            let mut translucent = 0;
            for p in out.pixels().filter(|p| p[3] > 0) {
                if p[3] < 255 {
                    translucent += 1;
                }
                assert!(p.0[..3].iter().all(|&c| c >= 250), "{backend:?} {:?}", p.0);
            }
            assert!(translucent > 0, "{backend:?}");
        }
    }

    #[test]
    fn translucent_colour_keeps_its_hue() {
        let mut img = RgbaImage::from_pixel(9, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(4, 0, Rgba([200, 40, 10, 128]));
        let out = apply_blur(&img, 1.0, BlurBackend::Separable);
        let edge = out.get_pixel(3, 0);
        assert!(edge[3] > 0 && edge[3] < 128);
        assert!(edge[0].abs_diff(200) <= 2, "{:?}", edge.0);
        assert!(edge[1].abs_diff(40) <= 2, "{:?}", edge.0);
        assert!(edge[2].abs_diff(10) <= 2, "{:?}", edge.0);
    }
}
