//! Off-screen composition of the oversized shadow canvas.
//!
//! A [`Canvas`] is a list of placed images on a transparent surface. It is
//! only turned into pixels by [`Canvas::rasterize`], which bakes each layer's
//! corner clip into the alpha channel so later stages never need a mask.

use std::sync::Arc;

use image::{Rgba, RgbaImage, imageops};
use tracing::trace;

use crate::error::{PipelineError, PipelineResult};
use crate::processing::layout::{Rect, SHADOW_CANVAS_SCALE, Size};
use crate::processing::resize::{ResizeFilter, resize_rgba};

#[derive(Debug, Clone)]
pub struct PlacedImage {
    pub image: Arc<RgbaImage>,
    pub frame: Rect,
    pub corner_radius: f32,
    /// Multiplier applied to the layer's alpha, 0.0..=1.0.
    pub opacity: f32,
}

#[derive(Debug, Clone)]
pub struct Canvas {
    size: Size,
    backdrop: Rgba<u8>,
    layers: Vec<PlacedImage>,
}

impl Canvas {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            backdrop: Rgba([0, 0, 0, 0]),
            layers: Vec::new(),
        }
    }

    pub fn with_backdrop(mut self, backdrop: Rgba<u8>) -> Self {
        self.backdrop = backdrop;
        self
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn layers(&self) -> &[PlacedImage] {
        &self.layers
    }

    /// Adds `image` stretched into `frame`, clipped to a rounded rect.
    pub fn place(&mut self, image: Arc<RgbaImage>, frame: Rect, corner_radius: f32) {
        self.push(PlacedImage {
            image,
            frame,
            corner_radius,
            opacity: 1.0,
        });
    }

    pub fn push(&mut self, layer: PlacedImage) {
        self.layers.push(layer);
    }

    /// Flattens all layers, in insertion order, onto the backdrop colour
    /// (transparent unless set).
    pub fn rasterize(&self, filter: ResizeFilter) -> PipelineResult<RgbaImage> {
        let (width, height) = self.size.to_pixels();
        if width == 0 || height == 0 {
            return Err(PipelineError::ZeroSizeCanvas {
                width: self.size.width,
                height: self.size.height,
            });
        }

        let mut out = RgbaImage::from_pixel(width, height, self.backdrop);
        for layer in &self.layers {
            let (lw, lh) = layer.frame.size.to_pixels();
            if lw == 0 || lh == 0 {
                trace!(?layer.frame, "skipping empty canvas layer");
                continue;
            }
            let mut scaled = resize_rgba(&layer.image, lw, lh, filter)?;
            clip_rounded_corners(&mut scaled, layer.corner_radius);
            fade(&mut scaled, layer.opacity);
            imageops::overlay(
                &mut out,
                &scaled,
                layer.frame.origin.x.round() as i64,
                layer.frame.origin.y.round() as i64,
            );
        }
        Ok(out)
    }
}

/// Lays out the shadow canvas: `real_size * 1.4` with the source centered at
/// `real_size`.
pub fn compose_shadow_canvas(
    source: Arc<RgbaImage>,
    corner_radius: f32,
    real_size: Size,
) -> PipelineResult<Canvas> {
    if source.width() == 0 || source.height() == 0 {
        return Err(PipelineError::EmptySource);
    }
    let canvas_size = real_size.scaled(SHADOW_CANVAS_SCALE);
    let (w, h) = canvas_size.to_pixels();
    if w == 0 || h == 0 {
        return Err(PipelineError::ZeroSizeCanvas {
            width: canvas_size.width,
            height: canvas_size.height,
        });
    }

    let mut canvas = Canvas::new(canvas_size);
    canvas.place(source, Rect::centered(real_size, canvas_size), corner_radius);
    Ok(canvas)
}

fn fade(image: &mut RgbaImage, opacity: f32) {
    let opacity = if opacity.is_finite() {
        opacity.clamp(0.0, 1.0)
    } else {
        1.0
    };
    if opacity >= 1.0 {
        return;
    }
    for pixel in image.pixels_mut() {
        pixel[3] = (f32::from(pixel[3]) * opacity).round() as u8;
    }
}

/// Multiplies alpha by the coverage of a rounded rect spanning the image.
///
/// The radius is clamped to half the shorter side. Edges are anti-aliased
/// over one pixel.
pub fn clip_rounded_corners(image: &mut RgbaImage, corner_radius: f32) {
    let (w, h) = image.dimensions();
    let max_radius = w.min(h) as f32 / 2.0;
    let r = if corner_radius.is_finite() {
        corner_radius.clamp(0.0, max_radius)
    } else {
        0.0
    };
    if r <= 0.0 {
        return;
    }

    let span = r.ceil() as u32;
    let (wf, hf) = (w as f32, h as f32);
    for y in 0..h {
        let in_top = y < span;
        let in_bottom = y >= h.saturating_sub(span);
        if !in_top && !in_bottom {
            continue;
        }
        for x in 0..w {
            let in_left = x < span;
            let in_right = x >= w.saturating_sub(span);
            if !in_left && !in_right {
                continue;
            }
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let cx = if px < r {
                r
            } else if px > wf - r {
                wf - r
            } else {
                continue;
            };
            let cy = if py < r {
                r
            } else if py > hf - r {
                hf - r
            } else {
                continue;
            };
            let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
            let coverage = (r - dist + 0.5).clamp(0.0, 1.0);
            if coverage < 1.0 {
                let pixel = image.get_pixel_mut(x, y);
                pixel[3] = (f32::from(pixel[3]) * coverage).round() as u8;
            }
        }
    }
}
