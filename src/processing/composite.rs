use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::error::PipelineResult;
use crate::processing::canvas::{Canvas, PlacedImage};
use crate::processing::layout::{ContentMode, Size, fit_within};
use crate::processing::resize::ResizeFilter;
use crate::view::Surface;

/// Renders the shadow surface and then the foreground into a single
/// `bounds`-sized bitmap.
pub fn flatten(
    bounds: Size,
    background: &Surface,
    foreground: &Surface,
    backdrop: Rgba<u8>,
    filter: ResizeFilter,
) -> PipelineResult<RgbaImage> {
    let mut canvas = Canvas::new(bounds).with_backdrop(backdrop);
    for surface in [background, foreground] {
        if let Some(layer) = placed(surface) {
            canvas.push(layer);
        }
    }
    canvas.rasterize(filter)
}

fn placed(surface: &Surface) -> Option<PlacedImage> {
    let image = surface.image()?;
    if image.width() == 0 || image.height() == 0 {
        return None;
    }
    let frame = match surface.content_mode() {
        ContentMode::AspectFit => {
            fit_within(Size::from_pixels(image.width(), image.height()), surface.frame())
        }
        ContentMode::Fill => surface.frame(),
    };
    Some(PlacedImage {
        image: Arc::clone(image),
        frame,
        corner_radius: surface.corner_radius(),
        opacity: surface.opacity(),
    })
}
