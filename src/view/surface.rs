use std::sync::Arc;

use image::RgbaImage;

use crate::processing::layout::{ContentMode, Rect};

/// Host-facing state of one destination layer.
///
/// Only [`super::ShadowView`] mutates surfaces; hosts read them after each
/// setter or completion pump and mirror the values onto their own layers.
#[derive(Debug, Clone)]
pub struct Surface {
    pub(crate) frame: Rect,
    pub(crate) image: Option<Arc<RgbaImage>>,
    pub(crate) opacity: f32,
    pub(crate) corner_radius: f32,
    pub(crate) content_mode: ContentMode,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            frame: Rect::default(),
            image: None,
            opacity: 1.0,
            corner_radius: 0.0,
            content_mode: ContentMode::default(),
        }
    }
}

impl Surface {
    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        self.image.as_ref()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    pub fn content_mode(&self) -> ContentMode {
        self.content_mode
    }
}
