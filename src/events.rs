use std::sync::Arc;

use image::RgbaImage;

use crate::processing::layout::Size;

/// Snapshot of everything one shadow render needs, taken at trigger time.
///
/// The worker only ever sees this copy, never the live view state.
#[derive(Debug, Clone)]
pub struct BlurJob {
    pub generation: u64,
    pub source: Arc<RgbaImage>,
    pub corner_radius: f32,
    pub blur_radius: f32,
    /// On-screen size of the foreground when the job was queued.
    pub real_size: Size,
}

/// A finished shadow bitmap on its way back to the display thread.
#[derive(Debug, Clone)]
pub struct ShadowRendered {
    pub generation: u64,
    pub image: Arc<RgbaImage>,
}
