use std::sync::Arc;

use image::RgbaImage;
use tracing::trace;

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::events::BlurJob;
use crate::processing::blur::apply_blur;
use crate::processing::canvas::compose_shadow_canvas;
use crate::processing::resize::downsample;

/// Worker-side rendering of a [`BlurJob`] into a shadow bitmap.
pub trait ShadowRenderer: Send + Sync + 'static {
    fn render(&self, job: &BlurJob) -> PipelineResult<RgbaImage>;
}

/// Canvas, rasterize, downsample, blur.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianShadow {
    options: PipelineConfig,
}

impl GaussianShadow {
    pub fn new(options: PipelineConfig) -> Self {
        Self { options }
    }
}

impl ShadowRenderer for GaussianShadow {
    fn render(&self, job: &BlurJob) -> PipelineResult<RgbaImage> {
        render_shadow(job, &self.options)
    }
}

/// Runs the shadow steps in order. The first failing step ends the run.
pub fn render_shadow(job: &BlurJob, options: &PipelineConfig) -> PipelineResult<RgbaImage> {
    let canvas = compose_shadow_canvas(Arc::clone(&job.source), job.corner_radius, job.real_size)?;
    let raster = canvas.rasterize(options.resize_filter)?;
    trace!(
        generation = job.generation,
        width = raster.width(),
        height = raster.height(),
        "rasterized shadow canvas"
    );
    let small = downsample(&raster, options.downsample_factor, options.resize_filter)?;
    Ok(apply_blur(&small, job.blur_radius, options.blur_backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::processing::layout::Size;
    use image::Rgba;

    fn job(source: RgbaImage, real_size: Size) -> BlurJob {
        BlurJob {
            generation: 0,
            source: Arc::new(source),
            corner_radius: 0.0,
            blur_radius: 2.0,
            real_size,
        }
    }

    #[test]
    fn output_is_a_fifth_of_the_canvas() {
        let src = RgbaImage::from_pixel(200, 50, Rgba([40, 80, 160, 255]));
        let out = render_shadow(&job(src, Size::new(100.0, 25.0)), &PipelineConfig::default())
            .unwrap();
        assert_eq!(out.dimensions(), (28, 7));
        // Opaque in the middle, feathered toward the transparent margin.
        assert!(out.get_pixel(14, 3)[3] > out.get_pixel(0, 0)[3]);
    }

    #[test]
    fn white_source_casts_a_white_shadow() {
        let src = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let mut blurred = job(src, Size::new(100.0, 100.0));
        blurred.blur_radius = 3.0;
        let out = render_shadow(&blurred, &PipelineConfig::default()).unwrap();
        assert_eq!(out.dimensions(), (28, 28));
        let falloff: Vec<_> = out.pixels().filter(|p| p[3] > 0 && p[3] < 255).collect();
        assert!(!falloff.is_empty());
        for p in falloff {
            assert!(p.0[..3].iter().all(|&c| c >= 250), "{:?}", p.0);
        }
    }

    #[test]
    fn tiny_real_size_aborts() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let err = render_shadow(&job(src, Size::new(1.0, 1.0)), &PipelineConfig::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::ZeroSizeDownsample { .. }));
    }
}
