use fast_image_resize as fir;
use image::RgbaImage;
use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};

/// Resampling kernel used when scaling bitmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    #[default]
    CatmullRom,
    Lanczos3,
}

impl ResizeFilter {
    fn algorithm(self) -> fir::ResizeAlg {
        match self {
            Self::Nearest => fir::ResizeAlg::Nearest,
            Self::Bilinear => fir::ResizeAlg::Convolution(fir::FilterType::Bilinear),
            Self::CatmullRom => fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom),
            Self::Lanczos3 => fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3),
        }
    }
}

/// Resamples `source` to exactly `target_w` x `target_h`.
pub fn resize_rgba(
    source: &RgbaImage,
    target_w: u32,
    target_h: u32,
    filter: ResizeFilter,
) -> PipelineResult<RgbaImage> {
    if source.width() == 0 || source.height() == 0 {
        return Err(PipelineError::EmptySource);
    }
    if target_w == 0 || target_h == 0 {
        return Err(PipelineError::Resize(format!(
            "target dimensions {target_w}x{target_h} must be positive"
        )));
    }
    if source.width() == target_w && source.height() == target_h {
        return Ok(source.clone());
    }

    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .map_err(|err| PipelineError::Resize(format!("source view: {err}")))?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new().resize_alg(filter.algorithm());
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .map_err(|err| PipelineError::Resize(err.to_string()))?;
    let buffer = dst_image.into_vec();
    RgbaImage::from_raw(target_w, target_h, buffer).ok_or(PipelineError::Buffer {
        width: target_w,
        height: target_h,
    })
}

/// Scales both linear dimensions of `image` by `factor`.
pub fn downsample(
    image: &RgbaImage,
    factor: f32,
    filter: ResizeFilter,
) -> PipelineResult<RgbaImage> {
    let scaled = |v: u32| -> u32 {
        let target = (v as f32 * factor).round();
        if target.is_finite() && target > 0.0 {
            target as u32
        } else {
            0
        }
    };
    let (w, h) = (scaled(image.width()), scaled(image.height()));
    if w == 0 || h == 0 {
        return Err(PipelineError::ZeroSizeDownsample {
            width: image.width(),
            height: image.height(),
            factor,
        });
    }
    resize_rgba(image, w, h, filter)
}
