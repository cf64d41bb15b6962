use thiserror::Error;

/// Reasons a shadow render run stops before producing a bitmap.
///
/// These never reach the host: the worker logs them and leaves the
/// currently displayed shadow in place.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No source image, or a source with a zero dimension.
    #[error("source image is empty")]
    EmptySource,

    /// The oversized canvas rounded down to zero pixels.
    #[error("canvas size {width}x{height} is empty")]
    ZeroSizeCanvas { width: f32, height: f32 },

    /// Downsampling would produce an image with no pixels.
    #[error("downsample of {width}x{height} by {factor} is empty")]
    ZeroSizeDownsample { width: u32, height: u32, factor: f32 },

    /// The resampler rejected the request.
    #[error("resize failed: {0}")]
    Resize(String),

    /// A pixel buffer did not match its declared dimensions.
    #[error("pixel buffer does not match {width}x{height}")]
    Buffer { width: u32, height: u32 },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
