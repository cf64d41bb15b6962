use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::processing::blur::BlurBackend;
use crate::processing::layout::ContentMode;
use crate::processing::resize::ResizeFilter;

/// The tunable shadow parameters owned by a [`crate::view::ShadowView`].
///
/// Values are taken as-is. Out-of-range numbers produce odd-looking output,
/// never an error.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ShadowParams {
    /// Gaussian sigma for the shadow. 1 to 5 looks best; larger values wash
    /// the shadow out.
    pub blur_radius: f32,
    /// Corner rounding of the foreground and of the shadow source.
    pub corner_radius: f32,
    /// Extra shadow scale beyond the fixed 1.4x, in percent. Negative shrinks.
    pub shadow_radius_offset_percent: f32,
    /// Horizontal shadow shift; positive moves right.
    pub shadow_offset_x: f32,
    /// Vertical shadow shift; positive moves down.
    pub shadow_offset_y: f32,
    /// Opacity of the shadow surface.
    pub shadow_alpha: f32,
    pub content_mode: ContentMode,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            blur_radius: 3.0,
            corner_radius: 0.0,
            shadow_radius_offset_percent: 0.0,
            shadow_offset_x: 0.0,
            shadow_offset_y: 0.0,
            shadow_alpha: 1.0,
            content_mode: ContentMode::default(),
        }
    }
}

/// What the view does with a completion that arrives after a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionPolicy {
    /// Whatever finishes last is shown, even if it was triggered earlier.
    #[default]
    LastCompleted,
    /// Completions older than the newest one already shown are dropped.
    LatestTriggered,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Linear scale applied to the rasterized canvas before blurring.
    pub downsample_factor: f32,
    pub blur_backend: BlurBackend,
    pub resize_filter: ResizeFilter,
    pub completion_policy: CompletionPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            downsample_factor: 0.2,
            blur_backend: BlurBackend::default(),
            resize_filter: ResizeFilter::default(),
            completion_policy: CompletionPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.downsample_factor.is_finite()
                && self.downsample_factor > 0.0
                && self.downsample_factor <= 1.0,
            "downsample-factor must be in (0, 1], got {}",
            self.downsample_factor
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct OutputConfig {
    /// RGBA colour behind both surfaces when flattening a frame.
    pub backdrop: [u8; 4],
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Initial shadow parameters.
    pub shadow: ShadowParams,
    /// Blur pipeline tuning.
    pub pipeline: PipelineConfig,
    /// Flattened output settings.
    pub output: OutputConfig,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_yaml::from_str(&s).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Checks pipeline invariants. Shadow parameters are never rejected.
    pub fn validated(self) -> Result<Self> {
        self.pipeline
            .validate()
            .context("invalid pipeline configuration")?;
        Ok(self)
    }
}
