//! Display-side owner of the shadow parameters and the two surfaces.
//!
//! Setters fall into three groups:
//! - layout + render: re-resolve the geometry immediately and queue a new
//!   shadow render (`blur_radius`, `image`, offsets, radius percentage,
//!   `content_mode`, `bounds`);
//! - pass-through: write straight into a surface (`corner_radius` on the
//!   foreground, `shadow_alpha` on the shadow);
//! - lifecycle: `attach` lays out the foreground, `detach` invalidates the
//!   view so late renders are discarded.
//!
//! Render results only land when the owning thread calls
//! [`ShadowView::pump_completions`] (or one of the waiting variants).

mod surface;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use image::RgbaImage;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

pub use surface::Surface;

use crate::config::{CompletionPolicy, Configuration, ShadowParams};
use crate::events::{BlurJob, ShadowRendered};
use crate::processing::layout::{
    ContentMode, Point, Rect, ShadowGeometry, Size, real_image_size, resolve,
};
use crate::processing::shadow::{GaussianShadow, ShadowRenderer};
use crate::tasks::blur_worker::BlurWorker;

const SETTLE_POLL: Duration = Duration::from_millis(10);

pub struct ShadowView {
    params: ShadowParams,
    source: Arc<RgbaImage>,
    bounds: Size,
    geometry: ShadowGeometry,
    foreground: Surface,
    background: Surface,
    worker: BlurWorker,
    completions: Receiver<ShadowRendered>,
    policy: CompletionPolicy,
    next_generation: u64,
    /// Renders queued before the last detach are never applied.
    first_live_generation: u64,
    applied_generation: Option<u64>,
    alive: CancellationToken,
    attached: bool,
}

impl ShadowView {
    /// A view rendering shadows with the configured pipeline on `runtime`'s
    /// blocking pool.
    pub fn new(runtime: Handle, config: &Configuration) -> Self {
        Self::with_renderer(
            runtime,
            config.shadow,
            config.pipeline.completion_policy,
            Arc::new(GaussianShadow::new(config.pipeline)),
        )
    }

    pub fn with_renderer(
        runtime: Handle,
        params: ShadowParams,
        policy: CompletionPolicy,
        renderer: Arc<dyn ShadowRenderer>,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut view = Self {
            params,
            source: Arc::new(RgbaImage::new(0, 0)),
            bounds: Size::ZERO,
            geometry: ShadowGeometry::default(),
            foreground: Surface::default(),
            background: Surface::default(),
            worker: BlurWorker::new(runtime, renderer, tx),
            completions: rx,
            policy,
            next_generation: 0,
            first_live_generation: 0,
            applied_generation: None,
            alive: CancellationToken::new(),
            attached: false,
        };
        view.sync_pass_through();
        view
    }

    pub fn params(&self) -> &ShadowParams {
        &self.params
    }

    /// The source image, or a 0x0 image when none has been set.
    pub fn image(&self) -> &Arc<RgbaImage> {
        &self.source
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn geometry(&self) -> ShadowGeometry {
        self.geometry
    }

    pub fn foreground(&self) -> &Surface {
        &self.foreground
    }

    pub fn background(&self) -> &Surface {
        &self.background
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Generation stamped on the most recently queued render, if any.
    pub fn last_triggered_generation(&self) -> Option<u64> {
        self.next_generation.checked_sub(1)
    }

    /// Generation of the shadow currently on the background surface.
    pub fn applied_generation(&self) -> Option<u64> {
        self.applied_generation
    }

    /// Renders queued but not yet finished.
    pub fn pending_renders(&self) -> usize {
        self.worker.in_flight()
    }

    /// Layout + render.
    pub fn set_blur_radius(&mut self, blur_radius: f32) {
        self.params.blur_radius = blur_radius;
        self.layout_shadow();
    }

    /// Puts `image` on the foreground, then layout + render.
    pub fn set_image(&mut self, image: impl Into<Arc<RgbaImage>>) {
        self.source = image.into();
        self.foreground.image = Some(Arc::clone(&self.source));
        self.layout_shadow();
    }

    /// Pass-through to the foreground clip. The shadow picks the new radius
    /// up on its next render.
    pub fn set_corner_radius(&mut self, corner_radius: f32) {
        self.params.corner_radius = corner_radius;
        self.foreground.corner_radius = corner_radius;
    }

    /// Layout + render.
    pub fn set_shadow_radius_offset_percent(&mut self, percent: f32) {
        self.params.shadow_radius_offset_percent = percent;
        self.layout_shadow();
    }

    /// Layout + render.
    pub fn set_shadow_offset_x(&mut self, offset: f32) {
        self.params.shadow_offset_x = offset;
        self.layout_shadow();
    }

    /// Layout + render.
    pub fn set_shadow_offset_y(&mut self, offset: f32) {
        self.params.shadow_offset_y = offset;
        self.layout_shadow();
    }

    /// Pass-through to the shadow surface opacity; nothing is re-rendered.
    pub fn set_shadow_alpha(&mut self, alpha: f32) {
        self.params.shadow_alpha = alpha;
        self.background.opacity = alpha;
    }

    /// Layout + render.
    pub fn set_content_mode(&mut self, content_mode: ContentMode) {
        self.params.content_mode = content_mode;
        self.foreground.content_mode = content_mode;
        self.layout_shadow();
    }

    /// Layout + render.
    pub fn set_bounds(&mut self, bounds: Size) {
        self.bounds = bounds;
        self.layout_shadow();
    }

    /// Replaces every parameter, then runs a single layout + render.
    pub fn apply_params(&mut self, params: ShadowParams) {
        self.params = params;
        self.sync_pass_through();
        self.layout_shadow();
    }

    /// Initial foreground layout: the image spans the whole bounds and the
    /// surface applies the content mode itself.
    pub fn attach(&mut self) {
        if self.alive.is_cancelled() {
            self.alive = CancellationToken::new();
        }
        self.attached = true;
        if self.source.width() > 0 && self.source.height() > 0 {
            self.foreground.image = Some(Arc::clone(&self.source));
        }
        self.foreground.frame = Rect::new(Point::default(), self.bounds);
        self.sync_pass_through();
        debug!(bounds = ?self.bounds, "shadow view attached");
    }

    /// Invalidates the view: renders still running are dropped on arrival.
    pub fn detach(&mut self) {
        self.attached = false;
        self.alive.cancel();
        self.first_live_generation = self.next_generation;
        let dropped = self.completions.try_iter().count();
        debug!(dropped, "shadow view detached");
    }

    /// Applies every completion already delivered. Returns how many replaced
    /// the shadow bitmap.
    pub fn pump_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(done) = self.completions.try_recv() {
            if self.apply_completion(done) {
                applied += 1;
            }
        }
        applied
    }

    /// Blocks for at most `timeout` waiting for one completion. Returns
    /// whether a bitmap was applied.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> bool {
        match self.completions.recv_timeout(timeout) {
            Ok(done) => self.apply_completion(done),
            Err(_) => false,
        }
    }

    /// Waits until no renders are running and applies everything they
    /// produced. Returns `false` if `timeout` elapsed first.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        // `None` means the timeout is too far out to represent: wait forever.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            self.pump_completions();
            if self.worker.in_flight() == 0 {
                self.pump_completions();
                return true;
            }
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    (deadline - now).min(SETTLE_POLL)
                }
                None => SETTLE_POLL,
            };
            match self.completions.recv_timeout(wait) {
                Ok(done) => {
                    self.apply_completion(done);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return true,
            }
        }
    }

    fn apply_completion(&mut self, done: ShadowRendered) -> bool {
        if self.alive.is_cancelled() || done.generation < self.first_live_generation {
            trace!(generation = done.generation, "view detached; dropping shadow");
            return false;
        }
        if self.policy == CompletionPolicy::LatestTriggered
            && self
                .applied_generation
                .is_some_and(|applied| done.generation < applied)
        {
            debug!(
                generation = done.generation,
                applied = ?self.applied_generation,
                "dropping stale shadow"
            );
            return false;
        }
        trace!(generation = done.generation, "applying shadow");
        self.background.image = Some(done.image);
        self.applied_generation = Some(done.generation);
        true
    }

    fn sync_pass_through(&mut self) {
        self.foreground.corner_radius = self.params.corner_radius;
        self.foreground.content_mode = self.params.content_mode;
        self.background.opacity = self.params.shadow_alpha;
    }

    fn layout_shadow(&mut self) {
        self.trigger_render();

        let source_size = Size::from_pixels(self.source.width(), self.source.height());
        self.geometry = resolve(
            self.bounds,
            self.params.content_mode,
            source_size,
            self.params.shadow_radius_offset_percent,
            self.params.shadow_offset_x,
            self.params.shadow_offset_y,
        );
        self.foreground.frame = self.geometry.foreground;
        self.background.frame = self.geometry.background;
        self.background.content_mode = self.params.content_mode;
        self.background.opacity = self.params.shadow_alpha;
    }

    fn trigger_render(&mut self) {
        let generation = self.next_generation;
        self.next_generation += 1;
        let real_size = real_image_size(
            self.bounds,
            self.params.content_mode,
            Size::from_pixels(self.source.width(), self.source.height()),
        );
        trace!(generation, ?real_size, "queueing shadow render");
        self.worker.submit(
            BlurJob {
                generation,
                source: Arc::clone(&self.source),
                corner_radius: self.params.corner_radius,
                blur_radius: self.params.blur_radius,
                real_size,
            },
            self.alive.clone(),
        );
    }
}

impl Drop for ShadowView {
    fn drop(&mut self) {
        self.alive.cancel();
    }
}
