use serde::Deserialize;

/// Oversizing of the shadow relative to the visible image. Gives the blur a
/// margin to fall off into.
pub const SHADOW_CANVAS_SCALE: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    /// True unless both dimensions are strictly positive (NaN counts as empty).
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Pixel dimensions after rounding; either may be zero.
    pub fn to_pixels(self) -> (u32, u32) {
        (round_px(self.width), round_px(self.height))
    }
}

fn round_px(v: f32) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.round().min(u32::MAX as f32) as u32
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// A rect of `size` whose center coincides with the center of `bounds`.
    pub fn centered(size: Size, bounds: Size) -> Self {
        let origin = Point::new(
            (bounds.width - size.width) / 2.0,
            (bounds.height - size.height) / 2.0,
        );
        Self { origin, size }
    }

    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self::new(Point::new(self.origin.x + dx, self.origin.y + dy), self.size)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }
}

/// How a surface sizes its bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentMode {
    /// Preserve aspect ratio and fit inside the bounds on the limiting axis.
    AspectFit,
    /// Keep the natural size; the surface stretches it into its frame.
    #[default]
    Fill,
}

/// Resolved placement of the two destination surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadowGeometry {
    pub foreground: Rect,
    pub background: Rect,
}

/// Size the foreground image occupies on screen.
///
/// An empty source resolves to [`Size::ZERO`] rather than dividing by zero.
pub fn real_image_size(bounds: Size, content_mode: ContentMode, source: Size) -> Size {
    if source.is_empty() {
        return Size::ZERO;
    }
    match content_mode {
        ContentMode::AspectFit => {
            let scale = (bounds.width / source.width).min(bounds.height / source.height);
            source.scaled(scale)
        }
        ContentMode::Fill => source,
    }
}

/// Size of the shadow layer for a given foreground size.
pub fn shadow_size(foreground: Size, shadow_radius_offset_percent: f32) -> Size {
    foreground.scaled(SHADOW_CANVAS_SCALE * (1.0 + shadow_radius_offset_percent / 100.0))
}

/// Computes where the foreground and shadow surfaces go inside `bounds`.
///
/// The foreground is centered. The shadow is `1.4 * (1 + percent / 100)`
/// times the foreground, centered, then shifted by the offsets.
pub fn resolve(
    bounds: Size,
    content_mode: ContentMode,
    source_size: Size,
    shadow_radius_offset_percent: f32,
    shadow_offset_x: f32,
    shadow_offset_y: f32,
) -> ShadowGeometry {
    let real = real_image_size(bounds, content_mode, source_size);
    let foreground = Rect::centered(real, bounds);
    let background = Rect::centered(shadow_size(real, shadow_radius_offset_percent), bounds)
        .translated(shadow_offset_x, shadow_offset_y);
    ShadowGeometry {
        foreground,
        background,
    }
}

/// Aspect-fits `inner` into `outer`, centered inside it.
pub fn fit_within(inner: Size, outer: Rect) -> Rect {
    let size = real_image_size(outer.size, ContentMode::AspectFit, inner);
    Rect::centered(size, outer.size).translated(outer.origin.x, outer.origin.y)
}
