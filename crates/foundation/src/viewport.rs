/// CSS-space size of the host element plus its device pixel ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Whether a draw into this viewport would produce anything.
    ///
    /// Hidden tabs and collapsed containers report zero sizes; redraws are
    /// skipped until the next resize brings a positive size.
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Device pixel ratio, falling back to 1 for missing or bogus values.
    pub fn pixel_ratio(&self) -> f64 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }

    /// Backing-store resolution in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio();
        (to_pixels(self.width * ratio), to_pixels(self.height * ratio))
    }

    pub fn css_size(&self) -> (f64, f64) {
        (sanitize(self.width), sanitize(self.height))
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

fn to_pixels(v: f64) -> u32 {
    let v = sanitize(v).round();
    if v >= u32::MAX as f64 { u32::MAX } else { v as u32 }
}
