use foundation::time::Time;

/// Animation tick metadata.
///
/// The host drives ticks; `dt_s` is whatever elapsed since the previous one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based tick index.
    pub index: u64,
    /// Seconds since the previous tick.
    pub dt_s: f64,
    /// Accumulated tick time at this frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    pub fn first() -> Self {
        Self {
            index: 0,
            dt_s: 0.0,
            time: Time(0.0),
        }
    }

    /// Next frame after `dt_s` seconds. Non-finite or negative deltas count as zero.
    pub fn advance(self, dt_s: f64) -> Self {
        let dt_s = if dt_s.is_finite() { dt_s.max(0.0) } else { 0.0 };
        Self {
            index: self.index + 1,
            dt_s,
            time: Time(self.time.0 + dt_s),
        }
    }
}
