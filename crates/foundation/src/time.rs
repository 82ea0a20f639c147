/// Host-supplied timestamp in seconds.
///
/// The globe never reads a wall clock itself; every time-dependent operation
/// takes one of these so runs are reproducible.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Time(pub f64);

impl Time {
    pub fn from_millis(ms: f64) -> Self {
        Time(ms / 1000.0)
    }

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, never negative.
    pub fn since(self, earlier: Time) -> f64 {
        let dt = self.0 - earlier.0;
        if dt.is_finite() { dt.max(0.0) } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::Time;

    #[test]
    fn since_clamps_backwards_clocks() {
        assert_eq!(Time(2.5).since(Time(1.0)), 1.5);
        assert_eq!(Time(1.0).since(Time(2.5)), 0.0);
        assert_eq!(Time::from_millis(1500.0), Time(1.5));
    }
}
