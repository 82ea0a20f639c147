use tracing::debug;

/// The animation timers that can rotate the globe.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimerKind {
    AutoRotate,
    Inertia,
}

/// Holds at most one running animation timer.
///
/// Starting a timer stops whichever one was running, so two rotation writers
/// never compete.
#[derive(Debug, Default, Clone)]
pub struct TimerSlot {
    active: Option<TimerKind>,
    started: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `kind`, returning the timer it replaced (if any).
    pub fn start(&mut self, kind: TimerKind) -> Option<TimerKind> {
        let previous = self.active.replace(kind);
        self.started = self.started.wrapping_add(1);
        if let Some(prev) = previous {
            debug!(?prev, next = ?kind, "timer replaced");
        }
        previous
    }

    pub fn stop(&mut self) -> Option<TimerKind> {
        self.active.take()
    }

    pub fn active(&self) -> Option<TimerKind> {
        self.active
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        self.active == Some(kind)
    }

    /// How many times any timer was started.
    pub fn start_count(&self) -> u64 {
        self.started
    }
}

#[cfg(test)]
mod tests {
    use super::{TimerKind, TimerSlot};

    #[test]
    fn only_one_timer_runs() {
        let mut slot = TimerSlot::new();
        assert_eq!(slot.start(TimerKind::AutoRotate), None);
        assert_eq!(slot.start(TimerKind::Inertia), Some(TimerKind::AutoRotate));
        assert!(slot.is_running(TimerKind::Inertia));
        assert!(!slot.is_running(TimerKind::AutoRotate));
        assert_eq!(slot.stop(), Some(TimerKind::Inertia));
        assert_eq!(slot.active(), None);
        assert_eq!(slot.start_count(), 2);
    }
}
