//! Drag, inertia and auto-rotation state machine.
//!
//! The controller never owns the projection. It reads the current rotation and
//! front projection from its caller and answers with the rotation to apply, so
//! the caller stays the single writer of projection state.

use std::collections::VecDeque;

use foundation::math::{LonLat, Orthographic, Rotation, Vec2, Vec3, Versor};
use runtime::{Frame, TimerKind, TimerSlot};
use tracing::debug;

use crate::config::InertiaConfig;

/// Shortest sample interval counted towards the release velocity.
const MIN_SAMPLE_DT_S: f64 = 1e-3;

/// Public view of the controller state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Dragging,
    InertiaDecay,
    AutoRotating,
}

#[derive(Debug, Clone)]
struct Grab {
    /// Front projection frozen at the start rotation.
    projection: Orthographic,
    /// Grabbed point on the unit sphere.
    v0: Vec3,
    q0: Versor,
    last: Versor,
    last_time_s: f64,
}

#[derive(Debug, Copy, Clone)]
struct Sample {
    /// Rotation since the previous sample, in the globe's own frame.
    delta: Versor,
    dt_s: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Spin {
    axis: [f64; 3],
    /// Degrees per second.
    rate: f64,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Dragging(Box<Grab>),
    InertiaDecay(Spin),
    AutoRotating,
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    inertia: InertiaConfig,
    auto_rotate_deg_per_tick: f64,
    resume_auto_rotate: bool,
    phase: Phase,
    timer: TimerSlot,
    samples: VecDeque<Sample>,
}

impl InteractionController {
    pub fn new(inertia: InertiaConfig, auto_rotate_deg_per_tick: f64, resume_auto_rotate: bool) -> Self {
        let window = inertia.sample_window;
        Self {
            inertia,
            auto_rotate_deg_per_tick,
            resume_auto_rotate,
            phase: Phase::Idle,
            timer: TimerSlot::new(),
            samples: VecDeque::with_capacity(window),
        }
    }

    pub fn state(&self) -> InteractionState {
        match self.phase {
            Phase::Idle => InteractionState::Idle,
            Phase::Dragging(_) => InteractionState::Dragging,
            Phase::InertiaDecay(_) => InteractionState::InertiaDecay,
            Phase::AutoRotating => InteractionState::AutoRotating,
        }
    }

    pub fn timer(&self) -> &TimerSlot {
        &self.timer
    }

    /// Current inertia speed in degrees per second, zero outside inertia.
    pub fn spin_rate(&self) -> f64 {
        match self.phase {
            Phase::InertiaDecay(spin) => spin.rate,
            _ => 0.0,
        }
    }

    pub fn start_auto_rotate(&mut self) {
        if matches!(self.phase, Phase::Dragging(_)) {
            return;
        }
        self.timer.start(TimerKind::AutoRotate);
        self.phase = Phase::AutoRotating;
        debug!("auto-rotate started");
    }

    /// Stops any timer and drops back to idle. Drags in progress are kept.
    pub fn interrupt(&mut self) {
        if matches!(self.phase, Phase::Dragging(_)) {
            return;
        }
        if let Some(kind) = self.timer.stop() {
            debug!(?kind, "timer interrupted");
        }
        self.phase = Phase::Idle;
    }

    /// Grabs the globe at `pointer`. Any running timer stops first.
    ///
    /// Returns `false` when the projection cannot invert the pointer (not yet
    /// fitted), in which case nothing changes.
    pub fn pointer_down(&mut self, pointer: Vec2, time_s: f64, front: &Orthographic) -> bool {
        let Some(grabbed) = front.invert_clamped(pointer) else {
            return false;
        };
        if let Some(kind) = self.timer.stop() {
            debug!(?kind, "timer stopped by pointer down");
        }
        let q0 = Versor::from_rotation(front.rotation());
        self.samples.clear();
        self.phase = Phase::Dragging(Box::new(Grab {
            projection: front.clone(),
            v0: grabbed.to_cartesian(),
            q0,
            last: q0,
            last_time_s: time_s,
        }));
        debug!(x = pointer.x, y = pointer.y, "drag started");
        true
    }

    /// Rotation that keeps the grabbed point under `pointer`, while dragging.
    pub fn pointer_move(&mut self, pointer: Vec2, time_s: f64) -> Option<Rotation> {
        let Phase::Dragging(grab) = &mut self.phase else {
            return None;
        };
        let v1 = grab.projection.invert_clamped(pointer)?.to_cartesian();
        let q1 = grab.q0.mul(Versor::delta(grab.v0, v1)).normalized();
        let rotation = q1.to_rotation();
        if !rotation.is_finite() {
            return None;
        }

        let dt_s = (time_s - grab.last_time_s).max(MIN_SAMPLE_DT_S);
        let delta = grab.last.conjugate().mul(q1).normalized();
        grab.last = q1;
        grab.last_time_s = time_s;

        self.samples.push_back(Sample { delta, dt_s });
        while self.samples.len() > self.inertia.sample_window {
            self.samples.pop_front();
        }
        Some(rotation)
    }

    /// Ends a drag. Fast releases spin on; slow ones settle.
    pub fn pointer_up(&mut self, time_s: f64) -> InteractionState {
        let Phase::Dragging(grab) = &self.phase else {
            return self.state();
        };
        let held_for = time_s - grab.last_time_s;
        let spin = if held_for <= self.inertia.release_timeout_s {
            self.release_spin()
        } else {
            None
        };
        self.samples.clear();

        match spin {
            Some(spin) if spin.rate >= self.inertia.min_release_speed => {
                self.timer.start(TimerKind::Inertia);
                self.phase = Phase::InertiaDecay(spin);
                debug!(rate = spin.rate, "inertia started");
            }
            _ => self.settle(),
        }
        self.state()
    }

    /// Advances the running animation by one tick.
    pub fn tick(&mut self, frame: &Frame, current: Rotation) -> Option<Rotation> {
        match &mut self.phase {
            Phase::InertiaDecay(spin) => {
                let step = Versor::from_axis_angle(spin.axis, (spin.rate * frame.dt_s).to_radians());
                let next = Versor::from_rotation(current).mul(step).normalized().to_rotation();
                spin.rate *= self.inertia.damping;
                if spin.rate < self.inertia.stop_speed {
                    debug!(frame = frame.index, "inertia settled");
                    self.timer.stop();
                    self.settle();
                }
                next.is_finite().then_some(next)
            }
            Phase::AutoRotating => Some(current.with_lambda_offset(self.auto_rotate_deg_per_tick)),
            Phase::Idle | Phase::Dragging(_) => None,
        }
    }

    fn settle(&mut self) {
        if self.resume_auto_rotate {
            self.timer.start(TimerKind::AutoRotate);
            self.phase = Phase::AutoRotating;
        } else {
            self.phase = Phase::Idle;
        }
    }

    /// Mean angular speed and axis over the retained samples.
    fn release_spin(&self) -> Option<Spin> {
        let mut total_dt = 0.0;
        let mut total_angle = 0.0;
        let mut axis = [0.0; 3];
        for sample in &self.samples {
            total_dt += sample.dt_s;
            let angle = sample.delta.angle();
            total_angle += angle;
            if let Some(a) = sample.delta.axis() {
                for (acc, c) in axis.iter_mut().zip(a) {
                    *acc += c * angle;
                }
            }
        }
        if total_dt <= 0.0 {
            return None;
        }
        let axis = Vec3::new(axis[0], axis[1], axis[2]).normalized()?;
        Some(Spin {
            axis: [axis.x, axis.y, axis.z],
            rate: total_angle.to_degrees() / total_dt,
        })
    }
}

/// Rotation that centres `target`, keeping the current roll.
pub fn rotation_to_center(current: Rotation, target: LonLat) -> Rotation {
    Rotation::facing(target, current.gamma())
}
