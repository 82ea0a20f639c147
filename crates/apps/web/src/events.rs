use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use foundation::math::Vec2;
use surface::ShapeId;

/// DOM input, decoupled from the globe so listeners never borrow it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum HostEvent {
    MarkerEnter(ShapeId),
    MarkerLeave(ShapeId),
    PointerDown { pos: Vec2, time_s: f64 },
    PointerMove { pos: Vec2, time_s: f64 },
    PointerUp { time_s: f64 },
}

type Wake = Rc<dyn Fn()>;

/// FIFO shared by every DOM listener.
///
/// Listeners push and then wake the host, which drains the queue once the
/// globe is free. Events pushed while the globe is busy wait for the next
/// drain (at the latest, the next animation frame).
#[derive(Clone, Default)]
pub struct EventQueue {
    events: Rc<RefCell<VecDeque<HostEvent>>>,
    wake: Rc<RefCell<Option<Wake>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_wake(&self, wake: impl Fn() + 'static) {
        *self.wake.borrow_mut() = Some(Rc::new(wake));
    }

    pub fn push(&self, event: HostEvent) {
        self.events.borrow_mut().push_back(event);
        let wake = self.wake.borrow().clone();
        if let Some(wake) = wake {
            wake();
        }
    }

    pub fn drain(&self) -> Vec<HostEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    /// Puts undelivered events back in front, keeping their order.
    pub fn requeue(&self, events: Vec<HostEvent>) {
        let mut queue = self.events.borrow_mut();
        for event in events.into_iter().rev() {
            queue.push_front(event);
        }
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("pending", &self.len())
            .finish()
    }
}
