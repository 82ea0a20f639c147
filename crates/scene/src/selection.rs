use runtime::{EventBus, SubscriptionId};
use serde::Serialize;
use tracing::debug;

use crate::location::Location;

/// Snapshot of what the presenters should show.
///
/// `hovered` drives the tooltip and is cleared on hover-out. `pinned` drives
/// the info panel and keeps the last hovered location after the pointer leaves.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HoverSelectionState {
    pub hovered: Option<Location>,
    pub pinned: Option<Location>,
}

/// Hover/pin state machine plus its observers.
///
/// Every operation emits exactly one notification, even when the state did not
/// change, so one pointer event is always one presenter update.
#[derive(Debug, Default)]
pub struct HoverSelection {
    state: HoverSelectionState,
    bus: EventBus<HoverSelectionState>,
}

impl HoverSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &HoverSelectionState {
        &self.state
    }

    pub fn on_marker_hover(&mut self, location: Option<Location>) {
        if let Some(loc) = &location {
            debug!(id = %loc.id, "marker hovered");
            self.state.pinned = Some(loc.clone());
        }
        self.state.hovered = location;
        self.notify();
    }

    pub fn on_marker_unhover(&mut self) {
        self.state.hovered = None;
        self.notify();
    }

    /// Clears both hovered and pinned, for a fresh result set.
    pub fn reset(&mut self) {
        self.state = HoverSelectionState::default();
        self.notify();
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&HoverSelectionState) + 'static) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn notifications(&self) -> u64 {
        self.bus.emitted()
    }

    fn notify(&mut self) {
        self.bus.emit(&self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::{HoverSelection, HoverSelectionState};
    use crate::location::Location;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn paris() -> Location {
        Location::new(1, "Paris", 2.35, 48.85)
    }

    #[test]
    fn pinned_survives_unhover() {
        let mut sel = HoverSelection::new();
        sel.on_marker_hover(Some(paris()));
        sel.on_marker_unhover();
        assert_eq!(
            sel.state(),
            &HoverSelectionState {
                hovered: None,
                pinned: Some(paris()),
            }
        );
    }

    #[test]
    fn hovering_nothing_keeps_pin() {
        let mut sel = HoverSelection::new();
        sel.on_marker_hover(Some(paris()));
        sel.on_marker_hover(None);
        assert_eq!(sel.state().hovered, None);
        assert_eq!(sel.state().pinned, Some(paris()));
    }

    #[test]
    fn reset_clears_everything() {
        let mut sel = HoverSelection::new();
        sel.on_marker_hover(Some(paris()));
        sel.reset();
        assert_eq!(sel.state(), &HoverSelectionState::default());
    }

    #[test]
    fn one_notification_per_operation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut sel = HoverSelection::new();
        let s = seen.clone();
        sel.subscribe(move |state| s.borrow_mut().push(state.clone()));

        sel.on_marker_hover(Some(paris()));
        sel.on_marker_unhover();
        sel.on_marker_unhover();
        sel.reset();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0].hovered.as_ref().map(|l| l.id.as_str()), Some("1"));
        assert_eq!(seen[1].pinned.as_ref().map(|l| l.id.as_str()), Some("1"));
        assert_eq!(seen[3], HoverSelectionState::default());
        assert_eq!(sel.notifications(), 4);
    }
}
