//! Notifications emitted by animations and groups
//!
//! Observers register plain closures. Dispatch happens after the emitter has
//! released its own borrows, so a listener is free to call back into the
//! animation or group that notified it (stop it, reverse it, start another).

use std::cell::RefCell;
use std::rc::Rc;

use kinetic_core::Value;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a registered listener
    pub struct ListenerId;
}

/// Animation lifecycle state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Direction of travel along the start/end path
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Start value toward end value
    #[default]
    Forward,
    /// End value toward start value
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Notifications from a single [`Animation`](crate::Animation)
#[derive(Clone, Debug, PartialEq)]
pub enum AnimationEvent {
    /// `start()` succeeded
    Started,
    /// A new value was written to the target
    ValueChanged(Value),
    /// Difference between this update and the previous one
    IncrementChanged(Value),
    /// Natural completion. Never sent for an explicit `stop()`.
    Finished,
    StateChanged(AnimationState),
}

/// Notifications from an [`AnimationGroup`](crate::AnimationGroup)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupEvent {
    Started,
    /// Every animation of this stage has been started
    StageStarted(i32),
    /// Every animation of this stage has finished
    StageFinished(i32),
    /// The last stage finished
    Finished,
}

type Listener<E> = Rc<dyn Fn(&E)>;

/// Observer list shared by animations and groups
pub(crate) struct Listeners<E> {
    slots: RefCell<SlotMap<ListenerId, Listener<E>>>,
}

impl<E> Listeners<E> {
    pub(crate) fn new() -> Self {
        Self {
            slots: RefCell::new(SlotMap::with_key()),
        }
    }

    pub(crate) fn add(&self, listener: Listener<E>) -> ListenerId {
        self.slots.borrow_mut().insert(listener)
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        self.slots.borrow_mut().remove(id).is_some()
    }

    pub(crate) fn clear(&self) {
        self.slots.borrow_mut().clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Deliver events in order to every listener registered right now
    ///
    /// Listeners removed by an earlier callback are skipped; listeners added
    /// during dispatch only see later emissions.
    pub(crate) fn emit(&self, events: &[E]) {
        if events.is_empty() {
            return;
        }
        let snapshot: SmallVec<[(ListenerId, Listener<E>); 4]> = self
            .slots
            .borrow()
            .iter()
            .map(|(id, listener)| (id, Rc::clone(listener)))
            .collect();

        for event in events {
            for (id, listener) in &snapshot {
                if self.slots.borrow().contains_key(*id) {
                    listener(event);
                }
            }
        }
    }
}
