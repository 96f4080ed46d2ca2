// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    std::{cell::RefCell, collections::HashMap, rc::Rc, time::Duration},
};

#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone, PartialOrd, Ord)]
pub struct EventId(pub u64);

/// A scheduler to schedule and cancel timeouts.
///
/// The owner of the scheduler is expected to call back into the MLME with the returned
/// `EventId` once the deadline passes. Cancellation is best effort: an event whose callback
/// races with its cancellation is discarded by `Timer::triggered`.
pub trait Scheduler {
    /// Requests to schedule an event. Returns a unique ID used to cancel the scheduled event.
    fn schedule(&mut self, after: Duration) -> EventId;
    /// Cancels a previously scheduled event.
    fn cancel(&mut self, id: EventId);
}

/// A timer to schedule and cancel timeouts and retrieve triggered events.
pub struct Timer<E> {
    events: HashMap<EventId, E>,
    scheduler: Box<dyn Scheduler>,
}

impl<E> Timer<E> {
    pub fn new(scheduler: Box<dyn Scheduler>) -> Self {
        Self { events: HashMap::default(), scheduler }
    }

    /// Returns the event for `event_id` if it is still armed. An event triggers at most once.
    pub fn triggered(&mut self, event_id: &EventId) -> Option<E> {
        self.events.remove(event_id)
    }

    pub fn schedule_after(&mut self, after: Duration, event: E) -> EventId {
        let event_id = self.scheduler.schedule(after);
        self.events.insert(event_id, event);
        event_id
    }

    /// Cancelling an unknown or already triggered event is a no-op.
    pub fn cancel_event(&mut self, event_id: EventId) {
        if self.events.remove(&event_id).is_some() {
            self.scheduler.cancel(event_id);
        }
    }

    pub fn cancel_all(&mut self) {
        for event_id in self.events.keys() {
            self.scheduler.cancel(*event_id);
        }
        self.events.clear();
    }

    pub fn is_scheduled(&self, event_id: &EventId) -> bool {
        self.events.contains_key(event_id)
    }

    pub fn scheduled_event_count(&self) -> usize {
        self.events.len()
    }
}

#[derive(Default)]
struct FakeSchedulerState {
    next_id: u64,
    scheduled: Vec<(EventId, Duration)>,
}

/// A scheduler which never fires on its own. Tests inspect the armed events and trigger them by
/// calling back into the code under test.
#[derive(Clone, Default)]
pub struct FakeScheduler {
    state: Rc<RefCell<FakeSchedulerState>>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_scheduler(&self) -> Box<dyn Scheduler> {
        Box::new(self.clone())
    }

    /// Events currently armed, in the order they were scheduled.
    pub fn scheduled(&self) -> Vec<(EventId, Duration)> {
        self.state.borrow().scheduled.clone()
    }

    pub fn next_id(&self) -> u64 {
        self.state.borrow().next_id
    }
}

impl Scheduler for FakeScheduler {
    fn schedule(&mut self, after: Duration) -> EventId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = EventId(state.next_id);
        state.scheduled.push((id, after));
        id
    }

    fn cancel(&mut self, id: EventId) {
        self.state.borrow_mut().scheduled.retain(|(scheduled_id, _)| *scheduled_id != id);
    }
}
