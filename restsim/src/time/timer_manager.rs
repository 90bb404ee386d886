//! Timers fire deterministically at `now() + after` on the process that
//! scheduled them. There is no cancellation: a process that loses interest in
//! a timer ignores its id when it fires.

use std::{cell::RefCell, cmp::Reverse, collections::BinaryHeap, rc::Rc};

use log::debug;

use crate::{
    ProcessId,
    actor::{EventSubmitter, SimulationActor},
    communication::SimMessage,
    global, now,
    nursery::Nursery,
    time::Jiffies,
};

/// Identifier handed out by [`schedule_timer_after`](crate::schedule_timer_after)
/// and passed back to [`ProcessHandle::on_timer`](crate::ProcessHandle::on_timer).
///
/// Ids come from [`global_unique_id`](crate::global_unique_id), so they never
/// collide with each other within a run.
pub type TimerId = usize;

pub(crate) fn next_timer_id() -> TimerId {
    global::global_unique_id()
}

pub(crate) type TimerManagerActor = Rc<RefCell<TimerManager>>;

// Ordered by deadline, then by id, which follows arming order
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct ArmedTimer {
    fires_at: Jiffies,
    id: TimerId,
    owner: ProcessId,
}

pub(crate) struct TimerManager {
    armed: BinaryHeap<Reverse<ArmedTimer>>,
    nursery: Rc<Nursery>,
}

impl TimerManager {
    pub(crate) fn new(nursery: Rc<Nursery>) -> Self {
        Self {
            armed: BinaryHeap::new(),
            nursery,
        }
    }
}

impl SimulationActor for TimerManager {
    fn start(&mut self) {}

    fn peek_closest(&self) -> Option<Jiffies> {
        self.armed.peek().map(|Reverse(timer)| timer.fires_at)
    }

    fn step(&mut self) {
        let Some(Reverse(timer)) = self.armed.pop() else {
            return;
        };
        debug!("Timer {} of P{} fires", timer.id, timer.owner);
        self.nursery
            .deliver(timer.owner, timer.owner, SimMessage::Timer(timer.id));
    }
}

impl EventSubmitter for TimerManager {
    type Event = (ProcessId, TimerId, Jiffies);

    fn submit(&mut self, events: &mut Vec<Self::Event>) {
        let at = now();
        for (owner, id, after) in events.drain(..) {
            let fires_at = at + after;
            debug!("P{owner} armed timer {id} to fire at {fires_at}");
            self.armed.push(Reverse(ArmedTimer { fires_at, id, owner }));
        }
    }
}
