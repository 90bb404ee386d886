//! Process trait and identification types.

use std::cell::RefCell;

use crate::{MessagePtr, time::TimerId};

/// Identifier of a process within one simulation run.
///
/// Ids are assigned sequentially from `1` in the order processes are added to
/// the [`SimulationBuilder`](crate::SimulationBuilder), so the same builder
/// calls always produce the same ids.
pub type ProcessId = usize;

pub(crate) type UniqueProcessHandle = Box<dyn ProcessHandle>;
pub(crate) type MutableProcessHandle = RefCell<UniqueProcessHandle>;

/// Behaviour of a simulated process.
///
/// The simulation calls [`start`](ProcessHandle::start) once, then drives the
/// process with deliveries and timer firings until the run ends or the harness
/// stops it. While any of these methods runs, the context functions
/// ([`send_to`](crate::send_to), [`schedule_timer_after`](crate::schedule_timer_after),
/// [`rank`](crate::rank), [`now`](crate::now)) act on behalf of this process.
pub trait ProcessHandle {
    // This method requires process to schedule some initial messages.
    fn start(&mut self);

    // Deliver message
    fn on_message(&mut self, from: ProcessId, message: MessagePtr);

    // Fire timer with id that was returned on schedule_timer_after() call
    fn on_timer(&mut self, id: TimerId);

    /// Called once when the harness tears the process down. Nothing is
    /// delivered to the process afterwards, including its own timers.
    fn on_stop(&mut self) {}
}
