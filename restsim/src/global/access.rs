use std::{cell::RefCell, rc::Rc};

use crate::{
    Message, ProcessId,
    actor::EventSubmitter,
    network::NetworkActor,
    time::{
        Jiffies,
        timer_manager::{TimerId, TimerManagerActor, next_timer_id},
    },
    topology::Topology,
};

pub(crate) struct SimulationAccess {
    process_on_execution: ProcessId,
    scheduled_messages: Vec<(ProcessId, ProcessId, Rc<dyn Message>)>,
    scheduled_timers: Vec<(ProcessId, TimerId, Jiffies)>,
    topology: Rc<Topology>,
    network: NetworkActor,
    timers: TimerManagerActor,
}

impl SimulationAccess {
    fn new(network: NetworkActor, timers: TimerManagerActor, topology: Rc<Topology>) -> Self {
        Self {
            process_on_execution: 0,
            scheduled_messages: Vec::new(),
            scheduled_timers: Vec::new(),
            topology,
            network,
            timers,
        }
    }
}

fn drain_to<T: EventSubmitter>(submitter: &Rc<RefCell<T>>, events: &mut Vec<T::Event>) {
    if !events.is_empty() {
        submitter.borrow_mut().submit(events);
    }
}

impl SimulationAccess {
    fn list_pool(&self, name: &str) -> &[ProcessId] {
        self.topology.list_pool(name)
    }

    fn send_to(&mut self, to: ProcessId, message: impl Message + 'static) {
        self.scheduled_messages
            .push((self.process_on_execution, to, Rc::new(message)));
    }

    fn schedule_timer_after(&mut self, after: Jiffies) -> TimerId {
        let timer_id = next_timer_id();
        self.scheduled_timers
            .push((self.process_on_execution, timer_id, after));
        timer_id
    }

    fn drain(&mut self) {
        drain_to(&self.network, &mut self.scheduled_messages);
        drain_to(&self.timers, &mut self.scheduled_timers);
    }

    fn set_process(&mut self, id: ProcessId) {
        self.process_on_execution = id
    }

    fn rank(&self) -> ProcessId {
        self.process_on_execution
    }
}

// Any actor makes step -> Buffering outcoming events -> Drain them to all actors
// Before any process step actor should ensure correct ProcessId on execution via set_process()
thread_local! {
    pub(crate) static ACCESS_HANDLE: RefCell<Option<SimulationAccess>> =
        const { RefCell::new(None) };
}

pub(crate) fn drop_access() {
    ACCESS_HANDLE.take();
}

pub(crate) fn setup_access(
    network: NetworkActor,
    timers: TimerManagerActor,
    topology: Rc<Topology>,
) {
    ACCESS_HANDLE.with_borrow_mut(|access| {
        *access = Some(SimulationAccess::new(network, timers, topology))
    });
}

fn with_access<F, T>(f: F) -> T
where
    F: FnOnce(&mut SimulationAccess) -> T,
{
    ACCESS_HANDLE.with_borrow_mut(|access| f(access.as_mut().expect("Out of simulation context")))
}

pub(crate) fn set_process(id: ProcessId) {
    with_access(|access| access.set_process(id));
}

pub(crate) fn schedule() {
    with_access(|access| access.drain());
}

/// Arms a timer for the current process; it fires exactly `after` jiffies
/// from now.
pub fn schedule_timer_after(after: Jiffies) -> TimerId {
    with_access(|access| access.schedule_timer_after(after))
}

/// Sends `message` from the current process to `to`.
pub fn send_to(to: ProcessId, message: impl Message + 'static) {
    with_access(|access| access.send_to(to, message));
}

/// Id of the process currently executing.
pub fn rank() -> ProcessId {
    with_access(|access| access.rank())
}

/// Members of a pool, in the order they were added.
pub fn list_pool(name: &str) -> Vec<ProcessId> {
    with_access(|access| access.list_pool(name).to_vec())
}
