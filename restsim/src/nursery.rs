use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, btree_map::Keys},
    rc::Rc,
};

use log::{debug, info};

use crate::{
    ProcessId, communication::SimMessage, global::set_process, process::MutableProcessHandle,
};

// btree for deterministic iterators
pub(crate) type HandlerMap = BTreeMap<ProcessId, MutableProcessHandle>;

pub(crate) struct Nursery {
    procs: HandlerMap,
    stopped: RefCell<BTreeSet<ProcessId>>,
}

impl Nursery {
    pub(crate) fn new(procs: HandlerMap, offline: BTreeSet<ProcessId>) -> Rc<Self> {
        Rc::new(Self {
            procs,
            stopped: RefCell::new(offline),
        })
    }

    pub(crate) fn start_single(&self, id: ProcessId) {
        if self.is_stopped(id) {
            info!("P{id} is offline, skipping start");
            return;
        }
        set_process(id);
        debug!("Starting P{id}");
        self.procs
            .get(&id)
            .expect("Invalid ProcessId")
            .borrow_mut()
            .start();
    }

    pub(crate) fn deliver(&self, from: ProcessId, to: ProcessId, m: SimMessage) {
        if self.is_stopped(to) {
            debug!("Dropping event From: P{from} | To: P{to}, destination is stopped");
            return;
        }
        let mut handle = self.procs.get(&to).expect("Invalid ProcessId").borrow_mut();
        set_process(to);
        debug!("Executing step for From: P{} | To: P{}", from, to);
        match m {
            SimMessage::NetworkMessage(ptr) => handle.on_message(from, ptr),
            SimMessage::Timer(id) => handle.on_timer(id),
        }
    }

    pub(crate) fn stop(&self, id: ProcessId) {
        if !self.stopped.borrow_mut().insert(id) {
            debug!("P{id} is already stopped");
            return;
        }
        set_process(id);
        info!("Stopping P{id}");
        self.procs
            .get(&id)
            .expect("Invalid ProcessId")
            .borrow_mut()
            .on_stop();
    }

    pub(crate) fn is_stopped(&self, id: ProcessId) -> bool {
        self.stopped.borrow().contains(&id)
    }

    pub(crate) fn keys(&self) -> Keys<'_, ProcessId, MutableProcessHandle> {
        self.procs.keys()
    }
}
