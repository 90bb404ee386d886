use std::{cmp::Reverse, collections::BinaryHeap, rc::Rc};

use log::debug;

use crate::{ProcessId, actor::SimulationActor, nursery::Nursery, time::Jiffies};

// Tears processes down at fixed points of virtual time
pub(crate) struct FaultInjector {
    planned_stops: BinaryHeap<Reverse<(Jiffies, ProcessId)>>,
    nursery: Rc<Nursery>,
}

impl FaultInjector {
    pub(crate) fn new(stops: Vec<(ProcessId, Jiffies)>, nursery: Rc<Nursery>) -> Self {
        Self {
            planned_stops: stops.into_iter().map(|(id, at)| Reverse((at, id))).collect(),
            nursery,
        }
    }
}

impl SimulationActor for FaultInjector {
    fn start(&mut self) {
        debug!("{} stops planned", self.planned_stops.len());
    }

    fn step(&mut self) {
        if let Some(Reverse((_, id))) = self.planned_stops.pop() {
            self.nursery.stop(id);
        }
    }

    fn peek_closest(&self) -> Option<Jiffies> {
        self.planned_stops.peek().map(|entry| entry.0.0)
    }
}
