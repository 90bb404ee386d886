mod latency;

use std::cell::RefCell;
use std::rc::Rc;

pub(crate) use latency::LatencyQueue;
use log::debug;

use crate::Message;
use crate::MessagePtr;
use crate::ProcessId;
use crate::actor::EventSubmitter;
use crate::actor::SimulationActor;
use crate::communication::ProcessStep;
use crate::communication::RoutedMessage;
use crate::communication::SimMessage;
use crate::global::configuration;
use crate::now;
use crate::nursery::Nursery;
use crate::random::Randomizer;
use crate::random::Seed;
use crate::time::Jiffies;
use crate::topology::Topology;

pub(crate) type NetworkActor = Rc<RefCell<Network>>;

pub(crate) struct Network {
    seed: Seed,
    sequence: u64,
    latency_queue: LatencyQueue,
    nursery: Rc<Nursery>,
}

impl Network {
    pub(crate) fn new(seed: Seed, topology: Rc<Topology>, nursery: Rc<Nursery>) -> Self {
        Self {
            seed,
            sequence: 0,
            latency_queue: LatencyQueue::new(Randomizer::new(seed), topology),
            nursery,
        }
    }

    fn submit_single_message(
        &mut self,
        message: Rc<dyn Message>,
        source: ProcessId,
        dest: ProcessId,
    ) {
        debug!("Submitting message from P{source} to P{dest}");
        self.sequence += 1;
        self.latency_queue.push(RoutedMessage {
            // Without any latency message will arrive on next timepoint
            arrival_time: now() + Jiffies(1),
            sequence: self.sequence,
            step: ProcessStep {
                source,
                dest,
                message,
            },
        });
    }

    fn execute_process_step(&mut self, step: ProcessStep) {
        self.nursery.deliver(
            step.source,
            step.dest,
            SimMessage::NetworkMessage(MessagePtr(step.message)),
        );
    }
}

impl SimulationActor for Network {
    fn start(&mut self) {
        let ids: Vec<ProcessId> = self.nursery.keys().copied().collect();
        ids.into_iter().for_each(|id| {
            configuration::setup_local_configuration(id, self.seed);
            self.nursery.start_single(id);
        });
    }

    fn step(&mut self) {
        if let Some(message) = self.latency_queue.pop() {
            self.execute_process_step(message.step);
        }
    }

    fn peek_closest(&self) -> Option<Jiffies> {
        self.latency_queue.peek().map(|m| m.arrival_time)
    }
}

impl EventSubmitter for Network {
    type Event = (ProcessId, ProcessId, Rc<dyn Message>);

    fn submit(&mut self, events: &mut Vec<Self::Event>) {
        events.drain(..).for_each(|(from, to, message)| {
            self.submit_single_message(message, from, to);
        });
    }
}
