use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

use log::info;

use crate::{
    ProcessId,
    actor::SharedActor,
    fault::FaultInjector,
    global,
    network::Network,
    nursery::{HandlerMap, Nursery},
    progress::Bar,
    random,
    time::{Jiffies, timer_manager::TimerManager},
    topology::{LatencyTopology, PoolListing, Topology},
};

/// A built simulation, ready to [`run`](Simulation::run).
///
/// Context functions such as [`now`](crate::now) and the
/// [`anykv`](crate::global::anykv) store stay readable after the run; they
/// are cleared when the simulation is dropped.
pub struct Simulation {
    actors: Vec<SharedActor>,
    time_budget: Jiffies,
    progress_bar: Bar,
}

impl Simulation {
    pub(crate) fn new(
        seed: random::Seed,
        time_budget: Jiffies,
        latency_topology: LatencyTopology,
        pool_listing: PoolListing,
        procs: HandlerMap,
        offline: BTreeSet<ProcessId>,
        stops: Vec<(ProcessId, Jiffies)>,
    ) -> Self {
        let topology = Topology::new_shared(pool_listing, latency_topology);
        let nursery = Nursery::new(procs, offline);

        let network_actor = Rc::new(RefCell::new(Network::new(
            seed,
            topology.clone(),
            nursery.clone(),
        )));

        let timers_actor = Rc::new(RefCell::new(TimerManager::new(nursery.clone())));

        let faults_actor = Rc::new(RefCell::new(FaultInjector::new(stops, nursery)));

        global::setup_access(network_actor.clone(), timers_actor.clone(), topology);

        let actors: Vec<SharedActor> = vec![network_actor, timers_actor, faults_actor];

        Self {
            actors,
            time_budget,
            progress_bar: Bar::new(time_budget),
        }
    }

    /// Runs until the time budget is spent or no event is left.
    pub fn run(&mut self) {
        self.start();

        while self.step() {}
        self.progress_bar.finish();

        info!("Simulation stopped at {}", global::now());
    }
}

impl Simulation {
    fn start(&mut self) {
        self.actors.iter_mut().for_each(|actor| {
            actor.borrow_mut().start();
            global::schedule(); // Only after start() to avoid double borrow_mut() of SharedActor
        });
    }

    fn step(&mut self) -> bool {
        let Some((at, actor)) = self.next_event() else {
            info!("No pending events left");
            return false;
        };
        if at > self.time_budget {
            info!("Next event at {at} is past the time budget");
            return false;
        }
        global::fast_forward_clock(at);
        actor.borrow_mut().step();
        global::schedule(); // Only after step() to avoid double borrow_mut() of SharedActor
        self.progress_bar.make_progress(at);
        true
    }

    // Ties go to the earlier actor: network, then timers, then faults
    fn next_event(&self) -> Option<(Jiffies, SharedActor)> {
        self.actors
            .iter()
            .filter_map(|actor| Some((actor.borrow().peek_closest()?, actor)))
            .min_by_key(|(at, _)| *at)
            .map(|(at, actor)| (at, Rc::clone(actor)))
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        global::drop_all(); // Clear thread_locals
    }
}
