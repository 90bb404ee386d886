use std::{collections::HashMap, rc::Rc};

use crate::{ProcessId, random::Distributions};

pub(crate) type LatencyTopology = HashMap<(ProcessId, ProcessId), Distributions>;
pub(crate) type PoolListing = HashMap<String, Vec<ProcessId>>;

/// Extra link delay on top of the single jiffy every hop takes.
/// Links without a description add no delay.
pub enum LatencyDescription {
    WithinPool(&'static str, Distributions),
    BetweenPools(&'static str, &'static str, Distributions),
}

pub(crate) struct Topology {
    pool_listing: PoolListing,
    latency_topology: LatencyTopology,
}

impl Topology {
    pub(crate) fn new_shared(
        pool_listing: PoolListing,
        latency_topology: LatencyTopology,
    ) -> Rc<Self> {
        Rc::new(Self {
            pool_listing,
            latency_topology,
        })
    }

    pub(crate) fn get_distribution(&self, from: ProcessId, to: ProcessId) -> Option<Distributions> {
        self.latency_topology.get(&(from, to)).copied()
    }

    pub(crate) fn list_pool(&self, pool_name: &str) -> &[ProcessId] {
        self.pool_listing.get(pool_name).expect("Invalid pool name")
    }
}
