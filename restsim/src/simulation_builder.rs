use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap},
};

use crate::{
    ProcessHandle, ProcessId, Simulation,
    process::UniqueProcessHandle,
    random::Seed,
    time::Jiffies,
    topology::{LatencyDescription, LatencyTopology},
};

#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let module_path = record.module_path().unwrap_or("unknown");
            let crate_name = module_path.split("::").next().unwrap_or(module_path);
            use std::io::Write;
            writeln!(buf, "[{}] {}", crate_name, record.args())
        })
        .try_init();
}

/// Assembles pools of processes, link latencies and planned faults into a
/// [`Simulation`].
///
/// ```rust
/// use restsim::{Jiffies, MessagePtr, ProcessHandle, ProcessId, SimulationBuilder, TimerId};
///
/// #[derive(Default)]
/// struct Idle;
///
/// impl ProcessHandle for Idle {
///     fn start(&mut self) {}
///     fn on_message(&mut self, _from: ProcessId, _message: MessagePtr) {}
///     fn on_timer(&mut self, _id: TimerId) {}
/// }
///
/// let builder = SimulationBuilder::default().add_pool::<Idle>("Idle", 3);
/// assert_eq!(builder.process_id("Idle", 2), 3);
/// builder.time_budget(Jiffies(10)).build().run();
/// ```
pub struct SimulationBuilder {
    seed: Seed,
    time_budget: Jiffies,
    proc_id: usize,
    pools: HashMap<String, Vec<(ProcessId, UniqueProcessHandle)>>,
    latency_topology: LatencyTopology,
    offline: BTreeSet<ProcessId>,
    stops: Vec<(ProcessId, Jiffies)>,
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        SimulationBuilder {
            seed: 69,
            time_budget: Jiffies(1_000_000),
            proc_id: 1,
            pools: HashMap::new(),
            latency_topology: HashMap::new(),
            offline: BTreeSet::new(),
            stops: Vec::new(),
        }
    }
}

impl SimulationBuilder {
    pub fn add_pool<P: ProcessHandle + Default + 'static>(self, name: &str, size: usize) -> Self {
        self.add_pool_with(name, size, |_| P::default())
    }

    /// Adds `size` processes built by `factory`, which receives the index of
    /// the process within the pool. An empty pool is still registered, so
    /// [`list_pool`](crate::list_pool) returns an empty listing for it.
    pub fn add_pool_with<P, F>(mut self, name: &str, size: usize, mut factory: F) -> Self
    where
        P: ProcessHandle + 'static,
        F: FnMut(usize) -> P,
    {
        let pool = self.pools.entry(name.to_string()).or_default();
        for index in 0..size {
            let id = self.proc_id;
            self.proc_id += 1;
            pool.push((id, Box::new(factory(index))));
        }
        self
    }

    /// Id of the `index`-th process of `pool`.
    pub fn process_id(&self, pool: &str, index: usize) -> ProcessId {
        self.pools
            .get(pool)
            .expect("No pool found")
            .get(index)
            .map(|(id, _)| *id)
            .expect("No process with such index in pool")
    }

    /// The process never starts and silently drops everything sent to it.
    pub fn offline(mut self, pool: &str, index: usize) -> Self {
        let id = self.process_id(pool, index);
        self.offline.insert(id);
        self
    }

    /// Tears the process down at `at`: its `on_stop` runs, then it receives
    /// nothing more.
    pub fn stop_at(mut self, pool: &str, index: usize, at: Jiffies) -> Self {
        let id = self.process_id(pool, index);
        self.stops.push((id, at));
        self
    }

    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    pub fn time_budget(mut self, time_budget: Jiffies) -> Self {
        self.time_budget = time_budget;
        self
    }

    // Should be called only after all add_pool calls
    pub fn latency_topology(mut self, descriptions: &[LatencyDescription]) -> Self {
        descriptions.iter().for_each(|d| {
            let (from, to, distr) = match d {
                LatencyDescription::WithinPool(name, distr) => (*name, *name, distr),
                LatencyDescription::BetweenPools(pool_from, pool_to, distr) => {
                    (*pool_from, *pool_to, distr)
                }
            };

            let from_vec = self.pool_ids(from);
            let to_vec = self.pool_ids(to);

            for x in &from_vec {
                for y in &to_vec {
                    self.latency_topology.insert((*x, *y), *distr);
                    self.latency_topology.insert((*y, *x), *distr);
                }
            }
        });
        self
    }

    pub fn build(self) -> Simulation {
        init_logger();

        let mut pool_listing = HashMap::new();
        let mut procs = BTreeMap::new();

        for (name, pool) in self.pools {
            let mut ids = Vec::new();
            for (id, handle) in pool {
                ids.push(id);
                procs.insert(id, RefCell::new(handle));
            }
            pool_listing.insert(name, ids);
        }

        Simulation::new(
            self.seed,
            self.time_budget,
            self.latency_topology,
            pool_listing,
            procs,
            self.offline,
            self.stops,
        )
    }
}

impl SimulationBuilder {
    fn pool_ids(&self, name: &str) -> Vec<ProcessId> {
        self.pools
            .get(name)
            .expect("No pool found")
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }
}
