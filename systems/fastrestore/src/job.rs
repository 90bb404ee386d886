//! Assembles masters, loaders and appliers into one runnable restore job.
//!
//! ```rust
//! use fastrestore::{RestoreJobBuilder, RestoreRole, RequestState};
//!
//! let job = RestoreJobBuilder::default()
//!     .loaders(2)
//!     .appliers(1)
//!     .offline(RestoreRole::Loader, 1)
//!     .max_attempts(1)
//!     .build()
//!     .unwrap();
//! let offline = job.participant(RestoreRole::Loader, 1).unwrap().process;
//!
//! let report = job.run();
//! assert!(report.for_target(offline).all(|r| r.state == RequestState::TimedOut));
//! assert_eq!(report.confirmed().len(), 2);
//! ```

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use restsim::{
    Distributions, Jiffies, LatencyDescription, ProcessId, Seed, Simulation, SimulationBuilder,
};

use crate::{
    config::{OperationConfig, OperationConfigCell, OperationConfigOverride},
    error::{ConfigValidationError, RestoreError, Result},
    identity::ServerIdentity,
    report::RestoreReport,
    role::{PerRole, RestoreRole},
    roles::{MasterOptions, RestoreMaster, RestoreWorker, RoleContext},
};

/// A process of the job and the identity it was started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub role: RestoreRole,
    pub index: usize,
    pub process: ProcessId,
    pub id: ServerIdentity,
}

pub struct RestoreJobBuilder {
    sizes: PerRole<usize>,
    seed: Seed,
    time_budget: Jiffies,
    options: MasterOptions,
    reply_delay: Jiffies,
    reply_jitter: usize,
    slow: Vec<(RestoreRole, usize, Jiffies)>,
    link_latency: Option<Distributions>,
    offline: Vec<(RestoreRole, usize)>,
    stops: Vec<(RestoreRole, usize, Jiffies)>,
    config: OperationConfigCell,
}

impl Default for RestoreJobBuilder {
    fn default() -> Self {
        Self {
            sizes: PerRole::new(1, 4, 2),
            seed: 69,
            time_budget: Jiffies(100_000),
            options: MasterOptions::default(),
            reply_delay: Jiffies(0),
            reply_jitter: 0,
            slow: Vec::new(),
            link_latency: None,
            offline: Vec::new(),
            stops: Vec::new(),
            config: OperationConfigCell::default(),
        }
    }
}

impl RestoreJobBuilder {
    pub fn masters(self, count: usize) -> Self {
        self.sized(RestoreRole::Master, count)
    }

    pub fn loaders(self, count: usize) -> Self {
        self.sized(RestoreRole::Loader, count)
    }

    pub fn appliers(self, count: usize) -> Self {
        self.sized(RestoreRole::Applier, count)
    }

    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    pub fn time_budget(mut self, time_budget: Jiffies) -> Self {
        self.time_budget = time_budget;
        self
    }

    pub fn request_timeout(mut self, timeout: Jiffies) -> Self {
        self.options.request_timeout = timeout;
        self
    }

    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.options.max_attempts = attempts.max(1);
        self
    }

    /// Delay every worker holds a request before answering.
    pub fn reply_delay(mut self, delay: Jiffies) -> Self {
        self.reply_delay = delay;
        self
    }

    pub fn reply_jitter(mut self, jitter: usize) -> Self {
        self.reply_jitter = jitter;
        self
    }

    /// Overrides the reply delay of a single worker.
    pub fn slow(mut self, role: RestoreRole, index: usize, delay: Jiffies) -> Self {
        self.slow.push((role, index, delay));
        self
    }

    /// Extra delay on links between masters and workers.
    pub fn link_latency(mut self, distribution: Distributions) -> Self {
        self.link_latency = Some(distribution);
        self
    }

    pub fn offline(mut self, role: RestoreRole, index: usize) -> Self {
        self.offline.push((role, index));
        self
    }

    pub fn stop_at(mut self, role: RestoreRole, index: usize, at: Jiffies) -> Self {
        self.stops.push((role, index, at));
        self
    }

    /// Overrides the operation config the job's roles will start with.
    /// Only possible before [`build`](Self::build) and only once; a rejected
    /// override leaves the current config in place and does not use up the
    /// one allowed.
    pub fn override_config(
        &mut self,
        partial: &OperationConfigOverride,
    ) -> std::result::Result<(), ConfigValidationError> {
        self.config.override_with(partial)
    }

    pub fn config(&self) -> Arc<OperationConfig> {
        self.config.get()
    }

    pub fn build(self) -> Result<RestoreJob> {
        self.check_indices()?;

        let config = self.config.get();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut participants = Vec::new();
        let mut builder = SimulationBuilder::default()
            .seed(self.seed)
            .time_budget(self.time_budget);

        for role in RestoreRole::PARTICIPANTS {
            let contexts = (0..self.size(role))
                .map(|_| {
                    RoleContext::new(role, ServerIdentity::random(&mut rng), Arc::clone(&config))
                })
                .collect::<Result<Vec<_>>>()?;

            builder = match role {
                RestoreRole::Master => {
                    let options = self.options;
                    builder.add_pool_with(role.name(), contexts.len(), |i| {
                        RestoreMaster::new(contexts[i].clone(), options)
                    })
                }
                _ => builder.add_pool_with(role.name(), contexts.len(), |i| {
                    RestoreWorker::new(contexts[i].clone())
                        .with_reply_delay(self.delay_of(role, i))
                        .with_reply_jitter(self.reply_jitter)
                }),
            };

            for (index, ctx) in contexts.iter().enumerate() {
                participants.push(Participant {
                    role,
                    index,
                    process: builder.process_id(role.name(), index),
                    id: ctx.id(),
                });
            }
        }

        if let Some(distribution) = self.link_latency {
            let master = RestoreRole::Master.name();
            builder = builder.latency_topology(&[
                LatencyDescription::BetweenPools(master, RestoreRole::Loader.name(), distribution),
                LatencyDescription::BetweenPools(master, RestoreRole::Applier.name(), distribution),
            ]);
        }
        for (role, index) in &self.offline {
            builder = builder.offline(role.name(), *index);
        }
        for (role, index, at) in &self.stops {
            builder = builder.stop_at(role.name(), *index, *at);
        }

        Ok(RestoreJob {
            simulation: builder.build(),
            participants,
            config,
        })
    }

    fn sized(mut self, role: RestoreRole, count: usize) -> Self {
        if let Some(size) = self.sizes.get_mut(role) {
            *size = count;
        }
        self
    }

    fn size(&self, role: RestoreRole) -> usize {
        self.sizes.get(role).copied().unwrap_or(0)
    }

    fn delay_of(&self, role: RestoreRole, index: usize) -> Jiffies {
        self.slow
            .iter()
            .rev()
            .find(|(r, i, _)| *r == role && *i == index)
            .map_or(self.reply_delay, |(_, _, delay)| *delay)
    }

    fn check_indices(&self) -> Result<()> {
        let faulted = self
            .offline
            .iter()
            .copied()
            .chain(self.stops.iter().map(|(role, index, _)| (*role, *index)))
            .chain(self.slow.iter().map(|(role, index, _)| (*role, *index)));
        for (role, index) in faulted {
            if !role.is_participant() {
                return Err(RestoreError::InvalidRole(role));
            }
            if index >= self.size(role) {
                return Err(RestoreError::UnknownParticipant { role, index });
            }
        }
        Ok(())
    }
}

pub struct RestoreJob {
    simulation: Simulation,
    participants: Vec<Participant>,
    config: Arc<OperationConfig>,
}

impl RestoreJob {
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, role: RestoreRole, index: usize) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.role == role && p.index == index)
    }

    /// The snapshot every role of this job was started with.
    pub fn config(&self) -> &OperationConfig {
        &self.config
    }

    pub fn run(mut self) -> RestoreReport {
        self.simulation.run();
        RestoreReport::collect()
    }
}
