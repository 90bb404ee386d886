//! Deterministic discrete-event simulation of message-passing processes.
//!
//! Every participant is a [`ProcessHandle`] driven by a single-threaded event
//! loop over virtual time ([`Jiffies`]). Processes talk through [`send_to`],
//! arm timers with [`schedule_timer_after`] and can be taken offline or torn
//! down by the harness to model crashed peers.

mod actor;
mod communication;
mod fault;
pub mod global;
mod helpers;
mod network;
mod nursery;
mod process;
mod progress;
mod random;
mod simulation;
mod simulation_builder;
pub mod time;
mod topology;

pub use communication::Message;
pub use communication::MessagePtr;

pub use process::ProcessHandle;
pub use process::ProcessId;

pub use simulation::Simulation;
pub use simulation_builder::SimulationBuilder;

pub use global::global_unique_id;
pub use global::list_pool;
pub use global::now;
pub use global::rank;
pub use global::schedule_timer_after;
pub use global::send_to;

pub use topology::LatencyDescription;

pub use random::Distributions;
pub use random::Seed;

pub use time::Jiffies;
pub use time::TimerId;
