//! Monotonic id source shared by timers, requests and anything else in a run
//! that needs an id nobody else holds.

use std::cell::Cell;

thread_local! {
    pub(crate) static TSO: Cell<usize> = const { Cell::new(0) }
}

/// Returns an id never returned before in the current simulation run.
/// The sequence restarts from zero for every run, keeping runs reproducible.
pub fn global_unique_id() -> usize {
    TSO.replace(TSO.get() + 1)
}

pub(crate) fn drop_tso() {
    TSO.take();
}
