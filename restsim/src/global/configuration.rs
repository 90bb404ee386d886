use crate::{ProcessId, global::anykv, random::Seed, rank};

fn seed_key(id: ProcessId) -> String {
    format!("restsim/seed/{id}")
}

// Each process gets its own seed derived from the run seed
pub(crate) fn setup_local_configuration(id: ProcessId, run_seed: Seed) {
    anykv::set::<Seed>(&seed_key(id), run_seed.wrapping_add(id as Seed))
}

/// Seed reserved for the current process, stable across runs with the same
/// run seed.
pub fn seed() -> Seed {
    anykv::get::<Seed>(&seed_key(rank()))
}
