//! Per-request records of a restore job, collected while the simulation runs.

use std::fmt::{self, Display};

use restsim::{Jiffies, ProcessId, global::anykv};

use crate::{
    identity::ServerIdentity,
    request::RequestId,
    role::RestoreRole,
    timed::RequestState,
};

const REPORT_KEY: &str = "fastrestore/report";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Heartbeat,
    RoleCheck,
}

impl Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Heartbeat => f.write_str("heartbeat"),
            RequestKind::RoleCheck => f.write_str("role-check"),
        }
    }
}

/// One terminal request outcome as seen by the master that issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub kind: RequestKind,
    pub requester: ServerIdentity,
    pub request: RequestId,
    pub role: RestoreRole,
    pub target: ProcessId,
    pub attempt: usize,
    pub dispatched_at: Jiffies,
    pub completed_at: Jiffies,
    pub state: RequestState,
    pub sender: Option<ServerIdentity>,
    pub reported_role: Option<RestoreRole>,
    /// Last attempt timed out and no retries were left.
    pub hard_failure: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    records: Vec<RequestRecord>,
}

impl RestoreReport {
    /// Appends to the report of the running simulation.
    pub(crate) fn record(record: RequestRecord) {
        anykv::modify_or_default::<RestoreReport>(REPORT_KEY, |report| {
            report.records.push(record)
        });
    }

    /// Takes the report of the running simulation. Must be called before the
    /// simulation is dropped.
    pub(crate) fn collect() -> Self {
        anykv::try_get::<RestoreReport>(REPORT_KEY).unwrap_or_default()
    }

    pub fn records(&self) -> &[RequestRecord] {
        &self.records
    }

    pub fn for_target(&self, target: ProcessId) -> impl Iterator<Item = &RequestRecord> {
        self.records.iter().filter(move |r| r.target == target)
    }

    pub fn count(&self, kind: RequestKind, state: RequestState) -> usize {
        self.records
            .iter()
            .filter(|r| r.kind == kind && r.state == state)
            .count()
    }

    pub fn hard_failures(&self) -> impl Iterator<Item = &RequestRecord> {
        self.records.iter().filter(|r| r.hard_failure)
    }

    /// Workers whose role check came back with the role they were addressed as.
    pub fn confirmed(&self) -> Vec<ProcessId> {
        let mut confirmed: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.kind == RequestKind::RoleCheck && r.reported_role == Some(r.role))
            .map(|r| r.target)
            .collect();
        confirmed.sort_unstable();
        confirmed.dedup();
        confirmed
    }
}

impl Display for RestoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10} {:<8} {:>6} {:>7} {:>10} {:>10}  {:<9} sender",
            "kind", "role", "target", "attempt", "dispatched", "completed", "state"
        )?;
        for r in &self.records {
            let state = if r.hard_failure {
                "Failed".to_string()
            } else {
                format!("{:?}", r.state)
            };
            writeln!(
                f,
                "{:<10} {:<8} {:>6} {:>7} {:>10} {:>10}  {:<9} {}",
                r.kind.to_string(),
                r.role.name(),
                format!("P{}", r.target),
                r.attempt,
                r.dispatched_at.0,
                r.completed_at.0,
                state,
                r.sender.map(|s| s.short_string()).unwrap_or_else(|| "-".into()),
            )?;
        }
        Ok(())
    }
}
