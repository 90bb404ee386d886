use std::collections::HashMap;

use restsim::{
    Jiffies, MessagePtr, ProcessHandle, ProcessId, TimerId, debug_process, info_process,
    list_pool, warn_process,
};

use crate::{
    reply::{ReplyEnvelope, RestoreCommonReply, RestoreRoleReply},
    report::{RequestKind, RequestRecord, RestoreReport},
    request::{ReplyDelivery, RequestId, RestoreRoleRequest, RestoreSimpleRequest},
    role::RestoreRole,
    roles::RoleContext,
    timed::{Completion, RequestOutcome, TimedRequests},
};

pub const DEFAULT_REQUEST_TIMEOUT: Jiffies = Jiffies(100);
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// How long the master waits for each reply and how often it tries a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterOptions {
    pub request_timeout: Jiffies,
    pub max_attempts: usize,
}

impl Default for MasterOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Attempt {
    kind: RequestKind,
    role: RestoreRole,
    target: ProcessId,
    number: usize,
}

/// Brings up a restore: checks that every addressed worker is alive, then
/// that it runs the role it was registered with.
pub struct RestoreMaster {
    ctx: RoleContext,
    options: MasterOptions,
    heartbeats: TimedRequests<RestoreCommonReply>,
    role_checks: TimedRequests<RestoreRoleReply>,
    attempts: HashMap<RequestId, Attempt>,
}

impl RestoreMaster {
    pub fn new(ctx: RoleContext, options: MasterOptions) -> Self {
        debug_assert!(ctx.role() == RestoreRole::Master);
        Self {
            ctx,
            options,
            heartbeats: TimedRequests::default(),
            role_checks: TimedRequests::default(),
            attempts: HashMap::new(),
        }
    }

    /// Workers of `role` this master addresses: as many as the config asks
    /// for, bounded by the pool.
    fn addressed(&self, role: RestoreRole) -> Vec<ProcessId> {
        let wanted = match role {
            RestoreRole::Loader => self.ctx.config().loader_count(),
            RestoreRole::Applier => self.ctx.config().applier_count(),
            _ => 0,
        };
        let mut pool = list_pool(role.name());
        if pool.len() > wanted {
            pool.truncate(wanted);
        }
        pool
    }

    fn dispatch(&mut self, kind: RequestKind, role: RestoreRole, target: ProcessId, number: usize) {
        let timeout = self.options.request_timeout;
        let request = match kind {
            RequestKind::Heartbeat => {
                self.heartbeats
                    .dispatch(target, timeout, RestoreSimpleRequest::new)
            }
            RequestKind::RoleCheck => self.role_checks.dispatch(target, timeout, |reply| {
                RestoreRoleRequest::new(role, reply)
            }),
        };
        self.attempts.insert(
            request,
            Attempt {
                kind,
                role,
                target,
                number,
            },
        );
    }

    fn complete<R: ReplyEnvelope>(
        &mut self,
        completion: Completion<R>,
        reported_role: impl FnOnce(&R) -> Option<RestoreRole>,
    ) {
        let Some(attempt) = self.attempts.remove(&completion.request) else {
            return;
        };

        let mut record = RequestRecord {
            kind: attempt.kind,
            requester: self.ctx.id(),
            request: completion.request,
            role: attempt.role,
            target: attempt.target,
            attempt: attempt.number,
            dispatched_at: completion.dispatched_at,
            completed_at: completion.completed_at,
            state: completion.outcome.state(),
            sender: None,
            reported_role: None,
            hard_failure: false,
        };

        match &completion.outcome {
            RequestOutcome::Fulfilled(reply) => {
                record.sender = Some(reply.sender());
                record.reported_role = reported_role(reply);
                self.on_fulfilled(attempt, &record);
            }
            RequestOutcome::TimedOut(_) if attempt.number < self.options.max_attempts => {
                debug_process!(
                    "Retrying {} to P{}, attempt {}",
                    attempt.kind,
                    attempt.target,
                    attempt.number + 1
                );
                self.dispatch(attempt.kind, attempt.role, attempt.target, attempt.number + 1);
            }
            RequestOutcome::TimedOut(_) => {
                warn_process!(
                    "{} P{} did not answer {} after {} attempts",
                    attempt.role,
                    attempt.target,
                    attempt.kind,
                    attempt.number
                );
                record.hard_failure = true;
            }
            RequestOutcome::Cancelled => {}
        }

        RestoreReport::record(record);
    }

    fn on_fulfilled(&mut self, attempt: Attempt, record: &RequestRecord) {
        match attempt.kind {
            RequestKind::Heartbeat => {
                self.dispatch(RequestKind::RoleCheck, attempt.role, attempt.target, 1);
            }
            RequestKind::RoleCheck if record.reported_role == Some(attempt.role) => {
                info_process!("{} P{} confirmed", attempt.role, attempt.target);
            }
            RequestKind::RoleCheck => {
                warn_process!(
                    "P{} registered as {} but reports {:?}",
                    attempt.target,
                    attempt.role,
                    record.reported_role
                );
            }
        }
    }
}

impl ProcessHandle for RestoreMaster {
    fn start(&mut self) {
        for role in [RestoreRole::Loader, RestoreRole::Applier] {
            let workers = self.addressed(role);
            info_process!(
                "Master {} addressing {} {}s",
                self.ctx.id().short_string(),
                workers.len(),
                role
            );
            for target in workers {
                self.dispatch(RequestKind::Heartbeat, role, target, 1);
            }
        }
    }

    fn on_message(&mut self, from: ProcessId, message: MessagePtr) {
        if let Some(delivery) = message.try_as::<ReplyDelivery<RestoreCommonReply>>() {
            if let Some(completion) = self.heartbeats.on_reply(from, &delivery) {
                self.complete(completion, |_| None);
            }
        } else if let Some(delivery) = message.try_as::<ReplyDelivery<RestoreRoleReply>>() {
            if let Some(completion) = self.role_checks.on_reply(from, &delivery) {
                self.complete(completion, |reply| Some(reply.role));
            }
        } else {
            warn_process!("Dropping unexpected message from P{from}");
        }
    }

    fn on_timer(&mut self, id: TimerId) {
        if self.heartbeats.owns_timer(id) {
            if let Some(completion) = self.heartbeats.on_timer(id) {
                self.complete(completion, |_| None);
            }
        } else if self.role_checks.owns_timer(id) {
            if let Some(completion) = self.role_checks.on_timer(id) {
                self.complete(completion, |_| None);
            }
        }
    }

    fn on_stop(&mut self) {
        let heartbeats = self.heartbeats.cancel_all();
        let role_checks = self.role_checks.cancel_all();
        info_process!(
            "Master stopping, cancelled {} pending requests",
            heartbeats.len() + role_checks.len()
        );
        for completion in heartbeats {
            self.complete(completion, |_| None);
        }
        for completion in role_checks {
            self.complete(completion, |_| None);
        }
    }
}
