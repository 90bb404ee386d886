use std::{collections::BTreeMap, rc::Rc};

use rand::{Rng, SeedableRng, rngs::StdRng};
use restsim::{
    Jiffies, MessagePtr, ProcessHandle, ProcessId, TimerId, debug_process,
    global::configuration, info_process, schedule_timer_after, warn_process,
};

use crate::{
    reply::{RestoreCommonReply, RestoreRoleReply},
    request::{RestoreRoleRequest, RestoreSimpleRequest},
    role::RestoreRole,
    roles::RoleContext,
};

enum HeldRequest {
    Simple(Rc<RestoreSimpleRequest>),
    Role(Rc<RestoreRoleRequest>),
}

/// A Loader or Applier. Answers heartbeats and role queries, optionally after
/// a delay that models a busy handler.
pub struct RestoreWorker {
    ctx: RoleContext,
    reply_delay: Jiffies,
    reply_jitter: usize,
    rng: Option<StdRng>,
    held: BTreeMap<TimerId, HeldRequest>,
}

impl RestoreWorker {
    pub fn new(ctx: RoleContext) -> Self {
        debug_assert!(ctx.role() != RestoreRole::Master);
        Self {
            ctx,
            reply_delay: Jiffies(0),
            reply_jitter: 0,
            rng: None,
            held: BTreeMap::new(),
        }
    }

    /// Holds every request for `delay` before answering.
    pub fn with_reply_delay(mut self, delay: Jiffies) -> Self {
        self.reply_delay = delay;
        self
    }

    /// Adds up to `jitter` extra jiffies to each hold, drawn from the
    /// process seed.
    pub fn with_reply_jitter(mut self, jitter: usize) -> Self {
        self.reply_jitter = jitter;
        self
    }

    /// Bytes of mutations an Applier groups into one transaction. Loaders do
    /// not batch.
    pub fn transaction_batch_limit(&self) -> Option<usize> {
        match self.ctx.role() {
            RestoreRole::Applier => {
                Some(self.ctx.config().batch_size_threshold_bytes().ceil() as usize)
            }
            _ => None,
        }
    }

    fn hold_for(&mut self) -> Jiffies {
        let jitter = match (self.reply_jitter, self.rng.as_mut()) {
            (0, _) | (_, None) => 0,
            (max, Some(rng)) => rng.random_range(0..=max),
        };
        self.reply_delay + Jiffies(jitter)
    }

    fn accept(&mut self, request: HeldRequest) {
        let hold = self.hold_for();
        if hold == Jiffies(0) {
            self.answer(request);
            return;
        }
        let timer = schedule_timer_after(hold);
        debug_process!("Holding request for {hold}");
        self.held.insert(timer, request);
    }

    fn answer(&self, request: HeldRequest) {
        match request {
            HeldRequest::Simple(request) => {
                request.reply.send(RestoreCommonReply::new(self.ctx.id()));
            }
            HeldRequest::Role(request) => {
                if request.expected != self.ctx.role() {
                    warn_process!(
                        "Asked to confirm role {}, running as {}",
                        request.expected,
                        self.ctx.role()
                    );
                }
                request
                    .reply
                    .send(RestoreRoleReply::new(self.ctx.id(), self.ctx.role()));
            }
        }
    }
}

impl ProcessHandle for RestoreWorker {
    fn start(&mut self) {
        self.rng = Some(StdRng::seed_from_u64(configuration::seed()));
        let id = self.ctx.id().short_string();
        match self.transaction_batch_limit() {
            Some(limit) => {
                info_process!(
                    "{} {id} up, batching {limit} bytes per transaction",
                    self.ctx.role()
                );
            }
            None => {
                info_process!("{} {id} up", self.ctx.role());
            }
        }
    }

    fn on_message(&mut self, from: ProcessId, message: MessagePtr) {
        if let Some(request) = message.try_as::<RestoreSimpleRequest>() {
            debug_process!("Got {request} from P{from}");
            self.accept(HeldRequest::Simple(request));
        } else if let Some(request) = message.try_as::<RestoreRoleRequest>() {
            debug_process!("Got {request} from P{from}");
            self.accept(HeldRequest::Role(request));
        } else {
            warn_process!("Dropping unexpected message from P{from}");
        }
    }

    fn on_timer(&mut self, id: TimerId) {
        if let Some(request) = self.held.remove(&id) {
            self.answer(request);
        }
    }

    fn on_stop(&mut self) {
        // Requesters find out through their own deadlines
        if !self.held.is_empty() {
            info_process!("Stopping with {} unanswered requests", self.held.len());
        }
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::OperationConfig, identity::ServerIdentity};

    fn worker(role: RestoreRole, batch: f64) -> RestoreWorker {
        let config = Arc::new(OperationConfig::new(1, 1, batch).unwrap());
        RestoreWorker::new(RoleContext::new(role, ServerIdentity::new(7, 7), config).unwrap())
    }

    #[test]
    fn only_appliers_batch() {
        assert_eq!(worker(RestoreRole::Loader, 512.0).transaction_batch_limit(), None);
        assert_eq!(
            worker(RestoreRole::Applier, 512.0).transaction_batch_limit(),
            Some(512)
        );
        assert_eq!(
            worker(RestoreRole::Applier, 0.5).transaction_batch_limit(),
            Some(1)
        );
    }
}
