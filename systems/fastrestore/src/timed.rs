//! Requester-side bookkeeping for timed requests.
//!
//! Every dispatch arms a timer for the deadline. Whichever comes first, the
//! reply or the timer, moves the request out of `Pending`; the loser is
//! ignored. Timers are never cancelled, so a finished request stays tracked
//! until its deadline fires and is forgotten then. A reply arriving after
//! that is treated like any other stray reply.

use std::collections::{BTreeMap, HashMap};

use restsim::{
    Jiffies, ProcessId, TimerId, debug_process, global_unique_id, info_process, now, rank,
    schedule_timer_after, send_to, warn_process,
};

use crate::{
    error::RequestTimeout,
    reply::ReplyEnvelope,
    request::{ReplyDelivery, ReplyEndpoint, ReplyPromise, RequestId, TimedRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    Pending,
    Fulfilled,
    TimedOut,
    Cancelled,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        self != RequestState::Pending
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome<R> {
    Fulfilled(R),
    TimedOut(RequestTimeout),
    Cancelled,
}

impl<R> RequestOutcome<R> {
    pub fn state(&self) -> RequestState {
        match self {
            RequestOutcome::Fulfilled(_) => RequestState::Fulfilled,
            RequestOutcome::TimedOut(_) => RequestState::TimedOut,
            RequestOutcome::Cancelled => RequestState::Cancelled,
        }
    }
}

/// A request that left `Pending`, with the times it was open.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion<R> {
    pub request: RequestId,
    pub target: ProcessId,
    pub dispatched_at: Jiffies,
    pub completed_at: Jiffies,
    pub outcome: RequestOutcome<R>,
}

#[derive(Debug)]
struct Entry {
    target: ProcessId,
    timeout: Jiffies,
    dispatched_at: Jiffies,
    state: RequestState,
}

/// Timed requests of one reply type issued by the current process.
#[derive(Debug)]
pub struct TimedRequests<R> {
    entries: BTreeMap<RequestId, Entry>,
    deadlines: HashMap<TimerId, RequestId>,
    _reply: std::marker::PhantomData<fn() -> R>,
}

impl<R> Default for TimedRequests<R> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            deadlines: HashMap::new(),
            _reply: std::marker::PhantomData,
        }
    }
}

impl<R: ReplyEnvelope> TimedRequests<R> {
    /// Sends the request built by `build` to `target` and starts its deadline.
    /// `build` receives a fresh reply channel addressed to the current process.
    pub fn dispatch<Q, F>(&mut self, target: ProcessId, timeout: Jiffies, build: F) -> RequestId
    where
        Q: TimedRequest<Reply = R>,
        F: FnOnce(ReplyPromise<R>) -> Q,
    {
        let request = global_unique_id();
        let message = build(ReplyPromise::new(ReplyEndpoint {
            requester: rank(),
            request,
        }));
        debug_process!("Dispatching {message} #{request} to P{target}, timeout {timeout}");
        send_to(target, message);

        let timer = schedule_timer_after(timeout);
        self.deadlines.insert(timer, request);
        self.entries.insert(
            request,
            Entry {
                target,
                timeout,
                dispatched_at: now(),
                state: RequestState::Pending,
            },
        );
        request
    }

    /// Resolves the request a reply belongs to. Replies for untracked or
    /// already finished requests are logged and dropped.
    pub fn on_reply(
        &mut self,
        from: ProcessId,
        delivery: &ReplyDelivery<R>,
    ) -> Option<Completion<R>> {
        let Some(entry) = self.entries.get_mut(&delivery.request) else {
            info_process!(
                "Reply from P{from} for untracked request #{} dropped",
                delivery.request
            );
            return None;
        };
        if entry.target != from {
            warn_process!(
                "Reply for request #{} came from P{from}, expected P{}",
                delivery.request,
                entry.target
            );
            return None;
        }
        if entry.state.is_terminal() {
            info_process!(
                "Late reply from P{from} for request #{} ignored, already {:?}",
                delivery.request,
                entry.state
            );
            return None;
        }

        entry.state = RequestState::Fulfilled;
        debug_process!(
            "Request #{} fulfilled by {}",
            delivery.request,
            delivery.reply.sender()
        );
        Some(Completion {
            request: delivery.request,
            target: entry.target,
            dispatched_at: entry.dispatched_at,
            completed_at: now(),
            outcome: RequestOutcome::Fulfilled(delivery.reply.clone()),
        })
    }

    /// Whether `timer` is a deadline armed by this tracker.
    pub fn owns_timer(&self, timer: TimerId) -> bool {
        self.deadlines.contains_key(&timer)
    }

    /// Handles a fired deadline and stops tracking its request. Returns the
    /// timeout if the request was still pending, `None` if it had finished or
    /// the timer is not ours.
    pub fn on_timer(&mut self, timer: TimerId) -> Option<Completion<R>> {
        let request = self.deadlines.remove(&timer)?;
        let entry = self.entries.remove(&request)?;
        if entry.state.is_terminal() {
            return None;
        }

        let timeout = RequestTimeout {
            request,
            target: entry.target,
            timeout: entry.timeout,
        };
        info_process!("{timeout}");
        Some(Completion {
            request,
            target: entry.target,
            dispatched_at: entry.dispatched_at,
            completed_at: now(),
            outcome: RequestOutcome::TimedOut(timeout),
        })
    }

    /// Cancels every pending request, oldest first, and forgets all of them.
    pub fn cancel_all(&mut self) -> Vec<Completion<R>> {
        let at = now();
        self.deadlines.clear();
        std::mem::take(&mut self.entries)
            .into_iter()
            .filter(|(_, entry)| entry.state == RequestState::Pending)
            .map(|(request, entry)| Completion {
                request,
                target: entry.target,
                dispatched_at: entry.dispatched_at,
                completed_at: at,
                outcome: RequestOutcome::Cancelled,
            })
            .collect()
    }

    /// State of a request still tracked. `None` once its deadline has fired.
    pub fn state(&self, request: RequestId) -> Option<RequestState> {
        self.entries.get(&request).map(|entry| entry.state)
    }

    /// Number of requests still waiting for a reply.
    pub fn pending(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state == RequestState::Pending)
            .count()
    }

    /// Number of requests still tracked, pending or waiting for their
    /// deadline to be forgotten.
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}
