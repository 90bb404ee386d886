//! Role and message protocol for a parallel restore.
//!
//! A master drives loaders and appliers through timed requests. Each request
//! carries a one-shot reply channel; the requester alone decides how long to
//! wait and whether to try again. All roles share one read-only
//! [`OperationConfig`] snapshot.

pub mod config;
pub mod error;
pub mod identity;
pub mod job;
pub mod reply;
pub mod report;
pub mod request;
pub mod role;
pub mod roles;
pub mod timed;
pub mod wire;

pub use config::{OperationConfig, OperationConfigCell, OperationConfigOverride};
pub use error::{
    ConfigValidationError, DecodeError, DoubleFulfillment, RequestTimeout, RestoreError, Result,
};
pub use identity::ServerIdentity;
pub use job::{Participant, RestoreJob, RestoreJobBuilder};
pub use reply::{ReplyEnvelope, RestoreCommonReply, RestoreRoleReply};
pub use report::{RequestKind, RequestRecord, RestoreReport};
pub use request::{
    ReplyDelivery, ReplyEndpoint, ReplyPromise, RequestId, RestoreRoleRequest,
    RestoreSimpleRequest, TimedRequest,
};
pub use role::{NUM_ROLES, PerRole, RestoreRole, role_name, role_names};
pub use roles::{MasterOptions, RestoreMaster, RestoreWorker, RoleContext};
pub use timed::{Completion, RequestOutcome, RequestState, TimedRequests};
pub use wire::{FileIdentifier, WireMessage, hex_string};
