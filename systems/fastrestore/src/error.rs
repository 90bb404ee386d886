use std::path::PathBuf;

use restsim::{Jiffies, ProcessId};
use thiserror::Error;

use crate::{request::RequestId, role::RestoreRole, wire::FileIdentifier};

pub type Result<T> = std::result::Result<T, RestoreError>;

/// A message or tag that cannot be read back. Never mapped onto a default;
/// the transport drops or rejects the offending message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown restore role tag {0}")]
    UnknownRoleTag(u32),

    #[error("unexpected file identifier {found}, expected {expected}")]
    UnexpectedFileIdentifier {
        expected: FileIdentifier,
        found: FileIdentifier,
    },

    #[error("message truncated: needed {needed} more bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
}

/// Rejected configuration override. The snapshot in effect before the
/// override stays in effect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("loader_count must be at least 1, got {0}")]
    LoaderCount(usize),

    #[error("applier_count must be at least 1, got {0}")]
    ApplierCount(usize),

    #[error("batch_size_threshold_bytes must be positive, got {0}")]
    BatchSizeThreshold(f64),

    #[error("operation config was already overridden")]
    AlreadyOverridden,
}

/// The requester stopped waiting. Says nothing about the handler, which may
/// still be working on the request.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("request #{request} to P{target} timed out after {timeout}")]
pub struct RequestTimeout {
    pub request: RequestId,
    pub target: ProcessId,
    pub timeout: Jiffies,
}

/// A reply channel was fulfilled a second time. Logged and ignored.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("reply to P{requester} for request #{request} was already sent")]
pub struct DoubleFulfillment {
    pub requester: ProcessId,
    pub request: RequestId,
}

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Config(#[from] ConfigValidationError),

    #[error(transparent)]
    Timeout(#[from] RequestTimeout),

    #[error("failed to parse operation config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to render operation config: {0}")]
    ConfigRender(#[from] toml::ser::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("a participant cannot be registered with role {0}")]
    InvalidRole(RestoreRole),

    #[error("no {role} with index {index} in this job")]
    UnknownParticipant { role: RestoreRole, index: usize },
}
