//! Role processes run inside a restore job.

mod master;
mod worker;

use std::sync::Arc;

pub use master::{MasterOptions, RestoreMaster};
pub use worker::RestoreWorker;

use crate::{
    config::OperationConfig,
    error::{RestoreError, Result},
    identity::ServerIdentity,
    role::RestoreRole,
};

/// What a role process is handed at construction.
#[derive(Debug, Clone)]
pub struct RoleContext {
    role: RestoreRole,
    id: ServerIdentity,
    config: Arc<OperationConfig>,
}

impl RoleContext {
    pub fn new(
        role: RestoreRole,
        id: ServerIdentity,
        config: Arc<OperationConfig>,
    ) -> Result<Self> {
        if !role.is_participant() {
            return Err(RestoreError::InvalidRole(role));
        }
        Ok(Self { role, id, config })
    }

    pub fn role(&self) -> RestoreRole {
        self.role
    }

    pub fn id(&self) -> ServerIdentity {
        self.id
    }

    pub fn config(&self) -> &OperationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_never_carries_invalid_role() {
        let config = Arc::new(OperationConfig::default());
        let id = ServerIdentity::new(1, 1);
        assert!(matches!(
            RoleContext::new(RestoreRole::Invalid, id, Arc::clone(&config)),
            Err(RestoreError::InvalidRole(RestoreRole::Invalid))
        ));

        let ctx = RoleContext::new(RestoreRole::Loader, id, config).unwrap();
        assert_eq!(ctx.role(), RestoreRole::Loader);
        assert_eq!(ctx.config().loader_count(), 120);
    }
}
