//! Tunables shared by every role of one restore job.
//!
//! The job owns an [`OperationConfigCell`]; the harness may override it before
//! any role starts, after which each role receives the same immutable
//! `Arc<OperationConfig>` snapshot in its startup context.

use std::{fs, path::Path, sync::Arc};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigValidationError, RestoreError, Result};

pub const DEFAULT_LOADER_COUNT: usize = 120;
pub const DEFAULT_APPLIER_COUNT: usize = 40;
// Used when an applier applies multiple mutations in one transaction
pub const DEFAULT_BATCH_SIZE_THRESHOLD_BYTES: f64 = 512.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationConfig {
    loader_count: usize,
    applier_count: usize,
    batch_size_threshold_bytes: f64,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            loader_count: DEFAULT_LOADER_COUNT,
            applier_count: DEFAULT_APPLIER_COUNT,
            batch_size_threshold_bytes: DEFAULT_BATCH_SIZE_THRESHOLD_BYTES,
        }
    }
}

impl OperationConfig {
    pub fn new(
        loader_count: usize,
        applier_count: usize,
        batch_size_threshold_bytes: f64,
    ) -> std::result::Result<Self, ConfigValidationError> {
        let config = Self {
            loader_count,
            applier_count,
            batch_size_threshold_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn loader_count(&self) -> usize {
        self.loader_count
    }

    pub fn applier_count(&self) -> usize {
        self.applier_count
    }

    pub fn batch_size_threshold_bytes(&self) -> f64 {
        self.batch_size_threshold_bytes
    }

    /// Returns a new snapshot with the fields set in `partial` replaced.
    pub fn apply(
        &self,
        partial: &OperationConfigOverride,
    ) -> std::result::Result<Self, ConfigValidationError> {
        Self::new(
            partial.loader_count.unwrap_or(self.loader_count),
            partial.applier_count.unwrap_or(self.applier_count),
            partial
                .batch_size_threshold_bytes
                .unwrap_or(self.batch_size_threshold_bytes),
        )
    }

    /// Renders the snapshot in the same TOML shape an override file uses.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.loader_count < 1 {
            return Err(ConfigValidationError::LoaderCount(self.loader_count));
        }
        if self.applier_count < 1 {
            return Err(ConfigValidationError::ApplierCount(self.applier_count));
        }
        // Also rejects NaN
        if !(self.batch_size_threshold_bytes > 0.0) {
            return Err(ConfigValidationError::BatchSizeThreshold(
                self.batch_size_threshold_bytes,
            ));
        }
        Ok(())
    }
}

/// Fields to replace in the current snapshot. Unset fields keep their value.
///
/// ```toml
/// loader_count = 8
/// batch_size_threshold_bytes = 1024.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperationConfigOverride {
    pub loader_count: Option<usize>,
    pub applier_count: Option<usize>,
    pub batch_size_threshold_bytes: Option<f64>,
}

impl OperationConfigOverride {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let input = fs::read_to_string(path).map_err(|source| RestoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Holder of the current snapshot. Overriding needs `&mut self`, so it
/// cannot race with readers that borrow the cell; roles hold their own
/// `Arc` and never observe a later override. At most one override succeeds.
#[derive(Debug, Clone, Default)]
pub struct OperationConfigCell {
    snapshot: Arc<OperationConfig>,
    overridden: bool,
}

impl OperationConfigCell {
    pub fn new(config: OperationConfig) -> Self {
        Self {
            snapshot: Arc::new(config),
            overridden: false,
        }
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    pub fn get(&self) -> Arc<OperationConfig> {
        Arc::clone(&self.snapshot)
    }

    /// Swaps in a new validated snapshot. Fails once an override has been
    /// applied; on error nothing changes.
    pub fn override_with(
        &mut self,
        partial: &OperationConfigOverride,
    ) -> std::result::Result<(), ConfigValidationError> {
        if self.overridden {
            return Err(ConfigValidationError::AlreadyOverridden);
        }
        let next = self.snapshot.apply(partial)?;
        info!(
            "Operation config overridden: loaders {} -> {}, appliers {} -> {}, \
             batch threshold {} -> {} bytes",
            self.snapshot.loader_count,
            next.loader_count,
            self.snapshot.applier_count,
            next.applier_count,
            self.snapshot.batch_size_threshold_bytes,
            next.batch_size_threshold_bytes,
        );
        self.snapshot = Arc::new(next);
        self.overridden = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let config = OperationConfigCell::default().get();
        assert_eq!(config.loader_count(), 120);
        assert_eq!(config.applier_count(), 40);
        assert_eq!(config.batch_size_threshold_bytes(), 512.0);
    }

    #[test]
    fn rejected_override_keeps_prior_snapshot() {
        let mut cell = OperationConfigCell::default();
        let before = cell.get();

        let err = cell
            .override_with(&OperationConfigOverride {
                loader_count: Some(4),
                applier_count: Some(0),
                ..Default::default()
            })
            .unwrap_err();

        assert_eq!(err, ConfigValidationError::ApplierCount(0));
        assert_eq!(*cell.get(), *before);
        assert_eq!(cell.get().loader_count(), 120);
    }

    #[test]
    fn override_replaces_whole_snapshot() {
        let mut cell = OperationConfigCell::default();
        let held_by_role = cell.get();

        cell.override_with(&OperationConfigOverride {
            applier_count: Some(2),
            batch_size_threshold_bytes: Some(64.0),
            ..Default::default()
        })
        .unwrap();

        let now = cell.get();
        assert_eq!(now.loader_count(), 120);
        assert_eq!(now.applier_count(), 2);
        assert_eq!(now.batch_size_threshold_bytes(), 64.0);
        // Earlier snapshots are values, not views
        assert_eq!(held_by_role.applier_count(), 40);
    }

    #[test]
    fn only_first_successful_override_applies() {
        let mut cell = OperationConfigCell::default();
        cell.override_with(&OperationConfigOverride {
            applier_count: Some(0),
            ..Default::default()
        })
        .unwrap_err();
        assert!(!cell.is_overridden());

        cell.override_with(&OperationConfigOverride {
            loader_count: Some(2),
            ..Default::default()
        })
        .unwrap();
        assert!(cell.is_overridden());

        let again = cell.override_with(&OperationConfigOverride {
            loader_count: Some(7),
            ..Default::default()
        });
        assert_eq!(again, Err(ConfigValidationError::AlreadyOverridden));
        assert_eq!(cell.get().loader_count(), 2);
    }

    #[test]
    fn rendered_config_reads_back_as_override() {
        let config = OperationConfig::new(8, 3, 1024.0).unwrap();
        let rendered = config.to_toml_string().unwrap();
        let partial = OperationConfigOverride::from_toml_str(&rendered).unwrap();
        assert_eq!(OperationConfig::default().apply(&partial), Ok(config));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        match OperationConfigOverride::from_file(&path) {
            Err(RestoreError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected an io error, got {other:?}"),
        }
    }

    #[test]
    fn reads_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "applier_count = 5\nbatch_size_threshold_bytes = 64.0").unwrap();

        let partial = OperationConfigOverride::from_file(file.path()).unwrap();
        assert_eq!(partial.loader_count, None);
        assert_eq!(partial.applier_count, Some(5));
        assert_eq!(partial.batch_size_threshold_bytes, Some(64.0));
    }

    #[test]
    fn every_minimum_is_checked() {
        let base = OperationConfig::default();
        let cases = [
            (
                OperationConfigOverride {
                    loader_count: Some(0),
                    ..Default::default()
                },
                ConfigValidationError::LoaderCount(0),
            ),
            (
                OperationConfigOverride {
                    batch_size_threshold_bytes: Some(0.0),
                    ..Default::default()
                },
                ConfigValidationError::BatchSizeThreshold(0.0),
            ),
            (
                OperationConfigOverride {
                    batch_size_threshold_bytes: Some(-3.5),
                    ..Default::default()
                },
                ConfigValidationError::BatchSizeThreshold(-3.5),
            ),
        ];
        for (partial, expected) in cases {
            assert_eq!(base.apply(&partial), Err(expected));
        }
        assert!(base
            .apply(&OperationConfigOverride {
                batch_size_threshold_bytes: Some(f64::NAN),
                ..Default::default()
            })
            .is_err());
        assert!(OperationConfig::new(1, 1, 0.5).is_ok());
    }

    #[test]
    fn parses_partial_toml() {
        let partial =
            OperationConfigOverride::from_toml_str("loader_count = 8\napplier_count = 3\n")
                .unwrap();
        assert_eq!(partial.loader_count, Some(8));
        assert_eq!(partial.applier_count, Some(3));
        assert_eq!(partial.batch_size_threshold_bytes, None);
        assert!(OperationConfigOverride::from_toml_str("").unwrap().is_empty());
    }

    #[test]
    fn unknown_toml_keys_are_rejected() {
        let err = OperationConfigOverride::from_toml_str("num_loaders = 8").unwrap_err();
        assert!(matches!(err, RestoreError::ConfigParse(_)));
    }
}
