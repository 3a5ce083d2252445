use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::api::config_dto::{BackendDto, ServiceConfigDto};
use crate::domain::backend::cli::CliBackend;
use crate::domain::backend::command::ProcessRunner;
use crate::domain::backend::snapshot::SnapshotBackend;
use crate::domain::classad::ClassAd;
use crate::domain::query_spec::QuerySpec;
use crate::error::Result;

pub mod cli;
pub mod command;
pub mod snapshot;

/// The scheduler as seen by the translator.
///
/// Every method performs exactly one call against the scheduler (one process,
/// or one in-process query) and never retries.
#[async_trait]
pub trait SchedulerBackend: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Ads matching a jobs, history or status query, in scheduler order.
    async fn query_ads(&self, spec: &QuerySpec) -> Result<Vec<ClassAd>>;

    /// Raw value of one configuration attribute.
    async fn config_value(&self, spec: &QuerySpec, attribute: &str) -> Result<String>;

    /// Whole configuration with lower-cased keys.
    async fn config_dump(&self, spec: &QuerySpec) -> Result<Map<String, Value>>;
}

/// Creates the backend selected in the service configuration.
pub fn build_backend(config: &ServiceConfigDto) -> Result<Arc<dyn SchedulerBackend>> {
    match &config.backend {
        BackendDto::Cli { executables } => {
            let runner = Arc::new(ProcessRunner::new(Duration::from_secs(config.command_timeout_secs)));
            log::info!("Using command-line backend with a {}s command timeout.", config.command_timeout_secs);
            Ok(Arc::new(CliBackend::new(executables.clone(), runner)))
        }
        BackendDto::Snapshot { path } => {
            let backend = SnapshotBackend::load(path)?;
            log::info!("Using snapshot backend loaded from '{}'.", path);
            Ok(Arc::new(backend))
        }
    }
}
