use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::api::snapshot_dto::PoolSnapshotDto;
use crate::domain::attribute::Projection;
use crate::domain::backend::SchedulerBackend;
use crate::domain::classad::{ClassAd, scalar_text};
use crate::domain::expression;
use crate::domain::query_spec::QuerySpec;
use crate::domain::resource::ResourceKind;
use crate::error::{Error, Result};
use crate::loader::parser::parse_json_file;

/// In-process backend answering queries from a loaded pool snapshot.
///
/// Plays the role of the scheduler's client library: constraints are
/// evaluated and projections applied here instead of by an external tool.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBackend {
    jobs: Vec<ClassAd>,
    history: Vec<ClassAd>,
    status: Vec<ClassAd>,
    config: Map<String, Value>,
    daemon_config: HashMap<String, Map<String, Value>>,
}

impl SnapshotBackend {
    pub fn load(path: &str) -> Result<Self> {
        let dto: PoolSnapshotDto = parse_json_file(path)?;
        Ok(Self::from_dto(dto))
    }

    pub fn from_dto(dto: PoolSnapshotDto) -> Self {
        let ads = |records: Vec<Map<String, Value>>| records.into_iter().map(ClassAd::from_map).collect::<Vec<_>>();

        Self {
            jobs: ads(dto.jobs),
            history: ads(dto.history),
            status: ads(dto.status),
            config: normalize_config(dto.config),
            daemon_config: dto.daemon_config.into_iter().map(|(daemon, config)| (daemon.to_ascii_lowercase(), normalize_config(config))).collect(),
        }
    }

    fn collection(&self, kind: ResourceKind) -> Result<&[ClassAd]> {
        match kind {
            ResourceKind::Jobs => Ok(&self.jobs),
            ResourceKind::History => Ok(&self.history),
            ResourceKind::Status => Ok(&self.status),
            ResourceKind::Config => Err(Error::InvalidArgument("The config resource has no ads to query".to_string())),
        }
    }

    fn config_for(&self, spec: &QuerySpec) -> Result<&Map<String, Value>> {
        match spec.daemon() {
            None => Ok(&self.config),
            Some(daemon) => {
                self.daemon_config.get(daemon.name()).ok_or_else(|| Error::UpstreamFailure(format!("Unable to locate a running {} daemon", daemon)))
            }
        }
    }
}

// Configuration values are plain text, as the command-line tools print them.
fn normalize_config(config: Map<String, Value>) -> Map<String, Value> {
    config.into_iter().map(|(key, value)| (key.to_ascii_lowercase(), Value::String(scalar_text(&value)))).collect()
}

fn project(ad: &ClassAd, projection: &Projection) -> ClassAd {
    let mut projected = ad.clone();
    if !projection.is_all() {
        projected.retain(|key| projection.contains(key));
    }
    projected
}

#[async_trait]
impl SchedulerBackend for SnapshotBackend {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn query_ads(&self, spec: &QuerySpec) -> Result<Vec<ClassAd>> {
        let ads = self.collection(spec.kind())?;

        let filter = match spec.requirements() {
            Some(requirements) => Some(
                expression::parse(&requirements).map_err(|e| Error::UpstreamFailure(format!("Unable to parse constraint '{}': {}", requirements, e)))?,
            ),
            None => None,
        };
        let my_type = match spec.kind() {
            ResourceKind::Status => spec.ad_type().my_type(),
            _ => None,
        };

        Ok(ads
            .iter()
            .filter(|ad| match my_type {
                Some(my_type) => ad.get("mytype").and_then(Value::as_str).is_some_and(|t| t.eq_ignore_ascii_case(my_type)),
                None => true,
            })
            .filter(|ad| filter.as_ref().is_none_or(|f| f.matches(ad)))
            .map(|ad| project(ad, spec.projection()))
            .collect())
    }

    async fn config_value(&self, spec: &QuerySpec, attribute: &str) -> Result<String> {
        self.config_for(spec)?
            .get(&attribute.to_ascii_lowercase())
            .map(scalar_text)
            .ok_or_else(|| Error::NotFound(format!("Not defined: {}", attribute)))
    }

    async fn config_dump(&self, spec: &QuerySpec) -> Result<Map<String, Value>> {
        Ok(self.config_for(spec)?.clone())
    }
}
