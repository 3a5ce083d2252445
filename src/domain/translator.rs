use std::sync::Arc;

use serde_json::Value;

use crate::api::response_dto::{JobRecordDto, QueryResponseDto, StatusRecordDto};
use crate::domain::backend::SchedulerBackend;
use crate::domain::classad::ClassAd;
use crate::domain::query_spec::QuerySpec;
use crate::domain::resource::ResourceKind;
use crate::error::{Error, Result};

/// Turns a validated [`QuerySpec`] into one scheduler call and the REST response body.
///
/// Holds no mutable state; one instance serves all requests concurrently.
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    backend: Arc<dyn SchedulerBackend>,
}

impl QueryTranslator {
    pub fn new(backend: Arc<dyn SchedulerBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    #[tracing::instrument(level = "debug", skip_all, fields(resource = %spec.kind(), backend = self.backend.name()))]
    pub async fn translate(&self, spec: &QuerySpec) -> Result<QueryResponseDto> {
        match spec.kind() {
            ResourceKind::Jobs | ResourceKind::History => self.jobs(spec).await,
            ResourceKind::Status => self.status(spec).await,
            ResourceKind::Config => self.config(spec).await,
        }
    }

    async fn jobs(&self, spec: &QuerySpec) -> Result<QueryResponseDto> {
        let ads = self.backend.query_ads(spec).await?;
        if ads.is_empty() {
            return Err(Error::NotFound(format!("No matching jobs found in {}", spec.kind())));
        }

        if let Some(attribute) = spec.attribute() {
            return scalar(&ads, attribute).map(QueryResponseDto::Scalar);
        }

        let records = ads.into_iter().map(|classad| Ok(JobRecordDto { jobid: classad.job_id()?, classad })).collect::<Result<Vec<_>>>()?;

        Ok(QueryResponseDto::Jobs(records))
    }

    async fn status(&self, spec: &QuerySpec) -> Result<QueryResponseDto> {
        let ads = self.backend.query_ads(spec).await.map_err(remap_unknown_host)?;
        if ads.is_empty() {
            return Err(Error::NotFound("No matching ads found".to_string()));
        }

        if let Some(attribute) = spec.attribute() {
            return scalar(&ads, attribute).map(QueryResponseDto::Scalar);
        }

        let records = ads.into_iter().map(|classad| Ok(StatusRecordDto { name: classad.name()?, classad })).collect::<Result<Vec<_>>>()?;

        Ok(QueryResponseDto::Status(records))
    }

    async fn config(&self, spec: &QuerySpec) -> Result<QueryResponseDto> {
        match spec.attribute() {
            Some(attribute) => {
                let value = self.backend.config_value(spec, attribute).await?;
                Ok(QueryResponseDto::Scalar(Value::String(value)))
            }
            None => Ok(QueryResponseDto::Config(self.backend.config_dump(spec).await?)),
        }
    }
}

// Single-attribute requests answer with the value from the first matching ad.
fn scalar(ads: &[ClassAd], attribute: &str) -> Result<Value> {
    ads.first()
        .and_then(|ad| ad.get(attribute))
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("Attribute '{}' is not defined", attribute)))
}

// A status lookup for a host the collector does not know is a 404, not a failed query.
fn remap_unknown_host(err: Error) -> Error {
    match err {
        Error::UpstreamFailure(message) if message.to_ascii_lowercase().contains("unknown host") => Error::NotFound(message),
        other => other,
    }
}
