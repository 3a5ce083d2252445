use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::api::config_dto::ExecutablesDto;
use crate::domain::backend::SchedulerBackend;
use crate::domain::backend::command::{CommandInvocation, CommandOutput, CommandRunner, OutputContract};
use crate::domain::classad::ClassAd;
use crate::domain::config_text::parse_config_dump;
use crate::domain::query_spec::QuerySpec;
use crate::domain::resource::ResourceKind;
use crate::error::{Error, Result};

/// Backend that shells out to the scheduler's command-line tools.
#[derive(Debug, Clone)]
pub struct CliBackend {
    executables: ExecutablesDto,
    runner: Arc<dyn CommandRunner>,
}

impl CliBackend {
    pub fn new(executables: ExecutablesDto, runner: Arc<dyn CommandRunner>) -> Self {
        Self { executables, runner }
    }

    fn executable(&self, kind: ResourceKind) -> Result<&str> {
        let executable = match kind {
            ResourceKind::Jobs => self.executables.jobs.as_deref(),
            ResourceKind::History => self.executables.history.as_deref(),
            ResourceKind::Status => self.executables.status.as_deref(),
            ResourceKind::Config => self.executables.config.as_deref(),
        };
        executable.ok_or_else(|| Error::ServiceUnavailable(format!("No executable configured for the {} resource", kind)))
    }

    /// Command line for a jobs, history or status query.
    pub fn ads_invocation(&self, spec: &QuerySpec) -> Result<CommandInvocation> {
        let kind = spec.kind();
        let mut invocation = CommandInvocation::new(self.executable(kind)?, OutputContract::JsonArray).arg("-json");

        match kind {
            ResourceKind::Jobs | ResourceKind::History => {
                invocation = invocation.arg_pair("-constraint", spec.requirements().unwrap_or_else(|| "true".to_string()));
            }
            ResourceKind::Status => {
                invocation = invocation.arg(spec.ad_type().cli_flag());
                if let Some(constraint) = spec.user_constraint() {
                    invocation = invocation.arg_pair("-constraint", constraint);
                }
            }
            ResourceKind::Config => {
                return Err(Error::InvalidArgument("The config resource has no ads to query".to_string()));
            }
        }

        if let Some(attributes) = spec.projection().to_argument() {
            invocation = invocation.arg_pair("-attributes", attributes);
        }

        // The host or slot name goes last so condor_status can report unknown hosts.
        if let (ResourceKind::Status, Some(name)) = (kind, spec.name()) {
            invocation = invocation.arg(name);
        }

        Ok(invocation)
    }

    /// Command line for a config query: one attribute, or the whole dump.
    pub fn config_invocation(&self, spec: &QuerySpec, attribute: Option<&str>) -> Result<CommandInvocation> {
        let contract = if attribute.is_some() { OutputContract::ScalarText } else { OutputContract::ConfigDump };
        let mut invocation = CommandInvocation::new(self.executable(ResourceKind::Config)?, contract);

        if let Some(daemon) = spec.daemon() {
            invocation = invocation.arg(daemon.cli_flag());
        }

        Ok(match attribute {
            Some(attribute) => invocation.arg(attribute),
            None => invocation.arg("-dump"),
        })
    }
}

fn unparseable(invocation: &CommandInvocation, output: &CommandOutput, reason: impl Display) -> Error {
    Error::UpstreamFailure(format!(
        "Unable to parse output of {}: {}; stdout: {:?}; stderr: {:?}",
        invocation.program(),
        reason,
        output.stdout.trim(),
        output.stderr.trim()
    ))
}

/// Decodes the JSON array printed by the `-json` tools.
pub fn parse_ads(invocation: &CommandInvocation, output: &CommandOutput) -> Result<Vec<ClassAd>> {
    // Nothing matched: the tools print nothing at all.
    if output.stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records: Vec<Map<String, Value>> = serde_json::from_str(&output.stdout).map_err(|e| unparseable(invocation, output, e))?;

    Ok(records.into_iter().map(ClassAd::from_map).collect())
}

/// Successful command output, decoded as its invocation's contract says.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Ads(Vec<ClassAd>),
    Config(Map<String, Value>),
    Scalar(String),
}

pub fn decode(invocation: &CommandInvocation, output: &CommandOutput) -> Result<Decoded> {
    match invocation.contract() {
        OutputContract::JsonArray => parse_ads(invocation, output).map(Decoded::Ads),
        OutputContract::ConfigDump => Ok(Decoded::Config(parse_config_dump(&output.stdout))),
        OutputContract::ScalarText => Ok(Decoded::Scalar(output.stdout.trim().to_string())),
    }
}

fn contract_mismatch(invocation: &CommandInvocation) -> Error {
    Error::UpstreamFailure(format!("Output contract {:?} of {} does not fit this query", invocation.contract(), invocation))
}

#[async_trait]
impl SchedulerBackend for CliBackend {
    fn name(&self) -> &'static str {
        "cli"
    }

    async fn query_ads(&self, spec: &QuerySpec) -> Result<Vec<ClassAd>> {
        let invocation = self.ads_invocation(spec)?;
        let output = self.runner.run(&invocation).await?;

        if !output.is_success() {
            return Err(Error::UpstreamFailure(output.diagnostic()));
        }

        match decode(&invocation, &output)? {
            Decoded::Ads(ads) => Ok(ads),
            _ => Err(contract_mismatch(&invocation)),
        }
    }

    async fn config_value(&self, spec: &QuerySpec, attribute: &str) -> Result<String> {
        let invocation = self.config_invocation(spec, Some(attribute))?;
        let output = self.runner.run(&invocation).await?;

        if !output.is_success() {
            let diagnostic = output.diagnostic();
            if diagnostic.contains("Not defined") {
                return Err(Error::NotFound(diagnostic));
            }
            return Err(Error::UpstreamFailure(diagnostic));
        }

        match decode(&invocation, &output)? {
            Decoded::Scalar(value) => Ok(value),
            _ => Err(contract_mismatch(&invocation)),
        }
    }

    async fn config_dump(&self, spec: &QuerySpec) -> Result<Map<String, Value>> {
        let invocation = self.config_invocation(spec, None)?;
        let output = self.runner.run(&invocation).await?;

        if !output.is_success() {
            return Err(Error::UpstreamFailure(output.diagnostic()));
        }

        match decode(&invocation, &output)? {
            Decoded::Config(config) => Ok(config),
            _ => Err(contract_mismatch(&invocation)),
        }
    }
}
