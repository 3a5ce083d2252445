//! Read-only REST facade over an HTCondor pool.
//!
//! Requests for jobs, job history, machine status and configuration are
//! validated into a [`domain::query_spec::QuerySpec`], answered by a
//! [`domain::backend::SchedulerBackend`] (the command-line tools or an
//! in-process pool snapshot) and translated back into JSON.

use crate::api::config_dto::ServiceConfigDto;
use crate::domain::backend::build_backend;
use crate::domain::translator::QueryTranslator;
use crate::error::{Error, Result};
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;
pub mod server;

/// Loads and validates the service configuration; `None` yields the defaults.
pub fn load_service_config(file_path: Option<&str>) -> Result<ServiceConfigDto> {
    let config = match file_path {
        Some(path) => parse_json_file::<ServiceConfigDto>(path)?,
        None => ServiceConfigDto::default(),
    };

    if config.command_timeout_secs == 0 {
        return Err(Error::ConfigurationError("commandTimeoutSecs must be greater than 0".to_string()));
    }
    if config.bind_address.trim().is_empty() {
        return Err(Error::ConfigurationError("bindAddress must not be empty".to_string()));
    }

    Ok(config)
}

pub fn build_translator(config: &ServiceConfigDto) -> Result<QueryTranslator> {
    let backend = build_backend(config)?;
    Ok(QueryTranslator::new(backend))
}
