use serde::Deserialize;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:9680";
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfigDto {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    #[serde(default)]
    pub backend: BackendDto,
    #[serde(default)]
    pub logging: LoggingDto,
}

impl Default for ServiceConfigDto {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            command_timeout_secs: default_command_timeout_secs(),
            backend: BackendDto::default(),
            logging: LoggingDto::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "typ", rename_all = "camelCase")]
pub enum BackendDto {
    Cli {
        #[serde(default)]
        executables: ExecutablesDto,
    },
    Snapshot {
        path: String,
    },
}

impl Default for BackendDto {
    fn default() -> Self {
        BackendDto::Cli { executables: ExecutablesDto::default() }
    }
}

/// Backing executable per resource. `null` leaves the resource unwired.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutablesDto {
    pub jobs: Option<String>,
    pub history: Option<String>,
    pub status: Option<String>,
    pub config: Option<String>,
}

impl Default for ExecutablesDto {
    fn default() -> Self {
        Self {
            jobs: Some("condor_q".to_string()),
            history: Some("condor_history".to_string()),
            status: Some("condor_status".to_string()),
            config: Some("condor_config_val".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoggingDto {
    pub level: Option<String>,
    pub log_dir: Option<String>,
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}
