use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// On-disk picture of a pool, served by the snapshot backend.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolSnapshotDto {
    pub jobs: Vec<Map<String, Value>>,
    pub history: Vec<Map<String, Value>>,
    pub status: Vec<Map<String, Value>>,
    pub config: Map<String, Value>,
    pub daemon_config: HashMap<String, Map<String, Value>>,
}
