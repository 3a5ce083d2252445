use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A scheduler record: attribute name to JSON value, keys lower-cased.
///
/// ClassAd attribute names are case-insensitive, so every key is folded to
/// lower case on construction and lookups fold the requested name the same way.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ClassAd(Map<String, Value>);

impl From<Map<String, Value>> for ClassAd {
    fn from(map: Map<String, Value>) -> Self {
        ClassAd::from_map(map)
    }
}

impl ClassAd {
    pub fn from_map(map: Map<String, Value>) -> Self {
        match lowercase_keys(Value::Object(map)) {
            Value::Object(map) => ClassAd(map),
            _ => ClassAd::default(),
        }
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(&attribute.to_ascii_lowercase())
    }

    /// Non-empty `Name` of a collector ad.
    pub fn name(&self) -> Result<Value> {
        match self.get("name") {
            Some(Value::String(name)) if !name.trim().is_empty() => Ok(Value::String(name.clone())),
            _ => Err(Error::UpstreamFailure(format!("Ad is missing a Name: {}", Value::Object(self.0.clone())))),
        }
    }

    /// Keeps only the attributes accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|key, _| keep(key));
    }

    /// `"<clusterid>.<procid>"` for job records.
    pub fn job_id(&self) -> Result<String> {
        match (self.get("clusterid"), self.get("procid")) {
            (Some(cluster_id), Some(proc_id)) => Ok(format!("{}.{}", scalar_text(cluster_id), scalar_text(proc_id))),
            _ => Err(Error::UpstreamFailure(format!(
                "Job record is missing ClusterId/ProcId: {}",
                Value::Object(self.0.clone())
            ))),
        }
    }
}

/// Recursively lower-cases every object key in `value`.
pub fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(map.into_iter().map(|(key, value)| (key.to_ascii_lowercase(), lowercase_keys(value))).collect()),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Plain-text rendering of a scalar: strings unquoted, everything else as JSON.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
