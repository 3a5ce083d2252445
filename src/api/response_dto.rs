use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::classad::ClassAd;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct JobRecordDto {
    pub classad: ClassAd,
    pub jobid: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StatusRecordDto {
    pub name: Value,
    pub classad: ClassAd,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ErrorResponseDto {
    pub message: String,
}

/// Body of a successful response. Scalars are serialized bare.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum QueryResponseDto {
    Jobs(Vec<JobRecordDto>),
    Status(Vec<StatusRecordDto>),
    Config(Map<String, Value>),
    Scalar(Value),
}
