pub mod config_dto;
pub mod query_dto;
pub mod response_dto;
pub mod snapshot_dto;
