pub mod attribute;
pub mod backend;
pub mod classad;
pub mod config_text;
pub mod expression;
pub mod query_spec;
pub mod resource;
pub mod translator;
