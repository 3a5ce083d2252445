use serde::Deserialize;

/// Query-string parameters shared by all resources. Which ones are honoured
/// depends on the resource.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct QueryParamsDto {
    pub projection: Option<String>,
    pub constraint: Option<String>,
    pub query: Option<String>,
    pub daemon: Option<String>,
}

impl QueryParamsDto {
    pub fn projection(&self) -> Option<&str> {
        non_blank(&self.projection)
    }

    pub fn constraint(&self) -> Option<&str> {
        non_blank(&self.constraint)
    }

    pub fn query(&self) -> Option<&str> {
        non_blank(&self.query)
    }

    pub fn daemon(&self) -> Option<&str> {
        non_blank(&self.daemon)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
