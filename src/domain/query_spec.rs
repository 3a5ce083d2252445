use crate::api::query_dto::QueryParamsDto;
use crate::domain::attribute::{Projection, require_attribute};
use crate::domain::resource::{AdType, DaemonType, ResourceKind};
use crate::error::{ConversionError, Error, Result};

/// Normalized, validated description of one incoming request.
///
/// Built through [`QuerySpec::jobs`], [`QuerySpec::status`] or [`QuerySpec::config`];
/// every user-supplied attribute name has been checked by the time a value exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    kind: ResourceKind,
    cluster_id: Option<u64>,
    proc_id: Option<u64>,
    name: Option<String>,
    attribute: Option<String>,
    constraint: Option<String>,
    projection: Projection,
    ad_type: AdType,
    daemon: Option<DaemonType>,
}

impl QuerySpec {
    fn empty(kind: ResourceKind) -> Self {
        Self {
            kind,
            cluster_id: None,
            proc_id: None,
            name: None,
            attribute: None,
            constraint: None,
            projection: Projection::All,
            ad_type: AdType::Any,
            daemon: None,
        }
    }

    /// Query against the live queue (`Jobs`) or the job history (`History`).
    pub fn jobs(
        kind: ResourceKind,
        cluster_id: Option<u64>,
        proc_id: Option<u64>,
        attribute: Option<&str>,
        params: &QueryParamsDto,
    ) -> Result<Self> {
        if !matches!(kind, ResourceKind::Jobs | ResourceKind::History) {
            return Err(Error::InvalidArgument(format!("'{}' is not a job resource", kind)));
        }
        if proc_id.is_some() && cluster_id.is_none() {
            return Err(Error::InvalidArgument("procid requires a clusterid".to_string()));
        }

        let mut spec = Self::empty(kind);
        spec.cluster_id = cluster_id;
        spec.proc_id = proc_id;
        spec.constraint = params.constraint().map(require_balanced_constraint).transpose()?.map(str::to_string);

        // A single attribute overrides any projection the caller sent.
        if let Some(attribute) = attribute {
            let attribute = require_attribute(attribute)?;
            spec.projection = Projection::single(attribute, kind.identity_keys());
            spec.attribute = Some(attribute.to_string());
        } else if let Some(projection) = params.projection() {
            spec.projection = Projection::parse_with_identity(projection, kind.identity_keys())?;
        }

        Ok(spec)
    }

    /// Query against the collector for machine and daemon ads.
    pub fn status(name: Option<&str>, attribute: Option<&str>, params: &QueryParamsDto) -> Result<Self> {
        let kind = ResourceKind::Status;
        let mut spec = Self::empty(kind);

        spec.ad_type = match params.query() {
            Some(query) => query.parse::<AdType>()?,
            None => AdType::Any,
        };
        spec.name = name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
        if spec.name.as_deref().is_some_and(|n| n.starts_with('-')) {
            return Err(Error::InvalidArgument("Invalid name: must not start with '-'".to_string()));
        }
        spec.constraint = params.constraint().map(require_balanced_constraint).transpose()?.map(str::to_string);

        if let Some(attribute) = attribute {
            let attribute = require_attribute(attribute)?;
            spec.projection = Projection::single(attribute, kind.identity_keys());
            spec.attribute = Some(attribute.to_string());
        } else if let Some(projection) = params.projection() {
            spec.projection = Projection::parse_with_identity(projection, kind.identity_keys())?;
        }

        Ok(spec)
    }

    /// Query against the static configuration or a running daemon's configuration.
    pub fn config(attribute: Option<&str>, params: &QueryParamsDto) -> Result<Self> {
        let mut spec = Self::empty(ResourceKind::Config);

        spec.daemon = match params.daemon() {
            Some(daemon) => Some(daemon.parse::<DaemonType>()?),
            None => None,
        };
        if let Some(attribute) = attribute {
            spec.attribute = Some(require_attribute(attribute)?.to_string());
        }

        Ok(spec)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn cluster_id(&self) -> Option<u64> {
        self.cluster_id
    }

    pub fn proc_id(&self) -> Option<u64> {
        self.proc_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn user_constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn ad_type(&self) -> AdType {
        self.ad_type
    }

    pub fn daemon(&self) -> Option<DaemonType> {
        self.daemon
    }

    /// Full constraint expression for this query.
    ///
    /// Job queries always produce one, starting from `true` and conjoining the
    /// cluster id, proc id and user constraint in that order. Status queries
    /// combine the ad name and user constraint, or produce none.
    pub fn requirements(&self) -> Option<String> {
        match self.kind {
            ResourceKind::Jobs | ResourceKind::History => {
                let mut requirements = "true".to_string();
                if let Some(cluster_id) = self.cluster_id {
                    requirements.push_str(&format!(" && clusterid == {}", cluster_id));
                }
                if let Some(proc_id) = self.proc_id {
                    requirements.push_str(&format!(" && procid == {}", proc_id));
                }
                if let Some(constraint) = &self.constraint {
                    requirements.push_str(&format!(" && ({})", constraint));
                }
                Some(requirements)
            }
            ResourceKind::Status => match (&self.name, &self.constraint) {
                (Some(name), Some(constraint)) => Some(format!("(name == {}) && ({})", quote_string_literal(name), constraint)),
                (Some(name), None) => Some(format!("(name == {})", quote_string_literal(name))),
                (None, Some(constraint)) => Some(constraint.clone()),
                (None, None) => None,
            },
            ResourceKind::Config => None,
        }
    }
}

/// Parses a job identifier path segment.
pub fn parse_identifier(label: &'static str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|_| ConversionError::InvalidIdentifier(label, raw.to_string()).into())
}

/// Accepts a user constraint only if its parentheses balance outside string literals.
///
/// The constraint is conjoined inside `(...)`; an unmatched `)` would close that
/// group early and let the rest of the expression bypass the id and name filters.
pub fn require_balanced_constraint(constraint: &str) -> Result<&str> {
    let unbalanced = || Error::InvalidArgument(format!("Invalid constraint '{}': unbalanced parentheses or quotes", constraint));

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in constraint.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1).ok_or_else(unbalanced)?,
            _ => {}
        }
    }

    if in_string || depth != 0 {
        return Err(unbalanced());
    }
    Ok(constraint)
}

/// Renders `value` as a ClassAd string literal.
pub fn quote_string_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
