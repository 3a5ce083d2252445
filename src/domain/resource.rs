use std::fmt;
use std::str::FromStr;

use crate::error::ConversionError;

/// The four read-only resources exposed under `/v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Jobs,
    History,
    Status,
    Config,
}

impl ResourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jobs => "jobs",
            Self::History => "history",
            Self::Status => "status",
            Self::Config => "config",
        }
    }

    /// Attributes every record of this resource must carry to build its REST shape.
    pub fn identity_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Jobs | Self::History => &["clusterid", "procid"],
            Self::Status => &["name"],
            Self::Config => &[],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Kind of ad a status query asks the collector for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdType {
    Accounting,
    Any,
    Collector,
    Credd,
    Defrag,
    Generic,
    Grid,
    Had,
    License,
    Master,
    Negotiator,
    Schedd,
    Startd,
    Submitter,
}

const AD_TYPE_NAMES: &str =
    "accounting, any, collector, credd, defrag, generic, grid, had, license, master, negotiator, schedd, startd, submitter, submitters";

impl FromStr for AdType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accounting" => Ok(AdType::Accounting),
            "any" => Ok(AdType::Any),
            "collector" => Ok(AdType::Collector),
            "credd" => Ok(AdType::Credd),
            "defrag" => Ok(AdType::Defrag),
            "generic" => Ok(AdType::Generic),
            "grid" => Ok(AdType::Grid),
            "had" => Ok(AdType::Had),
            "license" => Ok(AdType::License),
            "master" => Ok(AdType::Master),
            "negotiator" => Ok(AdType::Negotiator),
            "schedd" => Ok(AdType::Schedd),
            "startd" => Ok(AdType::Startd),
            // The command-line tools historically spell it "submitters"
            "submitter" | "submitters" => Ok(AdType::Submitter),
            _ => Err(ConversionError::UnknownAdType(s.to_string(), AD_TYPE_NAMES.to_string())),
        }
    }
}

impl AdType {
    /// Option selecting this ad type on the `condor_status` command line.
    pub fn cli_flag(&self) -> &'static str {
        match self {
            Self::Accounting => "-accounting",
            Self::Any => "-any",
            Self::Collector => "-collector",
            Self::Credd => "-credd",
            Self::Defrag => "-defrag",
            Self::Generic => "-generic",
            Self::Grid => "-grid",
            Self::Had => "-had",
            Self::License => "-license",
            Self::Master => "-master",
            Self::Negotiator => "-negotiator",
            Self::Schedd => "-schedd",
            Self::Startd => "-startd",
            Self::Submitter => "-submitters",
        }
    }

    /// Value of the `MyType` attribute carried by ads of this type; `None` for `any`.
    pub fn my_type(&self) -> Option<&'static str> {
        match self {
            Self::Accounting => Some("Accounting"),
            Self::Any => None,
            Self::Collector => Some("Collector"),
            Self::Credd => Some("CredD"),
            Self::Defrag => Some("Defrag"),
            Self::Generic => Some("Generic"),
            Self::Grid => Some("Grid"),
            Self::Had => Some("HAD"),
            Self::License => Some("License"),
            Self::Master => Some("DaemonMaster"),
            Self::Negotiator => Some("Negotiator"),
            Self::Schedd => Some("Scheduler"),
            Self::Startd => Some("Machine"),
            Self::Submitter => Some("Submitter"),
        }
    }
}

/// Running daemon whose live configuration can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaemonType {
    Collector,
    Master,
    Negotiator,
    Schedd,
    Startd,
}

const DAEMON_TYPE_NAMES: &str = "collector, master, negotiator, schedd, startd";

impl FromStr for DaemonType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collector" => Ok(DaemonType::Collector),
            "master" => Ok(DaemonType::Master),
            "negotiator" => Ok(DaemonType::Negotiator),
            "schedd" => Ok(DaemonType::Schedd),
            "startd" => Ok(DaemonType::Startd),
            _ => Err(ConversionError::UnknownDaemonType(s.to_string(), DAEMON_TYPE_NAMES.to_string())),
        }
    }
}

impl DaemonType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Collector => "collector",
            Self::Master => "master",
            Self::Negotiator => "negotiator",
            Self::Schedd => "schedd",
            Self::Startd => "startd",
        }
    }

    pub fn cli_flag(&self) -> &'static str {
        match self {
            Self::Collector => "-collector",
            Self::Master => "-master",
            Self::Negotiator => "-negotiator",
            Self::Schedd => "-schedd",
            Self::Startd => "-startd",
        }
    }
}

impl fmt::Display for DaemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
