use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    static ref ATTRIBUTE_PATTERN: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("attribute pattern is a valid regex");
}

/// Returns true if `attribute` is a valid ClassAd attribute name.
///
/// This check guards every piece of user text that ends up in a scheduler
/// command or query as an attribute name.
pub fn validate_attribute(attribute: &str) -> bool {
    ATTRIBUTE_PATTERN.is_match(attribute)
}

/// Returns true if `projection` is a comma-separated list of valid attribute names.
pub fn validate_projection(projection: &str) -> bool {
    projection.split(',').all(validate_attribute)
}

pub fn require_attribute(attribute: &str) -> Result<&str> {
    if validate_attribute(attribute) {
        Ok(attribute)
    } else {
        Err(Error::InvalidArgument(format!("Invalid attribute '{}'", attribute)))
    }
}

/// Attributes a query should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Attributes(Vec<String>),
}

impl Projection {
    /// Parses a user projection and appends the identity keys the response shape needs.
    pub fn parse_with_identity(projection: &str, identity_keys: &[&str]) -> Result<Projection> {
        if !validate_projection(projection) {
            return Err(Error::InvalidArgument(
                "Invalid projection: must be a comma-separated list of classad attributes".to_string(),
            ));
        }
        Ok(Projection::from_names(projection.split(',').chain(identity_keys.iter().copied())))
    }

    /// Projection for a single-attribute lookup: the attribute plus identity keys.
    pub fn single(attribute: &str, identity_keys: &[&str]) -> Projection {
        Projection::from_names(std::iter::once(attribute).chain(identity_keys.iter().copied()))
    }

    // ClassAd names are case-insensitive, so `Owner` and `owner` are one entry.
    fn from_names<'a>(names: impl Iterator<Item = &'a str>) -> Projection {
        let mut attributes: Vec<String> = Vec::new();
        for name in names {
            if !attributes.iter().any(|existing| existing.eq_ignore_ascii_case(name)) {
                attributes.push(name.to_string());
            }
        }
        Projection::Attributes(attributes)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Projection::All)
    }

    pub fn contains(&self, attribute: &str) -> bool {
        match self {
            Projection::All => true,
            Projection::Attributes(attributes) => attributes.iter().any(|a| a.eq_ignore_ascii_case(attribute)),
        }
    }

    /// Comma-joined list for command lines, `None` when every attribute is wanted.
    pub fn to_argument(&self) -> Option<String> {
        match self {
            Projection::All => None,
            Projection::Attributes(attributes) => Some(attributes.join(",")),
        }
    }
}
