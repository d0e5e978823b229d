use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for identifier parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("plugin identifier must not be empty")]
    Empty,
    #[error("plugin identifier '{0}' must contain exactly one ':' separating group and name")]
    MissingSeparator(String),
    #[error("plugin identifier '{0}' has an empty group component")]
    EmptyGroup(String),
    #[error("plugin identifier '{0}' has an empty name component")]
    EmptyName(String),
}

/// Unique identity of a plugin unit: a `(group, name)` pair with the
/// canonical textual form `group:name`.
///
/// Comparison is case-sensitive on both components. The `Ord` impl orders by
/// group first and name second, which is what gives the resolver its fixed
/// tie-breaking order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginIdentifier {
    group: String,
    name: String,
}

impl PluginIdentifier {
    /// Create an identifier from its components. Both must be non-empty.
    pub fn new(group: &str, name: &str) -> Result<Self, IdentifierError> {
        if group.is_empty() {
            return Err(IdentifierError::EmptyGroup(format!("{}:{}", group, name)));
        }
        if name.is_empty() {
            return Err(IdentifierError::EmptyName(format!("{}:{}", group, name)));
        }
        Ok(Self {
            group: group.to_string(),
            name: name.to_string(),
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for PluginIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl FromStr for PluginIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdentifierError::Empty);
        }
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 {
            return Err(IdentifierError::MissingSeparator(s.to_string()));
        }
        PluginIdentifier::new(parts[0], parts[1])
    }
}

impl TryFrom<String> for PluginIdentifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PluginIdentifier> for String {
    fn from(id: PluginIdentifier) -> Self {
        id.to_string()
    }
}
