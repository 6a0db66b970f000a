use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TransportError;

/// Name of a port on the messaging network, e.g. `/icubSim/world`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortName(String);

impl PortName {
    pub fn new(name: impl Into<String>) -> Result<Self, TransportError> {
        let name = name.into();
        let valid = name.len() > 1
            && name.starts_with('/')
            && !name.chars().any(char::is_whitespace);
        if valid {
            Ok(Self(name))
        } else {
            Err(TransportError::InvalidPortName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PortName {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PortName::new(s)
    }
}

impl TryFrom<String> for PortName {
    type Error = TransportError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        PortName::new(s)
    }
}

impl From<PortName> for String {
    fn from(p: PortName) -> Self {
        p.0
    }
}
