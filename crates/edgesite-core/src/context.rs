//! Deploy-time context overrides (`-c key=value`).

use std::str::FromStr;

use crate::config::ConfigError;

/// Site settings that may be supplied on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKey {
    DomainName,
    SubDomain,
    Account,
    Assets,
    Region,
}

impl FromStr for ContextKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domainName" => Ok(ContextKey::DomainName),
            "subDomain" => Ok(ContextKey::SubDomain),
            "account" => Ok(ContextKey::Account),
            "assets" => Ok(ContextKey::Assets),
            "region" => Ok(ContextKey::Region),
            other => Err(ConfigError::UnknownContextKey(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOverride {
    pub key: ContextKey,
    pub value: String,
}

impl ContextOverride {
    pub fn parse(pair: &str) -> Result<Self, ConfigError> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidContextPair(pair.to_string()))?;
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            return Err(ConfigError::InvalidContextPair(pair.to_string()));
        }
        Ok(Self {
            key: key.parse()?,
            value: value.to_string(),
        })
    }
}

impl FromStr for ContextOverride {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
