//! Response header rules.
//!
//! A [`HeaderRule`] can only be built through [`HeaderRule::new`] (or by
//! deserializing, which goes through the same checks), so every rule that
//! reaches the function generator already has a valid HTTP token as its name
//! and a value free of control characters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating a header rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("header name must not be empty")]
    EmptyName,

    #[error("invalid header name {name:?}: {ch:?} is not an HTTP token character")]
    InvalidName { name: String, ch: char },

    #[error("invalid value for header {name:?}: control character {ch:?} is not allowed")]
    InvalidValue { name: String, ch: char },
}

/// One configured response header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawHeaderRule")]
pub struct HeaderRule {
    key: String,
    value: String,
}

#[derive(Deserialize)]
struct RawHeaderRule {
    key: String,
    value: String,
}

impl TryFrom<RawHeaderRule> for HeaderRule {
    type Error = HeaderError;

    fn try_from(raw: RawHeaderRule) -> Result<Self, Self::Error> {
        HeaderRule::new(raw.key, raw.value)
    }
}

impl HeaderRule {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, HeaderError> {
        let key = key.into();
        let value = value.into();

        if key.is_empty() {
            return Err(HeaderError::EmptyName);
        }
        if let Some(ch) = key.chars().find(|c| !is_tchar(*c)) {
            return Err(HeaderError::InvalidName { name: key, ch });
        }
        // Horizontal tab is the only control character a field value may carry.
        if let Some(ch) = value.chars().find(|c| c.is_control() && *c != '\t') {
            return Err(HeaderError::InvalidValue { name: key, ch });
        }

        Ok(Self { key, value })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The header name as the edge runtime indexes it.
    pub fn lowercase_key(&self) -> String {
        self.key.to_ascii_lowercase()
    }
}

/// RFC 7230 `tchar`.
fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// Example hardening headers shipped with a freshly scaffolded site.
const SECURITY_DEFAULTS: &[(&str, &str)] = &[
    ("Strict-Transport-Security", "max-age=31536000; includeSubdomains; preload"),
    ("Content-Security-Policy", "script-src 'self' 'unsafe-inline';"),
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("X-XSS-Protection", "1; mode=block"),
    ("Referrer-Policy", "same-origin"),
    (
        "Feature-Policy",
        "accelerometer 'none'; ambient-light-sensor 'none'; autoplay 'none'; camera 'none'; encrypted-media 'none'; fullscreen 'none'; geolocation 'none'; gyroscope 'none'; magnetometer 'none'; microphone 'none'; midi 'none';  picture-in-picture 'none'; speaker 'none'; sync-xhr 'none'; usb  'none'; vr 'none'",
    ),
];

/// Ordered list of header rules.
///
/// Order only affects where statements land in generated source. Duplicate
/// keys are kept; the later rule wins at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderSet(Vec<HeaderRule>);

impl HeaderSet {
    /// Validate and collect `(key, value)` pairs, stopping at the first bad one.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, HeaderError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| HeaderRule::new(k, v))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn security_defaults() -> Self {
        Self(
            SECURITY_DEFAULTS
                .iter()
                .map(|(key, value)| HeaderRule {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        )
    }

    pub fn push(&mut self, rule: HeaderRule) {
        self.0.push(rule);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderRule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<HeaderRule> for HeaderSet {
    fn from_iter<T: IntoIterator<Item = HeaderRule>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a HeaderSet {
    type Item = &'a HeaderRule;
    type IntoIter = std::slice::Iter<'a, HeaderRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
