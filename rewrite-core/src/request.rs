//! Intercepted request model
//!
//! A `RequestDescriptor` is what the interception host hands to a script:
//! the request URL, its headers and whether a body was captured.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request headers with case-insensitive lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(HashMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Look up a header ignoring ASCII case.
    ///
    /// When the host delivered several spellings of the same name, the exact
    /// spelling wins, then the lower-case one, then the lowest remaining key.
    pub fn get(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.0.get(name) {
            return Some(value.as_str());
        }
        if let Some(value) = self.0.get(&name.to_ascii_lowercase()) {
            return Some(value.as_str());
        }
        self.0
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One intercepted HTTP request, immutable for the lifetime of a classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    pub url: String,
    #[serde(default)]
    pub headers: Headers,
    /// Whether the host captured a response body for inspection
    #[serde(default)]
    pub body_available: bool,
}

impl RequestDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body_available(mut self, available: bool) -> Self {
        self.body_available = available;
        self
    }

    /// `User-Agent` header, empty when absent
    pub fn user_agent(&self) -> &str {
        self.headers.get("User-Agent").unwrap_or("")
    }

    /// Host portion of the URL, lower-cased. Empty for unparseable URLs.
    pub fn host(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(parsed) => parsed.host_str().unwrap_or("").to_ascii_lowercase(),
            Err(_) => String::new(),
        }
    }
}
