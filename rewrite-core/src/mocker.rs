//! Endpoint-specific response mocking
//!
//! Rather than blocking read-only endpoints, the mocker hands back a
//! well-formed "success but empty" payload so the calling app renders an
//! empty state instead of an error.

use crate::classifier::{ClassificationResult, Classifier};
use crate::error::{compile, RewriteError};
use crate::request::RequestDescriptor;
use regex::Regex;
use tracing::debug;

/// A URL pattern paired with the body substituted for its response
#[derive(Debug, Clone)]
pub struct MockRule {
    pattern: Regex,
    body: String,
}

impl MockRule {
    pub fn new(pattern: &str, body: impl Into<String>) -> Result<Self, RewriteError> {
        Ok(Self {
            pattern: compile(pattern)?,
            body: body.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }
}

/// Ordered list of mock rules; the first match wins
#[derive(Debug, Clone, Default)]
pub struct ResponseMocker {
    rules: Vec<MockRule>,
}

impl ResponseMocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, pattern: &str, body: impl Into<String>) -> Result<Self, RewriteError> {
        self.rules.push(MockRule::new(pattern, body)?);
        Ok(self)
    }

    pub fn push(&mut self, rule: MockRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[MockRule] {
        &self.rules
    }

    pub fn find(&self, url: &str) -> Option<&MockRule> {
        self.rules.iter().find(|rule| rule.matches(url))
    }
}

impl Classifier for ResponseMocker {
    fn classify(&self, request: &RequestDescriptor) -> ClassificationResult {
        match self.find(&request.url) {
            Some(rule) => {
                debug!(pattern = rule.pattern(), url = %request.url, "Mocking response body");
                ClassificationResult::replace_body(rule.body())
            }
            None => ClassificationResult::pass(),
        }
    }
}
