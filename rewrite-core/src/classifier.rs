//! Request classification
//!
//! A classifier reads one `RequestDescriptor` and decides whether the host
//! should terminate the exchange or let it continue. Strategies are pure:
//! no I/O, no shared state, safe to call from any number of threads.

use crate::request::RequestDescriptor;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of classifying a single request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationResult {
    /// Terminate the exchange with a synthetic response
    Block { status_line: String, body: String },

    /// Continue, optionally substituting the response body
    Pass { replacement_body: Option<String> },
}

impl ClassificationResult {
    /// Continue unmodified
    pub fn pass() -> Self {
        ClassificationResult::Pass {
            replacement_body: None,
        }
    }

    pub fn replace_body(body: impl Into<String>) -> Self {
        ClassificationResult::Pass {
            replacement_body: Some(body.into()),
        }
    }

    pub fn block(status_line: impl Into<String>, body: impl Into<String>) -> Self {
        ClassificationResult::Block {
            status_line: status_line.into(),
            body: body.into(),
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, ClassificationResult::Block { .. })
    }

    /// True for a pass that leaves the response untouched
    pub fn is_passthrough(&self) -> bool {
        matches!(
            self,
            ClassificationResult::Pass {
                replacement_body: None
            }
        )
    }

    pub fn replacement_body(&self) -> Option<&str> {
        match self {
            ClassificationResult::Pass { replacement_body } => replacement_body.as_deref(),
            ClassificationResult::Block { .. } => None,
        }
    }
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self::pass()
    }
}

/// A single matching strategy
pub trait Classifier: Send + Sync {
    fn classify(&self, request: &RequestDescriptor) -> ClassificationResult;
}

impl<F> Classifier for F
where
    F: Fn(&RequestDescriptor) -> ClassificationResult + Send + Sync,
{
    fn classify(&self, request: &RequestDescriptor) -> ClassificationResult {
        self(request)
    }
}

/// Ordered chain of strategies.
///
/// The first strategy that blocks or supplies a replacement body decides;
/// when every strategy passes through, so does the chain.
#[derive(Default)]
pub struct RequestClassifier {
    name: String,
    strategies: Vec<Box<dyn Classifier>>,
}

impl RequestClassifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategies: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: impl Classifier + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Classifier for RequestClassifier {
    fn classify(&self, request: &RequestDescriptor) -> ClassificationResult {
        for strategy in &self.strategies {
            let result = strategy.classify(request);
            if !result.is_passthrough() {
                debug!(classifier = %self.name, url = %request.url, ?result, "Request classified");
                return result;
            }
        }
        ClassificationResult::pass()
    }
}

impl std::fmt::Debug for RequestClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestClassifier")
            .field("name", &self.name)
            .field("strategies", &self.strategies.len())
            .finish()
    }
}
