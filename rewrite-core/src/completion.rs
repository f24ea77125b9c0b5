//! Completion object handed back to the interception host
//!
//! The host understands three shapes:
//! - `{}` continue unmodified
//! - `{"status": .., "body": ..}` replace the entire response
//! - `{"body": ..}` keep status and headers, replace the body

use crate::classifier::ClassificationResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Completion {
    pub fn to_json(&self) -> String {
        // Two optional strings cannot fail to serialize
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn is_noop(&self) -> bool {
        self.status.is_none() && self.body.is_none()
    }
}

impl From<ClassificationResult> for Completion {
    fn from(result: ClassificationResult) -> Self {
        match result {
            ClassificationResult::Block { status_line, body } => Completion {
                status: Some(status_line),
                body: Some(body),
            },
            ClassificationResult::Pass { replacement_body } => Completion {
                status: None,
                body: replacement_body,
            },
        }
    }
}

impl From<Completion> for ClassificationResult {
    fn from(completion: Completion) -> Self {
        match completion.status {
            Some(status_line) => ClassificationResult::Block {
                status_line,
                body: completion.body.unwrap_or_default(),
            },
            None => ClassificationResult::Pass {
                replacement_body: completion.body,
            },
        }
    }
}
