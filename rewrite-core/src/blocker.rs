//! User-agent / appkey blocking
//!
//! The same dispatch endpoint is called by several first-party apps, which
//! identify themselves either through a brand token in the `User-Agent`
//! or through a numeric `appkey` query parameter. Either signal is enough
//! to deny the call.

use crate::classifier::{ClassificationResult, Classifier};
use crate::error::{compile, RewriteError};
use crate::request::RequestDescriptor;
use regex::Regex;
use tracing::debug;

pub const BLOCKED_STATUS_LINE: &str = "HTTP/1.1 404 Not Found";
pub const BLOCKED_BODY: &str = "Not Found";

const APPKEY_PATTERN: &str = r"appkey=(\d+)";

/// Blocks requests whose user agent or appkey matches a configured list
#[derive(Debug, Clone)]
pub struct AppBlocker {
    user_agent: Option<Regex>,
    appkey: Option<Regex>,
    appkey_param: Regex,
}

impl AppBlocker {
    /// Build from literal brand tokens and blocked numeric keys.
    ///
    /// Tokens are matched as substrings of the lower-cased user agent,
    /// ignoring case, so percent-encoded brand names match whichever hex
    /// case the client sends.
    pub fn new(brand_tokens: &[&str], blocked_keys: &[&str]) -> Result<Self, RewriteError> {
        if brand_tokens.is_empty() && blocked_keys.is_empty() {
            return Err(RewriteError::Configuration(
                "AppBlocker needs at least one brand token or appkey".to_string(),
            ));
        }
        Ok(Self {
            user_agent: alternation(brand_tokens)
                .map(|p| compile(&format!("(?i){}", p)))
                .transpose()?,
            appkey: alternation(blocked_keys).map(|p| compile(&p)).transpose()?,
            appkey_param: compile(APPKEY_PATTERN)?,
        })
    }

    /// Build from raw regular expressions
    pub fn from_patterns(user_agent: &str, appkey: &str) -> Result<Self, RewriteError> {
        Ok(Self {
            user_agent: Some(compile(&format!("(?i){}", user_agent))?),
            appkey: Some(compile(appkey)?),
            appkey_param: compile(APPKEY_PATTERN)?,
        })
    }

    /// Value of the first `appkey=<digits>` in the URL, empty if absent
    fn extract_appkey<'a>(&self, url: &'a str) -> &'a str {
        self.appkey_param
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map_or("", |m| m.as_str())
    }
}

/// `(?:a|b|c)` over escaped literals
fn alternation(literals: &[&str]) -> Option<String> {
    if literals.is_empty() {
        return None;
    }
    let escaped: Vec<String> = literals.iter().map(|s| regex::escape(s)).collect();
    Some(format!("(?:{})", escaped.join("|")))
}

impl Classifier for AppBlocker {
    fn classify(&self, request: &RequestDescriptor) -> ClassificationResult {
        let ua = request.user_agent().to_lowercase();
        let appkey = self.extract_appkey(&request.url);

        let ua_hit = self
            .user_agent
            .as_ref()
            .map_or(false, |re| re.is_match(&ua));
        let appkey_hit = !appkey.is_empty()
            && self.appkey.as_ref().map_or(false, |re| re.is_match(appkey));

        if ua_hit || appkey_hit {
            debug!(ua_hit, appkey_hit, appkey, "Blocking dispatch request");
            ClassificationResult::block(BLOCKED_STATUS_LINE, BLOCKED_BODY)
        } else {
            ClassificationResult::pass()
        }
    }
}
