//! `[Map Local]` section: static mock bodies

use super::{active_lines, sorted_unique, static_regex};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn mock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^(.*?)\s*mock-response-body\s+(.*)$")
}

fn data_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r#"data=\s*(["'].*["']|\{.*\}|\[.*\])"#)
}

/// Split the `data=` payload out of a mock parameter string.
///
/// Returns the payload (surrounding double quotes removed) and the
/// remaining parameters.
pub fn extract_data(params: &str) -> (String, String) {
    match data_re().captures(params) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let mut rest = String::with_capacity(params.len());
            rest.push_str(&params[..whole.start]);
            rest.push_str(&params[whole.end..]);
            (unquote(&caps[1]).to_string(), rest)
        }
        None => (String::new(), params.to_string()),
    }
}

fn unquote(data: &str) -> &str {
    if data.len() >= 2 && data.starts_with('"') && data.ends_with('"') {
        &data[1..data.len() - 1]
    } else {
        data
    }
}

/// Whitespace-separated tokens; double-quoted runs stay in one token,
/// quotes included.
fn tokenize(params: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in params.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn content_type(data_type: &str, data: &str, is_base64: bool) -> &'static str {
    let trimmed = data.trim();
    if is_base64 || data_type == "base64" {
        "application/octet-stream"
    } else if matches!(data_type, "json" | "text")
        && (trimmed.starts_with('{') || trimmed.starts_with('['))
    {
        "application/json"
    } else if matches!(data_type, "json" | "text") {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

pub(super) fn collect(text: &str) -> Vec<String> {
    let mut lines = Vec::new();

    for line in active_lines(text) {
        let Some(caps) = mock_re().captures(line) else {
            continue;
        };
        let pattern = caps[1].trim();
        let (data, rest) = extract_data(caps[2].trim());

        // Later duplicates win, e.g. `data-type=text data-type=json`
        let params: HashMap<String, String> = tokenize(&rest)
            .into_iter()
            .filter_map(|token| {
                token
                    .split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
            })
            .collect();

        let data_type = params
            .get("data-type")
            .map(|v| v.to_lowercase())
            .unwrap_or_default();
        let is_base64 = params
            .get("mock-data-is-base64")
            .map_or(false, |v| v.eq_ignore_ascii_case("true"));
        let status_code = match params.get("status-code").map(String::as_str) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ if data_type == "json" => "200".to_string(),
            _ => String::new(),
        };

        let mut out = format!("{} data-type={} data=\"{}\"", pattern, data_type, data);
        if !status_code.is_empty() {
            out.push_str(&format!(" status-code={}", status_code));
        }
        if !params.contains_key("header") {
            out.push_str(&format!(
                " header=\"content-type: {}\"",
                content_type(&data_type, &data, is_base64)
            ));
        }
        lines.push(out);
    }

    sorted_unique(lines)
}
