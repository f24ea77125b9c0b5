//! `[Script]` section

use super::{active_lines, sorted_unique, static_regex};
use regex::Regex;
use std::sync::OnceLock;

const RESPONSE_KINDS: &[&str] = &[
    "script-response-body",
    "script-echo-response",
    "script-response-header",
];

const BODY_KINDS: &[&str] = &[
    "script-response-body",
    "script-echo-response",
    "script-response-header",
    "script-request-body",
    "script-analyze-echo-response",
];

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"^(.*?)\s*url\s+(script-(?:response|request)-(?:body|header)|script-echo-response|script-analyze-echo-response)\s+(\S+)",
    )
}

fn file_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"/([^/]+?)(?:\.js)?$")
}

fn binary_mode_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"binary-body-mode\s*=\s*(true|false)")
}

fn argument_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r#"argument\s*=\s*(["'].*["']|\{.*\}|\[.*\])"#)
}

/// `https://host/dir/AMDC.js` -> `AMDC`
fn script_name(path: &str) -> &str {
    file_name_re()
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map_or(path, |m| m.as_str().trim())
}

pub(super) fn collect(text: &str) -> Vec<String> {
    let mut lines = Vec::new();

    for line in active_lines(text) {
        let Some(caps) = script_re().captures(line) else {
            continue;
        };
        let pattern = caps[1].trim();
        let kind = &caps[2];
        let path = caps[3].trim().trim_end_matches(',');

        let phase = if RESPONSE_KINDS.contains(&kind) {
            "response"
        } else {
            "request"
        };
        let requires_body = BODY_KINDS.contains(&kind);

        let mut params = vec![
            format!("{} =type=http-{}", script_name(path), phase),
            format!("pattern={}", pattern),
            format!("script-path={}", path),
            format!("requires-body={}", requires_body),
            "max-size=0".to_string(),
        ];
        if let Some(mode) = binary_mode_re().captures(line) {
            params.push(format!("binary-body-mode={}", &mode[1]));
        }
        if let Some(arg) = argument_re().captures(line) {
            params.push(format!("argument={}", &arg[1]));
        }

        lines.push(params.join(", "));
    }

    sorted_unique(lines)
}
