//! `[URL Rewrite]`, `[Header Rewrite]` and `[Body Rewrite]` sections

use super::{active_lines, sorted_unique, static_regex};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn reject_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^(.*?)\s*url\s+(reject(?:-200|-array|-dict|-img|-tinygif)?)")
}

fn redirect_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^(.*?)\s*url\s+(302|307|header)\s+(.*)$")
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^(.*?)\s*url\s+(request-header|response-header)\s+(.*)$")
}

fn jq_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^(.*?)\s*url\s+jsonjq-response-body\s+(.*)$")
}

fn body_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"^(.*?)\s*url\s+(response-body|request-body)\s+(\S+)\s+(response-body|request-body)\s+(\S+)",
    )
}

pub(super) fn url_rewrites(text: &str) -> Vec<String> {
    let mut lines = Vec::new();

    for line in active_lines(text) {
        if let Some(caps) = reject_re().captures(line) {
            lines.push(format!("{} - {}", caps[1].trim(), caps[2].trim()));
        }
    }
    for line in active_lines(text) {
        if let Some(caps) = redirect_re().captures(line) {
            lines.push(format!(
                "{} {} {}",
                caps[1].trim(),
                caps[3].trim(),
                caps[2].trim()
            ));
        }
    }

    sorted_unique(lines)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderOp {
    Delete,
    Add,
    Replace,
}

/// Header rewrites ordered delete, add, replace; the first line per
/// `(phase, pattern, op)` wins.
pub(super) fn header_rewrites(text: &str) -> Vec<String> {
    static ACCEPT: OnceLock<Regex> = OnceLock::new();
    static DELETE: OnceLock<Regex> = OnceLock::new();
    static ADD: OnceLock<Regex> = OnceLock::new();
    let accept = static_regex(&ACCEPT, r"(?i)Accept-Language\s*:\s*en-us");
    let delete = static_regex(&DELETE, r"([-\w]+)\s*:\s*\.\+");
    let add = static_regex(&ADD, r"(?i)x-reddit-translations\s*:\s*enabled");

    let mut ops: Vec<(HeaderOp, String)> = Vec::new();
    for line in active_lines(text) {
        let Some(caps) = header_re().captures(line) else {
            continue;
        };
        let pattern = caps[1].trim();
        let phase = if caps[2].trim() == "request-header" {
            "http-request"
        } else {
            "http-response"
        };
        let body = caps[3].trim();

        if accept.is_match(body) {
            ops.push((
                HeaderOp::Replace,
                format!("{} {} header-replace Accept-Language en-us", phase, pattern),
            ));
        } else if let Some(del) = delete.captures(body) {
            ops.push((
                HeaderOp::Delete,
                format!("{} {} header-del {}", phase, pattern, &del[1]),
            ));
        } else if add.is_match(body) {
            ops.push((
                HeaderOp::Add,
                format!("{} {} header-add x-reddit-translations enabled", phase, pattern),
            ));
        }
    }

    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for op in [HeaderOp::Delete, HeaderOp::Add, HeaderOp::Replace] {
        for (_, line) in ops.iter().filter(|(kind, _)| *kind == op) {
            let key: Vec<&str> = line.split_whitespace().take(3).collect();
            if seen.insert(key.join(" ")) {
                lines.push(line.clone());
            }
        }
    }
    lines
}

pub(super) fn body_rewrites(text: &str) -> Vec<String> {
    let mut lines = Vec::new();

    for line in active_lines(text) {
        if let Some(caps) = jq_re().captures(line) {
            let expr = caps[2].trim();
            if expr.len() >= 2 && expr.starts_with('\'') && expr.ends_with('\'') {
                lines.push(format!("http-response-jq {} {}", caps[1].trim(), expr));
            }
        }
    }
    for line in active_lines(text) {
        if let Some(caps) = body_re().captures(line) {
            // Both halves of the pair must name the same direction
            if caps[2] != caps[4] {
                continue;
            }
            let phase = if &caps[2] == "response-body" {
                "http-response"
            } else {
                "http-request"
            };
            lines.push(format!(
                "{} {} {} {}",
                phase,
                caps[1].trim(),
                caps[3].trim(),
                caps[5].trim()
            ));
        }
    }

    sorted_unique(lines)
}
