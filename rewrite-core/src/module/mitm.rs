//! `[MITM]` section

use super::static_regex;
use crate::filter::HostnameMatcher;
use regex::Regex;
use std::sync::OnceLock;

fn hostname_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^\s*hostname\s*=\s*([^#]*)")
}

/// Merged hostname list, exclusions first, or `None` when no line names a host
pub(super) fn collect(text: &str) -> Option<String> {
    let mut hosts = HostnameMatcher::default();
    for line in text.lines() {
        if let Some(caps) = hostname_re().captures(line) {
            hosts.merge(&HostnameMatcher::parse(&caps[1]));
        }
    }

    let entries = hosts.entries();
    if entries.is_empty() {
        None
    } else {
        Some(entries.join(","))
    }
}
