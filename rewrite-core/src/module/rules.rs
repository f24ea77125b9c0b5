//! `[Rule]` section: routing rules, ordered for the host's first-match evaluation

use super::static_regex;
use regex::Regex;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::OnceLock;

const PRIORITY: &[&str] = &[
    "DOMAIN,",
    "DOMAIN-SUFFIX,",
    "DOMAIN-KEYWORD,",
    "IP-CIDR,",
    "AND,",
    "URL-REGEX,",
];

fn rule_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"(?:DOMAIN(?:-SUFFIX|-KEYWORD)?|IP-CIDR|AND|URL-REGEX),")
}

pub(super) fn collect(text: &str) -> Vec<String> {
    let unique: BTreeSet<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| rule_re().is_match(line))
        .collect();

    let mut keyed: Vec<(SortKey, &str)> = unique.into_iter().map(|l| (SortKey::of(l), l)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    keyed.into_iter().map(|(_, line)| line.to_string()).collect()
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    /// DIRECT rules first
    not_direct: bool,
    priority: usize,
    /// 0 for IPv4, 1 for IPv6, 2 otherwise
    family: u8,
    address: Vec<u16>,
    upper: String,
}

impl SortKey {
    fn of(line: &str) -> Self {
        let compact = line.replace(' ', "").to_uppercase();
        let ip = cidr_address(line);

        Self {
            not_direct: !compact.contains(",DIRECT"),
            priority: PRIORITY
                .iter()
                .position(|p| line.starts_with(p))
                .unwrap_or(PRIORITY.len()),
            family: match ip {
                Some(IpAddr::V4(_)) => 0,
                Some(IpAddr::V6(_)) => 1,
                None => 2,
            },
            address: match ip {
                Some(IpAddr::V4(v4)) => v4.octets().iter().map(|&b| u16::from(b)).collect(),
                Some(IpAddr::V6(v6)) => v6.octets().iter().map(|&b| u16::from(b)).collect(),
                None => vec![999; 16],
            },
            upper: line.to_uppercase(),
        }
    }
}

/// Network address of an `IP-CIDR,<addr>/<len>,...` rule.
///
/// Only addresses starting with a digit are considered, so compressed IPv6
/// forms such as `fe80::/10` sort with the non-IP rules.
fn cidr_address(line: &str) -> Option<IpAddr> {
    if !line.starts_with("IP-CIDR,") || !line.contains('/') {
        return None;
    }
    let addr = line.split(',').nth(1)?.split('/').next()?.trim();
    if !addr.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    addr.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    fn compare(a: &str, b: &str) -> Ordering {
        SortKey::of(a).cmp(&SortKey::of(b))
    }

    #[test]
    fn test_rule_ordering() {
        let text = "\
IP-CIDR,10.0.0.0/8,REJECT
URL-REGEX,^http://ads,REJECT
DOMAIN-SUFFIX,example.com,REJECT
IP-CIDR,2001:db8::/32,REJECT
DOMAIN,direct.example.com, DIRECT
IP-CIDR,9.0.0.0/8,REJECT
# DOMAIN,commented.example.com,REJECT
DOMAIN,ads.example.com,REJECT
DOMAIN,ads.example.com,REJECT
";
        assert_eq!(
            collect(text),
            vec![
                "DOMAIN,direct.example.com, DIRECT",
                "DOMAIN,ads.example.com,REJECT",
                "DOMAIN-SUFFIX,example.com,REJECT",
                "IP-CIDR,9.0.0.0/8,REJECT",
                "IP-CIDR,10.0.0.0/8,REJECT",
                "IP-CIDR,2001:db8::/32,REJECT",
                "URL-REGEX,^http://ads,REJECT",
            ]
        );
    }

    #[test]
    fn test_non_rule_lines_ignored() {
        assert!(collect("hostname = a.com\n^https?://x url reject\n").is_empty());
    }

    #[test]
    fn test_compressed_ipv6_sorts_with_non_ip() {
        assert_eq!(cidr_address("IP-CIDR,fe80::/10,REJECT"), None);
        assert!(compare("IP-CIDR,2001:db8::/32,REJECT", "IP-CIDR,fe80::/10,REJECT").is_lt());
    }
}
