//! Module builder
//!
//! Turns merged rewrite rule text into a Surge-style `.sgmodule` document.
//! Each section is collected independently and omitted when empty.

mod map_local;
mod mitm;
mod rewrite;
mod rules;
mod script;

pub use map_local::extract_data;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Marker introducing a per-app section in merged rule text
pub const APP_MARKER: &str = "# >";

const DESC_PREFIX: &str = "#!desc=";

/// Offset used for the `#!desc=` timestamp (UTC+8)
const DESC_OFFSET_SECS: i32 = 8 * 3600;

pub struct ModuleBuilder {
    name: String,
    generated_at: DateTime<FixedOffset>,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let offset = FixedOffset::east_opt(DESC_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
        Self {
            name: name.into(),
            generated_at: Utc::now().with_timezone(&offset),
        }
    }

    /// Pin the timestamp written to `#!desc=`
    pub fn generated_at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.generated_at = at;
        self
    }

    pub fn build(&self, rule_text: &str) -> String {
        let mut out = self.header(rule_text);

        push_section(&mut out, "Rule", rules::collect(rule_text));
        push_section(&mut out, "URL Rewrite", rewrite::url_rewrites(rule_text));
        push_section(&mut out, "Header Rewrite", rewrite::header_rewrites(rule_text));
        push_section(&mut out, "Body Rewrite", rewrite::body_rewrites(rule_text));
        push_section(&mut out, "Map Local", map_local::collect(rule_text));
        push_section(&mut out, "Script", script::collect(rule_text));

        if let Some(hostnames) = mitm::collect(rule_text) {
            out.push_str("\n[MITM]\n");
            out.push_str(&format!("hostname = %APPEND% {}\n", hostnames));
        }

        out
    }

    fn header(&self, rule_text: &str) -> String {
        let mut lines = vec![
            format!("#!name={}", self.name),
            format!(
                "{}{}",
                DESC_PREFIX,
                self.generated_at.format("%Y-%m-%d %H:%M:%S")
            ),
        ];

        let arguments: Vec<String> = directive_values(rule_text, arguments_re())
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect();
        if !arguments.is_empty() {
            lines.push(format!("#!arguments={}", arguments.join(", ")));
        }

        let descriptions: Vec<&str> = directive_values(rule_text, arguments_desc_re())
            .flat_map(|value| value.split('；'))
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect();
        if !descriptions.is_empty() {
            // The host expects literal `\n` escapes inside the directive value
            lines.push(format!(
                r"#!arguments-desc=\n 参数说明：\n {}；\n ",
                descriptions.join(r"；\n ")
            ));
        }

        let mut header = lines.join("\n");
        header.push('\n');
        header
    }
}

/// Build a module for `rule_text` named `name`, stamped with the current time
pub fn build_sgmodule(rule_text: &str, name: &str) -> String {
    ModuleBuilder::new(name).build(rule_text)
}

/// Split merged rule text into `(app name, rule text)` sections.
///
/// A section starts at a `# > Name` line. Lines before the first marker,
/// or after a marker without a name, belong to no app. A repeated name
/// replaces the earlier text in place.
pub fn split_apps(rules: &str) -> Vec<(String, String)> {
    let mut apps: Vec<(String, String)> = Vec::new();
    let mut current: Option<String> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in rules.lines() {
        if let Some(name) = line.strip_prefix(APP_MARKER) {
            if let Some(app) = current.as_deref() {
                if !buffer.is_empty() {
                    flush(&mut apps, app, &mut buffer);
                }
            }
            let name = name.trim();
            current = (!name.is_empty()).then(|| name.to_string());
        } else if current.is_some() {
            buffer.push(line);
        }
    }
    if let Some(app) = current.as_deref() {
        if !buffer.is_empty() {
            flush(&mut apps, app, &mut buffer);
        }
    }

    apps
}

fn flush(apps: &mut Vec<(String, String)>, name: &str, buffer: &mut Vec<&str>) {
    let text = buffer.join("\n");
    buffer.clear();
    match apps.iter_mut().find(|(existing, _)| existing == name) {
        Some(entry) => entry.1 = text,
        None => apps.push((name.to_string(), text)),
    }
}

/// Per-app modules, without the `#!desc=` line so output is stable across runs
pub fn build_app_modules(rules: &str) -> Vec<(String, String)> {
    split_apps(rules)
        .into_iter()
        .map(|(name, text)| {
            let module = build_sgmodule(&text, &name);
            let mut content = module
                .lines()
                .filter(|line| !line.starts_with(DESC_PREFIX))
                .collect::<Vec<_>>()
                .join("\n");
            content.push('\n');
            (name, content)
        })
        .collect()
}

fn push_section(out: &mut String, title: &str, lines: Vec<String>) {
    if lines.is_empty() {
        return;
    }
    out.push_str(&format!("\n[{}]\n", title));
    out.push_str(&lines.join("\n"));
    out.push('\n');
}

/// Lines that are not commented out
pub(crate) fn active_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter(|line| !line.starts_with('#'))
}

/// Sorted, de-duplicated copy
pub(crate) fn sorted_unique(mut lines: Vec<String>) -> Vec<String> {
    lines.sort();
    lines.dedup();
    lines
}

fn directive_values<'a>(text: &'a str, re: &'static Regex) -> impl Iterator<Item = &'a str> {
    text.lines()
        .filter_map(move |line| re.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub(crate) fn static_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("builtin pattern must compile"))
}

fn arguments_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^\s*#!arguments\s*=\s*(.+)")
}

fn arguments_desc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^\s*#!arguments-desc\s*=\s*(.+)")
}
