use wildmatch::WildMatch;

/// Markers the host uses to merge hostname lists across modules
const MERGE_MARKERS: &[&str] = &["%APPEND%", "%INSERT%"];

/// Hostnames subject to MITM interception
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostnameMatcher {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl HostnameMatcher {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include: include.into_iter().map(|h| h.to_ascii_lowercase()).collect(),
            exclude: exclude.into_iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    /// Build from host-style entries: `a.com`, `*.b.com`, `-c.com`
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::default();
        for entry in entries {
            matcher.add_entry(entry.as_ref());
        }
        matcher
    }

    /// Parse the value of a `hostname = ...` line
    pub fn parse(value: &str) -> Self {
        Self::from_entries(value.split(',').flat_map(str::split_whitespace))
    }

    pub fn add_entry(&mut self, entry: &str) {
        let entry = entry.trim();
        if entry.is_empty() || MERGE_MARKERS.contains(&entry) {
            return;
        }
        let entry = entry.to_ascii_lowercase();
        match entry.strip_prefix('-') {
            Some(host) if !host.is_empty() => push_unique(&mut self.exclude, host.to_string()),
            Some(_) => {}
            None => push_unique(&mut self.include, entry),
        }
    }

    pub fn merge(&mut self, other: &HostnameMatcher) {
        for host in &other.include {
            push_unique(&mut self.include, host.clone());
        }
        for host in &other.exclude {
            push_unique(&mut self.exclude, host.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }

    /// Check if a host should be intercepted
    ///
    /// Logic:
    /// 1. If an exclusion matches, return false.
    /// 2. Return true only if an inclusion matches. An empty list intercepts nothing.
    pub fn is_intercepted(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();

        if self
            .exclude
            .iter()
            .any(|pattern| WildMatch::new(pattern).matches(&host))
        {
            return false;
        }

        self.include
            .iter()
            .any(|pattern| WildMatch::new(pattern).matches(&host))
    }

    /// Exclusions first, then inclusions, each sorted
    pub fn entries(&self) -> Vec<String> {
        let mut exclude: Vec<String> = self.exclude.iter().map(|h| format!("-{}", h)).collect();
        let mut include = self.include.clone();
        exclude.sort();
        include.sort();
        exclude.extend(include);
        exclude
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
