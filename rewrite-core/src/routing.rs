//! Routing table
//!
//! Declarative mapping from URL patterns to what the host should do with a
//! matching request: run a named script, substitute a mock body, or reject.
//! Only hosts on the MITM list are considered at all.

use crate::blocker::BLOCKED_STATUS_LINE;
use crate::classifier::{ClassificationResult, Classifier};
use crate::error::{compile, RewriteError};
use crate::filter::HostnameMatcher;
use crate::request::RequestDescriptor;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Flavors of the host's `reject` family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectKind {
    /// `reject`: 404 with an empty body
    Reject,
    /// `reject-200`: 200 with an empty body
    Reject200,
    /// `reject-dict`: 200 with `{}`
    RejectDict,
    /// `reject-array`: 200 with `[]`
    RejectArray,
}

impl RejectKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "reject" => Some(RejectKind::Reject),
            // Image variants carry binary payloads; an empty 200 is the closest text form
            "reject-200" | "reject-img" | "reject-tinygif" => Some(RejectKind::Reject200),
            "reject-dict" => Some(RejectKind::RejectDict),
            "reject-array" => Some(RejectKind::RejectArray),
            _ => None,
        }
    }

    pub fn result(self) -> ClassificationResult {
        match self {
            RejectKind::Reject => ClassificationResult::block(BLOCKED_STATUS_LINE, ""),
            RejectKind::Reject200 => ClassificationResult::block("HTTP/1.1 200 OK", ""),
            RejectKind::RejectDict => ClassificationResult::block("HTTP/1.1 200 OK", "{}"),
            RejectKind::RejectArray => ClassificationResult::block("HTTP/1.1 200 OK", "[]"),
        }
    }
}

/// What to do with a request whose URL matches a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteAction {
    /// Run a script from the registry
    Script { name: String },
    /// Keep status and headers, substitute the body
    Mock { body: String },
    /// Terminate with a synthetic response
    Reject { kind: RejectKind },
}

impl RouteAction {
    pub fn script(name: impl Into<String>) -> Self {
        RouteAction::Script { name: name.into() }
    }

    pub fn json_mock(body: impl Into<String>) -> Self {
        RouteAction::Mock { body: body.into() }
    }
}

/// Serialized form of a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub pattern: String,
    pub action: RouteAction,
}

/// Serialized form of a routing table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTableConfig {
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub mitm_hostnames: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Route {
    pattern: Regex,
    action: RouteAction,
}

impl Route {
    pub fn new(pattern: &str, action: RouteAction) -> Result<Self, RewriteError> {
        Ok(Self {
            pattern: compile(pattern)?,
            action,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn action(&self) -> &RouteAction {
        &self.action
    }

    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }
}

/// Named classifiers a route can refer to
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    scripts: HashMap<String, Arc<dyn Classifier>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, script: impl Classifier + 'static) {
        self.scripts.insert(name.into(), Arc::new(script));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Classifier>> {
        self.scripts.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scripts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("scripts", &self.names())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: Vec<Route>,
    mitm: HostnameMatcher,
}

impl RoutingTable {
    pub fn new(routes: Vec<Route>, mitm: HostnameMatcher) -> Self {
        Self { routes, mitm }
    }

    pub fn from_config(config: &RoutingTableConfig) -> Result<Self, RewriteError> {
        let routes = config
            .routes
            .iter()
            .map(|r| Route::new(&r.pattern, r.action.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(
            routes,
            HostnameMatcher::from_entries(&config.mitm_hostnames),
        ))
    }

    pub fn from_json(json: &str) -> Result<Self, RewriteError> {
        let config: RoutingTableConfig = serde_json::from_str(json)?;
        Self::from_config(&config)
    }

    /// Parse rewrite snippet text (`[rewrite_local]` / `[mitm]` style)
    pub fn from_snippet(text: &str) -> Result<Self, RewriteError> {
        snippet::parse(text)
    }

    pub fn to_config(&self) -> RoutingTableConfig {
        RoutingTableConfig {
            routes: self
                .routes
                .iter()
                .map(|r| RouteConfig {
                    pattern: r.pattern().to_string(),
                    action: r.action.clone(),
                })
                .collect(),
            mitm_hostnames: self.mitm.entries(),
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn mitm(&self) -> &HostnameMatcher {
        &self.mitm
    }

    /// Append another table's routes after this one's
    pub fn merge(&mut self, other: RoutingTable) {
        self.routes.extend(other.routes);
        self.mitm.merge(&other.mitm);
    }

    pub fn find(&self, url: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(url))
    }

    /// Resolve one request against the table
    pub fn dispatch(
        &self,
        request: &RequestDescriptor,
        scripts: &ScriptRegistry,
    ) -> ClassificationResult {
        let host = request.host();
        if !self.mitm.is_intercepted(&host) {
            trace!(host = %host, "Host not intercepted, passing through");
            return ClassificationResult::pass();
        }

        let Some(route) = self.find(&request.url) else {
            debug!(url = %request.url, "No route matched");
            return ClassificationResult::pass();
        };

        match &route.action {
            RouteAction::Script { name } => match scripts.get(name) {
                Some(script) => script.classify(request),
                None => {
                    warn!(script = %name, pattern = route.pattern(), "Route refers to unknown script");
                    ClassificationResult::pass()
                }
            },
            RouteAction::Mock { body } => ClassificationResult::replace_body(body.clone()),
            RouteAction::Reject { kind } => kind.result(),
        }
    }
}

mod snippet {
    use super::*;
    use crate::module::extract_data;

    pub(super) fn parse(text: &str) -> Result<RoutingTable, RewriteError> {
        let script_line =
            compile(r"^(\S+)\s+url\s+script-(?:response|request)-(?:body|header)\s+(\S+)")?;
        let module_script_line =
            compile(r"^\s*(\S+?)\s*=\s*type\s*=\s*http-(?:response|request)\s*,\s*pattern\s*=\s*(\S+?)\s*,\s*script-path\s*=\s*([^,\s]+)")?;
        let reject_line = compile(r"^(\S+)\s+url\s+(reject(?:-200|-array|-dict|-img|-tinygif)?)\s*$")?;
        let mock_line = compile(r"^(\S+)\s+mock-response-body\s+(.*)$")?;
        let hostname_line = compile(r"^hostname\s*=\s*([^#]*)")?;

        let mut table = RoutingTable::default();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }

            if let Some(caps) = hostname_line.captures(line) {
                table.mitm.merge(&HostnameMatcher::parse(&caps[1]));
            } else if let Some(caps) = script_line.captures(line) {
                let name = script_name(&caps[2]);
                table.routes.push(Route::new(&caps[1], RouteAction::script(name))?);
            } else if let Some(caps) = module_script_line.captures(line) {
                let name = caps[1].trim_end_matches(".js").to_string();
                table.routes.push(Route::new(&caps[2], RouteAction::script(name))?);
            } else if let Some(caps) = reject_line.captures(line) {
                if let Some(kind) = RejectKind::parse(&caps[2]) {
                    table.routes.push(Route::new(&caps[1], RouteAction::Reject { kind })?);
                }
            } else if let Some(caps) = mock_line.captures(line) {
                let (data, _) = extract_data(&caps[2]);
                table.routes.push(Route::new(&caps[1], RouteAction::json_mock(data))?);
            } else {
                trace!(line, "Ignoring snippet line");
            }
        }

        Ok(table)
    }

    /// `https://host/path/AMDC.js` -> `AMDC`
    fn script_name(path: &str) -> String {
        let file = path.rsplit('/').next().unwrap_or(path);
        file.strip_suffix(".js").unwrap_or(file).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    const ALI_AMDC_SNIPPET: &str = r#"
[rewrite_local]
^https?:\/\/amdc\.m\.taobao\.com\/amdc\/mobileDispatch$ url script-response-body https://xiangwanguan.github.io/Shadowrocket/Rewrite/JavaScript/AliAMDC.js

[mitm]
hostname = amdc.m.taobao.com
"#;

    #[test]
    fn test_parse_script_snippet() {
        let table = RoutingTable::from_snippet(ALI_AMDC_SNIPPET).unwrap();
        assert_eq!(table.routes().len(), 1);
        assert_eq!(table.routes()[0].action(), &RouteAction::script("AliAMDC"));
        assert!(table.mitm().is_intercepted("amdc.m.taobao.com"));
    }

    #[test]
    fn test_parse_module_script_line() {
        let line = "AMDC.js =type=http-response, pattern=^https?:\\/\\/amdc\\.m\\.taobao\\.com, script-path=https://example.com/AMDC.js, requires-body=true, max-size=0";
        let table = RoutingTable::from_snippet(line).unwrap();
        assert_eq!(table.routes()[0].action(), &RouteAction::script("AMDC"));
        assert!(table.routes()[0].matches("https://amdc.m.taobao.com/x"));
    }

    #[test]
    fn test_parse_mock_and_reject() {
        let text = r#"
^https?:\/\/api\.example\.com\/feed mock-response-body data-type=json status-code=200 data={"data":[]}
^https?:\/\/api\.example\.com\/ads url reject-dict
hostname = api.example.com
"#;
        let table = RoutingTable::from_snippet(text).unwrap();
        assert_eq!(table.routes().len(), 2);
        assert_eq!(table.routes()[0].action(), &RouteAction::json_mock(r#"{"data":[]}"#));
        assert_eq!(
            table.routes()[1].action(),
            &RouteAction::Reject { kind: RejectKind::RejectDict }
        );
    }

    #[test]
    fn test_dispatch_skips_hosts_outside_mitm() {
        let table = RoutingTable::from_snippet(
            "^https?:\\/\\/api\\.example\\.com url reject\nhostname = other.example.com",
        )
        .unwrap();
        let req = RequestDescriptor::new("https://api.example.com/x");
        assert!(table.dispatch(&req, &ScriptRegistry::new()).is_passthrough());
    }

    #[test]
    fn test_dispatch_unknown_script_passes() {
        let table = RoutingTable::from_snippet(ALI_AMDC_SNIPPET).unwrap();
        let req = RequestDescriptor::new("https://amdc.m.taobao.com/amdc/mobileDispatch")
            .with_header("User-Agent", "Alibaba");
        assert!(table.dispatch(&req, &ScriptRegistry::new()).is_passthrough());
    }

    #[test]
    fn test_dispatch_runs_registered_script() {
        let table = presets::builtin_routes().unwrap();
        let scripts = presets::builtin_scripts().unwrap();

        let req = RequestDescriptor::new("https://amdc.m.taobao.com/amdc/mobileDispatch")
            .with_header("User-Agent", "AMapiPhone/10.1");
        assert!(table.dispatch(&req, &scripts).is_block());

        let mocked = RequestDescriptor::new(
            "https://oneapp-api.faw-vw.com/benefits/benefitsCard/getInfo/v1?x=1",
        );
        assert_eq!(
            table.dispatch(&mocked, &scripts).replacement_body(),
            Some(presets::EMPTY_LIST_ENVELOPE)
        );
    }

    #[test]
    fn test_json_config_roundtrip_and_invalid_pattern() {
        let table = presets::builtin_routes().unwrap();
        let json = serde_json::to_string(&table.to_config()).unwrap();
        let reloaded = RoutingTable::from_json(&json).unwrap();
        assert_eq!(reloaded.routes().len(), table.routes().len());
        assert_eq!(reloaded.mitm(), table.mitm());

        let bad = r#"{"routes":[{"pattern":"([","action":{"type":"reject","kind":"reject"}}]}"#;
        assert!(matches!(
            RoutingTable::from_json(bad),
            Err(RewriteError::Pattern { .. })
        ));
    }
}
