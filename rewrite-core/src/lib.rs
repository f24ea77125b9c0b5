//! Rewrite Core Library
//!
//! This library classifies intercepted requests the way rewrite scripts do
//! inside an HTTP(S) interception host: block, pass through, or substitute a
//! mock body. It also carries the routing table that wires scripts to URL
//! patterns and the builder that renders rule text into `.sgmodule` files.

/// Intercepted request model
pub mod request;

/// Classification result and strategy chaining
pub mod classifier;
pub mod blocker;
pub mod mocker;

/// Built-in rule sets
pub mod presets;

/// Object returned to the interception host
pub mod completion;

pub mod filter;
pub mod routing;

/// `.sgmodule` generation
pub mod module;

/// Configuration types and utilities
pub mod config;

/// Error types for rewrite operations
pub mod error;

pub use blocker::{AppBlocker, BLOCKED_BODY, BLOCKED_STATUS_LINE};
pub use classifier::{ClassificationResult, Classifier, RequestClassifier};
pub use completion::Completion;
pub use config::{GeneratorConfig, RewriteConfig, ServerConfig};
pub use error::RewriteError;
pub use filter::HostnameMatcher;
pub use mocker::{MockRule, ResponseMocker};
pub use module::{build_app_modules, build_sgmodule, split_apps, ModuleBuilder};
pub use request::{Headers, RequestDescriptor};
pub use routing::{RejectKind, Route, RouteAction, RoutingTable, RoutingTableConfig, ScriptRegistry};

/// Result type alias for rewrite operations
pub type Result<T> = std::result::Result<T, RewriteError>;
