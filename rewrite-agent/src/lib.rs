//! Rewrite Agent
//!
//! Command-line front end for rewrite-core: serves classification over
//! HTTP, classifies a single request, or renders rule sources into
//! `.sgmodule` files.

use clap::{Args as ClapArgs, Parser, Subcommand};
use rewrite_core::{
    presets, Classifier, Completion, RequestDescriptor, RewriteConfig, RoutingTable,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod error;
pub mod generator;
pub mod logging;
pub mod server;

pub use error::{AgentError, AgentResult};
pub use generator::{GenerateReport, Generator};
pub use logging::{init_logging, LoggingConfig};
pub use server::{app, AppState};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Also write logs to this file, rotated daily
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve classification over HTTP
    Serve(ServeArgs),
    /// Classify a single request and print the completion object
    Classify(ClassifyArgs),
    /// Build .sgmodule files from rule sources
    Generate(GenerateArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    pub listen_addr: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Routing table (JSON, or rewrite snippet text)
    #[arg(long)]
    pub routes: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ClassifyArgs {
    /// Request URL
    #[arg(long)]
    pub url: String,

    /// User-Agent header value
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Extra header as `Name: value`; repeatable
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,

    /// Routing table (JSON, or rewrite snippet text)
    #[arg(long)]
    pub routes: Option<PathBuf>,

    /// Skip routing and run the built-in classifier chain directly
    #[arg(long, default_value_t = false)]
    pub direct: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GenerateArgs {
    /// File listing rule sources
    #[arg(long)]
    pub sources: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Name of the merged module
    #[arg(long)]
    pub name: Option<String>,
}

impl Args {
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            log_file: self.log_file.clone(),
            ..Default::default()
        }
        .with_env_override()
    }
}

/// Load the configuration file, or defaults when none was given
pub fn load_config(path: Option<&Path>) -> AgentResult<RewriteConfig> {
    match path {
        Some(path) => Ok(RewriteConfig::load(path)?),
        None => Ok(RewriteConfig::default()),
    }
}

/// Routing table from a file, or the built-in one.
///
/// Files ending in `.json` hold a serialized table; anything else is parsed
/// as rewrite snippet text.
pub fn load_routes(path: Option<&Path>) -> AgentResult<RoutingTable> {
    let Some(path) = path else {
        return Ok(presets::builtin_routes()?);
    };

    let content = std::fs::read_to_string(path).map_err(|e| {
        AgentError::InvalidArgument(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let table = if path.extension().map_or(false, |ext| ext == "json") {
        RoutingTable::from_json(&content)?
    } else {
        RoutingTable::from_snippet(&content)?
    };
    tracing::info!(
        path = %path.display(),
        routes = table.routes().len(),
        "Loaded routing table"
    );
    Ok(table)
}

/// Parse `Name: value`
pub fn parse_header(raw: &str) -> AgentResult<(String, String)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(AgentError::InvalidArgument(format!(
            "Header must look like 'Name: value', got '{}'",
            raw
        ))),
    }
}

pub fn build_request(args: &ClassifyArgs) -> AgentResult<RequestDescriptor> {
    let mut request = RequestDescriptor::new(&args.url);
    if let Some(ua) = &args.user_agent {
        request.headers.insert("User-Agent", ua.clone());
    }
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request.headers.insert(name, value);
    }
    Ok(request)
}

pub fn classify_once(args: &ClassifyArgs) -> AgentResult<Completion> {
    let request = build_request(args)?;
    let result = if args.direct {
        presets::builtin_classifier()?.classify(&request)
    } else {
        let routes = load_routes(args.routes.as_deref())?;
        routes.dispatch(&request, &presets::builtin_scripts()?)
    };
    Ok(Completion::from(result))
}

pub async fn run(args: Args) -> AgentResult<()> {
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Serve(serve) => {
            let mut server = config.server;
            if let Some(addr) = serve.listen_addr {
                server.listen_address = addr;
            }
            if let Some(port) = serve.port {
                server.listen_port = port;
            }
            if serve.routes.is_some() {
                server.routes_path = serve.routes;
            }

            let addr: SocketAddr = format!("{}:{}", server.listen_address, server.listen_port)
                .parse()
                .map_err(|e| AgentError::InvalidArgument(format!("Bad listen address: {}", e)))?;
            let routes = load_routes(server.routes_path.as_deref())?;
            let state = Arc::new(AppState::new(routes, presets::builtin_scripts()?));

            server::start_server(addr, state).await
        }
        Command::Classify(classify) => {
            let completion = classify_once(&classify)?;
            println!("{}", completion.to_json());
            Ok(())
        }
        Command::Generate(generate) => {
            let mut generator = config.generator;
            if let Some(sources) = generate.sources {
                generator.sources_path = sources;
            }
            if let Some(output) = generate.output {
                generator.output_dir = output;
            }
            if let Some(name) = generate.name {
                generator.project_name = name;
            }

            let report = Generator::new(generator)?.run().await?;
            if let Some(path) = report.merged_module {
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}
