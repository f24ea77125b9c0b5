//! Module generation from a list of rule sources

use crate::error::{AgentError, AgentResult};
use rewrite_core::{build_app_modules, GeneratorConfig, ModuleBuilder};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a generation run wrote
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub sources_loaded: usize,
    pub sources_failed: usize,
    pub merged_module: Option<PathBuf>,
    pub app_modules: Vec<PathBuf>,
    pub app_modules_failed: usize,
}

/// Source entries: one per line, blank lines and `#` comments skipped
pub async fn read_source_list(path: &Path) -> AgentResult<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        AgentError::InvalidArgument(format!("Failed to read {}: {}", path.display(), e))
    })?;

    Ok(content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

pub struct Generator {
    config: GeneratorConfig,
    client: reqwest::Client,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> AgentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|e| AgentError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Load one source: `https://` entries are fetched, anything else is a
    /// path tried as given and then relative to the source list's directory.
    pub async fn load_source(&self, entry: &str) -> Option<String> {
        if entry.starts_with("https://") {
            return match self.fetch(entry).await {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("Failed to download {}: {}", entry, e);
                    None
                }
            };
        }

        let base = self
            .config
            .sources_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let candidates = [PathBuf::from(entry), base.join(entry)];

        let mut found = None;
        for candidate in &candidates {
            if is_file(candidate).await {
                found = Some(candidate);
                break;
            }
        }
        let Some(path) = found else {
            warn!("Local file not found: {}", candidates[1].display());
            return None;
        };
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    pub async fn run(&self) -> AgentResult<GenerateReport> {
        let entries = read_source_list(&self.config.sources_path).await?;
        let mut report = GenerateReport::default();

        let mut texts = Vec::new();
        for entry in &entries {
            match self.load_source(entry).await {
                Some(text) if !text.is_empty() => {
                    report.sources_loaded += 1;
                    texts.push(text);
                }
                Some(_) => {}
                None => report.sources_failed += 1,
            }
        }

        if texts.is_empty() {
            warn!("No valid rules found, module generation skipped");
            return Ok(report);
        }
        let merged = texts.join("\n");

        let content = ModuleBuilder::new(&self.config.project_name).build(&merged);
        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let merged_path = self.config.merged_module_path();
        tokio::fs::write(&merged_path, &content).await?;
        info!(path = %merged_path.display(), bytes = content.len(), "Wrote merged module");
        report.merged_module = Some(merged_path);

        self.write_app_modules(&merged, &mut report).await?;
        info!(
            loaded = report.sources_loaded,
            failed = report.sources_failed,
            apps = report.app_modules.len(),
            apps_failed = report.app_modules_failed,
            "Module generation finished"
        );
        Ok(report)
    }

    /// Replace the per-app directory's files with freshly built modules.
    ///
    /// A module that cannot be saved is logged and skipped.
    async fn write_app_modules(
        &self,
        merged: &str,
        report: &mut GenerateReport,
    ) -> AgentResult<()> {
        let dir = self.config.app_modules_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
            }
        }

        for (name, content) in build_app_modules(merged) {
            let path = dir.join(format!("{}.sgmodule", name));
            match tokio::fs::write(&path, content).await {
                Ok(()) => report.app_modules.push(path),
                Err(e) => {
                    warn!("Failed to save {}: {}", path.display(), e);
                    report.app_modules_failed += 1;
                }
            }
        }
        Ok(())
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_source_list_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Generate.conf");
        std::fs::write(&path, "# header\nRules/a.list\n\n  Rules/b.list  \n#https://skip\n").unwrap();

        assert_eq!(
            read_source_list(&path).await.unwrap(),
            vec!["Rules/a.list", "Rules/b.list"]
        );
    }

    #[tokio::test]
    async fn test_read_missing_source_list() {
        assert!(matches!(
            read_source_list(Path::new("/nonexistent/Generate.conf")).await,
            Err(AgentError::InvalidArgument(_))
        ));
    }
}
