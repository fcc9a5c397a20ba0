use crate::config::toml_config::{IconConfig, PageConfig, TomlConfig};
use crate::domain::model::{RenderJob, Theme};
use crate::utils::error::{RenderError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "resume-pdf")]
#[command(about = "Render a local HTML resume into dark and light PDF files")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// HTML page to render (overrides [page].source)
    #[arg(long)]
    pub source: Option<String>,

    /// Directory the PDF files are written to
    #[arg(long, default_value = ".")]
    pub output_dir: String,

    /// Only render these themes (repeatable)
    #[arg(long = "theme")]
    pub themes: Vec<Theme>,

    /// Keep the page's own icon instead of downloading a recolored one
    #[arg(long)]
    pub no_icon: bool,

    /// Chrome or Chromium binary to launch
    #[arg(long)]
    pub chrome_path: Option<String>,

    /// Show what would be rendered without launching a browser
    #[arg(long)]
    pub dry_run: bool,

    /// Log process CPU and memory after each job
    #[arg(long)]
    pub monitor: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Loads the configuration file, if any, and applies the command line
    /// overrides on top of it.
    pub fn load(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };

        if let Some(source) = &self.source {
            config.page.get_or_insert_with(PageConfig::default).source = Some(source.clone());
            tracing::info!("🔧 Source overridden to: {}", source);
        }
        if self.no_icon {
            config.icon.get_or_insert_with(IconConfig::default).enabled = Some(false);
        }
        if let Some(path) = &self.chrome_path {
            config
                .browser
                .get_or_insert_with(Default::default)
                .chrome_path = Some(path.clone());
        }

        Ok(config)
    }

    /// Jobs from the configuration, narrowed to the requested themes.
    pub fn select_jobs(&self, config: &TomlConfig) -> Result<Vec<RenderJob>> {
        let jobs: Vec<RenderJob> = config
            .jobs()
            .into_iter()
            .filter(|job| self.themes.is_empty() || self.themes.contains(&job.theme))
            .collect();

        if jobs.is_empty() {
            return Err(RenderError::ConfigValidationError {
                field: "theme".to_string(),
                message: "No configured job matches the requested themes".to_string(),
            });
        }
        Ok(jobs)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("output_dir", &self.output_dir)?;
        if let Some(source) = &self.source {
            validation::validate_path("source", source)?;
        }
        if let Some(config) = &self.config {
            validation::validate_path("config", config)?;
        }
        Ok(())
    }
}
