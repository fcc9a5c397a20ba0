pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::ChromeLauncher;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{engine::ResumeEngine, icon::CdnIconSource};
pub use domain::model::{RenderJob, RenderSettings, RunReport, Theme};
pub use utils::error::{RenderError, Result};
