use crate::utils::error::RenderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(RenderError::InvalidConfigValueError {
                field: "theme".to_string(),
                value: other.to_string(),
                reason: "Expected 'dark' or 'light'".to_string(),
            }),
        }
    }
}

/// One PDF to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderJob {
    pub theme: Theme,
    pub output: String,
}

impl RenderJob {
    pub fn new(theme: Theme, output: impl Into<String>) -> Self {
        Self {
            theme,
            output: output.into(),
        }
    }

    pub fn defaults() -> Vec<RenderJob> {
        vec![
            RenderJob::new(Theme::Dark, "Доленков_Игорь_резюме.pdf"),
            RenderJob::new(Theme::Light, "Доленков_Игорь_резюме_светлая.pdf"),
        ]
    }
}

/// What a theme changes on the page before printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeAssets {
    /// Image file the avatar element is pointed at.
    pub avatar: String,
    /// Attribute on the icon link holding the hex color for this theme.
    pub icon_color_attribute: String,
}

#[derive(Debug, Clone)]
pub struct PageSettings {
    pub source: PathBuf,
    pub theme_attribute: String,
    pub avatar_selector: String,
    pub navigation_timeout: Duration,
    pub dark: ThemeAssets,
    pub light: ThemeAssets,
}

impl PageSettings {
    pub fn assets(&self, theme: Theme) -> &ThemeAssets {
        match theme {
            Theme::Dark => &self.dark,
            Theme::Light => &self.light,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IconSettings {
    pub enabled: bool,
    pub url: String,
    pub link_selector: String,
    pub target_selector: String,
    pub size: u32,
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StyleSettings {
    pub css: String,
    /// Selectors that must compute to `display: none` once the overrides apply.
    pub hidden_selectors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperFormat {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl PaperFormat {
    /// Width and height in inches, the unit the print backend expects.
    pub fn size_inches(&self) -> (f64, f64) {
        match self {
            PaperFormat::A3 => (11.69, 16.54),
            PaperFormat::A4 => (8.27, 11.69),
            PaperFormat::A5 => (5.83, 8.27),
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top_mm: f64,
    pub bottom_mm: f64,
    pub left_mm: f64,
    pub right_mm: f64,
}

impl Margins {
    pub fn uniform(mm: f64) -> Self {
        Self {
            top_mm: mm,
            bottom_mm: mm,
            left_mm: mm,
            right_mm: mm,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub format: PaperFormat,
    pub landscape: bool,
    pub print_background: bool,
    pub scale: f64,
    pub margins: Margins,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: PaperFormat::A4,
            landscape: false,
            print_background: true,
            scale: 1.0,
            margins: Margins::uniform(10.0),
        }
    }
}

/// Bounds for polling a DOM condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Extra pause after a condition holds, for pages with transitions.
    pub settle: Duration,
}

impl Default for Readiness {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
            settle: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    pub sandbox: bool,
    pub window_size: (u32, u32),
}

/// Everything one run needs, resolved from the config file and the CLI.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub page: PageSettings,
    pub icon: IconSettings,
    pub style: StyleSettings,
    pub pdf: PdfOptions,
    pub readiness: Readiness,
    pub browser: BrowserSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum IconOutcome {
    Injected,
    Skipped(String),
    Disabled,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub theme: Theme,
    pub output_path: String,
    pub bytes: usize,
    pub icon: IconOutcome,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub jobs: Vec<JobReport>,
}
