use crate::domain::model::{
    BrowserSettings, IconSettings, Margins, PageSettings, PaperFormat, PdfOptions, Readiness,
    RenderJob, RenderSettings, StyleSettings, Theme, ThemeAssets,
};
use crate::utils::error::{RenderError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SOURCE: &str = "index.html";
pub const DEFAULT_ICON_URL: &str = "https://cdn.jsdelivr.net/npm/simple-icons@v11/icons/github.svg";

/// Print overrides hiding the navigation and interactive chrome of the page.
pub const DEFAULT_OVERRIDES: &str = r#"
.navbar {
  display: none !important;
}
body {
  padding-top: 0 !important;
}
.certificate-button {
  display: none !important;
}
.skill-category {
  display: inline !important;
  margin-right: 16px !important;
}
.skill-label {
  display: none !important;
}
.skill-tags {
  display: inline !important;
}
.skill-tags .tag {
  margin-right: 8px !important;
}
"#;

pub const DEFAULT_HIDDEN_SELECTORS: [&str; 3] = [".navbar", ".certificate-button", ".skill-label"];

/// The optional `resume-pdf.toml` file. Every section and field may be
/// omitted; the defaults render the two standard resume variants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub page: Option<PageConfig>,
    pub themes: Option<ThemesConfig>,
    pub icon: Option<IconConfig>,
    pub style: Option<StyleConfig>,
    pub pdf: Option<PdfConfig>,
    pub readiness: Option<ReadinessConfig>,
    pub browser: Option<BrowserConfig>,
    pub jobs: Option<Vec<RenderJob>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageConfig {
    pub source: Option<String>,
    pub theme_attribute: Option<String>,
    pub avatar_selector: Option<String>,
    pub navigation_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemesConfig {
    pub dark: Option<ThemeConfig>,
    pub light: Option<ThemeConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub avatar: Option<String>,
    pub icon_color_attribute: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IconConfig {
    pub enabled: Option<bool>,
    pub url: Option<String>,
    pub link_selector: Option<String>,
    pub target_selector: Option<String>,
    pub size: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Replaces the built-in overrides.
    pub css: Option<String>,
    /// Appended after the overrides.
    pub extra_css: Option<String>,
    /// Checked before printing. Defaults to the selectors the built-in
    /// overrides hide, or to none when `css` replaces them.
    pub hidden_selectors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfConfig {
    pub format: Option<PaperFormat>,
    pub landscape: Option<bool>,
    pub print_background: Option<bool>,
    pub scale: Option<f64>,
    pub margins: Option<MarginsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarginsConfig {
    pub top_mm: Option<f64>,
    pub bottom_mm: Option<f64>,
    pub left_mm: Option<f64>,
    pub right_mm: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadinessConfig {
    pub timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub settle_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub chrome_path: Option<String>,
    pub headless: Option<bool>,
    pub sandbox: Option<bool>,
    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parses the configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RenderError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Expands `${VAR}` references; undefined variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RenderError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn source(&self) -> &str {
        self.page
            .as_ref()
            .and_then(|p| p.source.as_deref())
            .unwrap_or(DEFAULT_SOURCE)
    }

    pub fn icon_enabled(&self) -> bool {
        self.icon.as_ref().and_then(|i| i.enabled).unwrap_or(true)
    }

    pub fn icon_url(&self) -> &str {
        self.icon
            .as_ref()
            .and_then(|i| i.url.as_deref())
            .unwrap_or(DEFAULT_ICON_URL)
    }

    pub fn jobs(&self) -> Vec<RenderJob> {
        self.jobs.clone().unwrap_or_else(RenderJob::defaults)
    }

    fn theme_assets(&self, theme: Theme) -> ThemeAssets {
        let configured = self.themes.as_ref().and_then(|t| match theme {
            Theme::Dark => t.dark.as_ref(),
            Theme::Light => t.light.as_ref(),
        });
        let (avatar, attribute) = match theme {
            Theme::Dark => ("itsme.png", "data-color-dark"),
            Theme::Light => ("itsme_inv.png", "data-color-light"),
        };

        ThemeAssets {
            avatar: configured
                .and_then(|c| c.avatar.clone())
                .unwrap_or_else(|| avatar.to_string()),
            icon_color_attribute: configured
                .and_then(|c| c.icon_color_attribute.clone())
                .unwrap_or_else(|| attribute.to_string()),
        }
    }

    fn style_css(&self) -> String {
        let style = self.style.as_ref();
        let mut css = style
            .and_then(|s| s.css.clone())
            .unwrap_or_else(|| DEFAULT_OVERRIDES.to_string());
        if let Some(extra) = style.and_then(|s| s.extra_css.as_deref()) {
            css.push('\n');
            css.push_str(extra);
        }
        css
    }

    fn hidden_selectors(&self) -> Vec<String> {
        let style = self.style.as_ref();
        if let Some(selectors) = style.and_then(|s| s.hidden_selectors.clone()) {
            return selectors;
        }
        if style.is_some_and(|s| s.css.is_some()) {
            return Vec::new();
        }
        DEFAULT_HIDDEN_SELECTORS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Resolves every default into the settings one run uses.
    pub fn render_settings(&self) -> RenderSettings {
        let page = self.page.clone().unwrap_or_default();
        let icon = self.icon.clone().unwrap_or_default();
        let pdf = self.pdf.clone().unwrap_or_default();
        let margins = pdf.margins.clone().unwrap_or_default();
        let readiness = self.readiness.clone().unwrap_or_default();
        let browser = self.browser.clone().unwrap_or_default();
        let default_pdf = PdfOptions::default();
        let default_readiness = Readiness::default();
        let default_margin = default_pdf.margins;

        RenderSettings {
            page: PageSettings {
                source: PathBuf::from(self.source()),
                theme_attribute: page
                    .theme_attribute
                    .unwrap_or_else(|| "data-theme".to_string()),
                avatar_selector: page.avatar_selector.unwrap_or_else(|| "#avatar".to_string()),
                navigation_timeout: Duration::from_secs(
                    page.navigation_timeout_seconds.unwrap_or(30),
                ),
                dark: self.theme_assets(Theme::Dark),
                light: self.theme_assets(Theme::Light),
            },
            icon: IconSettings {
                enabled: self.icon_enabled(),
                url: self.icon_url().to_string(),
                link_selector: icon
                    .link_selector
                    .unwrap_or_else(|| r#".link[data-social-icon="github"]"#.to_string()),
                target_selector: icon
                    .target_selector
                    .unwrap_or_else(|| ".social-icon".to_string()),
                size: icon.size.unwrap_or(20),
                fetch_timeout: Duration::from_secs(icon.timeout_seconds.unwrap_or(10)),
            },
            style: StyleSettings {
                css: self.style_css(),
                hidden_selectors: self.hidden_selectors(),
            },
            pdf: PdfOptions {
                format: pdf.format.unwrap_or(default_pdf.format),
                landscape: pdf.landscape.unwrap_or(default_pdf.landscape),
                print_background: pdf.print_background.unwrap_or(default_pdf.print_background),
                scale: pdf.scale.unwrap_or(default_pdf.scale),
                margins: Margins {
                    top_mm: margins.top_mm.unwrap_or(default_margin.top_mm),
                    bottom_mm: margins.bottom_mm.unwrap_or(default_margin.bottom_mm),
                    left_mm: margins.left_mm.unwrap_or(default_margin.left_mm),
                    right_mm: margins.right_mm.unwrap_or(default_margin.right_mm),
                },
            },
            readiness: Readiness {
                timeout: readiness
                    .timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(default_readiness.timeout),
                poll_interval: readiness
                    .poll_interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(default_readiness.poll_interval),
                settle: readiness
                    .settle_ms
                    .map(Duration::from_millis)
                    .unwrap_or(default_readiness.settle),
            },
            browser: BrowserSettings {
                chrome_path: browser.chrome_path.map(PathBuf::from),
                headless: browser.headless.unwrap_or(true),
                sandbox: browser.sandbox.unwrap_or(false),
                window_size: (
                    browser.window_width.unwrap_or(1280),
                    browser.window_height.unwrap_or(1800),
                ),
            },
        }
    }

    /// Checks every configured value without touching the filesystem.
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("page.source", self.source())?;

        if let Some(page) = &self.page {
            if let Some(attribute) = &page.theme_attribute {
                validation::validate_non_empty_string("page.theme_attribute", attribute)?;
            }
            if let Some(selector) = &page.avatar_selector {
                validation::validate_non_empty_string("page.avatar_selector", selector)?;
            }
            if let Some(timeout) = page.navigation_timeout_seconds {
                validation::validate_positive_number("page.navigation_timeout_seconds", timeout, 1)?;
            }
        }

        if let Some(themes) = &self.themes {
            for (name, theme) in [("dark", &themes.dark), ("light", &themes.light)] {
                let Some(theme) = theme else { continue };
                if let Some(avatar) = &theme.avatar {
                    validation::validate_path(&format!("themes.{}.avatar", name), avatar)?;
                }
                if let Some(attribute) = &theme.icon_color_attribute {
                    validation::validate_non_empty_string(
                        &format!("themes.{}.icon_color_attribute", name),
                        attribute,
                    )?;
                }
            }
        }

        if self.icon_enabled() {
            validation::validate_url("icon.url", self.icon_url())?;
        }
        if let Some(icon) = &self.icon {
            if let Some(size) = icon.size {
                validation::validate_positive_number("icon.size", u64::from(size), 1)?;
            }
            if let Some(timeout) = icon.timeout_seconds {
                validation::validate_positive_number("icon.timeout_seconds", timeout, 1)?;
            }
        }

        if let Some(selectors) = self.style.as_ref().and_then(|s| s.hidden_selectors.as_ref()) {
            for selector in selectors {
                validation::validate_non_empty_string("style.hidden_selectors", selector)?;
            }
        }

        if let Some(pdf) = &self.pdf {
            if let Some(scale) = pdf.scale {
                validation::validate_range("pdf.scale", scale, 0.1, 2.0)?;
            }
            if let Some(margins) = &pdf.margins {
                for (field, value) in [
                    ("pdf.margins.top_mm", margins.top_mm),
                    ("pdf.margins.bottom_mm", margins.bottom_mm),
                    ("pdf.margins.left_mm", margins.left_mm),
                    ("pdf.margins.right_mm", margins.right_mm),
                ] {
                    if let Some(value) = value {
                        validation::validate_range(field, value, 0.0, 100.0)?;
                    }
                }
            }
        }

        if let Some(readiness) = &self.readiness {
            if let Some(timeout) = readiness.timeout_ms {
                validation::validate_positive_number("readiness.timeout_ms", timeout, 1)?;
            }
            if let Some(interval) = readiness.poll_interval_ms {
                validation::validate_positive_number("readiness.poll_interval_ms", interval, 1)?;
            }
        }

        if let Some(path) = self.browser.as_ref().and_then(|b| b.chrome_path.as_deref()) {
            validation::validate_path("browser.chrome_path", path)?;
        }

        let jobs = self.jobs();
        if jobs.is_empty() {
            return Err(RenderError::ConfigValidationError {
                field: "jobs".to_string(),
                message: "At least one job is required".to_string(),
            });
        }
        let outputs: Vec<String> = jobs.into_iter().map(|job| job.output).collect();
        validation::validate_output_files("jobs.output", &outputs, "pdf")?;

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
