use crate::core::scripts;
use crate::domain::model::{BrowserSettings, PdfOptions};
use crate::domain::ports::{BrowserLauncher, PageSession};
use crate::utils::error::{RenderError, Result};
use async_trait::async_trait;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const MM_PER_INCH: f64 = 25.4;

/// Starts one headless Chrome process per session.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    settings: BrowserSettings,
}

impl ChromeLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession> {
        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || ChromeSession::open(&settings)).await?
    }
}

/// A tab in a browser owned by this session. The browser process is killed
/// when the session is closed or dropped.
pub struct ChromeSession {
    tab: Arc<Tab>,
    browser: Option<Browser>,
}

impl ChromeSession {
    fn open(settings: &BrowserSettings) -> Result<Self> {
        let options = LaunchOptions {
            headless: settings.headless,
            sandbox: settings.sandbox,
            window_size: Some(settings.window_size),
            path: settings.chrome_path.clone(),
            ..Default::default()
        };

        tracing::debug!(
            "Launching Chrome (headless: {}, sandbox: {}, binary: {:?})",
            settings.headless,
            settings.sandbox,
            settings.chrome_path
        );
        let browser = Browser::new(options).map_err(|e| RenderError::browser("launch", e))?;
        let tab = browser
            .new_tab()
            .map_err(|e| RenderError::browser("new_tab", e))?;

        Ok(Self {
            tab,
            browser: Some(browser),
        })
    }

    fn with_tab<T, F>(&self, f: F) -> impl std::future::Future<Output = Result<T>> + Send
    where
        F: FnOnce(&Tab) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        on_tab(Arc::clone(&self.tab), f)
    }
}

/// The driver is synchronous; keep it off the async worker threads.
async fn on_tab<T, F>(tab: Arc<Tab>, f: F) -> Result<T>
where
    F: FnOnce(&Tab) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&tab)).await?
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<()> {
        let url = url.to_string();
        self.with_tab(move |tab| {
            tab.set_default_timeout(timeout);
            tab.navigate_to(&url)
                .map_err(|e| RenderError::browser("navigate", e))?;
            tab.wait_until_navigated()
                .map_err(|e| RenderError::browser("navigate", e))?;
            Ok(())
        })
        .await
    }

    async fn evaluate(&mut self, expression: &str) -> Result<Value> {
        let expression = expression.to_string();
        let stage = scripts::stage_of(&expression)
            .unwrap_or("evaluate")
            .to_string();

        self.with_tab(move |tab| {
            match tab.evaluate(&expression, false) {
                Ok(object) => script_result(stage, object.value),
                Err(e) => Err(RenderError::ScriptError {
                    stage,
                    message: e.to_string(),
                }),
            }
        })
        .await
    }

    async fn print_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>> {
        let options = print_options(options);
        self.with_tab(move |tab| {
            tab.print_to_pdf(Some(options))
                .map_err(|e| RenderError::browser("print_to_pdf", e))
        })
        .await
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(browser) = self.browser.take() {
            tokio::task::spawn_blocking(move || drop(browser)).await?;
            tracing::debug!("Browser closed");
        }
        Ok(())
    }
}

/// The driver drops exception details, so thrown scripts report through the
/// marker their wrapper returns.
fn script_result(stage: String, value: Option<Value>) -> Result<Value> {
    let value = value.unwrap_or(Value::Null);
    match scripts::thrown(&value) {
        Some(message) => Err(RenderError::ScriptError { stage, message }),
        None => Ok(value),
    }
}

fn print_options(options: &PdfOptions) -> PrintToPdfOptions {
    let (paper_width, paper_height) = options.format.size_inches();
    let margins = options.margins;

    PrintToPdfOptions {
        landscape: Some(options.landscape),
        display_header_footer: Some(false),
        print_background: Some(options.print_background),
        scale: Some(options.scale),
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: Some(margins.top_mm / MM_PER_INCH),
        margin_bottom: Some(margins.bottom_mm / MM_PER_INCH),
        margin_left: Some(margins.left_mm / MM_PER_INCH),
        margin_right: Some(margins.right_mm / MM_PER_INCH),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Margins, PaperFormat};

    #[test]
    fn test_thrown_selector_is_a_script_error() {
        let marker = Value::String(
            r#"{"__scriptError":"SyntaxError: '[[' is not a valid selector."}"#.to_string(),
        );

        let err = script_result(scripts::STYLES_READY.to_string(), Some(marker)).unwrap_err();
        match &err {
            RenderError::ScriptError { stage, message } => {
                assert_eq!(stage, "styles-ready");
                assert!(message.contains("not a valid selector"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.recovery_suggestion().contains("selectors"));
    }

    #[test]
    fn test_script_values_pass_through() {
        assert_eq!(
            script_result("theme-ready".to_string(), Some(Value::Bool(true))).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            script_result("evaluate".to_string(), None).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_print_options_convert_to_inches() {
        let options = print_options(&PdfOptions::default());

        assert_eq!(options.paper_width, Some(8.27));
        assert_eq!(options.paper_height, Some(11.69));
        assert_eq!(options.print_background, Some(true));
        let top = options.margin_top.unwrap();
        assert!((top - 0.3937).abs() < 1e-4);
    }

    #[test]
    fn test_print_options_keep_orientation_and_scale() {
        let options = print_options(&PdfOptions {
            format: PaperFormat::Letter,
            landscape: true,
            print_background: false,
            scale: 0.8,
            margins: Margins::uniform(0.0),
        });

        assert_eq!(options.landscape, Some(true));
        assert_eq!(options.scale, Some(0.8));
        assert_eq!(options.paper_width, Some(8.5));
        assert_eq!(options.margin_left, Some(0.0));
    }
}
