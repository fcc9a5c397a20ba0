use crate::domain::model::PdfOptions;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub trait Storage: Send + Sync {
    /// Where `name` ends up once written.
    fn locate(&self, name: &str) -> PathBuf;
    fn write_file(
        &self,
        name: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;
}

/// Fetches the raw SVG text of the social icon.
pub trait IconSource: Send + Sync {
    fn fetch_svg(&self) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// A single browser tab. Dropping the session must release the browser.
#[async_trait]
pub trait PageSession: Send {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<()>;

    /// Evaluates an expression in the page and returns its primitive value
    /// (`Null` for `undefined` and objects).
    async fn evaluate(&mut self, expression: &str) -> Result<serde_json::Value>;

    async fn print_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: PageSession;

    async fn launch(&self) -> Result<Self::Session>;
}
