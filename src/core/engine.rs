use crate::core::icon::IconGlyph;
use crate::core::procedure::generate_pdf;
use crate::domain::model::{JobReport, RenderJob, RenderSettings, RunReport};
use crate::domain::ports::{BrowserLauncher, IconSource, PageSession, Storage};
use crate::utils::error::{RenderError, Result};
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;
use std::time::Instant;
use url::Url;

/// Renders each job in turn with a fresh browser.
pub struct ResumeEngine<L, I, S>
where
    L: BrowserLauncher,
    I: IconSource,
    S: Storage,
{
    launcher: L,
    icons: I,
    storage: S,
    settings: RenderSettings,
    monitor: SystemMonitor,
}

impl<L, I, S> ResumeEngine<L, I, S>
where
    L: BrowserLauncher,
    I: IconSource,
    S: Storage,
{
    pub fn new(launcher: L, icons: I, storage: S, settings: RenderSettings) -> Self {
        Self::new_with_monitoring(launcher, icons, storage, settings, false)
    }

    pub fn new_with_monitoring(
        launcher: L,
        icons: I,
        storage: S,
        settings: RenderSettings,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            launcher,
            icons,
            storage,
            settings,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Runs every job sequentially. The first failing job aborts the run;
    /// files already written by earlier jobs are kept.
    pub async fn run(&self, jobs: &[RenderJob]) -> Result<RunReport> {
        let started_at = Utc::now();
        let source_url = self.source_url()?;
        tracing::info!("📄 Source page: {}", source_url);

        let glyph = self.load_glyph().await;

        let mut reports = Vec::with_capacity(jobs.len());
        for job in jobs {
            tracing::info!("🔄 Generating PDF with {} theme...", job.theme);
            let report = self.run_job(&source_url, job, glyph.as_ref()).await?;
            tracing::info!("✅ PDF created: {}", report.output_path);
            self.monitor.log_stats(&format!("{} theme", job.theme));
            reports.push(report);
        }

        self.monitor.log_final_stats();
        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            jobs: reports,
        })
    }

    /// `file://` URL of the source page. Fails before anything is launched
    /// when the page does not exist.
    fn source_url(&self) -> Result<Url> {
        let source = &self.settings.page.source;
        let missing = || RenderError::InputNotFound {
            path: source.display().to_string(),
        };

        if !source.is_file() {
            return Err(missing());
        }
        let absolute = std::fs::canonicalize(source)?;
        Url::from_file_path(&absolute).map_err(|_| missing())
    }

    /// Downloads and parses the icon once per run. Any failure leaves the
    /// page icon untouched.
    async fn load_glyph(&self) -> Option<IconGlyph> {
        if !self.settings.icon.enabled {
            tracing::debug!("Icon replacement disabled");
            return None;
        }

        match self.icons.fetch_svg().await {
            Ok(svg) => match IconGlyph::parse_svg(&svg) {
                Ok(glyph) => Some(glyph),
                Err(e) => {
                    tracing::warn!("⚠️ Failed to parse icon, keeping page icon: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("⚠️ Failed to load icon, keeping page icon: {}", e);
                None
            }
        }
    }

    async fn run_job(
        &self,
        source_url: &Url,
        job: &RenderJob,
        glyph: Option<&IconGlyph>,
    ) -> Result<JobReport> {
        let started = Instant::now();

        let mut session = self.launcher.launch().await?;
        let rendered = generate_pdf(&mut session, &self.settings, source_url, job, glyph).await;
        // Closing errors only matter when the render itself succeeded.
        let closed = session.close().await;
        drop(session);
        let rendered = rendered?;
        closed?;

        let output_path = self.storage.write_file(&job.output, &rendered.pdf).await?;

        Ok(JobReport {
            theme: job.theme,
            output_path: output_path.display().to_string(),
            bytes: rendered.pdf.len(),
            icon: rendered.icon,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}
