use clap::Parser;
use resume_pdf::utils::{logger, validation::Validate};
use resume_pdf::{
    CdnIconSource, ChromeLauncher, CliConfig, LocalStorage, RenderError, RenderJob, ResumeEngine,
    RunReport, TomlConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting resume-pdf");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let (config, jobs) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let settings = config.render_settings();

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No browser will be launched");
        display_plan(&config, &jobs, &cli);
        return Ok(());
    }

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let icons = CdnIconSource::new(settings.icon.url.clone(), settings.icon.fetch_timeout)?;
    let launcher = ChromeLauncher::new(settings.browser.clone());
    let storage = LocalStorage::new(cli.output_dir.clone());
    let engine = ResumeEngine::new_with_monitoring(launcher, icons, storage, settings, cli.monitor);

    match engine.run(&jobs).await {
        Ok(report) => {
            tracing::info!("✅ All PDF files created successfully!");
            print_report(&report, cli.json)?;
        }
        Err(e) => {
            tracing::error!(
                "❌ PDF generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            std::process::exit(e.exit_code().unwrap_or(1));
        }
    }

    Ok(())
}

fn prepare(cli: &CliConfig) -> Result<(TomlConfig, Vec<RenderJob>), RenderError> {
    cli.validate()?;
    let config = cli.load()?;
    config.validate()?;
    let jobs = cli.select_jobs(&config)?;
    Ok((config, jobs))
}

fn display_plan(config: &TomlConfig, jobs: &[RenderJob], cli: &CliConfig) {
    let settings = config.render_settings();
    println!("📋 Render Plan:");
    println!("  Source: {}", settings.page.source.display());
    println!("  Output directory: {}", cli.output_dir);
    if settings.icon.enabled {
        println!("  Icon: {}", settings.icon.url);
    } else {
        println!("  Icon: disabled");
    }
    println!(
        "  Paper: {:?}, margins {}mm/{}mm/{}mm/{}mm",
        settings.pdf.format,
        settings.pdf.margins.top_mm,
        settings.pdf.margins.right_mm,
        settings.pdf.margins.bottom_mm,
        settings.pdf.margins.left_mm
    );
    for job in jobs {
        let assets = settings.page.assets(job.theme);
        println!("  - {} theme (avatar {}) -> {}", job.theme, assets.avatar, job.output);
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for job in &report.jobs {
        println!("✅ PDF created: {} ({} bytes)", job.output_path, job.bytes);
    }
    println!(
        "✅ All PDF files created in {} ms",
        (report.finished_at - report.started_at).num_milliseconds()
    );
    Ok(())
}
