use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use clap::Parser;
use futures::future::join_all;
use tracing_subscriber::fmt::init;
use validator::Validate;

use report_card_api::{
    config::Config,
    models::report_card::RenderReportCardRequest,
    services::report_card::{ReportCardJob, ReportCardService},
};

#[derive(Parser)]
#[command(name = "render-report-cards")]
#[command(about = "Render report card PDFs from JSON request files", long_about = None)]
struct Cli {
    /// Request files, one report card each
    #[arg(long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,
    /// Directory the PDFs are written to
    #[arg(long, default_value = "report-cards")]
    out_dir: PathBuf,
    /// Overrides the locale of every request
    #[arg(long)]
    locale: Option<String>,
    /// Overrides the pass mark of every request
    #[arg(long)]
    passing_score: Option<f32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    let service = Arc::new(ReportCardService::new(config.report));

    tokio::fs::create_dir_all(&cli.out_dir)
        .await
        .with_context(|| format!("Failed to create {}", cli.out_dir.display()))?;

    let renders = cli
        .input
        .iter()
        .map(|path| render_file(service.clone(), path, &cli));
    let outcomes = join_all(renders).await;

    let total = outcomes.len();
    let mut failed = 0;
    for (path, outcome) in cli.input.iter().zip(outcomes) {
        match outcome {
            Ok(written) => tracing::info!(
                input = %path.display(),
                output = %written.display(),
                "Report card written"
            ),
            Err(err) => {
                failed += 1;
                tracing::error!(input = %path.display(), "Failed to render: {:#}", err);
            }
        }
    }

    tracing::info!(total, failed, "Done");
    if failed > 0 {
        anyhow::bail!("{} of {} report cards failed", failed, total);
    }
    Ok(())
}

async fn render_file(
    service: Arc<ReportCardService>,
    path: &Path,
    cli: &Cli,
) -> anyhow::Result<PathBuf> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let request: RenderReportCardRequest =
        serde_json::from_str(&raw).context("Invalid request JSON")?;
    request.validate().context("Request failed validation")?;

    let mut job = ReportCardJob::from(request);
    if let Some(locale) = &cli.locale {
        job.options.locale = Some(locale.clone());
    }
    if let Some(passing_score) = cli.passing_score {
        job.options.passing_score = Some(passing_score);
    }

    let rendered = tokio::task::spawn_blocking(move || service.generate(&job))
        .await
        .context("Render task panicked")??;

    let output = cli.out_dir.join(&rendered.filename);
    tokio::fs::write(&output, &rendered.bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(output)
}
