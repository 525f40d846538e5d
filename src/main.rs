use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_transcript_dl::cli::{Cli, Commands, OutputFormat};
use yt_transcript_dl::config::Config;
use yt_transcript_dl::pipeline::{PipelineOptions, TranscriptPipeline, UrlOutcome};
use yt_transcript_dl::title::WatchPageTitleResolver;
use yt_transcript_dl::transcript::YoutubeTranscriptService;
use yt_transcript_dl::utils;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "yt_transcript_dl=debug,yt_transcript=debug"
    } else {
        "yt_transcript_dl=info,yt_transcript=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Fetch {
            urls,
            output_dir,
            language,
            format,
        } => {
            let config = Config::load(cli.config.as_deref())?;

            let mut options = PipelineOptions::from_config(&config);
            if let Some(dir) = output_dir {
                options.output_dir = dir;
            }
            if let Some(language) = language {
                options.language = language;
            }
            if let Some(format) = format {
                options.format = format.to_string();
            }

            let client = utils::build_http_client(&config)?;
            let base_url = config.base_url()?;
            let pipeline = TranscriptPipeline::new(
                options,
                Arc::new(WatchPageTitleResolver::new(client.clone(), base_url.clone())),
                Arc::new(YoutubeTranscriptService::new(client, base_url)),
            )
            .with_progress(progress_bar(cli.quiet)?);

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, finishing the current URL");
                    on_interrupt.cancel();
                }
            });

            tracing::info!("Starting transcript download for {} URL(s)", urls.len());
            let outcomes = pipeline.download_all(&urls, &cancel).await;

            return Ok(report(&outcomes));
        }
        Commands::Config { show, init } => {
            let path = match cli.config {
                Some(path) => path,
                None => Config::config_path()?,
            };

            if init {
                if path.exists() {
                    anyhow::bail!("Config file already exists: {}", path.display());
                }
                Config::default().save(&path)?;
                println!("Default configuration written to: {}", path.display());
            } else {
                let config = if path.exists() {
                    Config::load_from(&path)?
                } else {
                    Config::default()
                };
                config.display();
                if !show {
                    println!();
                    println!("Edit the config file to change these settings:");
                    println!("  {}", path.display());
                }
            }
        }
        Commands::Formats => {
            println!("Supported formats:");
            for format in OutputFormat::ALL {
                println!("  • {:<5} (.{})", format.to_string(), format.extension());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn progress_bar(quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos}/{len} {msg}")
            .context("Invalid progress template")?,
    );
    progress.enable_steady_tick(std::time::Duration::from_millis(120));
    Ok(progress)
}

/// Print one line per URL plus a summary; failure if any URL failed
fn report(outcomes: &[UrlOutcome]) -> ExitCode {
    for outcome in outcomes {
        match &outcome.result {
            Ok(path) => println!(
                "{} Transcript downloaded successfully to: {}",
                style("✓").green(),
                path.display()
            ),
            Err(e) => println!("{} {}: {}", style("✗").red(), outcome.url, e),
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    let written = outcomes.len() - failed;
    println!(
        "{} written, {} failed",
        style(written).green().bold(),
        style(failed).red().bold()
    );

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
