//! pagebind - Assemble PDFs and images into a single PDF, page by page.

mod cli;

use clap::Parser;
use std::future::Future;
use std::process;
use std::sync::Arc;

use crate::cli::Cli;
use pagebind::config::{Config, OverwriteMode};
use pagebind::error::PageBindError;
use pagebind::export::{ExportOptions, ExportProgress, ExportStatistics, ProgressCallback};
use pagebind::output::{
    OutputFormatter, display_export_statistics, display_ingest_report, display_plan,
    display_thumbnail_report, plan_json,
};
use pagebind::session::{ExportHandle, Session};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        OutputFormatter::default().error(&format!("Error: {err}"));
        process::exit(err.exit_code());
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "pagebind=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Main application logic.
async fn run(mut cli: Cli) -> Result<(), PageBindError> {
    cli.inputs = cli.get_all_inputs().await?;
    let config = cli.to_config()?;

    let formatter = formatter_for(&cli, &config);
    formatter.section(&format!("{} v{}", pagebind::NAME, pagebind::VERSION));

    let mut session = Session::new(config.thumbnail_size);

    formatter.info(&format!("Reading {} file(s)...", config.inputs.len()));
    let report = session
        .add_files(
            &config.inputs,
            config.effective_jobs(),
            config.continue_on_error,
        )
        .await?;
    display_ingest_report(&formatter, &report);

    if !config.edits.is_empty() {
        session.apply_edits(&config.edits)?;
        formatter.debug(&format!("Applied {} edit(s)", config.edits.len()));
    }

    if let Some(ref dir) = config.thumbnail_dir {
        let thumbnails = session
            .write_thumbnails(dir, config.effective_jobs())
            .await?;
        display_thumbnail_report(&formatter, &thumbnails);
    }

    if cli.json {
        println!("{}", plan_json(&session.snapshot())?);
        return Ok(());
    }

    if config.dry_run {
        display_plan(&formatter, &session.snapshot());
        formatter.success("Dry run completed");
        formatter.info(&format!("  Output would be: {}", config.output.display()));
        return Ok(());
    }

    if formatter.is_verbose() {
        display_plan(&formatter, &session.snapshot());
    }

    handle_output_overwrite(&config, &formatter).await?;

    formatter.info(&format!("Writing to: {}", config.output.display()));
    let progress = progress_callback(&formatter);
    let handle = session.spawn_export(
        config.output.clone(),
        ExportOptions::from(&config),
        Some(progress),
    );

    let stats = finish_export(handle, tokio::signal::ctrl_c(), &formatter).await?;

    display_export_statistics(&formatter, &stats);
    formatter.success(&format!("Created {}", config.output.display()));

    Ok(())
}

/// Stdout carries only the JSON document with `--json`, so every other
/// message is silenced.
fn formatter_for(cli: &Cli, config: &Config) -> OutputFormatter {
    if cli.json {
        OutputFormatter::quiet()
    } else {
        OutputFormatter::from_config(config)
    }
}

/// Wait for a running export. When `interrupt` fires first the export is
/// cancelled and still awaited, so the reported outcome is the one on disk.
async fn finish_export<F>(
    handle: ExportHandle,
    interrupt: F,
    formatter: &OutputFormatter,
) -> Result<ExportStatistics, PageBindError>
where
    F: Future<Output = std::io::Result<()>>,
{
    let cancel = handle.cancel_token();
    let wait = handle.wait();
    tokio::pin!(wait);

    let finished = tokio::select! {
        result = &mut wait => Some(result),
        signal = interrupt => {
            if let Err(err) = signal {
                tracing::warn!(error = %err, "cannot listen for interrupts");
            } else {
                cancel.cancel();
                formatter.warning("Interrupted, stopping export...");
            }
            None
        }
    };

    let result = match finished {
        Some(result) => result,
        None => wait.await,
    };

    match result {
        Err(PageBindError::Cancelled) => {
            formatter.warning("Interrupted, output not written");
            Err(PageBindError::Cancelled)
        }
        Ok(stats) if cancel.is_cancelled() => {
            formatter.warning("Interrupted after the output was already written");
            Ok(stats)
        }
        other => other,
    }
}

/// Per-page progress counter on stdout.
fn progress_callback(formatter: &OutputFormatter) -> ProgressCallback {
    let formatter = formatter.clone();
    Arc::new(move |progress: ExportProgress| {
        formatter.progress(progress.done, progress.total, &format!("page {}", progress.id));
    })
}

/// Handle output file overwrite scenarios.
async fn handle_output_overwrite(
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<(), PageBindError> {
    if !tokio::fs::try_exists(&config.output).await.unwrap_or(false) {
        return Ok(());
    }

    match config.overwrite_mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(PageBindError::output_exists(config.output.clone())),
        OverwriteMode::Prompt => {
            // No one to ask in quiet mode.
            if formatter.is_quiet() {
                return Err(PageBindError::output_exists(config.output.clone()));
            }

            formatter.warning(&format!(
                "Output file already exists: {}",
                config.output.display()
            ));

            let answer = tokio::task::spawn_blocking(|| {
                use std::io::{self, Write};
                print!("Overwrite? [y/N]: ");
                io::stdout().flush().ok();

                let mut response = String::new();
                io::stdin().read_line(&mut response).map(|_| response)
            })
            .await
            .map_err(|err| PageBindError::other(format!("Prompt failed: {err}")))?
            .map_err(|err| PageBindError::other(format!("Failed to read input: {err}")))?;

            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => Ok(()),
                _ => Err(PageBindError::Cancelled),
            }
        }
    }
}
