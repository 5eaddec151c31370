mod bootstrap;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use report_core::settings::{Command, Settings};
use report_core::time_utils::{DateContext, TimezoneHandler};
use report_data::reader;
use report_runtime::activity_log::ActivityLog;
use report_runtime::batch::{self, OverdueSession};
use report_ui::app::App;
use report_ui::html;
use report_ui::report::OverdueReport;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(
        &settings.log_level,
        settings.log_file.as_ref(),
        settings.uses_tui(),
    )?;

    tracing::info!("sheet-report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Theme: {}, Timezone: {}, Log level: {}",
        settings.theme,
        settings.timezone,
        settings.log_level
    );

    let timezone = TimezoneHandler::new(&settings.timezone);
    let files = reader::expand_inputs(settings.files());
    if files.is_empty() {
        anyhow::bail!("no spreadsheet files found in the given paths");
    }
    tracing::info!(count = files.len(), "input files resolved");

    match &settings.command {
        Command::Crq { output, .. } => {
            let output = output
                .clone()
                .unwrap_or_else(report_core::settings::default_crq_output);
            run_crq(&files, &output, timezone).await?;
        }
        Command::Overdue { no_tui, json, .. } => {
            let mut session = OverdueSession::new(ActivityLog::new(timezone));
            session.select_files(files);

            if *json || *no_tui {
                session.run().await;
                let report = OverdueReport::from_session(&session);
                if *json {
                    println!("{}", report.to_json()?);
                } else {
                    print!("{}", report.to_text());
                }
            } else {
                let app = App::new(&settings.theme, session);
                tokio::select! {
                    result = app.run() => result?,
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Ctrl+C received; shutting down");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn run_crq(files: &[PathBuf], output: &Path, timezone: TimezoneHandler) -> Result<()> {
    let ctx = DateContext::from_handler(&timezone);
    let mut log = ActivityLog::new(timezone);
    let batch = batch::process_crq_files(files, ctx, &mut log).await;

    html::write_report(output, &batch)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Arquivos processados com sucesso: {} · Arquivos com erro: {}",
        batch.success_count(),
        batch.error_count()
    );
    for line in log.error_lines() {
        eprintln!("{line}");
    }
    println!("Relatório gerado em {}", output.display());
    Ok(())
}
