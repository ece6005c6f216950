use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use console::Style;
use indicatif::MultiProgress;
use tracing::Level;

use hub_import::cli::Cli;
use hub_import::error::ImportError;
use hub_import::hub::HubClient;
use hub_import::orchestrator::BatchOrchestrator;
use hub_import::telemetry::init_tracing;
use hub_import::ui::{self, ConsoleProgress};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let multi = MultiProgress::new();
    init_tracing(cli.json_logs, level, &multi);

    match run(&cli, multi).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let red = Style::new().red().bold();
            eprintln!("{} {e:#}", red.apply_to("✗"));
            if e
                .downcast_ref::<ImportError>()
                .is_some_and(ImportError::is_configuration)
            {
                eprintln!("Run `hub-import --help` for usage.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, multi: MultiProgress) -> Result<()> {
    let config = cli.run_config()?;
    let client = HubClient::new(&config)?;
    let mut progress = ConsoleProgress::with_multi(multi);

    let report = BatchOrchestrator::new(&client, &client)
        .run(&config, &mut progress)
        .await?;

    ui::print_summary(&report);

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "report written");
    }
    Ok(())
}
