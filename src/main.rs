mod cli;
mod config;
mod error;
mod model;
mod source;
mod store;
mod sync;
#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::error;

use source::jira::JiraSource;
use store::notion::NotionStore;
use sync::RunOptions;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run_sync(args: cli::CliArgs) -> Result<u8> {
    let config = config::load_config()?;

    let source = JiraSource::new(&config.jira, config.query.clone());
    let store = NotionStore::new(&config.notion);

    let report = sync::run(
        &source,
        &store,
        &config,
        RunOptions {
            dry_run: args.dry_run,
        },
    )
    .await;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
        println!("{json}");
    }

    Ok(report.outcome.exit_code())
}

#[tokio::main]
async fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match cli::parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    init_logging();

    match run_sync(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
