mod audit;
mod config;
mod identity;
mod system_info;
#[cfg(test)]
mod test_support;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use clap::Parser;
use platform_windows::NetSessionProbe;
use posture::{Platform, SecurityReport, SystemQuery};
use report_client::{BackendRejection, Client, ReportRow};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use audit::{run_audit, status_lines};
use config::{AuditConfig, CliOverrides};
use identity::{resolve_user_id, Unverified};

/// Check disk encryption, antivirus and screen lock, then report them.
#[derive(Debug, Parser)]
#[command(name = "posture-audit", version)]
struct Args {
    /// Print the report as JSON instead of sending it.
    #[arg(long)]
    dry_run: bool,

    /// Wait for Enter before exiting.
    #[arg(long)]
    wait: bool,

    /// Config file to load instead of the default locations.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = AuditConfig::load(&CliOverrides {
        dry_run: args.dry_run,
        wait_for_enter: args.wait,
        config_path: args.config,
    })?;

    let backend = config.backend_settings()?;
    let platform = Platform::current()?;
    let client = backend.map(Client::new).transpose()?;
    let query = SystemQuery::new(platform, config.query_options())?;
    info!(
        platform = %platform,
        dry_run = config.dry_run,
        config_file = ?config.config_file,
        "posture audit started"
    );

    println!("Checking system security...");

    let user_id = resolve_run_user_id(&config, client.as_ref()).await?;

    let elevation = NetSessionProbe::new(Duration::from_secs(config.command_timeout_secs));
    let battery_policy = config.battery_policy;
    let findings = tokio::task::spawn_blocking(move || {
        run_audit(platform, &query, elevation, battery_policy)
    })
    .await
    .context("posture detection task failed")?;

    let device_id = config
        .device_id
        .clone()
        .or_else(|| findings.device_serial.clone())
        .context("could not determine a device identifier")?;

    let report = SecurityReport::from_outcomes(&findings.outcomes, &findings.os, SystemTime::now());
    for line in status_lines(&findings.outcomes) {
        println!("{}", line);
    }

    match client.as_ref().filter(|_| !config.dry_run) {
        Some(client) => match client.upsert_report(&user_id, &device_id, &report).await {
            Ok(()) => println!("Report sent successfully."),
            Err(err) => print_upload_failure(&err),
        },
        None => {
            let row = ReportRow {
                user_id: &user_id,
                device_id: &device_id,
                report: &report,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&row).context("failed serializing security report")?
            );
        }
    }

    if config.wait_for_enter {
        wait_for_enter();
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn resolve_run_user_id(config: &AuditConfig, client: Option<&Client>) -> Result<String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    match client.filter(|_| !config.dry_run) {
        Some(client) => resolve_user_id(config, client, true, &mut input, &mut output).await,
        None => resolve_user_id(config, &Unverified, false, &mut input, &mut output).await,
    }
}

fn print_upload_failure(err: &anyhow::Error) {
    warn!(error = %format!("{:#}", err), "report upload failed");
    match err.downcast_ref::<BackendRejection>() {
        Some(rejection) => {
            eprintln!("Error sending report: {}", rejection.message);
            if let Some(details) = &rejection.details {
                eprintln!("Error details: {}", details);
            }
            if let Some(hint) = &rejection.hint {
                eprintln!("Hint: {}", hint);
            }
        }
        None => eprintln!("Error sending report: {:#}", err),
    }
}

fn wait_for_enter() {
    print!("Press Enter to close...");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
