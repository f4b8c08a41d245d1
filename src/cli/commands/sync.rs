//! Sync command - fetch icons for every vault entry

use crate::cli::args::{OutputFormat, SyncArgs};
use crate::config::Config;
use crate::entries::CommandEntrySource;
use crate::error::VaultIconResult;
use crate::notify::{messages, ConsoleNotifier, LogNotifier, Notifier};
use crate::sync::{self, SyncLock, SyncReport};
use console::style;
use std::sync::Arc;
use tracing::debug;

/// Execute the sync command
pub async fn execute(args: SyncArgs, config: &Config) -> VaultIconResult<()> {
    let notifier: Arc<dyn Notifier> = match args.format {
        OutputFormat::Text => Arc::new(ConsoleNotifier),
        OutputFormat::Json => Arc::new(LogNotifier),
    };
    let lock = SyncLock::new(&config.sync.lock_path);

    if args.force && lock.break_stale()? {
        debug!("Cleared stale lock before sync");
    }

    if lock.try_is_held() {
        let (summary, body) = messages::SYNC_RUNNING;
        notifier.notify(summary, body);
        return Ok(());
    }

    let orchestrator = sync::from_config(config, Arc::clone(&notifier))?;
    let entries = CommandEntrySource::from_command(&config.entries.command)?;

    let (summary, body) = messages::SYNC_STARTED;
    notifier.notify(summary, body);

    let report = orchestrator.sync(&entries).await?;

    match args.format {
        OutputFormat::Text => print_summary(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn print_summary(report: &SyncReport) {
    let elapsed = report.finished_at - report.started_at;

    for entry in report.outcomes.iter().filter(|e| e.outcome.is_failure()) {
        println!(
            "  {} {}: {}",
            style("✗").red(),
            style(&entry.id).cyan(),
            entry.outcome
        );
    }

    println!(
        "{} {} saved, {} cached, {} failed ({:.1}s)",
        style("✓").green(),
        report.saved(),
        report.cached(),
        report.failed(),
        elapsed.num_milliseconds() as f64 / 1000.0
    );
}
