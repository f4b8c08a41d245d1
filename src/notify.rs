//! Fire-and-forget user notifications
//!
//! Delivery is the host's business; the engine only needs a one-shot
//! `notify` with no acknowledgement.

use console::style;
use tracing::info;

/// Notification sink
pub trait Notifier: Send + Sync {
    fn notify(&self, summary: &str, body: &str);
}

/// Prints notifications to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, summary: &str, body: &str) {
        info!(summary, body, "notification");
        println!("{} {} {}", style("●").cyan(), style(summary).bold(), body);
    }
}

/// Records notifications in the log only, keeping stdout machine-readable
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, summary: &str, body: &str) {
        info!(summary, body, "notification");
    }
}

/// Messages sent around a sync run
pub mod messages {
    pub const SYNC_STARTED: (&str, &str) = ("Syncing icons", "Beginning icon sync.");
    pub const SYNC_RUNNING: (&str, &str) =
        ("Icons already syncing", "Sync is currently in progress.");
    pub const SYNC_COMPLETE: (&str, &str) =
        ("Sync complete", "Icons have been synced with the vault.");
}
