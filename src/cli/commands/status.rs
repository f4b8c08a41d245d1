//! Status command - show lock and cache state

use crate::cache::IconCache;
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::VaultIconResult;
use crate::sync::{LockInfo, SyncLock};
use console::{style, Emoji};
use serde::Serialize;
use std::path::PathBuf;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");
static BUSY: Emoji<'_, '_> = Emoji("● ", "[BUSY] ");

#[derive(Serialize)]
struct StatusJson {
    sync_running: bool,
    lock_path: PathBuf,
    holder: Option<LockInfo>,
    holder_alive: Option<bool>,
    cache_dir: PathBuf,
    cached_icons: usize,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> VaultIconResult<()> {
    let lock = SyncLock::new(&config.sync.lock_path);
    let cache = IconCache::new(&config.icons.cache_dir, &config.icons.default_icon);

    let held = lock.try_is_held();
    let holder = if held { lock.holder() } else { None };
    let status = StatusJson {
        sync_running: held,
        lock_path: lock.path().to_path_buf(),
        holder_alive: holder.as_ref().map(LockInfo::is_holder_alive),
        holder,
        cache_dir: cache.dir().to_path_buf(),
        cached_icons: cache.cached_count()?,
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Text => print_status(&status),
    }

    Ok(())
}

fn print_status(status: &StatusJson) {
    println!("{}", style("Icon Sync Status").bold().cyan());
    println!();

    println!("{}", style("Sync:").bold());
    match (&status.holder, status.holder_alive) {
        _ if !status.sync_running => println!("  {} idle", CHECK),
        (Some(info), Some(false)) => println!(
            "  {} stale lock from pid {} (started {}) - run: vaulticon sync --force",
            WARN,
            info.pid,
            info.started_at.format("%Y-%m-%d %H:%M:%S")
        ),
        (Some(info), _) => println!(
            "  {} running (pid {}, started {})",
            BUSY,
            info.pid,
            info.started_at.format("%Y-%m-%d %H:%M:%S")
        ),
        (None, _) => println!("  {} running", BUSY),
    }
    println!("  Lock: {}", style(status.lock_path.display()).dim());

    println!();
    println!("{}", style("Cache:").bold());
    println!("  {} {} icons cached", CHECK, status.cached_icons);
    println!("  Directory: {}", style(status.cache_dir.display()).dim());
}
