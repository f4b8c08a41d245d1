//! Icon command - print the icon to display for an entry

use crate::cache::IconCache;
use crate::cli::args::IconArgs;
use crate::config::Config;
use crate::entries::EntryId;
use crate::error::VaultIconResult;

/// Execute the icon command
///
/// Never fails for a missing icon: the default icon path is printed instead.
pub async fn execute(args: IconArgs, config: &Config) -> VaultIconResult<()> {
    let cache = IconCache::new(&config.icons.cache_dir, &config.icons.default_icon);

    let path = match EntryId::new(args.entry) {
        Ok(id) => cache.resolve(&id),
        Err(_) => cache.default_icon().to_path_buf(),
    };

    println!("{}", path.display());
    Ok(())
}
