//! Implementation of the `dirlock acquire` command.

use crate::cli::AcquireArgs;
use dirlock::acquire;
use dirlock::config::Config;
use dirlock::error::Result;
use tracing::info;

/// Execute the `dirlock acquire` command.
///
/// On success the lock id is the only thing written to stdout, so scripts
/// can capture it for a later `dirlock release`.
pub fn cmd_acquire(args: AcquireArgs) -> Result<()> {
    let config = Config::resolve(args.location.config.as_deref(), &args.overrides())?;
    let options = config.acquire_options();

    info!(
        dir = %options.dir.display(),
        name = %options.name,
        poll_interval_secs = config.poll_interval_secs,
        max_wait_secs = config.max_wait_secs,
        "acquiring lock"
    );

    let lock = acquire::acquire(options)?;
    println!("{}", lock.id());
    Ok(())
}
