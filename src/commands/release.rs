//! Implementation of the `dirlock release` command.

use crate::cli::ReleaseArgs;
use dirlock::config::Config;
use dirlock::error::{LockError, Result};
use dirlock::release::release;

/// Execute the `dirlock release` command.
pub fn cmd_release(args: ReleaseArgs) -> Result<()> {
    if args.id.trim().is_empty() {
        return Err(LockError::UserError(
            "please give one argument: the id of the lock".to_string(),
        ));
    }

    let config = Config::resolve(args.location.config.as_deref(), &args.overrides())?;
    release(&config.dir, &args.id)?;
    Ok(())
}
