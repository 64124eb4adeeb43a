//! CLI argument parsing for dirlock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Args, Parser, Subcommand};
use dirlock::config::Overrides;
use std::path::PathBuf;

/// Dirlock: fair mutual exclusion through a shared directory.
///
/// Processes on any host that can see the same directory queue for a named
/// lock by dropping request files, and hold it as a lock file:
/// - `acquire` waits for its turn and prints the lock id
/// - `release` removes a lock by that id
/// - `list` shows pending requests and held locks
#[derive(Parser, Debug)]
#[command(name = "dirlock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log output on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for dirlock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Acquire the lock.
    ///
    /// Queues a request, waits until it is first in line and no lock is
    /// held, then creates the lock and prints its id on stdout.
    Acquire(AcquireArgs),

    /// Release a lock by its id.
    #[command(alias = "delete")]
    Release(ReleaseArgs),

    /// List pending requests and held locks.
    List(ListArgs),
}

/// Where the lock directory lives.
#[derive(Args, Debug)]
pub struct LocationArgs {
    /// The directory holding request and lock files [default: $HOME].
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// YAML config file providing defaults for the other options.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the `acquire` command.
#[derive(Parser, Debug)]
pub struct AcquireArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// The name to give the lock [default: default_lock].
    #[arg(short, long)]
    pub name: Option<String>,

    /// Poll interval between lock checks, in secs [default: 30].
    #[arg(short = 'i', long)]
    pub poll_interval: Option<u64>,

    /// Maximum time to wait for the lock, in secs [default: 3600].
    #[arg(short = 'w', long)]
    pub max_wait: Option<u64>,

    /// Keep a new lock even if another one appeared while creating it.
    #[arg(long)]
    pub no_verify: bool,
}

impl AcquireArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            dir: self.location.dir.clone(),
            name: self.name.clone(),
            poll_interval_secs: self.poll_interval,
            max_wait_secs: self.max_wait,
            no_verify: self.no_verify,
        }
    }
}

/// Arguments for the `release` command.
#[derive(Parser, Debug)]
pub struct ReleaseArgs {
    /// The id printed by `acquire`.
    pub id: String,

    #[command(flatten)]
    pub location: LocationArgs,
}

impl ReleaseArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            dir: self.location.dir.clone(),
            ..Overrides::default()
        }
    }
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Only show entries for this lock name.
    #[arg(short, long)]
    pub name: Option<String>,
}

impl ListArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            dir: self.location.dir.clone(),
            ..Overrides::default()
        }
    }
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_acquire_minimal() {
        let cli = Cli::try_parse_from(["dirlock", "acquire"]).unwrap();
        if let Command::Acquire(args) = cli.command {
            assert_eq!(args.overrides(), Overrides::default());
        } else {
            panic!("Expected Acquire command");
        }
    }

    #[test]
    fn parse_acquire_full() {
        let cli = Cli::try_parse_from([
            "dirlock",
            "acquire",
            "-d",
            "/shared/locks",
            "-n",
            "build",
            "-i",
            "5",
            "--max-wait",
            "60",
            "--no-verify",
            "--config",
            "dirlock.yaml",
        ])
        .unwrap();

        if let Command::Acquire(args) = cli.command {
            let overrides = args.overrides();
            assert_eq!(overrides.dir, Some(PathBuf::from("/shared/locks")));
            assert_eq!(overrides.name.as_deref(), Some("build"));
            assert_eq!(overrides.poll_interval_secs, Some(5));
            assert_eq!(overrides.max_wait_secs, Some(60));
            assert!(overrides.no_verify);
            assert_eq!(args.location.config, Some(PathBuf::from("dirlock.yaml")));
        } else {
            panic!("Expected Acquire command");
        }
    }

    #[test]
    fn parse_release_requires_id() {
        assert!(Cli::try_parse_from(["dirlock", "release"]).is_err());

        let cli = Cli::try_parse_from(["dirlock", "release", "abc123", "-d", "/locks"]).unwrap();
        if let Command::Release(args) = cli.command {
            assert_eq!(args.id, "abc123");
            assert_eq!(args.overrides().dir, Some(PathBuf::from("/locks")));
        } else {
            panic!("Expected Release command");
        }
    }

    #[test]
    fn parse_delete_alias() {
        let cli = Cli::try_parse_from(["dirlock", "delete", "abc123"]).unwrap();
        assert!(matches!(cli.command, Command::Release(_)));
    }

    #[test]
    fn parse_list_with_name() {
        let cli = Cli::try_parse_from(["dirlock", "list", "--name", "build"]).unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(args.name.as_deref(), Some("build"));
        } else {
            panic!("Expected List command");
        }
    }

    #[test]
    fn parse_verbose_is_global() {
        let cli = Cli::try_parse_from(["dirlock", "list", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
