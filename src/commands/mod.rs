//! Command implementations for dirlock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Each handler resolves its configuration and calls into
//! the library; stdout carries only command output.

mod acquire;
mod list;
mod release;

use crate::cli::Command;
use dirlock::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Acquire(args) => acquire::cmd_acquire(args),
        Command::Release(args) => release::cmd_release(args),
        Command::List(args) => list::cmd_list(args),
    }
}
