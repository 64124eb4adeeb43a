//! Implementation of the `dirlock list` command.

use crate::cli::ListArgs;
use dirlock::config::Config;
use dirlock::entry::{Entry, EntryKind, format_age, list_entries, sanitize_field};
use dirlock::error::Result;

/// Execute the `dirlock list` command.
pub fn cmd_list(args: ListArgs) -> Result<()> {
    let config = Config::resolve(args.location.config.as_deref(), &args.overrides())?;

    let mut entries = list_entries(&config.dir);
    if let Some(name) = &args.name {
        entries = entries.with_name(&sanitize_field(name));
    }

    let locks = entries.clone().with_kind(EntryKind::Lock).into_sorted();
    let requests = entries.with_kind(EntryKind::Request).into_sorted();

    if locks.is_empty() && requests.is_empty() {
        println!("No locks or requests in {}.", config.dir.display());
        return Ok(());
    }

    print_section("Held locks", &locks);
    print_section("Pending requests (oldest first)", &requests);
    Ok(())
}

fn print_section(title: &str, entries: &[Entry]) {
    if entries.is_empty() {
        return;
    }

    println!("{} ({}):", title, entries.len());
    println!();

    for entry in entries {
        println!("  {}:", entry.name());
        println!("    Node:       {}", entry.node());
        println!("    Id:         {}", entry.id());
        println!("    Age:        {}", format_age(entry.age()));
        if let Some(meta) = entry.metadata() {
            println!("    Owner:      {}", meta.owner);
            if let Some(pid) = meta.pid {
                println!("    PID:        {}", pid);
            }
        }
        println!("    Path:       {}", entry.path().display());
        println!();
    }
}
