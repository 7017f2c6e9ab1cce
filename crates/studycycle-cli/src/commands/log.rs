use clap::Subcommand;
use studycycle_core::storage::Database;
use studycycle_core::LogEntry;

use super::timer::format_clock;

#[derive(Subcommand)]
pub enum LogAction {
    /// List log entries, most recent first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set or replace the comment on an entry
    Comment { id: String, text: String },
    /// Remove an entry
    Rm { id: String },
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        LogAction::List { json } => {
            let entries = db.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("no study sessions logged yet");
            } else {
                for entry in &entries {
                    print_entry(entry);
                }
            }
        }
        LogAction::Comment { id, text } => {
            db.update_comment(&id, &text)?;
            println!("ok");
        }
        LogAction::Rm { id } => {
            db.remove(&id)?;
            println!("ok");
        }
    }

    Ok(())
}

fn print_entry(entry: &LogEntry) {
    println!(
        "{}  {}  set {}  {}  {}",
        entry.id,
        entry.started_at.format("%Y-%m-%d %H:%M"),
        entry.set_number,
        format_clock(entry.duration_secs),
        entry.comment,
    );
}
