use crate::cli::HistoryCommand;
use crate::error::{CemtrasError, Result};
use crate::history::ChatHistoryStore;
use crate::storage::ChatHistoryRecord;
use colored::Colorize;
use prettytable::{format, Table};

const TITLE_COLUMN_CHARS: usize = 40;

/// Handle history commands
pub fn handle_history(command: HistoryCommand, history: &ChatHistoryStore) -> Result<()> {
    match command {
        HistoryCommand::List => {
            let records = history.list()?;

            if records.is_empty() {
                println!("{}", "No conversation history found.".yellow());
                return Ok(());
            }

            println!("\nConversation History:");
            build_table(&records).printstd();
            println!();
            println!(
                "Use {} to resume a conversation.",
                "cemtras chat --resume <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id } => {
            let record = require_record(history, &id)?;
            println!(
                "\n{} {}  ({} messages)\n",
                record.role.colored_tag(),
                record.title.bold(),
                record.messages.len()
            );
            for message in &record.messages {
                super::print_message(message);
            }
        }
        HistoryCommand::Delete { id } => {
            let record = require_record(history, &id)?;
            history.delete(&record.id)?;
            println!("{}", format!("Deleted conversation {}", short_id(&record.id)).green());
        }
        HistoryCommand::Clear => {
            let count = history.list()?.len();
            history.clear()?;
            println!("{}", format!("Deleted {} conversation(s)", count).green());
        }
    }

    Ok(())
}

/// Look up a record by id or prefix, failing if there is none
pub fn require_record(history: &ChatHistoryStore, id: &str) -> Result<ChatHistoryRecord> {
    history.resolve(id)?.ok_or_else(|| {
        CemtrasError::Storage(format!("No conversation matches '{}'", id)).into()
    })
}

/// Listing table: short id, title, persona, message count, last update
pub fn build_table(records: &[ChatHistoryRecord]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Role".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for record in records {
        let summary = record.summary();
        let updated = summary
            .last_updated
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();

        table.add_row(prettytable::row![
            short_id(&summary.id).cyan(),
            truncate_title(&summary.title),
            summary.role.as_str(),
            summary.message_count,
            updated
        ]);
    }

    table
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_COLUMN_CHARS {
        let head: String = title.chars().take(TITLE_COLUMN_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}
