//! List command - show stored records

use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::FileProcessorResult;
use crate::record::{DerivationRecord, RecordState};
use crate::store::create_stores;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the list command
pub async fn execute(args: ListArgs, config: &Config) -> FileProcessorResult<()> {
    let (records, _) = create_stores(&config.storage)?;
    let records = records.list().await?;

    if records.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No stored records");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&records),
        OutputFormat::Json => print_json(&records)?,
        OutputFormat::Plain => print_plain(&records),
    }

    Ok(())
}

fn print_table(records: &[DerivationRecord]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Records");

    println!(
        "{:<42} {:<13} {:<17} {:<30}",
        style("CHECKSUM").bold(),
        style("STATE").bold(),
        style("CREATED").bold(),
        style("INSTRUCTIONS").bold()
    );
    println!("{}", "-".repeat(104));

    for record in records {
        let state_styled = match record.state() {
            RecordState::Preprocessed => style("preprocessed").green(),
            RecordState::Processed => style("processed").cyan(),
            RecordState::Stored => style("stored").yellow(),
            RecordState::New => style("new").dim(),
        };

        let created = record.created_at.format("%Y-%m-%d %H:%M").to_string();

        println!(
            "{:<42} {:<13} {:<17} {:<30}",
            record.checksum().as_str(),
            state_styled,
            created,
            truncate(record.instructions(), 30)
        );
    }

    println!();
    println!("{} record(s)", records.len());
}

fn print_json(records: &[DerivationRecord]) -> FileProcessorResult<()> {
    let values = records
        .iter()
        .map(super::show::record_json)
        .collect::<FileProcessorResult<Vec<_>>>()?;
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}

fn print_plain(records: &[DerivationRecord]) {
    for record in records {
        println!("{}", record.checksum());
    }
}

/// Single-line preview of instructions, at most `max` characters
fn truncate(s: &str, max: usize) -> String {
    let line = s.lines().next().unwrap_or("");
    if line.chars().count() <= max && line.len() == s.len() {
        return line.to_string();
    }
    let mut out: String = line.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
