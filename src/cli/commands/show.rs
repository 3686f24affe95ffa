//! Show command - inspect one stored record

use crate::checksum::Checksum;
use crate::cli::args::{OutputFormat, ShowArgs};
use crate::config::Config;
use crate::error::{FileProcessorError, FileProcessorResult};
use crate::record::{DerivationRecord, RecordState};
use crate::store::create_stores;
use crate::ui::{self, UiContext};

/// Execute the show command
pub async fn execute(args: ShowArgs, config: &Config) -> FileProcessorResult<()> {
    let checksum = Checksum::parse(&args.checksum)?;
    let (records, blobs) = create_stores(&config.storage)?;

    let record = records
        .get(&checksum)
        .await?
        .ok_or_else(|| FileProcessorError::NotFound(format!("record {}", checksum)))?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&record_json(&record)?)?);
        }
        OutputFormat::Plain => {
            if let Some(output) = record.output() {
                println!("{}", output);
            }
        }
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::intro(&ctx, &format!("Record {}", record.checksum()));
            ui::key_value_status(
                &ctx,
                "state",
                &record.state().to_string(),
                record.state() == RecordState::Preprocessed,
            );
            ui::key_value(&ctx, "instructions", record.instructions());
            ui::key_value(
                &ctx,
                "created",
                &record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            );
            if let Some(processed_at) = record.processed_at() {
                ui::key_value(
                    &ctx,
                    "processed",
                    &processed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                );
            }
            if let Some(file) = record.materialized_file() {
                ui::key_value(&ctx, "file", &blobs.url_for(file));
            }
            if let Some(output) = record.output() {
                ui::key_value(&ctx, "output", output);
            }
        }
    }

    Ok(())
}

/// Record JSON with its derived state alongside the stored fields
pub(crate) fn record_json(record: &DerivationRecord) -> FileProcessorResult<serde_json::Value> {
    let mut value = serde_json::to_value(record)?;
    if let Some(map) = value.as_object_mut() {
        map.insert(
            "state".to_string(),
            serde_json::Value::String(record.state().to_string()),
        );
    }
    Ok(value)
}
