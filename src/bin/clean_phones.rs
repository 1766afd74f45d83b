use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use serde_json::Value;

use grab::phone::clean_records;
use grab::store::{RecordStore, StoreMode};

/// Remove entries that are not real phone numbers from a JSON file of companies.
#[derive(Parser)]
#[command(name = "clean_phones")]
struct Cli {
    /// JSON array of company records
    input_file: PathBuf,

    /// Where to write the result (default: overwrite the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report what would be removed without writing anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    grab::init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    println!("Loading {}...", cli.input_file.display());
    let mut records = load_records(&cli.input_file)?;
    println!("Loaded {} companies", records.len());

    println!("Cleaning phone numbers...");
    let summary = clean_records(&mut records);
    for record in &summary.records {
        for phone in &record.removed {
            println!("Removed '{}' from '{}'", display_value(phone), record.company);
        }
    }

    println!("\nResults:");
    println!("- Companies processed: {}", summary.processed_companies);
    println!("- Invalid numbers removed: {}", summary.removed_numbers);

    if cli.dry_run {
        println!("Dry run: nothing written");
        return Ok(());
    }

    let output = cli.output.as_deref().unwrap_or(cli.input_file.as_path());
    println!("Saving to {}...", output.display());
    RecordStore::new(output, StoreMode::WriteWhole)
        .pretty(true)
        .save(&records)?;
    println!("Done!");
    Ok(())
}

fn load_records(path: &Path) -> Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => anyhow!("file {} not found", path.display()),
        _ => anyhow!("cannot read {}: {}", path.display(), e),
    })?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(_) => Err(anyhow!(
            "malformed JSON in {}: expected an array of companies",
            path.display()
        )),
        Err(e) => Err(anyhow!("malformed JSON in {}: {}", path.display(), e)),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
