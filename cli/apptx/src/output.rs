//! Output formatting for CLI commands.

use std::io;

use anyhow::Result;
use apptx::{ApiError, Outcome};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// Comma separated values with a header row.
    Csv,
    /// JSON format.
    Json,
}

/// Print data in the specified format.
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No items found.".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Csv => write_csv(data, io::stdout())?,
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
    }
    Ok(())
}

fn write_csv<T: Tabled, W: io::Write>(data: &[T], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(T::headers().iter().map(|h| h.as_bytes()))?;
    for item in data {
        writer.write_record(item.fields().iter().map(|f| f.as_bytes()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Report a finished operation.
pub fn print_outcome(message: &str, outcome: &Outcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let receipt = serde_json::json!({
                "message": message,
                "outcome": outcome,
            });
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        OutputFormat::Table | OutputFormat::Csv => match outcome {
            Outcome::Unchanged { reason } => print_info(reason),
            _ => print_success(&format!("{message} ({outcome})")),
        },
    }
    Ok(())
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue().bold(), message);
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(hint) = err.downcast_ref::<ApiError>().and_then(ApiError::hint) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

/// Process exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ApiError>()
        .map(ApiError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apptx::models::ServiceAccount;

    #[test]
    fn csv_has_header_row_and_quotes_fields() {
        let accounts = vec![
            ServiceAccount {
                uuid: "abc-123".to_string(),
                alias: "vc-admin".to_string(),
                username: "administrator@vsphere.local".to_string(),
            },
            ServiceAccount {
                uuid: "def-456".to_string(),
                alias: "linux, prod".to_string(),
                username: "root".to_string(),
            },
        ];

        let mut buf = Vec::new();
        write_csv(&accounts, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            "UUID,Alias,Username\n\
             abc-123,vc-admin,administrator@vsphere.local\n\
             def-456,\"linux, prod\",root\n"
        );
    }

    #[test]
    fn csv_of_empty_list_is_header_only() {
        let mut buf = Vec::new();
        write_csv::<ServiceAccount, _>(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "UUID,Alias,Username\n");
    }

    #[test]
    fn exit_code_maps_usage_to_two() {
        let usage = anyhow::Error::from(ApiError::usage("missing --url"));
        assert_eq!(exit_code(&usage), 2);

        let remote = anyhow::Error::from(ApiError::remote(500, "register vCenter"));
        assert_eq!(exit_code(&remote), 1);

        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
