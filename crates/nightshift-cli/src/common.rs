//! Shared helpers for CLI commands.

use nightshift_core::Database;
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn open_db() -> Result<Database, Box<dyn std::error::Error>> {
    Ok(Database::open()?)
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
