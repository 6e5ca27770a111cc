//! File I/O for the CLI.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use papermark_core::QuestionBank;

/// Load and parse a JSON document from disk.
pub fn load_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON: {}", path.display()))
}

/// Get the ~/.papermark directory path, creating it if needed
pub fn papermark_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    let papermark_dir = home.join(".papermark");

    if !papermark_dir.exists() {
        fs::create_dir_all(&papermark_dir)
            .with_context(|| format!("Failed to create {}", papermark_dir.display()))?;
    }

    Ok(papermark_dir)
}

/// Write a question bank, defaulting to ~/.papermark/bank.json
pub fn save_bank(bank: &QuestionBank, output: Option<PathBuf>) -> Result<PathBuf> {
    let path = match output {
        Some(path) => path,
        None => papermark_dir()?.join("bank.json"),
    };

    let json = papermark_core::to_json(bank).context("Failed to serialize question bank")?;

    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}
