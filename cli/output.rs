use anyhow::{Context, Result};
use byte_unit::{Byte, UnitType};
use code_merge_core::{AppError, MergeOutcome, Part};
use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use log;
use std::io::{self, Write};
use tiktoken_rs::cl100k_base;

pub fn print_warnings(warnings: &[AppError]) {
    if warnings.is_empty() {
        return;
    }
    eprintln!("{}", format!("⚠️  {} warning(s):", warnings.len()).yellow().bold());
    for warning in warnings {
        eprintln!("   {} {}", "-".yellow(), warning.to_string().yellow());
    }
}

pub fn readable_size(bytes: usize) -> String {
    let byte = Byte::from_u128(bytes as u128).unwrap_or_default();
    byte.get_appropriate_unit(UnitType::Binary).to_string()
}

/// Token estimates per part, or `None` when the tokenizer is unavailable.
fn estimate_tokens(parts: &[Part]) -> Vec<Option<usize>> {
    match cl100k_base() {
        Ok(bpe) => parts
            .iter()
            .map(|part| Some(bpe.encode_ordinary(&part.content).len()))
            .collect(),
        Err(e) => {
            log::warn!("Token estimation unavailable: {}", e);
            vec![None; parts.len()]
        }
    }
}

pub fn print_outcome(outcome: &MergeOutcome, quiet: bool) -> Result<()> {
    let stdout = io::stdout();
    write_outcome(&mut stdout.lock(), outcome, quiet).context("Failed to write summary to stdout")
}

// Quiet runs print nothing; the exit code carries the result.
fn write_outcome<W: Write>(out: &mut W, outcome: &MergeOutcome, quiet: bool) -> io::Result<()> {
    if quiet {
        return Ok(());
    }
    if outcome.is_empty() {
        return writeln!(out, "No files to merge.");
    }

    for path in &outcome.written {
        writeln!(
            out,
            "{} Created: {}",
            "✅".green(),
            path.display().to_string().blue()
        )?;
    }
    if let Some(archive) = &outcome.archive {
        writeln!(
            out,
            "{} Archive: {}",
            "📦".blue(),
            archive.display().to_string().blue()
        )?;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Part").fg(Color::Green),
        Cell::new("Size").fg(Color::Green),
        Cell::new("Est. Tokens").fg(Color::Green),
    ]);
    let tokens = estimate_tokens(&outcome.parts);
    for (part, tokens) in outcome.parts.iter().zip(tokens) {
        table.add_row(vec![
            Cell::new(part.number),
            Cell::new(readable_size(part.size())),
            Cell::new(tokens.map_or_else(|| "-".to_string(), |t| t.to_string())),
        ]);
    }
    writeln!(out, "{table}")?;
    writeln!(
        out,
        "{} {} files merged into {} part(s).",
        "ℹ️".blue(),
        outcome.merged_files.len().to_string().cyan(),
        outcome.parts.len().to_string().cyan()
    )
}
