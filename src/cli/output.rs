//! Shared CLI output helpers for consistent operator-facing text.

use std::fmt::Display;

use owo_colors::OwoColorize;
use rust_decimal::Decimal;

const RULE_WIDTH: usize = 56;

/// Print a section header and separator.
pub fn section(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(RULE_WIDTH).dimmed());
}

/// Print a simple key/value line.
pub fn key_value(label: &str, value: impl Display) {
    println!("{:<18} {value}", label.dimmed());
}

/// Print a successful status line.
pub fn ok(message: &str) {
    println!("{} {message}", "✓".green());
}

/// Print a warning status line.
pub fn warn(message: &str) {
    println!("{} {message}", "⚠".yellow());
}

/// Print an error status line.
pub fn error(message: &str) {
    eprintln!("{} {message}", "✗".red());
}

/// Print a single-line note.
pub fn note(message: &str) {
    println!("{message}");
}

/// Print a multi-line block (tables).
pub fn lines(block: &str) {
    println!("{block}");
}

/// Format a signed amount green when positive, red when negative.
pub fn signed(value: Decimal) -> String {
    let text = value.to_string();
    if value > Decimal::ZERO {
        format!("{}", text.green())
    } else if value < Decimal::ZERO {
        format!("{}", text.red())
    } else {
        text
    }
}

/// Format a rate as a percentage with four decimals.
#[must_use]
pub fn percent(rate: Decimal) -> String {
    format!("{:.4}%", rate * Decimal::ONE_HUNDRED)
}
