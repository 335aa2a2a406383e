///! Output formatting for CLI
///!
///! Every command prints through these helpers so table, JSON and YAML
///! output stay consistent.

use crate::api::ImportSummary;
use crate::table::TableRow;
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Unknown names fall back to a table
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Table,
        }
    }
}

/// Print data in the specified format (table, JSON, or YAML)
pub fn print_output<T: Tabled + Serialize>(data: Vec<T>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_table(data),
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Yaml => print_yaml(&data)?,
    }
    Ok(())
}

/// Single resources have no tabular form; tables fall back to YAML
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(data)?,
        OutputFormat::Table | OutputFormat::Yaml => print_yaml(data)?,
    }
    Ok(())
}

/// Print data as a table using the tabled crate
pub fn print_table<T: Tabled>(data: Vec<T>) {
    if data.is_empty() {
        println!("{}", "No results found".yellow());
        return;
    }

    println!("{}", Table::new(data));
}

/// Renders resource table rows, with the allowed actions in the last column
pub fn render_rows(headers: &[String], rows: &[TableRow<'_>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for row in rows {
        let actions = row
            .actions
            .iter()
            .map(|a| format!("{:?}", a).to_lowercase())
            .collect::<Vec<_>>()
            .join(",");
        let mut cells: Vec<String> = row.cells.iter().map(|c| truncate(c, 48)).collect();
        cells.push(actions);
        builder.push_record(cells);
    }
    builder.build().to_string()
}

pub fn print_rows(headers: &[String], rows: &[TableRow<'_>]) {
    if rows.is_empty() {
        println!("{}", "No results found".yellow());
        return;
    }
    println!("{}", render_rows(headers, rows));
}

/// Print data as pretty-printed JSON
pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}

/// Print data as YAML
pub fn print_yaml<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    print!("{}", yaml);
    Ok(())
}

/// Print a success message with green checkmark
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print an error message with red X
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// Print an info message with blue i
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a warning message with yellow triangle
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

pub fn print_import_summary(summary: &ImportSummary, format: OutputFormat) -> anyhow::Result<()> {
    if format != OutputFormat::Table {
        return print_single(summary, format);
    }

    if summary.num_failed == 0 {
        print_success(&format!("Imported {} resource(s)", summary.num_succeeded));
        return Ok(());
    }
    print_warning(&format!(
        "Imported {} resource(s), {} failed",
        summary.num_succeeded, summary.num_failed
    ));
    for error in &summary.errors {
        print_error(error);
    }
    Ok(())
}

/// Truncate a string to max length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let head: String = s.chars().take(max_len - 3).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("yml"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::parse("wide"), OutputFormat::Table);
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }
}
