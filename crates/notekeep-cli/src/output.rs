//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use anyhow::{Context, Result};
use serde::Serialize;

use notekeep_core::Note;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single note in full
    pub fn print_note(&self, note: &Note) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("ID:         {}", note.id);
                println!("Title:      {}", note.title);
                println!("Bookmarked: {}", if note.is_bookmarked { "yes" } else { "no" });
                println!("Created:    {}", note.created_date.format("%Y-%m-%d %H:%M"));
                println!();
                println!("{}", note.content);
            }
            OutputFormat::Json => print_json(note, true)?,
            OutputFormat::Quiet => println!("{}", note.id),
        }
        Ok(())
    }

    /// Print a list of notes, one line each
    pub fn print_notes(&self, notes: &[Note]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if notes.is_empty() {
                    println!("No notes found.");
                    return Ok(());
                }
                for note in notes {
                    println!("{}", summary_line(note));
                }
                println!("\n{} note(s)", notes.len());
            }
            OutputFormat::Json => print_json(notes, true)?,
            OutputFormat::Quiet => {
                for note in notes {
                    println!("{}", note.id);
                }
            }
        }
        Ok(())
    }

    /// Print one snapshot of a live list
    ///
    /// JSON snapshots are written one per line so the stream can be piped.
    pub fn print_snapshot(&self, notes: &[Note]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!(
                    "── {} note(s) at {} ──",
                    notes.len(),
                    chrono::Local::now().format("%H:%M:%S")
                );
                for note in notes {
                    println!("{}", summary_line(note));
                }
            }
            OutputFormat::Json => print_json(notes, false)?,
            OutputFormat::Quiet => {
                let ids: Vec<String> = notes.iter().map(|n| n.id.to_string()).collect();
                println!("{}", ids.join(" "));
            }
        }
        Ok(())
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn summary_line(note: &Note) -> String {
    let marker = if note.is_bookmarked { "★" } else { " " };
    format!(
        "{:>5} {} {} | {} | {}",
        note.id,
        marker,
        note.created_date.format("%Y-%m-%d"),
        truncate(&note.title, 30),
        truncate_line(&note.content, 40)
    )
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("single line", 20), "single line");
        assert_eq!(truncate_line("line one\nline two", 20), "line one");
        assert_eq!(truncate_line("", 20), "");
    }

    #[test]
    fn test_summary_line_marks_bookmarks() {
        let note = Note::new("Groceries", "milk\neggs").bookmarked(true);
        let line = summary_line(&note);
        assert!(line.contains('★'));
        assert!(line.contains("Groceries"));
        assert!(line.contains("milk"));
        assert!(!line.contains("eggs"));
    }
}
