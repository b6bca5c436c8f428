//! Count histograms
//!
//! Turns a counts map into a sorted table and renders it as a text bar
//! chart, a Markdown table, JSON or CSV.

use qcirc_core::{Counts, QcError};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

/// Default bar width of the text chart, in characters
pub const DEFAULT_BAR_WIDTH: usize = 40;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistogramFormat {
    /// Bar chart drawn with block characters
    #[default]
    Text,
    /// Markdown table
    Markdown,
    /// JSON
    Json,
    /// CSV
    Csv,
}

impl HistogramFormat {
    /// Every format, in declaration order
    pub const ALL: [HistogramFormat; 4] = [Self::Text, Self::Markdown, Self::Json, Self::Csv];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for HistogramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistogramFormat {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(QcError::ConfigError(format!(
                "unknown histogram format '{}' (expected text, markdown, json or csv)",
                other
            ))),
        }
    }
}

/// Entry order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Lexicographic by key
    ByKey,
    /// Highest count first, ties by key
    ByCount,
}

/// One bar of the histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramEntry {
    /// Outcome key
    pub key: String,
    /// Number of shots
    pub count: u64,
    /// Share of all shots
    pub probability: f64,
}

/// Histogram over measurement outcomes
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    title: Option<String>,
    entries: Vec<HistogramEntry>,
    total: u64,
    bar_width: usize,
}

impl Histogram {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Histogram of `counts`, ordered by key
    pub fn from_counts(counts: &Counts) -> Self {
        let total: u64 = counts.values().sum();
        let entries = counts
            .iter()
            .map(|(key, &count)| HistogramEntry {
                key: key.clone(),
                count,
                probability: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64
                },
            })
            .collect();

        Self {
            title: None,
            entries,
            total,
            bar_width: DEFAULT_BAR_WIDTH,
        }
    }

    /// Set a heading
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the width of the longest text bar (at least 1)
    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = width.max(1);
        self
    }

    /// Reorder entries
    pub fn sorted(mut self, order: SortOrder) -> Self {
        match order {
            SortOrder::ByKey => self.entries.sort_by(|a, b| a.key.cmp(&b.key)),
            SortOrder::ByCount => self
                .entries
                .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key))),
        }
        self
    }

    /// Keep the `n` most frequent outcomes, highest first
    ///
    /// Probabilities stay relative to all shots.
    pub fn top(self, n: usize) -> Self {
        let mut hist = self.sorted(SortOrder::ByCount);
        hist.entries.truncate(n);
        hist
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Entries in current order
    pub fn entries(&self) -> &[HistogramEntry] {
        &self.entries
    }

    /// Total number of shots
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct outcomes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no outcomes
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Probability of `key`, zero when absent
    pub fn probability(&self, key: &str) -> f64 {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map_or(0.0, |e| e.probability)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render in the given format
    pub fn render(&self, format: HistogramFormat) -> String {
        match format {
            HistogramFormat::Text => self.to_text(),
            HistogramFormat::Markdown => self.to_markdown(),
            HistogramFormat::Json => self.to_json(),
            HistogramFormat::Csv => self.to_csv(),
        }
    }

    /// Bar chart: key, bar, count and probability per line
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        if let Some(title) = &self.title {
            let _ = writeln!(output, "{}", title);
        }
        if self.entries.is_empty() {
            output.push_str("(no counts)\n");
            return output;
        }

        let key_width = self.entries.iter().map(|e| e.key.len()).max().unwrap_or(0);
        let count_width = self
            .entries
            .iter()
            .map(|e| e.count.to_string().len())
            .max()
            .unwrap_or(1);
        let max_count = self.entries.iter().map(|e| e.count).max().unwrap_or(0).max(1);

        for e in &self.entries {
            let len = (e.count as f64 / max_count as f64 * self.bar_width as f64).round() as usize;
            let bar = "█".repeat(len);
            let _ = writeln!(
                output,
                "{:<kw$} │{:<bw$} {:>cw$}  {:.4}",
                e.key,
                bar,
                e.count,
                e.probability,
                kw = key_width,
                bw = self.bar_width,
                cw = count_width
            );
        }
        output
    }

    /// Markdown table
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        if let Some(title) = &self.title {
            let _ = writeln!(output, "### {}\n", title);
        }
        output.push_str("| Outcome | Count | Probability |\n");
        output.push_str("|---------|-------|-------------|\n");
        for e in &self.entries {
            let _ = writeln!(output, "| `{}` | {} | {:.4} |", e.key, e.count, e.probability);
        }
        output
    }

    /// JSON object with the title, total and entries
    pub fn to_json(&self) -> String {
        let report = serde_json::json!({
            "title": self.title,
            "total": self.total,
            "entries": self.entries,
        });
        serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
    }

    /// CSV with a header row
    pub fn to_csv(&self) -> String {
        let mut output = String::from("outcome,count,probability\n");
        for e in &self.entries {
            let _ = writeln!(output, "{},{},{}", e.key, e.count, e.probability);
        }
        output
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// ============================================================================
// Tests
// ============================================================================
