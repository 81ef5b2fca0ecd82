//! Report rendering
//!
//! ```text
//! Total: 80 samples
//!     flat   flat%    sum%      cum    cum% name
//!       80 100.00% 100.00%       80 100.00% leaf_fn
//!        0   0.00% 100.00%       30  37.50% caller_fn
//! ```

#![allow(clippy::format_push_string)]

use serde::Serialize;
use std::io::Write;

use crate::analysis::profile::percent;
use crate::domain::{ReportError, SymbolName};

/// One ranked line of the report
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub name: SymbolName,
    pub flat: u64,
    pub flat_percent: f64,
    /// Flat weight of this row and every row above it, as a percentage
    pub sum_percent: f64,
    pub cumulative: u64,
    pub cumulative_percent: f64,
}

impl ReportRow {
    #[must_use]
    pub fn new(name: SymbolName, flat: u64, running_flat: u64, cumulative: u64, total: u64) -> Self {
        Self {
            name,
            flat,
            flat_percent: percent(flat, total),
            sum_percent: percent(running_flat, total),
            cumulative,
            cumulative_percent: percent(cumulative, total),
        }
    }

    fn to_line(&self) -> String {
        format!(
            "{:>8} {:>6.2}% {:>6.2}% {:>8} {:>6.2}% {}",
            self.flat,
            self.flat_percent,
            self.sum_percent,
            self.cumulative,
            self.cumulative_percent,
            self.name
        )
    }
}

/// Ranked rows plus the sample total they were normalized by
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    total_samples: u64,
    rows: Vec<ReportRow>,
    #[serde(skip)]
    flat_len: usize,
}

impl Report {
    #[must_use]
    pub fn new(total_samples: u64, rows: Vec<ReportRow>, flat_len: usize) -> Self {
        let flat_len = flat_len.min(rows.len());
        Self { total_samples, rows, flat_len }
    }

    #[must_use]
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    #[must_use]
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Rows for names that were sampled as a leaf
    #[must_use]
    pub fn flat_rows(&self) -> &[ReportRow] {
        &self.rows[..self.flat_len]
    }

    /// Drop rows for names that never appeared as a leaf
    #[must_use]
    pub fn into_flat_only(mut self) -> Self {
        self.rows.truncate(self.flat_len);
        self
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = format!("Total: {} samples\n", self.total_samples);
        output.push_str(&format!(
            "{:>8} {:>7} {:>7} {:>8} {:>7} {}\n",
            "flat", "flat%", "sum%", "cum", "cum%", "name"
        ));
        for row in &self.rows {
            output.push_str(&row.to_line());
            output.push('\n');
        }
        output
    }

    /// # Errors
    /// Returns an error if writing fails
    pub fn write_text<W: Write>(&self, mut writer: W) -> Result<(), ReportError> {
        writer.write_all(self.to_text().as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if serialization or writing fails
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
