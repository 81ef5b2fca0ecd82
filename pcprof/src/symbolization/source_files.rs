//! Interpreter source files used to name dispatch sub-operations
//!
//! Two files are consulted. The definitions file declares each operation
//! after a `DEFINE_INSN` line:
//!
//! ```text
//! DEFINE_INSN
//! putobject
//! (VALUE val)
//! ```
//!
//! The generated entries file opens each operation body with a label:
//!
//! ```text
//! INSN_ENTRY(putobject){
//! ```
//!
//! Line numbers are 1-based, matching what the location resolver reports.

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::domain::ResolutionError;

/// Token preceding an operation name in the definitions file
pub const DEFINITION_MARKER: &str = "DEFINE_INSN";

/// Captures the operation name of an entry label
const ENTRY_PATTERN: &str = r"INSN_ENTRY\(([^)]*)\)";

fn entry_marker() -> &'static Regex {
    static ENTRY_MARKER: OnceLock<Regex> = OnceLock::new();
    ENTRY_MARKER.get_or_init(|| Regex::new(ENTRY_PATTERN).expect("regex"))
}

/// Which marker convention a source file follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Operation definitions; the name is on the line after the marker
    Definitions,
    /// Operation entry points; the name is captured from the marker itself
    Entries,
}

/// An interpreter source file held in memory
#[derive(Debug, Clone)]
pub struct InterpreterSource {
    kind: SourceKind,
    file_name: String,
    lines: Vec<String>,
}

impl InterpreterSource {
    /// Read `root/file_name` fully
    ///
    /// # Errors
    /// Returns [`ResolutionError::SourceFile`] if the file cannot be read
    pub fn load(kind: SourceKind, root: &Path, file_name: &str) -> Result<Self, ResolutionError> {
        let path = root.join(file_name);
        let text = fs::read_to_string(&path)
            .map_err(|source| ResolutionError::SourceFile { path: path.clone(), source })?;
        Ok(Self::from_text(kind, file_name, &text))
    }

    pub fn from_text(kind: SourceKind, file_name: &str, text: &str) -> Self {
        Self {
            kind,
            file_name: file_name.to_string(),
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Name of the operation whose code contains 1-based `line_number`
    ///
    /// Scanning starts on the line before `line_number` and walks toward the
    /// top of the file. Line numbers past the end start from the last line.
    #[must_use]
    pub fn operation_at(&self, line_number: usize) -> Option<String> {
        let start = line_number.checked_sub(2)?.min(self.lines.len().checked_sub(1)?);
        match self.kind {
            SourceKind::Definitions => scan_definition(&self.lines, start),
            SourceKind::Entries => scan_entry(&self.lines, start),
        }
    }
}

/// Walk up from `start` to the nearest entry label and return its capture
#[must_use]
pub fn scan_entry<S: AsRef<str>>(lines: &[S], start: usize) -> Option<String> {
    let marker = entry_marker();
    lines
        .get(..=start)?
        .iter()
        .rev()
        .find_map(|line| marker.captures(line.as_ref()).map(|caps| caps[1].to_string()))
}

/// Walk up from `start` to the nearest definition marker and return the line below it
#[must_use]
pub fn scan_definition<S: AsRef<str>>(lines: &[S], start: usize) -> Option<String> {
    let found = lines
        .get(..=start)?
        .iter()
        .rposition(|line| line.as_ref().contains(DEFINITION_MARKER))?;
    lines.get(found + 1).map(|next| next.as_ref().trim_end_matches(['\r', '\n']).to_string())
}
