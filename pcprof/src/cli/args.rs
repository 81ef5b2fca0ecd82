//! CLI argument definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::symbolization::dispatch_resolver::{
    DEFAULT_DEFINITIONS_FILE, DEFAULT_DISPATCH_SYMBOL, DEFAULT_ENTRIES_FILE,
};
use crate::symbolization::tools::{DEFAULT_DISASSEMBLER, DEFAULT_RESOLVER};
use crate::symbolization::DispatchConfig;

/// Resolver value selecting the in-process DWARF reader
pub const DWARF_RESOLVER: &str = "dwarf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "pcprof",
    about = "Symbol-level report for call-stack sampling profiles",
    after_help = "\
EXAMPLES:
    pcprof ruby.prof ./ruby                              Flat and cumulative report
    pcprof ruby.prof ./ruby --source-root ~/src/ruby     Attribute interpreter dispatch samples
    pcprof ruby.prof ./ruby --disassembler 'objdump -d --no-show-raw-insn {binary}' --resolver dwarf"
)]
pub struct Args {
    /// Binary sample profile to report on
    #[arg(value_name = "PROFILE")]
    pub profile: PathBuf,

    /// Binary that was sampled
    #[arg(value_name = "BINARY")]
    pub binary: PathBuf,

    /// Interpreter source directory; enables dispatch resolution
    #[arg(short, long, value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Symbol of the interpreter dispatch loop
    #[arg(long, default_value = DEFAULT_DISPATCH_SYMBOL)]
    pub dispatch_symbol: String,

    /// Operation definitions file, relative to the source root
    #[arg(long, default_value = DEFAULT_DEFINITIONS_FILE)]
    pub definitions_file: String,

    /// Operation entry points file, relative to the source root
    #[arg(long, default_value = DEFAULT_ENTRIES_FILE)]
    pub entries_file: String,

    /// Disassembly listing command ({binary} is substituted)
    #[arg(long, default_value = DEFAULT_DISASSEMBLER)]
    pub disassembler: String,

    /// Location resolver command ({binary}, {addresses} substituted), or "dwarf"
    #[arg(long, default_value = DEFAULT_RESOLVER)]
    pub resolver: String,

    /// Report output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Only list names sampled as a leaf
    #[arg(long)]
    pub flat_only: bool,

    /// Demangle Rust symbol names
    #[arg(long)]
    pub demangle: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Dispatch resolution settings, present when a source root was given
    #[must_use]
    pub fn dispatch_config(&self) -> Option<DispatchConfig> {
        self.source_root.as_ref().map(|root| DispatchConfig {
            dispatch_symbol: self.dispatch_symbol.clone(),
            source_root: root.clone(),
            definitions_file: self.definitions_file.clone(),
            entries_file: self.entries_file.clone(),
        })
    }

    #[must_use]
    pub fn uses_dwarf_resolver(&self) -> bool {
        self.resolver.trim() == DWARF_RESOLVER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["pcprof", "ruby.prof", "./ruby"]);

        assert_eq!(args.dispatch_symbol, "_vm_exec_core");
        assert_eq!(args.format, ReportFormat::Text);
        assert!(args.dispatch_config().is_none());
        assert!(!args.uses_dwarf_resolver());
    }

    #[test]
    fn test_source_root_enables_dispatch() {
        let args = Args::parse_from([
            "pcprof",
            "ruby.prof",
            "./ruby",
            "--source-root",
            "/src/ruby",
            "--resolver",
            "dwarf",
            "--format",
            "json",
        ]);

        let config = args.dispatch_config().unwrap();
        assert_eq!(config.source_root, PathBuf::from("/src/ruby"));
        assert_eq!(config.entries_file, "vm.inc");
        assert!(args.uses_dwarf_resolver());
        assert_eq!(args.format, ReportFormat::Json);
    }

    #[test]
    fn test_binary_is_required() {
        assert!(Args::try_parse_from(["pcprof", "ruby.prof"]).is_err());
    }
}
