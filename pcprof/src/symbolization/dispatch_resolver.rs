//! Re-attribution of samples inside the interpreter's dispatch loop
//!
//! Every address the symbol table assigns to the dispatch-core function is
//! resolved to a source line, and the source line is mapped back to the
//! operation whose body contains it. Addresses whose resolved location is
//! an inlined helper outside both interpreter files inherit the location of
//! the nearest preceding address that did land in one of them.

use indexmap::IndexMap;
use log::{debug, info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::domain::{Address, ResolutionError, SymbolName};
use crate::symbolization::source_files::{InterpreterSource, SourceKind};
use crate::symbolization::tools::LocationResolver;
use crate::symbolization::SymbolTable;

pub const DEFAULT_DISPATCH_SYMBOL: &str = "_vm_exec_core";
pub const DEFAULT_DEFINITIONS_FILE: &str = "insns.def";
pub const DEFAULT_ENTRIES_FILE: &str = "vm.inc";

/// Trailing `(file:line)` segment of a resolver line
fn location_pattern() -> &'static Regex {
    static LOCATION: OnceLock<Regex> = OnceLock::new();
    LOCATION.get_or_init(|| Regex::new(r"\(([^()]*)\)\s*$").expect("regex"))
}

/// Where to find the dispatch function and its interpreter sources
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub dispatch_symbol: String,
    pub source_root: PathBuf,
    pub definitions_file: String,
    pub entries_file: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            dispatch_symbol: DEFAULT_DISPATCH_SYMBOL.to_string(),
            source_root: PathBuf::from("."),
            definitions_file: DEFAULT_DEFINITIONS_FILE.to_string(),
            entries_file: DEFAULT_ENTRIES_FILE.to_string(),
        }
    }
}

pub struct DispatchResolver {
    dispatch_symbol: String,
    definitions: InterpreterSource,
    entries: InterpreterSource,
}

impl DispatchResolver {
    /// Read both interpreter files below the configured source root
    ///
    /// # Errors
    /// Returns an error if either source file cannot be read
    pub fn load(config: &DispatchConfig) -> Result<Self, ResolutionError> {
        let definitions = InterpreterSource::load(
            SourceKind::Definitions,
            &config.source_root,
            &config.definitions_file,
        )?;
        let entries =
            InterpreterSource::load(SourceKind::Entries, &config.source_root, &config.entries_file)?;

        debug!(
            "Loaded {} ({} lines) and {} ({} lines)",
            definitions.file_name(),
            definitions.line_count(),
            entries.file_name(),
            entries.line_count()
        );

        Ok(Self::from_sources(&config.dispatch_symbol, definitions, entries))
    }

    pub fn from_sources(
        dispatch_symbol: &str,
        definitions: InterpreterSource,
        entries: InterpreterSource,
    ) -> Self {
        Self { dispatch_symbol: dispatch_symbol.to_string(), definitions, entries }
    }

    #[must_use]
    pub fn dispatch_symbol(&self) -> &str {
        &self.dispatch_symbol
    }

    /// Operation names for the dispatch-core addresses of `table`
    ///
    /// Addresses that cannot be attributed to an operation are left out.
    ///
    /// # Errors
    /// Returns an error if the location resolver fails
    pub fn resolve(
        &self,
        table: &SymbolTable,
        binary: &Path,
        locator: &dyn LocationResolver,
    ) -> Result<IndexMap<Address, SymbolName>, ResolutionError> {
        let addrs = table.addresses_of(&self.dispatch_symbol);
        if addrs.is_empty() {
            info!("No addresses attributed to {}, skipping dispatch resolution", self.dispatch_symbol);
            return Ok(IndexMap::new());
        }
        info!("Resolving {} addresses inside {}", addrs.len(), self.dispatch_symbol);

        let lines = locator.locate(binary, &addrs)?;
        if lines.len() != addrs.len() {
            warn!(
                "Location resolver returned {} lines for {} addresses",
                lines.len(),
                addrs.len()
            );
        }

        let overrides = self.attribute(&addrs, &lines);
        info!("Attributed {} of {} dispatch addresses to operations", overrides.len(), addrs.len());
        Ok(overrides)
    }

    /// Pair addresses with resolver lines and keep the ones naming an operation
    pub fn attribute<S: AsRef<str>>(
        &self,
        addrs: &[Address],
        lines: &[S],
    ) -> IndexMap<Address, SymbolName> {
        // Addresses the resolver gave no line for count as unrecognized
        let padded: Vec<&str> = lines
            .iter()
            .map(AsRef::as_ref)
            .chain(std::iter::repeat(""))
            .take(addrs.len())
            .collect();
        let repaired = repair_inlined(&padded, |line| self.is_recognized(line));

        addrs
            .iter()
            .zip(repaired)
            .filter_map(|(&addr, line)| match self.operation_for(line) {
                Some(name) => Some((addr, SymbolName::new(name))),
                None => {
                    debug!("No operation for {addr}: {line}");
                    None
                }
            })
            .collect()
    }

    /// True when `line` references one of the interpreter files
    #[must_use]
    pub fn is_recognized(&self, line: &str) -> bool {
        line.contains(self.entries.file_name()) || line.contains(self.definitions.file_name())
    }

    /// Operation named by a single resolver line
    #[must_use]
    pub fn operation_for(&self, line: &str) -> Option<String> {
        let (file, line_number) = parse_location(line)?;

        let source = if file.contains(self.entries.file_name()) {
            &self.entries
        } else if file.contains(self.definitions.file_name()) {
            &self.definitions
        } else {
            return None;
        };

        source.operation_at(line_number)
    }
}

/// Carry the last recognized line forward over unrecognized ones
///
/// Unrecognized lines with no recognized predecessor are returned unchanged.
pub fn repair_inlined<S, F>(lines: &[S], is_recognized: F) -> Vec<&str>
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    let mut last_good: Option<&str> = None;

    lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            if is_recognized(line) {
                last_good = Some(line);
                line
            } else {
                last_good.unwrap_or(line)
            }
        })
        .collect()
}

/// Split the trailing `(file:line)` segment into its parts
#[must_use]
pub fn parse_location(line: &str) -> Option<(&str, usize)> {
    let segment = location_pattern().captures(line)?.get(1)?.as_str();
    let (file, line_number) = segment.rsplit_once(':')?;
    Some((file, line_number.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSNS_DEF: &str = "DEFINE_INSN\nputobject\n(VALUE val)\n{\n  PUSH(val);\n}\n";
    const VM_INC: &str = "INSN_ENTRY(nop){\n}\nINSN_ENTRY(leave){\n  RESTORE_REGS();\n  NEXT_INSN();\n}\n";

    fn resolver() -> DispatchResolver {
        DispatchResolver::from_sources(
            DEFAULT_DISPATCH_SYMBOL,
            InterpreterSource::from_text(SourceKind::Definitions, "insns.def", INSNS_DEF),
            InterpreterSource::from_text(SourceKind::Entries, "vm.inc", VM_INC),
        )
    }

    #[test]
    fn test_parse_location() {
        assert_eq!(
            parse_location("vm_exec_core (in ruby) (vm.inc:10)"),
            Some(("vm.inc", 10))
        );
        assert_eq!(parse_location("/src/ruby/insns.def:5"), None);
        assert_eq!(parse_location("f (in ruby) (vm.inc:abc)"), None);
        assert_eq!(parse_location("0x0000000100002000"), None);
    }

    #[test]
    fn test_parse_location_keeps_colons_in_path() {
        assert_eq!(parse_location("f (in x) (C:/src/vm.inc:42)"), Some(("C:/src/vm.inc", 42)));
    }

    #[test]
    fn test_repair_carries_last_recognized_line_forward() {
        let lines = ["a (in ruby) (vm.inc:10)", "b (in ruby) (unrelated.c:5)", "c (in ruby) (unrelated.c:6)"];
        let repaired = repair_inlined(&lines, |l| l.contains("vm.inc"));

        assert_eq!(repaired, vec![lines[0], lines[0], lines[0]]);
    }

    #[test]
    fn test_repair_without_prior_line_stays_unrecognized() {
        let lines = ["b (in ruby) (unrelated.c:5)", "a (in ruby) (vm.inc:10)", "c (in ruby) (st.c:1)"];
        let repaired = repair_inlined(&lines, |l| l.contains("vm.inc"));

        assert_eq!(repaired, vec![lines[0], lines[1], lines[1]]);
    }

    #[test]
    fn test_operation_for_each_file_kind() {
        let resolver = resolver();

        assert_eq!(resolver.operation_for("x (in ruby) (vm.inc:5)").as_deref(), Some("leave"));
        assert_eq!(
            resolver.operation_for("x (in ruby) (/src/insns.def:5)").as_deref(),
            Some("putobject")
        );
        assert_eq!(resolver.operation_for("x (in ruby) (array.c:5)"), None);
        assert_eq!(resolver.operation_for("0x100"), None);
    }

    #[test]
    fn test_attribute_omits_unresolved_addresses() {
        let resolver = resolver();
        let addrs = [Address(0x10), Address(0x14), Address(0x18), Address(0x1c)];
        let lines = [
            "0x10",
            "vm_exec_core (in ruby) (vm.inc:5)",
            "rb_ary_push (in ruby) (array.c:88)",
            "vm_exec_core (in ruby) (vm.inc:1)",
        ];

        let overrides = resolver.attribute(&addrs, &lines);

        assert_eq!(overrides.len(), 2);
        assert!(!overrides.contains_key(&Address(0x10)));
        assert_eq!(overrides[&Address(0x14)].as_str(), "leave");
        // Inlined helper inherits the preceding vm.inc line
        assert_eq!(overrides[&Address(0x18)].as_str(), "leave");
        // Line 1 has nothing above it
        assert!(!overrides.contains_key(&Address(0x1c)));
    }

    #[test]
    fn test_attribute_short_resolver_output_inherits_last_line() {
        let resolver = resolver();
        let addrs = [Address(0x10), Address(0x14), Address(0x18)];
        let lines = ["vm_exec_core (in ruby) (vm.inc:5)"];

        let overrides = resolver.attribute(&addrs, &lines);

        assert_eq!(overrides.len(), 3);
        assert!(addrs.iter().all(|addr| overrides[addr].as_str() == "leave"));
    }

    #[test]
    fn test_attribute_short_resolver_output_without_prior_line() {
        let resolver = resolver();
        let addrs = [Address(0x10), Address(0x14)];
        let lines: [&str; 0] = [];

        assert!(resolver.attribute(&addrs, &lines).is_empty());
    }

    struct FixedLocator(Vec<String>);

    impl LocationResolver for FixedLocator {
        fn locate(&self, _binary: &Path, addrs: &[Address]) -> Result<Vec<String>, ResolutionError> {
            Ok(self.0.iter().take(addrs.len()).cloned().collect())
        }
    }

    struct FailingLocator;

    impl LocationResolver for FailingLocator {
        fn locate(&self, _binary: &Path, _addrs: &[Address]) -> Result<Vec<String>, ResolutionError> {
            Err(ResolutionError::EmptyCommand)
        }
    }

    #[test]
    fn test_resolve_only_dispatch_addresses() {
        let table = SymbolTable::from_listing([
            "_main:",
            "0000000000001000\tnop",
            "_vm_exec_core:",
            "0000000000002000\tnop",
            "0000000000002004\tnop",
        ]);
        let locator = FixedLocator(vec![
            "vm_exec_core (in ruby) (vm.inc:2)".to_string(),
            "vm_exec_core (in ruby) (vm.inc:6)".to_string(),
        ]);

        let overrides = resolver().resolve(&table, Path::new("ruby"), &locator).unwrap();

        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[&Address(0x2000)].as_str(), "nop");
        assert_eq!(overrides[&Address(0x2004)].as_str(), "leave");
    }

    #[test]
    fn test_resolve_skips_locator_without_dispatch_addresses() {
        let table = SymbolTable::from_listing(["_main:", "0000000000001000\tnop"]);
        let overrides = resolver().resolve(&table, Path::new("ruby"), &FailingLocator).unwrap();
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_resolve_propagates_locator_failure() {
        let table = SymbolTable::from_listing(["_vm_exec_core:", "0000000000002000\tnop"]);
        let result = resolver().resolve(&table, Path::new("ruby"), &FailingLocator);
        assert!(result.is_err());
    }
}
