//! Address to symbol table built from a disassembly listing
//!
//! The listing is a sequence of runs. A label line names the function whose
//! instructions follow; every tab-separated instruction line maps its
//! leading address to that function:
//!
//! ```text
//! _vm_exec_core:
//! 0000000100012340	pushq	%rbp
//! 0000000100012341	movq	%rsp, %rbp
//! ```
//!
//! `objdump -d` listings use `0000000000401000 <main>:` labels and
//! `  401000:\t...` instruction lines; both shapes are accepted.

use indexmap::map::Iter;
use indexmap::IndexMap;
use log::{debug, info};
use std::path::Path;

use crate::domain::{Address, ResolutionError, SymbolName};
use crate::symbolization::tools::DisassemblyLister;

/// Base layer of the symbol mapping
///
/// Only addresses that appear as instruction boundaries in the listing are
/// present. Entries keep listing order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: IndexMap<Address, SymbolName>,
}

impl SymbolTable {
    /// Run the disassembler on `binary` and index its listing
    ///
    /// # Errors
    /// Returns an error if the disassembler fails
    pub fn load(lister: &dyn DisassemblyLister, binary: &Path) -> Result<Self, ResolutionError> {
        let listing = lister.listing(binary)?;
        let table = Self::from_listing(&listing);
        info!("Symbol table: {} instruction addresses from {}", table.len(), binary.display());
        Ok(table)
    }

    /// Index an already captured listing
    pub fn from_listing<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = IndexMap::new();
        let mut current: Option<SymbolName> = None;

        for line in lines {
            let line = line.as_ref();
            let fields = split_fields(line);

            if fields.len() == 1 {
                if let Some(label) = parse_label(fields[0]) {
                    current = Some(SymbolName::new(label));
                }
                continue;
            }
            if fields.len() < 2 {
                continue;
            }

            // Instructions before the first label have no owning function
            let Some(ref function) = current else {
                continue;
            };

            match parse_address(fields[0]) {
                Some(addr) => {
                    entries.insert(Address(addr), function.clone());
                }
                None => debug!("Skipping listing line without address: {line}"),
            }
        }

        Self { entries }
    }

    #[must_use]
    pub fn get(&self, addr: Address) -> Option<&SymbolName> {
        self.entries.get(&addr)
    }

    /// All addresses attributed to `name`, in listing order
    #[must_use]
    pub fn addresses_of(&self, name: &str) -> Vec<Address> {
        self.entries
            .iter()
            .filter(|(_, symbol)| symbol.as_str() == name)
            .map(|(&addr, _)| addr)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Address, SymbolName> {
        self.entries.iter()
    }
}

impl FromIterator<(Address, SymbolName)> for SymbolTable {
    fn from_iter<T: IntoIterator<Item = (Address, SymbolName)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// Tab-separated fields with trailing empty fields dropped
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split('\t').collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Function name from a label line, if the line is one
fn parse_label(line: &str) -> Option<&str> {
    let body = line.trim().strip_suffix(':')?;
    if body.is_empty() {
        return None;
    }
    if !body.contains(char::is_whitespace) {
        return Some(body);
    }

    // objdump form: "<hex> <name>"
    let (addr, name) = body.split_once(' ')?;
    let name = name.strip_prefix('<')?.strip_suffix('>')?;
    if name.is_empty() || parse_address(addr).is_none() {
        return None;
    }
    Some(name)
}

fn parse_address(field: &str) -> Option<u64> {
    let field = field.trim();
    let field = field.strip_suffix(':').unwrap_or(field);
    let field = field.strip_prefix("0x").unwrap_or(field);
    u64::from_str_radix(field, 16).ok()
}
