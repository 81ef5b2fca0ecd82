//! Authoritative address to name lookup used by the report
//!
//! Resolution is an ordered chain: dispatch override, then the symbol table
//! entry, then the 16-digit hex form of the address.

use indexmap::IndexMap;
use rustc_demangle::demangle;

use crate::domain::{Address, SymbolName};
use crate::symbolization::SymbolTable;

#[derive(Debug, Clone, Default)]
pub struct SymbolMapping {
    base: SymbolTable,
    overrides: IndexMap<Address, SymbolName>,
    demangle: bool,
}

impl SymbolMapping {
    pub fn new(base: SymbolTable) -> Self {
        Self { base, overrides: IndexMap::new(), demangle: false }
    }

    /// Layer dispatch overrides on top of the base table
    #[must_use]
    pub fn with_overrides(mut self, overrides: IndexMap<Address, SymbolName>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Demangle Rust symbol names from the base table when resolving
    #[must_use]
    pub fn with_demangling(mut self, enabled: bool) -> Self {
        self.demangle = enabled;
        self
    }

    /// Raw name for `addr`, without the hex fallback
    #[must_use]
    pub fn lookup(&self, addr: Address) -> Option<&SymbolName> {
        self.overrides.get(&addr).or_else(|| self.base.get(addr))
    }

    /// Display name for `addr`
    #[must_use]
    pub fn resolve(&self, addr: Address) -> SymbolName {
        if let Some(name) = self.overrides.get(&addr) {
            return name.clone();
        }
        match self.base.get(addr) {
            Some(name) if self.demangle => SymbolName::new(demangle_symbol(name.as_str())),
            Some(name) => name.clone(),
            None => SymbolName::fallback(addr),
        }
    }

    #[must_use]
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    #[must_use]
    pub fn base(&self) -> &SymbolTable {
        &self.base
    }
}

impl FromIterator<(Address, SymbolName)> for SymbolMapping {
    fn from_iter<T: IntoIterator<Item = (Address, SymbolName)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Demangle a Rust symbol name; other names pass through unchanged
#[must_use]
pub fn demangle_symbol(symbol: &str) -> String {
    format!("{:#}", demangle(symbol))
}
