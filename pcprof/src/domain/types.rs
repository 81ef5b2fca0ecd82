//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep raw program counters, call stacks and resolved
//! names apart in function signatures.

use serde::Serialize;
use std::fmt;

/// Program counter in the sampled binary's address space
///
/// Displays as the canonical 16-digit lowercase hex form used whenever no
/// symbol is known for the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub u64);

impl Address {
    /// Zero-padded lowercase hex without prefix (e.g. `0000000000000100`)
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for Address {
    fn from(addr: u64) -> Self {
        Address(addr)
    }
}

/// One sampled call stack, leaf first
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stack(Vec<Address>);

impl Stack {
    pub fn new(frames: Vec<Address>) -> Self {
        Self(frames)
    }

    /// The actively executing frame, if the stack has any frames
    #[must_use]
    pub fn leaf(&self) -> Option<Address> {
        self.0.first().copied()
    }

    pub fn frames(&self) -> &[Address] {
        &self.0
    }
}

impl From<Vec<u64>> for Stack {
    fn from(frames: Vec<u64>) -> Self {
        Stack(frames.into_iter().map(Address).collect())
    }
}

/// Resolved function or sub-operation name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SymbolName(String);

impl SymbolName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Fallback name for an address nothing resolved
    #[must_use]
    pub fn fallback(addr: Address) -> Self {
        Self(addr.to_hex())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolName {
    fn from(s: &str) -> Self {
        SymbolName(s.to_string())
    }
}

impl From<String> for SymbolName {
    fn from(s: String) -> Self {
        SymbolName(s)
    }
}
