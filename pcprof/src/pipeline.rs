//! End-to-end construction of a [`Profile`]
//!
//! parse → symbol table → dispatch overrides → mapping. The profile is
//! parsed first so a malformed stream fails before any tool runs.

use log::info;
use std::path::Path;

use crate::analysis::Profile;
use crate::domain::ProfilerError;
use crate::sampling::parse_profile_file;
use crate::symbolization::{
    DisassemblyLister, DispatchResolver, LocationResolver, SymbolMapping, SymbolTable,
};

pub struct Pipeline<'a> {
    lister: &'a dyn DisassemblyLister,
    locator: &'a dyn LocationResolver,
    dispatch: Option<DispatchResolver>,
    demangle: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(lister: &'a dyn DisassemblyLister, locator: &'a dyn LocationResolver) -> Self {
        Self { lister, locator, dispatch: None, demangle: false }
    }

    /// Enable dispatch-loop attribution
    #[must_use]
    pub fn with_dispatch(mut self, resolver: DispatchResolver) -> Self {
        self.dispatch = Some(resolver);
        self
    }

    #[must_use]
    pub fn with_demangling(mut self, enabled: bool) -> Self {
        self.demangle = enabled;
        self
    }

    /// Parse `profile_path` and name its samples using `binary`
    ///
    /// # Errors
    /// Returns a format error for a bad profile, or a resolution error if a
    /// symbolization tool fails
    pub fn run(&self, profile_path: &Path, binary: &Path) -> Result<Profile, ProfilerError> {
        let parsed = parse_profile_file(profile_path)?;
        info!("Profile references {} distinct addresses", parsed.samples.addresses().len());

        let table = SymbolTable::load(self.lister, binary)?;

        let overrides = match self.dispatch {
            Some(ref resolver) => resolver.resolve(&table, binary, self.locator)?,
            None => Default::default(),
        };

        let mapping =
            SymbolMapping::new(table).with_overrides(overrides).with_demangling(self.demangle);
        let profile = Profile::new(parsed.samples, mapping);

        Ok(match self.dispatch {
            Some(ref resolver) => profile.with_dispatch_symbol(resolver.dispatch_symbol()),
            None => profile,
        })
    }
}
