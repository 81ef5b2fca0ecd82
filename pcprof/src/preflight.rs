//! Pre-flight checks for pcprof
//!
//! Validates inputs before any external tool runs.
//! Provides clear, actionable error messages when requirements aren't met.

use anyhow::{bail, Context, Result};
use object::{Object, ObjectSection};
use std::path::Path;

use crate::symbolization::DispatchConfig;

/// Run all pre-flight checks before the pipeline starts
///
/// The embedded line-table check only applies to the in-process DWARF
/// resolver; external resolvers may read debug info from elsewhere (dSYM).
pub fn run_preflight_checks(
    profile_path: &Path,
    binary_path: &Path,
    dispatch: Option<&DispatchConfig>,
    dwarf_resolver: bool,
    quiet: bool,
) -> Result<()> {
    check_file_exists(profile_path, "Profile")?;
    check_file_exists(binary_path, "Binary")?;
    if let Some(config) = dispatch {
        check_source_root(config)?;
        if !quiet && warn_missing_line_info(binary_path, dwarf_resolver)? {
            eprintln!(
                "warning: no debug line info in binary, dispatch samples may stay unresolved"
            );
        }
    }
    Ok(())
}

/// Check that `path` exists and is a regular file
fn check_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!(
            "{what} not found: {}\n\n\
             Make sure the path is correct and the file exists.",
            path.display()
        );
    }
    if !path.is_file() {
        bail!("Not a file: {}\n\n{what} must be a file, not a directory.", path.display());
    }
    Ok(())
}

/// Check that both interpreter source files are present
fn check_source_root(config: &DispatchConfig) -> Result<()> {
    let root = &config.source_root;
    if !root.is_dir() {
        bail!(
            "Source root not found: {}\n\n\
             --source-root must point to the interpreter source directory.",
            root.display()
        );
    }

    for name in [&config.definitions_file, &config.entries_file] {
        let path = root.join(name);
        if !path.is_file() {
            bail!(
                "Interpreter source missing: {}\n\n\
                 Dispatch resolution needs both {} and {} in the source root.",
                path.display(),
                config.definitions_file,
                config.entries_file
            );
        }
    }
    Ok(())
}

/// Whether to warn that dispatch resolution will find no line tables
fn warn_missing_line_info(binary_path: &Path, dwarf_resolver: bool) -> Result<bool> {
    if !dwarf_resolver {
        return Ok(false);
    }
    Ok(!has_line_info(binary_path)?)
}

/// Whether the binary embeds a non-empty line table
///
/// Files `object` cannot parse count as having one; the resolver reports
/// its own error for those.
fn has_line_info(binary_path: &Path) -> Result<bool> {
    let file_data = std::fs::read(binary_path)
        .with_context(|| format!("Failed to read binary: {}", binary_path.display()))?;

    let Ok(obj) = object::File::parse(&*file_data) else {
        return Ok(true);
    };

    // Mach-O spells these __debug_line, object maps the ELF name for us
    Ok(obj.section_by_name(".debug_line").is_some_and(|s| s.size() > 0))
}
