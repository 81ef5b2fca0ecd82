//! External symbolization tools
//!
//! The disassembler and the address-to-source resolver are platform
//! commands (`otool`, `atos`, `objdump`, ...). They are described by a
//! command template where `{binary}` expands to the target binary and
//! `{addresses}` to a temporary file holding the address batch.

use log::debug;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::NamedTempFile;

use crate::domain::{Address, ResolutionError};

pub const BINARY_PLACEHOLDER: &str = "{binary}";
pub const ADDRESSES_PLACEHOLDER: &str = "{addresses}";

pub const DEFAULT_DISASSEMBLER: &str = "otool -tV {binary}";
pub const DEFAULT_RESOLVER: &str = "atos -o {binary} -f {addresses}";

/// Produces the textual disassembly listing of a binary
pub trait DisassemblyLister {
    /// # Errors
    /// Returns an error if the listing cannot be produced
    fn listing(&self, binary: &Path) -> Result<Vec<String>, ResolutionError>;
}

/// Maps a batch of addresses to one source-location line per address
pub trait LocationResolver {
    /// # Errors
    /// Returns an error if the batch cannot be resolved at all
    fn locate(&self, binary: &Path, addrs: &[Address]) -> Result<Vec<String>, ResolutionError>;
}

/// A whitespace-split command line with placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
}

impl ToolCommand {
    /// Parse a command template such as `atos -o {binary} -f {addresses}`
    ///
    /// # Errors
    /// Returns [`ResolutionError::EmptyCommand`] for a blank template
    pub fn parse(template: &str) -> Result<Self, ResolutionError> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(ResolutionError::EmptyCommand)?;
        Ok(Self { program, args: parts.collect() })
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with placeholders expanded
    #[must_use]
    pub fn expand(&self, binary: &Path, addresses: Option<&Path>) -> Vec<String> {
        let binary = binary.to_string_lossy();
        let addresses = addresses.map(Path::to_string_lossy);
        self.args
            .iter()
            .map(|arg| {
                let arg = arg.replace(BINARY_PLACEHOLDER, &binary);
                match addresses {
                    Some(ref file) => arg.replace(ADDRESSES_PLACEHOLDER, file),
                    None => arg,
                }
            })
            .collect()
    }

    /// Run the command to completion and return its stdout lines
    ///
    /// # Errors
    /// Returns an error if the process cannot be spawned or exits unsuccessfully
    pub fn run(
        &self,
        binary: &Path,
        addresses: Option<&Path>,
    ) -> Result<Vec<String>, ResolutionError> {
        let args = self.expand(binary, addresses);
        debug!("Running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program).args(&args).output().map_err(|source| {
            ResolutionError::Spawn { tool: self.program.clone(), source }
        })?;

        if !output.status.success() {
            return Err(ResolutionError::ToolFailed {
                tool: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).lines().map(str::to_string).collect())
    }
}

/// Disassembly listing from an external command
#[derive(Debug, Clone)]
pub struct ExternalDisassembler {
    command: ToolCommand,
}

impl ExternalDisassembler {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

impl DisassemblyLister for ExternalDisassembler {
    fn listing(&self, binary: &Path) -> Result<Vec<String>, ResolutionError> {
        self.command.run(binary, None)
    }
}

/// Source locations from an external command fed through a temporary file
#[derive(Debug, Clone)]
pub struct ExternalLocator {
    command: ToolCommand,
}

impl ExternalLocator {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

impl LocationResolver for ExternalLocator {
    fn locate(&self, binary: &Path, addrs: &[Address]) -> Result<Vec<String>, ResolutionError> {
        // The file is unlinked when `batch` drops, including on error returns
        let batch = write_address_batch(addrs)?;
        self.command.run(binary, Some(batch.path()))
    }
}

/// Write addresses as space-separated 16-digit hex into a fresh temp file
fn write_address_batch(addrs: &[Address]) -> Result<NamedTempFile, ResolutionError> {
    let mut file = tempfile::Builder::new()
        .prefix("addresses")
        .tempfile()
        .map_err(ResolutionError::TempFile)?;

    let joined = addrs.iter().map(|a| a.to_hex()).collect::<Vec<_>>().join(" ");
    file.write_all(joined.as_bytes()).map_err(ResolutionError::TempFile)?;
    file.flush().map_err(ResolutionError::TempFile)?;

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_blank_template() {
        assert!(matches!(ToolCommand::parse("   "), Err(ResolutionError::EmptyCommand)));
    }

    #[test]
    fn test_expand_placeholders() {
        let cmd = ToolCommand::parse(DEFAULT_RESOLVER).unwrap();
        assert_eq!(cmd.program(), "atos");

        let args = cmd.expand(Path::new("./ruby"), Some(Path::new("/tmp/addrs")));
        assert_eq!(args, vec!["-o", "./ruby", "-f", "/tmp/addrs"]);
    }

    #[test]
    fn test_expand_without_address_file_keeps_placeholder() {
        let cmd = ToolCommand::parse("tool {binary} {addresses}").unwrap();
        let args = cmd.expand(Path::new("bin"), None);
        assert_eq!(args, vec!["bin", "{addresses}"]);
    }

    #[test]
    fn test_address_batch_contents() {
        let batch = write_address_batch(&[Address(0x100), Address(0xabc)]).unwrap();
        let contents = std::fs::read_to_string(batch.path()).unwrap();
        assert_eq!(contents, "0000000000000100 0000000000000abc");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let cmd = ToolCommand::parse("pcprof-definitely-missing-tool {binary}").unwrap();
        let err = cmd.run(Path::new("bin"), None).unwrap_err();
        assert!(matches!(err, ResolutionError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_tool_failure() {
        let cmd = ToolCommand::parse("false").unwrap();
        let err = cmd.run(Path::new("bin"), None).unwrap_err();
        assert!(matches!(err, ResolutionError::ToolFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_locator_removes_batch_file() {
        let cmd = ToolCommand::parse("echo {addresses}").unwrap();
        let locator = ExternalLocator::new(cmd);
        let lines = locator.locate(Path::new("bin"), &[Address(0x1)]).unwrap();

        assert_eq!(lines.len(), 1);
        assert!(!Path::new(lines[0].trim()).exists());
    }
}
