// String formatting intentionally uses format! for clarity
#![allow(clippy::format_push_string)]

use addr2line::Context;
use gimli::{EndianRcSlice, RunTimeEndian};
use log::debug;
use object::{Object, ObjectSection};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use crate::domain::{Address, ResolutionError};
use crate::symbolization::tools::LocationResolver;

type DwarfContext = Context<EndianRcSlice<RunTimeEndian>>;

/// In-process replacement for an external address-to-line tool
///
/// Reads DWARF line information from the binary and prints one line per
/// address in the shape `function (in binary) (file:line)`. Addresses
/// without a source location print as bare `0x` hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct DwarfLocator;

impl DwarfLocator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LocationResolver for DwarfLocator {
    fn locate(&self, binary: &Path, addrs: &[Address]) -> Result<Vec<String>, ResolutionError> {
        let ctx = load_context(binary)?;
        let image = binary
            .file_name()
            .map_or_else(|| binary.to_string_lossy(), |name| name.to_string_lossy())
            .into_owned();

        Ok(addrs.iter().map(|&addr| describe(&ctx, &image, addr)).collect())
    }
}

fn load_context(binary: &Path) -> Result<DwarfContext, ResolutionError> {
    let binary_data = fs::read(binary).map_err(|e| {
        ResolutionError::Dwarf(format!("Failed to read {}: {e}", binary.display()))
    })?;

    let obj_file = object::File::parse(&*binary_data)
        .map_err(|e| ResolutionError::Dwarf(format!("Failed to parse object file: {e}")))?;

    let endian = if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

    let load_section =
        |id: gimli::SectionId| -> Result<EndianRcSlice<RunTimeEndian>, gimli::Error> {
            let data = obj_file
                .section_by_name(id.name())
                .and_then(|section| section.uncompressed_data().ok())
                .unwrap_or(std::borrow::Cow::Borrowed(&[][..]));
            Ok(EndianRcSlice::new(Rc::from(&*data), endian))
        };

    let dwarf = gimli::Dwarf::load(&load_section)
        .map_err(|e| ResolutionError::Dwarf(format!("Failed to load DWARF sections: {e}")))?;
    Context::from_dwarf(dwarf)
        .map_err(|e| ResolutionError::Dwarf(format!("Failed to load DWARF debug information: {e}")))
}

/// Innermost frame for `addr`, formatted like `atos` output
fn describe(ctx: &DwarfContext, image: &str, addr: Address) -> String {
    // Units keep zero-based ranges for code the linker discarded
    if addr.0 == 0 {
        return format!("0x{:x}", addr.0);
    }

    let Ok(mut frames) = ctx.find_frames(addr.0).skip_all_loads() else {
        return format!("0x{:x}", addr.0);
    };

    let Ok(Some(frame)) = frames.next() else {
        debug!("No DWARF frame for {addr}");
        return format!("0x{:x}", addr.0);
    };

    let function = frame
        .function
        .and_then(|f| f.demangle().ok().map(|s| s.to_string()))
        .unwrap_or_else(|| format!("0x{:x}", addr.0));

    let mut output = format!("{function} (in {image})");
    if let Some(loc) = frame.location {
        if let (Some(file), Some(line)) = (loc.file, loc.line) {
            output.push_str(&format!(" ({file}:{line})"));
        }
    }
    output
}
