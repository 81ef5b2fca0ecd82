//! # pcprof - Main Entry Point
//!
//! Parses the profile, resolves symbols for the target binary and prints
//! the ranked report to stdout. Any fatal error exits non-zero before
//! anything is printed.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::io::{self, BufWriter};

use pcprof::cli::{Args, ReportFormat};
use pcprof::domain::{FormatError, ProfilerError};
use pcprof::pipeline::Pipeline;
use pcprof::preflight::run_preflight_checks;
use pcprof::symbolization::{
    DispatchResolver, DwarfLocator, ExternalDisassembler, ExternalLocator, LocationResolver,
    ToolCommand,
};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_FORMAT: i32 = 65;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let bad_profile = err.chain().any(|cause| {
        cause.downcast_ref::<FormatError>().is_some()
            || matches!(cause.downcast_ref::<ProfilerError>(), Some(ProfilerError::Format(_)))
    });
    if bad_profile {
        EXIT_FORMAT
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let dispatch_config = args.dispatch_config();

    run_preflight_checks(
        &args.profile,
        &args.binary,
        dispatch_config.as_ref(),
        args.uses_dwarf_resolver(),
        args.quiet,
    )?;

    let disassembler = ExternalDisassembler::new(
        ToolCommand::parse(&args.disassembler).context("Invalid --disassembler command")?,
    );
    let locator: Box<dyn LocationResolver> = if args.uses_dwarf_resolver() {
        Box::new(DwarfLocator::new())
    } else {
        Box::new(ExternalLocator::new(
            ToolCommand::parse(&args.resolver).context("Invalid --resolver command")?,
        ))
    };

    let mut pipeline = Pipeline::new(&disassembler, locator.as_ref()).with_demangling(args.demangle);
    if let Some(ref config) = dispatch_config {
        let resolver = DispatchResolver::load(config).context("Failed to load interpreter sources")?;
        pipeline = pipeline.with_dispatch(resolver);
    }

    let profile = pipeline
        .run(&args.profile, &args.binary)
        .with_context(|| format!("Failed to build report for {}", args.profile.display()))?;
    info!(
        "Resolved {} samples, {} dispatch overrides",
        profile.sample_count(),
        profile.mapping().override_count()
    );

    let mut report = profile.report();
    if args.flat_only {
        report = report.into_flat_only();
    }

    let stdout = BufWriter::new(io::stdout().lock());
    match args.format {
        ReportFormat::Text => report.write_text(stdout),
        ReportFormat::Json => report.write_json(stdout),
    }
    .context("Failed to write report")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_errors_exit_65() {
        let err = anyhow::Error::new(ProfilerError::from(FormatError::Truncated))
            .context("Failed to build report");
        assert_eq!(exit_code_for(&err), EXIT_FORMAT);
    }

    #[test]
    fn test_open_failure_exits_1() {
        let err = anyhow::Error::new(ProfilerError::Open {
            path: PathBuf::from("app.prof"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        })
        .context("Failed to build report");
        assert_eq!(exit_code_for(&err), EXIT_ERROR);
    }
}
