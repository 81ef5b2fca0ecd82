//! Decoder for the binary call-stack sampling format
//!
//! Layout (all words little-endian):
//!
//! ```text
//! offset  field
//! 0       8 zero bytes            64-bit word marker
//! 8       i32, i32                endianness probe, first == 3
//! 16      u64 version             must be 0
//! 24      u64 period              sampling period, informational
//! 32      u64 reserved
//! 40..    { u64 ticks, u64 n, n x u64 pc }   until ticks == 0
//! ```

use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::domain::{Address, FormatError, ProfilerError, Stack};
use crate::sampling::SampleSet;

/// Endianness probe value in the first word for little-endian profiles
const ENDIAN_MARKER: i32 = 3;

/// Only profile version understood by the parser
const SUPPORTED_VERSION: u64 = 0;

/// Upper bound on frames pre-allocated from an untrusted `pc_count`
const MAX_PREALLOCATED_FRAMES: usize = 1024;

/// Fixed header fields following the format markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileHeader {
    pub version: u64,
    pub period: u64,
}

/// A fully decoded profile
#[derive(Debug, Clone)]
pub struct ParsedProfile {
    pub header: ProfileHeader,
    pub samples: SampleSet,
}

/// Decode a complete profile from `reader`
///
/// # Errors
/// Returns a [`FormatError`] for an unsupported header or a stream that ends
/// before the terminating zero-tick record.
pub fn parse_profile<R: Read>(mut reader: R) -> Result<ParsedProfile, FormatError> {
    let header = read_header(&mut reader)?;
    let samples = read_samples(&mut reader)?;

    info!(
        "Parsed profile: period={}, {} ticks across {} distinct stacks",
        header.period,
        samples.total_ticks(),
        samples.len()
    );

    Ok(ParsedProfile { header, samples })
}

/// Open and decode a profile file
///
/// # Errors
/// Returns [`ProfilerError::Open`] if the file cannot be opened, otherwise
/// the [`FormatError`] from [`parse_profile`].
pub fn parse_profile_file<P: AsRef<Path>>(path: P) -> Result<ParsedProfile, ProfilerError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|source| ProfilerError::Open { path: path.to_path_buf(), source })?;
    Ok(parse_profile(BufReader::new(file))?)
}

fn read_header<R: Read>(reader: &mut R) -> Result<ProfileHeader, FormatError> {
    let mut width = [0u8; 8];
    read_exact(reader, &mut width)?;
    if width.iter().any(|&b| b != 0) {
        return Err(FormatError::UnsupportedBitWidth);
    }

    let first = read_i32(reader)?;
    let second = read_i32(reader)?;
    if first != ENDIAN_MARKER {
        if second == ENDIAN_MARKER {
            return Err(FormatError::BigEndianUnsupported);
        }
        return Err(FormatError::InvalidEndianness { first, second });
    }

    let version = read_u64(reader)?;
    let period = read_u64(reader)?;
    let _reserved = read_u64(reader)?;

    if version != SUPPORTED_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }

    Ok(ProfileHeader { version, period })
}

fn read_samples<R: Read>(reader: &mut R) -> Result<SampleSet, FormatError> {
    let mut samples = SampleSet::new();

    loop {
        let ticks = read_u64(reader)?;
        let pc_count = read_u64(reader)?;
        // A zero-tick record terminates the stream
        if ticks == 0 {
            debug!("Reached terminator record");
            break;
        }

        let capacity = usize::try_from(pc_count).unwrap_or(usize::MAX).min(MAX_PREALLOCATED_FRAMES);
        let mut frames = Vec::with_capacity(capacity);
        for _ in 0..pc_count {
            frames.push(Address(read_u64(reader)?));
        }

        samples.record(Stack::new(frames), ticks);
    }

    Ok(samples)
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), FormatError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            FormatError::Truncated
        } else {
            FormatError::Io(e)
        }
    })
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64, FormatError> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32, FormatError> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf)?;
    Ok(i32::from_le_bytes(buf))
}
