//! Sample stream decoding
//!
//! - `parser`: reads the binary profile header and sample records
//! - `sample_set`: distinct stacks with accumulated tick counts

pub mod parser;
pub mod sample_set;

pub use parser::{parse_profile, parse_profile_file, ParsedProfile, ProfileHeader};
pub use sample_set::SampleSet;
