//! # pcprof - Symbol-level reports for call-stack sampling profiles
//!
//! pcprof reads the binary profile written by a statistical sampler and
//! attributes every sampled program counter to a function. Samples landing
//! in an interpreter's instruction-dispatch loop are attributed further, to
//! the individual operation being dispatched.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐        ┌────────────────────────────────────────────┐
//! │ profile file │        │              target binary                 │
//! └──────┬───────┘        └─────────┬───────────────────────┬──────────┘
//!        │                          │ disassembler          │ location resolver
//!        ▼                          ▼                       ▼
//! ┌──────────────┐        ┌──────────────────┐    ┌──────────────────────┐
//! │   Sampling   │        │   SymbolTable    │───▶│  DispatchResolver    │◀── interpreter
//! │   (parser)   │        │  (base layer)    │    │  (override layer)    │    sources
//! └──────┬───────┘        └────────┬─────────┘    └──────────┬───────────┘
//!        │                         └──────────┬──────────────┘
//!        │                                    ▼
//!        │                           ┌──────────────────┐
//!        └──────────────────────────▶│  Profile model   │──▶ text / JSON report
//!                                    └──────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`sampling`]: binary profile decoding into distinct stacks with tick counts
//! - [`symbolization`]: address to name resolution
//!   - `symbol_table`: function names from a disassembly listing
//!   - `dispatch_resolver`: dispatch-loop addresses to interpreter operations
//!   - `symbol_mapping`: override, base, hex fallback lookup chain
//!   - `tools` / `dwarf`: external commands and the in-process DWARF resolver
//! - [`analysis`]: flat and cumulative aggregation, report rows
//! - [`pipeline`]: wires the stages together
//! - [`preflight`]: input validation before any tool runs
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: core types (Address, Stack, SymbolName) and errors
//!
//! ## Typical Usage
//!
//! ```bash
//! # macOS, using otool and atos
//! pcprof ruby.prof ./ruby --source-root ~/src/ruby
//!
//! # Linux, using objdump and DWARF line tables
//! pcprof ruby.prof ./ruby --disassembler 'objdump -d --no-show-raw-insn {binary}' --resolver dwarf
//! ```
//!
//! ## Key Concepts
//!
//! - **Flat weight**: ticks where a function is the leaf frame
//! - **Cumulative weight**: ticks where a function is anywhere on the stack
//! - **Dispatch core**: the interpreter loop whose samples are re-attributed
//! - **Carry-forward**: dispatch addresses resolved into inlined helpers take
//!   the location of the nearest preceding interpreter-source address

pub mod analysis;
pub mod cli;
pub mod domain;
pub mod pipeline;
pub mod preflight;
pub mod sampling;
pub mod symbolization;
