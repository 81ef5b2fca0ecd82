//! # Symbol Resolution
//!
//! Turns raw program counters from the sample stream into names.
//!
//! ## Layers
//!
//! ```text
//! disassembly listing ──▶ SymbolTable ──────────────┐
//!                             │                     ▼
//!                             │ dispatch-core   SymbolMapping ──▶ report
//!                             ▼ addresses           ▲
//!   location resolver ──▶ DispatchResolver ─────────┘
//!   interpreter sources ──┘     (overrides)
//! ```
//!
//! - **`symbol_table`**: base layer, one entry per instruction address in
//!   the disassembly listing
//! - **`dispatch_resolver`**: re-attributes addresses inside the interpreter
//!   dispatch loop to the operation they execute
//! - **`source_files`**: interpreter source files and the backward marker
//!   scans
//! - **`symbol_mapping`**: override, base, hex fallback lookup chain
//! - **`tools`**: external disassembler and location resolver commands
//! - **`dwarf`**: in-process location resolver reading DWARF line tables
//!
//! ## External tools
//!
//! The default commands are the macOS developer tools:
//!
//! ```text
//! otool -tV {binary}
//! atos -o {binary} -f {addresses}
//! ```
//!
//! On Linux, `objdump -d --no-show-raw-insn {binary}` produces a listing the
//! symbol table understands, and the `dwarf` resolver replaces `atos`.
//!
//! ## Limitations
//!
//! - **Instruction boundaries only**: addresses that never appear in the
//!   listing fall back to hex even when they lie inside a known function
//! - **Debug info required**: dispatch resolution needs source line tables
//! - **Line numbering**: interpreter files are addressed with the 1-based
//!   line numbers the resolver prints

pub mod dispatch_resolver;
pub mod dwarf;
pub mod source_files;
pub mod symbol_mapping;
pub mod symbol_table;
pub mod tools;

pub use dispatch_resolver::{DispatchConfig, DispatchResolver};
pub use dwarf::DwarfLocator;
pub use source_files::{InterpreterSource, SourceKind};
pub use symbol_mapping::SymbolMapping;
pub use symbol_table::SymbolTable;
pub use tools::{
    DisassemblyLister, ExternalDisassembler, ExternalLocator, LocationResolver, ToolCommand,
};
