#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

/// Encode a little-endian 64-bit profile with the given records
pub fn encode_profile(records: &[(u64, &[u64])]) -> Vec<u8> {
    let mut bytes = vec![0u8; 8];
    bytes.extend_from_slice(&3i32.to_le_bytes());
    bytes.extend_from_slice(&0i32.to_le_bytes());
    for word in [0u64, 1000, 0] {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    for (ticks, pcs) in records {
        bytes.extend_from_slice(&ticks.to_le_bytes());
        bytes.extend_from_slice(&(pcs.len() as u64).to_le_bytes());
        for pc in *pcs {
            bytes.extend_from_slice(&pc.to_le_bytes());
        }
    }
    bytes.extend_from_slice(&0u64.to_le_bytes());
    bytes.extend_from_slice(&0u64.to_le_bytes());
    bytes
}

pub fn write_temp(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

pub const LISTING: &str = "\
/tmp/ruby:
(__TEXT,__text) section
_leaf_fn:
0000000000000100\tpushq\t%rbp
_caller_fn:
0000000000000200\tcallq\t_leaf_fn
_vm_exec_core:
0000000000000300\tmovq\t(%rbx), %rax
0000000000000304\tcallq\t_rb_ary_push
0000000000000308\tjmpq\t*%rax
";

pub const INSNS_DEF: &str = "\
DEFINE_INSN
putobject
(VALUE val)
{
    PUSH(val);
}
";

pub const VM_INC: &str = "\
INSN_ENTRY(nop){
}
INSN_ENTRY(opt_plus){
  VALUE recv = TOPN(1);
  PUSH(recv);
}
";
