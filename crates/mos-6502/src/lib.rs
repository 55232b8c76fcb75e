//! NMOS 6502 core as used in the Atari 8-bit computers and the 5200.
//!
//! Instructions execute whole. Cycle counts come from a per-opcode table
//! plus page-cross and branch penalties, which is what the Atari's
//! scan-line timing needs. The full undocumented opcode set is
//! implemented, including the unstable ANE/LXA/SHx group, along with the
//! $D2/$F2 escape opcodes used to patch the OS.

mod addressing;
mod alu;
mod cpu;
mod execute;
pub mod flags;
mod registers;
mod timing;

pub use cpu::{
    CpuState, Crash, CrashKind, IRQ_VECTOR, Mos6502, NMI_VECTOR, RESET_VECTOR, RunOutcome,
    SystemBus, Variant,
};
pub use flags::Status;
pub use registers::Registers;
pub use timing::base_cycles;
