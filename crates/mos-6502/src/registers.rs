//! 6502 register file.

use crate::Status;

/// Register file.
///
/// The stack lives at $0100-$01FF and grows downward; S points at the
/// next free slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    /// Stack pointer.
    pub s: u8,
    pub pc: u16,
    /// Processor status.
    pub p: Status,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Registers as left by the reset sequence (PC still to be loaded).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFF,
            pc: 0,
            p: Status(0x34),
        }
    }

    /// Claim a stack slot, returning the address to write.
    pub fn push(&mut self) -> u16 {
        let addr = self.stack_addr();
        self.s = self.s.wrapping_sub(1);
        addr
    }

    /// Release a stack slot, returning the address to read.
    pub fn pop(&mut self) -> u16 {
        self.s = self.s.wrapping_add(1);
        self.stack_addr()
    }

    #[must_use]
    pub const fn stack_addr(&self) -> u16 {
        0x0100 | (self.s as u16)
    }
}
