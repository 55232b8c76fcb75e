//! 6502 processor status register (P).
//!
//! On the Atari the B and unused bits always read back as set; only the
//! copy pushed by IRQ and NMI has B clear.

/// Carry.
pub const C: u8 = 0x01;

/// Zero.
pub const Z: u8 = 0x02;

/// Interrupt disable. IRQ is ignored while set; NMI is not.
pub const I: u8 = 0x04;

/// Decimal mode for ADC and SBC.
pub const D: u8 = 0x08;

/// Break. Only meaningful in a pushed copy of P.
pub const B: u8 = 0x10;

/// Unused bit.
pub const U: u8 = 0x20;

/// Overflow.
pub const V: u8 = 0x40;

/// Negative.
pub const N: u8 = 0x80;

/// Processor status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status(pub u8);

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

impl Status {
    /// Status with only B and U set.
    #[must_use]
    pub const fn new() -> Self {
        Self(B | U)
    }

    /// Load from a pulled or restored byte. B and U are forced on.
    #[must_use]
    pub const fn from_byte(value: u8) -> Self {
        Self((value & !(B | U)) | B | U)
    }

    /// Value pushed by PHP and BRK.
    #[must_use]
    pub const fn to_byte_brk(self) -> u8 {
        self.0 | B | U
    }

    /// Value pushed by IRQ and NMI entry.
    #[must_use]
    pub const fn to_byte_irq(self) -> u8 {
        (self.0 | U) & !B
    }

    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Clear a flag. B and U cannot be cleared.
    pub fn clear(&mut self, flag: u8) {
        self.0 = (self.0 & !flag) | B | U;
    }

    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Update N and Z from a result.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }
}
