//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// Every processor access goes through this trait, opcode and operand
/// fetches included. Implementations decode the address and route it to
/// RAM, ROM or a hardware register.
pub trait Bus {
    /// Read a byte from the given address. Reads may have side effects.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

/// A flat 64KB RAM bus with no decoding.
///
/// Used by processor tests and as a scratch machine for tools.
#[derive(Clone)]
pub struct SimpleBus {
    memory: Box<[u8; 0x10000]>,
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimpleBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleBus").finish_non_exhaustive()
    }
}

impl SimpleBus {
    /// Create a bus with all 64KB cleared.
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
        }
    }

    /// Copy `data` into memory at `address`, wrapping past $FFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.memory[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    /// Store a little-endian word, typically a vector.
    pub fn set_word(&mut self, address: u16, value: u16) {
        self.load(address, &value.to_le_bytes());
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_wraps_at_top_of_memory() {
        let mut bus = SimpleBus::new();
        bus.load(0xFFFF, &[0x11, 0x22]);
        assert_eq!(bus.peek(0xFFFF), 0x11);
        assert_eq!(bus.peek(0x0000), 0x22);
    }

    #[test]
    fn set_word_is_little_endian() {
        let mut bus = SimpleBus::new();
        bus.set_word(0xFFFC, 0xE477);
        assert_eq!(bus.read(0xFFFC), 0x77);
        assert_eq!(bus.read(0xFFFD), 0xE4);
    }
}
