//! Copy-in/copy-out bank window.

use log::trace;

use crate::memory::AddressSpace;

/// A fixed window of the address space backed by equally sized slots.
///
/// Exactly one slot is live at a time. Its contents sit in the address
/// space; the backing copy is stale until the slot is switched out.
#[derive(Debug, Clone)]
pub struct BankWindow {
    base: u16,
    size: usize,
    slots: Vec<u8>,
    live: usize,
}

impl BankWindow {
    /// `count` slots of `size` bytes at `base`, slot 0 live.
    #[must_use]
    pub fn new(base: u16, size: usize, count: usize) -> Self {
        Self {
            base,
            size,
            slots: vec![0; size * count.max(1)],
            live: 0,
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.slots.len() / self.size
    }

    #[must_use]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Make slot `bank` live. Out-of-range indices wrap.
    pub fn select(&mut self, memory: &mut AddressSpace, bank: usize) {
        let bank = bank % self.count();
        if bank == self.live {
            return;
        }
        trace!("bank ${:04X}: {} -> {}", self.base, self.live, bank);
        let out = self.live * self.size;
        memory.copy_out(self.base, &mut self.slots[out..out + self.size]);
        let incoming = bank * self.size;
        memory.copy_rom(self.base, &self.slots[incoming..incoming + self.size]);
        self.live = bank;
    }

    /// Backing copy of a slot. Stale for the live slot.
    #[must_use]
    pub fn slot(&self, bank: usize) -> Option<&[u8]> {
        let start = bank.checked_mul(self.size)?;
        self.slots.get(start..start + self.size)
    }

    #[must_use]
    pub fn slots(&self) -> &[u8] {
        &self.slots
    }

    /// Restore backing store and live slot from a saved state.
    pub fn restore(&mut self, slots: &[u8], live: usize) -> bool {
        if slots.len() != self.slots.len() || live >= self.count() {
            return false;
        }
        self.slots.copy_from_slice(slots);
        self.live = live;
        true
    }
}
