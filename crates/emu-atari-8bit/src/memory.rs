//! The tagged 64KB address space.
//!
//! Every address carries one of three tags. RAM stores writes, ROM
//! discards them, and HARDWARE routes both directions to the chip
//! dispatcher. Banking is done by copying slices in and out of this one
//! array, so the CPU read path never needs to know what is mapped where.

use serde::{Deserialize, Serialize};

use crate::hardware::Hardware;

/// How the CPU sees an address.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKind {
    #[default]
    Ram,
    Rom,
    Hardware,
}

impl AccessKind {
    /// Compact code used in saved states.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Ram => 0,
            Self::Rom => 1,
            Self::Hardware => 2,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Ram),
            1 => Some(Self::Rom),
            2 => Some(Self::Hardware),
            _ => None,
        }
    }
}

pub struct AddressSpace {
    bytes: Box<[u8; 0x10000]>,
    kinds: Box<[AccessKind; 0x10000]>,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressSpace").finish_non_exhaustive()
    }
}

impl AddressSpace {
    /// All RAM, all zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: Box::new([0; 0x10000]),
            kinds: Box::new([AccessKind::Ram; 0x10000]),
        }
    }

    /// CPU read. HARDWARE addresses are forwarded to `io`.
    pub fn read<H: Hardware + ?Sized>(&self, addr: u16, io: &mut H) -> u8 {
        match self.kinds[usize::from(addr)] {
            AccessKind::Hardware => io.read(addr),
            _ => self.bytes[usize::from(addr)],
        }
    }

    /// CPU write. ROM silently ignores the store.
    pub fn write<H: Hardware + ?Sized>(&mut self, addr: u16, value: u8, io: &mut H) {
        match self.kinds[usize::from(addr)] {
            AccessKind::Ram => self.bytes[usize::from(addr)] = value,
            AccessKind::Rom => {}
            AccessKind::Hardware => io.write(addr, value),
        }
    }

    /// Retag `lo..=hi`.
    pub fn mark_region(&mut self, lo: u16, hi: u16, kind: AccessKind) {
        if lo <= hi {
            self.kinds[usize::from(lo)..=usize::from(hi)].fill(kind);
        }
    }

    #[must_use]
    pub fn kind(&self, addr: u16) -> AccessKind {
        self.kinds[usize::from(addr)]
    }

    /// The stored byte, whatever the tag.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.bytes[usize::from(addr)]
    }

    /// Store regardless of the tag.
    pub fn poke(&mut self, addr: u16, value: u8) {
        self.bytes[usize::from(addr)] = value;
    }

    /// Copy `data` in at `addr` without touching tags. Stops at $FFFF.
    pub fn copy_rom(&mut self, addr: u16, data: &[u8]) {
        let start = usize::from(addr);
        let len = data.len().min(0x10000 - start);
        self.bytes[start..start + len].copy_from_slice(&data[..len]);
    }

    /// Fill `len` bytes from `addr` with `value`. Stops at $FFFF.
    pub fn fill(&mut self, addr: u16, value: u8, len: usize) {
        let start = usize::from(addr);
        let end = (start + len).min(0x10000);
        self.bytes[start..end].fill(value);
    }

    /// Copy the bytes at `addr` out into `buf`.
    pub fn copy_out(&self, addr: u16, buf: &mut [u8]) {
        let start = usize::from(addr);
        let len = buf.len().min(0x10000 - start);
        buf[..len].copy_from_slice(&self.bytes[start..start + len]);
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..]
    }

    /// Tags as saved-state codes.
    #[must_use]
    pub fn kind_codes(&self) -> Vec<u8> {
        self.kinds.iter().map(|kind| kind.code()).collect()
    }

    /// Replace contents and tags from a saved state. Returns `false` if
    /// either slice is the wrong length or a tag code is unknown, leaving
    /// the address space untouched.
    pub fn restore(&mut self, bytes: &[u8], kind_codes: &[u8]) -> bool {
        if bytes.len() != 0x10000 || kind_codes.len() != 0x10000 {
            return false;
        }
        let mut kinds = Box::new([AccessKind::Ram; 0x10000]);
        for (slot, &code) in kinds.iter_mut().zip(kind_codes) {
            match AccessKind::from_code(code) {
                Some(kind) => *slot = kind,
                None => return false,
            }
        }
        self.bytes.copy_from_slice(bytes);
        self.kinds = kinds;
        true
    }
}
