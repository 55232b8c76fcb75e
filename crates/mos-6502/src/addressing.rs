//! Operand fetch and effective-address calculation.
//!
//! Zero-page pointers wrap within page zero. No dummy reads are issued;
//! every access here is a real fetch or data read.

use emu_core::Bus;

use crate::Mos6502;

/// Addressing modes that produce an effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// #$nn. The "address" is the operand byte itself.
    Imm,
    Zp,
    Zpx,
    Zpy,
    Abs,
    Abx,
    Aby,
    /// ($nn,X)
    Izx,
    /// ($nn),Y
    Izy,
}

impl Mos6502 {
    pub(crate) fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    pub(crate) fn fetch_word(&mut self, bus: &mut impl Bus) -> u16 {
        let low = self.fetch(bus);
        let high = self.fetch(bus);
        u16::from_le_bytes([low, high])
    }

    pub(crate) fn read_word(bus: &mut impl Bus, addr: u16) -> u16 {
        let low = bus.read(addr);
        let high = bus.read(addr.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }

    /// Pointer read from page zero; the high byte wraps to $00.
    pub(crate) fn read_word_zp(bus: &mut impl Bus, ptr: u8) -> u16 {
        let low = bus.read(u16::from(ptr));
        let high = bus.read(u16::from(ptr.wrapping_add(1)));
        u16::from_le_bytes([low, high])
    }

    /// JMP ($xxFF) fetches the high byte from $xx00 on NMOS parts.
    pub(crate) fn read_word_page_bug(bus: &mut impl Bus, addr: u16) -> u16 {
        let low = bus.read(addr);
        let high = bus.read((addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF));
        u16::from_le_bytes([low, high])
    }

    pub(crate) fn push(&mut self, bus: &mut impl Bus, value: u8) {
        let addr = self.regs.push();
        bus.write(addr, value);
    }

    pub(crate) fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        let addr = self.regs.pop();
        bus.read(addr)
    }

    pub(crate) fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.push(bus, high);
        self.push(bus, low);
    }

    pub(crate) fn pull_word(&mut self, bus: &mut impl Bus) -> u16 {
        let low = self.pull(bus);
        let high = self.pull(bus);
        u16::from_le_bytes([low, high])
    }

    /// Resolve the effective address for `mode`.
    ///
    /// Returns the address and whether indexing carried into the high
    /// byte. The caller decides whether that costs a cycle.
    pub(crate) fn operand(&mut self, bus: &mut impl Bus, mode: Mode) -> (u16, bool) {
        match mode {
            Mode::Imm => {
                let addr = self.regs.pc;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                (addr, false)
            }
            Mode::Zp => (u16::from(self.fetch(bus)), false),
            Mode::Zpx => (u16::from(self.fetch(bus).wrapping_add(self.regs.x)), false),
            Mode::Zpy => (u16::from(self.fetch(bus).wrapping_add(self.regs.y)), false),
            Mode::Abs => (self.fetch_word(bus), false),
            Mode::Abx => {
                let base = self.fetch_word(bus);
                Self::indexed(base, self.regs.x)
            }
            Mode::Aby => {
                let base = self.fetch_word(bus);
                Self::indexed(base, self.regs.y)
            }
            Mode::Izx => {
                let ptr = self.fetch(bus).wrapping_add(self.regs.x);
                (Self::read_word_zp(bus, ptr), false)
            }
            Mode::Izy => {
                let ptr = self.fetch(bus);
                let base = Self::read_word_zp(bus, ptr);
                Self::indexed(base, self.regs.y)
            }
        }
    }

    fn indexed(base: u16, index: u8) -> (u16, bool) {
        let addr = base.wrapping_add(u16::from(index));
        (addr, (addr as u8) < index)
    }

    /// Branch on `taken`, charging the taken and page-cross cycles.
    pub(crate) fn branch(&mut self, bus: &mut impl Bus, taken: bool) {
        let offset = self.fetch(bus) as i8;
        if taken {
            let target = self.regs.pc.wrapping_add_signed(i16::from(offset));
            self.cycle += 1;
            if (target ^ self.regs.pc) & 0xFF00 != 0 {
                self.cycle += 1;
            }
            self.regs.pc = target;
        }
    }
}
