//! CPU-side address routing.
//!
//! RAM and ROM are served straight from the address space. HARDWARE
//! addresses go to the cartridge if it claims them, otherwise to the chip
//! dispatcher. On XL/XE a write to PORTB also reaches the MMU first.

use emu_core::Bus;
use mos_6502::{Registers, SystemBus};

use crate::cartridge::Cartridge;
use crate::config::MachineType;
use crate::hardware::Hardware;
use crate::memory::AccessKind;
use crate::mmu::Mmu;
use crate::patch::OsPatch;

/// Borrowed view of the machine for the duration of a CPU run.
pub struct AtariBus<'a> {
    pub mmu: &'a mut Mmu,
    pub cart: &'a mut Cartridge,
    pub hardware: &'a mut dyn Hardware,
    pub patch: Option<&'a mut dyn OsPatch>,
}

/// PIA port B and its mirrors.
fn is_portb(addr: u16) -> bool {
    addr & 0xFF03 == 0xD301
}

impl Bus for AtariBus<'_> {
    fn read(&mut self, address: u16) -> u8 {
        let memory = self.mmu.memory();
        if memory.kind(address) == AccessKind::Hardware && self.cart.owns(address) {
            return self.cart.read(address, self.mmu);
        }
        memory.read(address, &mut *self.hardware)
    }

    fn write(&mut self, address: u16, value: u8) {
        if self.mmu.memory().kind(address) == AccessKind::Hardware {
            if self.cart.owns(address) {
                self.cart.write(address, value, self.mmu);
                return;
            }
            if self.mmu.machine() == MachineType::XlXe && is_portb(address) {
                self.mmu.write_portb(value);
            }
            self.hardware.write(address, value);
            return;
        }
        self.mmu.memory_mut().write(address, value, &mut *self.hardware);
    }
}

impl SystemBus for AtariBus<'_> {
    fn escape(&mut self, code: u8, regs: &mut Registers) -> bool {
        match self.patch.as_deref_mut() {
            Some(patch) => patch.run_esc(code, regs, self.mmu.memory_mut()),
            None => false,
        }
    }

    fn take_wsync(&mut self) -> Option<u32> {
        self.hardware.take_wsync()
    }
}
