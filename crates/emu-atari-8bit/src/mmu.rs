//! Memory management: machine memory maps, the XL/XE PORTB register and
//! the cartridge windows at $8000-$9FFF and $A000-$BFFF.
//!
//! ROM overlays are implemented by copying. Whenever a ROM is switched in
//! over RAM, the RAM contents are saved to an "under" buffer and restored
//! when the ROM goes away. With too little RAM behind a window the window
//! reads as $FF instead.

use std::fmt;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::banks::BankWindow;
use crate::config::{MachineConfig, MachineType, RamSize};
use crate::error::AtariError;
use crate::memory::{AccessKind, AddressSpace};

/// Self-test ROM within the OS image, and its saved RAM in `under_os`.
const SELFTEST: std::ops::Range<usize> = 0x1000..0x1800;
const SELFTEST_LEN: usize = 0x0800;
const UPPER_OS_OFFSET: usize = 0x1800;
const UPPER_OS_LEN: usize = 0x2800;
const BANK_SIZE: usize = 0x4000;

/// Decides when the XL/XE built-in BASIC is switched out.
pub trait BasicSwitch: fmt::Debug {
    fn basic_disabled(&self, portb: u8, ram: RamSize) -> bool;
}

/// Stock XL/XE wiring: PORTB bit 1 set disables BASIC, as does extended
/// memory access on the 576K and 1088K upgrades.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortbBasicSwitch;

impl BasicSwitch for PortbBasicSwitch {
    fn basic_disabled(&self, portb: u8, ram: RamSize) -> bool {
        portb & 0x02 != 0
            || (portb & 0x10 == 0 && matches!(ram, RamSize::K576 | RamSize::K1088))
    }
}

/// Overlay and banking state, in save order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MmuState {
    pub machine: MachineType,
    pub ram: RamSize,
    pub portb: u8,
    pub selftest: bool,
    pub cart_809f: bool,
    pub cart_a0bf: bool,
    pub trig3: bool,
    pub antic_bank: Option<usize>,
    pub xe_bank: usize,
    pub xe_memory: Vec<u8>,
    pub under_os: Vec<u8>,
    pub under_basic: Vec<u8>,
    pub under_809f: Vec<u8>,
    pub under_a0bf: Vec<u8>,
}

pub struct Mmu {
    memory: AddressSpace,
    machine: MachineType,
    ram: RamSize,
    os: Vec<u8>,
    basic: Option<Vec<u8>>,
    basic_enabled: bool,
    basic_switch: Box<dyn BasicSwitch>,
    /// $C000-$CFFF at 0, self-test RAM at $1000, $D800-$FFFF at $1800.
    under_os: Vec<u8>,
    under_basic: Vec<u8>,
    under_809f: Vec<u8>,
    under_a0bf: Vec<u8>,
    xe: Option<BankWindow>,
    /// Bank ANTIC fetches from when it differs from the CPU's.
    antic_bank: Option<usize>,
    portb: u8,
    selftest: bool,
    cart_809f: bool,
    cart_a0bf: bool,
    trig3: bool,
}

impl fmt::Debug for Mmu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mmu")
            .field("machine", &self.machine)
            .field("ram", &self.ram)
            .field("portb", &format_args!("${:02X}", self.portb))
            .field("selftest", &self.selftest)
            .field("cart_809f", &self.cart_809f)
            .field("cart_a0bf", &self.cart_a0bf)
            .finish_non_exhaustive()
    }
}

impl Mmu {
    /// Validate `config` and lay out memory for it.
    pub fn new(config: &MachineConfig) -> Result<Self, AtariError> {
        Self::with_basic_switch(config, Box::new(PortbBasicSwitch))
    }

    pub fn with_basic_switch(
        config: &MachineConfig,
        basic_switch: Box<dyn BasicSwitch>,
    ) -> Result<Self, AtariError> {
        let machine = config.machine;
        if config.os_rom.len() != machine.os_size() {
            return Err(AtariError::BadRomSize {
                expected: machine.os_size(),
                actual: config.os_rom.len(),
            });
        }
        if let Some(basic) = &config.basic_rom {
            if basic.len() != 0x2000 {
                return Err(AtariError::BadBasicSize(basic.len()));
            }
        }
        if !config.ram.fits(machine) {
            return Err(AtariError::UnsupportedRam {
                machine: machine.name(),
                ram_kb: config.ram.kb(),
            });
        }

        let mut mmu = Self {
            memory: AddressSpace::new(),
            machine,
            ram: config.ram,
            os: config.os_rom.clone(),
            basic: config.basic_rom.clone(),
            basic_enabled: config.basic_enabled,
            basic_switch,
            under_os: vec![0; 0x4000],
            under_basic: vec![0; 0x2000],
            under_809f: vec![0; 0x2000],
            under_a0bf: vec![0; 0x2000],
            xe: None,
            antic_bank: None,
            portb: 0xFF,
            selftest: false,
            cart_809f: false,
            cart_a0bf: false,
            trig3: false,
        };
        mmu.init();
        Ok(mmu)
    }

    /// Power-on memory map. Cartridge windows start disabled.
    pub fn init(&mut self) {
        let kb = self.ram.kb() as usize;
        self.memory = AddressSpace::new();
        self.antic_bank = None;
        self.selftest = false;
        self.cart_809f = false;
        self.cart_a0bf = false;
        self.trig3 = false;
        self.portb = 0xFF;
        self.under_os.fill(0);
        self.under_basic.fill(0);
        self.under_809f.fill(0);
        self.under_a0bf.fill(0);

        let mem = &mut self.memory;
        match self.machine {
            MachineType::OsA | MachineType::OsB => {
                mem.copy_rom(0xD800, &self.os);
                if kb < 52 {
                    let top = kb * 1024;
                    mem.fill(top as u16, 0xFF, 0xD000 - top);
                    mem.mark_region(top as u16, 0xCFFF, AccessKind::Rom);
                }
                mem.mark_region(0xD000, 0xD7FF, AccessKind::Hardware);
                mem.mark_region(0xD800, 0xFFFF, AccessKind::Rom);
            }
            MachineType::XlXe => {
                mem.copy_rom(0xC000, &self.os);
                if kb == 16 {
                    mem.fill(0x4000, 0xFF, 0x8000);
                    mem.mark_region(0x4000, 0xCFFF, AccessKind::Rom);
                } else {
                    mem.mark_region(0xC000, 0xCFFF, AccessKind::Rom);
                }
                mem.mark_region(0xD000, 0xD7FF, AccessKind::Hardware);
                mem.mark_region(0xD800, 0xFFFF, AccessKind::Rom);
            }
            MachineType::A5200 => {
                mem.copy_rom(0xF800, &self.os);
                mem.mark_region(0x4000, 0xFFFF, AccessKind::Rom);
                mem.mark_region(0xC000, 0xC0FF, AccessKind::Hardware);
                mem.mark_region(0xD400, 0xD4FF, AccessKind::Hardware);
                mem.mark_region(0xE800, 0xE8FF, AccessKind::Hardware);
                mem.mark_region(0xEB00, 0xEBFF, AccessKind::Hardware);
            }
        }

        let banks = self.ram.xe_banks();
        self.xe = (banks > 0).then(|| BankWindow::new(0x4000, BANK_SIZE, banks));
        debug!(
            "memory map: {} with {} KB ({} XE banks)",
            self.machine.name(),
            self.ram.kb(),
            banks
        );
    }

    /// The XL/XE cold-start PORTB sequence: OS on, BASIC off, self-test off.
    pub fn power_on_portb(&mut self) {
        if self.machine == MachineType::XlXe {
            self.selftest = true;
            self.portb = 0x00;
            self.write_portb(0xFF);
        }
    }

    /// A CPU write to PORTB. Only meaningful on XL/XE.
    pub fn write_portb(&mut self, value: u8) {
        if self.machine != MachineType::XlXe {
            return;
        }
        let old = self.portb;
        trace!("PORTB ${old:02X} -> ${value:02X}");
        self.portb = value;
        self.handle_portb(value, old);
    }

    fn basic_hidden(&self, portb: u8) -> bool {
        self.basic.is_none() || self.basic_switch.basic_disabled(portb, self.ram)
    }

    fn handle_portb(&mut self, byte: u8, old: u8) {
        let kb = self.ram.kb();

        if let Some(xe) = self.xe.as_mut() {
            let bank = if byte & 0x10 == 0 {
                cpu_bank(self.ram, byte)
            } else {
                0
            };
            let compy = self.ram == RamSize::K320CompyShop;
            if self.selftest && (bank != xe.live() || (compy && byte & 0x20 == 0)) {
                self.memory.copy_rom(0x5000, &self.under_os[SELFTEST]);
                self.memory.mark_region(0x5000, 0x57FF, AccessKind::Ram);
                self.selftest = false;
            }
            xe.select(&mut self.memory, bank);
            if matches!(self.ram, RamSize::K128 | RamSize::K320CompyShop) {
                self.antic_bank = match byte & 0x30 {
                    0x20 => Some(0),
                    0x10 => Some(antic_extended_bank(self.ram, byte)),
                    _ => None,
                };
            }
        }

        if (old ^ byte) & 0x01 != 0 {
            if byte & 0x01 != 0 {
                if kb > 48 {
                    self.memory.copy_out(0xC000, &mut self.under_os[..0x1000]);
                    self.memory.copy_out(0xD800, &mut self.under_os[UPPER_OS_OFFSET..]);
                    self.memory.mark_region(0xC000, 0xCFFF, AccessKind::Rom);
                    self.memory.mark_region(0xD800, 0xFFFF, AccessKind::Rom);
                }
                self.memory.copy_rom(0xC000, &self.os[..0x1000]);
                self.memory.copy_rom(0xD800, &self.os[UPPER_OS_OFFSET..]);
            } else {
                if kb > 48 {
                    self.memory.copy_rom(0xC000, &self.under_os[..0x1000]);
                    self.memory.copy_rom(0xD800, &self.under_os[UPPER_OS_OFFSET..]);
                    self.memory.mark_region(0xC000, 0xCFFF, AccessKind::Ram);
                    self.memory.mark_region(0xD800, 0xFFFF, AccessKind::Ram);
                } else {
                    self.memory.fill(0xC000, 0xFF, 0x1000);
                    self.memory.fill(0xD800, 0xFF, UPPER_OS_LEN);
                }
                // The self-test ROM lives in the OS chip.
                self.disable_selftest();
            }
        }

        if !self.cart_a0bf {
            let now_disabled = self.basic_hidden(byte);
            if self.basic_hidden(old) != now_disabled {
                if now_disabled {
                    self.expose_under_basic();
                } else {
                    if kb > 40 {
                        self.memory.copy_out(0xA000, &mut self.under_basic);
                        self.memory.mark_region(0xA000, 0xBFFF, AccessKind::Rom);
                    }
                    self.copy_basic();
                }
            }
        }

        if byte & 0x80 != 0 {
            self.disable_selftest();
        } else if !self.selftest
            && byte & 0x01 != 0
            && !(byte & 0x30 != 0x30 && self.ram == RamSize::K320CompyShop)
            && !(byte & 0x10 == 0 && self.ram == RamSize::K1088)
        {
            if kb > 20 {
                self.memory.copy_out(0x5000, &mut self.under_os[SELFTEST]);
                self.memory.mark_region(0x5000, 0x57FF, AccessKind::Rom);
            }
            self.memory.copy_rom(0x5000, &self.os[SELFTEST]);
            self.selftest = true;
        }
    }

    fn disable_selftest(&mut self) {
        if !self.selftest {
            return;
        }
        if self.ram.kb() > 20 {
            self.memory.copy_rom(0x5000, &self.under_os[SELFTEST]);
            self.memory.mark_region(0x5000, 0x57FF, AccessKind::Ram);
        } else {
            self.memory.fill(0x5000, 0xFF, SELFTEST_LEN);
        }
        self.selftest = false;
    }

    fn expose_under_basic(&mut self) {
        if self.ram.kb() > 40 {
            self.memory.copy_rom(0xA000, &self.under_basic);
            self.memory.mark_region(0xA000, 0xBFFF, AccessKind::Ram);
        } else {
            self.memory.fill(0xA000, 0xFF, 0x2000);
        }
    }

    fn copy_basic(&mut self) {
        if let Some(basic) = &self.basic {
            self.memory.copy_rom(0xA000, basic);
        }
    }

    /// Switch the $8000-$9FFF cartridge window in. The caller copies the
    /// bank contents.
    pub fn enable_809f(&mut self) {
        if self.cart_809f {
            return;
        }
        if self.ram.kb() > 32 {
            self.memory.copy_out(0x8000, &mut self.under_809f);
            self.memory.mark_region(0x8000, 0x9FFF, AccessKind::Rom);
        }
        self.cart_809f = true;
    }

    pub fn disable_809f(&mut self) {
        if !self.cart_809f {
            return;
        }
        if self.ram.kb() > 32 {
            self.memory.copy_rom(0x8000, &self.under_809f);
            self.memory.mark_region(0x8000, 0x9FFF, AccessKind::Ram);
        } else {
            self.memory.fill(0x8000, 0xFF, 0x2000);
        }
        self.cart_809f = false;
    }

    /// Switch the $A000-$BFFF cartridge window in. Raises TRIG3 on XL/XE.
    pub fn enable_a0bf(&mut self) {
        if self.cart_a0bf {
            return;
        }
        let xl = self.machine == MachineType::XlXe;
        // With BASIC showing, the window is already ROM and the RAM
        // underneath was saved when BASIC went in.
        if self.ram.kb() > 40 && (!xl || self.basic_hidden(self.portb)) {
            self.memory.copy_out(0xA000, &mut self.under_a0bf);
            self.memory.mark_region(0xA000, 0xBFFF, AccessKind::Rom);
        }
        self.cart_a0bf = true;
        if xl {
            self.trig3 = true;
        }
    }

    /// Switch the $A000-$BFFF window out, falling back to BASIC where the
    /// XL/XE PORTB setting shows it.
    pub fn disable_a0bf(&mut self) {
        if !self.cart_a0bf {
            return;
        }
        let xl = self.machine == MachineType::XlXe;
        if !xl || self.basic_hidden(self.portb) {
            if self.ram.kb() > 40 {
                self.memory.copy_rom(0xA000, &self.under_a0bf);
                self.memory.mark_region(0xA000, 0xBFFF, AccessKind::Ram);
            } else {
                self.memory.fill(0xA000, 0xFF, 0x2000);
            }
        } else {
            self.copy_basic();
        }
        self.cart_a0bf = false;
        if xl {
            self.trig3 = false;
        }
    }

    /// On a 400/800, put BASIC in the left slot if it is configured.
    /// Returns `false` when there is no BASIC to show.
    pub fn insert_basic(&mut self) -> bool {
        if !self.machine.is_400_800() || !self.basic_enabled || self.basic.is_none() {
            return false;
        }
        self.enable_a0bf();
        self.copy_basic();
        true
    }

    #[must_use]
    pub fn memory(&self) -> &AddressSpace {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut AddressSpace {
        &mut self.memory
    }

    #[must_use]
    pub fn machine(&self) -> MachineType {
        self.machine
    }

    #[must_use]
    pub fn ram(&self) -> RamSize {
        self.ram
    }

    #[must_use]
    pub fn portb(&self) -> u8 {
        self.portb
    }

    #[must_use]
    pub fn selftest_enabled(&self) -> bool {
        self.selftest
    }

    #[must_use]
    pub fn cart_809f_enabled(&self) -> bool {
        self.cart_809f
    }

    #[must_use]
    pub fn cart_a0bf_enabled(&self) -> bool {
        self.cart_a0bf
    }

    /// XL/XE TRIG3 input: high while a left cartridge is mapped.
    #[must_use]
    pub fn trig3(&self) -> bool {
        self.trig3
    }

    /// XE bank currently visible to the CPU at $4000-$7FFF.
    #[must_use]
    pub fn xe_bank(&self) -> Option<usize> {
        self.xe.as_ref().map(BankWindow::live)
    }

    /// The 16 KB ANTIC reads at $4000-$7FFF when it differs from the
    /// CPU's view (128K and Compy Shop separate ANTIC access).
    #[must_use]
    pub fn antic_view(&self) -> Option<&[u8]> {
        let bank = self.antic_bank?;
        self.xe.as_ref()?.slot(bank)
    }

    #[must_use]
    pub fn snapshot(&self) -> MmuState {
        MmuState {
            machine: self.machine,
            ram: self.ram,
            portb: self.portb,
            selftest: self.selftest,
            cart_809f: self.cart_809f,
            cart_a0bf: self.cart_a0bf,
            trig3: self.trig3,
            antic_bank: self.antic_bank,
            xe_bank: self.xe_bank().unwrap_or(0),
            xe_memory: self
                .xe
                .as_ref()
                .map(|xe| xe.slots().to_vec())
                .unwrap_or_default(),
            under_os: self.under_os.clone(),
            under_basic: self.under_basic.clone(),
            under_809f: self.under_809f.clone(),
            under_a0bf: self.under_a0bf.clone(),
        }
    }

    /// Restore overlay state. Memory contents are restored separately.
    pub fn restore(&mut self, state: &MmuState) -> Result<(), AtariError> {
        if state.machine != self.machine || state.ram != self.ram {
            return Err(AtariError::StateMismatch("machine"));
        }
        if state.under_os.len() != self.under_os.len()
            || state.under_basic.len() != 0x2000
            || state.under_809f.len() != 0x2000
            || state.under_a0bf.len() != 0x2000
        {
            return Err(AtariError::StateMismatch("overlay buffer size"));
        }
        match self.xe.as_mut() {
            Some(xe) => {
                if !xe.restore(&state.xe_memory, state.xe_bank) {
                    return Err(AtariError::StateMismatch("extended memory size"));
                }
            }
            None if !state.xe_memory.is_empty() => {
                return Err(AtariError::StateMismatch("extended memory size"));
            }
            None => {}
        }
        self.portb = state.portb;
        self.selftest = state.selftest;
        self.cart_809f = state.cart_809f;
        self.cart_a0bf = state.cart_a0bf;
        self.trig3 = state.trig3;
        self.antic_bank = state.antic_bank;
        self.under_os.copy_from_slice(&state.under_os);
        self.under_basic.copy_from_slice(&state.under_basic);
        self.under_809f.copy_from_slice(&state.under_809f);
        self.under_a0bf.copy_from_slice(&state.under_a0bf);
        Ok(())
    }
}

/// Extended bank the CPU sees for a PORTB value with bit 4 clear.
fn cpu_bank(ram: RamSize, b: u8) -> usize {
    let b = usize::from(b);
    match ram {
        RamSize::K128 => ((b & 0x0C) >> 2) + 1,
        RamSize::K320Rambo => (((b & 0x0C) + ((b & 0x60) >> 1)) >> 2) + 1,
        RamSize::K320CompyShop => (((b & 0x0C) + ((b & 0xC0) >> 2)) >> 2) + 1,
        RamSize::K576 => (((b & 0x0E) + ((b & 0x60) >> 1)) >> 1) + 1,
        RamSize::K1088 => (((b & 0x0E) + ((b & 0xE0) >> 1)) >> 1) + 1,
        _ => 0,
    }
}

fn antic_extended_bank(ram: RamSize, b: u8) -> usize {
    let b = usize::from(b);
    if ram == RamSize::K128 {
        ((b & 0x0C) >> 2) + 1
    } else {
        (((b & 0x0C) + ((b & 0xC0) >> 2)) >> 2) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xl_os() -> Vec<u8> {
        let mut os = vec![0x0F; 0x4000];
        os[SELFTEST].fill(0x5E);
        os
    }

    fn xl(ram: RamSize) -> Mmu {
        let config = MachineConfig::new(MachineType::XlXe, xl_os())
            .with_ram(ram)
            .with_basic(vec![0xBA; 0x2000]);
        let mut mmu = Mmu::new(&config).expect("valid config");
        mmu.power_on_portb();
        mmu
    }

    #[test]
    fn rejects_wrong_os_size() {
        let config = MachineConfig::new(MachineType::OsB, vec![0; 0x4000]);
        assert!(matches!(
            Mmu::new(&config),
            Err(AtariError::BadRomSize { expected: 0x2800, .. })
        ));
    }

    #[test]
    fn rejects_ram_the_machine_cannot_take() {
        let config = MachineConfig::new(MachineType::OsA, vec![0; 0x2800]).with_ram(RamSize::K128);
        assert!(matches!(
            Mmu::new(&config),
            Err(AtariError::UnsupportedRam { ram_kb: 128, .. })
        ));
    }

    #[test]
    fn atari800_48k_map() {
        let config = MachineConfig::new(MachineType::OsB, vec![0xEE; 0x2800]);
        let mmu = Mmu::new(&config).expect("valid config");
        let mem = mmu.memory();
        assert_eq!(mem.kind(0xBFFF), AccessKind::Ram);
        assert_eq!(mem.kind(0xC000), AccessKind::Rom);
        assert_eq!(mem.peek(0xC000), 0xFF);
        assert_eq!(mem.kind(0xD20A), AccessKind::Hardware);
        assert_eq!(mem.peek(0xD800), 0xEE);
        assert_eq!(mem.kind(0xFFFF), AccessKind::Rom);
    }

    #[test]
    fn atari5200_map() {
        let config = MachineConfig::new(MachineType::A5200, vec![0x52; 0x800]);
        let mmu = Mmu::new(&config).expect("valid config");
        let mem = mmu.memory();
        assert_eq!(mem.kind(0x3FFF), AccessKind::Ram);
        assert_eq!(mem.kind(0x4000), AccessKind::Rom);
        assert_eq!(mem.kind(0xC010), AccessKind::Hardware);
        assert_eq!(mem.kind(0xD40B), AccessKind::Hardware);
        assert_eq!(mem.kind(0xE80A), AccessKind::Hardware);
        assert_eq!(mem.kind(0xEB0A), AccessKind::Hardware);
        assert_eq!(mem.kind(0xD300), AccessKind::Rom);
        assert_eq!(mem.peek(0xF800), 0x52);
    }

    #[test]
    fn xl_power_on_state() {
        let mmu = xl(RamSize::K64);
        assert_eq!(mmu.portb(), 0xFF);
        assert!(!mmu.selftest_enabled());
        let mem = mmu.memory();
        assert_eq!(mem.kind(0xA000), AccessKind::Ram);
        assert_eq!(mem.kind(0x5000), AccessKind::Ram);
        assert_eq!(mem.kind(0xC000), AccessKind::Rom);
        assert_eq!(mem.peek(0xE000), 0x0F);
    }

    #[test]
    fn os_rom_off_exposes_ram_and_kills_selftest() {
        let mut mmu = xl(RamSize::K64);
        mmu.write_portb(0x7F);
        assert!(mmu.selftest_enabled());
        assert_eq!(mmu.memory().peek(0x5000), 0x5E);

        mmu.write_portb(0xFE);
        assert!(!mmu.selftest_enabled());
        assert_eq!(mmu.memory().kind(0xC000), AccessKind::Ram);
        assert_eq!(mmu.memory().kind(0xE000), AccessKind::Ram);
        assert_eq!(mmu.memory().kind(0x5000), AccessKind::Ram);

        mmu.memory_mut().poke(0xE000, 0x42);
        mmu.write_portb(0xFF);
        assert_eq!(mmu.memory().peek(0xE000), 0x0F);
        mmu.write_portb(0xFE);
        assert_eq!(mmu.memory().peek(0xE000), 0x42);
    }

    #[test]
    fn basic_follows_bit_1() {
        let mut mmu = xl(RamSize::K64);
        mmu.memory_mut().poke(0xA000, 0x11);
        mmu.write_portb(0xFD);
        assert_eq!(mmu.memory().peek(0xA000), 0xBA);
        assert_eq!(mmu.memory().kind(0xA000), AccessKind::Rom);
        mmu.write_portb(0xFF);
        assert_eq!(mmu.memory().peek(0xA000), 0x11);
        assert_eq!(mmu.memory().kind(0xA000), AccessKind::Ram);
    }

    #[test]
    fn xe_bank_switching_128k() {
        let mut mmu = xl(RamSize::K128);
        mmu.memory_mut().poke(0x4000, 0xB0);
        // Bit 4 clear, bits 2-3 = 01: extended bank 2.
        mmu.write_portb(0xE7);
        assert_eq!(mmu.xe_bank(), Some(2));
        assert_eq!(mmu.memory().peek(0x4000), 0);
        mmu.memory_mut().poke(0x4000, 0xB2);
        mmu.write_portb(0xFF);
        assert_eq!(mmu.memory().peek(0x4000), 0xB0);
        mmu.write_portb(0xE7);
        assert_eq!(mmu.memory().peek(0x4000), 0xB2);
    }

    #[test]
    fn antic_separate_access_128k() {
        let mut mmu = xl(RamSize::K128);
        // CPU extended, ANTIC base.
        mmu.memory_mut().poke(0x4000, 0xAB);
        mmu.write_portb(0xE3);
        let view = mmu.antic_view().expect("ANTIC sees base RAM");
        assert_eq!(view[0], 0xAB);
        // CPU base, ANTIC extended.
        mmu.write_portb(0xDF);
        assert_eq!(mmu.xe_bank(), Some(0));
        assert!(mmu.antic_view().is_some());
        mmu.write_portb(0xFF);
        assert!(mmu.antic_view().is_none());
    }

    #[test]
    fn bank_change_takes_selftest_out_first() {
        let mut mmu = xl(RamSize::K128);
        mmu.memory_mut().poke(0x5000, 0x50);
        mmu.write_portb(0x7F);
        assert_eq!(mmu.memory().peek(0x5000), 0x5E);

        // Extended bank 1 with self-test still requested.
        mmu.write_portb(0x63);
        assert_eq!(mmu.xe_bank(), Some(1));
        assert!(mmu.selftest_enabled());

        mmu.write_portb(0xFF);
        assert!(!mmu.selftest_enabled());
        assert_eq!(mmu.xe_bank(), Some(0));
        assert_eq!(mmu.memory().peek(0x5000), 0x50);
        assert_eq!(mmu.memory().kind(0x5000), AccessKind::Ram);
    }

    #[test]
    fn bank_formulas() {
        assert_eq!(cpu_bank(RamSize::K128, 0x0C), 4);
        assert_eq!(cpu_bank(RamSize::K320Rambo, 0x6C), 16);
        assert_eq!(cpu_bank(RamSize::K320CompyShop, 0xCC), 16);
        assert_eq!(cpu_bank(RamSize::K576, 0x6E), 32);
        assert_eq!(cpu_bank(RamSize::K1088, 0xEE), 64);
    }

    #[test]
    fn left_cartridge_window_saves_ram() {
        let config = MachineConfig::new(MachineType::OsB, vec![0; 0x2800]);
        let mut mmu = Mmu::new(&config).expect("valid config");
        mmu.memory_mut().poke(0xA000, 0x77);
        mmu.enable_a0bf();
        assert_eq!(mmu.memory().kind(0xA000), AccessKind::Rom);
        mmu.memory_mut().copy_rom(0xA000, &[0xCA]);
        mmu.disable_a0bf();
        assert_eq!(mmu.memory().peek(0xA000), 0x77);
        assert_eq!(mmu.memory().kind(0xA000), AccessKind::Ram);
    }

    #[test]
    fn cartridge_window_without_ram_reads_ff() {
        let config = MachineConfig::new(MachineType::OsB, vec![0; 0x2800]).with_ram(RamSize::K16);
        let mut mmu = Mmu::new(&config).expect("valid config");
        mmu.enable_809f();
        mmu.memory_mut().copy_rom(0x8000, &[0x12]);
        mmu.disable_809f();
        assert_eq!(mmu.memory().peek(0x8000), 0xFF);
        assert_eq!(mmu.memory().kind(0x8000), AccessKind::Rom);
    }

    #[test]
    fn xl_cartridge_removal_restores_basic_when_enabled() {
        let mut mmu = xl(RamSize::K64);
        mmu.write_portb(0xFD);
        mmu.enable_a0bf();
        assert!(mmu.trig3());
        mmu.memory_mut().copy_rom(0xA000, &[0xCA]);
        mmu.disable_a0bf();
        assert!(!mmu.trig3());
        assert_eq!(mmu.memory().peek(0xA000), 0xBA);
    }
}
