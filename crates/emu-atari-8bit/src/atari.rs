//! Top-level Atari 8-bit machine.
//!
//! Owns the CPU, the memory map, the cartridge slot and the external
//! collaborators. The frame driver calls [`Atari::run`] once per scan
//! line (or any other slice) and [`Atari::rebase`] to move the cycle
//! origin forward.

use std::fmt;
use std::path::Path;

use emu_core::{Observable, Value};
use log::debug;
use mos_6502::{CpuState, Mos6502, RunOutcome};
use serde::{Deserialize, Serialize};

use crate::bus::AtariBus;
use crate::cartridge::{CartState, CartType, Cartridge, LoadOutcome};
use crate::config::{MachineConfig, MachineType};
use crate::error::{AtariError, CartError};
use crate::hardware::{Hardware, NullHardware};
use crate::memory::AddressSpace;
use crate::mmu::{BasicSwitch, Mmu, MmuState, PortbBasicSwitch};
use crate::patch::OsPatch;
use crate::rtime::RTime8;

/// OS cold-start flag. Set so the OS treats the next reset as a cold one.
const COLDST: u16 = 0x0244;

/// Complete machine state, in save order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineState {
    pub memory: Vec<u8>,
    pub kinds: Vec<u8>,
    pub mmu: MmuState,
    pub cart: CartState,
    pub cpu: CpuState,
}

pub struct Atari {
    cpu: Mos6502,
    mmu: Mmu,
    cart: Cartridge,
    hardware: Box<dyn Hardware>,
    patch: Option<Box<dyn OsPatch>>,
}

impl fmt::Debug for Atari {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atari")
            .field("cpu", &self.cpu)
            .field("mmu", &self.mmu)
            .field("cart", &self.cart.kind())
            .field("patched", &self.patch.is_some())
            .finish_non_exhaustive()
    }
}

impl Atari {
    /// Build a machine from `config` and cold-start it.
    ///
    /// # Errors
    ///
    /// Returns an error if a ROM image has the wrong size or the RAM size
    /// is not available on the chosen machine.
    pub fn new(config: &MachineConfig) -> Result<Self, AtariError> {
        Self::with_basic_switch(config, Box::new(PortbBasicSwitch))
    }

    /// As [`new`](Self::new), with custom XL/XE BASIC switching.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_basic_switch(
        config: &MachineConfig,
        basic_switch: Box<dyn BasicSwitch>,
    ) -> Result<Self, AtariError> {
        let mmu = Mmu::with_basic_switch(config, basic_switch)?;
        let rtime = (config.rtime && config.machine.is_computer()).then(RTime8::default);
        let mut cpu = Mos6502::with_variant(config.cpu_variant);
        cpu.set_escapes(config.escapes);
        debug!(
            "{} with {} KB, R-Time 8 {}",
            config.machine.name(),
            config.ram.kb(),
            if rtime.is_some() { "fitted" } else { "absent" }
        );

        let mut atari = Self {
            cpu,
            mmu,
            cart: Cartridge::new(rtime),
            hardware: Box::new(NullHardware),
            patch: None,
        };
        atari.coldstart();
        Ok(atari)
    }

    /// Split the machine into the CPU and a bus over everything else.
    fn parts(&mut self) -> (&mut Mos6502, AtariBus<'_>) {
        let bus = AtariBus {
            mmu: &mut self.mmu,
            cart: &mut self.cart,
            hardware: self.hardware.as_mut(),
            patch: self.patch.as_deref_mut().map(|p| p as &mut dyn OsPatch),
        };
        (&mut self.cpu, bus)
    }

    /// Power cycle: rebuild the memory map, restart the cartridge, then
    /// reset the CPU.
    pub fn coldstart(&mut self) {
        self.mmu.init();
        self.cart.start(&mut self.mmu);
        self.mmu.power_on_portb();
        if self.mmu.machine().is_computer() {
            self.mmu.memory_mut().poke(COLDST, 1);
        }
        let (cpu, mut bus) = self.parts();
        cpu.reset(&mut bus);
    }

    /// The RESET key. Memory survives; on XL/XE the OS ROM comes back.
    pub fn warmstart(&mut self) {
        if self.mmu.machine() == MachineType::XlXe {
            self.mmu.write_portb(0xFF);
        }
        let (cpu, mut bus) = self.parts();
        cpu.reset(&mut bus);
    }

    /// Execute until the CPU's cycle position reaches `limit`.
    pub fn run(&mut self, limit: u32) -> RunOutcome {
        let (cpu, mut bus) = self.parts();
        cpu.run(&mut bus, limit)
    }

    pub fn rebase(&mut self, cycles: u32) {
        self.cpu.rebase(cycles);
    }

    pub fn set_irq(&mut self, asserted: bool) {
        self.cpu.set_irq(asserted);
    }

    pub fn nmi(&mut self) {
        let (cpu, mut bus) = self.parts();
        cpu.nmi(&mut bus);
    }

    /// Load a cartridge file and map it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a known
    /// format. The slot is left empty.
    pub fn insert_cartridge(&mut self, path: &Path) -> Result<LoadOutcome, CartError> {
        self.cart.insert(path, &mut self.mmu)
    }

    /// Load a cartridge from bytes already in memory.
    ///
    /// # Errors
    ///
    /// See [`insert_cartridge`](Self::insert_cartridge).
    pub fn insert_cartridge_image(&mut self, data: &[u8]) -> Result<LoadOutcome, CartError> {
        self.cart.insert_image(data, &mut self.mmu)
    }

    /// Choose the type of an ambiguous raw image.
    ///
    /// # Errors
    ///
    /// Fails if no image is loaded or its size does not fit `kind`.
    pub fn set_cartridge_type(&mut self, kind: CartType) -> Result<(), CartError> {
        self.cart.set_type(kind, &mut self.mmu)
    }

    pub fn remove_cartridge(&mut self) {
        self.cart.remove(&mut self.mmu);
    }

    /// Replace the chip dispatcher.
    pub fn set_hardware(&mut self, hardware: Box<dyn Hardware>) {
        self.hardware = hardware;
    }

    pub fn set_os_patch(&mut self, patch: Option<Box<dyn OsPatch>>) {
        self.patch = patch;
    }

    /// Byte in the address space, bypassing hardware.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.mmu.memory().peek(addr)
    }

    /// Store into the address space regardless of tag.
    pub fn poke(&mut self, addr: u16, value: u8) {
        self.mmu.memory_mut().poke(addr, value);
    }

    #[must_use]
    pub fn cpu(&self) -> &Mos6502 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mos6502 {
        &mut self.cpu
    }

    #[must_use]
    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    pub fn mmu_mut(&mut self) -> &mut Mmu {
        &mut self.mmu
    }

    #[must_use]
    pub fn memory(&self) -> &AddressSpace {
        self.mmu.memory()
    }

    #[must_use]
    pub fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    #[must_use]
    pub fn save_state(&self) -> MachineState {
        let memory = self.mmu.memory();
        MachineState {
            memory: memory.bytes().to_vec(),
            kinds: memory.kind_codes(),
            mmu: self.mmu.snapshot(),
            cart: self.cart.snapshot(),
            cpu: self.cpu.snapshot(),
        }
    }

    /// Restore a snapshot taken on a machine of the same shape with the
    /// same cartridge inserted. Nothing changes if validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`AtariError::StateMismatch`] naming the part that does not
    /// fit.
    pub fn load_state(&mut self, state: &MachineState) -> Result<(), AtariError> {
        if !self.cart.accepts(&state.cart) {
            return Err(AtariError::StateMismatch("cartridge"));
        }
        let mut memory = AddressSpace::new();
        if !memory.restore(&state.memory, &state.kinds) {
            return Err(AtariError::StateMismatch("memory image"));
        }
        self.mmu.restore(&state.mmu)?;
        *self.mmu.memory_mut() = memory;
        self.cart.restore(&state.cart);
        self.cpu.restore(&state.cpu);
        debug!("state restored at ${:04X}", self.cpu.regs.pc);
        Ok(())
    }
}

fn parse_addr(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

impl Observable for Atari {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_addr(rest).map(|a| Value::U8(self.peek(a)))
        } else if let Some(rest) = path.strip_prefix("cart.") {
            match rest {
                "type" => Some(self.cart.kind().to_string().into()),
                "id" => Some(Value::U32(self.cart.kind().id() as u32)),
                "bank" => Some(Value::U32(self.cart.bank() as u32)),
                "rtime" => Some(self.cart.has_rtime().into()),
                _ => None,
            }
        } else {
            match path {
                "machine" => Some(self.mmu.machine().name().into()),
                "ram_kb" => Some(self.mmu.ram().kb().into()),
                "portb" => Some(self.mmu.portb().into()),
                "selftest" => Some(self.mmu.selftest_enabled().into()),
                "cart_809f" => Some(self.mmu.cart_809f_enabled().into()),
                "cart_a0bf" => Some(self.mmu.cart_a0bf_enabled().into()),
                "trig3" => Some(self.mmu.trig3().into()),
                "xe_bank" => self.mmu.xe_bank().map(|b| Value::U32(b as u32)),
                _ => self.cpu.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<6502_paths>",
            "memory.<address>",
            "cart.type",
            "cart.id",
            "cart.bank",
            "cart.rtime",
            "machine",
            "ram_kb",
            "portb",
            "selftest",
            "cart_809f",
            "cart_a0bf",
            "trig3",
            "xe_bank",
        ]
    }
}
