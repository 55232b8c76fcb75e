//! Machine configuration.

use mos_6502::Variant;
use serde::{Deserialize, Serialize};

/// Machine family. Determines the memory map and OS ROM size.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineType {
    /// 400/800 with OS revision A.
    OsA,
    /// 400/800 with OS revision B.
    OsB,
    /// 600XL/800XL/130XE and compatibles.
    #[default]
    XlXe,
    /// 5200 SuperSystem.
    A5200,
}

impl MachineType {
    /// OS ROM image size in bytes.
    #[must_use]
    pub const fn os_size(self) -> usize {
        match self {
            Self::OsA | Self::OsB => 0x2800,
            Self::XlXe => 0x4000,
            Self::A5200 => 0x0800,
        }
    }

    /// Address the OS ROM is loaded at.
    #[must_use]
    pub const fn os_base(self) -> u16 {
        match self {
            Self::OsA | Self::OsB => 0xD800,
            Self::XlXe => 0xC000,
            Self::A5200 => 0xF800,
        }
    }

    #[must_use]
    pub const fn is_computer(self) -> bool {
        !matches!(self, Self::A5200)
    }

    #[must_use]
    pub const fn is_400_800(self) -> bool {
        matches!(self, Self::OsA | Self::OsB)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OsA => "400/800 (OS-A)",
            Self::OsB => "400/800 (OS-B)",
            Self::XlXe => "XL/XE",
            Self::A5200 => "5200",
        }
    }
}

/// Installed RAM. The two 320 KB variants differ in PORTB bank decoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RamSize {
    K8,
    K16,
    K24,
    K32,
    K40,
    K48,
    K52,
    #[default]
    K64,
    K128,
    /// 320 KB, RAMBO-style decoding.
    K320Rambo,
    /// 320 KB, Compy Shop-style decoding.
    K320CompyShop,
    K576,
    K1088,
}

impl RamSize {
    #[must_use]
    pub const fn kb(self) -> u32 {
        match self {
            Self::K8 => 8,
            Self::K16 => 16,
            Self::K24 => 24,
            Self::K32 => 32,
            Self::K40 => 40,
            Self::K48 => 48,
            Self::K52 => 52,
            Self::K64 => 64,
            Self::K128 => 128,
            Self::K320Rambo | Self::K320CompyShop => 320,
            Self::K576 => 576,
            Self::K1088 => 1088,
        }
    }

    /// Number of 16 KB banks that can appear at $4000-$7FFF, base RAM
    /// included. Zero when there is no extended memory.
    #[must_use]
    pub const fn xe_banks(self) -> usize {
        if self.kb() > 64 {
            1 + (self.kb() as usize - 64) / 16
        } else {
            0
        }
    }

    /// Pick a size from a kilobyte count. 320 selects RAMBO decoding.
    #[must_use]
    pub const fn from_kb(kb: u32) -> Option<Self> {
        Some(match kb {
            8 => Self::K8,
            16 => Self::K16,
            24 => Self::K24,
            32 => Self::K32,
            40 => Self::K40,
            48 => Self::K48,
            52 => Self::K52,
            64 => Self::K64,
            128 => Self::K128,
            320 => Self::K320Rambo,
            576 => Self::K576,
            1088 => Self::K1088,
            _ => return None,
        })
    }

    /// Whether this size can be fitted to `machine`.
    #[must_use]
    pub const fn fits(self, machine: MachineType) -> bool {
        match machine {
            MachineType::OsA | MachineType::OsB => self.kb() <= 52,
            MachineType::XlXe => self.kb() == 16 || self.kb() >= 64,
            MachineType::A5200 => self.kb() == 16,
        }
    }
}

/// Everything needed to build a machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    pub machine: MachineType,
    pub ram: RamSize,
    /// OS ROM (10 KB for 400/800, 16 KB for XL/XE, 2 KB for 5200).
    pub os_rom: Vec<u8>,
    /// 8 KB BASIC ROM.
    pub basic_rom: Option<Vec<u8>>,
    /// On a 400/800, show BASIC in the empty left slot.
    pub basic_enabled: bool,
    /// R-Time 8 clock cartridge at $D5B8-$D5B9.
    pub rtime: bool,
    pub cpu_variant: Variant,
    /// Route the $D2/$F2 escape opcodes to the OS patch handler.
    pub escapes: bool,
}

impl MachineConfig {
    /// Defaults for `machine` with the given OS image.
    #[must_use]
    pub fn new(machine: MachineType, os_rom: Vec<u8>) -> Self {
        let ram = match machine {
            MachineType::OsA | MachineType::OsB => RamSize::K48,
            MachineType::XlXe => RamSize::K64,
            MachineType::A5200 => RamSize::K16,
        };
        Self {
            machine,
            ram,
            os_rom,
            basic_rom: None,
            basic_enabled: false,
            rtime: machine.is_computer(),
            cpu_variant: Variant::Nmos,
            escapes: true,
        }
    }

    #[must_use]
    pub fn with_ram(mut self, ram: RamSize) -> Self {
        self.ram = ram;
        self
    }

    #[must_use]
    pub fn with_basic(mut self, basic_rom: Vec<u8>) -> Self {
        self.basic_rom = Some(basic_rom);
        self.basic_enabled = true;
        self
    }
}
