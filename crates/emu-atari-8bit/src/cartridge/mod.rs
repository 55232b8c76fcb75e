//! Cartridge slot.
//!
//! Cartridges are banked by copying the selected bank into the address
//! space, the same way the MMU handles ROM overlays. Bank registers live
//! in the $D500-$D5FF cartridge control area. Most schemes decode the
//! bank from the address bits, some from the written value. Bounty Bob
//! switches on any access to four bytes at the top of each 4 KB window,
//! instruction fetches included, and the 5200 Super Cart does the same
//! in $BFC0-$BFFF.

mod catalog;
mod image;

use std::fs;
use std::path::Path;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

pub use catalog::{ALL_TYPES, CartInfo, CartType, Platform};
pub use image::{LoadOutcome, checksum, encode_cart};

use crate::config::MachineType;
use crate::error::CartError;
use crate::memory::AccessKind;
use crate::mmu::Mmu;
use crate::rtime::{RTime8, RTimeState};

/// Bank state, in save order. The image itself is not saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    pub kind: CartType,
    pub bank: i32,
    pub aux: i32,
    pub regs: [u8; 3],
    pub rtime: Option<RTimeState>,
}

#[derive(Debug)]
pub struct Cartridge {
    kind: CartType,
    image: Vec<u8>,
    machine: MachineType,
    /// Main bank register. Negative means the cartridge is switched off.
    bank: i32,
    /// Second bank register: Bounty Bob's $9000 window, the AST page.
    aux: i32,
    /// Raw control registers for SIC! and The!Cart.
    regs: [u8; 3],
    rtime: Option<RTime8>,
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Cartridge {
    /// An empty slot, with an R-Time 8 clock plugged in if given.
    #[must_use]
    pub fn new(rtime: Option<RTime8>) -> Self {
        Self {
            kind: CartType::None,
            image: Vec::new(),
            machine: MachineType::default(),
            bank: 0,
            aux: 0,
            regs: [0; 3],
            rtime,
        }
    }

    #[must_use]
    pub fn kind(&self) -> CartType {
        self.kind
    }

    #[must_use]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Main bank register, negative when switched off.
    #[must_use]
    pub fn bank(&self) -> i32 {
        self.bank
    }

    #[must_use]
    pub fn has_rtime(&self) -> bool {
        self.rtime.is_some()
    }

    /// Load a cartridge file and start it.
    pub fn insert(&mut self, path: &Path, mmu: &mut Mmu) -> Result<LoadOutcome, CartError> {
        self.remove(mmu);
        let data = fs::read(path).map_err(|source| CartError::CannotOpen {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("cartridge file {} ({} bytes)", path.display(), data.len());
        self.insert_image(&data, mmu)
    }

    /// Load a cartridge from memory and start it.
    ///
    /// An ambiguous raw image is kept but left unstarted until
    /// [`set_type`](Self::set_type) picks its type.
    pub fn insert_image(&mut self, data: &[u8], mmu: &mut Mmu) -> Result<LoadOutcome, CartError> {
        let platform = if mmu.machine() == MachineType::A5200 {
            Platform::Atari5200
        } else {
            Platform::Computer
        };
        let parsed = match image::parse(data, platform) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.remove(mmu);
                return Err(err);
            }
        };
        self.image = parsed.image;
        self.kind = parsed.kind.unwrap_or(CartType::None);
        if let Some(kind) = parsed.kind {
            if kind == CartType::Atrax128 {
                self.image = descramble_atrax(&self.image);
            }
            debug!("cartridge inserted: {kind}");
        }
        self.start(mmu);
        Ok(parsed.outcome)
    }

    /// Choose the type of the loaded image and start it.
    pub fn set_type(&mut self, kind: CartType, mmu: &mut Mmu) -> Result<(), CartError> {
        if self.image.is_empty() {
            return Err(CartError::NoImage);
        }
        if kind == CartType::None || kind.info().size() != self.image.len() {
            return Err(CartError::UnknownType(kind.id()));
        }
        if kind == CartType::Atrax128 {
            self.image = descramble_atrax(&self.image);
        }
        self.kind = kind;
        debug!("cartridge type set: {kind}");
        self.start(mmu);
        Ok(())
    }

    /// Empty the slot.
    pub fn remove(&mut self, mmu: &mut Mmu) {
        if self.kind != CartType::None || !self.image.is_empty() {
            debug!("cartridge removed");
        }
        self.kind = CartType::None;
        self.image = Vec::new();
        self.start(mmu);
    }

    /// Map the cartridge's power-on layout.
    pub fn start(&mut self, mmu: &mut Mmu) {
        self.machine = mmu.machine();
        self.bank = 0;
        self.aux = 0;
        self.regs = [0; 3];
        if self.machine == MachineType::A5200 {
            self.start_5200(mmu);
        } else {
            self.start_computer(mmu);
        }
    }

    fn start_computer(&mut self, mmu: &mut Mmu) {
        use CartType::*;

        let kind = if self.kind.is_5200() { None } else { self.kind };
        match kind {
            Std2 => {
                left_only(mmu);
                mmu.memory_mut().fill(0xA000, 0xFF, 0x1800);
                self.copy(mmu, 0xB800, 0, 0x0800);
            }
            Std4 => {
                left_only(mmu);
                mmu.memory_mut().fill(0xA000, 0xFF, 0x1000);
                self.copy(mmu, 0xB000, 0, 0x1000);
            }
            Std8 | Phoenix8 | Williams64 | Williams32 | Express64 | Diamond64 | SpartaDosX64
            | SpartaDosX128 | AtraxSdx64 | AtraxSdx128 | AtraxDecoded128 | Atrax128
            | Atarimax128 | AtarimaxNew1024 | Turbosoft64 | Turbosoft128 | Ultracart32
            | Blizzard32 | Adawliah32 | Adawliah64 => {
                left_only(mmu);
                self.copy(mmu, 0xA000, 0, 0x2000);
            }
            AtarimaxOld1024 => {
                left_only(mmu);
                self.bank = 127;
                self.copy(mmu, 0xA000, 127 * 0x2000, 0x2000);
            }
            TheCart32M | TheCart64M | TheCart128M => {
                left_only(mmu);
                self.regs = [0, 0, 1];
                self.copy(mmu, 0xA000, 0, 0x2000);
            }
            Blizzard4 => {
                left_only(mmu);
                self.copy(mmu, 0xA000, 0, 0x1000);
                self.copy(mmu, 0xB000, 0, 0x1000);
            }
            Std16 | Blizzard16 => {
                both_windows(mmu);
                self.copy(mmu, 0x8000, 0, 0x4000);
            }
            LowBank8 => {
                mmu.enable_809f();
                mmu.disable_a0bf();
                self.copy(mmu, 0x8000, 0, 0x2000);
            }
            Oss034M16 | Oss043M16 => {
                left_only(mmu);
                self.copy(mmu, 0xA000, 0, 0x1000);
                self.copy(mmu, 0xB000, 0x3000, 0x1000);
            }
            OssM091 => {
                left_only(mmu);
                self.bank = 1;
                self.copy(mmu, 0xA000, 0x1000, 0x1000);
                self.copy(mmu, 0xB000, 0, 0x1000);
            }
            Oss8 => {
                left_only(mmu);
                self.copy(mmu, 0xA000, 0, 0x1000);
                self.copy(mmu, 0xB000, 0x1000, 0x1000);
            }
            Db32 => {
                both_windows(mmu);
                self.copy(mmu, 0x8000, 0, 0x2000);
                self.copy(mmu, 0xA000, 0x6000, 0x2000);
            }
            Xegs32 | Xegs64 | Xegs128 | Xegs256 | Xegs512 | Xegs1024 | Xegs8F64 | SwXegs32
            | SwXegs64 | SwXegs128 | SwXegs256 | SwXegs512 | SwXegs1024 => {
                both_windows(mmu);
                self.copy(mmu, 0x8000, 0, 0x2000);
                self.copy(mmu, 0xA000, self.image.len().saturating_sub(0x2000), 0x2000);
            }
            Mega16 | Mega32 | Mega64 | Mega128 | Mega256 | Mega512 | Mega1024 | Mega2048
            | MegaMax2048 => {
                both_windows(mmu);
                self.copy(mmu, 0x8000, 0, 0x4000);
            }
            Mega4096 => {
                both_windows(mmu);
                self.bank = 254;
                self.copy(mmu, 0x8000, 254 * 0x4000, 0x4000);
            }
            BountyBob40 => {
                both_windows(mmu);
                self.copy(mmu, 0x8000, 0, 0x1000);
                self.copy(mmu, 0x9000, 0x4000, 0x1000);
                self.copy(mmu, 0xA000, 0x8000, 0x2000);
                let mem = mmu.memory_mut();
                mem.mark_region(0x8FF6, 0x8FF9, AccessKind::Hardware);
                mem.mark_region(0x9FF6, 0x9FF9, AccessKind::Hardware);
            }
            Right8 | Right4 => {
                if mmu.machine().is_400_800() {
                    mmu.enable_809f();
                    if kind == Right8 {
                        self.copy(mmu, 0x8000, 0, 0x2000);
                    } else {
                        mmu.memory_mut().fill(0x8000, 0xFF, 0x1000);
                        self.copy(mmu, 0x9000, 0, 0x1000);
                    }
                    if !mmu.insert_basic() {
                        mmu.disable_a0bf();
                    }
                } else {
                    // No right slot on the XL/XE.
                    mmu.disable_809f();
                    mmu.disable_a0bf();
                }
            }
            Ast32 => {
                mmu.disable_809f();
                mmu.disable_a0bf();
            }
            Sic128 | Sic256 | Sic512 => {
                self.write_sic(0, mmu);
            }
            _ => {
                mmu.disable_809f();
                if !mmu.insert_basic() {
                    mmu.disable_a0bf();
                }
            }
        }

        if kind != BountyBob40 {
            let mem = mmu.memory_mut();
            let low = mem.kind(0x8FF5);
            let high = mem.kind(0x9FF5);
            mem.mark_region(0x8FF6, 0x8FF9, low);
            mem.mark_region(0x9FF6, 0x9FF9, high);
        }
    }

    fn start_5200(&mut self, mmu: &mut Mmu) {
        use CartType::*;

        let mem = mmu.memory_mut();
        mem.mark_region(0x4FF6, 0x4FF9, AccessKind::Rom);
        mem.mark_region(0x5FF6, 0x5FF9, AccessKind::Rom);
        mem.mark_region(0xBFC0, 0xBFFF, AccessKind::Rom);
        match self.kind {
            A5200Std32 => self.copy(mmu, 0x4000, 0, 0x8000),
            A5200TwoChip16 => {
                self.copy(mmu, 0x4000, 0, 0x2000);
                self.copy(mmu, 0x6000, 0, 0x4000);
                self.copy(mmu, 0xA000, 0x2000, 0x2000);
            }
            A5200BountyBob40 => {
                self.copy(mmu, 0x4000, 0, 0x1000);
                self.copy(mmu, 0x5000, 0x4000, 0x1000);
                self.copy(mmu, 0x8000, 0x8000, 0x2000);
                self.copy(mmu, 0xA000, 0x8000, 0x2000);
                let mem = mmu.memory_mut();
                mem.mark_region(0x4FF6, 0x4FF9, AccessKind::Hardware);
                mem.mark_region(0x5FF6, 0x5FF9, AccessKind::Hardware);
            }
            A5200OneChip16 => self.copy(mmu, 0x8000, 0, 0x4000),
            A5200Std8 => {
                self.copy(mmu, 0x8000, 0, 0x2000);
                self.copy(mmu, 0xA000, 0, 0x2000);
            }
            A5200Std4 => {
                for base in [0x8000, 0x9000, 0xA000, 0xB000] {
                    self.copy(mmu, base, 0, 0x1000);
                }
            }
            A5200Super64 | A5200Super128 | A5200Super256 | A5200Super512 => {
                let last = self.bank_count(0x8000) - 1;
                self.bank = last as i32;
                self.copy(mmu, 0x4000, last * 0x8000, 0x8000);
                mmu.memory_mut().mark_region(0xBFC0, 0xBFFF, AccessKind::Hardware);
            }
            // An empty slot reads as zeros so the BIOS fails the cartridge check.
            _ => mmu.memory_mut().fill(0x4000, 0, 0x8000),
        }
    }

    /// Whether a HARDWARE-tagged address is handled here rather than by
    /// the chip dispatcher.
    #[must_use]
    pub fn owns(&self, addr: u16) -> bool {
        let computer = self.machine.is_computer();
        match addr {
            0xD500..=0xD5FF => computer,
            0x8FF6..=0x8FF9 | 0x9FF6..=0x9FF9 => computer && self.kind == CartType::BountyBob40,
            0x4FF6..=0x4FF9 | 0x5FF6..=0x5FF9 => {
                !computer && self.kind == CartType::A5200BountyBob40
            }
            0xBFC0..=0xBFFF => !computer && self.is_super_cart(),
            _ => false,
        }
    }

    fn is_super_cart(&self) -> bool {
        matches!(
            self.kind,
            CartType::A5200Super64
                | CartType::A5200Super128
                | CartType::A5200Super256
                | CartType::A5200Super512
        )
    }

    /// A CPU read of an owned address.
    pub fn read(&mut self, addr: u16, mmu: &mut Mmu) -> u8 {
        match addr {
            0xD500..=0xD5FF => self.read_control(addr, mmu),
            0xBFC0..=0xBFFF => {
                self.super_cart_access(addr, mmu);
                mmu.memory().peek(addr)
            }
            _ => {
                self.bounty_bob(addr, mmu);
                0
            }
        }
    }

    /// A CPU write to an owned address.
    pub fn write(&mut self, addr: u16, value: u8, mmu: &mut Mmu) {
        match addr {
            0xD500..=0xD5FF => self.write_control(addr, value, mmu),
            0xBFC0..=0xBFFF => self.super_cart_access(addr, mmu),
            _ => self.bounty_bob(addr, mmu),
        }
    }

    fn read_control(&mut self, addr: u16, mmu: &mut Mmu) -> u8 {
        if let Some(rtc) = self.rtime.as_mut() {
            if matches!(addr, 0xD5B8 | 0xD5B9) {
                return rtc.read();
            }
        }
        match self.kind {
            CartType::Ast32 => {
                let offset = self.aux as usize * 0x100 + usize::from(addr & 0xFF);
                self.image.get(offset).copied().unwrap_or(0xFF)
            }
            CartType::Sic128 | CartType::Sic256 | CartType::Sic512 if addr & 0xE0 == 0 => {
                self.regs[0]
            }
            CartType::TheCart32M | CartType::TheCart64M | CartType::TheCart128M => {
                match addr {
                    0xD5A0..=0xD5A2 => self.regs[usize::from(addr - 0xD5A0)],
                    _ => 0xFF,
                }
            }
            _ => {
                self.access(addr, mmu);
                0xFF
            }
        }
    }

    fn write_control(&mut self, addr: u16, value: u8, mmu: &mut Mmu) {
        use CartType::*;

        if let Some(rtc) = self.rtime.as_mut() {
            if matches!(addr, 0xD5B8 | 0xD5B9) {
                rtc.write(value);
                return;
            }
        }
        match self.kind {
            Xegs32 | Xegs64 | Xegs128 | Xegs256 | Xegs512 | Xegs1024 | Xegs8F64 => {
                let banks = self.bank_count(0x2000);
                self.select_809f(i32::from(value) & (banks as i32 - 1), mmu);
            }
            SwXegs32 | SwXegs64 | SwXegs128 | SwXegs256 | SwXegs512 | SwXegs1024 => {
                self.write_switchable_xegs(value, mmu);
            }
            Mega16 | Mega32 | Mega64 | Mega128 | Mega256 | Mega512 | Mega1024 | Mega2048 => {
                let bank = if value & 0x80 != 0 {
                    -1
                } else {
                    i32::from(value) & (self.bank_count(0x4000) as i32 - 1)
                };
                self.select_16k(bank, mmu);
            }
            Mega4096 => {
                let bank = if value == 0xFF { -1 } else { i32::from(value) };
                self.select_16k(bank, mmu);
            }
            AtraxDecoded128 | Atrax128 => {
                let bank = if value & 0x80 != 0 {
                    -1
                } else {
                    i32::from(value & 0x0F)
                };
                self.select_a0bf(bank, mmu);
            }
            Phoenix8 | Blizzard4 => self.select_a0bf(-1, mmu),
            Blizzard16 => {
                if self.bank >= 0 {
                    mmu.disable_809f();
                    mmu.disable_a0bf();
                    self.bank = -1;
                }
            }
            Blizzard32 => {
                if self.bank >= 0 {
                    let next = self.bank + 1;
                    self.select_a0bf(if next >= 4 { -1 } else { next }, mmu);
                }
            }
            Ast32 => self.aux = (self.aux + 1) % 0x80,
            Sic128 | Sic256 | Sic512 => {
                if addr & 0xE0 == 0 {
                    self.write_sic(value, mmu);
                }
            }
            TheCart32M | TheCart64M | TheCart128M => {
                if (0xD5A0..=0xD5A2).contains(&addr) {
                    self.regs[usize::from(addr - 0xD5A0)] = value;
                    self.update_thecart(mmu);
                }
            }
            _ => self.access(addr, mmu),
        }
    }

    /// Bank switching triggered by any access, read or write.
    fn access(&mut self, addr: u16, mmu: &mut Mmu) {
        use CartType::*;

        let low = addr & 0xFF;
        match self.kind {
            Oss034M16 | Oss043M16 => {
                let bank = if low & 0x08 != 0 {
                    -1
                } else {
                    match (low & 0x07, self.kind) {
                        (0 | 1, _) => 0,
                        (3 | 7, Oss034M16) | (4 | 5, Oss043M16) => 1,
                        (4 | 5, Oss034M16) | (3 | 7, Oss043M16) => 2,
                        _ => self.bank,
                    }
                };
                self.select_oss(bank, 0x3000, mmu);
            }
            OssM091 => {
                let bank = match low & 0x09 {
                    0x00 => 1,
                    0x01 => 3,
                    0x08 => -1,
                    _ => 2,
                };
                self.select_oss(bank, 0, mmu);
            }
            Oss8 => {
                let bank = match low & 0x09 {
                    0x00 | 0x01 => 0,
                    0x08 => -1,
                    _ => 1,
                };
                self.select_oss(bank, 0x1000, mmu);
            }
            Db32 => self.select_809f(i32::from(low & 0x03), mmu),
            Williams64 | Williams32 => {
                if low & 0xF0 == 0 {
                    let mask = if self.kind == Williams64 { 7 } else { 3 };
                    self.select_a0bf(nibble_bank(low, |b| b & mask), mmu);
                }
            }
            Express64 | Diamond64 | SpartaDosX64 => {
                let decode = match self.kind {
                    Express64 => 0x70,
                    Diamond64 => 0xD0,
                    _ => 0xE0,
                };
                if low & 0xF0 == decode {
                    self.select_a0bf(nibble_bank(low, |b| !b & 7), mmu);
                }
            }
            SpartaDosX128 => {
                if low & 0xE0 == 0xE0 {
                    let bank = nibble_bank(low, |b| (!b & 7) | ((!low & 0x10) >> 1) as i32);
                    self.select_a0bf(bank, mmu);
                }
            }
            AtraxSdx64 => {
                if low & 0xF0 == 0xE0 {
                    self.select_a0bf(nibble_bank(low, |b| b & 7), mmu);
                }
            }
            AtraxSdx128 => {
                if low & 0xE0 == 0xE0 {
                    let bank = nibble_bank(low, |b| (b & 7) | ((low & 0x10) >> 1) as i32);
                    self.select_a0bf(bank, mmu);
                }
            }
            Atarimax128 => {
                if low & 0xE0 == 0 {
                    let bank = if low & 0x10 != 0 {
                        -1
                    } else {
                        i32::from(low & 0x0F)
                    };
                    self.select_a0bf(bank, mmu);
                }
            }
            AtarimaxOld1024 | AtarimaxNew1024 => {
                let bank = if low & 0x80 != 0 {
                    -1
                } else {
                    i32::from(low & 0x7F)
                };
                self.select_a0bf(bank, mmu);
            }
            MegaMax2048 => {
                let bank = if low & 0x80 != 0 {
                    -1
                } else {
                    i32::from(low & 0x7F)
                };
                self.select_16k(bank, mmu);
            }
            Turbosoft64 | Turbosoft128 => {
                let mask = if self.kind == Turbosoft64 { 0x07 } else { 0x0F };
                let bank = if low & 0x10 != 0 {
                    -1
                } else {
                    i32::from(low & mask)
                };
                self.select_a0bf(bank, mmu);
            }
            Ultracart32 => {
                let next = if self.bank < 0 { 0 } else { self.bank + 1 };
                self.select_a0bf(if next >= 4 { -1 } else { next }, mmu);
            }
            Adawliah32 | Adawliah64 => {
                let banks = self.bank_count(0x2000) as i32;
                self.select_a0bf((self.bank.max(0) + 1) % banks, mmu);
            }
            _ => {}
        }
    }

    fn bank_count(&self, size: usize) -> usize {
        (self.image.len() / size).max(1)
    }

    /// Copy `len` image bytes from `offset` to `addr`. Reads past the end
    /// of a short image are clipped.
    fn copy(&self, mmu: &mut Mmu, addr: u16, offset: usize, len: usize) {
        let start = offset.min(self.image.len());
        let end = (offset + len).min(self.image.len());
        mmu.memory_mut().copy_rom(addr, &self.image[start..end]);
    }

    /// 8 KB bank in the left window, or the window off for a negative bank.
    fn select_a0bf(&mut self, bank: i32, mmu: &mut Mmu) {
        if bank == self.bank {
            return;
        }
        trace!("cartridge $A000 bank {} -> {bank}", self.bank);
        if bank < 0 {
            mmu.disable_a0bf();
        } else {
            mmu.enable_a0bf();
            self.copy(mmu, 0xA000, bank as usize * 0x2000, 0x2000);
        }
        self.bank = bank;
    }

    /// 8 KB bank at $8000 with the top bank fixed at $A000.
    fn select_809f(&mut self, bank: i32, mmu: &mut Mmu) {
        if bank == self.bank {
            return;
        }
        trace!("cartridge $8000 bank {} -> {bank}", self.bank);
        self.copy(mmu, 0x8000, bank as usize * 0x2000, 0x2000);
        self.bank = bank;
    }

    /// 16 KB bank across both windows.
    fn select_16k(&mut self, bank: i32, mmu: &mut Mmu) {
        if bank == self.bank {
            return;
        }
        trace!("cartridge 16K bank {} -> {bank}", self.bank);
        if bank < 0 {
            mmu.disable_809f();
            mmu.disable_a0bf();
        } else {
            both_windows(mmu);
            self.copy(mmu, 0x8000, bank as usize * 0x4000, 0x4000);
        }
        self.bank = bank;
    }

    /// 4 KB bank at $A000 with a fixed 4 KB at $B000.
    fn select_oss(&mut self, bank: i32, main: usize, mmu: &mut Mmu) {
        if bank == self.bank {
            return;
        }
        trace!("cartridge OSS bank {} -> {bank}", self.bank);
        if bank < 0 {
            mmu.disable_a0bf();
        } else {
            mmu.enable_a0bf();
            self.copy(mmu, 0xA000, bank as usize * 0x1000, 0x1000);
            if self.bank < 0 {
                self.copy(mmu, 0xB000, main, 0x1000);
            }
        }
        self.bank = bank;
    }

    fn write_switchable_xegs(&mut self, value: u8, mmu: &mut Mmu) {
        if value & 0x80 != 0 {
            if self.bank >= 0 {
                mmu.disable_809f();
                mmu.disable_a0bf();
                self.bank = -1;
            }
            return;
        }
        let bank = i32::from(value) & (self.bank_count(0x2000) as i32 - 1);
        if self.bank < 0 {
            both_windows(mmu);
            self.copy(mmu, 0xA000, self.image.len().saturating_sub(0x2000), 0x2000);
            // Force the copy into the freshly enabled window.
            self.bank = -2;
        }
        self.select_809f(bank, mmu);
    }

    /// SIC! control register: bits 0-4 bank, bit 5 enables $8000-$9FFF,
    /// bit 6 disables $A000-$BFFF.
    fn write_sic(&mut self, value: u8, mmu: &mut Mmu) {
        self.regs[0] = value;
        let bank = usize::from(value) & (self.bank_count(0x4000) - 1);
        self.bank = bank as i32;
        if value & 0x20 != 0 {
            mmu.enable_809f();
            self.copy(mmu, 0x8000, bank * 0x4000, 0x2000);
        } else {
            mmu.disable_809f();
        }
        if value & 0x40 == 0 {
            mmu.enable_a0bf();
            self.copy(mmu, 0xA000, bank * 0x4000 + 0x2000, 0x2000);
        } else {
            mmu.disable_a0bf();
        }
    }

    /// The!Cart primary bank: $D5A0 low byte, $D5A1 high bits, $D5A2
    /// bit 0 enable.
    fn update_thecart(&mut self, mmu: &mut Mmu) {
        let banks = self.bank_count(0x2000);
        let bank = (usize::from(self.regs[0]) | usize::from(self.regs[1] & 0x3F) << 8) & (banks - 1);
        let bank = if self.regs[2] & 0x01 != 0 {
            bank as i32
        } else {
            -1
        };
        self.select_a0bf(bank, mmu);
    }

    fn bounty_bob(&mut self, addr: u16, mmu: &mut Mmu) {
        let (low_base, high_base) = if self.machine == MachineType::A5200 {
            (0x4000, 0x5000)
        } else {
            (0x8000, 0x9000)
        };
        let offset = addr & 0x0FFF;
        if !(0x0FF6..=0x0FF9).contains(&offset) {
            return;
        }
        let bank = usize::from(offset - 0x0FF6);
        if addr & 0xF000 == low_base {
            trace!("Bounty Bob low bank {bank}");
            self.bank = bank as i32;
            self.copy(mmu, low_base, bank * 0x1000, 0x1000);
        } else if addr & 0xF000 == high_base {
            trace!("Bounty Bob high bank {bank}");
            self.aux = bank as i32;
            self.copy(mmu, high_base, 0x4000 + bank * 0x1000, 0x1000);
        }
    }

    /// $BFC0-$BFFF: A4-A5 both set selects the last bank, anything else
    /// selects the bank in A0-A3.
    fn super_cart_access(&mut self, addr: u16, mmu: &mut Mmu) {
        let banks = self.bank_count(0x8000);
        let bank = if addr & 0x30 == 0x30 {
            banks - 1
        } else {
            usize::from(addr & 0x0F) % banks
        };
        if bank as i32 != self.bank {
            trace!("Super Cart bank {} -> {bank}", self.bank);
            self.bank = bank as i32;
            self.copy(mmu, 0x4000, bank * 0x8000, 0x8000);
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> CartState {
        CartState {
            kind: self.kind,
            bank: self.bank,
            aux: self.aux,
            regs: self.regs,
            rtime: self.rtime.as_ref().map(RTime8::state),
        }
    }

    /// Whether `state` was saved with this cartridge and its bank registers
    /// fit the image. Banks are checked at the smallest (4 KB) granularity.
    #[must_use]
    pub fn accepts(&self, state: &CartState) -> bool {
        state.kind == self.kind
            && state.rtime.is_some() == self.rtime.is_some()
            && state.bank >= -1
            && (state.bank < 0 || (state.bank as usize) < self.bank_count(0x1000))
            && (0..0x80).contains(&state.aux)
    }

    /// Restore bank registers. Memory contents come back with the address
    /// space. Returns `false`, changing nothing, if `state` is not
    /// [accepted](Self::accepts).
    pub fn restore(&mut self, state: &CartState) -> bool {
        if !self.accepts(state) {
            return false;
        }
        self.bank = state.bank;
        self.aux = state.aux;
        self.regs = state.regs;
        if let (Some(rtc), Some(saved)) = (self.rtime.as_mut(), state.rtime) {
            rtc.restore(saved);
        }
        true
    }
}

fn left_only(mmu: &mut Mmu) {
    mmu.disable_809f();
    mmu.enable_a0bf();
}

fn both_windows(mmu: &mut Mmu) {
    mmu.enable_809f();
    mmu.enable_a0bf();
}

/// Decode a bank from the low nibble of a control address. Bit 3 set
/// switches the cartridge off.
fn nibble_bank(low: u16, decode: impl Fn(i32) -> i32) -> i32 {
    let b = i32::from(low & 0x0F);
    if b & 0x08 != 0 { -1 } else { decode(b) }
}

/// Where each encoded Atrax address line and data bit comes from.
const ATRAX_ADDRESS_LINES: [u32; 13] = [5, 6, 7, 8, 9, 10, 11, 12, 4, 3, 2, 1, 0];
const ATRAX_DATA_BITS: [u8; 8] = [5, 6, 2, 3, 7, 4, 1, 0];

/// Undo the Atrax board's address and data line scrambling within each
/// 8 KB bank.
fn descramble_atrax(encoded: &[u8]) -> Vec<u8> {
    let mut decoded = vec![0; encoded.len()];
    for (i, slot) in decoded.iter_mut().enumerate() {
        let bank = i & !0x1FFF;
        let mut src = 0usize;
        for (line, &from) in ATRAX_ADDRESS_LINES.iter().enumerate() {
            if i & (1 << from) != 0 {
                src |= 1 << line;
            }
        }
        let byte = encoded.get(bank | src).copied().unwrap_or(0xFF);
        let mut out = 0u8;
        for (bit, &from) in ATRAX_DATA_BITS.iter().enumerate() {
            if byte & (1 << bit) != 0 {
                out |= 1 << from;
            }
        }
        *slot = out;
    }
    decoded
}
