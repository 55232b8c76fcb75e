//! The cartridge type catalog.
//!
//! Type numbers are the ones stored in CART file headers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which machine family a cartridge plugs into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Computer,
    Atari5200,
}

/// Static description of one cartridge type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartInfo {
    pub name: &'static str,
    pub kb: u32,
    pub platform: Platform,
    /// Whether a headerless image of this size may be taken for this type.
    pub raw_detect: bool,
}

impl CartInfo {
    const fn new(name: &'static str, kb: u32, platform: Platform, raw_detect: bool) -> Self {
        Self {
            name,
            kb,
            platform,
            raw_detect,
        }
    }

    /// Image size in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.kb as usize * 1024
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum CartType {
    #[default]
    None = 0,
    Std8 = 1,
    Std16 = 2,
    Oss034M16 = 3,
    A5200Std32 = 4,
    Db32 = 5,
    A5200TwoChip16 = 6,
    A5200BountyBob40 = 7,
    Williams64 = 8,
    Express64 = 9,
    Diamond64 = 10,
    SpartaDosX64 = 11,
    Xegs32 = 12,
    Xegs64 = 13,
    Xegs128 = 14,
    OssM091 = 15,
    A5200OneChip16 = 16,
    AtraxDecoded128 = 17,
    BountyBob40 = 18,
    A5200Std8 = 19,
    A5200Std4 = 20,
    Right8 = 21,
    Williams32 = 22,
    Xegs256 = 23,
    Xegs512 = 24,
    Xegs1024 = 25,
    Mega16 = 26,
    Mega32 = 27,
    Mega64 = 28,
    Mega128 = 29,
    Mega256 = 30,
    Mega512 = 31,
    Mega1024 = 32,
    SwXegs32 = 33,
    SwXegs64 = 34,
    SwXegs128 = 35,
    SwXegs256 = 36,
    SwXegs512 = 37,
    SwXegs1024 = 38,
    Phoenix8 = 39,
    Blizzard16 = 40,
    Atarimax128 = 41,
    AtarimaxOld1024 = 42,
    SpartaDosX128 = 43,
    Oss8 = 44,
    Oss043M16 = 45,
    Blizzard4 = 46,
    Ast32 = 47,
    AtraxSdx64 = 48,
    AtraxSdx128 = 49,
    Turbosoft64 = 50,
    Turbosoft128 = 51,
    Ultracart32 = 52,
    LowBank8 = 53,
    Sic128 = 54,
    Sic256 = 55,
    Sic512 = 56,
    Std2 = 57,
    Std4 = 58,
    Right4 = 59,
    Blizzard32 = 60,
    MegaMax2048 = 61,
    TheCart128M = 62,
    Mega4096 = 63,
    Mega2048 = 64,
    TheCart32M = 65,
    TheCart64M = 66,
    Xegs8F64 = 67,
    Atrax128 = 68,
    Adawliah32 = 69,
    Adawliah64 = 70,
    A5200Super64 = 71,
    A5200Super128 = 72,
    A5200Super256 = 73,
    A5200Super512 = 74,
    AtarimaxNew1024 = 75,
}

/// Every type, indexed by type number.
pub const ALL_TYPES: [CartType; 76] = [
    CartType::None,
    CartType::Std8,
    CartType::Std16,
    CartType::Oss034M16,
    CartType::A5200Std32,
    CartType::Db32,
    CartType::A5200TwoChip16,
    CartType::A5200BountyBob40,
    CartType::Williams64,
    CartType::Express64,
    CartType::Diamond64,
    CartType::SpartaDosX64,
    CartType::Xegs32,
    CartType::Xegs64,
    CartType::Xegs128,
    CartType::OssM091,
    CartType::A5200OneChip16,
    CartType::AtraxDecoded128,
    CartType::BountyBob40,
    CartType::A5200Std8,
    CartType::A5200Std4,
    CartType::Right8,
    CartType::Williams32,
    CartType::Xegs256,
    CartType::Xegs512,
    CartType::Xegs1024,
    CartType::Mega16,
    CartType::Mega32,
    CartType::Mega64,
    CartType::Mega128,
    CartType::Mega256,
    CartType::Mega512,
    CartType::Mega1024,
    CartType::SwXegs32,
    CartType::SwXegs64,
    CartType::SwXegs128,
    CartType::SwXegs256,
    CartType::SwXegs512,
    CartType::SwXegs1024,
    CartType::Phoenix8,
    CartType::Blizzard16,
    CartType::Atarimax128,
    CartType::AtarimaxOld1024,
    CartType::SpartaDosX128,
    CartType::Oss8,
    CartType::Oss043M16,
    CartType::Blizzard4,
    CartType::Ast32,
    CartType::AtraxSdx64,
    CartType::AtraxSdx128,
    CartType::Turbosoft64,
    CartType::Turbosoft128,
    CartType::Ultracart32,
    CartType::LowBank8,
    CartType::Sic128,
    CartType::Sic256,
    CartType::Sic512,
    CartType::Std2,
    CartType::Std4,
    CartType::Right4,
    CartType::Blizzard32,
    CartType::MegaMax2048,
    CartType::TheCart128M,
    CartType::Mega4096,
    CartType::Mega2048,
    CartType::TheCart32M,
    CartType::TheCart64M,
    CartType::Xegs8F64,
    CartType::Atrax128,
    CartType::Adawliah32,
    CartType::Adawliah64,
    CartType::A5200Super64,
    CartType::A5200Super128,
    CartType::A5200Super256,
    CartType::A5200Super512,
    CartType::AtarimaxNew1024,
];

static CATALOG: [CartInfo; 76] = [
    CartInfo::new("NONE", 0, Platform::Computer, false),
    CartInfo::new("Standard 8 KB cartridge", 8, Platform::Computer, true),
    CartInfo::new("Standard 16 KB cartridge", 16, Platform::Computer, true),
    CartInfo::new("OSS two chip 16 KB cartridge (034M)", 16, Platform::Computer, false),
    CartInfo::new("Standard 32 KB 5200 cartridge", 32, Platform::Atari5200, true),
    CartInfo::new("DB 32 KB cartridge", 32, Platform::Computer, true),
    CartInfo::new("Two chip 16 KB 5200 cartridge", 16, Platform::Atari5200, true),
    CartInfo::new("Bounty Bob 40 KB 5200 cartridge", 40, Platform::Atari5200, true),
    CartInfo::new("64 KB Williams cartridge", 64, Platform::Computer, true),
    CartInfo::new("Express 64 KB cartridge", 64, Platform::Computer, true),
    CartInfo::new("Diamond 64 KB cartridge", 64, Platform::Computer, true),
    CartInfo::new("SpartaDOS X 64 KB cartridge", 64, Platform::Computer, true),
    CartInfo::new("XEGS 32 KB cartridge", 32, Platform::Computer, true),
    CartInfo::new("XEGS 64 KB cartridge (banks 0-7)", 64, Platform::Computer, true),
    CartInfo::new("XEGS 128 KB cartridge", 128, Platform::Computer, true),
    CartInfo::new("OSS one chip 16 KB cartridge", 16, Platform::Computer, false),
    CartInfo::new("One chip 16 KB 5200 cartridge", 16, Platform::Atari5200, true),
    CartInfo::new("Decoded Atrax 128 KB cartridge", 128, Platform::Computer, true),
    CartInfo::new("Bounty Bob 40 KB cartridge", 40, Platform::Computer, true),
    CartInfo::new("Standard 8 KB 5200 cartridge", 8, Platform::Atari5200, true),
    CartInfo::new("Standard 4 KB 5200 cartridge", 4, Platform::Atari5200, true),
    CartInfo::new("Right slot 8 KB cartridge", 8, Platform::Computer, false),
    CartInfo::new("32 KB Williams cartridge", 32, Platform::Computer, true),
    CartInfo::new("XEGS 256 KB cartridge", 256, Platform::Computer, true),
    CartInfo::new("XEGS 512 KB cartridge", 512, Platform::Computer, true),
    CartInfo::new("XEGS 1 MB cartridge", 1024, Platform::Computer, true),
    CartInfo::new("MegaCart 16 KB cartridge", 16, Platform::Computer, false),
    CartInfo::new("MegaCart 32 KB cartridge", 32, Platform::Computer, true),
    CartInfo::new("MegaCart 64 KB cartridge", 64, Platform::Computer, true),
    CartInfo::new("MegaCart 128 KB cartridge", 128, Platform::Computer, true),
    CartInfo::new("MegaCart 256 KB cartridge", 256, Platform::Computer, true),
    CartInfo::new("MegaCart 512 KB cartridge", 512, Platform::Computer, true),
    CartInfo::new("MegaCart 1 MB cartridge", 1024, Platform::Computer, true),
    CartInfo::new("Switchable XEGS 32 KB cartridge", 32, Platform::Computer, true),
    CartInfo::new("Switchable XEGS 64 KB cartridge", 64, Platform::Computer, true),
    CartInfo::new("Switchable XEGS 128 KB cartridge", 128, Platform::Computer, true),
    CartInfo::new("Switchable XEGS 256 KB cartridge", 256, Platform::Computer, true),
    CartInfo::new("Switchable XEGS 512 KB cartridge", 512, Platform::Computer, true),
    CartInfo::new("Switchable XEGS 1 MB cartridge", 1024, Platform::Computer, true),
    CartInfo::new("Phoenix 8 KB cartridge", 8, Platform::Computer, false),
    CartInfo::new("Blizzard 16 KB cartridge", 16, Platform::Computer, false),
    CartInfo::new("Atarimax 128 KB Flash cartridge", 128, Platform::Computer, true),
    CartInfo::new("Atarimax 1 MB Flash cartridge (old)", 1024, Platform::Computer, true),
    CartInfo::new("SpartaDOS X 128 KB cartridge", 128, Platform::Computer, true),
    CartInfo::new("OSS 8 KB cartridge", 8, Platform::Computer, false),
    CartInfo::new("OSS two chip 16 KB cartridge (043M)", 16, Platform::Computer, false),
    CartInfo::new("Blizzard 4 KB cartridge", 4, Platform::Computer, false),
    CartInfo::new("AST 32 KB cartridge", 32, Platform::Computer, true),
    CartInfo::new("Atrax SDX 64 KB cartridge", 64, Platform::Computer, true),
    CartInfo::new("Atrax SDX 128 KB cartridge", 128, Platform::Computer, true),
    CartInfo::new("Turbosoft 64 KB cartridge", 64, Platform::Computer, true),
    CartInfo::new("Turbosoft 128 KB cartridge", 128, Platform::Computer, true),
    CartInfo::new("Ultracart 32 KB cartridge", 32, Platform::Computer, true),
    CartInfo::new("Low bank 8 KB cartridge", 8, Platform::Computer, false),
    CartInfo::new("SIC! 128 KB cartridge", 128, Platform::Computer, true),
    CartInfo::new("SIC! 256 KB cartridge", 256, Platform::Computer, true),
    CartInfo::new("SIC! 512 KB cartridge", 512, Platform::Computer, true),
    CartInfo::new("Standard 2 KB cartridge", 2, Platform::Computer, true),
    CartInfo::new("Standard 4 KB cartridge", 4, Platform::Computer, true),
    CartInfo::new("Right slot 4 KB cartridge", 4, Platform::Computer, false),
    CartInfo::new("Blizzard 32 KB cartridge", 32, Platform::Computer, true),
    CartInfo::new("MegaMax 2 MB cartridge", 2048, Platform::Computer, true),
    CartInfo::new("The!Cart 128 MB cartridge", 131072, Platform::Computer, true),
    CartInfo::new("Flash MegaCart 4 MB cartridge", 4096, Platform::Computer, true),
    CartInfo::new("MegaCart 2 MB cartridge", 2048, Platform::Computer, true),
    CartInfo::new("The!Cart 32 MB cartridge", 32768, Platform::Computer, true),
    CartInfo::new("The!Cart 64 MB cartridge", 65536, Platform::Computer, true),
    CartInfo::new("XEGS 64 KB cartridge (banks 8-15)", 64, Platform::Computer, true),
    CartInfo::new("Atrax 128 KB cartridge", 128, Platform::Computer, true),
    CartInfo::new("aDawliah 32 KB cartridge", 32, Platform::Computer, true),
    CartInfo::new("aDawliah 64 KB cartridge", 64, Platform::Computer, true),
    CartInfo::new("Super Cart 64 KB 5200 cartridge", 64, Platform::Atari5200, true),
    CartInfo::new("Super Cart 128 KB 5200 cartridge", 128, Platform::Atari5200, true),
    CartInfo::new("Super Cart 256 KB 5200 cartridge", 256, Platform::Atari5200, true),
    CartInfo::new("Super Cart 512 KB 5200 cartridge", 512, Platform::Atari5200, true),
    CartInfo::new("Atarimax 1 MB Flash cartridge (new)", 1024, Platform::Computer, true),
];

impl CartType {
    /// Look a type up by its CART header number.
    #[must_use]
    pub fn from_id(id: i32) -> Option<Self> {
        usize::try_from(id).ok().and_then(|i| ALL_TYPES.get(i).copied())
    }

    #[must_use]
    pub const fn id(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn info(self) -> &'static CartInfo {
        &CATALOG[self as usize]
    }

    #[must_use]
    pub fn kb(self) -> u32 {
        self.info().kb
    }

    #[must_use]
    pub fn is_5200(self) -> bool {
        self.info().platform == Platform::Atari5200
    }

    /// Types a headerless image of `kb` kilobytes could be on `platform`.
    #[must_use]
    pub fn raw_candidates(kb: u32, platform: Platform) -> Vec<CartType> {
        ALL_TYPES
            .iter()
            .copied()
            .filter(|t| {
                let info = t.info();
                info.raw_detect && info.platform == platform && info.kb == kb
            })
            .collect()
    }
}

impl fmt::Display for CartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}
