//! Atari 400/800, XL/XE and 5200 machine core.
//!
//! The 64 KB address space carries a tag per byte: RAM, ROM or
//! HARDWARE. ROM writes are dropped and HARDWARE accesses go to the
//! cartridge control area or an external chip dispatcher. Everything
//! that appears and disappears at run time (OS, BASIC, self-test,
//! cartridge banks, XE banks) is copied in and out of the address space
//! rather than remapped, so reads stay a single array lookup.
//!
//! [`Atari`] ties the 6502 core to the memory map, cartridge slot and
//! the collaborators supplied by the host.

mod atari;
mod banks;
mod bus;
pub mod cartridge;
mod config;
mod error;
mod hardware;
pub mod memory;
mod mmu;
pub mod patch;
pub mod rtime;

pub use atari::{Atari, MachineState};
pub use banks::BankWindow;
pub use bus::AtariBus;
pub use cartridge::{CartState, CartType, Cartridge, LoadOutcome, Platform};
pub use config::{MachineConfig, MachineType, RamSize};
pub use error::{AtariError, CartError};
pub use hardware::{Hardware, NullHardware};
pub use memory::{AccessKind, AddressSpace};
pub use mmu::{BasicSwitch, Mmu, MmuState, PortbBasicSwitch};
pub use patch::{OsPatch, PatchTable};
