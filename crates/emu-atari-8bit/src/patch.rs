//! OS patch callouts.
//!
//! Patched ROM routines start with `$F2 nn` (ESC) or `$D2 nn` (ESCRTS).
//! The CPU hands `nn` to the machine, which looks it up here. A handler
//! runs with the live register file and address space; after ESCRTS the
//! CPU returns from the patched routine itself.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use mos_6502::Registers;

use crate::memory::AddressSpace;

const ESC: u8 = 0xF2;
const ESC_RTS: u8 = 0xD2;

/// Services ESC codes on behalf of the machine.
pub trait OsPatch {
    /// Run the handler for `code`. Returns `false` if there is none, which
    /// the CPU treats as a crash.
    fn run_esc(&mut self, code: u8, regs: &mut Registers, memory: &mut AddressSpace) -> bool;
}

type Handler = Box<dyn FnMut(&mut Registers, &mut AddressSpace)>;

/// Handlers keyed by escape code.
#[derive(Default)]
pub struct PatchTable {
    handlers: HashMap<u8, Handler>,
}

impl fmt::Debug for PatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<_> = self.handlers.keys().copied().collect();
        codes.sort_unstable();
        f.debug_struct("PatchTable").field("codes", &codes).finish()
    }
}

impl PatchTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `code`, replacing any previous one.
    pub fn register(
        &mut self,
        code: u8,
        handler: impl FnMut(&mut Registers, &mut AddressSpace) + 'static,
    ) {
        self.handlers.insert(code, Box::new(handler));
    }

    pub fn unregister(&mut self, code: u8) -> bool {
        self.handlers.remove(&code).is_some()
    }

    #[must_use]
    pub fn handles(&self, code: u8) -> bool {
        self.handlers.contains_key(&code)
    }

    /// Write the two-byte escape sequence for `code` at `addr`. With `rts`
    /// the routine returns to its caller after the handler runs.
    pub fn install(memory: &mut AddressSpace, addr: u16, code: u8, rts: bool) {
        debug!("OS patch ${code:02X} at ${addr:04X}");
        memory.poke(addr, if rts { ESC_RTS } else { ESC });
        memory.poke(addr.wrapping_add(1), code);
    }
}

impl OsPatch for PatchTable {
    fn run_esc(&mut self, code: u8, regs: &mut Registers, memory: &mut AddressSpace) -> bool {
        match self.handlers.get_mut(&code) {
            Some(handler) => {
                handler(regs, memory);
                true
            }
            None => false,
        }
    }
}
