//! Processor state, run loop and interrupt entry.

use std::fmt;

use emu_core::{Bus, Observable, SimpleBus, Value};
use log::{trace, warn};
use thiserror::Error;

use crate::flags::{C, D, I, N, V, Z};
use crate::timing::{INTERRUPT_CYCLES, base_cycles};
use crate::{Registers, Status};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Processor variant. Only indirect JMP differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variant {
    /// NMOS 6502 / SALLY: JMP ($xxFF) wraps within the page.
    #[default]
    Nmos,
    /// 65C02: JMP ($xxFF) reads the high byte from the next page.
    Cmos65C02,
}

/// Machine services the processor needs beyond plain reads and writes.
pub trait SystemBus: Bus {
    /// OS patch callout for ESC ($F2) and ESCRTS ($D2).
    ///
    /// The handler may change registers and memory. Returns `false` when
    /// no patch is registered for `code`.
    fn escape(&mut self, code: u8, regs: &mut Registers) -> bool {
        let _ = (code, regs);
        false
    }

    /// A scan-line wait requested by the last write, as the cycle at
    /// which execution may resume.
    fn take_wsync(&mut self) -> Option<u32> {
        None
    }
}

impl SystemBus for SimpleBus {}

/// Why the processor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashKind {
    /// One of the JAM/CIM opcodes.
    Jam,
    /// An escape code nobody handles.
    UnhandledEscape(u8),
}

impl fmt::Display for CrashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrashKind::Jam => f.write_str("illegal instruction"),
            CrashKind::UnhandledEscape(code) => write!(f, "unhandled escape code ${code:02X}"),
        }
    }
}

/// A processor crash. PC is left pointing at the offending opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} (${opcode:02X}) at ${pc:04X}")]
pub struct Crash {
    pub pc: u16,
    pub opcode: u8,
    pub kind: CrashKind,
}

/// How a call to [`Mos6502::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The cycle position reached the limit.
    LimitReached,
    /// Waiting on WSYNC; the resume cycle lies beyond the limit.
    Halted,
    Crashed(Crash),
}

/// Register file and run state, in save order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuState {
    pub regs: Registers,
    pub irq: bool,
    pub cycle: u32,
    pub wsync: Option<u32>,
}

/// The 6502 core.
///
/// Executes whole instructions. Each instruction is charged its base
/// cycle count up front, then any page-cross or branch penalties.
#[derive(Debug)]
pub struct Mos6502 {
    pub regs: Registers,
    pub(crate) variant: Variant,
    /// IRQ line level.
    irq: bool,
    /// Position within the current run, in machine cycles.
    pub(crate) cycle: u32,
    /// Resume cycle while halted on WSYNC.
    wsync: Option<u32>,
    /// Whether $D2/$F2 call out to OS patches.
    pub(crate) escapes: bool,
    total_cycles: u64,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6502 {
    #[must_use]
    pub fn new() -> Self {
        Self::with_variant(Variant::Nmos)
    }

    #[must_use]
    pub fn with_variant(variant: Variant) -> Self {
        Self {
            regs: Registers::new(),
            variant,
            irq: false,
            cycle: 0,
            wsync: None,
            escapes: true,
            total_cycles: 0,
        }
    }

    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Enable or disable the ESC/ESCRTS callouts. When disabled, $D2 and
    /// $F2 jam like their neighbours.
    pub fn set_escapes(&mut self, enabled: bool) {
        self.escapes = enabled;
    }

    /// Reset: S=$FF, P=$34, IRQ line released, PC from $FFFC.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.regs.s = 0xFF;
        self.regs.p = Status(0x34);
        self.irq = false;
        self.wsync = None;
        self.regs.pc = Self::read_word(bus, RESET_VECTOR);
        trace!("reset to ${:04X}", self.regs.pc);
    }

    /// Drive the IRQ line. Sampled before every instruction.
    pub fn set_irq(&mut self, asserted: bool) {
        self.irq = asserted;
    }

    #[must_use]
    pub fn irq(&self) -> bool {
        self.irq
    }

    /// Take a non-maskable interrupt immediately.
    pub fn nmi(&mut self, bus: &mut impl Bus) {
        self.interrupt(bus, NMI_VECTOR);
    }

    #[must_use]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn set_cycle(&mut self, cycle: u32) {
        self.cycle = cycle;
    }

    /// Move the cycle origin back by `cycles`, e.g. at the end of a scan
    /// line. A pending WSYNC resume point is line-relative and unchanged.
    pub fn rebase(&mut self, cycles: u32) {
        self.cycle = self.cycle.saturating_sub(cycles);
    }

    /// True while halted on WSYNC.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.wsync.is_some()
    }

    /// Halt until the cycle position reaches `resume`.
    pub fn halt_until(&mut self, resume: u32) {
        self.wsync = Some(resume);
    }

    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    #[must_use]
    pub fn snapshot(&self) -> CpuState {
        CpuState {
            regs: self.regs,
            irq: self.irq,
            cycle: self.cycle,
            wsync: self.wsync,
        }
    }

    pub fn restore(&mut self, state: &CpuState) {
        self.regs = state.regs;
        self.regs.p = Status::from_byte(state.regs.p.0);
        self.irq = state.irq;
        self.cycle = state.cycle;
        self.wsync = state.wsync;
    }

    /// Execute until the cycle position reaches `limit`.
    ///
    /// A WSYNC wait whose resume point lies inside the run skips ahead to
    /// it; otherwise the core halts at `limit` and later runs return at
    /// once until one reaches the resume point.
    pub fn run<B: SystemBus>(&mut self, bus: &mut B, limit: u32) -> RunOutcome {
        if let Some(resume) = self.wsync {
            if limit < resume {
                return RunOutcome::Halted;
            }
            self.cycle = resume;
            self.wsync = None;
        }

        while self.cycle < limit {
            if self.irq && !self.regs.p.is_set(I) {
                self.interrupt(bus, IRQ_VECTOR);
                continue;
            }
            if let Err(crash) = self.step(bus) {
                warn!("CPU crash: {crash}");
                return RunOutcome::Crashed(crash);
            }
            if let Some(resume) = bus.take_wsync() {
                if self.cycle <= resume && limit >= resume {
                    self.cycle = resume;
                } else {
                    self.wsync = Some(resume);
                    self.cycle = limit;
                    return RunOutcome::Halted;
                }
            }
        }
        RunOutcome::LimitReached
    }

    /// Execute one instruction, returning the cycles it took.
    ///
    /// Interrupts are not sampled here; see [`run`](Self::run).
    pub fn step<B: SystemBus>(&mut self, bus: &mut B) -> Result<u32, Crash> {
        let start = self.cycle;
        let pc = self.regs.pc;
        let opcode = self.fetch(bus);
        self.cycle += base_cycles(opcode);
        let result = self.execute(bus, opcode);
        let used = self.cycle - start;
        self.total_cycles += u64::from(used);
        match result {
            Ok(()) => Ok(used),
            Err(kind) => {
                self.regs.pc = pc;
                Err(Crash { pc, opcode, kind })
            }
        }
    }

    fn interrupt(&mut self, bus: &mut impl Bus, vector: u16) {
        self.push_word(bus, self.regs.pc);
        self.push(bus, self.regs.p.to_byte_irq());
        self.regs.p.set(I);
        self.regs.pc = Self::read_word(bus, vector);
        self.cycle += INTERRUPT_CYCLES;
        self.total_cycles += u64::from(INTERRUPT_CYCLES);
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" | "sp" => Some(self.regs.s.into()),
            "p" | "status" => Some(self.regs.p.0.into()),
            "flags.c" => Some(self.regs.p.is_set(C).into()),
            "flags.z" => Some(self.regs.p.is_set(Z).into()),
            "flags.i" => Some(self.regs.p.is_set(I).into()),
            "flags.d" => Some(self.regs.p.is_set(D).into()),
            "flags.v" => Some(self.regs.p.is_set(V).into()),
            "flags.n" => Some(self.regs.p.is_set(N).into()),
            "irq" => Some(self.irq.into()),
            "cycle" => Some(self.cycle.into()),
            "total_cycles" => Some(self.total_cycles.into()),
            "halted" => Some(self.is_halted().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "a", "x", "y", "s", "p", "flags.c", "flags.z", "flags.i", "flags.d", "flags.v",
            "flags.n", "irq", "cycle", "total_cycles", "halted",
        ]
    }
}
