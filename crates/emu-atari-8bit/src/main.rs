//! Headless Atari 8-bit runner.
//!
//! Builds a machine, optionally inserts a cartridge, runs it for a number
//! of cycles one scan line at a time and can dump the final state as
//! JSON. Without `--os` a tiny synthetic OS that spins in a NOP loop is
//! used, which is enough to exercise cartridges and the memory map.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use emu_atari_8bit::{Atari, CartType, LoadOutcome, MachineConfig, MachineType, RamSize};
use log::info;
use mos_6502::RunOutcome;

/// Machine cycles per scan line.
const LINE_CYCLES: u32 = 114;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Machine {
    OsA,
    OsB,
    Xl,
    #[value(name = "5200")]
    A5200,
}

impl From<Machine> for MachineType {
    fn from(machine: Machine) -> Self {
        match machine {
            Machine::OsA => MachineType::OsA,
            Machine::OsB => MachineType::OsB,
            Machine::Xl => MachineType::XlXe,
            Machine::A5200 => MachineType::A5200,
        }
    }
}

/// Run an Atari 400/800, XL/XE or 5200 without a display
#[derive(Parser, Debug)]
#[command(name = "emu-atari-8bit")]
#[command(version)]
struct Cli {
    /// Machine to emulate
    #[arg(long, value_enum, default_value = "xl")]
    machine: Machine,

    /// RAM size in KB (defaults to the machine's stock size)
    #[arg(long)]
    ram: Option<u32>,

    /// OS ROM image (a synthetic NOP-loop OS is used if omitted)
    #[arg(long)]
    os: Option<PathBuf>,

    /// BASIC ROM image (8 KB)
    #[arg(long)]
    basic: Option<PathBuf>,

    /// Cartridge image, raw or CART
    #[arg(long)]
    cart: Option<PathBuf>,

    /// Cartridge type number, for raw images whose size is ambiguous
    #[arg(long)]
    cart_type: Option<i32>,

    /// Number of CPU cycles to run
    #[arg(long, default_value_t = 1_000_000)]
    cycles: u64,

    /// Write the final machine state here as JSON
    #[arg(long)]
    state_out: Option<PathBuf>,
}

/// An OS image that resets into a NOP loop and answers interrupts with
/// RTI.
fn synthetic_os(machine: MachineType) -> Vec<u8> {
    let base = machine.os_base();
    let mut os = vec![0xEA; machine.os_size()];
    let [lo, hi] = base.to_le_bytes();
    os[0x10..0x13].copy_from_slice(&[0x4C, lo, hi]);
    os[0x20] = 0x40;
    let [rti_lo, rti_hi] = (base + 0x20).to_le_bytes();
    let len = os.len();
    os[len - 6..].copy_from_slice(&[rti_lo, rti_hi, lo, hi, rti_lo, rti_hi]);
    os
}

fn read_file(path: &Path, what: &str) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|e| format!("cannot read {what} {}: {e}", path.display()))
}

fn build(cli: &Cli) -> Result<Atari, String> {
    let machine = MachineType::from(cli.machine);
    let os = match &cli.os {
        Some(path) => read_file(path, "OS ROM")?,
        None => synthetic_os(machine),
    };
    let mut config = MachineConfig::new(machine, os);
    if let Some(kb) = cli.ram {
        let ram = RamSize::from_kb(kb).ok_or_else(|| format!("unsupported RAM size {kb} KB"))?;
        config = config.with_ram(ram);
    }
    if let Some(path) = &cli.basic {
        config = config.with_basic(read_file(path, "BASIC ROM")?);
    }

    let mut atari = Atari::new(&config).map_err(|e| e.to_string())?;

    if let Some(path) = &cli.cart {
        let outcome = atari.insert_cartridge(path).map_err(|e| e.to_string())?;
        match (outcome, cli.cart_type) {
            (_, Some(id)) => {
                let kind = CartType::from_id(id)
                    .ok_or_else(|| format!("unknown cartridge type {id}"))?;
                atari.set_cartridge_type(kind).map_err(|e| e.to_string())?;
            }
            (LoadOutcome::AmbiguousSize { kb, candidates }, None) => {
                let ids: Vec<String> = candidates.iter().map(|k| k.id().to_string()).collect();
                return Err(format!(
                    "{kb} KB image needs --cart-type (one of {})",
                    ids.join(", ")
                ));
            }
            (LoadOutcome::BadChecksum { stored, computed }, None) => {
                eprintln!("Warning: CART checksum ${stored:08X}, image sums to ${computed:08X}");
            }
            (LoadOutcome::Loaded, None) => {}
        }
        info!("cartridge: {}", atari.cartridge().kind());
        atari.coldstart();
    }
    Ok(atari)
}

fn run(atari: &mut Atari, cycles: u64) -> u64 {
    let mut done = 0u64;
    while done < cycles {
        let slice = LINE_CYCLES.min(u32::try_from(cycles - done).unwrap_or(LINE_CYCLES));
        match atari.run(slice) {
            RunOutcome::Crashed(crash) => {
                eprintln!("CPU stopped: {crash}");
                return done + u64::from(atari.cpu().cycle());
            }
            RunOutcome::LimitReached | RunOutcome::Halted => {}
        }
        atari.rebase(slice);
        done += u64::from(slice);
    }
    done
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut atari = match build(&cli) {
        Ok(atari) => atari,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let ran = run(&mut atari, cli.cycles);
    let regs = atari.cpu().regs;
    info!(
        "{} ran {ran} cycles: PC=${:04X} A=${:02X} X=${:02X} Y=${:02X} S=${:02X} P=${:02X}",
        atari.mmu().machine().name(),
        regs.pc,
        regs.a,
        regs.x,
        regs.y,
        regs.s,
        regs.p.0
    );

    if let Some(path) = &cli.state_out {
        let state = atari.save_state();
        let written = serde_json::to_vec(&state)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("Error writing state to {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
        info!("state written to {}", path.display());
    }
    ExitCode::SUCCESS
}
