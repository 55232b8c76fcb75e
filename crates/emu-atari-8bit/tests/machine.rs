//! Whole-machine behaviour: boot, PORTB banking, OS patches, WSYNC and
//! fetch-triggered cartridge switching.

use std::cell::Cell;
use std::rc::Rc;

use emu_atari_8bit::cartridge::encode_cart;
use emu_atari_8bit::{
    AccessKind, Atari, AtariError, CartType, Hardware, MachineConfig, MachineType, PatchTable,
    RamSize,
};
use mos_6502::{CrashKind, RunOutcome};

/// XL OS image: reset to $E000, NMI to $E100, IRQ to $E200, with `code`
/// at $E000 and NOPs everywhere else.
fn xl_os(code: &[u8]) -> Vec<u8> {
    let mut os = vec![0xEA; 0x4000];
    os[0x2000..0x2000 + code.len()].copy_from_slice(code);
    os[0x3FFA..].copy_from_slice(&[0x00, 0xE1, 0x00, 0xE0, 0x00, 0xE2]);
    os
}

fn xl(code: &[u8]) -> Atari {
    Atari::new(&MachineConfig::new(MachineType::XlXe, xl_os(code))).expect("XL machine")
}

/// Start executing `code` from $0600.
fn run_from_ram(atari: &mut Atari, code: &[u8]) {
    for (i, &byte) in code.iter().enumerate() {
        atari.poke(0x0600 + i as u16, byte);
    }
    atari.cpu_mut().regs.pc = 0x0600;
}

#[test]
fn reset_state() {
    let atari = xl(&[]);
    let regs = atari.cpu().regs;
    assert_eq!(regs.pc, 0xE000);
    assert_eq!(regs.s, 0xFF);
    assert!(regs.p.0 & 0x04 != 0);
}

#[test]
fn lda_adc_from_reset() {
    let mut atari = xl(&[0xA9, 0x01, 0x69, 0x01]);
    assert_eq!(atari.run(4), RunOutcome::LimitReached);
    let regs = atari.cpu().regs;
    assert_eq!(regs.a, 2);
    assert_eq!(regs.p.0 & 0x83, 0);
    assert_eq!(atari.cpu().cycle(), 4);
    assert_eq!(regs.pc, 0xE004);
}

#[test]
fn construction_errors() {
    let err = Atari::new(&MachineConfig::new(MachineType::XlXe, vec![0; 0x2800])).unwrap_err();
    assert!(matches!(
        err,
        AtariError::BadRomSize {
            expected: 0x4000,
            actual: 0x2800
        }
    ));
    let config =
        MachineConfig::new(MachineType::A5200, vec![0; 0x800]).with_ram(RamSize::K64);
    assert!(matches!(
        Atari::new(&config),
        Err(AtariError::UnsupportedRam { ram_kb: 64, .. })
    ));
}

#[test]
fn portb_write_shows_basic() {
    // LDA #$FD; STA $D301
    let code = [0xA9, 0xFD, 0x8D, 0x01, 0xD3];
    let config =
        MachineConfig::new(MachineType::XlXe, xl_os(&code)).with_basic(vec![0xBA; 0x2000]);
    let mut atari = Atari::new(&config).expect("XL machine");
    assert_eq!(atari.memory().kind(0xA000), AccessKind::Ram);

    atari.run(6);
    assert_eq!(atari.mmu().portb(), 0xFD);
    assert_eq!(atari.memory().kind(0xA000), AccessKind::Rom);
    assert_eq!(atari.peek(0xA000), 0xBA);
}

#[test]
fn selftest_rom_follows_portb_bit_7() {
    let mut os = xl_os(&[]);
    os[0x1000..0x1800].fill(0x57);
    let mut atari = Atari::new(&MachineConfig::new(MachineType::XlXe, os)).expect("XL machine");
    atari.mmu_mut().write_portb(0x7F);
    assert!(atari.mmu().selftest_enabled());
    assert_eq!(atari.peek(0x5000), 0x57);
    assert_eq!(atari.memory().kind(0x57FF), AccessKind::Rom);
    atari.mmu_mut().write_portb(0xFF);
    assert!(!atari.mmu().selftest_enabled());
    assert_eq!(atari.memory().kind(0x5000), AccessKind::Ram);
}

#[test]
fn extended_bank_round_trip() {
    let config = MachineConfig::new(MachineType::XlXe, xl_os(&[])).with_ram(RamSize::K128);
    let mut atari = Atari::new(&config).expect("130XE");
    atari.poke(0x4000, 0x11);
    atari.mmu_mut().write_portb(0xE3);
    assert_eq!(atari.mmu().xe_bank(), Some(1));
    atari.poke(0x4000, 0x22);
    atari.mmu_mut().write_portb(0xFF);
    assert_eq!(atari.peek(0x4000), 0x11);
    atari.mmu_mut().write_portb(0xE3);
    assert_eq!(atari.peek(0x4000), 0x22);
}

#[test]
fn bounty_bob_switches_on_instruction_fetch() {
    let mut atari = xl(&[]);
    let image: Vec<u8> = (0..10).flat_map(|bank| vec![bank as u8; 0x1000]).collect();
    atari
        .insert_cartridge_image(&encode_cart(CartType::BountyBob40, &image))
        .expect("Bounty Bob");
    assert_eq!(atari.peek(0x9000), 4);

    // JMP $9FF9: the fetch reads 0 (BRK) and selects high bank 3.
    run_from_ram(&mut atari, &[0x4C, 0xF9, 0x9F]);
    atari.run(3 + 7);
    assert_eq!(atari.peek(0x9000), 7);
    assert_eq!(atari.cpu().regs.pc, 0xE200);
}

#[test]
fn operand_nop_reads_cartridge_control() {
    let mut atari = xl(&[]);
    let image: Vec<u8> = (0..8).flat_map(|bank| vec![0x10 + bank as u8; 0x2000]).collect();
    atari
        .insert_cartridge_image(&encode_cart(CartType::Williams64, &image))
        .expect("Williams");
    assert_eq!(atari.peek(0xA000), 0x10);

    // NOP $D503
    run_from_ram(&mut atari, &[0x0C, 0x03, 0xD5]);
    atari.run(4);
    assert_eq!(atari.cpu().regs.pc, 0x0603);
    assert_eq!(atari.peek(0xA000), 0x13);
}

#[test]
fn escape_calls_os_patch() {
    let mut atari = xl(&[]);
    let mut table = PatchTable::new();
    table.register(0x10, |regs, memory| {
        regs.a = 0x42;
        memory.poke(0x0700, regs.x);
    });
    atari.set_os_patch(Some(Box::new(table)));

    // LDX #$33; ESC $10; NOP
    run_from_ram(&mut atari, &[0xA2, 0x33, 0xF2, 0x10, 0xEA]);
    atari.run(6);
    assert_eq!(atari.cpu().regs.a, 0x42);
    assert_eq!(atari.peek(0x0700), 0x33);
}

#[test]
fn escrts_returns_to_caller() {
    let mut atari = xl(&[]);
    let called = Rc::new(Cell::new(0));
    let seen = Rc::clone(&called);
    let mut table = PatchTable::new();
    table.register(0x20, move |_, _| seen.set(seen.get() + 1));
    PatchTable::install(atari.mmu_mut().memory_mut(), 0x0680, 0x20, true);
    atari.set_os_patch(Some(Box::new(table)));

    // JSR $0680; LDY #$01
    run_from_ram(&mut atari, &[0x20, 0x80, 0x06, 0xA0, 0x01]);
    atari.run(6 + 2 + 2);
    assert_eq!(called.get(), 1);
    assert_eq!(atari.cpu().regs.y, 0x01);
    assert_eq!(atari.cpu().regs.s, 0xFF);
}

#[test]
fn unhandled_escape_crashes() {
    let mut atari = xl(&[]);
    atari.set_os_patch(Some(Box::new(PatchTable::new())));
    run_from_ram(&mut atari, &[0xF2, 0x11]);
    let RunOutcome::Crashed(crash) = atari.run(10) else {
        panic!("expected a crash");
    };
    assert_eq!(crash.kind, CrashKind::UnhandledEscape(0x11));
    assert_eq!(crash.pc, 0x0600);
    assert_eq!(atari.cpu().regs.pc, 0x0600);
}

/// ANTIC's WSYNC: the CPU may continue at cycle 105 of the line.
#[derive(Default)]
struct Antic {
    wsync: Option<u32>,
}

impl Hardware for Antic {
    fn read(&mut self, _addr: u16) -> u8 {
        0
    }

    fn write(&mut self, addr: u16, _value: u8) {
        if addr == 0xD40A {
            self.wsync = Some(105);
        }
    }

    fn take_wsync(&mut self) -> Option<u32> {
        self.wsync.take()
    }
}

#[test]
fn wsync_halts_until_resume_cycle() {
    let mut atari = xl(&[]);
    atari.set_hardware(Box::new(Antic::default()));
    // STA $D40A; NOP...
    run_from_ram(&mut atari, &[0x8D, 0x0A, 0xD4, 0xEA, 0xEA]);

    assert_eq!(atari.run(50), RunOutcome::Halted);
    assert!(atari.cpu().is_halted());
    assert_eq!(atari.cpu().regs.pc, 0x0603);
    assert_eq!(atari.run(80), RunOutcome::Halted);
    assert_eq!(atari.run(114), RunOutcome::LimitReached);
    assert!(!atari.cpu().is_halted());
    assert!(atari.cpu().regs.pc > 0x0603);
}

#[test]
fn nmi_enters_handler() {
    let mut atari = xl(&[]);
    atari.nmi();
    assert_eq!(atari.cpu().regs.pc, 0xE100);
    assert_eq!(atari.cpu().regs.s, 0xFC);
}

#[test]
fn irq_waits_for_interrupt_enable() {
    // CLI
    let mut atari = xl(&[0x58]);
    atari.set_irq(true);
    atari.run(2);
    assert_eq!(atari.cpu().regs.pc, 0xE001);
    atari.run(9);
    assert_eq!(atari.cpu().regs.pc, 0xE200);
}

#[test]
fn warmstart_keeps_ram() {
    let mut atari = xl(&[]);
    atari.poke(0x2000, 0x99);
    atari.mmu_mut().write_portb(0xFE);
    atari.warmstart();
    assert_eq!(atari.peek(0x2000), 0x99);
    assert_eq!(atari.mmu().portb(), 0xFF);
    assert_eq!(atari.memory().kind(0xE000), AccessKind::Rom);
    assert_eq!(atari.cpu().regs.pc, 0xE000);
}

#[test]
fn basic_in_left_slot_on_400_800() {
    let config =
        MachineConfig::new(MachineType::OsB, vec![0; 0x2800]).with_basic(vec![0xBA; 0x2000]);
    let mut atari = Atari::new(&config).expect("800");
    assert!(atari.mmu().cart_a0bf_enabled());
    assert_eq!(atari.peek(0xA000), 0xBA);
    atari
        .insert_cartridge_image(&encode_cart(CartType::Std8, &[0xCC; 0x2000]))
        .expect("cartridge");
    assert_eq!(atari.peek(0xA000), 0xCC);
    atari.remove_cartridge();
    assert_eq!(atari.peek(0xA000), 0xBA);
}
