//! Opcode dispatch.

use emu_core::Bus;

use crate::addressing::Mode::{self, Abs, Abx, Aby, Imm, Izx, Izy, Zp, Zpx, Zpy};
use crate::cpu::{CrashKind, IRQ_VECTOR, SystemBus, Variant};
use crate::flags::{C, D, I, N, V, Z};
use crate::{Mos6502, Status};

impl Mos6502 {
    // =========================================================================
    // Addressing-mode drivers
    // =========================================================================

    /// Read instruction. Indexing across a page costs one cycle.
    fn read_op(&mut self, bus: &mut impl Bus, mode: Mode, op: fn(&mut Self, u8)) {
        let (addr, crossed) = self.operand(bus, mode);
        if crossed {
            self.cycle += 1;
        }
        let value = bus.read(addr);
        op(self, value);
    }

    fn write_op(&mut self, bus: &mut impl Bus, mode: Mode, value: fn(&Self) -> u8) {
        let (addr, _) = self.operand(bus, mode);
        bus.write(addr, value(self));
    }

    /// Read-modify-write. NMOS parts store the unmodified value first.
    fn rmw_op(&mut self, bus: &mut impl Bus, mode: Mode, op: fn(&mut Self, u8) -> u8) {
        let (addr, _) = self.operand(bus, mode);
        let value = bus.read(addr);
        bus.write(addr, value);
        let result = op(self, value);
        bus.write(addr, result);
    }

    /// SHA/SHX/SHY/SHS: store `value & (base high byte + 1)`.
    fn high_byte_store(&mut self, bus: &mut impl Bus, index: u8, value: u8) {
        let base = self.fetch_word(bus);
        let high = (base >> 8) as u8;
        let addr = base.wrapping_add(u16::from(index));
        bus.write(addr, value & high.wrapping_add(1));
    }

    fn reg_a(&self) -> u8 {
        self.regs.a
    }

    fn reg_x(&self) -> u8 {
        self.regs.x
    }

    fn reg_y(&self) -> u8 {
        self.regs.y
    }

    fn reg_ax(&self) -> u8 {
        self.regs.a & self.regs.x
    }

    fn ignore(&mut self, _: u8) {}

    fn accumulator(&mut self, op: fn(&mut Self, u8) -> u8) {
        self.regs.a = op(self, self.regs.a);
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub(crate) fn execute<B: SystemBus>(&mut self, bus: &mut B, opcode: u8) -> Result<(), CrashKind> {
        match opcode {
            // =================================================================
            // Loads and stores
            // =================================================================
            0xA9 => self.read_op(bus, Imm, Self::do_lda),
            0xA5 => self.read_op(bus, Zp, Self::do_lda),
            0xB5 => self.read_op(bus, Zpx, Self::do_lda),
            0xAD => self.read_op(bus, Abs, Self::do_lda),
            0xBD => self.read_op(bus, Abx, Self::do_lda),
            0xB9 => self.read_op(bus, Aby, Self::do_lda),
            0xA1 => self.read_op(bus, Izx, Self::do_lda),
            0xB1 => self.read_op(bus, Izy, Self::do_lda),

            0xA2 => self.read_op(bus, Imm, Self::do_ldx),
            0xA6 => self.read_op(bus, Zp, Self::do_ldx),
            0xB6 => self.read_op(bus, Zpy, Self::do_ldx),
            0xAE => self.read_op(bus, Abs, Self::do_ldx),
            0xBE => self.read_op(bus, Aby, Self::do_ldx),

            0xA0 => self.read_op(bus, Imm, Self::do_ldy),
            0xA4 => self.read_op(bus, Zp, Self::do_ldy),
            0xB4 => self.read_op(bus, Zpx, Self::do_ldy),
            0xAC => self.read_op(bus, Abs, Self::do_ldy),
            0xBC => self.read_op(bus, Abx, Self::do_ldy),

            0x85 => self.write_op(bus, Zp, Self::reg_a),
            0x95 => self.write_op(bus, Zpx, Self::reg_a),
            0x8D => self.write_op(bus, Abs, Self::reg_a),
            0x9D => self.write_op(bus, Abx, Self::reg_a),
            0x99 => self.write_op(bus, Aby, Self::reg_a),
            0x81 => self.write_op(bus, Izx, Self::reg_a),
            0x91 => self.write_op(bus, Izy, Self::reg_a),

            0x86 => self.write_op(bus, Zp, Self::reg_x),
            0x96 => self.write_op(bus, Zpy, Self::reg_x),
            0x8E => self.write_op(bus, Abs, Self::reg_x),

            0x84 => self.write_op(bus, Zp, Self::reg_y),
            0x94 => self.write_op(bus, Zpx, Self::reg_y),
            0x8C => self.write_op(bus, Abs, Self::reg_y),

            // =================================================================
            // Logic and arithmetic
            // =================================================================
            0x09 => self.read_op(bus, Imm, Self::do_ora),
            0x05 => self.read_op(bus, Zp, Self::do_ora),
            0x15 => self.read_op(bus, Zpx, Self::do_ora),
            0x0D => self.read_op(bus, Abs, Self::do_ora),
            0x1D => self.read_op(bus, Abx, Self::do_ora),
            0x19 => self.read_op(bus, Aby, Self::do_ora),
            0x01 => self.read_op(bus, Izx, Self::do_ora),
            0x11 => self.read_op(bus, Izy, Self::do_ora),

            0x29 => self.read_op(bus, Imm, Self::do_and),
            0x25 => self.read_op(bus, Zp, Self::do_and),
            0x35 => self.read_op(bus, Zpx, Self::do_and),
            0x2D => self.read_op(bus, Abs, Self::do_and),
            0x3D => self.read_op(bus, Abx, Self::do_and),
            0x39 => self.read_op(bus, Aby, Self::do_and),
            0x21 => self.read_op(bus, Izx, Self::do_and),
            0x31 => self.read_op(bus, Izy, Self::do_and),

            0x49 => self.read_op(bus, Imm, Self::do_eor),
            0x45 => self.read_op(bus, Zp, Self::do_eor),
            0x55 => self.read_op(bus, Zpx, Self::do_eor),
            0x4D => self.read_op(bus, Abs, Self::do_eor),
            0x5D => self.read_op(bus, Abx, Self::do_eor),
            0x59 => self.read_op(bus, Aby, Self::do_eor),
            0x41 => self.read_op(bus, Izx, Self::do_eor),
            0x51 => self.read_op(bus, Izy, Self::do_eor),

            0x69 => self.read_op(bus, Imm, Self::do_adc),
            0x65 => self.read_op(bus, Zp, Self::do_adc),
            0x75 => self.read_op(bus, Zpx, Self::do_adc),
            0x6D => self.read_op(bus, Abs, Self::do_adc),
            0x7D => self.read_op(bus, Abx, Self::do_adc),
            0x79 => self.read_op(bus, Aby, Self::do_adc),
            0x61 => self.read_op(bus, Izx, Self::do_adc),
            0x71 => self.read_op(bus, Izy, Self::do_adc),

            // $EB is an undocumented alias of SBC #imm
            0xE9 | 0xEB => self.read_op(bus, Imm, Self::do_sbc),
            0xE5 => self.read_op(bus, Zp, Self::do_sbc),
            0xF5 => self.read_op(bus, Zpx, Self::do_sbc),
            0xED => self.read_op(bus, Abs, Self::do_sbc),
            0xFD => self.read_op(bus, Abx, Self::do_sbc),
            0xF9 => self.read_op(bus, Aby, Self::do_sbc),
            0xE1 => self.read_op(bus, Izx, Self::do_sbc),
            0xF1 => self.read_op(bus, Izy, Self::do_sbc),

            0xC9 => self.read_op(bus, Imm, Self::do_cmp),
            0xC5 => self.read_op(bus, Zp, Self::do_cmp),
            0xD5 => self.read_op(bus, Zpx, Self::do_cmp),
            0xCD => self.read_op(bus, Abs, Self::do_cmp),
            0xDD => self.read_op(bus, Abx, Self::do_cmp),
            0xD9 => self.read_op(bus, Aby, Self::do_cmp),
            0xC1 => self.read_op(bus, Izx, Self::do_cmp),
            0xD1 => self.read_op(bus, Izy, Self::do_cmp),

            0xE0 => self.read_op(bus, Imm, Self::do_cpx),
            0xE4 => self.read_op(bus, Zp, Self::do_cpx),
            0xEC => self.read_op(bus, Abs, Self::do_cpx),

            0xC0 => self.read_op(bus, Imm, Self::do_cpy),
            0xC4 => self.read_op(bus, Zp, Self::do_cpy),
            0xCC => self.read_op(bus, Abs, Self::do_cpy),

            0x24 => self.read_op(bus, Zp, Self::do_bit),
            0x2C => self.read_op(bus, Abs, Self::do_bit),

            // =================================================================
            // Shifts, rotates, increments
            // =================================================================
            0x0A => self.accumulator(Self::do_asl),
            0x06 => self.rmw_op(bus, Zp, Self::do_asl),
            0x16 => self.rmw_op(bus, Zpx, Self::do_asl),
            0x0E => self.rmw_op(bus, Abs, Self::do_asl),
            0x1E => self.rmw_op(bus, Abx, Self::do_asl),

            0x4A => self.accumulator(Self::do_lsr),
            0x46 => self.rmw_op(bus, Zp, Self::do_lsr),
            0x56 => self.rmw_op(bus, Zpx, Self::do_lsr),
            0x4E => self.rmw_op(bus, Abs, Self::do_lsr),
            0x5E => self.rmw_op(bus, Abx, Self::do_lsr),

            0x2A => self.accumulator(Self::do_rol),
            0x26 => self.rmw_op(bus, Zp, Self::do_rol),
            0x36 => self.rmw_op(bus, Zpx, Self::do_rol),
            0x2E => self.rmw_op(bus, Abs, Self::do_rol),
            0x3E => self.rmw_op(bus, Abx, Self::do_rol),

            0x6A => self.accumulator(Self::do_ror),
            0x66 => self.rmw_op(bus, Zp, Self::do_ror),
            0x76 => self.rmw_op(bus, Zpx, Self::do_ror),
            0x6E => self.rmw_op(bus, Abs, Self::do_ror),
            0x7E => self.rmw_op(bus, Abx, Self::do_ror),

            0xE6 => self.rmw_op(bus, Zp, Self::do_inc),
            0xF6 => self.rmw_op(bus, Zpx, Self::do_inc),
            0xEE => self.rmw_op(bus, Abs, Self::do_inc),
            0xFE => self.rmw_op(bus, Abx, Self::do_inc),

            0xC6 => self.rmw_op(bus, Zp, Self::do_dec),
            0xD6 => self.rmw_op(bus, Zpx, Self::do_dec),
            0xCE => self.rmw_op(bus, Abs, Self::do_dec),
            0xDE => self.rmw_op(bus, Abx, Self::do_dec),

            // =================================================================
            // Register transfers and counters
            // =================================================================
            0xAA => self.do_ldx(self.regs.a),
            0xA8 => self.do_ldy(self.regs.a),
            0x8A => self.do_lda(self.regs.x),
            0x98 => self.do_lda(self.regs.y),
            0xBA => self.do_ldx(self.regs.s),
            // TXS leaves flags alone
            0x9A => self.regs.s = self.regs.x,
            0xE8 => self.do_ldx(self.regs.x.wrapping_add(1)),
            0xC8 => self.do_ldy(self.regs.y.wrapping_add(1)),
            0xCA => self.do_ldx(self.regs.x.wrapping_sub(1)),
            0x88 => self.do_ldy(self.regs.y.wrapping_sub(1)),

            // =================================================================
            // Flags
            // =================================================================
            0x18 => self.regs.p.clear(C),
            0x38 => self.regs.p.set(C),
            0x58 => self.regs.p.clear(I),
            0x78 => self.regs.p.set(I),
            0xB8 => self.regs.p.clear(V),
            0xD8 => self.regs.p.clear(D),
            0xF8 => self.regs.p.set(D),

            // =================================================================
            // Stack
            // =================================================================
            0x48 => self.push(bus, self.regs.a),
            0x08 => self.push(bus, self.regs.p.to_byte_brk()),
            0x68 => {
                let value = self.pull(bus);
                self.do_lda(value);
            }
            0x28 => {
                let value = self.pull(bus);
                self.regs.p = Status::from_byte(value);
            }

            // =================================================================
            // Branches
            // =================================================================
            0x10 => self.branch(bus, !self.regs.p.is_set(N)),
            0x30 => self.branch(bus, self.regs.p.is_set(N)),
            0x50 => self.branch(bus, !self.regs.p.is_set(V)),
            0x70 => self.branch(bus, self.regs.p.is_set(V)),
            0x90 => self.branch(bus, !self.regs.p.is_set(C)),
            0xB0 => self.branch(bus, self.regs.p.is_set(C)),
            0xD0 => self.branch(bus, !self.regs.p.is_set(Z)),
            0xF0 => self.branch(bus, self.regs.p.is_set(Z)),

            // =================================================================
            // Jumps, calls, returns
            // =================================================================
            0x4C => self.regs.pc = self.fetch_word(bus),
            0x6C => {
                let ptr = self.fetch_word(bus);
                self.regs.pc = match self.variant {
                    Variant::Nmos => Self::read_word_page_bug(bus, ptr),
                    Variant::Cmos65C02 => Self::read_word(bus, ptr),
                };
            }
            0x20 => {
                let target = self.fetch_word(bus);
                self.push_word(bus, self.regs.pc.wrapping_sub(1));
                self.regs.pc = target;
            }
            0x60 => self.regs.pc = self.pull_word(bus).wrapping_add(1),
            0x40 => {
                let p = self.pull(bus);
                self.regs.p = Status::from_byte(p);
                self.regs.pc = self.pull_word(bus);
            }
            0x00 => {
                // BRK skips its padding byte
                let ret = self.regs.pc.wrapping_add(1);
                self.push_word(bus, ret);
                self.push(bus, self.regs.p.to_byte_brk());
                self.regs.p.set(I);
                self.regs.pc = Self::read_word(bus, IRQ_VECTOR);
            }

            // =================================================================
            // OS patch escapes
            // =================================================================
            0xD2 | 0xF2 if self.escapes => {
                let code = self.fetch(bus);
                if !bus.escape(code, &mut self.regs) {
                    return Err(CrashKind::UnhandledEscape(code));
                }
                self.regs.p = Status::from_byte(self.regs.p.0);
                if opcode == 0xD2 {
                    self.regs.pc = self.pull_word(bus).wrapping_add(1);
                }
            }

            // =================================================================
            // NOPs, documented and otherwise
            // =================================================================
            0xEA | 0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => {}
            // Operand NOPs still read their address, so they can trip
            // access-switched cartridge banks.
            0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => self.read_op(bus, Imm, Self::ignore),
            0x04 | 0x44 | 0x64 => self.read_op(bus, Zp, Self::ignore),
            0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => self.read_op(bus, Zpx, Self::ignore),
            0x0C => self.read_op(bus, Abs, Self::ignore),
            0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => self.read_op(bus, Abx, Self::ignore),

            // =================================================================
            // Undocumented read-modify-write combinations
            // =================================================================
            0x07 => self.rmw_op(bus, Zp, Self::do_slo),
            0x17 => self.rmw_op(bus, Zpx, Self::do_slo),
            0x0F => self.rmw_op(bus, Abs, Self::do_slo),
            0x1F => self.rmw_op(bus, Abx, Self::do_slo),
            0x1B => self.rmw_op(bus, Aby, Self::do_slo),
            0x03 => self.rmw_op(bus, Izx, Self::do_slo),
            0x13 => self.rmw_op(bus, Izy, Self::do_slo),

            0x27 => self.rmw_op(bus, Zp, Self::do_rla),
            0x37 => self.rmw_op(bus, Zpx, Self::do_rla),
            0x2F => self.rmw_op(bus, Abs, Self::do_rla),
            0x3F => self.rmw_op(bus, Abx, Self::do_rla),
            0x3B => self.rmw_op(bus, Aby, Self::do_rla),
            0x23 => self.rmw_op(bus, Izx, Self::do_rla),
            0x33 => self.rmw_op(bus, Izy, Self::do_rla),

            0x47 => self.rmw_op(bus, Zp, Self::do_sre),
            0x57 => self.rmw_op(bus, Zpx, Self::do_sre),
            0x4F => self.rmw_op(bus, Abs, Self::do_sre),
            0x5F => self.rmw_op(bus, Abx, Self::do_sre),
            0x5B => self.rmw_op(bus, Aby, Self::do_sre),
            0x43 => self.rmw_op(bus, Izx, Self::do_sre),
            0x53 => self.rmw_op(bus, Izy, Self::do_sre),

            0x67 => self.rmw_op(bus, Zp, Self::do_rra),
            0x77 => self.rmw_op(bus, Zpx, Self::do_rra),
            0x6F => self.rmw_op(bus, Abs, Self::do_rra),
            0x7F => self.rmw_op(bus, Abx, Self::do_rra),
            0x7B => self.rmw_op(bus, Aby, Self::do_rra),
            0x63 => self.rmw_op(bus, Izx, Self::do_rra),
            0x73 => self.rmw_op(bus, Izy, Self::do_rra),

            0xC7 => self.rmw_op(bus, Zp, Self::do_dcp),
            0xD7 => self.rmw_op(bus, Zpx, Self::do_dcp),
            0xCF => self.rmw_op(bus, Abs, Self::do_dcp),
            0xDF => self.rmw_op(bus, Abx, Self::do_dcp),
            0xDB => self.rmw_op(bus, Aby, Self::do_dcp),
            0xC3 => self.rmw_op(bus, Izx, Self::do_dcp),
            0xD3 => self.rmw_op(bus, Izy, Self::do_dcp),

            0xE7 => self.rmw_op(bus, Zp, Self::do_isc),
            0xF7 => self.rmw_op(bus, Zpx, Self::do_isc),
            0xEF => self.rmw_op(bus, Abs, Self::do_isc),
            0xFF => self.rmw_op(bus, Abx, Self::do_isc),
            0xFB => self.rmw_op(bus, Aby, Self::do_isc),
            0xE3 => self.rmw_op(bus, Izx, Self::do_isc),
            0xF3 => self.rmw_op(bus, Izy, Self::do_isc),

            // =================================================================
            // Undocumented loads and stores
            // =================================================================
            0xA7 => self.read_op(bus, Zp, Self::do_lax),
            0xB7 => self.read_op(bus, Zpy, Self::do_lax),
            0xAF => self.read_op(bus, Abs, Self::do_lax),
            0xBF => self.read_op(bus, Aby, Self::do_lax),
            0xA3 => self.read_op(bus, Izx, Self::do_lax),
            0xB3 => self.read_op(bus, Izy, Self::do_lax),
            0xBB => self.read_op(bus, Aby, Self::do_las),

            0x87 => self.write_op(bus, Zp, Self::reg_ax),
            0x97 => self.write_op(bus, Zpy, Self::reg_ax),
            0x8F => self.write_op(bus, Abs, Self::reg_ax),
            0x83 => self.write_op(bus, Izx, Self::reg_ax),

            // SHA ($nn),Y: the high byte comes from the pointer itself
            0x93 => {
                let ptr = self.fetch(bus);
                let base = Self::read_word_zp(bus, ptr);
                let high = (base >> 8) as u8;
                let addr = base.wrapping_add(u16::from(self.regs.y));
                bus.write(addr, self.reg_ax() & high.wrapping_add(1));
            }
            0x9F => self.high_byte_store(bus, self.regs.y, self.reg_ax()),
            0x9B => {
                self.regs.s = self.reg_ax();
                self.high_byte_store(bus, self.regs.y, self.regs.s);
            }
            0x9C => self.high_byte_store(bus, self.regs.x, self.regs.y),
            0x9E => self.high_byte_store(bus, self.regs.y, self.regs.x),

            // =================================================================
            // Undocumented immediates
            // =================================================================
            0x0B | 0x2B => self.read_op(bus, Imm, Self::do_anc),
            0x4B => self.read_op(bus, Imm, Self::do_alr),
            0x6B => self.read_op(bus, Imm, Self::do_arr),
            0x8B => self.read_op(bus, Imm, Self::do_ane),
            0xAB => self.read_op(bus, Imm, Self::do_lxa),
            0xCB => self.read_op(bus, Imm, Self::do_sbx),

            // =================================================================
            // JAM: $02 $12 $22 $32 $42 $52 $62 $72 $92 $B2, plus $D2/$F2
            // when escapes are off
            // =================================================================
            0x02 | 0x12 | 0x22 | 0x32 | 0x42 | 0x52 | 0x62 | 0x72 | 0x92 | 0xB2 | 0xD2 | 0xF2 => {
                return Err(CrashKind::Jam);
            }
        }
        Ok(())
    }
}
