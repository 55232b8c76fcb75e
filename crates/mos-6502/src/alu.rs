//! Arithmetic, logic and shift operations, documented and undocumented.
//!
//! Decimal mode follows the NMOS part: ADC takes Z from the binary sum and
//! N/V from the half-adjusted intermediate; SBC takes every flag from the
//! binary difference.

use crate::Mos6502;
use crate::flags::{C, D, N, V, Z};

impl Mos6502 {
    fn carry(&self) -> u8 {
        u8::from(self.regs.p.is_set(C))
    }

    pub(crate) fn do_lda(&mut self, val: u8) {
        self.regs.a = val;
        self.regs.p.update_nz(val);
    }

    pub(crate) fn do_ldx(&mut self, val: u8) {
        self.regs.x = val;
        self.regs.p.update_nz(val);
    }

    pub(crate) fn do_ldy(&mut self, val: u8) {
        self.regs.y = val;
        self.regs.p.update_nz(val);
    }

    pub(crate) fn do_ora(&mut self, val: u8) {
        self.regs.a |= val;
        self.regs.p.update_nz(self.regs.a);
    }

    pub(crate) fn do_and(&mut self, val: u8) {
        self.regs.a &= val;
        self.regs.p.update_nz(self.regs.a);
    }

    pub(crate) fn do_eor(&mut self, val: u8) {
        self.regs.a ^= val;
        self.regs.p.update_nz(self.regs.a);
    }

    pub(crate) fn do_bit(&mut self, val: u8) {
        self.regs.p.set_if(N, val & 0x80 != 0);
        self.regs.p.set_if(V, val & 0x40 != 0);
        self.regs.p.set_if(Z, self.regs.a & val == 0);
    }

    fn compare(&mut self, reg: u8, val: u8) {
        self.regs.p.set_if(C, reg >= val);
        self.regs.p.update_nz(reg.wrapping_sub(val));
    }

    pub(crate) fn do_cmp(&mut self, val: u8) {
        self.compare(self.regs.a, val);
    }

    pub(crate) fn do_cpx(&mut self, val: u8) {
        self.compare(self.regs.x, val);
    }

    pub(crate) fn do_cpy(&mut self, val: u8) {
        self.compare(self.regs.y, val);
    }

    pub(crate) fn do_adc(&mut self, val: u8) {
        let a = u16::from(self.regs.a);
        let m = u16::from(val);
        let c = u16::from(self.carry());
        if self.regs.p.is_set(D) {
            let mut tmp = (a & 0x0F) + (m & 0x0F) + c;
            if tmp >= 10 {
                tmp = (tmp - 10) | 0x10;
            }
            tmp += (a & 0xF0) + (m & 0xF0);
            self.regs.p.set_if(Z, (a + m + c) & 0xFF == 0);
            self.regs.p.set_if(N, tmp & 0x80 != 0);
            self.regs
                .p
                .set_if(V, (a ^ m) & 0x80 == 0 && (m ^ tmp) & 0x80 != 0);
            if tmp > 0x9F {
                tmp += 0x60;
            }
            self.regs.p.set_if(C, tmp > 0xFF);
            self.regs.a = tmp as u8;
        } else {
            let tmp = a + m + c;
            self.regs.p.set_if(C, tmp > 0xFF);
            self.regs
                .p
                .set_if(V, (a ^ m) & 0x80 == 0 && (m ^ tmp) & 0x80 != 0);
            self.regs.a = tmp as u8;
            self.regs.p.update_nz(self.regs.a);
        }
    }

    pub(crate) fn do_sbc(&mut self, val: u8) {
        let a = u16::from(self.regs.a);
        let m = u16::from(val);
        let c = u16::from(self.carry());
        let tmp = a.wrapping_sub(m).wrapping_sub(1).wrapping_add(c);
        self.regs.p.set_if(C, tmp < 0x100);
        self.regs
            .p
            .set_if(V, (a ^ tmp) & 0x80 != 0 && (a ^ m) & 0x80 != 0);
        self.regs.p.update_nz(tmp as u8);
        if self.regs.p.is_set(D) {
            let a = i32::from(self.regs.a);
            let m = i32::from(val);
            let mut al = (a & 0x0F) - (m & 0x0F) - 1 + i32::from(c);
            let mut ah = (a >> 4) - (m >> 4);
            if al & 0x10 != 0 {
                al -= 6;
                ah -= 1;
            }
            if ah & 0x10 != 0 {
                ah -= 6;
            }
            self.regs.a = ((ah << 4) | (al & 0x0F)) as u8;
        } else {
            self.regs.a = tmp as u8;
        }
    }

    pub(crate) fn do_asl(&mut self, val: u8) -> u8 {
        self.regs.p.set_if(C, val & 0x80 != 0);
        let result = val << 1;
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn do_lsr(&mut self, val: u8) -> u8 {
        self.regs.p.set_if(C, val & 0x01 != 0);
        let result = val >> 1;
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn do_rol(&mut self, val: u8) -> u8 {
        let result = (val << 1) | self.carry();
        self.regs.p.set_if(C, val & 0x80 != 0);
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn do_ror(&mut self, val: u8) -> u8 {
        let result = (val >> 1) | (self.carry() << 7);
        self.regs.p.set_if(C, val & 0x01 != 0);
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn do_inc(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn do_dec(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        self.regs.p.update_nz(result);
        result
    }

    // ------------------------------------------------------------------
    // Undocumented combinations
    // ------------------------------------------------------------------

    /// SLO/ASO: ASL then ORA.
    pub(crate) fn do_slo(&mut self, val: u8) -> u8 {
        let result = self.do_asl(val);
        self.do_ora(result);
        result
    }

    /// RLA: ROL then AND.
    pub(crate) fn do_rla(&mut self, val: u8) -> u8 {
        let result = self.do_rol(val);
        self.do_and(result);
        result
    }

    /// SRE/LSE: LSR then EOR.
    pub(crate) fn do_sre(&mut self, val: u8) -> u8 {
        let result = self.do_lsr(val);
        self.do_eor(result);
        result
    }

    /// RRA: ROR then ADC with the rotated-out carry.
    pub(crate) fn do_rra(&mut self, val: u8) -> u8 {
        let result = self.do_ror(val);
        self.do_adc(result);
        result
    }

    /// DCP/DCM: DEC then CMP.
    pub(crate) fn do_dcp(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        self.do_cmp(result);
        result
    }

    /// ISC/INS: INC then SBC.
    pub(crate) fn do_isc(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        self.do_sbc(result);
        result
    }

    /// LAX: load A and X.
    pub(crate) fn do_lax(&mut self, val: u8) {
        self.regs.a = val;
        self.regs.x = val;
        self.regs.p.update_nz(val);
    }

    /// LAS: S &= m, then A = X = S.
    pub(crate) fn do_las(&mut self, val: u8) {
        let result = self.regs.s & val;
        self.regs.s = result;
        self.do_lax(result);
    }

    /// ANC: AND, then C mirrors N.
    pub(crate) fn do_anc(&mut self, val: u8) {
        self.do_and(val);
        self.regs.p.set_if(C, self.regs.a & 0x80 != 0);
    }

    /// ALR/ASR: AND then LSR A.
    pub(crate) fn do_alr(&mut self, val: u8) {
        let t = self.regs.a & val;
        self.regs.a = self.do_lsr(t);
    }

    /// ARR: AND then ROR A, with its own flag rules and a BCD fixup.
    pub(crate) fn do_arr(&mut self, val: u8) {
        let t = self.regs.a & val;
        let carry_in = self.carry() << 7;
        if self.regs.p.is_set(D) {
            let mut tmp = u16::from((t >> 1) | carry_in);
            self.regs.p.update_nz(tmp as u8);
            self.regs.p.set_if(V, (tmp ^ u16::from(t)) & 0x40 != 0);
            if (t & 0x0F) + (t & 0x01) > 5 {
                tmp = (tmp & 0xF0) | ((tmp + 6) & 0x0F);
            }
            if u16::from(t) + u16::from(t & 0x10) >= 0x60 {
                tmp += 0x60;
                self.regs.p.set(C);
            } else {
                self.regs.p.clear(C);
            }
            self.regs.a = tmp as u8;
        } else {
            let result = (t >> 1) | carry_in;
            self.regs.a = result;
            self.regs.p.update_nz(result);
            let c = result & 0x40 != 0;
            self.regs.p.set_if(C, c);
            self.regs.p.set_if(V, c ^ (result & 0x20 != 0));
        }
    }

    /// ANE/XAA: magic constant $EF; flags come from A & X & imm.
    pub(crate) fn do_ane(&mut self, val: u8) {
        let a = self.regs.a;
        let x = self.regs.x;
        self.regs.p.update_nz(a & x & val);
        self.regs.a = a & x & (val | 0xEF);
    }

    /// LXA/ANX: A = X = A & imm.
    pub(crate) fn do_lxa(&mut self, val: u8) {
        self.do_lax(self.regs.a & val);
    }

    /// SBX/AXS: X = (A & X) - imm, compare-style carry.
    pub(crate) fn do_sbx(&mut self, val: u8) {
        let ax = self.regs.a & self.regs.x;
        self.regs.p.set_if(C, ax >= val);
        self.regs.x = ax.wrapping_sub(val);
        self.regs.p.update_nz(self.regs.x);
    }
}
