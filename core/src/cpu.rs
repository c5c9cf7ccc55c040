//! Fetch/decode/execute engine, status flags, traps, cognitive-mode
//! page-wrap addressing, and the vector sub-unit (§4.4).

use crate::isa::{self, DecodedInstruction, Opcode};
use crate::memory::{Memory, PAGE_SIZE};
use crate::trit::TritWord;

/// Trit positions within the status word.
pub mod status_bit {
    pub const Z: u32 = 0;
    pub const P: u32 = 1;
    pub const N: u32 = 2;
    pub const C: u32 = 3;
    pub const O: u32 = 4;
    pub const IM: u32 = 5;
    pub const COG: u32 = 6;
}

/// Trap vectors, pinned per the original implementation (§9/SPEC_FULL).
pub mod vector {
    pub const RESET: i64 = 0x0000;
    pub const ILLEGAL: i64 = 0x0001;
    pub const SECURE_FAULT: i64 = 0x0002;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapKind {
    Reset,
    Illegal,
    SecureFault,
}

impl TrapKind {
    pub fn vector_address(self) -> i64 {
        match self {
            TrapKind::Reset => vector::RESET,
            TrapKind::Illegal => vector::ILLEGAL,
            TrapKind::SecureFault => vector::SECURE_FAULT,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Metrics {
    pub total_cycles: u64,
    pub active_cycles: u64,
    pub energy_proxy: u64,
    pub trit_flips: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    pub instructions_executed: u64,
    pub halted: bool,
    pub trap: Option<TrapKind>,
}

fn bounds_guard(index: i64) -> usize {
    if !(0..isa::NUM_REGISTERS as i64).contains(&index) {
        0
    } else {
        index as usize
    }
}

fn page_base(addr: i64) -> i64 {
    addr & !0xFF
}

/// Reduces a wide intermediate (MUL can exceed i64) into a trit word,
/// clamping to the representable range in COG mode and wrapping (same
/// balanced-ternary digit truncation as `TritWord::from_int`) otherwise,
/// per the open question resolved in §9: MUL/DIV/MOD follow ADD's policy.
fn wrap_or_saturate_i128(value: i128, saturate: bool) -> TritWord {
    let value = if saturate {
        value.clamp(TritWord::MIN.to_int() as i128, TritWord::MAX.to_int() as i128)
    } else {
        value
    };
    let mut pos = 0u32;
    let mut neg = 0u32;
    let mut current = value;
    for i in 0..crate::trit::WIDTH {
        if current == 0 {
            break;
        }
        let mut rem = current % 3;
        if rem < 0 {
            rem += 3;
        }
        match rem {
            0 => current /= 3,
            1 => {
                pos |= 1 << i;
                current = (current - 1) / 3;
            }
            _ => {
                neg |= 1 << i;
                current = (current + 1) / 3;
            }
        }
    }
    TritWord { pos, neg }
}

/// CPU state: registers, PC, status, and a mutable reference to the
/// memory it executes against.
pub struct Cpu<'m> {
    pub regs: [TritWord; isa::NUM_REGISTERS],
    pub pc: TritWord,
    pub status: TritWord,
    pub halted: bool,
    pub trap: Option<TrapKind>,
    pub metrics: Metrics,
    pub trace: bool,
    mem: &'m mut Memory,
}

impl<'m> Cpu<'m> {
    pub fn new(mem: &'m mut Memory) -> Self {
        Cpu {
            regs: [TritWord::ZERO; isa::NUM_REGISTERS],
            pc: TritWord::ZERO,
            status: TritWord::ZERO,
            halted: false,
            trap: None,
            metrics: Metrics::default(),
            trace: false,
            mem,
        }
    }

    pub fn memory(&mut self) -> &mut Memory {
        self.mem
    }

    pub fn cog_mode(&self) -> bool {
        self.status.get_trit(status_bit::COG) == 1
    }

    fn flag(&self, bit: u32) -> bool {
        self.status.get_trit(bit) == 1
    }

    fn set_flag(&mut self, bit: u32, value: bool) {
        self.status.set_trit(bit, if value { 1 } else { 0 });
    }

    /// R0 always reads as zero; reads of R15 mirror the PC (§3).
    fn reg_read(&self, idx: usize) -> TritWord {
        match idx {
            0 => TritWord::ZERO,
            isa::REG_PC => self.pc,
            _ => self.regs[idx],
        }
    }

    /// Writes to R0 are discarded; writes to R15 move the PC.
    fn reg_write(&mut self, idx: usize, value: TritWord) {
        match idx {
            0 => {}
            isa::REG_PC => self.pc = value,
            _ => self.regs[idx] = value,
        }
    }

    fn update_flags(&mut self, result: TritWord) {
        let v = result.to_int();
        self.set_flag(status_bit::Z, v == 0);
        self.set_flag(status_bit::P, v > 0);
        self.set_flag(status_bit::N, v < 0);
    }

    fn update_flags_arithmetic(&mut self, result: TritWord) {
        self.update_flags(result);
        // Carry/overflow are reserved and currently always clear (§4.4).
        self.set_flag(status_bit::C, false);
        self.set_flag(status_bit::O, false);
    }

    fn trap(&mut self, kind: TrapKind) {
        log::error!(
            "trap {:?} at pc={} (vector 0x{:04X})",
            kind,
            self.pc.to_int(),
            kind.vector_address()
        );
        self.halted = true;
        self.trap = Some(kind);
    }

    fn decode(word: TritWord) -> DecodedInstruction {
        let op_val = word.get_slice(isa::FIELD_OPCODE.0, isa::FIELD_OPCODE.1);
        let mode = word.get_slice(isa::FIELD_MODE.0, isa::FIELD_MODE.1);
        let rd = word.get_slice(isa::FIELD_RD.0, isa::FIELD_RD.1);
        let rs1 = word.get_slice(isa::FIELD_RS1.0, isa::FIELD_RS1.1);
        let rs2_or_imm = word.get_slice(isa::FIELD_RS2_IMM.0, isa::FIELD_RS2_IMM.1);
        DecodedInstruction {
            opcode: Opcode::from_i64(op_val),
            mode,
            rd: bounds_guard(rd),
            rs1: bounds_guard(rs1),
            rs2_or_imm,
        }
    }

    /// Executes up to `max_cycles` instructions or until `halted`.
    pub fn step(&mut self, max_cycles: u64) -> StepOutcome {
        let mut executed = 0u64;
        let mut trap_this_call = None;
        while !self.halted && executed < max_cycles {
            if let Some(kind) = self.step_one() {
                trap_this_call = Some(kind);
            }
            executed += 1;
        }
        StepOutcome {
            instructions_executed: executed,
            halted: self.halted,
            trap: trap_this_call,
        }
    }

    fn step_one(&mut self) -> Option<TrapKind> {
        // --- Fetch ---
        let pc_addr = self.pc.to_int();
        let raw = self.mem.read(pc_addr);
        self.pc = TritWord::from_int(pc_addr + 1);
        let decoded = Self::decode(raw);

        if self.trace {
            log::info!(
                "[TRACE] cyc={} pc={} op={:?} mode={} rd=R{} rs1=R{}",
                self.metrics.total_cycles,
                pc_addr,
                decoded.opcode,
                decoded.mode,
                decoded.rd,
                decoded.rs1
            );
        }

        self.metrics.total_cycles += 1;
        self.metrics.energy_proxy += 1;

        let Some(opcode) = decoded.opcode else {
            self.metrics.active_cycles += 1;
            self.trap(TrapKind::Illegal);
            return Some(TrapKind::Illegal);
        };
        if opcode != Opcode::Nop {
            self.metrics.active_cycles += 1;
        }

        let rs1_val = self.reg_read(decoded.rs1);
        let imm = TritWord::from_int(decoded.rs2_or_imm);
        let op2 = match decoded.mode {
            isa::MODE_IMMEDIATE => imm,
            _ => self.reg_read(bounds_guard(decoded.rs2_or_imm)),
        };

        let old_rd = self.reg_read(decoded.rd);
        let mut new_rd = old_rd;
        let mut writeback = false;
        let mut trap_raised = None;

        match opcode {
            Opcode::Nop => {}
            Opcode::Hlt => {
                self.halted = true;
            }
            Opcode::Msr => self.status = rs1_val,
            Opcode::Mrs => {
                new_rd = self.status;
                writeback = true;
            }
            Opcode::Add => {
                new_rd = if self.cog_mode() {
                    rs1_val.saturating_add(op2)
                } else {
                    rs1_val.add(op2)
                };
                self.update_flags_arithmetic(new_rd);
                writeback = true;
            }
            Opcode::Sub => {
                new_rd = rs1_val.add(op2.negate());
                self.update_flags_arithmetic(new_rd);
                writeback = true;
            }
            Opcode::Mul => {
                let product = rs1_val.to_int() as i128 * op2.to_int() as i128;
                new_rd = wrap_or_saturate_i128(product, self.cog_mode());
                self.update_flags_arithmetic(new_rd);
                writeback = true;
            }
            Opcode::Div => {
                if op2.to_int() == 0 {
                    trap_raised = Some(TrapKind::Illegal);
                } else {
                    new_rd = TritWord::from_int(rs1_val.to_int() / op2.to_int());
                    self.update_flags_arithmetic(new_rd);
                    writeback = true;
                }
            }
            Opcode::Mod => {
                if op2.to_int() == 0 {
                    trap_raised = Some(TrapKind::Illegal);
                } else {
                    new_rd = TritWord::from_int(rs1_val.to_int() % op2.to_int());
                    self.update_flags(new_rd);
                    writeback = true;
                }
            }
            Opcode::Cmp => {
                let res = rs1_val.add(op2.negate());
                self.update_flags_arithmetic(res);
            }
            Opcode::And => {
                new_rd = rs1_val.min(op2);
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::Or => {
                new_rd = rs1_val.max(op2);
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::Xor => {
                new_rd = rs1_val.xor(op2);
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::Lsl => {
                new_rd = rs1_val.shift_left();
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::Lsr => {
                new_rd = rs1_val.shift_right();
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::Mov => {
                new_rd = rs1_val;
                writeback = true;
            }
            Opcode::Ldi => {
                new_rd = imm;
                writeback = true;
            }
            Opcode::Ldw => {
                self.metrics.energy_proxy += 1;
                match self.resolve_data_address(rs1_val, imm) {
                    Ok(addr) => {
                        new_rd = self.mem.read(addr);
                        writeback = true;
                    }
                    Err(kind) => trap_raised = Some(kind),
                }
            }
            Opcode::Stw => {
                self.metrics.energy_proxy += 1;
                match self.resolve_data_address(rs1_val, imm) {
                    Ok(addr) => self.mem.write(addr, self.reg_read(decoded.rd)),
                    Err(kind) => trap_raised = Some(kind),
                }
            }
            Opcode::Jmp => {
                let base = self.branch_base(decoded.mode, rs1_val);
                self.pc = base.add(imm);
            }
            Opcode::Beq => self.branch_if(self.flag(status_bit::Z), decoded.mode, rs1_val, imm),
            Opcode::Bne => self.branch_if(!self.flag(status_bit::Z), decoded.mode, rs1_val, imm),
            Opcode::Bgt => self.branch_if(self.flag(status_bit::P), decoded.mode, rs1_val, imm),
            Opcode::Blt => self.branch_if(self.flag(status_bit::N), decoded.mode, rs1_val, imm),
            Opcode::Call => {
                self.regs[isa::REG_LR] = self.pc;
                let base = self.branch_base(decoded.mode, rs1_val);
                self.pc = base.add(imm);
            }
            Opcode::Ret => {
                self.pc = self.regs[isa::REG_LR];
            }
            Opcode::Cns => {
                new_rd = rs1_val.consensus(op2);
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::Dec => {
                new_rd = rs1_val.decay(op2);
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::Pop => {
                new_rd = TritWord::from_int(rs1_val.pop_count() as i64);
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::Sat => {
                new_rd = rs1_val.saturating_add(op2);
                self.update_flags_arithmetic(new_rd);
                writeback = true;
            }
            Opcode::VecCns => {
                self.charge_vector_latency();
                let rs2 = bounds_guard(decoded.rs2_or_imm);
                self.vector_consensus(decoded.rd, decoded.rs1, rs2);
            }
            Opcode::VecPop => {
                self.charge_vector_latency();
                new_rd = self.vector_pop_count(decoded.rs1);
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::DecMask => {
                self.charge_vector_latency();
                let rs2 = bounds_guard(decoded.rs2_or_imm);
                self.vector_decay_mask(decoded.rd, decoded.rs1, rs2);
            }
            Opcode::SatMac => {
                self.charge_vector_latency();
                let rs2 = bounds_guard(decoded.rs2_or_imm);
                new_rd = self.vector_sat_mac(decoded.rs1, rs2);
                self.update_flags(new_rd);
                writeback = true;
            }
            // Register-level vector ops (VLDR/VSTR/VADD/VDOT/VMMUL/VSIGN/
            // VCLIP/VSTRI/VMMSGN) operate on page-sized operands addressed
            // through the same base-register convention; their scalar
            // reduction/broadcast forms reuse the page-level primitives.
            Opcode::Vldr => {
                new_rd = self.mem.read(page_base(rs1_val.to_int()));
                writeback = true;
            }
            Opcode::Vstr => {
                self.mem.write(page_base(rs1_val.to_int()), self.reg_read(decoded.rd));
            }
            Opcode::Vadd => {
                new_rd = rs1_val.add(op2);
                self.update_flags_arithmetic(new_rd);
                writeback = true;
            }
            Opcode::Vdot => {
                self.charge_vector_latency();
                let rs2 = bounds_guard(decoded.rs2_or_imm);
                new_rd = self.vector_sat_mac(decoded.rs1, rs2);
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::Vmmul => {
                self.charge_vector_latency();
                let rs2 = bounds_guard(decoded.rs2_or_imm);
                self.vector_multiply(decoded.rd, decoded.rs1, rs2);
            }
            Opcode::Vmmsgn => {
                self.charge_vector_latency();
                self.vector_sign(decoded.rd, decoded.rs1);
            }
            Opcode::Vsign => {
                new_rd = if rs1_val.to_int() < 0 {
                    TritWord::from_int(-1)
                } else if rs1_val.to_int() > 0 {
                    TritWord::from_int(1)
                } else {
                    TritWord::ZERO
                };
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::Vclip => {
                let lo = -imm.to_int().abs();
                let hi = imm.to_int().abs();
                new_rd = TritWord::from_int(rs1_val.to_int().clamp(lo, hi));
                self.update_flags(new_rd);
                writeback = true;
            }
            Opcode::Vstri => {
                self.pc = self.pc.add(op2);
            }
        }

        if let Some(kind) = trap_raised {
            self.trap(kind);
            return Some(kind);
        }

        if writeback {
            self.reg_write(decoded.rd, new_rd);
            let diff_p = (old_rd.pos ^ new_rd.pos).count_ones() as u64;
            let diff_n = (old_rd.neg ^ new_rd.neg).count_ones() as u64;
            self.metrics.trit_flips += diff_p + diff_n;
            self.metrics.energy_proxy += diff_p + diff_n;
        }

        None
    }

    fn branch_base(&self, mode: i64, rs1_val: TritWord) -> TritWord {
        if mode == isa::MODE_PC_RELATIVE {
            self.pc
        } else {
            rs1_val
        }
    }

    fn branch_if(&mut self, condition: bool, mode: i64, rs1_val: TritWord, imm: TritWord) {
        if condition {
            let base = self.branch_base(mode, rs1_val);
            self.pc = base.add(imm);
        }
    }

    /// Computes the effective load/store address, applying cognitive-mode
    /// page-wrap when `status.COG == 1` (§4.4).
    fn resolve_data_address(
        &self,
        rs1_val: TritWord,
        imm: TritWord,
    ) -> Result<i64, TrapKind> {
        let addr = rs1_val.add(imm).to_int();
        if !self.cog_mode() {
            return Ok(addr);
        }
        if !(0x3000..=0x7FFF).contains(&addr) {
            return Err(TrapKind::SecureFault);
        }
        let base = rs1_val.to_int();
        Ok((base & !0xFF) | (addr & 0xFF))
    }

    fn charge_vector_latency(&mut self) {
        self.metrics.active_cycles += 256;
        self.metrics.total_cycles += 255;
        self.metrics.energy_proxy += 256;
    }

    fn vector_consensus(&mut self, pd: usize, ps1: usize, ps2: usize) {
        let pd_base = page_base(self.reg_read(pd).to_int());
        let ps1_base = page_base(self.reg_read(ps1).to_int());
        let ps2_base = page_base(self.reg_read(ps2).to_int());
        let p1_exists = self.mem.is_page_allocated(ps1_base / PAGE_SIZE);
        let p2_exists = self.mem.is_page_allocated(ps2_base / PAGE_SIZE);

        if !p1_exists && !p2_exists {
            if self.mem.is_page_allocated(pd_base / PAGE_SIZE) {
                for i in 0..PAGE_SIZE {
                    self.mem.write(pd_base + i, TritWord::ZERO);
                }
            }
            return;
        }
        for i in 0..PAGE_SIZE {
            let s1 = self.mem.read(ps1_base + i);
            let s2 = self.mem.read(ps2_base + i);
            self.mem.write(pd_base + i, s1.consensus(s2));
        }
    }

    fn vector_decay_mask(&mut self, pd: usize, ps1: usize, ps2: usize) {
        let pd_base = page_base(self.reg_read(pd).to_int());
        let ps1_base = page_base(self.reg_read(ps1).to_int());
        let ps2_base = page_base(self.reg_read(ps2).to_int());

        if !self.mem.is_page_allocated(ps1_base / PAGE_SIZE) {
            if self.mem.is_page_allocated(pd_base / PAGE_SIZE) {
                for i in 0..PAGE_SIZE {
                    self.mem.write(pd_base + i, TritWord::ZERO);
                }
            }
            return;
        }
        for i in 0..PAGE_SIZE {
            let s1 = self.mem.read(ps1_base + i);
            let mask = self.mem.read(ps2_base + i);
            self.mem.write(pd_base + i, s1.decay(mask));
        }
    }

    fn vector_pop_count(&mut self, ps1: usize) -> TritWord {
        let ps1_base = page_base(self.reg_read(ps1).to_int());
        if !self.mem.is_page_allocated(ps1_base / PAGE_SIZE) {
            return TritWord::ZERO;
        }
        let mut total = 0i64;
        for i in 0..PAGE_SIZE {
            total += self.mem.read(ps1_base + i).pop_count() as i64;
        }
        TritWord::from_int(total)
    }

    fn vector_multiply(&mut self, pd: usize, ps1: usize, ps2: usize) {
        let pd_base = page_base(self.reg_read(pd).to_int());
        let ps1_base = page_base(self.reg_read(ps1).to_int());
        let ps2_base = page_base(self.reg_read(ps2).to_int());
        let p1_exists = self.mem.is_page_allocated(ps1_base / PAGE_SIZE);
        let p2_exists = self.mem.is_page_allocated(ps2_base / PAGE_SIZE);

        if !p1_exists || !p2_exists {
            if self.mem.is_page_allocated(pd_base / PAGE_SIZE) {
                for i in 0..PAGE_SIZE {
                    self.mem.write(pd_base + i, TritWord::ZERO);
                }
            }
            return;
        }
        for i in 0..PAGE_SIZE {
            let v1 = self.mem.read(ps1_base + i).to_int() as i128;
            let v2 = self.mem.read(ps2_base + i).to_int() as i128;
            self.mem.write(pd_base + i, wrap_or_saturate_i128(v1 * v2, false));
        }
    }

    fn vector_sign(&mut self, pd: usize, ps1: usize) {
        let pd_base = page_base(self.reg_read(pd).to_int());
        let ps1_base = page_base(self.reg_read(ps1).to_int());
        if !self.mem.is_page_allocated(ps1_base / PAGE_SIZE) {
            if self.mem.is_page_allocated(pd_base / PAGE_SIZE) {
                for i in 0..PAGE_SIZE {
                    self.mem.write(pd_base + i, TritWord::ZERO);
                }
            }
            return;
        }
        for i in 0..PAGE_SIZE {
            let v = self.mem.read(ps1_base + i).to_int();
            let sign = if v < 0 {
                -1
            } else if v > 0 {
                1
            } else {
                0
            };
            self.mem.write(pd_base + i, TritWord::from_int(sign));
        }
    }

    fn vector_sat_mac(&mut self, ps1: usize, ps2: usize) -> TritWord {
        let ps1_base = page_base(self.reg_read(ps1).to_int());
        let ps2_base = page_base(self.reg_read(ps2).to_int());
        let p1_exists = self.mem.is_page_allocated(ps1_base / PAGE_SIZE);
        let p2_exists = self.mem.is_page_allocated(ps2_base / PAGE_SIZE);
        if !p1_exists || !p2_exists {
            return TritWord::ZERO;
        }
        let mut acc = 0i128;
        for i in 0..PAGE_SIZE {
            let v1 = self.mem.read(ps1_base + i).to_int() as i128;
            let v2 = self.mem.read(ps2_base + i).to_int() as i128;
            acc += v1 * v2;
        }
        wrap_or_saturate_i128(acc, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;

    fn run(source: &str, max_cycles: u64) -> (Vec<TritWord>, TritWord) {
        let obj = Assembler::new(source).assemble().expect("assemble");
        let exe = crate::linker::Linker::new()
            .add_object(obj)
            .link()
            .expect("link");
        let mut mem = Memory::new();
        for section in &exe.sections {
            let mut addr = section.base_address;
            for word in &section.data {
                mem.write(addr, *word);
                addr += 1;
            }
        }
        let mut cpu = Cpu::new(&mut mem);
        cpu.step(max_cycles);
        (cpu.regs.to_vec(), cpu.pc)
    }

    #[test]
    fn ldi_and_add_compute_sum() {
        let src = "\
.section .text
ldi.w r1 5
ldi.w r2 10
add.w r3 r1 r2
hlt
";
        let (regs, _) = run(src, 10);
        assert_eq!(regs[3].to_int(), 15);
    }

    #[test]
    fn unrecognized_opcode_traps_illegal() {
        let mut word = TritWord::ZERO;
        // The opcode field only ever holds values 0..=42 (isa::Opcode);
        // 60 is outside that range and decodes to no variant.
        word.set_slice(isa::FIELD_OPCODE.0, isa::FIELD_OPCODE.1, 60);
        let mut mem = Memory::new();
        mem.write(0, word);
        let mut cpu = Cpu::new(&mut mem);
        let outcome = cpu.step(1);
        assert_eq!(outcome.trap, Some(TrapKind::Illegal));
        assert!(cpu.halted);
    }

    #[test]
    fn divide_by_zero_traps_illegal() {
        let src = "\
.section .text
ldi.w r1 1
ldi.w r2 0
div.w r3 r1 r2
hlt
";
        let obj = Assembler::new(src).assemble().unwrap();
        let exe = crate::linker::Linker::new().add_object(obj).link().unwrap();
        let mut mem = Memory::new();
        for section in &exe.sections {
            let mut addr = section.base_address;
            for word in &section.data {
                mem.write(addr, *word);
                addr += 1;
            }
        }
        let mut cpu = Cpu::new(&mut mem);
        let outcome = cpu.step(10);
        assert_eq!(outcome.trap, Some(TrapKind::Illegal));
        assert!(cpu.halted);
    }

    #[test]
    fn cognitive_page_wrap_confines_to_page() {
        let mut mem = Memory::new();
        let mut cpu = Cpu::new(&mut mem);
        cpu.status.set_trit(status_bit::COG, 1);
        cpu.regs[1] = TritWord::from_int(0x3000);
        let addr = cpu
            .resolve_data_address(cpu.regs[1], TritWord::from_int(256))
            .unwrap();
        assert_eq!(addr, 0x3000);
        let addr2 = cpu
            .resolve_data_address(cpu.regs[1], TritWord::from_int(255))
            .unwrap();
        assert_eq!(addr2, 0x30FF);
    }

    #[test]
    fn r0_always_reads_zero() {
        let mut mem = Memory::new();
        let mut cpu = Cpu::new(&mut mem);
        cpu.reg_write(0, TritWord::from_int(42));
        assert_eq!(cpu.reg_read(0).to_int(), 0);
    }
}
