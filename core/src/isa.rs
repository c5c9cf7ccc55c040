//! Opcode table and instruction-word field layout (§4.3).
//!
//! Instruction word format, LSB to MSB: `[Rs2/Imm: 10][Rs1: 4][Rd: 4]
//! [Mode: 3][Opcode: 6]`.

/// Bit offset of the opcode field.
pub const FIELD_OPCODE: (u32, u32) = (21, 6);
/// Bit offset of the addressing-mode field.
pub const FIELD_MODE: (u32, u32) = (18, 3);
/// Bit offset of the destination-register field.
pub const FIELD_RD: (u32, u32) = (14, 4);
/// Bit offset of the first source-register field.
pub const FIELD_RS1: (u32, u32) = (10, 4);
/// Bit offset of the second source-register / immediate field.
pub const FIELD_RS2_IMM: (u32, u32) = (0, 10);

pub const NUM_REGISTERS: usize = 16;
pub const REG_FP: usize = 12;
pub const REG_SP: usize = 13;
pub const REG_LR: usize = 14;
pub const REG_PC: usize = 15;

/// Register-register operand resolution: `Op2 = R[Rs2]`.
pub const MODE_REGISTER: i64 = 0;
/// Immediate operand resolution: `Op2` is the sign-extended low-10 field.
pub const MODE_IMMEDIATE: i64 = 1;
/// Memory addressing, zero displacement (preserved for object-file
/// byte-compatibility per §9 — the CPU treats it identically to mode 3).
pub const MODE_MEMORY_DISP0: i64 = 2;
/// Memory addressing with a nonzero displacement.
pub const MODE_MEMORY_DISP: i64 = 3;
/// PC-relative branch base: `base = PC (post-increment)`.
pub const MODE_PC_RELATIVE: i64 = 4;

/// The closed set of Helix9 opcodes, codified from the CPU's decode
/// switch per §9 (the two `isa.h` headers in the original disagree; the
/// decode switch is authoritative).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum Opcode {
    // System
    Nop = 0,
    Hlt = 1,
    Msr = 2,
    Mrs = 3,
    // Arithmetic
    Add = 4,
    Sub = 5,
    Mul = 6,
    Div = 7,
    Mod = 8,
    Cmp = 9,
    // Logic
    And = 10,
    Or = 11,
    Xor = 12,
    Lsl = 13,
    Lsr = 14,
    // Data
    Mov = 15,
    Ldi = 16,
    Ldw = 17,
    Stw = 18,
    // Control
    Jmp = 19,
    Beq = 20,
    Bne = 21,
    Bgt = 22,
    Blt = 23,
    Call = 24,
    Ret = 25,
    // Cognitive
    Cns = 26,
    Dec = 27,
    Pop = 28,
    Sat = 29,
    // Vector, page-level
    VecCns = 30,
    VecPop = 31,
    DecMask = 32,
    SatMac = 33,
    // Vector, register-level
    Vldr = 34,
    Vstr = 35,
    Vadd = 36,
    Vdot = 37,
    Vmmul = 38,
    Vsign = 39,
    Vclip = 40,
    Vstri = 41,
    Vmmsgn = 42,
}

impl Opcode {
    pub fn from_i64(val: i64) -> Option<Self> {
        use Opcode::*;
        Some(match val {
            0 => Nop,
            1 => Hlt,
            2 => Msr,
            3 => Mrs,
            4 => Add,
            5 => Sub,
            6 => Mul,
            7 => Div,
            8 => Mod,
            9 => Cmp,
            10 => And,
            11 => Or,
            12 => Xor,
            13 => Lsl,
            14 => Lsr,
            15 => Mov,
            16 => Ldi,
            17 => Ldw,
            18 => Stw,
            19 => Jmp,
            20 => Beq,
            21 => Bne,
            22 => Bgt,
            23 => Blt,
            24 => Call,
            25 => Ret,
            26 => Cns,
            27 => Dec,
            28 => Pop,
            29 => Sat,
            30 => VecCns,
            31 => VecPop,
            32 => DecMask,
            33 => SatMac,
            34 => Vldr,
            35 => Vstr,
            36 => Vadd,
            37 => Vdot,
            38 => Vmmul,
            39 => Vsign,
            40 => Vclip,
            41 => Vstri,
            42 => Vmmsgn,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Nop => "nop",
            Hlt => "hlt",
            Msr => "msr",
            Mrs => "mrs",
            Add => "add.w",
            Sub => "sub.w",
            Mul => "mul.w",
            Div => "div.w",
            Mod => "mod.w",
            Cmp => "cmp.w",
            And => "and.w",
            Or => "or.w",
            Xor => "xor.w",
            Lsl => "lsl.w",
            Lsr => "lsr.w",
            Mov => "mov.w",
            Ldi => "ldi.w",
            Ldw => "ld.w",
            Stw => "st.w",
            Jmp => "jmp",
            Beq => "beq",
            Bne => "bne",
            Bgt => "bgt",
            Blt => "blt",
            Call => "call",
            Ret => "ret",
            Cns => "cns.w",
            Dec => "dec.w",
            Pop => "pop.t",
            Sat => "sat.add",
            VecCns => "vec.cns",
            VecPop => "vec.pop",
            DecMask => "dec.mask",
            SatMac => "sat.mac",
            Vldr => "vldr",
            Vstr => "vstr",
            Vadd => "vadd",
            Vdot => "vdot",
            Vmmul => "vmmul",
            Vsign => "vsign",
            Vclip => "vclip",
            Vstri => "vstri",
            Vmmsgn => "vmmsgn",
        }
    }

    pub fn from_mnemonic(text: &str) -> Option<Self> {
        use Opcode::*;
        Some(match text {
            "nop" => Nop,
            "hlt" | "halt" => Hlt,
            "msr" => Msr,
            "mrs" => Mrs,
            "add.w" => Add,
            "sub.w" => Sub,
            "mul.w" => Mul,
            "div.w" => Div,
            "mod.w" => Mod,
            "cmp.w" => Cmp,
            "and.w" => And,
            "or.w" => Or,
            "xor.w" => Xor,
            "lsl.w" => Lsl,
            "lsr.w" => Lsr,
            "mov.w" => Mov,
            "ldi.w" => Ldi,
            "ld.w" => Ldw,
            "st.w" => Stw,
            "jmp" => Jmp,
            "beq" => Beq,
            "bne" => Bne,
            "bgt" => Bgt,
            "blt" => Blt,
            "call" => Call,
            "ret" => Ret,
            "cns.w" => Cns,
            "dec.w" => Dec,
            "pop.t" => Pop,
            "sat.add" => Sat,
            "vec.cns" => VecCns,
            "vec.pop" => VecPop,
            "dec.mask" => DecMask,
            "sat.mac" => SatMac,
            "vldr" => Vldr,
            "vstr" => Vstr,
            "vadd" => Vadd,
            "vdot" => Vdot,
            "vmmul" => Vmmul,
            "vsign" => Vsign,
            "vclip" => Vclip,
            "vstri" => Vstri,
            "vmmsgn" => Vmmsgn,
            _ => return None,
        })
    }
}

/// A decoded instruction, the output of [`crate::cpu::decode`].
#[derive(Debug, Clone, Copy)]
pub struct DecodedInstruction {
    /// `None` when the opcode field doesn't match any entry in `Opcode`.
    pub opcode: Option<Opcode>,
    pub mode: i64,
    pub rd: usize,
    pub rs1: usize,
    pub rs2_or_imm: i64,
}
