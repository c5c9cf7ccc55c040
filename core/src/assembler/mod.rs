//! Two-pass symbol-resolving assembler (§4.5): tokenize once, walk the
//! token stream twice — once to lay out sections and labels, once to
//! encode instructions and emit relocations.

mod lexer;

use std::collections::{HashMap, HashSet};

use lexer::{vector_register_index, Token, TokenKind};

use crate::error::{AssembleError, Span};
use crate::isa::Opcode;
use crate::object::{ObjectFile, RelocationType, Symbol, SymbolScope};
use crate::trit::TritWord;

#[derive(Debug, Clone)]
enum Operand {
    Register(usize),
    Immediate { value: i64, symbol: Option<String> },
    Memory {
        base: usize,
        disp: i64,
        symbol: Option<String>,
    },
}

struct SectionLayout {
    name: String,
    size: i64,
}

pub struct Assembler<'a> {
    source: &'a str,
}

impl<'a> Assembler<'a> {
    pub fn new(source: &'a str) -> Self {
        Assembler { source }
    }

    pub fn assemble(&self) -> Result<ObjectFile, AssembleError> {
        let tokens = lexer::tokenize(self.source);
        let (layouts, labels, globals) = Self::pass1(&tokens)?;
        Self::pass2(&tokens, &layouts, &labels, &globals)
    }

    fn pass1(
        tokens: &[Token],
    ) -> Result<(Vec<SectionLayout>, HashMap<String, (String, i64)>, HashSet<String>), AssembleError>
    {
        let mut layouts = vec![SectionLayout {
            name: ".text".to_string(),
            size: 0,
        }];
        let mut current = 0usize;
        let mut offset = 0i64;
        let mut labels: HashMap<String, (String, i64)> = HashMap::new();
        let mut globals = HashSet::new();
        let mut idx = 0usize;

        while idx < tokens.len() {
            match &tokens[idx].kind {
                TokenKind::Eof => break,
                TokenKind::Newline => idx += 1,
                TokenKind::DirSection => {
                    idx += 1;
                    let name = Self::expect_section_name(tokens, &mut idx)?;
                    match layouts.iter().position(|s| s.name == name) {
                        Some(found) => {
                            current = found;
                            offset = layouts[found].size;
                        }
                        None => {
                            layouts.push(SectionLayout { name, size: 0 });
                            current = layouts.len() - 1;
                            offset = 0;
                        }
                    }
                }
                TokenKind::DirOrg => {
                    idx += 1;
                    let span = tokens[idx.min(tokens.len() - 1)].span;
                    let value = Self::expect_number(tokens, &mut idx)?;
                    if value < offset {
                        return Err(AssembleError::NonMonotonicOrg { span });
                    }
                    offset = value;
                }
                TokenKind::DirGlobal => {
                    idx += 1;
                    let name = Self::expect_any_identifier(tokens, &mut idx)?;
                    globals.insert(name);
                }
                TokenKind::DirWord | TokenKind::DirDat => {
                    idx += 1;
                    while matches!(
                        tokens.get(idx).map(|t| &t.kind),
                        Some(TokenKind::Number(_)) | Some(TokenKind::Identifier(_))
                    ) {
                        offset += 1;
                        idx += 1;
                    }
                }
                TokenKind::Identifier(name)
                    if matches!(tokens.get(idx + 1).map(|t| &t.kind), Some(TokenKind::Colon)) =>
                {
                    let span = tokens[idx].span;
                    if labels.contains_key(name) {
                        return Err(AssembleError::DuplicateLabel {
                            name: name.clone(),
                            span,
                        });
                    }
                    labels.insert(name.clone(), (layouts[current].name.clone(), offset));
                    idx += 2;
                }
                TokenKind::Identifier(_) => {
                    offset += 1;
                    idx += 1;
                    Self::skip_operands(tokens, &mut idx);
                }
                _ => idx += 1,
            }
            if offset > layouts[current].size {
                layouts[current].size = offset;
            }
        }

        Ok((layouts, labels, globals))
    }

    fn pass2(
        tokens: &[Token],
        layouts: &[SectionLayout],
        labels: &HashMap<String, (String, i64)>,
        globals: &HashSet<String>,
    ) -> Result<ObjectFile, AssembleError> {
        let symbol_values: HashMap<&str, i64> =
            labels.iter().map(|(k, (_, off))| (k.as_str(), *off)).collect();

        let mut obj = ObjectFile::default();
        for layout in layouts {
            obj.section_mut(&layout.name);
        }
        for (name, (section, offset)) in labels {
            obj.symbols.push(Symbol {
                name: name.clone(),
                section: section.clone(),
                offset: *offset,
                scope: if globals.contains(name) {
                    SymbolScope::Global
                } else {
                    SymbolScope::Local
                },
            });
        }

        let mut current = 0usize;
        let mut idx = 0usize;

        while idx < tokens.len() {
            match &tokens[idx].kind {
                TokenKind::Eof => break,
                TokenKind::Newline => idx += 1,
                TokenKind::DirSection => {
                    idx += 1;
                    let name = Self::expect_section_name(tokens, &mut idx)?;
                    current = obj.sections.iter().position(|s| s.name == name).unwrap();
                }
                TokenKind::DirOrg => {
                    idx += 1;
                    let value = Self::expect_number(tokens, &mut idx)?;
                    while (obj.sections[current].data.len() as i64) < value {
                        obj.sections[current].data.push(TritWord::ZERO);
                    }
                }
                TokenKind::DirGlobal => {
                    idx += 1;
                    Self::expect_any_identifier(tokens, &mut idx)?;
                }
                TokenKind::DirWord | TokenKind::DirDat => {
                    idx += 1;
                    loop {
                        match tokens.get(idx).map(|t| &t.kind) {
                            Some(TokenKind::Number(n)) => {
                                obj.sections[current].data.push(TritWord::from_int(*n));
                                idx += 1;
                            }
                            Some(TokenKind::Identifier(name)) => {
                                let v = symbol_values.get(name.as_str()).copied().unwrap_or(0);
                                obj.sections[current].data.push(TritWord::from_int(v));
                                idx += 1;
                            }
                            _ => break,
                        }
                    }
                }
                TokenKind::Identifier(name)
                    if matches!(tokens.get(idx + 1).map(|t| &t.kind), Some(TokenKind::Colon)) =>
                {
                    let _ = name;
                    idx += 2;
                }
                TokenKind::Identifier(mnemonic) => {
                    let span = tokens[idx].span;
                    let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
                        AssembleError::UnknownMnemonic {
                            text: mnemonic.clone(),
                            span,
                        }
                    })?;
                    idx += 1;
                    let ops = Self::parse_operands(tokens, &mut idx, Some(&symbol_values));
                    let current_address = obj.sections[current].data.len() as i64;
                    let (word, pending) =
                        encode_instruction(opcode, &ops, current_address, &symbol_values, span)?;
                    if let Some((symbol, kind)) = pending {
                        obj.relocations.push(crate::object::Relocation {
                            section: obj.sections[current].name.clone(),
                            offset: current_address,
                            symbol,
                            kind,
                        });
                    }
                    obj.sections[current].data.push(word);
                }
                _ => idx += 1,
            }
        }

        Ok(obj)
    }

    fn expect_section_name(tokens: &[Token], idx: &mut usize) -> Result<String, AssembleError> {
        match tokens.get(*idx).map(|t| &t.kind) {
            Some(TokenKind::Identifier(name)) => {
                let name = name.clone();
                *idx += 1;
                Ok(name)
            }
            _ => Err(AssembleError::MalformedOperand {
                detail: "expected section name after .section".into(),
                span: tokens[(*idx).min(tokens.len() - 1)].span,
            }),
        }
    }

    fn expect_any_identifier(tokens: &[Token], idx: &mut usize) -> Result<String, AssembleError> {
        match tokens.get(*idx).map(|t| &t.kind) {
            Some(TokenKind::Identifier(name)) => {
                let name = name.clone();
                *idx += 1;
                Ok(name)
            }
            _ => Err(AssembleError::MalformedOperand {
                detail: "expected identifier".into(),
                span: tokens[(*idx).min(tokens.len() - 1)].span,
            }),
        }
    }

    fn expect_number(tokens: &[Token], idx: &mut usize) -> Result<i64, AssembleError> {
        match tokens.get(*idx).map(|t| &t.kind) {
            Some(TokenKind::Number(n)) => {
                let n = *n;
                *idx += 1;
                Ok(n)
            }
            _ => Err(AssembleError::MalformedOperand {
                detail: "expected numeric literal".into(),
                span: tokens[(*idx).min(tokens.len() - 1)].span,
            }),
        }
    }

    fn skip_operands(tokens: &[Token], idx: &mut usize) {
        Self::parse_operands(tokens, idx, None);
    }

    /// Parses an operand list. `symbols` is `None` during the layout pass
    /// (a dry run: identifiers aren't resolved, only consumed) and
    /// `Some` during encoding, mirroring the original's `dryRun` flag.
    fn parse_operands(
        tokens: &[Token],
        idx: &mut usize,
        symbols: Option<&HashMap<&str, i64>>,
    ) -> Vec<Operand> {
        let mut ops = Vec::new();
        loop {
            match tokens.get(*idx).map(|t| &t.kind) {
                None | Some(TokenKind::Newline) | Some(TokenKind::Eof) => break,
                Some(TokenKind::Register(r)) => {
                    ops.push(Operand::Register(*r));
                    *idx += 1;
                }
                Some(TokenKind::Number(n)) => {
                    ops.push(Operand::Immediate {
                        value: *n,
                        symbol: None,
                    });
                    *idx += 1;
                }
                Some(TokenKind::LBracket) => {
                    *idx += 1;
                    let base = match tokens.get(*idx).map(|t| &t.kind) {
                        Some(TokenKind::Register(r)) => {
                            let r = *r;
                            *idx += 1;
                            r
                        }
                        _ => 0,
                    };
                    let mut disp = 0i64;
                    let mut symbol = None;
                    match tokens.get(*idx).map(|t| &t.kind) {
                        Some(TokenKind::Number(n)) => {
                            disp = *n;
                            *idx += 1;
                        }
                        Some(TokenKind::Identifier(name)) => {
                            if let Some(syms) = symbols {
                                disp = syms.get(name.as_str()).copied().unwrap_or(0);
                            }
                            symbol = Some(name.clone());
                            *idx += 1;
                        }
                        _ => {}
                    }
                    if matches!(tokens.get(*idx).map(|t| &t.kind), Some(TokenKind::RBracket)) {
                        *idx += 1;
                    }
                    ops.push(Operand::Memory { base, disp, symbol });
                }
                Some(TokenKind::Identifier(name)) => {
                    if let Some(reg) = vector_register_index(name) {
                        ops.push(Operand::Register(reg));
                        *idx += 1;
                        continue;
                    }
                    let value = symbols
                        .and_then(|syms| syms.get(name.as_str()).copied())
                        .unwrap_or(0);
                    ops.push(Operand::Immediate {
                        value,
                        symbol: Some(name.clone()),
                    });
                    *idx += 1;
                }
                _ => break,
            }
        }
        ops
    }
}

fn expect_register(op: &Operand, span: Span) -> Result<i64, AssembleError> {
    match op {
        Operand::Register(r) => Ok(*r as i64),
        _ => Err(AssembleError::MalformedOperand {
            detail: "expected a register operand".into(),
            span,
        }),
    }
}

fn expect_immediate(op: &Operand, span: Span) -> Result<i64, AssembleError> {
    match op {
        Operand::Immediate { value, .. } => Ok(*value),
        _ => Err(AssembleError::MalformedOperand {
            detail: "expected an immediate operand".into(),
            span,
        }),
    }
}

fn need(ops: &[Operand], n: usize, mnemonic: Opcode, span: Span) -> Result<(), AssembleError> {
    if ops.len() < n {
        return Err(AssembleError::MalformedOperand {
            detail: format!("{} requires {n} operand(s)", mnemonic.mnemonic()),
            span,
        });
    }
    Ok(())
}

/// Register-or-immediate `Op2` resolution shared by the arithmetic/logic/
/// cognitive families: mode 0 for a register, mode 1 for an immediate
/// (which may carry a pending ABS relocation to a forward-declared or
/// external symbol).
fn resolve_op2(op: &Operand, span: Span) -> Result<(i64, i64, Option<(String, RelocationType)>), AssembleError> {
    match op {
        Operand::Register(r) => Ok((0, *r as i64, None)),
        Operand::Immediate { value, symbol } => Ok((
            1,
            *value,
            symbol.clone().map(|s| (s, RelocationType::Abs)),
        )),
        Operand::Memory { .. } => Err(AssembleError::MalformedOperand {
            detail: "memory operand not valid here".into(),
            span,
        }),
    }
}

/// Encodes one instruction per its opcode family's operand layout
/// (§4.5), returning the instruction word and an optional pending
/// relocation against the low-10-trit field.
fn encode_instruction(
    opcode: Opcode,
    ops: &[Operand],
    current_address: i64,
    symbol_values: &HashMap<&str, i64>,
    span: Span,
) -> Result<(TritWord, Option<(String, RelocationType)>), AssembleError> {
    use Opcode::*;

    let mut mode = 0i64;
    let mut rd = 0i64;
    let mut rs1 = 0i64;
    let mut rs2_imm = 0i64;
    let mut pending = None;

    match opcode {
        Nop | Hlt | Ret => {}
        Msr => {
            need(ops, 1, opcode, span)?;
            rs1 = expect_register(&ops[0], span)?;
        }
        Mrs => {
            need(ops, 1, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
        }
        Add | Sub | Mul | Div | Mod | And | Or | Xor | Lsl | Lsr => {
            need(ops, 2, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
            if ops.len() >= 3 {
                let (m, v, p) = resolve_op2(&ops[2], span)?;
                mode = m;
                rs2_imm = v;
                pending = p;
            }
        }
        Cmp => {
            need(ops, 2, opcode, span)?;
            rs1 = expect_register(&ops[0], span)?;
            let (m, v, p) = resolve_op2(&ops[1], span)?;
            mode = m;
            rs2_imm = v;
            pending = p;
        }
        Mov => {
            need(ops, 2, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
        }
        Ldi => {
            need(ops, 2, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            let value = expect_immediate(&ops[1], span)?;
            rs2_imm = value;
            mode = 1;
            if let Operand::Immediate {
                symbol: Some(name), ..
            } = &ops[1]
            {
                pending = Some((name.clone(), RelocationType::Abs));
            }
        }
        Ldw | Stw => {
            need(ops, 2, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            match &ops[1] {
                Operand::Memory { base, disp, symbol } => {
                    rs1 = *base as i64;
                    rs2_imm = *disp;
                    mode = if rs2_imm == 0 { 2 } else { 3 };
                    if let Some(name) = symbol {
                        pending = Some((name.clone(), RelocationType::Abs));
                    }
                }
                _ => {
                    return Err(AssembleError::MalformedOperand {
                        detail: format!("{} expects a memory operand", opcode.mnemonic()),
                        span,
                    })
                }
            }
        }
        Jmp | Call => {
            need(ops, 1, opcode, span)?;
            match &ops[0] {
                Operand::Register(r) => {
                    rs1 = *r as i64;
                    mode = 0;
                }
                Operand::Immediate { value, symbol } => {
                    mode = 4;
                    match symbol {
                        Some(name) if !symbol_values.contains_key(name.as_str()) => {
                            pending = Some((name.clone(), RelocationType::Pcr));
                        }
                        _ => {
                            rs2_imm = value - (current_address + 1);
                        }
                    }
                }
                Operand::Memory { .. } => {
                    return Err(AssembleError::MalformedOperand {
                        detail: "jmp/call target must be a register or label".into(),
                        span,
                    })
                }
            }
        }
        Beq | Bne | Bgt | Blt => {
            need(ops, 1, opcode, span)?;
            mode = 4;
            match &ops[0] {
                Operand::Immediate { value, symbol } => match symbol {
                    Some(name) if !symbol_values.contains_key(name.as_str()) => {
                        pending = Some((name.clone(), RelocationType::Pcr));
                    }
                    _ => {
                        rs2_imm = value - (current_address + 1);
                    }
                },
                _ => {
                    return Err(AssembleError::MalformedOperand {
                        detail: "branch target must be a label".into(),
                        span,
                    })
                }
            }
        }
        Cns | Sat => {
            need(ops, 3, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
            let (m, v, p) = resolve_op2(&ops[2], span)?;
            mode = m;
            rs2_imm = v;
            pending = p;
        }
        Dec => {
            need(ops, 2, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
            if ops.len() >= 3 {
                let (m, v, p) = resolve_op2(&ops[2], span)?;
                mode = m;
                rs2_imm = v;
                pending = p;
            } else {
                mode = 1;
            }
        }
        Pop => {
            need(ops, 2, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
        }
        VecCns | DecMask => {
            need(ops, 3, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
            rs2_imm = expect_register(&ops[2], span)?;
        }
        VecPop => {
            need(ops, 2, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
        }
        SatMac => {
            need(ops, 3, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
            rs2_imm = expect_register(&ops[2], span)?;
        }
        Vldr | Vstr => {
            need(ops, 2, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            let (m, v, p) = resolve_op2(&ops[1], span)?;
            mode = m;
            rs2_imm = v;
            pending = p;
        }
        Vadd | Vdot => {
            need(ops, 3, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
            let (m, v, p) = resolve_op2(&ops[2], span)?;
            mode = m;
            rs2_imm = v;
            pending = p;
        }
        Vmmul => {
            need(ops, 3, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
            rs2_imm = expect_register(&ops[2], span)?;
        }
        Vmmsgn | Vsign => {
            need(ops, 2, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
        }
        Vclip => {
            need(ops, 3, opcode, span)?;
            rd = expect_register(&ops[0], span)?;
            rs1 = expect_register(&ops[1], span)?;
            rs2_imm = expect_immediate(&ops[2], span)?;
            mode = 1;
        }
        Vstri => {
            need(ops, 1, opcode, span)?;
            match &ops[0] {
                Operand::Immediate { value, .. } => {
                    mode = 1;
                    rs2_imm = *value;
                }
                Operand::Register(r) => {
                    mode = 0;
                    rs2_imm = *r as i64;
                }
                Operand::Memory { .. } => {
                    return Err(AssembleError::MalformedOperand {
                        detail: "vstri does not take a memory operand".into(),
                        span,
                    })
                }
            }
        }
    }

    use crate::isa::{FIELD_MODE, FIELD_OPCODE, FIELD_RD, FIELD_RS1, FIELD_RS2_IMM};

    let mut word = TritWord::ZERO;
    word.set_slice(FIELD_OPCODE.0, FIELD_OPCODE.1, opcode as i64);
    word.set_slice(FIELD_MODE.0, FIELD_MODE.1, mode);
    word.set_slice(FIELD_RD.0, FIELD_RD.1, rd);
    word.set_slice(FIELD_RS1.0, FIELD_RS1.1, rs1);
    word.set_slice(FIELD_RS2_IMM.0, FIELD_RS2_IMM.1, rs2_imm);

    Ok((word, pending))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_simple_program_into_text_section() {
        let src = "\
.section .text
ldi.w r1 5
ldi.w r2 10
add.w r3 r1 r2
hlt
";
        let obj = Assembler::new(src).assemble().expect("assemble");
        let text = obj.sections.iter().find(|s| s.name == ".text").unwrap();
        assert_eq!(text.data.len(), 4);
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let src = "\
start: nop
start: nop
";
        let err = Assembler::new(src).assemble().unwrap_err();
        assert!(matches!(err, AssembleError::DuplicateLabel { .. }));
    }

    #[test]
    fn unknown_mnemonic_is_rejected() {
        let err = Assembler::new("frobnicate r1\n").assemble().unwrap_err();
        assert!(matches!(err, AssembleError::UnknownMnemonic { .. }));
    }

    #[test]
    fn backward_jump_emits_negative_pcr_immediate() {
        let src = "\
.section .text
start: ldi.w r1 5
jmp start
hlt
";
        let obj = Assembler::new(src).assemble().expect("assemble");
        let text = obj.sections.iter().find(|s| s.name == ".text").unwrap();
        // jmp at word index 1, target 0: imm = 0 - (1+1) = -2.
        assert_eq!(text.data[1].get_slice(0, 10), -2);
    }

    #[test]
    fn undefined_branch_target_emits_pcr_relocation() {
        let src = "\
.section .text
jmp start
hlt
";
        let obj = Assembler::new(src).assemble().expect("assemble");
        assert_eq!(obj.relocations.len(), 1);
        assert_eq!(obj.relocations[0].symbol, "start");
    }

    #[test]
    fn global_directive_marks_symbol_scope() {
        let src = "\
.section .text
.global start
start: nop
";
        let obj = Assembler::new(src).assemble().expect("assemble");
        let sym = obj.symbols.iter().find(|s| s.name == "start").unwrap();
        assert_eq!(sym.scope, crate::object::SymbolScope::Global);
    }
}
