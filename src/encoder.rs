// Instruction encoder: operand decoding and machine-word layout.
//
// Every extra word that depends on a symbol address is pushed to the
// image as a placeholder and recorded as a `Patch`, rather than being
// resolved on the spot. The second pass then only has to resolve
// symbols and overwrite those slots; it never re-parses source text, so
// the word count computed here is never re-derived or second-guessed
// later.

use crate::consts::{ARE_ABSOLUTE, IMMEDIATE_MAX, IMMEDIATE_MIN};
use crate::diagnostics::{Diagnostics, Kind};
use crate::image::Image;
use crate::isa::{AddressingMode, Command, ModeSet};
use crate::pos::Pos;
use crate::scan::{split_operands, IdentifierProblem};

#[derive(Clone, Debug)]
pub struct Patch {
    /// Index into the code image of the extra word to overwrite.
    pub slot: usize,
    /// IC of this instruction's first word. Relative addressing is
    /// computed from the instruction's own position, not the extra
    /// word's.
    pub instr_ic: i64,
    pub mode: AddressingMode,
    pub symbol: String,
    pub pos: Pos,
}

struct Operand<'a> {
    mode: AddressingMode,
    register: u32,
    symbol: Option<&'a str>,
    immediate: Option<i64>,
}

/// True if `text` is shaped like a register reference (`r` followed by
/// one or more digits) even if the number itself is out of range. Used
/// to tell a mistyped register ("r8", "r0") apart from an ordinary
/// symbol that merely starts with the letter `r`.
fn looks_like_register(text: &str) -> bool {
    let Some(digits) = text.strip_prefix('r') else { return false };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_operand(text: &str, pos: &Pos, diags: &mut Diagnostics) -> Option<Operand<'_>> {
    if let Some(rest) = text.strip_prefix('#') {
        let value: i64 = rest.trim().parse().ok().or_else(|| {
            diags.error(pos.clone(), Kind::BadNumericLiteral, format!("bad immediate literal: {text}"));
            None
        })?;
        if !(IMMEDIATE_MIN..=IMMEDIATE_MAX).contains(&value) {
            diags.error(pos.clone(), Kind::ImmediateOutOfRange, format!("immediate out of range: {value}"));
            return None;
        }
        return Some(Operand { mode: AddressingMode::Immediate, register: 0, symbol: None, immediate: Some(value) });
    }

    if let Some(rest) = text.strip_prefix('&') {
        return parse_symbol_operand(AddressingMode::Relative, rest, pos, diags);
    }

    if let Some(reg) = crate::isa::parse_register(text) {
        return Some(Operand { mode: AddressingMode::Register, register: reg, symbol: None, immediate: None });
    }

    if looks_like_register(text) {
        diags.error(pos.clone(), Kind::BadRegisterNumber, format!("register number out of range: {text}"));
        return None;
    }

    parse_symbol_operand(AddressingMode::Direct, text, pos, diags)
}

fn parse_symbol_operand<'a>(
    mode: AddressingMode,
    text: &'a str,
    pos: &Pos,
    diags: &mut Diagnostics,
) -> Option<Operand<'a>> {
    if let Err(problem) = crate::scan::check_identifier(text) {
        let kind = match problem {
            IdentifierProblem::BadStart => Kind::BadIdentifierStart,
            IdentifierProblem::BadChars => Kind::BadIdentifierChars,
            IdentifierProblem::TooLong => Kind::IdentifierTooLong,
        };
        diags.error(pos.clone(), kind, format!("illegal symbol reference: {text}"));
        return None;
    }
    Some(Operand { mode, register: 0, symbol: Some(text), immediate: None })
}

fn check_mode(modes: ModeSet, op: &Operand, pos: &Pos, diags: &mut Diagnostics) -> bool {
    if modes.allows(op.mode) {
        true
    } else {
        diags.error(
            pos.clone(),
            Kind::AddressingModeNotAllowed,
            format!("addressing mode not permitted here"),
        );
        false
    }
}

/// Outcome of encoding one instruction line: how many IC slots it
/// occupies. `None` means a diagnostic was raised; the caller still
/// needs *a* word count to keep scanning the rest of the file, so this
/// returns the best structural guess (1 + however many extra words the
/// descriptor implies) even on error. The file is invalid regardless,
/// so no artifact will ever be emitted from these counts.
pub fn encode_instruction(
    cmd: &Command,
    operand_text: &str,
    ic: i64,
    pos: &Pos,
    code: &mut Image,
    patches: &mut Vec<Patch>,
    diags: &mut Diagnostics,
) -> usize {
    let expected = cmd.source_modes.is_some() as usize + cmd.dest_modes.is_some() as usize;

    let operands = match split_operands(operand_text, expected) {
        Ok(ops) => ops,
        Err(kind) => {
            diags.error(pos.clone(), kind, "malformed operand list");
            return 1 + expected;
        }
    };

    let (src_text, dst_text) = match (cmd.source_modes.is_some(), cmd.dest_modes.is_some()) {
        (true, true) => (Some(operands[0]), Some(operands[1])),
        (true, false) => (Some(operands[0]), None),
        (false, true) => (None, Some(operands[0])),
        (false, false) => (None, None),
    };

    let src = src_text.and_then(|t| parse_operand(t, pos, diags));
    let dst = dst_text.and_then(|t| parse_operand(t, pos, diags));

    if src_text.is_some() && src.is_none() {
        return 1 + expected;
    }
    if dst_text.is_some() && dst.is_none() {
        return 1 + expected;
    }

    if let (Some(modes), Some(op)) = (cmd.source_modes, &src) {
        if !check_mode(modes, op, pos, diags) {
            return 1 + expected;
        }
    }
    if let (Some(modes), Some(op)) = (cmd.dest_modes, &dst) {
        if !check_mode(modes, op, pos, diags) {
            return 1 + expected;
        }
    }

    let both_register = matches!(
        (&src, &dst),
        (Some(s), Some(d)) if s.mode == AddressingMode::Register && d.mode == AddressingMode::Register
    );

    let src_reg = src.as_ref().map(|o| o.register).unwrap_or(0);
    let dst_reg = dst.as_ref().map(|o| o.register).unwrap_or(0);
    let src_mode_code = src.as_ref().map(|o| o.mode.code()).unwrap_or(0);
    let dst_mode_code = dst.as_ref().map(|o| o.mode.code()).unwrap_or(0);

    let word1 = (cmd.opcode << 18)
        | (src_mode_code << 16)
        | (src_reg << 13)
        | (dst_mode_code << 11)
        | (dst_reg << 8)
        | (cmd.funct << 3)
        | (ARE_ABSOLUTE as u32);

    let word1_slot = code.len();
    code.push(word1 as i64);
    let mut words = 1;

    if both_register {
        return words;
    }

    if let Some(op) = &src {
        if op.mode != AddressingMode::Register {
            emit_extra_word(op, ic, pos, code, patches);
            words += 1;
        }
    }
    if let Some(op) = &dst {
        if op.mode != AddressingMode::Register {
            emit_extra_word(op, ic, pos, code, patches);
            words += 1;
        }
    }

    words
}

fn emit_extra_word(op: &Operand, instr_ic: i64, pos: &Pos, code: &mut Image, patches: &mut Vec<Patch>) {
    match op.mode {
        AddressingMode::Immediate => {
            let value = op.immediate.unwrap();
            code.push((value << 3) | ARE_ABSOLUTE);
        }
        AddressingMode::Direct | AddressingMode::Relative => {
            let slot = code.len();
            code.push_placeholder();
            patches.push(Patch {
                slot,
                instr_ic,
                mode: op.mode,
                symbol: op.symbol.unwrap().to_string(),
                pos: pos.clone(),
            });
        }
        AddressingMode::Register => unreachable!("register operands do not emit an extra word"),
    }
}
