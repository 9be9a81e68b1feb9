// Instruction set metadata: addressing modes, the command (mnemonic)
// table, and the reserved-word set.
//
// `ModeSet` is a `bitflags` type representing which addressing modes an
// operand position allows, rather than a string of mode-code digits.

use bitflags::bitflags;

/// An addressing mode, tagged with the 2-bit code the word layout uses
/// for source and destination addressing mode fields.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum AddressingMode {
    Immediate = 0,
    Direct = 1,
    Relative = 2,
    Register = 3,
}

impl AddressingMode {
    pub fn code(self) -> u32 {
        self as u32
    }
}

bitflags! {
    #[derive(Clone, Copy, Eq, PartialEq, Debug)]
    pub struct ModeSet: u8 {
        const IMMEDIATE = 1 << 0;
        const DIRECT    = 1 << 1;
        const RELATIVE  = 1 << 2;
        const REGISTER  = 1 << 3;
    }
}

impl ModeSet {
    pub fn allows(self, mode: AddressingMode) -> bool {
        self.contains(ModeSet::from_mode(mode))
    }

    pub fn from_mode(mode: AddressingMode) -> ModeSet {
        match mode {
            AddressingMode::Immediate => ModeSet::IMMEDIATE,
            AddressingMode::Direct => ModeSet::DIRECT,
            AddressingMode::Relative => ModeSet::RELATIVE,
            AddressingMode::Register => ModeSet::REGISTER,
        }
    }
}

/// One row of the static, 16-entry command table.
#[derive(Clone, Copy, Debug)]
pub struct Command {
    pub mnemonic: &'static str,
    pub opcode: u32,
    pub funct: u32,
    /// `None` means the instruction takes no source operand.
    pub source_modes: Option<ModeSet>,
    /// `None` means the instruction takes no destination operand.
    pub dest_modes: Option<ModeSet>,
}

const NONE_IMM: ModeSet = ModeSet::DIRECT.union(ModeSet::RELATIVE).union(ModeSet::REGISTER);
const ANY: ModeSet = ModeSet::IMMEDIATE
    .union(ModeSet::DIRECT)
    .union(ModeSet::RELATIVE)
    .union(ModeSet::REGISTER);
const ADDR_ONLY: ModeSet = ModeSet::DIRECT.union(ModeSet::RELATIVE);
const JUMP_TARGET: ModeSet = ModeSet::DIRECT.union(ModeSet::RELATIVE).union(ModeSet::REGISTER);

/// The 16 mnemonics this machine supports, in table order. The bit
/// layout of each word is fixed; the opcode/funct numbering below is
/// this table's own internally consistent assignment.
pub static COMMANDS: [Command; 16] = [
    Command { mnemonic: "mov", opcode: 0, funct: 0, source_modes: Some(ANY), dest_modes: Some(NONE_IMM) },
    Command { mnemonic: "cmp", opcode: 1, funct: 0, source_modes: Some(ANY), dest_modes: Some(ANY) },
    Command { mnemonic: "add", opcode: 2, funct: 1, source_modes: Some(ANY), dest_modes: Some(NONE_IMM) },
    Command { mnemonic: "sub", opcode: 2, funct: 2, source_modes: Some(ANY), dest_modes: Some(NONE_IMM) },
    Command { mnemonic: "lea", opcode: 4, funct: 0, source_modes: Some(ADDR_ONLY), dest_modes: Some(NONE_IMM) },
    Command { mnemonic: "clr", opcode: 5, funct: 1, source_modes: None, dest_modes: Some(NONE_IMM) },
    Command { mnemonic: "not", opcode: 5, funct: 2, source_modes: None, dest_modes: Some(NONE_IMM) },
    Command { mnemonic: "inc", opcode: 5, funct: 3, source_modes: None, dest_modes: Some(NONE_IMM) },
    Command { mnemonic: "dec", opcode: 5, funct: 4, source_modes: None, dest_modes: Some(NONE_IMM) },
    Command { mnemonic: "jmp", opcode: 9, funct: 1, source_modes: None, dest_modes: Some(JUMP_TARGET) },
    Command { mnemonic: "bne", opcode: 9, funct: 2, source_modes: None, dest_modes: Some(JUMP_TARGET) },
    Command { mnemonic: "jsr", opcode: 9, funct: 3, source_modes: None, dest_modes: Some(JUMP_TARGET) },
    Command { mnemonic: "red", opcode: 12, funct: 0, source_modes: None, dest_modes: Some(NONE_IMM) },
    Command { mnemonic: "prn", opcode: 13, funct: 0, source_modes: None, dest_modes: Some(ANY) },
    Command { mnemonic: "rts", opcode: 14, funct: 0, source_modes: None, dest_modes: None },
    Command { mnemonic: "stop", opcode: 15, funct: 0, source_modes: None, dest_modes: None },
];

pub fn lookup_command(mnemonic: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.mnemonic == mnemonic)
}

pub fn is_mnemonic(word: &str) -> bool {
    lookup_command(word).is_some()
}

/// Registers `r1`..`r7`, mnemonics, and directive keywords. Macro names
/// are checked against this set too.
pub fn is_reserved_word(word: &str) -> bool {
    if is_mnemonic(word) {
        return true;
    }
    if let Some(rest) = word.strip_prefix('r') {
        if rest.len() == 1 {
            if let Ok(n) = rest.parse::<u32>() {
                if (1..=7).contains(&n) {
                    return true;
                }
            }
        }
    }
    matches!(word, "data" | "string" | "entry" | "extern")
}

/// Parses `r1`..`r7` into a 1-7 register number, if `word` is one.
pub fn parse_register(word: &str) -> Option<u32> {
    let rest = word.strip_prefix('r')?;
    if rest.len() != 1 {
        return None;
    }
    let n: u32 = rest.parse().ok()?;
    (1..=7).contains(&n).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mov_has_opcode_and_funct_zero() {
        let c = lookup_command("mov").unwrap();
        assert_eq!(c.opcode, 0);
        assert_eq!(c.funct, 0);
    }

    #[test]
    fn table_has_sixteen_entries() {
        assert_eq!(COMMANDS.len(), 16);
    }

    #[test]
    fn rts_and_stop_take_no_operands() {
        for m in ["rts", "stop"] {
            let c = lookup_command(m).unwrap();
            assert!(c.source_modes.is_none());
            assert!(c.dest_modes.is_none());
        }
    }

    #[test]
    fn dest_never_allows_immediate_except_cmp_and_prn() {
        for c in COMMANDS.iter() {
            if let Some(modes) = c.dest_modes {
                let allows_imm = modes.allows(AddressingMode::Immediate);
                if allows_imm {
                    assert!(matches!(c.mnemonic, "cmp" | "prn"));
                }
            }
        }
    }

    #[test]
    fn reserved_words_include_registers_and_directives() {
        assert!(is_reserved_word("r1"));
        assert!(is_reserved_word("r7"));
        assert!(!is_reserved_word("r8"));
        assert!(is_reserved_word("data"));
        assert!(is_reserved_word("mov"));
        assert!(!is_reserved_word("foo"));
    }

    #[test]
    fn parse_register_bounds() {
        assert_eq!(parse_register("r1"), Some(1));
        assert_eq!(parse_register("r7"), Some(7));
        assert_eq!(parse_register("r0"), None);
        assert_eq!(parse_register("r8"), None);
        assert_eq!(parse_register("rr"), None);
    }
}
