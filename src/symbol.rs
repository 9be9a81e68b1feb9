// Symbol table.
//
// Indexed interning: a name-to-index map backed by a flat `Vec` of
// records, rather than an arena-and-lifetime scheme. This table's
// records mutate in place across both passes (the second pass appends
// to `extern_refs`), which a borrowed-arena design fights against.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::consts::LOAD_BASE;
use crate::diagnostics::{Diagnostics, Kind};
use crate::pos::Pos;
use crate::scan::{check_identifier, IdentifierProblem};

pub const UNDEFINED: i64 = i64::MIN;

bitflags! {
    #[derive(Clone, Copy, Eq, PartialEq, Debug)]
    pub struct SymbolKinds: u8 {
        const CODE     = 1 << 0;
        const DATA     = 1 << 1;
        const ENTRY    = 1 << 2;
        const EXTERNAL = 1 << 3;
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct SymbolId(pub usize);

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub address: i64,
    pub kinds: SymbolKinds,
    pub extern_refs: Vec<i64>,
}

impl Symbol {
    fn new(name: &str) -> Self {
        Symbol {
            name: name.to_string(),
            address: UNDEFINED,
            kinds: SymbolKinds::empty(),
            extern_refs: Vec::new(),
        }
    }

    pub fn has_address(&self) -> bool {
        self.address != UNDEFINED
    }
}

#[derive(Default)]
pub struct SymbolTable {
    map: HashMap<String, SymbolId>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn find(&self, name: &str) -> Option<SymbolId> {
        self.map.get(name).copied()
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    pub fn get_address(&self, id: SymbolId) -> i64 {
        self.symbols[id.0].address
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.map.get(name) {
            return id;
        }
        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol::new(name));
        self.map.insert(name.to_string(), id);
        id
    }

    fn check_kind_conflict(
        &self,
        id: SymbolId,
        adding: SymbolKinds,
        pos: &Pos,
        diags: &mut Diagnostics,
    ) -> bool {
        let existing = self.symbols[id.0].kinds;
        let would_be = existing | adding;
        if would_be.contains(SymbolKinds::ENTRY) && would_be.contains(SymbolKinds::EXTERNAL) {
            diags.error(
                pos.clone(),
                Kind::EntryExternConflict,
                format!("symbol '{}' cannot be both entry and external", self.symbols[id.0].name),
            );
            return false;
        }
        true
    }

    /// Validates the identifier (legality, not reserved, not a macro
    /// name), then inserts or merges a symbol definition that carries an
    /// address: a `code` or `data` label.
    pub fn add_name(
        &mut self,
        name: &str,
        kind: SymbolKinds,
        addr: i64,
        pos: &Pos,
        is_macro_name: impl Fn(&str) -> bool,
        diags: &mut Diagnostics,
    ) -> Option<SymbolId> {
        if !Self::validate_identifier(name, pos, &is_macro_name, diags) {
            return None;
        }

        let id = self.intern(name);

        if !self.check_kind_conflict(id, kind, pos, diags) {
            return Some(id);
        }

        let sym = &mut self.symbols[id.0];
        if sym.has_address() {
            diags.error(
                pos.clone(),
                Kind::DuplicateSymbol,
                format!("symbol already defined: {name}"),
            );
        } else {
            sym.address = addr;
        }
        sym.kinds |= kind;
        Some(id)
    }

    /// Merges `kind` into a symbol's kind set, inserting it undefined if
    /// absent. Used for `.entry`/`.extern`.
    pub fn add_kind(
        &mut self,
        name: &str,
        kind: SymbolKinds,
        pos: &Pos,
        is_macro_name: impl Fn(&str) -> bool,
        diags: &mut Diagnostics,
    ) -> Option<SymbolId> {
        if !Self::validate_identifier(name, pos, &is_macro_name, diags) {
            return None;
        }
        let id = self.intern(name);
        if !self.check_kind_conflict(id, kind, pos, diags) {
            return Some(id);
        }
        self.symbols[id.0].kinds |= kind;
        Some(id)
    }

    pub fn record_external_ref(&mut self, id: SymbolId, addr: i64) {
        self.symbols[id.0].extern_refs.push(addr);
    }

    /// End-of-first-pass relocation: data symbols are shifted past the
    /// whole code image (`ICF + LOAD_BASE`), code symbols by
    /// `LOAD_BASE` alone. Each symbol carries only one of the two kinds
    /// that bear an address, so the two adjustments never both apply.
    pub fn relocate(&mut self, icf: i64, dcf: i64) {
        let _ = dcf; // DCF bounds the data image but isn't part of the offset itself
        for sym in self.symbols.iter_mut() {
            if !sym.has_address() {
                continue;
            }
            if sym.kinds.contains(SymbolKinds::DATA) {
                sym.address += icf + LOAD_BASE;
            } else if sym.kinds.contains(SymbolKinds::CODE) {
                sym.address += LOAD_BASE;
            }
        }
    }

    /// End-of-file check: every `entry` symbol must have been defined
    /// locally (`code` or `data`) by now.
    pub fn check_entries_defined(&self, pos: &Pos, diags: &mut Diagnostics) {
        for sym in &self.symbols {
            if sym.kinds.contains(SymbolKinds::ENTRY) && !sym.has_address() {
                diags.error(
                    pos.clone(),
                    Kind::UndefinedEntry,
                    format!("entry symbol never defined: {}", sym.name),
                );
            }
        }
    }

    fn validate_identifier(
        name: &str,
        pos: &Pos,
        is_macro_name: &impl Fn(&str) -> bool,
        diags: &mut Diagnostics,
    ) -> bool {
        if let Err(problem) = check_identifier(name) {
            let kind = match problem {
                IdentifierProblem::BadStart => Kind::BadIdentifierStart,
                IdentifierProblem::BadChars => Kind::BadIdentifierChars,
                IdentifierProblem::TooLong => Kind::IdentifierTooLong,
            };
            diags.error(pos.clone(), kind, format!("illegal identifier: {name}"));
            return false;
        }
        if crate::isa::is_reserved_word(name) {
            diags.error(pos.clone(), Kind::ReservedWord, format!("identifier is a reserved word: {name}"));
            return false;
        }
        if is_macro_name(name) {
            diags.error(pos.clone(), Kind::CollidesWithMacro, format!("identifier collides with macro name: {name}"));
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_macros(_: &str) -> bool {
        false
    }

    #[test]
    fn fresh_symbol_is_undefined() {
        let mut t = SymbolTable::new();
        let mut d = Diagnostics::new();
        let id = t
            .add_kind("X", SymbolKinds::EXTERNAL, &Pos::bof("f"), no_macros, &mut d)
            .unwrap();
        assert!(!d.has_errors());
        assert_eq!(t.get_address(id), UNDEFINED);
    }

    #[test]
    fn add_name_sets_address_once() {
        let mut t = SymbolTable::new();
        let mut d = Diagnostics::new();
        let id = t
            .add_name("LOOP", SymbolKinds::CODE, 103, &Pos::bof("f"), no_macros, &mut d)
            .unwrap();
        assert!(!d.has_errors());
        assert_eq!(t.get_address(id), 103);
    }

    #[test]
    fn duplicate_address_is_diagnosed() {
        let mut t = SymbolTable::new();
        let mut d = Diagnostics::new();
        t.add_name("X", SymbolKinds::CODE, 100, &Pos::bof("f"), no_macros, &mut d);
        t.add_name("X", SymbolKinds::CODE, 101, &Pos::bof("f"), no_macros, &mut d);
        assert!(d.has_errors());
    }

    #[test]
    fn entry_and_external_conflict() {
        let mut t = SymbolTable::new();
        let mut d = Diagnostics::new();
        t.add_kind("X", SymbolKinds::EXTERNAL, &Pos::bof("f"), no_macros, &mut d);
        t.add_kind("X", SymbolKinds::ENTRY, &Pos::bof("f"), no_macros, &mut d);
        assert!(d.has_errors());
    }

    #[test]
    fn entry_then_local_definition_is_fine() {
        let mut t = SymbolTable::new();
        let mut d = Diagnostics::new();
        let id = t.add_kind("X", SymbolKinds::ENTRY, &Pos::bof("f"), no_macros, &mut d).unwrap();
        t.add_name("X", SymbolKinds::DATA, 100, &Pos::bof("f"), no_macros, &mut d);
        assert!(!d.has_errors());
        assert!(t.get(id).kinds.contains(SymbolKinds::ENTRY | SymbolKinds::DATA));
    }

    #[test]
    fn identifier_with_illegal_character_is_rejected() {
        let mut t = SymbolTable::new();
        let mut d = Diagnostics::new();
        t.add_name("X-Y", SymbolKinds::CODE, 100, &Pos::bof("f"), no_macros, &mut d);
        assert!(d.has_errors());
        assert_eq!(d.iter().next().unwrap().kind, Kind::BadIdentifierChars);
    }

    #[test]
    fn over_long_identifier_is_rejected() {
        let mut t = SymbolTable::new();
        let mut d = Diagnostics::new();
        let name = "a".repeat(32);
        t.add_name(&name, SymbolKinds::CODE, 100, &Pos::bof("f"), no_macros, &mut d);
        assert!(d.has_errors());
        assert_eq!(d.iter().next().unwrap().kind, Kind::IdentifierTooLong);
    }

    #[test]
    fn reserved_word_rejected() {
        let mut t = SymbolTable::new();
        let mut d = Diagnostics::new();
        t.add_name("mov", SymbolKinds::CODE, 100, &Pos::bof("f"), no_macros, &mut d);
        assert!(d.has_errors());
    }

    #[test]
    fn relocate_shifts_code_and_data_symbols_separately() {
        let mut t = SymbolTable::new();
        let mut d = Diagnostics::new();
        let code_id = t.add_name("C", SymbolKinds::CODE, 3, &Pos::bof("f"), no_macros, &mut d).unwrap();
        let data_id = t.add_name("D", SymbolKinds::DATA, 2, &Pos::bof("f"), no_macros, &mut d).unwrap();
        t.relocate(5, 4);
        assert_eq!(t.get_address(code_id), 100 + 3);
        assert_eq!(t.get_address(data_id), 100 + 5 + 2);
    }

    #[test]
    fn undefined_entry_is_diagnosed_at_eof() {
        let mut t = SymbolTable::new();
        let mut d = Diagnostics::new();
        t.add_kind("X", SymbolKinds::ENTRY, &Pos::bof("f"), no_macros, &mut d);
        t.check_entries_defined(&Pos::bof("f"), &mut d);
        assert!(d.has_errors());
    }

    #[test]
    fn record_external_ref_appends_in_order() {
        let mut t = SymbolTable::new();
        let mut d = Diagnostics::new();
        let id = t.add_kind("X", SymbolKinds::EXTERNAL, &Pos::bof("f"), no_macros, &mut d).unwrap();
        t.record_external_ref(id, 105);
        t.record_external_ref(id, 110);
        assert_eq!(t.get(id).extern_refs, vec![105, 110]);
    }
}
