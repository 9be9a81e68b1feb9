// Second-pass back-patcher.
//
// The first pass already recorded every symbol-dependent extra word as a
// `Patch` pointing at its image slot, so this stage never re-parses
// source text: it resolves each patch's symbol against the now-complete,
// now-relocated table and overwrites the placeholder. `Patch::slot` is
// the word's own index into `code`, which is also its absolute address
// (`LOAD_BASE + slot`), so external-reference sites fall out of the slot
// index with no separate counter to keep in sync.

use crate::consts::{ARE_ABSOLUTE, ARE_EXTERNAL, ARE_RELOCATABLE, LOAD_BASE};
use crate::diagnostics::{Diagnostics, Kind};
use crate::encoder::Patch;
use crate::image::Image;
use crate::isa::AddressingMode;
use crate::symbol::{SymbolKinds, SymbolTable};

pub fn resolve(patches: &[Patch], symbols: &mut SymbolTable, code: &mut Image, diags: &mut Diagnostics) {
    for patch in patches {
        let Some(id) = symbols.find(&patch.symbol) else {
            diags.error(patch.pos.clone(), Kind::UndefinedSymbol, format!("undefined label: {}", patch.symbol));
            continue;
        };

        let sym = symbols.get(id);
        let kinds = sym.kinds;
        let addr = sym.address;

        if kinds.contains(SymbolKinds::EXTERNAL) {
            if patch.mode == AddressingMode::Relative {
                diags.error(
                    patch.pos.clone(),
                    Kind::RelativeToExternal,
                    format!("relative addressing of external symbol: {}", patch.symbol),
                );
                continue;
            }
            code.set(patch.slot, ARE_EXTERNAL);
            symbols.record_external_ref(id, LOAD_BASE + patch.slot as i64);
            continue;
        }

        if !sym.has_address() {
            diags.error(patch.pos.clone(), Kind::UndefinedSymbol, format!("undefined label: {}", patch.symbol));
            continue;
        }

        match patch.mode {
            AddressingMode::Direct => {
                code.set(patch.slot, (addr << 3) | ARE_RELOCATABLE);
            }
            AddressingMode::Relative => {
                if kinds.contains(SymbolKinds::DATA) {
                    diags.error(
                        patch.pos.clone(),
                        Kind::RelativeToData,
                        format!("relative addressing of data symbol: {}", patch.symbol),
                    );
                    continue;
                }
                let displacement = addr - (patch.instr_ic + LOAD_BASE) + 1;
                code.set(patch.slot, (displacement << 3) | ARE_ABSOLUTE);
            }
            AddressingMode::Immediate | AddressingMode::Register => {
                unreachable!("only direct/relative operands produce patches")
            }
        }
    }
}
