// Artifact formatting. Pure string-building: actually opening and
// writing the `.ob`/`.ext`/`.ent` files is the CLI's job.

use crate::consts::LOAD_BASE;
use crate::image::Image;
use crate::symbol::{SymbolKinds, SymbolTable};

/// `.ob`: a header line of `ICF DCF`, then one `%07d %06X` line per
/// instruction word, then one per data word, addresses running
/// contiguously from `LOAD_BASE`.
pub fn format_ob(icf: i64, dcf: i64, code: &Image, data: &Image) -> String {
    let mut out = String::new();
    out.push_str(&format!("     {icf} {dcf}\n"));

    let mut addr = LOAD_BASE;
    for word in code.iter().chain(data.iter()) {
        out.push_str(&format!("{addr:07} {word:06X}\n"));
        addr += 1;
    }
    out
}

/// `.ext`: one `NAME %07d` line per external reference site, in
/// symbol-table insertion order and then reference-recording order.
/// `None` when no external symbol was ever referenced.
pub fn format_ext(symbols: &SymbolTable) -> Option<String> {
    let mut out = String::new();
    for sym in symbols.iter() {
        if !sym.kinds.contains(SymbolKinds::EXTERNAL) {
            continue;
        }
        for &addr in &sym.extern_refs {
            out.push_str(&format!("{} {:07}\n", sym.name, addr));
        }
    }
    (!out.is_empty()).then_some(out)
}

/// `.ent`: one `NAME %07d` line per entry symbol. `None` when there are
/// no entry symbols.
pub fn format_ent(symbols: &SymbolTable) -> Option<String> {
    let mut out = String::new();
    for sym in symbols.iter() {
        if sym.kinds.contains(SymbolKinds::ENTRY) {
            out.push_str(&format!("{} {:07}\n", sym.name, sym.address));
        }
    }
    (!out.is_empty()).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::pos::Pos;

    fn no_macros(_: &str) -> bool {
        false
    }

    #[test]
    fn ob_header_and_addresses() {
        let mut code = Image::new();
        code.push(0);
        code.push(1);
        let mut data = Image::new();
        data.push(2);

        let text = format_ob(2, 1, &code, &data);
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "     2 1");
        assert_eq!(lines.next().unwrap(), "0000100 000000");
        assert_eq!(lines.next().unwrap(), "0000101 000001");
        assert_eq!(lines.next().unwrap(), "0000102 000002");
    }

    #[test]
    fn ext_absent_when_no_references() {
        let symbols = SymbolTable::new();
        assert_eq!(format_ext(&symbols), None);
    }

    #[test]
    fn ext_lists_references_in_order() {
        let mut symbols = SymbolTable::new();
        let mut diags = Diagnostics::new();
        let id = symbols.add_kind("X", SymbolKinds::EXTERNAL, &Pos::bof("f"), no_macros, &mut diags).unwrap();
        symbols.record_external_ref(id, 105);
        symbols.record_external_ref(id, 112);

        let text = format_ext(&symbols).unwrap();
        assert_eq!(text, "X 0000105\nX 0000112\n");
    }

    #[test]
    fn ent_reports_entry_address_after_relocation() {
        let mut symbols = SymbolTable::new();
        let mut diags = Diagnostics::new();
        symbols.add_kind("LBL", SymbolKinds::ENTRY, &Pos::bof("f"), no_macros, &mut diags);
        symbols.add_name("LBL", SymbolKinds::DATA, 0, &Pos::bof("f"), no_macros, &mut diags);
        symbols.relocate(0, 1); // ICF = 0

        let text = format_ent(&symbols).unwrap();
        assert_eq!(text, "LBL 0000100\n");
    }

    #[test]
    fn ent_absent_when_no_entries() {
        let symbols = SymbolTable::new();
        assert_eq!(format_ent(&symbols), None);
    }
}
