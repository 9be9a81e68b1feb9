// First pass: line classification, symbol definition at provisional
// addresses, and instruction/data layout.
//
// Operand resolution is deferred to `resolve.rs` via the `Patch` list
// built by `encoder::encode_instruction`. This module never looks an
// operand symbol up; it only decides that one needs to be resolved
// later.

use std::collections::HashSet;

use crate::data::{write_data, write_string};
use crate::diagnostics::{Diagnostics, Kind};
use crate::encoder::{encode_instruction, Patch};
use crate::image::Image;
use crate::isa::lookup_command;
use crate::pos::Pos;
use crate::scan::{first_token, is_blank_or_comment, split_label};
use crate::symbol::{SymbolKinds, SymbolTable};

pub struct FirstPassOutput {
    pub symbols: SymbolTable,
    pub code: Image,
    pub data: Image,
    pub patches: Vec<Patch>,
    pub icf: i64,
    pub dcf: i64,
    pub diagnostics: Diagnostics,
}

/// Runs the first pass over already macro-expanded (`.am`) text.
pub fn run(am_text: &str, filename: &str, macro_names: &HashSet<String>) -> FirstPassOutput {
    let mut symbols = SymbolTable::new();
    let mut code = Image::new();
    let mut data = Image::new();
    let mut patches = Vec::new();
    let mut diags = Diagnostics::new();

    let mut ic: i64 = 0;
    let mut dc: i64 = 0;
    let mut last_pos = Pos::bof(filename);

    let is_macro_name = |n: &str| macro_names.contains(n);

    for (i, line) in am_text.lines().enumerate() {
        let pos = Pos::new(filename, (i + 1) as u32);
        last_pos = pos.clone();

        if is_blank_or_comment(line) {
            continue;
        }

        process_line(
            line,
            &pos,
            &mut symbols,
            &mut code,
            &mut data,
            &mut patches,
            &mut ic,
            &mut dc,
            &is_macro_name,
            &mut diags,
        );
    }

    let icf = ic;
    let dcf = dc;
    symbols.relocate(icf, dcf);
    symbols.check_entries_defined(&last_pos, &mut diags);

    FirstPassOutput { symbols, code, data, patches, icf, dcf, diagnostics: diags }
}

#[allow(clippy::too_many_arguments)]
fn process_line(
    line: &str,
    pos: &Pos,
    symbols: &mut SymbolTable,
    code: &mut Image,
    data: &mut Image,
    patches: &mut Vec<Patch>,
    ic: &mut i64,
    dc: &mut i64,
    is_macro_name: &impl Fn(&str) -> bool,
    diags: &mut Diagnostics,
) {
    let (tok, rest) = first_token(line);

    match tok {
        ".entry" => {
            if let Some(name) = scan_directive_identifier(rest, pos, diags) {
                symbols.add_kind(name, SymbolKinds::ENTRY, pos, is_macro_name, diags);
            }
            return;
        }
        ".extern" => {
            if let Some(name) = scan_directive_identifier(rest, pos, diags) {
                symbols.add_kind(name, SymbolKinds::EXTERNAL, pos, is_macro_name, diags);
            }
            return;
        }
        ".data" => {
            write_data(rest, pos, data, diags);
            *dc = data.len() as i64;
            return;
        }
        ".string" => {
            write_string(rest, pos, data, diags);
            *dc = data.len() as i64;
            return;
        }
        _ => {}
    }

    if let Some(cmd) = lookup_command(tok) {
        let words = encode_instruction(cmd, rest, *ic, pos, code, patches, diags);
        *ic += words as i64;
        return;
    }

    if let Some((label, after)) = split_label(line) {
        handle_labeled_line(label, after, pos, symbols, code, data, patches, ic, dc, is_macro_name, diags);
        return;
    }

    diags.error(pos.clone(), Kind::UnrecognizedToken, format!("unrecognized first token: {tok}"));
}

#[allow(clippy::too_many_arguments)]
fn handle_labeled_line(
    label: &str,
    after: &str,
    pos: &Pos,
    symbols: &mut SymbolTable,
    code: &mut Image,
    data: &mut Image,
    patches: &mut Vec<Patch>,
    ic: &mut i64,
    dc: &mut i64,
    is_macro_name: &impl Fn(&str) -> bool,
    diags: &mut Diagnostics,
) {
    let (tok, rest) = first_token(after);

    match tok {
        ".data" => {
            symbols.add_name(label, SymbolKinds::DATA, *dc, pos, is_macro_name, diags);
            write_data(rest, pos, data, diags);
            *dc = data.len() as i64;
        }
        ".string" => {
            symbols.add_name(label, SymbolKinds::DATA, *dc, pos, is_macro_name, diags);
            write_string(rest, pos, data, diags);
            *dc = data.len() as i64;
        }
        ".entry" => {
            diags.warning(pos.clone(), Kind::LabelIgnored, format!("label '{label}' ignored before '.entry'"));
            if let Some(name) = scan_directive_identifier(rest, pos, diags) {
                symbols.add_kind(name, SymbolKinds::ENTRY, pos, is_macro_name, diags);
            }
        }
        ".extern" => {
            diags.warning(pos.clone(), Kind::LabelIgnored, format!("label '{label}' ignored before '.extern'"));
            if let Some(name) = scan_directive_identifier(rest, pos, diags) {
                symbols.add_kind(name, SymbolKinds::EXTERNAL, pos, is_macro_name, diags);
            }
        }
        _ => {
            if let Some(cmd) = lookup_command(tok) {
                symbols.add_name(label, SymbolKinds::CODE, *ic, pos, is_macro_name, diags);
                let words = encode_instruction(cmd, rest, *ic, pos, code, patches, diags);
                *ic += words as i64;
            } else {
                diags.error(pos.clone(), Kind::UnrecognizedToken, format!("unrecognized token after label: {tok}"));
            }
        }
    }
}

/// Scans a single identifier operand for `.entry`/`.extern`, diagnosing
/// any trailing text after it.
fn scan_directive_identifier<'a>(rest: &'a str, pos: &Pos, diags: &mut Diagnostics) -> Option<&'a str> {
    let (name, trailing) = first_token(rest);
    if name.is_empty() {
        diags.error(pos.clone(), Kind::UnrecognizedToken, "directive requires an identifier operand");
        return None;
    }
    if !trailing.is_empty() {
        diags.error(pos.clone(), Kind::TrailingText, "unexpected text after directive operand");
    }
    Some(name)
}
