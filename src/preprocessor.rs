// Macro pre-processor.
//
// A small state machine over physical lines: `Outside` copies ordinary
// lines through (expanding known macro invocations as it goes);
// `Inside(name)` accumulates a macro body verbatim until `mcroend`
// closes it. The teacher's lexer drives a similar line/character state
// machine for a richer grammar; this one only needs to recognize whole
// lines, so it stays flat rather than growing a token stream.

use std::collections::{HashMap, HashSet};

use crate::diagnostics::{Diagnostics, Kind};
use crate::isa::is_reserved_word;
use crate::pos::Pos;
use crate::scan::{first_token, is_legal_identifier, MAX_LINE_LEN};

#[derive(Clone, Debug)]
pub struct Macro {
    pub name: String,
    pub body: Vec<String>,
}

pub struct PreprocessOutput {
    pub text: String,
    /// Names claimed by a macro definition, valid or not. The first pass
    /// rejects any symbol or label that collides with one of these.
    pub macro_names: HashSet<String>,
    pub diagnostics: Diagnostics,
}

enum State {
    Outside,
    Inside(String),
}

pub fn preprocess(source: &str, filename: &str) -> PreprocessOutput {
    let mut diags = Diagnostics::new();
    let mut macros: HashMap<String, Macro> = HashMap::new();
    let mut state = State::Outside;
    let mut out = String::new();

    for (i, raw) in source.lines().enumerate() {
        let line_no = (i + 1) as u32;
        let pos = Pos::new(filename, line_no);

        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let line = if line.len() > MAX_LINE_LEN {
            diags.error(pos.clone(), Kind::LineTooLong, format!("line exceeds {MAX_LINE_LEN} characters"));
            &line[..MAX_LINE_LEN]
        } else {
            line
        };

        state = step(line, &pos, state, &mut macros, &mut out, &mut diags);
    }

    if let State::Inside(name) = state {
        diags.error(
            Pos::new(filename, (source.lines().count() as u32).max(1)),
            Kind::UnterminatedMacro,
            format!("macro '{name}' has no matching mcroend"),
        );
    }

    let macro_names = macros.keys().cloned().collect();
    PreprocessOutput { text: out, macro_names, diagnostics: diags }
}

fn step(
    line: &str,
    pos: &Pos,
    state: State,
    macros: &mut HashMap<String, Macro>,
    out: &mut String,
    diags: &mut Diagnostics,
) -> State {
    match state {
        State::Outside => step_outside(line, pos, macros, out, diags),
        State::Inside(name) => step_inside(line, pos, name, macros, diags),
    }
}

fn step_outside(
    line: &str,
    pos: &Pos,
    macros: &mut HashMap<String, Macro>,
    out: &mut String,
    diags: &mut Diagnostics,
) -> State {
    let (tok, rest) = first_token(line);

    if tok == "mcro" {
        let (name, trailing) = first_token(rest);
        if name.is_empty() {
            diags.error(pos.clone(), Kind::UnrecognizedToken, "mcro with no name");
            return State::Outside;
        }
        if !trailing.is_empty() {
            diags.error(pos.clone(), Kind::MacroTrailingGarbage, "text after macro name");
        }
        if name.len() > crate::scan::MAX_IDENT_LEN {
            diags.error(pos.clone(), Kind::MacroNameTooLong, format!("macro name too long: {name}"));
            return State::Inside(name.to_string());
        }
        if is_reserved_word(name) || !is_legal_identifier(name) {
            diags.error(pos.clone(), Kind::MacroNameReserved, format!("illegal macro name: {name}"));
            return State::Inside(name.to_string());
        }
        if macros.contains_key(name) {
            diags.error(pos.clone(), Kind::DuplicateSymbol, format!("macro already defined: {name}"));
            return State::Inside(name.to_string());
        }
        macros.insert(name.to_string(), Macro { name: name.to_string(), body: Vec::new() });
        return State::Inside(name.to_string());
    }

    let trimmed = line.trim();
    if let Some(m) = macros.get(trimmed) {
        for body_line in &m.body {
            out.push_str(body_line);
            out.push('\n');
        }
        return State::Outside;
    }

    if crate::scan::is_blank_or_comment(line) {
        return State::Outside;
    }

    out.push_str(line);
    out.push('\n');
    State::Outside
}

fn step_inside(
    line: &str,
    pos: &Pos,
    name: String,
    macros: &mut HashMap<String, Macro>,
    diags: &mut Diagnostics,
) -> State {
    let looks_like_end = line.trim_start().starts_with("mcroend");
    let starts_at_zero = line.starts_with("mcroend");

    if looks_like_end && !starts_at_zero {
        diags.error(pos.clone(), Kind::McroendNotAtColumnZero, "mcroend must start at column 0");
        append_body(macros, &name, line);
        return State::Inside(name);
    }

    if starts_at_zero {
        let trailing = &line["mcroend".len()..];
        if trailing.trim().is_empty() {
            return State::Outside;
        }
        diags.error(pos.clone(), Kind::MacroTrailingGarbage, "text after mcroend");
        append_body(macros, &name, line);
        return State::Inside(name);
    }

    append_body(macros, &name, line);
    State::Inside(name)
}

fn append_body(macros: &mut HashMap<String, Macro>, name: &str, line: &str) {
    if let Some(m) = macros.get_mut(name) {
        m.body.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_round_trip() {
        let src = "mcro GREET\nmov r1, r2\nmcroend\nGREET\n";
        let out = preprocess(src, "f");
        assert!(!out.diagnostics.has_errors());
        assert_eq!(out.text, "mov r1, r2\n");
    }

    #[test]
    fn mcro_mcroend_stripped_invocation_replaced() {
        let src = "mcro M\nadd r1, r2\nsub r1, r2\nmcroend\nM\nstop\n";
        let out = preprocess(src, "f");
        assert_eq!(out.text, "add r1, r2\nsub r1, r2\nstop\n");
    }

    #[test]
    fn ordinary_lines_pass_through() {
        let src = "mov r1, r2\nstop\n";
        let out = preprocess(src, "f");
        assert_eq!(out.text, "mov r1, r2\nstop\n");
    }

    #[test]
    fn blank_and_comment_lines_are_dropped() {
        let src = "; a comment\n\nmov r1, r2\n";
        let out = preprocess(src, "f");
        assert_eq!(out.text, "mov r1, r2\n");
    }

    #[test]
    fn reserved_macro_name_is_diagnosed() {
        let src = "mcro mov\nstop\nmcroend\n";
        let out = preprocess(src, "f");
        assert!(out.diagnostics.has_errors());
    }

    #[test]
    fn mcroend_indented_does_not_close() {
        let src = "mcro M\nstop\n    mcroend\nmcroend\n";
        let out = preprocess(src, "f");
        assert!(out.diagnostics.has_errors());
    }

    #[test]
    fn unterminated_macro_is_diagnosed() {
        let src = "mcro M\nstop\n";
        let out = preprocess(src, "f");
        assert!(out.diagnostics.has_errors());
    }

    #[test]
    fn over_long_line_is_truncated_and_diagnosed() {
        let long_line = "a".repeat(90);
        let out = preprocess(&long_line, "f");
        assert!(out.diagnostics.has_errors());
        // truncated copy still makes it through as an (invalid) ordinary line
        assert_eq!(out.text.trim_end().len(), MAX_LINE_LEN);
    }
}
