// Shared scanning and validation primitives used by the pre-processor,
// the first pass, and the second pass. Kept deliberately small and
// string-slice based: the source format is line-oriented, so a full
// character-class state machine for a free-form expression grammar is
// more machinery than this format needs. Tokens are separated by
// whitespace and the occasional comma, never nested.

use crate::diagnostics::Kind;

pub const MAX_LINE_LEN: usize = 80;
pub const MAX_IDENT_LEN: usize = 31;

/// Splits off the first whitespace-delimited token from `s`, returning
/// `(token, rest)` with `rest` having its leading whitespace stripped.
pub fn first_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/// True if, after trimming leading whitespace, the line is empty or a
/// comment (`;` as the first non-whitespace character).
pub fn is_blank_or_comment(line: &str) -> bool {
    let t = line.trim_start();
    t.is_empty() || t.starts_with(';')
}

/// A label definition is a token immediately followed by `:` with no
/// space in between, itself followed by whitespace. Returns
/// `(label, rest)` when the first token of the line is such a
/// definition.
pub fn split_label(line: &str) -> Option<(&str, &str)> {
    let t = line.trim_start();
    let colon = t.find(':')?;
    let (name, after) = t.split_at(colon);
    let after = &after[1..]; // drop the ':'
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, after.trim_start()))
}

/// Why an identifier was rejected, distinct enough that callers can pick
/// the matching diagnostic kind.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum IdentifierProblem {
    /// Empty, or its first character isn't a letter.
    BadStart,
    /// A later character isn't alphanumeric.
    BadChars,
    TooLong,
}

/// Checks identifier legality: starts with a letter, remainder
/// alphanumeric, length at most `MAX_IDENT_LEN`. Reserved-word and
/// macro-name-collision checks are the caller's responsibility, since
/// those need the symbol/macro tables.
pub fn check_identifier(s: &str) -> Result<(), IdentifierProblem> {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return Err(IdentifierProblem::BadStart);
    };
    if s.len() > MAX_IDENT_LEN {
        return Err(IdentifierProblem::TooLong);
    }
    if !first.is_ascii_alphabetic() {
        return Err(IdentifierProblem::BadStart);
    }
    if !chars.all(|c| c.is_ascii_alphanumeric()) {
        return Err(IdentifierProblem::BadChars);
    }
    Ok(())
}

pub fn is_legal_identifier(s: &str) -> bool {
    check_identifier(s).is_ok()
}

/// Splits a post-mnemonic operand string into exactly `expected`
/// top-level, comma-separated operands, enforcing the comma discipline:
/// no leading or trailing comma, no comma before the first operand or
/// after the last, exactly one comma between operands.
pub fn split_operands(text: &str, expected: usize) -> Result<Vec<&str>, Kind> {
    let text = text.trim();

    if expected == 0 {
        return if text.is_empty() { Ok(vec![]) } else { Err(Kind::TrailingText) };
    }

    if text.starts_with(',') {
        return Err(Kind::LeadingComma);
    }
    if text.ends_with(',') {
        return Err(Kind::TrailingComma);
    }

    let parts: Vec<&str> = text.split(',').map(str::trim).collect();

    if parts.iter().any(|p| p.is_empty()) {
        return Err(Kind::ExtraComma);
    }
    if parts.len() < expected {
        return Err(Kind::MissingComma);
    }
    if parts.len() > expected {
        return Err(Kind::ExtraComma);
    }

    Ok(parts)
}

/// Parses a `.data`/`.string`-style signed decimal literal.
pub fn parse_signed_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok()
}
