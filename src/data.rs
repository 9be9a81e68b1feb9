// Data-directive writer: `.data` and `.string`.
//
// Both append values to the data image one at a time rather than
// collecting into an intermediate `Vec<i64>` first. There is no
// downstream consumer that needs the batch, and the image already grows
// on its own (`Image`'s backing `Vec` doubles on push).

use crate::consts::{DATA_MAX, DATA_MIN};
use crate::diagnostics::{Diagnostics, Kind};
use crate::image::Image;
use crate::pos::Pos;
use crate::scan::parse_signed_int;

/// Parses a comma-separated list of signed integers, range-checks each,
/// and appends the legal ones to `data`. Returns the count appended.
pub fn write_data(text: &str, pos: &Pos, data: &mut Image, diags: &mut Diagnostics) -> usize {
    let text = text.trim();

    if text.is_empty() {
        diags.error(pos.clone(), Kind::BadNumericLiteral, "'.data' requires at least one value");
        return 0;
    }
    if text.starts_with(',') {
        diags.error(pos.clone(), Kind::LeadingComma, "'.data' list starts with a comma");
        return 0;
    }
    if text.ends_with(',') {
        diags.error(pos.clone(), Kind::TrailingComma, "'.data' list ends with a comma");
        return 0;
    }

    let mut count = 0;
    for part in text.split(',') {
        let part = part.trim();
        if part.is_empty() {
            diags.error(pos.clone(), Kind::ExtraComma, "empty value in '.data' list");
            continue;
        }
        match parse_signed_int(part) {
            Some(v) if (DATA_MIN..=DATA_MAX).contains(&v) => {
                data.push(v);
                count += 1;
            }
            Some(v) => {
                diags.error(pos.clone(), Kind::DataValueOutOfRange, format!("'.data' value out of range: {v}"));
            }
            None => {
                diags.error(pos.clone(), Kind::BadNumericLiteral, format!("bad '.data' literal: {part}"));
            }
        }
    }
    count
}

/// Parses a double-quoted ASCII string, appending one data value per
/// character followed by a terminating zero. Returns the count appended
/// (string length + 1 on success, 0 on failure).
pub fn write_string(text: &str, pos: &Pos, data: &mut Image, diags: &mut Diagnostics) -> usize {
    let text = text.trim();

    let Some(rest) = text.strip_prefix('"') else {
        diags.error(pos.clone(), Kind::MissingQuote, "'.string' is missing its opening quote");
        return 0;
    };

    let Some(end) = rest.find('"') else {
        diags.error(pos.clone(), Kind::MissingQuote, "'.string' is missing its closing quote");
        return 0;
    };

    let content = &rest[..end];
    let trailing = rest[end + 1..].trim();
    if !trailing.is_empty() {
        diags.error(pos.clone(), Kind::TrailingText, "text after closing quote in '.string'");
    }

    let mut count = 0;
    for ch in content.chars() {
        if !ch.is_ascii() {
            diags.error(pos.clone(), Kind::StrayCharacter, format!("non-ASCII character in '.string': {ch:?}"));
            continue;
        }
        data.push(ch as i64);
        count += 1;
    }
    data.push(0);
    count + 1
}
