//! Field tokenizer for comma-delimited record lines.
//!
//! Quoting rules:
//! - `"` toggles a quoted span and is dropped from the output
//! - `,` outside a quoted span ends the current field
//! - everything else, including `,` inside a quoted span, is kept verbatim
//!
//! Every field is trimmed of surrounding whitespace. There is no escape for a
//! literal quote. An unterminated quote keeps the rest of the line quoted, so
//! every later comma is literal.

/// Splits one line into trimmed fields.
///
/// The result always contains at least one field; a line with no delimiter
/// (including the empty line) yields exactly one.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_owned());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_owned());

    fields
}
