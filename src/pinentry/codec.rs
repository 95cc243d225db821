//! Percent-escaping for the pinentry wire protocol.
//!
//! Commands and data travel one per line, so a value may not contain a raw
//! CR or LF, and `%` doubles as the escape introducer. Exactly those three
//! bytes are rewritten; everything else is copied through, which keeps
//! multi-byte UTF-8 intact in both directions.

use hex;

/// Escape `%`, CR, and LF so the value fits on a single protocol line.
///
/// Escape codes come out lowercase (`%25`, `%0d`, `%0a`). Every input is
/// escapable, and a string with none of the reserved characters comes back
/// unchanged.
pub fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '\r' => escaped.push_str("%0d"),
            '\n' => escaped.push_str("%0a"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Decode the `%XX` escapes produced by `escape` (either hex case).
///
/// A `%` that is not followed by two hex digits is passed through
/// literally, so already-plain text survives a decode unchanged and
/// decoding never fails. Decoded bytes that do not reassemble into valid
/// UTF-8 are replaced with U+FFFD; only a hand-crafted peer can produce
/// that, since `escape` leaves multi-byte sequences alone.
pub fn unescape(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 3 <= bytes.len() {
            if let Ok(byte) = hex::decode(&bytes[i + 1..i + 3]) {
                decoded.push(byte[0]);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    match String::from_utf8(decoded) {
        Ok(string) => string,
        Err(error) => String::from_utf8_lossy(error.as_bytes()).into_owned(),
    }
}
