//! Backslash escaping for string literals inlined into query text.
//!
//! The service has no bind parameters, so values are rendered into the SQL
//! itself. Every byte that could terminate or corrupt a quoted literal is
//! replaced by a two-byte backslash sequence; all other bytes pass through.

/// Append `raw` to `buf`, backslash-escaping special bytes.
///
/// | input  | output |
/// |--------|--------|
/// | `0x00` | `\0`   |
/// | `\n`   | `\n`   |
/// | `\r`   | `\r`   |
/// | `0x1A` | `\Z`   |
/// | `'`    | `\'`   |
/// | `"`    | `\"`   |
/// | `\`    | `\\`   |
pub fn escape_bytes_backslash(buf: &mut Vec<u8>, raw: &[u8]) {
    buf.reserve(raw.len());

    for &b in raw {
        match escaped(b) {
            Some(code) => {
                buf.push(b'\\');
                buf.push(code);
            }
            None => buf.push(b),
        }
    }
}

/// Append `raw` to `buf` with the same escaping as [`escape_bytes_backslash`].
///
/// Only ASCII bytes are ever escaped, so valid UTF-8 stays valid UTF-8.
pub fn escape_str_backslash(buf: &mut String, raw: &str) {
    buf.reserve(raw.len());

    for c in raw.chars() {
        match u8::try_from(c).ok().and_then(escaped) {
            Some(code) => {
                buf.push('\\');
                buf.push(code as char);
            }
            None => buf.push(c),
        }
    }
}

/// Second byte of the escape sequence for `b`, if `b` needs escaping.
fn escaped(b: u8) -> Option<u8> {
    match b {
        0x00 => Some(b'0'),
        b'\n' => Some(b'n'),
        b'\r' => Some(b'r'),
        0x1a => Some(b'Z'),
        b'\'' => Some(b'\''),
        b'"' => Some(b'"'),
        b'\\' => Some(b'\\'),
        _ => None,
    }
}
