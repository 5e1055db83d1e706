///
/// String staging for field names and text cells.
///
/// Backends hand out byte spans that may be longer than the value, contain
/// an embedded NUL, or carry fixed-width padding. These helpers turn such a
/// span into an owned `String` before it is written into a column.
///

use memchr::memchr;

pub fn copy_string(s: &str) -> String {
    s.to_owned()
}

/// Copy length-delimited text whole, embedded NULs included. With
/// `del_blanks`, trailing spaces are dropped.
pub fn copy_text(s: &str, del_blanks: bool) -> String {
    if del_blanks {
        s.trim_end_matches(' ').to_owned()
    } else {
        s.to_owned()
    }
}

/// Copy at most `len` bytes of `bytes`, stopping early at a NUL byte.
/// With `del_blanks`, trailing spaces are dropped (an all-blank span becomes
/// empty). Invalid UTF-8 is replaced, never rejected.
pub fn n_copy_string(bytes: &[u8], len: usize, del_blanks: bool) -> String {
    let span = &bytes[..len.min(bytes.len())];
    let span = match memchr(0, span) {
        Some(nul) => &span[..nul],
        None => span,
    };
    let span = if del_blanks {
        let end = span.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        &span[..end]
    } else {
        span
    };
    String::from_utf8_lossy(span).into_owned()
}
