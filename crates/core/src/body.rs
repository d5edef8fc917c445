//! Function body extent via brace depth counting.
//!
//! Braces inside string/char literals and comments are counted like any
//! other brace.

/// Offset one past the `}` that closes a body whose opening `{` has already
/// been consumed. Scanning starts at `from`. When the buffer runs out before
/// the depth returns to zero, the whole remainder is the body and
/// `text.len()` is returned.
pub fn find_body_end(text: &str, from: usize) -> usize {
    let mut depth = 1usize;
    for (i, &b) in text.as_bytes().iter().enumerate().skip(from) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    text.len()
}

/// Forward skip past the header end before brace counting starts.
pub const BODY_SKIP: usize = 30;

/// Where brace counting starts for a header ending at `header_end`:
/// [`BODY_SKIP`] bytes further on, but never past the first brace at or after
/// the header end and never past the end of the buffer. Only brace-free text
/// is skipped, so the body end found from here is the one found from
/// `header_end`.
pub fn body_scan_start(text: &str, header_end: usize) -> usize {
    let src = text.as_bytes();
    let start = header_end.min(src.len());
    let limit = start.saturating_add(BODY_SKIP).min(src.len());
    match src[start..limit].iter().position(|&b| b == b'{' || b == b'}') {
        Some(i) => start + i,
        None => limit,
    }
}
