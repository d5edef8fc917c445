//! Splicing annotation comments back into the source at fragment offsets.

use tracing::warn;

/// A comment block to insert directly before the byte at `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub offset: usize,
    pub comment: String,
}

/// Insert every comment in one pass. Insertions must be sorted by offset;
/// any that points backwards, past the end, or inside a UTF-8 sequence is
/// dropped with a warning.
pub fn splice(source: &str, insertions: &[Insertion]) -> String {
    let extra: usize = insertions.iter().map(|i| i.comment.len()).sum();
    let mut out = String::with_capacity(source.len() + extra);
    let mut copied = 0;

    for insertion in insertions {
        let at = insertion.offset;
        if at < copied || at > source.len() || !source.is_char_boundary(at) {
            warn!(offset = at, "Dropping annotation at invalid offset");
            continue;
        }
        out.push_str(&source[copied..at]);
        out.push_str(&insertion.comment);
        copied = at;
    }

    out.push_str(&source[copied..]);
    out
}
