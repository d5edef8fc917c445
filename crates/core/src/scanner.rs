//! Definition scanning: locate a header, extend it to the end of its body,
//! record the fragment, move on.
//!
//! The scan keeps a single forward-only cursor marking the start of the
//! unscanned remainder. When a match is rejected as oversized the cursor
//! jumps to the next blank line, so one bad block never stops the whole file.

use tracing::debug;

use crate::body::{body_scan_start, find_body_end};
use crate::header::{declarator_name, signature, HeaderMatcher};
use crate::types::{Fragment, ScanLimits, Span};

/// Locate every function definition in `source`, in source order.
pub fn scan(source: &str, limits: &ScanLimits) -> Vec<Fragment> {
    let matcher = HeaderMatcher::new();
    let mut lines = LineTracker::default();
    let mut fragments = Vec::new();
    let mut cursor = 0usize;

    while source.len().saturating_sub(cursor) > limits.min_remaining {
        // A miss means no header starts anywhere in the remainder, so every
        // blank-line retry after it would miss as well.
        let Some(header) = matcher.locate(source, cursor) else {
            debug!(offset = cursor, "No further headers");
            break;
        };

        let body_start = body_scan_start(source, header.end);
        let body_end = find_body_end(source, body_start);
        let extent = body_end - header.start;
        if extent > limits.max_fragment_len {
            debug!(
                offset = header.start,
                len = extent,
                max = limits.max_fragment_len,
                "Oversized match, skipping block"
            );
            cursor = skip_block(source, cursor);
            continue;
        }

        let fragment = make_fragment(source, Span::new(header.start, body_end), &mut lines);
        debug!(name = fragment.name.as_str(), start = fragment.span.start, end = body_end, "Located definition");
        fragments.push(fragment);
        cursor = body_end + 1;
    }

    fragments
}

/// Cursor position after the recovery skip: the second newline of the next
/// `"\n\n"`, or the end of the source when there is no blank line left.
fn skip_block(source: &str, cursor: usize) -> usize {
    let rest = &source.as_bytes()[cursor.min(source.len())..];
    match rest.windows(2).position(|w| w == b"\n\n") {
        Some(i) => cursor + i + 1,
        None => source.len(),
    }
}

fn make_fragment(source: &str, span: Span, lines: &mut LineTracker) -> Fragment {
    let text = &source[span.start..span.end];
    let start_line = lines.line_at(source, span.start);
    // The end offset is exclusive; the last byte decides the end line.
    let end_line = lines.line_at(source, span.end.saturating_sub(1).max(span.start));
    Fragment {
        span,
        text: text.to_string(),
        name: declarator_name(text).to_string(),
        signature: signature(text),
        start_line,
        end_line,
    }
}

/// Incremental 1-based line numbering for monotonically increasing offsets.
struct LineTracker {
    offset: usize,
    line: usize,
}

impl Default for LineTracker {
    fn default() -> Self {
        LineTracker { offset: 0, line: 1 }
    }
}

impl LineTracker {
    fn line_at(&mut self, source: &str, offset: usize) -> usize {
        let src = source.as_bytes();
        let offset = offset.min(src.len());
        if offset < self.offset {
            // Offsets only move forward across fragments; restart otherwise.
            *self = LineTracker::default();
        }
        self.line += src[self.offset..offset].iter().filter(|&&b| b == b'\n').count();
        self.offset = offset;
        self.line
    }
}
