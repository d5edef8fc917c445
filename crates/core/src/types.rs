//! Core types shared across fnscope: source spans, located function
//! definitions, scan limits, and runtime configuration.

use serde::Serialize;

use crate::annotate::{DEFAULT_PROMPT, DEFAULT_WRAP_WIDTH};

// ---------------------------------------------------------------------------
// Spans
// ---------------------------------------------------------------------------

/// Half-open byte range `[start, end)` into the scanned source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} is past end {end}");
        Span { start, end }
    }
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

/// A located function definition: header start through the matching `}`.
///
/// Serializes as a listing entry: offsets, name, signature and lines, without
/// the definition text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    #[serde(flatten)]
    pub span: Span,
    /// Exactly `source[span.start..span.end]`.
    #[serde(skip)]
    pub text: String,
    /// Declarator identifier, e.g. `add` for `int add(int a, int b) {`.
    pub name: String,
    /// Header text before the opening brace, whitespace collapsed.
    pub signature: String,
    /// 1-based start line.
    pub start_line: usize,
    /// 1-based end line (inclusive).
    pub end_line: usize,
}

impl Fragment {
    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }
}

// ---------------------------------------------------------------------------
// Scan limits
// ---------------------------------------------------------------------------

/// Remaining-input floor below which no further match is attempted.
pub const DEFAULT_MIN_REMAINING: usize = 10;

/// Header-to-body extent above which a match is treated as a mis-parse.
pub const DEFAULT_MAX_FRAGMENT_LEN: usize = 4000;

/// Tunables for [`crate::scanner::scan`]. Loaded from `.fnscope.toml` or defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    pub min_remaining: usize,
    pub max_fragment_len: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            min_remaining: DEFAULT_MIN_REMAINING,
            max_fragment_len: DEFAULT_MAX_FRAGMENT_LEN,
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Runtime configuration. Loaded from `.fnscope.toml` or defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnscopeConfig {
    pub limits: ScanLimits,
    /// Column at which annotation comments are wrapped.
    pub wrap_width: usize,
    /// Request text sent ahead of every fragment to a command annotator.
    pub prompt: String,
    /// Program and arguments of an external annotator. Empty = built-in outline.
    pub annotator_command: Vec<String>,
}

impl Default for FnscopeConfig {
    fn default() -> Self {
        Self {
            limits: ScanLimits::default(),
            wrap_width: DEFAULT_WRAP_WIDTH,
            prompt: DEFAULT_PROMPT.to_string(),
            annotator_command: Vec::new(),
        }
    }
}
