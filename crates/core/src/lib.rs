//! fnscope — locate C function definitions and annotate them.
//!
//! This crate finds function definitions in C-like source with an approximate
//! header grammar plus a brace-depth body scan, then hands each definition to
//! an annotator and splices the resulting comments back into the text.
//!
//! # Modules
//!
//! - [`grammar`] — Ordered recognizers (sequence, choice, optional, repetition, lookahead)
//! - [`header`] — Function header grammar and the locate-anywhere matcher
//! - [`body`] — Brace-depth search for the end of a function body
//! - [`scanner`] — Definition scanning with blank-line recovery
//! - [`annotate`] — Pluggable annotators and comment formatting
//! - [`splice`] — Offset-based comment insertion
//! - [`types`] — Spans, fragments, scan limits, runtime configuration

pub mod annotate;
pub mod body;
pub mod grammar;
pub mod header;
pub mod scanner;
pub mod splice;
pub mod types;

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

pub use scanner::scan;
pub use types::{FnscopeConfig, Fragment, ScanLimits, Span};

use annotate::{format_comment, AnnotateError, Annotator, MIN_WRAP_WIDTH};
use splice::{splice, Insertion};

// ---------------------------------------------------------------------------
// .fnscope.toml config loading
// ---------------------------------------------------------------------------

/// Name of the per-directory config file.
pub const CONFIG_FILE_NAME: &str = ".fnscope.toml";

/// Known keys in `.fnscope.toml` for config validation.
const KNOWN_CONFIG_KEYS: &[&str] = &[
    "min_remaining",
    "max_fragment_len",
    "wrap_width",
    "prompt",
    "annotator_command",
];

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn read_usize(table: &toml::Table, key: &str) -> Option<usize> {
    let value = table.get(key)?;
    match value.as_integer().and_then(|n| usize::try_from(n).ok()) {
        Some(n) => Some(n),
        None => {
            warn!(key, value = %value, "Expected a non-negative integer in {CONFIG_FILE_NAME}");
            None
        }
    }
}

/// Parse config file content. Unknown keys trigger a warning with a typo
/// suggestion; values of the wrong type are ignored with a warning.
pub fn parse_fnscope_config(content: &str) -> Result<FnscopeConfig, String> {
    let table = content.parse::<toml::Table>().map_err(|e| format!("Invalid {CONFIG_FILE_NAME}: {e}"))?;
    let mut config = FnscopeConfig::default();

    // Validate keys — warn on unknown
    for key in table.keys() {
        if KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
            continue;
        }
        let suggestion = KNOWN_CONFIG_KEYS.iter().min_by_key(|k| edit_distance(key, k));
        match suggestion {
            Some(suggestion) if edit_distance(key, suggestion) <= 3 => {
                warn!(
                    key = key.as_str(),
                    suggestion = *suggestion,
                    "Unknown key in {CONFIG_FILE_NAME} — did you mean '{suggestion}'?"
                );
            }
            _ => {
                warn!(
                    key = key.as_str(),
                    "Unknown key in {CONFIG_FILE_NAME} (known keys: {})",
                    KNOWN_CONFIG_KEYS.join(", ")
                );
            }
        }
    }

    if let Some(n) = read_usize(&table, "min_remaining") {
        config.limits.min_remaining = n;
    }
    if let Some(n) = read_usize(&table, "max_fragment_len") {
        config.limits.max_fragment_len = n;
    }
    if let Some(n) = read_usize(&table, "wrap_width") {
        if n < MIN_WRAP_WIDTH {
            warn!(
                wrap_width = n,
                min = MIN_WRAP_WIDTH,
                "wrap_width in {CONFIG_FILE_NAME} is too narrow, using {MIN_WRAP_WIDTH}"
            );
        }
        config.wrap_width = n.max(MIN_WRAP_WIDTH);
    }

    if let Some(prompt) = table.get("prompt") {
        match prompt.as_str() {
            Some(p) => config.prompt = p.to_string(),
            None => warn!("Expected a string for 'prompt' in {CONFIG_FILE_NAME}"),
        }
    }

    // annotator_command — program followed by its arguments, all strings
    if let Some(value) = table.get("annotator_command") {
        let command = value
            .as_array()
            .map(|items| items.iter().map(|v| v.as_str().map(|s| s.to_string())).collect::<Option<Vec<_>>>());
        match command {
            Some(Some(command)) => config.annotator_command = command,
            Some(None) => warn!(
                value = %value,
                "Every entry of 'annotator_command' in {CONFIG_FILE_NAME} must be a string, ignoring it"
            ),
            None => warn!(
                value = %value,
                "Expected an array of strings for 'annotator_command' in {CONFIG_FILE_NAME}, e.g. [\"llm\", \"-q\"]"
            ),
        }
    }

    Ok(config)
}

/// Load configuration from `.fnscope.toml` in `dir`.
///
/// Returns defaults when the file doesn't exist; if it can't be read or
/// parsed, returns defaults with a warning.
pub fn load_fnscope_config(dir: &Path) -> FnscopeConfig {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return FnscopeConfig::default();
    }

    debug!(path = %config_path.display(), "Loading {CONFIG_FILE_NAME}");
    let parsed = std::fs::read_to_string(&config_path)
        .map_err(|e| format!("Could not read {}: {e}", config_path.display()))
        .and_then(|content| parse_fnscope_config(&content));
    match parsed {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Falling back to default configuration");
            FnscopeConfig::default()
        }
    }
}

/// Load configuration from an explicitly named file. Unlike
/// [`load_fnscope_config`], a missing or malformed file is an error.
pub fn load_config_file(path: &Path) -> Result<FnscopeConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Could not read {}: {e}", path.display()))?;
    parse_fnscope_config(&content)
}

// ---------------------------------------------------------------------------
// Annotate a whole source buffer
// ---------------------------------------------------------------------------

/// A definition the annotator refused or could not handle.
#[derive(Debug, Clone)]
pub struct AnnotationFailure {
    pub name: String,
    pub start_line: usize,
    pub error: AnnotateError,
}

/// Result of [`annotate_source`].
#[derive(Debug, Clone)]
pub struct AnnotateReport {
    /// Source with every successful annotation spliced in.
    pub output: String,
    pub fragments: Vec<Fragment>,
    pub annotated: usize,
    pub failures: Vec<AnnotationFailure>,
    pub time_ms: u64,
}

/// Scan `source`, annotate every located definition, and splice the comments
/// in front of their definitions.
///
/// Annotations run in parallel; results are applied in source order. A failed
/// annotation is logged and its definition left untouched. With `strict`, the
/// first failure stops the run: no further fragments are sent to the
/// annotator and that error is returned. When several annotations fail at
/// once, which of them is reported is unspecified.
pub fn annotate_source(
    source: &str,
    config: &FnscopeConfig,
    annotator: &dyn Annotator,
    strict: bool,
) -> Result<AnnotateReport, AnnotateError> {
    let start = Instant::now();
    let fragments = scan(source, &config.limits);
    info!(fragments = fragments.len(), annotator = annotator.name(), "Annotating definitions");

    let results: Vec<Result<String, AnnotateError>> = if strict {
        // Collecting into a Result stops handing out fragments after an error.
        fragments
            .par_iter()
            .map(|f| annotator.annotate(&f.text))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(Ok)
            .collect()
    } else {
        fragments.par_iter().map(|f| annotator.annotate(&f.text)).collect()
    };

    let mut insertions = Vec::with_capacity(fragments.len());
    let mut failures = Vec::new();
    for (fragment, result) in fragments.iter().zip(results) {
        match result {
            Ok(text) => {
                debug!(name = fragment.name.as_str(), line = fragment.start_line, "Annotated");
                insertions.push(Insertion {
                    offset: fragment.start(),
                    comment: format_comment(&text, config.wrap_width),
                });
            }
            Err(e) => {
                warn!(
                    name = fragment.name.as_str(),
                    line = fragment.start_line,
                    error = %e,
                    "Annotation failed, leaving definition as is"
                );
                failures.push(AnnotationFailure {
                    name: fragment.name.clone(),
                    start_line: fragment.start_line,
                    error: e,
                });
            }
        }
    }

    let output = splice(source, &insertions);
    let time_ms = start.elapsed().as_millis() as u64;
    info!(
        annotated = insertions.len(),
        failed = failures.len(),
        time_ms,
        "Annotation complete"
    );

    Ok(AnnotateReport { output, annotated: insertions.len(), fragments, failures, time_ms })
}
