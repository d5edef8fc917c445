//! End-to-end tests over a fixture C file: scan, annotate, splice, and
//! `.fnscope.toml` loading from a temp dir.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use fnscope_core::annotate::{AnnotateError, Annotator, OutlineAnnotator};
use fnscope_core::{annotate_source, load_config_file, load_fnscope_config, scan};
use fnscope_core::{FnscopeConfig, ScanLimits};
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Fixture '{name}' not readable at {}: {e}", path.display()))
}

fn names(source: &str, limits: &ScanLimits) -> Vec<String> {
    scan(source, limits).into_iter().map(|f| f.name).collect()
}

/// Rejects every definition whose name contains the given marker.
struct PickyAnnotator(&'static str);

impl Annotator for PickyAnnotator {
    fn annotate(&self, fragment: &str) -> Result<String, AnnotateError> {
        if fragment.contains(self.0) {
            return Err(AnnotateError::Rejected(format!("won't describe {}", self.0)));
        }
        OutlineAnnotator.annotate(fragment)
    }

    fn name(&self) -> &str {
        "picky"
    }
}

/// Rejects everything and counts how often it was asked.
#[derive(Default)]
struct CountingRejecter {
    calls: AtomicUsize,
}

impl Annotator for CountingRejecter {
    fn annotate(&self, _fragment: &str) -> Result<String, AnnotateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AnnotateError::Rejected("quota exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "counting"
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

#[test]
fn test_scan_fixture_finds_every_definition() {
    let src = fixture("ring_buffer.c");
    assert_eq!(
        names(&src, &ScanLimits::default()),
        vec![
            "ring_new",
            "ring_free",
            "ring_advance",
            "ring_push",
            "ring_pop",
            "ring_is_empty",
            "ring_log"
        ]
    );
}

#[test]
fn test_scan_fixture_fragment_invariants() {
    let src = fixture("ring_buffer.c");
    let fragments = scan(&src, &ScanLimits::default());

    for pair in fragments.windows(2) {
        assert!(pair[0].end() < pair[1].start(), "Out of order or overlapping: {pair:?}");
    }
    for f in &fragments {
        assert_eq!(&src[f.start()..f.end()], f.text);
        let brace = f.text.find('{').expect("Fragment should contain a brace");
        assert!(f.text[..brace].contains('('), "Header should hold a parameter list: {}", f.text);
        assert!(f.text.ends_with('}'), "Fragment should end with its closing brace: {}", f.text);
        assert_eq!(f.text.matches('{').count(), f.text.matches('}').count(), "{}", f.text);
    }

    let ring_new = &fragments[0];
    assert_eq!((ring_new.start_line, ring_new.end_line), (22, 33));
    assert!(ring_new.text.starts_with("Ring *\nring_new (void)\n{"), "got:\n{}", ring_new.text);
    assert_eq!(ring_new.signature, "Ring * ring_new (void)");
}

#[test]
fn test_scan_fixture_size_ceiling_skips_large_definitions() {
    let src = fixture("ring_buffer.c");
    let limits = ScanLimits { max_fragment_len: 100, ..ScanLimits::default() };
    assert_eq!(names(&src, &limits), vec!["ring_free", "ring_advance", "ring_is_empty", "ring_log"]);
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

#[test]
fn test_annotate_fixture_with_outline() {
    let src = fixture("ring_buffer.c");
    let report = annotate_source(&src, &FnscopeConfig::default(), &OutlineAnnotator, false).unwrap();

    assert_eq!(report.annotated, 7);
    assert!(report.failures.is_empty());
    assert!(
        report.output.contains("// ring_new() takes no parameters and spans 12 lines.\nRing *\nring_new (void)"),
        "Comment should sit right above ring_new, got:\n{}",
        report.output
    );
    assert!(
        report.output.contains("// ring_log() takes 2 parameters (const char * fmt, ...)"),
        "got:\n{}",
        report.output
    );

    // Removing the inserted comment lines gives back the original text.
    let stripped: Vec<&str> = report.output.lines().filter(|l| !l.starts_with("//")).collect();
    let original: Vec<&str> = src.lines().collect();
    assert_eq!(stripped, original);
}

#[test]
fn test_annotate_failures_are_logged_not_fatal() {
    let src = fixture("ring_buffer.c");
    let picky = PickyAnnotator("ring_pop");
    let report = annotate_source(&src, &FnscopeConfig::default(), &picky, false).unwrap();

    assert_eq!(report.annotated, 6);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "ring_pop");
    assert_eq!(report.failures[0].start_line, 60);
    assert!(!report.output.contains("// ring_pop()"));
    assert!(report.output.contains("// ring_push()"));
}

#[test]
fn test_annotate_strict_propagates_first_failure() {
    let src = fixture("ring_buffer.c");
    let picky = PickyAnnotator("ring_advance");
    let err = annotate_source(&src, &FnscopeConfig::default(), &picky, true).unwrap_err();
    assert_eq!(err, AnnotateError::Rejected("won't describe ring_advance".to_string()));
}

#[test]
fn test_annotate_strict_stops_sending_fragments_after_failure() {
    let src: String =
        (0..500).map(|i| format!("int f{i}(int x) {{\n  return x + {i};\n}}\n\n")).collect();
    let config = FnscopeConfig::default();
    assert_eq!(scan(&src, &config.limits).len(), 500);

    let rejecter = CountingRejecter::default();
    let err = annotate_source(&src, &config, &rejecter, true).unwrap_err();
    assert_eq!(err, AnnotateError::Rejected("quota exhausted".to_string()));
    let calls = rejecter.calls.load(Ordering::SeqCst);
    assert!(calls < 500, "Strict mode kept annotating after a rejection ({calls} calls)");

    let rejecter = CountingRejecter::default();
    let report = annotate_source(&src, &config, &rejecter, false).unwrap();
    assert_eq!(report.failures.len(), 500);
    assert_eq!(rejecter.calls.load(Ordering::SeqCst), 500);
}

#[test]
fn test_annotate_garbage_is_unchanged() {
    let src = "Nothing here is C.\n\nJust words; and (parens) without bodies.\n";
    let report = annotate_source(src, &FnscopeConfig::default(), &OutlineAnnotator, true).unwrap();
    assert!(report.fragments.is_empty());
    assert_eq!(report.output, src);
}

#[cfg(unix)]
#[test]
fn test_annotate_through_external_command() {
    let src = "int add(int a, int b) {\n  return a + b;\n}\n";
    let config = FnscopeConfig {
        annotator_command: vec!["sh".into(), "-c".into(), "cat >/dev/null; echo Adds two ints.".into()],
        ..FnscopeConfig::default()
    };
    let annotator =
        fnscope_core::annotate::create_annotator(&config.annotator_command, &config.prompt);
    let report = annotate_source(src, &config, annotator.as_ref(), true).unwrap();
    assert_eq!(report.output, "// Adds two ints.\nint add(int a, int b) {\n  return a + b;\n}\n");
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn test_config_loaded_from_directory() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(
        dir.path().join(".fnscope.toml"),
        "max_fragment_len = 100\nwrap_width = 40\nannotator_command = [\"llm\", \"-q\"]\n",
    )
    .unwrap();

    let config = load_fnscope_config(dir.path());
    assert_eq!(config.limits.max_fragment_len, 100);
    assert_eq!(config.wrap_width, 40);
    assert_eq!(config.annotator_command, vec!["llm", "-q"]);

    let src = fixture("ring_buffer.c");
    assert_eq!(names(&src, &config.limits).len(), 4);
}

#[test]
fn test_config_missing_or_broken_falls_back_to_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    assert_eq!(load_fnscope_config(dir.path()), FnscopeConfig::default());

    std::fs::write(dir.path().join(".fnscope.toml"), "wrap_width = = 3").unwrap();
    assert_eq!(load_fnscope_config(dir.path()), FnscopeConfig::default());
}

#[test]
fn test_explicit_config_file_errors() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let missing = dir.path().join("nope.toml");
    assert!(load_config_file(&missing).is_err());

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "prompt = ").unwrap();
    assert!(load_config_file(&broken).is_err());
}
