//! Pluggable annotation of located definitions.
//!
//! Provides an `Annotator` trait with two implementations: `OutlineAnnotator`
//! (offline description derived from the header, no dependencies) and
//! `CommandAnnotator` (pipes the fragment through an external program, which
//! is how a hosted text-generation model is reached).

use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::header::{declarator_name, parameters};

/// Default request text placed before every fragment sent to a command annotator.
pub const DEFAULT_PROMPT: &str =
    "Could you write a top comment to explain important function steps and it goal.\n";

/// Comment wrap column used when none is configured.
pub const DEFAULT_WRAP_WIDTH: usize = 80;

/// Narrowest wrap column; smaller widths are raised to this.
pub const MIN_WRAP_WIDTH: usize = 20;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotateError {
    /// The annotator refused the fragment (non-zero exit, empty answer).
    Rejected(String),
    /// The annotator could not be reached at all.
    Io(String),
}

impl fmt::Display for AnnotateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotateError::Rejected(msg) => write!(f, "Request rejected: {msg}"),
            AnnotateError::Io(msg) => write!(f, "Annotator unavailable: {msg}"),
        }
    }
}

impl std::error::Error for AnnotateError {}

// ---------------------------------------------------------------------------
// Annotators
// ---------------------------------------------------------------------------

pub trait Annotator: Send + Sync {
    /// Produce a plain-text description of one function definition.
    fn annotate(&self, fragment: &str) -> Result<String, AnnotateError>;
    fn name(&self) -> &str;
}

/// Default: describes the definition from its header (works offline)
pub struct OutlineAnnotator;

impl Annotator for OutlineAnnotator {
    fn annotate(&self, fragment: &str) -> Result<String, AnnotateError> {
        let name = declarator_name(fragment);
        if name.is_empty() {
            return Err(AnnotateError::Rejected("fragment has no declarator".to_string()));
        }
        let params = parameters(fragment);
        let lines = fragment.lines().count();
        let takes = match params.len() {
            0 => "takes no parameters".to_string(),
            1 => format!("takes one parameter ({})", params[0]),
            n => format!("takes {n} parameters ({})", params.join(", ")),
        };
        let plural = if lines == 1 { "" } else { "s" };
        Ok(format!("{name}() {takes} and spans {lines} line{plural}."))
    }

    fn name(&self) -> &str {
        "outline"
    }
}

/// Runs an external program per fragment: prompt + fragment on stdin,
/// annotation on stdout.
pub struct CommandAnnotator {
    program: String,
    args: Vec<String>,
    prompt: String,
}

impl CommandAnnotator {
    pub fn new(program: impl Into<String>, args: Vec<String>, prompt: impl Into<String>) -> Self {
        Self { program: program.into(), args, prompt: prompt.into() }
    }
}

impl Annotator for CommandAnnotator {
    fn annotate(&self, fragment: &str) -> Result<String, AnnotateError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AnnotateError::Io(format!("Failed to start {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(self.prompt.as_bytes())
                .and_then(|_| stdin.write_all(fragment.as_bytes()))
                .map_err(|e| AnnotateError::Io(format!("Failed to write to {}: {e}", self.program)))?;
            // stdin drops here so the child sees EOF
        }

        let output = child
            .wait_with_output()
            .map_err(|e| AnnotateError::Io(format!("Failed to wait for {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnnotateError::Rejected(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(AnnotateError::Rejected(format!("{} returned no text", self.program)));
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Create an annotator from a command line. An empty command means the
/// offline outline annotator.
pub fn create_annotator(command: &[String], prompt: &str) -> Arc<dyn Annotator> {
    match command.split_first() {
        Some((program, args)) => Arc::new(CommandAnnotator::new(program, args.to_vec(), prompt)),
        None => Arc::new(OutlineAnnotator),
    }
}

// ---------------------------------------------------------------------------
// Comment formatting
// ---------------------------------------------------------------------------

/// Word-wrap `text` to `width` columns as a block of `// ` line comments.
/// Blank lines inside the text are kept as bare `//` lines. Widths below
/// [`MIN_WRAP_WIDTH`] are raised to it.
pub fn format_comment(text: &str, width: usize) -> String {
    let width = width.max(MIN_WRAP_WIDTH);
    let mut out = String::new();
    for paragraph in text.trim().lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.len() + 1 + word.len() > width {
                push_comment_line(&mut out, &line);
                line.clear();
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        push_comment_line(&mut out, &line);
    }
    out
}

fn push_comment_line(out: &mut String, line: &str) {
    if line.is_empty() {
        out.push_str("//\n");
    } else {
        out.push_str("// ");
        out.push_str(line);
        out.push('\n');
    }
}
