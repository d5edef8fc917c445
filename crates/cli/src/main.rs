//! fnscope CLI — annotate every function definition in a C source file.
//!
//! Calls `fnscope-core` directly: scan, annotate, splice, write.

use clap::Parser;
use std::path::{Path, PathBuf};

use fnscope_core::annotate::create_annotator;
use fnscope_core::types::{FnscopeConfig, Fragment};
use fnscope_core::{annotate_source, load_config_file, load_fnscope_config, scan};

/// fnscope — find C function definitions and put a descriptive comment on top of each.
#[derive(Parser)]
#[command(name = "fnscope", version, about)]
struct Cli {
    /// C source file to read
    input: PathBuf,

    /// File to write the annotated source to
    #[arg(required_unless_present = "list")]
    output: Option<PathBuf>,

    /// List located definitions instead of annotating them
    #[arg(long)]
    list: bool,

    /// Output the listing as JSON instead of human-readable text
    #[arg(long, requires = "list")]
    json: bool,

    /// Config file (default: .fnscope.toml in the current directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Annotator command line, e.g. "llm -m mini" (overrides annotator_command)
    #[arg(long)]
    command: Option<String>,

    /// Skip definitions longer than this many bytes
    #[arg(long)]
    max_fragment_len: Option<usize>,

    /// Fail on the first rejected annotation instead of skipping it
    #[arg(long)]
    strict: bool,
}

fn load_config(cli: &Cli) -> FnscopeConfig {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path).unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(1);
        }),
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            load_fnscope_config(&cwd)
        }
    };

    if let Some(command) = &cli.command {
        config.annotator_command = command.split_whitespace().map(|s| s.to_string()).collect();
    }
    if let Some(max) = cli.max_fragment_len {
        config.limits.max_fragment_len = max;
    }
    config
}

fn read_source(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Could not read {}: {e}", path.display());
        std::process::exit(1);
    })
}

/// Render the listing. An empty scan is an empty listing in both formats.
fn render_listing(fragments: &[Fragment], json: bool) -> Result<String, String> {
    if json {
        return serde_json::to_string_pretty(fragments).map_err(|e| format!("Could not encode listing: {e}"));
    }

    let mut out = String::new();
    for f in fragments {
        let lines = format!("{}-{}", f.start_line, f.end_line);
        out.push_str(&format!("{:<11} {:<32} {}\n", lines, f.name, f.signature));
    }
    Ok(out)
}

fn list(source: &str, config: &FnscopeConfig, json: bool) {
    let fragments = scan(source, &config.limits);
    match render_listing(&fragments, json) {
        Ok(s) if json => println!("{s}"),
        Ok(s) => print!("{s}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }

    if !json {
        if fragments.is_empty() {
            eprintln!("No function definitions found");
        } else {
            eprintln!("\n{} definitions", fragments.len());
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fnscope=warn".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli);
    let source = read_source(&cli.input);

    if cli.list {
        list(&source, &config, cli.json);
        return;
    }

    let Some(output_path) = &cli.output else {
        eprintln!("An output path is required unless --list is given");
        std::process::exit(2);
    };

    let annotator = create_annotator(&config.annotator_command, &config.prompt);
    let report = match annotate_source(&source, &config, annotator.as_ref(), cli.strict) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = std::fs::write(output_path, &report.output) {
        eprintln!("Could not write {}: {e}", output_path.display());
        std::process::exit(1);
    }

    for failure in &report.failures {
        eprintln!("  skipped {} (line {}): {}", failure.name, failure.start_line, failure.error);
    }
    eprintln!(
        "\nAnnotated {} of {} definitions with {} in {}ms -> {}",
        report.annotated,
        report.fragments.len(),
        annotator.name(),
        report.time_ms,
        output_path.display()
    );
}
