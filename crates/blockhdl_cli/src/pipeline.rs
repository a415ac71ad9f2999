//! Shared pipeline helpers for CLI commands.
//!
//! Project root resolution, the project loading step used by both `build`
//! and `check`, and diagnostic reporting.

use std::path::{Path, PathBuf};

use blockhdl_config::{load_config, ProjectConfig, CONFIG_FILE};
use blockhdl_diagnostics::{
    Diagnostic, DiagnosticRenderer, DiagnosticSink, JsonRenderer, Severity, TerminalRenderer,
};
use blockhdl_graph::ModelDescription;

use crate::{GlobalArgs, ReportFormat};

/// Model description used when a command is given no model path.
pub const DEFAULT_MODEL: &str = "models/model.json";

/// A loaded project: its root, configuration, and model description.
pub struct Project {
    /// Directory containing `blockhdl.toml`.
    pub root: PathBuf,
    /// Parsed configuration.
    pub config: ProjectConfig,
    /// Path the model was read from.
    pub model_path: PathBuf,
    /// Parsed model description.
    pub model: ModelDescription,
}

/// Walks up from `start` looking for the nearest directory containing `blockhdl.toml`.
///
/// Returns the directory containing `blockhdl.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `blockhdl.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Resolves the model path: an explicit path as given, or the project default.
pub fn model_path(root: &Path, explicit: Option<&str>) -> PathBuf {
    match explicit {
        Some(path) => PathBuf::from(path),
        None => root.join(DEFAULT_MODEL),
    }
}

/// Loads the configuration and model for a command.
///
/// Failures are pushed into `sink` as diagnostics; `None` means the command
/// should stop and report.
pub fn load_project(
    global: &GlobalArgs,
    model: Option<&str>,
    sink: &DiagnosticSink,
) -> Result<Option<Project>, Box<dyn std::error::Error>> {
    let root = resolve_project_root(global)?;

    let config = match load_config(&root) {
        Ok(config) => config,
        Err(e) => {
            sink.emit(e.to_diagnostic());
            return Ok(None);
        }
    };

    let model_path = model_path(&root, model);
    if !global.quiet {
        eprintln!("   Loading {}", model_path.display());
    }
    let model = match ModelDescription::load(&model_path) {
        Ok(model) => model,
        Err(e) => {
            sink.emit(e.to_diagnostic());
            return Ok(None);
        }
    };

    Ok(Some(Project {
        root,
        config,
        model_path,
        model,
    }))
}

/// The lowest severity shown for the given verbosity flags.
pub fn min_severity(global: &GlobalArgs) -> Severity {
    if global.verbose {
        Severity::Note
    } else if global.quiet {
        Severity::Error
    } else {
        Severity::Warning
    }
}

/// Renders the diagnostics that pass the verbosity filter.
pub fn render_diagnostics(
    diagnostics: &[Diagnostic],
    format: ReportFormat,
    color: bool,
) -> Vec<String> {
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(color);
            diagnostics.iter().map(|d| renderer.render(d)).collect()
        }
        ReportFormat::Json => diagnostics.iter().map(|d| JsonRenderer.render(d)).collect(),
    }
}

/// Prints the sink's diagnostics and, for text output, a summary line.
///
/// Text goes to stderr. JSON goes to stdout, one diagnostic per line.
pub fn render_and_report(sink: &DiagnosticSink, format: ReportFormat, global: &GlobalArgs) {
    let shown = sink.at_least(min_severity(global));
    for line in render_diagnostics(&shown, format, global.color) {
        match format {
            ReportFormat::Text => eprint!("{line}"),
            ReportFormat::Json => println!("{line}"),
        }
    }

    if !global.quiet && format == ReportFormat::Text {
        eprintln!(
            "   Result: {} error(s), {} warning(s)",
            sink.error_count(),
            sink.warning_count()
        );
    }
}
