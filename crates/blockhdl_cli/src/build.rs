//! `blockhdl build`: the full generation pipeline from model to Verilog.
//!
//! Orchestrates:
//! 1. Load `blockhdl.toml` and the model description
//! 2. Simplify the block graph
//! 3. Resolve wiring
//! 4. Emit core instances and wrap them in the module template
//! 5. Write the module file

use std::fs;
use std::path::{Path, PathBuf};

use blockhdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use blockhdl_netlist::{generate, Generated, ModuleTemplate, Netlist};

use crate::pipeline::{load_project, render_and_report};
use crate::{BuildArgs, GlobalArgs};

/// Runs the `blockhdl build` command.
///
/// Returns exit code 0 on success, 1 on error.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let sink = DiagnosticSink::new();

    let Some(project) = load_project(global, args.model.as_deref(), &sink)? else {
        render_and_report(&sink, args.format, global);
        return Ok(1);
    };

    if !global.quiet {
        eprintln!(
            "   Building {} ({} block(s))",
            project.config.module.name,
            project.model.blocks.len()
        );
    }

    let template = match ModuleTemplate::for_project(&project.config, &project.root) {
        Ok(template) => template,
        Err(e) => {
            sink.emit(e.to_diagnostic());
            render_and_report(&sink, args.format, global);
            return Ok(1);
        }
    };

    let generated = match generate(&project.model, &project.config, &template, &sink) {
        Ok(generated) => generated,
        Err(e) => {
            sink.emit(e.to_diagnostic());
            render_and_report(&sink, args.format, global);
            return Ok(1);
        }
    };

    if !global.quiet {
        print_summary(&generated);
    }

    check_core_sources(&project.root, &generated.netlist, &sink);

    let output = determine_output_path(
        &project.root,
        &project.config.module.name,
        args.output.as_deref(),
    );
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, &generated.verilog)?;

    if !global.quiet {
        eprintln!("     Wrote {}", output.display());
    }

    render_and_report(&sink, args.format, global);
    Ok(if sink.has_errors() { 1 } else { 0 })
}

fn print_summary(generated: &Generated) {
    let stats = &generated.stats;
    if stats.is_noop() {
        eprintln!("   Simplified: nothing to do");
    } else {
        eprintln!(
            "   Simplified: {} splitter(s) removed, {} summation(s) merged",
            stats.splitters_removed, stats.summations_merged
        );
    }
    eprintln!(
        "   Wired: {} block(s), {} wire(s)",
        generated.wired.blocks.len(),
        generated.wired.wires.declared_count()
    );
    eprintln!(
        "   Emitted: {} instance(s) of {} core(s)",
        generated.netlist.instances.len(),
        generated.netlist.cores.len()
    );
}

/// Warns about every used core whose source file is not on disk.
///
/// The module is still written: cores may be supplied later or elsewhere.
fn check_core_sources(root: &Path, netlist: &Netlist, sink: &DiagnosticSink) {
    for (core, path) in &netlist.cores {
        let full_path = root.join(path);
        if !full_path.is_file() {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::warning(301),
                    format!("source for core '{core}' not found"),
                )
                .with_note(format!("expected at {}", full_path.display()))
                .with_help("set `dir` under [cores] in blockhdl.toml to the core library root"),
            );
        }
    }
}

/// Determines the output file path.
///
/// Priority: CLI `--output` > `<project>/build/<module>.v`.
pub fn determine_output_path(project_dir: &Path, module: &str, cli_output: Option<&str>) -> PathBuf {
    match cli_output {
        Some(path) => PathBuf::from(path),
        None => project_dir.join("build").join(format!("{module}.v")),
    }
}
