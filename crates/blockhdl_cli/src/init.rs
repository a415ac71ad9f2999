//! `blockhdl init`: project scaffolding command.
//!
//! Creates a new project directory with a `blockhdl.toml` mapping the
//! standard sigma-delta core library, a sample model in `models/`, and the
//! default module template in `templates/`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use blockhdl_config::{CoresConfig, CONFIG_FILE};
use blockhdl_netlist::DEFAULT_TEMPLATE;

use crate::pipeline::DEFAULT_MODEL;
use crate::GlobalArgs;

/// Template file written by `init` and referenced from `blockhdl.toml`.
const TEMPLATE_FILE: &str = "templates/module.vt";

/// Gain into a summation with the module input, into a differentiator.
const SAMPLE_MODEL: &str = r#"{
  "name": "gain-sum-diff",
  "blocks": [
    { "id": "gain", "kind": "GAIN_f", "gain": 2.0 },
    { "id": "sum", "kind": "SUM_f" },
    { "id": "diff", "kind": "DIFF_f" }
  ],
  "links": [
    { "source": "gain", "target": "sum" },
    { "source": "in", "target": "sum" },
    { "source": "sum", "target": "diff" },
    { "source": "diff", "target": "out" }
  ]
}
"#;

/// Runs the `blockhdl init` command.
///
/// If `name` is `Some`, creates a new subdirectory with that name.
/// Otherwise initializes in the current working directory.
/// Returns exit code 0 on success.
pub fn run(name: Option<String>, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = match &name {
        Some(n) => {
            let dir = PathBuf::from(n);
            if dir.exists() {
                return Err(format!("directory '{}' already exists", n).into());
            }
            fs::create_dir_all(&dir)?;
            dir
        }
        None => std::env::current_dir()?,
    };

    if project_dir.join(CONFIG_FILE).exists() {
        return Err(format!(
            "{} already exists in {}",
            CONFIG_FILE,
            project_dir.display()
        )
        .into());
    }

    let project_name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("blockhdl_project");
    let module = module_identifier(project_name);

    if !global.quiet {
        eprintln!("  Creating new blockhdl project `{project_name}`");
    }

    for dir in ["models", "templates"] {
        fs::create_dir_all(project_dir.join(dir))?;
    }
    write_config(&project_dir, &module)?;
    fs::write(project_dir.join(DEFAULT_MODEL), SAMPLE_MODEL)?;
    fs::write(project_dir.join(TEMPLATE_FILE), DEFAULT_TEMPLATE)?;

    if !global.quiet {
        for file in [CONFIG_FILE, DEFAULT_MODEL, TEMPLATE_FILE] {
            eprintln!("     Created {}", project_dir.join(file).display());
        }
    }

    Ok(0)
}

/// Turns a directory name into a legal Verilog module identifier.
fn module_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !ident.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        ident.insert(0, '_');
    }
    ident
}

/// Writes `blockhdl.toml` with the standard core map.
fn write_config(root: &Path, module: &str) -> io::Result<()> {
    let mut content = format!(
        r#"[module]
name = "{module}"
template = "{TEMPLATE_FILE}"

[ports.input]
kind = "sigma-delta"

[ports.output]
kind = "sigma-delta"

[cores]
dir = "cores"
modulator = "sd_modulator"

[cores.map]
"#
    );
    for (kind, core) in CoresConfig::standard_map() {
        content.push_str(&format!("{} = \"{core}\"\n", kind.model_name()));
    }
    fs::write(root.join(CONFIG_FILE), content)
}
