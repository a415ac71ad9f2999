//! The module wrapper around the emitted body.
//!
//! A template is plain Verilog text with `{placeholder}` markers. Known
//! placeholders are replaced; anything else in braces, including Verilog
//! concatenations, is left untouched.

use crate::emit::Netlist;
use crate::error::NetlistError;
use blockhdl_config::{ModuleParam, PortsConfig, ProjectConfig};
use std::collections::BTreeMap;
use std::path::Path;

/// The template used when the project does not name one.
pub const DEFAULT_TEMPLATE: &str = "\
// {module_name}: generated by blockhdl {version}
// Cores: {used_cores}

module {module_name}{module_params} ({module_ports});

{body}endmodule
";

/// A module template ready to be filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTemplate {
    text: String,
}

impl Default for ModuleTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl ModuleTemplate {
    /// Wraps template text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Reads a template file.
    pub fn load(path: &Path) -> Result<Self, NetlistError> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    /// The project's template: `module.template` relative to `root`, or the default.
    pub fn for_project(config: &ProjectConfig, root: &Path) -> Result<Self, NetlistError> {
        match &config.module.template {
            Some(path) => Self::load(&root.join(path)),
            None => Ok(Self::default()),
        }
    }

    /// Renders the complete module.
    pub fn render(&self, config: &ProjectConfig, netlist: &Netlist) -> String {
        let values = BTreeMap::from([
            ("module_name", config.module.name.clone()),
            ("module_params", module_params(&config.module.params)),
            ("module_ports", module_ports(&config.ports)),
            ("body", netlist.body()),
            ("used_cores", netlist.used_cores()),
            ("version", env!("CARGO_PKG_VERSION").to_string()),
        ]);
        fill(&self.text, &values)
    }
}

/// Replaces every `{key}` whose key is in `values`; leaves all other text as is.
pub fn fill(template: &str, values: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let value = after
            .find('}')
            .and_then(|end| values.get(&after[..end]).map(|v| (v, end)));
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Renders the `#(parameter ...)` list, or nothing when there are no parameters.
pub fn module_params(params: &[ModuleParam]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let list = params
        .iter()
        .map(|p| format!("    {} = {}", p.name, p.value))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(" #(\n    parameter\n{list}\n)")
}

/// Renders the port list: clock, reset, and the data input and output.
pub fn module_ports(ports: &PortsConfig) -> String {
    let lines = [
        "    input clk".to_string(),
        "    input reset".to_string(),
        format!("    input [{}:0] in", ports.input.width().saturating_sub(1)),
        format!("    output [{}:0] out", ports.output.width().saturating_sub(1)),
    ];
    format!("\n{}\n", lines.join(",\n"))
}
