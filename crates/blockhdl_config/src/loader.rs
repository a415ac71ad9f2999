//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{PortConfig, PortKind, ProjectConfig, SIGMA_DELTA_WIDTH};
use std::collections::BTreeSet;
use std::path::Path;

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "blockhdl.toml";

/// Loads and validates a `blockhdl.toml` configuration from a project directory.
///
/// Reads `<project_dir>/blockhdl.toml`, parses it, and validates required fields.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `blockhdl.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.module.name.is_empty() {
        return Err(ConfigError::MissingField("module.name".to_string()));
    }

    let mut seen = BTreeSet::new();
    for param in &config.module.params {
        if param.name.is_empty() {
            return Err(ConfigError::MissingField("module.params.name".to_string()));
        }
        if !seen.insert(param.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "module parameter '{}' is declared twice",
                param.name
            )));
        }
    }

    validate_port("input", &config.ports.input)?;
    validate_port("output", &config.ports.output)?;

    if config.cores.dir.is_empty() {
        return Err(ConfigError::MissingField("cores.dir".to_string()));
    }
    if config.cores.modulator.is_empty() {
        return Err(ConfigError::MissingField("cores.modulator".to_string()));
    }
    if let Some((kind, _)) = config.cores.map.iter().find(|(_, core)| core.is_empty()) {
        return Err(ConfigError::ValidationError(format!(
            "empty core name for {kind}"
        )));
    }
    if let Some(kind) = config.cores.map.keys().find(|k| k.is_structural()) {
        return Err(ConfigError::ValidationError(format!(
            "{kind} blocks are removed before emission and cannot map to a core"
        )));
    }
    Ok(())
}

fn validate_port(which: &str, port: &PortConfig) -> Result<(), ConfigError> {
    match (port.kind, port.width) {
        (PortKind::Normal, None) => Err(ConfigError::MissingField(format!(
            "ports.{which}.width"
        ))),
        (PortKind::Normal, Some(0)) => Err(ConfigError::ValidationError(format!(
            "ports.{which}.width must be at least 1"
        ))),
        (PortKind::SigmaDelta, Some(w)) if w != SIGMA_DELTA_WIDTH => {
            Err(ConfigError::ValidationError(format!(
                "sigma-delta port ports.{which} is always {SIGMA_DELTA_WIDTH} bits wide, got {w}"
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockhdl_graph::BlockKind;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[module]
name = "regulator"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.module.name, "regulator");
        assert!(config.module.template.is_none());
        assert!(config.module.params.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[module]
name = "pid"
template = "templates/module.vt"

[[module.params]]
name = "WIDTH"
value = 8

[ports.input]
kind = "normal"
width = 8

[ports.output]
kind = "sigma-delta"

[cores]
dir = "lib/cores"
modulator = "sd_mod2"

[cores.map]
GAIN_f = "sd_mult_2in"
SUM_f = "sd_adder"
DIFF_f = "sd_diff"
INTEGRAL_f = "sd_integrator"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.module.name, "pid");
        assert_eq!(config.module.template.as_deref(), Some("templates/module.vt"));
        assert_eq!(config.module.params.len(), 1);
        assert_eq!(config.ports.input.width(), 8);
        assert_eq!(config.ports.output.kind, PortKind::SigmaDelta);
        assert_eq!(config.cores.dir, "lib/cores");
        assert_eq!(config.cores.modulator, "sd_mod2");
        assert_eq!(config.cores.map.len(), 4);
        assert_eq!(config.cores.map[&BlockKind::Differentiator], "sd_diff");
    }

    #[test]
    fn missing_module_section_errors() {
        let err = load_config_from_str("[cores]\ndir = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn empty_name_errors() {
        let err = load_config_from_str("[module]\nname = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "module.name"));
    }

    #[test]
    fn normal_port_without_width_errors() {
        let toml = r#"
[module]
name = "m"

[ports.input]
kind = "normal"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "ports.input.width"));
    }

    #[test]
    fn zero_width_errors() {
        let toml = r#"
[module]
name = "m"

[ports.output]
kind = "normal"
width = 0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn sigma_delta_width_mismatch_errors() {
        let toml = r#"
[module]
name = "m"

[ports.input]
kind = "sigma-delta"
width = 4
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn duplicate_param_errors() {
        let toml = r#"
[module]
name = "m"

[[module.params]]
name = "A"
value = 1

[[module.params]]
name = "A"
value = 2
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(m) if m.contains("'A'")));
    }

    #[test]
    fn unknown_kind_in_map_errors() {
        let toml = r#"
[module]
name = "m"

[cores.map]
CLOCK_c = "sd_clock"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn splitter_mapping_errors() {
        let toml = r#"
[module]
name = "m"

[cores.map]
SPLIT = "sd_split"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_core_name_errors() {
        let toml = r#"
[module]
name = "m"

[cores.map]
SUM_f = ""
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[module]\nname = \"from_disk\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.module.name, "from_disk");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
