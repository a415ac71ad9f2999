//! Configuration types deserialized from `blockhdl.toml`.

use blockhdl_graph::BlockKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Bit width of a sigma-delta bitstream port.
pub const SIGMA_DELTA_WIDTH: u32 = 2;

/// The top-level project configuration parsed from `blockhdl.toml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// The generated Verilog module.
    pub module: ModuleConfig,
    /// Boundary port encodings.
    #[serde(default)]
    pub ports: PortsConfig,
    /// Where hardware cores live and which kind maps to which core.
    #[serde(default)]
    pub cores: CoresConfig,
}

/// Settings for the generated module wrapper.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModuleConfig {
    /// The Verilog module name.
    pub name: String,
    /// Path to a custom module template, relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Module-level `parameter` declarations, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ModuleParam>,
}

/// One module-level parameter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModuleParam {
    /// Parameter name.
    pub name: String,
    /// Default value.
    pub value: ParamValue,
}

/// A parameter value as written in the project file.
///
/// Accepts `value = 8`, `value = 0.5`, or `value = "WIDTH + 1"`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// An integer literal.
    Integer(i64),
    /// A real literal.
    Real(f64),
    /// A Verilog expression, emitted verbatim.
    Expr(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(v) => write!(f, "{v}"),
            ParamValue::Real(v) => write!(f, "{v}"),
            ParamValue::Expr(v) => f.write_str(v),
        }
    }
}

/// Encodings of the module's data input and output.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PortsConfig {
    /// The `in` port.
    #[serde(default)]
    pub input: PortConfig,
    /// The `out` port.
    #[serde(default)]
    pub output: PortConfig,
}

/// Encoding of a single boundary port.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PortConfig {
    /// Signal encoding.
    #[serde(default)]
    pub kind: PortKind,
    /// Bus width for `normal` ports. Sigma-delta ports are always two bits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

impl PortConfig {
    /// The bus width of this port in bits.
    pub fn width(&self) -> u32 {
        match self.kind {
            PortKind::SigmaDelta => SIGMA_DELTA_WIDTH,
            PortKind::Normal => self.width.unwrap_or(SIGMA_DELTA_WIDTH),
        }
    }

    /// Whether a binary input must pass through a modulator first.
    pub fn needs_modulator(&self) -> bool {
        self.kind == PortKind::Normal
    }
}

/// How a boundary port encodes its value.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PortKind {
    /// Two-bit sigma-delta bitstream (default).
    #[default]
    SigmaDelta,
    /// Plain binary bus of a configured width.
    Normal,
}

/// The hardware core library and the kind-to-core association table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoresConfig {
    /// Root directory of the core library.
    #[serde(default = "default_cores_dir")]
    pub dir: String,
    /// Core inserted in front of a `normal` input.
    #[serde(default = "default_modulator")]
    pub modulator: String,
    /// Which core implements each block kind.
    #[serde(default)]
    pub map: BTreeMap<BlockKind, String>,
}

fn default_cores_dir() -> String {
    "cores".to_string()
}

fn default_modulator() -> String {
    "sd_modulator".to_string()
}

impl Default for CoresConfig {
    fn default() -> Self {
        Self {
            dir: default_cores_dir(),
            modulator: default_modulator(),
            map: BTreeMap::new(),
        }
    }
}

/// A resolved association: the core implementing a kind and its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreAssociation {
    /// Core module name, e.g. `sd_adder`.
    pub name: String,
    /// Core source path, `<dir>/<core>/hdl/<core>.v`.
    pub path: PathBuf,
}

impl CoresConfig {
    /// The standard sigma-delta core library mapping.
    pub fn standard_map() -> BTreeMap<BlockKind, String> {
        [
            (BlockKind::Integrator, "sd_integrator"),
            (BlockKind::Differentiator, "sd_diff"),
            (BlockKind::Gain, "sd_mult_2in"),
            (BlockKind::Summation, "sd_adder"),
        ]
        .into_iter()
        .map(|(kind, core)| (kind, core.to_string()))
        .collect()
    }

    /// Looks up the core for `kind`.
    pub fn association(&self, kind: BlockKind) -> Option<CoreAssociation> {
        self.map.get(&kind).map(|core| self.resolve(core))
    }

    /// The association for the input modulator core.
    pub fn modulator_association(&self) -> CoreAssociation {
        self.resolve(&self.modulator)
    }

    fn resolve(&self, core: &str) -> CoreAssociation {
        CoreAssociation {
            name: core.to_string(),
            path: PathBuf::from(&self.dir)
                .join(core)
                .join("hdl")
                .join(format!("{core}.v")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;
    use std::path::Path;

    const MINIMAL: &str = r#"
[module]
name = "regulator"
"#;

    #[test]
    fn defaults_are_sigma_delta() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.ports.input.kind, PortKind::SigmaDelta);
        assert_eq!(config.ports.input.width(), 2);
        assert_eq!(config.ports.output.width(), 2);
        assert!(!config.ports.input.needs_modulator());
        assert_eq!(config.cores.dir, "cores");
        assert_eq!(config.cores.modulator, "sd_modulator");
        assert!(config.cores.map.is_empty());
    }

    #[test]
    fn normal_port_width() {
        let toml = r#"
[module]
name = "regulator"

[ports.input]
kind = "normal"
width = 12
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.ports.input.kind, PortKind::Normal);
        assert_eq!(config.ports.input.width(), 12);
        assert!(config.ports.input.needs_modulator());
    }

    #[test]
    fn param_values_of_each_shape() {
        let toml = r#"
[module]
name = "regulator"

[[module.params]]
name = "A"
value = 1

[[module.params]]
name = "B"
value = 0.25

[[module.params]]
name = "C"
value = "A + 1"
"#;
        let config = load_config_from_str(toml).unwrap();
        let rendered: Vec<String> = config
            .module
            .params
            .iter()
            .map(|p| format!("{} = {}", p.name, p.value))
            .collect();
        assert_eq!(rendered, vec!["A = 1", "B = 0.25", "C = A + 1"]);
    }

    #[test]
    fn association_builds_core_path() {
        let toml = r#"
[module]
name = "regulator"

[cores]
dir = "/opt/sc_cores"

[cores.map]
SUM_f = "sd_adder"
gain = "sd_mult_2in"
"#;
        let config = load_config_from_str(toml).unwrap();
        let adder = config.cores.association(BlockKind::Summation).unwrap();
        assert_eq!(adder.name, "sd_adder");
        assert_eq!(adder.path, Path::new("/opt/sc_cores/sd_adder/hdl/sd_adder.v"));
        assert_eq!(
            config.cores.association(BlockKind::Gain).unwrap().name,
            "sd_mult_2in"
        );
        assert!(config.cores.association(BlockKind::Integrator).is_none());
    }

    #[test]
    fn modulator_association_uses_dir() {
        let cores = CoresConfig::default();
        assert_eq!(
            cores.modulator_association().path,
            Path::new("cores/sd_modulator/hdl/sd_modulator.v")
        );
    }

    #[test]
    fn standard_map_covers_every_instance_kind() {
        let map = CoresConfig::standard_map();
        for kind in BlockKind::ALL {
            assert_eq!(map.contains_key(&kind), !kind.is_structural());
        }
    }

    #[test]
    fn config_serializes_back_to_toml() {
        let mut config = load_config_from_str(MINIMAL).unwrap();
        config.cores.map = CoresConfig::standard_map();
        let text = toml::to_string(&config).unwrap();
        let back = load_config_from_str(&text).unwrap();
        assert_eq!(back.cores.map, config.cores.map);
        assert_eq!(back.module.name, "regulator");
    }
}
