use crate::engine::Side;
use crate::hasher::HashAlgorithm;
use crate::severity::Severity;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File as ConfigFile};
use glob::Pattern;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;

/// Which side's matched files are archived under the duplicates area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    None,
    #[default]
    SideA,
    SideB,
    Both,
}

impl DuplicatePolicy {
    pub fn archives(self, side: Side) -> bool {
        match self {
            DuplicatePolicy::None => false,
            DuplicatePolicy::SideA => side == Side::A,
            DuplicatePolicy::SideB => side == Side::B,
            DuplicatePolicy::Both => true,
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(DuplicatePolicy::None),
            "a" | "side-a" => Ok(DuplicatePolicy::SideA),
            "b" | "side-b" => Ok(DuplicatePolicy::SideB),
            "both" => Ok(DuplicatePolicy::Both),
            other => Err(format!(
                "unknown duplicate policy '{}' (expected none, side-a, side-b or both)",
                other
            )),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DuplicatePolicy::None => "none",
            DuplicatePolicy::SideA => "side-a",
            DuplicatePolicy::SideB => "side-b",
            DuplicatePolicy::Both => "both",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputNames {
    pub unique_a: String,
    pub unique_b: String,
    pub duplicates: String,
}

impl Default for OutputNames {
    fn default() -> Self {
        Self {
            unique_a: "unique-to-A".to_string(),
            unique_b: "unique-to-B".to_string(),
            duplicates: "duplicates".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub destination: PathBuf,
    /// Pause between downloaded files, in milliseconds.
    pub pause_ms: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("./imported"),
            pause_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub results_root: PathBuf,
    pub output: OutputNames,
    pub duplicate_policy: DuplicatePolicy,
    pub hash_algorithm: HashAlgorithm,
    pub ignore_patterns: Vec<String>,
    pub log_level: Severity,
    pub import: ImportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            results_root: PathBuf::from("./results"),
            output: OutputNames::default(),
            duplicate_policy: DuplicatePolicy::default(),
            hash_algorithm: HashAlgorithm::default(),
            ignore_patterns: Vec::new(),
            log_level: Severity::default(),
            import: ImportConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn layout(&self) -> OutputLayout {
        OutputLayout {
            results_root: self.results_root.clone(),
            unique_a: self.output.unique_a.clone(),
            unique_b: self.output.unique_b.clone(),
            duplicates: self.output.duplicates.clone(),
        }
    }

    pub fn reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig {
            layout: self.layout(),
            duplicate_policy: self.duplicate_policy,
            ignore_patterns: compile_patterns(&self.ignore_patterns),
            materialize: true,
        }
    }
}

/// Reads `Config.toml` from the working directory (optional) and overlays
/// `RECONCILE_*` environment variables, e.g. `RECONCILE_OUTPUT__DUPLICATES`.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder().add_source(ConfigFile::with_name("Config").required(false));
    build(builder)
}

pub fn load_configuration_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder().add_source(ConfigFile::from(path).required(true));
    build(builder)
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
    builder
        .add_source(
            Environment::with_prefix("RECONCILE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?
        .try_deserialize::<AppConfig>()
}

/// Invalid patterns are logged and dropped rather than failing the run.
pub fn compile_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

/// Destination roots of a comparison, all under one results root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub results_root: PathBuf,
    pub unique_a: String,
    pub unique_b: String,
    pub duplicates: String,
}

impl OutputLayout {
    pub fn new(results_root: impl Into<PathBuf>) -> Self {
        let names = OutputNames::default();
        Self {
            results_root: results_root.into(),
            unique_a: names.unique_a,
            unique_b: names.unique_b,
            duplicates: names.duplicates,
        }
    }

    pub fn unique_root(&self, side: Side) -> PathBuf {
        match side {
            Side::A => self.results_root.join(&self.unique_a),
            Side::B => self.results_root.join(&self.unique_b),
        }
    }

    pub fn duplicates_root(&self) -> PathBuf {
        self.results_root.join(&self.duplicates)
    }

    /// Where `side`'s copy of a match is archived. When both sides are kept
    /// each gets its own folder so equal relative paths never collide.
    pub fn duplicates_root_for(&self, side: Side, policy: DuplicatePolicy) -> PathBuf {
        match policy {
            DuplicatePolicy::Both => self.duplicates_root().join(side.to_string()),
            _ => self.duplicates_root(),
        }
    }
}

/// Everything a [`crate::TreeReconciler`] needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub layout: OutputLayout,
    pub duplicate_policy: DuplicatePolicy,
    pub ignore_patterns: Vec<Pattern>,
    /// When false the comparison only classifies and logs; nothing is written.
    pub materialize: bool,
}

impl ReconcileConfig {
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            layout,
            duplicate_policy: DuplicatePolicy::default(),
            ignore_patterns: Vec::new(),
            materialize: true,
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_ignore_patterns(mut self, globs: &[String]) -> Self {
        self.ignore_patterns = compile_patterns(globs);
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.materialize = false;
        self
    }
}
