use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Log severity, ordered from most to least restrictive.
///
/// A logger configured at a given level emits every message at that level or
/// a more restrictive one: `Info` shows errors and info, `Verbose` shows all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error = 1,
    #[default]
    Info = 2,
    #[serde(alias = "debug")]
    Verbose = 3,
}

impl Severity {
    /// Equivalent `tracing` filter directive.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Info => "info",
            Severity::Verbose => "debug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Error => "Error",
            Severity::Info => "Info",
            Severity::Verbose => "Verbose",
        };
        f.write_str(name)
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "info" => Ok(Severity::Info),
            "verbose" | "debug" => Ok(Severity::Verbose),
            other => Err(format!(
                "unknown log level '{}' (expected error, info or verbose)",
                other
            )),
        }
    }
}
