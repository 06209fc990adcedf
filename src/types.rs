// src/types.rs

use std::str::FromStr;

use serde::Deserialize;

/// Which headers the toolchain's dependency listing should report.
///
/// - `User`: only headers found through the include path (`-MM`); system
///   headers are assumed never to change between runs (default).
/// - `All`: every header, system ones included (`-M`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepMode {
    User,
    All,
}

impl Default for DepMode {
    fn default() -> Self {
        DepMode::User
    }
}

impl DepMode {
    /// Flag passed to the toolchain to request a make-style dependency rule.
    pub fn flag(self) -> &'static str {
        match self {
            DepMode::User => "-MM",
            DepMode::All => "-M",
        }
    }
}

impl FromStr for DepMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(DepMode::User),
            "all" => Ok(DepMode::All),
            other => Err(format!(
                "invalid dep_mode: {other} (expected \"user\" or \"all\")"
            )),
        }
    }
}
