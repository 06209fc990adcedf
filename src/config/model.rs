// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::DepMode;

/// Name of the variant used when the project file declares none.
pub const DEFAULT_VARIANT: &str = "default";

/// Top-level project configuration as read from `Buildo.toml`.
///
/// ```toml
/// [toolchain]
/// cc = "gcc"
/// include_dirs = ["inc"]
///
/// [build]
/// out_dir = "out"
/// output = "collect"
///
/// [variant.debug]
/// cflags = ["-O0", "-g"]
/// ```
///
/// All sections are optional and have defaults matching a flat C project
/// with headers in `inc/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub toolchain: ToolchainSection,

    #[serde(default)]
    pub build: BuildSection,

    /// Build variants from `[variant.<name>]`.
    #[serde(default)]
    pub variant: BTreeMap<String, VariantConfig>,
}

/// Validated configuration; only constructible through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub toolchain: ToolchainSection,
    pub build: BuildSection,
    /// Never empty: an implicit `default` variant is added when the file
    /// declares none.
    pub variant: BTreeMap<String, VariantConfig>,
    implicit_variant: bool,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        toolchain: ToolchainSection,
        build: BuildSection,
        mut variant: BTreeMap<String, VariantConfig>,
    ) -> Self {
        let implicit_variant = variant.is_empty();
        if implicit_variant {
            variant.insert(DEFAULT_VARIANT.to_string(), VariantConfig::implicit());
        }
        Self {
            toolchain,
            build,
            variant,
            implicit_variant,
        }
    }

    /// Directory (relative to the project root) that holds a variant's
    /// objects and output.
    ///
    /// The implicit default variant builds straight into `out_dir`.
    pub fn variant_dir(&self, name: &str) -> PathBuf {
        if self.implicit_variant {
            self.build.out_dir.clone()
        } else {
            self.build.out_dir.join(name)
        }
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variant.keys().map(|k| k.as_str())
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            ToolchainSection::default(),
            BuildSection::default(),
            BTreeMap::new(),
        )
    }
}

/// `[toolchain]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolchainSection {
    /// Compiler driver. When omitted the persisted value (or `gcc`) is used.
    #[serde(default)]
    pub cc: Option<String>,

    #[serde(default = "default_include_dirs")]
    pub include_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub dep_mode: DepMode,
}

fn default_include_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("inc")]
}

impl Default for ToolchainSection {
    fn default() -> Self {
        Self {
            cc: None,
            include_dirs: default_include_dirs(),
            dep_mode: DepMode::default(),
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// File name of the linked artifact inside each variant directory.
    #[serde(default = "default_output")]
    pub output: String,

    /// Where persisted configuration values live.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    #[serde(default = "default_headers")]
    pub headers: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_output() -> String {
    "collect".to_string()
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".env_vars")
}

fn default_sources() -> Vec<String> {
    vec!["**/*.c".to_string()]
}

fn default_headers() -> Vec<String> {
    vec!["**/*.h".to_string()]
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            output: default_output(),
            state_dir: default_state_dir(),
            sources: default_sources(),
            headers: default_headers(),
            exclude: Vec::new(),
        }
    }
}

/// `[variant.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantConfig {
    #[serde(default)]
    pub cflags: Vec<String>,

    #[serde(default)]
    pub ldflags: Vec<String>,

    #[serde(default)]
    pub lib_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub libs: Vec<String>,
}

impl VariantConfig {
    fn implicit() -> Self {
        Self {
            cflags: vec!["-O2".to_string()],
            ..Self::default()
        }
    }
}
