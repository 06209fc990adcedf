// src/config/validate.rs

use std::path::{Component, Path};

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BuildError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.toolchain, raw.build, raw.variant))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_toolchain(cfg)?;
    validate_build_section(cfg)?;
    validate_patterns(cfg)?;
    validate_variants(cfg)?;
    Ok(())
}

fn validate_toolchain(cfg: &RawConfigFile) -> Result<()> {
    if let Some(cc) = &cfg.toolchain.cc {
        if cc.trim().is_empty() {
            return Err(BuildError::ConfigError(
                "[toolchain].cc must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_build_section(cfg: &RawConfigFile) -> Result<()> {
    let build = &cfg.build;

    if build.out_dir.as_os_str().is_empty() {
        return Err(BuildError::ConfigError(
            "[build].out_dir must not be empty".to_string(),
        ));
    }
    if !is_plain_component(&build.output) {
        return Err(BuildError::ConfigError(format!(
            "[build].output must be a plain file name (got '{}')",
            build.output
        )));
    }
    if build.state_dir.as_os_str().is_empty() {
        return Err(BuildError::ConfigError(
            "[build].state_dir must not be empty".to_string(),
        ));
    }
    if build.state_dir == build.out_dir {
        return Err(BuildError::ConfigError(
            "[build].state_dir and [build].out_dir must differ".to_string(),
        ));
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    if cfg.build.sources.is_empty() {
        return Err(BuildError::ConfigError(
            "[build].sources must contain at least one pattern".to_string(),
        ));
    }

    let all = cfg
        .build
        .sources
        .iter()
        .chain(cfg.build.headers.iter())
        .chain(cfg.build.exclude.iter());
    for pattern in all {
        Glob::new(pattern).map_err(|e| {
            BuildError::ConfigError(format!("invalid glob pattern '{pattern}': {e}"))
        })?;
    }
    Ok(())
}

fn validate_variants(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.variant.keys() {
        if !is_plain_component(name) {
            return Err(BuildError::ConfigError(format!(
                "variant name '{name}' must be a plain directory name"
            )));
        }
        if name == "clean" {
            return Err(BuildError::ConfigError(
                "'clean' is reserved and cannot name a variant".to_string(),
            ));
        }
    }
    Ok(())
}

fn is_plain_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
