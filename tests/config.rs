// tests/config.rs

mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::write_file;

use std::path::PathBuf;

use buildo::config::{ConfigFile, DEFAULT_VARIANT, RawConfigFile, load_and_validate};
use buildo::errors::{BuildError, FaultKind};
use buildo::types::DepMode;

fn parse(text: &str) -> Result<ConfigFile, BuildError> {
    let raw: RawConfigFile = toml::from_str(text)?;
    ConfigFile::try_from(raw)
}

fn assert_config_error(result: Result<ConfigFile, BuildError>, needle: &str) {
    match result {
        Err(BuildError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "expected '{needle}' in '{msg}'")
        }
        Err(other) => panic!("expected ConfigError, got {other:?}"),
        Ok(cfg) => panic!("expected ConfigError, got {cfg:?}"),
    }
}

#[test]
fn empty_file_gives_defaults() {
    let cfg = parse("").unwrap();
    assert_eq!(cfg.toolchain.cc, None);
    assert_eq!(cfg.toolchain.include_dirs, vec![PathBuf::from("inc")]);
    assert_eq!(cfg.toolchain.dep_mode, DepMode::User);
    assert_eq!(cfg.build.out_dir, PathBuf::from("out"));
    assert_eq!(cfg.build.output, "collect");
    assert_eq!(cfg.build.state_dir, PathBuf::from(".env_vars"));

    assert_eq!(cfg.variant_names().collect::<Vec<_>>(), vec![DEFAULT_VARIANT]);
    assert_eq!(cfg.variant[DEFAULT_VARIANT].cflags, vec!["-O2"]);
    assert_eq!(cfg.variant_dir(DEFAULT_VARIANT), PathBuf::from("out"));
}

#[test]
fn missing_file_gives_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = load_and_validate(tmp.path().join("Buildo.toml")).unwrap();
    assert_eq!(cfg.build.output, "collect");
}

#[test]
fn full_file_is_parsed() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(
        tmp.path(),
        "Buildo.toml",
        r#"
[toolchain]
cc = "clang"
include_dirs = ["inc", "third_party/inc"]
dep_mode = "all"

[build]
out_dir = "build"
output = "app"
sources = ["src/**/*.c"]
exclude = ["src/experimental/**"]

[variant.debug]
cflags = ["-O0", "-g"]

[variant.release]
cflags = ["-O2"]
ldflags = ["-s"]
lib_dirs = ["/opt/lib"]
libs = ["m"]
"#,
    );

    let cfg = load_and_validate(tmp.path().join("Buildo.toml")).unwrap();
    assert_eq!(cfg.toolchain.cc.as_deref(), Some("clang"));
    assert_eq!(cfg.toolchain.include_dirs.len(), 2);
    assert_eq!(cfg.toolchain.dep_mode, DepMode::All);
    assert_eq!(cfg.variant_names().collect::<Vec<_>>(), vec!["debug", "release"]);
    assert_eq!(cfg.variant_dir("debug"), PathBuf::from("build/debug"));
    assert_eq!(cfg.variant["release"].libs, vec!["m"]);
    assert_eq!(cfg.build.exclude, vec!["src/experimental/**"]);
}

#[test]
fn unknown_dep_mode_is_a_toml_error() {
    let err = parse("[toolchain]\ndep_mode = \"some\"\n").unwrap_err();
    assert!(matches!(err, BuildError::TomlError(_)), "{err:?}");
    assert_eq!(err.fault_kind(), FaultKind::Configuration);
}

#[test]
fn dep_mode_parses_from_str() {
    assert_eq!("user".parse::<DepMode>().unwrap(), DepMode::User);
    assert_eq!(" ALL ".parse::<DepMode>().unwrap(), DepMode::All);
    assert!("system".parse::<DepMode>().is_err());
    assert_eq!(DepMode::User.flag(), "-MM");
    assert_eq!(DepMode::All.flag(), "-M");
}

#[test]
fn empty_cc_is_rejected() {
    assert_config_error(parse("[toolchain]\ncc = \"  \"\n"), "cc");
}

#[test]
fn output_must_be_a_plain_name() {
    assert_config_error(parse("[build]\noutput = \"bin/app\"\n"), "output");
    assert_config_error(parse("[build]\noutput = \"..\"\n"), "output");
}

#[test]
fn state_dir_must_differ_from_out_dir() {
    assert_config_error(
        parse("[build]\nout_dir = \"out\"\nstate_dir = \"out\"\n"),
        "state_dir",
    );
}

#[test]
fn sources_must_not_be_empty() {
    let raw = ConfigFileBuilder::new().sources(&[]).build_raw();
    assert_config_error(ConfigFile::try_from(raw), "sources");
}

#[test]
fn invalid_globs_are_rejected() {
    let raw = ConfigFileBuilder::new().exclude("src/[oops").build_raw();
    assert_config_error(ConfigFile::try_from(raw), "src/[oops");
}

#[test]
fn variant_names_must_be_plain() {
    let raw = ConfigFileBuilder::new()
        .with_variant("a/b", &["-O1"])
        .build_raw();
    assert_config_error(ConfigFile::try_from(raw), "a/b");
}

#[test]
fn clean_is_a_reserved_variant_name() {
    let raw = ConfigFileBuilder::new().with_variant("clean", &[]).build_raw();
    assert_config_error(ConfigFile::try_from(raw), "reserved");
}

#[test]
fn declared_variants_replace_the_implicit_one() {
    let cfg = ConfigFileBuilder::new()
        .with_variant("debug", &["-g"])
        .build();
    assert_eq!(cfg.variant_names().collect::<Vec<_>>(), vec!["debug"]);
    assert_eq!(cfg.variant_dir("debug"), PathBuf::from("out/debug"));
}
