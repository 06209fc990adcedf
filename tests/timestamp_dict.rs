// tests/timestamp_dict.rs

mod common;
use crate::common::backdate;

use buildo::errors::BuildError;
use buildo::store::TimestampDict;

#[test]
fn load_creates_missing_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join(".env_vars");

    let dict = TimestampDict::load(&dir).unwrap();
    assert!(dir.is_dir());
    assert_eq!(dict.keys().count(), 0);
    assert_eq!(dict.get("cc"), None);
    assert_eq!(dict.time("cc"), None);
}

#[test]
fn values_survive_reload() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("state");

    let mut dict = TimestampDict::load(&dir).unwrap();
    assert!(dict.set("cc", "gcc").unwrap());
    assert!(dict.set("cflags.default", "-O2 -Wall").unwrap());
    let written = dict.time("cc").unwrap();

    let reloaded = TimestampDict::load(&dir).unwrap();
    assert_eq!(reloaded.get("cc"), Some("gcc"));
    assert_eq!(reloaded.get("cflags.default"), Some("-O2 -Wall"));
    assert_eq!(reloaded.time("cc"), Some(written));
    assert_eq!(reloaded.keys().collect::<Vec<_>>(), vec!["cc", "cflags.default"]);
}

#[test]
fn trailing_newline_is_not_part_of_the_value() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("cc"), "clang\n").unwrap();

    let mut dict = TimestampDict::load(tmp.path()).unwrap();
    assert_eq!(dict.get("cc"), Some("clang"));
    assert!(!dict.set("cc", "clang").unwrap());
}

#[test]
fn values_ending_in_newline_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let mut dict = TimestampDict::load(tmp.path()).unwrap();
    assert!(dict.set("ldflags.default", "-lm\n").unwrap());
    backdate(tmp.path(), "ldflags.default", 60);

    let mut dict = TimestampDict::load(tmp.path()).unwrap();
    let before = dict.time("ldflags.default").unwrap();
    assert_eq!(dict.get("ldflags.default"), Some("-lm\n"));
    assert!(!dict.set("ldflags.default", "-lm\n").unwrap());
    assert_eq!(dict.time("ldflags.default"), Some(before));
}

#[test]
fn unchanged_value_keeps_timestamp() {
    let tmp = tempfile::tempdir().unwrap();
    let mut dict = TimestampDict::load(tmp.path()).unwrap();
    dict.set("cc", "gcc").unwrap();
    backdate(tmp.path(), "cc", 60);

    let mut dict = TimestampDict::load(tmp.path()).unwrap();
    let before = dict.time("cc").unwrap();
    assert!(!dict.set("cc", "gcc").unwrap());
    assert_eq!(dict.time("cc"), Some(before));
}

#[test]
fn changed_value_bumps_timestamp() {
    let tmp = tempfile::tempdir().unwrap();
    let mut dict = TimestampDict::load(tmp.path()).unwrap();
    dict.set("cc", "gcc").unwrap();
    backdate(tmp.path(), "cc", 60);

    let mut dict = TimestampDict::load(tmp.path()).unwrap();
    let before = dict.time("cc").unwrap();
    assert!(dict.set("cc", "clang").unwrap());
    assert!(dict.time("cc").unwrap() > before);
    assert_eq!(dict.get("cc"), Some("clang"));
}

#[test]
fn names_are_stable_pseudo_vertex_ids() {
    let tmp = tempfile::tempdir().unwrap();
    let dict = TimestampDict::load(tmp.path()).unwrap();
    assert_eq!(dict.name("cc"), "config:cc");
    assert_eq!(dict.name("cc"), dict.name("cc"));
    assert_ne!(dict.name("cc"), dict.name("cflags.default"));
}

#[test]
fn keys_must_be_file_names() {
    let tmp = tempfile::tempdir().unwrap();
    let mut dict = TimestampDict::load(tmp.path()).unwrap();

    for key in ["", ".", "..", "a/b", "a\\b"] {
        let err = dict.set(key, "x").unwrap_err();
        assert!(matches!(err, BuildError::ConfigError(_)), "key {key:?}");
    }
    assert_eq!(dict.keys().count(), 0);
}

#[test]
fn subdirectories_are_ignored_on_load() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir(tmp.path().join("nested")).unwrap();
    std::fs::write(tmp.path().join("cc"), "gcc").unwrap();

    let dict = TimestampDict::load(tmp.path()).unwrap();
    assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["cc"]);
}
