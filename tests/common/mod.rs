#![allow(dead_code)]

pub use buildo_test_utils::builders;
pub use buildo_test_utils::clock::MemoryClock;
pub use buildo_test_utils::fake_runner::FakeRunner;
pub use buildo_test_utils::init_tracing;

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
}

/// Move the mtime of `root/rel` by `secs` seconds into the past.
///
/// Filesystem timestamps can be coarse; backdating fixtures keeps
/// "newer than" comparisons unambiguous without sleeping.
pub fn backdate(root: &Path, rel: &str, secs: u64) {
    let file = fs::File::options()
        .write(true)
        .open(root.join(rel))
        .unwrap();
    let when = SystemTime::now() - Duration::from_secs(secs);
    file.set_modified(when).unwrap();
}

/// Install an executable shell script at `root/rel`.
#[cfg(unix)]
pub fn write_script(root: &Path, rel: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    write_file(root, rel, body);
    let path = root.join(rel);
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// A stand-in C compiler driver understanding just enough to build the
/// fixtures: `-MM`/`-M` listings, `-c` compiles and links. Every invocation
/// is appended to `cc.log` next to the script.
///
/// Sources containing `BROKEN` fail dependency listing; sources containing
/// `FAIL` fail to compile.
pub const FAKE_CC: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/cc.log"
case "$1" in
  -MM|-M)
    for last; do :; done
    if grep -q BROKEN "$last"; then
      echo "$last:1:10: fatal error: cannot list dependencies" >&2
      exit 1
    fi
    base=$(basename "$last" .c)
    printf '%s.o: %s' "$base" "$last"
    grep -o '#include "[^"]*"' "$last" | sed 's/#include "\(.*\)"/ inc\/\1/' | tr -d '\n'
    echo
    ;;
  -c)
    if grep -q FAIL "$4"; then
      echo "$4:1:1: error: FAIL" >&2
      exit 1
    fi
    cat "$4" > "$3"
    ;;
  *)
    out=""
    prev=""
    for a; do
      if [ "$prev" = "-o" ]; then out="$a"; fi
      prev="$a"
    done
    echo linked > "$out"
    ;;
esac
"#;

/// Install [`FAKE_CC`] as `<dir>/<name>` and return its absolute path.
#[cfg(unix)]
pub fn install_fake_cc(dir: &Path, name: &str) -> String {
    write_script(dir, name, FAKE_CC)
        .to_string_lossy()
        .into_owned()
}

/// Lines of `cc.log` written by fake compilers installed in `dir`.
pub fn cc_log(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("cc.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Shift the mtime of every file under `root` `secs` seconds into the past,
/// keeping their relative order.
pub fn shift_back(root: &Path, secs: u64) {
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() {
            continue;
        }
        let mtime = entry.metadata().unwrap().modified().unwrap();
        let file = fs::File::options().write(true).open(entry.path()).unwrap();
        file.set_modified(mtime - Duration::from_secs(secs)).unwrap();
    }
}
