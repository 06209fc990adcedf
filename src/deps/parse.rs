// src/deps/parse.rs

//! Parser for the make-style rules printed by `cc -M` / `cc -MM`.

use std::collections::HashSet;
use std::path::{Component, PathBuf};

use anyhow::{Result, bail};

/// The first rule of a dependency listing: `target: prerequisites...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeRule {
    pub target: String,
    /// Prerequisites in listing order, without duplicates.
    pub prerequisites: Vec<PathBuf>,
}

/// Parse the output of a dependency-listing toolchain invocation.
///
/// Only the first rule matters. Later rules (the empty phony targets
/// emitted by `-MP`) are ignored.
pub fn parse_make_rule(text: &str) -> Result<MakeRule> {
    let joined = text.replace("\\\r\n", " ").replace("\\\n", " ");

    let Some(line) = joined.lines().map(str::trim).find(|l| !l.is_empty()) else {
        bail!("dependency listing is empty");
    };
    let Some(colon) = find_rule_colon(line) else {
        bail!("no make rule in dependency listing: {line:?}");
    };

    let target = split_dep_tokens(&line[..colon]).join(" ");
    if target.is_empty() {
        bail!("make rule has no target: {line:?}");
    }

    let mut seen = HashSet::new();
    let mut prerequisites = Vec::new();
    for token in split_dep_tokens(&line[colon + 1..]) {
        let path = normalize(&token);
        if seen.insert(path.clone()) {
            prerequisites.push(path);
        }
    }

    Ok(MakeRule {
        target,
        prerequisites,
    })
}

/// Position of the `:` separating target from prerequisites, skipping
/// escaped colons.
fn find_rule_colon(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    (0..bytes.len()).find(|&i| bytes[i] == b':' && (i == 0 || bytes[i - 1] != b'\\'))
}

/// Split a rule half on whitespace, handling backslash-escaped spaces and
/// `$$`.
fn split_dep_tokens(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if matches!(chars.peek(), Some(' ') | Some('#') | Some(':')) => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '$' if chars.peek() == Some(&'$') => {
                chars.next();
                current.push('$');
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Drop `.` components so `./inc/a.h` and `inc/a.h` name the same vertex.
fn normalize(token: &str) -> PathBuf {
    PathBuf::from(token)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
