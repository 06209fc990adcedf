// tests/deps_parse.rs

use std::path::PathBuf;

use buildo::deps::parse_make_rule;

fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

#[test]
fn single_line_rule() {
    let rule = parse_make_rule("a.o: a.c inc/a.h\n").unwrap();
    assert_eq!(rule.target, "a.o");
    assert_eq!(rule.prerequisites, paths(&["a.c", "inc/a.h"]));
}

#[test]
fn continuation_lines_are_joined() {
    let text = "main.o: src/main.c inc/a.h \\\n  inc/b.h \\\n  inc/c.h\n";
    let rule = parse_make_rule(text).unwrap();
    assert_eq!(rule.target, "main.o");
    assert_eq!(
        rule.prerequisites,
        paths(&["src/main.c", "inc/a.h", "inc/b.h", "inc/c.h"])
    );
}

#[test]
fn duplicates_are_dropped_in_order() {
    let rule = parse_make_rule("a.o: a.c inc/a.h ./inc/a.h a.c inc/b.h").unwrap();
    assert_eq!(rule.prerequisites, paths(&["a.c", "inc/a.h", "inc/b.h"]));
}

#[test]
fn escaped_spaces_stay_in_the_path() {
    let rule = parse_make_rule("a.o: a.c my\\ headers/x.h").unwrap();
    assert_eq!(rule.prerequisites, paths(&["a.c", "my headers/x.h"]));
}

#[test]
fn phony_rules_after_the_first_are_ignored() {
    let text = "a.o: a.c inc/a.h\n\ninc/a.h:\n";
    let rule = parse_make_rule(text).unwrap();
    assert_eq!(rule.prerequisites, paths(&["a.c", "inc/a.h"]));
}

#[test]
fn leading_blank_lines_are_skipped() {
    let rule = parse_make_rule("\n\n  a.o: a.c\n").unwrap();
    assert_eq!(rule.target, "a.o");
}

#[test]
fn crlf_continuations_are_joined() {
    let rule = parse_make_rule("a.o: a.c \\\r\n inc/a.h\r\n").unwrap();
    assert_eq!(rule.prerequisites, paths(&["a.c", "inc/a.h"]));
}

#[test]
fn empty_output_is_rejected() {
    assert!(parse_make_rule("").is_err());
    assert!(parse_make_rule("  \n \n").is_err());
}

#[test]
fn output_without_rule_is_rejected() {
    assert!(parse_make_rule("just some text").is_err());
    assert!(parse_make_rule(": a.c").is_err());
}
