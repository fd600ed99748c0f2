//! Tests for processing several files in one invocation.

use tempfile::tempdir;

#[macro_use]
mod prelude;
use prelude::*;

#[test]
fn output_follows_argument_order() {
    let dir = tempdir().expect("failed to create temporary directory");
    let mut files = Vec::new();
    let mut expected = String::new();
    for i in 0..6 {
        let path = write_doc(&dir, &format!("file{i}.md"), &format!("# H{i}\n$$ x = {i} $$\n"));
        expected.push_str(&format!("# H{i}\n$$ x = {i} \\tag{{1.1}} $$\n"));
        files.push(path);
    }
    eqcite()
        .arg("number")
        .args(&files)
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn failing_file_does_not_hide_others() {
    let dir = tempdir().expect("failed to create temporary directory");
    let good = write_doc(&dir, "good.md", "$$ a $$\n");
    let missing = dir.path().join("missing.md");
    eqcite()
        .arg("number")
        .arg(&good)
        .arg(&missing)
        .assert()
        .failure()
        .stdout("$$ a \\tag{P1} $$\n")
        .stderr(predicate::str::contains("missing.md"));
}

#[test]
fn in_place_rewrites_every_file() {
    let dir = tempdir().expect("failed to create temporary directory");
    let paths: Vec<_> = (0..4)
        .map(|i| write_doc(&dir, &format!("doc{i}.md"), "![[a.png]]\n![[b.png]]\n"))
        .collect();
    eqcite()
        .args(["number", "--figures", "--in-place"])
        .args(&paths)
        .assert()
        .success();
    for path in paths {
        assert_eq!(
            std::fs::read_to_string(path).expect("failed to read rewritten file"),
            "![[a.png|fig:P1]]\n![[b.png|fig:P2]]\n"
        );
    }
}
