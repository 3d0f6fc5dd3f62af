//! End-to-end CLI tests: spawn the built `linkres` binary against
//! temporary catalog/source files and check its stdout/exit code.

use std::io::Write;
use std::process::Command;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_linkres"))
}

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn link_matches_acronym_and_exact_variant() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_file(
        &dir,
        "catalog.txt",
        "Ecole Superieure de Physique et Chimie Industrielles|ESPCI\n\
         Nanovation Societe a responsabilite limitee|Nanovation SARL\n",
    );
    let input = write_file(
        &dir,
        "input.csv",
        "doc_id,label\n\
         d1,\"ESPCI, 10 rue Vauquelin, 75231 Paris cedex 05\"\n\
         d3,Nanovation SARL\n",
    );

    let output = bin()
        .args(["link", "--reference"])
        .arg(&catalog)
        .arg("--input")
        .arg(&input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Ecole Superieure de Physique et Chimie Industrielles"));
    assert!(stdout.contains("Nanovation Societe a responsabilite limitee"));
}

#[test]
fn assign_is_one_to_one_within_a_block() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_file(&dir, "catalog.txt", "Chimie|Metiers de la chimie\n");
    let input = write_file(
        &dir,
        "input.csv",
        "doc_id,label\nd1,Metiers de la chimie\nd2,Metiers de la chimie\n",
    );

    let output = bin()
        .args(["assign", "--reference"])
        .arg(&catalog)
        .arg("--input")
        .arg(&input)
        .arg("--no-country-block")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let matched_rows = stdout
        .lines()
        .skip(1)
        .filter(|line| line.contains("Chimie"))
        .count();
    assert_eq!(matched_rows, 1, "stdout:\n{stdout}");
}

#[test]
fn link_reports_stats_summary() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_file(&dir, "catalog.txt", "Chimie\n");
    let input = write_file(&dir, "input.csv", "doc_id,label\nd1,Chimie\n");

    let output = bin()
        .args(["link", "--reference"])
        .arg(&catalog)
        .arg("--input")
        .arg(&input)
        .arg("--stats")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("1/1 items produced a top candidate"));
}

#[test]
fn missing_input_file_exits_with_input_error_code() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_file(&dir, "catalog.txt", "Chimie\n");

    let output = bin()
        .args(["link", "--reference"])
        .arg(&catalog)
        .arg("--input")
        .arg(dir.path().join("missing.csv"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn show_ambiguous_lists_aliases_shared_by_two_entries() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_file(
        &dir,
        "catalog.txt",
        "First Entry|shared alias\nSecond Entry|shared alias\n",
    );

    let output = bin()
        .args(["show-ambiguous", "--reference"])
        .arg(&catalog)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("shared alias"));
    assert!(stdout.contains("First Entry"));
    assert!(stdout.contains("Second Entry"));
}

#[test]
fn show_unexpected_lists_rows_with_no_surviving_token() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(
        &dir,
        "input.csv",
        "doc_id,label\nd1,Chimie\nd2,1234\n",
    );

    let output = bin()
        .args(["show-unexpected", "--input"])
        .arg(&input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("d2"));
    assert!(!stdout.contains("d1\t"));
}
