//! Smoke tests for the command-line interface.

use assert_cmd::Command;
use predicates::prelude::*;

const SAMPLE: &str = r#"<nexml xmlns="http://www.nexml.org/2009"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <otus id="tax1" label="primates">
        <otu id="t1" label="Homo sapiens"/>
        <otu id="t2" label="Pan troglodytes"/>
    </otus>
    <characters id="c1" otus="tax1" xsi:type="nex:DnaSeqs">
        <matrix>
            <row id="r1" otu="t1"><seq>ACGT</seq></row>
            <row id="r2" otu="t2"><seq>ACGA</seq></row>
        </matrix>
    </characters>
    <trees id="g1" otus="tax1">
        <tree id="tr1" xsi:type="nex:FloatTree">
            <node id="n1" otu="t1"/>
            <node id="n2" otu="t2"/>
            <node id="n3"/>
            <edge id="e1" source="n3" target="n1" length="0.1"/>
            <edge id="e2" source="n3" target="n2" length="0.2"/>
        </tree>
    </trees>
</nexml>"#;

fn write_sample(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("sample.xml");
    std::fs::write(&path, SAMPLE).unwrap();
    path
}

#[test]
fn test_inspect_prints_summary() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_sample(&dir);

    let mut cmd = Command::cargo_bin("phylodata-nexml").unwrap();
    cmd.arg("inspect")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("primates"))
        .stdout(predicate::str::contains("2 rows"))
        .stdout(predicate::str::contains("1 trees"));
}

#[test]
fn test_inspect_writes_yaml_summary() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_sample(&dir);
    let out = dir.path().join("summary.yaml");

    let mut cmd = Command::cargo_bin("phylodata-nexml").unwrap();
    cmd.arg("inspect")
        .arg(&file)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let yaml = std::fs::read_to_string(&out).unwrap();
    assert!(yaml.contains("Homo sapiens"));
    assert!(yaml.contains("dna"));
}

#[test]
fn test_inspect_exclude_trees() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_sample(&dir);

    let mut cmd = Command::cargo_bin("phylodata-nexml").unwrap();
    cmd.arg("inspect")
        .arg(&file)
        .arg("--exclude-trees")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tree collections:").and(predicate::str::contains("1 trees").not()));
}

#[test]
fn test_inspect_missing_file_fails() {
    let mut cmd = Command::cargo_bin("phylodata-nexml").unwrap();
    cmd.arg("inspect")
        .arg("/nonexistent/file.xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_invalid_document_fails_with_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.xml");
    std::fs::write(&path, "<notnexml/>").unwrap();

    let mut cmd = Command::cargo_bin("phylodata-nexml").unwrap();
    cmd.arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nexml"));
}
