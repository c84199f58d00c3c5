mod common;

use std::fs;

use assert_cmd::Command;
use common::{TestWorkspace, sample_csv};
use csv_shrink::{dtype::DataType, type_map::ColumnTypeMap};
use predicates::prelude::*;
use predicates::str::contains;

fn csv_shrink() -> Command {
    Command::cargo_bin("csv-shrink").expect("binary exists")
}

#[test]
fn optimize_reports_groups_and_writes_type_map() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("sample.csv", &sample_csv(200));
    let types_path = workspace.path().join("types.yaml");

    csv_shrink()
        .args([
            "optimize",
            "-i",
            csv_path.to_str().unwrap(),
            "-o",
            types_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Integer downsizing results:"))
        .stdout(contains("Float downsizing results:"))
        .stdout(contains("Text downsizing results:"))
        .stdout(contains("Original table size:"))
        .stdout(contains("Percent reduction:"))
        .stdout(contains("category"));

    let types = ColumnTypeMap::load(&types_path).expect("load written type map");
    assert_eq!(types.len(), 6);
    assert_eq!(types.get("id"), Some(DataType::UInt8));
    assert_eq!(types.get("score"), Some(DataType::Float32));
    assert_eq!(types.get("city"), Some(DataType::Category));
    assert_eq!(types.get("note"), Some(DataType::String));
    let contents = fs::read_to_string(&types_path).expect("read type map");
    assert!(contents.starts_with("id: uint8\n"));
}

#[test]
fn optimize_verify_reloads_with_type_map() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("sample.csv", &sample_csv(64));
    csv_shrink()
        .args(["optimize", "-i", csv_path.to_str().unwrap(), "--verify"])
        .assert()
        .success();
}

#[test]
fn optimize_json_output_lists_decisions() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("sample.tsv", "code\tlabel\n1\tx\n2\tx\n3\tx\n");
    let assert = csv_shrink()
        .args(["optimize", "-i", csv_path.to_str().unwrap(), "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("json report");
    assert_eq!(value["types"]["code"], "int8");
    assert_eq!(value["types"]["label"], "category");
    assert_eq!(value["report"]["groups"][0]["group"], "integer");
    assert_eq!(
        value["report"]["groups"][0]["decisions"][0]["evidence"]["kind"],
        "integer_range"
    );
}

#[test]
fn optimize_rejects_out_of_range_threshold() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("sample.csv", &sample_csv(10));
    csv_shrink()
        .args([
            "optimize",
            "-i",
            csv_path.to_str().unwrap(),
            "--category-threshold",
            "0",
        ])
        .assert()
        .failure()
        .stderr(contains("Category threshold must be within (0, 1]"));
}

#[test]
fn optimize_rejects_invalid_float_tolerance() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("sample.csv", &sample_csv(10));
    for tolerance in ["NaN", "-1"] {
        let flag = format!("--float-tolerance={tolerance}");
        csv_shrink()
            .args(["optimize", "-i", csv_path.to_str().unwrap(), flag.as_str()])
            .assert()
            .failure()
            .stderr(contains("Float tolerance must be a finite value"));
    }
}

#[test]
fn missing_input_is_reported() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("absent.csv");
    csv_shrink()
        .args(["optimize", "-i", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("was not found"));
}

#[test]
fn header_only_input_is_rejected() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("empty.csv", "a,b\n");
    csv_shrink()
        .args(["usage", "-i", csv_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("no data rows"));
}

#[test]
fn usage_lists_classes_and_columns() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("sample.csv", &sample_csv(20));
    csv_shrink()
        .args(["usage", "-i", csv_path.to_str().unwrap(), "--columns"])
        .assert()
        .success()
        .stdout(contains("avg per column"))
        .stdout(contains("boolean"))
        .stdout(contains("total"))
        .stdout(contains("note"));
}

#[test]
fn usage_applies_inline_type_declarations() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("sample.csv", "id;city\n1;Oslo\n2;Oslo\n");
    csv_shrink()
        .args([
            "usage",
            "-i",
            csv_path.to_str().unwrap(),
            "--delimiter",
            "semicolon",
            "--type",
            "id:uint8,city:category",
        ])
        .assert()
        .success()
        .stdout(contains("category").and(contains("integer")));
}

#[test]
fn type_map_naming_unknown_column_fails() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("sample.csv", "id\n1\n");
    let types_path = workspace.write("types.yaml", "nope: int8\n");
    csv_shrink()
        .args([
            "range",
            "-i",
            csv_path.to_str().unwrap(),
            "-t",
            types_path.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("'nope'"));
}

#[test]
fn range_prints_numeric_bounds() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("sample.csv", "n,x,name\n-5,0.5,a\n300,2.5,b\n");
    csv_shrink()
        .args(["range", "-i", csv_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("-5").and(contains("300")))
        .stdout(contains("2.5"))
        .stdout(contains("name").not());
}
