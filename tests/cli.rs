use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_json(path: &Path, value: serde_json::Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, value.to_string()).unwrap();
}

fn package() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        &dir.path().join("manifest.json"),
        json!({
            "package": {"name": "trilobase", "version": "1.0"},
            "manifest": {
                "default_view": "taxonomy",
                "views": {
                    "taxonomy": {
                        "type": "hierarchy",
                        "display": "tree",
                        "title": "Taxonomy",
                        "source_query": "taxa"
                    },
                    "genera": {
                        "type": "table",
                        "title": "Genera",
                        "source_query": "genera",
                        "columns": [
                            {"key": "name", "label": "Genus", "italic": true},
                            {"key": "author", "label": "Author"}
                        ],
                        "on_row_click": {"detail_view": "genus_detail", "id_key": "id"}
                    },
                    "genus_detail": {
                        "type": "detail",
                        "source": "/api/genus/{id}",
                        "sections": [
                            {
                                "type": "field_grid",
                                "title": "Basic Information",
                                "fields": [
                                    {"key": "name", "label": "Name"},
                                    {"key": "author", "label": "Author"}
                                ]
                            }
                        ]
                    }
                }
            }
        }),
    );
    write_json(
        &dir.path().join("queries/taxa.json"),
        json!({"rows": [
            {"id": 1, "name": "Redlichiida", "rank": "Order", "parent_id": null},
            {"id": 2, "name": "Olenellidae", "rank": "Family", "parent_id": 1},
            {"id": 3, "name": "Redlichiidae", "rank": "Family", "parent_id": 1}
        ]}),
    );
    write_json(
        &dir.path().join("queries/genera.json"),
        json!({"rows": [
            {"id": 1, "name": "Olenus", "author": "Salter"},
            {"id": 2, "name": "Olenellus", "author": "Hall"},
            {"id": 3, "name": "Redlichia", "author": "Cossmann"}
        ]}),
    );
    write_json(
        &dir.path().join("records/genus/2.json"),
        json!({"id": 2, "name": "Olenellus", "author": "Hall"}),
    );
    dir
}

fn strata() -> Command {
    Command::cargo_bin("strata").unwrap()
}

#[test]
fn test_help_lists_headless_options() {
    strata()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--view"))
        .stdout(predicate::str::contains("--search"))
        .stdout(predicate::str::contains("--detail"));
}

#[test]
fn test_tree_view_prints_outline() {
    let dir = package();
    strata()
        .arg(dir.path())
        .args(["--view", "taxonomy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("└── Redlichiida [Order]"))
        .stdout(predicate::str::contains("├── Olenellidae [Family]"))
        .stdout(predicate::str::contains("└── Redlichiidae [Family]"));
}

#[test]
fn test_table_view_prints_rows() {
    let dir = package();
    strata()
        .arg(dir.path())
        .args(["--view", "genera"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 of 3 records"))
        .stdout(predicate::str::contains("Genus"))
        .stdout(predicate::str::contains("Olenellus"))
        .stdout(predicate::str::contains("Cossmann"));
}

#[test]
fn test_unknown_view_fails() {
    let dir = package();
    strata()
        .arg(dir.path())
        .args(["--view", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No view named 'nope'"));
}

#[test]
fn test_search_groups_matches_by_category() {
    let dir = package();
    strata()
        .arg(dir.path())
        .args(["--search", "olen"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Genera (2)"))
        .stdout(predicate::str::contains("Olenus"))
        .stdout(predicate::str::contains("Olenellus"))
        .stdout(predicate::str::contains("Redlichia").not());
}

#[test]
fn test_search_limit_collapses_extra_results() {
    let dir = package();
    strata()
        .arg(dir.path())
        .args(["--search", "olen", "--search-limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+1 more"));
}

#[test]
fn test_short_search_is_hidden() {
    let dir = package();
    strata()
        .arg(dir.path())
        .args(["--search", "o"])
        .assert()
        .success()
        .stdout(predicate::str::contains("at least 2 characters"));
}

#[test]
fn test_search_without_matches() {
    let dir = package();
    strata()
        .arg(dir.path())
        .args(["--search", "zzzz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found"));
}

#[test]
fn test_detail_prints_sections() {
    let dir = package();
    strata()
        .arg(dir.path())
        .args(["--detail", "genus_detail", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Basic Information"))
        .stdout(predicate::str::contains("Author"))
        .stdout(predicate::str::contains("Hall"));
}

#[test]
fn test_missing_record_reports_error() {
    let dir = package();
    strata()
        .arg(dir.path())
        .args(["--detail", "genus_detail", "99"])
        .assert()
        .failure();
}

#[test]
fn test_missing_package_fails() {
    let dir = tempfile::tempdir().unwrap();
    strata()
        .arg(dir.path().join("absent"))
        .args(["--view", "genera"])
        .assert()
        .failure();
}

#[test]
fn test_log_file_is_written() {
    let dir = package();
    let log = dir.path().join("strata.log");
    strata()
        .arg(dir.path())
        .args(["--view", "genera", "--log"])
        .arg(&log)
        .env("STRATA_LOG", "info")
        .assert()
        .success();
    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.contains("Starting Strata"));
}
