use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn discover_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("discover");
    path
}

const CATALOG: &str = r#"{
    "categories": [
        {"id": 1, "name": "Media"},
        {"id": 2, "name": "Tools"}
    ],
    "authors": [
        {"id": 1, "name": "Ada"},
        {"id": 2, "name": "Brook"},
        {"id": 3, "name": "Cyd"}
    ],
    "tags": [
        {"id": 1, "name": "video", "slug": "video"},
        {"id": 2, "name": "player", "slug": "player"},
        {"id": 3, "name": "audio", "slug": "audio"},
        {"id": 4, "name": "backup", "slug": "backup"}
    ],
    "items": [
        {"id": 1, "name": "Video Player", "description": "Plays every video format",
         "category_id": 1, "author_id": 1, "tag_ids": [1, 2, 3], "rating": 4.5,
         "downloads": 900, "created_at": "2024-01-10T00:00:00Z", "version_min": "1.0"},
        {"id": 2, "name": "Video Downloader", "description": "Saves videos offline",
         "category_id": 1, "author_id": 2, "tag_ids": [1, 2], "rating": 4.0,
         "downloads": 300, "created_at": "2024-02-01T00:00:00Z"},
        {"id": 3, "name": "Backup Tool", "description": "Backs up your settings",
         "category_id": 2, "author_id": 3, "tag_ids": [3, 4], "rating": 3.0,
         "downloads": 50, "created_at": "2024-03-01T00:00:00Z", "version_max": "0.9"}
    ],
    "reviews": [
        {"id": 1, "item_id": 1, "rating": 5, "created_at": "2024-03-04T09:00:00Z"},
        {"id": 2, "item_id": 1, "rating": 4, "created_at": "2024-03-20T09:00:00Z"},
        {"id": 3, "item_id": 2, "rating": 2, "created_at": "2024-04-02T09:00:00Z"}
    ]
}"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(root.join("catalog.json"), CATALOG).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/catalog.sqlite"

[search]
page_size = 10
stop_words = ["the"]

[network]
max_depth = 2
"#,
        root.display()
    );

    let config_path = config_dir.join("discover.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_discover(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = discover_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run discover binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Init and import the test catalog.
fn seeded_env() -> (TempDir, PathBuf) {
    let (tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_discover(&config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    let catalog = tmp.path().join("catalog.json");
    let (stdout, stderr, success) =
        run_discover(&config_path, &["import", catalog.to_str().unwrap()]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    (tmp, config_path)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("not JSON ({}): {}", e, stdout))
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_discover(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_discover(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_discover(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_reports_counts() {
    let (tmp, config_path) = setup_test_env();
    run_discover(&config_path, &["init"]);
    let catalog = tmp.path().join("catalog.json");

    let (stdout, _, success) = run_discover(&config_path, &["import", catalog.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("Imported 3 addons"), "got: {}", stdout);

    // Re-import upserts instead of duplicating.
    run_discover(&config_path, &["import", catalog.to_str().unwrap()]);
    let (stdout, _, _) = run_discover(&config_path, &["stats", "--json"]);
    assert_eq!(json(&stdout)["addons"], 3);
}

#[test]
fn test_import_missing_file_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_discover(&config_path, &["init"]);
    let (_, stderr, success) = run_discover(&config_path, &["import", "/nonexistent/catalog.json"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read catalog file"));
}

#[test]
fn test_search_ranks_prefix_matches_first() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, stderr, success) = run_discover(&config_path, &["search", "the video", "--json"]);
    assert!(success, "search failed: {}", stderr);
    let page = json(&stdout);
    let ids: Vec<i64> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["item"]["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(page["total"], 2);
}

#[test]
fn test_search_filters() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, _, success) = run_discover(
        &config_path,
        &["search", "", "--category", "1", "--min-downloads", "500", "--json"],
    );
    assert!(success);
    assert_eq!(json(&stdout)["items"][0]["item"]["id"], 1);
    assert_eq!(json(&stdout)["total"], 1);

    let (stdout, _, _) = run_discover(&config_path, &["search", "", "--version", "1.5", "--json"]);
    assert_eq!(json(&stdout)["total"], 2);

    let (stdout, _, _) = run_discover(&config_path, &["search", "nothing-matches"]);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_rejects_bad_arguments() {
    let (_tmp, config_path) = seeded_env();

    let (_, stderr, success) = run_discover(&config_path, &["search", "video", "--page", "0"]);
    assert!(!success);
    assert!(stderr.contains("invalid argument"), "stderr: {}", stderr);

    let (_, _, success) = run_discover(
        &config_path,
        &["search", "video", "--min-rating", "4", "--max-rating", "2"],
    );
    assert!(!success);

    let (_, _, success) = run_discover(&config_path, &["search", "video", "--field", "title"]);
    assert!(!success);
}

#[test]
fn test_similar() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, _, success) = run_discover(&config_path, &["similar", "1", "--json"]);
    assert!(success);
    let resp = json(&stdout);
    assert_eq!(resp["basis"], "shared tags");
    let ids: Vec<i64> = resp["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 3]);

    let (_, stderr, success) = run_discover(&config_path, &["similar", "99"]);
    assert!(!success);
    assert!(stderr.contains("item not found: 99"));
}

#[test]
fn test_tag_reports() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, _, success) = run_discover(&config_path, &["tags", "related", "1", "--json"]);
    assert!(success);
    let related = json(&stdout);
    assert_eq!(related[0]["tag"]["slug"], "player");
    assert_eq!(related[0]["count"], 2);

    let (stdout, _, success) = run_discover(&config_path, &["tags", "cloud", "--json"]);
    assert!(success);
    let cloud = json(&stdout);
    assert_eq!(cloud[0]["weight"], 10);

    let (stdout, _, success) = run_discover(&config_path, &["tags", "counts"]);
    assert!(success);
    assert!(stdout.contains("backup"));

    let (stdout, _, success) = run_discover(&config_path, &["tags", "categories", "2", "--json"]);
    assert!(success);
    assert_eq!(json(&stdout).as_array().unwrap().len(), 2);
}

#[test]
fn test_network() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, _, success) = run_discover(&config_path, &["network", "1", "--json"]);
    assert!(success);
    let net = json(&stdout);
    let nodes = net["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1]["name"], "Brook");
    assert_eq!(nodes[1]["level"], 1);

    let (stdout, _, _) = run_discover(
        &config_path,
        &["network", "1", "--min-strength", "1", "--json"],
    );
    assert_eq!(json(&stdout)["nodes"].as_array().unwrap().len(), 3);

    let (_, stderr, success) = run_discover(&config_path, &["network", "1", "--depth", "-1"]);
    assert!(!success);
    assert!(stderr.contains("max_depth"));
}

#[test]
fn test_activity() {
    let (_tmp, config_path) = seeded_env();

    let (stdout, _, success) =
        run_discover(&config_path, &["activity", "--bucket", "month", "--json"]);
    assert!(success);
    let points = json(&stdout);
    assert_eq!(points[0]["period_start"], "2024-03-01");
    assert_eq!(points[0]["review_count"], 2);
    assert_eq!(points[1]["review_count"], 1);

    let (_, _, success) = run_discover(&config_path, &["activity", "--bucket", "year"]);
    assert!(!success);
}

#[test]
fn test_invalid_config_is_rejected() {
    let (tmp, _config_path) = setup_test_env();
    let bad = tmp.path().join("config/bad.toml");
    fs::write(&bad, "[db]\npath = \"x.sqlite\"\n[tags]\ncloud_max_weight = 0\n").unwrap();

    let (_, stderr, success) = run_discover(&bad, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("cloud_max_weight"));
}
