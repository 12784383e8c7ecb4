//! End-to-end pipeline tests against a mock routing engine
//!
//! These drive `run_pipeline` the way the CLI does, with wiremock standing
//! in for the OSRM endpoint and all files under a temp directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use resort_routes::{
    run_pipeline, AcquireOptions, CorridorConfig, Home, PipelineConfig, PipelineReport,
};

fn munich() -> Home {
    Home {
        id: "muc".to_string(),
        name: "Munich".to_string(),
        lat: 48.137,
        lon: 11.575,
    }
}

fn write_resorts(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("resorts.json");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path
}

/// Success responder: answers any route request with a straight two-vertex
/// route from the requested origin to the requested destination
fn straight_route_responder(req: &Request) -> ResponseTemplate {
    let path = req.url.path();
    let pairs = path.rsplit('/').next().unwrap();
    let (origin, dest) = pairs.split_once(';').unwrap();
    let parse = |s: &str| -> (f64, f64) {
        let (lon, lat) = s.split_once(',').unwrap();
        (lon.parse().unwrap(), lat.parse().unwrap())
    };
    let (olon, olat) = parse(origin);
    let (dlon, dlat) = parse(dest);

    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "code": "Ok",
        "routes": [{
            "geometry": {
                "type": "LineString",
                "coordinates": [[olon, olat], [dlon, dlat]],
            },
            "duration": 600.0,
            "distance": 9000.0,
        }],
    }))
}

fn test_config(server: &MockServer, resorts_path: PathBuf, out: &Path) -> PipelineConfig {
    PipelineConfig {
        home: munich(),
        resorts_path,
        routing_base: server.uri(),
        out_dir: out.to_path_buf(),
        force: false,
        acquire: AcquireOptions::default(),
        corridor: CorridorConfig {
            step_m: 100.0,
            grid_m: 800.0,
            min_count: 1,
        },
    }
}

async fn mount_success(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/.*;11\."))
        .respond_with(straight_route_responder)
        .mount(server)
        .await;
}

async fn mount_failure(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/.*;13\.9"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_pipeline_writes_all_artifacts() {
    let server = MockServer::start().await;
    mount_success(&server).await;
    mount_failure(&server).await;

    let dir = TempDir::new().unwrap();
    let resorts = write_resorts(
        dir.path(),
        r#"[{"id": "x", "name": "X", "lat": 48.137, "lon": 11.675},
            {"id": "ghost", "name": "Ghost", "lat": 48.137, "lon": 13.9}]"#,
    );
    let out = dir.path().join("data");

    let report = run_pipeline(test_config(&server, resorts, &out)).await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.resorts, 2);
    assert!(!report.reused_store);

    // Route store: exactly one feature, keyed by the surviving resort
    let store: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("routes_muc.geojson")).unwrap())
            .unwrap();
    let features = store["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["properties"]["resort_id"], "x");
    assert_eq!(features[0]["properties"]["home_id"], "muc");
    assert_eq!(features[0]["properties"]["duration_sec"], 600.0);

    // Travel-time table: 600 s / 9000 m rounds to 0.17 h / 9.0 km, and the
    // failed resort is absent rather than zero
    let table: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("travel_times_muc.json")).unwrap())
            .unwrap();
    assert_eq!(table["X"]["hours"], 0.17);
    assert_eq!(table["X"]["km"], 9.0);
    assert!(table.get("Ghost").is_none());

    // Corridor graph: the single route produces edges at min_count 1
    let corridors: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("corridors_muc.geojson")).unwrap())
            .unwrap();
    assert_eq!(corridors["type"], "FeatureCollection");
    assert_eq!(corridors["properties"]["source_routes"], 1);
    assert_eq!(corridors["properties"]["min_count"], 1);
    let edges = corridors["features"].as_array().unwrap();
    assert!(!edges.is_empty());
    assert_eq!(report.corridor_edges, edges.len());
}

#[tokio::test]
async fn test_second_run_reuses_store_and_is_byte_identical() {
    let server = MockServer::start().await;
    mount_success(&server).await;

    let dir = TempDir::new().unwrap();
    let resorts = write_resorts(
        dir.path(),
        r#"[{"id": "x", "name": "X", "lat": 48.137, "lon": 11.675}]"#,
    );
    let out = dir.path().join("data");

    let first = run_pipeline(test_config(&server, resorts.clone(), &out))
        .await
        .unwrap();
    assert!(!first.reused_store);
    let requests_after_first = server.received_requests().await.unwrap().len();
    let table_first = std::fs::read(out.join("travel_times_muc.json")).unwrap();

    let second = run_pipeline(test_config(&server, resorts, &out)).await.unwrap();
    assert!(second.reused_store);
    assert_eq!(second.succeeded, 1);

    // No new network traffic, same bytes out
    let requests_after_second = server.received_requests().await.unwrap().len();
    assert_eq!(requests_after_first, requests_after_second);
    let table_second = std::fs::read(out.join("travel_times_muc.json")).unwrap();
    assert_eq!(table_first, table_second);
}

#[tokio::test]
async fn test_force_refetches_existing_store() {
    let server = MockServer::start().await;
    mount_success(&server).await;

    let dir = TempDir::new().unwrap();
    let resorts = write_resorts(
        dir.path(),
        r#"[{"id": "x", "name": "X", "lat": 48.137, "lon": 11.675}]"#,
    );
    let out = dir.path().join("data");

    run_pipeline(test_config(&server, resorts.clone(), &out))
        .await
        .unwrap();
    let requests_after_first = server.received_requests().await.unwrap().len();

    let mut config = test_config(&server, resorts, &out);
    config.force = true;
    let report: PipelineReport = run_pipeline(config).await.unwrap();
    assert!(!report.reused_store);

    let requests_after_second = server.received_requests().await.unwrap().len();
    assert!(requests_after_second > requests_after_first);
}

#[tokio::test]
async fn test_shared_pairs_below_min_count_are_filtered() {
    // Two near-identical routes share every cell pair; at min_count 3 the
    // corridor graph comes out empty
    let server = MockServer::start().await;
    mount_success(&server).await;

    let dir = TempDir::new().unwrap();
    let resorts = write_resorts(
        dir.path(),
        r#"[{"id": "a", "name": "A", "lat": 48.137, "lon": 11.675},
            {"id": "b", "name": "B", "lat": 48.137, "lon": 11.676}]"#,
    );
    let out = dir.path().join("data");

    let mut config = test_config(&server, resorts, &out);
    config.corridor.min_count = 3;
    let report = run_pipeline(config).await.unwrap();
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.corridor_edges, 0);

    let corridors: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("corridors_muc.geojson")).unwrap())
            .unwrap();
    assert_eq!(corridors["features"].as_array().unwrap().len(), 0);
    assert_eq!(corridors["properties"]["max_count"], 0);
}

#[tokio::test]
async fn test_malformed_resorts_file_fails_before_any_request() {
    let server = MockServer::start().await;
    mount_success(&server).await;

    let dir = TempDir::new().unwrap();
    let resorts = write_resorts(
        dir.path(),
        r#"[{"id": "bad", "name": "Bad", "lat": 95.0, "lon": 11.675}]"#,
    );
    let out = dir.path().join("data");

    let result = run_pipeline(test_config(&server, resorts, &out)).await;
    assert!(result.is_err());

    // Pre-flight validation failed, so the engine never saw a request
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(!out.join("routes_muc.geojson").exists());
}

#[test]
fn test_list_homes_prints_ids_without_network() {
    // Scenario: --list-homes enumerates the homes file and exits 0 without
    // touching the routing engine (none is even configured)
    let dir = TempDir::new().unwrap();
    let homes_path = dir.path().join("homes.json");
    std::fs::write(
        &homes_path,
        r#"{"muc": {"name": "Munich", "lat": 48.137, "lon": 11.575},
            "lju": {"name": "Ljubljana", "lat": 46.056, "lon": 14.508}}"#,
    )
    .unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_resort-routes"))
        .arg("--homes")
        .arg(&homes_path)
        .arg("--list-homes")
        .output()
        .unwrap();

    assert!(output.status.success(), "exit code must be 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("muc"));
    assert!(stdout.contains("lju"));
}

#[test]
fn test_unknown_home_id_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let homes_path = dir.path().join("homes.json");
    std::fs::write(
        &homes_path,
        r#"{"muc": {"name": "Munich", "lat": 48.137, "lon": 11.575}}"#,
    )
    .unwrap();
    let resorts_path = dir.path().join("resorts.json");
    std::fs::write(&resorts_path, "[]").unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_resort-routes"))
        .arg("--homes")
        .arg(&homes_path)
        .arg("--home-id")
        .arg("bogus")
        .arg("--resorts")
        .arg(&resorts_path)
        .output()
        .unwrap();

    assert!(!output.status.success(), "unknown home id must be fatal");
}
