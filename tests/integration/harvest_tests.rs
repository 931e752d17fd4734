//! End-to-end harvest runs against mock site and geocoding servers

use crate::support::*;
use station_harvest::harvest::{harvest, GeoCoordinate, Harvester};
use station_harvest::output::MemorySink;
use station_harvest::HarvestError;
use tempfile::TempDir;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HEADER: &str = "City,Area,Station Name,Address,Contact,Latitude,Longitude";

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Output file should exist")
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_full_harvest_single_city() {
    let mock_server = MockServer::start().await;

    mount_cities(&mock_server, &[("CityA", "1")]).await;
    mount_areas(&mock_server, "1", &[("AreaX", "10"), ("AreaY", "11")]).await;
    mount_stations(
        &mock_server,
        "1",
        "10",
        &[("StationA", "123 Main St", "555-1234")],
    )
    .await;
    mount_stations(&mock_server, "1", "11", &[]).await;
    mount_geocode(&mock_server, "123 Main St", 12.34, 56.78).await;

    let config = create_test_config(&mock_server, "");
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("stations.csv");

    let stats = harvest(&config, API_KEY, &output)
        .await
        .expect("Harvest failed");

    assert_eq!(
        read_lines(&output),
        vec![
            HEADER.to_string(),
            "CityA,AreaX,StationA,123 Main St,555-1234,12.34,56.78".to_string(),
        ]
    );

    assert_eq!(stats.regions_discovered, 1);
    assert_eq!(stats.sub_regions_discovered, 2);
    assert_eq!(stats.sub_regions_scraped, 2);
    assert_eq!(stats.rows_written, 1);
    assert_eq!(stats.coordinates_unresolved, 0);
    assert!(stats.finished_at.is_some());
}

#[tokio::test]
async fn test_rerun_produces_identical_output() {
    let mock_server = MockServer::start().await;

    mount_cities(&mock_server, &[("CityA", "1")]).await;
    mount_areas(&mock_server, "1", &[("AreaX", "10")]).await;
    mount_stations(
        &mock_server,
        "1",
        "10",
        &[
            ("StationA", "123 Main St", "555-1234"),
            ("StationB", "9 Ring Road, Sector 4", "555-9999"),
        ],
    )
    .await;
    mount_geocode(&mock_server, "123 Main St", 12.34, 56.78).await;
    mount_geocode(&mock_server, "9 Ring Road, Sector 4", -1.5, 100.25).await;

    let config = create_test_config(&mock_server, "");
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");

    harvest(&config, API_KEY, &first).await.unwrap();
    harvest(&config, API_KEY, &second).await.unwrap();

    let first_bytes = std::fs::read(&first).unwrap();
    let second_bytes = std::fs::read(&second).unwrap();
    assert_eq!(first_bytes, second_bytes);
    assert_eq!(read_lines(&first).len(), 3);
}

#[tokio::test]
async fn test_unreachable_top_page_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, "");
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("stations.csv");

    let err = harvest(&config, API_KEY, &output).await.unwrap_err();
    assert!(matches!(err, HarvestError::FetchExhausted { attempts: 3, .. }));
    assert!(err.is_fatal_discovery());

    // Header only
    assert_eq!(read_lines(&output), vec![HEADER.to_string()]);
}

#[tokio::test]
async fn test_missing_region_control_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Down for maintenance</body></html>"),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, "");
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("stations.csv");

    let err = harvest(&config, API_KEY, &output).await.unwrap_err();
    assert!(matches!(err, HarvestError::NoRegions { .. }));
    assert_eq!(read_lines(&output), vec![HEADER.to_string()]);
}

#[tokio::test]
async fn test_failed_area_does_not_abort_traversal() {
    let mock_server = MockServer::start().await;

    mount_cities(&mock_server, &[("CityA", "1")]).await;
    mount_areas(&mock_server, "1", &[("AreaX", "10"), ("AreaY", "11")]).await;
    mount_failing_area(&mock_server, "10", 3).await;
    mount_stations(
        &mock_server,
        "1",
        "11",
        &[("StationB", "77 Lake Rd", "555-0000")],
    )
    .await;
    mount_geocode(&mock_server, "77 Lake Rd", 23.0, 72.5).await;

    let config = create_test_config(&mock_server, "");
    let harvester = Harvester::new(&config, API_KEY).unwrap();
    let mut sink = MemorySink::default();

    let stats = harvester.run(&mut sink).await.expect("Harvest failed");

    assert_eq!(stats.sub_regions_failed, 1);
    assert_eq!(stats.sub_regions_scraped, 1);
    assert_eq!(sink.rows.len(), 1);
    assert_eq!(sink.rows[0].sub_region, "AreaY");
    assert_eq!(sink.rows[0].name, "StationB");
}

#[tokio::test]
async fn test_failed_region_is_skipped() {
    let mock_server = MockServer::start().await;

    mount_cities(&mock_server, &[("CityA", "1"), ("CityB", "2")]).await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(body_string("ddlCity=1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;
    mount_areas(&mock_server, "2", &[("AreaZ", "20")]).await;
    mount_stations(&mock_server, "2", "20", &[("StationZ", "1 Hill St", "555-2020")]).await;
    mount_geocode(&mock_server, "1 Hill St", 1.0, 2.0).await;

    let config = create_test_config(&mock_server, "max-regions = \"unlimited\"");
    let harvester = Harvester::new(&config, API_KEY).unwrap();
    let mut sink = MemorySink::default();

    let stats = harvester.run(&mut sink).await.expect("Harvest failed");

    assert_eq!(stats.regions_failed, 1);
    assert_eq!(sink.rows.len(), 1);
    assert_eq!(sink.rows[0].region, "CityB");
}

#[tokio::test]
async fn test_unresolved_coordinates_still_written() {
    let mock_server = MockServer::start().await;

    mount_cities(&mock_server, &[("CityA", "1")]).await;
    mount_areas(&mock_server, "1", &[("AreaX", "10")]).await;
    mount_stations(
        &mock_server,
        "1",
        "10",
        &[("Nowhere", "Unknown Address", "555-0101")],
    )
    .await;
    mount_geocode_status(&mock_server, "Unknown Address", "ZERO_RESULTS").await;

    let config = create_test_config(&mock_server, "");
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("stations.csv");

    let stats = harvest(&config, API_KEY, &output).await.unwrap();

    assert_eq!(stats.coordinates_unresolved, 1);
    assert_eq!(
        read_lines(&output),
        vec![
            HEADER.to_string(),
            "CityA,AreaX,Nowhere,Unknown Address,555-0101,,".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_geocoding_http_error_is_unresolved() {
    let mock_server = MockServer::start().await;

    mount_cities(&mock_server, &[("CityA", "1")]).await;
    mount_areas(&mock_server, "1", &[("AreaX", "10")]).await;
    mount_stations(&mock_server, "1", "10", &[("StationA", "123 Main St", "555")]).await;

    // No retry on geocoding: exactly one request
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, "");
    let harvester = Harvester::new(&config, API_KEY).unwrap();
    let mut sink = MemorySink::default();

    let stats = harvester.run(&mut sink).await.unwrap();

    assert_eq!(sink.rows.len(), 1);
    assert_eq!(sink.rows[0].coordinate, GeoCoordinate::Unresolved);
    assert_eq!(stats.coordinates_unresolved, 1);
}

#[tokio::test]
async fn test_selection_limits_respected() {
    let mock_server = MockServer::start().await;

    mount_cities(&mock_server, &[("CityA", "1"), ("CityB", "2")]).await;
    mount_areas(
        &mock_server,
        "1",
        &[("AreaX", "10"), ("AreaY", "11"), ("AreaW", "12")],
    )
    .await;
    mount_stations(&mock_server, "1", "10", &[("S1", "Addr 1", "1")]).await;
    mount_stations(&mock_server, "1", "11", &[("S2", "Addr 2", "2")]).await;
    mount_geocode(&mock_server, "Addr 1", 1.0, 1.0).await;
    mount_geocode(&mock_server, "Addr 2", 2.0, 2.0).await;

    // Neither the second city nor the third area may be requested
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(body_string("ddlCity=2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(body_string("ddlCity=1&ddlArea=12"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        &mock_server,
        "max-regions = 1\nmax-sub-regions-per-region = 2",
    );
    let harvester = Harvester::new(&config, API_KEY).unwrap();
    let mut sink = MemorySink::default();

    let stats = harvester.run(&mut sink).await.unwrap();

    assert_eq!(stats.regions_discovered, 2);
    assert_eq!(stats.regions_selected, 1);
    assert_eq!(stats.sub_regions_discovered, 3);
    assert_eq!(stats.sub_regions_selected, 2);

    let names: Vec<&str> = sink.rows.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, vec!["S1", "S2"]);
}

#[tokio::test]
async fn test_missing_table_and_control_counted() {
    let mock_server = MockServer::start().await;

    mount_cities(&mock_server, &[("CityA", "1"), ("CityB", "2")]).await;
    mount_areas(&mock_server, "1", &[("AreaX", "10")]).await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(body_string("ddlCity=1&ddlArea=10"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>No table</body></html>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(body_string("ddlCity=2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>No select</body></html>"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, "max-regions = 2");
    let harvester = Harvester::new(&config, API_KEY).unwrap();
    let mut sink = MemorySink::default();

    let stats = harvester.run(&mut sink).await.unwrap();

    assert_eq!(stats.tables_missing, 1);
    assert_eq!(stats.controls_missing, 1);
    assert!(stats.has_gaps());
    assert!(sink.rows.is_empty());
}

#[tokio::test]
async fn test_log_levels_for_empty_table_and_phases() {
    let mock_server = MockServer::start().await;
    let (logs, _guard) = capture_logs();

    mount_cities(&mock_server, &[("CityA", "1")]).await;
    mount_areas(&mock_server, "1", &[("AreaX", "10")]).await;
    mount_stations(&mock_server, "1", "10", &[]).await;

    let config = create_test_config(&mock_server, "");
    let harvester = Harvester::new(&config, API_KEY).unwrap();
    let mut sink = MemorySink::default();

    let stats = harvester.run(&mut sink).await.unwrap();
    assert_eq!(stats.sub_regions_scraped, 1);
    assert_eq!(stats.tables_missing, 0);

    // A present but empty table is not a structure change
    let empty = logs.lines_with(&["Station table for AreaX, CityA is empty"]);
    assert_eq!(empty.len(), 1);
    assert!(empty[0].contains("INFO"), "unexpected level: {}", empty[0]);
    assert!(logs.lines_with(&["WARN", "No station table"]).is_empty());

    assert_eq!(
        logs.lines_with(&["DEBUG", "Phase init -> regions_discovered"]).len(),
        1
    );
    assert_eq!(
        logs.lines_with(&["DEBUG", "Phase sub_regions_discovered -> scraped"]).len(),
        1
    );
    assert!(logs.lines_with(&["TRACE", "Phase "]).is_empty());
}
