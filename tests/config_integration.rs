use std::collections::HashMap;

use restaurant_map::coordinate::DEFAULT_CENTER;
use restaurant_map::geocoding::google::{GoogleGeocoder, DEFAULT_ENDPOINT};
use restaurant_map::{Coordinate, MapConfig, MapError, SearchOrdering};
use serde_json::{json, Value};

fn params(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_defaults() {
    let config = MapConfig::default();
    assert_eq!(config.geocoder_endpoint, DEFAULT_ENDPOINT);
    assert_eq!(config.api_key, None);
    assert_eq!(config.region, "jp");
    assert_eq!(config.zoom, 15);
    assert_eq!(config.default_center, DEFAULT_CENTER);
    assert_eq!(config.search_ordering, SearchOrdering::LatestDispatch);
}

#[test]
fn test_from_params_overrides_and_keeps_defaults() {
    let config = MapConfig::from_params(&params(&[
        ("apiKey", json!("abc123")),
        ("zoom", json!(12)),
        ("defaultLatitude", json!(34.7025)),
        ("defaultLongitude", json!(135.4959)),
        ("searchOrdering", json!("last_arrival")),
        ("region", Value::Null),
    ]))
    .expect("Valid params rejected");

    assert_eq!(config.api_key.as_deref(), Some("abc123"));
    assert_eq!(config.zoom, 12);
    assert_eq!(
        config.default_center,
        Coordinate::new(34.7025, 135.4959).unwrap()
    );
    assert_eq!(config.search_ordering, SearchOrdering::LastArrival);
    assert_eq!(config.region, "jp");
    assert_eq!(config.geocoder_endpoint, DEFAULT_ENDPOINT);
}

#[test]
fn test_from_params_rejects_bad_values() {
    let cases = [
        params(&[("zoom", json!("fifteen"))]),
        params(&[("zoom", json!(30))]),
        params(&[("defaultLatitude", json!(35.0))]),
        params(&[("defaultLatitude", json!(135.0)), ("defaultLongitude", json!(0.0))]),
        params(&[("searchOrdering", json!("first_come"))]),
        params(&[("region", json!(" "))]),
    ];
    for case in cases {
        let result = MapConfig::from_params(&case);
        assert!(
            matches!(result, Err(MapError::Configuration(_))),
            "Expected configuration error for {:?}, got {:?}",
            case,
            result
        );
    }
}

#[test]
fn test_from_lookup_reads_variables() {
    let env = vars(&[
        ("GEOCODER_ENDPOINT", "http://localhost:8080/geocode/json"),
        ("GOOGLE_MAPS_API_KEY", "k3y"),
        ("GEOCODER_REGION", "us"),
        ("MAP_ZOOM", " 17 "),
        ("MAP_DEFAULT_LAT", "40.7128"),
        ("MAP_DEFAULT_LNG", "-74.0060"),
        ("MAP_SEARCH_ORDERING", "last_arrival"),
    ]);
    let config = MapConfig::from_lookup(|k| env.get(k).cloned()).expect("Valid env rejected");

    assert_eq!(config.geocoder_endpoint, "http://localhost:8080/geocode/json");
    assert_eq!(config.api_key.as_deref(), Some("k3y"));
    assert_eq!(config.region, "us");
    assert_eq!(config.zoom, 17);
    assert_eq!(config.default_center, Coordinate::new(40.7128, -74.006).unwrap());
    assert_eq!(config.search_ordering, SearchOrdering::LastArrival);

    let geocoder = GoogleGeocoder::from_config(&config).expect("Failed to build geocoder");
    assert_eq!(geocoder.endpoint().as_str(), "http://localhost:8080/geocode/json");
}

#[test]
fn test_from_lookup_blank_values_count_as_unset() {
    let env = vars(&[("GOOGLE_MAPS_API_KEY", ""), ("MAP_ZOOM", "   ")]);
    let config = MapConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
    assert_eq!(config, MapConfig::default());
}

#[test]
fn test_from_lookup_rejects_bad_values() {
    for env in [
        vars(&[("MAP_ZOOM", "-1")]),
        vars(&[("MAP_DEFAULT_LAT", "north")]),
        vars(&[("MAP_DEFAULT_LNG", "139.0")]),
        vars(&[("MAP_SEARCH_ORDERING", "random")]),
    ] {
        let result = MapConfig::from_lookup(|k| env.get(k).cloned());
        assert!(
            matches!(result, Err(MapError::Configuration(_))),
            "Expected configuration error for {:?}",
            env
        );
    }
}
