use std::collections::HashMap;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::coordinate::{Coordinate, DEFAULT_CENTER};
use crate::geocoding::google::DEFAULT_ENDPOINT;
use crate::geocoding::DEFAULT_REGION;
use crate::map::SearchOrdering;
use crate::MapError;

/// Zoom level the map opens at.
pub const DEFAULT_ZOOM: u8 = 15;

const MAX_ZOOM: u8 = 21;

/// Settings shared by the map controller and the HTTP geocoder.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub geocoder_endpoint: String,
    pub api_key: Option<String>,
    /// Region hint attached to every address query.
    pub region: String,
    pub zoom: u8,
    /// Center used when the page supplies no seed coordinate.
    pub default_center: Coordinate,
    pub search_ordering: SearchOrdering,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            geocoder_endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            region: DEFAULT_REGION.to_string(),
            zoom: DEFAULT_ZOOM,
            default_center: DEFAULT_CENTER,
            search_ordering: SearchOrdering::default(),
        }
    }
}

impl MapConfig {
    /// Builds a configuration from a map of named parameters, as delivered by a
    /// JSON settings document.
    ///
    /// Recognized keys are `geocoderEndpoint`, `apiKey`, `region`, `zoom`,
    /// `defaultLatitude`, `defaultLongitude` and `searchOrdering`. Missing keys
    /// keep their defaults.
    ///
    /// # Errors
    /// Returns `MapError::Configuration` when a present key has the wrong type or
    /// an out-of-range value.
    pub fn from_params(params: &HashMap<String, Value>) -> Result<Self, MapError> {
        let mut config = MapConfig::default();

        if let Some(endpoint) = get_param::<String>(params, "geocoderEndpoint")? {
            config.geocoder_endpoint = endpoint;
        }
        if let Some(api_key) = get_param::<String>(params, "apiKey")? {
            config.api_key = Some(api_key);
        }
        if let Some(region) = get_param::<String>(params, "region")? {
            config.region = region;
        }
        if let Some(zoom) = get_param::<u8>(params, "zoom")? {
            config.zoom = zoom;
        }
        if let Some(ordering) = get_param::<SearchOrdering>(params, "searchOrdering")? {
            config.search_ordering = ordering;
        }
        config.default_center = default_center(
            config.default_center,
            get_param::<f64>(params, "defaultLatitude")?,
            get_param::<f64>(params, "defaultLongitude")?,
        )?;

        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration from process environment variables.
    ///
    /// Variables: `GEOCODER_ENDPOINT`, `GOOGLE_MAPS_API_KEY`, `GEOCODER_REGION`,
    /// `MAP_ZOOM`, `MAP_DEFAULT_LAT`, `MAP_DEFAULT_LNG`, `MAP_SEARCH_ORDERING`.
    pub fn from_env() -> Result<Self, MapError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MapConfig::from_env`], but resolves variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = MapConfig::default();

        if let Some(endpoint) = lookup("GEOCODER_ENDPOINT") {
            config.geocoder_endpoint = endpoint;
        }
        config.api_key = lookup("GOOGLE_MAPS_API_KEY");
        if let Some(region) = lookup("GEOCODER_REGION") {
            config.region = region;
        }
        if let Some(zoom) = parse_var::<u8>("MAP_ZOOM", lookup("MAP_ZOOM"))? {
            config.zoom = zoom;
        }
        if let Some(raw) = lookup("MAP_SEARCH_ORDERING") {
            config.search_ordering = serde_json::from_value(Value::String(raw.trim().to_string()))
                .map_err(|_| {
                    MapError::Configuration(format!(
                        "MAP_SEARCH_ORDERING must be 'latest_dispatch' or 'last_arrival', got '{}'",
                        raw
                    ))
                })?;
        }
        config.default_center = default_center(
            config.default_center,
            parse_var::<f64>("MAP_DEFAULT_LAT", lookup("MAP_DEFAULT_LAT"))?,
            parse_var::<f64>("MAP_DEFAULT_LNG", lookup("MAP_DEFAULT_LNG"))?,
        )?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), MapError> {
        if self.zoom > MAX_ZOOM {
            return Err(MapError::Configuration(format!(
                "zoom must be between 0 and {}, got {}",
                MAX_ZOOM, self.zoom
            )));
        }
        if self.region.trim().is_empty() {
            return Err(MapError::Configuration(
                "region hint cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn get_param<T: DeserializeOwned>(
    params: &HashMap<String, Value>,
    key: &str,
) -> Result<Option<T>, MapError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| MapError::Configuration(format!("parameter '{}': {}", key, e))),
    }
}

fn parse_var<T: FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>, MapError> {
    raw.map(|v| {
        v.trim()
            .parse::<T>()
            .map_err(|_| MapError::Configuration(format!("{} has an invalid value '{}'", name, v)))
    })
    .transpose()
}

// Both halves or neither: a lone latitude or longitude is a configuration mistake.
fn default_center(
    fallback: Coordinate,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Coordinate, MapError> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => Coordinate::new(lat, lng)
            .map_err(|e| MapError::Configuration(format!("default center: {}", e))),
        (None, None) => Ok(fallback),
        _ => Err(MapError::Configuration(
            "default center needs both latitude and longitude".to_string(),
        )),
    }
}
