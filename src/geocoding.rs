// src/geocoding.rs

pub mod google;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::MapError;

/// Region hint sent with every address search.
pub const DEFAULT_REGION: &str = "jp";

/// A single address search, built fresh for every click on the search button.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AddressQuery {
    pub address: String,
    pub region: String,
}

impl AddressQuery {
    /// Creates a query from the raw text of the address input.
    ///
    /// Surrounding whitespace is dropped and interior runs of whitespace,
    /// including the ideographic space U+3000, collapse to one ASCII space.
    /// An empty result is still a valid query; the geocoder decides what it means.
    pub fn new(address_text: &str, region: &str) -> Self {
        AddressQuery {
            address: address_text.split_whitespace().collect::<Vec<_>>().join(" "),
            region: region.to_string(),
        }
    }
}

/// Status codes reported by the geocoding service alongside its results.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeocodeStatus {
    Ok,
    ZeroResults,
    OverDailyLimit,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
    Error,
    #[serde(other)]
    Unrecognized,
}

impl std::fmt::Display for GeocodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GeocodeStatus::Ok => "OK",
            GeocodeStatus::ZeroResults => "ZERO_RESULTS",
            GeocodeStatus::OverDailyLimit => "OVER_DAILY_LIMIT",
            GeocodeStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            GeocodeStatus::RequestDenied => "REQUEST_DENIED",
            GeocodeStatus::InvalidRequest => "INVALID_REQUEST",
            GeocodeStatus::UnknownError => "UNKNOWN_ERROR",
            GeocodeStatus::Error => "ERROR",
            GeocodeStatus::Unrecognized => "UNRECOGNIZED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeocodeResult {
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
}

/// The body of a geocoding answer. Non-OK statuses are data here, not errors.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeocodeResponse {
    pub status: GeocodeStatus,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl GeocodeResponse {
    /// A successful response whose first result sits at `coordinate`.
    pub fn found(coordinate: Coordinate) -> Self {
        GeocodeResponse {
            status: GeocodeStatus::Ok,
            results: vec![GeocodeResult {
                geometry: Geometry {
                    location: LatLng {
                        lat: coordinate.latitude(),
                        lng: coordinate.longitude(),
                    },
                },
                formatted_address: None,
            }],
            error_message: None,
        }
    }

    /// A response carrying `status` and no results.
    pub fn empty(status: GeocodeStatus) -> Self {
        GeocodeResponse {
            status,
            results: Vec::new(),
            error_message: None,
        }
    }

    /// Returns the first result's location when the status is OK.
    ///
    /// Later results are never consulted. A location outside the valid range
    /// is treated the same as a missing one.
    pub fn first_location(&self) -> Option<Coordinate> {
        if self.status != GeocodeStatus::Ok {
            return None;
        }
        let location = self.results.first()?.geometry.location;
        Coordinate::new(location.lat, location.lng).ok()
    }
}

pub type GeocodeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<GeocodeResponse, MapError>> + Send + 'a>>;

/// A geocoding provider that resolves free-text addresses to coordinates.
pub trait Geocoder: Send + Sync + 'static {
    /// Forward geocode: resolve `query` into a status and a list of results.
    ///
    /// Transport and protocol failures are `Err`; a service answer such as
    /// `ZERO_RESULTS` is an `Ok` response with that status.
    fn geocode(&self, query: AddressQuery) -> GeocodeFuture<'_>;
}
