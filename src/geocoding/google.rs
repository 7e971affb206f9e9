// src/geocoding/google.rs

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response as HttpResponse, Url};
use serde_json::Value;

use super::{AddressQuery, GeocodeFuture, GeocodeResponse, Geocoder};
use crate::config::MapConfig;
use crate::error::MapError;

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Geocoder backed by the Google Geocoding JSON API (or any service that
/// speaks the same request/response shape).
///
/// # Examples
///
/// ```rust,no_run
/// use restaurant_map::geocoding::google::GoogleGeocoder;
/// use restaurant_map::geocoding::{AddressQuery, Geocoder, DEFAULT_REGION};
/// # use restaurant_map::MapError;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), MapError> {
/// let geocoder = GoogleGeocoder::new(
///     "https://maps.googleapis.com/maps/api/geocode/json",
///     Some("myApiKey"),
/// )?;
///
/// let response = geocoder
///     .geocode(AddressQuery::new("東京都渋谷区", DEFAULT_REGION))
///     .await?;
/// if let Some(location) = response.first_location() {
///     println!("Found {}", location);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    endpoint: Url,
    api_key: Option<String>,
    http_client: Client,
}

impl GoogleGeocoder {
    /// Creates a new `GoogleGeocoder`.
    ///
    /// # Arguments
    ///
    /// * `endpoint`: The geocode endpoint URL. A missing scheme defaults to `https://`.
    /// * `api_key`: Optional API key, sent as the `key` query parameter.
    ///
    /// # Returns
    ///
    /// A `Result` containing the geocoder, or a `MapError` if the endpoint is not a
    /// usable base URL or the HTTP client cannot be built.
    pub fn new(endpoint: &str, api_key: Option<&str>) -> Result<Self, MapError> {
        let mut endpoint_string = endpoint.trim().to_string();
        if !endpoint_string.starts_with("http://") && !endpoint_string.starts_with("https://") {
            endpoint_string = format!("https://{}", endpoint_string);
        }

        let parsed_endpoint = Url::parse(&endpoint_string)?;
        if parsed_endpoint.cannot_be_a_base() {
            return Err(MapError::Configuration(format!(
                "The geocoder endpoint '{}' resolved to '{}', which cannot be a base URL.",
                endpoint, parsed_endpoint
            )));
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("restaurant-map/", env!("CARGO_PKG_VERSION"))),
        );

        let http_client = Client::builder()
            .default_headers(default_headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(MapError::ReqwestError)?;

        Ok(Self::with_client(parsed_endpoint, api_key, http_client))
    }

    /// Creates a geocoder that sends its requests through `http_client`, for
    /// callers that need their own proxy, TLS or timeout settings.
    pub fn with_client(endpoint: Url, api_key: Option<&str>, http_client: Client) -> Self {
        log::debug!("GoogleGeocoder initialized with endpoint: {}", endpoint);
        Self {
            endpoint,
            api_key: api_key.filter(|k| !k.is_empty()).map(|k| k.to_string()),
            http_client,
        }
    }

    /// Builds a geocoder from the endpoint and key held in `config`.
    pub fn from_config(config: &MapConfig) -> Result<Self, MapError> {
        Self::new(&config.geocoder_endpoint, config.api_key.as_deref())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, query: &AddressQuery) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("address", &query.address);
            pairs.append_pair("region", &query.region);
            if let Some(key) = &self.api_key {
                pairs.append_pair("key", key);
            }
        }
        url
    }

    async fn forward_geocode(&self, query: AddressQuery) -> Result<GeocodeResponse, MapError> {
        let url = self.request_url(&query);

        if log::log_enabled!(log::Level::Debug) {
            log::debug!("--- Geocode GET Request ---");
            log::debug!("Endpoint: {}", self.endpoint);
            log::debug!("Address: {:?}", query.address);
            log::debug!("Region: {}", query.region);
            log::debug!("API key: {}", if self.api_key.is_some() { "[set]" } else { "[none]" });
            log::debug!("---------------------------");
        }

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(MapError::ReqwestError)?;

        self.process_response(response, &query.address).await
    }

    async fn process_response(
        &self,
        response: HttpResponse,
        address: &str,
    ) -> Result<GeocodeResponse, MapError> {
        let status = response.status();
        let response_text = response.text().await.map_err(MapError::ReqwestError)?;

        if log::log_enabled!(log::Level::Debug) {
            log::debug!("--- Geocode Response ---");
            log::debug!("Status: {}", status);
            log::debug!("Body: {}", response_text);
        }

        if status.is_success() {
            let parsed: GeocodeResponse = serde_json::from_str(&response_text).map_err(|e| {
                log::error!(
                    "JSON Deserialization failed for geocode of {:?}. Status: {}. Error: {}. Body: {}",
                    address,
                    status,
                    e,
                    &response_text
                );
                MapError::JsonDeserializationFailed(format!(
                    "Failed to deserialize geocode response for {:?}: {}. Body: {}",
                    address, e, &response_text
                ))
            })?;
            log::debug!(
                "Geocode of {:?} returned {} with {} result(s)",
                address,
                parsed.status,
                parsed.results.len()
            );
            Ok(parsed)
        } else {
            let parsed_body: Value = match serde_json::from_str(&response_text) {
                Ok(json_val) => json_val,
                Err(_) => {
                    log::warn!(
                        "Failed to parse error response body as JSON. Status: {}. Body: {}",
                        status,
                        &response_text
                    );
                    serde_json::json!({
                        "error": format!("HTTP Error {} with non-JSON body", status),
                        "body_snippet": response_text.chars().take(100).collect::<String>(),
                    })
                }
            };
            Err(MapError::from_response(status.as_u16(), parsed_body))
        }
    }
}

impl Geocoder for GoogleGeocoder {
    fn geocode(&self, query: AddressQuery) -> GeocodeFuture<'_> {
        Box::pin(self.forward_geocode(query))
    }
}
