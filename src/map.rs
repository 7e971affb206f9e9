// src/map.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::config::MapConfig;
use crate::coordinate::Coordinate;
use crate::error::MapError;
use crate::form_bridge::FormBridge;
use crate::geocoding::{AddressQuery, GeocodeResponse, GeocodeStatus, Geocoder};

pub const MAP_ELEMENT_ID: &str = "map";
pub const SEARCH_BUTTON_ID: &str = "searchAddressBtn";
pub const ADDRESS_INPUT_SELECTOR: &str = ".city_address";

/// Shown once for every search that does not resolve to a location.
pub const SEARCH_FAILED_ALERT: &str =
    "住所検索に失敗しました。\n住所が正しいか確認してください";

/// How responses to overlapping searches are reconciled.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchOrdering {
    /// Only the response to the most recently dispatched search is applied;
    /// older responses are dropped when they arrive.
    #[default]
    LatestDispatch,
    /// Every response is applied in the order it arrives, so the last one to
    /// arrive wins even if it answers an older search.
    LastArrival,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MapType {
    #[default]
    Roadmap,
}

/// Seed values the host page hands over before the map is built.
///
/// Deliberately not `Clone`: [`MapController::initialize`] takes it by value,
/// so a page load can seed exactly one session.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct PageData {
    #[serde(default)]
    pub restaurant_lat: Option<f64>,
    #[serde(default)]
    pub restaurant_lng: Option<f64>,
}

impl PageData {
    pub fn new(restaurant_lat: Option<f64>, restaurant_lng: Option<f64>) -> Self {
        PageData {
            restaurant_lat,
            restaurant_lng,
        }
    }

    /// Resolves the seed coordinate, falling back to `default_center` when a
    /// value is missing or out of range.
    pub fn seed(&self, default_center: Coordinate) -> Coordinate {
        match (self.restaurant_lat, self.restaurant_lng) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng).unwrap_or_else(|e| {
                log::warn!("Seed coordinate rejected ({}); using default center", e);
                default_center
            }),
            _ => default_center,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapView {
    pub element_id: &'static str,
    pub center: Coordinate,
    pub zoom: u8,
    pub map_type: MapType,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Marker {
    pub position: Coordinate,
    pub draggable: bool,
}

/// The one live map, its center marker, and the hidden form fields.
#[derive(Debug)]
struct MapSession {
    map: MapView,
    marker: Marker,
    form: FormBridge,
    // Bumped by every search dispatch and every marker drag.
    generation: u64,
}

impl MapSession {
    fn apply(&mut self, coordinate: Coordinate) {
        self.map.center = coordinate;
        self.marker.position = coordinate;
        self.form.write(coordinate);
    }
}

/// A point-in-time copy of the session, for rendering and inspection.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapSessionSnapshot {
    pub map: MapView,
    pub marker: Marker,
    pub form: FormBridge,
}

/// Receives user-visible failure notices.
pub trait Alerter: Send + Sync + 'static {
    fn alert(&self, message: &str);
}

/// Alerter for headless hosts: notices go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlerter;

impl Alerter for LogAlerter {
    fn alert(&self, message: &str) {
        log::warn!("{}", message);
    }
}

#[derive(Debug)]
pub enum SearchFailure {
    /// The geocoder answered, but not with a usable first result.
    Status(GeocodeStatus),
    /// The geocoder could not be reached or answered with garbage.
    Unavailable(MapError),
}

#[derive(Debug)]
pub enum SearchOutcome {
    /// Map center, marker and form fields now sit at this coordinate.
    Applied(Coordinate),
    /// An alert was shown and nothing changed.
    Failed(SearchFailure),
    /// A newer search or a marker drag superseded this one; the response was dropped.
    Stale,
}

/// Handle to an in-flight search. Dropping it does not cancel the search.
#[derive(Debug)]
pub struct SearchHandle {
    request_id: u64,
    task: JoinHandle<SearchOutcome>,
}

impl SearchHandle {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Waits for the response to be applied or discarded.
    pub async fn outcome(self) -> Result<SearchOutcome, MapError> {
        Ok(self.task.await?)
    }
}

/// UI events the host page forwards to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// A click, with the current value of the address input.
    Click {
        element_id: String,
        address_text: String,
    },
    MarkerDragEnd { position: Coordinate },
}

/// Keeps the map, its marker and the hidden coordinate fields in agreement
/// while a restaurant is being registered or edited.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use restaurant_map::geocoding::google::GoogleGeocoder;
/// use restaurant_map::map::{LogAlerter, MapController, PageData, SearchOutcome};
/// use restaurant_map::{FormBridge, MapConfig, MapError};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), MapError> {
/// let config = MapConfig::from_env()?;
/// let geocoder = Arc::new(GoogleGeocoder::from_config(&config)?);
///
/// let controller = MapController::initialize(
///     PageData::new(Some(35.681236), Some(139.767125)),
///     FormBridge::default(),
///     geocoder,
///     Arc::new(LogAlerter),
///     &config,
/// );
///
/// let handle = controller.on_search_triggered("東京都渋谷区");
/// if let SearchOutcome::Applied(location) = handle.outcome().await? {
///     println!("Marker moved to {}", location);
/// }
/// # Ok(())
/// # }
/// ```
pub struct MapController {
    session: Arc<Mutex<MapSession>>,
    geocoder: Arc<dyn Geocoder>,
    alerter: Arc<dyn Alerter>,
    region: String,
    ordering: SearchOrdering,
}

impl MapController {
    /// Builds the session: a map centered on the seed at the configured zoom and
    /// a draggable marker on the same spot.
    ///
    /// `form` is whatever the host page rendered into the hidden fields; it is
    /// kept as-is until the first successful search or marker drag.
    pub fn initialize(
        page_data: PageData,
        form: FormBridge,
        geocoder: Arc<dyn Geocoder>,
        alerter: Arc<dyn Alerter>,
        config: &MapConfig,
    ) -> Self {
        let seed = page_data.seed(config.default_center);
        log::debug!(
            "Initializing map '{}' at {} (zoom {})",
            MAP_ELEMENT_ID,
            seed,
            config.zoom
        );

        let session = MapSession {
            map: MapView {
                element_id: MAP_ELEMENT_ID,
                center: seed,
                zoom: config.zoom,
                map_type: MapType::Roadmap,
            },
            marker: Marker {
                position: seed,
                draggable: true,
            },
            form,
            generation: 0,
        };

        MapController {
            session: Arc::new(Mutex::new(session)),
            geocoder,
            alerter,
            region: config.region.clone(),
            ordering: config.search_ordering,
        }
    }

    /// Starts an address search and returns without waiting for it.
    ///
    /// The geocode runs as a Tokio task, so this must be called from inside a
    /// runtime. When the response arrives the map center, marker position and
    /// form fields are updated together, or an alert is raised and nothing
    /// changes.
    pub fn on_search_triggered(&self, address_text: &str) -> SearchHandle {
        let query = AddressQuery::new(address_text, &self.region);
        let request_id = {
            let mut session = lock(&self.session);
            session.generation += 1;
            session.generation
        };
        log::debug!("Dispatching search #{} for {:?}", request_id, query.address);

        let session = Arc::clone(&self.session);
        let geocoder = Arc::clone(&self.geocoder);
        let alerter = Arc::clone(&self.alerter);
        let ordering = self.ordering;

        let task = tokio::spawn(async move {
            let address = query.address.clone();
            let result = geocoder.geocode(query).await;
            resolve(
                &session,
                alerter.as_ref(),
                ordering,
                request_id,
                &address,
                result,
            )
        });

        SearchHandle { request_id, task }
    }

    /// Moves the marker to where the user dropped it and mirrors the position
    /// into the form fields. The map is not re-centered.
    ///
    /// Under [`SearchOrdering::LatestDispatch`] searches still in flight are
    /// superseded by the drag.
    pub fn on_marker_drag_end(&self, position: Coordinate) {
        let mut session = lock(&self.session);
        session.generation += 1;
        session.marker.position = position;
        session.form.write(position);
        log::debug!("Marker dragged to {}", position);
    }

    /// Routes a host UI event. Returns the search handle when the event started one.
    pub fn dispatch(&self, event: UiEvent) -> Option<SearchHandle> {
        match event {
            UiEvent::Click {
                element_id,
                address_text,
            } if element_id == SEARCH_BUTTON_ID => Some(self.on_search_triggered(&address_text)),
            UiEvent::Click { element_id, .. } => {
                log::trace!("Ignoring click on '{}'", element_id);
                None
            }
            UiEvent::MarkerDragEnd { position } => {
                self.on_marker_drag_end(position);
                None
            }
        }
    }

    pub fn snapshot(&self) -> MapSessionSnapshot {
        let session = lock(&self.session);
        MapSessionSnapshot {
            map: session.map.clone(),
            marker: session.marker.clone(),
            form: session.form.clone(),
        }
    }

    pub fn ordering(&self) -> SearchOrdering {
        self.ordering
    }
}

fn lock(session: &Mutex<MapSession>) -> MutexGuard<'_, MapSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

fn resolve(
    session: &Mutex<MapSession>,
    alerter: &dyn Alerter,
    ordering: SearchOrdering,
    request_id: u64,
    address: &str,
    result: Result<GeocodeResponse, MapError>,
) -> SearchOutcome {
    let failure = {
        let mut session = lock(session);
        if ordering == SearchOrdering::LatestDispatch && session.generation != request_id {
            log::debug!(
                "Dropping response to search #{} ({:?}); generation is now {}",
                request_id,
                address,
                session.generation
            );
            return SearchOutcome::Stale;
        }

        match result {
            Ok(response) => match response.first_location() {
                Some(location) => {
                    session.apply(location);
                    log::debug!("Search #{} resolved {:?} to {}", request_id, address, location);
                    return SearchOutcome::Applied(location);
                }
                None => {
                    log::warn!(
                        "Search #{} for {:?} failed with status {} ({} result(s))",
                        request_id,
                        address,
                        response.status,
                        response.results.len()
                    );
                    SearchFailure::Status(response.status)
                }
            },
            Err(e) => {
                log::warn!("Search #{} for {:?} failed: {}", request_id, address, e);
                SearchFailure::Unavailable(e)
            }
        }
    };

    // The session lock is released before the alert so a blocking alerter
    // cannot stall other callbacks.
    alerter.alert(SEARCH_FAILED_ALERT);
    SearchOutcome::Failed(failure)
}
