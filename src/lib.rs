pub mod config;
pub mod coordinate;
pub mod error;
pub mod form_bridge;
pub mod geocoding;
pub mod map;
pub mod picture;
pub mod restaurant;

pub use config::MapConfig;
pub use coordinate::Coordinate;
pub use error::MapError;
pub use form_bridge::FormBridge;
pub use geocoding::{AddressQuery, GeocodeResponse, GeocodeStatus, Geocoder};
pub use map::{MapController, PageData, SearchOrdering, SearchOutcome};
pub use restaurant::Restaurant;
