// src/coordinate.rs

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Tokyo Station; used when the page supplies no seed position.
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    latitude: 35.681236,
    longitude: 139.767125,
};

/// Represents a geographical point.
///
/// A `Coordinate` is never mutated in place: every geocode resolution or
/// marker drag produces a new value.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = MapError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Creates a new `Coordinate`.
    ///
    /// # Errors
    /// Returns `MapError::InvalidCoordinate` if latitude is not between -90 and 90,
    /// longitude is not between -180 and 180, or either value is not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, MapError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(MapError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Coordinate {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds_and_rejects_outside() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(matches!(
            Coordinate::new(90.1, 0.0),
            Err(MapError::InvalidCoordinate { .. })
        ));
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn deserialization_validates_range() {
        let ok: Coordinate =
            serde_json::from_str(r#"{"latitude":35.6595,"longitude":139.7005}"#).unwrap();
        assert_eq!(ok.latitude(), 35.6595);

        let bad = serde_json::from_str::<Coordinate>(r#"{"latitude":135.0,"longitude":0.0}"#);
        assert!(bad.is_err());
    }
}
