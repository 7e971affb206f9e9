// src/form_bridge.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::coordinate::Coordinate;

pub const LATITUDE_FIELD_ID: &str = "restaurant_latitude";
pub const LONGITUDE_FIELD_ID: &str = "restaurant_longitude";
pub const LATITUDE_FIELD_NAME: &str = "restaurant[latitude]";
pub const LONGITUDE_FIELD_NAME: &str = "restaurant[longitude]";

/// A hidden numeric input submitted with the enclosing form.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct HiddenField {
    pub id: &'static str,
    pub name: &'static str,
    pub value: Option<String>,
}

/// The pair of hidden fields that carries the resolved coordinate to the
/// server on submit.
///
/// The bridge performs no validation on write; range checks happen when the
/// server side reads the values back.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct FormBridge {
    latitude: HiddenField,
    longitude: HiddenField,
}

impl Default for FormBridge {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl FormBridge {
    /// Creates a bridge with the values the host page rendered into the form,
    /// if any.
    pub fn new(latitude: Option<String>, longitude: Option<String>) -> Self {
        FormBridge {
            latitude: HiddenField {
                id: LATITUDE_FIELD_ID,
                name: LATITUDE_FIELD_NAME,
                value: latitude,
            },
            longitude: HiddenField {
                id: LONGITUDE_FIELD_ID,
                name: LONGITUDE_FIELD_NAME,
                value: longitude,
            },
        }
    }

    /// Rebuilds the bridge from submitted form parameters keyed by field name.
    pub fn from_submission(params: &HashMap<String, String>) -> Self {
        Self::new(
            params.get(LATITUDE_FIELD_NAME).cloned(),
            params.get(LONGITUDE_FIELD_NAME).cloned(),
        )
    }

    /// Sets both fields from `coordinate`, using the shortest representation
    /// that round-trips the `f64`.
    pub fn write(&mut self, coordinate: Coordinate) {
        self.latitude.value = Some(coordinate.latitude().to_string());
        self.longitude.value = Some(coordinate.longitude().to_string());
    }

    /// Reads the submitted coordinate back.
    ///
    /// Returns `None` when either field is missing, blank, not a number, or
    /// outside the valid latitude/longitude range.
    pub fn read(&self) -> Option<Coordinate> {
        let latitude = parse_field(&self.latitude)?;
        let longitude = parse_field(&self.longitude)?;
        match Coordinate::new(latitude, longitude) {
            Ok(coordinate) => Some(coordinate),
            Err(e) => {
                log::warn!("Ignoring submitted coordinate: {}", e);
                None
            }
        }
    }

    pub fn latitude_value(&self) -> Option<&str> {
        self.latitude.value.as_deref()
    }

    pub fn longitude_value(&self) -> Option<&str> {
        self.longitude.value.as_deref()
    }

    pub fn fields(&self) -> [&HiddenField; 2] {
        [&self.latitude, &self.longitude]
    }
}

fn parse_field(field: &HiddenField) -> Option<f64> {
    field
        .value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
}
