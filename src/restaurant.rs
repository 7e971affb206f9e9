// src/restaurant.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::form_bridge::FormBridge;
use crate::geocoding::{AddressQuery, Geocoder};
use crate::map::PageData;
use crate::picture::{PictureUpload, ALLOWED_EXTENSIONS, MAX_PICTURE_BYTES};
use crate::MapError;

pub const NAME_MAX_CHARS: usize = 30;
pub const DESCRIPTION_MAX_CHARS: usize = 140;

const NAME_PARAM: &str = "restaurant[name]";
const DESCRIPTION_PARAM: &str = "restaurant[description]";
const CATEGORY_PARAM: &str = "category_id";
const ADDRESS_PARAM: &str = "restaurant[city_address]";

/// A restaurant listing as the registration and edit forms see it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Restaurant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub city_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
    #[serde(default)]
    pub images: Vec<PictureUpload>,
    pub created_at: DateTime<Utc>,
}

impl Restaurant {
    pub fn new(name: impl Into<String>) -> Self {
        Restaurant {
            id: None,
            name: name.into(),
            description: String::new(),
            category_id: None,
            city_address: String::new(),
            location: None,
            images: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Copies submitted form values onto the listing.
    ///
    /// Only keys present in `params` are touched. The hidden coordinate fields
    /// are read through [`FormBridge::from_submission`]. Every value is parsed
    /// before anything is assigned, so a rejected submission leaves the
    /// listing as it was.
    pub fn apply_submission(&mut self, params: &HashMap<String, String>) -> Result<(), MapError> {
        let category_id = match params.get(CATEGORY_PARAM).map(|c| c.trim()) {
            Some("") => Some(None),
            Some(category) => Some(Some(category.parse::<u64>().map_err(|_| {
                MapError::InvalidInput(format!("category_id is not a number: '{}'", category))
            })?)),
            None => None,
        };
        let name = params.get(NAME_PARAM).map(|n| n.trim().to_string());
        let description = params.get(DESCRIPTION_PARAM).map(|d| d.trim().to_string());
        let city_address = params.get(ADDRESS_PARAM).map(|a| a.trim().to_string());
        let bridge = FormBridge::from_submission(params);

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(category_id) = category_id {
            self.category_id = category_id;
        }
        if let Some(city_address) = city_address {
            self.city_address = city_address;
        }
        self.apply_form_bridge(&bridge);
        Ok(())
    }

    /// Takes the coordinate carried by the hidden fields. An absent reading
    /// keeps the current location.
    pub fn apply_form_bridge(&mut self, bridge: &FormBridge) {
        if let Some(coordinate) = bridge.read() {
            self.location = Some(coordinate);
        }
    }

    /// Checks the listing before it is stored, collecting every failure.
    pub fn validate(&self) -> Result<(), MapError> {
        let mut messages = Vec::new();

        let name_len = self.name.trim().chars().count();
        if name_len == 0 {
            messages.push("名前を入力してください".to_string());
        } else if name_len > NAME_MAX_CHARS {
            messages.push(format!("名前は{}文字以内で入力してください", NAME_MAX_CHARS));
        }

        if self.description.chars().count() > DESCRIPTION_MAX_CHARS {
            messages.push(format!(
                "説明は{}文字以内で入力してください",
                DESCRIPTION_MAX_CHARS
            ));
        }

        for image in &self.images {
            if !image.is_within_size_limit() {
                messages.push(format!(
                    "画像：{}MBより大きい画像はアップロードできません。（{}）",
                    MAX_PICTURE_BYTES / (1024 * 1024),
                    image.file_name
                ));
            }
            if !image.has_allowed_extension() {
                messages.push(format!(
                    "画像：{}の形式はアップロードできません。（{}のみ）",
                    image.file_name,
                    ALLOWED_EXTENSIONS.join(", ")
                ));
            }
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(MapError::Validation { messages })
        }
    }

    /// Geocodes the address on the server after validation, when it changed.
    ///
    /// Returns `Ok(true)` when the location was replaced. A blank or unchanged
    /// address skips the lookup, and a non-OK answer leaves the location alone.
    /// Transport failures are returned to the caller.
    pub async fn geocode_if_address_changed(
        &mut self,
        previous_address: Option<&str>,
        geocoder: &dyn Geocoder,
        region: &str,
    ) -> Result<bool, MapError> {
        let address = self.city_address.trim();
        if address.is_empty() || previous_address.map(str::trim) == Some(address) {
            return Ok(false);
        }

        let response = geocoder.geocode(AddressQuery::new(address, region)).await?;
        match response.first_location() {
            Some(location) => {
                log::debug!("Geocoded {:?} to {}", address, location);
                self.location = Some(location);
                Ok(true)
            }
            None => {
                log::warn!(
                    "Server-side geocode of {:?} returned {}; keeping previous location",
                    address,
                    response.status
                );
                Ok(false)
            }
        }
    }

    /// Comments left on this listing, in the order given.
    pub fn feed_comment<'a>(&self, comments: &'a [Comment]) -> Vec<&'a Comment> {
        match self.id {
            Some(id) => feed_comment(comments, id),
            None => Vec::new(),
        }
    }

    /// Drops the comments and favorites that belong to this listing, for use
    /// when the listing itself is deleted. Returns how many of each were removed.
    pub fn remove_dependents(
        &self,
        comments: &mut Vec<Comment>,
        favorites: &mut Vec<Favorite>,
    ) -> (usize, usize) {
        let Some(id) = self.id else {
            return (0, 0);
        };
        let (comments_before, favorites_before) = (comments.len(), favorites.len());
        comments.retain(|c| c.restaurant_id != id);
        favorites.retain(|f| f.restaurant_id != id);
        let removed = (
            comments_before - comments.len(),
            favorites_before - favorites.len(),
        );
        log::debug!(
            "Removed {} comment(s) and {} favorite(s) of restaurant {}",
            removed.0,
            removed.1,
            id
        );
        removed
    }

    /// Seed for the edit page's map.
    pub fn page_data(&self) -> PageData {
        PageData::new(
            self.location.map(|c| c.latitude()),
            self.location.map(|c| c.longitude()),
        )
    }
}

/// A user's comment on a listing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Comment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub restaurant_id: u64,
    pub user_id: u64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(restaurant_id: u64, user_id: u64, body: impl Into<String>) -> Self {
        Comment {
            id: None,
            restaurant_id,
            user_id,
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// A user marking a listing as a favorite.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Favorite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub restaurant_id: u64,
    pub user_id: u64,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub fn new(restaurant_id: u64, user_id: u64) -> Self {
        Favorite {
            id: None,
            restaurant_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}

/// Comments posted on the listing `restaurant_id`, in the order given.
pub fn feed_comment(comments: &[Comment], restaurant_id: u64) -> Vec<&Comment> {
    comments
        .iter()
        .filter(|c| c.restaurant_id == restaurant_id)
        .collect()
}

/// Default listing order: newest first.
pub fn sort_newest_first(restaurants: &mut [Restaurant]) {
    restaurants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Listings whose name contains `term`, ignoring case. The term is matched
/// literally.
pub fn search_by_name<'a>(
    restaurants: &'a [Restaurant],
    term: &str,
) -> Result<Vec<&'a Restaurant>, MapError> {
    let pattern = RegexBuilder::new(&regex::escape(term.trim()))
        .case_insensitive(true)
        .build()
        .map_err(|e| MapError::InvalidInput(format!("search term: {}", e)))?;
    Ok(restaurants
        .iter()
        .filter(|r| pattern.is_match(&r.name))
        .collect())
}
