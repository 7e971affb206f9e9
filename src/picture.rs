use serde::{Deserialize, Serialize};

/// Largest accepted picture, in bytes.
pub const MAX_PICTURE_BYTES: u64 = 5 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Shown in place of a restaurant that has no picture.
pub const DEFAULT_URL: &str = "default.png";

/// A picture attached to a restaurant form, before it is handed to storage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PictureUpload {
    pub file_name: String,
    pub size_bytes: u64,
}

impl PictureUpload {
    pub fn new(file_name: impl Into<String>, size_bytes: u64) -> Self {
        PictureUpload {
            file_name: file_name.into(),
            size_bytes,
        }
    }

    /// Lowercased extension, without the dot.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn has_allowed_extension(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
    }

    pub fn is_within_size_limit(&self) -> bool {
        self.size_bytes <= MAX_PICTURE_BYTES
    }
}

/// Named square crops kept next to the original. Only the naming lives here;
/// producing the crops is the storage service's job.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PictureVersion {
    /// Detail page.
    Thumb400,
    /// Listing.
    Thumb200,
    Thumb100,
}

impl PictureVersion {
    pub const ALL: [PictureVersion; 3] = [
        PictureVersion::Thumb400,
        PictureVersion::Thumb200,
        PictureVersion::Thumb100,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PictureVersion::Thumb400 => "thumb400",
            PictureVersion::Thumb200 => "thumb200",
            PictureVersion::Thumb100 => "thumb100",
        }
    }

    /// Edge length of the square crop, in pixels.
    pub fn edge(&self) -> u32 {
        match self {
            PictureVersion::Thumb400 => 400,
            PictureVersion::Thumb200 => 200,
            PictureVersion::Thumb100 => 100,
        }
    }

    /// Path of this version of `file_name` inside `store_dir`.
    pub fn path(&self, store_dir: &str, file_name: &str) -> String {
        format!("{}/{}_{}", store_dir, self.name(), file_name)
    }
}

/// Directory an upload is stored under, e.g. `uploads/restaurant/images/42`.
pub fn store_dir(model_name: &str, mounted_as: &str, id: u64) -> String {
    format!("uploads/{}/{}/{}", underscore(model_name), mounted_as, id)
}

// "RestaurantPhoto" -> "restaurant_photo"
fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
