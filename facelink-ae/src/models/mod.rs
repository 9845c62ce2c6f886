//! Data model for the auto-enrollment pipeline

pub mod mapping;
pub mod notification;

pub use mapping::{Conditions, Range, StreamConfiguration};
pub use notification::{CropCoordinates, FrameInformation, Notification};

/// Serde helper for binary fields carried as base64 strings in JSON bodies.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
