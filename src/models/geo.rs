use crate::utils::emoji::{country_code_to_emoji, FALLBACK_FLAG};

/// Country code reported when the location of a server is unknown.
pub const UNKNOWN_COUNTRY_CODE: &str = "XX";

/// Geolocation of a server, as used for display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoRecord {
    pub code: String,
    pub country_name: String,
    pub emoji: String,
}

impl GeoRecord {
    /// Builds a record from a provider answer, deriving the flag glyph.
    pub fn new(code: &str, country_name: &str) -> Self {
        GeoRecord {
            code: code.to_uppercase(),
            country_name: country_name.to_string(),
            emoji: country_code_to_emoji(code),
        }
    }

    /// Placeholder for servers whose location could not be resolved.
    pub fn unknown() -> Self {
        GeoRecord {
            code: UNKNOWN_COUNTRY_CODE.to_string(),
            country_name: "Unknown".to_string(),
            emoji: FALLBACK_FLAG.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.code == UNKNOWN_COUNTRY_CODE
    }
}
