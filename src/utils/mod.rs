pub mod base64;
pub mod emoji;
pub mod file;
pub mod geo;
pub mod http;
pub mod url;
pub mod yaml;

// Re-export common utilities
pub use geo::{GeoLookup, GeoResolver};
pub use yaml::YamlNode;
