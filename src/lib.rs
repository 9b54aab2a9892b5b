pub mod generator;
pub mod interfaces;
pub mod models;
pub mod parser;
pub mod settings;
pub mod utils;

// Re-export the main proxy types for easier access
pub use models::{ProxyEntry, ProxyType};

// Re-export the conversion entry points
pub use generator::Template;
pub use interfaces::{convert_file, convert_lines, ConversionReport, ConvertError};
pub use parser::{explode, DecodeError};
pub use settings::Settings;
