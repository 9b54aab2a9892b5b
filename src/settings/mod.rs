//! Settings module for linkforge
//!
//! Run configuration, loaded from an optional TOML/YAML/JSON file and
//! overridden from the command line.

pub mod settings_struct;

pub use settings_struct::{GeoSettings, Settings, SettingsError};
