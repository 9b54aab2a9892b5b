//! Core data models for the application
//!
//! This module contains the primary data structures used throughout the application,
//! separated from the logic that operates on them.
//!
//! # Usage
//!
//! ```rust
//! use linkforge::models::{ProxyEntry, ProxyType, Transport};
//!
//! let mut entry = ProxyEntry::new(
//!     ProxyType::Trojan,
//!     "example.com".to_string(),
//!     443,
//!     "password".to_string(),
//! );
//! assert_eq!(entry.transport, Transport::Tcp);
//! assert!(entry.assign_name("🌍 TROJAN 01".to_string()));
//! ```

mod geo;
mod proxy;

pub use geo::*;
pub use proxy::*;
