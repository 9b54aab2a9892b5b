//! Share-link decoders
//!
//! Each decoder turns one link into a [`ProxyEntry`](crate::models::ProxyEntry)
//! or a [`DecodeError`] explaining why the link was rejected. Unsupported
//! transport or cipher tokens are not errors: they are coerced to a default
//! and logged.

pub mod common;
pub mod trojan;
pub mod vless;
pub mod vmess;

use thiserror::Error;

pub use common::{explode, LinkScheme};
pub use trojan::explode_trojan;
pub use vless::explode_vless;
pub use vmess::explode_vmess;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Not a {expected} link")]
    SchemeMismatch { expected: &'static str },

    #[error("Unsupported protocol in link: {0}")]
    UnsupportedScheme(String),

    #[error("Malformed URL: {0}")]
    MalformedUrl(#[from] url::ParseError),

    #[error("Missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Invalid value for `{field}`: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl DecodeError {
    /// The offending field, when the failure can be pinned to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            DecodeError::MissingField(field) => Some(*field),
            DecodeError::InvalidField { field, .. } => Some(*field),
            _ => None,
        }
    }
}
