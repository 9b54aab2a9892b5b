//! Server geolocation for display names
//!
//! [`GeoResolver`] wraps a [`GeoLookup`] backend with a per-run cache and a
//! courtesy delay before every uncached request. It never fails: any lookup
//! error degrades to [`GeoRecord::unknown`].

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::models::GeoRecord;
use crate::settings::GeoSettings;
use crate::utils::http::web_get;

/// Placeholder substituted with the host in lookup endpoint templates.
pub const HOST_PLACEHOLDER: &str = "{host}";

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Lookup disabled")]
    Disabled,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Lookup rejected: {0}")]
    Rejected(String),
}

/// A source of country information for a bare host or IP address.
pub trait GeoLookup {
    fn lookup(&mut self, host: &str) -> Result<GeoRecord, GeoError>;
}

/// Backend used when geolocation is turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledLookup;

impl GeoLookup for DisabledLookup {
    fn lookup(&mut self, _host: &str) -> Result<GeoRecord, GeoError> {
        Err(GeoError::Disabled)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

/// ip-api.com style JSON endpoint (`countryCode` + `country` fields).
#[derive(Debug, Clone)]
pub struct IpApiLookup {
    endpoint: String,
    timeout: Duration,
}

impl IpApiLookup {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        IpApiLookup {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    fn url_for(&self, host: &str) -> String {
        if self.endpoint.contains(HOST_PLACEHOLDER) {
            self.endpoint.replace(HOST_PLACEHOLDER, host)
        } else {
            format!("{}/{}", self.endpoint.trim_end_matches('/'), host)
        }
    }

    fn parse_response(body: &str) -> Result<GeoRecord, GeoError> {
        let response: IpApiResponse = serde_json::from_str(body)?;
        if response.status.as_deref() == Some("fail") {
            return Err(GeoError::Rejected(
                response.message.unwrap_or_else(|| "fail".to_string()),
            ));
        }
        let code = match response.country_code {
            Some(code) if !code.is_empty() => code,
            _ => return Err(GeoError::Rejected("missing countryCode".to_string())),
        };
        let country = response.country.unwrap_or_else(|| "Unknown".to_string());
        Ok(GeoRecord::new(&code, &country))
    }
}

impl GeoLookup for IpApiLookup {
    fn lookup(&mut self, host: &str) -> Result<GeoRecord, GeoError> {
        let body = web_get(&self.url_for(host), self.timeout).map_err(GeoError::Network)?;
        Self::parse_response(&body)
    }
}

/// Strips a trailing `:port` from a server address.
///
/// Bracketed IPv6 literals lose their brackets; bare IPv6 addresses are
/// returned untouched since their colons are not port separators.
pub fn strip_port(address: &str) -> &str {
    let address = address.trim();
    if let Some(rest) = address.strip_prefix('[') {
        return match rest.find(']') {
            Some(end) => &rest[..end],
            None => rest,
        };
    }
    match address.rsplit_once(':') {
        Some((host, port))
            if !host.contains(':') && !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) =>
        {
            host
        }
        _ => address,
    }
}

/// Caching, rate-limited front of a [`GeoLookup`] backend.
///
/// One resolver lives for one conversion run.
pub struct GeoResolver {
    backend: Box<dyn GeoLookup>,
    cache: HashMap<String, GeoRecord>,
    delay: Duration,
    cache_failures: bool,
    lookups: usize,
}

impl GeoResolver {
    pub fn new(backend: Box<dyn GeoLookup>) -> Self {
        GeoResolver {
            backend,
            cache: HashMap::new(),
            delay: Duration::ZERO,
            cache_failures: false,
            lookups: 0,
        }
    }

    /// Builds a resolver from run settings.
    pub fn from_settings(settings: &GeoSettings) -> Self {
        if !settings.enabled {
            return GeoResolver::new(Box::new(DisabledLookup));
        }
        let backend = IpApiLookup::new(
            settings.endpoint.clone(),
            Duration::from_secs(settings.timeout_secs),
        );
        GeoResolver::new(Box::new(backend))
            .with_delay(Duration::from_millis(settings.delay_ms))
            .with_cache_failures(settings.cache_failures)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_cache_failures(mut self, cache_failures: bool) -> Self {
        self.cache_failures = cache_failures;
        self
    }

    /// Number of backend lookups issued so far.
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    /// Resolves the country of `server`, which may carry a `:port` suffix.
    pub fn resolve(&mut self, server: &str) -> GeoRecord {
        let host = strip_port(server);
        if let Some(record) = self.cache.get(host) {
            debug!("Geo cache hit for {}", host);
            return record.clone();
        }

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.lookups += 1;

        match self.backend.lookup(host) {
            Ok(record) => {
                self.cache.insert(host.to_string(), record.clone());
                record
            }
            Err(GeoError::Disabled) => {
                let record = GeoRecord::unknown();
                self.cache.insert(host.to_string(), record.clone());
                record
            }
            Err(e) => {
                warn!("Failed to get geo info for {}: {}", server, e);
                let record = GeoRecord::unknown();
                if self.cache_failures {
                    self.cache.insert(host.to_string(), record.clone());
                }
                record
            }
        }
    }
}
