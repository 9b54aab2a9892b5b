use log::warn;
use url::Url;

use super::DecodeError;
use crate::models::{ProxyEntry, ProxyType, Transport, TransportOptions, DEFAULT_PORT};
use crate::utils::url::bare_host;

/// Default WebSocket path when a link does not carry one.
pub const DEFAULT_WS_PATH: &str = "/";

/// Link schemes with a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkScheme {
    Vless,
    VMess,
    Trojan,
}

impl LinkScheme {
    pub fn prefix(self) -> &'static str {
        match self {
            LinkScheme::Vless => "vless://",
            LinkScheme::VMess => "vmess://",
            LinkScheme::Trojan => "trojan://",
        }
    }

    pub fn proxy_type(self) -> ProxyType {
        match self {
            LinkScheme::Vless => ProxyType::Vless,
            LinkScheme::VMess => ProxyType::VMess,
            LinkScheme::Trojan => ProxyType::Trojan,
        }
    }

    /// Detects the scheme of a link; matching is case-insensitive.
    pub fn detect(link: &str) -> Option<LinkScheme> {
        [LinkScheme::Vless, LinkScheme::VMess, LinkScheme::Trojan]
            .into_iter()
            .find(|scheme| has_prefix(link, scheme.prefix()))
    }
}

fn has_prefix(link: &str, prefix: &str) -> bool {
    link.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Checks that `link` starts with the scheme a decoder expects.
pub(crate) fn expect_scheme(link: &str, scheme: LinkScheme) -> Result<(), DecodeError> {
    if has_prefix(link, scheme.prefix()) {
        Ok(())
    } else {
        Err(DecodeError::SchemeMismatch {
            expected: scheme.proxy_type().label(),
        })
    }
}

/// Explode a proxy link into a ProxyEntry
///
/// This function detects the type of proxy link and calls the appropriate decoder
pub fn explode(link: &str) -> Result<ProxyEntry, DecodeError> {
    let link = link.trim();

    match LinkScheme::detect(link) {
        Some(LinkScheme::Vless) => super::vless::explode_vless(link),
        Some(LinkScheme::VMess) => super::vmess::explode_vmess(link),
        Some(LinkScheme::Trojan) => super::trojan::explode_trojan(link),
        None => Err(DecodeError::UnsupportedScheme(describe_scheme(link))),
    }
}

/// Short description of an unsupported link for log lines.
fn describe_scheme(link: &str) -> String {
    match link.find("://") {
        Some(pos) => link[..pos + 3].to_string(),
        None => {
            let head: String = link.chars().take(50).collect();
            if head.len() < link.len() {
                format!("{}...", head)
            } else {
                head
            }
        }
    }
}

/// Server of a parsed link, decoded and lowercased.
///
/// A host that is present but cannot be decoded is rejected rather than
/// passed through in its encoded form.
pub(crate) fn link_server(url: &Url) -> Result<String, DecodeError> {
    match bare_host(url) {
        Some(server) => Ok(server),
        None => match url.host_str().filter(|h| !h.is_empty()) {
            Some(raw) => Err(DecodeError::InvalidField {
                field: "server",
                value: raw.to_string(),
            }),
            None => Err(DecodeError::MissingField("server")),
        },
    }
}

/// Port of a parsed link, 443 when absent. Port 0 is rejected.
pub(crate) fn link_port(url: &Url) -> Result<u16, DecodeError> {
    match url.port().unwrap_or(DEFAULT_PORT) {
        0 => Err(DecodeError::InvalidField {
            field: "port",
            value: "0".to_string(),
        }),
        port => Ok(port),
    }
}

/// Maps a transport token onto the supported set.
///
/// Missing tokens mean `tcp`; unknown ones are coerced to `tcp` with a warning.
pub(crate) fn coerce_transport(token: Option<&str>) -> Transport {
    let Some(token) = token else {
        return Transport::Tcp;
    };
    match Transport::from_token(token) {
        Some(transport) => transport,
        None => {
            warn!("Unsupported network type {}, using tcp", token);
            Transport::Tcp
        }
    }
}

/// Builds the option block matching `transport`, if it has one.
///
/// `path` is used as the WebSocket/HTTP2 path, `host` as the Host header or
/// the HTTP/2 host list, and `service_name` as the gRPC service.
pub(crate) fn transport_options(
    transport: Transport,
    path: Option<&str>,
    host: Option<&str>,
    service_name: Option<&str>,
) -> Option<TransportOptions> {
    match transport {
        Transport::Ws => Some(TransportOptions::Ws {
            path: path.unwrap_or(DEFAULT_WS_PATH).to_string(),
            host: host.map(str::to_string),
        }),
        Transport::Grpc => Some(TransportOptions::Grpc {
            service_name: service_name.map(str::to_string),
        }),
        Transport::H2 => Some(TransportOptions::H2 {
            path: path.map(str::to_string),
            hosts: host.map(|h| vec![h.to_string()]).unwrap_or_default(),
        }),
        _ => None,
    }
}
