use log::debug;
use url::Url;

use super::common::{expect_scheme, link_port, link_server, transport_options, LinkScheme};
use super::DecodeError;
use crate::models::{ProxyEntry, ProxyType, SecurityMode, SecurityOptions, Transport};
use crate::utils::url::{query_params, split_list, url_decode};

/// Parse a Trojan link into a ProxyEntry
///
/// Format: `trojan://password@host[:port]?sni=..&alpn=..&type=ws|grpc#remark`.
/// Trojan always runs over TLS, so only explicit `sni`/`alpn` values are
/// recorded; `type` other than `ws` or `grpc` leaves the transport at `tcp`.
pub fn explode_trojan(trojan: &str) -> Result<ProxyEntry, DecodeError> {
    expect_scheme(trojan, LinkScheme::Trojan)?;

    let url = Url::parse(trojan.trim())?;

    let server = link_server(&url)?;
    let port = link_port(&url)?;

    let password = url_decode(url.username());
    if password.is_empty() {
        return Err(DecodeError::MissingField("password"));
    }

    let params = query_params(&url);
    let param = |key: &str| params.get(key).map(String::as_str);

    let mut node = ProxyEntry::new(ProxyType::Trojan, server, port, password);

    let sni = param("sni").map(str::to_string);
    let alpn = param("alpn").map(split_list).unwrap_or_default();
    if sni.is_some() || !alpn.is_empty() {
        let mut tls = SecurityOptions::new(SecurityMode::Tls);
        tls.server_name = sni;
        tls.alpn = alpn;
        node.security = Some(tls);
    }

    let network = param("type").map(str::to_ascii_lowercase);
    node.transport = match network.as_deref() {
        Some("ws") => Transport::Ws,
        Some("grpc") => Transport::Grpc,
        Some(other) => {
            debug!("Ignoring trojan network type {}", other);
            Transport::Tcp
        }
        None => Transport::Tcp,
    };

    let path = param("path").map(url_decode);
    node.transport_opts = transport_options(
        node.transport,
        path.as_deref(),
        param("host"),
        param("serviceName"),
    );

    Ok(node)
}
