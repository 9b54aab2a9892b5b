use url::Url;

use super::common::{
    coerce_transport, expect_scheme, link_port, link_server, transport_options, LinkScheme,
};
use super::DecodeError;
use crate::models::{
    ProtocolExtra, ProxyEntry, ProxyType, RealityOptions, SecurityMode, SecurityOptions,
};
use crate::utils::url::{query_params, split_list, url_decode};

/// Parse a VLESS link into a ProxyEntry
///
/// Format: `vless://uuid@host[:port]?type=..&security=..&sni=..#remark`
pub fn explode_vless(vless: &str) -> Result<ProxyEntry, DecodeError> {
    expect_scheme(vless, LinkScheme::Vless)?;

    let url = Url::parse(vless.trim())?;

    let server = link_server(&url)?;
    let port = link_port(&url)?;

    let uuid = url_decode(url.username());
    if uuid.is_empty() {
        return Err(DecodeError::MissingField("uuid"));
    }

    let params = query_params(&url);
    let param = |key: &str| params.get(key).map(String::as_str);

    let mut node = ProxyEntry::new(ProxyType::Vless, server, port, uuid);

    node.transport = coerce_transport(param("type"));

    let security = param("security").map(str::to_ascii_lowercase);
    let mode = match security.as_deref() {
        Some("tls") => SecurityMode::Tls,
        Some("reality") => SecurityMode::Reality,
        _ => SecurityMode::None,
    };

    if mode.is_tls() {
        let mut tls = SecurityOptions::new(mode);
        tls.server_name = Some(param("sni").unwrap_or(node.server.as_str()).to_string());
        tls.alpn = param("alpn").map(split_list).unwrap_or_default();
        tls.fingerprint = param("fp").map(str::to_string);
        if mode == SecurityMode::Reality {
            tls.reality = Some(RealityOptions {
                public_key: param("pbk").unwrap_or_default().to_string(),
                short_id: param("sid").unwrap_or_default().to_string(),
            });
        }
        node.security = Some(tls);
    }

    node.extra = ProtocolExtra::Vless {
        flow: param("flow").map(str::to_string),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Transport, TransportOptions};

    #[test]
    fn test_explode_vless_ws_tls() {
        let link = "vless://uuid123@example.com:443?type=ws&security=tls&sni=cdn.example.com&path=%2Fws&host=cdn.example.com#MyNode";
        let node = explode_vless(link).unwrap();

        assert_eq!(node.proxy_type, ProxyType::Vless);
        assert_eq!(node.server, "example.com");
        assert_eq!(node.port, 443);
        assert_eq!(node.credential, "uuid123");
        assert_eq!(node.transport, Transport::Ws);
        assert!(node.is_tls());
        assert_eq!(node.name, None);

        let security = node.security.as_ref().unwrap();
        assert_eq!(security.mode, SecurityMode::Tls);
        assert_eq!(security.server_name.as_deref(), Some("cdn.example.com"));
        assert_eq!(
            node.transport_opts,
            Some(TransportOptions::Ws {
                path: "/ws".to_string(),
                host: Some("cdn.example.com".to_string()),
            })
        );
    }

    #[test]
    fn test_explode_vless_reality() {
        let link = "vless://id@1.2.3.4:8443?security=reality&pbk=PUBKEY&fp=chrome&flow=xtls-rprx-vision&alpn=h2,http/1.1";
        let node = explode_vless(link).unwrap();

        let security = node.security.unwrap();
        assert_eq!(security.mode, SecurityMode::Reality);
        assert_eq!(security.server_name.as_deref(), Some("1.2.3.4"));
        assert_eq!(security.fingerprint.as_deref(), Some("chrome"));
        assert_eq!(security.alpn, vec!["h2", "http/1.1"]);
        assert_eq!(
            security.reality,
            Some(RealityOptions {
                public_key: "PUBKEY".to_string(),
                short_id: String::new(),
            })
        );
        assert_eq!(
            node.extra,
            ProtocolExtra::Vless {
                flow: Some("xtls-rprx-vision".to_string())
            }
        );
        assert_eq!(node.transport, Transport::Tcp);
        assert_eq!(node.transport_opts, None);
    }

    #[test]
    fn test_explode_vless_defaults() {
        let node = explode_vless("vless://id@example.org").unwrap();
        assert_eq!(node.port, 443);
        assert_eq!(node.transport, Transport::Tcp);
        assert_eq!(node.security, None);
        assert_eq!(node.extra, ProtocolExtra::Vless { flow: None });
    }

    #[test]
    fn test_explode_vless_unknown_tokens_are_coerced() {
        let node = explode_vless("vless://id@example.org:80?type=kcp&security=xtls").unwrap();
        assert_eq!(node.transport, Transport::Tcp);
        assert_eq!(node.security, None);
    }

    #[test]
    fn test_explode_vless_grpc_and_h2() {
        let node =
            explode_vless("vless://id@example.org?type=grpc&serviceName=svc&security=tls").unwrap();
        assert_eq!(
            node.transport_opts,
            Some(TransportOptions::Grpc {
                service_name: Some("svc".to_string())
            })
        );

        let node = explode_vless("vless://id@example.org?type=h2&path=%2Fh2&host=a.com").unwrap();
        assert_eq!(
            node.transport_opts,
            Some(TransportOptions::H2 {
                path: Some("/h2".to_string()),
                hosts: vec!["a.com".to_string()],
            })
        );
    }

    #[test]
    fn test_explode_vless_idn_host() {
        let node = explode_vless("vless://id@例子.com:443?security=tls").unwrap();
        assert_eq!(node.server, "例子.com");
        let security = node.security.unwrap();
        assert_eq!(security.server_name.as_deref(), Some("例子.com"));

        let node = explode_vless("vless://id@Example.COM:443").unwrap();
        assert_eq!(node.server, "example.com");
    }

    #[test]
    fn test_explode_vless_failures() {
        assert!(matches!(
            explode_vless("vless://id@:443"),
            Err(DecodeError::MalformedUrl(_)) | Err(DecodeError::MissingField("server"))
        ));
        assert!(matches!(
            explode_vless("vless://@example.com:443"),
            Err(DecodeError::MissingField("uuid"))
        ));
        assert!(matches!(
            explode_vless("vless://id@example.com:99999"),
            Err(DecodeError::MalformedUrl(_))
        ));
        assert!(matches!(
            explode_vless("trojan://id@example.com"),
            Err(DecodeError::SchemeMismatch { .. })
        ));
    }
}
