use std::fmt;

use log::warn;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use super::common::{coerce_transport, expect_scheme, transport_options, LinkScheme};
use super::DecodeError;
use crate::models::{
    ProtocolExtra, ProxyEntry, ProxyType, SecurityMode, SecurityOptions, VmessCipher,
};
use crate::utils::base64::base64_decode_lenient;
use crate::utils::url::{normalize_host, split_list};

/// `tls` values that switch TLS on.
const TLS_TRUTHY: [&str; 3] = ["tls", "1", "true"];

/// Deserializes a field that may be a string, number or boolean into a
/// trimmed string; empty strings and null become `None`.
fn deserialize_loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LooseStringVisitor;

    impl<'de> Visitor<'de> for LooseStringVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("string, number or boolean")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let value = value.trim();
            Ok((!value.is_empty()).then(|| value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(LooseStringVisitor)
}

/// The JSON document carried by a `vmess://` link.
///
/// Every field is optional here; [`VmessPayload::into_entry`] enforces
/// which ones are required and applies the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VmessPayload {
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub add: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub port: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub id: Option<String>,
    /// alterId, defaults to 0
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub aid: Option<String>,
    /// Cipher, defaults to `auto`
    #[serde(rename = "type", deserialize_with = "deserialize_loose_string")]
    pub cipher: Option<String>,
    /// Transport, defaults to `tcp`
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub net: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub tls: Option<String>,
    /// Server name, defaults to `add` when TLS is on
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub sni: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub alpn: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub fp: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub host: Option<String>,
    /// WebSocket/HTTP2 path, or the gRPC service name
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub path: Option<String>,
}

impl VmessPayload {
    /// Validates the payload and builds the entry it describes.
    pub fn into_entry(self) -> Result<ProxyEntry, DecodeError> {
        let server = self
            .add
            .as_deref()
            .map(normalize_host)
            .ok_or(DecodeError::MissingField("add"))?;
        let port_str = self.port.ok_or(DecodeError::MissingField("port"))?;
        let port = match port_str.parse::<u16>() {
            Ok(port) if port != 0 => port,
            _ => {
                return Err(DecodeError::InvalidField {
                    field: "port",
                    value: port_str,
                })
            }
        };
        let uuid = self.id.ok_or(DecodeError::MissingField("id"))?;

        let alter_id = match self.aid.as_deref().map(str::parse::<u32>) {
            None => 0,
            Some(Ok(aid)) => aid,
            Some(Err(_)) => {
                warn!("Invalid alterId {:?}, using 0", self.aid);
                0
            }
        };

        let cipher = match self.cipher.as_deref() {
            None => VmessCipher::Auto,
            Some(token) => VmessCipher::from_token(token).unwrap_or_else(|| {
                warn!("Unsupported cipher {}, using auto", token);
                VmessCipher::Auto
            }),
        };

        let mut node = ProxyEntry::new(ProxyType::VMess, server, port, uuid);
        node.extra = ProtocolExtra::VMess { alter_id, cipher };
        node.transport = coerce_transport(self.net.as_deref());

        let tls_enabled = self
            .tls
            .as_deref()
            .is_some_and(|tls| TLS_TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(tls)));
        if tls_enabled {
            let mut tls = SecurityOptions::new(SecurityMode::Tls);
            tls.server_name = Some(self.sni.unwrap_or_else(|| node.server.clone()));
            tls.alpn = self.alpn.as_deref().map(split_list).unwrap_or_default();
            tls.fingerprint = self.fp;
            node.security = Some(tls);
        }

        node.transport_opts = transport_options(
            node.transport,
            self.path.as_deref(),
            self.host.as_deref(),
            self.path.as_deref(),
        );

        Ok(node)
    }
}

/// Parse a VMess link into a ProxyEntry
///
/// Format: `vmess://base64(json)[#remark]`; the payload may be unpadded and
/// use either base64 alphabet.
pub fn explode_vmess(vmess: &str) -> Result<ProxyEntry, DecodeError> {
    expect_scheme(vmess, LinkScheme::VMess)?;

    let encoded = &vmess.trim()[LinkScheme::VMess.prefix().len()..];
    let encoded = match encoded.find('#') {
        Some(pos) => &encoded[..pos],
        None => encoded,
    };
    if encoded.trim().is_empty() {
        return Err(DecodeError::MissingField("payload"));
    }

    let decoded = String::from_utf8(base64_decode_lenient(encoded)?)?;
    let payload: VmessPayload = serde_json::from_str(&decoded)?;

    payload.into_entry()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Transport, TransportOptions};
    use crate::utils::base64::base64_encode;

    fn vmess_link(json: &str) -> String {
        format!("vmess://{}", base64_encode(json))
    }

    #[test]
    fn test_explode_vmess_minimal() {
        let link = "vmess://eyJhZGQiOiIxLjIuMy40IiwicG9ydCI6NDQzLCJpZCI6ImFiYyIsIm5ldCI6InRjcCJ9";
        let node = explode_vmess(link).unwrap();

        assert_eq!(node.proxy_type, ProxyType::VMess);
        assert_eq!(node.server, "1.2.3.4");
        assert_eq!(node.port, 443);
        assert_eq!(node.credential, "abc");
        assert_eq!(node.transport, Transport::Tcp);
        assert_eq!(node.security, None);
        assert_eq!(
            node.extra,
            ProtocolExtra::VMess {
                alter_id: 0,
                cipher: VmessCipher::Auto
            }
        );
    }

    #[test]
    fn test_explode_vmess_ws_tls_with_fragment() {
        let json = r#"{"v":"2","ps":"remark","add":"example.com","port":"8443","id":"uuid-1","aid":"2","type":"chacha20-poly1305","net":"ws","host":"cdn.example.com","path":"/ray","tls":"tls"}"#;
        let encoded = base64_encode(json);
        let link = format!("vmess://{}#My%20Node", encoded.trim_end_matches('='));
        let node = explode_vmess(&link).unwrap();

        assert_eq!(node.port, 8443);
        assert_eq!(node.transport, Transport::Ws);
        assert_eq!(
            node.extra,
            ProtocolExtra::VMess {
                alter_id: 2,
                cipher: VmessCipher::Chacha20Poly1305
            }
        );
        let security = node.security.as_ref().unwrap();
        assert_eq!(security.mode, SecurityMode::Tls);
        assert_eq!(security.server_name.as_deref(), Some("example.com"));
        assert_eq!(
            node.transport_opts,
            Some(TransportOptions::Ws {
                path: "/ray".to_string(),
                host: Some("cdn.example.com".to_string()),
            })
        );
    }

    #[test]
    fn test_explode_vmess_coerces_unknown_tokens() {
        let link = vmess_link(
            r#"{"add":"a.com","port":443,"id":"x","type":"aes-256-cfb","net":"kcp","tls":true,"sni":"b.com"}"#,
        );
        let node = explode_vmess(&link).unwrap();

        assert_eq!(node.transport, Transport::Tcp);
        assert_eq!(
            node.extra,
            ProtocolExtra::VMess {
                alter_id: 0,
                cipher: VmessCipher::Auto
            }
        );
        assert_eq!(
            node.security.unwrap().server_name.as_deref(),
            Some("b.com")
        );
    }

    #[test]
    fn test_explode_vmess_grpc_uses_path_as_service() {
        let link = vmess_link(r#"{"add":"a.com","port":443,"id":"x","net":"grpc","path":"svc"}"#);
        let node = explode_vmess(&link).unwrap();
        assert_eq!(
            node.transport_opts,
            Some(TransportOptions::Grpc {
                service_name: Some("svc".to_string())
            })
        );
    }

    #[test]
    fn test_explode_vmess_server_is_lowercased() {
        let link = vmess_link(r#"{"add":" VM.Example.COM ","port":443,"id":"x","tls":"tls"}"#);
        let node = explode_vmess(&link).unwrap();
        assert_eq!(node.server, "vm.example.com");
        assert_eq!(
            node.security.unwrap().server_name.as_deref(),
            Some("vm.example.com")
        );
    }

    #[test]
    fn test_explode_vmess_missing_required_fields() {
        let missing_add = vmess_link(r#"{"port":443,"id":"x"}"#);
        assert!(matches!(
            explode_vmess(&missing_add),
            Err(DecodeError::MissingField("add"))
        ));

        let missing_id = vmess_link(r#"{"add":"a.com","port":443}"#);
        assert!(matches!(
            explode_vmess(&missing_id),
            Err(DecodeError::MissingField("id"))
        ));

        let bad_port = vmess_link(r#"{"add":"a.com","port":"https","id":"x"}"#);
        let err = explode_vmess(&bad_port).unwrap_err();
        assert_eq!(err.field(), Some("port"));
    }

    #[test]
    fn test_explode_vmess_invalid_payloads() {
        assert!(matches!(
            explode_vmess("vmess://"),
            Err(DecodeError::MissingField("payload"))
        ));
        assert!(matches!(
            explode_vmess("vmess://@@@@"),
            Err(DecodeError::InvalidBase64(_))
        ));
        assert!(matches!(
            explode_vmess(&vmess_link("not json")),
            Err(DecodeError::InvalidJson(_))
        ));
    }
}
