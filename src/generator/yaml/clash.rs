//! Clash/Mihomo proxy entries
//!
//! Serde model of the `proxies` items written to the output configuration.

use serde::Serialize;

use crate::models::{
    ProtocolExtra, ProxyEntry, ProxyType, RealityOptions, SecurityOptions, Transport,
    TransportOptions,
};

fn is_empty_option_string(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, str::is_empty)
}

fn is_empty_option_vec(v: &Option<Vec<String>>) -> bool {
    v.as_ref().map_or(true, Vec::is_empty)
}

/// Common proxy options shared by every proxy type
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct CommonProxyOptions {
    pub name: String,
    pub server: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_cert_verify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub servername: Option<String>,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub sni: Option<String>,
    #[serde(skip_serializing_if = "is_empty_option_vec")]
    pub alpn: Option<Vec<String>>,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub client_fingerprint: Option<String>,
}

/// Factory methods for CommonProxyOptions
impl CommonProxyOptions {
    /// Create a new CommonProxyOptions with default values
    pub fn new(name: String, server: String, port: u16) -> Self {
        Self {
            name,
            server,
            port,
            udp: None,
            skip_cert_verify: None,
            tls: None,
            servername: None,
            sni: None,
            alpn: None,
            client_fingerprint: None,
        }
    }

    /// Create a builder for CommonProxyOptions
    pub fn builder(name: String, server: String, port: u16) -> CommonProxyOptionsBuilder {
        CommonProxyOptionsBuilder {
            common: Self::new(name, server, port),
        }
    }
}

/// Builder for CommonProxyOptions
pub struct CommonProxyOptionsBuilder {
    common: CommonProxyOptions,
}

impl CommonProxyOptionsBuilder {
    pub fn udp(mut self, value: bool) -> Self {
        self.common.udp = Some(value);
        self
    }

    pub fn skip_cert_verify(mut self, value: bool) -> Self {
        self.common.skip_cert_verify = Some(value);
        self
    }

    pub fn tls(mut self, value: bool) -> Self {
        self.common.tls = Some(value);
        self
    }

    /// Copy the TLS parameters of `security`, naming the server as
    /// `servername` or `sni` depending on the proxy type.
    pub fn security(mut self, security: &SecurityOptions, server_name_as_sni: bool) -> Self {
        if server_name_as_sni {
            self.common.sni = security.server_name.clone();
        } else {
            self.common.servername = security.server_name.clone();
        }
        if !security.alpn.is_empty() {
            self.common.alpn = Some(security.alpn.clone());
        }
        self.common.client_fingerprint = security.fingerprint.clone();
        self
    }

    /// Build the final CommonProxyOptions
    pub fn build(self) -> CommonProxyOptions {
        self.common
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WsHeaders {
    #[serde(rename = "Host")]
    pub host: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WsOpts {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<WsHeaders>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct GrpcOpts {
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub grpc_service_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct H2Opts {
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub host: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RealityOpts {
    pub public_key: String,
    pub short_id: String,
}

impl From<&RealityOptions> for RealityOpts {
    fn from(reality: &RealityOptions) -> Self {
        RealityOpts {
            public_key: reality.public_key.clone(),
            short_id: reality.short_id.clone(),
        }
    }
}

/// `network` plus the option block of that network
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<WsOpts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_opts: Option<GrpcOpts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h2_opts: Option<H2Opts>,
}

impl NetworkOptions {
    /// Builds the network fields of `entry`; `tcp` is only spelled out
    /// when `explicit_tcp` is set.
    fn from_entry(entry: &ProxyEntry, explicit_tcp: bool) -> Self {
        let mut options = NetworkOptions::default();
        if explicit_tcp || entry.transport != Transport::Tcp {
            options.network = Some(entry.transport.as_str().to_string());
        }

        match &entry.transport_opts {
            Some(TransportOptions::Ws { path, host }) => {
                options.ws_opts = Some(WsOpts {
                    path: path.clone(),
                    headers: host.clone().map(|host| WsHeaders { host }),
                });
            }
            Some(TransportOptions::Grpc { service_name }) => {
                options.grpc_opts = Some(GrpcOpts {
                    grpc_service_name: service_name.clone(),
                });
            }
            Some(TransportOptions::H2 { path, hosts }) => {
                options.h2_opts = Some(H2Opts {
                    path: path.clone(),
                    host: hosts.clone(),
                });
            }
            None => {}
        }
        options
    }
}

/// Represents a single proxy in Clash configuration
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClashProxy {
    #[serde(rename = "vless")]
    Vless {
        #[serde(flatten)]
        common: CommonProxyOptions,
        uuid: String,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        flow: Option<String>,
        #[serde(flatten)]
        network: NetworkOptions,
        #[serde(rename = "reality-opts", skip_serializing_if = "Option::is_none")]
        reality_opts: Option<RealityOpts>,
    },
    #[serde(rename = "vmess")]
    VMess {
        #[serde(flatten)]
        common: CommonProxyOptions,
        uuid: String,
        #[serde(rename = "alterId")]
        alter_id: u32,
        cipher: String,
        #[serde(flatten)]
        network: NetworkOptions,
    },
    #[serde(rename = "trojan")]
    Trojan {
        #[serde(flatten)]
        common: CommonProxyOptions,
        password: String,
        #[serde(flatten)]
        network: NetworkOptions,
    },
}

impl ClashProxy {
    pub fn common(&self) -> &CommonProxyOptions {
        match self {
            ClashProxy::Vless { common, .. }
            | ClashProxy::VMess { common, .. }
            | ClashProxy::Trojan { common, .. } => common,
        }
    }
}

impl From<&ProxyEntry> for ClashProxy {
    fn from(entry: &ProxyEntry) -> Self {
        let mut builder =
            CommonProxyOptions::builder(entry.name().to_string(), entry.server.clone(), entry.port)
                .udp(true)
                .skip_cert_verify(true);

        match entry.proxy_type {
            ProxyType::Vless => {
                builder = builder.tls(entry.is_tls());
                if let Some(security) = entry.security.as_ref().filter(|s| s.mode.is_tls()) {
                    builder = builder.security(security, false);
                }
                let flow = match &entry.extra {
                    ProtocolExtra::Vless { flow } => flow.clone(),
                    _ => None,
                };
                let reality_opts = entry
                    .security
                    .as_ref()
                    .and_then(|s| s.reality.as_ref())
                    .map(RealityOpts::from);
                ClashProxy::Vless {
                    common: builder.build(),
                    uuid: entry.credential.clone(),
                    flow,
                    network: NetworkOptions::from_entry(entry, true),
                    reality_opts,
                }
            }
            ProxyType::VMess => {
                if let Some(security) = entry.security.as_ref().filter(|s| s.mode.is_tls()) {
                    builder = builder.tls(true).security(security, false);
                }
                let (alter_id, cipher) = match &entry.extra {
                    ProtocolExtra::VMess { alter_id, cipher } => (*alter_id, *cipher),
                    _ => (0, Default::default()),
                };
                ClashProxy::VMess {
                    common: builder.build(),
                    uuid: entry.credential.clone(),
                    alter_id,
                    cipher: cipher.as_str().to_string(),
                    network: NetworkOptions::from_entry(entry, true),
                }
            }
            ProxyType::Trojan => {
                if let Some(security) = &entry.security {
                    builder = builder.security(security, true);
                }
                ClashProxy::Trojan {
                    common: builder.build(),
                    password: entry.credential.clone(),
                    network: NetworkOptions::from_entry(entry, false),
                }
            }
        }
    }
}
