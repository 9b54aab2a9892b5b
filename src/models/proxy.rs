//! Proxy model definitions
//!
//! Contains the core data structures produced by the link decoders.

use std::fmt;

/// Represents the protocol of a decoded share link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyType {
    Vless,
    VMess,
    Trojan,
}

impl ProxyType {
    /// Lowercase name used as the `type` key of the emitted config entry.
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyType::Vless => "vless",
            ProxyType::VMess => "vmess",
            ProxyType::Trojan => "trojan",
        }
    }

    /// Uppercase label used when building display names.
    pub fn label(self) -> &'static str {
        match self {
            ProxyType::Vless => "VLESS",
            ProxyType::VMess => "VMESS",
            ProxyType::Trojan => "TROJAN",
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stream carrier the proxy protocol runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transport {
    #[default]
    Tcp,
    Udp,
    Ws,
    Http,
    H2,
    Grpc,
    Quic,
}

impl Transport {
    pub const ALL: [Transport; 7] = [
        Transport::Tcp,
        Transport::Udp,
        Transport::Ws,
        Transport::Http,
        Transport::H2,
        Transport::Grpc,
        Transport::Quic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Udp => "udp",
            Transport::Ws => "ws",
            Transport::Http => "http",
            Transport::H2 => "h2",
            Transport::Grpc => "grpc",
            Transport::Quic => "quic",
        }
    }

    /// Looks up a transport token case-insensitively.
    pub fn from_token(token: &str) -> Option<Transport> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(token))
    }
}

/// Security layer applied on top of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecurityMode {
    #[default]
    None,
    Tls,
    Reality,
}

impl SecurityMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityMode::None => "none",
            SecurityMode::Tls => "tls",
            SecurityMode::Reality => "reality",
        }
    }

    /// Whether a TLS handshake takes place (`reality` rides on TLS).
    pub fn is_tls(self) -> bool {
        matches!(self, SecurityMode::Tls | SecurityMode::Reality)
    }
}

/// VMess payload encryption method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VmessCipher {
    #[default]
    Auto,
    Aes128Gcm,
    Chacha20Poly1305,
    None,
    Zero,
}

impl VmessCipher {
    pub const ALL: [VmessCipher; 5] = [
        VmessCipher::Auto,
        VmessCipher::Aes128Gcm,
        VmessCipher::Chacha20Poly1305,
        VmessCipher::None,
        VmessCipher::Zero,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VmessCipher::Auto => "auto",
            VmessCipher::Aes128Gcm => "aes-128-gcm",
            VmessCipher::Chacha20Poly1305 => "chacha20-poly1305",
            VmessCipher::None => "none",
            VmessCipher::Zero => "zero",
        }
    }

    pub fn from_token(token: &str) -> Option<VmessCipher> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(token))
    }
}

/// Reality handshake parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RealityOptions {
    pub public_key: String,
    pub short_id: String,
}

/// TLS-level options of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityOptions {
    pub mode: SecurityMode,
    pub server_name: Option<String>,
    pub alpn: Vec<String>,
    pub fingerprint: Option<String>,
    pub reality: Option<RealityOptions>,
}

impl SecurityOptions {
    pub fn new(mode: SecurityMode) -> Self {
        SecurityOptions {
            mode,
            ..Default::default()
        }
    }
}

/// Transport-specific settings, present only for the matching transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOptions {
    Ws {
        path: String,
        host: Option<String>,
    },
    Grpc {
        service_name: Option<String>,
    },
    H2 {
        path: Option<String>,
        hosts: Vec<String>,
    },
}

/// Fields only one protocol carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolExtra {
    Vless { flow: Option<String> },
    VMess { alter_id: u32, cipher: VmessCipher },
    Trojan,
}

/// A decoded proxy, ready to be named and emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEntry {
    /// Display name, set once by the naming pass of the pipeline.
    pub name: Option<String>,
    pub proxy_type: ProxyType,
    pub server: String,
    pub port: u16,
    /// UUID for VLESS/VMess, password for Trojan.
    pub credential: String,
    pub transport: Transport,
    pub security: Option<SecurityOptions>,
    pub transport_opts: Option<TransportOptions>,
    pub extra: ProtocolExtra,
}

impl ProxyEntry {
    pub fn new(proxy_type: ProxyType, server: String, port: u16, credential: String) -> Self {
        let extra = match proxy_type {
            ProxyType::Vless => ProtocolExtra::Vless { flow: None },
            ProxyType::VMess => ProtocolExtra::VMess {
                alter_id: 0,
                cipher: VmessCipher::Auto,
            },
            ProxyType::Trojan => ProtocolExtra::Trojan,
        };
        ProxyEntry {
            name: None,
            proxy_type,
            server,
            port,
            credential,
            transport: Transport::Tcp,
            security: None,
            transport_opts: None,
            extra,
        }
    }

    /// Identity used for deduplication.
    pub fn key(&self) -> (&str, u16) {
        (&self.server, self.port)
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Sets the display name unless one was already assigned.
    ///
    /// Returns `false` when the entry was already named.
    pub fn assign_name(&mut self, name: String) -> bool {
        if self.name.is_some() {
            return false;
        }
        self.name = Some(name);
        true
    }

    pub fn is_tls(&self) -> bool {
        self.security.as_ref().is_some_and(|s| s.mode.is_tls())
    }
}

/// Default port for links that omit one.
pub const DEFAULT_PORT: u16 = 443;
