//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and implement
//! [`Default`] with production values. Every struct is `#[serde(default)]`
//! so partial JSON fills the rest from defaults.

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// # JSON Format
///
/// ```json
/// {
///   "apns": { "environment": "sandbox", "credentials": { "kind": "token", "keyId": "ABC123" } },
///   "bridge": { "joinTimeoutSecs": 60 }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourierSettings {
    /// Gateway selection and credentials.
    pub apns: ApnsSettings,
    /// Transport limits, timeouts and proxy.
    pub connection: ConnectionSettings,
    /// Blocking-call bridge behaviour.
    pub bridge: BridgeSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl CourierSettings {
    /// Correct values that would make the transport unusable.
    ///
    /// Zero timeouts and stream ceilings are raised to 1 with a warning
    /// instead of being rejected.
    pub fn validate(&mut self) {
        fn at_least_one(val: &mut u64, name: &str) {
            if *val == 0 {
                tracing::warn!("{name} is 0, raised to 1");
                *val = 1;
            }
        }

        let c = &mut self.connection;
        if c.max_concurrent_streams == 0 {
            tracing::warn!("max_concurrent_streams is 0, raised to 1");
            c.max_concurrent_streams = 1;
        }
        at_least_one(&mut c.keep_alive_expiry_secs, "keep_alive_expiry_secs");
        at_least_one(&mut c.connect_timeout_secs, "connect_timeout_secs");
        at_least_one(&mut c.read_timeout_secs, "read_timeout_secs");
        at_least_one(&mut c.write_timeout_secs, "write_timeout_secs");
        at_least_one(&mut c.pool_timeout_secs, "pool_timeout_secs");
        at_least_one(&mut self.bridge.join_timeout_secs, "join_timeout_secs");
        if self.apns.credentials.token_lifetime_secs == 0 {
            tracing::warn!("token_lifetime_secs is 0, every request would re-sign; raised to 1");
            self.apns.credentials.token_lifetime_secs = 1;
        }
    }
}

/// Gateway environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApnsEnvironment {
    /// `api.push.apple.com`
    #[default]
    Production,
    /// `api.development.push.apple.com`
    Sandbox,
}

/// Gateway settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApnsSettings {
    /// Production or sandbox gateway.
    pub environment: ApnsEnvironment,
    /// Use port 2197 instead of 443.
    pub use_alternative_port: bool,
    /// Topic used when a call does not name one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_topic: Option<String>,
    /// Credential scheme and material.
    pub credentials: CredentialSettings,
}

/// Which credential scheme authenticates requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    /// Signed bearer token.
    #[default]
    Token,
    /// TLS client certificate.
    Certificate,
}

/// Token signing algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// ECDSA P-256 / SHA-256.
    #[default]
    #[serde(rename = "ES256")]
    Es256,
    /// ECDSA P-384 / SHA-384.
    #[serde(rename = "ES384")]
    Es384,
}

/// Credential material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialSettings {
    /// Scheme to use.
    pub kind: CredentialKind,
    /// Path to the PKCS#8 signing key (token scheme).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    /// Key identifier placed in the token header (token scheme).
    pub key_id: String,
    /// Issuer identity placed in the token claims (token scheme).
    pub team_id: String,
    /// Signing algorithm (token scheme).
    pub algorithm: SigningAlgorithm,
    /// Seconds a signed token is reused before re-signing (token scheme).
    pub token_lifetime_secs: u64,
    /// PEM bundle with certificate and key (certificate scheme).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<String>,
    /// Extra PEM chain appended to the bundle (certificate scheme).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_chain_path: Option<String>,
    /// Key password (certificate scheme).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            kind: CredentialKind::Token,
            key_path: None,
            key_id: String::new(),
            team_id: String::new(),
            algorithm: SigningAlgorithm::Es256,
            token_lifetime_secs: 2700,
            cert_path: None,
            cert_chain_path: None,
            password: None,
        }
    }
}

/// Transport limits and timeouts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionSettings {
    /// Ceiling on in-flight streams per client.
    pub max_concurrent_streams: usize,
    /// Idle connections kept per host.
    pub max_idle_connections: usize,
    /// Seconds an idle connection is kept alive.
    pub keep_alive_expiry_secs: u64,
    /// TCP + TLS connect timeout.
    pub connect_timeout_secs: u64,
    /// Response read timeout.
    pub read_timeout_secs: u64,
    /// Request write timeout.
    pub write_timeout_secs: u64,
    /// Wait for a free stream slot.
    pub pool_timeout_secs: u64,
    /// Outbound HTTP proxy host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_host: Option<String>,
    /// Outbound HTTP proxy port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_port: Option<u16>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            max_concurrent_streams: 1500,
            max_idle_connections: 1000,
            keep_alive_expiry_secs: 600,
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
            write_timeout_secs: 10,
            pool_timeout_secs: 60,
            proxy_host: None,
            proxy_port: None,
        }
    }
}

impl ConnectionSettings {
    /// Proxy URL, when both host and port are configured.
    pub fn proxy_url(&self) -> Option<String> {
        match (&self.proxy_host, self.proxy_port) {
            (Some(host), Some(port)) if !host.is_empty() => Some(format!("http://{host}:{port}")),
            _ => None,
        }
    }
}

/// Blocking-call bridge settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeSettings {
    /// Always run blocking calls on a dedicated worker thread.
    ///
    /// Set when the host process is known to mishandle runtimes created
    /// on its own threads.
    pub force_thread_isolation: bool,
    /// Seconds a blocking caller waits for the worker thread.
    pub join_timeout_secs: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            force_thread_isolation: false,
            join_timeout_secs: 300,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`RUST_LOG` overrides).
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = CourierSettings::default();
        assert_eq!(s.apns.environment, ApnsEnvironment::Production);
        assert!(!s.apns.use_alternative_port);
        assert_eq!(s.apns.credentials.kind, CredentialKind::Token);
        assert_eq!(s.apns.credentials.algorithm, SigningAlgorithm::Es256);
        assert_eq!(s.apns.credentials.token_lifetime_secs, 2700);
        assert_eq!(s.connection.max_concurrent_streams, 1500);
        assert_eq!(s.connection.max_idle_connections, 1000);
        assert_eq!(s.connection.keep_alive_expiry_secs, 600);
        assert_eq!(s.connection.connect_timeout_secs, 10);
        assert_eq!(s.connection.read_timeout_secs, 30);
        assert_eq!(s.connection.write_timeout_secs, 10);
        assert_eq!(s.connection.pool_timeout_secs, 60);
        assert!(!s.bridge.force_thread_isolation);
        assert_eq!(s.bridge.join_timeout_secs, 300);
        assert_eq!(s.logging.level, "info");
    }

    #[test]
    fn camel_case_field_names() {
        let json = serde_json::to_value(CourierSettings::default()).unwrap();
        assert!(json["apns"].get("useAlternativePort").is_some());
        assert!(json["apns"]["credentials"].get("tokenLifetimeSecs").is_some());
        assert!(json["connection"].get("maxConcurrentStreams").is_some());
        assert!(json["bridge"].get("joinTimeoutSecs").is_some());
        assert_eq!(json["apns"]["credentials"]["algorithm"], "ES256");
        assert_eq!(json["apns"]["environment"], "production");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: CourierSettings = serde_json::from_str(
            r#"{"apns": {"environment": "sandbox", "credentials": {"kind": "certificate", "certPath": "/c.pem"}}}"#,
        )
        .unwrap();
        assert_eq!(s.apns.environment, ApnsEnvironment::Sandbox);
        assert_eq!(s.apns.credentials.kind, CredentialKind::Certificate);
        assert_eq!(s.apns.credentials.cert_path.as_deref(), Some("/c.pem"));
        assert_eq!(s.apns.credentials.token_lifetime_secs, 2700);
        assert_eq!(s.connection.read_timeout_secs, 30);
    }

    #[test]
    fn proxy_url_requires_host_and_port() {
        let mut c = ConnectionSettings::default();
        assert!(c.proxy_url().is_none());
        c.proxy_host = Some("proxy.example.com".into());
        assert!(c.proxy_url().is_none());
        c.proxy_port = Some(8080);
        assert_eq!(c.proxy_url().as_deref(), Some("http://proxy.example.com:8080"));
    }

    #[test]
    fn validate_raises_zero_values() {
        let mut s = CourierSettings::default();
        s.connection.max_concurrent_streams = 0;
        s.connection.read_timeout_secs = 0;
        s.connection.keep_alive_expiry_secs = 0;
        s.bridge.join_timeout_secs = 0;
        s.apns.credentials.token_lifetime_secs = 0;
        s.validate();
        assert_eq!(s.connection.max_concurrent_streams, 1);
        assert_eq!(s.connection.read_timeout_secs, 1);
        assert_eq!(s.connection.keep_alive_expiry_secs, 1);
        assert_eq!(s.bridge.join_timeout_secs, 1);
        assert_eq!(s.apns.credentials.token_lifetime_secs, 1);
    }

    #[test]
    fn validate_keeps_valid_values() {
        let mut s = CourierSettings::default();
        s.validate();
        assert_eq!(s, CourierSettings::default());
    }
}
