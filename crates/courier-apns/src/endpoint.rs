//! Gateway host and port selection.

use std::fmt;

use courier_settings::{ApnsEnvironment, ApnsSettings};

/// Production gateway host.
pub const LIVE_SERVER: &str = "api.push.apple.com";
/// Development gateway host.
pub const SANDBOX_SERVER: &str = "api.development.push.apple.com";
/// Standard HTTPS port.
pub const DEFAULT_PORT: u16 = 443;
/// Alternate port for networks that block 443 outbound.
pub const ALTERNATIVE_PORT: u16 = 2197;

/// Gateway address requests are sent to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Select host and port.
    pub fn new(sandbox: bool, alternative_port: bool) -> Self {
        Self {
            host: if sandbox { SANDBOX_SERVER } else { LIVE_SERVER }.to_string(),
            port: if alternative_port {
                ALTERNATIVE_PORT
            } else {
                DEFAULT_PORT
            },
        }
    }

    /// Endpoint described by settings.
    pub fn from_settings(settings: &ApnsSettings) -> Self {
        Self::new(
            settings.environment == ApnsEnvironment::Sandbox,
            settings.use_alternative_port,
        )
    }

    /// Delivery URL for a device token.
    pub fn device_url(&self, token: &str) -> String {
        format!("https://{}:{}/3/device/{token}", self.host, self.port)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_default_port() {
        let e = Endpoint::default();
        assert_eq!(e.host, "api.push.apple.com");
        assert_eq!(e.port, 443);
    }

    #[test]
    fn sandbox_alternative_port() {
        let e = Endpoint::new(true, true);
        assert_eq!(e.host, "api.development.push.apple.com");
        assert_eq!(e.port, 2197);
        assert_eq!(e.to_string(), "api.development.push.apple.com:2197");
    }

    #[test]
    fn device_url_template() {
        let e = Endpoint::default();
        assert_eq!(
            e.device_url("abc123"),
            "https://api.push.apple.com:443/3/device/abc123"
        );
    }

    #[test]
    fn from_settings_follows_environment() {
        let mut s = ApnsSettings::default();
        assert_eq!(Endpoint::from_settings(&s), Endpoint::new(false, false));
        s.environment = ApnsEnvironment::Sandbox;
        s.use_alternative_port = true;
        assert_eq!(Endpoint::from_settings(&s), Endpoint::new(true, true));
    }
}
