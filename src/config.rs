use crate::error::{PortalError, Result};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://yourdomain.com";
pub const DEFAULT_LOGIN_URL: &str = "http://10.5.50.1/login";

/// Timing knobs for a single purchase attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSettings {
    /// Delay between payment status requests. Must be non-zero.
    pub poll_interval: Duration,
    /// Status requests issued before the attempt is reported as timed out.
    pub max_poll_attempts: u32,
    /// How long a status message stays visible.
    pub status_display: Duration,
    /// Pause between showing the credentials and submitting the login form.
    pub auto_login_delay: Duration,
    /// When false the flow stops once credentials are issued.
    pub auto_login: bool,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 60,
            status_display: Duration::from_secs(5),
            auto_login_delay: Duration::from_secs(5),
            auto_login: true,
        }
    }
}

impl FlowSettings {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(PortalError::ConfigError(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.max_poll_attempts == 0 {
            return Err(PortalError::ConfigError(
                "max poll attempts must be at least 1".to_string(),
            ));
        }
        if self.status_display.is_zero() {
            return Err(PortalError::ConfigError(
                "status display period must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything needed to talk to the billing backend and the hotspot router.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    pub api_url: String,
    pub login_url: String,
    pub http_timeout: Duration,
    pub flow: FlowSettings,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            http_timeout: Duration::from_secs(30),
            flow: FlowSettings::default(),
        }
    }
}

impl PortalConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("API", &self.api_url), ("login", &self.login_url)] {
            reqwest::Url::parse(url)
                .map_err(|e| PortalError::ConfigError(format!("invalid {name} URL {url:?}: {e}")))?;
        }
        if self.http_timeout.is_zero() {
            return Err(PortalError::ConfigError(
                "HTTP timeout must be greater than zero".to_string(),
            ));
        }
        self.flow.validate()
    }
}
