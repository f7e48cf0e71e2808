use crate::domain::ports::HotspotLogin;
use crate::error::{PortalError, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, error};

/// Posts credentials to the router's hotspot login form (`/login` on
/// MikroTik), the same way the captive portal page submits it.
#[derive(Debug, Clone)]
pub struct HttpHotspotLogin {
    client: Client,
    login_url: Url,
}

impl HttpHotspotLogin {
    pub fn new(login_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, login_url)
    }

    pub fn with_client(client: Client, login_url: &str) -> Result<Self> {
        let login_url = Url::parse(login_url).map_err(|e| {
            PortalError::ConfigError(format!("invalid login URL {login_url:?}: {e}"))
        })?;
        Ok(Self { client, login_url })
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }
}

#[async_trait]
impl HotspotLogin for HttpHotspotLogin {
    async fn submit(&self, username: &str, password: &str) -> Result<()> {
        debug!(url = %self.login_url, username, "posting hotspot login form");
        let response = self
            .client
            .post(self.login_url.clone())
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        // The router answers with a redirect or a status page; only hard
        // failures count.
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            error!("Hotspot login rejected: {} - {}", status, body);
            return Err(PortalError::LoginError(format!(
                "hotspot login returned {status}"
            )));
        }
        Ok(())
    }
}
