use crate::domain::package::Package;
use crate::domain::payment::{
    InitiationResponse, PaymentRequest, PaymentStatus, RawInitiation, RawStatus, TransactionId,
};
use crate::domain::ports::PortalGateway;
use crate::error::{PortalError, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

const PLANS_PATH: &str = "api/hotspot/plans/";
const PAY_PATH: &str = "api/hotspot/pay/";

/// Talks to the hotspot billing API over HTTP.
///
/// Response bodies are decoded whatever the HTTP status: the backend reports
/// refused payments as `4xx` with an `{"error": ...}` body.
#[derive(Debug, Clone)]
pub struct HttpPortalGateway {
    client: Client,
    plans_url: Url,
    pay_url: Url,
}

impl HttpPortalGateway {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, api_url)
    }

    pub fn with_client(client: Client, api_url: &str) -> Result<Self> {
        let base = base_url(api_url)?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| PortalError::ConfigError(format!("invalid API URL {api_url:?}: {e}")))
        };
        Ok(Self {
            plans_url: join(PLANS_PATH)?,
            pay_url: join(PAY_PATH)?,
            client,
        })
    }

    pub fn plans_url(&self) -> &Url {
        &self.plans_url
    }

    pub fn status_url(&self, transaction_id: &TransactionId) -> Url {
        let mut url = self.pay_url.clone();
        url.query_pairs_mut()
            .append_pair("transaction_id", transaction_id.as_str());
        url
    }
}

/// Parses the API root, making sure relative joins keep any path prefix.
fn base_url(api_url: &str) -> Result<Url> {
    let normalized = if api_url.ends_with('/') {
        api_url.to_string()
    } else {
        format!("{api_url}/")
    };
    Url::parse(&normalized)
        .map_err(|e| PortalError::ConfigError(format!("invalid API URL {api_url:?}: {e}")))
}

#[async_trait]
impl PortalGateway for HttpPortalGateway {
    async fn fetch_packages(&self) -> Result<Vec<Package>> {
        debug!(url = %self.plans_url, "fetching plan catalog");
        let response = self.client.get(self.plans_url.clone()).send().await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn create_payment(&self, request: &PaymentRequest) -> Result<InitiationResponse> {
        debug!(url = %self.pay_url, package_id = request.package_id, "creating payment");
        let response = self
            .client
            .post(self.pay_url.clone())
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        let raw: RawInitiation = serde_json::from_slice(&body)?;
        debug!(%status, "payment creation answered");
        raw.try_into()
    }

    async fn payment_status(&self, transaction_id: &TransactionId) -> Result<PaymentStatus> {
        let response = self
            .client
            .get(self.status_url(transaction_id))
            .send()
            .await?;
        let body = response.bytes().await?;
        let raw: RawStatus = serde_json::from_slice(&body)?;
        raw.try_into()
    }
}
