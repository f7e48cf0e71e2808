use super::package::Package;
use super::payment::{InitiationResponse, PaymentRequest, PaymentStatus, TransactionId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The hotspot billing backend: plan catalog, payment creation and status.
#[async_trait]
pub trait PortalGateway: Send + Sync {
    async fn fetch_packages(&self) -> Result<Vec<Package>>;
    async fn create_payment(&self, request: &PaymentRequest) -> Result<InitiationResponse>;
    async fn payment_status(&self, transaction_id: &TransactionId) -> Result<PaymentStatus>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// Whatever the user is looking at: package cards plus one status region.
pub trait PortalView: Send + Sync {
    fn render_packages(&self, packages: &[Package]);
    fn show_status(&self, message: &str, kind: StatusKind);
    fn hide_status(&self);
}

/// Submits issued credentials to the captive portal's login form.
#[async_trait]
pub trait HotspotLogin: Send + Sync {
    async fn submit(&self, username: &str, password: &str) -> Result<()>;
}

pub type PortalGatewayBox = Box<dyn PortalGateway>;
pub type HotspotLoginBox = Box<dyn HotspotLogin>;
pub type PortalViewRef = Arc<dyn PortalView>;
