use crate::domain::package::Package;
use crate::domain::payment::{InitiationResponse, PaymentRequest, PaymentStatus, TransactionId};
use crate::domain::ports::{HotspotLogin, PortalGateway, PortalView, StatusKind};
use crate::error::{PortalError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct GatewayScript {
    packages: Option<std::result::Result<Vec<Package>, String>>,
    initiation: Option<std::result::Result<InitiationResponse, String>>,
    statuses: VecDeque<std::result::Result<PaymentStatus, String>>,
    payment_requests: Vec<PaymentRequest>,
    status_requests: Vec<TransactionId>,
}

/// A scripted, in-process stand-in for the billing backend.
///
/// Status responses are handed out in the order they were queued; once the
/// queue is drained every further poll sees `pending`. All requests are
/// recorded. Clones share the same script, so a test can keep one handle
/// and pass another to the controller.
#[derive(Default, Clone)]
pub struct InMemoryGateway {
    script: Arc<Mutex<GatewayScript>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_packages(self, packages: Vec<Package>) -> Self {
        lock(&self.script).packages = Some(Ok(packages));
        self
    }

    pub fn with_packages_error(self, message: &str) -> Self {
        lock(&self.script).packages = Some(Err(message.to_string()));
        self
    }

    pub fn with_initiation(self, response: InitiationResponse) -> Self {
        lock(&self.script).initiation = Some(Ok(response));
        self
    }

    pub fn with_initiation_error(self, message: &str) -> Self {
        lock(&self.script).initiation = Some(Err(message.to_string()));
        self
    }

    pub fn with_status(self, status: PaymentStatus) -> Self {
        lock(&self.script).statuses.push_back(Ok(status));
        self
    }

    pub fn with_status_error(self, message: &str) -> Self {
        lock(&self.script).statuses.push_back(Err(message.to_string()));
        self
    }

    pub fn payment_requests(&self) -> Vec<PaymentRequest> {
        lock(&self.script).payment_requests.clone()
    }

    pub fn status_requests(&self) -> Vec<TransactionId> {
        lock(&self.script).status_requests.clone()
    }
}

#[async_trait]
impl PortalGateway for InMemoryGateway {
    async fn fetch_packages(&self) -> Result<Vec<Package>> {
        match lock(&self.script).packages.clone() {
            Some(Ok(packages)) => Ok(packages),
            Some(Err(message)) => Err(PortalError::TransportError(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn create_payment(&self, request: &PaymentRequest) -> Result<InitiationResponse> {
        let mut script = lock(&self.script);
        script.payment_requests.push(request.clone());
        match script.initiation.clone() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(PortalError::TransportError(message)),
            None => Err(PortalError::UnexpectedResponse(
                "no initiation response scripted".to_string(),
            )),
        }
    }

    async fn payment_status(&self, transaction_id: &TransactionId) -> Result<PaymentStatus> {
        let mut script = lock(&self.script);
        script.status_requests.push(transaction_id.clone());
        match script.statuses.pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(message)) => Err(PortalError::TransportError(message)),
            None => Ok(PaymentStatus::Pending),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    PackagesRendered(Vec<Package>),
    StatusShown { message: String, kind: StatusKind },
    StatusHidden,
}

/// A view that records everything it is asked to display.
#[derive(Default, Clone)]
pub struct RecordingView {
    events: Arc<Mutex<Vec<ViewEvent>>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        lock(&self.events).clone()
    }

    pub fn statuses(&self) -> Vec<(String, StatusKind)> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                ViewEvent::StatusShown { message, kind } => Some((message.clone(), *kind)),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<(String, StatusKind)> {
        self.statuses().pop()
    }

    pub fn rendered_packages(&self) -> Option<Vec<Package>> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            ViewEvent::PackagesRendered(packages) => Some(packages.clone()),
            _ => None,
        })
    }

    /// Whether the most recent status event left a message on screen.
    pub fn is_status_visible(&self) -> bool {
        lock(&self.events)
            .iter()
            .rev()
            .find_map(|event| match event {
                ViewEvent::StatusShown { .. } => Some(true),
                ViewEvent::StatusHidden => Some(false),
                ViewEvent::PackagesRendered(_) => None,
            })
            .unwrap_or(false)
    }

    pub fn hide_count(&self) -> usize {
        lock(&self.events)
            .iter()
            .filter(|event| matches!(event, ViewEvent::StatusHidden))
            .count()
    }
}

impl PortalView for RecordingView {
    fn render_packages(&self, packages: &[Package]) {
        lock(&self.events).push(ViewEvent::PackagesRendered(packages.to_vec()));
    }

    fn show_status(&self, message: &str, kind: StatusKind) {
        lock(&self.events).push(ViewEvent::StatusShown {
            message: message.to_string(),
            kind,
        });
    }

    fn hide_status(&self) {
        lock(&self.events).push(ViewEvent::StatusHidden);
    }
}

/// A login port that records submissions instead of posting them.
#[derive(Default, Clone)]
pub struct RecordingLogin {
    submissions: Arc<Mutex<Vec<(String, String)>>>,
    failure: Option<String>,
}

impl RecordingLogin {
    pub fn new() -> Self {
        Self::default()
    }

    /// A login port whose every submission fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn submissions(&self) -> Vec<(String, String)> {
        lock(&self.submissions).clone()
    }
}

#[async_trait]
impl HotspotLogin for RecordingLogin {
    async fn submit(&self, username: &str, password: &str) -> Result<()> {
        lock(&self.submissions).push((username.to_string(), password.to_string()));
        match &self.failure {
            Some(message) => Err(PortalError::LoginError(message.clone())),
            None => Ok(()),
        }
    }
}
