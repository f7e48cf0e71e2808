use crate::application::status::StatusBoard;
use crate::config::FlowSettings;
use crate::domain::package::Package;
use crate::domain::payment::{
    Credentials, InitiationResponse, PaymentRequest, PaymentStatus, PhoneNumber, TransactionId,
};
use crate::domain::ports::{HotspotLoginBox, PortalGatewayBox, PortalViewRef, StatusKind};
use crate::error::{PortalError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub const MSG_INVALID_PHONE: &str = "Please enter a valid phone number (e.g., +254123456789)";
pub const MSG_INITIATING: &str = "Initiating payment... Please wait.";
pub const MSG_PENDING: &str = "Please complete the M-Pesa STK Push on your phone.";
pub const MSG_FAILED: &str = "Payment failed. Please try again.";
pub const MSG_TIMED_OUT: &str = "Payment confirmation timed out. Please try again.";
pub const MSG_PLANS_FAILED: &str = "Failed to load plans. Please try again.";
pub const MSG_INITIATION_FAILED: &str = "Payment initiation failed. Please try again.";
pub const MSG_IN_PROGRESS: &str = "A payment is already in progress. Please wait.";
pub const MSG_NO_CREDENTIALS: &str =
    "Payment received, but no login credentials were issued. Please contact support.";
pub const MSG_LOGIN_FAILED: &str = "Automatic login failed. Please sign in manually.";

/// Where a purchase attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    Validating,
    Initiating,
    Pending,
    Success,
    Failed,
}

/// How a purchase attempt ended, short of a transport failure.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    /// The phone number was rejected locally; nothing was sent.
    InvalidPhone,
    /// The backend refused to create the payment.
    Rejected(String),
    /// The payment was declined or cancelled on the handset.
    Failed,
    /// No terminal status arrived within the configured number of polls.
    TimedOut,
    /// The payment went through but no credentials came back.
    PaidWithoutCredentials,
    /// Credentials were issued; auto-login is disabled.
    Issued(Credentials),
    /// Credentials were issued and submitted to the hotspot login form.
    Connected(Credentials),
}

/// Drives a purchase from phone validation through to the hotspot login.
///
/// Only one purchase attempt runs at a time; a concurrent call to
/// [`initiate_payment`](Self::initiate_payment) is refused without touching
/// the network.
pub struct PaymentFlowController {
    gateway: PortalGatewayBox,
    login: HotspotLoginBox,
    view: PortalViewRef,
    status: StatusBoard,
    settings: FlowSettings,
    in_flight: AtomicBool,
    state: Mutex<FlowState>,
}

/// Releases the in-flight flag when an attempt ends, including when its
/// future is dropped mid-poll.
struct InFlightGuard<'a> {
    controller: &'a PaymentFlowController,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self
            .controller
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *state != FlowState::Success {
            *state = FlowState::Idle;
        }
        self.controller.in_flight.store(false, Ordering::Release);
    }
}

impl PaymentFlowController {
    pub fn new(
        gateway: PortalGatewayBox,
        login: HotspotLoginBox,
        view: PortalViewRef,
        settings: FlowSettings,
    ) -> Self {
        let status = StatusBoard::new(view.clone(), settings.status_display);
        Self {
            gateway,
            login,
            view,
            status,
            settings,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(FlowState::Idle),
        }
    }

    pub fn state(&self) -> FlowState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn transition(&self, next: FlowState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(from = ?*state, to = ?next, "purchase state change");
        *state = next;
    }

    /// Shows a message and schedules its removal. Safe to call without a
    /// tokio runtime; the message then stays up until replaced.
    pub fn display_status(&self, message: &str, kind: StatusKind) {
        self.status.display(message, kind);
    }

    /// Fetches the catalog once and renders it.
    ///
    /// On failure the package area is left untouched and an error message is
    /// shown; there is no retry.
    pub async fn load_packages(&self) -> Result<Vec<Package>> {
        match self.gateway.fetch_packages().await {
            Ok(packages) => {
                info!(count = packages.len(), "loaded hotspot packages");
                self.view.render_packages(&packages);
                Ok(packages)
            }
            Err(e) => {
                error!("Error fetching plans: {}", e);
                self.display_status(MSG_PLANS_FAILED, StatusKind::Error);
                Err(e)
            }
        }
    }

    /// Runs one purchase attempt to completion.
    ///
    /// Business outcomes (bad phone, refusal, failure, timeout, success) come
    /// back as `Ok`; transport and decoding failures of the creation request,
    /// a concurrent attempt, and a failed login submission come back as `Err`.
    pub async fn initiate_payment(&self, package_id: u64, phone: &str) -> Result<PurchaseOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(package_id, "purchase refused, another attempt is in flight");
            self.display_status(MSG_IN_PROGRESS, StatusKind::Error);
            return Err(PortalError::PurchaseInFlight);
        }
        let _guard = InFlightGuard { controller: self };

        self.transition(FlowState::Validating);
        let Ok(phone) = PhoneNumber::parse(phone) else {
            debug!(package_id, "rejected malformed phone number");
            self.display_status(MSG_INVALID_PHONE, StatusKind::Error);
            return Ok(PurchaseOutcome::InvalidPhone);
        };
        let request = PaymentRequest { package_id, phone };

        self.transition(FlowState::Initiating);
        self.display_status(MSG_INITIATING, StatusKind::Info);
        info!(package_id, phone = %request.phone, "initiating M-Pesa payment");

        let response = match self.gateway.create_payment(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error initiating payment: {}", e);
                self.transition(FlowState::Failed);
                self.display_status(MSG_INITIATION_FAILED, StatusKind::Error);
                return Err(e);
            }
        };

        match response {
            InitiationResponse::Rejected { error } => {
                warn!(package_id, %error, "payment creation rejected");
                self.transition(FlowState::Failed);
                self.display_status(&error, StatusKind::Error);
                Ok(PurchaseOutcome::Rejected(error))
            }
            InitiationResponse::Pending { transaction_id } => {
                self.transition(FlowState::Pending);
                self.display_status(MSG_PENDING, StatusKind::Info);
                self.await_confirmation(&transaction_id).await
            }
        }
    }

    async fn await_confirmation(&self, transaction_id: &TransactionId) -> Result<PurchaseOutcome> {
        let started = Instant::now();
        let mut ticker = tokio::time::interval_at(
            started + self.settings.poll_interval,
            self.settings.poll_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for attempt in 1..=self.settings.max_poll_attempts {
            ticker.tick().await;
            debug!(%transaction_id, attempt, "polling payment status");

            let status = match self.gateway.payment_status(transaction_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(%transaction_id, attempt, "payment status check failed: {}", e);
                    continue;
                }
            };

            if !status.is_terminal() {
                debug!(%transaction_id, ?status, "payment not settled yet");
                continue;
            }

            match status {
                PaymentStatus::Success(credentials) => {
                    info!(%transaction_id, attempt, "payment confirmed");
                    self.transition(FlowState::Success);
                    self.display_status(&credentials.summary(), StatusKind::Info);
                    return self.finish_with(credentials).await;
                }
                PaymentStatus::Failed => {
                    info!(%transaction_id, attempt, "payment failed");
                    self.transition(FlowState::Failed);
                    self.display_status(MSG_FAILED, StatusKind::Error);
                    return Ok(PurchaseOutcome::Failed);
                }
                PaymentStatus::ConfirmedWithoutCredentials => {
                    warn!(%transaction_id, attempt, "payment confirmed without credentials");
                    self.transition(FlowState::Success);
                    self.display_status(MSG_NO_CREDENTIALS, StatusKind::Error);
                    return Ok(PurchaseOutcome::PaidWithoutCredentials);
                }
                PaymentStatus::Pending | PaymentStatus::Unrecognized(_) => {}
            }
        }

        warn!(
            %transaction_id,
            attempts = self.settings.max_poll_attempts,
            elapsed = ?started.elapsed(),
            "payment confirmation timed out"
        );
        self.transition(FlowState::Failed);
        self.display_status(MSG_TIMED_OUT, StatusKind::Error);
        Ok(PurchaseOutcome::TimedOut)
    }

    async fn finish_with(&self, credentials: Credentials) -> Result<PurchaseOutcome> {
        if !self.settings.auto_login {
            return Ok(PurchaseOutcome::Issued(credentials));
        }

        tokio::time::sleep(self.settings.auto_login_delay).await;
        if let Err(e) = self.auto_connect(&credentials).await {
            error!("Error submitting hotspot login: {}", e);
            self.display_status(MSG_LOGIN_FAILED, StatusKind::Error);
            return Err(e);
        }
        Ok(PurchaseOutcome::Connected(credentials))
    }

    /// Submits the credentials to the hotspot login form. Not reversible.
    pub async fn auto_connect(&self, credentials: &Credentials) -> Result<()> {
        info!(username = %credentials.username, "submitting hotspot login");
        self.login
            .submit(&credentials.username, &credentials.password)
            .await
    }
}
