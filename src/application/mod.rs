//! Application layer orchestrating a hotspot purchase.
//!
//! `PaymentFlowController` owns the gateway, the login port and the view, and
//! walks a single attempt through validation, payment creation, status polling
//! and auto-login. `StatusBoard` manages the self-hiding status region.

pub mod controller;
pub mod status;
