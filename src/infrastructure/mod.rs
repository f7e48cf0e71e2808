//! Adapters behind the domain ports: reqwest-backed HTTP clients for the
//! billing API and the hotspot login form, plus in-memory stand-ins.

pub mod hotspot_login;
pub mod http;
pub mod in_memory;
