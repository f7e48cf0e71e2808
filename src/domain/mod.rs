//! Domain types for the hotspot purchase flow and the ports the flow talks
//! through. Nothing in here performs I/O.

pub mod package;
pub mod payment;
pub mod ports;
