//! Back-office engine for the Reparv real-estate referral network.
//!
//! The crate carries the one piece of the back office with real rules and
//! state: the enquiry lifecycle and the commission-allocation engine that
//! fires when an enquiry is booked. HTTP, storage, and notification concerns
//! stay behind ports so the workflows can be exercised in isolation.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
