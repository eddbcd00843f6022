//! Doctoc API module
//!
//! Contains the practice-management client, the request bodies built from
//! tool parameters, and the price catalog with its fallback.

pub mod client;
pub mod payloads;
pub mod pricing;
