//! Doctoc MCP Server Library
//!
//! A Model Context Protocol (MCP) server for the Doctoc practice-management
//! platform. Provides tools for appointments, patients, users, organization
//! data, prices and payments, plus Telegram messaging through Unipile.

pub mod config;
pub mod doctoc;
pub mod error;
pub mod mcp;
mod remote;
pub mod unipile;

pub use config::Config;
pub use error::{ApiError, DoctocMcpError, Result};
