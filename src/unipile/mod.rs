//! Unipile API module
//!
//! Client for the chat-unification API used for Telegram.

pub mod client;
