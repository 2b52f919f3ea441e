//! GoldFeed Library
//!
//! Domestic gold price poller for the Shanghai Gold Exchange

pub mod config;
pub mod monitor;
pub mod oracle;
pub mod types;
