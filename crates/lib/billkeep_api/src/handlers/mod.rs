//! Request handlers.

pub mod auth;
pub mod bills;
pub mod claims;
pub mod health;
pub mod scans;
