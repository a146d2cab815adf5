//! # billkeep_core
//!
//! Core domain logic for Billkeep: identities, bills, warranty claims and the
//! external services (Google sign-in, Cloudinary, Gemini) they lean on.

pub mod ai;
pub mod assets;
pub mod auth;
pub mod bills;
pub mod migrate;
pub mod models;
pub mod profile;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
