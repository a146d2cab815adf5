//! Domain models.
//!
//! Internal records (`User`, `Bill`, ...) plus the sanitized shapes that are
//! safe to hand to API callers.

pub mod bill;
pub mod claim;
pub mod scan;
pub mod user;

pub use bill::{Bill, BillCustomer, BillItem, NewBill};
pub use claim::{ClaimStatus, NewWarrantyClaim, WarrantyClaim};
pub use scan::{ExtractedBill, ExtractedItem, NewScannedBill, ScannedBill};
pub use user::{NewUser, ProfileField, PublicUser, Role, TokenClaims, User};
