//! Persistence traits and their implementations.
//!
//! Uniqueness (user email, Google id, bill number) is enforced by the store
//! itself: a write that would break it fails with [`StoreError::Conflict`].
//! Callers never rely on a read-then-write check to keep these invariants.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Bill, NewBill, NewScannedBill, NewUser, NewWarrantyClaim, ScannedBill, User, WarrantyClaim,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// A referenced record (e.g. a claim's bill) does not exist.
    #[error("Referenced record does not exist: {0}")]
    MissingReference(String),

    #[error("Record not found")]
    NotFound,

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            let constraint = db.constraint().unwrap_or("unknown").to_string();
            if db.is_unique_violation() {
                return StoreError::Conflict(constraint);
            }
            if db.is_foreign_key_violation() {
                return StoreError::MissingReference(constraint);
            }
        }
        StoreError::Db(e)
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Constraint names shared by every implementation.
pub mod constraints {
    pub const USER_EMAIL: &str = "users_email_key";
    pub const USER_GOOGLE_ID: &str = "users_google_id_key";
    pub const BILL_NUMBER: &str = "bills_bill_number_key";
    pub const CLAIM_BILL: &str = "warranty_claims_bill_id_fkey";
}

/// User records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Duplicate email or Google id → `Conflict`.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Case-insensitive email lookup.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>>;

    /// Overwrite the mutable columns of an existing user and bump `updated_at`.
    async fn update_user(&self, user: &User) -> StoreResult<User>;
}

/// Retailer bills.
#[async_trait]
pub trait BillStore: Send + Sync {
    /// Insert a bill. Duplicate bill number → `Conflict`.
    async fn insert_bill(&self, bill: NewBill) -> StoreResult<Bill>;

    /// Bills owned by a retailer, newest first.
    async fn bills_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Bill>>;

    /// Bills whose customer email equals `email` exactly, newest first.
    async fn bills_for_customer_email(&self, email: &str) -> StoreResult<Vec<Bill>>;
}

/// Warranty claims.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Insert a claim with status `Pending`.
    async fn insert_claim(&self, claim: NewWarrantyClaim) -> StoreResult<WarrantyClaim>;

    /// Claims for a customer email, newest submitted first.
    async fn claims_for_email(&self, email: &str) -> StoreResult<Vec<WarrantyClaim>>;
}

/// Scanned bill photos.
#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn insert_scan(&self, scan: NewScannedBill) -> StoreResult<ScannedBill>;

    /// Scans owned by a user, newest first.
    async fn scans_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<ScannedBill>>;

    /// Delete a scan owned by `owner_id`, returning the removed record.
    async fn delete_scan(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<ScannedBill>>;
}

/// Everything the application persists.
pub trait Store: UserStore + BillStore + ClaimStore + ScanStore {}

impl<T> Store for T where T: UserStore + BillStore + ClaimStore + ScanStore {}
