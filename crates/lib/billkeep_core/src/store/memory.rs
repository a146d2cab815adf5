//! In-memory store.
//!
//! Enforces the same unique constraints as the PostgreSQL schema so that
//! tests exercise the real conflict paths.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    BillStore, ClaimStore, ScanStore, StoreError, StoreResult, UserStore, constraints,
};
use crate::models::{
    Bill, ClaimStatus, NewBill, NewScannedBill, NewUser, NewWarrantyClaim, ScannedBill, User,
    WarrantyClaim,
};

/// In-memory implementation of every store trait.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    bills: RwLock<Vec<Bill>>,
    claims: RwLock<Vec<WarrantyClaim>>,
    scans: RwLock<Vec<ScannedBill>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

/// Reject `candidate` if another user already holds its email or Google id.
fn check_user_unique(users: &HashMap<Uuid, User>, candidate: &User) -> StoreResult<()> {
    for other in users.values().filter(|u| u.id != candidate.id) {
        if other.email.eq_ignore_ascii_case(&candidate.email) {
            return Err(StoreError::Conflict(constraints::USER_EMAIL.into()));
        }
        if candidate.google_id.is_some() && other.google_id == candidate.google_id {
            return Err(StoreError::Conflict(constraints::USER_GOOGLE_ID.into()));
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, new: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let profile_complete = new.profile_complete();
        let user = User {
            id: Uuid::now_v7(),
            email: new.email,
            password_hash: new.password_hash,
            google_id: new.google_id,
            role: new.role,
            name: new.name,
            phone: new.phone,
            address: new.address,
            picture: new.picture,
            picture_public_id: String::new(),
            shop_name: new.shop_name,
            gst_number: new.gst_number,
            pan_number: new.pan_number,
            profile_complete,
            created_at: now,
            updated_at: now,
        };
        let mut users = self.users.write().await;
        check_user_unique(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn update_user(&self, user: &User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let existing = users.get(&user.id).ok_or(StoreError::NotFound)?;
        let mut updated = user.clone();
        updated.role = existing.role;
        updated.created_at = existing.created_at;
        updated.updated_at = Utc::now();
        check_user_unique(&users, &updated)?;
        users.insert(updated.id, updated.clone());
        Ok(updated)
    }
}

/// Newest first: by bill date, then creation time.
fn sort_bills_newest_first(bills: &mut [Bill]) {
    bills.sort_by(|a, b| {
        b.bill_date
            .cmp(&a.bill_date)
            .then(b.created_at.cmp(&a.created_at))
    });
}

#[async_trait]
impl BillStore for MemoryStore {
    async fn insert_bill(&self, new: NewBill) -> StoreResult<Bill> {
        let mut bills = self.bills.write().await;
        if bills.iter().any(|b| b.bill_number == new.bill_number) {
            return Err(StoreError::Conflict(constraints::BILL_NUMBER.into()));
        }
        let bill = Bill {
            id: Uuid::now_v7(),
            owner_id: new.owner_id,
            bill_number: new.bill_number,
            bill_date: new.bill_date,
            shop_name: new.shop_name,
            customer: new.customer,
            items: new.items,
            grand_total: new.grand_total,
            created_at: Utc::now(),
        };
        bills.push(bill.clone());
        Ok(bill)
    }

    async fn bills_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Bill>> {
        let mut found: Vec<Bill> = self
            .bills
            .read()
            .await
            .iter()
            .filter(|b| b.owner_id == owner_id)
            .cloned()
            .collect();
        sort_bills_newest_first(&mut found);
        Ok(found)
    }

    async fn bills_for_customer_email(&self, email: &str) -> StoreResult<Vec<Bill>> {
        let mut found: Vec<Bill> = self
            .bills
            .read()
            .await
            .iter()
            .filter(|b| b.customer.email == email)
            .cloned()
            .collect();
        sort_bills_newest_first(&mut found);
        Ok(found)
    }
}

#[async_trait]
impl ClaimStore for MemoryStore {
    async fn insert_claim(&self, new: NewWarrantyClaim) -> StoreResult<WarrantyClaim> {
        if let Some(bill_id) = new.bill_id
            && !self.bills.read().await.iter().any(|b| b.id == bill_id)
        {
            return Err(StoreError::MissingReference(constraints::CLAIM_BILL.into()));
        }
        let claim = WarrantyClaim {
            id: Uuid::now_v7(),
            customer_email: new.customer_email,
            customer_name: new.customer_name,
            bill_id: new.bill_id,
            item_name: new.item_name,
            company_name: new.company_name,
            item_cost: new.item_cost,
            issue_description: new.issue_description,
            status: ClaimStatus::Pending,
            submitted_at: Utc::now(),
        };
        self.claims.write().await.push(claim.clone());
        Ok(claim)
    }

    async fn claims_for_email(&self, email: &str) -> StoreResult<Vec<WarrantyClaim>> {
        let mut found: Vec<WarrantyClaim> = self
            .claims
            .read()
            .await
            .iter()
            .filter(|c| c.customer_email == email)
            .cloned()
            .collect();
        // Ids are v7, so they break ties between claims submitted in the same instant.
        found.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(found)
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn insert_scan(&self, new: NewScannedBill) -> StoreResult<ScannedBill> {
        let scan = ScannedBill {
            id: Uuid::now_v7(),
            owner_id: new.owner_id,
            photo_url: new.photo_url,
            photo_public_id: new.photo_public_id,
            extracted: new.extracted,
            note: new.note,
            created_at: Utc::now(),
        };
        self.scans.write().await.push(scan.clone());
        Ok(scan)
    }

    async fn scans_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<ScannedBill>> {
        let mut found: Vec<ScannedBill> = self
            .scans
            .read()
            .await
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn delete_scan(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<ScannedBill>> {
        let mut scans = self.scans.write().await;
        let position = scans
            .iter()
            .position(|s| s.id == id && s.owner_id == owner_id);
        Ok(position.map(|i| scans.remove(i)))
    }
}
