//! PostgreSQL store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{BillStore, ClaimStore, ScanStore, StoreError, StoreResult, UserStore};
use crate::models::{
    Bill, BillCustomer, BillItem, ExtractedBill, NewBill, NewScannedBill, NewUser,
    NewWarrantyClaim, ScannedBill, User, WarrantyClaim,
};

const USER_COLUMNS: &str = "id, email, password_hash, google_id, role, name, phone, address, \
     picture, picture_public_id, shop_name, gst_number, pan_number, profile_complete, \
     created_at, updated_at";

const BILL_COLUMNS: &str = "id, owner_id, bill_number, bill_date, shop_name, customer_name, \
     customer_phone, customer_email, items, grand_total, created_at";

const CLAIM_COLUMNS: &str = "id, customer_email, customer_name, bill_id, item_name, company_name, \
     item_cost, issue_description, status, submitted_at";

const SCAN_COLUMNS: &str = "id, owner_id, photo_url, photo_public_id, extracted, note, created_at";

/// Store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    google_id: Option<String>,
    role: String,
    name: String,
    phone: String,
    address: String,
    picture: String,
    picture_public_id: String,
    shop_name: String,
    gst_number: String,
    pan_number: String,
    profile_complete: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            google_id: row.google_id,
            role: row.role.parse().map_err(StoreError::Corrupt)?,
            name: row.name,
            phone: row.phone,
            address: row.address,
            picture: row.picture,
            picture_public_id: row.picture_public_id,
            shop_name: row.shop_name,
            gst_number: row.gst_number,
            pan_number: row.pan_number,
            profile_complete: row.profile_complete,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    id: Uuid,
    owner_id: Uuid,
    bill_number: String,
    bill_date: NaiveDate,
    shop_name: String,
    customer_name: String,
    customer_phone: String,
    customer_email: String,
    items: Json<Vec<BillItem>>,
    grand_total: Decimal,
    created_at: DateTime<Utc>,
}

impl From<BillRow> for Bill {
    fn from(row: BillRow) -> Self {
        Bill {
            id: row.id,
            owner_id: row.owner_id,
            bill_number: row.bill_number,
            bill_date: row.bill_date,
            shop_name: row.shop_name,
            customer: BillCustomer {
                name: row.customer_name,
                phone: row.customer_phone,
                email: row.customer_email,
            },
            items: row.items.0,
            grand_total: row.grand_total,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClaimRow {
    id: Uuid,
    customer_email: String,
    customer_name: String,
    bill_id: Option<Uuid>,
    item_name: String,
    company_name: String,
    item_cost: Option<Decimal>,
    issue_description: String,
    status: String,
    submitted_at: DateTime<Utc>,
}

impl TryFrom<ClaimRow> for WarrantyClaim {
    type Error = StoreError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        Ok(WarrantyClaim {
            id: row.id,
            customer_email: row.customer_email,
            customer_name: row.customer_name,
            bill_id: row.bill_id,
            item_name: row.item_name,
            company_name: row.company_name,
            item_cost: row.item_cost,
            issue_description: row.issue_description,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            submitted_at: row.submitted_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ScanRow {
    id: Uuid,
    owner_id: Uuid,
    photo_url: String,
    photo_public_id: String,
    extracted: Option<Json<ExtractedBill>>,
    note: String,
    created_at: DateTime<Utc>,
}

impl From<ScanRow> for ScannedBill {
    fn from(row: ScanRow) -> Self {
        ScannedBill {
            id: row.id,
            owner_id: row.owner_id,
            photo_url: row.photo_url,
            photo_public_id: row.photo_public_id,
            extracted: row.extracted.map(|j| j.0),
            note: row.note,
            created_at: row.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let profile_complete = user.profile_complete();
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, google_id, role, name, phone, address, \
             picture, shop_name, gst_number, pan_number, profile_complete) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.google_id)
            .bind(user.role.as_str())
            .bind(&user.name)
            .bind(&user.phone)
            .bind(&user.address)
            .bind(&user.picture)
            .bind(&user.shop_name)
            .bind(&user.gst_number)
            .bind(&user.pan_number)
            .bind(profile_complete)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE google_id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(google_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn update_user(&self, user: &User) -> StoreResult<User> {
        let sql = format!(
            "UPDATE users SET email = $2, password_hash = $3, google_id = $4, name = $5, \
             phone = $6, address = $7, picture = $8, picture_public_id = $9, shop_name = $10, \
             gst_number = $11, pan_number = $12, profile_complete = $13, updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.google_id)
            .bind(&user.name)
            .bind(&user.phone)
            .bind(&user.address)
            .bind(&user.picture)
            .bind(&user.picture_public_id)
            .bind(&user.shop_name)
            .bind(&user.gst_number)
            .bind(&user.pan_number)
            .bind(user.profile_complete)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or(StoreError::NotFound)?.try_into()
    }
}

// ---------------------------------------------------------------------------
// Bills
// ---------------------------------------------------------------------------

#[async_trait]
impl BillStore for PgStore {
    async fn insert_bill(&self, bill: NewBill) -> StoreResult<Bill> {
        let sql = format!(
            "INSERT INTO bills (id, owner_id, bill_number, bill_date, shop_name, customer_name, \
             customer_phone, customer_email, items, grand_total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {BILL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(bill.owner_id)
            .bind(&bill.bill_number)
            .bind(bill.bill_date)
            .bind(&bill.shop_name)
            .bind(&bill.customer.name)
            .bind(&bill.customer.phone)
            .bind(&bill.customer.email)
            .bind(Json(&bill.items))
            .bind(bill.grand_total)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn bills_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Bill>> {
        let sql = format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE owner_id = $1 \
             ORDER BY bill_date DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, BillRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Bill::from).collect())
    }

    async fn bills_for_customer_email(&self, email: &str) -> StoreResult<Vec<Bill>> {
        let sql = format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE customer_email = $1 \
             ORDER BY bill_date DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, BillRow>(&sql)
            .bind(email)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Bill::from).collect())
    }
}

// ---------------------------------------------------------------------------
// Warranty claims
// ---------------------------------------------------------------------------

#[async_trait]
impl ClaimStore for PgStore {
    async fn insert_claim(&self, claim: NewWarrantyClaim) -> StoreResult<WarrantyClaim> {
        let sql = format!(
            "INSERT INTO warranty_claims (id, customer_email, customer_name, bill_id, item_name, \
             company_name, item_cost, issue_description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {CLAIM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(&claim.customer_email)
            .bind(&claim.customer_name)
            .bind(claim.bill_id)
            .bind(&claim.item_name)
            .bind(&claim.company_name)
            .bind(claim.item_cost)
            .bind(&claim.issue_description)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn claims_for_email(&self, email: &str) -> StoreResult<Vec<WarrantyClaim>> {
        let sql = format!(
            "SELECT {CLAIM_COLUMNS} FROM warranty_claims WHERE customer_email = $1 \
             ORDER BY submitted_at DESC"
        );
        let rows = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(email)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(WarrantyClaim::try_from).collect()
    }
}

// ---------------------------------------------------------------------------
// Scanned bills
// ---------------------------------------------------------------------------

#[async_trait]
impl ScanStore for PgStore {
    async fn insert_scan(&self, scan: NewScannedBill) -> StoreResult<ScannedBill> {
        let sql = format!(
            "INSERT INTO scanned_bills (id, owner_id, photo_url, photo_public_id, extracted, note) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SCAN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ScanRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(scan.owner_id)
            .bind(&scan.photo_url)
            .bind(&scan.photo_public_id)
            .bind(scan.extracted.as_ref().map(Json))
            .bind(&scan.note)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn scans_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<ScannedBill>> {
        let sql = format!(
            "SELECT {SCAN_COLUMNS} FROM scanned_bills WHERE owner_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ScanRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ScannedBill::from).collect())
    }

    async fn delete_scan(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<ScannedBill>> {
        let sql = format!(
            "DELETE FROM scanned_bills WHERE id = $1 AND owner_id = $2 RETURNING {SCAN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ScanRow>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ScannedBill::from))
    }
}
