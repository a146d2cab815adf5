//! Identity domain models.
//!
//! `User` is the stored record and carries the password hash; it is never
//! serialized. `PublicUser` is the outbound shape.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Fixed once the account exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Retailer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Retailer => "retailer",
            Role::Admin => "admin",
        }
    }

    /// Role a caller may claim when signing up: `retailer` only when spelled
    /// exactly that way, `customer` for anything else (including nothing).
    pub fn declared(value: Option<&str>) -> Role {
        match value {
            Some("retailer") => Role::Retailer,
            _ => Role::Customer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "retailer" => Ok(Role::Retailer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Mutable free-text profile fields, addressed uniformly by the profile updater.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Phone,
    Address,
    ShopName,
    GstNumber,
    PanNumber,
}

/// Stored user record.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub role: Role,
    pub name: String,
    pub phone: String,
    /// Home address for customers, shop address for retailers.
    pub address: String,
    pub picture: String,
    pub picture_public_id: String,
    pub shop_name: String,
    pub gst_number: String,
    pub pan_number: String,
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn profile_field(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Phone => &self.phone,
            ProfileField::Address => &self.address,
            ProfileField::ShopName => &self.shop_name,
            ProfileField::GstNumber => &self.gst_number,
            ProfileField::PanNumber => &self.pan_number,
        }
    }

    pub fn profile_field_mut(&mut self, field: ProfileField) -> &mut String {
        match field {
            ProfileField::Name => &mut self.name,
            ProfileField::Phone => &mut self.phone,
            ProfileField::Address => &mut self.address,
            ProfileField::ShopName => &mut self.shop_name,
            ProfileField::GstNumber => &mut self.gst_number,
            ProfileField::PanNumber => &mut self.pan_number,
        }
    }

    /// Recompute `profile_complete` from the current field values.
    pub fn refresh_profile_complete(&mut self) {
        self.profile_complete = profile_is_complete(
            self.role,
            &self.name,
            &self.phone,
            &self.address,
            &self.shop_name,
            &self.gst_number,
        );
    }
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub role: Role,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub picture: String,
    pub shop_name: String,
    pub gst_number: String,
    pub pan_number: String,
}

impl NewUser {
    /// A bare record with only the identifying fields set.
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            password_hash: None,
            google_id: None,
            role,
            name: String::new(),
            phone: String::new(),
            address: String::new(),
            picture: String::new(),
            shop_name: String::new(),
            gst_number: String::new(),
            pan_number: String::new(),
        }
    }

    pub fn profile_complete(&self) -> bool {
        profile_is_complete(
            self.role,
            &self.name,
            &self.phone,
            &self.address,
            &self.shop_name,
            &self.gst_number,
        )
    }
}

/// Customers need name, phone and address; retailers also need shop name and GST number.
pub fn profile_is_complete(
    role: Role,
    name: &str,
    phone: &str,
    address: &str,
    shop_name: &str,
    gst_number: &str,
) -> bool {
    let base = [name, phone, address]
        .iter()
        .all(|v| !v.trim().is_empty());
    match role {
        Role::Retailer => base && !shop_name.trim().is_empty() && !gst_number.trim().is_empty(),
        Role::Customer | Role::Admin => base,
    }
}

/// Outbound user representation. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub picture: String,
    pub shop_name: String,
    pub gst_number: String,
    pub pan_number: String,
    pub has_password: bool,
    pub google_linked: bool,
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            picture: user.picture.clone(),
            shop_name: user.shop_name.clone(),
            gst_number: user.gst_number.clone(),
            pan_number: user.pan_number.clone(),
            has_password: user.password_hash.is_some(),
            google_linked: user.google_id.is_some(),
            profile_complete: user.profile_complete,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// JWT claims embedded in application tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user ID.
    pub sub: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

/// Trim and lower-case an email address for storage and lookup.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Shallow shape check: one `@`, non-empty local part, dotted domain.
pub fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: Uuid::now_v7(),
            email: "asha@example.com".into(),
            password_hash: Some("$2b$10$hash".into()),
            google_id: None,
            role,
            name: "Asha".into(),
            phone: "9876543210".into(),
            address: "12 MG Road".into(),
            picture: String::new(),
            picture_public_id: String::new(),
            shop_name: String::new(),
            gst_number: String::new(),
            pan_number: String::new(),
            profile_complete: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn declared_role_only_accepts_exact_retailer() {
        assert_eq!(Role::declared(Some("retailer")), Role::Retailer);
        assert_eq!(Role::declared(Some("Retailer")), Role::Customer);
        assert_eq!(Role::declared(Some("admin")), Role::Customer);
        assert_eq!(Role::declared(None), Role::Customer);
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Customer, Role::Retailer, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn public_user_hides_password_hash() {
        let user = sample_user(Role::Customer);
        let json = serde_json::to_value(PublicUser::from(&user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("$2b$"));
        assert_eq!(json["hasPassword"], true);
    }

    #[test]
    fn retailer_profile_needs_shop_details() {
        let mut user = sample_user(Role::Retailer);
        user.refresh_profile_complete();
        assert!(!user.profile_complete);

        user.shop_name = "Asha Electronics".into();
        user.gst_number = "22AAAAA0000A1Z5".into();
        user.refresh_profile_complete();
        assert!(user.profile_complete);
    }

    #[test]
    fn customer_profile_complete_with_contact_details() {
        let mut user = sample_user(Role::Customer);
        user.refresh_profile_complete();
        assert!(user.profile_complete);
    }

    #[test]
    fn email_helpers() {
        assert_eq!(normalize_email("  Asha@Example.COM "), "asha@example.com");
        assert!(looks_like_email("asha@example.com"));
        assert!(!looks_like_email("asha.example.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("asha@example"));
        assert!(!looks_like_email("a b@example.com"));
    }
}
