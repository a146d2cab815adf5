//! Store doubles shared by the account flow tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewUser, User};
use crate::store::{MemoryStore, StoreResult, UserStore};

/// Email lookups always miss, so a write reaches the unique index as if a
/// concurrent request had inserted the same email in between.
pub(crate) struct StaleEmailStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl UserStore for StaleEmailStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.inner.insert_user(user).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
        Ok(None)
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_google_id(google_id).await
    }

    async fn update_user(&self, user: &User) -> StoreResult<User> {
        self.inner.update_user(user).await
    }
}
