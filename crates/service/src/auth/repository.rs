use async_trait::async_trait;

use super::domain::User;
use super::errors::AuthError;

/// Persistence contract for users.
///
/// Email lookups are exact. Implementations enforce email uniqueness and
/// report a duplicate write as [`AuthError::EmailAlreadyRegistered`].
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user and write the assigned id (> 0) back into it.
    async fn add_user(&self, user: &mut User) -> Result<(), AuthError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AuthError>;
    /// All users in ascending id order.
    async fn get_all_users(&self) -> Result<Vec<User>, AuthError>;
    async fn update_user(&self, user: &User) -> Result<(), AuthError>;
    /// Returns whether a user was removed.
    async fn delete_user(&self, id: i64) -> Result<bool, AuthError>;
}

/// Process-local repository for tests, doc examples and database-less runs
pub mod memory {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Store {
        users: BTreeMap<i64, User>,
        by_email: HashMap<String, i64>,
        last_id: i64,
    }

    #[derive(Default)]
    pub struct InMemoryUserRepository {
        inner: Mutex<Store>,
    }

    impl InMemoryUserRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn len(&self) -> usize {
            self.inner.lock().await.users.len()
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn add_user(&self, user: &mut User) -> Result<(), AuthError> {
            let mut store = self.inner.lock().await;
            if store.by_email.contains_key(&user.email) {
                return Err(AuthError::EmailAlreadyRegistered);
            }
            store.last_id += 1;
            user.id = store.last_id;
            store.by_email.insert(user.email.clone(), user.id);
            store.users.insert(user.id, user.clone());
            Ok(())
        }

        async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
            let store = self.inner.lock().await;
            Ok(store.by_email.get(email).and_then(|id| store.users.get(id)).cloned())
        }

        async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
            Ok(self.inner.lock().await.users.get(&id).cloned())
        }

        async fn get_all_users(&self) -> Result<Vec<User>, AuthError> {
            Ok(self.inner.lock().await.users.values().cloned().collect())
        }

        async fn update_user(&self, user: &User) -> Result<(), AuthError> {
            let mut store = self.inner.lock().await;
            let old_email = match store.users.get(&user.id) {
                Some(existing) => existing.email.clone(),
                None => return Err(AuthError::NotFound),
            };
            if old_email != user.email {
                if store.by_email.contains_key(&user.email) {
                    return Err(AuthError::EmailAlreadyRegistered);
                }
                store.by_email.remove(&old_email);
                store.by_email.insert(user.email.clone(), user.id);
            }
            store.users.insert(user.id, user.clone());
            Ok(())
        }

        async fn delete_user(&self, id: i64) -> Result<bool, AuthError> {
            let mut store = self.inner.lock().await;
            match store.users.remove(&id) {
                Some(removed) => {
                    store.by_email.remove(&removed.email);
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

}
