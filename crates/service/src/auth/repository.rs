use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, email: &str, name: &str) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>,  // key: email
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: user_id
    }

    impl MockAuthRepository {
        /// Flip a stored user to inactive, as a soft delete would.
        pub fn deactivate(&self, email: &str) -> Result<(), AuthError> {
            let mut users = lock(&self.users)?;
            if let Some(u) = users.get_mut(email) {
                u.active = false;
            }
            Ok(())
        }
    }

    fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, AuthError> {
        m.lock().map_err(|_| AuthError::Repository("mock repository poisoned".into()))
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            Ok(lock(&self.users)?.get(email).cloned())
        }

        async fn create_user(&self, email: &str, name: &str) -> Result<AuthUser, AuthError> {
            let mut users = lock(&self.users)?;
            if users.contains_key(email) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
                name: name.to_string(),
                role: "user".into(),
                active: true,
            };
            users.insert(email.to_string(), user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            Ok(lock(&self.creds)?.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let c = Credentials { user_id, password_hash, password_algorithm };
            lock(&self.creds)?.insert(user_id, c.clone());
            Ok(c)
        }
    }
}
