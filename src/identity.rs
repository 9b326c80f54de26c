use std::collections::HashMap;

use async_trait::async_trait;
use rand::RngCore;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cache::compute_hash;
use crate::error::{Result, StudioError};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub token: String,
    pub user: User,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self, token: &str) -> Option<User>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignedIn>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn>;
    async fn sign_out(&self, token: &str);
}

struct Account {
    user: User,
    password_hash: String,
}

#[derive(Default)]
pub struct InMemoryIdentity {
    accounts: RwLock<HashMap<String, Account>>,
    sessions: RwLock<HashMap<String, User>>,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    fn hash_password(email: &str, password: &str) -> String {
        compute_hash(&format!("{email}:{password}"))
    }

    async fn open_session(&self, user: User) -> SignedIn {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        self.sessions.write().await.insert(token.clone(), user.clone());
        SignedIn { token, user }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    async fn current_user(&self, token: &str) -> Option<User> {
        self.sessions.read().await.get(token).cloned()
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignedIn> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(StudioError::Authentication("invalid email address".into()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(StudioError::Authentication(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let user = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&email) {
                return Err(StudioError::Authentication("account already exists".into()));
            }
            let user = User {
                id: Uuid::new_v4().to_string(),
                email: email.clone(),
            };
            accounts.insert(
                email.clone(),
                Account {
                    user: user.clone(),
                    password_hash: Self::hash_password(&email, password),
                },
            );
            user
        };
        tracing::info!("Account created for {}", email);
        Ok(self.open_session(user).await)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn> {
        let email = email.trim().to_lowercase();
        let user = {
            let accounts = self.accounts.read().await;
            accounts
                .get(&email)
                .filter(|account| account.password_hash == Self::hash_password(&email, password))
                .map(|account| account.user.clone())
        };
        let user = user.ok_or_else(|| StudioError::Authentication("invalid email or password".into()))?;
        Ok(self.open_session(user).await)
    }

    async fn sign_out(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}
