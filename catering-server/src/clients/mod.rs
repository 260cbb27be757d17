//! Client registry
//!
//! Lookup-by-email and create-with-temporary-credential, backed by the
//! engine storage with a unique email index. Only the argon2 hash of a
//! credential is ever stored.

use crate::db::EngineStorage;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use redb::WriteTransaction;
use shared::error::{AppError, AppResult};
use shared::models::{ClientAccount, ClientCategory};
use shared::util;

/// Length of generated temporary passwords
const TEMP_PASSWORD_LEN: usize = 12;

/// Input for creating a client account
#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub category: ClientCategory,
}

/// Client registry over the engine storage
#[derive(Clone)]
pub struct ClientRegistry {
    storage: EngineStorage,
}

impl ClientRegistry {
    pub fn new(storage: EngineStorage) -> Self {
        Self { storage }
    }

    /// Fetch a client by id
    pub fn get(&self, client_id: &str) -> AppResult<ClientAccount> {
        Ok(self.storage.get_client(client_id)?)
    }

    /// Look up a client by email (case-insensitive)
    pub fn find_by_email(&self, email: &str) -> AppResult<Option<ClientAccount>> {
        let txn = self.storage.begin_write()?;
        let found = self.storage.find_client_by_email(&txn, email)?;
        Ok(found)
    }

    /// Create a client with a generated temporary credential.
    ///
    /// The plaintext password is returned exactly once so the notification
    /// layer can deliver it; only the hash is persisted.
    pub fn create_with_temporary_credential(
        &self,
        new: NewClient,
    ) -> AppResult<(ClientAccount, String)> {
        let txn = self.storage.begin_write()?;
        let result = self.create_in_txn(&txn, new)?;
        txn.commit().map_err(crate::db::StorageError::from)?;
        tracing::info!(client_id = %result.0.id, "Created client with temporary credential");
        Ok(result)
    }

    /// Create a client inside an existing transaction (used by the
    /// application converter so client creation joins its all-or-nothing
    /// write).
    pub fn create_in_txn(
        &self,
        txn: &WriteTransaction,
        new: NewClient,
    ) -> AppResult<(ClientAccount, String)> {
        let email = new.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::validation(format!("invalid email: {:?}", new.email)));
        }

        let password = util::temp_password(TEMP_PASSWORD_LEN);
        let client = ClientAccount {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name,
            email,
            phone: new.phone,
            category: new.category,
            password_hash: hash_password(&password)?,
            temporary_password: true,
            created_at: util::now_millis(),
        };

        self.storage.insert_client(txn, &client)?;
        Ok((client, password))
    }

    /// Resolve a client by email, creating one when absent
    pub fn resolve_or_create_in_txn(
        &self,
        txn: &WriteTransaction,
        name: &str,
        email: &str,
        phone: Option<String>,
    ) -> AppResult<ClientAccount> {
        if let Some(existing) = self.storage.find_client_by_email(txn, email)? {
            return Ok(existing);
        }
        let (client, _password) = self.create_in_txn(
            txn,
            NewClient {
                name: name.to_string(),
                email: email.to_string(),
                phone,
                category: ClientCategory::Individual,
            },
        )?;
        Ok(client)
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))
}
