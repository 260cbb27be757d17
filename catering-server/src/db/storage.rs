//! redb-based storage layer for the order engine
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` (JSON) | Order records |
//! | `applications` | `application_id` | `Application` (JSON) | Inbound applications |
//! | `clients` | `client_id` | `ClientAccount` (JSON) | Client registry |
//! | `client_email_idx` | `email` | `client_id` | Unique email lookup |
//!
//! # Concurrency
//!
//! redb serializes write transactions, so every mutation in the engine is a
//! read-current-state, validate, atomic-write sequence under a single writer
//! lock. Three actors (editing UI, gateway callback, scheduler) can target the
//! same order without observing or producing half-updated records.
//!
//! # Durability
//!
//! Commits use copy-on-write with an atomic pointer swap; the database file is
//! always in a consistent state even across power loss.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::error::{AppError, ErrorCode};
use shared::models::{Application, ClientAccount, Order};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Applications: key = application_id, value = JSON-serialized Application
const APPLICATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("applications");

/// Clients: key = client_id, value = JSON-serialized ClientAccount
const CLIENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("clients");

/// Email index: key = email (lowercased), value = client_id
const CLIENT_EMAIL_TABLE: TableDefinition<&str, &str> = TableDefinition::new("client_email_idx");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Client email already registered: {0}")]
    DuplicateEmail(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::OrderNotFound(id) => AppError::order_not_found(id),
            StorageError::ApplicationNotFound(id) => AppError::application_not_found(id),
            StorageError::ClientNotFound(id) => AppError::client_not_found(id),
            StorageError::DuplicateEmail(email) => {
                AppError::new(ErrorCode::ClientAlreadyExists).with_detail("email", email)
            }
            other => AppError::storage(other.to_string()),
        }
    }
}

/// Engine storage backed by redb
#[derive(Clone)]
pub struct EngineStorage {
    db: Arc<Database>,
}

impl EngineStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Create all tables so later read transactions never hit a missing table
    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(APPLICATIONS_TABLE)?;
            let _ = write_txn.open_table(CLIENTS_TABLE)?;
            let _ = write_txn.open_table(CLIENT_EMAIL_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Order Operations ==========

    /// Load an order inside a write transaction
    pub fn load_order(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<Order> {
        let table = txn.open_table(ORDERS_TABLE)?;
        let bytes = table
            .get(order_id)?
            .map(|guard| guard.value().to_vec())
            .ok_or_else(|| StorageError::OrderNotFound(order_id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Store an order inside a write transaction
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let bytes = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    /// Read an order outside any write transaction
    pub fn get_order(&self, order_id: &str) -> StorageResult<Order> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let bytes = table
            .get(order_id)?
            .map(|guard| guard.value().to_vec())
            .ok_or_else(|| StorageError::OrderNotFound(order_id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// IDs of all orders not yet in a terminal state
    ///
    /// Snapshot for the sweep; each order is re-read and re-validated inside
    /// its own write transaction before being touched.
    pub fn list_open_order_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut ids = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let order: Order = serde_json::from_slice(value.value())?;
            if !order.is_terminal() {
                ids.push(key.value().to_string());
            }
        }
        Ok(ids)
    }

    // ========== Application Operations ==========

    /// Load an application inside a write transaction
    pub fn load_application(
        &self,
        txn: &WriteTransaction,
        application_id: &str,
    ) -> StorageResult<Application> {
        let table = txn.open_table(APPLICATIONS_TABLE)?;
        let bytes = table
            .get(application_id)?
            .map(|guard| guard.value().to_vec())
            .ok_or_else(|| StorageError::ApplicationNotFound(application_id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Store an application inside a write transaction
    pub fn store_application(
        &self,
        txn: &WriteTransaction,
        application: &Application,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(APPLICATIONS_TABLE)?;
        let bytes = serde_json::to_vec(application)?;
        table.insert(application.id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    /// Read an application outside any write transaction
    pub fn get_application(&self, application_id: &str) -> StorageResult<Application> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(APPLICATIONS_TABLE)?;
        let bytes = table
            .get(application_id)?
            .map(|guard| guard.value().to_vec())
            .ok_or_else(|| StorageError::ApplicationNotFound(application_id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // ========== Client Operations ==========

    /// Load a client inside a write transaction
    pub fn load_client(
        &self,
        txn: &WriteTransaction,
        client_id: &str,
    ) -> StorageResult<ClientAccount> {
        let table = txn.open_table(CLIENTS_TABLE)?;
        let bytes = table
            .get(client_id)?
            .map(|guard| guard.value().to_vec())
            .ok_or_else(|| StorageError::ClientNotFound(client_id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Read a client outside any write transaction
    pub fn get_client(&self, client_id: &str) -> StorageResult<ClientAccount> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CLIENTS_TABLE)?;
        let bytes = table
            .get(client_id)?
            .map(|guard| guard.value().to_vec())
            .ok_or_else(|| StorageError::ClientNotFound(client_id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Look up a client by email inside a write transaction
    pub fn find_client_by_email(
        &self,
        txn: &WriteTransaction,
        email: &str,
    ) -> StorageResult<Option<ClientAccount>> {
        let key = email.trim().to_lowercase();
        let client_id = {
            let index = txn.open_table(CLIENT_EMAIL_TABLE)?;
            index.get(key.as_str())?.map(|guard| guard.value().to_string())
        };
        match client_id {
            Some(id) => Ok(Some(self.load_client(txn, &id)?)),
            None => Ok(None),
        }
    }

    /// Insert a new client, maintaining the unique email index
    pub fn insert_client(
        &self,
        txn: &WriteTransaction,
        client: &ClientAccount,
    ) -> StorageResult<()> {
        let key = client.email.trim().to_lowercase();
        {
            let mut index = txn.open_table(CLIENT_EMAIL_TABLE)?;
            if index.get(key.as_str())?.is_some() {
                return Err(StorageError::DuplicateEmail(client.email.clone()));
            }
            index.insert(key.as_str(), client.id.as_str())?;
        }
        let mut table = txn.open_table(CLIENTS_TABLE)?;
        let bytes = serde_json::to_vec(client)?;
        table.insert(client.id.as_str(), bytes.as_slice())?;
        Ok(())
    }
}
