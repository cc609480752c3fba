// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore backend: generic document operations over the `firestore` crate.
//!
//! The typed, per-collection API lives in [`crate::db::RecordStore`]; this
//! module only knows about collections, document IDs and serde.

use crate::error::AppError;
use firestore::FirestoreConsistencySelector;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Commit attempts for one read-modify-write before giving up.
const MAX_TRANSACTION_ATTEMPTS: u32 = 5;
const RETRY_BASE_DELAY_MS: u64 = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreBackend {
    client: firestore::FirestoreDb,
}

impl FirestoreBackend {
    /// Connect to Firestore.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn connect(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::connect_emulator(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Connect to the emulator with unauthenticated access.
    async fn connect_emulator(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    pub async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj::<T>()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn put<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All documents whose string `field` equals `value`.
    pub async fn find_by<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let value = value.to_string();
        self.client
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.field(field).eq(value.clone()))
            .obj::<T>()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.client
            .fluent()
            .select()
            .from(collection)
            .obj::<T>()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Read-modify-write one existing document inside a transaction.
    ///
    /// Returns `None` (and writes nothing) if the document does not exist.
    /// An error from `apply` rolls the transaction back. A commit that loses
    /// to a concurrent writer is retried with a fresh read, so `apply` may run
    /// more than once.
    pub async fn update<T, F>(
        &self,
        collection: &str,
        id: &str,
        mut apply: F,
    ) -> Result<Option<T>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnMut(&mut T) -> Result<(), AppError> + Send,
    {
        self.read_modify_write(collection, id, |current: Option<T>| match current {
            Some(mut doc) => {
                apply(&mut doc)?;
                Ok(Some(doc))
            }
            None => Ok(None),
        })
        .await
    }

    /// Read-modify-write one document, starting from `T::default()` if absent.
    pub async fn upsert<T, F>(&self, collection: &str, id: &str, mut apply: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned + Default + Send + Sync,
        F: FnMut(&mut T) + Send,
    {
        self.read_modify_write(collection, id, |current: Option<T>| {
            let mut doc = current.unwrap_or_default();
            apply(&mut doc);
            Ok(Some(doc))
        })
        .await?
        .ok_or_else(|| AppError::Database(format!("Upsert of {}/{} wrote nothing", collection, id)))
    }

    async fn read_modify_write<T, F>(
        &self,
        collection: &str,
        id: &str,
        mut step: F,
    ) -> Result<Option<T>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnMut(Option<T>) -> Result<Option<T>, AppError> + Send,
    {
        let mut attempt = 1;
        loop {
            match self.transaction_attempt(collection, id, &mut step).await? {
                Attempt::Done(doc) => return Ok(doc),
                Attempt::Contended(reason) if attempt < MAX_TRANSACTION_ATTEMPTS => {
                    tracing::debug!(collection, id, attempt, reason = %reason, "Transaction contended, retrying");
                    tokio::time::sleep(Duration::from_millis(RETRY_BASE_DELAY_MS * u64::from(attempt)))
                        .await;
                    attempt += 1;
                }
                Attempt::Contended(reason) => {
                    return Err(AppError::Database(format!(
                        "Transaction on {}/{} failed after {} attempts: {}",
                        collection, id, attempt, reason
                    )))
                }
            }
        }
    }

    /// One transactional pass: read through the transaction, apply, commit.
    async fn transaction_attempt<T, F>(
        &self,
        collection: &str,
        id: &str,
        step: &mut F,
    ) -> Result<Attempt<T>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnMut(Option<T>) -> Result<Option<T>, AppError> + Send,
    {
        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Reads bound to the transaction take part in its conflict detection.
        let reader = self.client.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );
        let read: Result<Option<T>, _> = reader
            .fluent()
            .select()
            .by_id_in(collection)
            .obj::<T>()
            .one(id)
            .await;
        let current = match read {
            Ok(current) => current,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(AppError::Database(format!(
                    "Failed to read {} in transaction: {}",
                    collection, e
                )));
            }
        };

        let doc = match step(current) {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                let _ = transaction.rollback().await;
                return Ok(Attempt::Done(None));
            }
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e);
            }
        };

        self.client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(&doc)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add {} to transaction: {}", collection, e))
            })?;

        match transaction.commit().await {
            Ok(_) => Ok(Attempt::Done(Some(doc))),
            Err(e) => Ok(Attempt::Contended(e.to_string())),
        }
    }
}

enum Attempt<T> {
    Done(Option<T>),
    Contended(String),
}
