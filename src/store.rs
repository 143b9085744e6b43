//! Record store abstraction consumed by the sync flows.
//!
//! The trait is the seam: production wires `PgPersonStore`, tests wire
//! `MemoryPersonStore`. Both provide atomic per-record upsert/update so two
//! callouts racing on the same external id serialize into one complete
//! write.

use crate::errors::{AppError, ResultExt};
use crate::models::Person;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// The partial updates the sync flows perform on an existing record.
#[derive(Debug, Clone)]
pub enum PersonField {
    /// Assign the external profile identifier.
    ExternalId(String),
    /// Stamp the last successful push.
    LastSyncedAt(DateTime<Utc>),
}

/// CRUD surface the sync flows need from the system of record.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Look up a record by its external profile identifier.
    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Person>, AppError>;

    /// Insert the record, or update the profile fields of the existing
    /// record carrying the same external id. Preserves the existing row's
    /// `id` and `last_synced_at`; returns the row id.
    async fn upsert_by_external_id(&self, person: &Person) -> Result<Uuid, AppError>;

    /// Fetch a record by local id; `NotFound` when absent.
    async fn get_by_id(&self, id: Uuid) -> Result<Person, AppError>;

    /// Update a single field of the record identified by `id`, leaving
    /// every other column untouched. `NotFound` when the record is absent.
    async fn update_field(&self, id: Uuid, field: PersonField) -> Result<(), AppError>;
}

// ============ Postgres implementation ============

/// Postgres-backed person store. See `schema.sql` for the table layout.
pub struct PgPersonStore {
    pool: PgPool,
}

impl PgPersonStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonStore for PgPersonStore {
    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Person>, AppError> {
        let person = sqlx::query_as::<_, Person>("SELECT * FROM persons WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch person by external id")?;

        Ok(person)
    }

    async fn upsert_by_external_id(&self, person: &Person) -> Result<Uuid, AppError> {
        if person.external_id.is_none() {
            return Err(AppError::InternalError(
                "upsert requires a record with an external id".to_string(),
            ));
        }

        // ON CONFLICT keeps the existing id and last_synced_at so repeated
        // pulls of an unchanged payload leave the row identical.
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO persons (
                id, external_id, first_name, last_name, email, phone, birth_date,
                mailing_street, mailing_city, mailing_postal_code, mailing_state,
                mailing_country, last_synced_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (external_id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                birth_date = EXCLUDED.birth_date,
                mailing_street = EXCLUDED.mailing_street,
                mailing_city = EXCLUDED.mailing_city,
                mailing_postal_code = EXCLUDED.mailing_postal_code,
                mailing_state = EXCLUDED.mailing_state,
                mailing_country = EXCLUDED.mailing_country
            RETURNING id
            "#,
        )
        .bind(person.id)
        .bind(&person.external_id)
        .bind(&person.first_name)
        .bind(&person.last_name)
        .bind(&person.email)
        .bind(&person.phone)
        .bind(person.birth_date)
        .bind(&person.mailing_street)
        .bind(&person.mailing_city)
        .bind(&person.mailing_postal_code)
        .bind(&person.mailing_state)
        .bind(&person.mailing_country)
        .bind(person.last_synced_at)
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert person by external id")?;

        Ok(id)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Person, AppError> {
        let person = sqlx::query_as::<_, Person>("SELECT * FROM persons WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch person by id")?;

        person.ok_or_else(|| AppError::NotFound(format!("Person {} not found", id)))
    }

    async fn update_field(&self, id: Uuid, field: PersonField) -> Result<(), AppError> {
        let result = match field {
            PersonField::ExternalId(value) => {
                sqlx::query("UPDATE persons SET external_id = $2 WHERE id = $1")
                    .bind(id)
                    .bind(value)
                    .execute(&self.pool)
                    .await
                    .context("Failed to update external id")?
            }
            PersonField::LastSyncedAt(at) => {
                sqlx::query("UPDATE persons SET last_synced_at = $2 WHERE id = $1")
                    .bind(id)
                    .bind(at)
                    .execute(&self.pool)
                    .await
                    .context("Failed to update last synced timestamp")?
            }
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Person {} not found", id)));
        }

        Ok(())
    }
}

// ============ In-memory implementation ============

/// In-memory person store with the same semantics as `PgPersonStore`.
/// Used by the integration tests and handy for local runs without Postgres.
#[derive(Default)]
pub struct MemoryPersonStore {
    records: tokio::sync::Mutex<HashMap<Uuid, Person>>,
}

impl MemoryPersonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing upsert matching. Test helper.
    pub async fn insert(&self, person: Person) {
        self.records.lock().await.insert(person.id, person);
    }

    /// Snapshot of every record, ordered by id. Test helper.
    pub async fn dump(&self) -> Vec<Person> {
        let records = self.records.lock().await;
        let mut all: Vec<Person> = records.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        all
    }
}

#[async_trait]
impl PersonStore for MemoryPersonStore {
    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Person>, AppError> {
        let records = self.records.lock().await;
        Ok(records
            .values()
            .find(|p| p.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn upsert_by_external_id(&self, person: &Person) -> Result<Uuid, AppError> {
        let external_id = person.external_id.as_deref().ok_or_else(|| {
            AppError::InternalError("upsert requires a record with an external id".to_string())
        })?;

        let mut records = self.records.lock().await;
        if let Some(existing) = records
            .values_mut()
            .find(|p| p.external_id.as_deref() == Some(external_id))
        {
            existing.first_name = person.first_name.clone();
            existing.last_name = person.last_name.clone();
            existing.email = person.email.clone();
            existing.phone = person.phone.clone();
            existing.birth_date = person.birth_date;
            existing.mailing_street = person.mailing_street.clone();
            existing.mailing_city = person.mailing_city.clone();
            existing.mailing_postal_code = person.mailing_postal_code.clone();
            existing.mailing_state = person.mailing_state.clone();
            existing.mailing_country = person.mailing_country.clone();
            return Ok(existing.id);
        }

        records.insert(person.id, person.clone());
        Ok(person.id)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Person, AppError> {
        let records = self.records.lock().await;
        records
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Person {} not found", id)))
    }

    async fn update_field(&self, id: Uuid, field: PersonField) -> Result<(), AppError> {
        let mut records = self.records.lock().await;
        let person = records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Person {} not found", id)))?;

        match field {
            PersonField::ExternalId(value) => person.external_id = Some(value),
            PersonField::LastSyncedAt(at) => person.last_synced_at = Some(at),
        }

        Ok(())
    }
}
