//! Per-record routing of mutation events onto the sync flows.
//!
//! Routing itself is pure; the `Dispatcher` wraps it with external-id
//! assignment and fire-and-forget scheduling of the callouts.

use crate::errors::AppError;
use crate::models::Person;
use crate::store::{PersonField, PersonStore};
use crate::sync::{SyncConnector, SyncOutcome};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Largest external id served by the pull flow. Ids at or below this value
/// pull on creation; only ids strictly above it push on update, so exactly
/// 100 never pushes.
pub const PULL_ID_MAX: i64 = 100;

/// Routing decision for a created record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateRoute {
    /// No external id yet: assign one in `[0, PULL_ID_MAX]`, then pull it.
    AssignAndPull,
    /// External id within the pull range.
    Pull(String),
    /// External id outside the pull range; creation never pushes.
    Skip,
}

/// Routing decision for an updated record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateRoute {
    /// External id above the pull range: push the record outward.
    Push,
    /// Nothing to do for this record.
    Skip,
}

/// Decides what a newly created record gets.
pub fn route_on_create(external_id: Option<&str>) -> Result<CreateRoute, AppError> {
    let Some(raw) = external_id else {
        return Ok(CreateRoute::AssignAndPull);
    };

    let value = parse_external_id(raw)?;
    if value <= PULL_ID_MAX {
        Ok(CreateRoute::Pull(raw.to_string()))
    } else {
        Ok(CreateRoute::Skip)
    }
}

/// Decides what an updated record gets.
pub fn route_on_update(external_id: Option<&str>) -> Result<UpdateRoute, AppError> {
    let Some(raw) = external_id else {
        return Ok(UpdateRoute::Skip);
    };

    let value = parse_external_id(raw)?;
    if value > PULL_ID_MAX {
        Ok(UpdateRoute::Push)
    } else {
        Ok(UpdateRoute::Skip)
    }
}

fn parse_external_id(raw: &str) -> Result<i64, AppError> {
    raw.trim().parse::<i64>().map_err(|_| {
        AppError::InvalidIdentifier(format!("external id '{}' is not numeric", raw))
    })
}

/// Uniform external id in `[0, PULL_ID_MAX]` inclusive. Only the range is
/// contract-bearing, not the distribution.
fn assign_external_id() -> i64 {
    rand::thread_rng().gen_range(0..=PULL_ID_MAX)
}

/// Outcome counts for one batch of mutation events.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Records that scheduled a callout.
    pub scheduled: usize,
    /// Records the policy had nothing to do for.
    pub skipped: usize,
    /// Records whose dispatch failed; siblings were unaffected.
    pub failed: usize,
}

/// Applies the routing policy to batches of mutated records and schedules
/// the resulting callouts as detached tasks.
///
/// Each entry point walks its batch sequentially, one decision per record,
/// and returns as soon as every qualifying callout has been spawned. The
/// callouts run outside the event-handling path, in no particular order,
/// and log their own outcomes; a failure in one record's dispatch never
/// stops the rest of the batch.
#[derive(Clone)]
pub struct Dispatcher {
    connector: Arc<SyncConnector>,
    store: Arc<dyn PersonStore>,
}

impl Dispatcher {
    pub fn new(connector: Arc<SyncConnector>, store: Arc<dyn PersonStore>) -> Self {
        Self { connector, store }
    }

    /// Entry point for record-creation events.
    pub async fn on_create(&self, records: Vec<Person>) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for record in records {
            match self.dispatch_create(&record).await {
                Ok(true) => summary.scheduled += 1,
                Ok(false) => {
                    summary.skipped += 1;
                    tracing::debug!("No sync action for created person {}", record.id);
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("Dispatch failed for created person {}: {}", record.id, e);
                }
            }
        }
        summary
    }

    /// Entry point for record-update events.
    pub async fn on_update(&self, records: Vec<Person>) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for record in records {
            match route_on_update(record.external_id.as_deref()) {
                Ok(UpdateRoute::Push) => {
                    self.spawn_push(record.id);
                    summary.scheduled += 1;
                }
                Ok(UpdateRoute::Skip) => {
                    summary.skipped += 1;
                    tracing::debug!("No sync action for updated person {}", record.id);
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("Dispatch failed for updated person {}: {}", record.id, e);
                }
            }
        }
        summary
    }

    async fn dispatch_create(&self, record: &Person) -> Result<bool, AppError> {
        match route_on_create(record.external_id.as_deref())? {
            CreateRoute::AssignAndPull => {
                let assigned = assign_external_id().to_string();
                self.store
                    .update_field(record.id, PersonField::ExternalId(assigned.clone()))
                    .await?;
                tracing::info!("Assigned external id {} to person {}", assigned, record.id);
                self.spawn_pull(assigned);
                Ok(true)
            }
            CreateRoute::Pull(external_id) => {
                self.spawn_pull(external_id);
                Ok(true)
            }
            CreateRoute::Skip => Ok(false),
        }
    }

    /// Schedules a pull as a detached task (non-blocking for the caller).
    fn spawn_pull(&self, external_id: String) {
        let connector = self.connector.clone();
        tokio::spawn(async move {
            match connector.pull_and_upsert(&external_id).await {
                Ok(SyncOutcome::Applied) => {
                    tracing::info!("Pull for external id {} applied", external_id);
                }
                Ok(SyncOutcome::RemoteRejected { status }) => {
                    tracing::warn!(
                        "Pull for external id {} answered with status {}; nothing stored",
                        external_id,
                        status
                    );
                }
                Err(e) => {
                    tracing::error!("Pull for external id {} failed: {}", external_id, e);
                }
            }
        });
    }

    /// Schedules a push as a detached task (non-blocking for the caller).
    fn spawn_push(&self, id: Uuid) {
        let connector = self.connector.clone();
        tokio::spawn(async move {
            match connector.push_and_stamp(id).await {
                Ok(SyncOutcome::Applied) => {
                    tracing::info!("Push for person {} applied", id);
                }
                Ok(SyncOutcome::RemoteRejected { status }) => {
                    tracing::warn!(
                        "Push for person {} answered with status {}; record unchanged",
                        id,
                        status
                    );
                }
                Err(e) => {
                    tracing::error!("Push for person {} failed: {}", id, e);
                }
            }
        });
    }
}
