use crate::errors::AppError;
use crate::handlers::AppState;
use crate::webhook_models::{MutationPayload, WebhookResponse};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

/// Record-mutation webhook handler
///
/// Receives mutation events from the system of record when person records
/// are created/updated. Validates the webhook secret, partitions the batch
/// by action, and hands each side to the dispatch policy, which schedules
/// the sync callouts in the background.
///
/// Expected payload: Single event object OR array of events
/// Authentication: X-Webhook-Token header must match WEBHOOK_SECRET env var
pub async fn record_mutation_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<MutationPayload>,
) -> Result<(StatusCode, Json<WebhookResponse>), AppError> {
    tracing::info!("Received record-mutation webhook");

    // 1. Validate webhook secret (if configured)
    check_shared_secret(&state, &headers)?;

    // 2. Convert payload to vec of events (handles both single and batch)
    let events = payload.into_events();
    let total_received = events.len();
    tracing::info!("Processing {} mutation event(s)", total_received);

    // 3. Partition by action; events with an unknown action are skipped,
    //    never fatal for the batch
    let mut created = Vec::new();
    let mut updated = Vec::new();
    let mut unknown = 0;
    for event in events {
        if event.is_create() {
            created.push(event.record);
        } else if event.is_update() {
            updated.push(event.record);
        } else {
            unknown += 1;
            tracing::warn!(
                "Skipping event with unrecognized hook_action {:?}",
                event.hook_action
            );
        }
    }

    // 4. One dispatch decision per record; callouts are fire-and-forget
    let create_summary = state.dispatcher.on_create(created).await;
    let update_summary = state.dispatcher.on_update(updated).await;

    let scheduled = create_summary.scheduled + update_summary.scheduled;
    let skipped = create_summary.skipped + update_summary.skipped + unknown;
    let failed = create_summary.failed + update_summary.failed;

    tracing::info!(
        "Webhook processing complete: {} received, {} scheduled, {} skipped, {} failed",
        total_received,
        scheduled,
        skipped,
        failed
    );

    // 5. Return 200 immediately (background callouts handle the sync)
    Ok((
        StatusCode::OK,
        Json(WebhookResponse {
            status: "received".to_string(),
            received: total_received,
            scheduled,
            skipped,
            failed,
        }),
    ))
}

/// Checks the shared-secret header the system of record sends with each
/// mutation webhook. Skipped entirely when no secret is configured
/// (startup already warned about that).
fn check_shared_secret(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(ref secret) = state.config.webhook_secret else {
        return Ok(());
    };

    let presented = headers
        .get("X-Webhook-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing X-Webhook-Token header".to_string()))?;

    if !eq_constant_time(presented.as_bytes(), secret.as_bytes()) {
        tracing::warn!("Webhook token mismatch");
        return Err(AppError::Unauthorized("Invalid webhook token".to_string()));
    }

    Ok(())
}

/// Byte comparison whose running time does not depend on where the inputs
/// first diverge.
fn eq_constant_time(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_constant_time_matches_equal_bytes_only() {
        assert!(eq_constant_time(b"secret", b"secret"));
        assert!(!eq_constant_time(b"secret", b"secres"));
        assert!(!eq_constant_time(b"secret", b"secret2"));
        assert!(!eq_constant_time(b"", b"secret"));
    }
}
