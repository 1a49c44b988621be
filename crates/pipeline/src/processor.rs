//! Two-phase message fan-out.
//!
//! Phase one ([`Processor::process_new_messages`]) examines due messages,
//! resolves each one's applicable mediums from configuration and stored
//! preferences, and claims a pending delivery log per (message, medium)
//! pair. Phase two ([`Processor::process_new_message_logs`]) locks pending
//! logs, dispatches them through the configured backends, and records
//! exactly one terminal outcome per log. A message's `is_logged` flag flips
//! only once no pending log remains, at which point it becomes visible and
//! an unread-count event is published for its owner.
//!
//! Both phases are safe to run concurrently from multiple processes: claims
//! ride on the (message, medium) unique constraint, dispatch uses
//! `FOR UPDATE SKIP LOCKED`, and terminal transitions are guarded.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use inbox_core::config::InboxConfig;
use inbox_core::mediums::{DISPATCHABLE_MEDIUMS, MEDIUM_APP_PUSH, MEDIUM_EMAIL};
use inbox_core::preferences::{effective_value, StoredGroup};
use inbox_core::types::DbId;
use inbox_core::CoreError;
use inbox_db::models::message_log::PendingDelivery;
use inbox_db::repositories::{
    DeviceGroupRepo, MessageLogRepo, MessagePreferencesRepo, MessageRepo, UserRepo,
};
use inbox_db::DbPool;
use inbox_events::delivery::app_push::{AppPushBackend, AppPushMessage, PushOutcome};
use inbox_events::delivery::email::{EmailBackend, EmailError, EmailMessage};
use inbox_events::{EventBus, InboxEvent};
use serde::Serialize;

/// Maximum due messages examined per run.
const MESSAGE_BATCH: i64 = 100;

/// Maximum pending logs locked per dispatch run.
const LOG_BATCH: i64 = 500;

// ---------------------------------------------------------------------------
// Error and summaries
// ---------------------------------------------------------------------------

/// Error type for pipeline runs.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Surfaces only when `message_create_fail_silently` is off; the failed
    /// log is committed before this propagates.
    #[error("email delivery error: {0}")]
    Email(#[from] EmailError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Counters from one dispatch run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Messages whose fan-out completed during this run.
    pub messages_logged: usize,
}

/// Counters from one full pipeline run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ProcessSummary {
    pub messages_examined: usize,
    pub logs_claimed: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub messages_logged: usize,
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Drives message fan-out against one database.
///
/// Backends are injected so tests and local runs can observe deliveries
/// without network access.
pub struct Processor {
    pool: DbPool,
    push: Arc<dyn AppPushBackend>,
    email: Arc<dyn EmailBackend>,
    bus: Arc<EventBus>,
}

impl Processor {
    pub fn new(
        pool: DbPool,
        push: Arc<dyn AppPushBackend>,
        email: Arc<dyn EmailBackend>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            pool,
            push,
            email,
            bus,
        }
    }

    /// Run the full pipeline once: claim logs for due messages, dispatch
    /// them, and complete fan-out for messages with nothing left pending.
    pub async fn process_new_messages(
        &self,
        config: &InboxConfig,
    ) -> Result<ProcessSummary, PipelineError> {
        let messages = MessageRepo::list_unprocessed(&self.pool, MESSAGE_BATCH).await?;
        let mut summary = ProcessSummary {
            messages_examined: messages.len(),
            ..Default::default()
        };

        // Stored preferences are fetched once per user, not per message.
        let mut prefs_cache: HashMap<DbId, Vec<StoredGroup>> = HashMap::new();

        for message in &messages {
            let Some(group) = config.group_for_key(&message.key) else {
                tracing::warn!(
                    message_id = message.id,
                    key = %message.key,
                    "No message group configured for key; nothing to dispatch"
                );
                continue;
            };

            if !prefs_cache.contains_key(&message.user_id) {
                let stored =
                    MessagePreferencesRepo::get_groups(&self.pool, message.user_id).await?;
                prefs_cache.insert(message.user_id, stored);
            }
            let stored = &prefs_cache[&message.user_id];

            for medium in DISPATCHABLE_MEDIUMS {
                if !group.preference_defaults.contains_key(medium) {
                    continue;
                }
                if effective_value(config, stored, &group.id, medium)? != Some(true) {
                    continue;
                }
                if MessageLogRepo::claim(&self.pool, message.id, medium).await? {
                    summary.logs_claimed += 1;
                }
            }
        }

        let dispatch = self.process_new_message_logs(config).await?;
        summary.sent = dispatch.sent;
        summary.failed = dispatch.failed;
        summary.skipped = dispatch.skipped;
        summary.messages_logged = dispatch.messages_logged;

        // Messages with zero applicable mediums (and any whose logs all
        // finished in earlier runs) complete here.
        let message_ids: Vec<DbId> = messages.iter().map(|m| m.id).collect();
        let flipped = MessageRepo::mark_logged_if_complete(&self.pool, &message_ids).await?;
        summary.messages_logged += flipped.len();

        let flipped_set: HashSet<DbId> = flipped.into_iter().collect();
        let users: BTreeSet<DbId> = messages
            .iter()
            .filter(|m| flipped_set.contains(&m.id) && !m.is_hidden)
            .map(|m| m.user_id)
            .collect();
        self.publish_unread_counts(users).await?;

        tracing::info!(
            messages = summary.messages_examined,
            claimed = summary.logs_claimed,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            "Pipeline run complete"
        );
        Ok(summary)
    }

    /// Dispatch a batch of pending delivery logs.
    ///
    /// Locks the batch, hands the payloads to the medium backends, records
    /// one terminal outcome per log, and commits. Messages whose last
    /// pending log finished are marked logged afterwards.
    pub async fn process_new_message_logs(
        &self,
        config: &InboxConfig,
    ) -> Result<DispatchSummary, PipelineError> {
        let mut summary = DispatchSummary::default();

        let mut tx = self.pool.begin().await?;
        let batch = MessageLogRepo::lock_pending(&mut tx, LOG_BATCH).await?;
        if batch.is_empty() {
            tx.commit().await?;
            return Ok(summary);
        }

        // App push: batch everything to the backend, then map outcomes back
        // onto log transitions. Key eviction happens here, not in the
        // backend.
        let push_deliveries: Vec<&PendingDelivery> = batch
            .iter()
            .filter(|d| d.medium == MEDIUM_APP_PUSH)
            .collect();
        if !push_deliveries.is_empty() {
            let mut payloads = Vec::with_capacity(push_deliveries.len());
            for delivery in &push_deliveries {
                let key =
                    DeviceGroupRepo::get_notification_key(&self.pool, delivery.user_id).await?;
                payloads.push(AppPushMessage {
                    notification_key: key,
                    title: delivery.subject.clone(),
                    body: delivery.body.clone(),
                    data: delivery.data.clone(),
                    log_id: delivery.log_id,
                });
            }

            let outcomes = self.push.send_messages(&payloads).await;
            for (delivery, outcome) in push_deliveries.iter().zip(outcomes) {
                match outcome {
                    PushOutcome::Sent => {
                        MessageLogRepo::mark_sent(&mut tx, delivery.log_id).await?;
                        summary.sent += 1;
                    }
                    PushOutcome::Skipped(reason) => {
                        MessageLogRepo::mark_skipped(&mut tx, delivery.log_id, &reason).await?;
                        summary.skipped += 1;
                    }
                    PushOutcome::Failed {
                        reason,
                        unregistered,
                    } => {
                        MessageLogRepo::mark_failed(&mut tx, delivery.log_id, &reason).await?;
                        summary.failed += 1;
                        if unregistered {
                            DeviceGroupRepo::clear_notification_key(&self.pool, delivery.user_id)
                                .await?;
                            tracing::info!(
                                user_id = delivery.user_id,
                                "Evicted unregistered notification key"
                            );
                        }
                    }
                }
            }
        }

        // Email: one send per log so a hard failure can stop the run with
        // everything before it already recorded.
        for delivery in batch.iter().filter(|d| d.medium == MEDIUM_EMAIL) {
            let Some(address) = UserRepo::get_email(&self.pool, delivery.user_id).await? else {
                MessageLogRepo::mark_skipped(&mut tx, delivery.log_id, "user has no email address")
                    .await?;
                summary.skipped += 1;
                continue;
            };

            let payload = EmailMessage {
                to: address,
                subject: delivery.subject.clone(),
                body: delivery.body.clone(),
                log_id: delivery.log_id,
            };
            match self.email.send(&payload).await {
                Ok(()) => {
                    MessageLogRepo::mark_sent(&mut tx, delivery.log_id).await?;
                    summary.sent += 1;
                }
                Err(e) => {
                    MessageLogRepo::mark_failed(&mut tx, delivery.log_id, &e.to_string()).await?;
                    summary.failed += 1;
                    tracing::error!(log_id = delivery.log_id, error = %e, "Email delivery failed");
                    if !config.message_create_fail_silently {
                        // Commit what has been recorded so far, then surface
                        // the failure to the caller.
                        tx.commit().await?;
                        return Err(PipelineError::Email(e));
                    }
                }
            }
        }

        tx.commit().await?;

        let message_ids: Vec<DbId> = batch
            .iter()
            .map(|d| d.message_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let flipped = MessageRepo::mark_logged_if_complete(&self.pool, &message_ids).await?;
        summary.messages_logged = flipped.len();

        let flipped_set: HashSet<DbId> = flipped.into_iter().collect();
        let users: BTreeSet<DbId> = batch
            .iter()
            .filter(|d| flipped_set.contains(&d.message_id) && !d.is_hidden)
            .map(|d| d.user_id)
            .collect();
        self.publish_unread_counts(users).await?;

        Ok(summary)
    }

    /// Publish the current unread count for each user.
    async fn publish_unread_counts(
        &self,
        users: impl IntoIterator<Item = DbId>,
    ) -> Result<(), sqlx::Error> {
        for user_id in users {
            let count = MessageRepo::unread_count(&self.pool, user_id).await?;
            self.bus.publish(InboxEvent::unread_count(user_id, count));
        }
        Ok(())
    }
}
