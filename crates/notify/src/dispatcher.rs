//! Best-effort bulk notification dispatcher.
//!
//! For each requested student: look up the recipient, render the message,
//! send email (when the parent has an address) and WhatsApp, then append one
//! history row with both outcomes. A failure on one channel or one recipient
//! is recorded in the [`DispatchReport`] and processing moves on; messages
//! already sent are never rolled back.
//!
//! Attendance recipients are processed one channel after the other. Score
//! recipients send both channels concurrently, and the score rows of every
//! recipient that got a history row are soft-deleted at the end. A student
//! with no pending score row is reported as an error and sent nothing.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use schoolhub_core::notification::{
    MessageContext, MessageTemplates, NotificationKind, RenderedMessage,
};
use schoolhub_core::types::DbId;
use schoolhub_db::models::notification_history::CreateNotificationHistory;
use serde::Serialize;

use crate::delivery::{ChatTransport, EmailTransport};
use crate::error::DeliveryError;
use crate::store::{NotificationStore, Recipient};

/// Default bound on a single channel send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Outcome of one channel for one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Sent,
    Failed,
    /// Not attempted: no address on file, or the channel is not configured.
    Skipped,
}

/// Per-student result.
#[derive(Debug, Clone, Serialize)]
pub struct RecipientOutcome {
    pub student_id: DbId,
    pub parent_id: Option<DbId>,
    pub email: ChannelStatus,
    pub whatsapp: ChannelStatus,
    pub history_recorded: bool,
}

impl RecipientOutcome {
    /// Nothing was sent for this student.
    fn not_sent(student_id: DbId, parent_id: Option<DbId>) -> Self {
        Self {
            student_id,
            parent_id,
            email: ChannelStatus::Skipped,
            whatsapp: ChannelStatus::Skipped,
            history_recorded: false,
        }
    }

    /// At least one channel reached the parent.
    pub fn delivered(&self) -> bool {
        self.email == ChannelStatus::Sent || self.whatsapp == ChannelStatus::Sent
    }

    /// Not delivered, and either never processed to a history row or a
    /// channel that was attempted failed. A recipient whose channels were all
    /// skipped but who got a history row is not a failure.
    pub fn failed(&self) -> bool {
        !self.delivered()
            && (!self.history_recorded
                || self.email == ChannelStatus::Failed
                || self.whatsapp == ChannelStatus::Failed)
    }
}

/// Summary of a whole dispatch call.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub kind: NotificationKind,
    pub requested: usize,
    pub emails_sent: usize,
    pub whatsapp_sent: usize,
    pub history_rows: usize,
    pub scores_cleared: u64,
    pub outcomes: Vec<RecipientOutcome>,
    /// Every collected error, prefixed with the student id.
    pub errors: Vec<String>,
}

impl DispatchReport {
    fn new(kind: NotificationKind, requested: usize) -> Self {
        Self {
            kind,
            requested,
            emails_sent: 0,
            whatsapp_sent: 0,
            history_rows: 0,
            scores_cleared: 0,
            outcomes: Vec::with_capacity(requested),
            errors: Vec::new(),
        }
    }

    fn push(&mut self, outcome: RecipientOutcome) {
        if outcome.email == ChannelStatus::Sent {
            self.emails_sent += 1;
        }
        if outcome.whatsapp == ChannelStatus::Sent {
            self.whatsapp_sent += 1;
        }
        if outcome.history_recorded {
            self.history_rows += 1;
        }
        self.outcomes.push(outcome);
    }

    /// `true` when at least one student was requested and every one of them
    /// [failed](RecipientOutcome::failed).
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(RecipientOutcome::failed)
    }
}

/// Subject a dispatch is about.
#[derive(Debug, Clone)]
pub struct SubjectRef {
    pub id: DbId,
    pub name: String,
}

/// Who, what and when of one dispatch call.
#[derive(Debug, Clone)]
pub struct DispatchRequest<'a> {
    /// Staff member sending the notifications; written to history.
    pub staff_id: DbId,
    /// Only send scores recorded by this staff member. `None` sends the
    /// latest pending score whoever recorded it.
    pub recorded_by: Option<DbId>,
    pub subject: &'a SubjectRef,
    pub student_ids: &'a [DbId],
    pub date: NaiveDate,
}

/// Sends parent notifications over the configured channels.
pub struct NotificationDispatcher {
    email: Option<Arc<dyn EmailTransport>>,
    chat: Option<Arc<dyn ChatTransport>>,
    store: Arc<dyn NotificationStore>,
    templates: MessageTemplates,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn NotificationStore>, templates: MessageTemplates) -> Self {
        Self {
            email: None,
            chat: None,
            store,
            templates,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_email(mut self, transport: Arc<dyn EmailTransport>) -> Self {
        self.email = Some(transport);
        self
    }

    pub fn with_chat(mut self, transport: Arc<dyn ChatTransport>) -> Self {
        self.chat = Some(transport);
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn email_enabled(&self) -> bool {
        self.email.is_some()
    }

    pub fn chat_enabled(&self) -> bool {
        self.chat.is_some()
    }

    pub fn templates(&self) -> &MessageTemplates {
        &self.templates
    }

    /// Send absence notices, one recipient and one channel at a time.
    pub async fn dispatch_attendance(&self, request: DispatchRequest<'_>) -> DispatchReport {
        let ids = dedup(request.student_ids);
        let mut report = DispatchReport::new(NotificationKind::Attendance, ids.len());

        for student_id in ids {
            let (outcome, _) = self
                .process(NotificationKind::Attendance, &request, student_id, &mut report.errors)
                .await;
            report.push(outcome);
        }

        tracing::info!(
            requested = report.requested,
            emails_sent = report.emails_sent,
            whatsapp_sent = report.whatsapp_sent,
            errors = report.errors.len(),
            "Attendance dispatch finished",
        );
        report
    }

    /// Send test scores with both channels of a recipient in flight at
    /// once, then clear the pending scores that were reported.
    pub async fn dispatch_scores(&self, request: DispatchRequest<'_>) -> DispatchReport {
        let ids = dedup(request.student_ids);
        let mut report = DispatchReport::new(NotificationKind::TestScore, ids.len());

        let mut sent = Vec::new();
        for student_id in ids {
            let (outcome, score_id) = self
                .process(NotificationKind::TestScore, &request, student_id, &mut report.errors)
                .await;
            if outcome.history_recorded {
                sent.extend(score_id);
            }
            report.push(outcome);
        }

        if !sent.is_empty() {
            match self.store.clear_scores(&sent).await {
                Ok(cleared) => report.scores_cleared = cleared,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to clear sent test scores");
                    report.errors.push(format!("clearing sent scores failed: {e}"));
                }
            }
        }

        tracing::info!(
            requested = report.requested,
            emails_sent = report.emails_sent,
            whatsapp_sent = report.whatsapp_sent,
            scores_cleared = report.scores_cleared,
            errors = report.errors.len(),
            "Score dispatch finished",
        );
        report
    }

    /// Returns the outcome and, for scores, the id of the score row sent.
    async fn process(
        &self,
        kind: NotificationKind,
        request: &DispatchRequest<'_>,
        student_id: DbId,
        errors: &mut Vec<String>,
    ) -> (RecipientOutcome, Option<DbId>) {
        let recipient = match self.store.find_recipient(student_id).await {
            Ok(Some(r)) => r,
            Ok(None) => {
                errors.push(format!("student {student_id}: not found"));
                return (RecipientOutcome::not_sent(student_id, None), None);
            }
            Err(e) => {
                tracing::warn!(student_id, error = %e, "Recipient lookup failed");
                errors.push(format!("student {student_id}: lookup failed: {e}"));
                return (RecipientOutcome::not_sent(student_id, None), None);
            }
        };

        let pending = if kind == NotificationKind::TestScore {
            let lookup = self
                .store
                .pending_score(request.recorded_by, request.subject.id, student_id)
                .await;
            match lookup {
                Ok(Some(pending)) => Some(pending),
                Ok(None) => {
                    errors.push(format!("student {student_id}: no pending score"));
                    let outcome = RecipientOutcome::not_sent(student_id, Some(recipient.parent_id));
                    return (outcome, None);
                }
                Err(e) => {
                    tracing::warn!(student_id, error = %e, "Score lookup failed");
                    errors.push(format!("student {student_id}: score lookup failed: {e}"));
                    let outcome = RecipientOutcome::not_sent(student_id, Some(recipient.parent_id));
                    return (outcome, None);
                }
            }
        } else {
            None
        };

        let score = pending.and_then(|p| p.score);
        let message = self.render(kind, &recipient, request, score);

        let (email, whatsapp) = match kind {
            NotificationKind::Attendance => {
                let email = self.send_email(&recipient, &message).await;
                let whatsapp = self.send_chat(&recipient, &message).await;
                (email, whatsapp)
            }
            NotificationKind::TestScore => tokio::join!(
                self.send_email(&recipient, &message),
                self.send_chat(&recipient, &message),
            ),
        };

        let mut outcome = RecipientOutcome {
            student_id,
            parent_id: Some(recipient.parent_id),
            email: channel_status(email, "email", student_id, errors),
            whatsapp: channel_status(whatsapp, "whatsapp", student_id, errors),
            history_recorded: false,
        };

        let entry = CreateNotificationHistory {
            student_id,
            parent_id: recipient.parent_id,
            subject_id: request.subject.id,
            staff_id: request.staff_id,
            kind: kind.as_str().to_string(),
            email_status: outcome.email == ChannelStatus::Sent,
            whatsapp_status: outcome.whatsapp == ChannelStatus::Sent,
        };
        match self.store.record_history(&entry).await {
            Ok(()) => outcome.history_recorded = true,
            Err(e) => {
                tracing::error!(student_id, error = %e, "Failed to record notification history");
                errors.push(format!("student {student_id}: history not recorded: {e}"));
            }
        }

        (outcome, pending.map(|p| p.id))
    }

    fn render(
        &self,
        kind: NotificationKind,
        recipient: &Recipient,
        request: &DispatchRequest<'_>,
        score: Option<f64>,
    ) -> RenderedMessage {
        let ctx = MessageContext {
            student_name: &recipient.student_name,
            student_gender: recipient.student_gender,
            grade: recipient.grade,
            grade_label: &recipient.grade_label,
            parent_name: &recipient.parent_name,
            parent_gender: recipient.parent_gender,
            subject_name: &request.subject.name,
            date: request.date,
            score,
        };
        self.templates.render(kind, &ctx)
    }

    /// `None` means the channel was not attempted.
    async fn send_email(
        &self,
        recipient: &Recipient,
        message: &RenderedMessage,
    ) -> Option<Result<(), DeliveryError>> {
        let transport = self.email.as_ref()?;
        let to = recipient.parent_email.as_deref()?;
        Some(
            self.bounded(transport.send_email(to, &message.subject, &message.body))
                .await,
        )
    }

    async fn send_chat(
        &self,
        recipient: &Recipient,
        message: &RenderedMessage,
    ) -> Option<Result<(), DeliveryError>> {
        let transport = self.chat.as_ref()?;
        Some(
            self.bounded(transport.send_text(&recipient.parent_telephone, &message.body))
                .await,
        )
    }

    /// Send a one-off email outside of any dispatch.
    pub async fn send_test_email(&self, to: &str, body: &str) -> Result<(), DeliveryError> {
        let transport = self.email.as_ref().ok_or(DeliveryError::NotConfigured("Email"))?;
        self.bounded(transport.send_email(to, "SchoolHub test message", body))
            .await
    }

    /// Send a one-off WhatsApp message outside of any dispatch.
    pub async fn send_test_chat(&self, telephone: &str, body: &str) -> Result<(), DeliveryError> {
        let transport = self.chat.as_ref().ok_or(DeliveryError::NotConfigured("WhatsApp"))?;
        self.bounded(transport.send_text(telephone, body)).await
    }

    async fn bounded<F>(&self, send: F) -> Result<(), DeliveryError>
    where
        F: Future<Output = Result<(), DeliveryError>>,
    {
        tokio::time::timeout(self.send_timeout, send)
            .await
            .unwrap_or(Err(DeliveryError::Timeout(self.send_timeout)))
    }
}

fn channel_status(
    result: Option<Result<(), DeliveryError>>,
    channel: &str,
    student_id: DbId,
    errors: &mut Vec<String>,
) -> ChannelStatus {
    match result {
        None => ChannelStatus::Skipped,
        Some(Ok(())) => ChannelStatus::Sent,
        Some(Err(e)) => {
            tracing::warn!(student_id, channel, error = %e, "Channel delivery failed");
            errors.push(format!("student {student_id}: {channel} failed: {e}"));
            ChannelStatus::Failed
        }
    }
}

/// Drop repeated ids, keeping first-seen order.
fn dedup(ids: &[DbId]) -> Vec<DbId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
