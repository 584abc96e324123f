use crate::domain::amount::Amount;
use crate::domain::payload::{PaymentPayload, PromptPayEncoder};
use crate::domain::payment::{PaymentNotification, PaymentOutcome, PaymentRequest, PaymentStatus};
use crate::domain::ports::PaymentRequestStoreBox;
use crate::domain::recipient::RecipientId;
use crate::domain::reference::Reference;
use crate::error::{PromptPayError, Result};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default lifetime of an issued dynamic QR code.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Issues PromptPay payment requests and tracks them until settlement.
///
/// Each request starts `Pending` and moves exactly once to `Completed`,
/// `Failed` or `Expired`. Every read-modify-write against the store runs under
/// `write_lock`, so a service shared across tasks never issues a reference
/// twice or settles a request twice.
pub struct PromptPayService {
    encoder: PromptPayEncoder,
    store: PaymentRequestStoreBox,
    ttl: Duration,
    write_lock: Mutex<()>,
}

impl PromptPayService {
    pub fn new(encoder: PromptPayEncoder, store: PaymentRequestStoreBox, ttl: Duration) -> Self {
        Self {
            encoder,
            store,
            ttl,
            write_lock: Mutex::new(()),
        }
    }

    pub fn encoder(&self) -> &PromptPayEncoder {
        &self.encoder
    }

    /// Encodes a dynamic payload and records it as a pending request.
    pub async fn issue(
        &self,
        recipient_id: &str,
        amount: &str,
        reference: &str,
        now: u64,
    ) -> Result<PaymentRequest> {
        let amount: Amount = amount.parse()?;
        let reference = Reference::new(reference)?;
        let recipient = RecipientId::parse(recipient_id, self.encoder.config().layout)?;

        let _guard = self.write_lock.lock().await;
        if self.store.exists(reference.as_str()).await? {
            return Err(PromptPayError::DuplicateReference(reference.to_string()));
        }

        let payload = self.encoder.encode_payload(&PaymentPayload {
            recipient: recipient.clone(),
            amount: Some(amount),
            reference: Some(reference.clone()),
        })?;

        let request = PaymentRequest {
            reference: reference.to_string(),
            recipient: recipient.digits().to_string(),
            amount: amount.rendered_value(),
            payload,
            status: PaymentStatus::Pending,
            issued_at: now,
            expires_at: now.saturating_add(self.ttl.as_secs()),
        };
        self.store.store(request.clone()).await?;

        info!(
            reference = %request.reference,
            amount = %request.amount,
            proxy_type = %recipient.proxy_type(),
            "issued payment request"
        );
        Ok(request)
    }

    /// Applies a settlement notification to the matching pending request.
    ///
    /// A notification repeating the current terminal state is accepted and
    /// leaves the request untouched.
    pub async fn reconcile(
        &self,
        notification: &PaymentNotification,
        now: u64,
    ) -> Result<PaymentRequest> {
        let _guard = self.write_lock.lock().await;
        let mut request = self
            .store
            .get(&notification.reference)
            .await?
            .ok_or_else(|| PromptPayError::UnknownReference(notification.reference.clone()))?;

        let target = notification.outcome.target_status();
        if request.status.is_terminal() {
            if request.status == target {
                debug!(
                    reference = %request.reference,
                    status = %request.status,
                    "duplicate notification ignored"
                );
                return Ok(request);
            }
            return Err(PromptPayError::InvalidTransition {
                reference: request.reference,
                from: request.status,
                to: target,
            });
        }

        if request.is_expired_at(now) {
            request.status = PaymentStatus::Expired;
            self.store.store(request.clone()).await?;
            warn!(reference = %request.reference, "notification arrived after expiry");
            return Err(PromptPayError::PaymentExpired(request.reference));
        }

        if notification.outcome == PaymentOutcome::Paid && notification.amount != request.amount {
            warn!(
                reference = %request.reference,
                expected = %request.amount,
                received = %notification.amount,
                "paid amount does not match request"
            );
            return Err(PromptPayError::AmountMismatch {
                reference: request.reference,
                expected: request.amount,
                received: notification.amount,
            });
        }

        request.status = target;
        self.store.store(request.clone()).await?;
        info!(
            reference = %request.reference,
            status = %request.status,
            "payment request settled"
        );
        Ok(request)
    }

    /// Marks every pending request whose deadline has passed as expired.
    ///
    /// Returns the references that changed state.
    pub async fn expire_stale(&self, now: u64) -> Result<Vec<String>> {
        let _guard = self.write_lock.lock().await;
        let mut expired = Vec::new();
        for mut request in self.store.all().await? {
            if request.status == PaymentStatus::Pending && request.is_expired_at(now) {
                request.status = PaymentStatus::Expired;
                expired.push(request.reference.clone());
                self.store.store(request).await?;
            }
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "expired stale payment requests");
        }
        Ok(expired)
    }

    pub async fn get(&self, reference: &str) -> Result<Option<PaymentRequest>> {
        self.store.get(reference).await
    }

    pub async fn all(&self) -> Result<Vec<PaymentRequest>> {
        self.store.all().await
    }
}

/// Current wall-clock time in Unix seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payload::decode;
    use crate::error::ValidationError;
    use crate::infrastructure::in_memory::InMemoryPaymentRequestStore;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn service() -> PromptPayService {
        PromptPayService::new(
            PromptPayEncoder::default(),
            Box::new(InMemoryPaymentRequestStore::new()),
            Duration::from_secs(60),
        )
    }

    fn notification(
        reference: &str,
        amount: rust_decimal::Decimal,
        outcome: PaymentOutcome,
    ) -> PaymentNotification {
        PaymentNotification {
            reference: reference.to_string(),
            amount,
            outcome,
        }
    }

    async fn status(service: &PromptPayService, reference: &str) -> PaymentStatus {
        service.get(reference).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_issue_records_pending_request() {
        let service = service();
        let request = service
            .issue("081-234-5678", "100.5", "TOPUP_123", 1_000)
            .await
            .unwrap();

        assert_eq!(request.status, PaymentStatus::Pending);
        assert_eq!(request.recipient, "0812345678");
        assert_eq!(request.amount, dec!(100.5));
        assert_eq!(request.amount.to_string(), "100.50");
        assert_eq!(request.expires_at, 1_060);

        let decoded = decode(&request.payload).unwrap();
        assert_eq!(decoded.reference.as_deref(), Some("TOPUP_123"));
        assert_eq!(decoded.amount, Some(dec!(100.50)));

        assert_eq!(service.get("TOPUP_123").await.unwrap(), Some(request));
    }

    #[tokio::test]
    async fn test_issue_rejects_duplicate_reference() {
        let service = service();
        service.issue("0812345678", "10", "R1", 0).await.unwrap();

        let err = service.issue("0899999999", "20", "R1", 5).await.unwrap_err();
        assert!(matches!(err, PromptPayError::DuplicateReference(ref r) if r == "R1"));
        assert_eq!(service.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_issue_surfaces_validation_errors() {
        let service = service();
        let err = service.issue("0812345678", "-5", "R1", 0).await.unwrap_err();
        assert!(matches!(
            err,
            PromptPayError::ValidationError(ValidationError::NonPositiveAmount)
        ));
        assert!(service.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paid_notification_completes_request() {
        let service = service();
        service.issue("0812345678", "100.50", "R1", 0).await.unwrap();

        let settled = service
            .reconcile(&notification("R1", dec!(100.5), PaymentOutcome::Paid), 10)
            .await
            .unwrap();
        assert_eq!(settled.status, PaymentStatus::Completed);

        // Duplicate delivery is a no-op.
        let again = service
            .reconcile(&notification("R1", dec!(100.5), PaymentOutcome::Paid), 20)
            .await
            .unwrap();
        assert_eq!(again, settled);
    }

    #[tokio::test]
    async fn test_failed_notification_is_final() {
        let service = service();
        service.issue("0812345678", "10", "R1", 0).await.unwrap();

        let failed = service
            .reconcile(&notification("R1", dec!(10), PaymentOutcome::Failed), 10)
            .await
            .unwrap();
        assert_eq!(failed.status, PaymentStatus::Failed);

        let err = service
            .reconcile(&notification("R1", dec!(10), PaymentOutcome::Paid), 11)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PromptPayError::InvalidTransition {
                from: PaymentStatus::Failed,
                to: PaymentStatus::Completed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_amount_mismatch_keeps_request_pending() {
        let service = service();
        service.issue("0812345678", "10", "R1", 0).await.unwrap();

        let err = service
            .reconcile(&notification("R1", dec!(9.99), PaymentOutcome::Paid), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, PromptPayError::AmountMismatch { .. }));

        let request = service.get("R1").await.unwrap().unwrap();
        assert_eq!(request.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_late_notification_expires_request() {
        let service = service();
        service.issue("0812345678", "10", "R1", 0).await.unwrap();

        let err = service
            .reconcile(&notification("R1", dec!(10), PaymentOutcome::Paid), 60)
            .await
            .unwrap_err();
        assert!(matches!(err, PromptPayError::PaymentExpired(_)));
        assert_eq!(
            service.get("R1").await.unwrap().unwrap().status,
            PaymentStatus::Expired
        );
    }

    #[tokio::test]
    async fn test_unknown_reference() {
        let service = service();
        let err = service
            .reconcile(&notification("nope", dec!(1), PaymentOutcome::Paid), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, PromptPayError::UnknownReference(_)));
    }

    #[tokio::test]
    async fn test_expire_stale_only_touches_overdue_pending() {
        let service = service();
        service.issue("0812345678", "10", "OLD", 0).await.unwrap();
        service.issue("0812345678", "10", "NEW", 50).await.unwrap();
        service.issue("0812345678", "10", "DONE", 0).await.unwrap();
        service
            .reconcile(&notification("DONE", dec!(10), PaymentOutcome::Paid), 1)
            .await
            .unwrap();

        let expired = service.expire_stale(70).await.unwrap();
        assert_eq!(expired, vec!["OLD".to_string()]);

        assert_eq!(status(&service, "OLD").await, PaymentStatus::Expired);
        assert_eq!(status(&service, "NEW").await, PaymentStatus::Pending);
        assert_eq!(status(&service, "DONE").await, PaymentStatus::Completed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_issue_accepts_reference_once() {
        let service = Arc::new(service());

        for round in 0..200 {
            let reference = format!("R{round}");
            let handles: Vec<_> = ["0811111111", "0822222222"]
                .into_iter()
                .map(|recipient| {
                    let service = Arc::clone(&service);
                    let reference = reference.clone();
                    tokio::spawn(async move {
                        service.issue(recipient, "10", &reference, 0).await
                    })
                })
                .collect();

            let mut issued = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => issued += 1,
                    Err(PromptPayError::DuplicateReference(r)) => assert_eq!(r, reference),
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            assert_eq!(issued, 1, "reference {reference}");
        }
        assert_eq!(service.all().await.unwrap().len(), 200);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_notifications_settle_once() {
        let service = Arc::new(service());

        for round in 0..200 {
            let reference = format!("R{round}");
            service.issue("0812345678", "10", &reference, 0).await.unwrap();

            let handles: Vec<_> = [PaymentOutcome::Paid, PaymentOutcome::Failed]
                .into_iter()
                .map(|outcome| {
                    let service = Arc::clone(&service);
                    let notification = notification(&reference, dec!(10), outcome);
                    tokio::spawn(async move { service.reconcile(&notification, 1).await })
                })
                .collect();

            let mut settled = Vec::new();
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(request) => settled.push(request.status),
                    Err(PromptPayError::InvalidTransition { .. }) => {}
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            assert_eq!(settled.len(), 1, "reference {reference}");
            assert_eq!(status(&service, &reference).await, settled[0]);
        }
    }
}
