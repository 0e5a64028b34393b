//! Webhook reconciliation.
//!
//! Deliveries are at-least-once and unordered: the gateway may redeliver a
//! `payment.succeeded` notification any number of times, concurrently or
//! not. Activation must happen at most effectively once per payment id, so
//! a ledger claim is taken atomically before the backend call and released
//! only if that call fails (letting a redelivery retry).

use std::collections::HashSet;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info};
use vpnshop_types::webhook::GatewayNotification;

use crate::backend::Activator;

pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment.succeeded";

/// Dedup ledger keyed by gateway payment id.
///
/// In-process only; the trait-shaped `claim`/`release` pair maps directly
/// onto a single-row upsert with a uniqueness constraint when a durable
/// store replaces it.
#[derive(Debug, Default)]
pub struct PaymentLedger {
    claimed: Mutex<HashSet<String>>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        PaymentLedger::default()
    }

    /// Claim a payment id for activation. Returns `false` if some delivery
    /// already holds (or completed) the claim.
    pub fn claim(&self, payment_id: &str) -> bool {
        self.claimed
            .lock()
            .expect("ledger mutex poisoned")
            .insert(payment_id.to_string())
    }

    /// Release a claim after a failed activation so a redelivery can retry.
    pub fn release(&self, payment_id: &str) {
        self.claimed
            .lock()
            .expect("ledger mutex poisoned")
            .remove(payment_id);
    }
}

/// What a delivery resolved to. Every variant is acknowledged with HTTP 200;
/// the gateway is never handed a retryable status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Activation call went through.
    Activated,
    /// Event type this flow does not handle (canceled, waiting_for_capture).
    IgnoredEvent,
    /// Claimed the succeeded event but the nested object disagreed.
    NotSucceeded,
    /// No usable userId in the metadata. Terminal, dropped by policy.
    MissingUserId,
    /// Another delivery for this payment id already activated (or is
    /// activating) it.
    Duplicate,
    /// Backend activation failed; claim released, visible in logs only.
    ActivationFailed(String),
}

/// Body returned to the webhook sender, always with HTTP 200.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileAck {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    pub fn ack(&self) -> ReconcileAck {
        match self {
            Outcome::ActivationFailed(message) => ReconcileAck {
                status: "error",
                message: Some(message.clone()),
            },
            _ => ReconcileAck {
                status: "ok",
                message: None,
            },
        }
    }
}

/// Reconciles payment notifications against the activation backend.
pub struct Reconciler<A> {
    activator: A,
    ledger: PaymentLedger,
}

impl<A: Activator> Reconciler<A> {
    pub fn new(activator: A) -> Self {
        Reconciler {
            activator,
            ledger: PaymentLedger::new(),
        }
    }

    /// Process one delivery, in strict order: event check, object check,
    /// metadata normalization, ledger claim, activation.
    pub async fn process(&self, notification: GatewayNotification) -> Outcome {
        if notification.event != EVENT_PAYMENT_SUCCEEDED {
            info!(event = %notification.event, "ignoring event");
            return Outcome::IgnoredEvent;
        }

        let payment = notification.object;
        if !payment.paid || payment.status != "succeeded" {
            info!(payment_id = %payment.id, status = %payment.status, "payment not succeeded");
            return Outcome::NotSucceeded;
        }

        let Some(metadata) = payment.metadata else {
            error!(payment_id = %payment.id, "missing metadata in payment");
            return Outcome::MissingUserId;
        };
        let command = match metadata.to_activation(&payment.id, &payment.amount) {
            Ok(command) => command,
            Err(_) => {
                error!(payment_id = %payment.id, "missing userId in payment metadata");
                return Outcome::MissingUserId;
            }
        };

        if !self.ledger.claim(&payment.id) {
            info!(payment_id = %payment.id, "duplicate delivery, activation already handled");
            return Outcome::Duplicate;
        }

        info!(
            user_id = command.user_id,
            tariff = %command.tariff,
            days = command.days,
            payment_id = %payment.id,
            "activating subscription"
        );

        match self.activator.activate(&command).await {
            Ok(()) => Outcome::Activated,
            Err(err) => {
                // Let a redelivery try again.
                self.ledger.release(&payment.id);
                error!(payment_id = %payment.id, "failed to activate subscription: {}", err);
                Outcome::ActivationFailed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use vpnshop_types::webhook::ActivationCommand;

    use super::*;
    use crate::backend::BackendError;

    #[derive(Clone, Default)]
    struct MockActivator {
        calls: Arc<Mutex<Vec<ActivationCommand>>>,
        fail_next: Arc<AtomicBool>,
    }

    impl MockActivator {
        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Activator for MockActivator {
        fn activate(
            &self,
            command: &ActivationCommand,
        ) -> impl Future<Output = Result<(), BackendError>> + Send {
            let command = command.clone();
            let calls = Arc::clone(&self.calls);
            let fail_next = Arc::clone(&self.fail_next);
            async move {
                if fail_next.swap(false, Ordering::SeqCst) {
                    return Err(BackendError::ActivationRejected {
                        status: 503,
                        message: "backend down".to_string(),
                    });
                }
                calls.lock().unwrap().push(command);
                Ok(())
            }
        }
    }

    fn notification(json: &str) -> GatewayNotification {
        serde_json::from_str(json).unwrap()
    }

    fn succeeded(payment_id: &str) -> GatewayNotification {
        notification(&format!(
            r#"{{
                "event": "payment.succeeded",
                "object": {{
                    "id": "{payment_id}",
                    "status": "succeeded",
                    "amount": {{"value": "649.00", "currency": "RUB"}},
                    "metadata": {{"userId": "123", "tariffType": "premium", "days": 90, "trafficLimit": 0, "deviceLimit": 2}},
                    "paid": true
                }}
            }}"#
        ))
    }

    #[tokio::test]
    async fn other_events_never_activate() {
        let activator = MockActivator::default();
        let reconciler = Reconciler::new(activator.clone());

        let mut canceled = succeeded("pay_c");
        canceled.event = "payment.canceled".to_string();
        let outcome = reconciler.process(canceled).await;

        assert_eq!(outcome, Outcome::IgnoredEvent);
        assert_eq!(outcome.ack().status, "ok");
        assert_eq!(activator.call_count(), 0);
    }

    #[tokio::test]
    async fn unpaid_object_never_activates() {
        let activator = MockActivator::default();
        let reconciler = Reconciler::new(activator.clone());

        let mut unpaid = succeeded("pay_u");
        unpaid.object.paid = false;
        assert_eq!(reconciler.process(unpaid).await, Outcome::NotSucceeded);

        let mut pending = succeeded("pay_p");
        pending.object.status = "waiting_for_capture".to_string();
        assert_eq!(reconciler.process(pending).await, Outcome::NotSucceeded);

        assert_eq!(activator.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_user_id_is_dropped_with_ok_ack() {
        let activator = MockActivator::default();
        let reconciler = Reconciler::new(activator.clone());

        let mut delivery = succeeded("pay_m");
        delivery.object.metadata = Some(
            serde_json::from_str(r#"{"tariffType":"premium","days":90}"#).unwrap(),
        );
        let outcome = reconciler.process(delivery).await;

        assert_eq!(outcome, Outcome::MissingUserId);
        assert_eq!(outcome.ack().status, "ok");
        assert_eq!(activator.call_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_delivery_activates_at_most_once() {
        let activator = MockActivator::default();
        let reconciler = Reconciler::new(activator.clone());

        assert_eq!(reconciler.process(succeeded("pay_1")).await, Outcome::Activated);
        assert_eq!(reconciler.process(succeeded("pay_1")).await, Outcome::Duplicate);
        assert_eq!(reconciler.process(succeeded("pay_1")).await, Outcome::Duplicate);

        assert_eq!(activator.call_count(), 1);
    }

    #[tokio::test]
    async fn failed_activation_releases_the_claim() {
        let activator = MockActivator::default();
        activator.fail_next.store(true, Ordering::SeqCst);
        let reconciler = Reconciler::new(activator.clone());

        let outcome = reconciler.process(succeeded("pay_f")).await;
        let Outcome::ActivationFailed(_) = outcome else {
            panic!("expected ActivationFailed, got {outcome:?}");
        };
        assert_eq!(outcome.ack().status, "error");
        assert_eq!(activator.call_count(), 0);

        // Redelivery after the backend recovers goes through.
        assert_eq!(reconciler.process(succeeded("pay_f")).await, Outcome::Activated);
        assert_eq!(activator.call_count(), 1);
    }

    #[tokio::test]
    async fn succeeded_payment_activates_with_embedded_terms() {
        let activator = MockActivator::default();
        let reconciler = Reconciler::new(activator.clone());

        assert_eq!(reconciler.process(succeeded("pay_1")).await, Outcome::Activated);

        let calls = activator.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![ActivationCommand {
                user_id: 123,
                days: 90,
                tariff: "premium".to_string(),
                traffic_limit: 0,
                device_limit: 2,
                payment_id: "pay_1".to_string(),
                amount: "649.00".to_string(),
            }]
        );
    }

    #[test]
    fn ledger_claim_is_first_winner_takes_all() {
        let ledger = PaymentLedger::new();
        assert!(ledger.claim("pay_x"));
        assert!(!ledger.claim("pay_x"));
        ledger.release("pay_x");
        assert!(ledger.claim("pay_x"));
    }
}
