use crate::domain::payment::PaymentRequest;
use crate::domain::ports::PaymentRequestStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for payment requests.
///
/// Uses `Arc<RwLock<HashMap<String, PaymentRequest>>>` keyed by reference so
/// clones share the same state.
#[derive(Default, Clone)]
pub struct InMemoryPaymentRequestStore {
    requests: Arc<RwLock<HashMap<String, PaymentRequest>>>,
}

impl InMemoryPaymentRequestStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRequestStore for InMemoryPaymentRequestStore {
    async fn store(&self, request: PaymentRequest) -> Result<()> {
        let mut requests = self.requests.write().await;
        requests.insert(request.reference.clone(), request);
        Ok(())
    }

    async fn get(&self, reference: &str) -> Result<Option<PaymentRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.get(reference).cloned())
    }

    async fn exists(&self, reference: &str) -> Result<bool> {
        let requests = self.requests.read().await;
        Ok(requests.contains_key(reference))
    }

    /// Returns every request in issue order, ties broken by reference.
    async fn all(&self) -> Result<Vec<PaymentRequest>> {
        let requests = self.requests.read().await;
        let mut all: Vec<PaymentRequest> = requests.values().cloned().collect();
        all.sort_by(|a, b| {
            a.issued_at
                .cmp(&b.issued_at)
                .then_with(|| a.reference.cmp(&b.reference))
        });
        Ok(all)
    }
}
