use super::payment::PaymentRequest;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait PaymentRequestStore: Send + Sync {
    async fn store(&self, request: PaymentRequest) -> Result<()>;
    async fn get(&self, reference: &str) -> Result<Option<PaymentRequest>>;
    async fn exists(&self, reference: &str) -> Result<bool>;
    async fn all(&self) -> Result<Vec<PaymentRequest>>;
}

pub type PaymentRequestStoreBox = Box<dyn PaymentRequestStore>;
