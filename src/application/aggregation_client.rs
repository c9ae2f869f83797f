// Client trait for remote aggregation procedures
use crate::domain::aggregation::AggregationRow;
use crate::domain::errors::FetchError;
use async_trait::async_trait;

#[async_trait]
pub trait AggregationClient: Send + Sync {
    /// Invoke the named procedure once. No retries, no timeout, no caching.
    async fn call(&self, procedure: &str) -> Result<Vec<AggregationRow>, FetchError>;
}
