//! Document-retrieval collaborator.
//!
//! Consumed at its interface only: some deployment-specific pipeline turns a
//! question into ranked text spans plus source names. Doc-less deployments
//! run the no-op implementation and fall back to plain completion.

use anyhow::Result;
use async_trait::async_trait;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetrievedContext {
    pub context: Option<String>,
    pub sources: Vec<String>,
}

#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    async fn query(&self, question: &str) -> Result<RetrievedContext>;
}

/// Retriever for deployments with no document corpus.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopRetriever;

#[async_trait]
impl DocumentRetriever for NoopRetriever {
    async fn query(&self, _question: &str) -> Result<RetrievedContext> {
        Ok(RetrievedContext::default())
    }
}
