//! Per-request semantic index over document chunks.
//!
//! An [`IndexBuilder`] turns the chunks of one document into a
//! [`RetrievalIndex`]. The index answers top-k similarity queries until it is
//! released; the owner must call [`RetrievalIndex::release`] exactly once on
//! every exit path.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{errors::ProviderError, models::domain::DocumentChunk, services::embedding_service::Embedder};

pub const DEFAULT_RETRIEVAL_K: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("cannot build an index from an empty document")]
    EmptyDocument,

    #[error("embedding failed for chunk {chunk_index}: {source}")]
    Embedding {
        chunk_index: usize,
        #[source]
        source: ProviderError,
    },

    #[error("embedding failed for query: {0}")]
    QueryEmbedding(#[source] ProviderError),

    #[error("collection {0} has been released")]
    Released(String),
}

#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    fn id(&self) -> &str;

    /// The `k` chunks most similar to `query`, best first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<DocumentChunk>, IndexError>;

    async fn release(&self) -> Result<(), IndexError>;
}

#[async_trait]
pub trait IndexBuilder: Send + Sync {
    async fn build(&self, chunks: &[DocumentChunk]) -> Result<Box<dyn RetrievalIndex>, IndexError>;
}

#[derive(Debug, Clone)]
struct StoredVector {
    chunk: DocumentChunk,
    embedding: Vec<f32>,
}

type Collections = Arc<RwLock<HashMap<String, Vec<StoredVector>>>>;

/// Process-wide vector store holding one collection per live request.
#[derive(Clone)]
pub struct InMemoryVectorStore {
    embedder: Arc<dyn Embedder>,
    collections: Collections,
}

impl InMemoryVectorStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of collections that have been built and not yet released.
    pub async fn collection_count(&self) -> usize {
        self.collections.read().await.len()
    }
}

#[async_trait]
impl IndexBuilder for InMemoryVectorStore {
    async fn build(&self, chunks: &[DocumentChunk]) -> Result<Box<dyn RetrievalIndex>, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyDocument);
        }

        // Embed everything before allocating so a failed build leaves nothing behind.
        let mut vectors = Vec::with_capacity(chunks.len());
        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let embedding = self
                .embedder
                .embed(&chunk.content)
                .await
                .map_err(|source| IndexError::Embedding { chunk_index, source })?;
            vectors.push(StoredVector {
                chunk: chunk.clone(),
                embedding,
            });
        }

        let id = Uuid::new_v4().to_string();
        self.collections.write().await.insert(id.clone(), vectors);
        log::info!("Created collection {} from {} chunks", id, chunks.len());

        Ok(Box::new(VectorCollection {
            id,
            embedder: Arc::clone(&self.embedder),
            collections: Arc::clone(&self.collections),
        }))
    }
}

/// Handle to one collection of an [`InMemoryVectorStore`].
pub struct VectorCollection {
    id: String,
    embedder: Arc<dyn Embedder>,
    collections: Collections,
}

#[async_trait]
impl RetrievalIndex for VectorCollection {
    fn id(&self) -> &str {
        &self.id
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<DocumentChunk>, IndexError> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(IndexError::QueryEmbedding)?;

        let collections = self.collections.read().await;
        let vectors = collections
            .get(&self.id)
            .ok_or_else(|| IndexError::Released(self.id.clone()))?;

        Ok(rank(&query_embedding, vectors, k))
    }

    async fn release(&self) -> Result<(), IndexError> {
        match self.collections.write().await.remove(&self.id) {
            Some(_) => {
                log::info!("Deleted collection {}", self.id);
                Ok(())
            }
            None => Err(IndexError::Released(self.id.clone())),
        }
    }
}

/// Sort is stable, so equal scores keep insertion order.
fn rank(query: &[f32], vectors: &[StoredVector], k: usize) -> Vec<DocumentChunk> {
    let mut scored: Vec<(f32, &StoredVector)> = vectors
        .iter()
        .map(|v| (cosine_similarity(query, &v.embedding), v))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(k)
        .map(|(_, v)| v.chunk.clone())
        .collect()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{chunks_from, KeywordEmbedder};

    fn store() -> (InMemoryVectorStore, Arc<KeywordEmbedder>) {
        let embedder = Arc::new(KeywordEmbedder::new());
        (InMemoryVectorStore::new(embedder.clone()), embedder)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_build_rejects_empty_chunks() {
        let (store, embedder) = store();

        let err = store.build(&[]).await.err().unwrap();
        assert_eq!(err, IndexError::EmptyDocument);
        assert_eq!(embedder.calls(), 0);
        assert_eq!(store.collection_count().await, 0);
    }

    #[tokio::test]
    async fn test_build_failure_allocates_nothing() {
        let embedder = Arc::new(KeywordEmbedder::failing_after(1));
        let store = InMemoryVectorStore::new(embedder);

        let chunks = chunks_from(&["paris is the capital", "rome is old", "madrid is sunny"]);
        let err = store.build(&chunks).await.err().unwrap();

        assert!(matches!(err, IndexError::Embedding { chunk_index: 1, .. }));
        assert_eq!(store.collection_count().await, 0);
    }

    #[tokio::test]
    async fn test_retrieve_ranks_by_similarity() {
        let (store, _) = store();
        let chunks = chunks_from(&[
            "berlin is the capital of germany",
            "paris is the capital of france",
            "the eiffel tower stands in paris",
        ]);

        let index = store.build(&chunks).await.unwrap();
        let results = index.retrieve("paris france", 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "paris is the capital of france");
        assert_eq!(results[1].content, "the eiffel tower stands in paris");

        index.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_retrieve_is_deterministic_for_ties() {
        let (store, _) = store();
        let chunks = chunks_from(&["alpha", "alpha", "alpha"]);
        let index = store.build(&chunks).await.unwrap();

        let first = index.retrieve("alpha", 3).await.unwrap();
        let second = index.retrieve("alpha", 3).await.unwrap();

        let order: Vec<usize> = first.iter().map(|c| c.metadata.chunk_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(first, second);

        index.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_release_removes_collection_once() {
        let (store, _) = store();
        let index = store.build(&chunks_from(&["some text"])).await.unwrap();
        assert_eq!(store.collection_count().await, 1);

        index.release().await.unwrap();
        assert_eq!(store.collection_count().await, 0);

        assert!(matches!(index.release().await, Err(IndexError::Released(_))));
        assert!(matches!(
            index.retrieve("some", 1).await,
            Err(IndexError::Released(_))
        ));
    }

    #[tokio::test]
    async fn test_collections_are_isolated_per_index() {
        let (store, _) = store();
        let first = store.build(&chunks_from(&["first document"])).await.unwrap();
        let second = store.build(&chunks_from(&["second document"])).await.unwrap();
        assert_ne!(first.id(), second.id());

        first.release().await.unwrap();
        let results = second.retrieve("document", 4).await.unwrap();
        assert_eq!(results[0].content, "second document");

        second.release().await.unwrap();
        assert_eq!(store.collection_count().await, 0);
    }
}
