#[cfg(test)]
pub mod fixtures {
    use std::{
        collections::{HashMap, VecDeque},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };

    use async_trait::async_trait;

    use crate::{
        errors::ProviderError,
        models::domain::{ChunkMetadata, DocumentChunk},
        services::{
            embedding_service::Embedder,
            model_service::GenerativeModel,
            retrieval::{IndexBuilder, IndexError, InMemoryVectorStore, RetrievalIndex},
        },
    };

    pub const PARIS_MULTIPLE_CHOICE: &str = r#"{"question": "What is the capital of France?", "choices": [{"key": "A", "value": "Berlin"}, {"key": "B", "value": "Madrid"}, {"key": "C", "value": "Paris"}, {"key": "D", "value": "Rome"}], "answer": "C", "explanation": "Paris is the capital of France."}"#;

    pub const VALID_FILL_IN_THE_BLANK: &str = r#"{"question": "{0} is the {1} of {2}, home of the {3} {4}.", "blanks": [{"key": "0", "value": "Paris"}, {"key": "1", "value": "capital"}, {"key": "2", "value": "France"}, {"key": "3", "value": "Eiffel"}, {"key": "4", "value": "Tower"}], "word_bank": ["Tower", "France", "Paris", "Eiffel", "capital"], "explanation": "Paris is the capital of France."}"#;

    const EMBEDDING_DIMENSIONS: usize = 512;

    /// Chunks of a single synthetic document, indexed by position.
    pub fn chunks_from(contents: &[&str]) -> Vec<DocumentChunk> {
        contents
            .iter()
            .enumerate()
            .map(|(index, content)| {
                DocumentChunk::new(
                    *content,
                    ChunkMetadata::new("http://test.local/doc.txt", "txt", index, "deadbeef"),
                )
            })
            .collect()
    }

    /// Deterministic bag-of-words embedder. Each new word gets the next
    /// dimension, so texts sharing words score higher.
    #[derive(Default)]
    pub struct KeywordEmbedder {
        vocabulary: Mutex<HashMap<String, usize>>,
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl KeywordEmbedder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Succeeds for the first `successes` calls, then fails every call.
        pub fn failing_after(successes: usize) -> Self {
            Self {
                fail_after: Some(successes),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| call >= limit) {
                return Err(ProviderError::Http("embedding backend unavailable".to_string()));
            }

            let mut vocabulary = self.vocabulary.lock().unwrap();
            let mut vector = vec![0.0; EMBEDDING_DIMENSIONS];
            for word in text
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
            {
                let next = vocabulary.len();
                let slot = *vocabulary.entry(word.to_string()).or_insert(next);
                vector[slot % EMBEDDING_DIMENSIONS] += 1.0;
            }
            Ok(vector)
        }
    }

    /// Replays scripted responses in order and repeats the last one once the
    /// script runs out.
    pub struct ScriptedModel {
        script: Mutex<VecDeque<Result<String, ProviderError>>>,
        last: Mutex<Option<Result<String, ProviderError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn always(response: &str) -> Self {
            Self::new(vec![Ok(response.to_string())])
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());

            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                *last = Some(next);
            }
            (*last)
                .clone()
                .unwrap_or_else(|| Err(ProviderError::InvalidResponse("empty script".to_string())))
        }
    }

    /// Counts builds and releases of the indexes it hands out.
    pub struct TrackingIndexBuilder {
        store: InMemoryVectorStore,
        builds: Arc<AtomicUsize>,
        releases: Arc<AtomicUsize>,
    }

    impl TrackingIndexBuilder {
        pub fn new(store: InMemoryVectorStore) -> Self {
            Self {
                store,
                builds: Arc::new(AtomicUsize::new(0)),
                releases: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn builds(&self) -> usize {
            self.builds.load(Ordering::SeqCst)
        }

        pub fn releases(&self) -> usize {
            self.releases.load(Ordering::SeqCst)
        }

        pub async fn live_collections(&self) -> usize {
            self.store.collection_count().await
        }
    }

    #[async_trait]
    impl IndexBuilder for TrackingIndexBuilder {
        async fn build(&self, chunks: &[DocumentChunk]) -> Result<Box<dyn RetrievalIndex>, IndexError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            let inner = self.store.build(chunks).await?;
            Ok(Box::new(TrackedIndex {
                inner,
                releases: Arc::clone(&self.releases),
            }))
        }
    }

    struct TrackedIndex {
        inner: Box<dyn RetrievalIndex>,
        releases: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RetrievalIndex for TrackedIndex {
        fn id(&self) -> &str {
            self.inner.id()
        }

        async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<DocumentChunk>, IndexError> {
            self.inner.retrieve(query, k).await
        }

        async fn release(&self) -> Result<(), IndexError> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            self.inner.release().await
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::services::{embedding_service::Embedder, model_service::GenerativeModel};

    #[test]
    fn test_chunks_from_numbers_chunks() {
        let chunks = chunks_from(&["a", "b"]);
        assert_eq!(chunks[1].content, "b");
        assert_eq!(chunks[1].metadata.chunk_index, 1);
    }

    #[actix_web::test]
    async fn test_keyword_embedder_is_deterministic() {
        let embedder = KeywordEmbedder::new();
        let first = embedder.embed("Paris, France").await.unwrap();
        let second = embedder.embed("france paris").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(embedder.calls(), 2);
    }

    #[actix_web::test]
    async fn test_scripted_model_repeats_last_response() {
        let model = ScriptedModel::new(vec![Ok("one".to_string()), Ok("two".to_string())]);
        assert_eq!(model.generate("p").await.unwrap(), "one");
        assert_eq!(model.generate("p").await.unwrap(), "two");
        assert_eq!(model.generate("p").await.unwrap(), "two");
        assert_eq!(model.calls(), 3);
    }
}
