use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        document_loader::HttpDocumentLoader,
        embedding_service::OpenAiEmbedder,
        model_service::OpenAiChatModel,
        quiz_builder::QuizBuilderConfig,
        quiz_service::QuizService,
        retrieval::InMemoryVectorStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<QuizService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the OpenAI-backed providers and the shared vector store.
    pub fn new(config: Config) -> Self {
        let embedder = Arc::new(OpenAiEmbedder::new(&config));
        let vector_store = Arc::new(InMemoryVectorStore::new(embedder));
        let model = Arc::new(OpenAiChatModel::new(&config));
        let loader = Arc::new(HttpDocumentLoader::new(&config));

        let builder_config =
            QuizBuilderConfig::new(model, vector_store).with_retrieval_k(config.retrieval_k);
        let quiz_service = Arc::new(QuizService::new(loader, builder_config));

        Self::with_service(config, quiz_service)
    }

    pub fn with_service(config: Config, quiz_service: Arc<QuizService>) -> Self {
        Self {
            quiz_service,
            config: Arc::new(config),
        }
    }
}
