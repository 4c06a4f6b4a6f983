use std::sync::Arc;

use validator::Validate;

use crate::{
    errors::AppResult,
    models::dto::GenerateQuizzesRequest,
    services::{
        document_loader::DocumentLoader,
        quiz_builder::{GenerationOutcome, QuizBuilder, QuizBuilderConfig},
    },
};

/// Runs one `/generate-quizzes` request: load, index, generate.
pub struct QuizService {
    loader: Arc<dyn DocumentLoader>,
    builder_config: QuizBuilderConfig,
}

impl QuizService {
    pub fn new(loader: Arc<dyn DocumentLoader>, builder_config: QuizBuilderConfig) -> Self {
        Self {
            loader,
            builder_config,
        }
    }

    pub async fn generate(&self, request: &GenerateQuizzesRequest) -> AppResult<GenerationOutcome> {
        // Type and count are checked before the document is fetched.
        let builder = QuizBuilder::new(
            &request.question_type,
            request.topic.as_str(),
            request.lang(),
            self.builder_config.clone(),
        )?;
        request.validate()?;

        let chunks = self
            .loader
            .load(&request.file_url, &request.file_type)
            .await?;

        let outcome = builder
            .create_questions(&chunks, request.n_questions as usize)
            .await?;

        if outcome.is_partial() {
            log::warn!(
                "Generated {} of {} requested {} questions for {}",
                outcome.questions.len(),
                outcome.requested,
                request.question_type,
                request.file_url
            );
        }

        Ok(outcome)
    }
}
