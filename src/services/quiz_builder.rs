//! Retrieval-augmented generation loop for one quiz request.
//!
//! The builder indexes the request's document once, then asks the model for
//! one question per attempt until enough questions validate or the attempt
//! budget (`ATTEMPTS_PER_QUESTION` per requested question) runs out. Failed
//! attempts of any kind are skipped. The index is released on every exit path.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;

use crate::{
    errors::{AppError, AppResult, ProviderError},
    models::domain::{resolve, CandidateError, DocumentChunk, QuestionSpec, QuizQuestion},
    services::{
        model_service::GenerativeModel,
        output_parser::{parse_candidate, strip_schema_metadata},
        prompt_compiler::{GenerationPrompt, PromptCompiler},
        retrieval::{IndexBuilder, IndexError, RetrievalIndex, DEFAULT_RETRIEVAL_K},
    },
};

pub const MAX_QUESTIONS: usize = 10;
pub const ATTEMPTS_PER_QUESTION: usize = 5;

/// Collaborators and knobs of a [`QuizBuilder`].
#[derive(Clone)]
pub struct QuizBuilderConfig {
    pub model: Arc<dyn GenerativeModel>,
    pub index_builder: Arc<dyn IndexBuilder>,
    pub prompt_compiler: PromptCompiler,
    pub retrieval_k: usize,
}

impl QuizBuilderConfig {
    pub fn new(model: Arc<dyn GenerativeModel>, index_builder: Arc<dyn IndexBuilder>) -> Self {
        Self {
            model,
            index_builder,
            prompt_compiler: PromptCompiler::default(),
            retrieval_k: DEFAULT_RETRIEVAL_K,
        }
    }

    pub fn with_prompt_compiler(mut self, prompt_compiler: PromptCompiler) -> Self {
        self.prompt_compiler = prompt_compiler;
        self
    }

    pub fn with_retrieval_k(mut self, retrieval_k: usize) -> Self {
        self.retrieval_k = retrieval_k.max(1);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub questions: Vec<QuizQuestion>,
    pub requested: usize,
    pub attempts: usize,
}

impl GenerationOutcome {
    /// True when the attempt budget ran out before `requested` questions validated.
    pub fn is_partial(&self) -> bool {
        self.questions.len() < self.requested
    }
}

#[derive(Debug, Error)]
enum AttemptError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] IndexError),

    #[error("model call failed: {0}")]
    Transport(#[from] ProviderError),

    #[error(transparent)]
    Candidate(#[from] CandidateError),
}

pub struct QuizBuilder {
    spec: &'static QuestionSpec,
    topic: String,
    lang: String,
    config: QuizBuilderConfig,
}

impl QuizBuilder {
    /// Fails with `UnsupportedQuestionType` for unknown types and
    /// `InvalidRequest` for a blank topic.
    pub fn new(
        question_type: &str,
        topic: impl Into<String>,
        lang: impl Into<String>,
        config: QuizBuilderConfig,
    ) -> AppResult<Self> {
        let spec = resolve(question_type)?;

        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(AppError::InvalidRequest("Topic must be provided".to_string()));
        }

        Ok(Self {
            spec,
            topic,
            lang: lang.into(),
            config,
        })
    }

    pub fn spec(&self) -> &'static QuestionSpec {
        self.spec
    }

    pub async fn create_questions(
        &self,
        documents: &[DocumentChunk],
        num_questions: usize,
    ) -> AppResult<GenerationOutcome> {
        if num_questions > MAX_QUESTIONS {
            return Err(AppError::InvalidRequest(format!(
                "Number of questions cannot exceed {}",
                MAX_QUESTIONS
            )));
        }
        if num_questions == 0 {
            return Err(AppError::InvalidRequest(
                "Number of questions must be at least 1".to_string(),
            ));
        }

        log::info!(
            "Creating {} {} questions on topic {:?}",
            num_questions,
            self.spec.question_type(),
            self.topic
        );

        let prompt = self.config.prompt_compiler.compile(
            self.spec,
            &self.topic,
            &self.lang,
            self.spec.question_type(),
        );

        let index = self.config.index_builder.build(documents).await?;

        let result = AssertUnwindSafe(self.run_attempts(index.as_ref(), &prompt, num_questions))
            .catch_unwind()
            .await;

        if let Err(e) = index.release().await {
            log::error!("Failed to release collection {}: {}", index.id(), e);
        }

        match result {
            Ok(outcome) => Ok(outcome),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn run_attempts(
        &self,
        index: &dyn RetrievalIndex,
        prompt: &GenerationPrompt,
        target: usize,
    ) -> GenerationOutcome {
        let max_attempts = ATTEMPTS_PER_QUESTION * target;
        let mut questions = Vec::with_capacity(target);
        let mut attempts = 0;

        while questions.len() < target && attempts < max_attempts {
            attempts += 1;

            match self.attempt(index, prompt).await {
                Ok(question) => {
                    questions.push(question);
                    log::info!(
                        "attempt={}/{} outcome=accepted collected={}/{} question_type={}",
                        attempts,
                        max_attempts,
                        questions.len(),
                        target,
                        self.spec.question_type()
                    );
                }
                Err(e) => {
                    log::warn!(
                        "attempt={}/{} outcome=rejected collected={}/{} question_type={} reason=\"{}\"",
                        attempts,
                        max_attempts,
                        questions.len(),
                        target,
                        self.spec.question_type(),
                        e
                    );
                }
            }
        }

        if questions.len() < target {
            log::warn!(
                "outcome=budget_exhausted generated={} requested={} attempts={}",
                questions.len(),
                target,
                attempts
            );
        } else {
            log::info!(
                "outcome=complete generated={} requested={} attempts={}",
                questions.len(),
                target,
                attempts
            );
        }

        questions.truncate(target);
        GenerationOutcome {
            questions,
            requested: target,
            attempts,
        }
    }

    async fn attempt(
        &self,
        index: &dyn RetrievalIndex,
        prompt: &GenerationPrompt,
    ) -> Result<QuizQuestion, AttemptError> {
        let context = index.retrieve(prompt.query(), self.config.retrieval_k).await?;
        let raw = self.config.model.generate(&prompt.render(&context)).await?;

        let mut candidate = parse_candidate(&raw)?;
        strip_schema_metadata(&mut candidate);

        Ok(self.spec.validate(Value::Object(candidate))?)
    }
}
