use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct GenerateQuizzesRequest {
    #[validate(length(min = 1, message = "topic must not be empty"))]
    pub topic: String,

    #[validate(range(min = 1, max = 10, message = "n_questions must be between 1 and 10"))]
    pub n_questions: i64,

    #[validate(url(message = "file_url must be a valid URL"))]
    pub file_url: String,

    #[validate(length(min = 1, message = "file_type must not be empty"))]
    pub file_type: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 16))]
    pub lang: Option<String>,

    pub question_type: String,
}

impl GenerateQuizzesRequest {
    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }
}
