//! Static registry of question contracts.
//!
//! Every supported [`QuizQuestionType`] has exactly one [`QuestionSpec`]. A spec
//! knows its documented required fields, derives its JSON schema from the
//! matching question struct, renders format instructions for prompts and
//! validates candidate objects produced by the model.

use schemars::{schema_for, Schema};
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

use crate::errors::AppResult;
use crate::models::domain::quiz_question::{
    FillInTheBlankQuestion, MathExerciseQuestion, MultipleChoiceQuestion, OpenEndedQuestion,
    QuestionContract, QuizQuestion, QuizQuestionType, RelateConceptsQuestion, TrueFalseQuestion,
};

/// Why a single model response was not accepted as a question.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    #[error("unparseable model output: {0}")]
    Parse(String),

    #[error("schema validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct QuestionSpec {
    question_type: QuizQuestionType,
    required_fields: &'static [&'static str],
    example: &'static str,
}

static FILL_IN_THE_BLANK: QuestionSpec = QuestionSpec {
    question_type: QuizQuestionType::FillInTheBlank,
    required_fields: &["question", "blanks", "word_bank", "explanation"],
    example: r#"{
  "question": "The {0} of France is {1}, and it is known for its {2} and {3} {4}.",
  "blanks": [
    {"key": "0", "value": "capital"},
    {"key": "1", "value": "Paris"},
    {"key": "2", "value": "art"},
    {"key": "3", "value": "culinary"},
    {"key": "4", "value": "delights"}
  ],
  "word_bank": ["delights", "art", "Paris", "culinary", "capital"],
  "explanation": "Paris is the capital of France, and it is renowned for its contributions to art and its exceptional culinary scene."
}"#,
};

static OPEN_ENDED: QuestionSpec = QuestionSpec {
    question_type: QuizQuestionType::OpenEnded,
    required_fields: &["question", "answer", "feedback"],
    example: r#"{
  "question": "What is the significance of Paris in French history?",
  "answer": "Paris is the capital of France and has been a major center for politics, culture, art, and history.",
  "feedback": [
    "Paris is the capital of France.",
    "Paris has been a cultural center in Europe.",
    "Paris played a major role in the French Revolution."
  ]
}"#,
};

static TRUE_FALSE: QuestionSpec = QuestionSpec {
    question_type: QuizQuestionType::TrueFalse,
    required_fields: &["question", "answer", "explanation"],
    example: r#"{
  "question": "The Eiffel Tower is located in Paris.",
  "answer": true,
  "explanation": "The Eiffel Tower is a famous landmark located in Paris, France."
}"#,
};

static MULTIPLE_CHOICE: QuestionSpec = QuestionSpec {
    question_type: QuizQuestionType::MultipleChoice,
    required_fields: &["question", "choices", "answer", "explanation"],
    example: r#"{
  "question": "What is the capital of France?",
  "choices": [
    {"key": "A", "value": "Berlin"},
    {"key": "B", "value": "Madrid"},
    {"key": "C", "value": "Paris"},
    {"key": "D", "value": "Rome"}
  ],
  "answer": "C",
  "explanation": "Paris is the capital of France."
}"#,
};

static RELATE_CONCEPTS: QuestionSpec = QuestionSpec {
    question_type: QuizQuestionType::RelateConcepts,
    required_fields: &["question", "pairs", "answer", "explanation"],
    example: r#"{
  "question": "Match each term with its correct meaning.",
  "pairs": [
    {"term": "Chlorophyll", "meaning": "The process by which green plants use sunlight to synthesize foods."},
    {"term": "Photosynthesis", "meaning": "A green pigment responsible for the absorption of light."},
    {"term": "Nucleus", "meaning": "The gel-like substance inside the cell membrane."},
    {"term": "Cytoplasm", "meaning": "The control center of the cell that contains DNA."}
  ],
  "answer": [
    {"term": "Photosynthesis", "meaning": "The process by which green plants use sunlight to synthesize foods."},
    {"term": "Chlorophyll", "meaning": "A green pigment responsible for the absorption of light."},
    {"term": "Nucleus", "meaning": "The control center of the cell that contains DNA."},
    {"term": "Cytoplasm", "meaning": "The gel-like substance inside the cell membrane."}
  ],
  "explanation": "Photosynthesis uses sunlight to create food, facilitated by chlorophyll. The nucleus controls the cell and the cytoplasm fills it."
}"#,
};

static MATH_EXERCISES: QuestionSpec = QuestionSpec {
    question_type: QuizQuestionType::MathExercises,
    required_fields: &["question", "solution", "correct_answer", "explanation"],
    example: r#"{
  "question": "Solve the equation: 2x + 3 = 11",
  "solution": "Step 1: Subtract 3 from both sides to get 2x = 8. Step 2: Divide both sides by 2 to get x = 4.",
  "correct_answer": "4",
  "explanation": "By isolating the variable x, we find that x equals 4."
}"#,
};

/// Resolves a wire-level type identifier. Unknown identifiers are reported as
/// `UnsupportedQuestionType`; there is no fallback type.
pub fn resolve(type_id: &str) -> AppResult<&'static QuestionSpec> {
    let question_type: QuizQuestionType = type_id.parse()?;
    Ok(QuestionSpec::for_type(question_type))
}

impl QuestionSpec {
    pub fn for_type(question_type: QuizQuestionType) -> &'static QuestionSpec {
        match question_type {
            QuizQuestionType::FillInTheBlank => &FILL_IN_THE_BLANK,
            QuizQuestionType::OpenEnded => &OPEN_ENDED,
            QuizQuestionType::TrueFalse => &TRUE_FALSE,
            QuizQuestionType::MultipleChoice => &MULTIPLE_CHOICE,
            QuizQuestionType::RelateConcepts => &RELATE_CONCEPTS,
            QuizQuestionType::MathExercises => &MATH_EXERCISES,
        }
    }

    pub fn question_type(&self) -> QuizQuestionType {
        self.question_type
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        self.required_fields
    }

    pub fn example(&self) -> &'static str {
        self.example
    }

    pub fn json_schema(&self) -> Schema {
        match self.question_type {
            QuizQuestionType::FillInTheBlank => schema_for!(FillInTheBlankQuestion),
            QuizQuestionType::OpenEnded => schema_for!(OpenEndedQuestion),
            QuizQuestionType::TrueFalse => schema_for!(TrueFalseQuestion),
            QuizQuestionType::MultipleChoice => schema_for!(MultipleChoiceQuestion),
            QuizQuestionType::RelateConcepts => schema_for!(RelateConceptsQuestion),
            QuizQuestionType::MathExercises => schema_for!(MathExerciseQuestion),
        }
    }

    /// Output-shape instructions embedded into the generation prompt.
    pub fn format_instructions(&self) -> String {
        let schema = serde_json::to_string_pretty(&self.json_schema()).unwrap_or_default();

        format!(
            "The output should be formatted as a single JSON object that conforms to the JSON schema below.\n\
             Required fields: {fields}.\n\n\
             Here is the output schema:\n```json\n{schema}\n```\n\n\
             Here is an example of a well-formatted instance:\n```json\n{example}\n```\n\n\
             Return only the JSON object. Do not include the schema itself, comments or any other text.",
            fields = self.required_fields.join(", "),
            schema = schema,
            example = self.example,
        )
    }

    /// Strictly converts a candidate object into a question of this type.
    pub fn validate(&self, candidate: Value) -> Result<QuizQuestion, CandidateError> {
        match self.question_type {
            QuizQuestionType::FillInTheBlank => validate_as::<FillInTheBlankQuestion>(candidate),
            QuizQuestionType::OpenEnded => validate_as::<OpenEndedQuestion>(candidate),
            QuizQuestionType::TrueFalse => validate_as::<TrueFalseQuestion>(candidate),
            QuizQuestionType::MultipleChoice => validate_as::<MultipleChoiceQuestion>(candidate),
            QuizQuestionType::RelateConcepts => validate_as::<RelateConceptsQuestion>(candidate),
            QuizQuestionType::MathExercises => validate_as::<MathExerciseQuestion>(candidate),
        }
    }
}

fn validate_as<T: QuestionContract>(candidate: Value) -> Result<QuizQuestion, CandidateError> {
    let question: T = serde_json::from_value(candidate)
        .map_err(|e| CandidateError::Validation(e.to_string()))?;
    question
        .validate()
        .map_err(|e| CandidateError::Validation(e.to_string()))?;
    question
        .check_consistency()
        .map_err(CandidateError::Validation)?;
    Ok(question.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::collections::BTreeSet;

    fn schema_required(spec: &QuestionSpec) -> BTreeSet<String> {
        let schema = serde_json::to_value(spec.json_schema()).unwrap();
        schema["required"]
            .as_array()
            .expect("schema should list required fields")
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn resolve_supports_every_question_type() {
        for question_type in QuizQuestionType::ALL {
            let spec = resolve(question_type.as_str()).unwrap();
            assert_eq!(spec.question_type(), question_type);
        }
    }

    #[test]
    fn resolve_rejects_unknown_types() {
        for unknown in ["", "default", "essay", "MULTIPLE_CHOICE", " true_false"] {
            let err = resolve(unknown).unwrap_err();
            assert!(matches!(err, AppError::UnsupportedQuestionType(_)), "{unknown:?}");
        }
    }

    #[test]
    fn schema_required_fields_match_documented_contract() {
        for question_type in QuizQuestionType::ALL {
            let spec = QuestionSpec::for_type(question_type);
            let documented: BTreeSet<String> =
                spec.required_fields().iter().map(|f| f.to_string()).collect();
            assert_eq!(schema_required(spec), documented, "{question_type}");
        }
    }

    #[test]
    fn every_example_passes_its_own_validation() {
        for question_type in QuizQuestionType::ALL {
            let spec = QuestionSpec::for_type(question_type);
            let example: Value = serde_json::from_str(spec.example()).unwrap();
            let question = spec
                .validate(example)
                .unwrap_or_else(|e| panic!("{question_type} example invalid: {e}"));
            assert_eq!(question.question_type(), question_type);
        }
    }

    #[test]
    fn examples_do_not_validate_as_other_types() {
        let true_false: Value = serde_json::from_str(TRUE_FALSE.example()).unwrap();
        assert!(MULTIPLE_CHOICE.validate(true_false.clone()).is_err());
        assert!(OPEN_ENDED.validate(true_false).is_err());
    }

    #[test]
    fn format_instructions_embed_schema_and_example() {
        let instructions = MULTIPLE_CHOICE.format_instructions();

        assert!(instructions.contains("\"choices\""));
        assert!(instructions.contains("What is the capital of France?"));
        assert!(instructions.contains("Required fields: question, choices, answer, explanation"));
    }

    #[test]
    fn validate_reports_missing_fields_as_validation_errors() {
        let candidate = serde_json::json!({ "question": "Only a question" });
        let err = MATH_EXERCISES.validate(candidate).unwrap_err();
        assert!(matches!(err, CandidateError::Validation(_)));
    }
}
