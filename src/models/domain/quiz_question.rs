use std::{collections::HashSet, fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use validator::Validate;

use crate::errors::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizQuestionType {
    FillInTheBlank,
    OpenEnded,
    TrueFalse,
    MultipleChoice,
    RelateConcepts,
    MathExercises,
}

impl QuizQuestionType {
    pub const ALL: [QuizQuestionType; 6] = [
        QuizQuestionType::FillInTheBlank,
        QuizQuestionType::OpenEnded,
        QuizQuestionType::TrueFalse,
        QuizQuestionType::MultipleChoice,
        QuizQuestionType::RelateConcepts,
        QuizQuestionType::MathExercises,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuizQuestionType::FillInTheBlank => "fill_in_the_blank",
            QuizQuestionType::OpenEnded => "open_ended",
            QuizQuestionType::TrueFalse => "true_false",
            QuizQuestionType::MultipleChoice => "multiple_choice",
            QuizQuestionType::RelateConcepts => "relate_concepts",
            QuizQuestionType::MathExercises => "math_exercises",
        }
    }
}

impl fmt::Display for QuizQuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizQuestionType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        QuizQuestionType::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| AppError::UnsupportedQuestionType(value.to_string()))
    }
}

/// A blank slot in a fill-in-the-blank question.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct QuestionBlank {
    /// A unique identifier for the blank, starting from 0.
    pub key: String,
    /// The text content to fill in the blank.
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FillInTheBlankQuestion {
    /// The question text with blanks indicated by placeholders. It must contain
    /// exactly 5 placeholders: {0}, {1}, {2}, {3}, {4}.
    #[validate(length(min = 1))]
    pub question: String,
    /// A list of blanks for the question, each with a key and a value.
    #[validate(length(equal = 5))]
    pub blanks: Vec<QuestionBlank>,
    /// A list of the correct texts that fill in the blanks, in random order.
    #[validate(length(equal = 5))]
    pub word_bank: Vec<String>,
    /// An explanation of why the answers are correct.
    #[validate(length(min = 1))]
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OpenEndedQuestion {
    /// The open-ended question text.
    #[validate(length(min = 1))]
    pub question: String,
    /// The expected correct answer.
    #[validate(length(min = 1))]
    pub answer: String,
    /// A list of possible answers for the provided question.
    #[validate(length(min = 1))]
    pub feedback: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TrueFalseQuestion {
    /// The true/false question text.
    #[validate(length(min = 1))]
    pub question: String,
    /// The correct answer, either true or false.
    pub answer: bool,
    /// An explanation of why the answer is correct.
    #[validate(length(min = 1))]
    pub explanation: String,
}

/// One labeled choice of a multiple-choice question.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct QuestionChoice {
    /// A unique identifier for the choice using letters A, B, C, or D.
    pub key: String,
    /// The text content of the choice.
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MultipleChoiceQuestion {
    /// The question text.
    #[validate(length(min = 1))]
    pub question: String,
    /// A list of choices for the question, each with a key and a value.
    #[validate(length(min = 2))]
    pub choices: Vec<QuestionChoice>,
    /// The key of the correct answer from the choices list.
    #[validate(length(min = 1))]
    pub answer: String,
    /// An explanation of why the answer is correct.
    #[validate(length(min = 1))]
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TermMeaningPair {
    /// The term to be matched.
    pub term: String,
    /// The meaning of the term.
    pub meaning: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RelateConceptsQuestion {
    /// The "relate concepts" question text. It must be appropriate for
    /// generating pairs and answers.
    #[validate(length(min = 1))]
    pub question: String,
    /// A list of term-meaning pairs in disorder.
    #[validate(length(min = 2))]
    pub pairs: Vec<TermMeaningPair>,
    /// A list of the correct term-meaning pairs in order.
    #[validate(length(min = 2))]
    pub answer: Vec<TermMeaningPair>,
    /// An explanation of the correct term-meaning pairs.
    #[validate(length(min = 1))]
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MathExerciseQuestion {
    /// The math exercise question text.
    #[validate(length(min = 1))]
    pub question: String,
    /// The step-by-step solution to the math problem.
    #[validate(length(min = 1))]
    pub solution: String,
    /// The correct answer to the math problem.
    #[validate(length(min = 1))]
    pub correct_answer: String,
    /// An explanation of why the solution is correct.
    #[validate(length(min = 1))]
    pub explanation: String,
}

/// A question that passed strict parsing and every structural check of its
/// type. Serializes to exactly the object shape of the matching schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QuizQuestion {
    FillInTheBlank(FillInTheBlankQuestion),
    OpenEnded(OpenEndedQuestion),
    TrueFalse(TrueFalseQuestion),
    MultipleChoice(MultipleChoiceQuestion),
    RelateConcepts(RelateConceptsQuestion),
    MathExercises(MathExerciseQuestion),
}

impl QuizQuestion {
    pub fn question_type(&self) -> QuizQuestionType {
        match self {
            QuizQuestion::FillInTheBlank(_) => QuizQuestionType::FillInTheBlank,
            QuizQuestion::OpenEnded(_) => QuizQuestionType::OpenEnded,
            QuizQuestion::TrueFalse(_) => QuizQuestionType::TrueFalse,
            QuizQuestion::MultipleChoice(_) => QuizQuestionType::MultipleChoice,
            QuizQuestion::RelateConcepts(_) => QuizQuestionType::RelateConcepts,
            QuizQuestion::MathExercises(_) => QuizQuestionType::MathExercises,
        }
    }

    pub fn question(&self) -> &str {
        match self {
            QuizQuestion::FillInTheBlank(q) => &q.question,
            QuizQuestion::OpenEnded(q) => &q.question,
            QuizQuestion::TrueFalse(q) => &q.question,
            QuizQuestion::MultipleChoice(q) => &q.question,
            QuizQuestion::RelateConcepts(q) => &q.question,
            QuizQuestion::MathExercises(q) => &q.question,
        }
    }
}

/// Field-level rules come from `Validate`; `check_consistency` covers the
/// rules that relate fields to each other.
pub(crate) trait QuestionContract: DeserializeOwned + Validate + Into<QuizQuestion> {
    fn check_consistency(&self) -> Result<(), String>;
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("`{}` must not be blank", field));
    }
    Ok(())
}

impl QuestionContract for FillInTheBlankQuestion {
    fn check_consistency(&self) -> Result<(), String> {
        require_text("question", &self.question)?;
        require_text("explanation", &self.explanation)?;

        let keys: HashSet<&str> = self.blanks.iter().map(|b| b.key.trim()).collect();
        for index in 0..self.blanks.len() {
            let key = index.to_string();
            if !keys.contains(key.as_str()) {
                return Err(format!("missing blank with key \"{}\"", key));
            }
            let placeholder = format!("{{{}}}", index);
            if !self.question.contains(&placeholder) {
                return Err(format!("question text is missing placeholder {}", placeholder));
            }
        }

        for blank in &self.blanks {
            require_text("blanks.value", &blank.value)?;
        }
        for word in &self.word_bank {
            require_text("word_bank", word)?;
        }

        let mut values: Vec<&str> = self.blanks.iter().map(|b| b.value.trim()).collect();
        let mut words: Vec<&str> = self.word_bank.iter().map(|w| w.trim()).collect();
        values.sort_unstable();
        words.sort_unstable();
        if values != words {
            return Err("word_bank must hold exactly the blank values".to_string());
        }
        Ok(())
    }
}

impl QuestionContract for OpenEndedQuestion {
    fn check_consistency(&self) -> Result<(), String> {
        require_text("question", &self.question)?;
        require_text("answer", &self.answer)?;
        for entry in &self.feedback {
            require_text("feedback", entry)?;
        }
        Ok(())
    }
}

impl QuestionContract for TrueFalseQuestion {
    fn check_consistency(&self) -> Result<(), String> {
        require_text("question", &self.question)?;
        require_text("explanation", &self.explanation)
    }
}

impl QuestionContract for MultipleChoiceQuestion {
    fn check_consistency(&self) -> Result<(), String> {
        require_text("question", &self.question)?;
        require_text("explanation", &self.explanation)?;

        let mut keys = HashSet::new();
        for choice in &self.choices {
            require_text("choices.key", &choice.key)?;
            require_text("choices.value", &choice.value)?;
            if !keys.insert(choice.key.as_str()) {
                return Err(format!("duplicate choice key \"{}\"", choice.key));
            }
        }

        if !keys.contains(self.answer.as_str()) {
            return Err(format!(
                "answer \"{}\" does not match any choice key",
                self.answer
            ));
        }
        Ok(())
    }
}

impl QuestionContract for RelateConceptsQuestion {
    fn check_consistency(&self) -> Result<(), String> {
        require_text("question", &self.question)?;
        require_text("explanation", &self.explanation)?;

        if self.pairs.len() != self.answer.len() {
            return Err(format!(
                "pairs ({}) and answer ({}) must have the same length",
                self.pairs.len(),
                self.answer.len()
            ));
        }

        let mut pair_terms = HashSet::new();
        for pair in &self.pairs {
            require_text("pairs.term", &pair.term)?;
            require_text("pairs.meaning", &pair.meaning)?;
            if !pair_terms.insert(pair.term.as_str()) {
                return Err(format!("duplicate term \"{}\"", pair.term));
            }
        }

        for pair in &self.answer {
            require_text("answer.term", &pair.term)?;
            require_text("answer.meaning", &pair.meaning)?;
        }

        let answer_terms: HashSet<&str> = self.answer.iter().map(|p| p.term.as_str()).collect();
        if pair_terms != answer_terms {
            return Err("answer must relate exactly the terms listed in pairs".to_string());
        }

        let mut pair_meanings: Vec<&str> = self.pairs.iter().map(|p| p.meaning.trim()).collect();
        let mut answer_meanings: Vec<&str> = self.answer.iter().map(|p| p.meaning.trim()).collect();
        pair_meanings.sort_unstable();
        answer_meanings.sort_unstable();
        if pair_meanings != answer_meanings {
            return Err("answer must reuse exactly the meanings listed in pairs".to_string());
        }
        Ok(())
    }
}

impl QuestionContract for MathExerciseQuestion {
    fn check_consistency(&self) -> Result<(), String> {
        require_text("question", &self.question)?;
        require_text("solution", &self.solution)?;
        require_text("correct_answer", &self.correct_answer)
    }
}

impl From<FillInTheBlankQuestion> for QuizQuestion {
    fn from(q: FillInTheBlankQuestion) -> Self {
        QuizQuestion::FillInTheBlank(q)
    }
}

impl From<OpenEndedQuestion> for QuizQuestion {
    fn from(q: OpenEndedQuestion) -> Self {
        QuizQuestion::OpenEnded(q)
    }
}

impl From<TrueFalseQuestion> for QuizQuestion {
    fn from(q: TrueFalseQuestion) -> Self {
        QuizQuestion::TrueFalse(q)
    }
}

impl From<MultipleChoiceQuestion> for QuizQuestion {
    fn from(q: MultipleChoiceQuestion) -> Self {
        QuizQuestion::MultipleChoice(q)
    }
}

impl From<RelateConceptsQuestion> for QuizQuestion {
    fn from(q: RelateConceptsQuestion) -> Self {
        QuizQuestion::RelateConcepts(q)
    }
}

impl From<MathExerciseQuestion> for QuizQuestion {
    fn from(q: MathExerciseQuestion) -> Self {
        QuizQuestion::MathExercises(q)
    }
}
