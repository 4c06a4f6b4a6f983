pub mod document_chunk;
pub mod question_spec;
pub mod quiz_question;
pub use document_chunk::{ChunkMetadata, DocumentChunk};
pub use question_spec::{resolve, CandidateError, QuestionSpec};
pub use quiz_question::{QuizQuestion, QuizQuestionType};
