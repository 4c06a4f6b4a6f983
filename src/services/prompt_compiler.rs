use crate::{
    constants::quiz_prompt::QUIZZIFY_PROMPT,
    models::domain::{DocumentChunk, QuestionSpec, QuizQuestionType},
};

const CONTEXT: &str = "context";
const ATTRIBUTE_COLLECTION: &str = "attribute_collection";
const FORMAT_INSTRUCTIONS: &str = "format_instructions";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Context,
}

/// A template with everything but the retrieved context already filled in.
#[derive(Debug, Clone)]
pub struct GenerationPrompt {
    segments: Vec<Segment>,
    query: String,
}

impl GenerationPrompt {
    /// Retrieval query for this request.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn render(&self, context: &[DocumentChunk]) -> String {
        let context_text = context
            .iter()
            .map(|chunk| chunk.content.trim())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut prompt = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => prompt.push_str(text),
                Segment::Context => prompt.push_str(&context_text),
            }
        }
        prompt
    }
}

#[derive(Debug, Clone)]
pub struct PromptCompiler {
    template: String,
}

impl Default for PromptCompiler {
    fn default() -> Self {
        Self::new(QUIZZIFY_PROMPT)
    }
}

impl PromptCompiler {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn compile(
        &self,
        spec: &QuestionSpec,
        topic: &str,
        language: &str,
        question_type: QuizQuestionType,
    ) -> GenerationPrompt {
        let attributes = format!(
            "Topic: {}, Lang: {}, Question type: {}",
            topic, language, question_type
        );
        let format_instructions = spec.format_instructions();

        let segments = split_template(
            &self.template,
            &[
                (ATTRIBUTE_COLLECTION, attributes.as_str()),
                (FORMAT_INSTRUCTIONS, format_instructions.as_str()),
            ],
        );

        GenerationPrompt {
            segments,
            query: attributes,
        }
    }
}

/// Single pass over the template. Substituted values are never rescanned and
/// unknown `{...}` sequences are kept verbatim.
fn split_template(template: &str, values: &[(&str, &str)]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        if let Some(name) = after.find('}').map(|close| &after[..close]) {
            if name == CONTEXT {
                if !literal.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Context);
                rest = &after[name.len() + 1..];
                continue;
            }
            if let Some((_, value)) = values.iter().find(|(key, _)| *key == name) {
                literal.push_str(value);
                rest = &after[name.len() + 1..];
                continue;
            }
        }

        literal.push('{');
        rest = after;
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Text(literal));
    }
    segments
}
