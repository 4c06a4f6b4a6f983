pub mod document_loader;
pub mod embedding_service;
pub mod model_service;
pub mod output_parser;
pub mod prompt_compiler;
pub mod quiz_builder;
pub mod quiz_service;
pub mod retrieval;
