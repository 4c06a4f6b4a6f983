use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a chunk came from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub file_type: String,
    pub chunk_index: usize,
    /// SHA-256 of the whole source document, hex encoded.
    pub document_sha256: String,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DocumentChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    pub fn new(content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

impl ChunkMetadata {
    pub fn new(
        source: impl Into<String>,
        file_type: impl Into<String>,
        chunk_index: usize,
        document_sha256: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            file_type: file_type.into(),
            chunk_index,
            document_sha256: document_sha256.into(),
            loaded_at: Utc::now(),
        }
    }
}
