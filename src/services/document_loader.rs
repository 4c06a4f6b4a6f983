use async_trait::async_trait;
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{ChunkMetadata, DocumentChunk},
};

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

/// Fetches a document and splits it into chunks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, url: &str, file_type: &str) -> AppResult<Vec<DocumentChunk>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    Text,
    Markdown,
    Csv,
    Json,
    Html,
    Pdf,
}

impl FileType {
    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim().trim_start_matches('.').to_lowercase().as_str() {
            "txt" | "text" => Ok(FileType::Text),
            "md" | "markdown" => Ok(FileType::Markdown),
            "csv" => Ok(FileType::Csv),
            "json" => Ok(FileType::Json),
            "html" | "htm" => Ok(FileType::Html),
            "pdf" => Ok(FileType::Pdf),
            other => Err(AppError::LoaderError(format!(
                "unsupported file type: {}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Text => "txt",
            FileType::Markdown => "md",
            FileType::Csv => "csv",
            FileType::Json => "json",
            FileType::Html => "html",
            FileType::Pdf => "pdf",
        }
    }

    fn extract_text(&self, body: &[u8]) -> AppResult<String> {
        match self {
            FileType::Pdf => pdf_extract::extract_text_from_mem(body)
                .map_err(|e| AppError::LoaderError(format!("failed to read PDF: {}", e))),
            FileType::Html => Ok(html_to_text(&String::from_utf8_lossy(body))),
            _ => Ok(String::from_utf8_lossy(body).into_owned()),
        }
    }
}

/// Runs extraction off the async runtime. PDF parsing is CPU bound and may
/// panic on malformed input; a panic is reported as a `LoaderError`.
async fn extract_document_text(file_type: FileType, body: Vec<u8>) -> AppResult<String> {
    tokio::task::spawn_blocking(move || file_type.extract_text(&body))
        .await
        .map_err(|e| {
            AppError::LoaderError(format!("{} extraction aborted: {}", file_type.as_str(), e))
        })?
}

/// Visible text of the `<body>`, one line per text node.
fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };

    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    let mut lines = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Character-window splitter that prefers to break at whitespace.
#[derive(Clone, Copy, Debug)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let mut end = (start + self.chunk_size).min(chars.len());
            if end < chars.len() {
                let search_from = (start + 1).max(start + self.chunk_size / 2);
                if let Some(ws) = (search_from..end).rev().find(|&i| chars[i].is_whitespace()) {
                    end = ws;
                }
            }

            let chunk: String = chars[start..end].iter().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            if end == chars.len() {
                break;
            }
            let next = end.saturating_sub(self.chunk_overlap);
            start = if next > start { next } else { end };
        }

        chunks
    }
}

/// Loads plain-text-like documents over HTTP.
pub struct HttpDocumentLoader {
    client: reqwest::Client,
    splitter: TextSplitter,
}

impl HttpDocumentLoader {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            splitter: TextSplitter::new(config.chunk_size, config.chunk_overlap),
        }
    }
}

#[async_trait]
impl DocumentLoader for HttpDocumentLoader {
    async fn load(&self, url: &str, file_type: &str) -> AppResult<Vec<DocumentChunk>> {
        let file_type = FileType::parse(file_type)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            log::error!("Failed to fetch document {}: {}", url, e);
            AppError::LoaderError(format!("failed to fetch {}: {}", url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::LoaderError(format!(
                "fetching {} returned status {}",
                url, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::LoaderError(format!("failed to read {}: {}", url, e)))?
            .to_vec();
        let digest = format!("{:x}", Sha256::digest(&body));

        let text = extract_document_text(file_type, body).await?;
        if text.trim().is_empty() {
            return Err(AppError::LoaderError(format!("document {} is empty", url)));
        }

        let chunks: Vec<DocumentChunk> = self
            .splitter
            .split(&text)
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                DocumentChunk::new(
                    content,
                    ChunkMetadata::new(url, file_type.as_str(), index, digest.as_str()),
                )
            })
            .collect();

        log::info!("Loaded {} chunks from {}", chunks.len(), url);
        Ok(chunks)
    }
}
