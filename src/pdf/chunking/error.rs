//! Error types for PDF chunk planning and splitting

/// Error types for PDF chunking operations
#[derive(thiserror::Error, Debug)]
pub enum PdfChunkingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to open document: {0}")]
    DocumentOpen(String),

    #[error("Document too large to load: {size} bytes exceeds {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Page copy failed for chunk {chunk_index}: {message}")]
    PageCopy { chunk_index: usize, message: String },

    #[error("Serialization failed for chunk {chunk_index}: {message}")]
    Serialization { chunk_index: usize, message: String },

    #[error("Split cancelled after {completed_chunks} chunks")]
    Cancelled { completed_chunks: usize },

    #[error("Chunk worker task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Regex compilation error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type for PDF chunking operations
pub type Result<T> = std::result::Result<T, PdfChunkingError>;

/// Trait for converting engine errors into chunking errors
pub trait IntoChunkingError<T> {
    fn into_open_error(self) -> Result<T>;
    fn into_copy_error(self, chunk_index: usize) -> Result<T>;
    fn into_serialization_error(self, chunk_index: usize) -> Result<T>;
}

impl<T, E> IntoChunkingError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_open_error(self) -> Result<T> {
        self.map_err(|e| PdfChunkingError::DocumentOpen(e.to_string()))
    }

    fn into_copy_error(self, chunk_index: usize) -> Result<T> {
        self.map_err(|e| PdfChunkingError::page_copy(chunk_index, e.to_string()))
    }

    fn into_serialization_error(self, chunk_index: usize) -> Result<T> {
        self.map_err(|e| PdfChunkingError::serialization(chunk_index, e.to_string()))
    }
}

impl PdfChunkingError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a document open error
    pub fn document_open<S: Into<String>>(msg: S) -> Self {
        Self::DocumentOpen(msg.into())
    }

    /// Create a page copy error for the given chunk
    pub fn page_copy<S: Into<String>>(chunk_index: usize, msg: S) -> Self {
        Self::PageCopy {
            chunk_index,
            message: msg.into(),
        }
    }

    /// Create a serialization error for the given chunk
    pub fn serialization<S: Into<String>>(chunk_index: usize, msg: S) -> Self {
        Self::Serialization {
            chunk_index,
            message: msg.into(),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Bad input or bad settings fail the same way on retry
            Self::Validation(_) | Self::Configuration(_) | Self::FileTooLarge { .. } => false,
            Self::DocumentOpen(_) => false,
            // Materialization can fail transiently (memory pressure, worker loss)
            Self::PageCopy { .. } | Self::Serialization { .. } => true,
            Self::TaskJoin(_) => true,
            Self::Cancelled { .. } => true,
            Self::Regex(_) => false,
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Configuration(_) => "configuration",
            Self::DocumentOpen(_) => "document_open",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::PageCopy { .. } => "page_copy",
            Self::Serialization { .. } => "serialization",
            Self::Cancelled { .. } => "cancelled",
            Self::TaskJoin(_) => "task_join",
            Self::Regex(_) => "regex",
        }
    }

    /// Index of the chunk that failed, for materialization errors
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            Self::PageCopy { chunk_index, .. } | Self::Serialization { chunk_index, .. } => {
                Some(*chunk_index)
            }
            _ => None,
        }
    }
}
