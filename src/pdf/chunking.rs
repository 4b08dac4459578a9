//! Chunk planning and splitting of large PDF documents
//!
//! Planning is pure and works from a page count and a byte size only.
//! Splitting copies the planned page ranges into standalone sub-documents
//! through a `PdfEngine`.

pub mod chunker;
pub mod config;
pub mod error;
pub mod page_counter;
pub mod planner;
pub mod splitter;
pub mod types;

// Re-export main public interfaces
pub use chunker::PdfChunker;
pub use config::{ChunkSizeTier, ChunkingConfig, PdfEngine, SplitOptions, SplitStatistics};
pub use error::{IntoChunkingError, PdfChunkingError, Result};
pub use page_counter::PageCounter;
pub use planner::{ChunkPlanner, ChunkWindowCalculator, resolve_tier_chunk_size};
pub use splitter::{ChunkNamer, DocumentSplitter};
pub use types::{
    Chunk, ChunkManifest, ChunkPlan, ChunkWindow, ManifestEntry, OverlapRange, PageCount,
    SizeTier, SplitOutcome, SplitPhase,
};
