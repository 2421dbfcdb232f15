//! Long-running passes over the document store.
//!
//! Each pass talks to its collaborators through trait objects, paces calls
//! to external providers with a fixed delay between batches, and reports
//! advisory progress through an optional [`ProgressSink`].

mod embed;
mod extraction;
mod progress;

pub use embed::{EmbedStats, EmbeddingPass};
pub use extraction::{
    BatchExtraction, BatchFailure, BatchReport, Extraction, ExtractionError, ExtractionKind,
    Extractor, PatternExtractor,
};
pub use progress::{ProgressEvent, ProgressSink};

pub(crate) use progress::emit as emit_progress;
