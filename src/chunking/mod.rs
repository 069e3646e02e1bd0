//! Chunking for the assessment pipeline.
//!
//! [`strategic::StrategicChunker`] is the one chunker the pipeline runs:
//! it partitions a normalized plan document into the fixed ten-policy-area
//! by six-dimension grid of [`crate::core::Chunk`] cells.

pub mod strategic;

pub use strategic::StrategicChunker;
