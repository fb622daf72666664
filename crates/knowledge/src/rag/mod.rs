//! Retrieval-augmented answering.
//!
//! Embeds the question, retrieves the nearest chunks, renders the prompt and
//! asks the generator, falling back to a fixed answer on any failure.

pub mod pipeline;

pub use pipeline::AnswerPipeline;
