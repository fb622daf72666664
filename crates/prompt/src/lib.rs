//! Prompt system for grounded.
//!
//! This crate provides:
//! - The fixed fallback answer
//! - YAML-based prompt definitions with a built-in default
//! - Handlebars rendering of the bounded context block and question

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, PASSAGE_SEPARATOR};
pub use loader::{load_prompt, validate_prompt};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptDefinition, DEFAULT_PROMPT_ID, DEFAULT_TEMPLATE,
    FALLBACK_ANSWER,
};
