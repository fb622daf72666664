//! Prompt builder: joins retrieved passages into a context block and renders
//! the answer template.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, FALLBACK_ANSWER};
use grounded_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Separator placed between passages in the context block.
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Build the generation prompt for a question and its ranked passages.
///
/// Passages are concatenated in the given order, separated by a blank line.
/// The caller is responsible for bounding how many passages are passed in.
///
/// # Example
/// ```
/// use grounded_prompt::{build_prompt, PromptDefinition};
///
/// let built = build_prompt(&PromptDefinition::default(), "What?", &["hello world"]).unwrap();
/// assert!(built.text.contains("hello world"));
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    question: &str,
    passages: &[&str],
) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        "Building prompt '{}' with {} passages",
        definition.id,
        passages.len()
    );

    let context = passages.join(PASSAGE_SEPARATOR);

    let mut variables = HashMap::new();
    variables.insert("fallback", FALLBACK_ANSWER);
    variables.insert("context", context.as_str());
    variables.insert("question", question);

    let text = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt {
        text,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            passage_count: passages.len(),
            context_bytes: context.len(),
        },
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<&str, &str>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
