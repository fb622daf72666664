//! Prompt types for grounded.

use serde::{Deserialize, Serialize};

/// Answer returned, and demanded from the model, whenever grounded output is impossible.
pub const FALLBACK_ANSWER: &str = "I don't know based on the current knowledge base.";

/// Identifier of the built-in answer prompt.
pub const DEFAULT_PROMPT_ID: &str = "grounded.answer.default";

/// Built-in answer template.
///
/// Variables: `fallback`, `context`, `question`.
pub const DEFAULT_TEMPLATE: &str = "You are a concise assistant that answers ONLY using the provided context.
If the answer is not in the context, respond exactly:
\"{{fallback}}\"
Never fabricate or infer beyond the context. Keep answers short and actionable.
Context:
{{context}}

User question: {{question}}

Answer:";

/// A prompt definition, either built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Template string with Handlebars syntax
    pub template: String,
}

impl Default for PromptDefinition {
    fn default() -> Self {
        Self {
            id: DEFAULT_PROMPT_ID.to_string(),
            title: "Grounded answer".to_string(),
            api_version: "1.0".to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

/// A rendered prompt ready for generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// Rendered prompt text
    pub text: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Number of passages placed in the context block
    #[serde(rename = "passageCount")]
    pub passage_count: usize,

    /// Length of the context block in bytes
    #[serde(rename = "contextBytes")]
    pub context_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: support.answer
title: Support answer
apiVersion: "1.0"
template: "Context:\n{{context}}\nUser question: {{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "support.answer");
        assert_eq!(def.api_version, "1.0");
        assert!(def.template.contains("{{context}}"));
    }

    #[test]
    fn test_default_definition_uses_builtin_template() {
        let def = PromptDefinition::default();
        assert_eq!(def.id, DEFAULT_PROMPT_ID);
        assert!(def.template.contains("Context:"));
        assert!(def.template.contains("User question: {{question}}"));
        assert!(def.template.contains("{{fallback}}"));
    }
}
