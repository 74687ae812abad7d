//! Prompt composition shared by all backend adapters.

use agent_core::{AgentConfig, FieldSpec, Schema, SchemaKind};
use serde_json::Value;

/// Whether the agent's response schema asks for structured JSON.
pub fn response_wants_json(agent: &AgentConfig) -> bool {
    agent
        .response_schema
        .as_ref()
        .is_some_and(|schema| schema.kind == SchemaKind::Json)
}

/// Compose the system-level instruction for an agent.
///
/// When the response schema demands JSON, a human-readable directive listing
/// the required and optional fields is appended to the operator's
/// instruction.
pub fn compose_system_prompt(agent: &AgentConfig) -> String {
    let mut prompt = agent.instruction.clone();

    if let Some(schema) = agent.response_schema.as_ref() {
        if schema.kind == SchemaKind::Json {
            prompt.push_str("\n\n");
            prompt.push_str(&json_format_instructions(schema));
        }
    }

    prompt
}

/// Render the validated input as the sole user turn.
///
/// Strings pass through verbatim; anything else is JSON-serialized.
pub fn render_input(input: &Value) -> String {
    match input {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Build the JSON response directive for a schema.
pub fn json_format_instructions(schema: &Schema) -> String {
    let mut instructions = String::from("RESPONSE FORMAT: You must respond with valid JSON.");

    let fields = schema.fields();
    if fields.is_empty() {
        return instructions;
    }

    instructions.push_str(" Your response must include the following fields:");

    let required: Vec<String> = fields
        .iter()
        .filter(|field| field.required)
        .map(describe_field)
        .collect();
    let optional: Vec<String> = fields
        .iter()
        .filter(|field| !field.required)
        .map(describe_field)
        .collect();

    if !required.is_empty() {
        instructions.push_str("\nRequired fields: ");
        instructions.push_str(&required.join(", "));
    }

    if !optional.is_empty() {
        instructions.push_str("\nOptional fields: ");
        instructions.push_str(&optional.join(", "));
    }

    instructions
}

fn describe_field(field: &FieldSpec) -> String {
    match field.description.as_deref() {
        Some(description) => format!("\"{}\" ({}: {description})", field.name, field.field_type),
        None => format!("\"{}\" ({})", field.name, field.field_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{Backend, Credential, FieldType};
    use chrono::Utc;
    use serde_json::json;

    fn agent_with_response_schema(schema: Option<Schema>) -> AgentConfig {
        AgentConfig {
            id: "a1".to_string(),
            name: "summarizer".to_string(),
            backend: Backend::OpenAi,
            credential: Credential::new("key"),
            route_path: "/api/summarize".to_string(),
            instruction: "Summarize the input".to_string(),
            request_schema: None,
            response_schema: schema,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn directive_lists_required_and_optional_fields() {
        let schema = Schema::json(vec![
            FieldSpec::new("summary", FieldType::String, true)
                .with_description("One-paragraph summary"),
            FieldSpec::new("keywords", FieldType::Array, false),
        ]);

        let directive = json_format_instructions(&schema);
        assert!(directive.starts_with("RESPONSE FORMAT: You must respond with valid JSON."));
        assert!(directive
            .contains("Required fields: \"summary\" (string: One-paragraph summary)"));
        assert!(directive.contains("Optional fields: \"keywords\" (array)"));
    }

    #[test]
    fn directive_without_fields_is_bare() {
        let schema = Schema {
            kind: SchemaKind::Json,
            fields: None,
            description: None,
        };
        assert_eq!(
            json_format_instructions(&schema),
            "RESPONSE FORMAT: You must respond with valid JSON."
        );
    }

    #[test]
    fn system_prompt_appends_directive_only_for_json_schemas() {
        let json_agent = agent_with_response_schema(Some(Schema::json(vec![])));
        assert!(compose_system_prompt(&json_agent).contains("RESPONSE FORMAT"));

        let text_agent = agent_with_response_schema(Some(Schema::text()));
        assert_eq!(compose_system_prompt(&text_agent), "Summarize the input");

        let plain_agent = agent_with_response_schema(None);
        assert_eq!(compose_system_prompt(&plain_agent), "Summarize the input");
    }

    #[test]
    fn input_strings_pass_verbatim_and_values_serialize() {
        assert_eq!(render_input(&json!("hello")), "hello");
        assert_eq!(render_input(&json!({"a": 1})), "{\"a\":1}");
        assert_eq!(render_input(&json!([1, 2])), "[1,2]");
    }
}
