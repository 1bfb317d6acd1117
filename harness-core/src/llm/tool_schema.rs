//! Vendor-neutral preparation of scenario tool declarations.
//!
//! Scenario files describe parameters with the dataset's own type names
//! (`dict`, `float`, `tuple`, Java and JavaScript class names, ...). Before a
//! provider can compile them they are documented for the scenario language and
//! cast to the OpenAPI subset vendors accept. Every function here takes its
//! input by reference and returns fresh values.

use crate::llm::provider::LLMError;
use crate::llm::types::ToolDeclaration;
use serde_json::{Map, Value};
use std::collections::HashSet;

const PYTHON_NOTE: &str = "Note that the provided function is in Python 3 syntax.";
const JAVA_NOTE: &str = "Note that the provided function is in Java 8 SDK syntax.";
const JAVASCRIPT_NOTE: &str = "Note that the provided function is in JavaScript syntax.";

/// Source language implied by a test category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioLanguage {
    Python,
    Java,
    JavaScript,
}

impl ScenarioLanguage {
    pub fn from_category(category: &str) -> Self {
        // "javascript" contains "java", so it must be checked first
        if category.contains("javascript") {
            ScenarioLanguage::JavaScript
        } else if category.contains("java") {
            ScenarioLanguage::Java
        } else {
            ScenarioLanguage::Python
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            ScenarioLanguage::Python => "Python",
            ScenarioLanguage::Java => "Java",
            ScenarioLanguage::JavaScript => "JavaScript",
        }
    }

    fn note(&self) -> &'static str {
        match self {
            ScenarioLanguage::Python => PYTHON_NOTE,
            ScenarioLanguage::Java => JAVA_NOTE,
            ScenarioLanguage::JavaScript => JAVASCRIPT_NOTE,
        }
    }
}

/// Test category of an entry id: the id with its trailing `_<n>` removed
pub fn test_category(entry_id: &str) -> &str {
    entry_id
        .rsplit_once('_')
        .map(|(category, _)| category)
        .unwrap_or(entry_id)
}

/// Reject declaration sets no vendor can accept
pub fn validate_declarations(declarations: &[ToolDeclaration]) -> Result<(), LLMError> {
    let mut seen = HashSet::new();
    for declaration in declarations {
        if declaration.name.trim().is_empty() {
            return Err(LLMError::InvalidRequest(
                "tool declaration with an empty name".to_string(),
            ));
        }
        if !seen.insert(declaration.name.as_str()) {
            return Err(LLMError::InvalidRequest(format!(
                "duplicate tool declaration '{}'",
                declaration.name
            )));
        }
        if !declaration.parameters.is_object() {
            return Err(LLMError::InvalidRequest(format!(
                "parameters of '{}' must be a JSON object",
                declaration.name
            )));
        }
    }
    Ok(())
}

/// Append language notes to descriptions. For Java and JavaScript every
/// parameter is passed as a string, so the original type moves into the
/// parameter description.
pub fn language_pre_process(
    declarations: &[ToolDeclaration],
    category: &str,
) -> Vec<ToolDeclaration> {
    let language = ScenarioLanguage::from_category(category);

    declarations
        .iter()
        .map(|declaration| {
            let mut declaration = declaration.clone();
            declaration.description = append_sentence(&declaration.description, language.note());

            if language != ScenarioLanguage::Python {
                if let Some(properties) = declaration
                    .parameters
                    .get_mut("properties")
                    .and_then(Value::as_object_mut)
                {
                    for schema in properties.values_mut() {
                        stringify_parameter(schema, language);
                    }
                }
            }
            declaration
        })
        .collect()
}

fn stringify_parameter(schema: &mut Value, language: ScenarioLanguage) {
    let Some(schema) = schema.as_object_mut() else {
        return;
    };
    let original = schema
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("any")
        .to_string();
    if original == "string" {
        return;
    }

    let note = if original.eq_ignore_ascii_case("any") {
        format!(
            "This parameter can be of any type of {} object in string representation.",
            language.display_name()
        )
    } else {
        let mut note = format!(
            "This is {} {original} type parameter in string representation.",
            language.display_name()
        );
        if let Some(item_type) = schema
            .get("items")
            .and_then(|items| items.get("type"))
            .and_then(Value::as_str)
        {
            note.push_str(&format!(
                " The list elements are of type {item_type}; they are not in string representation."
            ));
        }
        note
    };

    let description = schema
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let description = append_sentence(description, &note);
    schema.insert("description".to_string(), Value::String(description));
    schema.insert("type".to_string(), Value::String("string".to_string()));
    schema.remove("items");
    schema.remove("properties");
}

/// OpenAPI type for a dataset type name. Unknown names become `string`.
pub fn openapi_type(dataset_type: &str) -> &'static str {
    match dataset_type {
        "integer" | "int" | "byte" | "short" | "long" | "Bigint" => "integer",
        "number" | "float" | "double" => "number",
        "boolean" | "bool" => "boolean",
        "array" | "list" | "tuple" | "ArrayList" | "Array" | "Queue" | "Stack" => "array",
        "object" | "dict" | "HashMap" | "Hashtable" => "object",
        _ => "string",
    }
}

/// Cast a declaration to the OpenAPI dialect: `.` in names becomes `_`, the
/// top-level parameter type is `object` and every nested type is mapped.
pub fn cast_to_openapi(declaration: &ToolDeclaration) -> ToolDeclaration {
    let mut parameters = match &declaration.parameters {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    parameters.insert("type".to_string(), Value::String("object".to_string()));
    if let Some(properties) = parameters
        .get_mut("properties")
        .and_then(Value::as_object_mut)
    {
        for schema in properties.values_mut() {
            cast_schema(schema);
        }
    } else {
        parameters.insert("properties".to_string(), Value::Object(Map::new()));
    }

    ToolDeclaration {
        name: declaration.name.replace('.', "_"),
        description: declaration.description.clone(),
        parameters: Value::Object(parameters),
    }
}

fn cast_schema(schema: &mut Value) {
    let Some(map) = schema.as_object_mut() else {
        return;
    };
    if let Some(mapped) = map
        .get("type")
        .and_then(Value::as_str)
        .map(openapi_type)
    {
        map.insert("type".to_string(), Value::String(mapped.to_string()));
    }
    if let Some(properties) = map.get_mut("properties").and_then(Value::as_object_mut) {
        for nested in properties.values_mut() {
            cast_schema(nested);
        }
    }
    if let Some(items) = map.get_mut("items") {
        cast_schema(items);
    }
}

/// Keys Gemini's schema validator rejects
const GEMINI_UNSUPPORTED_KEYS: &[&str] = &["optional", "additionalProperties"];

/// Gemini cleanup: fold `default` into the description and drop unsupported keys
pub fn gemini_cleanup(parameters: &Value) -> Value {
    let mut parameters = parameters.clone();
    clean_schema(&mut parameters);
    parameters
}

fn clean_schema(schema: &mut Value) {
    let Some(map) = schema.as_object_mut() else {
        return;
    };
    for key in GEMINI_UNSUPPORTED_KEYS {
        map.remove(*key);
    }
    if let Some(default) = map.remove("default") {
        let rendered = match &default {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let description = map
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let description = append_sentence(description, &format!("Default value: {rendered}."));
        map.insert("description".to_string(), Value::String(description));
    }
    if let Some(properties) = map.get_mut("properties").and_then(Value::as_object_mut) {
        for nested in properties.values_mut() {
            clean_schema(nested);
        }
    }
    if let Some(items) = map.get_mut("items") {
        clean_schema(items);
    }
}

fn append_sentence(base: &str, sentence: &str) -> String {
    let base = base.trim_end();
    if base.is_empty() {
        sentence.to_string()
    } else {
        format!("{base} {sentence}")
    }
}
