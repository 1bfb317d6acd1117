use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `functionCall` part payload. Gemini may send an empty object here, so both
/// fields default; callers decide whether a call is really present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub args: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl FunctionCall {
    pub fn is_present(&self) -> bool {
        !self.name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallingConfig {
    pub mode: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "allowedFunctionNames"
    )]
    pub allowed_function_names: Option<Vec<String>>,
}

impl FunctionCallingConfig {
    pub fn auto() -> Self {
        Self {
            mode: "AUTO".to_string(),
            allowed_function_names: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_call_object_is_absent() {
        let call: FunctionCall = serde_json::from_value(json!({})).expect("deserialize");
        assert!(!call.is_present());
    }

    #[test]
    fn args_keep_wire_order() {
        let call: FunctionCall =
            serde_json::from_str(r#"{"name":"f","args":{"b":1,"a":2}}"#).expect("deserialize");
        let keys: Vec<_> = call.args.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
