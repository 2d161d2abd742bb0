use serde_json::json;

pub mod contracts;
pub mod errors;

pub fn tool_definitions() -> Vec<serde_json::Value> {
    vec![json!({
        "name": contracts::TOOL_CONVERT_CONTENTS,
        "description": contracts::CONVERT_CONTENTS_DESCRIPTION,
        "inputSchema": contracts::convert_contents_schema()
    })]
}
