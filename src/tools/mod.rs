use crate::config::Config;
use crate::engine::Engine;
use serde_json::json;

pub mod convert_contents;

/// What a tool call gets to work with. Built once at startup and shared by
/// every call.
pub struct ToolContext<'a> {
    pub config: &'a Config,
    pub engine: &'a dyn Engine,
}

pub fn error_result(
    kind: &'static str,
    message: impl Into<String>,
    source: Option<&str>,
) -> serde_json::Value {
    let message = message.into();
    let mut error = json!({
        "kind": kind,
        "message": message,
    });

    if let Some(source) = source
        && let Some(obj) = error.as_object_mut()
    {
        obj.insert("source".to_string(), json!(source));
    }

    json!({
        "content": [{"type": "text", "text": format!("Error: {message}")}],
        "structuredContent": {"error": error},
        "isError": true
    })
}
