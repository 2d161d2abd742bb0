use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

#[test]
fn tools_list_declares_convert_contents() -> Result<(), Box<dyn std::error::Error>> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mcp-pandoc"))
        .args(["serve", "--stdio"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let mut stdin = child.stdin.take().expect("stdin available");
    let mut stdout = BufReader::new(child.stdout.take().expect("stdout available"));

    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/list",
        "params": {}
    });
    let serialized = serde_json::to_string(&request)?;
    writeln!(stdin, "{serialized}")?;
    stdin.flush()?;

    let mut line = String::new();
    stdout.read_line(&mut line)?;

    let response: serde_json::Value = serde_json::from_str(line.trim())?;
    let tools = response
        .get("result")
        .and_then(|value| value.get("tools"))
        .and_then(|value| value.as_array())
        .expect("tools array present");

    assert_eq!(tools.len(), 1);
    let tool = &tools[0];
    assert_eq!(
        tool.get("name").and_then(|value| value.as_str()),
        Some("convert-contents")
    );

    let schema = tool.get("inputSchema").expect("schema present");
    assert_eq!(schema["additionalProperties"], false);
    let properties = schema["properties"].as_object().expect("properties");
    for field in [
        "contents",
        "input_file",
        "input_format",
        "output_format",
        "output_file",
        "reference_doc",
        "filters",
        "defaults_file",
    ] {
        assert!(properties.contains_key(field), "{field} missing");
    }

    let formats: Vec<&str> = properties["output_format"]["enum"]
        .as_array()
        .expect("enum")
        .iter()
        .filter_map(|value| value.as_str())
        .collect();
    assert_eq!(
        formats,
        vec!["markdown", "html", "pdf", "docx", "rst", "latex", "epub", "txt", "ipynb", "odt"]
    );
    assert_eq!(properties["filters"]["items"]["type"], "string");

    let _ = child.kill();
    Ok(())
}
