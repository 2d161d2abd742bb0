use crate::config::Config;
use crate::mcp::contracts::{ADVANCED_FORMATS, ARGUMENT_NAMES, SUPPORTED_FORMATS};
use crate::mcp::errors::ToolError;
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markdown,
    Html,
    Pdf,
    Docx,
    Rst,
    Latex,
    Epub,
    Txt,
    Ipynb,
    Odt,
}

impl Format {
    fn parse(field: &str, value: &str) -> Result<Self, ToolError> {
        match value.trim().to_lowercase().as_str() {
            "markdown" => Ok(Format::Markdown),
            "html" => Ok(Format::Html),
            "pdf" => Ok(Format::Pdf),
            "docx" => Ok(Format::Docx),
            "rst" => Ok(Format::Rst),
            "latex" => Ok(Format::Latex),
            "epub" => Ok(Format::Epub),
            "txt" => Ok(Format::Txt),
            "ipynb" => Ok(Format::Ipynb),
            "odt" => Ok(Format::Odt),
            other => Err(ToolError::invalid(format!(
                "Unsupported {field}: '{other}'. Supported formats are: {}",
                SUPPORTED_FORMATS.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Markdown => "markdown",
            Format::Html => "html",
            Format::Pdf => "pdf",
            Format::Docx => "docx",
            Format::Rst => "rst",
            Format::Latex => "latex",
            Format::Epub => "epub",
            Format::Txt => "txt",
            Format::Ipynb => "ipynb",
            Format::Odt => "odt",
        }
    }

    pub fn is_advanced(&self) -> bool {
        ADVANCED_FORMATS.contains(&self.as_str())
    }

    /// Name passed to pandoc's `--from`. Handed over unchanged, so pandoc
    /// itself rejects formats it has no reader for (pdf, txt).
    pub fn reader_name(&self) -> &'static str {
        self.as_str()
    }

    /// Name passed to pandoc's `--to`.
    pub fn writer_name(&self) -> &'static str {
        match self {
            Format::Txt => "plain",
            // pandoc renders pdf through latex, picking the pdf engine from the output extension
            Format::Pdf => "latex",
            other => other.as_str(),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Markdown => "text/markdown",
            Format::Html => "text/html",
            Format::Pdf => "application/pdf",
            Format::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Format::Rst => "text/x-rst",
            Format::Latex => "application/x-latex",
            Format::Epub => "application/epub+zip",
            Format::Txt => "text/plain",
            Format::Ipynb => "application/x-ipynb+json",
            Format::Odt => "application/vnd.oasis.opendocument.text",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Contents(String),
    File(PathBuf),
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::Contents(_) => "contents",
            Source::File(_) => "file",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source: Source,
    /// `None` when the caller did not name a format, letting pandoc infer it
    /// from the input file's extension.
    pub input_format: Option<Format>,
    pub output_format: Format,
    pub output_file: Option<PathBuf>,
    pub reference_doc: Option<PathBuf>,
    pub filters: Vec<String>,
    pub defaults_file: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn reader(&self) -> Format {
        self.input_format.unwrap_or(Format::Markdown)
    }
}

/// Maps raw tool arguments onto a [`ConversionRequest`], rejecting anything
/// the conversion could not run with. Paths come back anchored at the
/// configured working directory.
pub fn parse_request(args: &Value, config: &Config) -> Result<ConversionRequest, ToolError> {
    let obj = args
        .as_object()
        .ok_or_else(|| ToolError::invalid("arguments must be an object"))?;

    if let Some(unknown) = obj
        .keys()
        .find(|key| !ARGUMENT_NAMES.contains(&key.as_str()))
    {
        return Err(ToolError::invalid(format!("unknown argument: {unknown}")));
    }

    let contents = optional_string(obj, "contents")?.filter(|text| !text.is_empty());
    let input_file = optional_path(obj, "input_file")?;

    let source = match (contents, input_file) {
        (None, None) => {
            return Err(ToolError::invalid(
                "Either 'contents' or 'input_file' must be provided",
            ));
        }
        (Some(_), Some(_)) => {
            return Err(ToolError::invalid(
                "'contents' and 'input_file' cannot both be provided",
            ));
        }
        (Some(text), None) => Source::Contents(text.to_string()),
        (None, Some(path)) => Source::File(config.absolute(path)),
    };

    let input_format = optional_string(obj, "input_format")?
        .map(|value| Format::parse("input format", value))
        .transpose()?;
    let output_format = match optional_string(obj, "output_format")? {
        Some(value) => Format::parse("output format", value)?,
        None => Format::Markdown,
    };

    let output_file = optional_path(obj, "output_file")?.map(|path| config.absolute(path));
    if output_format.is_advanced() && output_file.is_none() {
        return Err(ToolError::invalid(format!(
            "output_file path is required for {output_format} format"
        )));
    }

    let reference_doc = optional_path(obj, "reference_doc")?.map(|path| config.absolute(path));
    if let Some(reference_doc) = &reference_doc {
        if output_format != Format::Docx {
            return Err(ToolError::invalid(
                "reference_doc parameter is only supported for docx output format",
            ));
        }
        if !reference_doc.exists() {
            return Err(ToolError::ReferenceDocNotFound(reference_doc.clone()));
        }
    }

    let filters = parse_filters(obj.get("filters"))?;
    let defaults_file = optional_path(obj, "defaults_file")?.map(|path| config.absolute(path));

    Ok(ConversionRequest {
        source,
        input_format,
        output_format,
        output_file,
        reference_doc,
        filters,
        defaults_file,
    })
}

fn optional_string<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a str>, ToolError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(ToolError::invalid(format!("{field} must be a string"))),
    }
}

fn optional_path<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a str>, ToolError> {
    let Some(path) = optional_string(obj, field)? else {
        return Ok(None);
    };
    if path.trim().is_empty() {
        return Err(ToolError::invalid(format!("{field} must not be empty")));
    }
    Ok(Some(path))
}

fn parse_filters(value: Option<&Value>) -> Result<Vec<String>, ToolError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ToolError::invalid(
                "filters parameter must be an array of strings",
            ));
        }
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ToolError::invalid("Each filter must be a string path"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::errors;
    use serde_json::json;
    use std::fs::File;
    use tempfile::tempdir;

    fn config() -> Config {
        Config {
            program: "pandoc".to_string(),
            working_dir: PathBuf::from("/work"),
            user_filter_dir: None,
            search_path: None,
        }
    }

    #[test]
    fn contents_defaults_to_markdown() {
        let args = json!({"contents": "# Hello"});
        let request = parse_request(&args, &config()).expect("request");
        assert_eq!(request.source, Source::Contents("# Hello".to_string()));
        assert_eq!(request.input_format, None);
        assert_eq!(request.reader(), Format::Markdown);
        assert_eq!(request.output_format, Format::Markdown);
        assert!(request.filters.is_empty());
    }

    #[test]
    fn missing_input() {
        let err = parse_request(&json!({"output_format": "html"}), &config()).expect_err("error");
        assert_eq!(err.kind(), errors::INVALID_REQUEST);
        assert!(err.to_string().contains("input_file"));
    }

    #[test]
    fn empty_contents_counts_as_missing() {
        let err = parse_request(&json!({"contents": ""}), &config()).expect_err("error");
        assert_eq!(err.kind(), errors::INVALID_REQUEST);
    }

    #[test]
    fn both_inputs_present() {
        let args = json!({"contents": "hi", "input_file": "notes.md"});
        let err = parse_request(&args, &config()).expect_err("error");
        assert_eq!(err.kind(), errors::INVALID_REQUEST);
    }

    #[test]
    fn unsupported_output_format_lists_supported_set() {
        let args = json!({"contents": "hi", "output_format": "pptx"});
        let err = parse_request(&args, &config()).expect_err("error");
        assert_eq!(err.kind(), errors::INVALID_REQUEST);
        let message = err.to_string();
        assert!(message.contains("pptx"));
        for format in SUPPORTED_FORMATS {
            assert!(message.contains(format), "{format} missing from {message}");
        }
    }

    #[test]
    fn formats_are_case_insensitive() {
        let args = json!({"contents": "hi", "input_format": "HTML", "output_format": "Txt"});
        let request = parse_request(&args, &config()).expect("request");
        assert_eq!(request.input_format, Some(Format::Html));
        assert_eq!(request.output_format, Format::Txt);
    }

    #[test]
    fn advanced_formats_require_output_file() {
        for format in ADVANCED_FORMATS {
            let args = json!({"contents": "hi", "output_format": format});
            let err = parse_request(&args, &config()).expect_err("error");
            assert_eq!(err.kind(), errors::INVALID_REQUEST);
            assert!(err.to_string().contains("output_file"));
        }
    }

    #[test]
    fn relative_paths_are_anchored() {
        let args = json!({
            "input_file": "docs/in.md",
            "output_format": "pdf",
            "output_file": "out/report.pdf"
        });
        let request = parse_request(&args, &config()).expect("request");
        assert_eq!(request.source, Source::File(PathBuf::from("/work/docs/in.md")));
        assert_eq!(
            request.output_file,
            Some(PathBuf::from("/work/out/report.pdf"))
        );
    }

    #[test]
    fn reference_doc_requires_docx() {
        let args = json!({
            "contents": "hi",
            "output_format": "html",
            "reference_doc": "/tmp/ref.docx"
        });
        let err = parse_request(&args, &config()).expect_err("error");
        assert_eq!(err.kind(), errors::INVALID_REQUEST);
        assert!(err.to_string().contains("docx"));
    }

    #[test]
    fn reference_doc_must_exist() {
        let args = json!({
            "contents": "hi",
            "output_format": "docx",
            "output_file": "/tmp/out.docx",
            "reference_doc": "/tmp/definitely-missing-reference.docx"
        });
        let err = parse_request(&args, &config()).expect_err("error");
        assert_eq!(err.kind(), errors::REFERENCE_DOC_NOT_FOUND);
    }

    #[test]
    fn reference_doc_accepted_for_docx() {
        let dir = tempdir().expect("tempdir");
        let reference = dir.path().join("ref.docx");
        File::create(&reference).expect("file");
        let args = json!({
            "contents": "hi",
            "output_format": "docx",
            "output_file": dir.path().join("out.docx").to_string_lossy(),
            "reference_doc": reference.to_string_lossy()
        });
        let request = parse_request(&args, &config()).expect("request");
        assert_eq!(request.reference_doc, Some(reference));
    }

    #[test]
    fn filters_must_be_strings() {
        let args = json!({"contents": "hi", "filters": ["a.py", 3]});
        let err = parse_request(&args, &config()).expect_err("error");
        assert_eq!(err.kind(), errors::INVALID_REQUEST);

        let args = json!({"contents": "hi", "filters": "a.py"});
        let err = parse_request(&args, &config()).expect_err("error");
        assert_eq!(err.kind(), errors::INVALID_REQUEST);
    }

    #[test]
    fn filters_keep_caller_order() {
        let args = json!({"contents": "hi", "filters": ["b.py", "a.py", "c.lua"]});
        let request = parse_request(&args, &config()).expect("request");
        assert_eq!(request.filters, vec!["b.py", "a.py", "c.lua"]);
    }

    #[test]
    fn unknown_argument() {
        let args = json!({"contents": "hi", "to": "html"});
        let err = parse_request(&args, &config()).expect_err("error");
        assert_eq!(err.kind(), errors::INVALID_REQUEST);
        assert!(err.to_string().contains("to"));
    }

    #[test]
    fn wrong_field_type() {
        let args = json!({"contents": 42});
        let err = parse_request(&args, &config()).expect_err("error");
        assert_eq!(err.to_string(), "contents must be a string");
    }
}
