use crate::defaults::{self, DefaultsFile};
use crate::engine::{EngineError, Invocation};
use crate::filters::{self, ResolvedFilter};
use crate::input::{ConversionRequest, Format, Source, parse_request};
use crate::mcp::errors::ToolError;
use crate::tools::{ToolContext, error_result};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

pub const SAVE_ADVISORY: &str = "Ask user if they expect to save this file. If so, provide the output_file parameter with complete path.";

pub fn call(args: &Value, ctx: &ToolContext<'_>) -> Value {
    let request = match parse_request(args, ctx.config) {
        Ok(request) => request,
        Err(err) => return error_result(err.kind(), err.to_string(), None),
    };

    let source = match &request.source {
        Source::Contents(_) => "contents".to_string(),
        Source::File(path) => format!("path:{}", path.display()),
    };

    match convert(&request, ctx) {
        Ok(conversion) => conversion.into_result(),
        Err(err) => error_result(err.kind(), err.to_string(), Some(source.as_str())),
    }
}

/// Outcome of a successful conversion.
#[derive(Debug)]
pub enum Conversion {
    Saved {
        origin: &'static str,
        format: Format,
        path: PathBuf,
        filters: Vec<ResolvedFilter>,
        defaults_file: Option<DefaultsFile>,
    },
    Inline {
        format: Format,
        text: String,
        filters: Vec<ResolvedFilter>,
        defaults_file: Option<DefaultsFile>,
    },
}

pub fn convert(request: &ConversionRequest, ctx: &ToolContext<'_>) -> Result<Conversion, ToolError> {
    let defaults = request
        .defaults_file
        .as_deref()
        .map(|path| defaults::load(path, request.output_format))
        .transpose()?;
    let resolved = filters::resolve_all(&request.filters, defaults.as_ref(), ctx.config)?;

    if let Source::File(path) = &request.source
        && !path.exists()
    {
        return Err(ToolError::InputFileNotFound(path.clone()));
    }

    let invocation = Invocation::for_request(request, defaults.as_ref(), &resolved);
    let stdout = ctx
        .engine
        .run(&invocation)
        .map_err(|err| engine_failure(err, request, defaults.as_ref(), &resolved))?;

    if let Some(path) = &request.output_file {
        return Ok(Conversion::Saved {
            origin: request.source.label(),
            format: request.output_format,
            path: path.clone(),
            filters: resolved,
            defaults_file: defaults,
        });
    }

    let text = String::from_utf8(stdout).map_err(|_| ToolError::ConversionFailed {
        origin: request.source.label(),
        from: reader_label(request).to_string(),
        to: request.output_format.to_string(),
        context: String::new(),
        details: format!(
            "{} output is binary; provide output_file to save it",
            request.output_format
        ),
    })?;
    if text.trim().is_empty() {
        return Err(ToolError::EmptyOutput);
    }

    Ok(Conversion::Inline {
        format: request.output_format,
        text,
        filters: resolved,
        defaults_file: defaults,
    })
}

impl Conversion {
    pub fn message(&self) -> String {
        match self {
            Conversion::Saved {
                origin,
                path,
                filters,
                defaults_file,
                ..
            } => {
                let subject = if *origin == "file" { "File" } else { "Content" };
                let mut message = format!("{subject} successfully converted");
                if !filters.is_empty() {
                    message.push_str(&format!(" with filters: {}", filter_names(filters)));
                }
                if let Some(defaults) = defaults_file {
                    message.push_str(&format!(" using defaults file: {}", defaults.file_name()));
                }
                message.push_str(&format!(" and saved to: {}", path.display()));
                message
            }
            Conversion::Inline {
                format,
                text,
                filters,
                defaults_file,
            } => {
                let mut header = format!("Following are the converted contents in {format} format");
                if !filters.is_empty() {
                    header.push_str(&format!(" (with filters: {})", filter_names(filters)));
                }
                if let Some(defaults) = defaults_file {
                    header.push_str(&format!(" (using defaults file: {})", defaults.file_name()));
                }
                format!("{header}.\n{SAVE_ADVISORY}\nConverted Contents:\n\n{text}")
            }
        }
    }

    pub fn into_result(self) -> Value {
        let text = self.message();
        match self {
            Conversion::Saved {
                format,
                path,
                filters,
                defaults_file,
                ..
            } => {
                let path = path.display().to_string();
                let uri = format!("file://{path}");
                let name = Path::new(&path)
                    .file_name()
                    .and_then(|value| value.to_str())
                    .unwrap_or("converted")
                    .to_string();
                json!({
                    "content": [
                        {"type": "text", "text": text},
                        {
                            "type": "resource_link",
                            "uri": uri,
                            "name": name,
                            "mimeType": format.mime_type()
                        }
                    ],
                    "structuredContent": {
                        "format": format.as_str(),
                        "path": path,
                        "uri": uri,
                        "filters": filters_json(&filters),
                        "defaults_file": defaults_json(defaults_file.as_ref())
                    },
                    "isError": false
                })
            }
            Conversion::Inline {
                format,
                text: converted,
                filters,
                defaults_file,
            } => json!({
                "content": [{"type": "text", "text": text}],
                "structuredContent": {
                    "format": format.as_str(),
                    "text": converted,
                    "filters": filters_json(&filters),
                    "defaults_file": defaults_json(defaults_file.as_ref())
                },
                "isError": false
            }),
        }
    }
}

fn filter_names(filters: &[ResolvedFilter]) -> String {
    filters
        .iter()
        .map(ResolvedFilter::file_name)
        .collect::<Vec<_>>()
        .join(", ")
}

// Filters and defaults are reported by base name; only the output path is shown in full.
fn filters_json(filters: &[ResolvedFilter]) -> Value {
    filters
        .iter()
        .map(|filter| {
            json!({
                "reference": filter.reference,
                "name": filter.file_name(),
                "made_executable": filter.made_executable
            })
        })
        .collect()
}

fn defaults_json(defaults: Option<&DefaultsFile>) -> Value {
    match defaults {
        Some(defaults) => json!({
            "name": defaults.file_name(),
            "declared_output": defaults.declared_output
        }),
        None => Value::Null,
    }
}

fn reader_label(request: &ConversionRequest) -> &'static str {
    match (&request.source, request.input_format) {
        (Source::File(_), None) => "auto",
        _ => request.reader().as_str(),
    }
}

fn engine_failure(
    error: EngineError,
    request: &ConversionRequest,
    defaults: Option<&DefaultsFile>,
    filters: &[ResolvedFilter],
) -> ToolError {
    let details = match error {
        EngineError::NotFound { program } => return ToolError::EngineNotFound { program },
        EngineError::Failed { stderr, status } if stderr.is_empty() => status.to_string(),
        EngineError::Failed { stderr, .. } => stderr,
        EngineError::Io(err) => err.to_string(),
    };

    let mut in_play = Vec::new();
    if !filters.is_empty() {
        in_play.push(format!("filters: {}", filter_names(filters)));
    }
    if let Some(defaults) = defaults {
        in_play.push(format!("defaults file: {}", defaults.path.display()));
    }
    let context = if in_play.is_empty() {
        String::new()
    } else {
        format!(" ({})", in_play.join("; "))
    };

    ToolError::ConversionFailed {
        origin: request.source.label(),
        from: reader_label(request).to_string(),
        to: request.output_format.to_string(),
        context,
        details,
    }
}
