use crate::input::Format;
use crate::mcp::errors::ToolError;
use serde_yaml::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A pandoc defaults file that has been read and checked to be a mapping.
#[derive(Debug, Clone)]
pub struct DefaultsFile {
    pub path: PathBuf,
    /// The file's own `to` entry, kept for reporting only.
    pub declared_output: Option<String>,
}

impl DefaultsFile {
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }

    pub fn dir(&self) -> Option<&Path> {
        self.path.parent()
    }
}

pub fn load(path: &Path, requested: Format) -> Result<DefaultsFile, ToolError> {
    let raw = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ToolError::DefaultsFileNotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => ToolError::InvalidDefaultsFile {
            path: path.to_path_buf(),
            reason: "permission denied".to_string(),
        },
        _ => ToolError::InvalidDefaultsFile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
    })?;

    let parsed: Value = serde_yaml::from_str(&raw).map_err(|err| ToolError::InvalidDefaultsFile {
        path: path.to_path_buf(),
        reason: format!("YAML parse error: {err}"),
    })?;

    let Value::Mapping(mapping) = parsed else {
        return Err(ToolError::InvalidDefaultsFile {
            path: path.to_path_buf(),
            reason: "must be a YAML dictionary".to_string(),
        });
    };

    let declared_output = mapping.get("to").map(scalar_to_string);
    if let Some(declared) = &declared_output
        && declared != requested.as_str()
    {
        warn!(
            defaults_file = %path.display(),
            "defaults file specifies output format '{declared}' but requested format is '{requested}'; using requested format"
        );
    }

    Ok(DefaultsFile {
        path: path.to_path_buf(),
        declared_output,
    })
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim().to_string())
            .unwrap_or_default(),
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
