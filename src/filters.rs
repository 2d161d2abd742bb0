use crate::config::Config;
use crate::defaults::DefaultsFile;
use crate::mcp::errors::ToolError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilter {
    pub reference: String,
    pub path: PathBuf,
    /// Set when the execute bit had to be added before use.
    pub made_executable: bool,
}

impl ResolvedFilter {
    pub fn file_name(&self) -> String {
        crate::defaults::display_name(&self.path)
    }
}

/// Resolves every filter reference in caller order. The first unresolvable
/// reference aborts the whole request.
pub fn resolve_all(
    references: &[String],
    defaults: Option<&DefaultsFile>,
    config: &Config,
) -> Result<Vec<ResolvedFilter>, ToolError> {
    let defaults_dir = defaults.and_then(DefaultsFile::dir);
    references
        .iter()
        .map(|reference| resolve(reference, defaults_dir, config))
        .collect()
}

pub fn resolve(
    reference: &str,
    defaults_dir: Option<&Path>,
    config: &Config,
) -> Result<ResolvedFilter, ToolError> {
    resolve_with(reference, defaults_dir, config, ensure_executable)
}

fn resolve_with(
    reference: &str,
    defaults_dir: Option<&Path>,
    config: &Config,
    make_executable: impl Fn(&Path) -> io::Result<bool>,
) -> Result<ResolvedFilter, ToolError> {
    for candidate in candidates(reference, defaults_dir, config) {
        if !candidate.is_file() {
            continue;
        }
        let made_executable = match make_executable(&candidate) {
            Ok(changed) => changed,
            Err(err) => {
                warn!(
                    filter = %candidate.display(),
                    "could not make filter executable: {err}"
                );
                continue;
            }
        };
        if made_executable {
            info!(filter = %candidate.display(), "made filter executable");
        }
        info!(filter = %candidate.display(), "using filter");
        return Ok(ResolvedFilter {
            reference: reference.to_string(),
            path: candidate,
            made_executable,
        });
    }
    Err(ToolError::FilterNotFound(reference.to_string()))
}

/// Search order for a filter reference: the working directory, the directory
/// of the defaults file, then the user filter directory by base name only.
pub fn candidates(reference: &str, defaults_dir: Option<&Path>, config: &Config) -> Vec<PathBuf> {
    let path = Path::new(reference);
    if path.is_absolute() {
        return vec![path.to_path_buf()];
    }

    let mut candidates = vec![config.working_dir.join(path)];
    if let Some(dir) = defaults_dir {
        candidates.push(dir.join(path));
    }
    if let (Some(dir), Some(name)) = (&config.user_filter_dir, path.file_name()) {
        candidates.push(dir.join(name));
    }
    candidates
}

#[cfg(unix)]
fn ensure_executable(path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    if mode & 0o111 != 0 {
        return Ok(false);
    }
    permissions.set_mode(mode | 0o111);
    fs::set_permissions(path, permissions)?;
    Ok(true)
}

#[cfg(not(unix))]
fn ensure_executable(path: &Path) -> io::Result<bool> {
    fs::metadata(path).map(|_| false)
}
