use anyhow::{Context, Result};
use clap::Args;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENGINE: &str = "pandoc";

#[derive(Args, Clone, Debug)]
pub struct EngineArgs {
    /// Pandoc executable name or path
    #[arg(long = "pandoc", env = "MCP_PANDOC_ENGINE", default_value = DEFAULT_ENGINE)]
    pub program: String,
    /// Base directory for relative paths (defaults to the current directory)
    #[arg(long)]
    pub working_dir: Option<PathBuf>,
    /// User filter directory searched last (defaults to ~/.pandoc/filters)
    #[arg(long, env = "MCP_PANDOC_FILTER_DIR")]
    pub filter_dir: Option<PathBuf>,
}

/// Settings handed to every tool call. Nothing here is read from the
/// process environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub program: String,
    pub working_dir: PathBuf,
    pub user_filter_dir: Option<PathBuf>,
    /// `PATH` as it was at startup; the engine program is looked up here.
    pub search_path: Option<OsString>,
}

impl Config {
    pub fn from_args(args: EngineArgs) -> Result<Self> {
        let cwd = env::current_dir().context("failed to read current directory")?;
        let working_dir = match args.working_dir {
            Some(dir) => cwd.join(dir),
            None => cwd,
        };
        let user_filter_dir = args.filter_dir.or_else(default_filter_dir);
        Ok(Self {
            program: args.program,
            working_dir,
            user_filter_dir,
            search_path: env::var_os("PATH"),
        })
    }

    /// Anchors a request path at the working directory.
    pub fn absolute(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

fn default_filter_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pandoc").join("filters"))
}
