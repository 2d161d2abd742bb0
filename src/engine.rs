use crate::config::Config;
use crate::defaults::DefaultsFile;
use crate::filters::ResolvedFilter;
use crate::input::{ConversionRequest, Format, Source};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use thiserror::Error;
use tracing::debug;

pub const OUTPUT_DIR_VAR: &str = "PANDOC_OUTPUT_DIR";
pub const PDF_ENGINE: &str = "xelatex";
pub const PDF_MARGIN: &str = "geometry:margin=1in";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("pandoc executable not found: {program}")]
    NotFound { program: String },
    #[error("failed to run pandoc: {0}")]
    Io(#[from] io::Error),
    #[error("pandoc exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

/// One call to the conversion engine. Built per request and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub source: Source,
    pub from: Option<&'static str>,
    pub to: &'static str,
    pub output: Option<PathBuf>,
    pub extra_args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn for_request(
        request: &ConversionRequest,
        defaults: Option<&DefaultsFile>,
        filters: &[ResolvedFilter],
    ) -> Self {
        // Files without an explicit format are left to pandoc's extension sniffing.
        let from = match &request.source {
            Source::Contents(_) => Some(request.reader().reader_name()),
            Source::File(_) => request.input_format.map(|format| format.reader_name()),
        };

        let env = request
            .output_file
            .as_ref()
            .and_then(|path| path.parent())
            .map(|dir| vec![(OUTPUT_DIR_VAR.to_string(), dir.display().to_string())])
            .unwrap_or_default();

        Self {
            source: request.source.clone(),
            from,
            to: request.output_format.writer_name(),
            output: request.output_file.clone(),
            extra_args: extra_args(request, defaults, filters),
            env,
        }
    }

    /// Full argument list handed to the engine executable.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if let Some(from) = self.from {
            args.push(format!("--from={from}").into());
        }
        args.push(format!("--to={}", self.to).into());
        args.extend(self.extra_args.iter().map(OsString::from));
        if let Some(output) = &self.output {
            let mut flag = OsString::from("--output=");
            flag.push(output);
            args.push(flag);
        }
        if let Source::File(path) = &self.source {
            args.push(path.into());
        }
        args
    }
}

/// Engine flags in the order pandoc receives them: defaults file, filters,
/// pdf settings, reference document.
pub fn extra_args(
    request: &ConversionRequest,
    defaults: Option<&DefaultsFile>,
    filters: &[ResolvedFilter],
) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(defaults) = defaults {
        args.push("--defaults".to_string());
        args.push(defaults.path.display().to_string());
    }
    for filter in filters {
        args.push("--filter".to_string());
        args.push(filter.path.display().to_string());
    }
    if request.output_format == Format::Pdf {
        args.push(format!("--pdf-engine={PDF_ENGINE}"));
        args.push("-V".to_string());
        args.push(PDF_MARGIN.to_string());
    }
    if let Some(reference_doc) = &request.reference_doc
        && request.output_format == Format::Docx
    {
        args.push("--reference-doc".to_string());
        args.push(reference_doc.display().to_string());
    }
    args
}

pub trait Engine {
    /// Runs one conversion and returns whatever the engine wrote to stdout.
    fn run(&self, invocation: &Invocation) -> Result<Vec<u8>, EngineError>;
}

/// The pandoc executable, run as a child process.
#[derive(Debug, Clone)]
pub struct Pandoc {
    program: String,
    working_dir: PathBuf,
    search_path: Option<OsString>,
}

impl Pandoc {
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.program.clone(),
            working_dir: config.working_dir.clone(),
            search_path: config.search_path.clone(),
        }
    }

    fn locate(&self) -> Result<PathBuf, EngineError> {
        which::which_in(&self.program, self.search_path.as_ref(), &self.working_dir).map_err(
            |_| EngineError::NotFound {
                program: self.program.clone(),
            },
        )
    }
}

impl Engine for Pandoc {
    fn run(&self, invocation: &Invocation) -> Result<Vec<u8>, EngineError> {
        let program = self.locate()?;
        let args = invocation.args();
        debug!(program = %program.display(), ?args, "invoking pandoc");

        let stdin = match invocation.source {
            Source::Contents(_) => Stdio::piped(),
            Source::File(_) => Stdio::null(),
        };
        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(&self.working_dir)
            .envs(invocation.env.iter().map(|(key, value)| (key, value)))
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => EngineError::NotFound {
                    program: self.program.clone(),
                },
                _ => EngineError::Io(err),
            })?;

        // Feed stdin from another thread so a large output cannot stall the pipe.
        let writer = match (&invocation.source, child.stdin.take()) {
            (Source::Contents(text), Some(mut pipe)) => {
                let text = text.clone();
                Some(thread::spawn(move || pipe.write_all(text.as_bytes())))
            }
            _ => None,
        };

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(EngineError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| io::Error::other("stdin writer panicked"))??;
        }
        Ok(output.stdout)
    }
}
