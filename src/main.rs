use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};
use std::io::{self, BufRead, Write};
use std::process;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod defaults;
mod engine;
mod filters;
mod input;
mod mcp;
mod tools;

use config::{Config, EngineArgs};
use engine::Pandoc;
use tools::ToolContext;

#[derive(Parser)]
#[command(name = "mcp-pandoc")]
#[command(
    version,
    about = "Document format conversion through pandoc, exposed as an MCP tool"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
#[command(
    group(
        clap::ArgGroup::new("input")
            .required(true)
            .multiple(false)
            .args(["contents", "input_file"])
    )
)]
struct ConvertArgs {
    /// Text to convert
    #[arg(long)]
    contents: Option<String>,
    /// Path to the file to convert
    #[arg(long)]
    input_file: Option<String>,
    /// Source format (defaults to markdown)
    #[arg(long = "from")]
    input_format: Option<String>,
    /// Target format (defaults to markdown)
    #[arg(long = "to")]
    output_format: Option<String>,
    /// Where to write the result (required for pdf, docx, rst, latex, epub)
    #[arg(long)]
    output_file: Option<String>,
    /// Reference document for docx styling
    #[arg(long)]
    reference_doc: Option<String>,
    /// Pandoc filter to apply; repeat to chain filters in order
    #[arg(long = "filter")]
    filters: Vec<String>,
    /// Pandoc defaults file (YAML)
    #[arg(long)]
    defaults_file: Option<String>,
    /// Output JSON structuredContent
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP stdio server
    Serve {
        /// Serve MCP over stdio (NDJSON)
        #[arg(long)]
        stdio: bool,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Convert a document once and print the tool result
    Convert(ConvertArgs),
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { stdio, engine } => {
            if stdio {
                run_stdio_server(Config::from_args(engine)?)
            } else {
                anyhow::bail!("only --stdio transport is supported")
            }
        }
        Commands::Convert(args) => run_convert(args),
    }
}

fn init_tracing() {
    // stdout carries protocol frames, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "mcp_pandoc=info".into()),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    let config = Config::from_args(args.engine.clone())?;
    let engine = Pandoc::new(&config);
    let ctx = ToolContext {
        config: &config,
        engine: &engine,
    };
    let result = tools::convert_contents::call(&Value::Object(build_convert_args(&args)), &ctx);
    print_tool_result(result, args.json)
}

fn build_convert_args(args: &ConvertArgs) -> Map<String, Value> {
    let mut map = Map::new();
    let fields = [
        ("contents", &args.contents),
        ("input_file", &args.input_file),
        ("input_format", &args.input_format),
        ("output_format", &args.output_format),
        ("output_file", &args.output_file),
        ("reference_doc", &args.reference_doc),
        ("defaults_file", &args.defaults_file),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            map.insert(name.to_string(), json!(value));
        }
    }
    if !args.filters.is_empty() {
        map.insert("filters".to_string(), json!(args.filters));
    }
    map
}

fn print_tool_result(result: Value, json_output: bool) -> Result<()> {
    let is_error = result
        .get("isError")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);

    if is_error {
        let message = result
            .get("structuredContent")
            .and_then(|value| value.get("error"))
            .and_then(|value| value.get("message"))
            .and_then(|value| value.as_str())
            .unwrap_or("tool error");
        eprintln!("{message}");
        process::exit(1);
    }

    if json_output {
        let structured = result
            .get("structuredContent")
            .cloned()
            .unwrap_or_else(|| json!({}));
        let output = serde_json::to_string_pretty(&structured)?;
        println!("{output}");
        return Ok(());
    }

    let text = result
        .get("content")
        .and_then(|value| value.as_array())
        .and_then(|arr| arr.first())
        .and_then(|value| value.get("text"))
        .and_then(|value| value.as_str())
        .unwrap_or("");
    println!("{text}");
    Ok(())
}

fn run_stdio_server(config: Config) -> Result<()> {
    let engine = Pandoc::new(&config);
    let ctx = ToolContext {
        config: &config,
        engine: &engine,
    };
    info!(
        working_dir = %config.working_dir.display(),
        program = %config.program,
        "serving MCP over stdio"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let reader = stdin.lock().lines();
    let mut writer = io::BufWriter::new(stdout.lock());

    for line in reader {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let request: serde_json::Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(err) => {
                warn!("skipping unparseable request: {err}");
                continue;
            }
        };

        let method = request.get("method").and_then(|value| value.as_str());
        let id = request.get("id").cloned();
        let response = match (method, id) {
            (Some("initialize"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": mcp::contracts::PROTOCOL_VERSION,
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }
            })),
            (Some("ping"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {}
            })),
            (Some("tools/list"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "tools": mcp::tool_definitions()
                }
            })),
            (Some("tools/call"), Some(id)) => {
                let result = handle_tool_call(&request, &ctx);
                Some(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": result
                }))
            }
            _ => None,
        };

        if let Some(response) = response {
            let serialized =
                serde_json::to_string(&response).context("failed to serialize response")?;
            writeln!(writer, "{serialized}").context("failed to write response")?;
            writer.flush().context("failed to flush response")?;
        }
    }

    Ok(())
}

fn handle_tool_call(request: &serde_json::Value, ctx: &ToolContext<'_>) -> serde_json::Value {
    let params = request.get("params");
    let Some(params) = params.and_then(|value| value.as_object()) else {
        return tools::error_result(
            mcp::errors::INVALID_REQUEST,
            "params must be an object",
            None,
        );
    };

    let name = params.get("name").and_then(|value| value.as_str());
    let Some(name) = name else {
        return tools::error_result(
            mcp::errors::INVALID_REQUEST,
            "params.name must be a string",
            None,
        );
    };

    let args = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    info!(tool = name, "tool call");
    match name {
        mcp::contracts::TOOL_CONVERT_CONTENTS => tools::convert_contents::call(&args, ctx),
        _ => tools::error_result(
            mcp::errors::INVALID_REQUEST,
            format!("Unknown tool: {name}"),
            Some(name),
        ),
    }
}
