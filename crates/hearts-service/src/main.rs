#![deny(warnings)]
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;

use hearts_service::config::ServiceConfig;
use hearts_service::handler::Handler;
use hearts_service::logging::init_logging;
use hearts_service::protocol::{ErrorCode, Response};

/// Hearts move-decision service.
#[derive(Debug, Parser)]
#[command(
    name = "hearts-ai",
    author,
    version,
    about = "Monte Carlo move selection for Hearts over a JSON protocol"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the RNG seed used for every request.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the tracing level (trace, debug, info, warn, error).
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Emit JSON log lines regardless of config.
    #[arg(long)]
    structured_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer one `/api/move` request read from FILE or stdin.
    Move {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Answer one `/api/play-one` request read from FILE or stdin.
    PlayOne {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Answer newline-delimited requests on stdin, one response per line.
    ServeLines,
    /// Print the health response.
    Health,
    /// Load and validate the configuration, then exit.
    ValidateConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_path(path)?,
        None => ServiceConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }

    if let Some(level) = cli.log_level {
        config.logging.tracing_level = level;
    }

    if cli.structured_logs {
        config.logging.structured = true;
    }

    config.validate()?;

    if let Command::ValidateConfig = cli.command {
        println!(
            "Configuration valid: move uses {} simulations over {} worlds ({}), play-one uses {} over {}",
            config.defaults.simulations,
            config.defaults.worlds,
            config.defaults.player_type,
            config.play_one.simulations,
            config.play_one.worlds
        );
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging)?;
    let handler = Handler::new(config);

    match cli.command {
        Command::Move { input } => {
            let body = read_body(input)?;
            println!("{}", handler.handle_move(&body).to_json());
        }
        Command::PlayOne { input } => {
            let body = read_body(input)?;
            println!("{}", handler.handle_play_one(&body).to_json());
        }
        Command::ServeLines => serve_lines(&handler)?,
        Command::Health => println!("{}", handler.health().to_json()),
        Command::ValidateConfig => {}
    }

    Ok(())
}

fn read_body(input: Option<PathBuf>) -> anyhow::Result<String> {
    match input {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("reading request from {}", path.display())),
        None => {
            let mut body = String::new();
            io::stdin()
                .read_to_string(&mut body)
                .context("reading request from stdin")?;
            Ok(body)
        }
    }
}

/// Each line is `{"endpoint": "move" | "play-one" | "health", ...request}`;
/// a missing endpoint means `move`.
fn serve_lines(handler: &Handler) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading request line")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = route_line(handler, &line);
        writeln!(out, "{}", response.to_json()).context("writing response")?;
        out.flush().context("flushing response")?;
    }
    Ok(())
}

fn route_line(handler: &Handler, line: &str) -> Response {
    let endpoint = match serde_json::from_str::<Value>(line) {
        Ok(value) => value
            .get("endpoint")
            .and_then(Value::as_str)
            .unwrap_or("move")
            .to_string(),
        Err(err) => return Response::error(ErrorCode::ParseError, format!("invalid JSON: {err}")),
    };
    match endpoint.as_str() {
        "move" | "/api/move" => handler.handle_move(line),
        "play-one" | "/api/play-one" => handler.handle_play_one(line),
        "health" | "/health" => handler.health(),
        other => Response::error(
            ErrorCode::ParseError,
            format!("unknown endpoint '{other}'"),
        ),
    }
}
