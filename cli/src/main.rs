//! Scratchpad CLI - command-line client for the Scratchpad server
//!
//! Runs Python source, drives the editor panel, and inspects the session

use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scratchpad CLI - run Python in the live editor service
#[derive(Parser)]
#[command(name = "scratchpad")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Scratchpad live Python editor", long_about = None)]
struct Cli {
    /// Scratchpad API URL
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    api_url: String,

    /// Request timeout in seconds; runs wait indefinitely when unset
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run source text (or a file with @ prefix)
    Run {
        /// Code to run (or path to file with @ prefix)
        code: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Show the editor panel
    Editor,

    /// Replace the editor source (or load it from a file with @ prefix)
    Edit {
        /// New source text (or path to file with @ prefix)
        code: String,
    },

    /// Run the editor's current source
    RunEditor,

    /// Restore the editor's default source and clear its output
    Reset,

    /// List built-in examples
    Examples,

    /// Load a built-in example into the editor
    Example {
        /// Example index as shown by `examples`
        index: usize,
    },

    /// Get interpreter session information
    Session,

    /// Show recent runs
    History,

    /// Get server health status
    Health,
}

#[derive(Debug, Serialize)]
struct RunRequest {
    source: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RunResponse {
    run_id: Option<String>,
    status: String,
    output: String,
    duration_ms: u64,
}

#[derive(Debug, Deserialize)]
struct EditorSnapshot {
    source: String,
    output: Option<String>,
    status: String,
    run_state: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    session: Value,
}

/// Read code from a file when the argument starts with @
fn resolve_source(code: String) -> Result<String> {
    match code.strip_prefix('@') {
        Some(file_path) => fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read code file: {}", file_path)),
        None => Ok(code),
    }
}

/// Send a request and fail on non-success status
fn send(request: RequestBuilder, action: &str) -> Result<Response> {
    let response = request
        .send()
        .with_context(|| format!("Failed to {}", action))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().unwrap_or_else(|_| "Unknown error".to_string());
        anyhow::bail!("Request failed ({}): {}", status, error_text);
    }

    Ok(response)
}

fn print_run(result: &RunResponse) {
    println!("{}", "=".repeat(60).bright_blue());
    if let Some(run_id) = &result.run_id {
        println!("{} {}", "Run ID:".bright_cyan(), run_id);
    }
    println!(
        "{} {}",
        "Status:".bright_cyan(),
        if result.status == "success" {
            result.status.green()
        } else if result.status == "error" {
            result.status.red()
        } else {
            result.status.yellow()
        }
    );
    println!("{} {}ms", "Duration:".bright_cyan(), result.duration_ms);
    println!("\n{}", "OUTPUT:".bright_green().bold());
    println!("{}", result.output);
    println!("{}", "=".repeat(60).bright_blue());
}

fn print_editor(editor: &EditorSnapshot) {
    println!("{} {}", "Status:".bright_cyan(), editor.status);
    println!("{} {}", "Run state:".bright_cyan(), editor.run_state);
    println!("\n{}", "editor.py".bright_green().bold());
    println!("{}", editor.source);
    if let Some(output) = &editor.output {
        println!("\n{}", "Output:".bright_green().bold());
        println!("{}", output);
    }
}

/// HTTP client; a run may take as long as the user's program does
fn build_client(timeout: Option<u64>) -> Result<Client> {
    Client::builder()
        .timeout(timeout.map(Duration::from_secs))
        .build()
        .context("Failed to build HTTP client")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = build_client(cli.timeout)?;
    let api = |path: &str| format!("{}{}", cli.api_url, path);

    match cli.command {
        Commands::Run { code, output } => {
            let request = RunRequest {
                source: resolve_source(code)?,
            };

            let response = send(client.post(api("/api/v1/run")).json(&request), "send run request")?;
            let result: RunResponse = response.json().context("Failed to parse response")?;

            if output == "json" {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_run(&result);
            }
        }

        Commands::Editor => {
            let response = send(client.get(api("/api/v1/editor")), "get editor")?;
            let editor: EditorSnapshot = response.json().context("Failed to parse response")?;
            print_editor(&editor);
        }

        Commands::Edit { code } => {
            let request = RunRequest {
                source: resolve_source(code)?,
            };
            let response = send(
                client.put(api("/api/v1/editor/source")).json(&request),
                "update editor source",
            )?;
            let editor: EditorSnapshot = response.json().context("Failed to parse response")?;
            println!("{}", "✓ Source updated".green());
            print_editor(&editor);
        }

        Commands::RunEditor => {
            let response = send(client.post(api("/api/v1/editor/run")), "run editor")?;
            let result: RunResponse = response.json().context("Failed to parse response")?;
            print_run(&result);
        }

        Commands::Reset => {
            let response = send(client.post(api("/api/v1/editor/reset")), "reset editor")?;
            let editor: EditorSnapshot = response.json().context("Failed to parse response")?;
            println!("{}", "✓ Editor reset".green());
            print_editor(&editor);
        }

        Commands::Examples => {
            let response = send(client.get(api("/api/v1/examples")), "list examples")?;
            let examples: Value = response.json().context("Failed to parse response")?;
            let examples = examples.as_array().context("Invalid response")?;

            println!("{}", "Try these examples:".bright_cyan().bold());
            for example in examples {
                println!(
                    "  [{}] {} - {}",
                    example["index"],
                    example["title"].as_str().unwrap_or("?").bold(),
                    example["description"].as_str().unwrap_or("")
                );
            }
        }

        Commands::Example { index } => {
            let response = send(
                client.post(api(&format!("/api/v1/editor/examples/{}", index))),
                "load example",
            )?;
            let editor: EditorSnapshot = response.json().context("Failed to parse response")?;
            print_editor(&editor);
        }

        Commands::Session => {
            let response = send(client.get(api("/api/v1/session")), "get session")?;
            let session: Value = response.json().context("Failed to parse response")?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }

        Commands::History => {
            let response = send(client.get(api("/api/v1/history")), "get history")?;
            let history: Value = response.json().context("Failed to parse response")?;
            let runs = history["runs"].as_array().context("Invalid response")?;

            println!("{}", "Recent runs:".bright_cyan().bold());
            for run in runs {
                println!(
                    "  {} {} {}ms {} bytes",
                    run["timestamp"].as_str().unwrap_or("?"),
                    run["status"].as_str().unwrap_or("?"),
                    run["duration_ms"],
                    run["output_bytes"]
                );
            }
        }

        Commands::Health => {
            let response = send(client.get(api("/health")), "get health")?;
            let health: HealthResponse = response.json().context("Failed to parse response")?;

            println!("{}", "Scratchpad Server Status".bright_cyan().bold());
            println!("{}", "=".repeat(40).bright_blue());
            println!(
                "{} {}",
                "Status:".cyan(),
                if health.status == "healthy" {
                    health.status.green()
                } else {
                    health.status.yellow()
                }
            );
            println!("{} {}", "Version:".cyan(), health.version);
            println!("{} {}s", "Uptime:".cyan(), health.uptime_seconds);
            println!(
                "{} {}",
                "Session:".cyan(),
                health.session["state"].as_str().unwrap_or("?")
            );
            if let Some(message) = health.session["message"].as_str() {
                println!("{} {}", "  Error:".red(), message);
            }
        }
    }

    Ok(())
}
