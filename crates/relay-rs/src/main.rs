//! Dispatch one envelope to the OpenAI API and print the result.
//!
//! Reads the API key from the `OPENAI_API_KEY` environment variable
//! (`OPENAI_ORGANIZATION` and `OPENAI_BASE_URL` are honored when set).
//!
//! # Examples
//!
//! ```sh
//! # Chat completion
//! relay --topic turbo --payload "Why is the sky blue?"
//!
//! # Multi-turn chat across invocations
//! relay --topic turbo --payload "Pick a number." --history chat.json
//! relay --topic turbo --payload "Double it." --history chat.json
//!
//! # Image generation, URL result
//! relay --topic image --payload "a red fox, watercolor" --format url
//!
//! # Legacy edit
//! relay --topic edit --payload "Fix the grammar" --last "teh quick brown fox"
//!
//! # Function calling
//! relay --topic gpt4 --payload "Weather in Oslo?" --functions functions.json
//!
//! # Pipe the payload from stdin
//! cat prompt.txt | relay --topic completion --stdin
//! ```

use clap::Parser;
use relay_rs::prelude::*;
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

/// Dispatch one envelope to the OpenAI API and print the result.
///
/// Reads the API key from the OPENAI_API_KEY environment variable.
#[derive(Parser)]
#[command(name = "relay")]
struct Cli {
    /// Action topic: image, edit, turbo, gpt4, or completion
    #[arg(long)]
    topic: Option<String>,

    /// Primary input (prompt, instruction, or user message)
    #[arg(long)]
    payload: Option<String>,

    /// Read the payload from stdin
    #[arg(long)]
    stdin: bool,

    // ── Sampling parameters (loose: numeric strings accepted) ──
    /// Number of results to generate
    #[arg(long)]
    n: Option<String>,

    /// Sampling temperature (note: coerced to an integer on the wire)
    #[arg(long)]
    temperature: Option<String>,

    /// Nucleus sampling threshold (note: coerced to an integer on the wire)
    #[arg(long)]
    top_p: Option<String>,

    /// Maximum tokens to generate
    #[arg(long)]
    max_tokens: Option<String>,

    /// Presence penalty
    #[arg(long)]
    presence_penalty: Option<String>,

    /// Frequency penalty
    #[arg(long)]
    frequency_penalty: Option<String>,

    /// Server-side candidate count (completion only)
    #[arg(long)]
    best_of: Option<String>,

    /// Log probabilities to return (completion only)
    #[arg(long)]
    logprobs: Option<String>,

    /// Stop sequence — a string or a JSON array of strings
    #[arg(long)]
    stop: Option<String>,

    /// Echo the prompt in the completion (completion only)
    #[arg(long)]
    echo: bool,

    // ── Action-specific inputs ──
    /// Image size, e.g. 512x512 (image only)
    #[arg(long)]
    size: Option<String>,

    /// Image result format: url or b64_json (image only)
    #[arg(long)]
    format: Option<String>,

    /// Text to edit (edit only)
    #[arg(long)]
    last: Option<String>,

    /// Completion suffix (completion only)
    #[arg(long)]
    suffix: Option<String>,

    /// JSON file with function declarations (gpt4 only)
    #[arg(long)]
    functions: Option<PathBuf>,

    // ── Conversation state ──
    /// History file: loaded before the call, saved after (chat topics)
    #[arg(long)]
    history: Option<PathBuf>,

    // ── Output ──
    /// Print the complete raw response instead of the payload
    #[arg(long)]
    full: bool,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

/// Parse a loose CLI value: JSON when it parses, bare string otherwise.
/// `--n 3` arrives as a number, `--temperature 0.7` survives to the
/// coercion rules, `--stop '["\n"]'` becomes an array.
fn loose(value: &str) -> Value {
    serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn read_stdin_payload() -> Result<String, String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    Ok(buf)
}

fn load_history(path: &Path) -> Result<Vec<Turn>, String> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read history file '{}': {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse history file '{}': {e}", path.display()))
}

fn save_history(path: &Path, history: &[Turn]) -> Result<(), String> {
    let content = serde_json::to_string_pretty(history)
        .map_err(|e| format!("failed to serialize history: {e}"))?;
    std::fs::write(path, content)
        .map_err(|e| format!("failed to write history file '{}': {e}", path.display()))
}

fn load_functions(path: &Path) -> Result<Vec<FunctionDef>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read functions file '{}': {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse functions file '{}': {e}", path.display()))
}

fn build_envelope(cli: &Cli) -> Result<Envelope, String> {
    let payload = match (&cli.payload, cli.stdin) {
        (Some(_), true) => return Err("provide --payload or --stdin, not both".to_string()),
        (Some(payload), false) => Some(payload.clone()),
        (None, true) => Some(read_stdin_payload()?),
        (None, false) => None,
    };
    let mut envelope = Envelope {
        topic: cli.topic.clone(),
        payload,
        ..Envelope::default()
    };

    envelope.n = cli.n.as_deref().map(loose);
    envelope.temperature = cli.temperature.as_deref().map(loose);
    envelope.top_p = cli.top_p.as_deref().map(loose);
    envelope.max_tokens = cli.max_tokens.as_deref().map(loose);
    envelope.presence_penalty = cli.presence_penalty.as_deref().map(loose);
    envelope.frequency_penalty = cli.frequency_penalty.as_deref().map(loose);
    envelope.best_of = cli.best_of.as_deref().map(loose);
    envelope.logprobs = cli.logprobs.as_deref().map(loose);
    envelope.stop = cli.stop.as_deref().map(loose);
    if cli.echo {
        envelope.echo = Some(Value::Bool(true));
    }

    envelope.size = cli.size.clone();
    envelope.format = cli.format.clone();
    envelope.last = cli.last.clone();
    envelope.suffix = cli.suffix.clone();

    if let Some(path) = &cli.functions {
        envelope.functions = load_functions(path)?;
    }
    if let Some(path) = &cli.history {
        let history = load_history(path)?;
        if !history.is_empty() {
            envelope.history = Some(history);
        }
    }

    Ok(envelope)
}

fn render_output(envelope: &Envelope, want_full: bool) -> String {
    if want_full {
        return envelope
            .full
            .as_ref()
            .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
            .unwrap_or_default();
    }
    match &envelope.payload {
        Some(payload) => payload.clone(),
        // Null payload after a gpt4 dispatch means the model requested a
        // function call — print that instead.
        None => envelope
            .function_call
            .as_ref()
            .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
            .unwrap_or_default(),
    }
}

async fn run(cli: &Cli) -> Result<String, String> {
    let api_key =
        std::env::var("OPENAI_API_KEY").map_err(|_| "OPENAI_API_KEY not set".to_string())?;

    let mut config = NodeConfig::new(api_key);
    if let Ok(org) = std::env::var("OPENAI_ORGANIZATION") {
        config = config.with_organization(org);
    }
    if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
        config = config.with_base_url(base_url);
    }

    let node = Node::new(config)
        .map_err(|e| e.to_string())?
        .with_reporter(LoggingReporter);
    if node.setup_status().is_error() {
        eprintln!("warning: {}", node.setup_status().text);
    }

    let envelope = build_envelope(cli)?;
    let (reply, status) = node.handle(envelope).await;

    if status.is_error() {
        return Err(status.text);
    }

    if let Some(path) = &cli.history
        && let Some(history) = &reply.history
    {
        save_history(path, history)?;
    }

    Ok(render_output(&reply, cli.full))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match run(&cli).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loose_values_keep_numeric_strings_parseable() {
        assert_eq!(loose("3"), json!(3));
        assert_eq!(loose("0.7"), json!(0.7));
        assert_eq!(loose("[\"\\n\"]"), json!(["\n"]));
        assert_eq!(loose("hello"), json!("hello"));
    }

    #[test]
    fn history_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.json");

        let turns = vec![Turn::user("hi"), Turn::assistant("hello")];
        save_history(&path, &turns).unwrap();
        assert_eq!(load_history(&path).unwrap(), turns);
    }

    #[test]
    fn missing_history_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_history(&dir.path().join("absent.json")).unwrap().is_empty());
    }

    #[test]
    fn build_envelope_wires_loose_params() {
        let cli = Cli::parse_from([
            "relay",
            "--topic",
            "completion",
            "--payload",
            "Once",
            "--temperature",
            "0.7",
            "--max-tokens",
            "128",
            "--echo",
        ]);
        let envelope = build_envelope(&cli).unwrap();
        assert_eq!(envelope.topic.as_deref(), Some("completion"));
        assert_eq!(envelope.temperature, Some(json!(0.7)));
        assert_eq!(envelope.max_tokens, Some(json!(128)));
        assert_eq!(envelope.echo, Some(json!(true)));
    }

    #[test]
    fn render_output_prefers_payload_then_function_call() {
        let mut envelope = Envelope {
            payload: Some("text".into()),
            ..Envelope::default()
        };
        assert_eq!(render_output(&envelope, false), "text");

        envelope.payload = None;
        envelope.function_call = Some(json!({"name": "f", "arguments": "{}"}));
        assert!(render_output(&envelope, false).contains("\"name\""));
    }
}
